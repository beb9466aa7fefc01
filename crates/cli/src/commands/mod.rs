//! Command tree for `hb`

pub mod bucket;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod profile;
pub mod rm;
pub mod share;
pub mod stat;
pub mod transfer;

use clap::Subcommand;
use hb_client::HarborClient;
use hb_core::{ApiStatus, ProfileManager, RemotePath, parse_remote};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage named service profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List a bucket or directory
    Ls(ls::LsArgs),

    /// Show object or directory metadata
    Stat(stat::StatArgs),

    /// Make a bucket
    Mb(bucket::BucketArg),

    /// Remove a bucket
    Rb(bucket::BucketArg),

    /// Show bucket usage statistics
    Stats(bucket::BucketArg),

    /// Make a directory
    Mkdir(mkdir::MkdirArgs),

    /// Remove an object or directory
    Rm(rm::RmArgs),

    /// Move or rename an object
    Mv(mv::MvArgs),

    /// Make an object public or private
    Share(share::ShareArgs),

    /// Download an object
    Get(transfer::GetArgs),

    /// Upload a file
    Put(transfer::PutArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}

/// Execute any command except `completions`, which needs the root parser
pub async fn execute(cmd: Commands, output_config: OutputConfig) -> ExitCode {
    match cmd {
        Commands::Profile(cmd) => profile::execute(cmd, output_config).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Mb(args) => bucket::execute_make(args, output_config).await,
        Commands::Rb(args) => bucket::execute_remove(args, output_config).await,
        Commands::Stats(args) => bucket::execute_stats(args, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Mv(args) => mv::execute(args, output_config).await,
        Commands::Share(args) => share::execute(args, output_config).await,
        Commands::Get(args) => transfer::execute_get(args, output_config).await,
        Commands::Put(args) => transfer::execute_put(args, output_config).await,
        Commands::Completions(_) => {
            Formatter::new(output_config).error("completions are handled by the root command");
            ExitCode::UsageError
        }
    }
}

/// Parse a `profile/bucket[/path]` argument, reporting usage errors
pub fn remote_arg(arg: &str, formatter: &Formatter) -> Result<RemotePath, ExitCode> {
    parse_remote(arg).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::UsageError
    })
}

/// Build a client for the named profile
pub fn connect(profile_name: &str, formatter: &Formatter) -> Result<HarborClient, ExitCode> {
    let manager = match ProfileManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to load profiles: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let profile = match manager.get(profile_name) {
        Ok(p) => p,
        Err(hb_core::Error::ProfileNotFound(_)) => {
            formatter.error(&format!("Profile '{profile_name}' not found"));
            return Err(ExitCode::NotFound);
        }
        Err(e) => {
            formatter.error(&format!("Failed to get profile: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    HarborClient::new(profile.to_client_config()).map_err(|e| {
        formatter.error(&format!("Failed to create client: {e}"));
        ExitCode::from_error(&e)
    })
}

/// JSON output for operations without a payload
#[derive(Debug, Serialize)]
pub struct OperationOutput {
    pub success: bool,
    pub path: String,
    pub message: String,
    pub code: u16,
}

/// Report the outcome of a payload-less operation on `path`
pub fn report(formatter: &Formatter, path: &str, status: &ApiStatus) -> ExitCode {
    if formatter.is_json() {
        formatter.json(&OperationOutput {
            success: status.ok,
            path: path.to_string(),
            message: status.message.clone(),
            code: status.code,
        });
    } else if status.ok {
        formatter.success(&format!("{}: {}", formatter.style_name(path), status.message));
    } else {
        formatter.error(&format!("{path}: {status}"));
    }
    ExitCode::from_status(status)
}

/// Report an error that kept a request from completing
pub fn report_error(formatter: &Formatter, context: &str, error: &hb_core::Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(error)
}

pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
