//! hb - command-line client for Harbor object storage

mod commands;
mod exit_code;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::Commands;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Parser, Debug)]
#[command(name = "hb")]
#[command(version, about = "Command-line client for Harbor object storage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress everything except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log requests and signing details to stderr
    #[arg(long, global = true)]
    debug: bool,
}

impl Cli {
    fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color || std::env::var_os("NO_COLOR").is_some(),
            quiet: self.quiet,
        }
    }
}

/// Logs go to stderr so stdout stays clean for JSON output
fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if debug => EnvFilter::try_new("hb_core=debug,hb_client=debug,hb=debug")?,
        Err(_) => EnvFilter::try_new("warn")?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug),
        )
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let output_config = cli.output_config();

    if let Err(e) = init_tracing(cli.debug) {
        Formatter::new(output_config).warning(&format!("Logging disabled: {e}"));
    }

    if let Commands::Completions(args) = &cli.command {
        clap_complete::generate(args.shell, &mut Cli::command(), "hb", &mut std::io::stdout());
        return ExitCode::Success.into();
    }

    let code = tokio::select! {
        code = commands::execute(cli.command, output_config) => code,
        _ = tokio::signal::ctrl_c() => {
            Formatter::new(output_config).error("Interrupted");
            ExitCode::Interrupted
        }
    };
    code.into()
}
