//! get/put commands - Chunked object download and upload
//!
//! Both directions are resumable: an interrupted transfer prints the offset
//! it reached, and passing that offset back with `--offset` continues it.

use std::path::{Path, PathBuf};

use clap::Args;
use hb_core::{RemotePath, TransferError, TransferOutcome, TransferState, build_path};
use serde::Serialize;

use super::{connect, format_size, remote_arg, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, TransferProgress};

/// Download an object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object to download (profile/bucket/path)
    pub remote: String,

    /// Local directory to write into (defaults to the current directory)
    pub dest: Option<PathBuf>,

    /// Local file name (defaults to the object name)
    #[arg(long)]
    pub name: Option<String>,

    /// Resume from this byte offset
    #[arg(long, default_value_t = 0)]
    pub offset: u64,
}

/// Upload a file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub local: PathBuf,

    /// Destination (profile/bucket/path); a trailing '/' keeps the local file name
    pub remote: String,

    /// Resume from this byte offset
    #[arg(long, default_value_t = 0)]
    pub offset: u64,
}

#[derive(Debug, Serialize)]
struct TransferOutput<'a> {
    remote: String,
    local: String,
    #[serde(flatten)]
    outcome: &'a TransferOutcome,
}

/// Execute the get command
pub async fn execute_get(args: GetArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match remote_arg(&args.remote, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match connect(&remote.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let dest_dir = args.dest.unwrap_or_else(|| PathBuf::from("."));
    let file_name = args.name.as_deref().unwrap_or(remote.name()).to_string();
    let local = dest_dir.join(&file_name);

    let bar = TransferProgress::new(&output_config, &file_name);
    bar.start_at(args.offset, None);
    let mut on_progress = |state: &TransferState| bar.update(state);

    let outcome = client
        .download_file(
            &remote.bucket,
            &remote.key,
            &dest_dir,
            args.name.as_deref(),
            args.offset,
            &mut on_progress,
        )
        .await;
    bar.finish();

    match outcome {
        Ok(outcome) => finish(&formatter, &remote, &local, &outcome),
        Err(e) => report_error(&formatter, "Failed to download", &e),
    }
}

/// Execute the put command
pub async fn execute_put(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if !args.local.is_file() {
        formatter.error(&format!("'{}' is not a file", args.local.display()));
        return ExitCode::UsageError;
    }
    let mut remote = match remote_arg(&args.remote, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if remote.key.is_empty() || remote.key.ends_with('/') {
        let Some(name) = args.local.file_name().and_then(|n| n.to_str()) else {
            formatter.error("local file name is not valid UTF-8; give the object name explicitly");
            return ExitCode::UsageError;
        };
        remote.key = build_path(&[remote.key.as_str(), name]);
    }
    let client = match connect(&remote.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let bar = TransferProgress::new(&output_config, remote.name());
    let mut on_progress = |state: &TransferState| bar.update(state);

    let outcome = client
        .upload_file(
            &args.local,
            &remote.bucket,
            &remote.key,
            args.offset,
            &mut on_progress,
        )
        .await;
    bar.finish();

    match outcome {
        Ok(outcome) => finish(&formatter, &remote, &args.local, &outcome),
        Err(e) => report_error(&formatter, "Failed to upload", &e),
    }
}

/// Report a finished or aborted transfer
fn finish(formatter: &Formatter, remote: &RemotePath, local: &Path, outcome: &TransferOutcome) -> ExitCode {
    let code = exit_code(outcome);

    if formatter.is_json() {
        formatter.json(&TransferOutput {
            remote: remote.to_string(),
            local: local.display().to_string(),
            outcome,
        });
        return code;
    }

    for mismatch in &outcome.integrity {
        formatter.warning(&format!(
            "chunk at offset {} declared {} bytes but moved {}",
            mismatch.offset, mismatch.declared, mismatch.actual
        ));
    }

    if outcome.is_done() {
        let size = outcome.object_size.unwrap_or(outcome.offset);
        formatter.success(&format!(
            "{} {} {} ({}, {} chunk(s))",
            formatter.style_file(&local.display().to_string()),
            match outcome.direction {
                hb_core::Direction::Download => "<-",
                hb_core::Direction::Upload => "->",
            },
            formatter.style_name(&remote.to_string()),
            formatter.style_size(&format_size(size)),
            outcome.chunks
        ));
    } else {
        formatter.error(&format!("{} {remote}: {}", outcome.direction, outcome.status));
        if resumable(outcome) {
            formatter.println(&format!(
                "Transferred up to byte {}; rerun with --offset {} to resume",
                outcome.offset, outcome.offset
            ));
        }
    }
    code
}

/// Exit code for a transfer outcome.
///
/// Status code 0 covers every client-side abort, so the error kind decides.
fn exit_code(outcome: &TransferOutcome) -> ExitCode {
    if outcome.is_done() {
        return ExitCode::Success;
    }
    match &outcome.error {
        Some(TransferError::Transport { .. }) => ExitCode::NetworkError,
        Some(TransferError::Rejected { status }) => ExitCode::from_status(status),
        Some(TransferError::OutOfRange { .. }) => ExitCode::UsageError,
        Some(TransferError::NoProgress { .. } | TransferError::Io { .. }) | None => {
            ExitCode::GeneralError
        }
    }
}

/// Whether rerunning with the reached offset can make progress
fn resumable(outcome: &TransferOutcome) -> bool {
    matches!(
        outcome.error,
        Some(TransferError::Transport { .. } | TransferError::Io { .. } | TransferError::Rejected { .. })
    ) && outcome.offset > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use hb_core::{ApiStatus, Direction, TransferPhase};

    fn aborted(offset: u64, error: TransferError) -> TransferOutcome {
        TransferOutcome {
            status: ApiStatus::failure(0, error.to_string()),
            direction: Direction::Download,
            phase: TransferPhase::Aborted,
            offset,
            object_size: Some(100),
            chunks: offset / 10,
            integrity: Vec::new(),
            error: Some(error),
        }
    }

    #[test]
    fn test_exit_code_by_error_kind() {
        let transport = aborted(40, TransferError::Transport {
            message: "reset".to_string(),
        });
        assert_eq!(exit_code(&transport), ExitCode::NetworkError);
        assert!(resumable(&transport));

        let rejected = aborted(0, TransferError::Rejected {
            status: ApiStatus::failure(403, "denied"),
        });
        assert_eq!(exit_code(&rejected), ExitCode::AuthError);
        assert!(!resumable(&rejected));

        let range = aborted(200, TransferError::OutOfRange {
            offset: 200,
            object_size: 100,
        });
        assert_eq!(exit_code(&range), ExitCode::UsageError);
        assert!(!resumable(&range));

        let io = aborted(10, TransferError::Io {
            message: "disk full".to_string(),
        });
        assert_eq!(exit_code(&io), ExitCode::GeneralError);
    }

    #[test]
    fn test_completed_transfer() {
        let done = TransferOutcome {
            status: ApiStatus::success(200, "upload ok"),
            direction: Direction::Upload,
            phase: TransferPhase::Completed,
            offset: 100,
            object_size: Some(100),
            chunks: 1,
            integrity: Vec::new(),
            error: None,
        };
        assert_eq!(exit_code(&done), ExitCode::Success);

        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        let remote = RemotePath::new("p", "b", "a.bin");
        let code = finish(&formatter, &remote, Path::new("a.bin"), &done);
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_put_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = PutArgs {
            local: dir.path().join("missing.bin"),
            remote: "p/b/".to_string(),
            offset: 0,
        };
        assert_eq!(execute_put(args, OutputConfig::default()).await, ExitCode::UsageError);
    }
}
