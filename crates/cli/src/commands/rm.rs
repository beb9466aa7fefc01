//! rm command - Remove an object or a directory

use clap::Args;

use super::{connect, remote_arg, report, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove an object, or a directory with `--dir`
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path to remove (profile/bucket/path)
    pub path: String,

    /// Remove a directory and everything under it
    #[arg(short, long)]
    pub dir: bool,
}

pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match remote_arg(&args.path, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let key = path.key.trim_matches('/');
    if key.is_empty() {
        formatter.error("rm needs a path inside the bucket; use `hb rb` for buckets");
        return ExitCode::UsageError;
    }

    let client = match connect(&path.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = if args.dir {
        client.delete_dir(&path.bucket, key).await
    } else {
        client.delete_object(&path.bucket, key).await
    };
    match result {
        Ok(result) => report(&formatter, &path.to_string(), &result.status),
        Err(e) => report_error(&formatter, "Failed to remove", &e),
    }
}
