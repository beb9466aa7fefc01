//! mkdir command - Create a directory inside a bucket

use clap::Args;
use hb_core::cut_path_and_name;

use super::{connect, remote_arg, report, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a directory
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directory to create (profile/bucket/path/name)
    pub path: String,
}

pub async fn execute(args: MkdirArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match remote_arg(&args.path, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let key = path.key.trim_matches('/');
    let (parent, name) = cut_path_and_name(key);
    if name.is_empty() {
        formatter.error("mkdir needs a directory name inside the bucket");
        return ExitCode::UsageError;
    }

    let client = match connect(&path.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.create_dir(&path.bucket, parent, name).await {
        Ok(result) => report(&formatter, &path.to_string(), &result.status),
        Err(e) => report_error(&formatter, "Failed to create directory", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_root_is_rejected() {
        let args = MkdirArgs {
            path: "prod/bkt/".to_string(),
        };
        assert_eq!(execute(args, OutputConfig::default()).await, ExitCode::UsageError);
    }
}
