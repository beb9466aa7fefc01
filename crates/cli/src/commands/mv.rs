//! mv command - Move an object to another directory, or rename it in place

use clap::{ArgGroup, Args};

use super::{connect, remote_arg, report, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Move or rename an object
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["to", "rename"])))]
pub struct MvArgs {
    /// Object to move (profile/bucket/path)
    pub path: String,

    /// Destination directory inside the same bucket ("" or "/" for the root)
    #[arg(long)]
    pub to: Option<String>,

    /// New name for the object, in the same directory
    #[arg(long)]
    pub rename: Option<String>,
}

pub async fn execute(args: MvArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match remote_arg(&args.path, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match connect(&path.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = match (&args.to, &args.rename) {
        (Some(dest), _) => {
            tracing::debug!(path = %path, dest = %dest, "Moving object");
            client
                .move_object(&path.bucket, &path.key, dest.trim_matches('/'))
                .await
        }
        (None, Some(name)) => client.rename_object(&path.bucket, &path.key, name).await,
        (None, None) => {
            formatter.error("one of --to or --rename is required");
            return ExitCode::UsageError;
        }
    };

    match result {
        Ok(result) => report(&formatter, &path.to_string(), &result.status),
        Err(e) => report_error(&formatter, "Failed to move", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: MvArgs,
    }

    #[test]
    fn test_target_is_required_and_exclusive() {
        assert!(Harness::try_parse_from(["mv", "p/b/a.txt"]).is_err());
        assert!(
            Harness::try_parse_from(["mv", "p/b/a.txt", "--to", "x", "--rename", "y"]).is_err()
        );

        let parsed = Harness::try_parse_from(["mv", "p/b/a.txt", "--rename", "b.txt"]).unwrap();
        assert_eq!(parsed.args.rename.as_deref(), Some("b.txt"));
        assert!(parsed.args.to.is_none());
    }
}
