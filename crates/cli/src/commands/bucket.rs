//! Bucket commands: mb, rb, stats

use clap::Args;
use hb_client::HarborClient;
use hb_core::{BucketStats, RemotePath};
use serde::Serialize;

use super::{connect, format_size, remote_arg, report, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// A bucket argument (profile/bucket)
#[derive(Args, Debug)]
pub struct BucketArg {
    /// Bucket path (profile/bucket)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    bucket: String,
    space: u64,
    space_human: String,
    count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats_time: Option<String>,
}

impl StatsOutput {
    fn new(bucket: &str, stats: BucketStats) -> Self {
        Self {
            bucket: stats.bucket_name.unwrap_or_else(|| bucket.to_string()),
            space: stats.stats.space,
            space_human: format_size(stats.stats.space),
            count: stats.stats.count,
            stats_time: stats.stats_time,
        }
    }
}

/// Resolve the argument to a bucket path and a client for its profile
fn open(arg: &str, formatter: &Formatter) -> Result<(RemotePath, HarborClient), ExitCode> {
    let path = remote_arg(arg, formatter)?;
    if !path.key.is_empty() {
        formatter.error(&format!("'{arg}' names a path inside a bucket, not a bucket"));
        return Err(ExitCode::UsageError);
    }
    let client = connect(&path.profile, formatter)?;
    Ok((path, client))
}

/// Execute the mb command
pub async fn execute_make(args: BucketArg, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let (path, client) = match open(&args.path, &formatter) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match client.create_bucket(&path.bucket).await {
        Ok(result) => report(&formatter, &path.to_string(), &result.status),
        Err(e) => report_error(&formatter, "Failed to create bucket", &e),
    }
}

/// Execute the rb command
pub async fn execute_remove(args: BucketArg, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let (path, client) = match open(&args.path, &formatter) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match client.delete_bucket(&path.bucket).await {
        Ok(result) => report(&formatter, &path.to_string(), &result.status),
        Err(e) => report_error(&formatter, "Failed to remove bucket", &e),
    }
}

/// Execute the stats command
pub async fn execute_stats(args: BucketArg, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let (path, client) = match open(&args.path, &formatter) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let result = match client.bucket_stats(&path.bucket).await {
        Ok(r) => r,
        Err(e) => return report_error(&formatter, "Failed to get bucket statistics", &e),
    };
    let stats = match result.into_result() {
        Ok(s) => StatsOutput::new(&path.bucket, s),
        Err(status) => {
            formatter.error(&format!("{path}: {status}"));
            return ExitCode::from_status(&status);
        }
    };

    if formatter.is_json() {
        formatter.json(&stats);
    } else {
        let line = |key: &str, value: &str| formatter.key_value(key, 8, value);
        line("Bucket", &formatter.style_name(&stats.bucket));
        let space = format!("{} ({} bytes)", formatter.style_size(&stats.space_human), stats.space);
        line("Space", &space);
        line("Objects", &stats.count.to_string());
        if let Some(time) = &stats.stats_time {
            line("As of", &formatter.style_date(time));
        }
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use hb_core::StatsInfo;

    #[test]
    fn test_stats_output_falls_back_to_argument() {
        let stats = BucketStats {
            bucket_name: None,
            stats: StatsInfo {
                space: 3 * 1024 * 1024,
                count: 12,
            },
            stats_time: Some("2024-01-01 00:00:00".to_string()),
        };
        let out = StatsOutput::new("photos", stats);
        assert_eq!(out.bucket, "photos");
        assert_eq!(out.space_human, "3 MiB");
        assert_eq!(out.count, 12);
    }

    #[tokio::test]
    async fn test_path_inside_bucket_is_rejected() {
        let args = BucketArg {
            path: "prod/bkt/dir".to_string(),
        };
        let code = execute_make(args, OutputConfig::default()).await;
        assert_eq!(code, ExitCode::UsageError);
    }
}
