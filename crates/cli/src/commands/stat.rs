//! stat command - Show object or directory metadata

use clap::Args;
use hb_core::Metadata;
use serde::Serialize;

use super::ls::local_time;
use super::{connect, format_size, remote_arg, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show metadata of an object or directory
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Object or directory path (profile/bucket/path)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    bucket: String,
    #[serde(flatten)]
    metadata: Metadata,
    #[serde(rename = "type")]
    entry_type: &'static str,
    size_human: String,
}

pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match remote_arg(&args.path, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if path.key.is_empty() {
        formatter.error("stat needs a path inside the bucket; use `hb stats` for buckets");
        return ExitCode::UsageError;
    }
    let client = match connect(&path.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = match client.get_metadata(&path.bucket, &path.key).await {
        Ok(r) => r,
        Err(e) => return report_error(&formatter, "Failed to get metadata", &e),
    };
    let metadata = match result.into_result() {
        Ok(m) => m,
        Err(status) => {
            formatter.error(&format!("{path}: {status}"));
            return ExitCode::from_status(&status);
        }
    };

    if formatter.is_json() {
        formatter.json(&StatOutput {
            bucket: path.bucket.clone(),
            entry_type: if metadata.is_dir() { "dir" } else { "file" },
            size_human: format_size(metadata.size),
            metadata,
        });
    } else {
        print_metadata(&formatter, &path.bucket, &metadata);
    }
    ExitCode::Success
}

fn print_metadata(formatter: &Formatter, bucket: &str, meta: &Metadata) {
    let line = |key: &str, value: &str| formatter.key_value(key, 10, value);

    line("Name", &formatter.style_name(&meta.name));
    line("Bucket", bucket);
    line("Path", &meta.path);
    if meta.is_dir() {
        line("Type", &formatter.style_dir("directory"));
    } else {
        line("Type", &formatter.style_file("file"));
        let size = format!("{} ({} bytes)", format_size(meta.size), meta.size);
        line("Size", &formatter.style_size(&size));
    }
    if let Some(ts) = meta.uploaded_timestamp() {
        line("Uploaded", &formatter.style_date(&local_time(ts)));
    }
    if let Some(updated) = &meta.updated_at {
        line("Updated", &formatter.style_date(updated));
    }
    if !meta.access_permission.is_empty() {
        line("Access", &formatter.style_access(&meta.access_permission));
    }
    if meta.is_file {
        line("Downloads", &meta.download_count.to_string());
    }
    if let Some(url) = &meta.download_url {
        line("URL", &formatter.style_url(url));
    }
}
