//! share command - Make an object public or private
//!
//! A public object can be read through its download URL without a token.

use clap::Args;
use hb_core::AccessPermission;
use serde::Serialize;

use super::{connect, remote_arg, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Change who may read an object
#[derive(Args, Debug)]
pub struct ShareArgs {
    /// Object path (profile/bucket/path)
    pub path: String,

    /// Make the object private again
    #[arg(long)]
    pub private: bool,
}

impl ShareArgs {
    fn permission(&self) -> AccessPermission {
        if self.private {
            AccessPermission::Private
        } else {
            AccessPermission::Public
        }
    }
}

#[derive(Debug, Serialize)]
struct ShareOutput {
    success: bool,
    path: String,
    access_permission: AccessPermission,
    message: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<String>,
}

pub async fn execute(args: ShareArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let permission = args.permission();

    let path = match remote_arg(&args.path, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match connect(&path.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let status = match client
        .set_access_permission(&path.bucket, &path.key, permission)
        .await
    {
        Ok(result) => result.status,
        Err(e) => return report_error(&formatter, "Failed to change access", &e),
    };
    if !status.ok {
        if formatter.is_json() {
            formatter.json(&ShareOutput {
                success: false,
                path: path.to_string(),
                access_permission: permission,
                message: status.message.clone(),
                code: status.code,
                download_url: None,
            });
        } else {
            formatter.error(&format!("{path}: {status}"));
        }
        return ExitCode::from_status(&status);
    }

    // The download URL is only worth showing once the object is readable
    let download_url = match permission {
        AccessPermission::Public => match client.get_metadata(&path.bucket, &path.key).await {
            Ok(result) => result.data.and_then(|m| m.download_url),
            Err(e) => {
                tracing::debug!(error = %e, "Could not fetch download URL");
                None
            }
        },
        AccessPermission::Private => None,
    };

    if formatter.is_json() {
        formatter.json(&ShareOutput {
            success: true,
            path: path.to_string(),
            access_permission: permission,
            message: status.message,
            code: status.code,
            download_url,
        });
    } else {
        formatter.success(&format!("{}: {}", formatter.style_name(&path.to_string()), status.message));
        if let Some(url) = download_url {
            formatter.println(&formatter.style_url(&url));
        }
    }
    ExitCode::Success
}
