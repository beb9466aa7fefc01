//! ls command - List directory contents
//!
//! Walks the listing page by page with the cursor links the service
//! returns.

use std::collections::HashSet;

use clap::Args;
use hb_core::{
    ApiStatus, DEFAULT_PAGE_SIZE, ListingCursor, Metadata, PageSource, is_end_of_listing,
};
use serde::Serialize;

use super::{connect, format_size, remote_arg, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List a bucket or directory
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory path (profile/bucket[/dir])
    pub path: String,

    /// Entries per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Follow next-page links until the end of the listing
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct EntryOutput {
    name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: &'static str,
    size: u64,
    size_human: String,
    uploaded_at: Option<String>,
    access_permission: String,
}

impl From<&Metadata> for EntryOutput {
    fn from(meta: &Metadata) -> Self {
        Self {
            name: meta.name.clone(),
            path: meta.path.clone(),
            entry_type: if meta.is_dir() { "dir" } else { "file" },
            size: meta.size,
            size_human: format_size(meta.size),
            uploaded_at: meta.uploaded_timestamp().map(|ts| ts.to_string()),
            access_permission: meta.access_permission.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LsOutput {
    path: String,
    /// Total entries in the directory
    count: u64,
    pages: u64,
    final_page: u64,
    entries: Vec<EntryOutput>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = match remote_arg(&args.path, &formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match connect(&path.profile, &formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut cursor = client.cursor(&path.bucket, &path.key);
    let first = match cursor.first(args.page_size).await {
        Ok(result) => result,
        Err(e) => return report_error(&formatter, "Failed to list", &e),
    };
    if !first.is_ok() {
        formatter.error(&format!("{path}: {}", first.status));
        return ExitCode::from_status(&first.status);
    }

    let mut entries: Vec<Metadata> = cursor.entries().to_vec();
    let mut pages = 1;
    if args.all {
        match follow_next(&mut cursor, &mut entries).await {
            Ok(Walk::Done(n)) => pages = n,
            Ok(Walk::Cycle { pages: n, link }) => {
                formatter.warning(&format!("Stopped after {n} pages: {link} was already listed"));
                pages = n;
            }
            Ok(Walk::Failed(status)) => {
                formatter.error(&format!("{path}: {status}"));
                return ExitCode::from_status(&status);
            }
            Err(e) => return report_error(&formatter, "Failed to fetch next page", &e),
        }
    }

    let (count, final_page, more) = cursor
        .page()
        .map(|p| (p.count, p.page.final_page, p.has_next()))
        .unwrap_or_default();

    if formatter.is_json() {
        formatter.json(&LsOutput {
            path: path.to_string(),
            count,
            pages,
            final_page,
            entries: entries.iter().map(EntryOutput::from).collect(),
        });
        return ExitCode::Success;
    }

    print_entries(&formatter, &entries);
    if more && !args.all {
        formatter.println(&format!(
            "{} of {count} entries shown; use --all to list everything",
            entries.len()
        ));
    }
    ExitCode::Success
}

/// How following next-page links ended
#[derive(Debug, PartialEq)]
enum Walk {
    /// No further page; carries the number of pages fetched
    Done(u64),
    /// A next link pointed at a page already fetched
    Cycle { pages: u64, link: String },
    Failed(ApiStatus),
}

/// Append the entries of every following page to `entries`
async fn follow_next<S: PageSource + ?Sized>(
    cursor: &mut ListingCursor<'_, S>,
    entries: &mut Vec<Metadata>,
) -> hb_core::Result<Walk> {
    let mut seen = HashSet::new();
    let mut pages = 1;
    loop {
        if let Some(link) = cursor.page().and_then(|p| p.next.clone())
            && !seen.insert(link.clone())
        {
            return Ok(Walk::Cycle { pages, link });
        }

        let result = cursor.next().await?;
        if is_end_of_listing(&result.status) {
            return Ok(Walk::Done(pages));
        }
        if !result.is_ok() {
            return Ok(Walk::Failed(result.status));
        }
        entries.extend_from_slice(cursor.entries());
        pages += 1;
    }
}

fn print_entries(formatter: &Formatter, entries: &[Metadata]) {
    if entries.is_empty() {
        formatter.println("(empty)");
        return;
    }

    let rows = entries
        .iter()
        .map(|meta| {
            let date = meta
                .uploaded_timestamp()
                .map(local_time)
                .unwrap_or_default();
            let (size, name) = if meta.is_dir() {
                (String::new(), format!("{}/", meta.name))
            } else {
                (format_size(meta.size), meta.name.clone())
            };
            vec![date, size, meta.access_permission.clone(), name]
        })
        .collect();
    formatter.table(&["UPLOADED", "SIZE", "ACCESS", "NAME"], rows);
}

/// Render a timestamp in the local time zone
pub(crate) fn local_time(ts: jiff::Timestamp) -> String {
    ts.to_zoned(jiff::tz::TimeZone::system())
        .strftime("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}
