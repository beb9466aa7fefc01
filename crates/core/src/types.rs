//! Wire types exchanged with the storage service

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Metadata of an object or directory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Full path inside the bucket
    #[serde(rename = "na", default)]
    pub path: String,

    /// Object or directory name
    #[serde(default)]
    pub name: String,

    /// `true` for objects, `false` for directories
    #[serde(rename = "fod", default)]
    pub is_file: bool,

    /// Id of the parent directory
    #[serde(rename = "did", default)]
    pub parent_id: u64,

    /// Size in bytes
    #[serde(rename = "si", default)]
    pub size: u64,

    #[serde(rename = "ult", default)]
    pub uploaded_at: String,

    #[serde(rename = "upt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(rename = "dlc", default)]
    pub download_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(default)]
    pub access_permission: String,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        !self.is_file
    }

    /// Upload time, when the service sent one we can read
    pub fn uploaded_timestamp(&self) -> Option<jiff::Timestamp> {
        parse_timestamp(&self.uploaded_at)
    }
}

/// Parse a service timestamp; naive date-times are taken as UTC
pub fn parse_timestamp(s: &str) -> Option<jiff::Timestamp> {
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = s.parse::<jiff::Timestamp>() {
        return Some(ts);
    }
    s.parse::<jiff::civil::DateTime>()
        .ok()
        .and_then(|dt| dt.to_zoned(jiff::tz::TimeZone::UTC).ok())
        .map(|z| z.timestamp())
}

/// Body of a metadata response
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataEnvelope {
    pub data: Metadata,
}

/// Page numbers of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub current: u64,
    #[serde(rename = "final", default)]
    pub final_page: u64,
}

/// One page of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListingPage {
    /// Total number of entries in the directory
    #[serde(default)]
    pub count: u64,

    /// URL of the following page
    #[serde(default)]
    pub next: Option<String>,

    /// URL of the preceding page
    #[serde(default)]
    pub previous: Option<String>,

    #[serde(default)]
    pub page: PageInfo,

    #[serde(default)]
    pub files: Vec<Metadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_path: Option<String>,
}

impl ListingPage {
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_previous(&self) -> bool {
        self.previous.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Space and object count of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsInfo {
    #[serde(default)]
    pub space: u64,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub stats: StatsInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_time: Option<String>,
}

/// Bytes of one downloaded chunk with the sizes the service declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    /// Value of the chunk size header
    pub declared_size: u64,
    /// Value of the object size header
    pub object_size: u64,
    pub data: Bytes,
}

impl Chunk {
    pub fn received(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn size_matches(&self) -> bool {
        self.received() == self.declared_size
    }
}

/// Optional acknowledgement fields of an upload reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ChunkAck {
    #[serde(default)]
    pub chunk_offset: Option<u64>,
    #[serde(default)]
    pub chunk_size: Option<u64>,
}

/// Who may read an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessPermission {
    Public,
    Private,
}

impl AccessPermission {
    /// Value of the `share` query parameter
    pub fn as_share_param(self) -> &'static str {
        match self {
            AccessPermission::Public => "true",
            AccessPermission::Private => "false",
        }
    }
}

impl std::fmt::Display for AccessPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessPermission::Public => write!(f, "public"),
            AccessPermission::Private => write!(f, "private"),
        }
    }
}
