//! hb-core: Core library for the Harbor object storage client
//!
//! This crate holds everything that does not touch the network:
//! - Configuration and profile management
//! - Capability token signing
//! - Request URL construction
//! - Response status interpretation
//! - The resumable transfer controller and listing cursor, written against
//!   the `ChunkStore` and `PageSource` traits so they can be tested without
//!   a service

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod listing;
pub mod path;
pub mod profile;
pub mod result;
pub mod traits;
pub mod transfer;
pub mod types;

pub use auth::{AUTH_SCHEME, Credential, SignedPayload};
pub use config::{ApiPrefixes, ClientConfig, TransferConfig};
pub use endpoint::{ResourceKind, UrlBuilder, canonical_path, merge_query};
pub use error::{Error, Result};
pub use listing::{DEFAULT_PAGE_SIZE, ListingCursor, is_end_of_listing};
pub use path::{
    ObjectLocator, ParsedPath, RemotePath, build_path, cut_path_and_name, parse_path,
    parse_remote,
};
pub use profile::{Profile, ProfileManager};
pub use result::{ApiResult, ApiStatus};
pub use traits::{ChunkStore, PageSource};
pub use transfer::{
    Direction, IntegrityMismatch, Progress, TransferController, TransferError, TransferOutcome,
    TransferPhase, TransferState,
};
pub use types::{
    AccessPermission, BucketStats, Chunk, ChunkAck, ListingPage, Metadata, PageInfo, StatsInfo,
};
