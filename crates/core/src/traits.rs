//! Seams between the transfer/listing logic and the HTTP client
//!
//! These traits keep the Transfer Controller and Listing Cursor free of any
//! HTTP dependency so they can be driven by an in-memory store in tests.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::path::ObjectLocator;
use crate::result::ApiResult;
use crate::types::{Chunk, ChunkAck, ListingPage};

/// Chunk-level access to object data.
///
/// `Err` means the exchange itself failed (transport, malformed URL).
/// A response from the service, successful or not, is always `Ok`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Fetch up to `size` bytes of the object starting at `offset`
    async fn download_chunk(
        &self,
        locator: &ObjectLocator,
        offset: u64,
        size: u32,
    ) -> Result<ApiResult<Chunk>>;

    /// Store `data` at `offset` of the object
    async fn upload_chunk(
        &self,
        locator: &ObjectLocator,
        offset: u64,
        data: Bytes,
    ) -> Result<ApiResult<ChunkAck>>;
}

/// Source of directory listing pages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Request the first page of a directory
    async fn first_page(
        &self,
        bucket: &str,
        dir_path: &str,
        page_size: u32,
    ) -> Result<ApiResult<ListingPage>>;

    /// Request a page by the cursor URL the service handed out
    async fn page_at(&self, url: &str) -> Result<ApiResult<ListingPage>>;
}
