//! hb-client: HTTP adapter for the Harbor object storage client
//!
//! The [`Dispatcher`] signs and sends requests; [`HarborClient`] builds on
//! it with one method per service operation and implements the
//! `ChunkStore` and `PageSource` traits from `hb-core`.

mod client;
mod dispatch;
mod response;

pub use client::{CHUNK_SIZE_HEADER, HarborClient, OBJECT_SIZE_HEADER};
pub use dispatch::{Dispatcher, RequestBody, RequestOptions};
