//! Resumable chunked object transfer
//!
//! One controller drives one object at a time, strictly sequentially: a
//! chunk is requested (or sent) only after the previous one has been
//! applied at the destination. An aborted transfer reports the offset it
//! reached; calling again with that offset resumes it.

mod download;
mod state;
mod upload;

pub use state::{
    Direction, IntegrityMismatch, TransferError, TransferEvent, TransferOutcome, TransferPhase,
    TransferState,
};

use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite};

use crate::config::TransferConfig;
use crate::path::ObjectLocator;
use crate::traits::ChunkStore;

/// Callback invoked after every applied chunk
pub type Progress<'p> = &'p mut (dyn FnMut(&TransferState) + Send);

/// Drives chunk exchanges for whole-object transfers
pub struct TransferController<'a, S: ?Sized> {
    store: &'a S,
    config: TransferConfig,
}

impl<'a, S: ChunkStore + ?Sized> TransferController<'a, S> {
    pub fn new(store: &'a S, config: TransferConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Download the object into `sink`, starting at `start_offset`.
    ///
    /// Chunks are written at their offset, so a resumed download overwrites
    /// rather than appends.
    pub async fn download<W>(
        &self,
        locator: &ObjectLocator,
        sink: &mut W,
        start_offset: u64,
        progress: Progress<'_>,
    ) -> TransferOutcome
    where
        W: AsyncWrite + AsyncSeek + Unpin + Send,
    {
        download::run(
            self.store,
            locator,
            sink,
            start_offset,
            self.config.download_chunk_size,
            progress,
        )
        .await
    }

    /// Upload `object_size` bytes from `source`, starting at `start_offset`
    pub async fn upload<R>(
        &self,
        locator: &ObjectLocator,
        source: &mut R,
        object_size: u64,
        start_offset: u64,
        progress: Progress<'_>,
    ) -> TransferOutcome
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        upload::run(
            self.store,
            locator,
            source,
            object_size,
            start_offset,
            self.config.upload_chunk_size,
            progress,
        )
        .await
    }
}
