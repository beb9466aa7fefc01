use std::io::SeekFrom;

use tokio::io::{AsyncSeekExt, AsyncWrite, AsyncWriteExt, AsyncSeek};

use super::Progress;
use super::state::{Direction, TransferEvent, TransferOutcome, TransferPhase, TransferState};
use crate::path::ObjectLocator;
use crate::traits::ChunkStore;

pub(super) async fn run<S, W>(
    store: &S,
    locator: &ObjectLocator,
    sink: &mut W,
    start_offset: u64,
    chunk_size: u32,
    progress: Progress<'_>,
) -> TransferOutcome
where
    S: ChunkStore + ?Sized,
    W: AsyncWrite + AsyncSeek + Unpin + Send,
{
    let mut state = TransferState::new(Direction::Download).apply(TransferEvent::Start {
        offset: start_offset,
        object_size: None,
    });

    while state.phase == TransferPhase::InProgress {
        let offset = state.offset;
        tracing::debug!(
            bucket = %locator.bucket,
            path = %locator.full_path(),
            offset,
            chunk_size,
            "Requesting chunk"
        );

        let result = match store.download_chunk(locator, offset, chunk_size).await {
            Ok(result) => result,
            Err(e) => {
                state = state.apply(TransferEvent::TransportFailed(e.to_string()));
                break;
            }
        };

        let chunk = match (result.status.ok, result.data) {
            (true, Some(chunk)) => chunk,
            _ => {
                state = state.apply(TransferEvent::Rejected(result.status));
                break;
            }
        };

        let flagged = state.integrity.len();
        state = state.apply(TransferEvent::ChunkReceived {
            object_size: chunk.object_size,
            declared: chunk.declared_size,
            received: chunk.received(),
        });
        if state.integrity.len() > flagged {
            tracing::warn!(
                offset,
                declared = chunk.declared_size,
                received = chunk.received(),
                "Chunk size differs from the declared size"
            );
        }
        if state.phase != TransferPhase::InProgress {
            break;
        }

        // Never write past the end of the object
        let take = chunk.received().min(state.remaining()) as usize;
        if let Err(e) = write_at(sink, offset, &chunk.data[..take]).await {
            state = state.apply(TransferEvent::IoFailed(e.to_string()));
            break;
        }

        state = state.apply(TransferEvent::ChunkWritten { bytes: take as u64 });
        progress(&state);
    }

    if state.phase == TransferPhase::Aborted {
        tracing::debug!(offset = state.offset, error = ?state.error, "Download aborted");
    }
    state.into_outcome()
}

async fn write_at<W>(sink: &mut W, offset: u64, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + AsyncSeek + Unpin,
{
    let pos = sink.seek(SeekFrom::Start(offset)).await?;
    if pos != offset {
        return Err(std::io::Error::other(format!(
            "seeked to {pos} instead of {offset}"
        )));
    }
    sink.write_all(data).await?;
    sink.flush().await
}
