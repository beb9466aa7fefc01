use std::io::SeekFrom;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use super::Progress;
use super::state::{Direction, TransferEvent, TransferOutcome, TransferPhase, TransferState};
use crate::path::ObjectLocator;
use crate::traits::ChunkStore;

pub(super) async fn run<S, R>(
    store: &S,
    locator: &ObjectLocator,
    source: &mut R,
    object_size: u64,
    start_offset: u64,
    chunk_size: u32,
    progress: Progress<'_>,
) -> TransferOutcome
where
    S: ChunkStore + ?Sized,
    R: AsyncRead + AsyncSeek + Unpin + Send,
{
    let mut state = TransferState::new(Direction::Upload).apply(TransferEvent::Start {
        offset: start_offset,
        object_size: Some(object_size),
    });
    if state.phase != TransferPhase::InProgress {
        return state.into_outcome();
    }

    match source.seek(SeekFrom::Start(start_offset)).await {
        Ok(pos) if pos == start_offset => {}
        Ok(pos) => {
            let msg = format!("seeked to {pos} instead of {start_offset}");
            return state.apply(TransferEvent::IoFailed(msg)).into_outcome();
        }
        Err(e) => return state.apply(TransferEvent::IoFailed(e.to_string())).into_outcome(),
    }

    let mut buf = vec![0u8; chunk_size as usize];
    while state.phase == TransferPhase::InProgress {
        let offset = state.offset;
        let want = state.remaining().min(chunk_size as u64) as usize;

        let read = match read_up_to(source, &mut buf[..want]).await {
            Ok(n) => n,
            Err(e) => {
                state = state.apply(TransferEvent::IoFailed(e.to_string()));
                break;
            }
        };

        tracing::debug!(
            bucket = %locator.bucket,
            path = %locator.full_path(),
            offset,
            size = read,
            "Sending chunk"
        );

        let data = Bytes::copy_from_slice(&buf[..read]);
        let result = match store.upload_chunk(locator, offset, data).await {
            Ok(result) => result,
            Err(e) => {
                state = state.apply(TransferEvent::TransportFailed(e.to_string()));
                break;
            }
        };
        if !result.status.ok {
            state = state.apply(TransferEvent::Rejected(result.status));
            break;
        }

        let acknowledged = result.data.and_then(|ack| ack.chunk_size);
        let flagged = state.integrity.len();
        state = state.apply(TransferEvent::ChunkSent {
            sent: read as u64,
            acknowledged,
        });
        if state.integrity.len() > flagged {
            tracing::warn!(
                offset,
                sent = read,
                acknowledged,
                "Service acknowledged a different chunk size"
            );
        }
        progress(&state);
    }

    if state.phase == TransferPhase::Aborted {
        tracing::debug!(offset = state.offset, error = ?state.error, "Upload aborted");
    }
    state.into_outcome()
}

/// Fill `buf` from `source`; fewer bytes only at end of input
async fn read_up_to<R>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::config::TransferConfig;
    use crate::path::ObjectLocator;
    use crate::result::{ApiResult, ApiStatus};
    use crate::traits::MockChunkStore;
    use crate::transfer::testing::{MemoryStore, pattern};
    use crate::transfer::{TransferController, TransferError, TransferPhase};
    use crate::types::ChunkAck;

    fn config(chunk: u32) -> TransferConfig {
        TransferConfig {
            download_chunk_size: chunk,
            upload_chunk_size: chunk,
            max_chunk_size: chunk,
        }
    }

    fn locator() -> ObjectLocator {
        ObjectLocator::parse("bkt", "up/file.bin").unwrap()
    }

    #[tokio::test]
    async fn test_upload_whole_object() {
        let data = pattern(1001);
        let store = MemoryStore::default();
        let controller = TransferController::new(&store, config(250));

        let mut source = Cursor::new(data.clone());
        let outcome = controller
            .upload(&locator(), &mut source, 1001, 0, &mut |_| {})
            .await;

        assert!(outcome.is_done());
        assert_eq!(outcome.chunks, 5);
        assert_eq!(*store.calls.lock().unwrap(), vec![0, 250, 500, 750, 1000]);
        assert_eq!(store.object("up/file.bin").unwrap(), data);
    }

    #[tokio::test]
    async fn test_upload_resume_after_failure() {
        let data = pattern(600);
        let store = MemoryStore::default();
        store.fail_at.lock().unwrap().push(400);
        let controller = TransferController::new(&store, config(200));

        let mut source = Cursor::new(data.clone());
        let first = controller
            .upload(&locator(), &mut source, 600, 0, &mut |_| {})
            .await;
        assert_eq!(first.phase, TransferPhase::Aborted);
        assert_eq!(first.offset, 400);

        let mut source = Cursor::new(data.clone());
        let second = controller
            .upload(&locator(), &mut source, 600, first.offset, &mut |_| {})
            .await;
        assert!(second.is_done());
        assert_eq!(store.object("up/file.bin").unwrap(), data);
    }

    #[tokio::test]
    async fn test_empty_upload_sends_one_chunk() {
        let store = MemoryStore::default();
        let controller = TransferController::new(&store, config(100));

        let mut source = Cursor::new(Vec::new());
        let outcome = controller
            .upload(&locator(), &mut source, 0, 0, &mut |_| {})
            .await;
        assert!(outcome.is_done());
        assert_eq!(store.call_count(), 1);
        assert_eq!(store.object("up/file.bin").unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn test_source_shorter_than_declared() {
        let store = MemoryStore::default();
        let controller = TransferController::new(&store, config(100));

        let mut source = Cursor::new(pattern(150));
        let outcome = controller
            .upload(&locator(), &mut source, 300, 0, &mut |_| {})
            .await;
        assert_eq!(outcome.phase, TransferPhase::Aborted);
        assert_eq!(outcome.offset, 150);
        assert_eq!(outcome.error, Some(TransferError::NoProgress { offset: 150 }));
    }

    #[tokio::test]
    async fn test_start_past_end() {
        let store = MemoryStore::default();
        let controller = TransferController::new(&store, config(100));

        let mut source = Cursor::new(pattern(10));
        let outcome = controller
            .upload(&locator(), &mut source, 10, 20, &mut |_| {})
            .await;
        assert!(matches!(outcome.error, Some(TransferError::OutOfRange { .. })));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_chunk_aborts() {
        let mut store = MockChunkStore::new();
        store
            .expect_upload_chunk()
            .times(1)
            .returning(|_, _, _| {
                Ok(ApiResult::status_only(ApiStatus::failure(
                    403,
                    "no write permission",
                )))
            });
        let controller = TransferController::new(&store, config(10));

        let mut source = Cursor::new(pattern(30));
        let outcome = controller
            .upload(&locator(), &mut source, 30, 0, &mut |_| {})
            .await;
        assert_eq!(outcome.status.code, 403);
        assert_eq!(outcome.status.message, "no write permission");
        assert_eq!(outcome.offset, 0);
    }

    #[tokio::test]
    async fn test_ack_mismatch_is_flagged() {
        let mut store = MockChunkStore::new();
        store.expect_upload_chunk().times(2).returning(|_, offset, data| {
            let echoed = if offset == 0 { data.len() as u64 - 1 } else { data.len() as u64 };
            Ok(ApiResult::new(
                ApiStatus::success(200, ""),
                Some(ChunkAck {
                    chunk_offset: Some(offset),
                    chunk_size: Some(echoed),
                }),
            ))
        });
        let controller = TransferController::new(&store, config(10));

        let mut source = Cursor::new(pattern(20));
        let outcome = controller
            .upload(&locator(), &mut source, 20, 0, &mut |_| {})
            .await;
        assert!(outcome.is_done());
        assert_eq!(outcome.integrity.len(), 1);
        assert_eq!(outcome.integrity[0].declared, 9);
        assert_eq!(outcome.integrity[0].actual, 10);
    }
}
