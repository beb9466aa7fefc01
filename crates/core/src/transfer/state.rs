//! Transfer state machine
//!
//! `Idle -> InProgress -> {Completed, Aborted}`. [`TransferState::apply`] is
//! a pure function of the current state and one event; the drivers in
//! [`super::download`] and [`super::upload`] do the I/O and feed events in.

use serde::Serialize;

use crate::result::ApiStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Download,
    Upload,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Download => write!(f, "download"),
            Direction::Upload => write!(f, "upload"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    Idle,
    InProgress,
    Completed,
    Aborted,
}

impl TransferPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferPhase::Completed | TransferPhase::Aborted)
    }
}

/// Why a transfer was aborted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferError {
    /// The HTTP exchange failed
    Transport { message: String },
    /// The service answered with a failure
    Rejected { status: ApiStatus },
    /// The offset lies at or beyond the end of the object
    OutOfRange { offset: u64, object_size: u64 },
    /// A successful exchange moved zero bytes before the end of the object
    NoProgress { offset: u64 },
    /// Reading the source or writing the destination failed
    Io { message: String },
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::Transport { message } => write!(f, "transport failure: {message}"),
            TransferError::Rejected { status } => write!(f, "{status}"),
            TransferError::OutOfRange {
                offset,
                object_size,
            } => write!(f, "offset {offset} is beyond the object size {object_size}"),
            TransferError::NoProgress { offset } => {
                write!(f, "no bytes were transferred at offset {offset}")
            }
            TransferError::Io { message } => write!(f, "local I/O failure: {message}"),
        }
    }
}

/// A chunk whose declared size differs from what was actually moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityMismatch {
    pub offset: u64,
    pub declared: u64,
    pub actual: u64,
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Begin at `offset`; uploads know the object size up front
    Start {
        offset: u64,
        object_size: Option<u64>,
    },
    /// A download chunk arrived with these declared and received sizes
    ChunkReceived {
        object_size: u64,
        declared: u64,
        received: u64,
    },
    /// Bytes of the last received chunk were written to the destination
    ChunkWritten { bytes: u64 },
    /// An upload chunk was accepted; `acknowledged` is the size the service echoed
    ChunkSent {
        sent: u64,
        acknowledged: Option<u64>,
    },
    Rejected(ApiStatus),
    TransportFailed(String),
    IoFailed(String),
}

/// Progress of one object transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferState {
    pub direction: Direction,
    pub phase: TransferPhase,
    /// Bytes of the object known to be applied at the destination
    pub offset: u64,
    /// Unknown until the first download chunk arrives
    pub object_size: Option<u64>,
    /// Successful chunk exchanges so far
    pub chunks: u64,
    pub integrity: Vec<IntegrityMismatch>,
    pub error: Option<TransferError>,
}

impl TransferState {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            phase: TransferPhase::Idle,
            offset: 0,
            object_size: None,
            chunks: 0,
            integrity: Vec::new(),
            error: None,
        }
    }

    /// Bytes left to transfer, zero while the size is unknown
    pub fn remaining(&self) -> u64 {
        self.object_size
            .map(|size| size.saturating_sub(self.offset))
            .unwrap_or(0)
    }

    pub fn is_done(&self) -> bool {
        self.phase == TransferPhase::Completed
            && self.error.is_none()
            && self.object_size == Some(self.offset)
    }

    /// Advance the machine by one event.
    ///
    /// Events that do not fit the current phase leave the state unchanged.
    pub fn apply(mut self, event: TransferEvent) -> Self {
        match (self.phase, event) {
            (TransferPhase::Idle, TransferEvent::Start { offset, object_size }) => {
                self.offset = offset;
                self.object_size = object_size;
                self.phase = TransferPhase::InProgress;

                if let Some(size) = object_size {
                    if offset > size {
                        return self.abort(TransferError::OutOfRange {
                            offset,
                            object_size: size,
                        });
                    }
                    // An empty object still needs one (empty) chunk to be created
                    if offset == size && size > 0 {
                        self.phase = TransferPhase::Completed;
                    }
                }
                self
            }

            (
                TransferPhase::InProgress,
                TransferEvent::ChunkReceived {
                    object_size,
                    declared,
                    received,
                },
            ) => {
                self.object_size = Some(object_size);
                self.chunks += 1;

                if object_size == 0 && self.offset == 0 {
                    self.phase = TransferPhase::Completed;
                    return self;
                }
                let offset = self.offset;
                if offset >= object_size {
                    return self.abort(TransferError::OutOfRange {
                        offset,
                        object_size,
                    });
                }
                if received == 0 {
                    return self.abort(TransferError::NoProgress { offset });
                }
                if received != declared || received > object_size - offset {
                    self.integrity.push(IntegrityMismatch {
                        offset,
                        declared,
                        actual: received,
                    });
                }
                self
            }

            (TransferPhase::InProgress, TransferEvent::ChunkWritten { bytes }) => {
                self.offset += bytes;
                if let Some(size) = self.object_size
                    && self.offset >= size
                {
                    self.phase = TransferPhase::Completed;
                }
                self
            }

            (TransferPhase::InProgress, TransferEvent::ChunkSent { sent, acknowledged }) => {
                self.chunks += 1;
                if let Some(ack) = acknowledged
                    && ack != sent
                {
                    self.integrity.push(IntegrityMismatch {
                        offset: self.offset,
                        declared: ack,
                        actual: sent,
                    });
                }

                self.offset += sent;
                let size = self.object_size.unwrap_or(self.offset);
                if self.offset >= size {
                    self.phase = TransferPhase::Completed;
                } else if sent == 0 {
                    let offset = self.offset;
                    return self.abort(TransferError::NoProgress { offset });
                }
                self
            }

            (TransferPhase::InProgress, TransferEvent::Rejected(status)) => {
                self.abort(TransferError::Rejected { status })
            }
            (TransferPhase::InProgress, TransferEvent::TransportFailed(message)) => {
                self.abort(TransferError::Transport { message })
            }
            (TransferPhase::InProgress, TransferEvent::IoFailed(message)) => {
                self.abort(TransferError::Io { message })
            }

            (_, _) => self,
        }
    }

    fn abort(mut self, error: TransferError) -> Self {
        self.phase = TransferPhase::Aborted;
        self.error = Some(error);
        self
    }

    /// Summarize the finished (or abandoned) transfer
    pub fn into_outcome(self) -> TransferOutcome {
        let status = match (&self.phase, &self.error) {
            (_, Some(TransferError::Rejected { status })) => status.clone(),
            (_, Some(error)) => ApiStatus::failure(0, error.to_string()),
            (TransferPhase::Completed, None) if self.integrity.is_empty() => {
                ApiStatus::success(200, format!("{} ok", self.direction))
            }
            (TransferPhase::Completed, None) => ApiStatus::success(
                200,
                format!(
                    "{} ok, {} chunk(s) with size mismatch",
                    self.direction,
                    self.integrity.len()
                ),
            ),
            (_, None) => ApiStatus::failure(0, format!("{} not finished", self.direction)),
        };

        TransferOutcome {
            status,
            direction: self.direction,
            phase: self.phase,
            offset: self.offset,
            object_size: self.object_size,
            chunks: self.chunks,
            integrity: self.integrity,
            error: self.error,
        }
    }
}

/// Result of a whole-object transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub direction: Direction,
    pub phase: TransferPhase,
    /// Offset to resume from
    pub offset: u64,
    pub object_size: Option<u64>,
    pub chunks: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub integrity: Vec<IntegrityMismatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TransferError>,
}

impl TransferOutcome {
    pub fn is_done(&self) -> bool {
        self.status.ok && self.phase == TransferPhase::Completed && self.object_size == Some(self.offset)
    }

    pub fn has_integrity_issues(&self) -> bool {
        !self.integrity.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_started(offset: u64) -> TransferState {
        TransferState::new(Direction::Download).apply(TransferEvent::Start {
            offset,
            object_size: None,
        })
    }

    fn received(object_size: u64, declared: u64, received: u64) -> TransferEvent {
        TransferEvent::ChunkReceived {
            object_size,
            declared,
            received,
        }
    }

    #[test]
    fn test_start_moves_to_in_progress() {
        let state = download_started(0);
        assert_eq!(state.phase, TransferPhase::InProgress);
        assert_eq!(state.object_size, None);
    }

    #[test]
    fn test_download_completes_at_object_size() {
        let state = download_started(0)
            .apply(received(10, 6, 6))
            .apply(TransferEvent::ChunkWritten { bytes: 6 });
        assert_eq!(state.phase, TransferPhase::InProgress);
        assert_eq!(state.remaining(), 4);

        let state = state
            .apply(received(10, 4, 4))
            .apply(TransferEvent::ChunkWritten { bytes: 4 });
        assert_eq!(state.phase, TransferPhase::Completed);
        assert!(state.is_done());
        assert_eq!(state.chunks, 2);
    }

    #[test]
    fn test_offset_beyond_object_aborts() {
        let state = download_started(10).apply(received(10, 0, 0));
        assert_eq!(state.phase, TransferPhase::Aborted);
        assert_eq!(
            state.error,
            Some(TransferError::OutOfRange {
                offset: 10,
                object_size: 10
            })
        );
        assert!(!state.is_done());
    }

    #[test]
    fn test_empty_object_completes() {
        let state = download_started(0).apply(received(0, 0, 0));
        assert_eq!(state.phase, TransferPhase::Completed);
        assert!(state.is_done());
    }

    #[test]
    fn test_size_mismatch_is_flagged_not_fatal() {
        let state = download_started(0).apply(received(10, 5, 3));
        assert_eq!(state.phase, TransferPhase::InProgress);
        assert_eq!(
            state.integrity,
            vec![IntegrityMismatch {
                offset: 0,
                declared: 5,
                actual: 3
            }]
        );

        let state = state.apply(TransferEvent::ChunkWritten { bytes: 3 });
        assert_eq!(state.offset, 3);
    }

    #[test]
    fn test_zero_byte_chunk_aborts() {
        let state = download_started(0).apply(received(10, 0, 0));
        assert_eq!(state.error, Some(TransferError::NoProgress { offset: 0 }));
    }

    #[test]
    fn test_failures_abort_with_reason() {
        let status = ApiStatus::failure(404, "not found");
        let state = download_started(0).apply(TransferEvent::Rejected(status.clone()));
        assert_eq!(state.phase, TransferPhase::Aborted);
        assert_eq!(state.error, Some(TransferError::Rejected { status }));

        let state = download_started(0).apply(TransferEvent::TransportFailed("reset".into()));
        assert!(matches!(state.error, Some(TransferError::Transport { .. })));

        let state = download_started(0).apply(TransferEvent::IoFailed("disk full".into()));
        assert!(matches!(state.error, Some(TransferError::Io { .. })));
    }

    #[test]
    fn test_terminal_states_ignore_events() {
        let aborted = download_started(0).apply(TransferEvent::TransportFailed("x".into()));
        let after = aborted.clone().apply(TransferEvent::ChunkWritten { bytes: 5 });
        assert_eq!(after, aborted);

        let idle = TransferState::new(Direction::Download);
        assert_eq!(idle.clone().apply(TransferEvent::ChunkWritten { bytes: 1 }), idle);
    }

    #[test]
    fn test_offset_never_decreases() {
        let mut state = download_started(3);
        let mut last = state.offset;
        for _ in 0..3 {
            state = state
                .apply(received(9, 2, 2))
                .apply(TransferEvent::ChunkWritten { bytes: 2 });
            assert!(state.offset >= last);
            last = state.offset;
        }
        assert!(state.is_done());
        assert_eq!(state.offset, 9);
    }

    #[test]
    fn test_upload_flow() {
        let state = TransferState::new(Direction::Upload)
            .apply(TransferEvent::Start {
                offset: 0,
                object_size: Some(7),
            })
            .apply(TransferEvent::ChunkSent {
                sent: 4,
                acknowledged: Some(4),
            });
        assert_eq!(state.phase, TransferPhase::InProgress);

        let state = state.apply(TransferEvent::ChunkSent {
            sent: 3,
            acknowledged: None,
        });
        assert!(state.is_done());
        assert!(state.integrity.is_empty());
    }

    #[test]
    fn test_upload_ack_mismatch_flagged() {
        let state = TransferState::new(Direction::Upload)
            .apply(TransferEvent::Start {
                offset: 0,
                object_size: Some(4),
            })
            .apply(TransferEvent::ChunkSent {
                sent: 4,
                acknowledged: Some(2),
            });
        assert!(state.is_done());
        assert_eq!(state.integrity.len(), 1);
        assert!(state.into_outcome().status.message.contains("mismatch"));
    }

    #[test]
    fn test_upload_start_bounds() {
        let state = TransferState::new(Direction::Upload).apply(TransferEvent::Start {
            offset: 8,
            object_size: Some(4),
        });
        assert!(matches!(state.error, Some(TransferError::OutOfRange { .. })));

        let state = TransferState::new(Direction::Upload).apply(TransferEvent::Start {
            offset: 4,
            object_size: Some(4),
        });
        assert!(state.is_done());

        let state = TransferState::new(Direction::Upload).apply(TransferEvent::Start {
            offset: 0,
            object_size: Some(0),
        });
        assert_eq!(state.phase, TransferPhase::InProgress);
        let state = state.apply(TransferEvent::ChunkSent {
            sent: 0,
            acknowledged: None,
        });
        assert!(state.is_done());
    }

    #[test]
    fn test_upload_short_source_aborts() {
        let state = TransferState::new(Direction::Upload)
            .apply(TransferEvent::Start {
                offset: 0,
                object_size: Some(10),
            })
            .apply(TransferEvent::ChunkSent {
                sent: 0,
                acknowledged: None,
            });
        assert_eq!(state.error, Some(TransferError::NoProgress { offset: 0 }));
    }

    #[test]
    fn test_stall_reports_offset_reached() {
        let state = download_started(0)
            .apply(received(10, 4, 4))
            .apply(TransferEvent::ChunkWritten { bytes: 4 })
            .apply(received(10, 4, 0));
        assert_eq!(state.phase, TransferPhase::Aborted);
        assert_eq!(state.error, Some(TransferError::NoProgress { offset: 4 }));

        let state = TransferState::new(Direction::Upload)
            .apply(TransferEvent::Start {
                offset: 2,
                object_size: Some(10),
            })
            .apply(TransferEvent::ChunkSent {
                sent: 3,
                acknowledged: None,
            })
            .apply(TransferEvent::ChunkSent {
                sent: 0,
                acknowledged: None,
            });
        assert_eq!(state.error, Some(TransferError::NoProgress { offset: 5 }));
        assert_eq!(state.into_outcome().offset, 5);
    }

    #[test]
    fn test_outcome_messages() {
        let outcome = download_started(0)
            .apply(received(2, 2, 2))
            .apply(TransferEvent::ChunkWritten { bytes: 2 })
            .into_outcome();
        assert!(outcome.is_done());
        assert_eq!(outcome.status.message, "download ok");

        let outcome = download_started(0)
            .apply(TransferEvent::Rejected(ApiStatus::failure(403, "denied")))
            .into_outcome();
        assert!(!outcome.is_done());
        assert_eq!(outcome.status.code, 403);
        assert_eq!(outcome.status.message, "denied");
    }
}
