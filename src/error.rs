use crate::command::{CommandType, ErrorCode};
use crate::correlator::CorrelationError;
use crate::frame::FrameDecodeError;
use std::time::Duration;
use thiserror::Error;

/// Every way a monitor operation can fail.
///
/// Variants fall into five groups:
///
/// - **Connection** (`ConnectionRefused`, `ConnectionClosed`, `WriteFailed`):
///   the session is gone and every pending request fails. `Timeout` belongs
///   here too, but a request that times out is only abandoned; the connection
///   itself stays up.
/// - **Frame** (`Frame`): the byte stream can no longer be trusted; the session
///   closes rather than trying to resynchronize.
/// - **Correlation** (`Correlation`): a response could not be matched to its
///   request. Only the affected call fails.
/// - **Remote** (`Remote`, `UnknownRemoteError`): the monitor answered with a
///   non-zero status.
/// - **Validation** (`Validation`): rejected before any bytes were sent.
///
/// `MalformedResponseBody` / `MalformedRequestBody` report a body that does
/// not match its command's schema. The frame boundaries were intact, so the
/// stream is still usable.
///
/// The type is `Clone` so a teardown can hand the same error to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error(transparent)]
    Frame(#[from] FrameDecodeError),

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error("monitor rejected {command:?}: {code:?}")]
    Remote { command: CommandType, code: ErrorCode },

    #[error("monitor rejected {command:?} with unknown error code 0x{code:02x}")]
    UnknownRemoteError { command: CommandType, code: u8 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("malformed body for response type 0x{response_type:02x}: {reason}")]
    MalformedResponseBody {
        response_type: u8,
        reason: &'static str,
    },

    #[error("malformed payload for command type 0x{command_type:02x}: {reason}")]
    MalformedRequestBody {
        command_type: u8,
        reason: &'static str,
    },
}

impl MonitorError {
    /// Whether the session that produced this error must be reconnected
    /// before it can be used again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::ConnectionRefused(_)
                | MonitorError::ConnectionClosed
                | MonitorError::WriteFailed(_)
                | MonitorError::Frame(_)
        )
    }

    /// Maps a non-zero status byte onto the remote error taxonomy.
    pub fn from_status(command: CommandType, status: u8) -> Self {
        match ErrorCode::from(status) {
            ErrorCode::Unrecognized(code) => MonitorError::UnknownRemoteError { command, code },
            code => MonitorError::Remote { command, code },
        }
    }
}

/// Caller-supplied arguments that can never produce a valid request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid range: {0}")]
    InvalidRange(&'static str),

    #[error("keyboard text is {0} bytes; at most 255 fit in one request")]
    TextTooLong(usize),

    #[error("{field} has length {len}, which does not fit its length field")]
    Overflow { field: &'static str, len: usize },
}
