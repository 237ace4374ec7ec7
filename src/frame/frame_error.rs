use thiserror::Error;

/// Errors produced while turning bytes into frames.
///
/// Both variants are fatal to the stream they came from: once a header cannot
/// be trusted there is no reliable way to find the start of the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameDecodeError {
    #[error("malformed frame: {0}")]
    MalformedFrame(MalformedFrame),

    #[error("frame length mismatch: header declares {declared} body bytes, received {actual}")]
    FrameLengthMismatch { declared: u32, actual: usize },
}

/// What exactly was wrong with a malformed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedFrame {
    #[error("bad start marker 0x{0:02x}")]
    BadStartMarker(u8),

    #[error("unsupported protocol version 0x{0:02x}")]
    UnsupportedVersion(u8),

    #[error("declared body length {0} exceeds the frame size limit")]
    BodyTooLarge(u32),

    /// A request body is shorter than its ID + command type prefix, or the
    /// prefix disagrees with the header.
    #[error("request body prefix does not match the header")]
    RequestPrefixMismatch,

    /// The decoder already failed once and will not read past the fault.
    #[error("stream already faulted")]
    StreamFaulted,
}

impl From<MalformedFrame> for FrameDecodeError {
    fn from(reason: MalformedFrame) -> Self {
        FrameDecodeError::MalformedFrame(reason)
    }
}
