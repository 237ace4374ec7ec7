use crate::constants::BROADCAST_REQUEST_ID;

/// The fixed 12-byte header that precedes every frame body.
///
/// The start marker is not stored: it is a constant that is checked on decode
/// and written on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,

    /// Number of body bytes that follow the header.
    pub body_length: u32,

    /// Correlation ID. Responses echo the ID of the request that produced them.
    pub request_id: u32,

    /// Command type for requests, response/event type for responses.
    pub kind: u8,

    /// Zero on success. Always zero on requests.
    pub status: u8,
}

impl FrameHeader {
    /// Unsolicited frames (events) carry the broadcast ID.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.request_id == BROADCAST_REQUEST_ID
    }
}
