use crate::frame::FrameHeader;

/// A complete response frame whose body has not been interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub header: FrameHeader,
    pub body: Vec<u8>,

    /// Item frames that arrived under the same request ID ahead of this one.
    /// Only list commands are answered this way; for every other response
    /// this is empty.
    pub items: Vec<RawResponse>,
}

impl RawResponse {
    pub fn new(header: FrameHeader, body: Vec<u8>) -> Self {
        Self {
            header,
            body,
            items: Vec::new(),
        }
    }

    #[inline]
    pub fn request_id(&self) -> u32 {
        self.header.request_id
    }

    #[inline]
    pub fn response_type(&self) -> u8 {
        self.header.kind
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.header.status
    }

    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.header.is_broadcast()
    }
}

/// A decoded request frame: the body with its ID + command type prefix
/// already verified against the header and stripped.
///
/// Clients never receive these; they exist for simulated monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub request_id: u32,
    pub command_type: u8,
    pub payload: Vec<u8>,
}
