use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    #[error("request id {0} is already pending")]
    DuplicateRequestId(u32),

    /// `0` and the broadcast ID are never valid for a request.
    #[error("request id 0x{0:08x} is reserved")]
    ReservedRequestId(u32),

    #[error(
        "response type 0x{actual:02x} for request {request_id} does not match expected 0x{expected:02x}"
    )]
    ResponseTypeMismatch {
        request_id: u32,
        expected: u8,
        actual: u8,
    },

    #[error("unexpected response type 0x{response_type:02x} for unknown request {request_id}")]
    UnexpectedResponse { request_id: u32, response_type: u8 },
}
