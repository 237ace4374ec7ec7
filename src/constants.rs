// Frame header layout
pub const FRAME_HEADER_SIZE: usize = 12;
pub const FRAME_START_MARKER_OFFSET: usize = 0;
pub const FRAME_VERSION_OFFSET: usize = 1;
pub const FRAME_BODY_LENGTH_OFFSET: usize = 2;
pub const FRAME_REQUEST_ID_OFFSET: usize = 6;
pub const FRAME_TYPE_OFFSET: usize = 10;
pub const FRAME_STATUS_OFFSET: usize = 11;

/// Sentinel byte that opens every frame in both directions.
pub const FRAME_START_MARKER: u8 = 0x02;

/// The only protocol version this client speaks. There is no runtime
/// negotiation; a peer announcing anything else is treated as malformed.
pub const FRAME_API_VERSION: u8 = 0x02;

/// Upper bound on a declared body length. Anything larger is rejected as a
/// malformed header before the body is buffered.
pub const MAX_FRAME_BODY_LEN: u32 = 16 * 1024 * 1024;

/// Size of the `u32` request ID + `u8` command type prefix that every request
/// body starts with.
pub const REQUEST_BODY_PREFIX_SIZE: usize = 5;

/// Request ID carried by unsolicited frames (events). Never issued to a request.
pub const BROADCAST_REQUEST_ID: u32 = 0xFFFF_FFFF;

/// First ID handed out by a fresh correlator, and the value the counter wraps
/// back to.
pub const FIRST_REQUEST_ID: u32 = 1;

/// How many cancelled request IDs are remembered so that their late responses
/// can be discarded quietly.
pub const MAX_ABANDONED_REQUESTS: usize = 256;

/// Status byte of a successful response.
pub const STATUS_OK: u8 = 0x00;

pub const DEFAULT_MONITOR_PORT: u16 = 6502;
