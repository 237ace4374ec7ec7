use num_enum::{FromPrimitive, IntoPrimitive};

/// Status byte of a response.
///
/// The numeric values are defined by the monitor. Codes this client does not
/// know land in `Unrecognized` instead of failing to decode.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, FromPrimitive, IntoPrimitive)]
pub enum ErrorCode {
    Ok = 0x00,
    ObjectMissing = 0x01,
    InvalidMemspace = 0x02,
    InvalidLength = 0x80,
    InvalidParameter = 0x81,
    UnsupportedApiVersion = 0x82,
    InvalidCommand = 0x83,
    GeneralFailure = 0x8f,
    #[num_enum(catch_all)]
    Unrecognized(u8),
}

impl ErrorCode {
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}
