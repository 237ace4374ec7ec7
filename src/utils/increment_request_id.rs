use crate::constants::{BROADCAST_REQUEST_ID, FIRST_REQUEST_ID};

/// Returns the request ID that follows `current`.
///
/// The sequence is strictly increasing until it would reach the broadcast ID,
/// at which point it wraps back to [`FIRST_REQUEST_ID`]. Neither `0` nor the
/// broadcast ID is ever produced.
#[inline]
pub fn increment_request_id(current: u32) -> u32 {
    match current.wrapping_add(1) {
        BROADCAST_REQUEST_ID | 0 => FIRST_REQUEST_ID,
        next => next,
    }
}
