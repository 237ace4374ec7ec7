//! Client core for the VICE binary monitor protocol.
//!
//! This crate is runtime-agnostic. It knows how to frame requests, decode
//! responses from a byte stream, correlate responses with the requests that
//! produced them, and encode/decode every supported command, but it performs
//! no I/O. A transport (such as `vicemon-tokio-client`) owns the socket and
//! drives these pieces.

pub mod caller;
pub mod command;
pub mod constants;
pub mod correlator;
pub mod error;
pub mod frame;
pub mod utils;

pub use caller::{MonitorCallerInterface, TransportState};
pub use error::{MonitorError, ValidationError};
