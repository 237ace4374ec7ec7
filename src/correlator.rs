mod correlation_error;
mod pending_response;
mod request_correlator;

pub use correlation_error::CorrelationError;
pub use pending_response::PendingResponse;
pub use request_correlator::{RequestCorrelator, Resolution};
