//! Tokio TCP transport for the VICE binary monitor.
//!
//! Two clients share the same framing and correlation core:
//!
//! - [`Session`] serializes requests. Each call writes its request and reads
//!   frames until its own response arrives. Unsolicited events are queued.
//! - [`MonitorClient`] multiplexes. A background task reads and routes every
//!   frame, so concurrent callers each wait only for their own response.
//!
//! Both implement [`vicemon::MonitorCallerInterface`].

mod config;
mod monitor_client;
mod session;
mod transport;

pub use config::{
    ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MONITOR_HOST, DEFAULT_REQUEST_TIMEOUT,
    ENV_CONNECT_TIMEOUT_MS, ENV_MONITOR_HOST, ENV_MONITOR_PORT, ENV_REQUEST_TIMEOUT_MS,
};
pub use monitor_client::MonitorClient;
pub use session::{MAX_QUEUED_EVENTS, Session, SessionCloser, SessionState};
