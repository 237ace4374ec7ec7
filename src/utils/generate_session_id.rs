use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter, initialized at 1, used to tag sessions in logs.
static GLOBAL_SESSION_COUNTER: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));

#[inline]
pub fn generate_session_id() -> u64 {
    GLOBAL_SESSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}
