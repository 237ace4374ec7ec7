use crate::error::MonitorError;
use crate::frame::RawResponse;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The caller's side of a registered request: a single-slot channel that
/// receives exactly one outcome.
///
/// Awaiting it yields the correlated response or the error that ended the
/// request. If the correlator is dropped without answering, the result is
/// `ConnectionClosed`.
pub struct PendingResponse {
    request_id: u32,
    receiver: oneshot::Receiver<Result<RawResponse, MonitorError>>,
}

impl PendingResponse {
    pub(crate) fn new(
        request_id: u32,
        receiver: oneshot::Receiver<Result<RawResponse, MonitorError>>,
    ) -> Self {
        Self {
            request_id,
            receiver,
        }
    }

    pub fn request_id(&self) -> u32 {
        self.request_id
    }

    /// Non-blocking check used by callers that drive the read loop themselves.
    ///
    /// Returns `None` while the request is still outstanding.
    pub fn try_take(&mut self) -> Option<Result<RawResponse, MonitorError>> {
        match self.receiver.try_recv() {
            Ok(Some(outcome)) => Some(outcome),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(MonitorError::ConnectionClosed)),
        }
    }
}

impl Future for PendingResponse {
    type Output = Result<RawResponse, MonitorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(MonitorError::ConnectionClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
