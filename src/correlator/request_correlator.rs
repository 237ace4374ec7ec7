use crate::constants::{BROADCAST_REQUEST_ID, FIRST_REQUEST_ID, MAX_ABANDONED_REQUESTS, STATUS_OK};
use crate::correlator::{CorrelationError, PendingResponse};
use crate::error::MonitorError;
use crate::frame::RawResponse;
use crate::utils::increment_request_id;
use futures::channel::oneshot;
use std::collections::{HashMap, VecDeque};

struct PendingEntry {
    expected_type: u8,
    item_type: Option<u8>,
    items: Vec<RawResponse>,
    responder: oneshot::Sender<Result<RawResponse, MonitorError>>,
}

/// What `resolve` did with a frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Handed to the caller that registered `request_id`.
    Delivered { request_id: u32 },

    /// An item frame of a list reply. Held until the frame that ends the
    /// list arrives.
    Buffered { request_id: u32 },

    /// Broadcast frame not tied to any request. Returned so the caller layer
    /// can log or forward it.
    Unsolicited(RawResponse),

    /// Late response to a request that was cancelled, or whose caller went
    /// away. Dropped.
    Discarded { request_id: u32 },
}

/// Matches incoming responses to the requests that are waiting for them.
///
/// The correlator does no I/O. A session registers each request before
/// sending it and feeds every decoded frame to [`resolve`](Self::resolve);
/// the correlator routes the frame to the single caller that owns its ID.
pub struct RequestCorrelator {
    next_id: u32,
    pending: HashMap<u32, PendingEntry>,
    abandoned: VecDeque<u32>,
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::starting_at(FIRST_REQUEST_ID)
    }

    /// A correlator whose first issued ID is `first_id`. Reserved values are
    /// replaced with [`FIRST_REQUEST_ID`].
    pub fn starting_at(first_id: u32) -> Self {
        let next_id = match first_id {
            0 | BROADCAST_REQUEST_ID => FIRST_REQUEST_ID,
            id => id,
        };

        Self {
            next_id,
            pending: HashMap::new(),
            abandoned: VecDeque::new(),
        }
    }

    /// Issues the next request ID. Strictly increasing until the 32-bit space
    /// is exhausted, then wraps back to [`FIRST_REQUEST_ID`].
    pub fn next_request_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = increment_request_id(id);
        id
    }

    /// Records a request as in flight and returns the handle its caller
    /// waits on.
    pub fn register(
        &mut self,
        request_id: u32,
        expected_type: u8,
    ) -> Result<PendingResponse, CorrelationError> {
        self.register_with_items(request_id, expected_type, None)
    }

    /// Like [`register`](Self::register), for a request answered by any
    /// number of `item_type` frames followed by one `expected_type` frame.
    /// The items are delivered in arrival order in
    /// [`RawResponse::items`](crate::frame::RawResponse::items).
    pub fn register_with_items(
        &mut self,
        request_id: u32,
        expected_type: u8,
        item_type: Option<u8>,
    ) -> Result<PendingResponse, CorrelationError> {
        if request_id == 0 || request_id == BROADCAST_REQUEST_ID {
            return Err(CorrelationError::ReservedRequestId(request_id));
        }

        if self.pending.contains_key(&request_id) {
            return Err(CorrelationError::DuplicateRequestId(request_id));
        }

        // A reissued ID (after wraparound) must not inherit a stale discard.
        self.abandoned.retain(|id| *id != request_id);

        let (responder, receiver) = oneshot::channel();
        self.pending.insert(
            request_id,
            PendingEntry {
                expected_type,
                item_type,
                items: Vec::new(),
                responder,
            },
        );

        Ok(PendingResponse::new(request_id, receiver))
    }

    /// Routes one decoded frame.
    ///
    /// A type mismatch still consumes the pending entry: the waiting caller
    /// receives the mismatch error, and the same error is returned here so
    /// the session can log it.
    pub fn resolve(&mut self, response: RawResponse) -> Result<Resolution, CorrelationError> {
        let request_id = response.request_id();

        if response.is_broadcast() {
            return Ok(Resolution::Unsolicited(response));
        }

        if let Some(entry) = self.pending.get_mut(&request_id) {
            if entry.item_type == Some(response.response_type()) && response.status() == STATUS_OK {
                entry.items.push(response);
                return Ok(Resolution::Buffered { request_id });
            }
        }

        let Some(mut entry) = self.pending.remove(&request_id) else {
            if let Some(pos) = self.abandoned.iter().position(|id| *id == request_id) {
                self.abandoned.remove(pos);
                return Ok(Resolution::Discarded { request_id });
            }

            return Err(CorrelationError::UnexpectedResponse {
                request_id,
                response_type: response.response_type(),
            });
        };

        if entry.expected_type != response.response_type() {
            let err = CorrelationError::ResponseTypeMismatch {
                request_id,
                expected: entry.expected_type,
                actual: response.response_type(),
            };
            let _ = entry.responder.send(Err(err.clone().into()));
            return Err(err);
        }

        let mut response = response;
        response.items = std::mem::take(&mut entry.items);

        match entry.responder.send(Ok(response)) {
            Ok(()) => Ok(Resolution::Delivered { request_id }),
            // The caller stopped waiting without cancelling.
            Err(_) => Ok(Resolution::Discarded { request_id }),
        }
    }

    /// Stops waiting for `request_id`. A response that arrives for it later is
    /// discarded rather than reported as unexpected.
    ///
    /// Returns `false` if the request was not pending.
    pub fn cancel(&mut self, request_id: u32) -> bool {
        if self.pending.remove(&request_id).is_none() {
            return false;
        }

        if self.abandoned.len() >= MAX_ABANDONED_REQUESTS {
            self.abandoned.pop_front();
        }
        self.abandoned.push_back(request_id);

        true
    }

    /// Fails every pending request with `error`, exactly once each, and
    /// returns how many there were.
    pub fn fail_all(&mut self, error: MonitorError) -> usize {
        let count = self.pending.len();

        for (_, entry) in self.pending.drain() {
            let _ = entry.responder.send(Err(error.clone()));
        }
        self.abandoned.clear();

        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request_id: u32) -> bool {
        self.pending.contains_key(&request_id)
    }
}
