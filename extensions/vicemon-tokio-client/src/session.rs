use crate::ClientConfig;
use crate::transport::{FrameReader, connect_stream, write_frame};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;
use tracing::Instrument;
use vicemon::command::{Command, MonitorEvent};
use vicemon::correlator::{CorrelationError, PendingResponse, RequestCorrelator, Resolution};
use vicemon::frame::RawResponse;
use vicemon::utils::generate_session_id;
use vicemon::{MonitorCallerInterface, MonitorError};

/// Events kept for [`Session::drain_events`] before the oldest are dropped.
pub const MAX_QUEUED_EVENTS: usize = 1024;

/// Lifecycle of a [`Session`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SessionState {
    /// No socket. Seen while a reconnect is in progress.
    Disconnected,
    Connected,
    /// Closed by the user or by a fault. Only `reconnect` leaves this state.
    Closed,
}

/// Closes a [`Session`] from another task.
///
/// Closing only flips the shared state; a `receive_frame` or `call` blocked on
/// the socket notices, unblocks with `ConnectionClosed` and tears the
/// connection down itself.
#[derive(Clone)]
pub struct SessionCloser {
    session_id: u64,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl SessionCloser {
    pub fn close(&self) {
        let previous = self.state_tx.send_replace(SessionState::Closed);
        if previous != SessionState::Closed {
            tracing::debug!(session_id = self.session_id, "Session close requested");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.state_tx.borrow() == SessionState::Closed
    }
}

struct SessionInner {
    stream: Option<TcpStream>,
    reader: FrameReader,
    correlator: RequestCorrelator,
}

/// A serialized connection to the monitor: one request in flight at a time.
///
/// Each [`call`](MonitorCallerInterface::call) registers its request, writes
/// it, then reads frames until its own ID resolves. Unsolicited frames read
/// along the way are queued as [`MonitorEvent`]s.
///
/// Any connection or framing failure closes the session and fails whatever
/// was pending. A closed session rejects further calls with
/// `ConnectionClosed` until [`reconnect`](Self::reconnect) succeeds.
pub struct Session {
    session_id: u64,
    config: ClientConfig,
    inner: Mutex<SessionInner>,
    state_tx: Arc<watch::Sender<SessionState>>,
    events: StdMutex<VecDeque<MonitorEvent>>,
    span: tracing::Span,
}

impl Session {
    /// Connects to the monitor described by `config`.
    pub async fn connect(config: ClientConfig) -> Result<Self, MonitorError> {
        let session_id = generate_session_id();
        let span = tracing::info_span!("vice_session", session_id);

        let stream = connect_stream(&config).instrument(span.clone()).await?;
        let (state_tx, _) = watch::channel(SessionState::Connected);

        Ok(Self {
            session_id,
            config,
            inner: Mutex::new(SessionInner {
                stream: Some(stream),
                reader: FrameReader::new(),
                correlator: RequestCorrelator::new(),
            }),
            state_tx: Arc::new(state_tx),
            events: StdMutex::new(VecDeque::new()),
            span,
        })
    }

    /// Convenience for [`connect`](Self::connect) with default timeouts.
    pub async fn connect_to(host: &str, port: u16) -> Result<Self, MonitorError> {
        Self::connect(ClientConfig::new(host, port)).await
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Watches lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// A handle that can close this session from another task, including
    /// while this session is blocked in a read.
    pub fn closer(&self) -> SessionCloser {
        SessionCloser {
            session_id: self.session_id,
            state_tx: self.state_tx.clone(),
        }
    }

    /// Writes one complete, already encoded frame.
    ///
    /// A write failure closes the session.
    pub async fn send(&self, frame: &[u8]) -> Result<(), MonitorError> {
        let mut inner = self.inner.lock().await;
        self.write_locked(&mut inner, frame)
            .instrument(self.span.clone())
            .await
    }

    /// Reads the next frame, whatever its request ID.
    ///
    /// Returns `ConnectionClosed` on EOF, or as soon as the session is closed
    /// through a [`SessionCloser`]. A malformed header closes the session.
    pub async fn receive_frame(&self) -> Result<RawResponse, MonitorError> {
        let mut inner = self.inner.lock().await;
        self.read_locked(&mut inner)
            .instrument(self.span.clone())
            .await
    }

    /// Closes the socket and fails anything still pending.
    pub async fn close(&self) {
        self.closer().close();

        let mut inner = self.inner.lock().await;
        self.teardown(&mut inner, MonitorError::ConnectionClosed)
            .instrument(self.span.clone())
            .await;
    }

    /// Replaces the connection with a fresh one and a fresh correlator.
    ///
    /// Works from any state; an open connection is closed first.
    pub async fn reconnect(&self) -> Result<(), MonitorError> {
        let mut inner = self.inner.lock().await;

        async {
            self.teardown(&mut inner, MonitorError::ConnectionClosed)
                .await;
            self.state_tx.send_replace(SessionState::Disconnected);

            let stream = match connect_stream(&self.config).await {
                Ok(stream) => stream,
                Err(e) => {
                    self.state_tx.send_replace(SessionState::Closed);
                    return Err(e);
                }
            };

            inner.stream = Some(stream);
            inner.reader.clear();
            inner.correlator = RequestCorrelator::new();
            self.state_tx.send_replace(SessionState::Connected);

            tracing::info!("Session reconnected");

            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }

    /// Takes every unsolicited event received so far, oldest first.
    pub fn drain_events(&self) -> Vec<MonitorEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect()
    }

    async fn call_locked(
        &self,
        inner: &mut SessionInner,
        command: Command,
    ) -> Result<RawResponse, MonitorError> {
        self.ensure_open(inner).await?;

        let request_id = inner.correlator.next_request_id();
        let frame = command.encode_frame(request_id)?;
        let mut pending = inner
            .correlator
            .register_with_items(
                request_id,
                command.expected_response_type(),
                command.item_response_type(),
            )?;

        tracing::debug!(
            request_id,
            command = ?command.command_type(),
            frame_len = frame.len(),
            "Sending request"
        );

        self.write_locked(inner, &frame).await?;

        let deadline = self.config.request_timeout;
        match timeout(deadline, self.await_response(inner, &mut pending)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                // Reads are cancel safe, so the stream is still aligned; only
                // this request is given up on.
                inner.correlator.cancel(request_id);
                tracing::warn!(request_id, ?deadline, "Request timed out");
                Err(MonitorError::Timeout(deadline))
            }
        }
    }

    async fn await_response(
        &self,
        inner: &mut SessionInner,
        pending: &mut PendingResponse,
    ) -> Result<RawResponse, MonitorError> {
        loop {
            if let Some(outcome) = pending.try_take() {
                return outcome;
            }

            let frame = self.read_locked(inner).await?;
            self.route(inner, frame);
        }
    }

    fn route(&self, inner: &mut SessionInner, frame: RawResponse) {
        match inner.correlator.resolve(frame) {
            Ok(Resolution::Delivered { request_id }) => {
                tracing::trace!(request_id, "Response delivered");
            }
            Ok(Resolution::Buffered { request_id }) => {
                tracing::trace!(request_id, "List item buffered");
            }
            Ok(Resolution::Unsolicited(raw)) => self.queue_event(raw),
            Ok(Resolution::Discarded { request_id }) => {
                tracing::warn!(request_id, "Discarding late response to an abandoned request");
            }
            // The waiting caller has already been failed with the mismatch.
            Err(e @ CorrelationError::ResponseTypeMismatch { .. }) => {
                tracing::warn!(error = %e, "Response type mismatch");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring uncorrelated response");
            }
        }
    }

    fn queue_event(&self, raw: RawResponse) {
        let event = match MonitorEvent::decode(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable event");
                return;
            }
        };

        tracing::trace!(?event, "Unsolicited event");

        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if events.len() >= MAX_QUEUED_EVENTS {
            events.pop_front();
            tracing::warn!("Event queue full; dropped the oldest event");
        }
        events.push_back(event);
    }

    /// Turns a close requested through a [`SessionCloser`] into an actual
    /// teardown, and rejects calls on a session that is not connected.
    async fn ensure_open(&self, inner: &mut SessionInner) -> Result<(), MonitorError> {
        if self.state() == SessionState::Connected && inner.stream.is_some() {
            return Ok(());
        }

        self.teardown(inner, MonitorError::ConnectionClosed).await;
        Err(MonitorError::ConnectionClosed)
    }

    async fn write_locked(&self, inner: &mut SessionInner, frame: &[u8]) -> Result<(), MonitorError> {
        self.ensure_open(inner).await?;

        let Some(stream) = inner.stream.as_mut() else {
            return Err(MonitorError::ConnectionClosed);
        };

        if let Err(e) = write_frame(stream, frame).await {
            self.fault(inner, e.clone()).await;
            return Err(e);
        }

        Ok(())
    }

    async fn read_locked(&self, inner: &mut SessionInner) -> Result<RawResponse, MonitorError> {
        self.ensure_open(inner).await?;

        let mut state_rx = self.state_tx.subscribe();
        let SessionInner { stream, reader, .. } = &mut *inner;
        let Some(stream) = stream.as_mut() else {
            return Err(MonitorError::ConnectionClosed);
        };

        let result = tokio::select! {
            frame = reader.read_frame(stream) => frame,
            _ = wait_closed(&mut state_rx) => Err(MonitorError::ConnectionClosed),
        };

        match result {
            Ok(frame) => {
                tracing::debug!(
                    request_id = frame.request_id(),
                    response_type = frame.response_type(),
                    status = frame.status(),
                    body_len = frame.body.len(),
                    "Received frame"
                );
                Ok(frame)
            }
            Err(e) => {
                self.fault(inner, e.clone()).await;
                Err(e)
            }
        }
    }

    async fn fault(&self, inner: &mut SessionInner, error: MonitorError) {
        if self.state() != SessionState::Closed {
            tracing::error!(error = %error, "Session faulted; closing");
        }
        self.closer().close();
        self.teardown(inner, error).await;
    }

    async fn teardown(&self, inner: &mut SessionInner, error: MonitorError) {
        if let Some(mut stream) = inner.stream.take() {
            let _ = stream.shutdown().await;
        }
        inner.reader.clear();

        let failed = inner.correlator.fail_all(error);
        if failed > 0 {
            tracing::debug!(failed, "Failed pending requests on teardown");
        }
    }
}

async fn wait_closed(state_rx: &mut watch::Receiver<SessionState>) {
    // A dropped sender also ends the wait.
    let _ = state_rx
        .wait_for(|state| *state == SessionState::Closed)
        .await;
}

#[async_trait::async_trait]
impl MonitorCallerInterface for Session {
    async fn call(&self, command: Command) -> Result<RawResponse, MonitorError> {
        command.validate()?;

        let mut inner = self.inner.lock().await;
        self.call_locked(&mut inner, command)
            .instrument(self.span.clone())
            .await
    }
}
