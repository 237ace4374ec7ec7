use crate::ClientConfig;
use crate::transport::{READ_BUFFER_CAPACITY, connect_stream, write_frame};
use bytes::BytesMut;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::Instrument;
use vicemon::command::{Command, MonitorEvent};
use vicemon::correlator::{RequestCorrelator, Resolution};
use vicemon::frame::{FrameStreamDecoder, RawResponse};
use vicemon::utils::generate_session_id;
use vicemon::{MonitorCallerInterface, MonitorError, TransportState};

// Handlers are cloned out of their slot before being called, so a handler may
// replace itself (or the other one) without deadlocking.
type StateChangeHandler = Arc<dyn Fn(TransportState) + Send + Sync + 'static>;
type EventHandler = Arc<dyn Fn(MonitorEvent) + Send + Sync + 'static>;

/// State shared between the client and its reader task.
struct ClientShared {
    session_id: u64,
    correlator: StdMutex<RequestCorrelator>,
    is_connected: AtomicBool,
    state_change_handler: StdMutex<Option<StateChangeHandler>>,
    event_handler: StdMutex<Option<EventHandler>>,
}

impl ClientShared {
    fn correlator(&self) -> MutexGuard<'_, RequestCorrelator> {
        self.correlator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state_change_handler(&self) -> Option<StateChangeHandler> {
        self.state_change_handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn event_handler(&self) -> Option<EventHandler> {
        self.event_handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Marks the transport as gone. Only the first call fails the pending
    /// requests and notifies the state handler.
    fn mark_disconnected(&self, error: MonitorError) {
        if !self.is_connected.swap(false, Ordering::SeqCst) {
            return;
        }

        let failed = self.correlator().fail_all(error);
        tracing::debug!(session_id = self.session_id, failed, "Monitor transport disconnected");

        if let Some(handler) = self.state_change_handler() {
            handler(TransportState::Disconnected);
        }
    }

    fn route(&self, frame: RawResponse) {
        let resolution = self.correlator().resolve(frame);

        match resolution {
            Ok(Resolution::Delivered { request_id }) => {
                tracing::trace!(request_id, "Response delivered");
            }
            Ok(Resolution::Buffered { request_id }) => {
                tracing::trace!(request_id, "List item buffered");
            }
            Ok(Resolution::Unsolicited(raw)) => self.dispatch_event(raw),
            Ok(Resolution::Discarded { request_id }) => {
                tracing::warn!(request_id, "Discarding late response to an abandoned request");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Uncorrelated response");
            }
        }
    }

    fn dispatch_event(&self, raw: RawResponse) {
        let event = match MonitorEvent::decode(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable event");
                return;
            }
        };

        tracing::trace!(?event, "Unsolicited event");

        if let Some(handler) = self.event_handler() {
            handler(event);
        }
    }
}

/// A multiplexed connection to the monitor.
///
/// A dedicated reader task decodes every incoming frame and hands it to the
/// correlator, so any number of tasks can have requests in flight at once.
/// Writes are serialized through a mutex around the socket's write half; each
/// caller then waits only for its own response.
///
/// Dropping the client aborts the reader task, fails every pending request
/// with `ConnectionClosed` and reports `Disconnected` to the state handler.
pub struct MonitorClient {
    config: ClientConfig,
    shared: Arc<ClientShared>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    reader_task: JoinHandle<()>,
    span: tracing::Span,
}

impl MonitorClient {
    /// Connects with default timeouts.
    pub async fn new(host: &str, port: u16) -> Result<Self, MonitorError> {
        Self::connect(ClientConfig::new(host, port)).await
    }

    pub async fn connect(config: ClientConfig) -> Result<Self, MonitorError> {
        let session_id = generate_session_id();
        let span = tracing::info_span!("vice_client", session_id);

        let stream = connect_stream(&config).instrument(span.clone()).await?;
        let (read_half, write_half) = stream.into_split();

        let shared = Arc::new(ClientShared {
            session_id,
            correlator: StdMutex::new(RequestCorrelator::new()),
            is_connected: AtomicBool::new(true),
            state_change_handler: StdMutex::new(None),
            event_handler: StdMutex::new(None),
        });

        let writer = Arc::new(Mutex::new(write_half));

        let reader_task = tokio::spawn(
            Self::reader_task(shared.clone(), read_half, writer.clone())
                .instrument(span.clone()),
        );

        Ok(Self {
            config,
            shared,
            writer,
            reader_task,
            span,
        })
    }

    pub fn session_id(&self) -> u64 {
        self.shared.session_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected.load(Ordering::SeqCst)
    }

    /// Number of requests currently waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.shared.correlator().pending_count()
    }

    /// Sets the transport state handler, replacing any previous one.
    ///
    /// The handler is called right away with `Connected` if the transport is
    /// still up, and later with `Disconnected` exactly once. It may call back
    /// into the client, including to replace itself.
    pub fn set_state_change_handler(
        &self,
        handler: impl Fn(TransportState) + Send + Sync + 'static,
    ) {
        let handler: StateChangeHandler = Arc::new(handler);

        let connected = {
            let mut slot = self
                .shared
                .state_change_handler
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = Some(handler.clone());
            self.is_connected()
        };

        if connected {
            handler(TransportState::Connected);
        }
    }

    /// Sets the handler for unsolicited monitor events, replacing any
    /// previous one. Events that arrive with no handler set are dropped.
    pub fn set_event_handler(&self, handler: impl Fn(MonitorEvent) + Send + Sync + 'static) {
        *self
            .shared
            .event_handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::new(handler));
    }

    /// Shuts the connection down. Pending requests fail with
    /// `ConnectionClosed`.
    pub async fn close(&self) {
        self.reader_task.abort();
        let _ = self.writer.lock().await.shutdown().await;
        self.shared.mark_disconnected(MonitorError::ConnectionClosed);
    }

    /// Reads until the stream ends or faults, then fails the client and shuts
    /// the socket down. A corrupt stream is never resynchronized.
    async fn reader_task(
        shared: Arc<ClientShared>,
        read_half: OwnedReadHalf,
        writer: Arc<Mutex<OwnedWriteHalf>>,
    ) {
        let error = Self::read_frames(&shared, read_half).await;
        shared.mark_disconnected(error);

        if let Err(e) = writer.lock().await.shutdown().await {
            tracing::debug!(error = %e, "Socket shutdown failed");
        }
    }

    /// Routes frames until the connection can no longer be read, and returns
    /// the error that pending requests fail with.
    async fn read_frames(shared: &ClientShared, mut read_half: OwnedReadHalf) -> MonitorError {
        let mut decoder = FrameStreamDecoder::new();
        let mut buf = BytesMut::with_capacity(READ_BUFFER_CAPACITY);

        loop {
            buf.clear();

            match read_half.read_buf(&mut buf).await {
                Ok(0) => {
                    tracing::info!("Monitor closed the connection");
                    return MonitorError::ConnectionClosed;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Monitor read failed");
                    return MonitorError::ConnectionClosed;
                }
            }

            for result in decoder.read_bytes(&buf) {
                match result {
                    Ok(frame) => {
                        tracing::debug!(
                            request_id = frame.request_id(),
                            response_type = frame.response_type(),
                            status = frame.status(),
                            body_len = frame.body.len(),
                            "Received frame"
                        );
                        shared.route(frame);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Unrecoverable frame error; closing");
                        return MonitorError::Frame(e);
                    }
                }
            }
        }
    }

    async fn call_inner(&self, command: Command) -> Result<RawResponse, MonitorError> {
        let (request_id, frame, pending) = {
            let mut correlator = self.shared.correlator();

            let request_id = correlator.next_request_id();
            let frame = command.encode_frame(request_id)?;
            let pending = correlator.register_with_items(
                request_id,
                command.expected_response_type(),
                command.item_response_type(),
            )?;

            // Checked under the correlator lock: a teardown that has not run
            // `fail_all` yet will still reach this entry.
            if !self.is_connected() {
                correlator.cancel(request_id);
                return Err(MonitorError::ConnectionClosed);
            }

            (request_id, frame, pending)
        };

        tracing::debug!(
            request_id,
            command = ?command.command_type(),
            frame_len = frame.len(),
            "Sending request"
        );

        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = write_frame(&mut *writer, &frame).await {
                tracing::error!(request_id, error = %e, "Write failed; closing");
                self.reader_task.abort();
                self.shared.mark_disconnected(e.clone());
                let _ = writer.shutdown().await;
                return Err(e);
            }
        }

        let deadline = self.config.request_timeout;
        match timeout(deadline, pending).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.shared.correlator().cancel(request_id);
                tracing::warn!(request_id, ?deadline, "Request timed out");
                Err(MonitorError::Timeout(deadline))
            }
        }
    }
}

impl Drop for MonitorClient {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.shared.mark_disconnected(MonitorError::ConnectionClosed);
    }
}

#[async_trait::async_trait]
impl MonitorCallerInterface for MonitorClient {
    async fn call(&self, command: Command) -> Result<RawResponse, MonitorError> {
        command.validate()?;

        self.call_inner(command)
            .instrument(self.span.clone())
            .await
    }
}
