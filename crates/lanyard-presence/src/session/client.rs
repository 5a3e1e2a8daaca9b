//! Public session API: the client factory and the per-session handle.

use std::sync::Arc;

use lanyard_common::{SessionId, SubjectId, SubjectIdError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::diagnostics::{Diagnostics, TransportKind};
use crate::error::TransportError;
use crate::transport::{HttpFetcher, PresenceFetcher, StreamConnector, WebSocketConnector};

use super::driver::Driver;
use super::emitter::Emitter;
use super::types::{SessionConfig, SessionEvents, SessionPhase};

/// Factory for presence sessions. Cheap to clone; sessions share the
/// transports.
#[derive(Clone)]
pub struct PresenceClient {
    config: SessionConfig,
    connector: Arc<dyn StreamConnector>,
    fetcher: Arc<dyn PresenceFetcher>,
}

impl PresenceClient {
    /// Client backed by the WebSocket gateway and the HTTP API.
    pub fn new(config: SessionConfig) -> Result<Self, TransportError> {
        let fetcher = HttpFetcher::new(&config.api_url, config.request_timeout)?;
        Ok(Self::with_transports(
            config,
            Arc::new(WebSocketConnector),
            Arc::new(fetcher),
        ))
    }

    pub fn with_transports(
        config: SessionConfig,
        connector: Arc<dyn StreamConnector>,
        fetcher: Arc<dyn PresenceFetcher>,
    ) -> Self {
        Self {
            config,
            connector,
            fetcher,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start tracking `subject_id`.
    ///
    /// The id is validated before anything touches the network. When
    /// `prefer_streaming` is false, or no gateway is configured, the session
    /// polls from the start.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        &self,
        subject_id: &str,
        prefer_streaming: bool,
    ) -> Result<(PresenceSession, SessionEvents), SubjectIdError> {
        let subject = SubjectId::parse(subject_id)?;
        let id = SessionId::new();
        let streaming = prefer_streaming && self.config.streaming_supported();

        let diagnostics = if streaming {
            Diagnostics::new(TransportKind::Streaming, self.config.socket_url.clone())
        } else {
            Diagnostics::new(TransportKind::Polling, self.fetcher.endpoint(&subject))
        };
        let initial_phase = if streaming {
            SessionPhase::StreamingConnecting
        } else {
            SessionPhase::PollingActive
        };

        let cancel = CancellationToken::new();
        let (emitter, events) = Emitter::new(cancel.clone(), diagnostics);
        let (phase_tx, phase_rx) = watch::channel(initial_phase);

        let driver = Driver {
            config: self.config.clone(),
            subject: subject.clone(),
            connector: Arc::clone(&self.connector),
            fetcher: Arc::clone(&self.fetcher),
            emitter,
            phase: phase_tx,
            cancel: cancel.clone(),
            retries: 0,
        };

        let span = info_span!("presence_session", session = %id, subject = %subject);
        info!(parent: &span, streaming, "opening presence session");
        let task = tokio::spawn(driver.run(streaming).instrument(span));

        Ok((
            PresenceSession {
                id,
                subject,
                cancel,
                task: Some(task),
                phase: phase_rx,
            },
            events,
        ))
    }
}

/// Handle to a running session. Dropping it cancels the session.
pub struct PresenceSession {
    id: SessionId,
    subject: SubjectId,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    phase: watch::Receiver<SessionPhase>,
}

impl PresenceSession {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Phase changes, for callers that want to await transitions.
    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.phase() == SessionPhase::Closed
    }

    /// Stop the session and wait for its transport to be released.
    ///
    /// Idempotent. Nothing is delivered to observers once this has started.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(session = %self.id, "presence session task failed: {e}");
            }
        }
    }
}

impl Drop for PresenceSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for PresenceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceSession")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("phase", &self.phase())
            .finish()
    }
}
