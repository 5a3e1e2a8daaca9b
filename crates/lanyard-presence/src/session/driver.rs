//! The session state machine.
//!
//! ```text
//! Connecting ──Hello──▶ Active ──close/error──▶ Reconnecting ──delay──▶ Connecting
//!     │                                              │
//!     └──creation error──▶ Polling ◀──retries exhausted┘
//! ```
//!
//! Polling is terminal: once a session has degraded it never goes back to
//! the gateway.

use std::sync::Arc;
use std::time::Duration;

use lanyard_common::SubjectId;
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::{interval, interval_at, sleep, sleep_until, timeout, timeout_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::diagnostics::TransportKind;
use crate::error::{ErrorKind, PresenceError, TransportError};
use crate::protocol::{GatewayMessage, Subscription};
use crate::response;
use crate::snapshot::PresenceSnapshot;
use crate::transport::{PresenceFetcher, StreamConnection, StreamConnector};

use super::emitter::Emitter;
use super::frames::{self, Inbound};
use super::types::{SessionConfig, SessionPhase};

/// Upper bound on a graceful close before the connection is just dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

enum Step {
    Connect,
    Reconnect(Duration),
    Poll,
    Stop,
}

enum ConnectionEnd {
    Failed,
    Cancelled,
}

pub(crate) struct Driver {
    pub(crate) config: SessionConfig,
    pub(crate) subject: SubjectId,
    pub(crate) connector: Arc<dyn StreamConnector>,
    pub(crate) fetcher: Arc<dyn PresenceFetcher>,
    pub(crate) emitter: Emitter,
    pub(crate) phase: watch::Sender<SessionPhase>,
    pub(crate) cancel: CancellationToken,
    /// Consecutive streaming failures since the last Hello.
    pub(crate) retries: u32,
}

impl Driver {
    pub(crate) async fn run(mut self, streaming: bool) {
        let mut step = if streaming { Step::Connect } else { Step::Poll };
        loop {
            step = match step {
                Step::Connect => self.connect().await,
                Step::Reconnect(delay) => self.wait_reconnect(delay).await,
                Step::Poll => {
                    self.poll().await;
                    Step::Stop
                }
                Step::Stop => break,
            };
        }
        self.set_phase(SessionPhase::Closed);
        info!(attempts = self.emitter.attempts(), "presence session closed");
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.phase.send_replace(phase);
    }

    // -----------------------------------------------------------------------
    // Streaming
    // -----------------------------------------------------------------------

    async fn connect(&mut self) -> Step {
        self.set_phase(SessionPhase::StreamingConnecting);
        let url = self.config.socket_url.clone();
        let attempt = self.emitter.record_attempt(TransportKind::Streaming, &url);
        debug!(attempt, %url, "connecting to presence gateway");

        let deadline = Instant::now() + self.config.handshake_timeout;
        let connected = tokio::select! {
            _ = self.cancel.cancelled() => return Step::Stop,
            result = timeout_at(deadline, self.connector.connect(&url)) => match result {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.config.handshake_timeout)),
            },
        };

        let mut conn = match connected {
            Ok(conn) => conn,
            Err(TransportError::Creation(reason)) => {
                warn!(%reason, "gateway connection could not be created, switching to REST polling");
                self.emitter.error(
                    PresenceError::new(ErrorKind::TransportCreation, "WebSocket Creation Error", &url)
                        .at_attempt(attempt)
                        .with_details(json!({ "error": reason })),
                );
                return Step::Poll;
            }
            Err(e) => {
                error!(attempt, "gateway connection failed: {e}");
                self.report_network(&url, attempt, &e);
                return self.after_stream_failure();
            }
        };

        let end = self.drive_connection(conn.as_mut(), deadline, attempt).await;
        if timeout(CLOSE_TIMEOUT, conn.close()).await.is_err() {
            debug!("gateway close timed out");
        }
        drop(conn);

        match end {
            ConnectionEnd::Cancelled => Step::Stop,
            ConnectionEnd::Failed => self.after_stream_failure(),
        }
    }

    async fn drive_connection(
        &mut self,
        conn: &mut dyn StreamConnection,
        handshake_deadline: Instant,
        attempt: u32,
    ) -> ConnectionEnd {
        let url = self.config.socket_url.clone();
        let mut heartbeat: Option<Interval> = None;
        let handshake = sleep_until(handshake_deadline);
        tokio::pin!(handshake);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return ConnectionEnd::Cancelled,

                _ = &mut handshake, if heartbeat.is_none() => {
                    warn!(timeout = ?self.config.handshake_timeout, "no hello from gateway");
                    self.report_network(&url, attempt, &TransportError::Timeout(self.config.handshake_timeout));
                    return ConnectionEnd::Failed;
                }

                _ = next_heartbeat(&mut heartbeat) => {
                    if let Err(e) = conn.send_text(GatewayMessage::heartbeat().to_text()).await {
                        warn!("heartbeat send failed: {e}");
                        self.report_network(&url, attempt, &e);
                        return ConnectionEnd::Failed;
                    }
                    trace!("heartbeat sent");
                }

                frame = conn.next_text() => match frame {
                    None => {
                        info!("gateway closed the connection");
                        return ConnectionEnd::Failed;
                    }
                    Some(Err(e)) => {
                        warn!("gateway connection error: {e}");
                        self.report_network(&url, attempt, &e);
                        return ConnectionEnd::Failed;
                    }
                    Some(Ok(text)) => {
                        if let Err(end) = self.handle_frame(conn, &text, &mut heartbeat).await {
                            return end;
                        }
                    }
                },
            }
        }
    }

    async fn handle_frame(
        &mut self,
        conn: &mut dyn StreamConnection,
        text: &str,
        heartbeat: &mut Option<Interval>,
    ) -> Result<(), ConnectionEnd> {
        let (raw, frame) = frames::decode(text);
        self.emitter
            .record_response(raw.unwrap_or_else(|| Value::String(text.to_string())));
        let url = self.config.socket_url.clone();

        match frame {
            Err(e) => {
                warn!("discarding gateway frame: {e}");
                self.emitter.error(
                    PresenceError::new(ErrorKind::Protocol, "WebSocket Message Error", &url)
                        .at_attempt(self.emitter.attempts())
                        .with_details(json!({ "error": e.to_string(), "event": text })),
                );
            }
            Ok(Inbound::Hello { heartbeat_interval }) => {
                let init = GatewayMessage::initialize(&Subscription::one(self.subject.as_str()));
                if let Err(e) = conn.send_text(init.to_text()).await {
                    warn!("subscribe failed: {e}");
                    self.report_network(&url, self.emitter.attempts(), &e);
                    return Err(ConnectionEnd::Failed);
                }

                let mut ticker = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *heartbeat = Some(ticker);

                self.retries = 0;
                self.set_phase(SessionPhase::StreamingActive);
                info!(heartbeat_ms = heartbeat_interval.as_millis() as u64, "gateway session active");
            }
            Ok(Inbound::Presence { event, data }) => {
                if data.discord_user.id != self.subject.as_str() {
                    debug!(%event, other = %data.discord_user.id, "ignoring presence for another subject");
                    return Ok(());
                }
                let snapshot = PresenceSnapshot::from(*data);
                debug!(%event, status = %snapshot.status, "presence snapshot");
                self.emitter.snapshot(snapshot);
            }
            Ok(Inbound::Missing { event }) => {
                info!(%event, "subject is not tracked by the gateway");
                self.emitter.error(
                    PresenceError::new(ErrorKind::NotFound, "User Not Found", &url)
                        .at_attempt(self.emitter.attempts())
                        .with_details(json!({ "event": event })),
                );
                self.emitter.finish_loading();
            }
            Ok(Inbound::Ignored { event }) => {
                trace!(?event, "ignoring gateway event");
            }
        }
        Ok(())
    }

    fn report_network(&self, url: &str, attempt: u32, error: &TransportError) {
        self.emitter.error(
            PresenceError::new(ErrorKind::Network, "WebSocket Connection Error", url)
                .at_attempt(attempt)
                .with_details(json!({ "error": error.to_string() })),
        );
    }

    fn after_stream_failure(&mut self) -> Step {
        self.retries += 1;
        if self.retries < self.config.max_retries {
            Step::Reconnect(self.config.reconnect_delay(self.retries - 1))
        } else {
            warn!(
                retries = self.retries,
                "gateway unavailable, falling back to REST polling"
            );
            Step::Poll
        }
    }

    async fn wait_reconnect(&mut self, delay: Duration) -> Step {
        self.set_phase(SessionPhase::StreamingReconnecting {
            retry: self.retries,
            delay,
        });
        info!(retry = self.retries, delay_ms = delay.as_millis() as u64, "reconnecting to gateway");
        tokio::select! {
            _ = self.cancel.cancelled() => Step::Stop,
            _ = sleep(delay) => Step::Connect,
        }
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    async fn poll(&mut self) {
        self.set_phase(SessionPhase::PollingActive);
        let endpoint = self.fetcher.endpoint(&self.subject);
        let period = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        info!(%endpoint, interval_secs = period.as_secs(), "polling presence over REST");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let attempt = self.emitter.record_attempt(TransportKind::Polling, &endpoint);
            let fetched = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.fetcher.fetch(&self.subject) => result,
            };

            match fetched {
                Ok(resp) => {
                    let (raw, outcome) = response::interpret(&endpoint, &resp);
                    self.emitter.record_response(raw);
                    match outcome {
                        Ok(snapshot) => {
                            debug!(attempt, status = %snapshot.status, "presence fetched");
                            self.emitter.snapshot(snapshot);
                        }
                        Err(e) => {
                            debug!(attempt, code = e.code(), "presence fetch rejected");
                            self.emitter.error(e.at_attempt(attempt));
                        }
                    }
                }
                Err(e) => {
                    warn!(attempt, "presence fetch failed: {e}");
                    self.emitter.error(
                        PresenceError::new(
                            ErrorKind::Network,
                            "Network Error: Failed to reach Lanyard API",
                            &endpoint,
                        )
                        .at_attempt(attempt)
                        .with_details(json!({ "error": e.to_string() })),
                    );
                }
            }
            self.emitter.finish_loading();
        }
    }
}

/// Resolves on the next heartbeat tick; never resolves before Hello.
async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
