use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lanyard_common::{SubjectId, SubjectIdError};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use crate::diagnostics::TransportKind;
use crate::error::{ErrorKind, TransportError};
use crate::snapshot::PresenceStatus;
use crate::transport::{FetchResponse, PresenceFetcher, StreamConnection, StreamConnector};

use super::{PresenceClient, SessionConfig, SessionPhase};

const SUBJECT: &str = "123456789012345678";
const OTHER: &str = "876543210987654321";

// ---------------------------------------------------------------------------
// Mock gateway
// ---------------------------------------------------------------------------

enum Script {
    Accept(MockConnection),
    Fail(TransportError),
}

#[derive(Default)]
struct MockConnector {
    script: Mutex<VecDeque<Script>>,
    connects: Mutex<Vec<Instant>>,
    live: Arc<AtomicUsize>,
    max_live: AtomicUsize,
}

impl MockConnector {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script an accepted connection and return the server side of it.
    fn accept(&self) -> Server {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let fail_sends = Arc::new(AtomicBool::new(false));
        let conn = MockConnection {
            inbound: rx,
            sent: Arc::clone(&sent),
            fail_sends: Arc::clone(&fail_sends),
            live: Arc::clone(&self.live),
            counted: false,
        };
        self.script.lock().unwrap().push_back(Script::Accept(conn));
        Server {
            tx: Some(tx),
            sent,
            fail_sends,
        }
    }

    fn fail(&self, err: TransportError) {
        self.script.lock().unwrap().push_back(Script::Fail(err));
    }

    fn connects(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }

    fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamConnector for MockConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn StreamConnection>, TransportError> {
        self.connects.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Accept(mut conn)) => {
                let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_live.fetch_max(live, Ordering::SeqCst);
                conn.counted = true;
                Ok(Box::new(conn))
            }
            Some(Script::Fail(err)) => Err(err),
            None => Err(TransportError::Network("connection refused".into())),
        }
    }
}

struct MockConnection {
    inbound: mpsc::UnboundedReceiver<String>,
    sent: Arc<Mutex<Vec<String>>>,
    fail_sends: Arc<AtomicBool>,
    live: Arc<AtomicUsize>,
    counted: bool,
}

#[async_trait]
impl StreamConnection for MockConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Network("broken pipe".into()));
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if self.counted {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

struct Server {
    tx: Option<mpsc::UnboundedSender<String>>,
    sent: Arc<Mutex<Vec<String>>>,
    fail_sends: Arc<AtomicBool>,
}

impl Server {
    fn send(&self, text: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(text.into());
        }
    }

    /// Close from the server side once queued frames are consumed.
    fn close(&mut self) {
        self.tx = None;
    }

    /// Every later client send on this connection fails.
    fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Mock REST endpoint
// ---------------------------------------------------------------------------

struct MockFetcher {
    /// The last entry repeats forever.
    responses: Mutex<VecDeque<Result<FetchResponse, TransportError>>>,
    fetches: Mutex<Vec<Instant>>,
    live_streams: Option<Arc<AtomicUsize>>,
    live_at_fetch: Mutex<Vec<usize>>,
}

impl MockFetcher {
    fn new(responses: Vec<Result<FetchResponse, TransportError>>) -> Arc<Self> {
        Self::observing(responses, None)
    }

    fn observing(
        responses: Vec<Result<FetchResponse, TransportError>>,
        live_streams: Option<Arc<AtomicUsize>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            fetches: Mutex::new(Vec::new()),
            live_streams,
            live_at_fetch: Mutex::new(Vec::new()),
        })
    }

    fn fetches(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PresenceFetcher for MockFetcher {
    fn endpoint(&self, subject: &SubjectId) -> String {
        format!("https://api.test/v1/users/{subject}")
    }

    async fn fetch(&self, _subject: &SubjectId) -> Result<FetchResponse, TransportError> {
        self.fetches.lock().unwrap().push(Instant::now());
        if let Some(live) = &self.live_streams {
            self.live_at_fetch.lock().unwrap().push(live.load(Ordering::SeqCst));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Network("unscripted".into())))
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn hello(interval_ms: u64) -> String {
    json!({ "op": 1, "d": { "heartbeat_interval": interval_ms } }).to_string()
}

fn presence_data(id: &str, status: &str) -> Value {
    json!({
        "discord_user": { "id": id, "username": "subject" },
        "discord_status": status,
        "activities": []
    })
}

fn event(t: &str, id: &str, status: &str) -> String {
    json!({ "op": 0, "seq": 1, "t": t, "d": presence_data(id, status) }).to_string()
}

fn rest_ok(status: &str) -> Result<FetchResponse, TransportError> {
    Ok(FetchResponse {
        status: 200,
        body: json!({ "success": true, "data": presence_data(SUBJECT, status) }).to_string(),
    })
}

fn client(
    config: SessionConfig,
    connector: &Arc<MockConnector>,
    fetcher: &Arc<MockFetcher>,
) -> PresenceClient {
    PresenceClient::with_transports(config, connector.clone(), fetcher.clone())
}

fn assert_gap(a: Instant, b: Instant, expected: Duration) {
    let gap = b - a;
    assert!(
        gap >= expected && gap < expected + Duration::from_millis(50),
        "expected gap of {expected:?}, got {gap:?}"
    );
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn hello_then_init_state_yields_one_snapshot_and_heartbeats() {
    let connector = MockConnector::new();
    let server = connector.accept();
    let fetcher = MockFetcher::new(vec![]);
    let client = client(SessionConfig::default(), &connector, &fetcher);

    let (session, mut events) = client.open(SUBJECT, true).unwrap();
    server.send(hello(30_000));
    server.send(event("INIT_STATE", SUBJECT, "online"));

    let snapshot = events.snapshots.recv().await.unwrap();
    assert_eq!(snapshot.status, PresenceStatus::Online);
    assert_eq!(snapshot.subject_id, SUBJECT);
    assert_eq!(session.phase(), SessionPhase::StreamingActive);

    sleep(Duration::from_secs(95)).await;

    let sent = server.sent();
    assert_eq!(sent[0], json!({ "op": 2, "d": { "subscribe_to_id": SUBJECT } }));
    let heartbeats = sent[1..].iter().filter(|f| **f == json!({ "op": 3 })).count();
    assert_eq!(heartbeats, 3);
    assert_eq!(sent.len(), 4);

    assert!(events.snapshots.try_recv().is_err());
    assert!(events.errors.try_recv().is_err());
    assert!(fetcher.fetches().is_empty());

    let view = events.view.borrow().clone();
    assert!(!view.loading);
    assert_eq!(view.diagnostics.transport, TransportKind::Streaming);
    assert_eq!(view.diagnostics.attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn presence_updates_replace_snapshot() {
    let connector = MockConnector::new();
    let server = connector.accept();
    let fetcher = MockFetcher::new(vec![]);
    let (_session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    server.send(hello(30_000));
    server.send(event("INIT_STATE", SUBJECT, "online"));
    server.send(event("PRESENCE_UPDATE", SUBJECT, "dnd"));

    assert_eq!(events.snapshots.recv().await.unwrap().status, PresenceStatus::Online);
    assert_eq!(events.snapshots.recv().await.unwrap().status, PresenceStatus::Dnd);
    let view = events.view.borrow().clone();
    assert_eq!(view.snapshot.unwrap().status, PresenceStatus::Dnd);
}

#[tokio::test(start_paused = true)]
async fn presence_for_other_subject_is_ignored() {
    let connector = MockConnector::new();
    let server = connector.accept();
    let fetcher = MockFetcher::new(vec![]);
    let (_session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    server.send(hello(30_000));
    server.send(event("PRESENCE_UPDATE", OTHER, "idle"));
    server.send(event("PRESENCE_UPDATE", SUBJECT, "online"));

    let snapshot = events.snapshots.recv().await.unwrap();
    assert_eq!(snapshot.subject_id, SUBJECT);
    assert_eq!(snapshot.status, PresenceStatus::Online);
}

#[tokio::test(start_paused = true)]
async fn three_closes_fall_back_to_polling() {
    let connector = MockConnector::new();
    for _ in 0..3 {
        let mut server = connector.accept();
        server.close();
    }
    let fetcher = MockFetcher::observing(vec![rest_ok("idle")], Some(Arc::clone(&connector.live)));
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    let snapshot = events.snapshots.recv().await.unwrap();
    assert_eq!(snapshot.status, PresenceStatus::Idle);
    assert_eq!(session.phase(), SessionPhase::PollingActive);

    let connects = connector.connects();
    assert_eq!(connects.len(), 3);
    assert_gap(connects[0], connects[1], Duration::from_secs(2));
    assert_gap(connects[1], connects[2], Duration::from_secs(4));

    // Clean closes are not errors.
    assert!(events.errors.try_recv().is_err());

    let view = events.view.borrow().clone();
    assert_eq!(view.diagnostics.transport, TransportKind::Polling);
    assert_eq!(view.diagnostics.attempts, 4);
    assert_eq!(view.diagnostics.last_endpoint, format!("https://api.test/v1/users/{SUBJECT}"));
    assert_eq!(fetcher.fetches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn only_one_transport_is_active_at_a_time() {
    let connector = MockConnector::new();
    for _ in 0..3 {
        let mut server = connector.accept();
        server.send(hello(30_000));
        server.close();
    }
    connector.fail(TransportError::Network("refused".into()));
    connector.fail(TransportError::Network("refused".into()));
    let fetcher = MockFetcher::observing(vec![rest_ok("online")], Some(Arc::clone(&connector.live)));
    let (_session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    events.snapshots.recv().await.unwrap();
    assert_eq!(connector.max_live.load(Ordering::SeqCst), 1);
    assert_eq!(*fetcher.live_at_fetch.lock().unwrap(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn hello_resets_retry_budget() {
    let connector = MockConnector::new();
    for _ in 0..3 {
        let mut server = connector.accept();
        server.send(hello(30_000));
        server.close();
    }
    let last = connector.accept();
    last.send(hello(30_000));
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let (session, _events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    sleep(Duration::from_secs(20)).await;

    let connects = connector.connects();
    assert_eq!(connects.len(), 4);
    // Every failure is the first since a Hello, so every delay is the base.
    for pair in connects.windows(2) {
        assert_gap(pair[0], pair[1], Duration::from_secs(2));
    }
    assert_eq!(session.phase(), SessionPhase::StreamingActive);
    assert!(fetcher.fetches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn creation_error_goes_straight_to_polling() {
    let connector = MockConnector::new();
    connector.fail(TransportError::Creation("invalid url".into()));
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::TransportCreation);
    assert_eq!(err.code(), "WS_CREATION_ERROR");
    assert_eq!(err.attempt, 1);

    events.snapshots.recv().await.unwrap();
    assert_eq!(connector.connects().len(), 1);
    assert_eq!(session.phase(), SessionPhase::PollingActive);
}

#[tokio::test(start_paused = true)]
async fn network_failures_are_reported_and_retried() {
    let connector = MockConnector::new();
    connector.fail(TransportError::Network("refused".into()));
    let server = connector.accept();
    server.send(hello(30_000));
    server.send(event("INIT_STATE", SUBJECT, "online"));
    let fetcher = MockFetcher::new(vec![]);
    let (_session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::Network);
    assert!(err.kind.is_transient());
    assert_eq!(err.attempt, 1);

    events.snapshots.recv().await.unwrap();
    let connects = connector.connects();
    assert_gap(connects[0], connects[1], Duration::from_secs(2));
    // The snapshot clears the error.
    assert!(events.view.borrow().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn heartbeat_send_failure_reconnects() {
    let connector = MockConnector::new();
    let first = connector.accept();
    let second = connector.accept();
    second.send(hello(30_000));
    let fetcher = MockFetcher::new(vec![]);
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    first.send(hello(30_000));
    first.send(event("INIT_STATE", SUBJECT, "online"));
    events.snapshots.recv().await.unwrap();
    first.fail_sends();

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(err.attempt, 1);

    sleep(Duration::from_secs(3)).await;
    let connects = connector.connects();
    assert_eq!(connects.len(), 2);
    // First heartbeat is due 30 s after Hello, then the base reconnect delay.
    assert_gap(connects[0], connects[1], Duration::from_secs(32));
    assert_eq!(first.sent().len(), 1);
    assert_eq!(session.phase(), SessionPhase::StreamingActive);
    assert_eq!(connector.live(), 1);
    assert!(fetcher.fetches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn subscribe_send_failure_reconnects() {
    let connector = MockConnector::new();
    let first = connector.accept();
    first.fail_sends();
    first.send(hello(30_000));
    let second = connector.accept();
    second.send(hello(30_000));
    let fetcher = MockFetcher::new(vec![]);
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(err.code(), "NETWORK_ERROR");

    sleep(Duration::from_secs(3)).await;
    let connects = connector.connects();
    assert_eq!(connects.len(), 2);
    assert_gap(connects[0], connects[1], Duration::from_secs(2));
    assert!(first.sent().is_empty());
    assert_eq!(
        second.sent()[0],
        json!({ "op": 2, "d": { "subscribe_to_id": SUBJECT } })
    );
    assert_eq!(session.phase(), SessionPhase::StreamingActive);
}

#[tokio::test(start_paused = true)]
async fn missing_hello_times_out_the_handshake() {
    let connector = MockConnector::new();
    let _silent = connector.accept();
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let config = SessionConfig {
        max_retries: 1,
        ..SessionConfig::default()
    };
    let (_session, mut events) = client(config, &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::Network);

    events.snapshots.recv().await.unwrap();
    assert_gap(connector.connects()[0], fetcher.fetches()[0], Duration::from_secs(15));
    assert_eq!(connector.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_is_not_fatal() {
    let connector = MockConnector::new();
    let server = connector.accept();
    let fetcher = MockFetcher::new(vec![]);
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    server.send(hello(30_000));
    server.send("{ not json");
    server.send(event("INIT_STATE", SUBJECT, "online"));

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::Protocol);
    assert_eq!(err.code(), "WS_MESSAGE_ERROR");
    assert_eq!(err.details.as_ref().unwrap()["event"], "{ not json");

    events.snapshots.recv().await.unwrap();
    assert_eq!(connector.connects().len(), 1);
    assert_eq!(session.phase(), SessionPhase::StreamingActive);
}

#[tokio::test(start_paused = true)]
async fn null_gateway_payload_is_not_found() {
    let connector = MockConnector::new();
    let server = connector.accept();
    let fetcher = MockFetcher::new(vec![]);
    let (_session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    server.send(hello(30_000));
    server.send(json!({ "op": 0, "t": "INIT_STATE", "d": null }).to_string());

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(events.snapshots.try_recv().is_err());
    assert!(!events.view.borrow().loading);
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn null_rest_data_is_not_found_and_polling_continues() {
    let connector = MockConnector::new();
    let not_found = Ok(FetchResponse {
        status: 200,
        body: json!({ "success": true, "data": null }).to_string(),
    });
    let fetcher = MockFetcher::new(vec![not_found]);
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, false)
        .unwrap();

    let first = events.errors.recv().await.unwrap();
    assert_eq!(first.kind, ErrorKind::NotFound);
    assert_eq!(first.attempt, 1);

    let second = events.errors.recv().await.unwrap();
    assert_eq!(second.kind, ErrorKind::NotFound);
    assert_eq!(second.attempt, 2);

    let fetches = fetcher.fetches();
    assert_gap(fetches[0], fetches[1], Duration::from_secs(30));
    assert!(events.snapshots.try_recv().is_err());
    assert!(connector.connects().is_empty());
    assert_eq!(session.phase(), SessionPhase::PollingActive);

    let view = events.view.borrow().clone();
    assert!(!view.loading);
    assert!(view.snapshot.is_none());
    assert_eq!(view.error.unwrap().kind, ErrorKind::NotFound);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_is_network_error() {
    let connector = MockConnector::new();
    let fetcher = MockFetcher::new(vec![
        Err(TransportError::Network("timeout".into())),
        rest_ok("online"),
    ]);
    let (_session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, false)
        .unwrap();

    let err = events.errors.recv().await.unwrap();
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(err.message, "Network Error: Failed to reach Lanyard API");

    let snapshot = events.snapshots.recv().await.unwrap();
    assert_eq!(snapshot.status, PresenceStatus::Online);
}

#[tokio::test(start_paused = true)]
async fn empty_socket_url_polls() {
    let connector = MockConnector::new();
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let config = SessionConfig {
        socket_url: String::new(),
        ..SessionConfig::default()
    };
    let (_session, mut events) = client(config, &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    events.snapshots.recv().await.unwrap();
    assert!(connector.connects().is_empty());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn close_is_idempotent_and_silences_observers() {
    let connector = MockConnector::new();
    let server = connector.accept();
    let fetcher = MockFetcher::new(vec![]);
    let (mut session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    server.send(hello(30_000));
    server.send(event("INIT_STATE", SUBJECT, "online"));
    events.snapshots.recv().await.unwrap();
    assert_eq!(connector.live(), 1);

    session.close().await;
    assert_eq!(connector.live(), 0);
    assert!(session.is_closed());
    assert_eq!(session.phase(), SessionPhase::Closed);

    session.close().await;
    assert_eq!(connector.live(), 0);

    server.send(event("PRESENCE_UPDATE", SUBJECT, "idle"));
    assert!(events.snapshots.recv().await.is_none());
    assert!(events.errors.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn close_during_reconnect_delay() {
    let connector = MockConnector::new();
    connector.fail(TransportError::Network("refused".into()));
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let (mut session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    events.errors.recv().await.unwrap();
    assert!(matches!(session.phase(), SessionPhase::StreamingReconnecting { retry: 1, .. }));

    session.close().await;
    sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.connects().len(), 1);
    assert!(fetcher.fetches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn close_while_polling_stops_fetching() {
    let connector = MockConnector::new();
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let (mut session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, false)
        .unwrap();

    events.snapshots.recv().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::PollingActive);

    session.close().await;
    sleep(Duration::from_secs(120)).await;
    assert_eq!(fetcher.fetches().len(), 1);
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert_eq!(connector.live(), 0);
    assert!(events.snapshots.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn close_while_connecting_releases_the_socket() {
    let connector = MockConnector::new();
    let _silent = connector.accept();
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let (mut session, _events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    sleep(Duration::from_secs(1)).await;
    assert_eq!(connector.live(), 1);
    assert_eq!(session.phase(), SessionPhase::StreamingConnecting);

    session.close().await;
    assert_eq!(connector.live(), 0);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.connects().len(), 1);
    assert!(fetcher.fetches().is_empty());
    assert_eq!(session.phase(), SessionPhase::Closed);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_session() {
    let connector = MockConnector::new();
    let server = connector.accept();
    server.send(hello(30_000));
    let fetcher = MockFetcher::new(vec![]);
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(SUBJECT, true)
        .unwrap();

    drop(session);
    assert!(events.snapshots.recv().await.is_none());
    assert_eq!(connector.live(), 0);
}

#[tokio::test]
async fn malformed_subject_is_rejected_before_connecting() {
    let connector = MockConnector::new();
    let fetcher = MockFetcher::new(vec![]);
    let client = client(SessionConfig::default(), &connector, &fetcher);

    assert!(matches!(
        client.open("abc", true),
        Err(SubjectIdError::Malformed(_))
    ));
    assert!(matches!(client.open("   ", true), Err(SubjectIdError::Empty)));
    assert!(connector.connects().is_empty());
    assert!(fetcher.fetches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn subject_id_is_trimmed() {
    let connector = MockConnector::new();
    let fetcher = MockFetcher::new(vec![rest_ok("online")]);
    let (session, mut events) = client(SessionConfig::default(), &connector, &fetcher)
        .open(&format!("  {SUBJECT}\n"), false)
        .unwrap();

    assert_eq!(session.subject().as_str(), SUBJECT);
    events.snapshots.recv().await.unwrap();
}
