//! Fan-out of session events to observers.

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::diagnostics::{Diagnostics, TransportKind};
use crate::error::PresenceError;
use crate::snapshot::PresenceSnapshot;

use super::types::{PresenceView, SessionEvents};

/// Owned by the driver task. Every emission is dropped once the session has
/// been cancelled so observers never see traffic after `close()`.
pub(crate) struct Emitter {
    cancel: CancellationToken,
    snapshots: mpsc::UnboundedSender<PresenceSnapshot>,
    errors: mpsc::UnboundedSender<PresenceError>,
    diagnostics_tx: mpsc::UnboundedSender<Diagnostics>,
    view: watch::Sender<PresenceView>,
    diagnostics: Diagnostics,
}

impl Emitter {
    pub(crate) fn new(cancel: CancellationToken, diagnostics: Diagnostics) -> (Self, SessionEvents) {
        let (snapshots, snapshots_rx) = mpsc::unbounded_channel();
        let (errors, errors_rx) = mpsc::unbounded_channel();
        let (diagnostics_tx, diagnostics_rx) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(PresenceView::initial(diagnostics.clone()));

        let emitter = Self {
            cancel,
            snapshots,
            errors,
            diagnostics_tx,
            view,
            diagnostics,
        };
        let events = SessionEvents {
            snapshots: snapshots_rx,
            errors: errors_rx,
            diagnostics: diagnostics_rx,
            view: view_rx,
        };
        (emitter, events)
    }

    fn live(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.diagnostics.attempts
    }

    pub(crate) fn snapshot(&self, snapshot: PresenceSnapshot) {
        if !self.live() {
            return;
        }
        self.view.send_modify(|view| {
            view.snapshot = Some(snapshot.clone());
            view.loading = false;
            view.error = None;
        });
        // A closed receiver only means nobody listens for this kind.
        let _ = self.snapshots.send(snapshot);
    }

    pub(crate) fn error(&self, error: PresenceError) {
        if !self.live() {
            return;
        }
        debug!(code = error.code(), attempt = error.attempt, "presence error: {}", error.message);
        self.view.send_modify(|view| view.error = Some(error.clone()));
        let _ = self.errors.send(error);
    }

    pub(crate) fn finish_loading(&self) {
        if !self.live() {
            return;
        }
        self.view.send_if_modified(|view| std::mem::replace(&mut view.loading, false));
    }

    /// Count an attempt against `endpoint` and return the new counter.
    pub(crate) fn record_attempt(&mut self, transport: TransportKind, endpoint: &str) -> u32 {
        let attempt = self.diagnostics.record_attempt(transport, endpoint);
        self.publish_diagnostics();
        attempt
    }

    pub(crate) fn record_response(&mut self, raw: Value) {
        self.diagnostics.record_response(raw);
        self.publish_diagnostics();
    }

    fn publish_diagnostics(&self) {
        if !self.live() {
            return;
        }
        let diagnostics = self.diagnostics.clone();
        self.view.send_modify(|view| view.diagnostics = diagnostics.clone());
        let _ = self.diagnostics_tx.send(diagnostics);
    }
}
