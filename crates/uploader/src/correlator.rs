//! Binds completion events from the notification channel to sessions.
//!
//! One correlator per client id. Registered sessions are matched by
//! document id; an event completes at most one session (document ids are
//! server-unique, so at most one can ever match). The dispatch path only
//! applies a state-machine event and hands off a notification — it never
//! awaits network work, so the notify pump is never blocked by it.

use std::sync::{Arc, Mutex};

use docport_notify::ProcessingComplete;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::session::{SessionEvent, UploadSession, UploadState};
use crate::types::{ClientId, UploadEvent};

struct Registration {
    session: Arc<UploadSession>,
    events_tx: mpsc::Sender<UploadEvent>,
}

/// Routes [`ProcessingComplete`] events to the matching session.
pub struct SessionCorrelator {
    client_id: ClientId,
    subscribers: Mutex<Vec<Registration>>,
}

impl SessionCorrelator {
    /// Creates a correlator for one presentation session's client id.
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// The client id this correlator serves.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Registers a session awaiting completion, with the event sender its
    /// presentation surface listens on.
    pub fn register(&self, session: Arc<UploadSession>, events_tx: mpsc::Sender<UploadEvent>) {
        self.subscribers.lock().unwrap().push(Registration {
            session,
            events_tx,
        });
    }

    /// Removes a session from the dispatch table.
    pub fn unregister(&self, session: &Arc<UploadSession>) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|r| !Arc::ptr_eq(&r.session, session));
    }

    /// Number of registered sessions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Delivers one event; returns `true` if a session was completed.
    ///
    /// The subscriber list is snapshotted before dispatch so registration
    /// never races iteration.
    pub fn dispatch(&self, event: &ProcessingComplete) -> bool {
        let snapshot: Vec<(Arc<UploadSession>, mpsc::Sender<UploadEvent>)> = {
            let subs = self.subscribers.lock().unwrap();
            subs.iter()
                .map(|r| (r.session.clone(), r.events_tx.clone()))
                .collect()
        };

        for (session, events_tx) in snapshot {
            if session.state() != UploadState::Assembling
                || session.document_id().as_deref() != Some(event.document_id.as_str())
            {
                continue;
            }

            // `apply` re-checks state and id, so a concurrent transition
            // between the check above and here is harmless.
            let state = session.apply(SessionEvent::ProcessingComplete {
                document_id: event.document_id.clone(),
            });
            if state == UploadState::Completed {
                let _ = events_tx.try_send(UploadEvent::StateChanged {
                    state: UploadState::Completed,
                });
                let _ = events_tx.try_send(UploadEvent::Completed {
                    document_id: event.document_id.clone(),
                });
                info!(
                    document_id = %event.document_id,
                    filename = %event.filename,
                    "server-side processing complete"
                );
                return true;
            }
        }

        debug!(
            document_id = %event.document_id,
            "no session awaiting this completion — dropping"
        );
        false
    }

    /// Consumes the notification stream until it ends.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<ProcessingComplete>) {
        while let Some(event) = events.recv().await {
            self.dispatch(&event);
        }
        debug!(client_id = %self.client_id, "notification stream ended");
    }
}
