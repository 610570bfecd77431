//! Workflow Orchestrator runtime
//!
//! Owns one [`Session`] and serializes everything that touches it through a
//! single event queue:
//!
//! ```text
//!   handle.dispatch ─┐
//!   live frames ─────┼─▶ queue ─▶ Session::apply ─▶ effects ─┬─▶ backend call (spawned task)
//!   call results ────┘                   │                    ├─▶ live channel
//!                                        ▼                    └─▶ diagnostic log
//!                                  watch<SessionView>
//! ```
//!
//! Backend calls run in their own tasks and report back through the same
//! queue, so the session is only ever mutated by the loop task. Renderers
//! read [`SessionView`] snapshots from a `watch` channel.
//!
//! The loop stops when every [`OrchestratorHandle`] is dropped or
//! [`OrchestratorHandle::shutdown`] is called. Dropping the loop drops the
//! live channel sender, which closes the connection.

use rxassist_sdk::{AssistantError, FailureKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::backend::Backend;
use crate::config::Config;
use crate::live::{FrameReceiver, FrameSender};
use crate::workflow::{
    Call, Effect, Event, Failure, Resolution, Session, SessionOptions, SessionView, UserAction,
};

/// Queue depth of the event loop
const QUEUE_CAPACITY: usize = 128;

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    pub session: SessionOptions,

    /// Greeting appended after `welcome_delay`. Empty disables it.
    pub welcome_message: String,

    pub welcome_delay: Duration,
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            session: SessionOptions {
                announce_failures: config.workflow.announce_failures,
            },
            welcome_message: config.workflow.welcome_message.clone(),
            welcome_delay: Duration::from_secs(config.workflow.welcome_delay_secs),
        }
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Message on the event queue
#[derive(Debug)]
enum Inbound {
    Event(Event),
    Shutdown,
}

/// Cloneable entry point for front ends
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::Sender<Inbound>,
    view_rx: watch::Receiver<SessionView>,
}

impl OrchestratorHandle {
    /// Queue a user action
    pub async fn dispatch(&self, action: UserAction) -> Result<(), AssistantError> {
        self.tx
            .send(Inbound::Event(Event::User(action)))
            .await
            .map_err(|_| AssistantError::SessionClosed)
    }

    /// Receiver notified after every processed event
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Latest snapshot
    pub fn view(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    /// Wait until a snapshot satisfies `predicate` and return it
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SessionView, AssistantError>
    where
        F: FnMut(&SessionView) -> bool,
    {
        let mut rx = self.subscribe();
        loop {
            {
                let view = rx.borrow_and_update();
                if predicate(&view) {
                    return Ok(view.clone());
                }
            }
            rx.changed()
                .await
                .map_err(|_| AssistantError::SessionClosed)?;
        }
    }

    /// Stop the event loop
    ///
    /// Calls already in flight finish, but their results are not applied.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Inbound::Shutdown).await;
    }
}

/// Event loop owning the session
pub struct Orchestrator {
    id: Uuid,
    session: Session,
    backend: Arc<dyn Backend>,
    rx: mpsc::Receiver<Inbound>,
    /// Weak so the loop does not keep itself alive
    tx: mpsc::WeakSender<Inbound>,
    live_tx: Option<FrameSender>,
    view_tx: watch::Sender<SessionView>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Spawn a session on the current runtime
    ///
    /// `live` is the pair returned by [`crate::live::start`], or `None` to run
    /// without a live channel.
    pub fn spawn(
        backend: Arc<dyn Backend>,
        live: Option<(FrameReceiver, FrameSender)>,
        options: OrchestratorOptions,
    ) -> (OrchestratorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let session = Session::new(options.session);
        let (view_tx, view_rx) = watch::channel(session.view());

        let live_tx = live.map(|(frames, live_tx)| {
            tokio::spawn(forward_frames(frames, tx.downgrade()));
            live_tx
        });

        let orchestrator = Orchestrator {
            id: Uuid::new_v4(),
            session,
            backend,
            rx,
            tx: tx.downgrade(),
            live_tx,
            view_tx,
            options,
        };

        let span = tracing::info_span!("session", id = %orchestrator.id);
        let task = tokio::spawn(orchestrator.run().instrument(span));

        (OrchestratorHandle { tx, view_rx }, task)
    }

    async fn run(mut self) {
        info!(
            "Session started (backend: {}, live channel: {})",
            self.backend.name(),
            if self.live_tx.is_some() { "on" } else { "off" }
        );
        self.schedule_welcome();

        while let Some(inbound) = self.rx.recv().await {
            match inbound {
                Inbound::Event(event) => self.handle(event),
                Inbound::Shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        info!("Session {} ended", self.id);
    }

    fn handle(&mut self, event: Event) {
        let outcome = self.session.apply(event);

        if let Some(reason) = outcome.absorbed {
            debug!("Event absorbed ({:?}) in stage {}", reason, self.session.stage());
        }

        for effect in outcome.effects {
            match effect {
                Effect::Call(call) => self.spawn_call(call),
                Effect::SendLive(text) => self.send_live(text),
                Effect::Report(failure) => report(&failure),
            }
        }

        self.view_tx.send_replace(self.session.view());
    }

    fn spawn_call(&self, call: Call) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let backend = Arc::clone(&self.backend);

        info!("Issuing {} call", call.kind());
        tokio::spawn(
            async move {
                let resolution = execute(backend.as_ref(), call).await;
                // The loop may be gone by now
                let _ = tx.send(Inbound::Event(Event::Resolved(resolution))).await;
            }
            .in_current_span(),
        );
    }

    fn send_live(&self, text: String) {
        match &self.live_tx {
            Some(live_tx) => {
                if let Err(e) = live_tx.try_send(text) {
                    warn!("Live frame not sent: {}", e);
                }
            }
            None => debug!("Live channel disabled, frame not sent"),
        }
    }

    fn schedule_welcome(&self) {
        if self.options.welcome_message.trim().is_empty() {
            return;
        }

        let tx = self.tx.clone();
        let message = self.options.welcome_message.clone();
        let delay = self.options.welcome_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Inbound::Event(Event::Welcome(message))).await;
            }
        });
    }
}

/// Run one call against the backend
async fn execute(backend: &dyn Backend, call: Call) -> Resolution {
    match call {
        Call::Upload {
            ticket,
            file_name,
            bytes,
        } => Resolution::Extraction {
            ticket,
            result: backend.upload(&file_name, bytes).await,
        },
        Call::UpdateProfile { epoch, profile } => Resolution::ProfileUpdate {
            epoch,
            result: backend.update_profile(&profile).await,
        },
        Call::UpdateSelection { epoch, labels } => Resolution::SelectionUpdate {
            epoch,
            result: backend.update_selection(&labels).await,
        },
        Call::Generate { epoch, is_update } => Resolution::Generation {
            epoch,
            result: backend.generate(is_update).await,
        },
    }
}

/// Forward inbound live frames into the queue
async fn forward_frames(mut frames: FrameReceiver, tx: mpsc::WeakSender<Inbound>) {
    while let Some(text) = frames.recv().await {
        let Some(tx) = tx.upgrade() else {
            break;
        };
        if tx.send(Inbound::Event(Event::LiveFrame(text))).await.is_err() {
            break;
        }
    }
    debug!("Live frame forwarding stopped");
}

/// Diagnostic sink for failed calls
fn report(failure: &Failure) {
    match failure.error.kind() {
        FailureKind::Transport | FailureKind::Extraction => {
            warn!("{} failed: {}", failure.call, failure.error)
        }
        FailureKind::Local => error!("{} failed: {}", failure.call, failure.error),
    }
}
