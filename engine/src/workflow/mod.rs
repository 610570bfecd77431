//! Conversation workflow
//!
//! The synchronous half of the orchestrator: stage model, canonical test
//! catalogue, selection rules, text normalization and the session reducer.

pub mod canonical;
pub mod event;
pub mod intent;
pub mod selection;
pub mod session;
pub mod state;

pub use canonical::{additional_labels, lab_panel, CanonicalTest, LabPanelRow};
pub use event::{Call, CallKind, Effect, Event, Failure, Resolution, UserAction};
pub use intent::{parse_reply, Reply};
pub use selection::{resolve_label, toggle, SelectionSet, ToggleOutcome};
pub use session::{Absorbed, Outcome, Session, SessionOptions, SessionView};
pub use state::{Epoch, Stage, UiFlags, UploadTicket};
