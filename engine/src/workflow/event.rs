//! Events consumed by the session and effects it emits
//!
//! Events are the only inputs to the workflow: user actions, live channel
//! frames and call resolutions. Effects are the only outputs: calls to issue,
//! frames to send and failures to report. The session never performs I/O
//! itself.

use rxassist_sdk::{AssistantError, ArtifactRef, ExtractionResult, Profile, ProfileField};

use super::intent::Reply;
use super::state::{Epoch, UploadTicket};

/// Something the user did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Pick a document to upload
    UploadDocument { file_name: String, bytes: Vec<u8> },

    /// Change one profile field in the editor
    EditProfile { field: ProfileField, value: String },

    /// Press "Continue" under the profile editor
    ConfirmProfile,

    /// Press "Yes" or "No"
    Answer(Reply),

    /// Press an additional test button
    ToggleTest(String),

    /// Press "OK" under the test picker
    ConfirmSelection,

    /// Ask for the prescription again after a failed or finished generation
    RetryGeneration,

    /// Submit free text from the input box
    SubmitText(String),
}

/// Result of a call, tagged with what is needed to tell if it is stale
#[derive(Debug)]
pub enum Resolution {
    Extraction {
        ticket: UploadTicket,
        result: Result<ExtractionResult, AssistantError>,
    },
    ProfileUpdate {
        epoch: Epoch,
        result: Result<(), AssistantError>,
    },
    SelectionUpdate {
        epoch: Epoch,
        result: Result<(), AssistantError>,
    },
    Generation {
        epoch: Epoch,
        result: Result<ArtifactRef, AssistantError>,
    },
}

/// Input to the session
#[derive(Debug)]
pub enum Event {
    User(UserAction),

    /// Unsolicited text frame from the live channel
    LiveFrame(String),

    /// Greeting shown shortly after the session opens
    Welcome(String),

    Resolved(Resolution),
}

impl From<UserAction> for Event {
    fn from(action: UserAction) -> Self {
        Event::User(action)
    }
}

impl From<Resolution> for Event {
    fn from(resolution: Resolution) -> Self {
        Event::Resolved(resolution)
    }
}

/// Request/response collaborator a call goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Upload,
    ProfileUpdate,
    SelectionUpdate,
    Generation,
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallKind::Upload => write!(f, "upload"),
            CallKind::ProfileUpdate => write!(f, "profile update"),
            CallKind::SelectionUpdate => write!(f, "selection update"),
            CallKind::Generation => write!(f, "generation"),
        }
    }
}

/// A call the runtime must issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload {
        ticket: UploadTicket,
        file_name: String,
        bytes: Vec<u8>,
    },
    UpdateProfile {
        epoch: Epoch,
        profile: Profile,
    },
    UpdateSelection {
        epoch: Epoch,
        labels: Vec<String>,
    },
    Generate {
        epoch: Epoch,
        is_update: bool,
    },
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::Upload { .. } => CallKind::Upload,
            Call::UpdateProfile { .. } => CallKind::ProfileUpdate,
            Call::UpdateSelection { .. } => CallKind::SelectionUpdate,
            Call::Generate { .. } => CallKind::Generation,
        }
    }
}

/// A failed call, handed to the diagnostic sink
#[derive(Debug)]
pub struct Failure {
    pub call: CallKind,
    pub error: AssistantError,
}

/// Output of the session
#[derive(Debug)]
pub enum Effect {
    Call(Call),

    /// Raw user text for the live channel
    SendLive(String),

    Report(Failure),
}
