//! Workflow session reducer
//!
//! `Session` owns the transcript, the profile, the lab results, the selection
//! and the current stage. [`Session::apply`] consumes one event and returns
//! the effects the runtime must perform. It never performs I/O, so every
//! transition can be driven and checked synchronously.
//!
//! Stale resolutions are detected two ways:
//! - profile, selection and generation calls carry the epoch they were issued
//!   in, and the epoch advances on every stage transition
//! - uploads carry a ticket, and only the most recently issued ticket may
//!   apply its extraction

use rxassist_sdk::{
    AssistantError, AssistantErrorExt, ArtifactRef, ExtractionResult, LabResults, Profile,
    NOT_FOUND,
};
use serde::Serialize;
use tracing::{debug, info};

use super::canonical::{additional_labels, lab_panel, LabPanelRow};
use super::event::{Call, CallKind, Effect, Event, Failure, Resolution, UserAction};
use super::intent::{parse_reply, Reply};
use super::selection::{toggle, SelectionSet, ToggleOutcome};
use super::state::{Epoch, Stage, UiFlags, UploadTicket};
use crate::transcript::{Message, MessageLog, Origin};

/// Asked once the profile update is acknowledged
pub const ADDITIONAL_TESTS_PROMPT: &str =
    "Do you want additional results to be included in your analysis or is this enough?";

/// Appended after the user declines additional tests
pub const PLEASE_WAIT: &str = "Please wait for the prescription.";

/// Appended once the selection update is acknowledged
pub const GENERATING_FROM_SELECTION: &str =
    "Prescription based on the selected tests is being generated.";

/// Session behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Append a System message with the error hint when a call fails
    pub announce_failures: bool,
}

/// Why an event changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorbed {
    /// A resolution for a call the session has moved past
    Stale,
    /// An action not allowed in the current stage, or empty input
    Invalid,
}

/// Result of applying one event
#[derive(Debug, Default)]
pub struct Outcome {
    pub effects: Vec<Effect>,
    pub absorbed: Option<Absorbed>,
}

impl Outcome {
    fn effects(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            absorbed: None,
        }
    }

    fn none() -> Self {
        Self::default()
    }

    fn absorbed(reason: Absorbed) -> Self {
        Self {
            effects: Vec::new(),
            absorbed: Some(reason),
        }
    }

    /// Calls issued by this step
    pub fn calls(&self) -> impl Iterator<Item = &Call> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Call(call) => Some(call),
            _ => None,
        })
    }

    /// Failures reported by this step
    pub fn failures(&self) -> impl Iterator<Item = &Failure> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Report(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn is_absorbed(&self) -> bool {
        self.absorbed.is_some()
    }
}

/// Read-only snapshot handed to renderers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionView {
    pub stage: Stage,
    pub flags: UiFlags,
    pub artifact_available: bool,
    pub uploading: bool,
    pub profile: Profile,
    pub lab_panel: Vec<LabPanelRow>,
    pub labs: LabResults,
    pub selection: SelectionSet,
    pub additional_tests: Vec<String>,
    pub artifact: Option<ArtifactRef>,
    pub messages: Vec<Message>,
}

/// Conversation state machine
#[derive(Debug, Default)]
pub struct Session {
    stage: Stage,
    epoch: Epoch,
    last_ticket: UploadTicket,
    pending_upload: Option<UploadTicket>,
    log: MessageLog,
    profile: Profile,
    labs: LabResults,
    selection: SelectionSet,
    artifact: Option<ArtifactRef>,
    options: SessionOptions,
}

impl Session {
    /// Create a session in `Idle`
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn flags(&self) -> UiFlags {
        UiFlags::for_stage(&self.stage)
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn labs(&self) -> &LabResults {
        &self.labs
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn artifact(&self) -> Option<&ArtifactRef> {
        self.artifact.as_ref()
    }

    /// Returns true while the latest upload has not resolved
    pub fn is_uploading(&self) -> bool {
        self.pending_upload.is_some()
    }

    /// Lab keys offered as optional tests
    pub fn additional_tests(&self) -> Vec<String> {
        additional_labels(&self.labs)
    }

    /// Snapshot for renderers
    pub fn view(&self) -> SessionView {
        SessionView {
            stage: self.stage,
            flags: self.flags(),
            artifact_available: self.artifact.is_some(),
            uploading: self.is_uploading(),
            profile: self.profile.clone(),
            lab_panel: lab_panel(&self.labs),
            labs: self.labs.clone(),
            selection: self.selection.clone(),
            additional_tests: self.additional_tests(),
            artifact: self.artifact.clone(),
            messages: self.log.to_vec(),
        }
    }

    /// Apply one event
    pub fn apply(&mut self, event: Event) -> Outcome {
        match event {
            Event::User(action) => self.on_user(action),
            Event::LiveFrame(text) => {
                self.log.append(Origin::System, text);
                Outcome::none()
            }
            Event::Welcome(text) => {
                if text.trim().is_empty() {
                    return Outcome::absorbed(Absorbed::Invalid);
                }
                self.log.append(Origin::System, text);
                Outcome::none()
            }
            Event::Resolved(resolution) => self.on_resolved(resolution),
        }
    }

    fn on_user(&mut self, action: UserAction) -> Outcome {
        match action {
            UserAction::UploadDocument { file_name, bytes } => self.upload(file_name, bytes),
            UserAction::EditProfile { field, value } => match self.stage {
                Stage::ProfileReview { confirming: false } => {
                    self.profile.set_field(field, value);
                    Outcome::none()
                }
                _ => Outcome::absorbed(Absorbed::Invalid),
            },
            UserAction::ConfirmProfile => self.confirm_profile(),
            UserAction::Answer(reply) => self.answer(reply),
            UserAction::ToggleTest(label) => self.toggle_test(&label),
            UserAction::ConfirmSelection => self.confirm_selection(),
            UserAction::RetryGeneration => self.retry_generation(),
            UserAction::SubmitText(text) => self.submit_text(text),
        }
    }

    fn upload(&mut self, file_name: String, bytes: Vec<u8>) -> Outcome {
        let ticket = self.last_ticket.next();
        self.last_ticket = ticket;
        self.pending_upload = Some(ticket);

        if self.stage == Stage::Idle {
            self.transition(Stage::AwaitingDocument);
        }

        info!(
            "Uploading '{}' ({} bytes, ticket {})",
            file_name,
            bytes.len(),
            ticket.value()
        );
        Outcome::effects(vec![Effect::Call(Call::Upload {
            ticket,
            file_name,
            bytes,
        })])
    }

    fn confirm_profile(&mut self) -> Outcome {
        if self.stage != (Stage::ProfileReview { confirming: false }) {
            return Outcome::absorbed(Absorbed::Invalid);
        }

        self.stage = Stage::ProfileReview { confirming: true };
        Outcome::effects(vec![Effect::Call(Call::UpdateProfile {
            epoch: self.epoch,
            profile: self.profile.clone(),
        })])
    }

    fn answer(&mut self, reply: Reply) -> Outcome {
        if self.stage != Stage::AdditionalTestsDecision {
            return Outcome::absorbed(Absorbed::Invalid);
        }

        self.log.append(Origin::User, reply.transcript_text());
        match reply {
            Reply::Yes => {
                self.transition(Stage::TestSelection { submitting: false });
                Outcome::none()
            }
            Reply::No => {
                self.log.append(Origin::System, PLEASE_WAIT);
                self.start_generation(false)
            }
        }
    }

    fn toggle_test(&mut self, label: &str) -> Outcome {
        if self.stage != (Stage::TestSelection { submitting: false }) {
            return Outcome::absorbed(Absorbed::Invalid);
        }

        let (next, outcome) = toggle(&self.selection, &self.labs, label);
        match outcome {
            ToggleOutcome::Added => {
                self.selection = next;
                self.log.append(Origin::User, format!("{} selected", label));
                Outcome::none()
            }
            ToggleOutcome::Removed => {
                self.selection = next;
                Outcome::none()
            }
            ToggleOutcome::Rejected => Outcome::absorbed(Absorbed::Invalid),
        }
    }

    fn confirm_selection(&mut self) -> Outcome {
        if self.stage != (Stage::TestSelection { submitting: false }) {
            return Outcome::absorbed(Absorbed::Invalid);
        }

        self.stage = Stage::TestSelection { submitting: true };
        Outcome::effects(vec![Effect::Call(Call::UpdateSelection {
            epoch: self.epoch,
            labels: self.selection.as_slice().to_vec(),
        })])
    }

    fn retry_generation(&mut self) -> Outcome {
        match self.stage {
            Stage::GeneratingArtifact {
                is_update,
                in_flight: false,
            } => {
                self.stage = Stage::GeneratingArtifact {
                    is_update,
                    in_flight: true,
                };
                Outcome::effects(vec![Effect::Call(Call::Generate {
                    epoch: self.epoch,
                    is_update,
                })])
            }
            Stage::Complete { is_update } => self.start_generation(is_update),
            _ => Outcome::absorbed(Absorbed::Invalid),
        }
    }

    fn submit_text(&mut self, text: String) -> Outcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Outcome::absorbed(Absorbed::Invalid);
        }

        let mut outcome = match parse_reply(trimmed) {
            Some(reply) if self.stage == Stage::AdditionalTestsDecision => self.answer(reply),
            _ => {
                self.log.append(Origin::User, trimmed);
                Outcome::none()
            }
        };
        outcome.effects.push(Effect::SendLive(text));
        outcome
    }

    fn start_generation(&mut self, is_update: bool) -> Outcome {
        self.transition(Stage::GeneratingArtifact {
            is_update,
            in_flight: true,
        });
        Outcome::effects(vec![Effect::Call(Call::Generate {
            epoch: self.epoch,
            is_update,
        })])
    }

    fn on_resolved(&mut self, resolution: Resolution) -> Outcome {
        match resolution {
            Resolution::Extraction { ticket, result } => {
                if self.pending_upload != Some(ticket) {
                    return Outcome::absorbed(Absorbed::Stale);
                }
                self.pending_upload = None;

                match result {
                    Ok(extraction) if extraction.is_usable() => {
                        self.apply_extraction(extraction);
                        Outcome::none()
                    }
                    Ok(_) => self.fail(
                        CallKind::Upload,
                        AssistantError::Extraction(
                            "the document contained no patient data or lab results".to_string(),
                        ),
                    ),
                    Err(error) => self.fail(CallKind::Upload, error),
                }
            }

            Resolution::ProfileUpdate { epoch, result } => {
                if epoch != self.epoch || self.stage != (Stage::ProfileReview { confirming: true }) {
                    return Outcome::absorbed(Absorbed::Stale);
                }

                match result {
                    Ok(()) => {
                        self.transition(Stage::AdditionalTestsDecision);
                        self.log.append(Origin::System, ADDITIONAL_TESTS_PROMPT);
                        Outcome::none()
                    }
                    Err(error) => {
                        self.stage = Stage::ProfileReview { confirming: false };
                        self.fail(CallKind::ProfileUpdate, error)
                    }
                }
            }

            Resolution::SelectionUpdate { epoch, result } => {
                if epoch != self.epoch || self.stage != (Stage::TestSelection { submitting: true }) {
                    return Outcome::absorbed(Absorbed::Stale);
                }

                match result {
                    Ok(()) => {
                        let outcome = self.start_generation(true);
                        self.log.append(Origin::System, GENERATING_FROM_SELECTION);
                        outcome
                    }
                    Err(error) => {
                        self.stage = Stage::TestSelection { submitting: false };
                        self.fail(CallKind::SelectionUpdate, error)
                    }
                }
            }

            Resolution::Generation { epoch, result } => {
                let is_update = match self.stage {
                    Stage::GeneratingArtifact {
                        is_update,
                        in_flight: true,
                    } if epoch == self.epoch => is_update,
                    _ => return Outcome::absorbed(Absorbed::Stale),
                };

                match result {
                    Ok(artifact) => {
                        info!("Prescription ready at {}", artifact);
                        self.artifact = Some(artifact);
                        self.transition(Stage::Complete { is_update });
                        Outcome::none()
                    }
                    Err(error) => {
                        self.stage = Stage::GeneratingArtifact {
                            is_update,
                            in_flight: false,
                        };
                        self.fail(CallKind::Generation, error)
                    }
                }
            }
        }
    }

    fn apply_extraction(&mut self, extraction: ExtractionResult) {
        let ExtractionResult {
            patient_info: mut profile,
            lab_test_results: labs,
        } = extraction;

        if profile.referring_doctor.is_none() {
            profile.referring_doctor = Some(NOT_FOUND.to_string());
        }

        self.selection = SelectionSet::default_for(&labs);
        info!(
            "Extraction applied: {} lab results, {} selected by default",
            labs.len(),
            self.selection.len()
        );
        self.profile = profile;
        self.labs = labs;
        self.transition(Stage::ProfileReview { confirming: false });
    }

    fn fail(&mut self, call: CallKind, error: AssistantError) -> Outcome {
        debug!("{} failed in stage {}", call, self.stage);
        if self.options.announce_failures {
            self.log.append(Origin::System, error.user_hint());
        }
        Outcome::effects(vec![Effect::Report(Failure { call, error })])
    }

    fn transition(&mut self, to: Stage) {
        debug!("Stage {} -> {}", self.stage, to);
        self.stage = to;
        self.epoch = self.epoch.next();
    }
}
