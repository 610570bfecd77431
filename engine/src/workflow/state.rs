//! Session stage, epochs and derived UI flags

use serde::Serialize;
use std::fmt;

/// Workflow stage
///
/// In-flight markers live inside the variant that issued the call, so a
/// stage and its pending call can never disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    AwaitingDocument,
    ProfileReview { confirming: bool },
    AdditionalTestsDecision,
    TestSelection { submitting: bool },
    GeneratingArtifact { is_update: bool, in_flight: bool },
    Complete { is_update: bool },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::AwaitingDocument => "awaiting_document",
            Stage::ProfileReview { .. } => "profile_review",
            Stage::AdditionalTestsDecision => "additional_tests_decision",
            Stage::TestSelection { .. } => "test_selection",
            Stage::GeneratingArtifact { .. } => "generating_artifact",
            Stage::Complete { .. } => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counter bumped on every stage transition
///
/// Calls capture the epoch they were issued in; a resolution carrying an
/// older epoch is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Identifies an upload; only the latest ticket may apply its extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UploadTicket(u64);

impl UploadTicket {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// What the front end should surface
///
/// Always computed from the stage, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UiFlags {
    pub show_profile_editor: bool,
    pub show_yes_no: bool,
    pub show_test_picker: bool,
}

impl UiFlags {
    pub fn for_stage(stage: &Stage) -> Self {
        Self {
            show_profile_editor: matches!(stage, Stage::ProfileReview { .. }),
            show_yes_no: matches!(stage, Stage::AdditionalTestsDecision),
            show_test_picker: matches!(stage, Stage::TestSelection { submitting: false }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_stage() {
        let idle = UiFlags::for_stage(&Stage::Idle);
        assert_eq!(idle, UiFlags::default());

        let review = UiFlags::for_stage(&Stage::ProfileReview { confirming: true });
        assert!(review.show_profile_editor);
        assert!(!review.show_yes_no);

        let decision = UiFlags::for_stage(&Stage::AdditionalTestsDecision);
        assert!(decision.show_yes_no);
        assert!(!decision.show_test_picker);

        assert!(UiFlags::for_stage(&Stage::TestSelection { submitting: false }).show_test_picker);
        // The picker disappears as soon as OK is pressed
        assert!(!UiFlags::for_stage(&Stage::TestSelection { submitting: true }).show_test_picker);
    }

    #[test]
    fn test_epoch_and_ticket_advance() {
        let epoch = Epoch::default();
        assert_eq!(epoch.next().value(), 1);
        assert!(epoch.next() > epoch);

        let ticket = UploadTicket::default().next().next();
        assert_eq!(ticket.value(), 2);
    }
}
