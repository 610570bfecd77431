//! Test Selection Manager
//!
//! The selection is an ordered, duplicate-free list of lab result keys. Every
//! member must be a key of the current lab results; toggling a label that is
//! not is rejected as a no-op.
//!
//! Members are kept in selection order: canonical tests in catalogue order,
//! then any other key in lab results order. Order depends only on membership,
//! so removing and re-adding a label restores the exact previous selection.

use rxassist_sdk::LabResults;
use serde::Serialize;

use super::canonical::{normalize_label, CanonicalTest};

/// Currently chosen lab test labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet(Vec<String>);

impl SelectionSet {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// The default selection for a fresh extraction
    ///
    /// Contains the keys denoting canonical tests, in catalogue order. Extra
    /// keys in the result set never join the default selection.
    pub fn default_for(labs: &LabResults) -> Self {
        let mut selection = Self::new();
        for test in CanonicalTest::ALL {
            for label in labs.labels().filter(|label| test.matches(label)) {
                selection.insert(labs, label);
            }
        }
        selection
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|member| member == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add a label at its place in selection order; adding a present label is a no-op
    fn insert(&mut self, labs: &LabResults, label: &str) -> bool {
        if self.contains(label) {
            return false;
        }
        let rank = selection_rank(labs, label);
        let at = self
            .0
            .iter()
            .position(|member| selection_rank(labs, member) > rank)
            .unwrap_or(self.0.len());
        self.0.insert(at, label.to_string());
        true
    }

    fn remove(&mut self, label: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|member| member != label);
        self.0.len() != before
    }
}

/// Sort key of a label: catalogue position, then position among the lab keys
fn selection_rank(labs: &LabResults, label: &str) -> (usize, usize) {
    let test = CanonicalTest::ALL
        .iter()
        .position(|test| test.matches(label))
        .unwrap_or(CanonicalTest::ALL.len());
    let key = labs
        .labels()
        .position(|key| key == label)
        .unwrap_or(usize::MAX);
    (test, key)
}

/// Effect of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The label is not a key of the lab results
    Rejected,
}

/// Toggle a label's membership
///
/// Returns the new selection; the input is left untouched. Toggling the same
/// known label twice gives back the original selection.
pub fn toggle(selection: &SelectionSet, labs: &LabResults, label: &str) -> (SelectionSet, ToggleOutcome) {
    if !labs.contains(label) {
        return (selection.clone(), ToggleOutcome::Rejected);
    }

    let mut next = selection.clone();
    if next.remove(label) {
        (next, ToggleOutcome::Removed)
    } else {
        next.insert(labs, label);
        (next, ToggleOutcome::Added)
    }
}

/// Resolve user-typed text to a lab result key
///
/// Exact matches win; otherwise the comparison ignores case and whitespace.
pub fn resolve_label<'a>(labs: &'a LabResults, input: &str) -> Option<&'a str> {
    let input = input.trim();
    if let Some(exact) = labs.labels().find(|label| *label == input) {
        return Some(exact);
    }

    let wanted = normalize_label(input);
    labs.labels().find(|label| normalize_label(label) == wanted)
}
