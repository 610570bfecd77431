//! Canonical lab test catalogue
//!
//! Six tests are always part of the analysis. Backend labels vary between lab
//! report formats ("HBA1C, GLYCATED HEMOGLOBIN" vs "HBA1C"), so a key matches
//! a canonical test when its normalized form equals the normalized display
//! label or one of the known report aliases.

use rxassist_sdk::{LabResults, NOT_FOUND};
use serde::Serialize;
use std::fmt;

/// One of the fixed default tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CanonicalTest {
    Hba1c,
    Creatinine,
    FastingGlucose,
    Haemoglobin,
    Pcv,
    RbcCount,
}

impl CanonicalTest {
    /// Catalogue order
    pub const ALL: [CanonicalTest; 6] = [
        CanonicalTest::Hba1c,
        CanonicalTest::Creatinine,
        CanonicalTest::FastingGlucose,
        CanonicalTest::Haemoglobin,
        CanonicalTest::Pcv,
        CanonicalTest::RbcCount,
    ];

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            CanonicalTest::Hba1c => "HBA1C",
            CanonicalTest::Creatinine => "Creatinine",
            CanonicalTest::FastingGlucose => "Fasting Glucose",
            CanonicalTest::Haemoglobin => "Haemoglobin",
            CanonicalTest::Pcv => "PCV",
            CanonicalTest::RbcCount => "RBC Count",
        }
    }

    /// Labels used by the lab report extractor
    fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalTest::Hba1c => &["HBA1C, GLYCATED HEMOGLOBIN"],
            CanonicalTest::Creatinine => &["CREATININE , SERUM"],
            CanonicalTest::FastingGlucose => &["GLUCOSE, FASTING , NAF PLASMA"],
            CanonicalTest::Haemoglobin => &["HAEMOGLOBIN"],
            CanonicalTest::Pcv => &["PCV"],
            CanonicalTest::RbcCount => &["RBC COUNT"],
        }
    }

    /// Returns true if a lab result key denotes this test
    pub fn matches(self, key: &str) -> bool {
        let key = normalize_label(key);
        normalize_label(self.label()) == key
            || self.aliases().iter().any(|alias| normalize_label(alias) == key)
    }

    /// Find the canonical test a key denotes, if any
    pub fn classify(key: &str) -> Option<CanonicalTest> {
        Self::ALL.into_iter().find(|test| test.matches(key))
    }
}

impl fmt::Display for CanonicalTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uppercase and strip all whitespace
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Returns true if the key denotes one of the default tests
pub fn is_canonical(key: &str) -> bool {
    CanonicalTest::classify(key).is_some()
}

/// Lab result keys outside the default set, offered as optional tests
pub fn additional_labels(labs: &LabResults) -> Vec<String> {
    labs.labels()
        .filter(|label| !is_canonical(label))
        .map(str::to_string)
        .collect()
}

/// Row of the read-only lab panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabPanelRow {
    pub test: CanonicalTest,
    pub label: &'static str,
    pub value: String,
}

/// Values of the six default tests in catalogue order
///
/// Tests missing from the result set show [`NOT_FOUND`].
pub fn lab_panel(labs: &LabResults) -> Vec<LabPanelRow> {
    CanonicalTest::ALL
        .into_iter()
        .map(|test| {
            let value = labs
                .iter()
                .find(|(key, _)| test.matches(key))
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| NOT_FOUND.to_string());
            LabPanelRow {
                test,
                label: test.label(),
                value,
            }
        })
        .collect()
}
