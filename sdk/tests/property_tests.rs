use proptest::prelude::*;
use rxassist_sdk::errors::{AssistantError, AssistantErrorExt};
use rxassist_sdk::types::{ExtractionResult, LabResults, Profile, ProfileField, NOT_FOUND};

// User hints are static strings and never echo the underlying failure text
proptest! {
    #[test]
    fn test_error_user_hint_completeness(detail in "\\PC*", status in 100u16..600) {
        let errors = vec![
            AssistantError::Config(detail.clone()),
            AssistantError::Transport(detail.clone()),
            AssistantError::Backend { status, message: detail.clone() },
            AssistantError::Extraction(detail.clone()),
            AssistantError::Decode(detail.clone()),
            AssistantError::LiveChannel(detail.clone()),
            AssistantError::ArtifactNotFound(detail.clone()),
        ];

        for error in errors {
            let hint = error.user_hint();
            prop_assert!(!hint.is_empty());
            if detail.chars().count() > 20 {
                prop_assert!(!hint.contains(detail.as_str()));
            }
        }
    }
}

// Lab values of any JSON scalar type survive parsing as text
proptest! {
    #[test]
    fn test_lab_values_read_leniently(
        label in "[A-Za-z][A-Za-z ,]{0,20}",
        number in -1000.0f64..1000.0,
        text in "[A-Za-z0-9 .]{0,12}",
    ) {
        let body = serde_json::json!({
            "patientInfo": {},
            "labTestResults": {
                format!("{label} n"): number,
                format!("{label} t"): text.clone(),
                format!("{label} z"): null,
            }
        });

        let result: ExtractionResult = serde_json::from_value(body).unwrap();
        let labs: &LabResults = &result.lab_test_results;

        prop_assert_eq!(labs.len(), 3);
        prop_assert_eq!(labs.get(&format!("{label} t")), Some(text.as_str()));
        prop_assert_eq!(labs.get(&format!("{label} z")), Some(NOT_FOUND));
        let number_text = labs.get(&format!("{label} n")).unwrap();
        prop_assert_eq!(number_text.parse::<f64>().unwrap(), number);
    }
}

// Editing a field only ever touches that field
proptest! {
    #[test]
    fn test_profile_edit_isolation(
        value in "[A-Za-z0-9]{1,16}",
        index in 0usize..5,
    ) {
        let field = ProfileField::ALL[index];
        let mut profile = Profile::default();
        profile.set_field(field, value.clone());

        for other in ProfileField::ALL {
            if other == field {
                prop_assert_eq!(profile.field(other), Some(value.as_str()));
            } else {
                prop_assert_eq!(profile.field(other), None);
            }
        }
    }
}
