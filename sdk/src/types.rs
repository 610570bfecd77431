//! Backend request/response and patient data types

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sentinel shown for a profile field or lab value the backend could not find
pub const NOT_FOUND: &str = "Not found";

/// Patient profile extracted from a lab report
///
/// Every field is optional free text. The backend emits numbers for some
/// fields in older report formats, so values are read leniently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub age: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub weight: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub height: Option<String>,

    /// Referring doctor (`refDoc` on the wire)
    #[serde(
        default,
        rename = "refDoc",
        alias = "referringDoctor",
        deserialize_with = "deserialize_lenient"
    )]
    pub referring_doctor: Option<String>,
}

impl Profile {
    /// Get a field value
    pub fn field(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::Name => self.name.as_deref(),
            ProfileField::Age => self.age.as_deref(),
            ProfileField::Weight => self.weight.as_deref(),
            ProfileField::Height => self.height.as_deref(),
            ProfileField::ReferringDoctor => self.referring_doctor.as_deref(),
        }
    }

    /// Get a field value for display, substituting [`NOT_FOUND`]
    pub fn display_field(&self, field: ProfileField) -> &str {
        self.field(field).unwrap_or(NOT_FOUND)
    }

    /// Set a field value. Blank input clears the field.
    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        let value = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };

        match field {
            ProfileField::Name => self.name = value,
            ProfileField::Age => self.age = value,
            ProfileField::Weight => self.weight = value,
            ProfileField::Height => self.height = value,
            ProfileField::ReferringDoctor => self.referring_doctor = value,
        }
    }

    /// Returns true if at least one field is set
    pub fn has_any(&self) -> bool {
        ProfileField::ALL.iter().any(|f| self.field(*f).is_some())
    }
}

/// Editable profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Age,
    Weight,
    Height,
    ReferringDoctor,
}

impl ProfileField {
    /// All fields in display order
    pub const ALL: [ProfileField; 5] = [
        ProfileField::Name,
        ProfileField::Age,
        ProfileField::Weight,
        ProfileField::Height,
        ProfileField::ReferringDoctor,
    ];

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            ProfileField::Name => "Name",
            ProfileField::Age => "Age",
            ProfileField::Weight => "Weight",
            ProfileField::Height => "Height",
            ProfileField::ReferringDoctor => "Ref Doc",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ProfileField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(ProfileField::Name),
            "age" => Ok(ProfileField::Age),
            "weight" => Ok(ProfileField::Weight),
            "height" => Ok(ProfileField::Height),
            "refdoc" | "ref_doc" | "referring_doctor" | "doctor" => {
                Ok(ProfileField::ReferringDoctor)
            }
            other => Err(format!(
                "Unknown profile field '{}'. Expected one of: name, age, weight, height, refdoc",
                other
            )),
        }
    }
}

/// Lab test label to observed value
///
/// Ordered by label so additional tests are always offered in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabResults(BTreeMap<String, String>);

impl LabResults {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    /// Value observed for a label
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    /// Returns true if the label is a key of this result set
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    /// Iterate over labels in order
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over `(label, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabResults {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for LabResults {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(label, value)| {
                    let value = lenient_string(value).unwrap_or_else(|| NOT_FOUND.to_string());
                    (label, value)
                })
                .collect(),
        ))
    }
}

/// Structured result of uploading a lab report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(rename = "patientInfo", alias = "Patient Information", default)]
    pub patient_info: Profile,

    #[serde(rename = "labTestResults", alias = "Lab Test Results", default)]
    pub lab_test_results: LabResults,
}

impl ExtractionResult {
    /// Returns true if the backend found anything in the document
    pub fn is_usable(&self) -> bool {
        self.patient_info.has_any() || !self.lab_test_results.is_empty()
    }
}

/// Body of the upload response
///
/// The reference backend wraps the extraction in a `data` envelope next to
/// its own analysis fields; a bare extraction object is accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Wrapped { data: ExtractionResult },
    Bare(ExtractionResult),
}

impl UploadResponse {
    pub fn into_extraction(self) -> ExtractionResult {
        match self {
            UploadResponse::Wrapped { data } => data,
            UploadResponse::Bare(result) => result,
        }
    }
}

/// Body of the generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "isUpdate")]
    pub is_update: bool,
}

/// Body of the generation response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(rename = "artifactPath", alias = "file_path")]
    pub artifact_path: String,
}

/// Opaque locator of a generated prescription
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the locator, used as the local file name
    pub fn file_name(&self) -> Option<&str> {
        self.0
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<GenerateResponse> for ArtifactRef {
    fn from(response: GenerateResponse) -> Self {
        Self(response.artifact_path)
    }
}

fn lenient_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(lenient_string))
}
