//! rxassist SDK
//!
//! Shared library providing the wire types and error taxonomy used to talk to
//! the prescription backend. The engine and any alternative front end build
//! on these types.

/// Error types and handling
pub mod errors;

/// Backend request/response and patient data types
pub mod types;

// Re-export commonly used types
pub use errors::{AssistantError, AssistantErrorExt, FailureKind};
pub use types::{
    ArtifactRef, ExtractionResult, GenerateRequest, GenerateResponse, LabResults, Profile,
    ProfileField, UploadResponse, NOT_FOUND,
};
