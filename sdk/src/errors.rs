//! Error types and handling
//!
//! This module provides the error types used by the backend adapters and the
//! workflow engine. All errors implement the `AssistantErrorExt` trait which
//! provides user-friendly hints and indicates whether errors are recoverable.
//!
//! Failures never carry the uploaded document or patient data in their
//! messages; only transport details and backend status text.

use thiserror::Error;

/// Trait for rxassist error extensions
///
/// Provides additional context for errors, including a user-friendly hint and
/// recoverability information.
pub trait AssistantErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by repeating the action that
    /// triggered them. Non-recoverable errors need a configuration change.
    fn is_recoverable(&self) -> bool;
}

/// Coarse failure classification used by the diagnostic sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Channel or call unreachable, or the backend answered with an error status
    Transport,
    /// The document produced no usable structured result
    Extraction,
    /// Local failures (configuration, file system)
    Local,
}

/// Main assistant error type
///
/// # Examples
///
/// ```
/// use rxassist_sdk::errors::{AssistantError, AssistantErrorExt, FailureKind};
///
/// let error = AssistantError::Transport("connection refused".to_string());
/// assert!(error.is_recoverable());
/// assert_eq!(error.kind(), FailureKind::Transport);
///
/// let config_error = AssistantError::Config("bad url".to_string());
/// assert!(!config_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum AssistantError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned status {status}: {message}")]
    Backend { status: u16, message: String },

    // Extraction errors
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Decode error: {0}")]
    Decode(String),

    // Live channel errors
    #[error("Live channel error: {0}")]
    LiveChannel(String),

    // Artifact errors
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    // Orchestrator errors
    #[error("Session is closed")]
    SessionClosed,

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssistantError {
    /// Classify the error for the diagnostic sink
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_)
            | Self::Backend { .. }
            | Self::Decode(_)
            | Self::LiveChannel(_)
            | Self::ArtifactNotFound(_) => FailureKind::Transport,
            Self::Extraction(_) => FailureKind::Extraction,
            Self::Config(_) | Self::SessionClosed | Self::Io(_) => FailureKind::Local,
        }
    }
}

impl AssistantErrorExt for AssistantError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::Transport(_) => "The backend could not be reached. Check it is running and try again",
            Self::Backend { .. } => "The backend rejected the request. Try again",
            Self::Decode(_) => "The backend sent a response that could not be read",

            Self::Extraction(_) => {
                "No patient data could be read from the document. Try another file"
            }

            Self::LiveChannel(_) => "Chat connection lost. Messages may not be delivered",

            Self::ArtifactNotFound(_) => "The prescription file is no longer available. Generate it again",

            Self::SessionClosed => "The session has ended. Start a new one",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::SessionClosed)
    }
}
