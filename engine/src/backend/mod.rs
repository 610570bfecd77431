//! Backend Abstraction Layer
//!
//! The request/response collaborators of a session: document upload and
//! extraction, profile and selection updates, prescription generation and
//! artifact download. [`Backend`] is the contract the orchestrator drives;
//! [`HttpBackend`] talks to the real service and tests substitute scripted
//! implementations.

use async_trait::async_trait;
use rxassist_sdk::{ArtifactRef, AssistantError, ExtractionResult, Profile};
use std::path::{Path, PathBuf};

pub mod http;

pub use http::HttpBackend;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Backend trait that all request/response adapters implement
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Upload a document and return what was extracted from it
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ExtractionResult>;

    /// Store the confirmed profile
    async fn update_profile(&self, profile: &Profile) -> Result<()>;

    /// Store the selected lab test labels
    async fn update_selection(&self, labels: &[String]) -> Result<()>;

    /// Generate the prescription and return where it lives
    async fn generate(&self, is_update: bool) -> Result<ArtifactRef>;

    /// Fetch the bytes of a generated prescription
    async fn download(&self, artifact: &ArtifactRef) -> Result<Vec<u8>>;

    /// Check if the backend is currently reachable
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Download an artifact into `dir`, named after its last path segment
///
/// Creates `dir` if needed and returns the written path.
pub async fn download_to(
    backend: &dyn Backend,
    artifact: &ArtifactRef,
    dir: &Path,
) -> Result<PathBuf> {
    let file_name = artifact.file_name().ok_or_else(|| {
        AssistantError::ArtifactNotFound(format!("'{}' does not name a file", artifact))
    })?;

    let bytes = backend.download(artifact).await?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, &bytes).await?;

    tracing::info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
