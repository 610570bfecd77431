//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - chat: Interactive session
//! - extract: One-shot upload, print the extraction
//! - download: Save a generated prescription
//! - doctor: Validate configuration and check the backend
//! - config show / path

use anyhow::{Context, Result};
use rxassist_sdk::{ArtifactRef, ProfileField};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{download_to, Backend, HttpBackend};
use crate::config::Config;
use crate::workflow::{additional_labels, lab_panel, SelectionSet};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

fn http_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    let backend = HttpBackend::new(&config.backend).context("Failed to create backend client")?;
    Ok(Arc::new(backend))
}

/// Run an interactive chat session
pub async fn handle_chat(config: &Config) -> Result<()> {
    let backend = http_backend(config)?;
    crate::console::run(config, backend).await
}

/// Upload a document and print the extraction
///
/// Does not start a session; nothing is stored beyond what the backend keeps.
pub async fn handle_extract(
    file: &Path,
    backend: &dyn Backend,
    format: OutputFormat,
) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let result = backend
        .upload(&file_name, bytes)
        .await
        .context("Upload failed")?;
    let labs = &result.lab_test_results;
    let default_selection = SelectionSet::default_for(labs);

    match format {
        OutputFormat::Text => {
            println!("Profile:");
            for field in ProfileField::ALL {
                println!(
                    "  {:<10} {}",
                    field.label(),
                    result.patient_info.display_field(field)
                );
            }
            println!();

            println!("Lab panel:");
            for row in lab_panel(labs) {
                println!("  {:<16} {}", row.label, row.value);
            }

            let additional = additional_labels(labs);
            if !additional.is_empty() {
                println!();
                println!("Additional tests:");
                for label in additional {
                    println!("  {:<16} {}", label, labs.get(&label).unwrap_or_default());
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "profile": result.patient_info,
                "labTestResults": labs,
                "defaultSelection": default_selection,
                "additionalTests": additional_labels(labs),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Download a generated prescription
pub async fn handle_download(
    artifact_path: &str,
    output: Option<&Path>,
    backend: &dyn Backend,
    config: &Config,
    format: OutputFormat,
) -> Result<PathBuf> {
    let artifact = ArtifactRef::new(artifact_path);
    let dir = output.unwrap_or(config.core.download_dir.as_path());

    let path = download_to(backend, &artifact, dir)
        .await
        .with_context(|| format!("Failed to download {}", artifact))?;

    match format {
        OutputFormat::Text => println!("Saved {}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }

    Ok(path)
}

/// Validate configuration and check the backend
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration", "Valid".to_string()));

    // Download directory
    let download_dir = &config.core.download_dir;
    if download_dir.is_dir() {
        checks.push(("Download directory", "Exists".to_string()));
    } else if download_dir.exists() {
        checks.push(("Download directory", "Not a directory".to_string()));
        issues.push(format!(
            "Download path is not a directory: {}",
            download_dir.display()
        ));
    } else {
        checks.push(("Download directory", "Created on first download".to_string()));
    }

    // Backend
    let backend = HttpBackend::new(&config.backend)?;
    if backend.check_health().await {
        checks.push(("Backend", format!("Reachable at {}", backend.base_url())));
    } else {
        checks.push(("Backend", "Unreachable".to_string()));
        issues.push(format!(
            "Backend is not reachable at {}. Start it or fix backend.base_url",
            backend.base_url()
        ));
    }

    // Live channel
    if config.live.enabled {
        checks.push(("Live channel", config.live.url.clone()));
    } else {
        checks.push(("Live channel", "Disabled".to_string()));
    }

    match format {
        OutputFormat::Text => {
            println!("rxassist Diagnostics");
            println!("============================");
            println!();

            println!("Checks:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the loaded configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{}", text);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Print where the configuration is read from
pub fn handle_config_path(custom: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };

    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }
    Ok(())
}
