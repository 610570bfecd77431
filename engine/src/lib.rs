//! rxassist Engine Library
//!
//! This library provides the core functionality of the rxassist assistant.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Telemetry and Observability
pub mod telemetry;

/// Append-only conversation transcript
pub mod transcript;

/// Conversation workflow model and reducer
pub mod workflow;

/// Request/response backend adapters
pub mod backend;

/// Live chat channel
pub mod live;

/// Async runtime driving a workflow session
pub mod orchestrator;

/// Line-oriented chat front end
pub mod console;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
