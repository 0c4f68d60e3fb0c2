//! Error types for the SmartPick domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;

use thiserror::Error;

/// The top-level error type for all SmartPick operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Agent errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Catalog errors ---
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the remote recommendation agent call.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Agent request failed: {0}")]
    Request(String),

    #[error("Agent returned an error: {message} (status: {status_code})")]
    Status { status_code: u16, message: String },

    #[error("Agent response could not be decoded: {0}")]
    Decode(String),

    #[error("Agent request timed out: {0}")]
    Timeout(String),

    #[error("Agent not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Duplicate catalog id: {0}")]
    DuplicateId(String),

    #[error("Catalog has no entries")]
    Empty,
}
