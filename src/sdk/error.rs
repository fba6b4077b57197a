// SPDX-License-Identifier: MIT

//! Typed error handling for flowgate-rs
//!
//! Step runner failures are never recovered locally: they are wrapped in
//! [`ProcessError::StepFailed`] with the id of the step that raised them and
//! handed back to whoever started the process.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T, E = ProcessError> = std::result::Result<T, E>;

/// Boxed source error carried by runner failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for flowgate-rs
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A step runner reported a failure
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: BoxError,
    },

    /// A gated checkpoint could not read a numeric score
    #[error("Checkpoint '{checkpoint}' has no numeric score at '{path}'")]
    MissingScore { checkpoint: String, path: String },

    /// The reviewer could not deliver a resume signal
    #[error("Review of '{checkpoint}' failed: {message}")]
    Review { checkpoint: String, message: String },

    /// A step output violated its declared schema under the `enforce` policy
    #[error("Output of step '{step}' violates its schema: {violations:?}")]
    SchemaViolation {
        step: String,
        violations: Vec<String>,
    },

    /// A parallel member panicked or was aborted
    #[error("Parallel member '{step}' did not complete: {message}")]
    Join { step: String, message: String },

    /// Malformed process definitions
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Model provider failures
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Configuration errors (missing env vars, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors found while loading or validating a process definition
#[derive(Debug, Error, PartialEq)]
pub enum DefinitionError {
    /// Two steps share the same id
    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),

    /// A parallel group without members
    #[error("Parallel group '{0}' has no tasks")]
    EmptyParallel(String),

    /// A definition without any steps
    #[error("Process '{0}' declares no steps")]
    NoSteps(String),

    /// A reference points at a step that has not run yet
    #[error("Step '{step}' references '{target}' before it has run")]
    ForwardReference { step: String, target: String },

    /// A reference points at no step at all
    #[error("Step '{step}' references unknown step '{target}'")]
    UnknownReference { step: String, target: String },

    /// A reference path could not be parsed
    #[error("Invalid reference '{0}'")]
    InvalidReference(String),

    /// Process file not found in the registry or on disk
    #[error("Process not found: {0}")]
    NotFound(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Non-success HTTP status from the provider
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// HTTP transport errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ProcessError {
    /// Wrap a runner failure with the step it came from
    pub fn step_failed(step: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::StepFailed {
            step: step.into(),
            source: source.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Id of the step that caused this error, if any
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step, .. }
            | Self::SchemaViolation { step, .. }
            | Self::Join { step, .. } => Some(step.as_str()),
            Self::MissingScore { checkpoint, .. } | Self::Review { checkpoint, .. } => {
                Some(checkpoint.as_str())
            }
            _ => None,
        }
    }
}

impl ModelError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
