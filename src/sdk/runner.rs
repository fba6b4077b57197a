// SPDX-License-Identifier: MIT

//! Step runner capability
//!
//! The executor never does a step's work itself; it hands a resolved
//! [`StepSpec`] to a [`StepRunner`] and folds whatever comes back.

use async_trait::async_trait;
use serde_json::json;

use super::error::BoxError;
use super::step::{Artifact, StepResult, StepSpec};

/// Executes a single step
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run the step and return its result
    async fn run_step(&self, step: &StepSpec) -> Result<StepResult, BoxError>;
}

/// Offline runner that answers every step with a sample of its output schema
///
/// Each step also contributes one JSON artifact under `artifact_dir`, so a
/// dry run shows how artifacts would accumulate.
pub struct EchoStepRunner {
    artifact_dir: String,
}

impl EchoStepRunner {
    pub fn new(artifact_dir: impl Into<String>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }
}

impl Default for EchoStepRunner {
    fn default() -> Self {
        Self::new("artifacts")
    }
}

#[async_trait]
impl StepRunner for EchoStepRunner {
    fn name(&self) -> &str {
        "echo"
    }

    async fn run_step(&self, step: &StepSpec) -> Result<StepResult, BoxError> {
        let mut output = step.output.sample();
        if let Some(obj) = output.as_object_mut() {
            obj.entry("echo").or_insert(json!({
                "title": step.title,
                "args": step.args,
            }));
        }

        let artifact = Artifact {
            path: format!("{}/{}.json", self.artifact_dir.trim_end_matches('/'), step.id),
            format: "json".to_string(),
            label: Some(step.title.clone()),
        };

        log::debug!("Echo runner produced output for step {}", step.id);
        Ok(StepResult::new(output).with_artifacts(vec![artifact]))
    }
}
