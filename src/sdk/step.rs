// SPDX-License-Identifier: MIT

//! Step and result types exchanged with a [`StepRunner`](super::runner::StepRunner)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::OutputSchema;

/// Role and task description handed to the agent behind a step
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentSpec {
    /// Who the agent should act as
    pub role: String,
    /// What the agent should do
    pub task: String,
    /// Additional guidance, one bullet per line
    pub instructions: Vec<String>,
    /// Free-form context lines
    pub context: Vec<String>,
}

/// A fully resolved unit of work
///
/// Built fresh for every invocation from the step definition and the
/// accumulated state; never mutated after it is handed to a runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSpec {
    pub id: String,
    pub title: String,
    pub agent: AgentSpec,
    /// Arguments with every `$` reference already resolved
    pub args: Value,
    /// Declared shape of the output object
    pub output: OutputSchema,
}

impl StepSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            agent: AgentSpec::default(),
            args: Value::Object(Map::new()),
            output: OutputSchema::default(),
        }
    }

    pub fn with_agent(mut self, agent: AgentSpec) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_output(mut self, output: OutputSchema) -> Self {
        self.output = output;
        self
    }
}

/// A reference to a generated file-like output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Artifact {
    pub path: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Artifact {
    pub fn new(path: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: format.into(),
            label: None,
        }
    }
}

/// Output of one step execution
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StepResult {
    /// The step's output object
    pub output: Value,
    /// Artifacts contributed by this step
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl StepResult {
    pub fn new(output: Value) -> Self {
        Self {
            output,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Collect this step's artifact delta.
    ///
    /// Runners may report artifacts in the dedicated field, inside
    /// `output.artifacts`, or both. Dedicated entries come first. An output
    /// entry is dropped only when it repeats a dedicated entry; entries that
    /// do not parse as an [`Artifact`] are skipped.
    pub fn artifact_delta(&self) -> Vec<Artifact> {
        let mut delta = self.artifacts.clone();
        if let Some(Value::Array(items)) = self.output.get("artifacts") {
            for item in items {
                match serde_json::from_value::<Artifact>(item.clone()) {
                    Ok(artifact) if !self.artifacts.contains(&artifact) => delta.push(artifact),
                    Ok(_) => {}
                    Err(e) => log::warn!("Ignoring malformed artifact {}: {}", item, e),
                }
            }
        }
        delta
    }
}
