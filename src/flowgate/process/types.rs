// SPDX-License-Identifier: MIT

//! YAML schema types for process definitions
//!
//! A process is an ordered list of steps. Each step is one of:
//! - `task` - a single unit of work handed to the step runner
//! - `parallel` - a group of tasks run concurrently
//! - `checkpoint` - a human review pause, optionally gated on a score
//! - `guard` - stops the process early when a flag is not `true`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sdk::schema::OutputSchema;
use crate::sdk::step::AgentSpec;

/// Top-level process definition
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProcessDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Default inputs, overridden by caller-supplied inputs
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

/// One entry in a process's step list
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepDefinition {
    Task(TaskDefinition),
    Parallel(ParallelDefinition),
    Checkpoint(CheckpointDefinition),
    Guard(GuardDefinition),
}

impl StepDefinition {
    pub fn id(&self) -> &str {
        match self {
            StepDefinition::Task(t) => &t.id,
            StepDefinition::Parallel(p) => &p.id,
            StepDefinition::Checkpoint(c) => &c.id,
            StepDefinition::Guard(g) => &g.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StepDefinition::Task(_) => "task",
            StepDefinition::Parallel(_) => "parallel",
            StepDefinition::Checkpoint(_) => "checkpoint",
            StepDefinition::Guard(_) => "guard",
        }
    }
}

/// A single unit of work
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TaskDefinition {
    pub id: String,
    /// Human-readable title (defaults to the id)
    pub title: Option<String>,
    #[serde(default)]
    pub agent: AgentSpec,
    /// Arguments; strings may reference `$input.*` and `$steps.*`
    #[serde(default)]
    pub args: Value,
    /// Declared output shape
    #[serde(default)]
    pub output: OutputSchema,
}

impl TaskDefinition {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Tasks run concurrently and joined in submission order
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ParallelDefinition {
    pub id: String,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

/// Human review pause
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CheckpointDefinition {
    pub id: String,
    pub title: String,
    /// Question shown to the reviewer; may embed `${...}` placeholders
    pub question: String,
    /// When present, the checkpoint only fires if the score is below threshold
    pub gate: Option<GateDefinition>,
    /// State paths copied into the breakpoint context
    #[serde(default)]
    pub context: Vec<String>,
}

/// Score threshold for a checkpoint
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GateDefinition {
    /// State path of the numeric score, e.g. `steps.score.value`
    pub score: String,
    /// Minimum acceptable score: a number or a `$` reference
    pub threshold: Value,
}

/// Early exit when a flag is not `true`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GuardDefinition {
    pub id: String,
    /// State path of the boolean flag, e.g. `steps.plan.planApproved`
    pub check: String,
    /// Fixed reason reported when the guard stops the process
    pub reason: String,
    /// State path of a list of recommendations to report
    pub recommendations: Option<String>,
}
