// SPDX-License-Identifier: MIT

//! Process executor
//!
//! Walks a process definition in declared order. Tasks go to the step
//! runner one at a time, parallel groups fan out and are joined before the
//! next step starts, checkpoints consult their gate, and guards may stop the
//! run early. All results are folded into a single [`Accumulator`].

mod gate;
mod parallel;

pub use gate::{raise, GateState, ThresholdGate};
pub use parallel::run_all;

use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::result::{CheckpointRecord, EarlyExit, ProcessOutcome, ProcessReport, Totals};
use super::state::{refs, Accumulator, ProcessState};
use super::types::{
    CheckpointDefinition, GuardDefinition, ParallelDefinition, ProcessDefinition, StepDefinition,
    TaskDefinition,
};
use super::validate::validate;
use crate::sdk::clock::{Clock, SystemClock};
use crate::sdk::error::{ProcessError, Result};
use crate::sdk::review::{AutoApproveReviewer, Breakpoint, Reviewer};
use crate::sdk::runner::StepRunner;
use crate::sdk::schema::SchemaPolicy;
use crate::sdk::step::{StepResult, StepSpec};

/// Runs process definitions against injected collaborators
pub struct ProcessExecutor {
    runner: Arc<dyn StepRunner>,
    reviewer: Arc<dyn Reviewer>,
    clock: Arc<dyn Clock>,
    schema_policy: SchemaPolicy,
}

impl ProcessExecutor {
    pub fn new(runner: Arc<dyn StepRunner>) -> Self {
        Self {
            runner,
            reviewer: Arc::new(AutoApproveReviewer),
            clock: Arc::new(SystemClock),
            schema_policy: SchemaPolicy::default(),
        }
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn Reviewer>) -> Self {
        self.reviewer = reviewer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.schema_policy = policy;
        self
    }

    /// Run a whole process.
    ///
    /// `inputs` must be a JSON object (or null); its keys override the
    /// definition's default inputs.
    pub async fn run(&self, def: &ProcessDefinition, inputs: Value) -> Result<ProcessOutcome> {
        validate(def)?;

        let inputs = merge_inputs(&def.inputs, inputs)?;
        let run_id = Uuid::new_v4();
        let started_at = self.clock.now();
        log::info!(
            "Starting process '{}' (run {}) with {} steps using runner '{}'",
            def.name,
            run_id,
            def.steps.len(),
            self.runner.name()
        );

        let mut acc = Accumulator::new(inputs.clone());

        for step in &def.steps {
            acc = match step {
                StepDefinition::Task(task) => {
                    let result = self.run_step(task, &acc.state).await?;
                    acc.absorb(&task.id, result)
                }
                StepDefinition::Parallel(group) => {
                    let members = self.run_group(group, &acc.state).await?;
                    acc.absorb_group(&group.id, members)
                }
                StepDefinition::Checkpoint(checkpoint) => {
                    let record = self.checkpoint(checkpoint, &acc).await?;
                    acc.record_checkpoint(record)
                }
                StepDefinition::Guard(guard) => {
                    if let Some(exit) = check_guard(guard, &acc.state) {
                        log::warn!(
                            "Process '{}' stopped at guard {}: {}",
                            def.name,
                            guard.id,
                            exit.reason
                        );
                        return Ok(ProcessOutcome::Halted(exit));
                    }
                    acc
                }
            };
        }

        let finished_at = self.clock.now();
        let duration_ms = (finished_at - started_at).num_milliseconds();
        log::info!(
            "Process '{}' completed: {} steps, {} artifacts in {}ms",
            def.name,
            acc.outcomes.len(),
            acc.artifacts.len(),
            duration_ms
        );

        let totals = Totals {
            steps: acc.outcomes.len(),
            artifacts: acc.artifacts.len(),
            checkpoints_raised: acc.checkpoints.iter().filter(|c| c.raised).count(),
            scores: acc.scores,
            duration_ms,
        };

        Ok(ProcessOutcome::Completed(Box::new(ProcessReport {
            success: true,
            process_id: def.name.clone(),
            run_id,
            inputs,
            steps: acc.outcomes,
            artifacts: acc.artifacts,
            checkpoints: acc.checkpoints,
            totals,
            started_at,
            finished_at,
        })))
    }

    /// Run a single task against the current state
    pub async fn run_step(&self, task: &TaskDefinition, state: &ProcessState) -> Result<StepResult> {
        let spec = build_spec(task, state);
        log::info!("Running step {} ({})", spec.id, spec.title);

        let result = self
            .runner
            .run_step(&spec)
            .await
            .map_err(|e| ProcessError::step_failed(&spec.id, e))?;

        check_output(self.schema_policy, &spec, &result)?;
        log::info!("Step {} completed", spec.id);
        Ok(result)
    }

    /// Run every task of a group concurrently; results come back in
    /// declaration order.
    pub async fn run_group(
        &self,
        group: &ParallelDefinition,
        state: &ProcessState,
    ) -> Result<Vec<(String, StepResult)>> {
        log::info!(
            "Fanning out group {} with {} tasks",
            group.id,
            group.tasks.len()
        );

        let specs: Vec<StepSpec> = group.tasks.iter().map(|t| build_spec(t, state)).collect();
        let thunks: Vec<_> = specs
            .iter()
            .cloned()
            .map(|spec| {
                let runner = self.runner.clone();
                let label = spec.id.clone();
                let fut = async move {
                    runner
                        .run_step(&spec)
                        .await
                        .map_err(|e| ProcessError::step_failed(&spec.id, e))
                };
                (label, fut)
            })
            .collect();

        let results = run_all(thunks).await?;

        let mut members = Vec::with_capacity(results.len());
        for (spec, result) in specs.iter().zip(results) {
            check_output(self.schema_policy, spec, &result)?;
            members.push((spec.id.clone(), result));
        }
        log::info!("Group {} joined", group.id);
        Ok(members)
    }

    async fn checkpoint(
        &self,
        checkpoint: &CheckpointDefinition,
        acc: &Accumulator,
    ) -> Result<CheckpointRecord> {
        let mut context = Map::new();
        for path in &checkpoint.context {
            let value = acc.state.get_path(path).cloned().unwrap_or(Value::Null);
            context.insert(path.clone(), value);
        }

        let mut breakpoint = Breakpoint {
            id: checkpoint.id.clone(),
            title: checkpoint.title.clone(),
            question: refs::interpolate(&checkpoint.question, &acc.state),
            context: Value::Null,
            files: acc.artifact_paths(),
        };

        let Some(gate_def) = &checkpoint.gate else {
            breakpoint.context = Value::Object(context);
            log::info!("Checkpoint {} raised", checkpoint.id);
            raise(self.reviewer.as_ref(), &breakpoint).await?;
            return Ok(CheckpointRecord {
                id: checkpoint.id.clone(),
                title: checkpoint.title.clone(),
                score: None,
                threshold: None,
                raised: true,
            });
        };

        let score = acc
            .state
            .get_path(&gate_def.score)
            .and_then(Value::as_f64)
            .ok_or_else(|| ProcessError::MissingScore {
                checkpoint: checkpoint.id.clone(),
                path: gate_def.score.clone(),
            })?;
        let threshold = refs::resolve(&gate_def.threshold, &acc.state)
            .as_f64()
            .ok_or_else(|| {
                ProcessError::config(format!(
                    "Checkpoint '{}' threshold {} is not a number",
                    checkpoint.id, gate_def.threshold
                ))
            })?;

        context.insert("score".to_string(), score.into());
        context.insert("threshold".to_string(), threshold.into());
        breakpoint.context = Value::Object(context);

        let mut gate = ThresholdGate::new(threshold);
        let raised = gate.pass(score, self.reviewer.as_ref(), &breakpoint).await?;

        Ok(CheckpointRecord {
            id: checkpoint.id.clone(),
            title: checkpoint.title.clone(),
            score: Some(score),
            threshold: Some(threshold),
            raised,
        })
    }
}

fn build_spec(task: &TaskDefinition, state: &ProcessState) -> StepSpec {
    let args = match &task.args {
        Value::Null => Value::Object(Map::new()),
        other => refs::resolve(other, state),
    };

    let mut agent = task.agent.clone();
    agent.task = refs::interpolate(&agent.task, state);
    agent.context = agent
        .context
        .iter()
        .map(|line| refs::interpolate(line, state))
        .collect();

    StepSpec::new(&task.id, task.title())
        .with_agent(agent)
        .with_args(args)
        .with_output(task.output.clone())
}

fn check_output(policy: SchemaPolicy, spec: &StepSpec, result: &StepResult) -> Result<()> {
    if policy == SchemaPolicy::Ignore || spec.output.is_empty() {
        return Ok(());
    }

    let violations = spec.output.validate(&result.output);
    if violations.is_empty() {
        return Ok(());
    }

    match policy {
        SchemaPolicy::Enforce => Err(ProcessError::SchemaViolation {
            step: spec.id.clone(),
            violations: violations.iter().map(ToString::to_string).collect(),
        }),
        _ => {
            for v in &violations {
                log::warn!("Step {} output does not match schema: {}", spec.id, v);
            }
            Ok(())
        }
    }
}

/// `None` when the guard passes, otherwise the early-exit result
fn check_guard(guard: &GuardDefinition, state: &ProcessState) -> Option<EarlyExit> {
    if state.get_path(&guard.check) == Some(&Value::Bool(true)) {
        log::info!("Guard {} passed", guard.id);
        return None;
    }

    let recommendations = guard
        .recommendations
        .as_deref()
        .and_then(|path| state.get_path(path))
        .map(|value| match value {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        })
        .unwrap_or_default();

    Some(EarlyExit::new(guard.reason.clone(), recommendations))
}

fn merge_inputs(defaults: &Map<String, Value>, provided: Value) -> Result<Value> {
    let mut merged = defaults.clone();
    match provided {
        Value::Null => {}
        Value::Object(obj) => merged.extend(obj),
        other => {
            return Err(ProcessError::config(format!(
                "Process inputs must be a JSON object, got {}",
                other
            )))
        }
    }
    Ok(Value::Object(merged))
}
