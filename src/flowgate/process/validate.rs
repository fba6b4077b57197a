// SPDX-License-Identifier: MIT

//! Structural checks run before a process starts

use serde_json::Value;
use std::collections::HashSet;

use super::state::{refs, Reference};
use super::types::{ProcessDefinition, StepDefinition, TaskDefinition};
use crate::sdk::error::DefinitionError;

/// Reject definitions that could never run cleanly:
/// no steps, duplicate ids, empty parallel groups, or references to steps
/// that have not completed by the time they are read.
pub fn validate(def: &ProcessDefinition) -> Result<(), DefinitionError> {
    if def.steps.is_empty() {
        return Err(DefinitionError::NoSteps(def.name.clone()));
    }

    let all_ids = collect_ids(def)?;
    let mut completed: HashSet<&str> = HashSet::new();

    for step in &def.steps {
        match step {
            StepDefinition::Task(task) => {
                check_paths(&task.id, &task_paths(task), &completed, &all_ids)?;
                completed.insert(&task.id);
            }
            StepDefinition::Parallel(group) => {
                if group.tasks.is_empty() {
                    return Err(DefinitionError::EmptyParallel(group.id.clone()));
                }
                // Members only see what existed before the group started
                for task in &group.tasks {
                    check_paths(&task.id, &task_paths(task), &completed, &all_ids)?;
                }
                for task in &group.tasks {
                    completed.insert(&task.id);
                }
                completed.insert(&group.id);
            }
            StepDefinition::Checkpoint(checkpoint) => {
                let mut paths = refs::template_paths(&checkpoint.question);
                paths.extend(checkpoint.context.iter().cloned());
                if let Some(gate) = &checkpoint.gate {
                    paths.push(gate.score.clone());
                    paths.extend(value_paths(&gate.threshold));
                }
                check_paths(&checkpoint.id, &paths, &completed, &all_ids)?;
            }
            StepDefinition::Guard(guard) => {
                let mut paths = vec![guard.check.clone()];
                paths.extend(guard.recommendations.iter().cloned());
                check_paths(&guard.id, &paths, &completed, &all_ids)?;
            }
        }
    }
    Ok(())
}

fn collect_ids(def: &ProcessDefinition) -> Result<HashSet<&str>, DefinitionError> {
    let mut ids = HashSet::new();
    for step in &def.steps {
        if !ids.insert(step.id()) {
            return Err(DefinitionError::DuplicateStep(step.id().to_string()));
        }
        if let StepDefinition::Parallel(group) = step {
            for task in &group.tasks {
                if !ids.insert(task.id.as_str()) {
                    return Err(DefinitionError::DuplicateStep(task.id.clone()));
                }
            }
        }
    }
    Ok(ids)
}

fn task_paths(task: &TaskDefinition) -> Vec<String> {
    let mut paths = refs::template_paths(&task.agent.task);
    for line in &task.agent.context {
        paths.extend(refs::template_paths(line));
    }
    refs::collect_paths(&task.args, &mut paths);
    paths
}

fn value_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    refs::collect_paths(value, &mut paths);
    paths
}

fn check_paths(
    step: &str,
    paths: &[String],
    completed: &HashSet<&str>,
    all_ids: &HashSet<&str>,
) -> Result<(), DefinitionError> {
    for path in paths {
        let reference = Reference::parse(path)?;
        let Some(target) = reference.step_id() else {
            continue;
        };
        if completed.contains(target) {
            continue;
        }
        return Err(if all_ids.contains(target) {
            DefinitionError::ForwardReference {
                step: step.to_string(),
                target: target.to_string(),
            }
        } else {
            DefinitionError::UnknownReference {
                step: step.to_string(),
                target: target.to_string(),
            }
        });
    }
    Ok(())
}
