// SPDX-License-Identifier: MIT

//! Runtime state and the artifact fold

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::flowgate::process::result::{CheckpointRecord, StepOutcome};
use crate::sdk::step::{Artifact, StepResult};

/// Values visible to reference paths: `input.*` and `steps.<id>.*`
#[derive(Debug, Clone, Default)]
pub struct ProcessState {
    inputs: Value,
    steps: Map<String, Value>,
}

impl ProcessState {
    pub fn new(inputs: Value) -> Self {
        Self {
            inputs,
            steps: Map::new(),
        }
    }

    pub fn inputs(&self) -> &Value {
        &self.inputs
    }

    /// Output of a completed step
    pub fn step(&self, id: &str) -> Option<&Value> {
        self.steps.get(id)
    }

    fn record(&mut self, id: &str, output: Value) {
        self.steps.insert(id.to_string(), output);
    }

    /// Look up a dotted path such as `steps.plan.findings.0.title`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = match parts.next()? {
            "input" => &self.inputs,
            "steps" => self.steps.get(parts.next()?)?,
            _ => return None,
        };

        for part in parts {
            current = match current {
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                other => other.get(part)?,
            };
        }
        Some(current)
    }

    /// Whole state as JSON
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert("input".to_string(), self.inputs.clone());
        root.insert("steps".to_string(), Value::Object(self.steps.clone()));
        Value::Object(root)
    }
}

/// Everything a running process has accumulated so far
///
/// Threaded by value through the step sequence. Artifacts only ever grow:
/// each absorbed step appends its delta once, in the order steps are absorbed.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pub state: ProcessState,
    pub outcomes: Vec<StepOutcome>,
    pub artifacts: Vec<Artifact>,
    pub checkpoints: Vec<CheckpointRecord>,
    pub scores: BTreeMap<String, f64>,
}

impl Accumulator {
    pub fn new(inputs: Value) -> Self {
        Self {
            state: ProcessState::new(inputs),
            ..Default::default()
        }
    }

    /// Fold one step result into the accumulator
    pub fn absorb(mut self, id: &str, result: StepResult) -> Self {
        let delta = result.artifact_delta();
        log::debug!("Step {} contributed {} artifacts", id, delta.len());

        self.outcomes.push(StepOutcome {
            id: id.to_string(),
            output: result.output.clone(),
            artifacts: delta.len(),
        });
        self.artifacts.extend(delta);
        self.state.record(id, result.output);
        self
    }

    /// Fold a joined parallel group, members in submission order.
    ///
    /// The group id itself resolves to an object keyed by member id.
    pub fn absorb_group(mut self, group_id: &str, members: Vec<(String, StepResult)>) -> Self {
        let mut combined = Map::new();
        for (id, result) in members {
            combined.insert(id.clone(), result.output.clone());
            self = self.absorb(&id, result);
        }
        self.state.record(group_id, Value::Object(combined));
        self
    }

    pub fn record_checkpoint(mut self, record: CheckpointRecord) -> Self {
        if let Some(score) = record.score {
            self.scores.insert(record.id.clone(), score);
        }
        self.checkpoints.push(record);
        self
    }

    pub fn artifact_paths(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.path.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with(n: usize, tag: &str) -> StepResult {
        let artifacts = (0..n)
            .map(|i| Artifact::new(format!("{}/{}.md", tag, i), "markdown"))
            .collect();
        StepResult::new(json!({"tag": tag})).with_artifacts(artifacts)
    }

    #[test]
    fn test_get_path_roots() {
        let mut state = ProcessState::new(json!({"product": "app", "pages": ["a", "b"]}));
        state.record("plan", json!({"ok": true, "items": [{"name": "x"}]}));

        assert_eq!(state.get_path("input.product"), Some(&json!("app")));
        assert_eq!(state.get_path("input.pages.1"), Some(&json!("b")));
        assert_eq!(state.get_path("steps.plan.ok"), Some(&json!(true)));
        assert_eq!(state.get_path("steps.plan.items.0.name"), Some(&json!("x")));
        assert_eq!(state.get_path("steps.plan"), state.step("plan"));
        assert_eq!(state.get_path("steps.missing.ok"), None);
        assert_eq!(state.get_path("steps.plan.items.9"), None);
        assert_eq!(state.get_path("other.thing"), None);
        assert_eq!(state.get_path("steps"), None);
    }

    #[test]
    fn test_to_json() {
        let mut state = ProcessState::new(json!({"a": 1}));
        state.record("s", json!({"b": 2}));
        assert_eq!(state.to_json(), json!({"input": {"a": 1}, "steps": {"s": {"b": 2}}}));
    }

    #[test]
    fn test_artifacts_accumulate_in_order() {
        let counts = [2usize, 0, 3, 1];
        let mut acc = Accumulator::new(json!({}));
        for (i, n) in counts.iter().enumerate() {
            acc = acc.absorb(&format!("s{}", i), result_with(*n, &format!("s{}", i)));
        }

        assert_eq!(acc.artifacts.len(), counts.iter().sum::<usize>());

        let mut offset = 0;
        for (i, n) in counts.iter().enumerate() {
            let slice = &acc.artifacts[offset..offset + n];
            assert!(slice
                .iter()
                .all(|a| a.path.starts_with(&format!("s{}/", i))));
            offset += n;
        }
        let per_step: Vec<_> = acc.outcomes.iter().map(|o| o.artifacts).collect();
        assert_eq!(per_step, counts.to_vec());
    }

    #[test]
    fn test_absorb_group_records_members_and_group() {
        let acc = Accumulator::new(json!({})).absorb_group(
            "grp",
            vec![
                ("a".to_string(), result_with(1, "a")),
                ("b".to_string(), result_with(2, "b")),
            ],
        );

        assert_eq!(acc.state.get_path("steps.a.tag"), Some(&json!("a")));
        assert_eq!(acc.state.get_path("steps.grp.b.tag"), Some(&json!("b")));
        assert_eq!(
            acc.artifact_paths(),
            vec!["a/0.md", "b/0.md", "b/1.md"]
        );
    }

    #[test]
    fn test_record_checkpoint_tracks_scores() {
        let acc = Accumulator::new(json!({}))
            .record_checkpoint(CheckpointRecord {
                id: "q".to_string(),
                title: "Quality".to_string(),
                score: Some(65.0),
                threshold: Some(70.0),
                raised: true,
            })
            .record_checkpoint(CheckpointRecord {
                id: "manual".to_string(),
                title: "Manual".to_string(),
                score: None,
                threshold: None,
                raised: true,
            });

        assert_eq!(acc.checkpoints.len(), 2);
        assert_eq!(acc.scores.len(), 1);
        assert_eq!(acc.scores["q"], 65.0);
    }
}
