// SPDX-License-Identifier: MIT

//! Final process results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::sdk::step::Artifact;

/// Output of one executed step, in execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub id: String,
    pub output: Value,
    /// Number of artifacts this step contributed
    pub artifacts: usize,
}

/// A checkpoint the process passed through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub id: String,
    pub title: String,
    pub score: Option<f64>,
    pub threshold: Option<f64>,
    /// Whether the reviewer was actually asked
    pub raised: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub steps: usize,
    pub artifacts: usize,
    pub checkpoints_raised: usize,
    /// Observed score per gated checkpoint
    pub scores: BTreeMap<String, f64>,
    pub duration_ms: i64,
}

/// Result of a process that ran to the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub success: bool,
    pub process_id: String,
    pub run_id: Uuid,
    pub inputs: Value,
    pub steps: Vec<StepOutcome>,
    pub artifacts: Vec<Artifact>,
    pub checkpoints: Vec<CheckpointRecord>,
    pub totals: Totals,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProcessReport {
    /// Output of a step by id
    pub fn output(&self, id: &str) -> Option<&Value> {
        self.steps.iter().find(|s| s.id == id).map(|s| &s.output)
    }
}

/// Result of a process stopped by a guard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyExit {
    pub success: bool,
    pub reason: String,
    /// Echoed from the planning step unchanged
    pub recommendations: Vec<Value>,
}

impl EarlyExit {
    pub fn new(reason: impl Into<String>, recommendations: Vec<Value>) -> Self {
        Self {
            success: false,
            reason: reason.into(),
            recommendations,
        }
    }
}

/// What a process run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessOutcome {
    Completed(Box<ProcessReport>),
    Halted(EarlyExit),
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&ProcessReport> {
        match self {
            ProcessOutcome::Completed(report) => Some(&**report),
            ProcessOutcome::Halted(_) => None,
        }
    }

    pub fn early_exit(&self) -> Option<&EarlyExit> {
        match self {
            ProcessOutcome::Completed(_) => None,
            ProcessOutcome::Halted(exit) => Some(exit),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_early_exit_serializes_flat() {
        let outcome = ProcessOutcome::Halted(EarlyExit::new(
            "Plan not approved",
            vec![json!("x")],
        ));
        assert!(!outcome.is_success());
        assert!(outcome.report().is_none());
        assert_eq!(
            outcome.to_json(),
            json!({
                "success": false,
                "reason": "Plan not approved",
                "recommendations": ["x"]
            })
        );
    }

    #[test]
    fn test_report_output_lookup() {
        let now = Utc::now();
        let report = ProcessReport {
            success: true,
            process_id: "p".to_string(),
            run_id: Uuid::new_v4(),
            inputs: json!({}),
            steps: vec![StepOutcome {
                id: "a".to_string(),
                output: json!({"v": 1}),
                artifacts: 0,
            }],
            artifacts: vec![],
            checkpoints: vec![],
            totals: Totals {
                steps: 1,
                artifacts: 0,
                checkpoints_raised: 0,
                scores: BTreeMap::new(),
                duration_ms: 0,
            },
            started_at: now,
            finished_at: now,
        };
        assert_eq!(report.output("a"), Some(&json!({"v": 1})));
        assert!(report.output("b").is_none());

        let outcome = ProcessOutcome::Completed(Box::new(report));
        assert!(outcome.is_success());
        assert_eq!(outcome.to_json()["success"], true);
        assert_eq!(outcome.to_json()["steps"][0]["id"], "a");
    }
}
