// SPDX-License-Identifier: MIT

//! Threshold-gated checkpoints

use crate::sdk::error::{ProcessError, Result};
use crate::sdk::review::{Breakpoint, Reviewer};

/// Where a gated checkpoint currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Proceeding,
    AwaitingReview,
}

/// Minimum acceptable score for a checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdGate {
    threshold: f64,
    state: GateState,
}

impl ThresholdGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            state: GateState::Proceeding,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Move to `AwaitingReview` when `score` is below the threshold.
    /// A score equal to the threshold passes.
    pub fn observe(&mut self, score: f64) -> GateState {
        if score < self.threshold {
            self.state = GateState::AwaitingReview;
        }
        self.state
    }

    /// Reviewer approval: back to `Proceeding`
    pub fn resume(&mut self) {
        self.state = GateState::Proceeding;
    }

    /// Observe `score` and, if it misses the threshold, hand the breakpoint
    /// to the reviewer and wait for it to resume the process.
    ///
    /// Returns whether the reviewer was asked.
    pub async fn pass(
        &mut self,
        score: f64,
        reviewer: &dyn Reviewer,
        breakpoint: &Breakpoint,
    ) -> Result<bool> {
        if self.observe(score) == GateState::Proceeding {
            log::info!(
                "Checkpoint {} skipped: score {} meets threshold {}",
                breakpoint.id,
                score,
                self.threshold
            );
            return Ok(false);
        }

        log::info!(
            "Checkpoint {} awaiting review: score {} below threshold {}",
            breakpoint.id,
            score,
            self.threshold
        );
        raise(reviewer, breakpoint).await?;
        self.resume();
        Ok(true)
    }
}

/// Hand a breakpoint to the reviewer unconditionally
pub async fn raise(reviewer: &dyn Reviewer, breakpoint: &Breakpoint) -> Result<()> {
    reviewer
        .review(breakpoint)
        .await
        .map_err(|e| ProcessError::Review {
            checkpoint: breakpoint.id.clone(),
            message: e.to_string(),
        })
}
