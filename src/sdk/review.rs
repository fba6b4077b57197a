// SPDX-License-Identifier: MIT

//! Human-in-the-loop checkpoints

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::error::BoxError;

/// A pause point surfaced to a reviewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakpoint {
    /// Id of the checkpoint step
    pub id: String,
    pub title: String,
    pub question: String,
    /// Accumulated data relevant to the decision
    pub context: Value,
    /// Paths of artifacts produced so far
    pub files: Vec<String>,
}

/// Receives breakpoints and returns once the process may resume
#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, breakpoint: &Breakpoint) -> Result<(), BoxError>;
}

/// Logs every breakpoint and resumes immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApproveReviewer;

#[async_trait]
impl Reviewer for AutoApproveReviewer {
    async fn review(&self, breakpoint: &Breakpoint) -> Result<(), BoxError> {
        log::warn!(
            "Checkpoint '{}' auto-approved: {}",
            breakpoint.title,
            breakpoint.question
        );
        Ok(())
    }
}

/// Prints the breakpoint on stdout and waits for Enter on stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReviewer;

#[async_trait]
impl Reviewer for ConsoleReviewer {
    async fn review(&self, breakpoint: &Breakpoint) -> Result<(), BoxError> {
        println!("\n== {} ==", breakpoint.title);
        println!("{}", breakpoint.question);
        println!("{}", serde_json::to_string_pretty(&breakpoint.context)?);
        for file in &breakpoint.files {
            println!("  - {}", file);
        }
        println!("Press Enter to continue...");

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        if read == 0 {
            return Err("stdin closed before the checkpoint was approved".into());
        }
        Ok(())
    }
}
