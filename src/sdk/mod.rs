// SPDX-License-Identifier: MIT

//! Process SDK - the contract between process definitions and the outside world
//!
//! - [`runner::StepRunner`] - executes one step
//! - [`review::Reviewer`] - receives checkpoint breakpoints
//! - [`clock::Clock`] - timestamps for process metadata
//! - [`agent::AgentStepRunner`] - LLM-backed step runner

pub mod agent;
pub mod clock;
pub mod error;
pub mod model;
pub mod review;
pub mod runner;
pub mod schema;
pub mod step;

pub use error::{ProcessError, Result};
