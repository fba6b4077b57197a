// SPDX-License-Identifier: MIT

//! State management for running processes
//!
//! This module provides:
//! - `ProcessState` - inputs and step outputs addressable by dotted path
//! - `Accumulator` - the fold that threads state and artifacts through a run
//! - `refs` - `$` reference resolution for step arguments

pub mod refs;
mod store;

pub use refs::Reference;
pub use store::{Accumulator, ProcessState};
