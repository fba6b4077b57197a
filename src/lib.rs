// SPDX-License-Identifier: MIT

//! flowgate-rs - run multi-phase agent processes with parallel fan-out and
//! score-gated human checkpoints.

pub mod flowgate;
pub mod sdk;
