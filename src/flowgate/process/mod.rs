// SPDX-License-Identifier: MIT

pub mod executor;
pub mod loader;
pub mod registry;
pub mod result;
pub mod state;
pub mod types;
pub mod validate;
