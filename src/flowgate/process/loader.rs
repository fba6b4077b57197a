//! Process loader - YAML file loading and parsing
//!
//! This module handles loading process definitions from YAML files and
//! reading the JSON inputs a run is started with.

use serde_json::Value;
use std::fs;
use std::path::Path;

use super::types::ProcessDefinition;
use crate::sdk::error::{DefinitionError, ProcessError, Result};

/// Loads process definitions from YAML files
pub struct ProcessLoader;

impl ProcessLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a process definition from a YAML file
    pub fn load_process<P: AsRef<Path>>(&self, path: P) -> Result<ProcessDefinition> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DefinitionError::NotFound(path.display().to_string()).into());
        }
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse a process definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<ProcessDefinition> {
        let def: ProcessDefinition = serde_yaml::from_str(content)?;
        Ok(def)
    }

    /// Parse run inputs: inline JSON, or `@path` to read JSON from a file
    pub fn load_inputs(arg: &str) -> Result<Value> {
        let text = match arg.strip_prefix('@') {
            Some(path) => fs::read_to_string(path)?,
            None => arg.to_string(),
        };
        let value: Value = serde_json::from_str(&text)?;
        if !value.is_object() {
            return Err(ProcessError::config("Process inputs must be a JSON object"));
        }
        Ok(value)
    }
}

impl Default for ProcessLoader {
    fn default() -> Self {
        Self::new()
    }
}
