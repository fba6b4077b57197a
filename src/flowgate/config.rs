// SPDX-License-Identifier: MIT

//! Runner configuration from the environment
//!
//! | Variable                 | Default                     |
//! |--------------------------|-----------------------------|
//! | `MODEL_NAME`             | `gpt-4o-mini`               |
//! | `OPENAI_API_KEY`         | (required for `agent`)      |
//! | `OPENAI_BASE_URL`        | `https://api.openai.com/v1` |
//! | `FLOWGATE_SCHEMA_POLICY` | `warn`                      |
//! | `FLOWGATE_TEMPERATURE`   | provider default            |
//! | `FLOWGATE_ARTIFACT_DIR`  | `artifacts`                 |

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use url::Url;

use crate::sdk::agent::AgentStepRunner;
use crate::sdk::error::{ProcessError, Result};
use crate::sdk::model::openai::OpenAIModel;
use crate::sdk::model::GenerationConfig;
use crate::sdk::runner::{EchoStepRunner, StepRunner};
use crate::sdk::schema::SchemaPolicy;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub model_name: String,
    pub api_key: Option<String>,
    pub base_url: Url,
    pub schema_policy: SchemaPolicy,
    pub temperature: Option<f32>,
    pub artifact_dir: String,
}

impl RunnerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars().collect())
    }

    /// Read configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let base_url = get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|e| {
            ProcessError::config(format!("OPENAI_BASE_URL '{}' is invalid: {}", base_url, e))
        })?;

        let schema_policy = match get("FLOWGATE_SCHEMA_POLICY") {
            Some(raw) => raw.parse::<SchemaPolicy>().map_err(ProcessError::Config)?,
            None => SchemaPolicy::default(),
        };

        let temperature = match get("FLOWGATE_TEMPERATURE") {
            Some(raw) => Some(raw.parse::<f32>().map_err(|e| {
                ProcessError::config(format!("FLOWGATE_TEMPERATURE '{}': {}", raw, e))
            })?),
            None => None,
        };

        Ok(Self {
            model_name: get("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: get("OPENAI_API_KEY"),
            base_url,
            schema_policy,
            temperature,
            artifact_dir: get("FLOWGATE_ARTIFACT_DIR").unwrap_or_else(|| "artifacts".to_string()),
        })
    }

    /// Offline runner for dry runs
    pub fn echo_runner(&self) -> Arc<dyn StepRunner> {
        Arc::new(EchoStepRunner::new(self.artifact_dir.clone()))
    }

    /// LLM-backed runner; requires an API key
    pub fn agent_runner(&self) -> Result<Arc<dyn StepRunner>> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| ProcessError::config("OPENAI_API_KEY must be set for the agent runner"))?;
        let model = OpenAIModel::new(
            self.model_name.clone(),
            api_key,
            self.base_url.as_str(),
        )?;

        let runner = AgentStepRunner::new(Arc::new(model)).with_config(GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: None,
            json_output: true,
        });
        Ok(Arc::new(runner))
    }
}
