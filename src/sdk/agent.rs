// SPDX-License-Identifier: MIT

//! Agent-backed step runner
//!
//! Turns a [`StepSpec`] into a two-message prompt (system: role, guidance and
//! the output contract; user: task, context and arguments), sends it to a
//! [`Model`], and parses the reply as the step's JSON output.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::error::{BoxError, ModelError};
use super::model::{GenerationConfig, Message, Model};
use super::runner::StepRunner;
use super::step::{StepResult, StepSpec};

/// Runs steps by prompting an LLM
pub struct AgentStepRunner {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl AgentStepRunner {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            config: GenerationConfig {
                json_output: true,
                ..Default::default()
            },
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    fn build_prompt(step: &StepSpec) -> Vec<Message> {
        let mut system = format!("You are {}.", step.agent.role.trim_end_matches('.'));
        if !step.agent.instructions.is_empty() {
            system.push_str("\n\nInstructions:");
            for line in &step.agent.instructions {
                system.push_str("\n- ");
                system.push_str(line);
            }
        }
        system.push_str(
            "\n\nRespond with a single JSON object and nothing else. \
             It must conform to this JSON Schema:\n",
        );
        system.push_str(
            &serde_json::to_string_pretty(&step.output.to_json_schema()).unwrap_or_default(),
        );
        system.push_str(
            "\nIf you produce files, list them in an \"artifacts\" array of \
             {\"path\", \"format\"} objects.",
        );

        let mut user = format!("# {}\n\n{}", step.title, step.agent.task);
        if !step.agent.context.is_empty() {
            user.push_str("\n\nContext:");
            for line in &step.agent.context {
                user.push_str("\n- ");
                user.push_str(line);
            }
        }
        user.push_str("\n\nArguments:\n");
        user.push_str(&serde_json::to_string_pretty(&step.args).unwrap_or_default());

        vec![Message::system(system), Message::user(user)]
    }
}

/// Pull the JSON object out of a model reply.
///
/// Accepts a bare object, an object wrapped in a fenced code block, or an
/// object surrounded by prose.
pub(crate) fn extract_json_object(text: &str) -> Result<Value, ModelError> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => serde_json::from_str::<Value>(&trimmed[s..=e])
            .ok()
            .filter(Value::is_object)
            .ok_or_else(|| {
                ModelError::InvalidResponse(format!("reply is not a JSON object: {}", preview(text)))
            }),
        _ => Err(ModelError::InvalidResponse(format!(
            "reply contains no JSON object: {}",
            preview(text)
        ))),
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl StepRunner for AgentStepRunner {
    fn name(&self) -> &str {
        "agent"
    }

    async fn run_step(&self, step: &StepSpec) -> Result<StepResult, BoxError> {
        let history = Self::build_prompt(step);
        log::info!(
            "Prompting {} for step {} ({})",
            self.model.describe(),
            step.id,
            step.title
        );

        let reply = self.model.generate(&history, Some(&self.config)).await?;
        let output = extract_json_object(&reply.text)?;

        log::info!(
            "Step {} returned {} fields",
            step.id,
            output.as_object().map(|o| o.len()).unwrap_or(0)
        );
        Ok(StepResult::new(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::model::Role;
    use crate::sdk::schema::OutputSchema;
    use crate::sdk::step::AgentSpec;
    use serde_json::json;
    use std::sync::Mutex;

    /// Model that replays a fixed reply and records the prompt it saw
    struct ScriptedModel {
        reply: String,
        seen: Mutex<Vec<Message>>,
    }

    impl ScriptedModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Model for ScriptedModel {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        async fn generate(
            &self,
            history: &[Message],
            config: Option<&GenerationConfig>,
        ) -> Result<Message, ModelError> {
            assert!(config.map(|c| c.json_output).unwrap_or(false));
            *self.seen.lock().unwrap() = history.to_vec();
            Ok(Message::model(self.reply.clone()))
        }
    }

    fn step() -> StepSpec {
        let output: OutputSchema =
            serde_yaml::from_str("score: { type: number, required: true }").unwrap();
        StepSpec::new("score", "Score the draft")
            .with_agent(AgentSpec {
                role: "a senior reviewer".to_string(),
                task: "Score the draft from 0 to 100".to_string(),
                instructions: vec!["Be strict".to_string()],
                context: vec!["Draft v2".to_string()],
            })
            .with_args(json!({"draft": "hello"}))
            .with_output(output)
    }

    #[test]
    fn test_extract_bare_object() {
        assert_eq!(extract_json_object(" {\"a\": 1} ").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_extract_fenced_object() {
        let text = "Here you go:\n```json\n{\"a\": {\"b\": 2}}\n```\nThanks";
        assert_eq!(extract_json_object(text).unwrap(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_extract_rejects_non_object() {
        assert!(extract_json_object("[1, 2]").is_err());
        assert!(extract_json_object("no json here").is_err());
        assert!(extract_json_object("{ broken").is_err());
    }

    #[test]
    fn test_build_prompt_contents() {
        let prompt = AgentStepRunner::build_prompt(&step());
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, Role::System);
        assert!(prompt[0].text.starts_with("You are a senior reviewer."));
        assert!(prompt[0].text.contains("- Be strict"));
        assert!(prompt[0].text.contains("\"score\""));
        assert!(prompt[1].text.starts_with("# Score the draft"));
        assert!(prompt[1].text.contains("- Draft v2"));
        assert!(prompt[1].text.contains("\"draft\": \"hello\""));
    }

    #[tokio::test]
    async fn test_run_step_parses_reply() {
        let model = Arc::new(ScriptedModel::new(
            "```json\n{\"score\": 82, \"artifacts\": [{\"path\": \"r.md\", \"format\": \"markdown\"}]}\n```",
        ));
        let runner = AgentStepRunner::new(model.clone());

        let result = runner.run_step(&step()).await.unwrap();

        assert_eq!(result.output["score"], 82);
        assert_eq!(result.artifact_delta().len(), 1);
        assert_eq!(model.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_step_invalid_reply_is_error() {
        let runner = AgentStepRunner::new(Arc::new(ScriptedModel::new("I cannot do that")));
        let err = runner.run_step(&step()).await.unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }
}
