use std::sync::Arc;

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use ai_client::util::strip_code_blocks;
use ai_client::Generator;
use spark_common::types::{ReplyStatus, Topic};
use spark_common::{Config, SparkError};

use crate::prompt::ReplyPromptBuilder;
use crate::store::{ReplyPatch, ReplyStore};

/// Deployment constants the orchestrator runs on. The model list and the
/// credential list are both preference-ordered, best first.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub gate_threshold: i64,
    pub models: Vec<String>,
    pub credentials: Vec<String>,
    pub suggestion_count: usize,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            gate_threshold: config.gate_threshold,
            models: config.gemini_models.clone(),
            credentials: config.gemini_api_keys.clone(),
            suggestion_count: config.suggestion_count,
        }
    }
}

/// What the provider must return: a topic classification plus the configured
/// number of reply suggestions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuggestionPayload {
    pub topic: String,
    pub suggestions: Vec<String>,
}

/// Drives one pending record to a terminal status: gate, then a
/// model-major × credential-minor fallback chain, then bookkeeping.
pub struct GenerationOrchestrator {
    store: Arc<dyn ReplyStore>,
    generator: Arc<dyn Generator>,
    prompt: ReplyPromptBuilder,
    config: OrchestratorConfig,
}

impl GenerationOrchestrator {
    pub fn new(
        store: Arc<dyn ReplyStore>,
        generator: Arc<dyn Generator>,
        prompt: ReplyPromptBuilder,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            generator,
            prompt,
            config,
        }
    }

    /// Process one record. Idempotent: anything not `pending` is a no-op, so
    /// duplicate creation events and racing workers are harmless.
    pub async fn process(&self, id: Uuid) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| SparkError::NotFound(id.to_string()))?;

        if record.status != ReplyStatus::Pending {
            debug!(%id, status = %record.status, "Record already resolved, skipping");
            return Ok(());
        }

        // Gate: the primary cost control. No generation call below it.
        if record.score < self.config.gate_threshold {
            info!(
                %id,
                score = record.score,
                threshold = self.config.gate_threshold,
                "Score below gate, rejecting"
            );
            self.resolve(
                id,
                ReplyPatch {
                    status: Some(ReplyStatus::Rejected),
                    topic: Some(Topic::placeholder()),
                    ..Default::default()
                },
            )
            .await?;
            return Ok(());
        }

        let system_prompt = self.prompt.system_prompt();
        let user_prompt = self.prompt.user_prompt(&record);

        // Model-major order: quality of the model dominates availability of
        // a credential, so every credential is tried before the next model.
        let mut last_failure: Option<String> = None;
        for model in &self.config.models {
            for (index, credential) in self.config.credentials.iter().enumerate() {
                let outcome = self
                    .generator
                    .generate(model, credential, &system_prompt, &user_prompt)
                    .await;

                let text = match outcome {
                    Ok(text) if !text.trim().is_empty() => text,
                    Ok(_) => {
                        warn!(%id, model = model.as_str(), credential_index = index, "Empty generation response");
                        last_failure = Some(format!("{model}: empty response"));
                        continue;
                    }
                    Err(e) => {
                        warn!(%id, model = model.as_str(), credential_index = index, error = %e, "Generation call failed");
                        last_failure = Some(format!("{model} (credential #{index}): {e}"));
                        continue;
                    }
                };

                // The call itself succeeded: a broken payload is terminal.
                // Looping further would spend quota on a response problem,
                // not an availability problem.
                match parse_payload(&text, self.config.suggestion_count) {
                    Ok((topic, suggestions)) => {
                        info!(%id, model = model.as_str(), credential_index = index, "Generation succeeded");
                        self.resolve(
                            id,
                            ReplyPatch {
                                status: Some(ReplyStatus::Generated),
                                topic: Some(topic),
                                suggestions: Some(suggestions),
                                used_model: Some(model.clone()),
                                used_credential_index: Some(index),
                                ..Default::default()
                            },
                        )
                        .await?;
                    }
                    Err(e) => {
                        warn!(%id, model = model.as_str(), error = %e, "Generation payload unusable");
                        self.resolve(
                            id,
                            ReplyPatch {
                                status: Some(ReplyStatus::Error),
                                error_message: Some(e.to_string()),
                                ..Default::default()
                            },
                        )
                        .await?;
                    }
                }
                return Ok(());
            }
        }

        // Every model × credential pair failed.
        let message = last_failure
            .unwrap_or_else(|| "No generation attempts were possible".to_string());
        warn!(%id, message = message.as_str(), "All generation fallbacks exhausted");
        self.resolve(
            id,
            ReplyPatch {
                status: Some(ReplyStatus::Error),
                error_message: Some(message),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }

    /// Terminal write, conditional on the record still being pending. Losing
    /// the race to another resolver is logged and absorbed.
    async fn resolve(&self, id: Uuid, patch: ReplyPatch) -> Result<()> {
        let applied = self
            .store
            .transition(id, ReplyStatus::Pending, patch)
            .await?;
        if !applied {
            warn!(%id, "Record resolved concurrently elsewhere, dropping result");
        }
        Ok(())
    }
}

/// Parse the provider's structured output, tolerating code-fence wrappers.
/// The suggestion list must carry at least the configured count; extras are
/// truncated, the way the original pipeline clamped to its display slots.
pub fn parse_payload(raw: &str, expected_count: usize) -> Result<(Topic, Vec<String>), SparkError> {
    let cleaned = strip_code_blocks(raw);
    let payload: SuggestionPayload = serde_json::from_str(cleaned)
        .map_err(|e| SparkError::MalformedPayload(format!("invalid JSON payload: {e}")))?;

    let topic = Topic::from_str_loose(&payload.topic)
        .ok_or_else(|| SparkError::MalformedPayload(format!("unknown topic '{}'", payload.topic)))?;

    let mut suggestions: Vec<String> = payload
        .suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if suggestions.len() < expected_count {
        return Err(SparkError::MalformedPayload(format!(
            "expected {} suggestions, got {}",
            expected_count,
            suggestions.len()
        )));
    }
    suggestions.truncate(expected_count);

    Ok((topic, suggestions))
}
