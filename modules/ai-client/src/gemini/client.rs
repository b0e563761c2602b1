use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::traits::Generator;

use super::types::*;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Wire client for the Gemini `generateContent` endpoint. Stateless between
/// calls: model and credential are supplied per call by the orchestration
/// layer that owns the fallback order.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    async fn generate_content(
        &self,
        model: &str,
        credential: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        debug!(model, "Gemini generateContent request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", credential)])
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        Ok(response.json().await?)
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        credential: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let request = GenerateRequest::new(user_prompt)
            .system(system_prompt)
            .json_output()
            .temperature(0.7);

        let response = self.generate_content(model, credential, &request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("Empty Gemini response for model {model}"))
    }
}
