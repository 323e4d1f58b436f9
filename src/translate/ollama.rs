use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_client, build_translation_prompt, clean_translation_response, ProgressFn, Translator};
use crate::config::TranslateConfig;
use crate::error::{Result, JellysubError};

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TranslationResult {
    text: String,
}

/// Translator backed by a local Ollama server
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_prompt(&self, text: &str) -> String {
        let mut prompt = build_translation_prompt(text, &self.config.target_language);
        prompt.push_str(&format!(
            "\nReturn the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n",
            super::language_code_to_name(&self.config.target_language)
        ));
        prompt
    }
}

/// Extract the translation from a raw `/api/generate` answer.
fn parse_generated(raw_response: &str) -> Result<String> {
    let raw_response = raw_response.trim();
    if raw_response.is_empty() {
        return Err(JellysubError::Translation("Empty translation received".to_string()));
    }

    let text = match serde_json::from_str::<TranslationResult>(raw_response) {
        Ok(result) => result.text.trim().to_string(),
        Err(_) => clean_translation_response(raw_response),
    };

    if text.is_empty() {
        return Err(JellysubError::Translation("Empty translation received".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(&self, text: &str, on_progress: &ProgressFn<'_>) -> Result<String> {
        on_progress(0, 1);

        let request = GenerateRequest {
            model: self.config.model().to_string(),
            prompt: self.build_prompt(text),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint());
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| JellysubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(JellysubError::Translation(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| JellysubError::Translation(format!("Failed to parse response: {}", e)))?;
        debug!("Raw Ollama response: {}", generated.response);

        let translation = parse_generated(&generated.response)?;
        on_progress(1, 1);
        Ok(translation)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
