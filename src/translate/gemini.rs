use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_client, build_translation_prompt, clean_translation_response, ProgressFn, Translator};
use crate::config::TranslateConfig;
use crate::error::{Result, JellysubError};

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Translator backed by the Gemini generateContent API
pub struct GeminiTranslator {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl GeminiTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                JellysubError::Config("GEMINI_API_KEY is required for the gemini backend".to_string())
            })?;
        let client = build_client(&config)?;
        Ok(Self { client, config, api_key })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model()
        )
    }
}

/// Concatenate the text parts of the first candidate.
fn first_candidate_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| JellysubError::Translation("Gemini returned no candidates".to_string()))?;

    let text: String = candidate.content.parts.into_iter().map(|p| p.text).collect();
    let text = clean_translation_response(&text);
    if text.is_empty() {
        return Err(JellysubError::Translation("Empty translation received".to_string()));
    }

    Ok(text)
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str, on_progress: &ProgressFn<'_>) -> Result<String> {
        on_progress(0, 1);

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_translation_prompt(text, &self.config.target_language),
                }],
            }],
        };

        let url = self.url();
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| JellysubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(JellysubError::Translation(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| JellysubError::Translation(format!("Failed to parse response: {}", e)))?;

        let translation = first_candidate_text(generated)?;
        on_progress(1, 1);
        Ok(translation)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
