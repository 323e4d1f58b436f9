// Modular translation architecture
//
// This module provides different translation backends through a factory pattern:
// - Ollama: local LLM server
// - Gemini: Google's hosted generateContent API
//
// Subtitle documents are fed to a backend through batch::translate_units, which
// keeps translated segments correlated with their source units.

pub mod batch;
pub mod common;
pub mod gemini;
pub mod ollama;

use async_trait::async_trait;
use std::sync::Arc;

pub use batch::translate_units;
pub use common::*;
use crate::config::{TranslateConfig, TranslationBackend};
use crate::error::Result;

/// Progress callback receiving `(current, total)`; may borrow from the caller
pub type ProgressFn<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

/// Text-in, text-out translation service
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the configured target language.
    ///
    /// `on_progress` is called with `(0, total)` before the request and with
    /// `(total, total)` once the translation is available.
    async fn translate(&self, text: &str, on_progress: &ProgressFn<'_>) -> Result<String>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a translator for the configured backend
    pub fn create_translator(config: &TranslateConfig) -> Result<Arc<dyn Translator>> {
        let translator: Arc<dyn Translator> = match config.backend {
            TranslationBackend::Ollama => Arc::new(ollama::OllamaTranslator::new(config.clone())?),
            TranslationBackend::Gemini => Arc::new(gemini::GeminiTranslator::new(config.clone())?),
        };
        Ok(translator)
    }
}

/// Progress callback that ignores every update
pub fn no_progress(_current: usize, _total: usize) {}
