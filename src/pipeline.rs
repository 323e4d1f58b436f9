use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{JobFailure, JobStage};
use crate::output::OutputStore;
use crate::pool::JobHandler;
use crate::selector::select_stream;
use crate::server::{MediaItem, MediaServer, SubtitleStreamDescriptor, SubtitleUpload};
use crate::subtitle::{AssAdapter, SrtAdapter, SubtitleAdapter, SubtitleCodec};
use crate::translate::{translate_units, ProgressFn, Translator};

/// An item paired with the stream chosen for translation
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub item: MediaItem,
    pub stream: SubtitleStreamDescriptor,
    pub codec: SubtitleCodec,
}

/// Outcome of a successful job
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    pub item_id: String,
    pub item_name: String,
    pub codec: SubtitleCodec,
    pub content: String,
    pub uploaded: bool,
    pub saved_to: Option<PathBuf>,
}

pub type TranslationResult = std::result::Result<TranslatedDocument, JobFailure>;

/// Translate a whole subtitle document, keeping everything but its text.
pub async fn translate_document(
    codec: SubtitleCodec,
    raw: &str,
    translator: &dyn Translator,
    batch_size: usize,
    font_name: Option<&str>,
    on_progress: &ProgressFn<'_>,
) -> std::result::Result<String, JobFailure> {
    match codec {
        SubtitleCodec::Ass => {
            let adapter = AssAdapter::new(font_name.map(str::to_string));
            run_adapter(&adapter, raw, translator, batch_size, on_progress).await
        }
        SubtitleCodec::Srt => run_adapter(&SrtAdapter, raw, translator, batch_size, on_progress).await,
    }
}

async fn run_adapter<A: SubtitleAdapter + Sync>(
    adapter: &A,
    raw: &str,
    translator: &dyn Translator,
    batch_size: usize,
    on_progress: &ProgressFn<'_>,
) -> std::result::Result<String, JobFailure> {
    let (units, context) = adapter
        .extract(raw)
        .map_err(|e| JobFailure::new(JobStage::Extract, e))?;
    debug!("Extracted {} translation units", units.len());

    let translated = translate_units(translator, &units, batch_size, on_progress)
        .await
        .map_err(|e| JobFailure::new(JobStage::Translate, e))?;

    adapter
        .reinject(translated, context)
        .map_err(|e| JobFailure::new(JobStage::Reinject, e))
}

/// Per-item job runner: select, fetch, translate, persist
pub struct SubtitlePipeline {
    server: Arc<dyn MediaServer>,
    translator: Arc<dyn Translator>,
    store: Option<OutputStore>,
    target_language: String,
    batch_size: usize,
    font_name: Option<String>,
    upload: bool,
}

impl SubtitlePipeline {
    pub fn new(server: Arc<dyn MediaServer>, translator: Arc<dyn Translator>, target_language: &str) -> Self {
        Self {
            server,
            translator,
            store: None,
            target_language: target_language.to_string(),
            batch_size: 1,
            font_name: None,
            upload: true,
        }
    }

    pub fn from_config(
        config: &Config,
        server: Arc<dyn MediaServer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            server,
            translator,
            store: config.scan.output_dir.as_ref().map(OutputStore::new),
            target_language: config.scan.target_language.clone(),
            batch_size: config.translate.batch_size,
            font_name: config.subtitle.font_name.clone(),
            upload: config.scan.upload,
        }
    }

    pub fn with_store(mut self, store: Option<OutputStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_upload(mut self, upload: bool) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Build the job for `item`, or `None` when it needs no translation.
    pub fn select(&self, item: MediaItem) -> Option<TranslationJob> {
        let stream = select_stream(&item, &self.target_language)?.clone();
        let codec = stream.subtitle_codec()?;
        Some(TranslationJob { item, stream, codec })
    }

    pub async fn run_job(&self, job: &TranslationJob) -> TranslationResult {
        let item = &job.item;

        let raw = self
            .server
            .fetch_subtitle(&item.id, &job.stream)
            .await
            .map_err(|e| JobFailure::new(JobStage::FetchSubtitle, e))?;

        let progress = |done: usize, total: usize| {
            debug!("Translating {} ({}): {}/{}", item.name, item.id, done, total);
        };
        let content = translate_document(
            job.codec,
            &raw,
            self.translator.as_ref(),
            self.batch_size,
            self.font_name.as_deref(),
            &progress,
        )
        .await?;

        let saved_to = match &self.store {
            Some(store) => Some(
                store
                    .save(item, &self.target_language, job.codec, &content)
                    .await
                    .map_err(|e| JobFailure::new(JobStage::Save, e))?,
            ),
            None => None,
        };

        if self.upload {
            let upload = SubtitleUpload {
                data: STANDARD.encode(content.as_bytes()),
                format: job.codec.extension().to_string(),
                is_forced: false,
                language: self.target_language.clone(),
            };
            self.server
                .upload_subtitle(&item.id, &upload)
                .await
                .map_err(|e| JobFailure::new(JobStage::Upload, e))?;
        }

        Ok(TranslatedDocument {
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            codec: job.codec,
            content,
            uploaded: self.upload,
            saved_to,
        })
    }

    /// Run the whole job for one item and log its outcome.
    ///
    /// Returns `None` when the item was not a candidate.
    pub async fn process_item(&self, item: MediaItem) -> Option<TranslationResult> {
        let job = self.select(item)?;

        info!(
            "Translating {} ({}) from stream {} [{}, {}] with {}",
            job.item.name,
            job.item.id,
            job.stream.index,
            job.codec,
            job.stream.language_tag(),
            self.translator.name()
        );

        let result = self.run_job(&job).await;
        match &result {
            Ok(document) => info!(
                "Translated {} ({}): uploaded={}, saved={}",
                document.item_name,
                document.item_id,
                document.uploaded,
                document
                    .saved_to
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
            Err(failure) => error!(
                "Failed to translate {} ({}): {}",
                job.item.name, job.item.id, failure
            ),
        }

        Some(result)
    }
}

#[async_trait]
impl JobHandler for SubtitlePipeline {
    async fn handle(&self, item: MediaItem) {
        let id = item.id.clone();
        if self.process_item(item).await.is_none() {
            debug!("Item {} needs no translation", id);
        }
    }
}
