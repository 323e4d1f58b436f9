//! In-memory media server and translators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use jellysub::error::{JellysubError, Result};
use jellysub::server::{MediaItem, MediaServer, SubtitleStreamDescriptor, SubtitleUpload};
use jellysub::translate::{ProgressFn, Translator};

pub const ASS_DOCUMENT: &str = "[Script Info]\n\
ScriptType: v4.00+\n\
\n\
[V4+ Styles]\n\
Format: Name, Fontname, Fontsize, PrimaryColour\n\
Style: Default,Arial,20,&H00FFFFFF\n\
\n\
[Events]\n\
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,{\\an8}Where are you\\Ngoing?\n\
Dialogue: 0,0:00:04.00,0:00:05.00,Default,,0,0,0,,Home.\n";

pub const SRT_DOCUMENT: &str = "1\n\
00:00:01,000 --> 00:00:02,500\n\
Good morning.\n\
\n\
2\n\
00:00:03,000 --> 00:00:04,000\n\
See you later.\n";

pub fn stream(index: u32, language: &str, codec: &str) -> SubtitleStreamDescriptor {
    SubtitleStreamDescriptor {
        index,
        language: Some(language.to_string()),
        codec: codec.to_string(),
    }
}

/// Library kept in memory, recording every upload
#[derive(Default)]
pub struct FakeMediaServer {
    children: HashMap<Option<String>, Vec<MediaItem>>,
    details: HashMap<String, MediaItem>,
    subtitles: HashMap<String, String>,
    failing_uploads: HashSet<String>,
    uploads: Mutex<Vec<(String, SubtitleUpload)>>,
}

impl FakeMediaServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(mut self, parent: Option<&str>, id: &str) -> Self {
        let item = MediaItem {
            id: id.to_string(),
            name: format!("Folder {}", id),
            is_folder: true,
            has_subtitles: false,
            streams: Vec::new(),
        };
        self.children.entry(parent.map(str::to_string)).or_default().push(item);
        self
    }

    /// Add a video whose first stream serves `document`
    pub fn video(
        mut self,
        parent: Option<&str>,
        id: &str,
        streams: Vec<SubtitleStreamDescriptor>,
        document: &str,
    ) -> Self {
        let item = MediaItem {
            id: id.to_string(),
            name: format!("Video {}", id),
            is_folder: false,
            has_subtitles: !streams.is_empty(),
            streams: Vec::new(),
        };
        self.children
            .entry(parent.map(str::to_string))
            .or_default()
            .push(item.clone());
        self.details.insert(id.to_string(), MediaItem { streams, ..item });
        self.subtitles.insert(id.to_string(), document.to_string());
        self
    }

    pub fn failing_upload(mut self, id: &str) -> Self {
        self.failing_uploads.insert(id.to_string());
        self
    }

    pub fn detail(&self, id: &str) -> MediaItem {
        self.details[id].clone()
    }

    pub fn uploads(&self) -> Vec<(String, SubtitleUpload)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaServer for FakeMediaServer {
    async fn list_children(&self, folder_id: Option<&str>) -> Result<Vec<MediaItem>> {
        Ok(self
            .children
            .get(&folder_id.map(str::to_string))
            .cloned()
            .unwrap_or_default())
    }

    async fn item_detail(&self, item_id: &str) -> Result<MediaItem> {
        self.details
            .get(item_id)
            .cloned()
            .ok_or_else(|| JellysubError::Server {
                status: 404,
                message: format!("no item {}", item_id),
            })
    }

    async fn fetch_subtitle(&self, item_id: &str, _stream: &SubtitleStreamDescriptor) -> Result<String> {
        self.subtitles
            .get(item_id)
            .cloned()
            .ok_or_else(|| JellysubError::Network(format!("no stream for {}", item_id)))
    }

    async fn upload_subtitle(&self, item_id: &str, upload: &SubtitleUpload) -> Result<()> {
        if self.failing_uploads.contains(item_id) {
            return Err(JellysubError::Server {
                status: 500,
                message: "upload rejected".to_string(),
            });
        }
        self.uploads
            .lock()
            .unwrap()
            .push((item_id.to_string(), upload.clone()));
        Ok(())
    }
}

/// Uppercases its input and counts requests
#[derive(Default)]
pub struct UppercaseTranslator {
    calls: AtomicUsize,
}

impl UppercaseTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for UppercaseTranslator {
    async fn translate(&self, text: &str, on_progress: &ProgressFn<'_>) -> Result<String> {
        on_progress(0, 1);
        self.calls.fetch_add(1, Ordering::SeqCst);
        on_progress(1, 1);
        Ok(text.to_uppercase())
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}

/// Backend that is always down
pub struct UnavailableTranslator;

#[async_trait]
impl Translator for UnavailableTranslator {
    async fn translate(&self, _text: &str, _on_progress: &ProgressFn<'_>) -> Result<String> {
        Err(JellysubError::Translation("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
