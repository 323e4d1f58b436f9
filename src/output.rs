use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::server::MediaItem;
use crate::subtitle::SubtitleCodec;

/// Replace characters that are not allowed in file names on common platforms
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes translated documents into a local directory, one file per item
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
    /// Item id that last wrote each path
    owners: Arc<DashMap<PathBuf, String>>,
}

impl OutputStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            owners: Arc::new(DashMap::new()),
        }
    }

    /// Record `item_id` as the writer of `path`, returning the previous
    /// writer when it was a different item.
    fn claim(&self, path: &Path, item_id: &str) -> Option<String> {
        self.owners
            .insert(path.to_path_buf(), item_id.to_string())
            .filter(|previous| previous != item_id)
    }

    /// Path a translated document for `item` is written to
    pub fn path_for(&self, item: &MediaItem, language: &str, codec: SubtitleCodec) -> PathBuf {
        let file_name = format!(
            "{}.{}.{}",
            sanitize_file_name(&item.name),
            sanitize_file_name(language),
            codec.extension()
        );
        self.dir.join(file_name)
    }

    /// Write `content`, replacing any previous translation of the same item.
    pub async fn save(
        &self,
        item: &MediaItem,
        language: &str,
        codec: SubtitleCodec,
        content: &str,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(item, language, codec);
        if let Some(previous) = self.claim(&path, &item.id) {
            warn!(
                "Overwriting {} written for item {} with item {} ({}), names collide",
                path.display(),
                previous,
                item.id,
                item.name
            );
        }
        tokio::fs::write(&path, content).await?;

        info!("Saved translated subtitle: {}", path.display());
        Ok(path)
    }
}
