// Subtitle format adapters
//
// Each adapter splits a raw document into ordered translation units plus
// whatever it needs to rebuild the document, and later writes translated text
// back into the same slots:
// - ass: styled-event format, inline override tags are kept out of the text
// - srt: numbered cue format

pub mod ass;
pub mod srt;

use std::fmt;
use std::path::Path;

pub use ass::AssAdapter;
pub use srt::SrtAdapter;

use crate::error::{Result, JellysubError};

/// Subtitle codecs the translator can handle, in selection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleCodec {
    /// Advanced SubStation Alpha (tag-based)
    Ass,
    /// SubRip (plain-timed)
    Srt,
}

impl SubtitleCodec {
    /// Codecs ordered by preference when an item has several candidate streams.
    pub const PRIORITY: [SubtitleCodec; 2] = [SubtitleCodec::Ass, SubtitleCodec::Srt];

    /// Map a codec tag reported by the media server.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "ass" | "ssa" => Some(Self::Ass),
            "srt" | "subrip" => Some(Self::Srt),
            _ => None,
        }
    }

    /// Infer the codec of a local file from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_tag)
            .ok_or_else(|| JellysubError::UnsupportedFormat(path.display().to_string()))
    }

    /// File extension, also used as the stream endpoint suffix and upload format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ass => "ass",
            Self::Srt => "srt",
        }
    }
}

impl fmt::Display for SubtitleCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One piece of translatable text, correlated with its source slot by index
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub index: usize,
    pub text: String,
}

/// Extraction and reinjection for one subtitle format
pub trait SubtitleAdapter {
    /// Everything besides unit text needed to rebuild the document
    type Context: Send;

    /// Split a raw document into ordered translation units.
    fn extract(&self, raw: &str) -> Result<(Vec<TranslationUnit>, Self::Context)>;

    /// Write translated texts back, one per unit in extraction order.
    fn reinject(&self, translated: Vec<String>, context: Self::Context) -> Result<String>;
}

/// Reject translated text whose segment count no longer matches the units.
pub(crate) fn ensure_unit_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(JellysubError::Translation(format!(
            "Expected {} translated segments, got {}",
            expected, actual
        )));
    }
    Ok(())
}

/// Strip a leading UTF-8 byte order mark.
pub(crate) fn strip_bom(raw: &str) -> &str {
    raw.strip_prefix('\u{feff}').unwrap_or(raw)
}
