//! Library items as the rest of the crate sees them, plus the Jellyfin wire
//! types they are decoded from.

use serde::{Deserialize, Serialize};

use crate::subtitle::SubtitleCodec;

/// A folder or leaf entry of the media library.
///
/// `streams` is only populated by an item-detail fetch; folder listings leave
/// it empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub has_subtitles: bool,
    pub streams: Vec<SubtitleStreamDescriptor>,
}

/// A subtitle track attached to a media item.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStreamDescriptor {
    /// Position within the item, used to address the raw stream endpoint
    pub index: u32,
    pub language: Option<String>,
    /// Codec tag as reported by the server (e.g. "ass", "subrip")
    pub codec: String,
}

impl SubtitleStreamDescriptor {
    pub fn subtitle_codec(&self) -> Option<SubtitleCodec> {
        SubtitleCodec::from_tag(&self.codec)
    }

    pub fn language_tag(&self) -> &str {
        self.language.as_deref().unwrap_or("und")
    }
}

/// Body of the subtitle upload endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleUpload {
    /// Base64 of the UTF-8 document
    pub data: String,
    pub format: String,
    pub is_forced: bool,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub has_subtitles: bool,
    #[serde(default)]
    pub media_streams: Vec<MediaStreamDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaStreamDto {
    pub index: u32,
    #[serde(rename = "Type", default)]
    pub stream_type: String,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl From<ItemDto> for MediaItem {
    fn from(dto: ItemDto) -> Self {
        let streams = dto
            .media_streams
            .into_iter()
            .filter(|s| s.stream_type == "Subtitle")
            .map(|s| SubtitleStreamDescriptor {
                index: s.index,
                language: s.language,
                codec: s.codec.unwrap_or_default(),
            })
            .collect();

        MediaItem {
            id: dto.id,
            name: dto.name,
            is_folder: dto.is_folder,
            has_subtitles: dto.has_subtitles,
            streams,
        }
    }
}
