// Media server access
//
// The rest of the crate only talks to the library through the MediaServer
// trait; jellyfin.rs is the production implementation.

pub mod jellyfin;
pub mod types;

use async_trait::async_trait;

pub use jellyfin::JellyfinClient;
pub use types::*;

use crate::error::Result;

/// Directory and upload operations the translator needs from a media server
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// List the children of a folder, or of the library root when `folder_id` is `None`
    async fn list_children(&self, folder_id: Option<&str>) -> Result<Vec<MediaItem>>;

    /// Fetch an item together with its subtitle streams
    async fn item_detail(&self, item_id: &str) -> Result<MediaItem>;

    /// Download the raw subtitle document of one stream
    async fn fetch_subtitle(&self, item_id: &str, stream: &SubtitleStreamDescriptor) -> Result<String>;

    /// Attach a new subtitle track to an item
    async fn upload_subtitle(&self, item_id: &str, upload: &SubtitleUpload) -> Result<()>;
}
