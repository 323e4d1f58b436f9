use std::sync::Arc;
use tracing::{debug, warn};

use crate::pool::Dispatch;
use crate::server::{MediaItem, MediaServer};

/// Counters of a single library walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub folders_visited: usize,
    pub items_dispatched: usize,
    /// Listings or item-detail fetches that failed and were skipped
    pub failures: usize,
}

/// Depth-first traversal of the library that dispatches every leaf item
/// carrying subtitles.
pub struct LibraryWalker {
    server: Arc<dyn MediaServer>,
}

impl LibraryWalker {
    pub fn new(server: Arc<dyn MediaServer>) -> Self {
        Self { server }
    }

    /// Walk everything below `folder_id` (the library root when `None`).
    ///
    /// Children are visited in the order the server lists them and a folder's
    /// subtree is finished before its next sibling. A failed listing or detail
    /// fetch skips that subtree or item for this walk only.
    pub async fn walk(&self, folder_id: Option<&str>, dispatch: &dyn Dispatch) -> WalkStats {
        let mut stats = WalkStats::default();

        let mut pending: Vec<MediaItem> = self.list(folder_id, &mut stats).await;
        pending.reverse();

        while let Some(child) = pending.pop() {
            if child.is_folder {
                let mut children = self.list(Some(&child.id), &mut stats).await;
                children.reverse();
                pending.extend(children);
                continue;
            }

            if !child.has_subtitles {
                continue;
            }

            match self.server.item_detail(&child.id).await {
                Ok(detail) => {
                    debug!("Dispatching {} ({})", detail.name, detail.id);
                    dispatch.dispatch(detail).await;
                    stats.items_dispatched += 1;
                }
                Err(e) => {
                    warn!("Skipping item {} ({}): {}", child.name, child.id, e);
                    stats.failures += 1;
                }
            }
        }

        stats
    }

    async fn list(&self, folder_id: Option<&str>, stats: &mut WalkStats) -> Vec<MediaItem> {
        match self.server.list_children(folder_id).await {
            Ok(children) => {
                stats.folders_visited += 1;
                children
            }
            Err(e) => {
                warn!(
                    "Skipping folder {} for this scan: {}",
                    folder_id.unwrap_or("<root>"),
                    e
                );
                stats.failures += 1;
                Vec::new()
            }
        }
    }
}
