use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::pool::Dispatch;
use crate::walker::{LibraryWalker, WalkStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Walking the library and dispatching items
    Scanning,
    /// Sleeping until the next scan
    Idle,
}

/// Alternates between library scans and fixed idle intervals until shut down
pub struct PollLoop {
    walker: LibraryWalker,
    interval: Duration,
}

impl PollLoop {
    pub fn new(walker: LibraryWalker, interval: Duration) -> Self {
        Self { walker, interval }
    }

    /// One full walk of the library.
    pub async fn run_cycle(&self, dispatch: &dyn Dispatch) -> WalkStats {
        info!("Scanning library");
        let stats = self.walker.walk(None, dispatch).await;
        info!(
            "Scan finished: {} folders visited, {} items dispatched, {} failures",
            stats.folders_visited, stats.items_dispatched, stats.failures
        );
        stats
    }

    /// Scan, sleep, repeat until `shutdown` turns true or its sender is dropped.
    ///
    /// A walk in progress always completes; the shutdown signal is only
    /// observed between cycles and while idle. Returns the number of cycles run.
    pub async fn run(&self, dispatch: &dyn Dispatch, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut state = PollState::Scanning;
        let mut cycles = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match state {
                PollState::Scanning => {
                    self.run_cycle(dispatch).await;
                    cycles += 1;
                    state = PollState::Idle;
                }
                PollState::Idle => {
                    info!("Next scan in {}s", self.interval.as_secs());
                    tokio::select! {
                        _ = tokio::time::sleep(self.interval) => {
                            state = PollState::Scanning;
                        }
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                debug!("Shutdown sender dropped");
                                break;
                            }
                        }
                    }
                }
            }
        }

        info!("Poll loop stopped after {} scan(s)", cycles);
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::pool::MockDispatch;
    use crate::server::{MediaItem, MediaServer, SubtitleStreamDescriptor, SubtitleUpload};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Library holding a single item, counting root listings
    #[derive(Default)]
    struct OneItem {
        listings: AtomicUsize,
    }

    #[async_trait]
    impl MediaServer for OneItem {
        async fn list_children(&self, _folder_id: Option<&str>) -> Result<Vec<MediaItem>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(vec![MediaItem {
                id: "ep1".to_string(),
                name: "Episode 1".to_string(),
                is_folder: false,
                has_subtitles: true,
                streams: Vec::new(),
            }])
        }

        async fn item_detail(&self, item_id: &str) -> Result<MediaItem> {
            Ok(MediaItem {
                id: item_id.to_string(),
                name: "Episode 1".to_string(),
                is_folder: false,
                has_subtitles: true,
                streams: Vec::new(),
            })
        }

        async fn fetch_subtitle(&self, _item_id: &str, _stream: &SubtitleStreamDescriptor) -> Result<String> {
            unreachable!()
        }

        async fn upload_subtitle(&self, _item_id: &str, _upload: &SubtitleUpload) -> Result<()> {
            unreachable!()
        }
    }

    fn poll_loop(server: Arc<OneItem>, interval: Duration) -> PollLoop {
        PollLoop::new(LibraryWalker::new(server), interval)
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let server = Arc::new(OneItem::default());
        let (_tx, rx) = watch::channel(true);

        let cycles = poll_loop(server.clone(), Duration::from_secs(3600))
            .run(&MockDispatch::new(), rx)
            .await;

        assert_eq!(cycles, 0);
        assert_eq!(server.listings.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_while_idle_stops_after_first_scan() {
        let server = Arc::new(OneItem::default());
        let (tx, rx) = watch::channel(false);

        let mut dispatch = MockDispatch::new();
        dispatch.expect_dispatch().times(1).return_const(());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(true);
        });

        let cycles = poll_loop(server.clone(), Duration::from_secs(3600))
            .run(&dispatch, rx)
            .await;

        assert_eq!(cycles, 1);
        assert_eq!(server.listings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interval_expiry_starts_next_scan() {
        let server = Arc::new(OneItem::default());
        let (tx, rx) = watch::channel(false);

        let mut dispatch = MockDispatch::new();
        dispatch.expect_dispatch().times(2..).return_const(());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let _ = tx.send(true);
        });

        let cycles = poll_loop(server.clone(), Duration::from_millis(20))
            .run(&dispatch, rx)
            .await;

        assert!(cycles >= 2);
        assert_eq!(server.listings.load(Ordering::SeqCst), cycles);
    }
}
