//! Bounded worker pool that runs one translation job per dispatched item.
//!
//! Items travel through a bounded channel shared by a fixed set of workers.
//! Every job runs in its own task, so a panic is contained at the job
//! boundary and the worker moves on to the next item. `DirectDispatch` runs
//! jobs inline on the caller instead, one at a time.

use async_trait::async_trait;
use dashmap::DashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::ErrorKind;
use crate::server::MediaItem;

/// Hands a discovered item over for processing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Hand `item` over for translation. The pool returns as soon as the item
    /// is queued; direct dispatch returns after the job has run.
    async fn dispatch(&self, item: MediaItem);
}

/// Work performed for every dispatched item.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, item: MediaItem);
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<MediaItem>>>;

/// Run one job in its own task so a panic stays inside it.
async fn run_isolated(handler: Arc<dyn JobHandler>, item: MediaItem) {
    let id = item.id.clone();
    let name = item.name.clone();

    if let Err(e) = tokio::spawn(async move { handler.handle(item).await }).await {
        error!(
            "Job for item {} ({}) aborted ({}): {}",
            id,
            name,
            ErrorKind::Unexpected,
            e
        );
    }
}

/// Runs every job to completion before `dispatch` returns
pub struct DirectDispatch {
    handler: Arc<dyn JobHandler>,
}

impl DirectDispatch {
    pub fn new(handler: Arc<dyn JobHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl Dispatch for DirectDispatch {
    async fn dispatch(&self, item: MediaItem) {
        run_isolated(self.handler.clone(), item).await;
    }
}

pub struct WorkerPool {
    sender: mpsc::Sender<MediaItem>,
    workers: Vec<JoinHandle<()>>,
    in_flight: Arc<DashSet<String>>,
}

impl WorkerPool {
    /// Start `workers` workers fed by a queue holding up to `capacity` items.
    pub fn new(handler: Arc<dyn JobHandler>, workers: usize, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let in_flight = Arc::new(DashSet::new());

        let workers = (0..workers.max(1))
            .map(|worker_id| {
                spawn_worker(worker_id, receiver.clone(), handler.clone(), in_flight.clone())
            })
            .collect();

        Self {
            sender,
            workers,
            in_flight,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Items queued or running
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Queue an item unless it is already queued or running.
    ///
    /// Waits only while the queue is full. Returns whether the item was queued.
    pub async fn submit(&self, item: MediaItem) -> bool {
        if !self.in_flight.insert(item.id.clone()) {
            debug!("Item {} ({}) is already in flight, skipping", item.id, item.name);
            return false;
        }

        let id = item.id.clone();
        if self.sender.send(item).await.is_err() {
            warn!("Worker pool is closed, dropping item {}", id);
            self.in_flight.remove(&id);
            return false;
        }

        true
    }

    /// Stop accepting items and wait for every queued job to finish.
    pub async fn shutdown(self) {
        let WorkerPool {
            sender, workers, ..
        } = self;
        drop(sender);

        info!("Waiting for {} worker(s) to drain", workers.len());
        for worker in workers {
            if let Err(e) = worker.await {
                error!("Worker terminated abnormally: {}", e);
            }
        }
    }
}

#[async_trait]
impl Dispatch for WorkerPool {
    async fn dispatch(&self, item: MediaItem) {
        self.submit(item).await;
    }
}

fn spawn_worker(
    worker_id: usize,
    receiver: SharedReceiver,
    handler: Arc<dyn JobHandler>,
    in_flight: Arc<DashSet<String>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Worker {} started", worker_id);

        loop {
            let item = {
                let mut rx = receiver.lock().await;
                rx.recv().await
            };

            let Some(item) = item else {
                debug!("Worker {} finished", worker_id);
                break;
            };

            let id = item.id.clone();
            run_isolated(handler.clone(), item).await;
            in_flight.remove(&id);
        }
    })
}
