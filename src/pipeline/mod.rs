//! The media processing pipeline: one bounded queue and one worker per class.
//!
//! ```text
//!  producers ──submit/enqueue──▶ [photo queue] ──▶ photo worker  ─┐
//!                              ▶ [avatar queue] ─▶ avatar worker ─┴─▶ Commit
//! ```
//!
//! A [`Pipeline`] is constructed once with [`Pipeline::start`], which spawns
//! both workers on the current tokio runtime. [`Pipeline::shutdown`] stops
//! admission, lets every queued item finish, and returns the final counters.
//!
//! ## Admission
//!
//! - [`Submitter::enqueue`] waits for queue capacity. This is the
//!   backpressure path: a full queue makes the caller wait, it never drops.
//! - [`Submitter::submit`] returns immediately. When the queue has room the
//!   item is admitted in place. When it is full the item joins the class's
//!   overflow line, which a single forwarder task feeds into the queue as
//!   capacity frees up, so the item is still never dropped.
//!
//! Items of one class are processed in admission order. While a class has
//! parked items, every later `submit` for that class joins the same line
//! instead of trying the queue, so a single producer sees its items finish in
//! the order it handed them over whether it uses `submit` or `enqueue`.
//! Mixing the two from one producer gives no ordering between them.

mod process;
mod worker;

pub use process::{GeneratedDerivative, ProcessError, ProcessEvent, process_item};
pub use worker::ClassStats;

use crate::commit::{Commit, DirectCommit, StagedCommit};
use crate::config::{ConfigError, PipelineConfig};
use crate::imaging::{ImageBackend, Quality};
use crate::paths::PathResolver;
use crate::store::MetadataStore;
use crate::types::{MediaClass, MediaItem};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use worker::{PoolStats, Worker, WorkerContext};

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The pipeline is shutting down; the rejected item is handed back.
    #[error("pipeline is closed, {} {} was not admitted", .0.class, .0.id)]
    Closed(MediaItem),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no tokio runtime is running")]
    NoRuntime,
}

/// Counters for both classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub photo: ClassStats,
    pub avatar: ClassStats,
}

impl PipelineStats {
    pub fn for_class(&self, class: MediaClass) -> &ClassStats {
        match class {
            MediaClass::Photo => &self.photo,
            MediaClass::Avatar => &self.avatar,
        }
    }

    pub fn processed(&self) -> u64 {
        self.photo.processed + self.avatar.processed
    }

    pub fn failed(&self) -> u64 {
        self.photo.failed + self.avatar.failed
    }
}

/// Admission side of one class.
struct Lane {
    tx: mpsc::Sender<MediaItem>,
    /// Items that found the queue full, in submission order.
    overflow: mpsc::UnboundedSender<MediaItem>,
    /// Items sent to `overflow` and not yet in the queue.
    parked: Arc<AtomicUsize>,
    stats: Arc<PoolStats>,
}

impl Lane {
    fn park(&self, item: MediaItem) -> Result<(), PipelineError> {
        self.parked.fetch_add(1, Ordering::AcqRel);
        self.overflow.send(item).map_err(|rejected| {
            self.parked.fetch_sub(1, Ordering::AcqRel);
            self.stats.queued.fetch_sub(1, Ordering::Relaxed);
            PipelineError::Closed(rejected.0)
        })
    }
}

struct Shared {
    photo: Lane,
    avatar: Lane,
    closing: AtomicBool,
    drained: Arc<Notify>,
}

impl Shared {
    fn lane(&self, class: MediaClass) -> &Lane {
        match class {
            MediaClass::Photo => &self.photo,
            MediaClass::Avatar => &self.avatar,
        }
    }

    fn parked(&self) -> usize {
        self.photo.parked.load(Ordering::Acquire) + self.avatar.parked.load(Ordering::Acquire)
    }

    fn stats(&self) -> PipelineStats {
        PipelineStats {
            photo: self.photo.stats.snapshot(MediaClass::Photo),
            avatar: self.avatar.stats.snapshot(MediaClass::Avatar),
        }
    }
}

/// Feeds one class's overflow line into its queue, one item at a time.
async fn forward_overflow(
    class: MediaClass,
    mut overflow: mpsc::UnboundedReceiver<MediaItem>,
    tx: mpsc::Sender<MediaItem>,
    parked: Arc<AtomicUsize>,
    stats: Arc<PoolStats>,
    drained: Arc<Notify>,
) {
    while let Some(item) = overflow.recv().await {
        if let Err(rejected) = tx.send(item).await {
            stats.queued.fetch_sub(1, Ordering::Relaxed);
            warn!(%class, id = %rejected.0.id, "queue closed before parked item was admitted");
        }
        // Decrement only once the item is in the queue, so a later submit
        // that sees zero cannot overtake it.
        if parked.fetch_sub(1, Ordering::AcqRel) == 1 {
            drained.notify_waiters();
        }
    }
}

/// Cloneable admission handle, for request handlers that outlive a borrow
/// of the [`Pipeline`].
#[derive(Clone)]
pub struct Submitter {
    shared: Arc<Shared>,
}

impl Submitter {
    /// Hand `item` to its class queue without waiting.
    ///
    /// Never blocks and never drops: a full queue parks the item in the
    /// class's overflow line until the worker makes room. Fails only once
    /// shutdown has begun.
    pub fn submit(&self, item: MediaItem) -> Result<(), PipelineError> {
        if self.shared.closing.load(Ordering::Acquire) {
            return Err(PipelineError::Closed(item));
        }
        let lane = self.shared.lane(item.class);
        lane.stats.queued.fetch_add(1, Ordering::Relaxed);

        if lane.parked.load(Ordering::Acquire) > 0 {
            return lane.park(item);
        }

        match lane.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(item)) => lane.park(item),
            Err(TrySendError::Closed(item)) => {
                lane.stats.queued.fetch_sub(1, Ordering::Relaxed);
                Err(PipelineError::Closed(item))
            }
        }
    }

    /// Hand `item` to its class queue, waiting while the queue is full.
    pub async fn enqueue(&self, item: MediaItem) -> Result<(), PipelineError> {
        if self.shared.closing.load(Ordering::Acquire) {
            return Err(PipelineError::Closed(item));
        }
        let lane = self.shared.lane(item.class);
        lane.stats.queued.fetch_add(1, Ordering::Relaxed);

        lane.tx.send(item).await.map_err(|rejected| {
            lane.stats.queued.fetch_sub(1, Ordering::Relaxed);
            PipelineError::Closed(rejected.0)
        })
    }
}

/// Owns the class queues and their workers.
pub struct Pipeline {
    submitter: Submitter,
    shutdown: watch::Sender<bool>,
    workers: Vec<(MediaClass, JoinHandle<()>)>,
}

impl Pipeline {
    /// Validate `config` and spawn one worker per class.
    ///
    /// Fails with [`PipelineError::NoRuntime`] outside a tokio runtime.
    pub fn start(
        config: &PipelineConfig,
        backend: Arc<dyn ImageBackend>,
        store: Arc<dyn MetadataStore>,
    ) -> Result<Self, PipelineError> {
        Self::spawn(config, backend, store, None)
    }

    /// Like [`start`](Self::start), reporting progress on `events`.
    pub fn start_with_events(
        config: &PipelineConfig,
        backend: Arc<dyn ImageBackend>,
        store: Arc<dyn MetadataStore>,
        events: std::sync::mpsc::Sender<ProcessEvent>,
    ) -> Result<Self, PipelineError> {
        Self::spawn(config, backend, store, Some(events))
    }

    fn spawn(
        config: &PipelineConfig,
        backend: Arc<dyn ImageBackend>,
        store: Arc<dyn MetadataStore>,
        events: Option<std::sync::mpsc::Sender<ProcessEvent>>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let quality = Quality::new(config.output.quality);
        let commit: Arc<dyn Commit> = if config.output.staged_writes {
            Arc::new(StagedCommit::new(Arc::clone(&backend), store, quality))
        } else {
            Arc::new(DirectCommit::new(Arc::clone(&backend), store, quality))
        };
        let ctx = Arc::new(WorkerContext {
            backend,
            commit,
            resolver: PathResolver::new(config.storage_root.clone()),
            tables: Arc::new(config.sizes.clone()),
            events,
        });

        let runtime = Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let drained = Arc::new(Notify::new());
        let capacity = config.queue.capacity;
        let mut workers = Vec::with_capacity(MediaClass::ALL.len());
        let mut open_lane = |class: MediaClass| {
            let (tx, rx) = mpsc::channel(capacity);
            let (overflow, overflow_rx) = mpsc::unbounded_channel();
            let parked = Arc::new(AtomicUsize::new(0));
            let stats = Arc::new(PoolStats::default());
            let worker = Worker {
                class,
                rx,
                shutdown: shutdown_rx.clone(),
                ctx: Arc::clone(&ctx),
                stats: Arc::clone(&stats),
            };
            workers.push((class, runtime.spawn(worker.run())));
            runtime.spawn(forward_overflow(
                class,
                overflow_rx,
                tx.clone(),
                Arc::clone(&parked),
                Arc::clone(&stats),
                Arc::clone(&drained),
            ));
            Lane {
                tx,
                overflow,
                parked,
                stats,
            }
        };
        let photo = open_lane(MediaClass::Photo);
        let avatar = open_lane(MediaClass::Avatar);

        info!(capacity, root = %config.storage_root.display(), "pipeline started");
        Ok(Self {
            submitter: Submitter {
                shared: Arc::new(Shared {
                    photo,
                    avatar,
                    closing: AtomicBool::new(false),
                    drained,
                }),
            },
            shutdown,
            workers,
        })
    }

    pub fn submitter(&self) -> Submitter {
        self.submitter.clone()
    }

    /// See [`Submitter::submit`].
    pub fn submit(&self, item: MediaItem) -> Result<(), PipelineError> {
        self.submitter.submit(item)
    }

    /// See [`Submitter::enqueue`].
    pub async fn enqueue(&self, item: MediaItem) -> Result<(), PipelineError> {
        self.submitter.enqueue(item).await
    }

    pub fn stats(&self) -> PipelineStats {
        self.submitter.shared.stats()
    }

    /// Stop admission and wait for every admitted item to reach a terminal
    /// status.
    ///
    /// Parked `submit` calls are admitted before the queues close. Any
    /// admission attempted after this point fails with
    /// [`PipelineError::Closed`].
    pub async fn shutdown(self) -> PipelineStats {
        let shared = Arc::clone(&self.submitter.shared);
        shared.closing.store(true, Ordering::Release);

        loop {
            let drained = shared.drained.notified();
            if shared.parked() == 0 {
                break;
            }
            drained.await;
        }

        let _ = self.shutdown.send(true);
        for (class, handle) in self.workers {
            if let Err(err) = handle.await {
                error!(%class, error = %err, "worker task failed");
            }
        }

        let stats = shared.stats();
        info!(
            processed = stats.processed(),
            failed = stats.failed(),
            "pipeline stopped"
        );
        stats
    }
}
