//! The per-class background worker.

use super::process::{ProcessError, ProcessEvent, process_item};
use crate::commit::Commit;
use crate::imaging::ImageBackend;
use crate::paths::PathResolver;
use crate::sizes::SizeTables;
use crate::types::{MediaClass, MediaItem, ProcessingStatus};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

/// Everything a worker needs besides its queue. Shared by both workers.
pub(crate) struct WorkerContext {
    pub backend: Arc<dyn ImageBackend>,
    pub commit: Arc<dyn Commit>,
    pub resolver: PathResolver,
    pub tables: Arc<SizeTables>,
    pub events: Option<Sender<ProcessEvent>>,
}

impl WorkerContext {
    fn emit(&self, event: ProcessEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Counters for one class.
#[derive(Default)]
pub(crate) struct PoolStats {
    pub queued: AtomicUsize,
    pub processed: AtomicU64,
    pub failed: AtomicU64,
    pub status_errors: AtomicU64,
}

impl PoolStats {
    pub fn snapshot(&self, class: MediaClass) -> ClassStats {
        ClassStats {
            class,
            queued: self.queued.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            status_errors: self.status_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time counters for one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassStats {
    pub class: MediaClass,
    /// Admitted but not yet picked up by the worker.
    pub queued: usize,
    /// Items that reached `ready`.
    pub processed: u64,
    /// Items that reached `failed`.
    pub failed: u64,
    /// Terminal statuses the metadata store refused.
    pub status_errors: u64,
}

/// Single consumer of one class's queue.
pub(crate) struct Worker {
    pub class: MediaClass,
    pub rx: mpsc::Receiver<MediaItem>,
    pub shutdown: watch::Receiver<bool>,
    pub ctx: Arc<WorkerContext>,
    pub stats: Arc<PoolStats>,
}

impl Worker {
    /// Drain the queue until it is closed and empty.
    ///
    /// A shutdown signal (or the signal sender going away) closes the queue;
    /// items already buffered are still processed.
    pub async fn run(mut self) {
        info!(class = %self.class, "worker started");
        let mut closed = false;

        loop {
            tokio::select! {
                biased;
                next = self.rx.recv() => match next {
                    Some(item) => {
                        self.stats.queued.fetch_sub(1, Ordering::Relaxed);
                        self.handle(item).await;
                    }
                    None => break,
                },
                _ = self.shutdown.changed(), if !closed => {
                    self.rx.close();
                    closed = true;
                }
            }
        }

        info!(class = %self.class, "worker stopped");
    }

    async fn handle(&self, item: MediaItem) {
        let class = item.class;
        let id = item.id;
        self.ctx.emit(ProcessEvent::Started { class, id });

        let ctx = Arc::clone(&self.ctx);
        let job = item.clone();
        let result = tokio::task::spawn_blocking(move || {
            let table = ctx.tables.for_class(job.class);
            process_item(
                &*ctx.backend,
                &*ctx.commit,
                &ctx.resolver,
                table,
                &job,
                ctx.events.as_ref(),
            )
        })
        .await
        .unwrap_or_else(|join_err| Err(ProcessError::Worker(join_err.to_string())));

        let (status, message) = match &result {
            Ok(generated) => {
                info!(%class, %id, derivatives = generated.len(), "item ready");
                (ProcessingStatus::Ready, None)
            }
            Err(err) => {
                error!(%class, %id, error = %err, "cannot process item");
                (ProcessingStatus::Failed, Some(err.to_string()))
            }
        };

        match status {
            ProcessingStatus::Ready => self.stats.processed.fetch_add(1, Ordering::Relaxed),
            _ => self.stats.failed.fetch_add(1, Ordering::Relaxed),
        };

        if let Err(err) = self.ctx.commit.finalize(id, status) {
            self.stats.status_errors.fetch_add(1, Ordering::Relaxed);
            error!(%class, %id, %status, error = %err, "cannot record status");
        }

        self.ctx.emit(ProcessEvent::Finished {
            class,
            id,
            status,
            error: message,
        });
    }
}
