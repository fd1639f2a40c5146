//! Drives a synchronization pass over every index record

use crate::processor::RecordProcessor;
use cmirror_errors::{Error, SyncError};
use cmirror_events::{EventEmitter, EventSender, FailureContext, IndexEvent, SyncEvent};
use cmirror_index::{DiskIndexFs, IndexFs, IndexReader, IndexRefresher, RecordStream};
use cmirror_types::{RecordOutcome, SyncReport, SyncStats, SyncStatus};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Runs the record state machine for every record of an index
///
/// At most `jobs` records are in flight at once. Records are pulled from
/// the index lazily, so the walk never gets further ahead than the
/// workers. Once the cancellation token fires no new record is started and
/// in-flight fetches are abandoned.
pub struct SyncCoordinator<F = DiskIndexFs> {
    reader: IndexReader<F>,
    processor: Arc<RecordProcessor>,
    refresher: Option<Arc<dyn IndexRefresher>>,
    cancel: CancellationToken,
    jobs: usize,
    tx: Option<EventSender>,
}

impl<F> EventEmitter for SyncCoordinator<F> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl<F: IndexFs + 'static> SyncCoordinator<F> {
    #[must_use]
    pub fn new(reader: IndexReader<F>, processor: RecordProcessor, jobs: usize) -> Self {
        Self {
            reader,
            processor: Arc::new(processor),
            refresher: None,
            cancel: CancellationToken::new(),
            jobs: jobs.max(1),
            tx: None,
        }
    }

    /// Refresh the index checkout before scanning it
    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn IndexRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run one pass
    ///
    /// Per-record failures are counted in the report, never returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the index refresh fails, the index root is
    /// missing or unreadable, or the worker pool breaks down. A refresh or
    /// root failure happens before the cache is touched.
    pub async fn run(&self) -> Result<SyncReport, Error> {
        let start = Instant::now();

        if let Some(refresher) = &self.refresher {
            self.refresh(refresher.as_ref()).await?;
        }

        let mut stream = self.reader.records().await?;

        self.emit_sync(SyncEvent::Started {
            cache_dir: self.processor.cache_dir().to_path_buf(),
            jobs: self.jobs,
        });

        let dispatched = if self.jobs == 1 {
            Ok(self.run_inline(&mut stream).await)
        } else {
            self.run_pool(&mut stream).await
        };
        stream.finish().await?;
        let stats = dispatched?;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = if self.cancel.is_cancelled() {
            self.emit_sync(SyncEvent::Aborted { stats });
            SyncStatus::Aborted
        } else {
            self.emit_sync(SyncEvent::Completed { stats, duration_ms });
            SyncStatus::Completed
        };

        Ok(SyncReport {
            status,
            stats,
            jobs: self.jobs,
            duration_ms,
        })
    }

    async fn refresh(&self, refresher: &dyn IndexRefresher) -> Result<(), Error> {
        let path = self.reader.root().to_path_buf();
        self.emit_index(IndexEvent::RefreshStarted { path: path.clone() });

        match refresher.refresh(&path).await {
            Ok(()) => {
                self.emit_index(IndexEvent::RefreshCompleted { path });
                Ok(())
            }
            Err(e) => {
                self.emit_index(IndexEvent::RefreshFailed {
                    path,
                    failure: FailureContext::from_error(&e),
                });
                Err(e)
            }
        }
    }

    /// Single worker: process records one after another on this task
    async fn run_inline(&self, stream: &mut RecordStream) -> SyncStats {
        let mut stats = SyncStats::default();

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                next = stream.next() => next,
            };
            let Some(record) = next else { break };

            stats.record(self.processor.process(&record, &self.cancel).await);
        }

        stats
    }

    /// Several workers: one task per record, bounded by a semaphore
    async fn run_pool(&self, stream: &mut RecordStream) -> Result<SyncStats, Error> {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut tasks = JoinSet::new();
        let mut stats = SyncStats::default();

        loop {
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.map_err(|e| SyncError::WorkerFailed {
                        message: format!("worker pool closed: {e}"),
                    })?
                }
            };

            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                next = stream.next() => next,
            };
            let Some(record) = next else { break };

            let processor = Arc::clone(&self.processor);
            let cancel = self.cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                processor.process(&record, &cancel).await
            });

            while let Some(joined) = tasks.try_join_next() {
                stats.record(self.outcome_of(joined));
            }
        }

        while let Some(joined) = tasks.join_next().await {
            stats.record(self.outcome_of(joined));
        }

        Ok(stats)
    }

    fn outcome_of(&self, joined: Result<RecordOutcome, JoinError>) -> RecordOutcome {
        match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => RecordOutcome::Aborted,
            Err(e) => {
                self.emit_warning(format!("worker task failed: {e}"));
                RecordOutcome::Failed
            }
        }
    }
}
