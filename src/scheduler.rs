//! Bounded-concurrency batch scheduler for listing pages and enrichment.
//!
//! Work items are partitioned into fixed-size batches. Inside a batch every item
//! is spawned as its own task, with a semaphore permit held for the task's
//! lifetime so at most `concurrency` items are in flight. The whole batch is
//! awaited, then the scheduler pauses before dispatching the next one.
//!
//! A failing or panicking item never aborts its batch. Results come back in
//! input order, one [`SlotOutcome`] per item, regardless of completion order.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use harvester_core::scheduler::BatchScheduler;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = BatchScheduler::new(10, 25, Duration::from_millis(500))?;
//! let report = scheduler
//!     .run((1..=60).collect(), |n: u32| async move { Ok::<_, String>(n * 2) })
//!     .await?;
//! println!("completed: {}, failed: {}", report.completed(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

/// Default number of concurrently active items.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Minimum allowed concurrency.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency.
pub const MAX_CONCURRENCY: usize = 100;

/// Default number of items per batch.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Maximum allowed batch size.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Default pause between batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(500);

/// Error type for scheduler construction and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Invalid batch size provided.
    #[error("invalid batch size {value}: must be between 1 and {MAX_BATCH_SIZE}")]
    InvalidBatchSize {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Result of one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome<R> {
    /// The item ran to completion.
    Completed(R),
    /// The item returned an error or its task panicked.
    Failed(String),
    /// The item was never dispatched (run interrupted).
    Skipped,
}

impl<R> SlotOutcome<R> {
    /// Returns the value of a completed item.
    #[must_use]
    pub fn completed(self) -> Option<R> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Failed(_) | Self::Skipped => None,
        }
    }
}

/// Outcomes of one scheduler run, indexed like the input items.
#[derive(Debug)]
pub struct ScheduleReport<R> {
    /// One outcome per input item, in input order.
    pub outcomes: Vec<SlotOutcome<R>>,
    /// Number of batches dispatched.
    pub batches: usize,
    /// Dispatch stopped early because the interrupt flag was raised.
    pub interrupted: bool,
}

impl<R> ScheduleReport<R> {
    /// Number of items that completed.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(|outcome| matches!(outcome, SlotOutcome::Completed(_)))
    }

    /// Number of items that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, SlotOutcome::Failed(_)))
    }

    /// Number of items never dispatched.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, SlotOutcome::Skipped))
    }

    fn count(&self, predicate: impl Fn(&SlotOutcome<R>) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Batch scheduler with a counting-permit concurrency limit.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    batch_size: usize,
    pause: Duration,
    interrupt: Option<Arc<AtomicBool>>,
}

impl BatchScheduler {
    /// Creates a scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConcurrency`] outside 1..=100 and
    /// [`SchedulerError::InvalidBatchSize`] outside 1..=1000.
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize, batch_size: usize, pause: Duration) -> Result<Self, SchedulerError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(SchedulerError::InvalidConcurrency { value: concurrency });
        }
        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(SchedulerError::InvalidBatchSize { value: batch_size });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            batch_size,
            pause,
            interrupt: None,
        })
    }

    /// Stops dispatching new batches once `flag` is set. In-flight items finish.
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Runs `work` over every item.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::SemaphoreClosed`] if the permit pool is closed.
    /// Item failures are reported per slot, not as an error.
    #[instrument(skip(self, items, work), fields(items = items.len(), concurrency = self.concurrency, batch_size = self.batch_size))]
    pub async fn run<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        work: F,
    ) -> Result<ScheduleReport<R>, SchedulerError>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Display + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let mut outcomes: Vec<SlotOutcome<R>> = items.iter().map(|_| SlotOutcome::Skipped).collect();
        let work = Arc::new(work);
        let mut pending = items.into_iter().enumerate().peekable();
        let mut batches = 0;
        let mut interrupted = false;

        while pending.peek().is_some() {
            if batches > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            if self.is_interrupted() {
                interrupted = true;
                break;
            }

            let batch: Vec<(usize, T)> = pending.by_ref().take(self.batch_size).collect();
            batches += 1;
            debug!(batch = batches, size = batch.len(), "dispatching batch");

            let mut handles = Vec::with_capacity(batch.len());
            for (slot, item) in batch {
                let permit = self
                    .semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| SchedulerError::SemaphoreClosed)?;
                let work = Arc::clone(&work);
                handles.push((
                    slot,
                    tokio::spawn(async move {
                        // Permit is dropped when this block exits (RAII)
                        let _permit = permit;
                        work(item).await
                    }),
                ));
            }

            for (slot, handle) in handles {
                outcomes[slot] = match handle.await {
                    Ok(Ok(value)) => SlotOutcome::Completed(value),
                    Ok(Err(error)) => SlotOutcome::Failed(error.to_string()),
                    Err(join_error) => {
                        warn!(slot, error = %join_error, "scheduled task panicked");
                        SlotOutcome::Failed(format!("task failed: {join_error}"))
                    }
                };
            }
        }

        let report = ScheduleReport {
            outcomes,
            batches,
            interrupted,
        };
        if interrupted {
            warn!(skipped = report.skipped(), "dispatch interrupted");
        }
        info!(
            completed = report.completed(),
            failed = report.failed(),
            skipped = report.skipped(),
            batches,
            "schedule complete"
        );
        Ok(report)
    }
}
