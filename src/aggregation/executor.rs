//! Parallel execution of aggregation tasks with a single combiner.
//!
//! Every task runs on the rayon pool and returns an owned partial result. The
//! results travel over a channel to the calling thread, which is the only
//! place where they are merged, so no shared table is ever locked.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::aggregation::config::AggregationConfig;
use crate::aggregation::metrics::Timer;
use crate::error::{CorpusBayesError, Result};
use crate::storage::Storage;

/// A unit of map work submitted to the [`ParallelExecutor`].
pub trait AggregationTask: Send + 'static {
    /// The private partial result produced by this task.
    type Output: Send + 'static;

    /// Identifier used in logs and error messages.
    fn task_id(&self) -> &str;

    /// Run the task against the storage.
    fn execute(&self, storage: &dyn Storage) -> Result<Self::Output>;
}

/// Result of executing one task.
#[derive(Debug)]
pub struct TaskResult<T> {
    /// Task identifier.
    pub task_id: String,

    /// The output, or the error that stopped the task.
    pub outcome: Result<T>,

    /// Execution time.
    pub execution_time: Duration,
}

/// Runs aggregation tasks on a dedicated thread pool.
pub struct ParallelExecutor {
    /// Thread pool for parallel execution.
    thread_pool: Arc<ThreadPool>,

    num_threads: usize,
}

impl std::fmt::Debug for ParallelExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelExecutor")
            .field("num_threads", &self.num_threads)
            .finish()
    }
}

impl ParallelExecutor {
    /// Create a new executor.
    pub fn new(config: &AggregationConfig) -> Result<Self> {
        config.validate()?;
        let num_threads = config.effective_threads();

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("aggregation-{i}"))
            .panic_handler(|_| error!("Aggregation task panicked"))
            .build()
            .map_err(|e| {
                CorpusBayesError::internal(format!("Failed to create thread pool: {e}"))
            })?;

        Ok(Self {
            thread_pool: Arc::new(thread_pool),
            num_threads,
        })
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Execute `tasks` in parallel and fold their outputs into `init` with `combine`.
    ///
    /// Blocks until every task has finished. The job is all-or-nothing: if any
    /// task fails (or dies without reporting) the accumulated value is discarded
    /// and an [`CorpusBayesError::Aggregation`] error is returned.
    pub fn execute<T, A, F>(
        &self,
        storage: Arc<dyn Storage>,
        tasks: Vec<T>,
        init: A,
        mut combine: F,
    ) -> Result<A>
    where
        T: AggregationTask,
        F: FnMut(&mut A, T::Output) -> Result<()>,
    {
        let num_tasks = tasks.len();
        let (tx, rx) = crossbeam_channel::unbounded();

        // Submit tasks to thread pool
        for task in tasks {
            let tx = tx.clone();
            let storage = Arc::clone(&storage);

            self.thread_pool.spawn(move || {
                let timer = Timer::start();
                let outcome = task.execute(storage.as_ref());
                let _ = tx.send(TaskResult {
                    task_id: task.task_id().to_string(),
                    outcome,
                    execution_time: timer.stop(),
                });
            });
        }

        // Drop the original sender so the receiver knows when all tasks are done
        drop(tx);

        let mut acc = init;
        let mut received = 0;
        let mut first_error: Option<CorpusBayesError> = None;

        for result in rx.iter() {
            received += 1;
            match result.outcome {
                Ok(output) => {
                    debug!(
                        "Task {} finished in {:.2?}",
                        result.task_id, result.execution_time
                    );
                    if first_error.is_none() {
                        if let Err(e) = combine(&mut acc, output) {
                            first_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    error!("Task {} failed: {e}", result.task_id);
                    if first_error.is_none() {
                        first_error = Some(CorpusBayesError::aggregation(format!(
                            "Task {} failed: {e}",
                            result.task_id
                        )));
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if received != num_tasks {
            return Err(CorpusBayesError::aggregation(format!(
                "{} of {num_tasks} tasks terminated without a result",
                num_tasks - received
            )));
        }

        Ok(acc)
    }
}
