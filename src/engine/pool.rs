// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Background thread pool for processors that offload work.
//!
//! Work functions run on the blocking pool of a dedicated tokio runtime. The
//! caller gets a [`JobHandle`] back immediately and polls it with
//! [`JobHandle::try_take`], which never blocks. Every job owns a
//! [`CancellationToken`] that the work function polls through
//! [`JobContext::stop_requested`]; dropping the handle cancels the job.
//!
//! A panic inside a work function is captured by the runtime and delivered to
//! the handle as [`PoolError::Panicked`]; the worker thread and other queued
//! jobs keep running.
//!
//! # Examples
//!
//! ```
//! use procnet::engine::{PoolOptions, Progress, ThreadPool};
//! use std::time::Duration;
//!
//! let pool = ThreadPool::new(&PoolOptions::default()).unwrap();
//! let mut handle = pool.submit(Progress::new(), |_job| Ok(6 * 7), || {});
//!
//! let value = loop {
//!     if let Some(result) = handle.try_take() {
//!         break result.unwrap();
//!     }
//!     std::thread::sleep(Duration::from_millis(1));
//! };
//! assert_eq!(value, 42);
//! ```

use crate::config::consts::{
    DEFAULT_MAX_BLOCKING_THREADS, DEFAULT_POOL_THREAD_NAME, DEFAULT_SHUTDOWN_TIMEOUT_MS,
    DEFAULT_WORKER_THREADS,
};
use crate::errors::{panic_message, PoolError};
use crate::observability::messages::pool::{JobPanicked, PoolShutdown, PoolStarted};
use crate::observability::messages::StructuredLog;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Boxed error a work function may return.
pub type JobError = Box<dyn std::error::Error + Send + Sync>;

/// Sizing of the background pool.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
    pub thread_name: String,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            max_blocking_threads: DEFAULT_MAX_BLOCKING_THREADS,
            thread_name: DEFAULT_POOL_THREAD_NAME.to_string(),
        }
    }
}

/// Fractional progress shared between workers (writers) and the network
/// thread (reader). Last value wins.
///
/// Every submission through the pool starts a new generation at 0, and a job
/// only writes into the generation it was started in. A cancelled job that
/// is still winding down therefore cannot overwrite the progress of the job
/// that replaced it.
#[derive(Debug, Clone, Default)]
pub struct Progress(Arc<AtomicU64>);

fn pack(generation: u32, value: f32) -> u64 {
    (u64::from(generation) << 32) | u64::from(value.to_bits())
}

fn generation_of(packed: u64) -> u32 {
    (packed >> 32) as u32
}

fn clamp_progress(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for the current generation, clamped to `[0, 1]`. NaN is
    /// stored as 0.
    pub fn report(&self, value: f32) {
        let value = clamp_progress(value);
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(pack(generation_of(current), value))
            });
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire) as u32)
    }

    /// Number of submissions made with this progress so far.
    pub fn generation(&self) -> u32 {
        generation_of(self.0.load(Ordering::Acquire))
    }

    /// Start a new generation at 0 and return it.
    fn restart(&self) -> u32 {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(pack(generation_of(current).wrapping_add(1), 0.0))
            })
            .unwrap_or_else(|current| current);
        generation_of(previous).wrapping_add(1)
    }

    /// Store `value` only while `generation` is the current one.
    fn report_for(&self, generation: u32, value: f32) -> bool {
        let value = clamp_progress(value);
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (generation_of(current) == generation).then(|| pack(generation, value))
            })
            .is_ok()
    }
}

/// Per-job fractions of one batch, averaged into a single progress value.
#[derive(Debug)]
struct BatchProgress {
    progress: Progress,
    generation: u32,
    parts: Mutex<Vec<f32>>,
}

impl BatchProgress {
    fn report(&self, index: usize, value: f32) {
        let mut parts = self.parts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(part) = parts.get_mut(index) {
            *part = clamp_progress(value);
        }
        let mean = parts.iter().sum::<f32>() / parts.len().max(1) as f32;
        self.progress.report_for(self.generation, mean);
    }
}

#[derive(Debug, Clone)]
enum ProgressSink {
    Single { progress: Progress, generation: u32 },
    Batch { batch: Arc<BatchProgress>, index: usize },
}

/// Handed to a work function while it runs.
#[derive(Debug, Clone)]
pub struct JobContext {
    stop: CancellationToken,
    progress: ProgressSink,
}

impl JobContext {
    /// Cooperative cancellation flag. Work functions should poll it between
    /// steps and return early once it is set.
    pub fn stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Report this job's own fraction done. In a batch the visible value is
    /// the mean over every job of the batch.
    pub fn report_progress(&self, value: f32) {
        match &self.progress {
            ProgressSink::Single {
                progress,
                generation,
            } => {
                progress.report_for(*generation, value);
            }
            ProgressSink::Batch { batch, index } => batch.report(*index, value),
        }
    }

    /// Report `done` out of `total` steps.
    pub fn report_steps(&self, done: usize, total: usize) {
        if total > 0 {
            self.report_progress(done as f32 / total as f32);
        }
    }
}

/// Future-like handle to a submitted job. Dropping it cancels the job.
#[derive(Debug)]
pub struct JobHandle<T> {
    receiver: oneshot::Receiver<Result<T, PoolError>>,
    stop: CancellationToken,
    progress: Progress,
}

impl<T> JobHandle<T> {
    /// Take the result if the job has finished. Never blocks.
    pub fn try_take(&mut self) -> Option<Result<T, PoolError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(PoolError::Disconnected)),
        }
    }

    pub fn cancel(&self) {
        self.stop.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn progress(&self) -> f32 {
        self.progress.get()
    }
}

impl<T> Drop for JobHandle<T> {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

pub struct ThreadPool {
    runtime: Option<tokio::runtime::Runtime>,
    shutdown: CancellationToken,
    outstanding: Arc<AtomicUsize>,
    thread_name: String,
}

impl ThreadPool {
    pub fn new(options: &PoolOptions) -> Result<Self, PoolError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(options.worker_threads.max(1))
            .max_blocking_threads(options.max_blocking_threads.max(1))
            .thread_name(options.thread_name.clone())
            .enable_time()
            .build()
            .map_err(|e| PoolError::Startup(e.to_string()))?;

        PoolStarted {
            thread_name: &options.thread_name,
            worker_threads: options.worker_threads,
            max_blocking_threads: options.max_blocking_threads,
        }
        .log();

        Ok(Self {
            runtime: Some(runtime),
            shutdown: CancellationToken::new(),
            outstanding: Arc::new(AtomicUsize::new(0)),
            thread_name: options.thread_name.clone(),
        })
    }

    /// Submit `work` and return immediately.
    ///
    /// `progress` is what the work function reports into; `on_finished` runs
    /// on a pool thread after the result has been made available to the
    /// handle, whether the job succeeded, failed, or panicked.
    pub fn submit<T, F, W>(&self, progress: Progress, work: F, on_finished: W) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&JobContext) -> Result<T, JobError> + Send + 'static,
        W: FnOnce() + Send + 'static,
    {
        let generation = progress.restart();
        let sink = ProgressSink::Single {
            progress: progress.clone(),
            generation,
        };
        self.spawn(progress, sink, work, on_finished)
    }

    /// Submit a batch of jobs that report into one shared progress value,
    /// the mean of the per-job fractions. Handles come back in the order of
    /// `works`; `on_finished` runs once per job.
    pub fn submit_many<T, F, W>(
        &self,
        progress: Progress,
        works: Vec<F>,
        on_finished: W,
    ) -> Vec<JobHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&JobContext) -> Result<T, JobError> + Send + 'static,
        W: Fn() + Send + Sync + 'static,
    {
        let generation = progress.restart();
        let batch = Arc::new(BatchProgress {
            progress: progress.clone(),
            generation,
            parts: Mutex::new(vec![0.0; works.len()]),
        });
        let on_finished = Arc::new(on_finished);

        works
            .into_iter()
            .enumerate()
            .map(|(index, work)| {
                let sink = ProgressSink::Batch {
                    batch: Arc::clone(&batch),
                    index,
                };
                let on_finished = Arc::clone(&on_finished);
                self.spawn(progress.clone(), sink, work, move || on_finished())
            })
            .collect()
    }

    fn spawn<T, F, W>(
        &self,
        progress: Progress,
        sink: ProgressSink,
        work: F,
        on_finished: W,
    ) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&JobContext) -> Result<T, JobError> + Send + 'static,
        W: FnOnce() + Send + 'static,
    {
        let stop = self.shutdown.child_token();
        let (sender, receiver) = oneshot::channel();
        let handle = JobHandle {
            receiver,
            stop: stop.clone(),
            progress,
        };

        let Some(runtime) = self.runtime.as_ref() else {
            // Only reachable while the pool is being dropped.
            let _ = sender.send(Err(PoolError::Cancelled));
            return handle;
        };

        let job = JobContext {
            stop,
            progress: sink,
        };
        let outstanding = Arc::clone(&self.outstanding);
        outstanding.fetch_add(1, Ordering::SeqCst);

        let blocking = runtime.spawn_blocking(move || work(&job));
        runtime.spawn(async move {
            let result = match blocking.await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(PoolError::Failed(e.to_string())),
                Err(join) if join.is_panic() => {
                    let message = panic_message(join.into_panic().as_ref());
                    JobPanicked { message: &message }.log();
                    Err(PoolError::Panicked(message))
                }
                Err(_) => Err(PoolError::Cancelled),
            };
            outstanding.fetch_sub(1, Ordering::SeqCst);
            // A closed receiver means the handle was dropped; nobody wants the result.
            let _ = sender.send(result);
            on_finished();
        });

        handle
    }

    /// Number of submitted jobs that have not yet delivered a result.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Cancel every outstanding job and wait up to `timeout` for the workers.
    /// Inside an async context the workers are left to finish in the
    /// background instead.
    pub fn shutdown(mut self, timeout: Duration) {
        self.shutdown_inner(timeout);
    }

    fn shutdown_inner(&mut self, timeout: Duration) {
        if let Some(runtime) = self.runtime.take() {
            self.shutdown.cancel();
            PoolShutdown {
                thread_name: &self.thread_name,
                outstanding: self.outstanding(),
            }
            .log();
            // Blocking on the workers is not allowed from inside an async
            // context, e.g. when a tokio-based host drops the evaluator.
            if tokio::runtime::Handle::try_current().is_ok() {
                runtime.shutdown_background();
            } else {
                runtime.shutdown_timeout(timeout);
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown_inner(Duration::from_millis(DEFAULT_SHUTDOWN_TIMEOUT_MS));
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("thread_name", &self.thread_name)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}
