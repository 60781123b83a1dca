/// Async worker threads driving the pool runtime. Jobs run on its blocking
/// threads, so one is enough.
pub const DEFAULT_WORKER_THREADS: usize = 1;
/// Upper bound on concurrently running pool jobs
pub const DEFAULT_MAX_BLOCKING_THREADS: usize = 64;
pub const DEFAULT_POOL_THREAD_NAME: &str = "procnet-pool";
/// How long dropping the pool waits for cancelled jobs to return
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 1_000;

/// How long the run loop waits for a pool job to finish before giving up
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 5_000;
/// Passes the run loop performs at most before giving up
pub const DEFAULT_MAX_PASSES: u64 = 1_000;
/// A `process()` call longer than this on the network thread is logged
pub const DEFAULT_SLOW_PROCESSOR_WARN_MS: u64 = 250;

pub const DEFAULT_LOG_FILTER: &str = "info";
