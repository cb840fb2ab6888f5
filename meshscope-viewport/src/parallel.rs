//! Worker pool configuration for vertex transforms and picking
//!
//! Data-parallel work runs on one shared rayon pool. Results never depend on
//! the worker count: maps preserve vertex order and reductions use a total
//! order.

use meshscope_core::{Error, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex, OnceLock};

static GLOBAL_THREAD_POOL: OnceLock<Arc<ThreadPool>> = OnceLock::new();
static THREAD_POOL_CONFIG: Mutex<ThreadPoolConfig> = Mutex::new(ThreadPoolConfig::new());

const DEFAULT_THREAD_PREFIX: &str = "meshscope-viewport";

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of threads to use (None = automatic)
    pub num_threads: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Enable parallel processing (can be disabled for debugging)
    pub enabled: bool,
}

impl ThreadPoolConfig {
    const fn new() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: String::new(),
            enabled: true,
        }
    }

    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the worker thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Enable or disable parallel processing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            enabled: true,
        }
    }
}

fn build_pool(config: &ThreadPoolConfig) -> Result<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new();

    if let Some(num_threads) = config.num_threads {
        builder = builder.num_threads(num_threads);
    }

    let prefix = if config.thread_name_prefix.is_empty() {
        DEFAULT_THREAD_PREFIX.to_string()
    } else {
        config.thread_name_prefix.clone()
    };
    builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));

    builder
        .build()
        .map_err(|e| Error::Algorithm(format!("Failed to create thread pool: {}", e)))
}

/// Initialize the global thread pool with custom configuration
///
/// Has no effect on the pool if it already exists; the `enabled` flag is
/// still updated.
pub fn init_thread_pool(config: ThreadPoolConfig) -> Result<()> {
    if GLOBAL_THREAD_POOL.get().is_none() {
        let pool = build_pool(&config)?;
        if GLOBAL_THREAD_POOL.set(Arc::new(pool)).is_err() {
            tracing::debug!("thread pool initialized concurrently; keeping existing pool");
        }
    }

    if let Ok(mut global_config) = THREAD_POOL_CONFIG.lock() {
        *global_config = config;
    }

    Ok(())
}

/// Get the global thread pool, creating it with defaults if needed
pub fn get_thread_pool() -> Result<Arc<ThreadPool>> {
    if let Some(pool) = GLOBAL_THREAD_POOL.get() {
        return Ok(Arc::clone(pool));
    }

    let pool = Arc::new(build_pool(&ThreadPoolConfig::default())?);
    // Another thread may have won the race; use whichever pool got stored
    let _ = GLOBAL_THREAD_POOL.set(Arc::clone(&pool));
    Ok(GLOBAL_THREAD_POOL.get().cloned().unwrap_or(pool))
}

/// Get current thread pool configuration
pub fn get_config() -> ThreadPoolConfig {
    THREAD_POOL_CONFIG
        .lock()
        .map(|config| config.clone())
        .unwrap_or_else(|_| ThreadPoolConfig::default())
}

/// Check if parallel processing is enabled
pub fn is_parallel_enabled() -> bool {
    get_config().enabled
}

/// Whether a workload of `len` items should be split across workers
pub fn should_parallelize(len: usize, min_len: usize) -> bool {
    len >= min_len && is_parallel_enabled()
}

/// Execute a parallel operation with the global thread pool
///
/// Falls back to the calling thread when the pool cannot be created.
pub fn execute_parallel<F, R>(op: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool() {
        Ok(pool) => pool.install(op),
        Err(e) => {
            tracing::warn!(error = %e, "running parallel work on the calling thread");
            op()
        }
    }
}

/// Run `op` on a pool worker without waiting for it
pub fn spawn<F>(op: F)
where
    F: FnOnce() + Send + 'static,
{
    match get_thread_pool() {
        Ok(pool) => pool.spawn(op),
        Err(e) => {
            tracing::warn!(error = %e, "no worker pool; running job inline");
            op()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_thread_pool_config() {
        let config = ThreadPoolConfig::default()
            .with_threads(4)
            .with_thread_name_prefix("picker")
            .with_enabled(false);

        assert_eq!(config.num_threads, Some(4));
        assert_eq!(config.thread_name_prefix, "picker");
        assert!(!config.enabled);
    }

    #[test]
    fn test_should_parallelize_respects_minimum() {
        assert!(!should_parallelize(10, 100));
        assert_eq!(should_parallelize(1000, 100), is_parallel_enabled());
    }

    #[test]
    fn test_execute_parallel_preserves_order() {
        let data: Vec<u32> = (0..10_000).collect();
        let doubled: Vec<u32> = execute_parallel(|| data.par_iter().map(|x| x * 2).collect());
        assert_eq!(doubled.len(), data.len());
        assert!(doubled.iter().enumerate().all(|(i, x)| *x == 2 * i as u32));
    }

    #[test]
    fn test_spawn_runs_job() {
        let (sender, receiver) = flume::bounded(1);
        spawn(move || {
            let _ = sender.send(42);
        });
        assert_eq!(receiver.recv_timeout(std::time::Duration::from_secs(5)), Ok(42));
    }
}
