//! Single-flight queue for heavy operations
//!
//! A bulkhead with exactly one permit: submitted operations run one at a
//! time in arrival order and each caller awaits its own result. Used to keep
//! multi-page report downloads from overlapping.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Errors raised by the queue itself, never by the queued operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue '{0}' is closed")]
    Closed(String),
    #[error("queue '{name}' wait exceeded {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

/// Configuration for [`SerialQueue`]
#[derive(Debug, Clone)]
pub struct SerialQueueConfig {
    /// Name used in logs and errors
    pub name: String,
    /// Optional bound on how long a caller waits for its turn
    pub acquire_timeout: Option<Duration>,
}

impl Default for SerialQueueConfig {
    fn default() -> Self {
        Self { name: "serial".to_string(), acquire_timeout: None }
    }
}

/// One-at-a-time executor
#[derive(Debug, Clone)]
pub struct SerialQueue {
    config: SerialQueueConfig,
    semaphore: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    completed: Arc<AtomicU64>,
}

impl SerialQueue {
    pub fn new(config: SerialQueueConfig) -> Self {
        Self {
            config,
            semaphore: Arc::new(Semaphore::new(1)),
            waiting: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue with default settings and the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(SerialQueueConfig { name: name.into(), ..SerialQueueConfig::default() })
    }

    /// Wait for the single slot, then run `operation` to completion
    ///
    /// The operation's own output is returned untouched inside `Ok`.
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T, QueueError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let acquired = match self.config.acquire_timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, self.semaphore.acquire()).await {
                    Ok(permit) => permit.map_err(|_| self.closed()),
                    Err(_) => {
                        warn!(queue = %self.config.name, ?timeout, "serial queue wait timed out");
                        Err(QueueError::Timeout { name: self.config.name.clone(), timeout })
                    }
                }
            }
            None => self.semaphore.acquire().await.map_err(|_| self.closed()),
        };
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        let _permit = acquired?;

        debug!(queue = %self.config.name, "serial queue slot acquired");
        let output = operation().await;
        self.completed.fetch_add(1, Ordering::Relaxed);
        Ok(output)
    }

    /// Callers currently waiting for the slot
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Whether an operation currently holds the slot
    pub fn is_busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    /// Operations run to completion so far
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Reject all current and future waiters
    pub fn close(&self) {
        self.semaphore.close();
    }

    fn closed(&self) -> QueueError {
        QueueError::Closed(self.config.name.clone())
    }
}
