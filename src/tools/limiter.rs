//! Per-tool-class admission control
//!
//! Each logical tool name gets a semaphore sized from its descriptor,
//! so a pile of requests for one CPU-heavy cracker cannot starve the
//! host. Acquisition suspends; release is permit drop, which covers
//! every exit path including timeout, cancellation, and panic unwind.

use crate::tools::registry::ToolRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admission gate keyed by logical tool name.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    slots: HashMap<String, Arc<Semaphore>>,

    /// Semaphores for names not sized at construction, created on
    /// first acquisition at `default_limit` and shared from then on
    overflow: Mutex<HashMap<String, Arc<Semaphore>>>,

    default_limit: usize,
}

impl ConcurrencyLimiter {
    /// Size one semaphore per registered descriptor.
    pub fn for_registry(registry: &ToolRegistry, default_limit: usize) -> Self {
        let slots = registry
            .descriptors()
            .map(|d| {
                (
                    d.logical_name.clone(),
                    Arc::new(Semaphore::new(d.concurrency_limit)),
                )
            })
            .collect();
        Self {
            slots,
            overflow: Mutex::new(HashMap::new()),
            default_limit,
        }
    }

    #[cfg(test)]
    pub fn with_limit(name: &str, limit: usize) -> Self {
        let mut slots = HashMap::new();
        slots.insert(name.to_string(), Arc::new(Semaphore::new(limit)));
        Self {
            slots,
            overflow: Mutex::new(HashMap::new()),
            default_limit: limit,
        }
    }

    /// Wait for a slot in this tool's class. The returned permit holds
    /// the slot until dropped.
    pub async fn acquire(&self, logical_name: &str) -> OwnedSemaphorePermit {
        let semaphore = match self.slots.get(logical_name) {
            Some(semaphore) => semaphore.clone(),
            None => self
                .overflow
                .lock()
                .expect("limiter overflow map poisoned")
                .entry(logical_name.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.default_limit)))
                .clone(),
        };
        // Semaphores are never closed, so acquisition cannot fail
        semaphore
            .acquire_owned()
            .await
            .expect("limiter semaphore closed")
    }

    /// Free slots currently available for a tool class.
    pub fn available(&self, logical_name: &str) -> Option<usize> {
        if let Some(semaphore) = self.slots.get(logical_name) {
            return Some(semaphore.available_permits());
        }
        self.overflow
            .lock()
            .expect("limiter overflow map poisoned")
            .get(logical_name)
            .map(|s| s.available_permits())
    }
}
