//! In-process counters for authorization decisions and reloads
//!
//! Thread-safe counters bumped at the host boundary ([`crate::HookTable`])
//! and by the reload controller.

use std::sync::atomic::{AtomicU64, Ordering};

/// Authorization metrics
#[derive(Debug, Default)]
pub struct AuthMetrics {
    pub authentications_granted: AtomicU64,
    pub authentications_denied: AtomicU64,
    pub publish_denied: AtomicU64,
    pub subscribe_denied: AtomicU64,
    /// Decision functions that returned an error (answered as a denial)
    pub internal_faults: AtomicU64,
    pub reloads_succeeded: AtomicU64,
    pub reloads_failed: AtomicU64,
}

/// Point-in-time copy of [`AuthMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub authentications_granted: u64,
    pub authentications_denied: u64,
    pub publish_denied: u64,
    pub subscribe_denied: u64,
    pub internal_faults: u64,
    pub reloads_succeeded: u64,
    pub reloads_failed: u64,
}

impl AuthMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_authentication(&self, granted: bool) {
        if granted {
            self.authentications_granted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.authentications_denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_publish(&self, allowed: bool) {
        if !allowed {
            self.publish_denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_subscribe(&self, allowed: bool) {
        if !allowed {
            self.subscribe_denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_internal_fault(&self) {
        self.internal_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self, succeeded: bool) {
        if succeeded {
            self.reloads_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.reloads_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            authentications_granted: self.authentications_granted.load(Ordering::Relaxed),
            authentications_denied: self.authentications_denied.load(Ordering::Relaxed),
            publish_denied: self.publish_denied.load(Ordering::Relaxed),
            subscribe_denied: self.subscribe_denied.load(Ordering::Relaxed),
            internal_faults: self.internal_faults.load(Ordering::Relaxed),
            reloads_succeeded: self.reloads_succeeded.load(Ordering::Relaxed),
            reloads_failed: self.reloads_failed.load(Ordering::Relaxed),
        }
    }
}
