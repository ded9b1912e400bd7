//! Injected collaborators of the store: id generation and wall clock.
//!
//! Both are traits so tests can substitute deterministic implementations.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of candidate widget ids.
///
/// Candidates are expected, but not required, to be unused. The store keeps
/// asking until it gets one that is free.
pub trait IdProvider: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random UUID v4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdProvider;

impl IdProvider for UuidIdProvider {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
