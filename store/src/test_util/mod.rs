use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::clock::{Clock, SharedClock};
use crate::config::{CacheConfig, Config, DatabaseConfig, LoggingConfig};
use crate::db::Database;

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        cache: CacheConfig { enabled: true },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

pub fn memory_database() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("Failed to open in-memory database"))
}

/// Deterministic clock: returns `start`, then advances by `step` on every read.
#[derive(Debug)]
pub struct StepClock {
    next: AtomicI64,
    step: i64,
}

impl StepClock {
    pub fn new(start: i64, step: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            step,
        }
    }

    pub fn shared(start: i64, step: i64) -> SharedClock {
        Arc::new(Self::new(start, step))
    }

    /// The value the next read will return.
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Clock for StepClock {
    fn now_millis(&self) -> i64 {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }
}
