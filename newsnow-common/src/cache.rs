//! Cache entry types.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::news::NewsItem;

/// A cached list of items for one source, as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo<T = NewsItem> {
    pub id: String,
    /// Epoch milliseconds of the last write.
    pub updated: i64,
    pub items: Vec<T>,
}

impl<T> CacheInfo<T> {
    /// Last write time, or `None` if the stored stamp is out of range.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.updated).single()
    }

    /// Milliseconds elapsed between the last write and `now_millis`.
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.updated)
    }
}
