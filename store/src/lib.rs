pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod test_util;

pub use clock::{Clock, SharedClock, SystemClock};
pub use config::Config;
pub use db::{connect_cache_table, AddUserOutcome, CacheTable, Database, Record, RecordStore, UserTable};
pub use error::{Result, StoreError};
pub use newsnow_common::{AccountType, CacheInfo, NewsItem, UserData, UserInfo};
