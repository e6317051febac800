//! NewsNow Common Types
//!
//! Shared types used by the persistence layer and its callers.

pub mod cache;
pub mod news;
pub mod user;

pub use cache::CacheInfo;
pub use news::{NewsId, NewsItem, PubDate};
pub use user::{AccountType, UnknownAccountType, UserData, UserInfo};
