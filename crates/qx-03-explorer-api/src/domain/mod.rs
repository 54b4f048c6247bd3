//! Domain layer: query semantics, independent of transport.

pub mod access;
pub mod config;
pub mod error;
pub mod resolver;
pub mod statistics;

pub use access::{constant_time_compare, AccessKey, HeaviestBlockQuery};
pub use config::{
    AccessConfig, CacheConfig, ConfigError, ExplorerConfig, HttpConfig, StatisticsConfig,
    StoreConfig,
};
pub use error::{QueryError, QueryResult};
pub use resolver::{ExactKey, Page, QueryResolver, SearchTerm};
pub use statistics::{ChainStatistics, StatusSnapshot};
