//! Partition-aware thin client for the gridcache distributed cache.
//!
//! The client translates cache operations into binary requests addressed to
//! the node that owns the key's partition. Owners come from a refreshable
//! affinity mapping; a request that reaches a node which no longer owns the
//! partition is answered with a topology mismatch, after which the client
//! refreshes the mapping once and retries. Cluster-wide size requests fan out
//! to every owning node and only succeed when all of them answer.
//!
//! Connections are not managed here: every cache client talks to the cluster
//! through a shared [`Transport`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gridcache_client::{ClientConfig, GridClient, PeekMode};
//!
//! let config = ClientConfig::builder()
//!     .retry(|r| r.max_attempts(3))
//!     .build()?;
//! let client = GridClient::new(Arc::new(transport), config);
//!
//! let cache = client.cache("users");
//! cache.refresh_affinity_mapping().await?;
//! cache.put("alice", &42i64).await?;
//! assert_eq!(cache.get_value::<_, i64>("alice").await?, Some(42));
//! assert_eq!(cache.get_size(PeekMode::ALL).await?, 1);
//! ```

#![warn(missing_docs)]

pub mod affinity;
pub mod cache;
pub mod client;
pub mod config;
pub mod config_file;
pub mod stats;
pub mod transaction;
pub mod transport;

pub use affinity::{AffinityMapper, AffinityMapping};
pub use cache::{CacheClient, CacheIdentity, PeekMode};
pub use client::GridClient;
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError, RetryConfig, RetryConfigBuilder};
pub use config_file::{FileConfig, FileRetryConfig};
pub use stats::CacheStats;
pub use transaction::TransactionEnlistment;
pub use transport::{PartitionTable, Transport};

pub use gridcache_core::{
    AffinityKeyed, GridError, NodeId, Readable, Result, Writable, WritableKey,
};
