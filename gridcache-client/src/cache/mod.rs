//! Cache operations with partition-aware routing.
//!
//! A [`CacheClient`] turns logical cache operations into requests addressed
//! to the node that owns the key's partition. The owner is taken from the
//! client's [`AffinityMapper`]; when the mapping is stale the node answers with
//! a topology mismatch and the client refreshes the mapping once, recomputes
//! the target and retries.
//!
//! # Example
//!
//! ```ignore
//! let cache = client.cache("orders");
//! cache.refresh_affinity_mapping().await?;
//!
//! cache.put("order-1", "pending").await?;
//! let status: Option<String> = cache.get_value("order-1").await?;
//! let total = cache.get_size(PeekMode::ALL).await?;
//! ```

mod invocation;
mod payload;
mod size;

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use bytes::Bytes;
use gridcache_core::protocol::{cache_id, OpCode};
use gridcache_core::serialization::{
    Deserializable, Readable, ValueReader, Writable, WritableKey,
};
use gridcache_core::Result;
use tracing::instrument;

use crate::affinity::AffinityMapper;
use crate::config::ClientConfig;
use crate::stats::CacheStats;
use crate::transaction::TransactionEnlistment;
use crate::transport::Transport;

use self::payload::{Empty, KeyPayload, KeyValuePayload};

/// Immutable identity of a cache: its name, numeric id and binary mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheIdentity {
    name: String,
    id: i32,
    binary: bool,
}

impl CacheIdentity {
    /// Creates an identity with an explicit id.
    pub fn new(name: impl Into<String>, id: i32, binary: bool) -> Self {
        Self {
            name: name.into(),
            id,
            binary,
        }
    }

    /// Creates a non-binary identity whose id is derived from the name.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let id = cache_id(&name);
        Self::new(name, id, false)
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cache id carried in every request.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns `true` if the cache works with binary objects.
    pub fn is_binary(&self) -> bool {
        self.binary
    }
}

impl fmt::Display for CacheIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Which copies of the data a size request counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeekMode(i32);

impl PeekMode {
    /// All entries.
    pub const ALL: Self = Self(0x01);
    /// Entries held in near caches.
    pub const NEAR: Self = Self(0x02);
    /// Primary copies.
    pub const PRIMARY: Self = Self(0x04);
    /// Backup copies.
    pub const BACKUP: Self = Self(0x08);

    /// Returns the wire mask.
    pub fn bits(self) -> i32 {
        self.0
    }

    /// Returns `true` if every mode in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for PeekMode {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for PeekMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PeekMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Client for one cache.
///
/// Operations complete once the node has answered or a terminal error
/// occurred. The client is cheap to share behind an `Arc`; concurrent
/// operations are independent.
#[derive(Debug)]
pub struct CacheClient {
    identity: CacheIdentity,
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    mapper: AffinityMapper,
    transactions: Option<Arc<dyn TransactionEnlistment>>,
    stats: CacheStats,
}

impl CacheClient {
    /// Creates a client for `identity` over a shared transport.
    ///
    /// No mapping is loaded until [`refresh_affinity_mapping`] runs or a
    /// failed attempt triggers a refresh; until then requests go to any node
    /// with their affinity key attached.
    ///
    /// [`refresh_affinity_mapping`]: CacheClient::refresh_affinity_mapping
    pub fn new(
        identity: CacheIdentity,
        transport: Arc<dyn Transport>,
        config: Arc<ClientConfig>,
    ) -> Self {
        let mapper = AffinityMapper::new(identity.id(), Arc::clone(&transport));
        Self {
            identity,
            transport,
            config,
            mapper,
            transactions: None,
            stats: CacheStats::new(),
        }
    }

    /// Installs a transaction enlistment hook.
    pub fn with_transactions(mut self, hook: Arc<dyn TransactionEnlistment>) -> Self {
        self.transactions = Some(hook);
        self
    }

    /// Returns the cache identity.
    pub fn identity(&self) -> &CacheIdentity {
        &self.identity
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Returns the cache id.
    pub fn id(&self) -> i32 {
        self.identity.id()
    }

    /// Returns `true` if the cache works with binary objects.
    pub fn is_binary(&self) -> bool {
        self.identity.is_binary()
    }

    /// Returns the affinity mapper.
    pub fn affinity(&self) -> &AffinityMapper {
        &self.mapper
    }

    /// Returns the operation statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Maps `key` to `value`, replacing any previous value.
    #[instrument(
        name = "cache.put",
        skip(self, key, value),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn put<K, V>(&self, key: &K, value: &V) -> Result<()>
    where
        K: WritableKey + ?Sized,
        V: Writable + ?Sized,
    {
        let payload = KeyValuePayload::new(key, value)?;
        self.invoke(OpCode::Put, &payload).await
    }

    /// Reads the value of `key` into `sink`.
    ///
    /// A missing key is not an error: the sink is left untouched.
    #[instrument(
        name = "cache.get",
        skip(self, key, sink),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn get<K, S>(&self, key: &K, sink: &mut S) -> Result<()>
    where
        K: WritableKey + ?Sized,
        S: Readable + ?Sized,
    {
        let payload = KeyPayload::new(key)?;
        let value: Option<Bytes> = self.invoke(OpCode::Get, &payload).await?;
        read_into(value, sink)
    }

    /// Returns the value of `key`, or `None` if it is not mapped.
    pub async fn get_value<K, V>(&self, key: &K) -> Result<Option<V>>
    where
        K: WritableKey + ?Sized,
        V: Deserializable,
    {
        let mut sink = None;
        self.get(key, &mut sink).await?;
        Ok(sink)
    }

    /// Returns `true` if `key` is mapped.
    #[instrument(
        name = "cache.contains_key",
        skip(self, key),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn contains_key<K>(&self, key: &K) -> Result<bool>
    where
        K: WritableKey + ?Sized,
    {
        let payload = KeyPayload::new(key)?;
        self.invoke(OpCode::ContainsKey, &payload).await
    }

    /// Removes the mapping of `key`; returns `true` if one existed.
    #[instrument(
        name = "cache.remove",
        skip(self, key),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn remove<K>(&self, key: &K) -> Result<bool>
    where
        K: WritableKey + ?Sized,
    {
        let payload = KeyPayload::new(key)?;
        self.invoke(OpCode::Remove, &payload).await
    }

    /// Removes every mapping of the cache, cluster-wide.
    #[instrument(
        name = "cache.remove_all",
        skip(self),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn remove_all(&self) -> Result<()> {
        self.invoke(OpCode::RemoveAll, &Empty).await
    }

    /// Clears the entry of `key`.
    ///
    /// Unlike [`remove`](CacheClient::remove) this bypasses transactions; the
    /// server leaves locked or transactionally held keys alone.
    #[instrument(
        name = "cache.clear_key",
        skip(self, key),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn clear_key<K>(&self, key: &K) -> Result<()>
    where
        K: WritableKey + ?Sized,
    {
        let payload = KeyPayload::new(key)?;
        self.invoke(OpCode::ClearKey, &payload).await
    }

    /// Clears the whole cache without transactional or listener semantics.
    #[instrument(
        name = "cache.clear",
        skip(self),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn clear(&self) -> Result<()> {
        self.invoke(OpCode::ClearAll, &Empty).await
    }

    /// Reads the value of `key` into `sink` from data already resident on
    /// the node, without loading it from a store.
    #[instrument(
        name = "cache.local_peek",
        skip(self, key, sink),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn local_peek<K, S>(&self, key: &K, sink: &mut S) -> Result<()>
    where
        K: WritableKey + ?Sized,
        S: Readable + ?Sized,
    {
        let payload = KeyPayload::new(key)?;
        let value: Option<Bytes> = self.invoke(OpCode::LocalPeek, &payload).await?;
        read_into(value, sink)
    }

    /// Returns the number of entries across the cluster for the given peek
    /// modes.
    #[instrument(
        name = "cache.get_size",
        skip(self),
        fields(cache = %self.identity.name(), peek_modes = modes.bits()),
        level = "debug"
    )]
    pub async fn get_size(&self, modes: PeekMode) -> Result<i64> {
        self.stats.record_operation();
        let result = self.aggregate_size(modes).await;
        if result.is_err() {
            self.stats.record_failure();
        }
        result
    }

    /// Fetches the current partition table and replaces the mapping,
    /// whatever the version of the installed one.
    #[instrument(
        name = "cache.refresh_affinity_mapping",
        skip(self),
        fields(cache = %self.identity.name()),
        level = "debug"
    )]
    pub async fn refresh_affinity_mapping(&self) -> Result<()> {
        self.mapper.refresh().await?;
        self.stats.record_refresh();
        Ok(())
    }
}

fn read_into<S: Readable + ?Sized>(value: Option<Bytes>, sink: &mut S) -> Result<()> {
    match value {
        Some(bytes) => {
            tracing::trace!(len = bytes.len(), "value found");
            sink.read_value(&mut ValueReader::new(&bytes))
        }
        None => {
            tracing::trace!("value absent");
            Ok(())
        }
    }
}
