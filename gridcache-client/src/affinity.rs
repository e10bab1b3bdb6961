//! Partition-to-node affinity mapping.
//!
//! The mapper holds the partition table of one cache as an immutable
//! [`AffinityMapping`] snapshot. Lookups clone the snapshot under a short read
//! lock; a refresh builds the new snapshot first and only takes the write lock
//! for the swap, so readers never observe a partially built table.
//!
//! An explicit [`AffinityMapper::refresh`] always installs what the cluster
//! reports. Refreshes between retry attempts keep a newer installed table.

use std::sync::Arc;

use gridcache_core::protocol::partition_for;
use gridcache_core::{GridError, NodeId, Result};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::transport::{PartitionTable, Transport};

/// A fully populated partition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityMapping {
    version: i64,
    owners: Vec<NodeId>,
}

impl AffinityMapping {
    /// Validates a partition table and turns it into a mapping.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the partition count is not positive or the
    /// owner list does not hold exactly one owner per partition.
    pub fn from_table(table: PartitionTable) -> Result<Self> {
        let count = table.partition_count();
        if count <= 0 {
            return Err(GridError::Protocol(format!(
                "partition table declares {count} partitions"
            )));
        }
        if table.owners().len() != count as usize {
            return Err(GridError::Protocol(format!(
                "partition table declares {} partitions but lists {} owners",
                count,
                table.owners().len()
            )));
        }

        Ok(Self {
            version: table.version(),
            owners: table.into_owners(),
        })
    }

    /// Returns the topology version.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the number of partitions.
    pub fn partition_count(&self) -> i32 {
        self.owners.len() as i32
    }

    /// Returns the partition an affinity key falls into.
    pub fn partition_of(&self, affinity_key: &[u8]) -> i32 {
        // The count is validated positive on construction.
        partition_for(affinity_key, self.partition_count()).unwrap_or(0)
    }

    /// Returns the owner of a partition.
    pub fn owner_of(&self, partition: i32) -> Option<NodeId> {
        usize::try_from(partition)
            .ok()
            .and_then(|p| self.owners.get(p))
            .copied()
    }

    /// Returns the node that owns the partition of an affinity key.
    pub fn owner_for(&self, affinity_key: &[u8]) -> Option<NodeId> {
        self.owner_of(self.partition_of(affinity_key))
    }

    /// Returns the distinct owners, sorted.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.owners.clone();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

/// Maps affinity keys of one cache to the nodes that own them.
#[derive(Debug)]
pub struct AffinityMapper {
    cache_id: i32,
    transport: Arc<dyn Transport>,
    mapping: RwLock<Option<Arc<AffinityMapping>>>,
}

impl AffinityMapper {
    /// Creates an unloaded mapper for the cache with the given id.
    pub fn new(cache_id: i32, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache_id,
            transport,
            mapping: RwLock::new(None),
        }
    }

    /// Returns the owner of the key's partition, or `None` if no mapping has
    /// been loaded.
    pub async fn lookup(&self, affinity_key: &[u8]) -> Option<NodeId> {
        self.snapshot().await?.owner_for(affinity_key)
    }

    /// Fetches the current partition table and installs it unconditionally.
    ///
    /// The table replaces the installed one whatever its version, so a
    /// cluster whose version counter restarted is picked up. On failure the
    /// previous mapping stays in place.
    #[instrument(
        name = "affinity_mapper.refresh",
        skip(self),
        fields(cache_id = self.cache_id),
        level = "debug"
    )]
    pub async fn refresh(&self) -> Result<()> {
        self.load(false).await.map(|_| ())
    }

    /// Fetches the current partition table and installs it unless it is older
    /// than the installed one.
    ///
    /// Returns `true` if the table was installed. Used between attempts of an
    /// operation, where concurrent refreshes must not move the mapping
    /// backwards.
    #[instrument(
        name = "affinity_mapper.refresh_if_newer",
        skip(self),
        fields(cache_id = self.cache_id),
        level = "debug"
    )]
    pub(crate) async fn refresh_if_newer(&self) -> Result<bool> {
        self.load(true).await
    }

    async fn load(&self, keep_newer: bool) -> Result<bool> {
        let table = self.transport.partition_table(self.cache_id).await?;
        let mapping = Arc::new(AffinityMapping::from_table(table)?);

        let mut current = self.mapping.write().await;
        if let Some(installed) = current.as_ref() {
            if keep_newer && installed.version() > mapping.version() {
                tracing::debug!(
                    installed = installed.version(),
                    received = mapping.version(),
                    "ignoring stale partition table"
                );
                return Ok(false);
            }
        }

        tracing::debug!(
            version = mapping.version(),
            partition_count = mapping.partition_count(),
            "installed partition table"
        );
        *current = Some(mapping);
        Ok(true)
    }

    /// Returns the distinct owners of the current mapping, sorted; empty if
    /// unloaded.
    pub async fn node_set(&self) -> Vec<NodeId> {
        self.snapshot()
            .await
            .map(|mapping| mapping.nodes())
            .unwrap_or_default()
    }

    /// Returns the current mapping.
    pub async fn snapshot(&self) -> Option<Arc<AffinityMapping>> {
        self.mapping.read().await.clone()
    }

    /// Returns the version of the current mapping.
    pub async fn version(&self) -> Option<i64> {
        self.snapshot().await.map(|m| m.version())
    }

    /// Returns the partition count of the current mapping.
    pub async fn partition_count(&self) -> Option<i32> {
        self.snapshot().await.map(|m| m.partition_count())
    }

    /// Returns `true` once a mapping has been installed.
    pub async fn is_loaded(&self) -> bool {
        self.mapping.read().await.is_some()
    }

    /// Drops the current mapping.
    pub async fn clear(&self) {
        *self.mapping.write().await = None;
    }
}
