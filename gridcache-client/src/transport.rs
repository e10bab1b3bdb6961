//! The seam between cache clients and the cluster connections.
//!
//! Connection establishment, handshakes, pooling and discovery live behind
//! [`Transport`]. Cache clients only hand it encoded requests and read back
//! encoded responses.

use async_trait::async_trait;
use bytes::Bytes;
use gridcache_core::{NodeId, Result};

/// Partition table of one cache as reported by the cluster.
///
/// `owners[p]` is the node that owns partition `p`. A table is only usable
/// when `owners` holds exactly `partition_count` entries; the affinity mapper
/// validates this before installing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    version: i64,
    partition_count: i32,
    owners: Vec<NodeId>,
}

impl PartitionTable {
    /// Creates a table.
    pub fn new(version: i64, partition_count: i32, owners: Vec<NodeId>) -> Self {
        Self {
            version,
            partition_count,
            owners,
        }
    }

    /// Creates a table whose partition count is the number of owners.
    pub fn from_owners(version: i64, owners: Vec<NodeId>) -> Self {
        let partition_count = i32::try_from(owners.len()).unwrap_or(i32::MAX);
        Self::new(version, partition_count, owners)
    }

    /// Returns the topology version the table was taken at.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the declared number of partitions.
    pub fn partition_count(&self) -> i32 {
        self.partition_count
    }

    /// Returns the owner of every partition, indexed by partition.
    pub fn owners(&self) -> &[NodeId] {
        &self.owners
    }

    pub(crate) fn into_owners(self) -> Vec<NodeId> {
        self.owners
    }
}

/// Request/response exchange with cluster nodes.
///
/// The transport is shared by every cache client of a [`GridClient`] and is
/// never closed by them.
///
/// [`GridClient`]: crate::GridClient
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends an encoded request and waits for the encoded response.
    ///
    /// `target` names the node to send to; `None` lets the transport pick any
    /// connected node.
    ///
    /// # Errors
    ///
    /// Fails with `Connection` or `Timeout` when the exchange cannot complete.
    /// Error statuses carried inside a response are not errors at this level.
    async fn send(&self, target: Option<NodeId>, request: Bytes) -> Result<Bytes>;

    /// Fetches the current partition table of a cache.
    async fn partition_table(&self, cache_id: i32) -> Result<PartitionTable>;

    /// Returns every node the transport knows about.
    async fn known_nodes(&self) -> Result<Vec<NodeId>>;

    /// Returns `true` if a connection to `node` is currently open.
    async fn is_connected(&self, _node: NodeId) -> bool {
        true
    }
}
