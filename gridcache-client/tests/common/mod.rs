//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use gridcache_client::{ClientConfig, GridClient, GridError, NodeId, PartitionTable, Result, Transport};
use gridcache_core::protocol::{
    partition_for, OpCode, PayloadReader, Request, Response, ERROR_NODE_UNAVAILABLE,
    ERROR_TOPOLOGY_MISMATCH,
};
use uuid::Uuid;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_name(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", prefix, std::process::id(), id)
}

/// Installs a test subscriber once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn connect(cluster: &Arc<SimulatedCluster>) -> GridClient {
    connect_with_config(cluster, ClientConfig::default())
}

pub fn connect_with_config(cluster: &Arc<SimulatedCluster>, config: ClientConfig) -> GridClient {
    init_tracing();
    GridClient::new(Arc::clone(cluster) as Arc<dyn Transport>, config)
}

/// A request as the cluster received it.
#[derive(Debug, Clone)]
pub struct Received {
    pub target: Option<NodeId>,
    pub handled_by: Option<NodeId>,
    pub opcode: OpCode,
    pub affinity_key: Option<Bytes>,
    pub transaction_id: Option<Uuid>,
}

/// A canned answer for the next request.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Answer with an error status.
    Status { recoverable: bool, code: i32 },
    /// Fail the exchange as if the connection broke.
    Disconnect,
}

#[derive(Debug, Default)]
struct ClusterState {
    nodes: Vec<NodeId>,
    owners: Vec<NodeId>,
    version: i64,
    unreachable: HashSet<NodeId>,
    entries: HashMap<i32, HashMap<Vec<u8>, Bytes>>,
    affinities: HashMap<Vec<u8>, Vec<u8>>,
    faults: VecDeque<Fault>,
    table_failures: u32,
    received: Vec<Received>,
}

impl ClusterState {
    /// Bytes a stored key is partitioned by.
    fn routing_key<'a>(&'a self, key: &'a [u8]) -> &'a [u8] {
        self.affinities.get(key).map_or(key, Vec::as_slice)
    }
}

/// In-memory cluster speaking the request/response protocol.
///
/// Entries live in one shared store; a node "holds" the entries whose key
/// falls into a partition it owns, so reassigning partitions moves data
/// without copying. A request addressed to a node that does not own the key's
/// partition is answered with a recoverable topology mismatch, exactly like a
/// real node after a rebalance.
#[derive(Debug)]
pub struct SimulatedCluster {
    state: Mutex<ClusterState>,
}

impl SimulatedCluster {
    /// Creates `node_count` nodes owning `partition_count` partitions round
    /// robin.
    pub fn new(node_count: usize, partition_count: usize) -> Arc<Self> {
        let nodes: Vec<NodeId> = (0..node_count).map(|_| Uuid::new_v4()).collect();
        let owners = (0..partition_count).map(|p| nodes[p % node_count]).collect();
        Arc::new(Self {
            state: Mutex::new(ClusterState {
                nodes,
                owners,
                version: 1,
                ..Default::default()
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().expect("cluster state poisoned")
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.state().nodes.clone()
    }

    pub fn node(&self, index: usize) -> NodeId {
        self.state().nodes[index]
    }

    pub fn owners(&self) -> Vec<NodeId> {
        self.state().owners.clone()
    }

    pub fn version(&self) -> i64 {
        self.state().version
    }

    /// Replaces the whole partition assignment and bumps the version.
    pub fn assign(&self, owners: Vec<NodeId>) {
        let mut state = self.state();
        state.owners = owners;
        state.version += 1;
    }

    /// Replaces the partition assignment and restarts the version counter,
    /// as a cluster does after a full restart.
    pub fn restart(&self, owners: Vec<NodeId>) {
        let mut state = self.state();
        state.owners = owners;
        state.version = 1;
    }

    /// Moves every partition owned by `from` to `to` and bumps the version.
    pub fn migrate(&self, from: NodeId, to: NodeId) {
        let mut state = self.state();
        for owner in state.owners.iter_mut().filter(|o| **o == from) {
            *owner = to;
        }
        state.version += 1;
    }

    pub fn set_unreachable(&self, node: NodeId, unreachable: bool) {
        let mut state = self.state();
        if unreachable {
            state.unreachable.insert(node);
        } else {
            state.unreachable.remove(&node);
        }
    }

    /// Declares the affinity key of a key, mirroring the server-side
    /// knowledge of a key type's affinity field.
    pub fn register_affinity(&self, key: &[u8], affinity: &[u8]) {
        self.state()
            .affinities
            .insert(key.to_vec(), affinity.to_vec());
    }

    /// Queues a fault consumed by the next request.
    pub fn inject(&self, fault: Fault) {
        self.state().faults.push_back(fault);
    }

    /// Makes the next `count` partition table fetches fail.
    pub fn fail_table_fetches(&self, count: u32) {
        self.state().table_failures = count;
    }

    pub fn received(&self) -> Vec<Received> {
        self.state().received.clone()
    }

    pub fn received_with(&self, opcode: OpCode) -> Vec<Received> {
        self.received()
            .into_iter()
            .filter(|r| r.opcode == opcode)
            .collect()
    }

    pub fn clear_received(&self) {
        self.state().received.clear();
    }

    pub fn entry_count(&self, cache_id: i32) -> usize {
        self.state().entries.get(&cache_id).map_or(0, HashMap::len)
    }

    fn handle(&self, target: Option<NodeId>, request: &Request) -> Result<Response> {
        let mut state = self.state();
        let id = request.request_id();
        let key = key_of(request)?;

        let handled_by = match target {
            Some(node) => Some(node).filter(|n| !state.unreachable.contains(n)),
            None => state
                .nodes
                .iter()
                .find(|n| !state.unreachable.contains(*n))
                .copied(),
        };
        state.received.push(Received {
            target,
            handled_by,
            opcode: request.opcode(),
            affinity_key: request.affinity_key().cloned(),
            transaction_id: request.transaction_id(),
        });

        let Some(node) = handled_by else {
            return Err(GridError::connection(target, "node unreachable"));
        };

        if let Some(fault) = state.faults.pop_front() {
            return match fault {
                Fault::Status { recoverable, code } => {
                    Ok(Response::error(id, recoverable, code, "injected fault"))
                }
                Fault::Disconnect => Err(GridError::connection(Some(node), "connection reset")),
            };
        }

        if let Some(key) = &key {
            let partition_count = state.owners.len() as i32;
            let routing = match request.affinity_key() {
                Some(affinity) => affinity.as_ref(),
                None => state.routing_key(key),
            };
            let owner = partition_for(routing, partition_count)
                .map(|p| state.owners[p as usize])
                .ok_or_else(|| GridError::Protocol("cluster has no partitions".into()))?;

            if target.is_some() && owner != node {
                return Ok(Response::error(
                    id,
                    true,
                    ERROR_TOPOLOGY_MISMATCH,
                    format!("node {node} does not own the partition"),
                ));
            }
            if state.unreachable.contains(&owner) {
                return Ok(Response::error(
                    id,
                    true,
                    ERROR_NODE_UNAVAILABLE,
                    format!("owner {owner} unreachable"),
                ));
            }
        }

        let cache_id = request.cache_id();
        let response = match request.opcode() {
            OpCode::Put => {
                let mut reader = PayloadReader::new(request.payload());
                let key = reader.section()?.to_vec();
                let value = Bytes::copy_from_slice(reader.section()?);
                state.entries.entry(cache_id).or_default().insert(key, value);
                Response::success(id, Bytes::new())
            }
            OpCode::Get | OpCode::LocalPeek => {
                match state
                    .entries
                    .get(&cache_id)
                    .and_then(|e| e.get(key.as_deref().unwrap_or_default()))
                {
                    Some(value) => Response::success(id, value.clone()),
                    None => Response::absent(id),
                }
            }
            OpCode::ContainsKey => {
                let present = state
                    .entries
                    .get(&cache_id)
                    .is_some_and(|e| e.contains_key(key.as_deref().unwrap_or_default()));
                Response::flag(id, present)
            }
            OpCode::Remove | OpCode::ClearKey => {
                let removed = state
                    .entries
                    .get_mut(&cache_id)
                    .and_then(|e| e.remove(key.as_deref().unwrap_or_default()))
                    .is_some();
                if request.opcode() == OpCode::Remove {
                    Response::flag(id, removed)
                } else {
                    Response::success(id, Bytes::new())
                }
            }
            OpCode::RemoveAll | OpCode::ClearAll => {
                state.entries.remove(&cache_id);
                Response::success(id, Bytes::new())
            }
            OpCode::GetSize => {
                let mask = PayloadReader::new(request.payload()).i32()?;
                let count = if mask & 0x05 != 0 {
                    let partition_count = state.owners.len() as i32;
                    state.entries.get(&cache_id).map_or(0, |entries| {
                        entries
                            .keys()
                            .filter(|k| {
                                partition_for(state.routing_key(k), partition_count)
                                    .is_some_and(|p| state.owners[p as usize] == node)
                            })
                            .count()
                    })
                } else {
                    0
                };
                Response::success(id, Bytes::copy_from_slice(&(count as i64).to_le_bytes()))
            }
            OpCode::RefreshAffinity => Response::success(id, Bytes::new()),
        };
        Ok(response)
    }
}

fn key_of(request: &Request) -> Result<Option<Vec<u8>>> {
    if !request.opcode().is_keyed() {
        return Ok(None);
    }
    let mut reader = PayloadReader::new(request.payload());
    Ok(Some(reader.section()?.to_vec()))
}

#[async_trait]
impl Transport for SimulatedCluster {
    async fn send(&self, target: Option<NodeId>, request: Bytes) -> Result<Bytes> {
        let request = Request::decode(&request)?;
        tokio::task::yield_now().await;
        self.handle(target, &request).map(|r| r.encode())
    }

    async fn partition_table(&self, _cache_id: i32) -> Result<PartitionTable> {
        let mut state = self.state();
        if state.table_failures > 0 {
            state.table_failures -= 1;
            return Err(GridError::connection(None, "partition table unavailable"));
        }
        Ok(PartitionTable::from_owners(state.version, state.owners.clone()))
    }

    async fn known_nodes(&self) -> Result<Vec<NodeId>> {
        Ok(self.state().nodes.clone())
    }

    async fn is_connected(&self, node: NodeId) -> bool {
        !self.state().unreachable.contains(&node)
    }
}
