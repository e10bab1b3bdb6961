//! Cluster-wide entry count.

use futures::future::join_all;
use gridcache_core::protocol::OpCode;
use gridcache_core::{GridError, NodeId, Result};

use super::invocation::Backoff;
use super::payload::{DecodeResponse, EncodePayload, PeekMask};
use super::{CacheClient, PeekMode};

impl CacheClient {
    /// Counts entries on every node and sums them.
    ///
    /// Each round queries all nodes concurrently. A fatal error on any node
    /// ends the operation with that error. Transient failures refresh the
    /// affinity mapping once and rerun the round; once `max_attempts` rounds
    /// have failed the result is [`GridError::NodesUnavailable`] naming the
    /// nodes of the last round that did not answer. A partial sum is never
    /// returned.
    pub(crate) async fn aggregate_size(&self, modes: PeekMode) -> Result<i64> {
        let max_rounds = self.config.retry().max_attempts();
        let mut backoff = Backoff::new(self);
        let mut nodes = self.size_targets().await?;
        let mut refreshed = false;
        let mut round = 1;

        loop {
            let requests = nodes.iter().map(|&node| self.node_size(node, modes));
            let results = join_all(requests).await;

            let mut total: i64 = 0;
            let mut failed = Vec::new();
            let mut last_error = None;
            for (&node, result) in nodes.iter().zip(results) {
                match result {
                    Ok(count) => {
                        total = add_count(total, count, node)?;
                    }
                    Err(err) if err.is_retryable() => {
                        failed.push(node);
                        last_error = Some(err);
                    }
                    Err(err) => return Err(err),
                }
            }

            let Some(source) = last_error else {
                tracing::debug!(nodes = nodes.len(), total, "aggregated size");
                return Ok(total);
            };

            if round >= max_rounds {
                return Err(GridError::NodesUnavailable {
                    nodes: failed,
                    source: Box::new(source),
                });
            }

            tracing::warn!(
                cache = %self.identity.name(),
                round,
                failed = ?failed,
                error = %source,
                "size round incomplete, retrying"
            );
            self.stats.record_retry();
            if !refreshed {
                refreshed = true;
                self.refresh_for_retry().await;
                nodes = self.size_targets().await?;
            }
            backoff.wait().await;
            round += 1;
        }
    }

    /// Nodes a size request fans out to: the owners of the current mapping,
    /// or every known node when no mapping is loaded.
    async fn size_targets(&self) -> Result<Vec<NodeId>> {
        let mut nodes = self.mapper.node_set().await;
        if nodes.is_empty() {
            nodes = self.transport.known_nodes().await?;
            nodes.sort_unstable();
            nodes.dedup();
        }
        if nodes.is_empty() {
            return Err(GridError::connection(None, "no nodes available"));
        }
        Ok(nodes)
    }

    async fn node_size(&self, node: NodeId, modes: PeekMode) -> Result<i64> {
        let response = self
            .send_to(
                OpCode::GetSize,
                Some(node),
                None,
                None,
                PeekMask(modes.bits()).to_payload(),
            )
            .await?;
        i64::decode_response(response)
    }
}

/// Adds one node's count to the running total.
fn add_count(total: i64, count: i64, node: NodeId) -> Result<i64> {
    if count < 0 {
        return Err(GridError::Protocol(format!(
            "node {node} reported a negative entry count {count}"
        )));
    }
    total.checked_add(count).ok_or_else(|| {
        GridError::Protocol(format!("entry count overflows after adding {count} from node {node}"))
    })
}
