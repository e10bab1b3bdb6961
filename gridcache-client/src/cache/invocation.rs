//! Request dispatch with target resolution, retry and backoff.

use std::time::Duration;

use bytes::Bytes;
use gridcache_core::protocol::{OpCode, Request, Response};
use gridcache_core::{GridError, NodeId, Result};
use rand::Rng;
use uuid::Uuid;

use super::payload::{DecodeResponse, EncodePayload};
use super::CacheClient;

/// Computes the next backoff: the current one grown by `multiplier`, spread by
/// up to `jitter` in either direction and capped at `max_backoff`.
pub(crate) fn calculate_backoff_with_jitter(
    current_backoff: Duration,
    multiplier: f64,
    max_backoff: Duration,
    jitter: f64,
) -> Duration {
    let base_backoff = current_backoff.as_secs_f64() * multiplier;

    let jitter_factor = if jitter > 0.0 {
        let mut rng = rand::thread_rng();
        1.0 + rng.gen_range(-jitter..=jitter)
    } else {
        1.0
    };

    let jittered_backoff = base_backoff * jitter_factor;

    std::cmp::min(
        Duration::try_from_secs_f64(jittered_backoff).unwrap_or(max_backoff),
        max_backoff,
    )
}

/// Pause schedule between attempts of one operation.
#[derive(Debug)]
pub(crate) struct Backoff {
    next: Duration,
    multiplier: f64,
    max: Duration,
    jitter: f64,
}

impl Backoff {
    pub(crate) fn new(client: &CacheClient) -> Self {
        let retry = client.config.retry();
        Self {
            next: retry.initial_backoff(),
            multiplier: retry.multiplier(),
            max: retry.max_backoff(),
            jitter: retry.jitter(),
        }
    }

    /// Sleeps for the current pause, if any, and grows the next one.
    pub(crate) async fn wait(&mut self) {
        if self.next.is_zero() {
            return;
        }
        tokio::time::sleep(self.next).await;
        self.next = calculate_backoff_with_jitter(self.next, self.multiplier, self.max, self.jitter);
    }
}

impl CacheClient {
    /// Sends an operation and decodes its response, retrying transient
    /// failures.
    ///
    /// Keyed operations refresh the affinity mapping once, before the first
    /// retry, and recompute the target on every attempt. Keyless operations
    /// retry against any node without refreshing. At most `max_attempts`
    /// attempts are made; the last error is returned once they run out.
    pub(crate) async fn invoke<P, R>(&self, opcode: OpCode, payload: &P) -> Result<R>
    where
        P: EncodePayload,
        R: DecodeResponse,
    {
        self.stats.record_operation();
        let result = self.invoke_with_retry(opcode, payload).await;
        if result.is_err() {
            self.stats.record_failure();
        }
        result
    }

    async fn invoke_with_retry<P, R>(&self, opcode: OpCode, payload: &P) -> Result<R>
    where
        P: EncodePayload,
        R: DecodeResponse,
    {
        let transaction = self.enlist(opcode).await?;
        let affinity = payload.affinity_key();
        let body = payload.to_payload();
        let max_attempts = self.config.retry().max_attempts();
        let mut backoff = Backoff::new(self);
        let mut refreshed = false;
        let mut attempt = 1;

        loop {
            let target = match affinity {
                Some(key) => self.resolve_target(key).await,
                None => None,
            };
            // The affinity key only travels when the server has to route.
            let routing_key = if target.is_none() { affinity.cloned() } else { None };

            match self
                .send_to(opcode, target, routing_key, transaction, body.clone())
                .await
            {
                Ok(response) => return R::decode_response(response),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        cache = %self.identity.name(),
                        %opcode,
                        attempt,
                        node = ?target,
                        error = %err,
                        "retrying operation"
                    );
                    self.stats.record_retry();
                    if affinity.is_some() && !refreshed {
                        refreshed = true;
                        self.refresh_for_retry().await;
                    }
                    backoff.wait().await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Performs a single exchange and converts error statuses into errors.
    ///
    /// Every call builds a request with a fresh request id.
    pub(crate) async fn send_to(
        &self,
        opcode: OpCode,
        target: Option<NodeId>,
        affinity_key: Option<Bytes>,
        transaction: Option<Uuid>,
        payload: Bytes,
    ) -> Result<Response> {
        let mut request = Request::new(opcode, self.identity.id(), self.identity.is_binary(), payload);
        request.set_affinity_key(affinity_key);
        if let Some(tx) = transaction {
            request = request.with_transaction(tx);
        }

        let exchange = self.transport.send(target, request.encode());
        let raw = match self.config.operation_timeout() {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                GridError::timeout(target, format!("{opcode} did not complete within {limit:?}"))
            })?,
            None => exchange.await,
        }
        .map_err(|e| e.with_node(target))?;

        let response = Response::decode(&raw)?;
        if response.request_id() != request.request_id() {
            return Err(GridError::Protocol(format!(
                "response id {} does not match request id {}",
                response.request_id(),
                request.request_id()
            )));
        }
        response.into_result(target)
    }

    /// Picks the node a keyed request goes to; `None` sends it to any node.
    pub(crate) async fn resolve_target(&self, affinity_key: &[u8]) -> Option<NodeId> {
        if !self.config.partition_aware() {
            return None;
        }

        let Some(owner) = self.mapper.lookup(affinity_key).await else {
            tracing::trace!(cache = %self.identity.name(), "no affinity mapping, routing to any node");
            return None;
        };

        if self.transport.is_connected(owner).await {
            tracing::trace!(cache = %self.identity.name(), node = %owner, "routing to partition owner");
            Some(owner)
        } else {
            tracing::debug!(
                cache = %self.identity.name(),
                node = %owner,
                "partition owner not connected, routing to any node"
            );
            None
        }
    }

    /// Refreshes the mapping between attempts; a failure or an older table
    /// keeps the previous mapping.
    pub(crate) async fn refresh_for_retry(&self) {
        match self.mapper.refresh_if_newer().await {
            Ok(true) => self.stats.record_refresh(),
            Ok(false) => {}
            Err(err) => tracing::warn!(
                cache = %self.identity.name(),
                error = %err,
                "affinity refresh failed, retrying with the previous mapping"
            ),
        }
    }

    /// Enlists a transactional operation in the caller's active transaction.
    async fn enlist(&self, opcode: OpCode) -> Result<Option<Uuid>> {
        if !opcode.is_transactional() {
            return Ok(None);
        }
        let Some(hook) = &self.transactions else {
            return Ok(None);
        };
        let Some(tx) = hook.current_transaction() else {
            return Ok(None);
        };

        hook.enlist(tx, &self.identity, opcode).await?;
        tracing::debug!(cache = %self.identity.name(), %opcode, transaction = %tx, "enlisted operation");
        Ok(Some(tx))
    }
}
