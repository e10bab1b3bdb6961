//! Entry point that hands out cache clients over one shared transport.

use std::sync::Arc;

use gridcache_core::protocol::cache_id;

use crate::cache::{CacheClient, CacheIdentity};
use crate::config::ClientConfig;
use crate::transaction::TransactionEnlistment;
use crate::transport::Transport;

/// Creates [`CacheClient`]s that share one transport and one configuration.
#[derive(Debug, Clone)]
pub struct GridClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    transactions: Option<Arc<dyn TransactionEnlistment>>,
}

impl GridClient {
    /// Creates a client over `transport`.
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            transactions: None,
        }
    }

    /// Installs a transaction enlistment hook on every cache created
    /// afterwards.
    pub fn with_transactions(mut self, hook: Arc<dyn TransactionEnlistment>) -> Self {
        self.transactions = Some(hook);
        self
    }

    /// Returns a client for the cache `name`, its id derived from the name.
    pub fn cache(&self, name: &str) -> CacheClient {
        self.create(CacheIdentity::new(name, cache_id(name), false))
    }

    /// Returns a client for a cache with an explicit id.
    pub fn cache_with_id(&self, name: &str, id: i32) -> CacheClient {
        self.create(CacheIdentity::new(name, id, false))
    }

    /// Returns a client for the cache `name` that keeps values in binary form.
    pub fn binary_cache(&self, name: &str) -> CacheClient {
        self.create(CacheIdentity::new(name, cache_id(name), true))
    }

    /// Returns the shared transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn create(&self, identity: CacheIdentity) -> CacheClient {
        tracing::debug!(cache = %identity, binary = identity.is_binary(), "creating cache client");
        let cache = CacheClient::new(identity, Arc::clone(&self.transport), Arc::clone(&self.config));
        match &self.transactions {
            Some(hook) => cache.with_transactions(Arc::clone(hook)),
            None => cache,
        }
    }
}
