//! Hook into an external transaction manager.
//!
//! Cache clients do not run transactions themselves. When a hook is installed
//! and reports an active transaction, `PUT`, `REMOVE` and `REMOVE_ALL` enlist
//! in it before sending and carry the transaction id in the request.

use async_trait::async_trait;
use gridcache_core::protocol::OpCode;
use gridcache_core::Result;
use uuid::Uuid;

use crate::cache::CacheIdentity;

/// Enlists cache operations in the caller's current transaction.
#[async_trait]
pub trait TransactionEnlistment: Send + Sync + std::fmt::Debug {
    /// Returns the id of the transaction active for the caller, if any.
    fn current_transaction(&self) -> Option<Uuid>;

    /// Registers `cache` as a participant of `transaction` for an operation.
    ///
    /// An error fails the operation before anything is sent.
    async fn enlist(&self, transaction: Uuid, cache: &CacheIdentity, opcode: OpCode) -> Result<()>;
}
