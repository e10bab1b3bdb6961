//! Core types for the gridcache client.
//!
//! This crate holds the pieces shared by every transport: the error type, the
//! request/response wire protocol with its partition hashing, and the key and
//! value serialization contracts.

#![warn(missing_docs)]

pub mod error;
pub mod protocol;
pub mod serialization;

pub use error::{GridError, Result};
pub use serialization::{
    AffinityKeyed, DataInput, DataOutput, Deserializable, Readable, Serializable, ValueReader,
    ValueWriter, Writable, WritableKey,
};

/// Identifier of a cluster node.
pub type NodeId = uuid::Uuid;
