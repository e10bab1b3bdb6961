//! Error types for gridcache operations.

use std::io;

use thiserror::Error;

use crate::protocol::{
    ERROR_ACCESS_DENIED, ERROR_CACHE_EXISTS, ERROR_CACHE_NOT_FOUND, ERROR_CONSTRAINT_VIOLATION,
    ERROR_NODE_UNAVAILABLE, ERROR_SERIALIZATION, ERROR_TOPOLOGY_MISMATCH,
};
use crate::NodeId;

/// The main error type for gridcache operations.
///
/// Variants fall into two classes. Transient failures ([`Connection`],
/// [`Timeout`], [`TopologyMismatch`]) are retried by the cache client; all
/// other variants are surfaced to the caller immediately.
///
/// [`Connection`]: GridError::Connection
/// [`Timeout`]: GridError::Timeout
/// [`TopologyMismatch`]: GridError::TopologyMismatch
#[derive(Debug, Error)]
pub enum GridError {
    /// The target node could not be reached or the exchange broke off.
    #[error("connection error{}: {message}", node_suffix(.node))]
    Connection {
        /// The node the request was addressed to, if known.
        node: Option<NodeId>,
        /// Human readable cause.
        message: String,
    },

    /// The exchange did not complete within the transport timeout.
    #[error("timeout error{}: {message}", node_suffix(.node))]
    Timeout {
        /// The node the request was addressed to, if known.
        node: Option<NodeId>,
        /// Human readable cause.
        message: String,
    },

    /// The node no longer owns the partition the request was routed by.
    #[error("topology mismatch{}: {message}", node_suffix(.node))]
    TopologyMismatch {
        /// The node that rejected the request, if known.
        node: Option<NodeId>,
        /// Human readable cause.
        message: String,
    },

    /// A key or value could not be written or read.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The server rejected the operation (cache not found, access denied,
    /// constraint violation and so on).
    #[error("server error {code}: {message}")]
    Server {
        /// Server error code.
        code: i32,
        /// Server supplied description.
        message: String,
    },

    /// One or more nodes could not answer a cluster-wide request.
    #[error("nodes unavailable {nodes:?}: {source}")]
    NodesUnavailable {
        /// Every node whose sub-request failed.
        nodes: Vec<NodeId>,
        /// The last failure observed.
        source: Box<GridError>,
    },

    /// Malformed envelope or partition table.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn node_suffix(node: &Option<NodeId>) -> String {
    match node {
        Some(node) => format!(" (node {node})"),
        None => String::new(),
    }
}

impl GridError {
    /// Creates a connection error addressed to an optional node.
    pub fn connection(node: Option<NodeId>, message: impl Into<String>) -> Self {
        Self::Connection {
            node,
            message: message.into(),
        }
    }

    /// Creates a timeout error addressed to an optional node.
    pub fn timeout(node: Option<NodeId>, message: impl Into<String>) -> Self {
        Self::Timeout {
            node,
            message: message.into(),
        }
    }

    /// Creates a topology mismatch error addressed to an optional node.
    pub fn topology_mismatch(node: Option<NodeId>, message: impl Into<String>) -> Self {
        Self::TopologyMismatch {
            node,
            message: message.into(),
        }
    }

    /// Maps an error carried in a response envelope to a typed error.
    ///
    /// The code decides first: topology and node codes are transient, the
    /// serialization code maps to [`GridError::Serialization`] and the other
    /// known codes to [`GridError::Server`], whatever the status says. Only
    /// unrecognized codes fall back to the status.
    pub fn from_response(
        code: i32,
        message: impl Into<String>,
        recoverable: bool,
        node: Option<NodeId>,
    ) -> Self {
        let message = message.into();
        match code {
            ERROR_TOPOLOGY_MISMATCH => Self::TopologyMismatch { node, message },
            ERROR_NODE_UNAVAILABLE => Self::Connection { node, message },
            ERROR_SERIALIZATION => Self::Serialization(message),
            ERROR_CACHE_NOT_FOUND
            | ERROR_CACHE_EXISTS
            | ERROR_ACCESS_DENIED
            | ERROR_CONSTRAINT_VIOLATION => Self::Server { code, message },
            _ if recoverable => Self::Connection { node, message },
            _ => Self::Server { code, message },
        }
    }

    /// Returns `true` for failures the routing layer retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::TopologyMismatch { .. }
        )
    }

    /// Returns `true` if this error means a node could not be reached.
    pub fn is_node_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::NodesUnavailable { .. }
        )
    }

    /// Returns `true` if this is a topology mismatch.
    pub fn is_topology_mismatch(&self) -> bool {
        matches!(self, Self::TopologyMismatch { .. })
    }

    /// Returns the offending node, if one is known.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Connection { node, .. }
            | Self::Timeout { node, .. }
            | Self::TopologyMismatch { node, .. } => *node,
            Self::NodesUnavailable { nodes, .. } => nodes.first().copied(),
            _ => None,
        }
    }

    /// Fills in the offending node on transient errors that do not carry one.
    pub fn with_node(mut self, target: Option<NodeId>) -> Self {
        if let Self::Connection { node, .. }
        | Self::Timeout { node, .. }
        | Self::TopologyMismatch { node, .. } = &mut self
        {
            if node.is_none() {
                *node = target;
            }
        }
        self
    }
}

/// A specialized `Result` type for gridcache operations.
pub type Result<T> = std::result::Result<T, GridError>;
