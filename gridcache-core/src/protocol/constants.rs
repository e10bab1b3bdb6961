//! Protocol constants for the gridcache request/response envelopes.

/// Size of the request header: opcode, request id, cache id and flags.
pub const REQUEST_HEADER_SIZE: usize = 2 + 8 + 4 + 1;

/// Size of the response header: request id and status.
pub const RESPONSE_HEADER_SIZE: usize = 8 + 1;

/// Size of a length prefix.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Size of a transaction id on the wire.
pub const TRANSACTION_ID_SIZE: usize = 16;

// Request flags.

/// The cache works with binary objects and must not deserialize them.
pub const FLAG_BINARY: u8 = 1;

/// An affinity key follows the header.
pub const FLAG_AFFINITY_KEY: u8 = 1 << 1;

/// A transaction id follows the header (and the affinity key, if any).
pub const FLAG_TRANSACTION: u8 = 1 << 2;

// Response statuses.

/// The operation succeeded and carries a result.
pub const STATUS_SUCCESS: u8 = 0;

/// The operation succeeded with a "no value" outcome (missing key, `false`).
pub const STATUS_ABSENT: u8 = 1;

/// The operation failed but may succeed when retried.
pub const STATUS_RECOVERABLE_ERROR: u8 = 2;

/// The operation failed and must not be retried.
pub const STATUS_FATAL_ERROR: u8 = 3;

// Error codes.

/// Unclassified server failure.
pub const ERROR_GENERIC: i32 = 1;

/// The addressed cache does not exist.
pub const ERROR_CACHE_NOT_FOUND: i32 = 1000;

/// A cache with the given name already exists.
pub const ERROR_CACHE_EXISTS: i32 = 1001;

/// The caller lacks permission for the operation.
pub const ERROR_ACCESS_DENIED: i32 = 2100;

/// The server could not read the key or value bytes.
pub const ERROR_SERIALIZATION: i32 = 3000;

/// A server-side constraint rejected the operation.
pub const ERROR_CONSTRAINT_VIOLATION: i32 = 4000;

/// The node does not own the partition the request was routed by.
pub const ERROR_TOPOLOGY_MISMATCH: i32 = 5000;

/// The node could not reach the partition owner while forwarding.
pub const ERROR_NODE_UNAVAILABLE: i32 = 5001;
