//! Binary request/response protocol spoken between the client and cluster
//! nodes.
//!
//! Every request starts with a fixed header (opcode, request id, cache id,
//! flags) followed by optional routing sections and the operation payload.
//! Every response carries the request id, a status and either a payload or a
//! structured error.

pub mod constants;
mod hash;
mod opcode;
mod payload;
mod request;
mod response;

pub use constants::*;
pub use hash::{cache_id, partition_for, partition_hash};
pub use opcode::OpCode;
pub use payload::{put_section, PayloadReader};
pub use request::{next_request_id, Request};
pub use response::{ErrorDescription, Response, ResponseStatus};
