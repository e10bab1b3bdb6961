//! Request envelope.

use std::sync::atomic::{AtomicI64, Ordering};

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use super::constants::*;
use super::opcode::OpCode;
use super::payload::{put_section, PayloadReader};
use crate::error::{GridError, Result};

/// Global request id counter.
static REQUEST_ID_COUNTER: AtomicI64 = AtomicI64::new(1);

/// Generates a unique request id.
pub fn next_request_id() -> i64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A cache operation request addressed to one node.
///
/// The header carries the opcode, a request id, the cache id and flags. The
/// affinity key is only present when the client could not resolve the target
/// node itself and leaves routing to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    opcode: OpCode,
    request_id: i64,
    cache_id: i32,
    binary: bool,
    affinity_key: Option<Bytes>,
    transaction_id: Option<Uuid>,
    payload: Bytes,
}

impl Request {
    /// Creates a request with a fresh request id.
    pub fn new(opcode: OpCode, cache_id: i32, binary: bool, payload: Bytes) -> Self {
        Self {
            opcode,
            request_id: next_request_id(),
            cache_id,
            binary,
            affinity_key: None,
            transaction_id: None,
            payload,
        }
    }

    /// Attaches the affinity key used for server-side routing.
    pub fn with_affinity_key(mut self, key: Bytes) -> Self {
        self.affinity_key = Some(key);
        self
    }

    /// Attaches the id of the transaction this operation is enlisted in.
    pub fn with_transaction(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Replaces the affinity key; `None` means the target was resolved.
    pub fn set_affinity_key(&mut self, key: Option<Bytes>) {
        self.affinity_key = key;
    }

    /// Returns the opcode.
    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Returns the request id.
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Returns the cache id.
    pub fn cache_id(&self) -> i32 {
        self.cache_id
    }

    /// Returns the binary-mode flag.
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    /// Returns the affinity key, if transmitted.
    pub fn affinity_key(&self) -> Option<&Bytes> {
        self.affinity_key.as_ref()
    }

    /// Returns the enlisted transaction id, if any.
    pub fn transaction_id(&self) -> Option<Uuid> {
        self.transaction_id
    }

    /// Returns the operation payload.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Returns the flags byte for the header.
    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.binary {
            flags |= FLAG_BINARY;
        }
        if self.affinity_key.is_some() {
            flags |= FLAG_AFFINITY_KEY;
        }
        if self.transaction_id.is_some() {
            flags |= FLAG_TRANSACTION;
        }
        flags
    }

    /// Encodes this request into its wire form.
    pub fn encode(&self) -> Bytes {
        let affinity_len = self
            .affinity_key
            .as_ref()
            .map_or(0, |k| LENGTH_FIELD_SIZE + k.len());
        let tx_len = if self.transaction_id.is_some() {
            TRANSACTION_ID_SIZE
        } else {
            0
        };
        let mut buf = BytesMut::with_capacity(
            REQUEST_HEADER_SIZE + affinity_len + tx_len + LENGTH_FIELD_SIZE + self.payload.len(),
        );

        buf.put_i16_le(self.opcode.value());
        buf.put_i64_le(self.request_id);
        buf.put_i32_le(self.cache_id);
        buf.put_u8(self.flags());
        if let Some(key) = &self.affinity_key {
            put_section(&mut buf, key);
        }
        if let Some(tx) = &self.transaction_id {
            buf.put_slice(tx.as_bytes());
        }
        put_section(&mut buf, &self.payload);
        buf.freeze()
    }

    /// Decodes a request from its wire form.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < REQUEST_HEADER_SIZE {
            return Err(GridError::Protocol(format!(
                "request too short: {} bytes",
                data.len()
            )));
        }

        let opcode_value = i16::from_le_bytes([data[0], data[1]]);
        let opcode = OpCode::from_value(opcode_value)
            .ok_or_else(|| GridError::Protocol(format!("unknown opcode: {opcode_value}")))?;

        let mut reader = PayloadReader::new(&data[2..]);
        let request_id = reader.i64()?;
        let cache_id = reader.i32()?;
        let flags = reader.bytes(1)?[0];

        let affinity_key = if flags & FLAG_AFFINITY_KEY != 0 {
            Some(Bytes::copy_from_slice(reader.section()?))
        } else {
            None
        };
        let transaction_id = if flags & FLAG_TRANSACTION != 0 {
            let raw: [u8; TRANSACTION_ID_SIZE] = reader
                .bytes(TRANSACTION_ID_SIZE)?
                .try_into()
                .map_err(|_| GridError::Protocol("invalid transaction id".to_string()))?;
            Some(Uuid::from_bytes(raw))
        } else {
            None
        };
        let payload = Bytes::copy_from_slice(reader.section()?);

        Ok(Self {
            opcode,
            request_id,
            cache_id,
            binary: flags & FLAG_BINARY != 0,
            affinity_key,
            transaction_id,
            payload,
        })
    }
}
