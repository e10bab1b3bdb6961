//! Operation payloads and response decoding.
//!
//! Every cache operation pairs one payload type with one response type; the
//! invocation helper is generic over both, so each call site fixes the wire
//! shape at compile time.

use bytes::{BufMut, Bytes, BytesMut};
use gridcache_core::protocol::{put_section, PayloadReader, Response};
use gridcache_core::serialization::{ValueWriter, Writable, WritableKey};
use gridcache_core::{GridError, Result};

/// A request payload.
pub(crate) trait EncodePayload {
    /// Appends the payload bytes to `buf`.
    fn encode_payload(&self, buf: &mut BytesMut);

    /// Returns the bytes the target partition is derived from; `None` for
    /// operations that may go to any node.
    fn affinity_key(&self) -> Option<&Bytes> {
        None
    }

    /// Encodes the payload into a fresh buffer.
    fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_payload(&mut buf);
        buf.freeze()
    }
}

/// A decoded response.
pub(crate) trait DecodeResponse: Sized {
    /// Decodes a successful response.
    fn decode_response(response: Response) -> Result<Self>;
}

/// Serialized key with its affinity key.
#[derive(Debug, Clone)]
pub(crate) struct KeyPayload {
    key: Bytes,
    affinity: Bytes,
}

impl KeyPayload {
    pub(crate) fn new<K: WritableKey + ?Sized>(key: &K) -> Result<Self> {
        let bytes = key.key_bytes()?;
        let affinity = match key.affinity_key() {
            Some(explicit) => Bytes::from(explicit),
            None => bytes.clone(),
        };
        Ok(Self {
            key: bytes,
            affinity,
        })
    }
}

impl EncodePayload for KeyPayload {
    fn encode_payload(&self, buf: &mut BytesMut) {
        put_section(buf, &self.key);
    }

    fn affinity_key(&self) -> Option<&Bytes> {
        Some(&self.affinity)
    }
}

/// Serialized key followed by a serialized value.
#[derive(Debug, Clone)]
pub(crate) struct KeyValuePayload {
    key: KeyPayload,
    value: Bytes,
}

impl KeyValuePayload {
    pub(crate) fn new<K, V>(key: &K, value: &V) -> Result<Self>
    where
        K: WritableKey + ?Sized,
        V: Writable + ?Sized,
    {
        let key = KeyPayload::new(key)?;
        let mut output = ValueWriter::new();
        value.write_value(&mut output)?;
        Ok(Self {
            key,
            value: output.freeze(),
        })
    }
}

impl EncodePayload for KeyValuePayload {
    fn encode_payload(&self, buf: &mut BytesMut) {
        self.key.encode_payload(buf);
        put_section(buf, &self.value);
    }

    fn affinity_key(&self) -> Option<&Bytes> {
        self.key.affinity_key()
    }
}

/// Peek mode mask of a size request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PeekMask(pub(crate) i32);

impl EncodePayload for PeekMask {
    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.0);
    }
}

/// No payload.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Empty;

impl EncodePayload for Empty {
    fn encode_payload(&self, _buf: &mut BytesMut) {}
}

impl DecodeResponse for () {
    fn decode_response(_response: Response) -> Result<Self> {
        Ok(())
    }
}

impl DecodeResponse for bool {
    fn decode_response(response: Response) -> Result<Self> {
        Ok(response.is_present())
    }
}

impl DecodeResponse for i64 {
    fn decode_response(response: Response) -> Result<Self> {
        if !response.is_present() {
            return Err(GridError::Protocol(
                "expected a count, got an empty response".to_string(),
            ));
        }
        PayloadReader::new(response.payload()).i64()
    }
}

/// Value bytes of a lookup, `None` when the key is absent.
impl DecodeResponse for Option<Bytes> {
    fn decode_response(response: Response) -> Result<Self> {
        Ok(response.is_present().then(|| response.into_payload()))
    }
}
