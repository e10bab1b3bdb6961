//! Key and value contracts the cache client serializes requests and decodes
//! responses through.
//!
//! A key writes its wire bytes and may name a different affinity key. When it
//! does, the partition is computed from the affinity key instead of the key
//! itself, which co-locates related entries on the same node.
//!
//! # Example
//!
//! ```
//! use gridcache_core::serialization::{DataOutput, ValueWriter, WritableKey};
//! use gridcache_core::Result;
//!
//! struct OrderKey {
//!     order_id: i64,
//!     customer_id: String,
//! }
//!
//! impl WritableKey for OrderKey {
//!     fn write_key(&self, output: &mut ValueWriter) -> Result<()> {
//!         output.write_i64(self.order_id)?;
//!         output.write_string(&self.customer_id)
//!     }
//!
//!     // Route every order of a customer to the same partition.
//!     fn affinity_key(&self) -> Option<Vec<u8>> {
//!         Some(self.customer_id.as_bytes().to_vec())
//!     }
//! }
//! ```

use bytes::Bytes;

use super::{Deserializable, Serializable, ValueReader, ValueWriter};
use crate::error::Result;

/// A cache key.
pub trait WritableKey {
    /// Writes the key's wire bytes.
    fn write_key(&self, output: &mut ValueWriter) -> Result<()>;

    /// Returns explicit affinity key bytes, if routing should not use the key
    /// itself.
    fn affinity_key(&self) -> Option<Vec<u8>> {
        None
    }

    /// Serializes the key into a fresh buffer.
    fn key_bytes(&self) -> Result<Bytes> {
        let mut output = ValueWriter::new();
        self.write_key(&mut output)?;
        Ok(output.freeze())
    }
}

/// A value written into a request.
pub trait Writable {
    /// Writes the value's wire bytes.
    fn write_value(&self, output: &mut ValueWriter) -> Result<()>;
}

/// A caller-owned sink populated from a response.
///
/// When the response carries no value, `read_value` is never called and the
/// sink stays as it was.
pub trait Readable {
    /// Populates the sink from the value bytes.
    fn read_value(&mut self, input: &mut ValueReader<'_>) -> Result<()>;
}

impl<T: Serializable + ?Sized> Writable for T {
    fn write_value(&self, output: &mut ValueWriter) -> Result<()> {
        self.serialize(output)
    }
}

impl<T: Deserializable> Readable for Option<T> {
    fn read_value(&mut self, input: &mut ValueReader<'_>) -> Result<()> {
        *self = Some(T::deserialize(input)?);
        Ok(())
    }
}

macro_rules! serializable_keys {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WritableKey for $ty {
                fn write_key(&self, output: &mut ValueWriter) -> Result<()> {
                    self.serialize(output)
                }
            }
        )*
    };
}

serializable_keys!(i8, i16, i32, i64, u8, u16, u32, u64, bool, str, String, [u8], Vec<u8>);

impl<K: WritableKey + ?Sized> WritableKey for &K {
    fn write_key(&self, output: &mut ValueWriter) -> Result<()> {
        (**self).write_key(output)
    }

    fn affinity_key(&self) -> Option<Vec<u8>> {
        (**self).affinity_key()
    }
}

/// Pairs a key with an explicit affinity key.
///
/// The key's wire bytes are those of `key`; routing uses the serialized
/// `affinity` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffinityKeyed<K, A> {
    key: K,
    affinity: A,
}

impl<K, A> AffinityKeyed<K, A> {
    /// Creates a key routed by `affinity`.
    pub fn new(key: K, affinity: A) -> Self {
        Self { key, affinity }
    }

    /// Returns the key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the affinity key.
    pub fn affinity(&self) -> &A {
        &self.affinity
    }
}

impl<K: WritableKey, A: Serializable> WritableKey for AffinityKeyed<K, A> {
    fn write_key(&self, output: &mut ValueWriter) -> Result<()> {
        self.key.write_key(output)
    }

    fn affinity_key(&self) -> Option<Vec<u8>> {
        // An affinity key that cannot be written falls back to routing by the
        // key itself.
        self.affinity.to_bytes().ok().map(|b| b.to_vec())
    }
}
