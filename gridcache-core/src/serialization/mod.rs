//! Key and value serialization.
//!
//! Primitive values are written through [`DataOutput`] and read back through
//! [`DataInput`]. Cache keys implement [`WritableKey`], values written into
//! requests implement [`Writable`] and response sinks implement [`Readable`].

mod codec;
mod contracts;
mod traits;

pub use codec::{DataInput, DataOutput, ValueReader, ValueWriter};
pub use contracts::{AffinityKeyed, Readable, Writable, WritableKey};
pub use traits::{Deserializable, Serializable};
