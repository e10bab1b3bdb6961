//! Serialization traits and implementations for primitive types.

use super::{DataInput, DataOutput, ValueReader, ValueWriter};
use crate::error::Result;

/// Types that can write themselves with the primitive codec.
pub trait Serializable {
    /// Writes this value to `output`.
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()>;

    /// Convenience method: serializes this value into a fresh buffer.
    fn to_bytes(&self) -> Result<bytes::Bytes> {
        let mut output = ValueWriter::new();
        self.serialize(&mut output)?;
        Ok(output.freeze())
    }
}

/// Types that can be read back with the primitive codec.
pub trait Deserializable: Sized {
    /// Reads a value from `input`.
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self>;

    /// Convenience method: deserializes a value from a byte slice.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::deserialize(&mut ValueReader::new(data))
    }
}

macro_rules! primitive_serialization {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Serializable for $ty {
                fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
                    output.$write(*self)
                }
            }

            impl Deserializable for $ty {
                fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
                    input.$read()
                }
            }
        )*
    };
}

primitive_serialization! {
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
    bool => write_bool, read_bool;
}

macro_rules! unsigned_serialization {
    ($($ty:ty => $signed:ty, $write:ident, $read:ident;)*) => {
        $(
            impl Serializable for $ty {
                fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
                    output.$write(*self as $signed)
                }
            }

            impl Deserializable for $ty {
                fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
                    input.$read().map(|v| v as $ty)
                }
            }
        )*
    };
}

unsigned_serialization! {
    u8 => i8, write_i8, read_i8;
    u16 => i16, write_i16, read_i16;
    u32 => i32, write_i32, read_i32;
    u64 => i64, write_i64, read_i64;
}

impl Serializable for str {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_string(self)
    }
}

impl Serializable for String {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_string(self)
    }
}

impl Deserializable for String {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_string()
    }
}

impl Serializable for [u8] {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_byte_array(self)
    }
}

impl Serializable for Vec<u8> {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_byte_array(self)
    }
}

impl Deserializable for Vec<u8> {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_byte_array()
    }
}

impl<T: Serializable + ?Sized> Serializable for &T {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        (**self).serialize(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_preserves_bit_pattern() {
        let bytes = u64::MAX.to_bytes().unwrap();
        assert_eq!(bytes.as_ref(), &[0xff; 8]);
        assert_eq!(u64::from_bytes(&bytes).unwrap(), u64::MAX);
        assert_eq!(i64::from_bytes(&bytes).unwrap(), -1);
    }

    #[test]
    fn test_str_and_string_share_encoding() {
        let borrowed = "order-17".to_bytes().unwrap();
        let owned = "order-17".to_string().to_bytes().unwrap();
        assert_eq!(borrowed, owned);
        assert_eq!(String::from_bytes(&owned).unwrap(), "order-17");
    }

    #[test]
    fn test_byte_slice_and_vec_share_encoding() {
        let data = vec![9u8, 8, 7];
        assert_eq!(data.to_bytes().unwrap(), data[..].to_bytes().unwrap());
        assert_eq!(Vec::<u8>::from_bytes(&data.to_bytes().unwrap()).unwrap(), data);
    }

    #[test]
    fn test_truncated_input() {
        assert!(i64::from_bytes(&[1, 2, 3]).is_err());
        assert!(String::from_bytes(&[5, 0, 0, 0, b'a']).is_err());
    }
}
