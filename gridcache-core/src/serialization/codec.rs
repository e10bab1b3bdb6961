//! Primitive value writer and reader.
//!
//! All multi-byte values use little-endian byte order, strings and byte arrays
//! are prefixed with their length as an `i32`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{GridError, Result};

/// Sink for primitive values.
///
/// Implementors only provide [`write_raw`](DataOutput::write_raw); every typed
/// write is derived from it.
pub trait DataOutput {
    /// Appends raw bytes without a length prefix.
    fn write_raw(&mut self, bytes: &[u8]);

    /// Writes an `i8`.
    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.write_raw(&v.to_le_bytes());
        Ok(())
    }

    /// Writes an `i16`.
    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.write_raw(&v.to_le_bytes());
        Ok(())
    }

    /// Writes an `i32`.
    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write_raw(&v.to_le_bytes());
        Ok(())
    }

    /// Writes an `i64`.
    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.write_raw(&v.to_le_bytes());
        Ok(())
    }

    /// Writes an `f32`.
    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_raw(&v.to_le_bytes());
        Ok(())
    }

    /// Writes an `f64`.
    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.write_raw(&v.to_le_bytes());
        Ok(())
    }

    /// Writes a boolean as a single byte.
    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_raw(&[u8::from(v)]);
        Ok(())
    }

    /// Writes a length-prefixed byte array.
    fn write_byte_array(&mut self, v: &[u8]) -> Result<()> {
        let len = i32::try_from(v.len()).map_err(|_| {
            GridError::Serialization(format!("byte array too large: {} bytes", v.len()))
        })?;
        self.write_i32(len)?;
        self.write_raw(v);
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string.
    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_byte_array(v.as_bytes())
    }
}

/// Source of primitive values.
pub trait DataInput {
    /// Fills `dst` completely or fails without consuming anything.
    fn read_into(&mut self, dst: &mut [u8]) -> Result<()>;

    /// Returns the number of unread bytes.
    fn remaining(&self) -> usize;

    /// Reads an `i8`.
    fn read_i8(&mut self) -> Result<i8> {
        let mut b = [0u8; 1];
        self.read_into(&mut b)?;
        Ok(i8::from_le_bytes(b))
    }

    /// Reads an `i16`.
    fn read_i16(&mut self) -> Result<i16> {
        let mut b = [0u8; 2];
        self.read_into(&mut b)?;
        Ok(i16::from_le_bytes(b))
    }

    /// Reads an `i32`.
    fn read_i32(&mut self) -> Result<i32> {
        let mut b = [0u8; 4];
        self.read_into(&mut b)?;
        Ok(i32::from_le_bytes(b))
    }

    /// Reads an `i64`.
    fn read_i64(&mut self) -> Result<i64> {
        let mut b = [0u8; 8];
        self.read_into(&mut b)?;
        Ok(i64::from_le_bytes(b))
    }

    /// Reads an `f32`.
    fn read_f32(&mut self) -> Result<f32> {
        let mut b = [0u8; 4];
        self.read_into(&mut b)?;
        Ok(f32::from_le_bytes(b))
    }

    /// Reads an `f64`.
    fn read_f64(&mut self) -> Result<f64> {
        let mut b = [0u8; 8];
        self.read_into(&mut b)?;
        Ok(f64::from_le_bytes(b))
    }

    /// Reads a boolean byte; any non-zero value is `true`.
    fn read_bool(&mut self) -> Result<bool> {
        let mut b = [0u8; 1];
        self.read_into(&mut b)?;
        Ok(b[0] != 0)
    }

    /// Reads a length-prefixed byte array.
    fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let len = self.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| GridError::Serialization(format!("invalid array length: {len}")))?;
        if len > self.remaining() {
            return Err(GridError::Serialization(format!(
                "insufficient data: need {} bytes, have {}",
                len,
                self.remaining()
            )));
        }
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Reads a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_byte_array()?;
        String::from_utf8(bytes)
            .map_err(|e| GridError::Serialization(format!("invalid UTF-8 string: {e}")))
    }
}

/// Growable buffer that keys and values are written into.
#[derive(Debug, Default)]
pub struct ValueWriter {
    buffer: BytesMut,
}

impl ValueWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes the writer and returns the written bytes.
    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl DataOutput for ValueWriter {
    fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }
}

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ValueReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ValueReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl DataInput for ValueReader<'_> {
    fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let end = self.position + dst.len();
        let src = self.data.get(self.position..end).ok_or_else(|| {
            GridError::Serialization(format!(
                "insufficient data: need {} bytes, have {}",
                dst.len(),
                self.remaining()
            ))
        })?;
        dst.copy_from_slice(src);
        self.position = end;
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}
