//! Length-prefixed payload sections shared by requests and responses.

use bytes::{Buf, BufMut, BytesMut};

use super::constants::LENGTH_FIELD_SIZE;
use crate::error::{GridError, Result};

/// Appends a length-prefixed section to `dst`.
pub fn put_section(dst: &mut BytesMut, data: &[u8]) {
    dst.reserve(LENGTH_FIELD_SIZE + data.len());
    dst.put_i32_le(data.len() as i32);
    dst.put_slice(data);
}

/// Sequential reader over a payload made of length-prefixed sections and
/// fixed-width little-endian integers.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    data: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Reads the next length-prefixed section.
    pub fn section(&mut self) -> Result<&'a [u8]> {
        let len = self.i32()?;
        if len < 0 {
            return Err(GridError::Protocol(format!(
                "negative section length: {len}"
            )));
        }
        self.bytes(len as usize)
    }

    /// Reads a little-endian `i32`.
    pub fn i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.data.get_i32_le())
    }

    /// Reads a little-endian `i64`.
    pub fn i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.data.get_i64_le())
    }

    /// Reads exactly `len` raw bytes.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.data.len() < n {
            Err(GridError::Protocol(format!(
                "truncated payload: need {} bytes, have {}",
                n,
                self.data.len()
            )))
        } else {
            Ok(())
        }
    }
}
