//! Bounds-checked reader over a byte slice
//!
//! Every read either yields the requested bytes or fails with
//! `BlockError::InvalidDataSize`; malformed input never panics the decoder.

use crate::error::BlockError;

/// Sequential big-endian reader over borrowed bytes
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` bytes
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], BlockError> {
        let end = self.pos.checked_add(n).ok_or(BlockError::InvalidDataSize)?;
        let slice = self.data.get(self.pos..end).ok_or(BlockError::InvalidDataSize)?;
        self.pos = end;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BlockError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, BlockError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, BlockError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, BlockError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, BlockError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, BlockError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, BlockError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    /// Fail unless every byte has been consumed
    pub fn finish(&self) -> Result<(), BlockError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BlockError::InvalidDataSize)
        }
    }
}
