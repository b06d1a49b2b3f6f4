//! Sequential byte sources consumed by the decode engine.

use crate::DataError;

/// Trait for a destructively consumed byte source.
///
/// The position only moves forward; decoding two entries concurrently
/// against one source is not meaningful.
pub trait ByteRead {
    /// Read exactly `buf.len()` bytes, advancing the position.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DataError>;

    /// Skip `count` bytes, advancing the position.
    fn skip(&mut self, count: usize) -> Result<(), DataError>;

    /// Read a single byte.
    fn read_u8(&mut self) -> Result<u8, DataError> {
        let mut buf = [0];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

/// A [ByteRead] over an in-memory byte slice.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> SliceReader<'a> {
    /// Create a reader positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        SliceReader { bytes, position: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Return true if the source is exhausted.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl ByteRead for SliceReader<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DataError> {
        if buf.len() > self.remaining() {
            return Err(DataError::ReadPastEnd {
                requested: buf.len(),
                available: self.remaining(),
            });
        }
        buf.copy_from_slice(&self.bytes[self.position..self.position + buf.len()]);
        self.position += buf.len();
        Ok(())
    }

    fn skip(&mut self, count: usize) -> Result<(), DataError> {
        if count > self.remaining() {
            return Err(DataError::ReadPastEnd {
                requested: count,
                available: self.remaining(),
            });
        }
        self.position += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_the_position() {
        let bytes = [1, 2, 3, 4];
        let mut reader = SliceReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 1);
        let mut buf = [0; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [2, 3]);
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn reading_past_the_end_fails() {
        let bytes = [1];
        let mut reader = SliceReader::new(&bytes);
        let mut buf = [0; 2];
        assert!(matches!(
            reader.read_exact(&mut buf),
            Err(DataError::ReadPastEnd {
                requested: 2,
                available: 1
            })
        ));
    }

    #[test]
    fn skip_checks_bounds() {
        let bytes = [1, 2, 3];
        let mut reader = SliceReader::new(&bytes);
        reader.skip(2).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 3);
        assert!(reader.skip(1).is_err());
    }
}
