//! Cursor-based reader for the type-reference wire format.
//!
//! [`WireRead`] is the stream capability the resolver consumes: a single byte, a little-endian
//! `u16`, and a length-encoded byte sequence. [`WireReader`] implements it over a borrowed byte
//! slice with bounds checking on every access.

use crate::{
    stream::io::{read_le_at, WireIO},
    Error::OutOfBounds,
    Result,
};

/// The stream operations needed to decode type references.
///
/// Implementations may return the bytes of [`WireRead::read_length_encoded_bytes`] from an
/// internal scratch buffer; the returned slice only lives until the next read.
pub trait WireRead {
    /// Read a single unsigned byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the stream.
    fn read_u8(&mut self) -> Result<u8>;

    /// Read a little-endian `u16`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than two bytes remain.
    fn read_u16(&mut self) -> Result<u16>;

    /// Read a byte sequence prefixed by its length as a little-endian `i32`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a negative length and
    /// [`crate::Error::OutOfBounds`] if the stream is shorter than the announced length.
    fn read_length_encoded_bytes(&mut self) -> Result<&[u8]>;

    /// Advance past a length-encoded byte sequence without inspecting it.
    ///
    /// # Errors
    /// Same as [`WireRead::read_length_encoded_bytes`].
    fn skip_length_encoded_bytes(&mut self) -> Result<()> {
        self.read_length_encoded_bytes().map(|_| ())
    }
}

/// A bounds-checked cursor over an encoded byte slice.
///
/// # Examples
///
/// ```rust
/// use wiretype::{WireRead, WireReader};
///
/// let data = [0x02, 0x00, 0x00, 0x00, b'i', b'd', 0x07, 0x00];
/// let mut reader = WireReader::new(&data);
///
/// assert_eq!(reader.read_length_encoded_bytes()?, b"id");
/// assert_eq!(reader.read_u16()?, 7);
/// assert!(!reader.has_more_data());
/// # Ok::<(), wiretype::Error>(())
/// ```
pub struct WireReader<'a> {
    /// The binary data being read
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> WireReader<'a> {
    /// Create a new [`WireReader`] positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        WireReader { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there are unread bytes left.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Current position in the buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move to an absolute position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is past the end of the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Read a type `T` from the current position in little-endian format and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: WireIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `length` raw bytes and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.position.checked_add(length).ok_or(OutOfBounds)?;
        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read an `i32` length prefix and return it as a byte count.
    fn read_length(&mut self) -> Result<usize> {
        let length = self.read_le::<i32>()?;
        usize::try_from(length).map_err(|_| malformed_error!("Negative length prefix - {}", length))
    }
}

impl WireRead for WireReader<'_> {
    fn read_u8(&mut self) -> Result<u8> {
        self.read_le::<u8>()
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.read_le::<u16>()
    }

    fn read_length_encoded_bytes(&mut self) -> Result<&[u8]> {
        let start = self.position;
        let length = self.read_length()?;
        match self.read_bytes(length) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.position = start;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_primitives() {
        let data = [0x2A, 0x34, 0x12];
        let mut reader = WireReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x2A);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.remaining(), 0);
        assert!(matches!(reader.read_u8(), Err(Error::OutOfBounds)));
    }

    #[test]
    fn read_length_encoded() {
        let data = [0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c', 0x00, 0x00, 0x00, 0x00];
        let mut reader = WireReader::new(&data);

        assert_eq!(reader.read_length_encoded_bytes().unwrap(), b"abc");
        assert_eq!(reader.read_length_encoded_bytes().unwrap(), b"");
        assert!(!reader.has_more_data());
    }

    #[test]
    fn read_length_encoded_truncated() {
        let data = [0x05, 0x00, 0x00, 0x00, b'a', b'b'];
        let mut reader = WireReader::new(&data);

        assert!(matches!(
            reader.read_length_encoded_bytes(),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(reader.pos(), 0);
    }

    #[test]
    fn read_length_encoded_negative() {
        let data = (-1_i32).to_le_bytes();
        let mut reader = WireReader::new(&data);

        assert!(matches!(
            reader.read_length_encoded_bytes(),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn seek_bounds() {
        let data = [0x01, 0x02];
        let mut reader = WireReader::new(&data);

        assert!(reader.seek(2).is_ok());
        assert!(reader.seek(3).is_err());
        reader.seek(1).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0x02);
    }
}
