//! Growable writer producing the byte layout [`crate::stream::WireReader`] consumes.

use crate::{
    stream::io::{write_le, WireIO},
    Result,
};

/// Append-only encoder for type references.
///
/// # Examples
///
/// ```rust
/// use wiretype::WireWriter;
///
/// let mut writer = WireWriter::new();
/// writer.write_length_encoded_bytes(b"id")?;
/// writer.write_u16(7);
/// assert_eq!(writer.into_inner(), [0x02, 0x00, 0x00, 0x00, b'i', b'd', 0x07, 0x00]);
/// # Ok::<(), wiretype::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    data: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        WireWriter { data: Vec::new() }
    }

    /// Create an empty writer with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        WireWriter {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the writer and return the encoded bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Append a value in little-endian format.
    pub fn write_le<T: WireIO>(&mut self, value: T) {
        write_le(&mut self.data, value);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Append a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.write_le(value);
    }

    /// Append raw bytes with no prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Append `bytes` prefixed by their length as a little-endian `i32`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `bytes` is longer than `i32::MAX`.
    pub fn write_length_encoded_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let length = i32::try_from(bytes.len())
            .map_err(|_| malformed_error!("Byte sequence too long - {}", bytes.len()))?;
        self.write_le(length);
        self.write_bytes(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{WireRead, WireReader};

    #[test]
    fn writer_reader_agree() {
        let mut writer = WireWriter::with_capacity(16);
        writer.write_u8(3);
        writer.write_length_encoded_bytes("Grüße".as_bytes()).unwrap();
        writer.write_u16(0x0102);

        let bytes = writer.into_inner();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 3);
        assert_eq!(
            reader.read_length_encoded_bytes().unwrap(),
            "Grüße".as_bytes()
        );
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert!(!reader.has_more_data());
    }
}
