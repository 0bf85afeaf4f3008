//! Low-level little-endian reading and writing utilities for the wire format.
//!
//! Every multi-byte integer this crate puts on the wire is little-endian: the `i32` length
//! prefixes of compact names and manifest field names, and the `u16` ids of indexed type
//! references. This module provides the bounds-checked primitives the
//! [`crate::stream::WireReader`] and [`crate::stream::WireWriter`] are built on.
//!
//! # Key Components
//!
//! - [`crate::stream::io::WireIO`] - Trait describing the byte representation of a primitive
//! - [`crate::stream::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::stream::io::read_le_at`] - Read a value at an offset and advance the offset
//! - [`crate::stream::io::write_le`] - Append a value to a growable buffer
//!
//! # Error Handling
//!
//! All reading functions return [`crate::Error::OutOfBounds`] if there are insufficient bytes
//! in the buffer to complete the operation.
//!
//! # Thread Safety
//!
//! All functions in this module are pure and can be called concurrently; the offset parameter
//! is caller-owned.

use crate::{Error::OutOfBounds, Result};

/// Trait for primitives that have a fixed little-endian wire representation.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size byte
/// array required for that particular type (e.g. `[u8; 4]` for `u32`).
pub trait WireIO: Sized + Copy {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_wire_io {
    ($($ty:ty => $len:expr),* $(,)?) => {
        $(
            impl WireIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_wire_io! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
}

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
///
/// # Examples
///
/// ```rust,ignore
/// let data = [0x01, 0x00, 0x00, 0x00];
/// let value: u32 = read_le(&data)?;
/// assert_eq!(value, 1);
/// ```
pub fn read_le<T: WireIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`.
///
/// On success the offset is advanced by the size of `T`; on failure it is left untouched.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: WireIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Appends a value of type `T` in little-endian byte order to `data`.
pub fn write_le<T: WireIO>(data: &mut Vec<u8>, value: T) {
    data.extend_from_slice(value.to_le_bytes().as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u8() {
        let result = read_le::<u8>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x01);
    }

    #[test]
    fn read_le_u16() {
        let result = read_le::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0201);
    }

    #[test]
    fn read_le_i32() {
        let result = read_le::<i32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_u64() {
        let result = read_le::<u64>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 0;
        let first: u16 = read_le_at(&TEST_BUFFER, &mut offset).unwrap();
        let second: u32 = read_le_at(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(first, 0x0201);
        assert_eq!(second, 0x0605_0403);
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_le_out_of_bounds() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(result, Err(OutOfBounds)));
        assert_eq!(offset, 6);

        let mut offset = usize::MAX;
        assert!(read_le_at::<u8>(&TEST_BUFFER, &mut offset).is_err());
    }

    #[test]
    fn write_le_roundtrip() {
        let mut data = Vec::new();
        write_le(&mut data, 2_i32);
        write_le(&mut data, 0xBEEF_u16);
        assert_eq!(data, [0x02, 0x00, 0x00, 0x00, 0xEF, 0xBE]);
    }
}
