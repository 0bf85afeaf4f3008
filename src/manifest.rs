//! Field manifests for version-tolerant type references.
//!
//! A manifest lists the field names of a type so a reader on a different schema version can
//! match fields by name. Wire layout:
//!
//! ```text
//! [count: u8] { [length: i32 LE] [name: UTF-8 bytes] } * count
//! ```
//!
//! The identity layer only writes and consumes manifests; it never interprets the names.

use std::slice;

use crate::{
    stream::{io::write_le, WireRead},
    typesystem::WireType,
    Error::FieldCountOverflow,
    Result,
};

/// Largest field count the single count byte can carry.
pub const MAX_MANIFEST_FIELDS: usize = u8::MAX as usize;

/// Encode a manifest for the given field names, in the given order.
///
/// # Errors
/// Returns [`crate::Error::FieldCountOverflow`] for more than 255 names and
/// [`crate::Error::Malformed`] for a name longer than `i32::MAX` bytes.
///
/// # Examples
///
/// ```rust
/// use wiretype::build_manifest;
///
/// assert_eq!(build_manifest::<&[u8]>(&[])?, [0x00]);
/// assert_eq!(build_manifest(&[b"id"])?, [0x01, 0x02, 0x00, 0x00, 0x00, b'i', b'd']);
/// # Ok::<(), wiretype::Error>(())
/// ```
pub fn build_manifest<B: AsRef<[u8]>>(field_names: &[B]) -> Result<Vec<u8>> {
    let count =
        u8::try_from(field_names.len()).map_err(|_| FieldCountOverflow(field_names.len()))?;

    let capacity = 1 + field_names
        .iter()
        .map(|name| 4 + name.as_ref().len())
        .sum::<usize>();
    let mut manifest = Vec::with_capacity(capacity);
    manifest.push(count);

    for name in field_names {
        let name = name.as_ref();
        let length = i32::try_from(name.len())
            .map_err(|_| malformed_error!("Field name too long - {} bytes", name.len()))?;
        write_le(&mut manifest, length);
        manifest.extend_from_slice(name);
    }

    Ok(manifest)
}

/// Field names read from a version-tolerant type reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeManifest {
    field_names: Vec<Vec<u8>>,
}

impl TypeManifest {
    /// Manifest of the declared fields of `wire_type`.
    #[must_use]
    pub fn from_type(wire_type: &WireType) -> Self {
        TypeManifest {
            field_names: wire_type
                .fields
                .iter()
                .map(|field| field.name.as_bytes().to_vec())
                .collect(),
        }
    }

    /// Read a manifest from the stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`] if the stream ends
    /// early or carries a negative length.
    pub fn read<R: WireRead + ?Sized>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u8()?;
        let mut field_names = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            field_names.push(reader.read_length_encoded_bytes()?.to_vec());
        }

        Ok(TypeManifest { field_names })
    }

    /// Advance past a manifest without keeping the names, returning the field count.
    ///
    /// # Errors
    /// Same as [`TypeManifest::read`].
    pub fn skip<R: WireRead + ?Sized>(reader: &mut R) -> Result<u8> {
        let count = reader.read_u8()?;
        for _ in 0..count {
            reader.skip_length_encoded_bytes()?;
        }

        Ok(count)
    }

    /// Encode this manifest.
    ///
    /// # Errors
    /// Same as [`build_manifest`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        build_manifest(&self.field_names)
    }

    /// Number of field names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.field_names.len()
    }

    /// Returns `true` if the manifest lists no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_names.is_empty()
    }

    /// Field name at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.field_names.get(index).map(Vec::as_slice)
    }

    /// Iterate over the field names in stream order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.field_names.iter().map(Vec::as_slice)
    }
}

impl<'a> IntoIterator for &'a TypeManifest {
    type Item = &'a Vec<u8>;
    type IntoIter = slice::Iter<'a, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.field_names.iter()
    }
}
