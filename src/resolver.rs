//! Encoding and decoding of type references.
//!
//! A type reference tells the reader which type the following payload has. It comes in three
//! modes, each selected by a one-byte [`TypeRefMode`] tag:
//!
//! | Mode | Tag | Payload |
//! |------|-----|---------|
//! | [`TypeRefMode::Full`] | `0xFF` | compact name (`i32` LE length + UTF-8) |
//! | [`TypeRefMode::Versioned`] | `0xFD` | compact name, then a field manifest |
//! | [`TypeRefMode::Indexed`] | `0xFE` | session id (`u16` LE) |
//!
//! Full and versioned references register the type in the session under the next id; indexed
//! references point back at such an id. The `resolve_*` methods decode a payload whose tag the
//! caller has already consumed, [`TypeResolver::read_type`] reads the tag itself.
//!
//! # Resolution Path
//!
//! 1. Read the length-prefixed name bytes
//! 2. Return the cached handle if these exact bytes were resolved before
//! 3. Otherwise decode UTF-8, expand placeholders, look the name up through [`TypeLookup`] and
//!    cache the result

use std::sync::Arc;

use log::{trace, warn};
use strum::EnumIter;

use crate::{
    cache::TypeNameCache,
    manifest::TypeManifest,
    naming::NameCompressor,
    options::SerializerOptions,
    session::{DeserializerSession, SerializerSession},
    stream::{WireRead, WireWriter},
    typesystem::{Instance, TypeHandle, TypeLookup, TypeRegistry, WireType},
    Result,
};

/// Encoding mode of a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum TypeRefMode {
    /// Compact name
    Full,
    /// Compact name followed by the field manifest
    Versioned,
    /// Back-reference to a type registered earlier in the session
    Indexed,
}

impl TypeRefMode {
    /// The tag byte written before the payload.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            TypeRefMode::Full => 0xFF,
            TypeRefMode::Indexed => 0xFE,
            TypeRefMode::Versioned => 0xFD,
        }
    }

    /// The mode for a tag byte.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0xFF => Some(TypeRefMode::Full),
            0xFE => Some(TypeRefMode::Indexed),
            0xFD => Some(TypeRefMode::Versioned),
            _ => None,
        }
    }
}

/// Reads and writes type references.
///
/// Combines the name compressor, the resolution cache and the runtime type lookup. Resolvers
/// are cheap to clone and safe to use from many threads; per-stream state lives in the sessions
/// passed to each call.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wiretype::{
///     DeserializerSession, SerializerOptions, SerializerSession, TypeRegistry, TypeResolver,
///     WireReader, WireWriter,
/// };
///
/// let registry = Arc::new(TypeRegistry::new());
/// let resolver = TypeResolver::for_registry(registry.clone());
/// let int32 = registry.handle_of::<i32>();
///
/// let mut writer = WireWriter::new();
/// let mut out = SerializerSession::new();
/// resolver.write_type(&mut writer, &int32, &mut out, &SerializerOptions::default())?;
/// resolver.write_type(&mut writer, &int32, &mut out, &SerializerOptions::default())?;
///
/// let bytes = writer.into_inner();
/// let mut reader = WireReader::new(&bytes);
/// let mut session = DeserializerSession::new();
/// assert_eq!(resolver.read_type(&mut reader, &mut session)?, int32);
/// assert_eq!(resolver.read_type(&mut reader, &mut session)?, int32);
/// # Ok::<(), wiretype::Error>(())
/// ```
#[derive(Clone)]
pub struct TypeResolver {
    lookup: Arc<dyn TypeLookup>,
    compressor: Arc<NameCompressor>,
    cache: Arc<TypeNameCache>,
}

impl TypeResolver {
    /// Create a resolver from its parts.
    ///
    /// The cache is keyed by compact bytes, before expansion. A `cache` must therefore only ever
    /// be shared between resolvers with the same `lookup` and the same `compressor`
    /// substitution table; otherwise one resolver is served handles the other expanded from a
    /// different qualified name. Pass [`TypeNameCache::shared`] only when the process has a
    /// single lookup and a single compressor configuration.
    #[must_use]
    pub fn new(
        lookup: Arc<dyn TypeLookup>,
        compressor: NameCompressor,
        cache: Arc<TypeNameCache>,
    ) -> Self {
        TypeResolver {
            lookup,
            compressor: Arc::new(compressor),
            cache,
        }
    }

    /// Create a resolver for `registry` with the default compressor and a fresh cache.
    #[must_use]
    pub fn for_registry(registry: Arc<TypeRegistry>) -> Self {
        let compressor = NameCompressor::for_registry(&registry);
        TypeResolver::new(registry, compressor, Arc::new(TypeNameCache::new()))
    }

    /// The runtime type lookup.
    #[must_use]
    pub fn lookup(&self) -> &dyn TypeLookup {
        self.lookup.as_ref()
    }

    /// The name compressor.
    #[must_use]
    pub fn compressor(&self) -> &NameCompressor {
        &self.compressor
    }

    /// The resolution cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<TypeNameCache> {
        &self.cache
    }

    fn read_and_resolve<R: WireRead + ?Sized>(&self, reader: &mut R) -> Result<TypeHandle> {
        let bytes = reader.read_length_encoded_bytes()?;
        self.cache.get_or_resolve(bytes, |bytes| {
            let compact = std::str::from_utf8(bytes)
                .map_err(|e| malformed_error!("Type name is not valid UTF-8 - {}", e))?;
            let name = self.compressor.expand(compact);
            self.lookup.resolve_type_by_name(&name).map_err(|e| {
                warn!("failed to resolve type '{}': {}", name, e);
                e
            })
        })
    }

    /// Decode a full-name reference and register the type in `session`.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeResolution`] for an unknown type, [`crate::Error::Malformed`]
    /// for invalid bytes, [`crate::Error::RecursionLimit`] for a name nested too deeply and
    /// [`crate::Error::OutOfBounds`] for a truncated stream.
    pub fn resolve_full<R: WireRead + ?Sized>(
        &self,
        reader: &mut R,
        session: &mut DeserializerSession,
    ) -> Result<TypeHandle> {
        let handle = self.read_and_resolve(reader)?;
        session.track_type(&handle)?;
        Ok(handle)
    }

    /// Decode a version-tolerant reference: name, then field manifest.
    ///
    /// The manifest is consumed in full and kept in the session entry; it plays no part in
    /// resolving the type.
    ///
    /// # Errors
    /// Same as [`TypeResolver::resolve_full`].
    pub fn resolve_versioned<R: WireRead + ?Sized>(
        &self,
        reader: &mut R,
        session: &mut DeserializerSession,
    ) -> Result<TypeHandle> {
        let handle = self.read_and_resolve(reader)?;
        let manifest = TypeManifest::read(reader)?;
        if manifest.len() != handle.fields.len() {
            trace!(
                "{} announced {} fields, {} declared",
                handle.full_name(),
                manifest.len(),
                handle.fields.len()
            );
        }

        session.track_type_with_manifest(&handle, manifest)?;
        Ok(handle)
    }

    /// Decode an indexed reference.
    ///
    /// # Errors
    /// Returns [`crate::Error::Protocol`] if the id is not registered in `session` and
    /// [`crate::Error::OutOfBounds`] if fewer than two bytes remain.
    pub fn resolve_indexed<R: WireRead + ?Sized>(
        &self,
        reader: &mut R,
        session: &DeserializerSession,
    ) -> Result<TypeHandle> {
        let type_id = reader.read_u16()?;
        session.type_by_id(type_id)
    }

    /// Decode a tagged type reference in any mode.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an unknown tag, otherwise the errors of the
    /// mode-specific decoder.
    pub fn read_type<R: WireRead + ?Sized>(
        &self,
        reader: &mut R,
        session: &mut DeserializerSession,
    ) -> Result<TypeHandle> {
        let tag = reader.read_u8()?;
        match TypeRefMode::from_tag(tag) {
            Some(TypeRefMode::Full) => self.resolve_full(reader, session),
            Some(TypeRefMode::Versioned) => self.resolve_versioned(reader, session),
            Some(TypeRefMode::Indexed) => self.resolve_indexed(reader, session),
            None => Err(malformed_error!("Unknown type reference tag - 0x{:02X}", tag)),
        }
    }

    /// Compact name written for `wire_type`.
    #[must_use]
    pub fn compact_name(&self, wire_type: &WireType) -> String {
        self.compressor.compress_type(wire_type)
    }

    /// Encode the payload of a full-name reference.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the name exceeds `i32::MAX` bytes.
    pub fn write_full(&self, writer: &mut WireWriter, wire_type: &WireType) -> Result<()> {
        writer.write_length_encoded_bytes(self.compact_name(wire_type).as_bytes())
    }

    /// Encode the payload of a version-tolerant reference, using the declared fields of
    /// `wire_type` as manifest.
    ///
    /// Nothing is written on error.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldCountOverflow`] for types with more than 255 fields.
    pub fn write_versioned(&self, writer: &mut WireWriter, wire_type: &WireType) -> Result<()> {
        let manifest = TypeManifest::from_type(wire_type).to_bytes()?;
        self.write_full(writer, wire_type)?;
        writer.write_bytes(&manifest);
        Ok(())
    }

    /// Encode the payload of an indexed reference.
    pub fn write_indexed(&self, writer: &mut WireWriter, type_id: u16) {
        writer.write_u16(type_id);
    }

    /// Encode a tagged type reference, picking the mode from `session` and `options`.
    ///
    /// Types already written in this session become indexed references when
    /// [`SerializerOptions::preserve_type_index`] is set. New types are written by name, with a
    /// manifest when [`SerializerOptions::version_tolerance`] is set, and registered under the
    /// next session id. Nothing is written and the session is unchanged on error.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldCountOverflow`] for a versioned type with too many fields and
    /// [`crate::Error::Protocol`] once the session holds 65 536 types.
    pub fn write_type(
        &self,
        writer: &mut WireWriter,
        type_handle: &TypeHandle,
        session: &mut SerializerSession,
        options: &SerializerOptions,
    ) -> Result<TypeRefMode> {
        if options.preserve_type_index {
            if let Some(type_id) = session.type_id(type_handle) {
                writer.write_u8(TypeRefMode::Indexed.tag());
                self.write_indexed(writer, type_id);
                return Ok(TypeRefMode::Indexed);
            }
        }

        let mut payload = WireWriter::new();
        let mode = if options.version_tolerance {
            self.write_versioned(&mut payload, type_handle)?;
            TypeRefMode::Versioned
        } else {
            self.write_full(&mut payload, type_handle)?;
            TypeRefMode::Full
        };

        session.claim(type_handle)?;
        writer.write_u8(mode.tag());
        writer.write_bytes(payload.as_bytes());
        Ok(mode)
    }

    /// Allocate an instance of `type_handle` for populate-in-place deserialization.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedType`] if the lookup cannot allocate the type.
    pub fn allocate_uninitialized(&self, type_handle: &TypeHandle) -> Result<Instance> {
        self.lookup.allocate_uninitialized(type_handle)
    }
}
