//! Per-operation type tables for indexed back-references.
//!
//! Each decode call owns a [`DeserializerSession`], each encode call a [`SerializerSession`].
//! Both assign sequential `u16` ids in first-seen order starting at 0, so a writer and a reader
//! processing the same stream agree on every id without transmitting the table. Sessions are
//! moved, never shared, and carry no synchronization.

use std::collections::HashMap;

use log::trace;

use crate::{manifest::TypeManifest, typesystem::TypeHandle, Error::Protocol, Result};

/// Maximum number of types a session can hold.
pub const MAX_SESSION_TYPES: usize = u16::MAX as usize + 1;

/// A type registered in a [`DeserializerSession`].
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// The resolved type
    pub type_handle: TypeHandle,
    /// Field names announced by a version-tolerant reference, `None` for full-name references
    pub manifest: Option<TypeManifest>,
}

/// Decoder-side table of the types encountered so far.
///
/// # Examples
///
/// ```rust
/// use wiretype::{DeserializerSession, TypeRegistry};
///
/// let registry = TypeRegistry::new();
/// let mut session = DeserializerSession::new();
///
/// let id = session.track_type(&registry.handle_of::<i32>())?;
/// assert_eq!(id, 0);
/// assert_eq!(session.type_by_id(0)?, registry.handle_of::<i32>());
/// assert!(session.type_by_id(1).is_err());
/// # Ok::<(), wiretype::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct DeserializerSession {
    entries: Vec<SessionEntry>,
    ids: HashMap<TypeHandle, u16>,
}

impl DeserializerSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        DeserializerSession {
            entries: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Register a type resolved from a full-name reference, returning its id.
    ///
    /// A type that is already registered keeps its original id.
    ///
    /// # Errors
    /// Returns [`crate::Error::Protocol`] if the session already holds 65 536 types.
    pub fn track_type(&mut self, type_handle: &TypeHandle) -> Result<u16> {
        self.track(type_handle, None)
    }

    /// Register a type resolved from a version-tolerant reference together with the field names
    /// the stream announced for it.
    ///
    /// # Errors
    /// Same as [`DeserializerSession::track_type`].
    pub fn track_type_with_manifest(
        &mut self,
        type_handle: &TypeHandle,
        manifest: TypeManifest,
    ) -> Result<u16> {
        self.track(type_handle, Some(manifest))
    }

    fn track(&mut self, type_handle: &TypeHandle, manifest: Option<TypeManifest>) -> Result<u16> {
        if let Some(id) = self.ids.get(type_handle) {
            return Ok(*id);
        }

        let id = u16::try_from(self.entries.len()).map_err(|_| {
            Protocol(format!(
                "session type table is full ({MAX_SESSION_TYPES} types), cannot add {}",
                type_handle.full_name()
            ))
        })?;

        trace!("session type {} -> {}", id, type_handle.full_name());
        self.entries.push(SessionEntry {
            type_handle: type_handle.clone(),
            manifest,
        });
        self.ids.insert(type_handle.clone(), id);
        Ok(id)
    }

    /// Type registered under `type_id`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Protocol`] if no type has been registered under `type_id` yet.
    pub fn type_by_id(&self, type_id: u16) -> Result<TypeHandle> {
        self.entry(type_id).map(|entry| entry.type_handle.clone())
    }

    /// Field names announced for the type registered under `type_id`, if it came from a
    /// version-tolerant reference.
    ///
    /// # Errors
    /// Same as [`DeserializerSession::type_by_id`].
    pub fn manifest_by_id(&self, type_id: u16) -> Result<Option<&TypeManifest>> {
        self.entry(type_id).map(|entry| entry.manifest.as_ref())
    }

    fn entry(&self, type_id: u16) -> Result<&SessionEntry> {
        self.entries.get(usize::from(type_id)).ok_or_else(|| {
            Protocol(format!(
                "type id {} referenced before registration ({} types known)",
                type_id,
                self.entries.len()
            ))
        })
    }

    /// Id of a registered type.
    #[must_use]
    pub fn id_of(&self, type_handle: &TypeHandle) -> Option<u16> {
        self.ids.get(type_handle).copied()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of [`SerializerSession::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSlot {
    /// The type was written before under this id; emit an indexed reference
    Known(u16),
    /// First occurrence, now registered under this id; emit the full reference
    New(u16),
}

/// Encoder-side mirror of [`DeserializerSession`].
#[derive(Debug, Default)]
pub struct SerializerSession {
    ids: HashMap<TypeHandle, u16>,
}

impl SerializerSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        SerializerSession {
            ids: HashMap::new(),
        }
    }

    /// Look up `type_handle`, registering it under the next id if it is new.
    ///
    /// # Errors
    /// Returns [`crate::Error::Protocol`] if a new type does not fit into the 65 536 ids.
    pub fn claim(&mut self, type_handle: &TypeHandle) -> Result<TypeSlot> {
        if let Some(id) = self.ids.get(type_handle) {
            return Ok(TypeSlot::Known(*id));
        }

        let id = u16::try_from(self.ids.len()).map_err(|_| {
            Protocol(format!(
                "session type table is full ({MAX_SESSION_TYPES} types), cannot add {}",
                type_handle.full_name()
            ))
        })?;

        trace!("session type {} -> {}", id, type_handle.full_name());
        self.ids.insert(type_handle.clone(), id);
        Ok(TypeSlot::New(id))
    }

    /// Id of a type written earlier in this session.
    #[must_use]
    pub fn type_id(&self, type_handle: &TypeHandle) -> Option<u16> {
        self.ids.get(type_handle).copied()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
