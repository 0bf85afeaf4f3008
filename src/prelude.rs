//! # wiretype Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the wiretype library.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all wiretype operations
pub use crate::Error;

/// The result type used throughout wiretype
pub use crate::Result;

// ================================================================================================
// Type Model
// ================================================================================================

/// Type handles and their description
pub use crate::typesystem::{FieldDef, TypeHandle, WireFlavor, WireType};

/// Primitive classification
pub use crate::typesystem::{WirePrimitive, WirePrimitiveKind};

/// Registry, lookup capability and type registration
pub use crate::typesystem::{TypeBuilder, TypeLookup, TypeRegistry};

/// Assembly identities
pub use crate::typesystem::{AssemblyIdentity, AssemblyVersion};

// ================================================================================================
// Encoding and Decoding
// ================================================================================================

/// Type reference encoder/decoder
pub use crate::resolver::{TypeRefMode, TypeResolver};

/// Per-operation sessions
pub use crate::session::{DeserializerSession, SerializerSession};

/// Encoder configuration
pub use crate::options::SerializerOptions;

/// Byte streams
pub use crate::stream::{WireRead, WireReader, WireWriter};

/// Field manifests
pub use crate::manifest::{build_manifest, TypeManifest};

/// Compact names and the resolution cache
pub use crate::{cache::TypeNameCache, naming::NameCompressor};
