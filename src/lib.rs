// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # wiretype
//!
//! Type identity for binary object serializers. A stream written by an object serializer has to
//! tell the reader which concrete type every payload has; `wiretype` encodes those type
//! references compactly and turns them back into type handles quickly, across process runs and
//! schema versions.
//!
//! ## Features
//!
//! - **Three reference modes** - full compact name, name plus field manifest for
//!   version-tolerant readers, and 2-byte back-references to types seen earlier in the stream
//! - **Name compression** - long runtime assembly qualifiers are replaced by short placeholders
//!   and default qualifier fragments are dropped
//! - **Lock-free lookups** - a concurrent cache maps raw name bytes straight to resolved handles
//! - **Type classification** - primitive, fixed-size, array and nullable queries for the outer
//!   encoder's dispatch
//! - **Type registry** - assembly-qualified name parsing with nested generics and arrays
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use wiretype::prelude::*;
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let order = TypeBuilder::new(
//!     "Shop",
//!     "Order",
//!     AssemblyIdentity::new("Shop", AssemblyVersion::new(1, 0, 0, 0)),
//! )
//! .field("Id", registry.handle_of::<i64>())
//! .register(&registry)?;
//!
//! let resolver = TypeResolver::for_registry(registry.clone());
//! let options = SerializerOptions::version_tolerant();
//!
//! // Encode: the first reference carries the name and field manifest, the second an index
//! let mut writer = WireWriter::new();
//! let mut out = SerializerSession::new();
//! resolver.write_type(&mut writer, &order, &mut out, &options)?;
//! resolver.write_type(&mut writer, &order, &mut out, &options)?;
//!
//! // Decode
//! let bytes = writer.into_inner();
//! let mut reader = WireReader::new(&bytes);
//! let mut session = DeserializerSession::new();
//! assert_eq!(resolver.read_type(&mut reader, &mut session)?, order);
//! assert_eq!(resolver.read_type(&mut reader, &mut session)?, order);
//! # Ok::<(), wiretype::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`stream`] - Byte-level reader and writer
//! - [`typesystem`] - Type model, primitives, assembly identities and the registry
//! - [`naming`] - Compact name conversion
//! - [`manifest`] - Field manifests of version-tolerant references
//! - [`cache`] - Concurrent name-bytes to handle cache
//! - [`session`] - Per-operation id tables
//! - [`resolver`] - Encoding and decoding of tagged type references
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with a single [`Error`] enum. Errors are terminal
//! for the current encode or decode step; nothing in this crate retries.
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: cache misses and newly
//! constructed types at `debug`, cache hits and session registrations at `trace`, failed name
//! resolutions at `warn`. No logger is installed by the library.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use wiretype::prelude::*;
///
/// let registry = TypeRegistry::new();
/// assert!(registry.handle_of::<i32>().is_fixed_size());
/// ```
pub mod prelude;

pub mod cache;
pub mod manifest;
pub mod naming;
pub mod options;
pub mod resolver;
pub mod session;
pub mod stream;
pub mod typesystem;

/// `wiretype` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
///
/// # Example
///
/// ```rust
/// use wiretype::{Result, TypeLookup, TypeRegistry, TypeHandle};
///
/// fn lookup(registry: &TypeRegistry, name: &str) -> Result<TypeHandle> {
///     registry.resolve_type_by_name(name)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `wiretype` Error type
///
/// Every fallible operation in this crate returns this error.
pub use error::Error;

pub use cache::{ByteKey, TypeNameCache};
pub use manifest::{build_manifest, TypeManifest, MAX_MANIFEST_FIELDS};
pub use naming::{NameCompressor, QualifierSubstitution, CORE_PLACEHOLDER};
pub use options::SerializerOptions;
pub use resolver::{TypeRefMode, TypeResolver};
pub use session::{DeserializerSession, SerializerSession, SessionEntry, TypeSlot};
pub use stream::{WireRead, WireReader, WireWriter};
pub use typesystem::{
    AssemblyIdentity, AssemblyVersion, FieldDef, TypeAttributes, TypeBuilder, TypeHandle,
    TypeLookup, TypeNameSpec, TypeRegistry, WireFlavor, WirePrimitive, WirePrimitiveKind,
    WireType,
};
