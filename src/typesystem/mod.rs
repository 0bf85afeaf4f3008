//! Type model for the identity layer.
//!
//! This module provides the representation of every type that can appear in a stream, the
//! classification queries the outer encoder branches on and the registry that maps
//! assembly-qualified names to handles.
//!
//! # Key Components
//!
//! - [`WireType`] / [`TypeHandle`]: Immutable type description and its shared, identity-compared
//!   handle
//! - [`WirePrimitiveKind`]: The closed set of built-in primitives and the fixed-size table
//! - [`TypeRegistry`]: Central registry implementing [`TypeLookup`]
//! - [`TypeBuilder`]: Fluent registration of user types
//! - [`AssemblyIdentity`]: Parsed assembly display names
//! - [`TypeNameSpec`]: Parsed assembly-qualified type names
//!
//! # Classification
//!
//! | Query | True for |
//! |-------|----------|
//! | [`WireType::is_wire_primitive`] | every [`WirePrimitiveKind`] |
//! | [`WireType::is_fixed_size`] | Int32, Int64, Boolean, UInt16, UInt32, UInt64 |
//! | [`WireType::is_one_dimensional_array`] | arrays of rank 1 |
//! | [`WireType::is_one_dimensional_primitive_array`] | rank-1 arrays of wire primitives |
//! | [`WireType::is_nullable`] | instantiations of `System.Nullable`1` |

mod base;
mod builder;
mod identity;
mod name;
mod primitives;
mod registry;

pub use base::{
    Factory, FieldDef, Instance, TypeAttributes, TypeHandle, WireFlavor, WireType,
    NULLABLE_DEFINITION,
};
pub use builder::TypeBuilder;
pub use identity::{AssemblyIdentity, AssemblyVersion};
pub use name::{TypeNameSpec, MAX_NESTING_DEPTH};
pub use primitives::{WirePrimitive, WirePrimitiveKind};
pub use registry::{TypeLookup, TypeRegistry};
