//! Builder for user-defined types.
//!
//! This module provides the [`TypeBuilder`] struct, a fluent API for describing classes, value
//! types and generic definitions and registering them in a [`TypeRegistry`].
//!
//! # Example
//!
//! ```rust
//! use wiretype::{AssemblyIdentity, AssemblyVersion, TypeBuilder, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! let assembly = AssemblyIdentity::new("Shop", AssemblyVersion::new(1, 0, 0, 0));
//!
//! let order = TypeBuilder::new("Shop.Model", "Order", assembly)
//!     .field("Id", registry.handle_of::<i64>())
//!     .field("Customer", registry.handle_of::<String>())
//!     .register(&registry)?;
//!
//! assert_eq!(
//!     order.assembly_qualified_name(),
//!     "Shop.Model.Order, Shop, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"
//! );
//! # Ok::<(), wiretype::Error>(())
//! ```

use std::{any::Any, sync::Arc};

use crate::{
    typesystem::{
        base::{Factory, Instance},
        AssemblyIdentity, FieldDef, TypeAttributes, TypeHandle, TypeRegistry, WireFlavor,
        WireType,
    },
    Result,
};

/// Provides a fluent API for describing a type before registration
pub struct TypeBuilder {
    namespace: String,
    name: String,
    assembly: AssemblyIdentity,
    value_type: bool,
    arity: u32,
    fields: Vec<FieldDef>,
    factory: Option<Factory>,
}

impl TypeBuilder {
    /// Start describing a reference type `namespace.name` defined in `assembly`.
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace, may be empty
    /// * 'name'      - Simple name
    /// * 'assembly'  - The defining assembly
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        assembly: AssemblyIdentity,
    ) -> Self {
        TypeBuilder {
            namespace: namespace.into(),
            name: name.into(),
            assembly,
            value_type: false,
            arity: 0,
            fields: Vec::new(),
            factory: None,
        }
    }

    /// Mark the type as a value type.
    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.value_type = true;
        self
    }

    /// Append a field; declaration order is the order of calls.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field_type: TypeHandle) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            field_type,
        });
        self
    }

    /// Make this an open generic definition with `arity` parameters.
    ///
    /// The arity marker (e.g. "`2") is appended to the name if missing.
    #[must_use]
    pub fn generic_arity(mut self, arity: u32) -> Self {
        self.arity = arity;
        self
    }

    /// Register `T::default` as the constructor used by
    /// [`crate::TypeLookup::allocate_uninitialized`].
    #[must_use]
    pub fn factory<T: Default + Any + Send>(mut self) -> Self {
        let factory: Factory = Arc::new(|| -> Instance { Box::new(T::default()) });
        self.factory = Some(factory);
        self
    }

    /// Register the described type.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateType`] if a type with the same name is already
    /// registered for the same assembly.
    pub fn register(self, registry: &TypeRegistry) -> Result<TypeHandle> {
        let mut attributes = TypeAttributes::empty();
        if self.value_type {
            attributes |= TypeAttributes::VALUE_TYPE;
        }

        let mut name = self.name;
        let flavor = if self.arity > 0 {
            attributes |= TypeAttributes::GENERIC_DEFINITION;
            let marker = format!("`{}", self.arity);
            if !name.ends_with(&marker) {
                name.push_str(&marker);
            }
            WireFlavor::GenericDefinition { arity: self.arity }
        } else if self.value_type {
            WireFlavor::ValueType
        } else {
            WireFlavor::Class
        };

        registry.insert(WireType {
            id: 0,
            namespace: self.namespace,
            name,
            assembly: Arc::new(self.assembly),
            flavor,
            attributes,
            fields: self.fields,
            factory: self.factory,
        })
    }
}
