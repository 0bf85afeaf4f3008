//! Type registry resolving assembly-qualified names to type handles.
//!
//! The [`TypeRegistry`] is the crate's implementation of the [`TypeLookup`] capability: the
//! runtime type-information service the resolver consults when a compact name has been expanded
//! back into an assembly-qualified name.
//!
//! # Key Components
//!
//! - [`TypeLookup`] - Capability interface: name lookup and uninitialized allocation
//! - [`TypeRegistry`] - Thread-safe registry of core, user and constructed types
//!
//! # Registry Architecture
//!
//! - **Primary storage**: append-only `boxcar::Vec` of handles in registration order
//! - **Name index**: `DashMap` from namespace-qualified name to every type carrying that name
//!   (the same name may exist in several assemblies)
//! - **Constructed types**: arrays and generic instantiations are created on first lookup and
//!   deduplicated structurally, so the same name always yields the same handle
//!
//! # Thread Safety
//!
//! All operations take `&self` and are safe to call concurrently; no explicit locking is
//! required by consumers.
//!
//! # Examples
//!
//! ```rust
//! use wiretype::{TypeLookup, TypeRegistry, WirePrimitiveKind};
//!
//! let registry = TypeRegistry::new();
//!
//! let int32 = registry.resolve_type_by_name("System.Int32, System.Private.CoreLib")?;
//! assert_eq!(int32, registry.primitive(WirePrimitiveKind::Int32));
//!
//! let array = registry.resolve_type_by_name("System.Int32[], System.Private.CoreLib")?;
//! assert!(array.is_one_dimensional_primitive_array());
//! # Ok::<(), wiretype::Error>(())
//! ```

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use dashmap::DashMap;
use log::debug;
use strum::IntoEnumIterator;

use crate::{
    typesystem::{
        base::{Instance, NULLABLE_DEFINITION},
        name::TypeNameSpec,
        AssemblyIdentity, AssemblyVersion, TypeAttributes, TypeHandle, WireFlavor, WirePrimitive,
        WirePrimitiveKind, WireType,
    },
    Error::{DuplicateType, TypeResolution, UnsupportedType},
    Result,
};

/// Runtime type-information capability consumed by the resolver.
///
/// Implementations map an assembly-qualified name to a type handle and allocate instances for
/// populate-in-place deserialization. They must be safe to call from any thread.
pub trait TypeLookup: Send + Sync {
    /// Look up a type by its assembly-qualified name.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeResolution`] if no loaded type matches and
    /// [`crate::Error::Malformed`] if the name cannot be parsed.
    fn resolve_type_by_name(&self, name: &str) -> Result<TypeHandle>;

    /// Allocate an instance of `handle` without running any user initialization.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedType`] if the type cannot be allocated.
    fn allocate_uninitialized(&self, handle: &TypeHandle) -> Result<Instance>;
}

/// Structural identity of a type built by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstructedKey {
    Array { element: u32, rank: u32 },
    GenericInstance { definition: u32, args: Vec<u32> },
}

/// Identity of the core library on current runtimes.
const CORE_ASSEMBLY_NAME: &str = "System.Private.CoreLib";

/// Public key token of the core library.
const CORE_PUBLIC_KEY_TOKEN: [u8; 8] = [0x7c, 0xec, 0x85, 0xd7, 0xbe, 0xa7, 0x79, 0x8e];

/// Central registry of every type that can appear in a stream.
///
/// A new registry already contains the core assembly with all wire primitives,
/// `System.Object`, `System.ValueType` and the generic definition `System.Nullable`1`. User types
/// are added with [`crate::TypeBuilder`].
pub struct TypeRegistry {
    /// Primary storage, in registration order
    types: boxcar::Vec<TypeHandle>,
    /// Secondary index: types by namespace-qualified name
    by_name: DashMap<String, Vec<TypeHandle>>,
    /// Arrays and generic instantiations built on demand
    constructed: DashMap<ConstructedKey, TypeHandle>,
    /// Counter for registry ids
    next_id: AtomicU32,
    /// Identity of the core library
    core_assembly: Arc<AssemblyIdentity>,
    /// Primitive handles, indexed by `WirePrimitiveKind` discriminant
    primitives: Vec<TypeHandle>,
    /// `System.Object`
    object: TypeHandle,
    /// `System.Nullable`1`
    nullable: TypeHandle,
}

impl TypeRegistry {
    /// Create a registry backed by the default core library identity,
    /// `System.Private.CoreLib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e`.
    #[must_use]
    pub fn new() -> Self {
        let core = AssemblyIdentity::new(CORE_ASSEMBLY_NAME, AssemblyVersion::new(4, 0, 0, 0))
            .with_public_key_token(CORE_PUBLIC_KEY_TOKEN);
        Self::with_core_assembly(core)
    }

    /// Create a registry whose built-in types live in `core_assembly`.
    ///
    /// Use this to mirror a runtime that prints a different core library name.
    #[must_use]
    pub fn with_core_assembly(core_assembly: AssemblyIdentity) -> Self {
        let core_assembly = Arc::new(core_assembly);
        let next_id = AtomicU32::new(0);
        let types = boxcar::Vec::new();
        let by_name: DashMap<String, Vec<TypeHandle>> = DashMap::new();

        let add = |namespace: &str, name: &str, flavor: WireFlavor, attributes: TypeAttributes| {
            let handle = TypeHandle::new(WireType {
                id: next_id.fetch_add(1, Ordering::Relaxed),
                namespace: namespace.to_string(),
                name: name.to_string(),
                assembly: core_assembly.clone(),
                flavor,
                attributes,
                fields: Vec::new(),
                factory: None,
            });
            types.push(handle.clone());
            by_name
                .entry(handle.full_name())
                .or_default()
                .push(handle.clone());
            handle
        };

        let primitives = WirePrimitiveKind::iter()
            .map(|kind| {
                let attributes = if kind.is_value_type() {
                    TypeAttributes::VALUE_TYPE
                } else {
                    TypeAttributes::empty()
                };
                add(
                    kind.namespace(),
                    kind.name(),
                    WireFlavor::Primitive(kind),
                    attributes,
                )
            })
            .collect();

        let object = add("System", "Object", WireFlavor::Object, TypeAttributes::empty());
        add("System", "ValueType", WireFlavor::Class, TypeAttributes::empty());
        let nullable = add(
            "System",
            "Nullable`1",
            WireFlavor::GenericDefinition { arity: 1 },
            TypeAttributes::VALUE_TYPE
                | TypeAttributes::GENERIC_DEFINITION
                | TypeAttributes::NULLABLE,
        );

        TypeRegistry {
            types,
            by_name,
            constructed: DashMap::new(),
            next_id,
            core_assembly,
            primitives,
            object,
            nullable,
        }
    }

    /// Identity of the core library the built-in types belong to.
    #[must_use]
    pub fn core_assembly(&self) -> &AssemblyIdentity {
        &self.core_assembly
    }

    /// Handle of a wire primitive.
    #[must_use]
    pub fn primitive(&self, kind: WirePrimitiveKind) -> TypeHandle {
        self.primitives[kind as usize].clone()
    }

    /// Handle of the wire primitive a Rust type encodes as.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wiretype::TypeRegistry;
    ///
    /// let registry = TypeRegistry::new();
    /// assert_eq!(registry.handle_of::<u16>().size_of()?, 2);
    /// assert_eq!(registry.handle_of::<String>().full_name(), "System.String");
    /// # Ok::<(), wiretype::Error>(())
    /// ```
    #[must_use]
    pub fn handle_of<T: WirePrimitive + ?Sized>(&self) -> TypeHandle {
        self.primitive(T::KIND)
    }

    /// Handle of `System.Object`.
    #[must_use]
    pub fn object(&self) -> TypeHandle {
        self.object.clone()
    }

    /// Handle of `System.Nullable`1[[element]]`, constructed on first use.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeResolution`] if `element` is not a value type or is itself
    /// nullable.
    pub fn nullable_of(&self, element: &TypeHandle) -> Result<TypeHandle> {
        self.make_generic_instance(&self.nullable.clone(), vec![element.clone()])
    }

    /// Handle of an array of `element` with `rank` dimensions, constructed on first use.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeResolution`] for a rank of zero.
    pub fn array_of(&self, element: &TypeHandle, rank: u32) -> Result<TypeHandle> {
        self.make_array(element, rank)
    }

    /// Look up a type by registry id.
    ///
    /// Ids are unique but concurrent registrations may store them out of order, so this is a
    /// linear scan.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<TypeHandle> {
        self.iter().find(|handle| handle.id == id).cloned()
    }

    /// All types registered under a namespace-qualified name, across assemblies.
    #[must_use]
    pub fn get_by_fullname(&self, full_name: &str) -> Vec<TypeHandle> {
        self.by_name
            .get(full_name)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Number of registered types, constructed types included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.count()
    }

    /// Returns `true` if the registry holds no types. Never the case for a registry built
    /// through [`TypeRegistry::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.count() == 0
    }

    /// Iterate over all registered types in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeHandle> {
        self.types.iter().map(|(_, handle)| handle)
    }

    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a fully described type under its namespace-qualified name.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateType`] if the same name already exists in the same
    /// assembly.
    pub(crate) fn insert(&self, mut wire_type: WireType) -> Result<TypeHandle> {
        let mut entry = self.by_name.entry(wire_type.full_name()).or_default();
        if entry
            .iter()
            .any(|existing| *existing.assembly == *wire_type.assembly)
        {
            return Err(DuplicateType(wire_type.assembly_qualified_name()));
        }

        wire_type.id = self.next_id();
        let handle = TypeHandle::new(wire_type);
        self.types.push(handle.clone());
        entry.push(handle.clone());

        debug!("registered type {}", handle.assembly_qualified_name());
        Ok(handle)
    }

    fn make_array(&self, element: &TypeHandle, rank: u32) -> Result<TypeHandle> {
        if rank == 0 {
            return Err(TypeResolution(format!(
                "{} with array rank 0",
                element.full_name()
            )));
        }

        let key = ConstructedKey::Array {
            element: element.id,
            rank,
        };
        let handle = self
            .constructed
            .entry(key)
            .or_insert_with(|| {
                let handle = TypeHandle::new(WireType {
                    id: self.next_id(),
                    namespace: element.namespace.clone(),
                    name: element.name.clone(),
                    assembly: element.assembly.clone(),
                    flavor: WireFlavor::Array {
                        element: element.clone(),
                        rank,
                    },
                    attributes: TypeAttributes::CONSTRUCTED,
                    fields: Vec::new(),
                    factory: None,
                });
                self.types.push(handle.clone());

                debug!("constructed array type {}", handle.full_name());
                handle
            })
            .clone();

        Ok(handle)
    }

    fn make_generic_instance(
        &self,
        definition: &TypeHandle,
        args: Vec<TypeHandle>,
    ) -> Result<TypeHandle> {
        match definition.flavor {
            WireFlavor::GenericDefinition { arity } if arity as usize == args.len() => {}
            _ => {
                return Err(TypeResolution(format!(
                    "{} with {} generic arguments",
                    definition.full_name(),
                    args.len()
                )))
            }
        }

        if definition.ptr_eq(&self.nullable) {
            if let Some(element) = args
                .iter()
                .find(|arg| !arg.is_value_type() || arg.is_nullable())
            {
                return Err(TypeResolution(format!(
                    "{}[[{}]]",
                    NULLABLE_DEFINITION,
                    element.assembly_qualified_name()
                )));
            }
        }

        let key = ConstructedKey::GenericInstance {
            definition: definition.id,
            args: args.iter().map(|arg| arg.id).collect(),
        };
        let handle = self
            .constructed
            .entry(key)
            .or_insert_with(|| {
                let mut attributes = TypeAttributes::CONSTRUCTED;
                if definition.is_value_type() {
                    attributes |= TypeAttributes::VALUE_TYPE;
                }

                let handle = TypeHandle::new(WireType {
                    id: self.next_id(),
                    namespace: definition.namespace.clone(),
                    name: definition.name.clone(),
                    assembly: definition.assembly.clone(),
                    flavor: WireFlavor::GenericInstance {
                        definition: definition.clone(),
                        args,
                    },
                    attributes,
                    fields: definition.fields.clone(),
                    factory: None,
                });
                self.types.push(handle.clone());

                debug!("constructed generic instance {}", handle.full_name());
                handle
            })
            .clone();

        Ok(handle)
    }

    /// Pick the type named `full_name` from the assembly the query asks for.
    ///
    /// Without an assembly the core library wins, otherwise the first registration.
    fn resolve_named(
        &self,
        full_name: &str,
        assembly: Option<&AssemblyIdentity>,
    ) -> Result<TypeHandle> {
        let candidates = self.by_name.get(full_name);
        let found = candidates.as_ref().and_then(|entry| match assembly {
            Some(query) => entry
                .iter()
                .find(|candidate| candidate.assembly.satisfies(query))
                .cloned(),
            None => entry
                .iter()
                .find(|candidate| candidate.assembly == self.core_assembly)
                .or_else(|| entry.first())
                .cloned(),
        });

        found.ok_or_else(|| TypeResolution(full_name.to_string()))
    }

    fn resolve_spec(&self, spec: &TypeNameSpec) -> Result<TypeHandle> {
        let mut handle = self.resolve_named(&spec.full_name, spec.assembly.as_ref())?;

        if !spec.generic_args.is_empty() {
            let args = spec
                .generic_args
                .iter()
                .map(|arg| self.resolve_spec(arg))
                .collect::<Result<Vec<_>>>()?;
            handle = self.make_generic_instance(&handle, args)?;
        } else if handle.is_generic_definition() {
            return Err(TypeResolution(format!(
                "{} is an open generic definition",
                spec.full_name
            )));
        }

        for rank in &spec.array_ranks {
            handle = self.make_array(&handle, *rank)?;
        }

        Ok(handle)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeLookup for TypeRegistry {
    fn resolve_type_by_name(&self, name: &str) -> Result<TypeHandle> {
        let spec = TypeNameSpec::parse(name)?;
        self.resolve_spec(&spec).map_err(|error| match error {
            TypeResolution(_) => TypeResolution(name.to_string()),
            other => other,
        })
    }

    fn allocate_uninitialized(&self, handle: &TypeHandle) -> Result<Instance> {
        match &handle.factory {
            Some(factory) => Ok(factory()),
            None => Err(UnsupportedType(handle.assembly_qualified_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, thread};

    use super::*;
    use crate::{typesystem::TypeBuilder, Error};

    const CORELIB: &str =
        "System.Private.CoreLib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e";

    #[test]
    fn test_registry_primitives() {
        let registry = TypeRegistry::new();

        for kind in WirePrimitiveKind::iter() {
            let handle = registry.primitive(kind);
            assert_eq!(handle.primitive_kind(), Some(kind));
            assert_eq!(handle.namespace, "System");
            assert_eq!(handle.name, kind.name());
            assert_eq!(handle.is_value_type(), kind.is_value_type());
        }

        assert_eq!(
            registry.handle_of::<i32>().assembly_qualified_name(),
            format!("System.Int32, {CORELIB}")
        );
        assert!(!registry.object().is_wire_primitive());
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_resolve_core_names() {
        let registry = TypeRegistry::new();

        let full = registry
            .resolve_type_by_name(&format!("System.String, {CORELIB}"))
            .unwrap();
        assert_eq!(full, registry.handle_of::<String>());

        let short = registry
            .resolve_type_by_name("System.String, System.Private.CoreLib")
            .unwrap();
        assert_eq!(short, full);

        let bare = registry.resolve_type_by_name("System.String").unwrap();
        assert_eq!(bare, full);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = TypeRegistry::new();

        match registry.resolve_type_by_name("Acme.Widget, Acme") {
            Err(Error::TypeResolution(name)) => assert_eq!(name, "Acme.Widget, Acme"),
            other => panic!("unexpected result {other:?}"),
        }

        assert!(matches!(
            registry.resolve_type_by_name("System.Int32, System.Private.CoreLib, Version=9.0.0.0"),
            Err(Error::TypeResolution(_))
        ));
        assert!(matches!(
            registry.resolve_type_by_name("System.Int32[, X"),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_constructed_types_are_deduplicated() {
        let registry = TypeRegistry::new();

        let first = registry
            .resolve_type_by_name("System.Int64[], System.Private.CoreLib")
            .unwrap();
        let second = registry.array_of(&registry.handle_of::<i64>(), 1).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.full_name(), "System.Int64[]");
        assert!(first.is_one_dimensional_primitive_array());

        let matrix = registry
            .resolve_type_by_name("System.Int64[,], System.Private.CoreLib")
            .unwrap();
        assert_ne!(matrix, first);
        assert_eq!(matrix.full_name(), "System.Int64[,]");
        assert!(!matrix.is_one_dimensional_array());

        let jagged = registry.resolve_type_by_name("System.Int64[][]").unwrap();
        assert!(jagged.is_one_dimensional_array());
        assert!(!jagged.is_one_dimensional_primitive_array());
        assert_eq!(jagged.element_type(), Some(&first));
    }

    #[test]
    fn test_nullable_round_trip_name() {
        let registry = TypeRegistry::new();
        let nullable = registry.nullable_of(&registry.handle_of::<i32>()).unwrap();

        assert!(nullable.is_nullable());
        assert!(nullable.is_value_type());
        assert_eq!(
            nullable.nullable_element().unwrap(),
            registry.handle_of::<i32>()
        );

        let resolved = registry
            .resolve_type_by_name(&nullable.assembly_qualified_name())
            .unwrap();
        assert_eq!(resolved, nullable);

        assert!(registry.nullable_of(&registry.handle_of::<String>()).is_err());
        assert!(registry.nullable_of(&nullable).is_err());
    }

    #[test]
    fn test_nullable_constraints_by_name() {
        let registry = TypeRegistry::new();

        for name in [
            "System.Nullable`1[[System.String]]",
            "System.Nullable`1[[System.Object]]",
            "System.Nullable`1[[System.Nullable`1[[System.Int32]]]]",
            "System.Nullable`1[[System.Int32[]]]",
        ] {
            assert!(
                matches!(
                    registry.resolve_type_by_name(name),
                    Err(Error::TypeResolution(ref failed)) if failed == name
                ),
                "{name}"
            );
        }

        let valid = registry
            .resolve_type_by_name("System.Nullable`1[[System.Int32]]")
            .unwrap();
        assert_eq!(valid, registry.nullable_of(&registry.handle_of::<i32>()).unwrap());
    }

    #[test]
    fn test_user_nullable_lookalike() {
        let registry = TypeRegistry::new();
        let fake = AssemblyIdentity::new("Fake", AssemblyVersion::new(1, 0, 0, 0));
        TypeBuilder::new("System", "Nullable", fake)
            .generic_arity(1)
            .register(&registry)
            .unwrap();

        let lookalike = registry
            .resolve_type_by_name("System.Nullable`1[[System.String]], Fake")
            .unwrap();
        assert!(!lookalike.is_nullable());
        assert!(lookalike.nullable_element().is_err());

        let core = registry
            .resolve_type_by_name("System.Nullable`1[[System.Int32]]")
            .unwrap();
        assert!(core.is_nullable());
    }

    #[test]
    fn test_bound_array_suffix_rejected() {
        let registry = TypeRegistry::new();

        assert!(matches!(
            registry.resolve_type_by_name("System.Int32[*]"),
            Err(Error::Malformed { .. })
        ));
        assert_eq!(
            registry
                .resolve_type_by_name("System.Int32[]")
                .unwrap()
                .full_name(),
            "System.Int32[]"
        );
    }

    #[test]
    fn test_generic_arity_checked() {
        let registry = TypeRegistry::new();

        assert!(registry.resolve_type_by_name("System.Nullable`1").is_err());
        assert!(registry
            .resolve_type_by_name("System.Nullable`1[[System.Int32],[System.Int64]]")
            .is_err());
        assert!(registry
            .resolve_type_by_name("System.Int32[[System.Int64]]")
            .is_err());
    }

    #[test]
    fn test_same_name_in_two_assemblies() {
        let registry = TypeRegistry::new();
        let v1 = AssemblyIdentity::new("Shop", AssemblyVersion::new(1, 0, 0, 0));
        let v2 = AssemblyIdentity::new("Shop", AssemblyVersion::new(2, 0, 0, 0));

        let old = TypeBuilder::new("Shop", "Order", v1).register(&registry).unwrap();
        let new = TypeBuilder::new("Shop", "Order", v2).register(&registry).unwrap();
        assert_ne!(old, new);
        assert_eq!(registry.get_by_fullname("Shop.Order").len(), 2);

        let resolved = registry
            .resolve_type_by_name("Shop.Order, Shop, Version=2.0.0.0")
            .unwrap();
        assert_eq!(resolved, new);

        let unversioned = registry.resolve_type_by_name("Shop.Order, Shop").unwrap();
        assert_eq!(unversioned, old);
    }

    #[test]
    fn test_allocate_uninitialized() {
        #[derive(Default)]
        struct Point {
            x: i32,
        }

        let registry = TypeRegistry::new();
        let assembly = AssemblyIdentity::new("Geo", AssemblyVersion::new(1, 0, 0, 0));
        let point = TypeBuilder::new("Geo", "Point", assembly)
            .value_type()
            .field("x", registry.handle_of::<i32>())
            .factory::<Point>()
            .register(&registry)
            .unwrap();

        let instance = registry.allocate_uninitialized(&point).unwrap();
        assert_eq!(instance.downcast_ref::<Point>().map(|p| p.x), Some(0));

        assert!(matches!(
            registry.allocate_uninitialized(&registry.object()),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_concurrent_construction() {
        let registry = Arc::new(TypeRegistry::new());

        let handles: Vec<TypeHandle> = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let registry = registry.clone();
                    scope.spawn(move || {
                        registry
                            .resolve_type_by_name("System.Guid[], System.Private.CoreLib")
                            .unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(handles.windows(2).all(|pair| pair[0] == pair[1]));
        let ids: HashSet<u32> = registry.iter().map(|handle| handle.id).collect();
        assert_eq!(ids.len(), registry.len());
        assert_eq!(registry.get(handles[0].id), Some(handles[0].clone()));
    }
}
