use std::{
    any::Any,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    sync::Arc,
};

use bitflags::bitflags;

use crate::{
    typesystem::{AssemblyIdentity, WirePrimitiveKind},
    Error::UnsupportedType,
    Result,
};

/// An uninitialized instance produced by [`crate::TypeLookup::allocate_uninitialized`].
pub type Instance = Box<dyn Any + Send>;

/// Constructor used to allocate an instance for populate-in-place deserialization.
pub type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Full name of the generic optional wrapper definition.
pub const NULLABLE_DEFINITION: &str = "System.Nullable`1";

bitflags! {
    /// Structural attributes of a [`WireType`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeAttributes: u32 {
        /// Values are copied rather than referenced
        const VALUE_TYPE = 0x0001;
        /// Open generic definition, e.g. `System.Nullable`1`
        const GENERIC_DEFINITION = 0x0002;
        /// Built by the registry from other types (arrays, generic instances)
        const CONSTRUCTED = 0x0004;
        /// The registry's own `System.Nullable`1` definition
        const NULLABLE = 0x0008;
    }
}

/// The fundamental category of a [`WireType`].
#[derive(Debug, Clone)]
pub enum WireFlavor {
    /// One of the built-in wire primitives
    Primitive(WirePrimitiveKind),
    /// `System.Object`
    Object,
    /// A reference type
    Class,
    /// A user-defined value type
    ValueType,
    /// An array of `element` with `rank` dimensions
    Array {
        /// The element type
        element: TypeHandle,
        /// The number of dimensions
        rank: u32,
    },
    /// An open generic definition with `arity` type parameters
    GenericDefinition {
        /// Number of generic parameters
        arity: u32,
    },
    /// A closed generic instantiation
    GenericInstance {
        /// The open definition being instantiated
        definition: TypeHandle,
        /// The type arguments, in declaration order
        args: Vec<TypeHandle>,
    },
}

/// A declared field of a [`WireType`].
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name as written into version-tolerant manifests
    pub name: String,
    /// Declared type of the field
    pub field_type: TypeHandle,
}

/// A concrete data type known to a [`crate::TypeRegistry`].
pub struct WireType {
    /// Registry-local id, assigned in registration order
    pub id: u32,
    /// Namespace (can be empty)
    pub namespace: String,
    /// Simple name, including the generic arity marker (e.g. "Nullable`1")
    pub name: String,
    /// The assembly that defines this type
    pub assembly: Arc<AssemblyIdentity>,
    /// The type category
    pub flavor: WireFlavor,
    /// Structural attributes
    pub attributes: TypeAttributes,
    /// Declared fields, in declaration order
    pub fields: Vec<FieldDef>,
    /// Optional constructor for populate-in-place deserialization
    pub(crate) factory: Option<Factory>,
}

impl WireType {
    /// Returns the namespace-qualified name, including generic arguments and array suffixes.
    ///
    /// Generic arguments are rendered assembly-qualified inside double brackets, the way the
    /// runtime formats them:
    ///
    /// ```text
    /// System.Nullable`1[[System.Int32, System.Private.CoreLib, Version=4.0.0.0, ...]]
    /// ```
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.flavor {
            WireFlavor::Array { element, rank } => {
                let mut name = element.full_name();
                name.push('[');
                for _ in 1..*rank {
                    name.push(',');
                }
                name.push(']');
                name
            }
            WireFlavor::GenericInstance { definition, args } => {
                let mut name = definition.full_name();
                name.push('[');
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        name.push(',');
                    }
                    name.push('[');
                    name.push_str(&arg.assembly_qualified_name());
                    name.push(']');
                }
                name.push(']');
                name
            }
            _ => {
                if self.namespace.is_empty() {
                    self.name.clone()
                } else {
                    format!("{0}.{1}", self.namespace, self.name)
                }
            }
        }
    }

    /// Returns the full name followed by the display name of the defining assembly.
    #[must_use]
    pub fn assembly_qualified_name(&self) -> String {
        format!("{}, {}", self.full_name(), self.assembly.display_name())
    }

    /// The primitive kind, if this is a wire primitive.
    #[must_use]
    pub fn primitive_kind(&self) -> Option<WirePrimitiveKind> {
        match self.flavor {
            WireFlavor::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Check if this is one of the serializer's built-in primitive kinds.
    #[must_use]
    pub fn is_wire_primitive(&self) -> bool {
        self.primitive_kind().is_some()
    }

    /// Check if values of this type have a constant encoded width.
    #[must_use]
    pub fn is_fixed_size(&self) -> bool {
        self.primitive_kind()
            .is_some_and(|kind| kind.is_fixed_size())
    }

    /// The constant encoded width of this type in bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedType`] unless [`WireType::is_fixed_size`] holds.
    pub fn size_of(&self) -> Result<usize> {
        self.primitive_kind()
            .and_then(|kind| kind.size_of())
            .ok_or_else(|| UnsupportedType(self.full_name()))
    }

    /// Check if this is a value type.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.attributes.contains(TypeAttributes::VALUE_TYPE)
    }

    /// Check if this is an array of any rank.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.flavor, WireFlavor::Array { .. })
    }

    /// Element type of an array.
    #[must_use]
    pub fn element_type(&self) -> Option<&TypeHandle> {
        match &self.flavor {
            WireFlavor::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Check if this is an array with exactly one dimension.
    #[must_use]
    pub fn is_one_dimensional_array(&self) -> bool {
        matches!(self.flavor, WireFlavor::Array { rank: 1, .. })
    }

    /// Check if this is a one-dimensional array of wire primitives.
    ///
    /// Such arrays are eligible for a flat bulk-copy codec instead of per-element dispatch.
    #[must_use]
    pub fn is_one_dimensional_primitive_array(&self) -> bool {
        match &self.flavor {
            WireFlavor::Array { element, rank: 1 } => element.is_wire_primitive(),
            _ => false,
        }
    }

    /// Check if this is an instantiation of the generic optional wrapper `System.Nullable`1`.
    ///
    /// Only the core library's definition counts; a user type registered under the same name
    /// is an ordinary generic.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match &self.flavor {
            WireFlavor::GenericInstance { definition, .. } => {
                definition.attributes.contains(TypeAttributes::NULLABLE)
            }
            _ => false,
        }
    }

    /// The type wrapped by a nullable instantiation.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedType`] unless [`WireType::is_nullable`] holds.
    pub fn nullable_element(&self) -> Result<TypeHandle> {
        match &self.flavor {
            WireFlavor::GenericInstance { args, .. } if self.is_nullable() => args
                .first()
                .cloned()
                .ok_or_else(|| UnsupportedType(self.full_name())),
            _ => Err(UnsupportedType(self.full_name())),
        }
    }

    /// Check if this is an open generic definition.
    #[must_use]
    pub fn is_generic_definition(&self) -> bool {
        self.attributes.contains(TypeAttributes::GENERIC_DEFINITION)
    }

    /// Generic arguments of a closed instantiation, empty otherwise.
    #[must_use]
    pub fn generic_args(&self) -> &[TypeHandle] {
        match &self.flavor {
            WireFlavor::GenericInstance { args, .. } => args,
            _ => &[],
        }
    }

    /// Field names in declaration order, as UTF-8 bytes.
    #[must_use]
    pub fn field_names(&self) -> Vec<&[u8]> {
        self.fields.iter().map(|field| field.name.as_bytes()).collect()
    }

    /// Check if a constructor is registered for this type.
    #[must_use]
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }
}

impl fmt::Debug for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireType")
            .field("id", &self.id)
            .field("name", &self.assembly_qualified_name())
            .field("attributes", &self.attributes)
            .field("fields", &self.fields.len())
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

/// Shared, immutable reference to a [`WireType`].
///
/// Equality and hashing are by identity of the underlying type, not by name: two handles are
/// equal iff they point at the same registered type.
#[derive(Clone)]
pub struct TypeHandle(Arc<WireType>);

impl TypeHandle {
    pub(crate) fn new(wire_type: WireType) -> Self {
        TypeHandle(Arc::new(wire_type))
    }

    /// Check whether two handles refer to the same type.
    #[must_use]
    pub fn ptr_eq(&self, other: &TypeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for TypeHandle {
    type Target = WireType;

    fn deref(&self) -> &WireType {
        &self.0
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.full_name())
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use crate::{
        typesystem::{AssemblyIdentity, AssemblyVersion, TypeBuilder, TypeRegistry, WirePrimitiveKind},
        Error,
    };

    #[test]
    fn test_size_of_follows_table() {
        let registry = TypeRegistry::new();

        for kind in WirePrimitiveKind::iter() {
            let handle = registry.primitive(kind);
            assert!(handle.is_wire_primitive());
            match kind.size_of() {
                Some(size) => assert_eq!(handle.size_of().unwrap(), size),
                None => assert!(matches!(handle.size_of(), Err(Error::UnsupportedType(_)))),
            }
        }

        assert!(!registry.object().is_fixed_size());
        assert!(matches!(
            registry.object().size_of(),
            Err(Error::UnsupportedType(name)) if name == "System.Object"
        ));
    }

    #[test]
    fn test_shape_queries() {
        let registry = TypeRegistry::new();
        let assembly = AssemblyIdentity::new("App", AssemblyVersion::new(1, 0, 0, 0));
        let user = TypeBuilder::new("App", "Node", assembly)
            .register(&registry)
            .unwrap();

        assert!(!user.is_wire_primitive());
        assert!(!user.is_array());

        let users = registry.array_of(&user, 1).unwrap();
        assert!(users.is_one_dimensional_array());
        assert!(!users.is_one_dimensional_primitive_array());
        assert!(!users.is_wire_primitive());

        let bytes = registry.array_of(&registry.handle_of::<u8>(), 1).unwrap();
        assert!(bytes.is_one_dimensional_primitive_array());

        assert!(matches!(
            user.nullable_element(),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_handle_identity() {
        let registry = TypeRegistry::new();
        let a = registry.handle_of::<i32>();
        let b = registry.handle_of::<i32>();
        let other = TypeRegistry::new().handle_of::<i32>();

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(a.full_name(), other.full_name());
        assert_eq!(format!("{a:?}"), "TypeHandle(System.Int32)");
    }
}
