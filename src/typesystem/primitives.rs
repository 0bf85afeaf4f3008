use strum::{EnumCount, EnumIter};

/// The built-in primitive kinds the serializer encodes directly.
///
/// This is a closed set: the outer encoder takes a direct-primitive code path for these and a
/// structured code path for everything else, and one-dimensional arrays of them are eligible for
/// a flat bulk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum WirePrimitiveKind {
    /// System.Int32 - signed 32-bit integer
    Int32,
    /// System.Int64 - signed 64-bit integer
    Int64,
    /// System.Int16 - signed 16-bit integer
    Int16,
    /// System.UInt32 - unsigned 32-bit integer
    UInt32,
    /// System.UInt64 - unsigned 64-bit integer
    UInt64,
    /// System.UInt16 - unsigned 16-bit integer
    UInt16,
    /// System.Byte - unsigned 8-bit integer
    Byte,
    /// System.SByte - signed 8-bit integer
    SByte,
    /// System.Boolean - true/false value
    Boolean,
    /// System.DateTime - point in time
    DateTime,
    /// System.String - immutable UTF string
    String,
    /// System.Guid - 128-bit unique identifier
    Guid,
    /// System.Single - 32-bit floating point
    Single,
    /// System.Double - 64-bit floating point
    Double,
    /// System.Decimal - 128-bit high precision decimal
    Decimal,
    /// System.Char - single UTF-16 character
    Char,
}

impl WirePrimitiveKind {
    /// Namespace of the runtime type.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        "System"
    }

    /// Simple name of the runtime type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            WirePrimitiveKind::Int32 => "Int32",
            WirePrimitiveKind::Int64 => "Int64",
            WirePrimitiveKind::Int16 => "Int16",
            WirePrimitiveKind::UInt32 => "UInt32",
            WirePrimitiveKind::UInt64 => "UInt64",
            WirePrimitiveKind::UInt16 => "UInt16",
            WirePrimitiveKind::Byte => "Byte",
            WirePrimitiveKind::SByte => "SByte",
            WirePrimitiveKind::Boolean => "Boolean",
            WirePrimitiveKind::DateTime => "DateTime",
            WirePrimitiveKind::String => "String",
            WirePrimitiveKind::Guid => "Guid",
            WirePrimitiveKind::Single => "Single",
            WirePrimitiveKind::Double => "Double",
            WirePrimitiveKind::Decimal => "Decimal",
            WirePrimitiveKind::Char => "Char",
        }
    }

    /// Every primitive except `String` is a value type.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        !matches!(self, WirePrimitiveKind::String)
    }

    /// Check if values of this kind have a constant encoded width.
    ///
    /// Only 32/64-bit signed integers, booleans and 16/32/64-bit unsigned integers qualify.
    #[must_use]
    pub fn is_fixed_size(&self) -> bool {
        self.size_of().is_some()
    }

    /// The constant encoded width in bytes, `None` for variable or unlisted kinds.
    ///
    /// Widths are platform independent.
    #[must_use]
    pub fn size_of(&self) -> Option<usize> {
        match self {
            WirePrimitiveKind::Int32 => Some(4),
            WirePrimitiveKind::Int64 => Some(8),
            WirePrimitiveKind::Boolean => Some(1),
            WirePrimitiveKind::UInt16 => Some(2),
            WirePrimitiveKind::UInt32 => Some(4),
            WirePrimitiveKind::UInt64 => Some(8),
            _ => None,
        }
    }
}

/// Rust types that map onto a wire primitive.
///
/// Used with [`crate::TypeRegistry::handle_of`] to obtain the runtime type handle of a Rust
/// value without spelling out its name.
pub trait WirePrimitive {
    /// The primitive kind this Rust type encodes as
    const KIND: WirePrimitiveKind;
}

macro_rules! wire_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl WirePrimitive for $ty {
                const KIND: WirePrimitiveKind = WirePrimitiveKind::$kind;
            }
        )*
    };
}

wire_primitive! {
    i32 => Int32,
    i64 => Int64,
    i16 => Int16,
    u32 => UInt32,
    u64 => UInt64,
    u16 => UInt16,
    u8 => Byte,
    i8 => SByte,
    bool => Boolean,
    String => String,
    &str => String,
    uguid::Guid => Guid,
    f32 => Single,
    f64 => Double,
    char => Char,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_fixed_size_table() {
        let expected = [
            (WirePrimitiveKind::Int32, 4),
            (WirePrimitiveKind::Int64, 8),
            (WirePrimitiveKind::Boolean, 1),
            (WirePrimitiveKind::UInt16, 2),
            (WirePrimitiveKind::UInt32, 4),
            (WirePrimitiveKind::UInt64, 8),
        ];

        for kind in WirePrimitiveKind::iter() {
            let size = expected
                .iter()
                .find(|(candidate, _)| *candidate == kind)
                .map(|(_, size)| *size);
            assert_eq!(kind.size_of(), size, "{kind:?}");
            assert_eq!(kind.is_fixed_size(), size.is_some(), "{kind:?}");
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = WirePrimitiveKind::iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), WirePrimitiveKind::COUNT);
    }

    #[test]
    fn test_rust_mapping() {
        assert_eq!(<i32 as WirePrimitive>::KIND, WirePrimitiveKind::Int32);
        assert_eq!(<uguid::Guid as WirePrimitive>::KIND, WirePrimitiveKind::Guid);
        assert_eq!(<&str as WirePrimitive>::KIND, WirePrimitiveKind::String);
        assert!(!WirePrimitiveKind::String.is_value_type());
        assert!(WirePrimitiveKind::Decimal.is_value_type());
    }
}
