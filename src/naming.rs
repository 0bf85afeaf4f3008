//! Compact type names.
//!
//! Assembly-qualified names are long and dominated by a handful of qualifiers that repeat in
//! every stream. The [`NameCompressor`] shortens them before they are written:
//!
//! 1. Each configured assembly qualifier (the part of the name starting at `", Version"`) is
//!    replaced by a short placeholder. By default there is one entry, the core library, whose
//!    placeholder is [`CORE_PLACEHOLDER`].
//! 2. The default fragments `", Culture=neutral"`, `", PublicKeyToken=null"` and
//!    `", Version=1.0.0.0"` are removed.
//!
//! [`NameCompressor::expand`] only reverses step 1. Removed fragments are not restored; lookup
//! tolerates their absence because a partial assembly identity matches any registered one with
//! the same simple name.
//!
//! ```text
//! System.Int32, System.Private.CoreLib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e
//!   -> System.Int32, System.Private.CoreLib,%core%
//! Shop.Order, Shop, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null
//!   -> Shop.Order, Shop
//! ```
//!
//! A user assembly whose name contains a placeholder token expands incorrectly. This is an
//! accepted limitation of the format.

use crate::{
    typesystem::{AssemblyIdentity, TypeRegistry, WireType},
    Result,
};

/// Placeholder standing in for the core library qualifier.
pub const CORE_PLACEHOLDER: &str = ",%core%";

/// Qualifier fragments removed by compression and never restored.
const STRIPPED_FRAGMENTS: [&str; 3] = [
    ", Culture=neutral",
    ", PublicKeyToken=null",
    ", Version=1.0.0.0",
];

/// One entry of the qualifier substitution table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifierSubstitution {
    /// Qualifier text as it appears in a full name, e.g. `", Version=4.0.0.0, Culture=..."`
    pub suffix: String,
    /// Short token written instead, e.g. `",%core%"`
    pub placeholder: String,
}

/// Converts assembly-qualified names to their compact form and back.
///
/// # Examples
///
/// ```rust
/// use wiretype::{NameCompressor, TypeRegistry};
///
/// let registry = TypeRegistry::new();
/// let compressor = NameCompressor::for_registry(&registry);
///
/// let full = registry.handle_of::<i32>().assembly_qualified_name();
/// let compact = compressor.compress(&full);
///
/// assert_eq!(compact, "System.Int32, System.Private.CoreLib,%core%");
/// assert_eq!(compressor.expand(&compact), full);
/// ```
#[derive(Debug, Clone)]
pub struct NameCompressor {
    substitutions: Vec<QualifierSubstitution>,
}

impl NameCompressor {
    /// Build a compressor from the assembly-qualified name of any core library type.
    ///
    /// The core qualifier is everything from the first `", Version"` on.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the name carries no version qualifier.
    pub fn new(core_qualified_name: &str) -> Result<Self> {
        let start = core_qualified_name.find(", Version").ok_or_else(|| {
            malformed_error!(
                "Core type name has no version qualifier - '{}'",
                core_qualified_name
            )
        })?;

        Ok(NameCompressor {
            substitutions: vec![QualifierSubstitution {
                suffix: core_qualified_name[start..].to_string(),
                placeholder: CORE_PLACEHOLDER.to_string(),
            }],
        })
    }

    /// Build a compressor for the core library of `registry`.
    #[must_use]
    pub fn for_registry(registry: &TypeRegistry) -> Self {
        NameCompressor {
            substitutions: vec![QualifierSubstitution {
                suffix: qualifier_of(registry.core_assembly()),
                placeholder: CORE_PLACEHOLDER.to_string(),
            }],
        }
    }

    /// Add a substitution for another frequently used assembly.
    ///
    /// Substitutions apply in the order they were added, so register longer, more specific
    /// qualifiers first.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty suffix or placeholder, or a placeholder
    /// that is already in use.
    pub fn with_substitution(
        mut self,
        suffix: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Result<Self> {
        let suffix = suffix.into();
        let placeholder = placeholder.into();
        if suffix.is_empty() || placeholder.is_empty() {
            return Err(malformed_error!(
                "Qualifier substitution needs a suffix and a placeholder"
            ));
        }
        if self
            .substitutions
            .iter()
            .any(|entry| entry.placeholder == placeholder)
        {
            return Err(malformed_error!(
                "Placeholder '{}' is already in use",
                placeholder
            ));
        }

        self.substitutions.push(QualifierSubstitution {
            suffix,
            placeholder,
        });
        Ok(self)
    }

    /// Add a substitution for `assembly`, using its full display-name qualifier as suffix.
    ///
    /// # Errors
    /// Same as [`NameCompressor::with_substitution`].
    pub fn with_assembly(
        self,
        assembly: &AssemblyIdentity,
        placeholder: impl Into<String>,
    ) -> Result<Self> {
        self.with_substitution(qualifier_of(assembly), placeholder)
    }

    /// The qualifier substitution table, in application order.
    #[must_use]
    pub fn substitutions(&self) -> &[QualifierSubstitution] {
        &self.substitutions
    }

    /// Shorten an assembly-qualified name.
    #[must_use]
    pub fn compress(&self, name: &str) -> String {
        let mut compact = name.to_string();
        for entry in &self.substitutions {
            if compact.contains(&entry.suffix) {
                compact = compact.replace(&entry.suffix, &entry.placeholder);
            }
        }
        for fragment in STRIPPED_FRAGMENTS {
            if compact.contains(fragment) {
                compact = compact.replace(fragment, "");
            }
        }

        compact
    }

    /// Restore every placeholder in a compact name.
    #[must_use]
    pub fn expand(&self, compact: &str) -> String {
        let mut name = compact.to_string();
        for entry in &self.substitutions {
            if name.contains(&entry.placeholder) {
                name = name.replace(&entry.placeholder, &entry.suffix);
            }
        }

        name
    }

    /// Compact name of a type.
    #[must_use]
    pub fn compress_type(&self, wire_type: &WireType) -> String {
        self.compress(&wire_type.assembly_qualified_name())
    }
}

/// The part of an assembly display name following the simple name.
fn qualifier_of(assembly: &AssemblyIdentity) -> String {
    let mut display = assembly.display_name();
    display.split_off(assembly.name.len())
}
