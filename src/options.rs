//! Encoder configuration for type references.

/// Controls how [`crate::TypeResolver::write_type`] encodes a type reference.
///
/// The first occurrence of a type in a stream is written by name, either plain or followed by
/// its field manifest. Later occurrences are written as a 2-byte session id unless index
/// preservation is turned off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Write a field manifest after the name of every newly encountered type (default: false)
    pub version_tolerance: bool,

    /// Write repeated types as indexed back-references (default: true)
    pub preserve_type_index: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            version_tolerance: false,
            preserve_type_index: true,
        }
    }
}

impl SerializerOptions {
    /// Options producing the smallest streams: plain names, indexed repeats.
    #[must_use]
    pub fn compact() -> Self {
        Self::default()
    }

    /// Options for streams read by other schema versions: manifests, indexed repeats.
    #[must_use]
    pub fn version_tolerant() -> Self {
        Self {
            version_tolerance: true,
            preserve_type_index: true,
        }
    }

    /// Set whether field manifests are written.
    #[must_use]
    pub fn with_version_tolerance(mut self, enabled: bool) -> Self {
        self.version_tolerance = enabled;
        self
    }

    /// Set whether repeated types are written as indexed back-references.
    #[must_use]
    pub fn with_preserve_type_index(mut self, enabled: bool) -> Self {
        self.preserve_type_index = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(SerializerOptions::compact(), SerializerOptions::default());
        assert!(SerializerOptions::default().preserve_type_index);
        assert!(!SerializerOptions::default().version_tolerance);

        let tolerant = SerializerOptions::version_tolerant();
        assert!(tolerant.version_tolerance);
        assert_eq!(
            tolerant,
            SerializerOptions::default().with_version_tolerance(true)
        );
        assert!(!tolerant.with_preserve_type_index(false).preserve_type_index);
    }
}
