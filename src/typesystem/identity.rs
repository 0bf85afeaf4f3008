//! Assembly identity for assembly-qualified type names.
//!
//! Type names on the wire carry the display name of the assembly that defines the type, e.g.
//!
//! ```text
//! System.Int32, System.Private.CoreLib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e
//! ```
//!
//! Compact names drop the culture, public key token and version fragments whenever they carry
//! default values, so an identity parsed from a compact name is usually only partially
//! specified. [`AssemblyIdentity::satisfies`] implements the matching rule the registry uses:
//! only the components present in the query are compared.
//!
//! # Key Components
//!
//! - [`AssemblyIdentity`] - Name, version, culture and public key token of an assembly
//! - [`AssemblyVersion`] - Four-part version number (major.minor.build.revision)

use std::{fmt, fmt::Write as _, str::FromStr};

use crate::{Error, Result};

/// Identity of the assembly (deployable unit) that defines a type.
///
/// Registered types always carry a version; identities parsed from compact names may omit it.
/// A missing culture means culture-neutral and a missing token means `PublicKeyToken=null`.
///
/// # Examples
///
/// ```rust
/// use wiretype::AssemblyIdentity;
///
/// let core = AssemblyIdentity::parse(
///     "System.Private.CoreLib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e",
/// )?;
/// let query = AssemblyIdentity::parse("System.Private.CoreLib")?;
///
/// assert!(core.satisfies(&query));
/// assert_eq!(
///     core.display_name(),
///     "System.Private.CoreLib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e"
/// );
/// # Ok::<(), wiretype::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    /// Simple assembly name
    pub name: String,
    /// Four-part version, `None` if not specified
    pub version: Option<AssemblyVersion>,
    /// Culture, `None` for culture-neutral
    pub culture: Option<String>,
    /// 8-byte public key token, `None` for `PublicKeyToken=null`
    pub public_key_token: Option<[u8; 8]>,
}

/// Four-part assembly version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AssemblyVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl AssemblyVersion {
    /// Create a new version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a dotted version with one to four components; missing components are zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for empty input, more than four components or a
    /// component that is not a `u16`.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.trim().split('.').collect();
        if version_str.trim().is_empty() || parts.len() > 4 {
            return Err(malformed_error!("Invalid assembly version - '{}'", version_str));
        }

        let mut components = [0_u16; 4];
        for (slot, part) in components.iter_mut().zip(parts.iter()) {
            *slot = part.parse::<u16>().map_err(|_| {
                malformed_error!(
                    "Invalid assembly version component '{}' in '{}'",
                    part,
                    version_str
                )
            })?;
        }

        Ok(AssemblyVersion::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl AssemblyIdentity {
    /// Create a fully specified, culture-neutral identity without a public key token.
    #[must_use]
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        AssemblyIdentity {
            name: name.into(),
            version: Some(version),
            culture: None,
            public_key_token: None,
        }
    }

    /// Set the culture (`None` for neutral).
    #[must_use]
    pub fn with_culture(mut self, culture: Option<String>) -> Self {
        self.culture = culture.filter(|c| !c.eq_ignore_ascii_case("neutral"));
        self
    }

    /// Set the public key token.
    #[must_use]
    pub fn with_public_key_token(mut self, token: [u8; 8]) -> Self {
        self.public_key_token = Some(token);
        self
    }

    /// Parse an assembly display name.
    ///
    /// # Format
    ///
    /// ```text
    /// AssemblyName[, Version=Major.Minor.Build.Revision][, Culture=culture][, PublicKeyToken=token]
    /// ```
    ///
    /// Unknown components (e.g. `ProcessorArchitecture`, `Retargetable`) are ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the name is empty or a component cannot be parsed.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default().to_string();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut identity = AssemblyIdentity {
            name,
            version: None,
            culture: None,
            public_key_token: None,
        };

        for part in parts {
            if let Some(value) = part.strip_prefix("Version=") {
                identity.version = Some(AssemblyVersion::parse(value)?);
            } else if let Some(value) = part.strip_prefix("Culture=") {
                if !value.eq_ignore_ascii_case("neutral") && !value.is_empty() {
                    identity.culture = Some(value.to_string());
                }
            } else if let Some(value) = part.strip_prefix("PublicKeyToken=") {
                if !value.eq_ignore_ascii_case("null") && !value.is_empty() {
                    identity.public_key_token = Some(parse_token(value)?);
                }
            }
        }

        Ok(identity)
    }

    /// Render the full display name, including default components.
    ///
    /// Identities without a version render as `Version=0.0.0.0`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len() + 80);

        result.push_str(&self.name);

        let _ = write!(
            result,
            ", Version={}",
            self.version.unwrap_or_default()
        );

        let culture_str = self.culture.as_deref().unwrap_or("neutral");
        let _ = write!(result, ", Culture={}", culture_str);

        result.push_str(", PublicKeyToken=");
        match &self.public_key_token {
            Some(token) => {
                for byte in token {
                    let _ = write!(result, "{:02x}", byte);
                }
            }
            None => result.push_str("null"),
        }

        result
    }

    /// Check whether this (registered) identity matches a possibly partial `query`.
    ///
    /// The simple names must match case-insensitively. Version, culture and public key token
    /// are only compared when the query specifies them.
    #[must_use]
    pub fn satisfies(&self, query: &AssemblyIdentity) -> bool {
        if !self.name.eq_ignore_ascii_case(&query.name) {
            return false;
        }

        if let Some(version) = query.version {
            if self.version.unwrap_or_default() != version {
                return false;
            }
        }

        if let Some(culture) = &query.culture {
            match &self.culture {
                Some(own) if own.eq_ignore_ascii_case(culture) => {}
                _ => return false,
            }
        }

        if let Some(token) = query.public_key_token {
            if self.public_key_token != Some(token) {
                return false;
            }
        }

        true
    }
}

fn parse_token(value: &str) -> Result<[u8; 8]> {
    if value.len() != 16 || !value.is_ascii() {
        return Err(malformed_error!(
            "PublicKeyToken must be exactly 16 hex characters, got '{}'",
            value
        ));
    }

    let mut token = [0_u8; 8];
    for (index, byte) in token.iter_mut().enumerate() {
        let pair = &value[index * 2..index * 2 + 2];
        *byte = u8::from_str_radix(pair, 16)
            .map_err(|_| malformed_error!("Invalid hex in PublicKeyToken '{}'", value))?;
    }

    Ok(token)
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for AssemblyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for AssemblyIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORELIB: &str =
        "System.Private.CoreLib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=7cec85d7bea7798e";

    #[test]
    fn test_assembly_version_parse_full() {
        let version = AssemblyVersion::parse("4.0.0.0").unwrap();
        assert_eq!(version, AssemblyVersion::new(4, 0, 0, 0));
    }

    #[test]
    fn test_assembly_version_parse_partial() {
        assert_eq!(
            AssemblyVersion::parse("1.2").unwrap(),
            AssemblyVersion::new(1, 2, 0, 0)
        );
        assert_eq!(
            AssemblyVersion::parse("7").unwrap(),
            AssemblyVersion::new(7, 0, 0, 0)
        );
    }

    #[test]
    fn test_assembly_version_parse_invalid() {
        assert!(AssemblyVersion::parse("").is_err());
        assert!(AssemblyVersion::parse("1.2.3.4.5").is_err());
        assert!(AssemblyVersion::parse("1.2.abc.4").is_err());
        assert!(AssemblyVersion::parse("1.2.99999.4").is_err());
    }

    #[test]
    fn test_parse_full_display_name() {
        let identity = AssemblyIdentity::parse(CORELIB).unwrap();
        assert_eq!(identity.name, "System.Private.CoreLib");
        assert_eq!(identity.version, Some(AssemblyVersion::new(4, 0, 0, 0)));
        assert_eq!(identity.culture, None);
        assert_eq!(
            identity.public_key_token,
            Some([0x7c, 0xec, 0x85, 0xd7, 0xbe, 0xa7, 0x79, 0x8e])
        );
        assert_eq!(identity.display_name(), CORELIB);
    }

    #[test]
    fn test_parse_simple_name() {
        let identity = AssemblyIdentity::parse("MyApp").unwrap();
        assert_eq!(identity.name, "MyApp");
        assert!(identity.version.is_none());
        assert_eq!(
            identity.display_name(),
            "MyApp, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null"
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(AssemblyIdentity::parse("").is_err());
        assert!(AssemblyIdentity::parse(", Version=1.0.0.0").is_err());
        assert!(AssemblyIdentity::parse("A, PublicKeyToken=abc").is_err());
        assert!(AssemblyIdentity::parse("A, PublicKeyToken=zz00000000000000").is_err());
    }

    #[test]
    fn test_satisfies_partial_query() {
        let registered = AssemblyIdentity::new("MyApp", AssemblyVersion::new(1, 0, 0, 0));

        assert!(registered.satisfies(&AssemblyIdentity::parse("MyApp").unwrap()));
        assert!(registered.satisfies(&AssemblyIdentity::parse("myapp").unwrap()));
        assert!(registered.satisfies(&AssemblyIdentity::parse("MyApp, Version=1.0.0.0").unwrap()));
        assert!(!registered.satisfies(&AssemblyIdentity::parse("MyApp, Version=2.0.0.0").unwrap()));
        assert!(!registered.satisfies(&AssemblyIdentity::parse("MyApp, Culture=de-DE").unwrap()));
        assert!(!registered.satisfies(
            &AssemblyIdentity::parse("MyApp, PublicKeyToken=0123456789abcdef").unwrap()
        ));
        assert!(!registered.satisfies(&AssemblyIdentity::parse("Other").unwrap()));
    }

    #[test]
    fn test_with_culture_normalizes_neutral() {
        let identity = AssemblyIdentity::new("A", AssemblyVersion::new(1, 0, 0, 0))
            .with_culture(Some("neutral".to_string()));
        assert!(identity.culture.is_none());
    }
}
