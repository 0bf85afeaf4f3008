//! Parser for assembly-qualified type names.
//!
//! Handles the grammar the runtime uses when printing type names:
//!
//! ```text
//! aqn        := type-name [ ',' assembly ]
//! type-name  := full-name [ generic-args ] { array-suffix }
//! generic-args := '[' arg { ',' arg } ']'
//! arg        := '[' aqn ']' | type-name
//! array-suffix := '[' { ',' } ']'
//! ```
//!
//! Assembly names inside bracketed generic arguments end at the closing bracket; at the top level
//! they run to the end of the input. The bound-array suffix `[*]` names a different runtime type
//! than `[]` and is rejected.
//!
//! Generic arguments and array suffixes together may nest at most [`MAX_NESTING_DEPTH`] levels
//! deep.

use crate::{typesystem::AssemblyIdentity, Error::RecursionLimit, Result};

/// Maximum nesting depth of generic arguments and array suffixes in a type name
pub const MAX_NESTING_DEPTH: usize = 50;

/// A parsed, not yet resolved, type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNameSpec {
    /// Namespace-qualified name without generic arguments or array suffixes, e.g. "System.Nullable`1"
    pub full_name: String,
    /// Generic arguments, in order
    pub generic_args: Vec<TypeNameSpec>,
    /// Array ranks, innermost first (`Int32[][,]` yields `[1, 2]`)
    pub array_ranks: Vec<u32>,
    /// Assembly the type is qualified with, if any
    pub assembly: Option<AssemblyIdentity>,
}

impl TypeNameSpec {
    /// Parse an assembly-qualified (or plain) type name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unbalanced brackets, empty names, trailing input or
    /// an unparseable assembly name, and [`crate::Error::RecursionLimit`] if generic arguments
    /// and array suffixes nest deeper than [`MAX_NESTING_DEPTH`].
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = NameParser {
            input,
            position: 0,
            depth: 0,
        };
        let spec = parser.parse_qualified(Context::TopLevel)?;
        if parser.position != input.len() {
            return Err(malformed_error!(
                "Unexpected trailing input at {} in type name '{}'",
                parser.position,
                input
            ));
        }

        Ok(spec)
    }

    /// Generic arity encoded in the name suffix (`List`1` -> 1), zero if absent.
    #[must_use]
    pub fn declared_arity(&self) -> u32 {
        self.full_name
            .rsplit_once('`')
            .and_then(|(_, arity)| arity.parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Whole input, assembly runs to the end
    TopLevel,
    /// Inside `[...]`, assembly runs to the closing bracket
    Bracketed,
    /// Unbracketed generic argument, no assembly allowed
    Bare,
}

struct NameParser<'a> {
    input: &'a str,
    position: usize,
    depth: usize,
}

impl NameParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.position + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek() == Some(b' ') {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        if self.peek() == Some(expected) {
            self.position += 1;
            Ok(())
        } else {
            Err(malformed_error!(
                "Expected '{}' at {} in type name '{}'",
                expected as char,
                self.position,
                self.input
            ))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(RecursionLimit(MAX_NESTING_DEPTH));
        }

        Ok(())
    }

    fn parse_qualified(&mut self, context: Context) -> Result<TypeNameSpec> {
        self.enter()?;
        let spec = self.parse_type_name(context)?;
        self.depth -= 1;
        Ok(spec)
    }

    fn parse_type_name(&mut self, context: Context) -> Result<TypeNameSpec> {
        self.skip_whitespace();
        let start = self.position;
        while let Some(byte) = self.peek() {
            if matches!(byte, b'[' | b']' | b',') {
                break;
            }
            self.position += 1;
        }

        let full_name = self.input[start..self.position].trim().to_string();
        if full_name.is_empty() {
            return Err(malformed_error!(
                "Empty type name at {} in '{}'",
                start,
                self.input
            ));
        }

        let mut spec = TypeNameSpec {
            full_name,
            generic_args: Vec::new(),
            array_ranks: Vec::new(),
            assembly: None,
        };

        if self.peek() == Some(b'[') && !self.at_array_suffix() {
            spec.generic_args = self.parse_generic_args()?;
        }

        // Each array suffix wraps the type once more
        while self.peek() == Some(b'[') {
            self.enter()?;
            spec.array_ranks.push(self.parse_array_suffix()?);
        }
        self.depth -= spec.array_ranks.len();

        if context != Context::Bare && self.peek() == Some(b',') {
            self.position += 1;
            let start = self.position;
            if context == Context::Bracketed {
                while !matches!(self.peek(), Some(b']') | None) {
                    self.position += 1;
                }
            } else {
                self.position = self.input.len();
            }
            spec.assembly = Some(AssemblyIdentity::parse(
                self.input[start..self.position].trim(),
            )?);
        }

        Ok(spec)
    }

    fn at_array_suffix(&self) -> bool {
        matches!(self.peek_at(1), Some(b']' | b',' | b'*'))
    }

    fn parse_generic_args(&mut self) -> Result<Vec<TypeNameSpec>> {
        self.expect(b'[')?;
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'[') {
                self.position += 1;
                args.push(self.parse_qualified(Context::Bracketed)?);
                self.expect(b']')?;
            } else {
                args.push(self.parse_qualified(Context::Bare)?);
            }

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.position += 1,
                Some(b']') => {
                    self.position += 1;
                    return Ok(args);
                }
                _ => {
                    return Err(malformed_error!(
                        "Unterminated generic argument list in '{}'",
                        self.input
                    ))
                }
            }
        }
    }

    fn parse_array_suffix(&mut self) -> Result<u32> {
        self.expect(b'[')?;
        let mut rank = 1;
        loop {
            match self.peek() {
                Some(b',') => rank += 1,
                Some(b'*') => {
                    return Err(malformed_error!(
                        "Bound array suffix '[*]' at {} in '{}' is not supported",
                        self.position,
                        self.input
                    ))
                }
                Some(b']') => {
                    self.position += 1;
                    return Ok(rank);
                }
                _ => {
                    return Err(malformed_error!(
                        "Unterminated array suffix in '{}'",
                        self.input
                    ))
                }
            }
            self.position += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::AssemblyVersion;

    #[test]
    fn parse_plain() {
        let spec = TypeNameSpec::parse("System.Int32").unwrap();
        assert_eq!(spec.full_name, "System.Int32");
        assert!(spec.generic_args.is_empty());
        assert!(spec.array_ranks.is_empty());
        assert!(spec.assembly.is_none());
    }

    #[test]
    fn parse_qualified() {
        let spec = TypeNameSpec::parse("MyApp.Order, MyApp, Version=2.1.0.0").unwrap();
        assert_eq!(spec.full_name, "MyApp.Order");
        let assembly = spec.assembly.unwrap();
        assert_eq!(assembly.name, "MyApp");
        assert_eq!(assembly.version, Some(AssemblyVersion::new(2, 1, 0, 0)));
    }

    #[test]
    fn parse_arrays() {
        let spec = TypeNameSpec::parse("System.Int32[][,], System.Private.CoreLib").unwrap();
        assert_eq!(spec.full_name, "System.Int32");
        assert_eq!(spec.array_ranks, vec![1, 2]);
        assert_eq!(spec.assembly.unwrap().name, "System.Private.CoreLib");
    }

    #[test]
    fn parse_nested_generics() {
        let spec = TypeNameSpec::parse(
            "System.Collections.Generic.Dictionary`2[[System.String, System.Private.CoreLib, Version=4.0.0.0],[System.Nullable`1[[System.Int32, System.Private.CoreLib]], System.Private.CoreLib]], System.Private.CoreLib",
        )
        .unwrap();

        assert_eq!(spec.full_name, "System.Collections.Generic.Dictionary`2");
        assert_eq!(spec.declared_arity(), 2);
        assert_eq!(spec.generic_args.len(), 2);
        assert_eq!(spec.generic_args[0].full_name, "System.String");
        assert_eq!(
            spec.generic_args[0].assembly.as_ref().unwrap().version,
            Some(AssemblyVersion::new(4, 0, 0, 0))
        );

        let nullable = &spec.generic_args[1];
        assert_eq!(nullable.full_name, "System.Nullable`1");
        assert_eq!(nullable.generic_args[0].full_name, "System.Int32");
        assert!(nullable.assembly.is_some());
    }

    #[test]
    fn parse_bare_generic_args() {
        let spec = TypeNameSpec::parse("Pair`2[System.Int32,System.String][]").unwrap();
        assert_eq!(spec.generic_args.len(), 2);
        assert!(spec.generic_args.iter().all(|arg| arg.assembly.is_none()));
        assert_eq!(spec.array_ranks, vec![1]);
    }

    #[test]
    fn parse_invalid() {
        assert!(TypeNameSpec::parse("").is_err());
        assert!(TypeNameSpec::parse("System.Int32[").is_err());
        assert!(TypeNameSpec::parse("List`1[[System.Int32]").is_err());
        assert!(TypeNameSpec::parse("System.Int32]").is_err());
        assert!(TypeNameSpec::parse("System.Int32, ").is_err());
    }

    #[test]
    fn parse_bound_array_rejected() {
        assert!(matches!(
            TypeNameSpec::parse("System.Int32[*]"),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn parse_nesting_limit() {
        let nested = |depth: usize| {
            format!(
                "{}System.Int32{}",
                "List`1[[".repeat(depth),
                "]]".repeat(depth)
            )
        };

        let spec = TypeNameSpec::parse(&nested(MAX_NESTING_DEPTH - 1)).unwrap();
        assert_eq!(spec.full_name, "List`1");

        assert!(matches!(
            TypeNameSpec::parse(&nested(MAX_NESTING_DEPTH)),
            Err(crate::Error::RecursionLimit(MAX_NESTING_DEPTH))
        ));
        assert!(matches!(
            TypeNameSpec::parse(&nested(200_000)),
            Err(crate::Error::RecursionLimit(_))
        ));

        let arrays = |count: usize| format!("System.Int32{}", "[]".repeat(count));
        assert_eq!(
            TypeNameSpec::parse(&arrays(MAX_NESTING_DEPTH - 1))
                .unwrap()
                .array_ranks
                .len(),
            MAX_NESTING_DEPTH - 1
        );
        assert!(matches!(
            TypeNameSpec::parse(&arrays(100_000)),
            Err(crate::Error::RecursionLimit(_))
        ));
    }
}
