use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure in this crate is terminal for the current encode or decode step: they stem
/// either from malformed input or from a caller contract violation, and none of them benefits
/// from retrying the same operation.
///
/// # Error Categories
///
/// ## Stream Errors
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the stream
/// - [`Error::Malformed`] - Corrupted bytes, invalid UTF-8 or an unparseable type name
/// - [`Error::RecursionLimit`] - A type name nests generic arguments too deeply
///
/// ## Type Identity Errors
/// - [`Error::TypeResolution`] - A type name does not match any registered type
/// - [`Error::UnsupportedType`] - A query was made on a type outside its supported set
/// - [`Error::DuplicateType`] - A type name was registered twice
///
/// ## Protocol Errors
/// - [`Error::Protocol`] - Session and stream are out of sync
/// - [`Error::FieldCountOverflow`] - A manifest would need more than 255 fields
///
/// # Examples
///
/// ```rust
/// use wiretype::{Error, TypeLookup, TypeRegistry};
///
/// let registry = TypeRegistry::new();
/// match registry.resolve_type_by_name("Missing.Type, Nowhere") {
///     Err(Error::TypeResolution(name)) => eprintln!("unknown type {name}"),
///     Err(e) => eprintln!("other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading the stream.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A type name nests generic arguments deeper than the parser allows.
    ///
    /// Type names come straight from the stream, so nesting is bounded to keep parsing and
    /// resolution on a fixed stack budget. The associated value is the limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
    /// A compact type name, after expansion, does not match any loaded type.
    ///
    /// The associated value is the expanded, fully qualified name that failed to resolve.
    #[error("Failed to resolve type - {0}")]
    TypeResolution(String),

    /// A query was made on a type outside the set it supports.
    ///
    /// Returned by fixed-size queries on variable-size types, nullable unwrapping of a
    /// non-nullable type, or allocation of a type without a registered factory. This is a
    /// programming-contract violation; callers are expected to guard with the matching
    /// predicate first.
    #[error("Unsupported type - {0}")]
    UnsupportedType(String),

    /// The stream references session state that does not exist.
    ///
    /// Indicates a corrupted stream or a desynchronization between the session and the stream,
    /// e.g. an indexed type reference to an id that has not been registered yet.
    #[error("Protocol violation - {0}")]
    Protocol(String),

    /// A type manifest was requested for more fields than the single count byte can hold.
    #[error("Type declares {0} fields, a manifest holds at most 255")]
    FieldCountOverflow(usize),

    /// A type with the same assembly-qualified name is already registered.
    #[error("Type is already registered - {0}")]
    DuplicateType(String),
}
