use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, inspecting, or converting URIs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input violated the URI grammar.
    ///
    /// `offset` is the byte position of the first violation. A malformed
    /// input is always fatal to that parse attempt; nothing is repaired or
    /// defaulted.
    #[error("malformed URI at byte {offset}: {message}")]
    MalformedUri {
        /// Byte offset of the first grammar violation
        offset: usize,
        /// Short description of what was expected
        message: String,
    },

    /// A known parameter's stored text does not satisfy its declared value
    /// kind (e.g. `ttl=abc` read through the integer accessor).
    ///
    /// Raised lazily by the typed accessors, never at parse time, so that
    /// unknown or invalid values still round-trip verbatim.
    #[error("invalid value {value:?} for parameter {name:?}")]
    InvalidParameterValue {
        /// Canonical parameter name
        name: String,
        /// The stored value text
        value: String,
    },

    /// A conversion was attempted on a URI with the wrong scheme.
    #[error("invalid conversion: {0}")]
    InvalidConversion(String),
}
