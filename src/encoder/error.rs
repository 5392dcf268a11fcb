//! Error type for struct encoding.

/// Error produced when a struct value does not fit its declared layout.
///
/// Paths are dotted field paths rooted at the layout name, e.g.
/// `RelayParams.tokenPermits[0].v`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Declared field has no value.
    #[error("missing field {0}")]
    MissingField(String),

    /// Value carries a field the layout does not declare.
    #[error("unexpected field {0}")]
    UnexpectedField(String),

    /// Unsigned integer does not fit the declared width.
    #[error("field {path} overflows uint{bits}")]
    Overflow { path: String, bits: usize },

    /// Value kind differs from the declared ABI type.
    #[error("field {path} expects {expected}")]
    TypeMismatch { path: String, expected: String },

    /// Fixed-size byte string of the wrong length.
    #[error("field {path} expects {expected} bytes, got {actual}")]
    InvalidFixedBytes {
        path: String,
        expected: usize,
        actual: usize,
    },
}
