use rama_error::{BoxError, OpaqueError};
use std::fmt;

#[derive(Debug)]
/// Error returned by the decode, validate, sign and verify operations of this crate.
///
/// None of these errors are retried or recovered from internally,
/// it is up to the caller to decide what to do with them
/// (typically: reject the token).
pub enum JoseError {
    /// Input is not valid base64url or not a valid JSON object.
    Decode(OpaqueError),
    /// The value of a named member could not be decoded.
    FieldDecode {
        field: &'static str,
        source: OpaqueError,
    },
    /// Key type is not one of `oct`, `EC` or `RSA`.
    InvalidKeyType(String),
    /// Key parameters are inconsistent for the declared key type.
    KeyValidation(String),
    /// Algorithm identifier is unknown or cannot be used for signatures.
    UnsupportedAlgorithm(String),
    /// The signer has no key bound for the requested operation.
    KeyNotSet,
    /// No key in a key set matches the requested id and type.
    KeyNotFound { kid: String },
    /// `alg`, `kid` or `crit` are inconsistent across the headers of a signature.
    HeaderConsistency(&'static str),
    /// Wrong number of signature entries for the requested operation.
    SignatureCount {
        operation: &'static str,
        count: usize,
    },
    /// Signature does not match the signing input.
    Verification(&'static str),
    /// Unexpected error happened, e.g. within the crypto backend.
    Unexpected(OpaqueError),
}

impl JoseError {
    pub(crate) fn decode(error: impl Into<BoxError>) -> Self {
        Self::Decode(OpaqueError::from_boxed(error.into()))
    }

    pub(crate) fn field(field: &'static str, error: impl Into<BoxError>) -> Self {
        Self::FieldDecode {
            field,
            source: OpaqueError::from_boxed(error.into()),
        }
    }

    pub(crate) fn key_validation(reason: impl Into<String>) -> Self {
        Self::KeyValidation(reason.into())
    }

    pub(crate) fn unexpected(error: impl Into<BoxError>) -> Self {
        Self::Unexpected(OpaqueError::from_boxed(error.into()))
    }
}

impl fmt::Display for JoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(error) => write!(f, "jose error: decode: {error}"),
            Self::FieldDecode { field, source } => {
                write!(f, "jose error: decode member '{field}': {source}")
            }
            Self::InvalidKeyType(kty) => {
                write!(
                    f,
                    "jose error: invalid key type '{kty}': must be oct, RSA or EC"
                )
            }
            Self::KeyValidation(reason) => write!(f, "jose error: invalid key: {reason}"),
            Self::UnsupportedAlgorithm(alg) => {
                write!(f, "jose error: unsupported algorithm '{alg}'")
            }
            Self::KeyNotSet => write!(f, "jose error: signer key not set"),
            Self::KeyNotFound { kid } => {
                write!(f, "jose error: no matching key found for kid '{kid}'")
            }
            Self::HeaderConsistency(reason) => write!(f, "jose error: header: {reason}"),
            Self::SignatureCount { operation, count } => write!(
                f,
                "jose error: {operation} requires exactly one signature, found {count}"
            ),
            Self::Verification(reason) => {
                write!(f, "jose error: signature verification failed: {reason}")
            }
            Self::Unexpected(error) => write!(f, "jose error: unexpected: {error}"),
        }
    }
}

impl std::error::Error for JoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) | Self::FieldDecode { source: err, .. } | Self::Unexpected(err) => {
                Some(err as &(dyn std::error::Error + 'static))
            }
            Self::InvalidKeyType(_)
            | Self::KeyValidation(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::KeyNotSet
            | Self::KeyNotFound { .. }
            | Self::HeaderConsistency(_)
            | Self::SignatureCount { .. }
            | Self::Verification(_) => None,
        }
    }
}

impl From<OpaqueError> for JoseError {
    fn from(value: OpaqueError) -> Self {
        Self::Unexpected(value)
    }
}
