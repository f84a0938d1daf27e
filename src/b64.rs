//! Unpadded base64url values as used by every JOSE member that carries bytes.
//!
//! See section 2 of [`rfc7515`] and section 2 of [`rfc7518`].
//!
//! [`rfc7515`]: https://datatracker.ietf.org/doc/html/rfc7515#section-2
//! [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-2

use base64::{Engine as _, prelude::BASE64_URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;

use crate::JoseError;

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url text.
///
/// Padding characters and characters outside the url-safe alphabet are rejected.
pub fn decode(text: impl AsRef<[u8]>) -> Result<Vec<u8>, JoseError> {
    BASE64_URL_SAFE_NO_PAD
        .decode(text)
        .map_err(JoseError::decode)
}

#[derive(Clone, Default, PartialEq, Eq, Hash)]
/// Byte blob which is encoded as an unpadded base64url JSON string.
pub struct Base64UrlOctets(Vec<u8>);

impl Base64UrlOctets {
    /// Create a new [`Base64UrlOctets`] for the given bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode [`Base64UrlOctets`] from its textual form.
    pub fn decode(text: &str) -> Result<Self, JoseError> {
        decode(text).map(Self)
    }

    /// Textual form of these bytes.
    #[must_use]
    pub fn encoded(&self) -> String {
        encode(&self.0)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for Base64UrlOctets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Base64UrlOctets")
            .field(&self.encoded())
            .finish()
    }
}

impl AsRef<[u8]> for Base64UrlOctets {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Base64UrlOctets {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Base64UrlOctets {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl Serialize for Base64UrlOctets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded())
    }
}

impl<'de> Deserialize<'de> for Base64UrlOctets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::decode(&text).map_err(de::Error::custom)
    }
}

#[derive(Clone, Default, PartialEq, Eq, Hash)]
/// Non-negative integer encoded as the unpadded base64url form of its
/// minimal big-endian representation ("Base64urlUInt" in [`rfc7518`]).
///
/// The value never stores leading zero bytes, zero itself is
/// encoded as a single zero octet (`"AA"`).
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-2
pub struct Base64UrlUInt(Vec<u8>);

impl Base64UrlUInt {
    /// Create a [`Base64UrlUInt`] from big-endian bytes,
    /// leading zero bytes are stripped.
    pub fn from_be_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self(bytes[start..].to_vec())
    }

    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self::from_be_bytes(value.to_be_bytes())
    }

    /// Decode a [`Base64UrlUInt`] from its textual form.
    pub fn decode(text: &str) -> Result<Self, JoseError> {
        decode(text).map(Self::from_be_bytes)
    }

    /// Textual form of this integer.
    #[must_use]
    pub fn encoded(&self) -> String {
        if self.0.is_empty() {
            encode([0u8])
        } else {
            encode(&self.0)
        }
    }

    /// Minimal big-endian bytes, empty for zero.
    #[must_use]
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Big-endian bytes left-padded with zeros to `len` bytes,
    /// `None` if the value does not fit.
    #[must_use]
    pub fn to_be_bytes_padded(&self, len: usize) -> Option<Vec<u8>> {
        let pad = len.checked_sub(self.0.len())?;
        let mut out = vec![0u8; pad];
        out.extend_from_slice(&self.0);
        Some(out)
    }

    /// Value as `u64`, `None` if it does not fit.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        let bytes = self.to_be_bytes_padded(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Some(u64::from_be_bytes(buf))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Size of the value in bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        match self.0.first() {
            Some(first) => self.0.len() * 8 - first.leading_zeros() as usize,
            None => 0,
        }
    }
}

impl fmt::Debug for Base64UrlUInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Base64UrlUInt")
            .field(&self.encoded())
            .finish()
    }
}

impl From<u64> for Base64UrlUInt {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Serialize for Base64UrlUInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded())
    }
}

impl<'de> Deserialize<'de> for Base64UrlUInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::decode(&text).map_err(de::Error::custom)
    }
}
