use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};

use crate::{JoseError, KeyType};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
/// [`JWA`] or JSON Web Algorithms as defined in [`rfc7518`]
///
/// Covers the signature algorithms (section 3), the key management
/// algorithms (section 4) and the content encryption algorithms (section 5).
/// Only the signature algorithms can be used by this crate's signers, the
/// others are recognised so that headers and keys using them can be classified.
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518
pub enum JWA {
    /// HMAC using SHA-256 (Required)
    HS256,
    /// HMAC using SHA-384 (Optional)
    HS384,
    /// HMAC using SHA-512 (Optional)
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256 (Recommended)
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384 (Optional)
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512 (Optional)
    RS512,
    /// ECDSA using P-256 and SHA-256 (Recommended+)
    ES256,
    /// ECDSA using P-384 and SHA-384 (Optional)
    ES384,
    /// ECDSA using P-521 and SHA-512 (Optional)
    ES512,
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256 (Optional)
    PS256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384 (Optional)
    PS384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512 (Optional)
    PS512,
    /// No digital signature or MAC performed
    None,
    /// Direct use of a shared symmetric key as the CEK
    Dir,
    /// RSAES-PKCS1-v1_5
    RSA1_5,
    /// RSAES OAEP using default parameters
    RsaOaep,
    /// RSAES OAEP using SHA-256 and MGF1 with SHA-256
    RsaOaep256,
    /// AES Key Wrap with default initial value using 128-bit key
    A128KW,
    /// AES Key Wrap with default initial value using 192-bit key
    A192KW,
    /// AES Key Wrap with default initial value using 256-bit key
    A256KW,
    /// Elliptic Curve Diffie-Hellman Ephemeral Static key agreement using Concat KDF
    EcdhEs,
    /// ECDH-ES using Concat KDF and CEK wrapped with "A128KW"
    EcdhEsA128KW,
    /// ECDH-ES using Concat KDF and CEK wrapped with "A192KW"
    EcdhEsA192KW,
    /// ECDH-ES using Concat KDF and CEK wrapped with "A256KW"
    EcdhEsA256KW,
    /// Key wrapping with AES GCM using 128-bit key
    A128GCMKW,
    /// Key wrapping with AES GCM using 192-bit key
    A192GCMKW,
    /// Key wrapping with AES GCM using 256-bit key
    A256GCMKW,
    /// PBES2 with HMAC SHA-256 and "A128KW" wrapping
    Pbes2Hs256A128KW,
    /// PBES2 with HMAC SHA-384 and "A192KW" wrapping
    Pbes2Hs384A192KW,
    /// PBES2 with HMAC SHA-512 and "A256KW" wrapping
    Pbes2Hs512A256KW,
    /// AES_128_CBC_HMAC_SHA_256 authenticated encryption
    A128CbcHs256,
    /// AES_192_CBC_HMAC_SHA_384 authenticated encryption
    A192CbcHs384,
    /// AES_256_CBC_HMAC_SHA_512 authenticated encryption
    A256CbcHs512,
    /// AES GCM using 128-bit key
    A128GCM,
    /// AES GCM using 192-bit key
    A192GCM,
    /// AES GCM using 256-bit key
    A256GCM,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
/// Key family an algorithm needs its key to be of.
pub enum KeyFamily {
    Rsa,
    Ec,
    Oct,
    /// Algorithm is unknown or does not use a key.
    Unknown,
}

impl KeyFamily {
    /// The [`KeyType`] of this family, `None` for [`KeyFamily::Unknown`].
    #[must_use]
    pub fn key_type(self) -> Option<KeyType> {
        match self {
            Self::Rsa => Some(KeyType::Rsa),
            Self::Ec => Some(KeyType::Ec),
            Self::Oct => Some(KeyType::Oct),
            Self::Unknown => None,
        }
    }
}

impl JWA {
    /// Every registered algorithm.
    pub const ALL: [Self; 36] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::None,
        Self::Dir,
        Self::RSA1_5,
        Self::RsaOaep,
        Self::RsaOaep256,
        Self::A128KW,
        Self::A192KW,
        Self::A256KW,
        Self::EcdhEs,
        Self::EcdhEsA128KW,
        Self::EcdhEsA192KW,
        Self::EcdhEsA256KW,
        Self::A128GCMKW,
        Self::A192GCMKW,
        Self::A256GCMKW,
        Self::Pbes2Hs256A128KW,
        Self::Pbes2Hs384A192KW,
        Self::Pbes2Hs512A256KW,
        Self::A128CbcHs256,
        Self::A192CbcHs384,
        Self::A256CbcHs512,
        Self::A128GCM,
        Self::A192GCM,
        Self::A256GCM,
    ];

    /// Registered identifier of this algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::None => "none",
            Self::Dir => "dir",
            Self::RSA1_5 => "RSA1_5",
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaOaep256 => "RSA-OAEP-256",
            Self::A128KW => "A128KW",
            Self::A192KW => "A192KW",
            Self::A256KW => "A256KW",
            Self::EcdhEs => "ECDH-ES",
            Self::EcdhEsA128KW => "ECDH-ES+A128KW",
            Self::EcdhEsA192KW => "ECDH-ES+A192KW",
            Self::EcdhEsA256KW => "ECDH-ES+A256KW",
            Self::A128GCMKW => "A128GCMKW",
            Self::A192GCMKW => "A192GCMKW",
            Self::A256GCMKW => "A256GCMKW",
            Self::Pbes2Hs256A128KW => "PBES2-HS256+A128KW",
            Self::Pbes2Hs384A192KW => "PBES2-HS384+A192KW",
            Self::Pbes2Hs512A256KW => "PBES2-HS512+A256KW",
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
            Self::A128GCM => "A128GCM",
            Self::A192GCM => "A192GCM",
            Self::A256GCM => "A256GCM",
        }
    }

    /// Whether this is a JWS signature algorithm backed by a key (so excluding `none`).
    #[must_use]
    pub const fn is_signature(self) -> bool {
        matches!(
            self,
            Self::HS256
                | Self::HS384
                | Self::HS512
                | Self::RS256
                | Self::RS384
                | Self::RS512
                | Self::ES256
                | Self::ES384
                | Self::ES512
                | Self::PS256
                | Self::PS384
                | Self::PS512
        )
    }

    /// Key family a key must belong to in order to be used with this algorithm.
    #[must_use]
    pub const fn key_family(self) -> KeyFamily {
        match self {
            Self::RS256
            | Self::RS384
            | Self::RS512
            | Self::PS256
            | Self::PS384
            | Self::PS512
            | Self::RSA1_5
            | Self::RsaOaep
            | Self::RsaOaep256 => KeyFamily::Rsa,
            Self::ES256
            | Self::ES384
            | Self::ES512
            | Self::EcdhEs
            | Self::EcdhEsA128KW
            | Self::EcdhEsA192KW
            | Self::EcdhEsA256KW => KeyFamily::Ec,
            Self::HS256
            | Self::HS384
            | Self::HS512
            | Self::Dir
            | Self::A128KW
            | Self::A192KW
            | Self::A256KW
            | Self::A128GCMKW
            | Self::A192GCMKW
            | Self::A256GCMKW
            | Self::Pbes2Hs256A128KW
            | Self::Pbes2Hs384A192KW
            | Self::Pbes2Hs512A256KW => KeyFamily::Oct,
            Self::None
            | Self::A128CbcHs256
            | Self::A192CbcHs384
            | Self::A256CbcHs512
            | Self::A128GCM
            | Self::A192GCM
            | Self::A256GCM => KeyFamily::Unknown,
        }
    }
}

/// Whether `id` identifies a JWS signature algorithm backed by a key.
#[must_use]
pub fn is_valid_signature_alg(id: &str) -> bool {
    id.parse::<JWA>().is_ok_and(JWA::is_signature)
}

/// Key family required by the algorithm `id`,
/// [`KeyFamily::Unknown`] for unregistered identifiers.
#[must_use]
pub fn key_family_for(id: &str) -> KeyFamily {
    id.parse::<JWA>()
        .map_or(KeyFamily::Unknown, JWA::key_family)
}

impl FromStr for JWA {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| JoseError::UnsupportedAlgorithm(s.to_owned()))
    }
}

impl fmt::Display for JWA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JWA {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JWA {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        id.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[test]
    fn identifiers_roundtrip() {
        for alg in JWA::ALL {
            assert_eq!(alg.as_str().parse::<JWA>().unwrap(), alg);
            let json = serde_json::to_string(&alg).unwrap();
            assert_eq!(serde_json::from_str::<JWA>(&json).unwrap(), alg);
        }
        assert_eq!(JWA::Pbes2Hs384A192KW.to_string(), "PBES2-HS384+A192KW");
    }

    #[test]
    fn unknown_identifier() {
        let err = assert_err!("HS1024".parse::<JWA>());
        assert!(matches!(err, JoseError::UnsupportedAlgorithm(alg) if alg == "HS1024"));
        assert_err!("hs256".parse::<JWA>());
        assert_eq!(key_family_for("HS1024"), KeyFamily::Unknown);
    }

    #[test]
    fn signature_algorithms() {
        let signature: Vec<_> = JWA::ALL.into_iter().filter(|a| a.is_signature()).collect();
        assert_eq!(signature.len(), 12);
        assert!(is_valid_signature_alg("ES512"));
        assert!(!is_valid_signature_alg("none"));
        assert!(!is_valid_signature_alg("RSA-OAEP"));
    }

    #[test]
    fn key_families() {
        assert_eq!(key_family_for("HS384"), KeyFamily::Oct);
        assert_eq!(key_family_for("PS256"), KeyFamily::Rsa);
        assert_eq!(key_family_for("RSA1_5"), KeyFamily::Rsa);
        assert_eq!(key_family_for("ES384"), KeyFamily::Ec);
        assert_eq!(key_family_for("ECDH-ES+A128KW"), KeyFamily::Ec);
        assert_eq!(key_family_for("A256GCMKW"), KeyFamily::Oct);
        assert_eq!(key_family_for("A128GCM"), KeyFamily::Unknown);
        assert_eq!(key_family_for("none"), KeyFamily::Unknown);
        assert_eq!(KeyFamily::Ec.key_type(), Some(KeyType::Ec));
    }
}
