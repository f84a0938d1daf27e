//! Signature algorithms of section 3 of [`rfc7518`], backed by [`aws_lc_rs`].
//!
//! [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-3

use aws_lc_rs::{
    hmac,
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384,
        RSA_PKCS1_2048_8192_SHA512, RSA_PKCS1_SHA256, RSA_PKCS1_SHA384, RSA_PKCS1_SHA512,
        RSA_PSS_2048_8192_SHA256, RSA_PSS_2048_8192_SHA384, RSA_PSS_2048_8192_SHA512,
        RSA_PSS_SHA256, RSA_PSS_SHA384, RSA_PSS_SHA512, RsaEncoding, RsaKeyPair, RsaParameters,
        RsaPublicKeyComponents, UnparsedPublicKey,
    },
};
use rama_error::ErrorContext;
use std::fmt;

use crate::{EllipticCurve, JWA, JoseError, Jwk, NativeKey};

/// Capability to sign and verify JWS signing inputs with a single algorithm.
///
/// Keys are bound separately for signing and for verification,
/// using either operation without its key fails with [`JoseError::KeyNotSet`].
pub trait JwsSigner: fmt::Debug + Send + Sync {
    /// Algorithm implemented by this signer.
    fn algorithm(&self) -> JWA;

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError>;

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError>;

    /// Bind the key used by [`Self::sign`].
    fn set_sign_key(&mut self, key: &Jwk) -> Result<(), JoseError>;

    /// Bind the key used by [`Self::verify`], private keys are accepted as well.
    fn set_verify_key(&mut self, key: &Jwk) -> Result<(), JoseError>;
}

/// Create the [`JwsSigner`] for the algorithm with identifier `alg`.
///
/// Fails with [`JoseError::UnsupportedAlgorithm`] for unknown identifiers
/// and for algorithms which are not signature algorithms.
pub fn new_signer(alg: &str) -> Result<Box<dyn JwsSigner>, JoseError> {
    let alg: JWA = alg.parse()?;
    let signer: Box<dyn JwsSigner> = match alg {
        JWA::HS256 | JWA::HS384 | JWA::HS512 => Box::new(HmacSigner::new(alg)?),
        JWA::RS256 | JWA::RS384 | JWA::RS512 => Box::new(RsaPkcs1Signer::new(alg)?),
        JWA::PS256 | JWA::PS384 | JWA::PS512 => Box::new(RsaPssSigner::new(alg)?),
        JWA::ES256 | JWA::ES384 | JWA::ES512 => Box::new(EcdsaSigner::new(alg)?),
        JWA::None => Box::new(NoneSigner),
        other => return Err(JoseError::UnsupportedAlgorithm(other.to_string())),
    };
    Ok(signer)
}

fn unsupported(alg: JWA) -> JoseError {
    JoseError::UnsupportedAlgorithm(alg.to_string())
}

/// Validate `key` and turn it into its native form.
fn native_key(key: &Jwk) -> Result<NativeKey, JoseError> {
    key.validate()?;
    key.export()
}

fn wrong_key(alg: JWA, expected: &str) -> JoseError {
    JoseError::key_validation(format!("{alg} requires {expected}"))
}

/// HMAC with SHA-2, `HS256`, `HS384` and `HS512`.
pub struct HmacSigner {
    alg: JWA,
    algorithm: hmac::Algorithm,
    sign_key: Option<hmac::Key>,
    verify_key: Option<hmac::Key>,
}

impl HmacSigner {
    pub fn new(alg: JWA) -> Result<Self, JoseError> {
        let algorithm = match alg {
            JWA::HS256 => hmac::HMAC_SHA256,
            JWA::HS384 => hmac::HMAC_SHA384,
            JWA::HS512 => hmac::HMAC_SHA512,
            other => return Err(unsupported(other)),
        };
        Ok(Self {
            alg,
            algorithm,
            sign_key: None,
            verify_key: None,
        })
    }

    fn key(&self, jwk: &Jwk) -> Result<hmac::Key, JoseError> {
        match native_key(jwk)? {
            NativeKey::Symmetric(secret) => Ok(hmac::Key::new(self.algorithm, &secret)),
            _ => Err(wrong_key(self.alg, "an oct key")),
        }
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("alg", &self.alg)
            .field("sign_key", &self.sign_key.is_some())
            .field("verify_key", &self.verify_key.is_some())
            .finish()
    }
}

impl JwsSigner for HmacSigner {
    fn algorithm(&self) -> JWA {
        self.alg
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        let key = self.sign_key.as_ref().ok_or(JoseError::KeyNotSet)?;
        Ok(hmac::sign(key, signing_input).as_ref().to_vec())
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        let key = self.verify_key.as_ref().ok_or(JoseError::KeyNotSet)?;
        hmac::verify(key, signing_input, signature)
            .map_err(|_| JoseError::Verification("HMAC mismatch"))
    }

    fn set_sign_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        self.sign_key = Some(self.key(key)?);
        Ok(())
    }

    fn set_verify_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        self.verify_key = Some(self.key(key)?);
        Ok(())
    }
}

/// RSA key slots shared by the PKCS#1 v1.5 and PSS signers.
#[derive(Default)]
struct RsaKeys {
    sign_key: Option<RsaKeyPair>,
    /// Big-endian modulus and public exponent
    verify_key: Option<(Vec<u8>, Vec<u8>)>,
}

impl RsaKeys {
    fn set_sign_key(&mut self, alg: JWA, key: &Jwk) -> Result<(), JoseError> {
        let NativeKey::RsaPrivate(der) = native_key(key)? else {
            return Err(wrong_key(alg, "a private RSA key"));
        };
        let key_pair = RsaKeyPair::from_der(der.secret_pkcs1_der()).map_err(|err| {
            JoseError::key_validation(format!("RSA private key rejected: {err}"))
        })?;
        self.sign_key = Some(key_pair);
        Ok(())
    }

    fn set_verify_key(&mut self, alg: JWA, key: &Jwk) -> Result<(), JoseError> {
        let NativeKey::RsaPublic { n, e } = native_key(&key.public_key()?)? else {
            return Err(wrong_key(alg, "an RSA key"));
        };
        self.verify_key = Some((n, e));
        Ok(())
    }

    fn sign(
        &self,
        encoding: &'static dyn RsaEncoding,
        signing_input: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        let key_pair = self.sign_key.as_ref().ok_or(JoseError::KeyNotSet)?;
        let mut signature = vec![0; key_pair.public_modulus_len()];
        key_pair
            .sign(encoding, &SystemRandom::new(), signing_input, &mut signature)
            .context("create RSA signature")?;
        Ok(signature)
    }

    fn verify(
        &self,
        parameters: &'static RsaParameters,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), JoseError> {
        let (n, e) = self.verify_key.as_ref().ok_or(JoseError::KeyNotSet)?;
        RsaPublicKeyComponents {
            n: n.as_slice(),
            e: e.as_slice(),
        }
        .verify(parameters, signing_input, signature)
        .map_err(|_| JoseError::Verification("RSA signature mismatch"))
    }

    fn fmt(&self, name: &str, alg: JWA, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(name)
            .field("alg", &alg)
            .field("sign_key", &self.sign_key.is_some())
            .field("verify_key", &self.verify_key.is_some())
            .finish()
    }
}

/// RSASSA-PKCS1-v1_5 with SHA-2, `RS256`, `RS384` and `RS512`.
pub struct RsaPkcs1Signer {
    alg: JWA,
    encoding: &'static dyn RsaEncoding,
    parameters: &'static RsaParameters,
    keys: RsaKeys,
}

impl RsaPkcs1Signer {
    pub fn new(alg: JWA) -> Result<Self, JoseError> {
        let (encoding, parameters): (&'static dyn RsaEncoding, &'static RsaParameters) =
            match alg {
                JWA::RS256 => (&RSA_PKCS1_SHA256, &RSA_PKCS1_2048_8192_SHA256),
                JWA::RS384 => (&RSA_PKCS1_SHA384, &RSA_PKCS1_2048_8192_SHA384),
                JWA::RS512 => (&RSA_PKCS1_SHA512, &RSA_PKCS1_2048_8192_SHA512),
                other => return Err(unsupported(other)),
            };
        Ok(Self {
            alg,
            encoding,
            parameters,
            keys: RsaKeys::default(),
        })
    }
}

impl fmt::Debug for RsaPkcs1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.keys.fmt("RsaPkcs1Signer", self.alg, f)
    }
}

impl JwsSigner for RsaPkcs1Signer {
    fn algorithm(&self) -> JWA {
        self.alg
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        self.keys.sign(self.encoding, signing_input)
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        self.keys.verify(self.parameters, signing_input, signature)
    }

    fn set_sign_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        self.keys.set_sign_key(self.alg, key)
    }

    fn set_verify_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        self.keys.set_verify_key(self.alg, key)
    }
}

/// RSASSA-PSS with SHA-2 and MGF1, `PS256`, `PS384` and `PS512`.
///
/// The salt is as long as the digest, as required by section 3.5 of [`rfc7518`].
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.5
pub struct RsaPssSigner {
    alg: JWA,
    encoding: &'static dyn RsaEncoding,
    parameters: &'static RsaParameters,
    keys: RsaKeys,
}

impl RsaPssSigner {
    pub fn new(alg: JWA) -> Result<Self, JoseError> {
        let (encoding, parameters): (&'static dyn RsaEncoding, &'static RsaParameters) =
            match alg {
                JWA::PS256 => (&RSA_PSS_SHA256, &RSA_PSS_2048_8192_SHA256),
                JWA::PS384 => (&RSA_PSS_SHA384, &RSA_PSS_2048_8192_SHA384),
                JWA::PS512 => (&RSA_PSS_SHA512, &RSA_PSS_2048_8192_SHA512),
                other => return Err(unsupported(other)),
            };
        Ok(Self {
            alg,
            encoding,
            parameters,
            keys: RsaKeys::default(),
        })
    }
}

impl fmt::Debug for RsaPssSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.keys.fmt("RsaPssSigner", self.alg, f)
    }
}

impl JwsSigner for RsaPssSigner {
    fn algorithm(&self) -> JWA {
        self.alg
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        self.keys.sign(self.encoding, signing_input)
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        self.keys.verify(self.parameters, signing_input, signature)
    }

    fn set_sign_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        self.keys.set_sign_key(self.alg, key)
    }

    fn set_verify_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        self.keys.set_verify_key(self.alg, key)
    }
}

/// ECDSA with the NIST curves, `ES256`, `ES384` and `ES512`.
///
/// Signatures are the fixed width concatenation `r || s`
/// described in section 3.4 of [`rfc7518`], not ASN.1.
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.4
pub struct EcdsaSigner {
    alg: JWA,
    curve: EllipticCurve,
    rng: SystemRandom,
    sign_key: Option<EcdsaKeyPair>,
    /// Uncompressed SEC1 point
    verify_key: Option<Vec<u8>>,
}

impl EcdsaSigner {
    pub fn new(alg: JWA) -> Result<Self, JoseError> {
        let curve = EllipticCurve::for_algorithm(alg).ok_or_else(|| unsupported(alg))?;
        Ok(Self {
            alg,
            curve,
            rng: SystemRandom::new(),
            sign_key: None,
            verify_key: None,
        })
    }

    /// Length in bytes of every valid signature of this signer.
    #[must_use]
    pub fn signature_len(&self) -> usize {
        2 * self.curve.field_size()
    }

    fn check_curve(&self, curve: EllipticCurve) -> Result<(), JoseError> {
        if curve == self.curve {
            Ok(())
        } else {
            Err(wrong_key(
                self.alg,
                &format!("a {} key, found a {curve} key", self.curve),
            ))
        }
    }
}

impl fmt::Debug for EcdsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSigner")
            .field("alg", &self.alg)
            .field("curve", &self.curve)
            .field("sign_key", &self.sign_key.is_some())
            .field("verify_key", &self.verify_key.is_some())
            .finish()
    }
}

impl JwsSigner for EcdsaSigner {
    fn algorithm(&self) -> JWA {
        self.alg
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        let key_pair = self.sign_key.as_ref().ok_or(JoseError::KeyNotSet)?;
        let signature = key_pair
            .sign(&self.rng, signing_input)
            .context("create ECDSA signature")?;
        Ok(signature.as_ref().to_vec())
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        let point = self.verify_key.as_ref().ok_or(JoseError::KeyNotSet)?;
        if signature.len() != self.signature_len() {
            return Err(JoseError::Verification(
                "ECDSA signature has the wrong length",
            ));
        }
        UnparsedPublicKey::new(self.curve.verification_algorithm(), point)
            .verify(signing_input, signature)
            .map_err(|_| JoseError::Verification("ECDSA signature mismatch"))
    }

    fn set_sign_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        let NativeKey::EcPrivate { curve, key } = native_key(key)? else {
            return Err(wrong_key(self.alg, "a private EC key"));
        };
        self.check_curve(curve)?;
        let key_pair = EcdsaKeyPair::from_pkcs8(curve.signing_algorithm(), key.secret_pkcs8_der())
            .map_err(|err| JoseError::key_validation(format!("EC private key rejected: {err}")))?;
        self.sign_key = Some(key_pair);
        Ok(())
    }

    fn set_verify_key(&mut self, key: &Jwk) -> Result<(), JoseError> {
        let NativeKey::EcPublic { curve, point } = native_key(&key.public_key()?)? else {
            return Err(wrong_key(self.alg, "an EC key"));
        };
        self.check_curve(curve)?;
        self.verify_key = Some(point);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Signer for `alg=none`, see section 3.6 of [`rfc7518`].
///
/// Produces an empty signature and only accepts an empty signature.
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.6
pub struct NoneSigner;

impl JwsSigner for NoneSigner {
    fn algorithm(&self) -> JWA {
        JWA::None
    }

    fn sign(&self, _signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        Ok(Vec::new())
    }

    fn verify(&self, _signing_input: &[u8], signature: &[u8]) -> Result<(), JoseError> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(JoseError::Verification(
                "unsecured JWS must have an empty signature",
            ))
        }
    }

    fn set_sign_key(&mut self, _key: &Jwk) -> Result<(), JoseError> {
        Ok(())
    }

    fn set_verify_key(&mut self, _key: &Jwk) -> Result<(), JoseError> {
        Ok(())
    }
}
