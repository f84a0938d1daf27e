use aws_lc_rs::{
    digest::{Digest, SHA256, digest},
    encoding::{AsDer, Pkcs8V1Der},
    rand::{SecureRandom, SystemRandom},
    rsa::KeySize,
    signature::{
        ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING, ECDSA_P384_SHA384_FIXED,
        ECDSA_P384_SHA384_FIXED_SIGNING, ECDSA_P521_SHA512_FIXED, ECDSA_P521_SHA512_FIXED_SIGNING,
        EcdsaKeyPair, EcdsaSigningAlgorithm, EcdsaVerificationAlgorithm, KeyPair,
        RsaKeyPair,
    },
};
use rustls_pki_types::{PrivatePkcs1KeyDer, PrivatePkcs8KeyDer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

use crate::{
    AdditionalMembers, Base64UrlOctets, Base64UrlUInt, JWA, JoseError, KeyFamily,
    der::{self, RsaPrivateComponents},
    key_family_for,
    record::{self, FieldSet, FieldWriter, JsonRecord, impl_serde_for_record},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The `kty` (key type) parameter identifies the cryptographic
/// algorithm family used with the key.
pub enum KeyType {
    /// Octet sequence, used to represent symmetric keys
    Oct,
    /// Elliptic curve
    Ec,
    Rsa,
}

impl KeyType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oct => "oct",
            Self::Ec => "EC",
            Self::Rsa => "RSA",
        }
    }
}

impl FromStr for KeyType {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oct" => Ok(Self::Oct),
            "EC" => Ok(Self::Ec),
            "RSA" => Ok(Self::Rsa),
            other => Err(JoseError::InvalidKeyType(other.to_owned())),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Curves usable with `EC` keys, see section 6.2.1.1 of [`rfc7518`].
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-6.2.1.1
pub enum EllipticCurve {
    #[serde(rename = "P-256")]
    P256,
    #[serde(rename = "P-384")]
    P384,
    #[serde(rename = "P-521")]
    P521,
}

impl EllipticCurve {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Size in bytes of a coordinate or private scalar on this curve.
    #[must_use]
    pub const fn field_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// The only signature algorithm which can be used with keys on this curve.
    #[must_use]
    pub const fn signature_algorithm(self) -> JWA {
        match self {
            Self::P256 => JWA::ES256,
            Self::P384 => JWA::ES384,
            Self::P521 => JWA::ES512,
        }
    }

    /// The curve to use for the given ECDSA algorithm, `None` for other algorithms.
    #[must_use]
    pub const fn for_algorithm(alg: JWA) -> Option<Self> {
        match alg {
            JWA::ES256 => Some(Self::P256),
            JWA::ES384 => Some(Self::P384),
            JWA::ES512 => Some(Self::P521),
            _ => None,
        }
    }

    pub(crate) fn oid(self) -> &'static [u8] {
        match self {
            Self::P256 => der::OID_P256,
            Self::P384 => der::OID_P384,
            Self::P521 => der::OID_P521,
        }
    }

    pub(crate) fn signing_algorithm(self) -> &'static EcdsaSigningAlgorithm {
        match self {
            Self::P256 => &ECDSA_P256_SHA256_FIXED_SIGNING,
            Self::P384 => &ECDSA_P384_SHA384_FIXED_SIGNING,
            Self::P521 => &ECDSA_P521_SHA512_FIXED_SIGNING,
        }
    }

    pub(crate) fn verification_algorithm(self) -> &'static EcdsaVerificationAlgorithm {
        match self {
            Self::P256 => &ECDSA_P256_SHA256_FIXED,
            Self::P384 => &ECDSA_P384_SHA384_FIXED,
            Self::P521 => &ECDSA_P521_SHA512_FIXED,
        }
    }

    /// Left pad `value` to the field size of this curve.
    fn pad(self, name: &str, value: &[u8]) -> Result<Vec<u8>, JoseError> {
        let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
        let value = &value[start..];
        let size = self.field_size();
        if value.len() > size {
            return Err(JoseError::key_validation(format!(
                "EC parameter ({name}) is too large for curve {}",
                self.name()
            )));
        }
        let mut out = vec![0u8; size - value.len()];
        out.extend_from_slice(value);
        Ok(out)
    }

    /// Uncompressed SEC1 point for the given coordinates.
    fn encode_point(self, x: &[u8], y: &[u8]) -> Result<Vec<u8>, JoseError> {
        let mut point = Vec::with_capacity(1 + 2 * self.field_size());
        point.push(0x04);
        point.extend(self.pad("x", x)?);
        point.extend(self.pad("y", y)?);
        Ok(point)
    }

    /// Coordinates of an uncompressed SEC1 point.
    fn split_point(self, point: &[u8]) -> Result<(Vec<u8>, Vec<u8>), JoseError> {
        let size = self.field_size();
        match point.split_first() {
            Some((0x04, coordinates)) if coordinates.len() == 2 * size => {
                let (x, y) = coordinates.split_at(size);
                Ok((x.to_vec(), y.to_vec()))
            }
            _ => Err(JoseError::key_validation(format!(
                "expected an uncompressed {} point",
                self.name()
            ))),
        }
    }
}

impl fmt::Display for EllipticCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Additional prime of a multi-prime RSA key, see section 6.3.2.7 of [`rfc7518`].
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-6.3.2.7
pub struct OtherPrime {
    /// Prime factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<Base64UrlUInt>,
    /// Factor CRT exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Base64UrlUInt>,
    /// Factor CRT coefficient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<Base64UrlUInt>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OctParams {
    /// `k`: the symmetric key value
    pub k: Base64UrlOctets,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EcParams {
    pub crv: Option<EllipticCurve>,
    pub x: Option<Base64UrlOctets>,
    pub y: Option<Base64UrlOctets>,
    /// Private scalar, only present for private keys
    pub d: Option<Base64UrlOctets>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// RSA key parameters, see section 6.3 of [`rfc7518`].
///
/// An absent `e` is distinct from any valid exponent.
///
/// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-6.3
pub struct RsaParams {
    pub n: Option<Base64UrlUInt>,
    pub e: Option<Base64UrlUInt>,
    pub d: Option<Base64UrlUInt>,
    pub p: Option<Base64UrlUInt>,
    pub q: Option<Base64UrlUInt>,
    pub dp: Option<Base64UrlUInt>,
    pub dq: Option<Base64UrlUInt>,
    pub qi: Option<Base64UrlUInt>,
    pub oth: Vec<OtherPrime>,
}

impl RsaParams {
    fn crt(&self) -> [Option<&Base64UrlUInt>; 5] {
        [
            self.p.as_ref(),
            self.q.as_ref(),
            self.dp.as_ref(),
            self.dq.as_ref(),
            self.qi.as_ref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parameters of a [`Jwk`], only those of the active key type exist.
pub enum KeyParams {
    Oct(OctParams),
    Ec(EcParams),
    Rsa(RsaParams),
}

impl KeyParams {
    /// Empty parameters for the given key type.
    #[must_use]
    pub fn empty(kty: KeyType) -> Self {
        match kty {
            KeyType::Oct => Self::Oct(OctParams::default()),
            KeyType::Ec => Self::Ec(EcParams::default()),
            KeyType::Rsa => Self::Rsa(RsaParams::default()),
        }
    }

    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Oct(_) => KeyType::Oct,
            Self::Ec(_) => KeyType::Ec,
            Self::Rsa(_) => KeyType::Rsa,
        }
    }
}

/// Key material in the form the crypto backend consumes.
///
/// Private keys are carried as DER documents,
/// which can be loaded directly into [`aws_lc_rs`] key pairs.
#[derive(Debug, PartialEq, Eq)]
pub enum NativeKey {
    Symmetric(Vec<u8>),
    /// Big-endian modulus and public exponent
    RsaPublic { n: Vec<u8>, e: Vec<u8> },
    RsaPrivate(PrivatePkcs1KeyDer<'static>),
    /// Uncompressed SEC1 point
    EcPublic {
        curve: EllipticCurve,
        point: Vec<u8>,
    },
    EcPrivate {
        curve: EllipticCurve,
        key: PrivatePkcs8KeyDer<'static>,
    },
}

impl Clone for NativeKey {
    fn clone(&self) -> Self {
        match self {
            Self::Symmetric(k) => Self::Symmetric(k.clone()),
            Self::RsaPublic { n, e } => Self::RsaPublic {
                n: n.clone(),
                e: e.clone(),
            },
            Self::RsaPrivate(key) => Self::RsaPrivate(key.clone_key()),
            Self::EcPublic { curve, point } => Self::EcPublic {
                curve: *curve,
                point: point.clone(),
            },
            Self::EcPrivate { curve, key } => Self::EcPrivate {
                curve: *curve,
                key: key.clone_key(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// [`Jwk`] or JSON Web Key as defined in [`rfc7517`]
///
/// [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517
pub struct Jwk {
    /// `kid`: key identifier
    pub kid: Option<String>,
    /// `alg`: algorithm intended for use with this key
    pub alg: Option<String>,
    /// `use`: intended use of a public key, e.g. `sig` or `enc`
    pub key_use: Option<String>,
    /// `key_ops`: operations the key is intended for
    pub key_ops: Vec<String>,
    params: KeyParams,
    pub additional_members: AdditionalMembers,
}

impl Jwk {
    /// Create an empty [`Jwk`] of the given type.
    #[must_use]
    pub fn new(kty: KeyType) -> Self {
        Self::from_params(KeyParams::empty(kty))
    }

    #[must_use]
    pub fn from_params(params: KeyParams) -> Self {
        Self {
            kid: None,
            alg: None,
            key_use: None,
            key_ops: Vec::new(),
            params,
            additional_members: AdditionalMembers::new(),
        }
    }

    /// Create a [`Jwk`] holding the given native key.
    pub fn from_native(key: &NativeKey) -> Result<Self, JoseError> {
        let mut jwk = Self::new(KeyType::Oct);
        jwk.import(key)?;
        Ok(jwk)
    }

    /// Generate a random symmetric key of `len` bytes.
    pub fn generate_oct(len: usize) -> Result<Self, JoseError> {
        let mut k = vec![0u8; len];
        SystemRandom::new()
            .fill(&mut k)
            .map_err(|_| JoseError::key_validation("failed to generate random key"))?;
        Ok(Self::from_params(KeyParams::Oct(OctParams { k: k.into() })))
    }

    /// Generate a new private key on `curve`, with `alg` set to the matching algorithm.
    pub fn generate_ec(curve: EllipticCurve) -> Result<Self, JoseError> {
        let key_pair = EcdsaKeyPair::generate(curve.signing_algorithm())
            .map_err(|_| JoseError::key_validation("failed to generate EC key pair"))?;
        let document = key_pair
            .to_pkcs8v1()
            .map_err(|_| JoseError::key_validation("failed to export EC key pair"))?;
        let mut jwk = Self::from_native(&NativeKey::EcPrivate {
            curve,
            key: PrivatePkcs8KeyDer::from(document.as_ref().to_vec()),
        })?;
        jwk.alg = Some(curve.signature_algorithm().to_string());
        Ok(jwk)
    }

    /// Generate a new RSA private key with a modulus of `bits` bits.
    ///
    /// Supported sizes are 2048, 3072, 4096 and 8192 bits.
    pub fn generate_rsa(bits: usize) -> Result<Self, JoseError> {
        let size = match bits {
            2048 => KeySize::Rsa2048,
            3072 => KeySize::Rsa3072,
            4096 => KeySize::Rsa4096,
            8192 => KeySize::Rsa8192,
            _ => {
                return Err(JoseError::key_validation(format!(
                    "unsupported RSA key size: {bits} bits"
                )));
            }
        };
        let key_pair = RsaKeyPair::generate(size)
            .map_err(|_| JoseError::key_validation("failed to generate RSA key pair"))?;
        let document: Pkcs8V1Der<'static> = key_pair
            .as_der()
            .map_err(|_| JoseError::key_validation("failed to export RSA key pair"))?;
        let pkcs1 = der::unwrap_rsa_private_key_pkcs8(AsRef::<[u8]>::as_ref(&*document))?;
        Self::from_native(&NativeKey::RsaPrivate(PrivatePkcs1KeyDer::from(
            pkcs1.to_vec(),
        )))
    }

    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.params.key_type()
    }

    /// The [`KeyFamily`] of algorithms this key can be used with.
    #[must_use]
    pub fn key_family(&self) -> KeyFamily {
        match self.key_type() {
            KeyType::Oct => KeyFamily::Oct,
            KeyType::Ec => KeyFamily::Ec,
            KeyType::Rsa => KeyFamily::Rsa,
        }
    }

    #[must_use]
    pub fn params(&self) -> &KeyParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut KeyParams {
        &mut self.params
    }

    pub fn set_params(&mut self, params: KeyParams) -> &mut Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    pub fn set_kid(&mut self, kid: impl Into<String>) -> &mut Self {
        self.kid = Some(kid.into());
        self
    }

    #[must_use]
    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    pub fn set_alg(&mut self, alg: impl Into<String>) -> &mut Self {
        self.alg = Some(alg.into());
        self
    }

    /// Reset the type specific parameters, keeping the key type and common members.
    pub fn clear_type_params(&mut self) {
        self.params = KeyParams::empty(self.key_type());
    }

    /// Whether this key holds private (or symmetric) key material.
    #[must_use]
    pub fn is_private(&self) -> bool {
        match &self.params {
            KeyParams::Oct(_) => true,
            KeyParams::Ec(p) => p.d.is_some(),
            KeyParams::Rsa(p) => p.d.is_some(),
        }
    }

    /// Check the parameters of this key are consistent for its key type.
    ///
    /// If `alg` is set and names a known algorithm,
    /// its key family must match the key type.
    pub fn validate(&self) -> Result<(), JoseError> {
        match &self.params {
            KeyParams::Oct(p) => {
                if p.k.is_empty() {
                    return Err(JoseError::key_validation("oct key value (k) is empty"));
                }
            }
            KeyParams::Ec(p) => {
                if p.crv.is_none() {
                    return Err(JoseError::key_validation("EC curve (crv) is missing"));
                }
                if p.x.is_none() {
                    return Err(JoseError::key_validation("EC coordinate (x) is missing"));
                }
                if p.y.is_none() {
                    return Err(JoseError::key_validation("EC coordinate (y) is missing"));
                }
            }
            KeyParams::Rsa(p) => validate_rsa(p)?,
        }

        if let Some(alg) = self.alg.as_deref()
            && let Some(kty) = key_family_for(alg).key_type()
            && kty != self.key_type()
        {
            return Err(JoseError::key_validation(format!(
                "key type {} doesn't match the key type {kty} of algorithm {alg}",
                self.key_type()
            )));
        }
        Ok(())
    }

    /// Replace the type specific parameters with those of `key`.
    ///
    /// The key type follows the native key, common members are kept.
    pub fn import(&mut self, key: &NativeKey) -> Result<(), JoseError> {
        self.params = match key {
            NativeKey::Symmetric(k) => KeyParams::Oct(OctParams {
                k: k.as_slice().into(),
            }),
            NativeKey::RsaPublic { n, e } => KeyParams::Rsa(RsaParams {
                n: Some(Base64UrlUInt::from_be_bytes(n)),
                e: Some(Base64UrlUInt::from_be_bytes(e)),
                ..Default::default()
            }),
            NativeKey::RsaPrivate(key) => {
                let c = der::parse_rsa_private_key(key.secret_pkcs1_der())?;
                KeyParams::Rsa(RsaParams {
                    n: Some(Base64UrlUInt::from_be_bytes(c.n)),
                    e: Some(Base64UrlUInt::from_be_bytes(c.e)),
                    d: Some(Base64UrlUInt::from_be_bytes(c.d)),
                    p: Some(Base64UrlUInt::from_be_bytes(c.p)),
                    q: Some(Base64UrlUInt::from_be_bytes(c.q)),
                    dp: Some(Base64UrlUInt::from_be_bytes(c.dp)),
                    dq: Some(Base64UrlUInt::from_be_bytes(c.dq)),
                    qi: Some(Base64UrlUInt::from_be_bytes(c.qi)),
                    oth: Vec::new(),
                })
            }
            NativeKey::EcPublic { curve, point } => {
                let (x, y) = curve.split_point(point)?;
                KeyParams::Ec(EcParams {
                    crv: Some(*curve),
                    x: Some(x.into()),
                    y: Some(y.into()),
                    d: None,
                })
            }
            NativeKey::EcPrivate { curve, key } => {
                let der = key.secret_pkcs8_der();
                let parsed = der::parse_ec_private_key_pkcs8(der)?;
                if parsed.curve_oid != curve.oid() {
                    return Err(JoseError::key_validation(format!(
                        "private key is not on curve {curve}"
                    )));
                }
                let d = curve.pad("d", parsed.d)?;
                let key_pair = EcdsaKeyPair::from_pkcs8(curve.signing_algorithm(), der)
                    .map_err(|err| {
                        JoseError::key_validation(format!("invalid EC private key: {err}"))
                    })?;
                let (x, y) = curve.split_point(key_pair.public_key().as_ref())?;
                KeyParams::Ec(EcParams {
                    crv: Some(*curve),
                    x: Some(x.into()),
                    y: Some(y.into()),
                    d: Some(d.into()),
                })
            }
        };
        tracing::trace!(kty = %self.key_type(), "imported native key into jwk");
        Ok(())
    }

    /// Convert this key into its [`NativeKey`] form.
    ///
    /// Private RSA keys need the full set of CRT parameters,
    /// multi-prime keys cannot be exported.
    pub fn export(&self) -> Result<NativeKey, JoseError> {
        match &self.params {
            KeyParams::Oct(p) => Ok(NativeKey::Symmetric(p.k.as_bytes().to_vec())),
            KeyParams::Rsa(p) => {
                let (Some(n), Some(e)) = (&p.n, &p.e) else {
                    return Err(JoseError::key_validation(
                        "RSA modulus (n) and exponent (e) are required",
                    ));
                };
                let Some(d) = &p.d else {
                    return Ok(NativeKey::RsaPublic {
                        n: n.as_be_bytes().to_vec(),
                        e: e.as_be_bytes().to_vec(),
                    });
                };
                if !p.oth.is_empty() {
                    return Err(JoseError::key_validation(
                        "multi-prime RSA private keys cannot be exported",
                    ));
                }
                let [Some(pp), Some(q), Some(dp), Some(dq), Some(qi)] = p.crt() else {
                    return Err(JoseError::key_validation(
                        "RSA private key export requires p, q, dp, dq and qi",
                    ));
                };
                let der = der::encode_rsa_private_key(&RsaPrivateComponents {
                    n: n.as_be_bytes(),
                    e: e.as_be_bytes(),
                    d: d.as_be_bytes(),
                    p: pp.as_be_bytes(),
                    q: q.as_be_bytes(),
                    dp: dp.as_be_bytes(),
                    dq: dq.as_be_bytes(),
                    qi: qi.as_be_bytes(),
                });
                Ok(NativeKey::RsaPrivate(PrivatePkcs1KeyDer::from(der)))
            }
            KeyParams::Ec(p) => {
                let (Some(curve), Some(x), Some(y)) = (p.crv, &p.x, &p.y) else {
                    return Err(JoseError::key_validation(
                        "EC curve (crv) and coordinates (x, y) are required",
                    ));
                };
                let point = curve.encode_point(x.as_bytes(), y.as_bytes())?;
                match &p.d {
                    None => Ok(NativeKey::EcPublic { curve, point }),
                    Some(d) => {
                        let d = curve.pad("d", d.as_bytes())?;
                        let der = der::encode_ec_private_key_pkcs8(curve.oid(), &d, &point);
                        Ok(NativeKey::EcPrivate {
                            curve,
                            key: PrivatePkcs8KeyDer::from(der),
                        })
                    }
                }
            }
        }
    }

    /// Copy of this key without private key material.
    ///
    /// Symmetric keys have no public part and return an error.
    pub fn public_key(&self) -> Result<Self, JoseError> {
        let params = match &self.params {
            KeyParams::Oct(_) => {
                return Err(JoseError::key_validation(
                    "symmetric keys have no public part",
                ));
            }
            KeyParams::Ec(p) => KeyParams::Ec(EcParams {
                d: None,
                ..p.clone()
            }),
            KeyParams::Rsa(p) => KeyParams::Rsa(RsaParams {
                n: p.n.clone(),
                e: p.e.clone(),
                ..Default::default()
            }),
        };
        Ok(Self {
            params,
            ..self.clone()
        })
    }

    /// [`Jwk`] thumbprint as defined in [`rfc7638`], a url safe identifier for this key.
    ///
    /// [`rfc7638`]: https://datatracker.ietf.org/doc/html/rfc7638
    pub fn thumbprint_sha256(&self) -> Result<Digest, JoseError> {
        let mut members = Map::new();
        members.insert("kty".to_owned(), self.key_type().as_str().into());
        let required = |name: &str, value: Option<String>| {
            value.ok_or_else(|| {
                JoseError::key_validation(format!("thumbprint requires member ({name})"))
            })
        };
        match &self.params {
            KeyParams::Oct(p) => {
                members.insert("k".to_owned(), p.k.encoded().into());
            }
            KeyParams::Ec(p) => {
                let crv = required("crv", p.crv.map(|c| c.name().to_owned()))?;
                members.insert("crv".to_owned(), crv.into());
                let x = required("x", p.x.as_ref().map(Base64UrlOctets::encoded))?;
                members.insert("x".to_owned(), x.into());
                let y = required("y", p.y.as_ref().map(Base64UrlOctets::encoded))?;
                members.insert("y".to_owned(), y.into());
            }
            KeyParams::Rsa(p) => {
                let e = required("e", p.e.as_ref().map(Base64UrlUInt::encoded))?;
                members.insert("e".to_owned(), e.into());
                let n = required("n", p.n.as_ref().map(Base64UrlUInt::encoded))?;
                members.insert("n".to_owned(), n.into());
            }
        }
        // serde_json maps are sorted, which gives the lexicographic member order
        let canonical = serde_json::to_vec(&Value::Object(members)).map_err(JoseError::unexpected)?;
        Ok(digest(&SHA256, &canonical))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, JoseError> {
        record::from_slice(bytes)
    }

    pub fn encode(&self) -> Result<Vec<u8>, JoseError> {
        record::to_vec(self)
    }
}

fn validate_rsa(p: &RsaParams) -> Result<(), JoseError> {
    if p.e.as_ref().is_none_or(Base64UrlUInt::is_zero) {
        return Err(JoseError::key_validation(
            "RSA public exponent (e) must be at least 1",
        ));
    }
    if p.n.is_none() {
        return Err(JoseError::key_validation("RSA modulus (n) is missing"));
    }

    let crt = p.crt();
    let present = crt.iter().filter(|v| v.is_some()).count();
    if p.d.is_none() {
        if present > 0 || !p.oth.is_empty() {
            return Err(JoseError::key_validation(
                "RSA prime parameters are present without private exponent (d)",
            ));
        }
        return Ok(());
    }

    if present != 0 && present != crt.len() {
        return Err(JoseError::key_validation(
            "RSA prime parameters (p, q, dp, dq, qi) must be all present or all absent",
        ));
    }
    if present == 0 && !p.oth.is_empty() {
        return Err(JoseError::key_validation(
            "RSA other primes (oth) require the first and second prime parameters",
        ));
    }
    for (index, prime) in p.oth.iter().enumerate() {
        let missing = [("r", &prime.r), ("d", &prime.d), ("t", &prime.t)]
            .into_iter()
            .find(|(_, value)| value.is_none());
        if let Some((name, _)) = missing {
            return Err(JoseError::key_validation(format!(
                "RSA other prime at index {index} is missing ({name})"
            )));
        }
    }
    Ok(())
}

impl JsonRecord for Jwk {
    const RESERVED: &'static [&'static str] = &[
        "kty", "kid", "alg", "use", "key_ops", "k", "crv", "x", "y", "d", "n", "e", "p", "q", "dp",
        "dq", "qi", "oth",
    ];

    fn decode_reserved(fields: &mut FieldSet) -> Result<Self, JoseError> {
        let kty: KeyType = fields.take::<String>("kty")?.unwrap_or_default().parse()?;
        let params = match kty {
            KeyType::Oct => KeyParams::Oct(OctParams {
                k: fields.take("k")?.unwrap_or_default(),
            }),
            KeyType::Ec => KeyParams::Ec(EcParams {
                crv: fields.take("crv")?,
                x: fields.take("x")?,
                y: fields.take("y")?,
                d: fields.take("d")?,
            }),
            KeyType::Rsa => KeyParams::Rsa(RsaParams {
                n: fields.take("n")?,
                e: fields.take("e")?,
                d: fields.take("d")?,
                p: fields.take("p")?,
                q: fields.take("q")?,
                dp: fields.take("dp")?,
                dq: fields.take("dq")?,
                qi: fields.take("qi")?,
                oth: fields.take_seq("oth")?,
            }),
        };
        Ok(Self {
            kid: fields.take_string("kid")?,
            alg: fields.take_string("alg")?,
            key_use: fields.take_string("use")?,
            key_ops: fields.take_string_seq("key_ops")?,
            params,
            additional_members: AdditionalMembers::new(),
        })
    }

    fn encode_reserved(&self, out: &mut FieldWriter) -> Result<(), JoseError> {
        out.put("kty", self.key_type().as_str())?;
        out.put_str("kid", self.kid.as_deref());
        out.put_str("alg", self.alg.as_deref());
        out.put_str("use", self.key_use.as_deref());
        out.put_seq("key_ops", &self.key_ops)?;
        match &self.params {
            KeyParams::Oct(p) => {
                if !p.k.is_empty() {
                    out.put("k", &p.k)?;
                }
            }
            KeyParams::Ec(p) => {
                out.put_opt("crv", p.crv.as_ref())?;
                out.put_opt("x", p.x.as_ref())?;
                out.put_opt("y", p.y.as_ref())?;
                out.put_opt("d", p.d.as_ref())?;
            }
            KeyParams::Rsa(p) => {
                out.put_opt("n", p.n.as_ref())?;
                out.put_opt("e", p.e.as_ref())?;
                out.put_opt("d", p.d.as_ref())?;
                out.put_opt("p", p.p.as_ref())?;
                out.put_opt("q", p.q.as_ref())?;
                out.put_opt("dp", p.dp.as_ref())?;
                out.put_opt("dq", p.dq.as_ref())?;
                out.put_opt("qi", p.qi.as_ref())?;
                out.put_seq("oth", &p.oth)?;
            }
        }
        Ok(())
    }

    fn additional_members(&self) -> &AdditionalMembers {
        &self.additional_members
    }

    fn set_additional_members(&mut self, members: AdditionalMembers) {
        self.additional_members = members;
    }
}

impl_serde_for_record!(Jwk);
