//! JOSE header shared by JWS and JWE, see section 4 of [`rfc7515`].
//!
//! [`rfc7515`]: https://datatracker.ietf.org/doc/html/rfc7515#section-4

use base64::{Engine as _, prelude::BASE64_STANDARD};
use rustls_pki_types::CertificateDer;

use crate::{
    AdditionalMembers, Base64UrlOctets, JoseError, Jwk,
    record::{self, FieldSet, FieldWriter, JsonRecord, impl_serde_for_record},
};

#[derive(Debug, Clone, Default, PartialEq)]
/// [`JwHeader`] holds the registered JOSE header parameters plus any additional members.
///
/// Additional members never contain one of the sixteen registered names.
/// A `jwk` or `epk` member whose `kty` is not supported is therefore not kept
/// aside, decoding such a header fails with [`JoseError::FieldDecode`].
pub struct JwHeader {
    /// `alg`: algorithm used to secure the object
    pub algorithm: Option<String>,
    /// `enc`: content encryption algorithm (JWE)
    pub encryption: Option<String>,
    /// `zip`: compression algorithm (JWE)
    pub compression: Option<String>,
    /// `jku`: url of a JWK set containing the key
    pub jwk_set_url: Option<String>,
    /// `jwk`: the public key used to secure the object
    pub jwk: Option<Jwk>,
    /// `kid`: hint indicating which key was used
    pub key_id: Option<String>,
    /// `typ`: media type of the complete object
    pub typ: Option<String>,
    /// `cty`: media type of the secured content
    pub content_type: Option<String>,
    /// `apu`: agreement PartyUInfo (JWE)
    pub agreement_party_u_info: Option<Base64UrlOctets>,
    /// `apv`: agreement PartyVInfo (JWE)
    pub agreement_party_v_info: Option<Base64UrlOctets>,
    /// `epk`: ephemeral public key (JWE)
    pub ephemeral_public_key: Option<Jwk>,
    /// `crit`: extensions which must be understood and processed
    pub critical: Vec<String>,
    /// `x5u`: url of the X.509 certificate (chain)
    pub x509_url: Option<String>,
    /// `x5c`: X.509 certificate chain, encoded as standard (padded) base64 DER values
    pub x509_cert_chain: Vec<CertificateDer<'static>>,
    /// `x5t`: SHA-1 thumbprint of the X.509 certificate
    pub x509_thumbprint: Option<Base64UrlOctets>,
    /// `x5t#S256`: SHA-256 thumbprint of the X.509 certificate
    pub x509_sha256_thumbprint: Option<Base64UrlOctets>,
    pub additional_members: AdditionalMembers,
}

impl JwHeader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_algorithm(mut self, alg: impl Into<String>) -> Self {
        self.algorithm = Some(alg.into());
        self
    }

    pub fn set_algorithm(&mut self, alg: impl Into<String>) -> &mut Self {
        self.algorithm = Some(alg.into());
        self
    }

    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.key_id = Some(kid.into());
        self
    }

    pub fn set_key_id(&mut self, kid: impl Into<String>) -> &mut Self {
        self.key_id = Some(kid.into());
        self
    }

    #[must_use]
    pub fn with_typ(mut self, typ: impl Into<String>) -> Self {
        self.typ = Some(typ.into());
        self
    }

    pub fn set_typ(&mut self, typ: impl Into<String>) -> &mut Self {
        self.typ = Some(typ.into());
        self
    }

    #[must_use]
    pub fn with_critical(mut self, crit: Vec<String>) -> Self {
        self.critical = crit;
        self
    }

    pub fn set_critical(&mut self, crit: Vec<String>) -> &mut Self {
        self.critical = crit;
        self
    }

    /// Whether no member, registered or additional, is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, JoseError> {
        record::from_slice(bytes)
    }

    pub fn encode(&self) -> Result<Vec<u8>, JoseError> {
        record::to_vec(self)
    }
}

impl JsonRecord for JwHeader {
    const RESERVED: &'static [&'static str] = &[
        "alg", "enc", "zip", "jku", "jwk", "kid", "typ", "cty", "apu", "apv", "epk", "crit", "x5u",
        "x5c", "x5t", "x5t#S256",
    ];

    fn decode_reserved(fields: &mut FieldSet) -> Result<Self, JoseError> {
        let x509_cert_chain = fields
            .take_seq::<String>("x5c")?
            .into_iter()
            .map(|cert| {
                BASE64_STANDARD
                    .decode(cert)
                    .map(CertificateDer::from)
                    .map_err(|err| JoseError::field("x5c", err))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            algorithm: fields.take_string("alg")?,
            encryption: fields.take_string("enc")?,
            compression: fields.take_string("zip")?,
            jwk_set_url: fields.take_string("jku")?,
            jwk: fields.take("jwk")?,
            key_id: fields.take_string("kid")?,
            typ: fields.take_string("typ")?,
            content_type: fields.take_string("cty")?,
            agreement_party_u_info: fields.take("apu")?,
            agreement_party_v_info: fields.take("apv")?,
            ephemeral_public_key: fields.take("epk")?,
            critical: fields.take_seq("crit")?,
            x509_url: fields.take_string("x5u")?,
            x509_cert_chain,
            x509_thumbprint: fields.take("x5t")?,
            x509_sha256_thumbprint: fields.take("x5t#S256")?,
            additional_members: AdditionalMembers::new(),
        })
    }

    fn encode_reserved(&self, out: &mut FieldWriter) -> Result<(), JoseError> {
        out.put_str("alg", self.algorithm.as_deref());
        out.put_str("enc", self.encryption.as_deref());
        out.put_str("zip", self.compression.as_deref());
        out.put_str("jku", self.jwk_set_url.as_deref());
        out.put_opt("jwk", self.jwk.as_ref())?;
        out.put_str("kid", self.key_id.as_deref());
        out.put_str("typ", self.typ.as_deref());
        out.put_str("cty", self.content_type.as_deref());
        out.put_opt("apu", self.agreement_party_u_info.as_ref())?;
        out.put_opt("apv", self.agreement_party_v_info.as_ref())?;
        out.put_opt("epk", self.ephemeral_public_key.as_ref())?;
        out.put_seq("crit", &self.critical)?;
        out.put_str("x5u", self.x509_url.as_deref());
        let x5c: Vec<String> = self
            .x509_cert_chain
            .iter()
            .map(|cert| BASE64_STANDARD.encode(cert))
            .collect();
        out.put_seq("x5c", &x5c)?;
        out.put_opt("x5t", self.x509_thumbprint.as_ref())?;
        out.put_opt("x5t#S256", self.x509_sha256_thumbprint.as_ref())?;
        Ok(())
    }

    fn additional_members(&self) -> &AdditionalMembers {
        &self.additional_members
    }

    fn set_additional_members(&mut self, members: AdditionalMembers) {
        self.additional_members = members;
    }
}

impl_serde_for_record!(JwHeader);
