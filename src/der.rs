//! Minimal DER support for the native key containers used by JWK import and export:
//!
//! - `RSAPrivateKey` as defined in appendix A.1.2 of [RFC 8017](https://datatracker.ietf.org/doc/html/rfc8017#appendix-A.1.2)
//! - `PrivateKeyInfo` as defined in section 5 of [RFC 5208](https://datatracker.ietf.org/doc/html/rfc5208#section-5),
//!   wrapping an `ECPrivateKey` as defined in section 3 of [RFC 5915](https://datatracker.ietf.org/doc/html/rfc5915#section-3)
//!   or an `RSAPrivateKey`
//!
//! This is ***NOT*** a general purpose ASN.1 implementation.
//! Encoding rules are defined in [ITU X.690](https://www.itu.int/ITU-T/studygroups/com17/languages/X.690-0207.pdf).

use crate::JoseError;

/// Identifier tag for a DER encoded integer.
const TAG_INTEGER: u8 = 0x02;
/// Identifier tag for a DER encoded bit string.
const TAG_BIT_STRING: u8 = 0x03;
/// Identifier tag for a DER encoded octet string.
const TAG_OCTET_STRING: u8 = 0x04;
/// Identifier tag for a DER encoded object identifier.
const TAG_OID: u8 = 0x06;
/// Identifier tag for a DER encoded sequence.
const TAG_SEQUENCE: u8 = 0x30;
/// Identifier tag for the explicit `[1]` context specific field.
const TAG_CONTEXT_1: u8 = 0xa1;
/// Maximum length of a DER encoded length in short form.
const LENGTH_SHORT_FORM_MAX: usize = 127;
/// Octet that indicates that no unused bits are present in a bit string.
const BIT_STRING_NO_UNUSED_BITS: u8 = 0x00;
const HIGH_BIT_MASK: u8 = 0x80;

/// OID `1.2.840.113549.1.1.1` (rsaEncryption) as defined in [RFC 8017](https://datatracker.ietf.org/doc/html/rfc8017#appendix-A.1)
const OID_RSA_ENCRYPTION: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
/// OID `1.2.840.10045.2.1` (id-ecPublicKey) as defined in [RFC 5480](https://datatracker.ietf.org/doc/html/rfc5480#section-2.1.1)
pub(crate) const OID_EC_PUBLIC_KEY: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
/// OID `1.2.840.10045.3.1.7` (secp256r1)
pub(crate) const OID_P256: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
/// OID `1.3.132.0.34` (secp384r1)
pub(crate) const OID_P384: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x22];
/// OID `1.3.132.0.35` (secp521r1)
pub(crate) const OID_P521: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x23];

/// Length encoding as defined in section 8.1.3 of X.690.
fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len <= LENGTH_SHORT_FORM_MAX {
        out.push(len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let start = len_bytes.iter().position(|b| *b != 0).unwrap_or(len_bytes.len() - 1);
        out.push(HIGH_BIT_MASK | (len_bytes.len() - start) as u8);
        out.extend_from_slice(&len_bytes[start..]);
    }
}

fn encode_tlv(tag: u8, value: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    encode_length(value.len(), out);
    out.extend_from_slice(value);
}

/// Non-negative integer given as big-endian bytes, as defined in section 8.3 of X.690.
fn encode_uint(value: &[u8], out: &mut Vec<u8>) {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let value = &value[start..];
    let needs_leading_zero = value.first().is_none_or(|b| b & HIGH_BIT_MASK != 0);

    out.push(TAG_INTEGER);
    encode_length(value.len() + needs_leading_zero as usize, out);
    if needs_leading_zero {
        out.push(0);
    }
    out.extend_from_slice(value);
}

fn encode_sequence(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    encode_tlv(TAG_SEQUENCE, content, &mut out);
    out
}

#[derive(Debug)]
/// Big-endian components of a two-prime RSA private key.
pub(crate) struct RsaPrivateComponents<'a> {
    pub(crate) n: &'a [u8],
    pub(crate) e: &'a [u8],
    pub(crate) d: &'a [u8],
    pub(crate) p: &'a [u8],
    pub(crate) q: &'a [u8],
    pub(crate) dp: &'a [u8],
    pub(crate) dq: &'a [u8],
    pub(crate) qi: &'a [u8],
}

/// Encode a two-prime PKCS#1 `RSAPrivateKey`:
///
/// ```text
/// RSAPrivateKey ::= SEQUENCE {
///     version           Version,
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER,  -- e
///     privateExponent   INTEGER,  -- d
///     prime1            INTEGER,  -- p
///     prime2            INTEGER,  -- q
///     exponent1         INTEGER,  -- d mod (p-1)
///     exponent2         INTEGER,  -- d mod (q-1)
///     coefficient       INTEGER,  -- (inverse of q) mod p
/// }
/// ```
pub(crate) fn encode_rsa_private_key(key: &RsaPrivateComponents<'_>) -> Vec<u8> {
    let mut content = Vec::with_capacity(key.n.len() * 5);
    encode_uint(&[0], &mut content);
    for value in [key.n, key.e, key.d, key.p, key.q, key.dp, key.dq, key.qi] {
        encode_uint(value, &mut content);
    }
    encode_sequence(&content)
}

/// Parse a two-prime PKCS#1 `RSAPrivateKey`, integers are returned without sign bytes.
pub(crate) fn parse_rsa_private_key(der: &[u8]) -> Result<RsaPrivateComponents<'_>, JoseError> {
    let mut outer = Reader::new(der);
    let mut seq = Reader::new(outer.expect(TAG_SEQUENCE)?);
    outer.finish()?;

    if !seq.read_uint()?.is_empty() {
        return Err(JoseError::key_validation(
            "multi-prime RSA private keys are not supported",
        ));
    }
    let key = RsaPrivateComponents {
        n: seq.read_uint()?,
        e: seq.read_uint()?,
        d: seq.read_uint()?,
        p: seq.read_uint()?,
        q: seq.read_uint()?,
        dp: seq.read_uint()?,
        dq: seq.read_uint()?,
        qi: seq.read_uint()?,
    };
    seq.finish()?;
    Ok(key)
}

/// Encode an EC private key as a PKCS#8 v1 `PrivateKeyInfo`:
///
/// ```text
/// PrivateKeyInfo ::= SEQUENCE {
///     version                   INTEGER (0),
///     privateKeyAlgorithm       SEQUENCE { id-ecPublicKey, namedCurve },
///     privateKey                OCTET STRING -- ECPrivateKey
/// }
///
/// ECPrivateKey ::= SEQUENCE {
///     version        INTEGER (1),
///     privateKey     OCTET STRING,
///     publicKey  [1] BIT STRING
/// }
/// ```
pub(crate) fn encode_ec_private_key_pkcs8(curve_oid: &[u8], d: &[u8], point: &[u8]) -> Vec<u8> {
    let mut bit_string = Vec::with_capacity(point.len() + 4);
    bit_string.push(BIT_STRING_NO_UNUSED_BITS);
    bit_string.extend_from_slice(point);
    let mut public_key = Vec::with_capacity(point.len() + 4);
    encode_tlv(TAG_BIT_STRING, &bit_string, &mut public_key);

    let mut ec_private_key = Vec::with_capacity(d.len() + point.len() + 16);
    encode_uint(&[1], &mut ec_private_key);
    encode_tlv(TAG_OCTET_STRING, d, &mut ec_private_key);
    encode_tlv(TAG_CONTEXT_1, &public_key, &mut ec_private_key);
    let ec_private_key = encode_sequence(&ec_private_key);

    let mut algorithm = Vec::with_capacity(32);
    encode_tlv(TAG_OID, OID_EC_PUBLIC_KEY, &mut algorithm);
    encode_tlv(TAG_OID, curve_oid, &mut algorithm);

    let mut content = Vec::with_capacity(ec_private_key.len() + 48);
    encode_uint(&[0], &mut content);
    encode_tlv(TAG_SEQUENCE, &algorithm, &mut content);
    encode_tlv(TAG_OCTET_STRING, &ec_private_key, &mut content);
    encode_sequence(&content)
}

/// EC private key as read from a PKCS#8 `PrivateKeyInfo`.
#[derive(Debug)]
pub(crate) struct EcPrivateKeyDer<'a> {
    pub(crate) curve_oid: &'a [u8],
    pub(crate) d: &'a [u8],
}

/// Parse a PKCS#8 (v1 or v2) `PrivateKeyInfo` holding an `ECPrivateKey`.
pub(crate) fn parse_ec_private_key_pkcs8(der: &[u8]) -> Result<EcPrivateKeyDer<'_>, JoseError> {
    let mut outer = Reader::new(der);
    let mut seq = Reader::new(outer.expect(TAG_SEQUENCE)?);
    outer.finish()?;

    let _version = seq.read_uint()?;
    let mut algorithm = Reader::new(seq.expect(TAG_SEQUENCE)?);
    if algorithm.expect(TAG_OID)? != OID_EC_PUBLIC_KEY {
        return Err(JoseError::key_validation("PKCS#8 key is not an EC key"));
    }
    let curve_oid = algorithm.expect(TAG_OID)?;

    let mut ec_private_key = Reader::new(seq.expect(TAG_OCTET_STRING)?);
    let mut ec_private_key = Reader::new(ec_private_key.expect(TAG_SEQUENCE)?);
    if ec_private_key.read_uint()? != [1u8].as_slice() {
        return Err(JoseError::key_validation("unsupported ECPrivateKey version"));
    }
    let d = ec_private_key.expect(TAG_OCTET_STRING)?;

    Ok(EcPrivateKeyDer { curve_oid, d })
}

/// Unwrap the PKCS#1 `RSAPrivateKey` held by a PKCS#8 `PrivateKeyInfo`.
pub(crate) fn unwrap_rsa_private_key_pkcs8(der: &[u8]) -> Result<&[u8], JoseError> {
    let mut outer = Reader::new(der);
    let mut seq = Reader::new(outer.expect(TAG_SEQUENCE)?);
    outer.finish()?;

    let _version = seq.read_uint()?;
    let mut algorithm = Reader::new(seq.expect(TAG_SEQUENCE)?);
    if algorithm.expect(TAG_OID)? != OID_RSA_ENCRYPTION {
        return Err(JoseError::key_validation("PKCS#8 key is not an RSA key"));
    }
    seq.expect(TAG_OCTET_STRING)
}

fn malformed() -> JoseError {
    JoseError::key_validation("malformed DER key material")
}

/// Reader over a sequence of DER encoded values.
struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn read_byte(&mut self) -> Result<u8, JoseError> {
        let (first, rest) = self.input.split_first().ok_or_else(malformed)?;
        self.input = rest;
        Ok(*first)
    }

    fn read_length(&mut self) -> Result<usize, JoseError> {
        let first = self.read_byte()?;
        if first & HIGH_BIT_MASK == 0 {
            return Ok(first as usize);
        }
        let count = (first & !HIGH_BIT_MASK) as usize;
        if count == 0 || count > 4 {
            return Err(malformed());
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | self.read_byte()? as usize;
        }
        if len <= LENGTH_SHORT_FORM_MAX {
            return Err(malformed());
        }
        Ok(len)
    }

    /// Read the next value which must have tag `tag`, returning its content.
    fn expect(&mut self, tag: u8) -> Result<&'a [u8], JoseError> {
        if self.read_byte()? != tag {
            return Err(malformed());
        }
        let len = self.read_length()?;
        if len > self.input.len() {
            return Err(malformed());
        }
        let (value, rest) = self.input.split_at(len);
        self.input = rest;
        Ok(value)
    }

    /// Read a non-negative integer, returned in minimal big-endian form (empty for zero).
    fn read_uint(&mut self) -> Result<&'a [u8], JoseError> {
        let value = self.expect(TAG_INTEGER)?;
        match value {
            [] => Err(malformed()),
            [first, ..] if first & HIGH_BIT_MASK != 0 => Err(malformed()),
            [0, rest @ ..] => Ok(rest),
            _ => Ok(value),
        }
    }

    fn finish(&self) -> Result<(), JoseError> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(malformed())
        }
    }
}
