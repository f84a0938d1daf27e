use serde_json::Value;

use crate::{
    AdditionalMembers, JoseError, Jwk, KeyType,
    record::{self, FieldSet, FieldWriter, JsonRecord, impl_serde_for_record},
};

#[derive(Debug, Clone, Default, PartialEq)]
/// [`JwkSet`] is an ordered set of [`Jwk`]s as defined in section 5 of [`rfc7517`].
///
/// [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517#section-5
pub struct JwkSet {
    pub keys: Vec<Jwk>,
    pub additional_members: AdditionalMembers,
}

impl JwkSet {
    #[must_use]
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self {
            keys,
            additional_members: AdditionalMembers::new(),
        }
    }

    /// First key with the given key id.
    ///
    /// Key ids are compared case-sensitive, ignoring surrounding whitespace.
    #[must_use]
    pub fn find_by_id(&self, kid: &str) -> Option<&Jwk> {
        let kid = kid.trim();
        self.keys
            .iter()
            .find(|key| key.kid.as_deref().map(str::trim) == Some(kid))
    }

    /// Like [`Self::find_by_id`], but only considers keys of type `kty`.
    #[must_use]
    pub fn find_by_id_and_type(&self, kid: &str, kty: KeyType) -> Option<&Jwk> {
        let kid = kid.trim();
        self.keys.iter().find(|key| {
            key.key_type() == kty && key.kid.as_deref().map(str::trim) == Some(kid)
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, JoseError> {
        record::from_slice(bytes)
    }

    pub fn encode(&self) -> Result<Vec<u8>, JoseError> {
        record::to_vec(self)
    }
}

impl JsonRecord for JwkSet {
    const RESERVED: &'static [&'static str] = &["keys"];

    fn decode_reserved(fields: &mut FieldSet) -> Result<Self, JoseError> {
        let entries: Vec<Value> = fields.take_seq("keys")?;
        let mut keys = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let Value::Object(entry) = entry else {
                return Err(JoseError::field(
                    "keys",
                    format!("entry at index {index} is not an object"),
                ));
            };
            match record::decode_fields::<Jwk>(FieldSet::from(entry)) {
                Ok(key) => keys.push(key),
                Err(JoseError::InvalidKeyType(kty)) => {
                    tracing::debug!(index, %kty, "skip key set entry with unsupported key type");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Self::new(keys))
    }

    fn encode_reserved(&self, out: &mut FieldWriter) -> Result<(), JoseError> {
        out.put("keys", &self.keys)
    }

    fn additional_members(&self) -> &AdditionalMembers {
        &self.additional_members
    }

    fn set_additional_members(&mut self, members: AdditionalMembers) {
        self.additional_members = members;
    }
}

impl_serde_for_record!(JwkSet);

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    const SET: &str = r#"{
        "keys": [
            {"kty":"oct","kid":"shared","k":"AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow"},
            {"kty":"OKP","kid":"ed","crv":"Ed25519","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"},
            {"kty":"EC","kid":"shared","crv":"P-256","x":"f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU","y":"x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"},
            {"kty":"RSA","kid":" rsa-1 ","n":"AQAB","e":"AQAB"}
        ],
        "issuer": "https://example.com"
    }"#;

    #[test]
    fn decode_skips_unsupported_key_types() {
        let set = JwkSet::decode(SET.as_bytes()).unwrap();
        assert_eq!(set.keys.len(), 3);
        assert!(set.find_by_id("ed").is_none());
        assert_eq!(
            set.additional_members.get("issuer"),
            Some(&Value::from("https://example.com"))
        );
    }

    #[test]
    fn find_first_match() {
        let set = JwkSet::decode(SET.as_bytes()).unwrap();
        assert_eq!(
            set.find_by_id("shared").map(Jwk::key_type),
            Some(KeyType::Oct)
        );
        assert_eq!(
            set.find_by_id_and_type("shared", KeyType::Ec)
                .map(Jwk::key_type),
            Some(KeyType::Ec)
        );
        assert!(set.find_by_id_and_type("shared", KeyType::Rsa).is_none());
    }

    #[test]
    fn find_trims_but_is_case_sensitive() {
        let set = JwkSet::decode(SET.as_bytes()).unwrap();
        assert!(set.find_by_id("rsa-1").is_some());
        assert!(set.find_by_id("  rsa-1\t").is_some());
        assert!(set.find_by_id("RSA-1").is_none());
        assert!(set.find_by_id("unknown").is_none());
    }

    #[test]
    fn malformed_entry_fails_decode() {
        let err = assert_err!(JwkSet::decode(br#"{"keys":[{"kty":"EC","crv":7}]}"#));
        assert!(matches!(err, JoseError::FieldDecode { field: "crv", .. }));

        let err = assert_err!(JwkSet::decode(br#"{"keys":[1]}"#));
        assert!(matches!(err, JoseError::FieldDecode { field: "keys", .. }));
    }

    #[test]
    fn encode_keeps_order() {
        let set = JwkSet::new(vec![
            Jwk::decode(br#"{"kty":"oct","k":"AQ","kid":"b"}"#).unwrap(),
            Jwk::decode(br#"{"kty":"oct","k":"Ag","kid":"a"}"#).unwrap(),
        ]);
        assert_eq!(
            set.encode().unwrap(),
            br#"{"keys":[{"k":"AQ","kid":"b","kty":"oct"},{"k":"Ag","kid":"a","kty":"oct"}]}"#
        );
        assert_eq!(JwkSet::decode(&set.encode().unwrap()).unwrap(), set);
    }
}
