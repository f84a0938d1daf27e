//! JWT claims as defined in [`rfc7519`], with reference based validation.
//!
//! [`rfc7519`]: https://datatracker.ietf.org/doc/html/rfc7519#section-4

use jiff::SignedDuration;
use std::fmt;

use crate::{
    AdditionalMembers, JoseError, NumericDate,
    record::{self, FieldSet, FieldWriter, JsonRecord, impl_serde_for_record},
};

#[derive(Debug, Clone, Default, PartialEq)]
/// [`ClaimSet`] is the set of registered JWT claims plus any additional claims.
///
/// Additional claims never contain one of the seven registered claim names.
pub struct ClaimSet {
    /// `iss`: principal that issued the token
    pub issuer: Option<String>,
    /// `sub`: principal that is the subject of the token
    pub subject: Option<String>,
    /// `aud`: recipients the token is intended for
    pub audience: Vec<String>,
    /// `jti`: unique identifier of the token
    pub jwt_id: Option<String>,
    /// `exp`: time after which the token must not be accepted
    pub expiration: Option<NumericDate>,
    /// `nbf`: time before which the token must not be accepted
    pub not_before: Option<NumericDate>,
    /// `iat`: time at which the token was issued
    pub issued_at: Option<NumericDate>,
    pub additional_claims: AdditionalMembers,
}

impl JsonRecord for ClaimSet {
    const RESERVED: &'static [&'static str] = &["iss", "sub", "aud", "jti", "exp", "nbf", "iat"];

    fn decode_reserved(fields: &mut FieldSet) -> Result<Self, JoseError> {
        let audience = fields.take_string_seq("aud")?;
        Ok(Self {
            issuer: fields.take_string("iss")?,
            subject: fields.take_string("sub")?,
            audience,
            jwt_id: fields.take_string("jti")?,
            expiration: fields.take("exp")?,
            not_before: fields.take("nbf")?,
            issued_at: fields.take("iat")?,
            additional_claims: AdditionalMembers::new(),
        })
    }

    fn encode_reserved(&self, out: &mut FieldWriter) -> Result<(), JoseError> {
        out.put_str("iss", self.issuer.as_deref());
        out.put_str("sub", self.subject.as_deref());
        out.put_seq("aud", &self.audience)?;
        out.put_str("jti", self.jwt_id.as_deref());
        out.put_opt("exp", self.expiration.as_ref())?;
        out.put_opt("nbf", self.not_before.as_ref())?;
        out.put_opt("iat", self.issued_at.as_ref())
    }

    fn additional_members(&self) -> &AdditionalMembers {
        &self.additional_claims
    }

    fn set_additional_members(&mut self, members: AdditionalMembers) {
        self.additional_claims = members;
    }
}

impl_serde_for_record!(ClaimSet);

impl ClaimSet {
    /// Decode a [`ClaimSet`] from its JSON form.
    pub fn decode(bytes: &[u8]) -> Result<Self, JoseError> {
        record::from_slice(bytes)
    }

    /// Encode this [`ClaimSet`] as JSON, members sorted by name.
    pub fn encode(&self) -> Result<Vec<u8>, JoseError> {
        record::to_vec(self)
    }

    /// Validate these claims against the `reference` claims, at the current time
    /// and without leeway.
    ///
    /// See [`Self::validate_with`].
    pub fn validate(&self, reference: &Self) -> Result<(), ClaimsValidationError> {
        self.validate_with(reference, &ClaimValidationOptions::default())
    }

    /// Validate these claims against the `reference` claims.
    ///
    /// Only the claims which are set in `reference` are checked:
    ///
    /// - `exp`: the token must not be expired (a token without `exp` is);
    /// - `nbf`: the token must already be valid;
    /// - `iss`, `sub` and `jti`: must equal the reference, ignoring surrounding whitespace;
    /// - `aud`: every reference audience must be present in these claims;
    /// - additional claims: every reference claim must be present with an equal value.
    ///
    /// All failing checks are reported together, no failures is `Ok(())`.
    pub fn validate_with(
        &self,
        reference: &Self,
        options: &ClaimValidationOptions,
    ) -> Result<(), ClaimsValidationError> {
        let now = options.now.unwrap_or_else(NumericDate::now).unix_seconds();
        let leeway = options.leeway.as_secs();
        let mut failures = Vec::new();

        if reference.expiration.is_some() {
            match self.expiration {
                Some(exp) if now.saturating_sub(leeway) <= exp.unix_seconds() => (),
                Some(_) | None => failures.push(ClaimFailure::new(Claim::Exp, "JWT has expired")),
            }
        }

        if reference.not_before.is_some()
            && let Some(nbf) = self.not_before
            && now.saturating_add(leeway) < nbf.unix_seconds()
        {
            failures.push(ClaimFailure::new(
                Claim::Nbf,
                "JWT can not yet be accepted for processing",
            ));
        }

        if let Some(iss) = reference.issuer.as_deref()
            && !trimmed_eq(self.issuer.as_deref(), iss)
        {
            failures.push(ClaimFailure::new(
                Claim::Iss,
                format!(
                    "issuer ({}) doesn't match ref ({iss})",
                    self.issuer.as_deref().unwrap_or_default()
                ),
            ));
        }

        if let Some(sub) = reference.subject.as_deref()
            && !trimmed_eq(self.subject.as_deref(), sub)
        {
            failures.push(ClaimFailure::new(
                Claim::Sub,
                format!(
                    "subject ({}) doesn't match ref ({sub})",
                    self.subject.as_deref().unwrap_or_default()
                ),
            ));
        }

        if let Some(missing) = reference
            .audience
            .iter()
            .find(|aud| !self.audience.iter().any(|v| v.trim() == aud.trim()))
        {
            failures.push(ClaimFailure::new(
                Claim::Aud,
                format!("aud value {missing} doesn't exist in claim set"),
            ));
        }

        if let Some(jti) = reference.jwt_id.as_deref()
            && !trimmed_eq(self.jwt_id.as_deref(), jti)
        {
            failures.push(ClaimFailure::new(
                Claim::Jti,
                format!(
                    "jwt id ({}) doesn't match ref ({jti})",
                    self.jwt_id.as_deref().unwrap_or_default()
                ),
            ));
        }

        for (name, expected) in &reference.additional_claims {
            let reason = match self.additional_claims.get(name) {
                None => format!("key {name} doesn't exist in claim set"),
                Some(value) if value != expected => format!(
                    "reference key {name} with value {expected} doesn't match claim value {value}"
                ),
                Some(_) => continue,
            };
            failures.push(ClaimFailure::new(Claim::Additional, reason));
            break;
        }

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::debug!(failures = failures.len(), "claim set validation failed");
            Err(ClaimsValidationError { failures })
        }
    }
}

fn trimmed_eq(value: Option<&str>, reference: &str) -> bool {
    value.unwrap_or_default().trim() == reference.trim()
}

#[derive(Debug, Clone, Default)]
/// Options used by [`ClaimSet::validate_with`].
pub struct ClaimValidationOptions {
    now: Option<NumericDate>,
    leeway: SignedDuration,
}

impl ClaimValidationOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate time based claims against this moment instead of the current time.
    #[must_use]
    pub fn with_now(mut self, now: NumericDate) -> Self {
        self.now = Some(now);
        self
    }

    /// Validate time based claims against this moment instead of the current time.
    pub fn set_now(&mut self, now: NumericDate) -> &mut Self {
        self.now = Some(now);
        self
    }

    /// Clock skew tolerated for `exp` and `nbf`.
    #[must_use]
    pub fn with_leeway(mut self, leeway: SignedDuration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Clock skew tolerated for `exp` and `nbf`.
    pub fn set_leeway(&mut self, leeway: SignedDuration) -> &mut Self {
        self.leeway = leeway;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Claim checked by [`ClaimSet::validate_with`].
pub enum Claim {
    Exp,
    Nbf,
    Iss,
    Sub,
    Aud,
    Jti,
    Additional,
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exp => "Exp",
            Self::Nbf => "Nbf",
            Self::Iss => "Iss",
            Self::Sub => "Sub",
            Self::Aud => "Aud",
            Self::Jti => "JTI",
            Self::Additional => "Additional Claims",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single failed claim check.
pub struct ClaimFailure {
    claim: Claim,
    reason: String,
}

impl ClaimFailure {
    fn new(claim: Claim, reason: impl Into<String>) -> Self {
        Self {
            claim,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn claim(&self) -> Claim {
        self.claim
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ClaimFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]- Validation failed: {}", self.claim, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Every failed check of a [`ClaimSet::validate_with`] call.
///
/// Never empty.
pub struct ClaimsValidationError {
    failures: Vec<ClaimFailure>,
}

impl ClaimsValidationError {
    #[must_use]
    pub fn failures(&self) -> &[ClaimFailure] {
        &self.failures
    }

    /// Whether the check for `claim` failed.
    #[must_use]
    pub fn failed(&self, claim: Claim) -> bool {
        self.failures.iter().any(|f| f.claim == claim)
    }
}

impl fmt::Display for ClaimsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ClaimsValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tokio_test::{assert_err, assert_ok};

    const CLAIMS: &str = r#"{"aud":["AUD3","AUD4"],"exp":1257894000,"iat":1258066800,"iss":"ISS-VALUE 2","jti":"JTI 2","nbf":1257980400,"sub":"SUB-VALUE 2"}"#;

    fn at(seconds: i64) -> ClaimValidationOptions {
        ClaimValidationOptions::new().with_now(NumericDate::from_unix_seconds(seconds))
    }

    #[test]
    fn decode_and_encode() {
        let claims = ClaimSet::decode(CLAIMS.as_bytes()).unwrap();
        assert_eq!(claims.issuer.as_deref(), Some("ISS-VALUE 2"));
        assert_eq!(claims.audience, ["AUD3", "AUD4"]);
        assert_eq!(
            claims.expiration,
            Some(NumericDate::from_unix_seconds(1257894000))
        );
        assert!(claims.additional_claims.is_empty());

        assert_eq!(claims.encode().unwrap(), CLAIMS.as_bytes());
    }

    #[test]
    fn additional_claims_roundtrip() {
        let input = r#"{"exp":1300819380,"http://example.com/is_root":true,"iss":"joe"}"#;
        let claims = ClaimSet::decode(input.as_bytes()).unwrap();
        assert_eq!(
            claims.additional_claims.get("http://example.com/is_root"),
            Some(&Value::Bool(true))
        );
        assert_eq!(claims.encode().unwrap(), input.as_bytes());
    }

    #[test]
    fn single_audience_string() {
        let claims = ClaimSet::decode(br#"{"aud":"api"}"#).unwrap();
        assert_eq!(claims.audience, ["api"]);
        assert_eq!(claims.encode().unwrap(), br#"{"aud":["api"]}"#);
    }

    #[test]
    fn malformed_claim() {
        let err = assert_err!(ClaimSet::decode(br#"{"exp":"tomorrow"}"#));
        assert!(matches!(err, JoseError::FieldDecode { field: "exp", .. }));
    }

    #[test]
    fn empty_reference_is_ok() {
        let claims = ClaimSet::decode(CLAIMS.as_bytes()).unwrap();
        assert_ok!(claims.validate(&ClaimSet::default()));
    }

    #[test]
    fn matching_reference_is_ok() {
        let claims = ClaimSet::decode(CLAIMS.as_bytes()).unwrap();
        let reference = ClaimSet {
            issuer: Some(" ISS-VALUE 2 ".to_owned()),
            subject: Some("SUB-VALUE 2".to_owned()),
            audience: vec!["AUD4".to_owned()],
            jwt_id: Some("JTI 2".to_owned()),
            expiration: Some(NumericDate::from_unix_seconds(0)),
            ..Default::default()
        };
        assert_ok!(claims.validate_with(&reference, &at(1257894000)));
    }

    #[test]
    fn every_failure_is_reported() {
        let claims = ClaimSet::decode(CLAIMS.as_bytes()).unwrap();
        let mut reference = ClaimSet {
            issuer: Some("other".to_owned()),
            subject: Some("other".to_owned()),
            audience: vec!["AUD5".to_owned()],
            jwt_id: Some("other".to_owned()),
            expiration: Some(NumericDate::from_unix_seconds(0)),
            ..Default::default()
        };
        reference
            .additional_claims
            .insert("admin".to_owned(), json!(true));

        let err = assert_err!(claims.validate_with(&reference, &at(1257894001)));
        for claim in [
            Claim::Exp,
            Claim::Iss,
            Claim::Sub,
            Claim::Aud,
            Claim::Jti,
            Claim::Additional,
        ] {
            assert!(err.failed(claim), "{claim} should have failed");
        }
        assert!(!err.failed(Claim::Nbf));
        assert_eq!(err.failures().len(), 6);

        let msg = err.to_string();
        assert!(msg.starts_with("[Exp]- Validation failed: JWT has expired\n"), "{msg}");
        assert_eq!(msg.lines().count(), 6);
    }

    #[test]
    fn time_checks_respect_leeway() {
        let claims = ClaimSet::decode(CLAIMS.as_bytes()).unwrap();
        let reference = ClaimSet {
            expiration: Some(NumericDate::from_unix_seconds(0)),
            not_before: Some(NumericDate::from_unix_seconds(0)),
            ..Default::default()
        };

        let err = assert_err!(claims.validate_with(&reference, &at(1257894060)));
        assert!(err.failed(Claim::Exp));
        // nbf lies after exp in this claim set
        assert!(err.failed(Claim::Nbf));

        let options = at(1257894060).with_leeway(SignedDuration::from_secs(60));
        let err = assert_err!(claims.validate_with(&reference, &options));
        assert!(!err.failed(Claim::Exp));
        assert!(err.failed(Claim::Nbf));
    }

    #[test]
    fn expiration_is_inclusive() {
        let claims = ClaimSet {
            expiration: Some(NumericDate::from_unix_seconds(1000)),
            ..Default::default()
        };
        let reference = ClaimSet {
            expiration: Some(NumericDate::from_unix_seconds(0)),
            ..Default::default()
        };
        assert_ok!(claims.validate_with(&reference, &at(1000)));
        let err = assert_err!(claims.validate_with(&reference, &at(1001)));
        assert!(err.failed(Claim::Exp));
    }

    #[test]
    fn missing_expiration_is_expired() {
        let reference = ClaimSet {
            expiration: Some(NumericDate::from_unix_seconds(0)),
            ..Default::default()
        };
        let err = assert_err!(ClaimSet::default().validate(&reference));
        assert!(err.failed(Claim::Exp));
    }

    #[test]
    fn additional_claims_compare_deeply() {
        let mut claims = ClaimSet::default();
        claims
            .additional_claims
            .insert("roles".to_owned(), json!(["a", {"b": 1}]));

        let mut reference = ClaimSet::default();
        reference
            .additional_claims
            .insert("roles".to_owned(), json!(["a", {"b": 1}]));
        assert_ok!(claims.validate(&reference));

        reference
            .additional_claims
            .insert("roles".to_owned(), json!(["a", {"b": 2}]));
        let err = assert_err!(claims.validate(&reference));
        assert!(err.failed(Claim::Additional));
    }
}
