//! # JOSE: JSON Object Signing and Encryption
//!
//! JOSE is an IETF standard for securely transferring data between parties using JSON.
//! This crate implements the signing half of it, and the key model shared by all of it:
//!
//! * JWS (JSON Web Signature): a payload protected by one or more signatures, encoded
//!   using the compact, flattened JSON or general JSON serialization.
//!   See [`rfc7515`] for more details.
//!
//! * JWK (JSON Web Key): a JSON format for representing cryptographic keys,
//!   and sets of such keys. Keys convert to and from their native form
//!   so they can be used for signing and verification.
//!   See [`rfc7517`] for more details.
//!
//! * JWA (JSON Web Algorithm): the registry of algorithm identifiers,
//!   of which the HMAC, RSASSA-PKCS1-v1_5, RSASSA-PSS and ECDSA signature
//!   algorithms are implemented by the [`JwsSigner`]s of this crate.
//!   See [`rfc7518`] for more details.
//!
//! * JWT claims: the registered claims of [`rfc7519`], with validation against
//!   a reference [`ClaimSet`].
//!
//! Every JOSE entity keeps unknown JSON members as "additional members",
//! so decoding and then encoding an object never loses information.
//!
//! # Example
//!
//! ```
//! use rama_jose::{EllipticCurve, Jwk, JwHeader, Jws, JwsSignature, Serialization};
//!
//! let key = Jwk::generate_ec(EllipticCurve::P256).unwrap().with_kid("k1");
//!
//! let mut jws = Jws::new(r#"{"iss":"joe"}"#)
//!     .with_serialization(Serialization::Compact)
//!     .with_signature(JwsSignature::new().with_protected_header(
//!         JwHeader::new().with_algorithm("ES256").with_key_id("k1"),
//!     ));
//! jws.sign(&key).unwrap();
//!
//! let token = jws.encode().unwrap();
//! let received = Jws::decode(&token).unwrap();
//! received.verify(&key.public_key().unwrap()).unwrap();
//! assert_eq!(received.payload(), br#"{"iss":"joe"}"#);
//! ```
//!
//! # Rama
//!
//! Crate used by the end-user `rama` crate and `rama` crate authors alike.
//!
//! Learn more about `rama`:
//!
//! - Github: <https://github.com/plabayo/rama>
//! - Book: <https://ramaproxy.org/book/>
//!
//! [`rfc7515`]: https://datatracker.ietf.org/doc/html/rfc7515
//! [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517
//! [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518
//! [`rfc7519`]: https://datatracker.ietf.org/doc/html/rfc7519

#![doc(
    html_favicon_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png"
)]
#![doc(html_logo_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

mod error;
pub use error::JoseError;

pub mod b64;
pub use b64::{Base64UrlOctets, Base64UrlUInt};

mod record;
pub use record::AdditionalMembers;

mod numeric_date;
pub use numeric_date::NumericDate;

mod claims;
pub use claims::{Claim, ClaimFailure, ClaimSet, ClaimValidationOptions, ClaimsValidationError};

mod header;
pub use header::JwHeader;

mod jwa;
pub use jwa::{JWA, KeyFamily, is_valid_signature_alg, key_family_for};

mod der;

mod jwk;
pub use jwk::{
    EcParams, EllipticCurve, Jwk, KeyParams, KeyType, NativeKey, OctParams, OtherPrime, RsaParams,
};

mod jwk_set;
pub use jwk_set::JwkSet;

mod signer;
pub use signer::{
    EcdsaSigner, HmacSigner, JwsSigner, NoneSigner, RsaPkcs1Signer, RsaPssSigner, new_signer,
};

mod jws;
pub use jws::{Jws, JwsSignature, Serialization};

pub mod dep {
    //! Dependencies for rama jose modules.
    //!
    //! Exported for your convenience

    pub mod aws_lc_rs {
        //! Re-export of the [`aws-lc-rs`] crate.
        //!
        //! [`aws-lc-rs`]: https://docs.rs/aws-lc-rs

        #[doc(inline)]
        pub use aws_lc_rs::*;
    }

    pub mod pki_types {
        //! Re-export of the [`rustls-pki-types`] crate.
        //!
        //! [`rustls-pki-types`]: https://docs.rs/rustls-pki-types

        #[doc(inline)]
        pub use rustls_pki_types::*;
    }

    pub mod serde_json {
        //! Re-export of the [`serde_json`] crate.
        //!
        //! [`serde_json`]: https://docs.rs/serde_json

        #[doc(inline)]
        pub use serde_json::*;
    }

    pub mod jiff {
        //! Re-export of the [`jiff`] crate.
        //!
        //! [`jiff`]: https://docs.rs/jiff

        #[doc(inline)]
        pub use jiff::*;
    }
}
