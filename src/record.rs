//! Extensible JSON record codec shared by every JOSE entity.
//!
//! Each entity has a fixed set of reserved member names which are decoded into
//! typed fields, every other member is kept as-is in an "additional members" map.
//! On encode reserved members are written first (and only when set), after which
//! the additional members are merged in, skipping any key that collides with a
//! reserved name. Output members are always sorted by name.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::JoseError;

/// Members of a JSON object which are not part of an entity's reserved schema.
pub type AdditionalMembers = Map<String, Value>;

/// Entity with a reserved member schema and a catch-all for other members.
pub(crate) trait JsonRecord: Sized {
    /// Member names owned by the entity.
    const RESERVED: &'static [&'static str];

    /// Take the reserved members out of `fields` into a new record.
    fn decode_reserved(fields: &mut FieldSet) -> Result<Self, JoseError>;

    /// Write all reserved members which are set.
    fn encode_reserved(&self, out: &mut FieldWriter) -> Result<(), JoseError>;

    fn additional_members(&self) -> &AdditionalMembers;

    fn set_additional_members(&mut self, members: AdditionalMembers);
}

/// Working set of a JSON object which is being decoded.
pub(crate) struct FieldSet(Map<String, Value>);

impl FieldSet {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, JoseError> {
        serde_json::from_slice::<Map<String, Value>>(bytes)
            .map(Self)
            .map_err(JoseError::decode)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Remove and decode member `name`, a JSON `null` counts as absent.
    pub(crate) fn take<T: DeserializeOwned>(
        &mut self,
        name: &'static str,
    ) -> Result<Option<T>, JoseError> {
        match self.0.remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|err| JoseError::field(name, err)),
        }
    }

    /// Like [`Self::take`] for strings, an empty string counts as absent.
    pub(crate) fn take_string(&mut self, name: &'static str) -> Result<Option<String>, JoseError> {
        Ok(self.take::<String>(name)?.filter(|s| !s.is_empty()))
    }

    /// Like [`Self::take`] for sequences, absent decodes as empty.
    pub(crate) fn take_seq<T: DeserializeOwned>(
        &mut self,
        name: &'static str,
    ) -> Result<Vec<T>, JoseError> {
        Ok(self.take::<Vec<T>>(name)?.unwrap_or_default())
    }

    /// Like [`Self::take_seq`] for strings, a single string decodes as a one element list.
    pub(crate) fn take_string_seq(&mut self, name: &'static str) -> Result<Vec<String>, JoseError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match self.take::<OneOrMany>(name)? {
            Some(OneOrMany::One(value)) => vec![value],
            Some(OneOrMany::Many(values)) => values,
            None => Vec::new(),
        })
    }

    /// Remaining members, with every name in `reserved` removed.
    pub(crate) fn into_additional(mut self, reserved: &[&str]) -> AdditionalMembers {
        for name in reserved {
            self.0.remove(*name);
        }
        self.0
    }
}

impl From<Map<String, Value>> for FieldSet {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

#[derive(Default)]
/// Output object of an entity being encoded.
pub(crate) struct FieldWriter(Map<String, Value>);

impl FieldWriter {
    pub(crate) fn put<T: Serialize + ?Sized>(
        &mut self,
        name: &'static str,
        value: &T,
    ) -> Result<(), JoseError> {
        let value = serde_json::to_value(value).map_err(|err| JoseError::field(name, err))?;
        self.0.insert(name.to_owned(), value);
        Ok(())
    }

    pub(crate) fn put_opt<T: Serialize>(
        &mut self,
        name: &'static str,
        value: Option<&T>,
    ) -> Result<(), JoseError> {
        match value {
            Some(value) => self.put(name, value),
            None => Ok(()),
        }
    }

    /// Write a string member, omitted when absent or empty.
    pub(crate) fn put_str(&mut self, name: &'static str, value: Option<&str>) {
        if let Some(value) = value.filter(|s| !s.is_empty()) {
            self.0.insert(name.to_owned(), Value::String(value.to_owned()));
        }
    }

    /// Write a sequence member, omitted when empty.
    pub(crate) fn put_seq<T: Serialize>(
        &mut self,
        name: &'static str,
        values: &[T],
    ) -> Result<(), JoseError> {
        if values.is_empty() {
            return Ok(());
        }
        self.put(name, values)
    }

    pub(crate) fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

pub(crate) fn decode_fields<R: JsonRecord>(mut fields: FieldSet) -> Result<R, JoseError> {
    let mut record = R::decode_reserved(&mut fields)?;
    record.set_additional_members(fields.into_additional(R::RESERVED));
    Ok(record)
}

pub(crate) fn encode_fields<R: JsonRecord>(record: &R) -> Result<Map<String, Value>, JoseError> {
    let mut out = FieldWriter::default();
    record.encode_reserved(&mut out)?;
    let mut fields = out.into_map();
    for (name, value) in record.additional_members() {
        if R::RESERVED.contains(&name.as_str()) {
            tracing::trace!(
                member = %name,
                "drop additional member which collides with a reserved member name"
            );
            continue;
        }
        fields.insert(name.clone(), value.clone());
    }
    Ok(fields)
}

pub(crate) fn from_slice<R: JsonRecord>(bytes: &[u8]) -> Result<R, JoseError> {
    decode_fields(FieldSet::parse(bytes)?)
}

pub(crate) fn to_vec<R: JsonRecord>(record: &R) -> Result<Vec<u8>, JoseError> {
    let fields = encode_fields(record)?;
    serde_json::to_vec(&fields).map_err(JoseError::unexpected)
}

/// Implement [`serde::Serialize`] and [`serde::Deserialize`] for a [`JsonRecord`],
/// so it can be nested within other entities.
macro_rules! impl_serde_for_record {
    ($ty:ty) => {
        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let fields =
                    $crate::record::encode_fields(self).map_err(::serde::ser::Error::custom)?;
                ::serde::Serialize::serialize(&fields, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let fields = <::serde_json::Map<String, ::serde_json::Value> as ::serde::Deserialize>::deserialize(deserializer)?;
                $crate::record::decode_fields($crate::record::FieldSet::from(fields))
                    .map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_serde_for_record;

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[derive(Debug, Default, PartialEq)]
    struct Note {
        title: Option<String>,
        tags: Vec<String>,
        extra: AdditionalMembers,
    }

    impl JsonRecord for Note {
        const RESERVED: &'static [&'static str] = &["title", "tags"];

        fn decode_reserved(fields: &mut FieldSet) -> Result<Self, JoseError> {
            Ok(Self {
                title: fields.take_string("title")?,
                tags: fields.take_seq("tags")?,
                extra: AdditionalMembers::new(),
            })
        }

        fn encode_reserved(&self, out: &mut FieldWriter) -> Result<(), JoseError> {
            out.put_str("title", self.title.as_deref());
            out.put_seq("tags", &self.tags)
        }

        fn additional_members(&self) -> &AdditionalMembers {
            &self.extra
        }

        fn set_additional_members(&mut self, members: AdditionalMembers) {
            self.extra = members;
        }
    }

    impl_serde_for_record!(Note);

    #[test]
    fn unknown_members_are_kept() {
        let note: Note = from_slice(br#"{"title":"t","z":1,"a":[true]}"#).unwrap();
        assert_eq!(note.title.as_deref(), Some("t"));
        assert_eq!(note.extra.len(), 2);
        assert_eq!(
            String::from_utf8(to_vec(&note).unwrap()).unwrap(),
            r#"{"a":[true],"title":"t","z":1}"#
        );
    }

    #[test]
    fn empty_members_are_omitted() {
        let note: Note = from_slice(br#"{"title":"","tags":[]}"#).unwrap();
        assert_eq!(note, Note::default());
        assert_eq!(to_vec(&note).unwrap(), b"{}");
    }

    #[test]
    fn reserved_collisions_are_dropped_on_encode() {
        let mut note = Note {
            title: Some("kept".to_owned()),
            ..Default::default()
        };
        note.extra.insert("title".to_owned(), Value::from("shadow"));
        note.extra.insert("tags".to_owned(), Value::from(1));
        note.extra.insert("other".to_owned(), Value::from(2));

        let encoded = String::from_utf8(to_vec(&note).unwrap()).unwrap();
        assert_eq!(encoded, r#"{"other":2,"title":"kept"}"#);
    }

    #[test]
    fn malformed_member_names_the_field() {
        let err = assert_err!(from_slice::<Note>(br#"{"tags":"nope"}"#));
        assert!(matches!(err, JoseError::FieldDecode { field: "tags", .. }));

        let err = assert_err!(from_slice::<Note>(b"[1,2]"));
        assert!(matches!(err, JoseError::Decode(_)));
    }

    #[test]
    fn nested_through_serde() {
        let notes: Vec<Note> = serde_json::from_str(r#"[{"title":"a","x":null}]"#).unwrap();
        assert_eq!(notes[0].title.as_deref(), Some("a"));
        assert_eq!(
            serde_json::to_string(&notes).unwrap(),
            r#"[{"title":"a","x":null}]"#
        );
    }
}
