use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// [`NumericDate`] is the number of seconds since the Unix epoch,
/// as defined in section 2 of [`rfc7519`].
///
/// Encoded as a JSON integer. Fractional input is truncated to whole seconds.
///
/// [`rfc7519`]: https://datatracker.ietf.org/doc/html/rfc7519#section-2
pub struct NumericDate(i64);

impl NumericDate {
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Current time, truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        Timestamp::now().into()
    }

    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0
    }

    /// This date as a [`Timestamp`], `None` if it is outside of the supported range.
    #[must_use]
    pub fn to_timestamp(self) -> Option<Timestamp> {
        Timestamp::from_second(self.0).ok()
    }
}

impl From<Timestamp> for NumericDate {
    fn from(value: Timestamp) -> Self {
        Self(value.as_second())
    }
}

impl fmt::Display for NumericDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_timestamp() {
            Some(ts) => fmt::Display::fmt(&ts, f),
            None => fmt::Display::fmt(&self.0, f),
        }
    }
}

impl Serialize for NumericDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(seconds) => Ok(Self(seconds)),
            Raw::Float(seconds)
                if seconds.is_finite() && (i64::MIN as f64..=i64::MAX as f64).contains(&seconds) =>
            {
                Ok(Self(seconds.trunc() as i64))
            }
            Raw::Float(_) => Err(de::Error::custom("numeric date out of range")),
        }
    }
}
