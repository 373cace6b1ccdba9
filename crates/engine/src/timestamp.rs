use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::document;

/// A clock value assigned by the store.
///
/// Records are written with [`ServerTime::Pending`]; the store swaps the
/// placeholder for its own clock, so snapshots read back carry
/// [`ServerTime::At`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ServerTime {
    #[default]
    Pending,
    /// Milliseconds since the Unix epoch.
    At(i64),
}

impl ServerTime {
    pub fn millis(self) -> Option<i64> {
        match self {
            Self::Pending => None,
            Self::At(ms) => Some(ms),
        }
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        self.millis().and_then(DateTime::from_timestamp_millis)
    }

    /// Sort key where a not yet resolved time counts as the newest.
    pub(crate) fn sort_key(self) -> i64 {
        self.millis().unwrap_or(i64::MAX)
    }
}

impl Serialize for ServerTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Pending => document::server_timestamp().serialize(serializer),
            Self::At(ms) => serializer.serialize_i64(*ms),
        }
    }
}

impl<'de> Deserialize<'de> for ServerTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if document::is_server_timestamp(&value) {
            return Ok(Self::Pending);
        }
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|ms| ms as i64))
            .map(Self::At)
            .ok_or_else(|| serde::de::Error::custom("expected a timestamp in milliseconds"))
    }
}
