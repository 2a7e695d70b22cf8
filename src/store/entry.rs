//! Store Entry Module
//!
//! Defines stored payloads and the entry wrapper carrying an optional expiration instant.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::store::List;

/// Shared handle to a list owned by a shard.
///
/// The list synchronizes itself, so a handle may be used from any thread
/// without holding the shard lock.
pub type ListHandle = Arc<List>;

// == Value ==
/// Payload held by an [`Entry`].
///
/// Serialized adjacently tagged: `{"type": "scalar", "data": ...}` or
/// `{"type": "list", "data": [...]}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Opaque JSON payload (string, number, boolean, null or any document)
    Scalar(JsonValue),
    /// Stack-ordered list
    List(ListHandle),
}

impl Value {
    /// Wraps anything convertible to JSON as a scalar payload.
    pub fn scalar(value: impl Into<JsonValue>) -> Self {
        Value::Scalar(value.into())
    }

    // == Detached Copy ==
    /// Copies the payload without sharing list storage.
    ///
    /// Scalars are cloned; lists are copied into a fresh, unaliased [`List`].
    pub fn detached(&self) -> Value {
        match self {
            Value::Scalar(value) => Value::Scalar(value.clone()),
            Value::List(list) => Value::List(Arc::new(List::from_items(list.items()))),
        }
    }

    /// Converts the payload into plain JSON. Lists become arrays, oldest first.
    pub fn into_json(self) -> JsonValue {
        match self {
            Value::Scalar(value) => value,
            Value::List(list) => JsonValue::Array(list.items()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b) || a.items() == b.items(),
            _ => false,
        }
    }
}

// == Entry ==
/// A stored value with an optional absolute expiration instant.
#[derive(Debug, Serialize, Deserialize)]
pub struct Entry {
    /// The stored payload
    pub value: Value,
    /// Expiration instant, None = never expires
    #[serde(rename = "expiresAt", default, deserialize_with = "deserialize_expiry")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Reads an expiration written as an RFC 3339 instant or Unix seconds.
///
/// `null`, `0` and any instant at or before the Unix epoch (including the
/// year-1 zero time some writers emit for "unset") mean the entry never
/// expires.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawExpiry {
        Seconds(i64),
        Instant(DateTime<Utc>),
    }

    let instant = match Option::<RawExpiry>::deserialize(deserializer)? {
        None => None,
        Some(RawExpiry::Seconds(secs)) => DateTime::<Utc>::from_timestamp(secs, 0),
        Some(RawExpiry::Instant(instant)) => Some(instant),
    };
    Ok(instant.filter(|at| at.timestamp() > 0))
}

impl Entry {
    // == Constructor ==
    /// Creates an entry expiring `ttl_seconds` from now.
    ///
    /// A TTL of 0 means the entry never expires. A TTL too large to be
    /// represented as an instant is treated the same way.
    pub fn new(value: Value, ttl_seconds: u64) -> Self {
        let expires_at = if ttl_seconds == 0 {
            None
        } else {
            i64::try_from(ttl_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        };

        Self { value, expires_at }
    }

    /// Creates an entry that never expires.
    pub fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is logically absent right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Checks expiry against a given instant.
    ///
    /// An entry is expired only once `now` is strictly past its expiration.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires) if now > expires)
    }

    /// Copies the entry without sharing list storage.
    pub fn detached(&self) -> Entry {
        Entry {
            value: self.value.detached(),
            expires_at: self.expires_at,
        }
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.expires_at == other.expires_at
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = Entry::new(Value::scalar("test_value"), 0);

        assert_eq!(entry.value, Value::scalar("test_value"));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = Entry::new(Value::scalar("test_value"), 60);

        assert!(entry.expires_at.is_some());
        assert!(!entry.is_expired());

        let remaining = (entry.expires_at.unwrap() - Utc::now()).num_seconds();
        assert!(remaining <= 60);
        assert!(remaining >= 58);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = Entry::new(Value::scalar("test_value"), 1);
        assert!(!entry.is_expired());

        sleep(StdDuration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_is_strict() {
        let now = Utc::now();
        let entry = Entry {
            value: Value::scalar("test"),
            expires_at: Some(now),
        };

        // Exactly at the expiration instant the entry is still visible
        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let entry = Entry::new(Value::scalar(1), u64::MAX);
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_detached_list_is_unaliased() {
        let list = Arc::new(List::new());
        list.push(json!("a"));
        let entry = Entry::persistent(Value::List(list.clone()));

        let copy = entry.detached();
        list.push(json!("b"));

        match copy.value {
            Value::List(copied) => assert_eq!(copied.items(), vec![json!("a")]),
            Value::Scalar(_) => panic!("expected a list"),
        }
    }

    #[test]
    fn test_value_into_json() {
        let list = Arc::new(List::from_items(vec![json!(1), json!(2)]));
        assert_eq!(Value::List(list).into_json(), json!([1, 2]));
        assert_eq!(Value::scalar(true).into_json(), json!(true));
    }

    #[test]
    fn test_entry_serialized_shape() {
        let entry = Entry::persistent(Value::scalar("y"));
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["value"]["type"], "scalar");
        assert_eq!(json["value"]["data"], "y");
        assert!(json["expiresAt"].is_null());

        let list = Entry::persistent(Value::List(Arc::new(List::from_items(vec![json!("a")]))));
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["value"]["type"], "list");
        assert_eq!(json["value"]["data"], json!(["a"]));
    }

    #[test]
    fn test_entry_deserialize_without_expiry_field() {
        let entry: Entry =
            serde_json::from_str(r#"{"value":{"type":"scalar","data":42}}"#).unwrap();
        assert_eq!(entry.value, Value::scalar(42));
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_zero_expiry_markers_never_expire() {
        for raw in [
            r#"{"value":{"type":"scalar","data":1},"expiresAt":null}"#,
            r#"{"value":{"type":"scalar","data":1},"expiresAt":0}"#,
            r#"{"value":{"type":"scalar","data":1},"expiresAt":"1970-01-01T00:00:00Z"}"#,
            r#"{"value":{"type":"scalar","data":1},"expiresAt":"0001-01-01T00:00:00Z"}"#,
        ] {
            let entry: Entry = serde_json::from_str(raw).unwrap();
            assert!(entry.expires_at.is_none(), "{raw} should never expire");
            assert!(!entry.is_expired());
        }
    }

    #[test]
    fn test_expiry_accepts_unix_seconds() {
        let at = Utc::now().timestamp() + 3600;
        let raw = format!(r#"{{"value":{{"type":"scalar","data":1}},"expiresAt":{at}}}"#);

        let entry: Entry = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.expires_at.map(|e| e.timestamp()), Some(at));
    }

    #[test]
    fn test_expiry_roundtrips_through_serde() {
        let entry = Entry::new(Value::scalar("v"), 60);
        let decoded: Entry = serde_json::from_str(&serde_json::to_string(&entry).unwrap()).unwrap();
        assert_eq!(decoded, entry);
    }
}
