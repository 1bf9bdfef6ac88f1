//! Firestore typed-value codec.
//!
//! Firestore's REST API wraps every field in a single-key object naming its
//! type (`{"stringValue": "x"}`, `{"integerValue": "5"}`, ...). Domain types
//! serialize to plain JSON through serde, and this module converts between the
//! two shapes.

use crate::error::ProviderError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Encode a serializable value as a Firestore `fields` map.
///
/// Top-level string fields named in `timestamps` are written as
/// `timestampValue` so they sort and query as dates.
///
/// # Errors
///
/// [`ProviderError::Rejected`] when `value` does not serialize to a JSON object.
pub fn encode_fields<T: Serialize>(value: &T, timestamps: &[&str]) -> Result<Value, ProviderError> {
    let plain = serde_json::to_value(value)
        .map_err(|e| ProviderError::Rejected(format!("encode failed: {e}")))?;
    let Value::Object(object) = plain else {
        return Err(ProviderError::Rejected("document must be an object".into()));
    };

    let fields: Map<String, Value> = object
        .into_iter()
        .map(|(key, value)| {
            let encoded = match value {
                Value::String(ts) if timestamps.contains(&key.as_str()) => {
                    json!({ "timestampValue": ts })
                }
                other => encode(other),
            };
            (key, encoded)
        })
        .collect();

    Ok(Value::Object(fields))
}

/// Encode one plain JSON value as a typed Firestore value.
#[must_use]
pub fn encode(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                json!({ "integerValue": int.to_string() })
            } else if let Some(int) = number.as_u64() {
                json!({ "integerValue": int.to_string() })
            } else {
                json!({ "doubleValue": number })
            }
        }
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.into_iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(object) => {
            let fields: Map<String, Value> =
                object.into_iter().map(|(k, v)| (k, encode(v))).collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Decode one typed Firestore value into plain JSON.
///
/// Timestamps become RFC 3339 strings and integers become JSON numbers.
/// Unknown wrappers decode as `null`.
#[must_use]
pub fn decode(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => inner.as_bool().map_or(Value::Null, Value::Bool),
        "integerValue" => match inner {
            Value::String(raw) => raw.parse::<i64>().map_or(Value::Null, Value::from),
            Value::Number(_) => inner.clone(),
            _ => Value::Null,
        },
        "doubleValue" => match inner {
            Value::Number(_) => inner.clone(),
            // NaN and infinities travel as strings
            _ => Value::Null,
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode).collect())
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => decode_fields(inner.get("fields")),
        _ => Value::Null,
    }
}

/// Decode a `fields` map into a plain JSON object. `None` yields `{}`.
#[must_use]
pub fn decode_fields(fields: Option<&Value>) -> Value {
    let object: Map<String, Value> = fields
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| (key.clone(), decode(value)))
                .collect()
        })
        .unwrap_or_default();
    Value::Object(object)
}

/// Last path segment of a document resource name.
#[must_use]
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Decode a Firestore document into `T`, filling `id` from the resource name
/// when the stored fields do not carry one.
///
/// # Errors
///
/// [`ProviderError::Rejected`] when the fields do not match `T`.
pub fn decode_document<T: DeserializeOwned>(document: &Value) -> Result<T, ProviderError> {
    let mut plain = decode_fields(document.get("fields"));
    if let (Value::Object(object), Some(name)) =
        (&mut plain, document.get("name").and_then(Value::as_str))
    {
        object
            .entry("id")
            .or_insert_with(|| Value::String(document_id(name).to_string()));
    }
    serde_json::from_value(plain).map_err(|e| {
        let name = document.get("name").and_then(Value::as_str).unwrap_or("?");
        ProviderError::Rejected(format!("malformed document {name}: {e}"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Member, Money, TrainingSession};

    #[test]
    fn encodes_scalars_and_nesting() {
        assert_eq!(encode(json!(7)), json!({ "integerValue": "7" }));
        assert_eq!(encode(json!(5.5)), json!({ "doubleValue": 5.5 }));
        assert_eq!(
            encode(json!({ "name": "Sam", "tags": [true] })),
            json!({ "mapValue": { "fields": {
                "name": { "stringValue": "Sam" },
                "tags": { "arrayValue": { "values": [{ "booleanValue": true }] } }
            }}})
        );
    }

    #[test]
    fn timestamp_hint_applies_to_named_fields_only() {
        let fields = encode_fields(
            &json!({ "joinDate": "2024-09-01T18:30:00Z", "email": "a@b.co" }),
            &["joinDate"],
        )
        .unwrap();
        assert_eq!(fields["joinDate"], json!({ "timestampValue": "2024-09-01T18:30:00Z" }));
        assert_eq!(fields["email"], json!({ "stringValue": "a@b.co" }));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(encode_fields(&json!([1, 2]), &[]).is_err());
    }

    #[test]
    fn decodes_session_document_with_timestamp_date() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/sessions/s-42",
            "fields": {
                "title": { "stringValue": "Intermediate Training" },
                "date": { "timestampValue": "2025-03-14T00:00:00Z" },
                "startTime": { "stringValue": "19:00" },
                "endTime": { "stringValue": "21:00" },
                "venue": { "stringValue": "Sunbury Leisure Centre" },
                "cost": { "integerValue": "5" },
                "maxParticipants": { "integerValue": "12" }
            }
        });

        let session: TrainingSession = decode_document(&document).unwrap();
        assert_eq!(session.id.as_str(), "s-42");
        assert_eq!(session.date.to_string(), "2025-03-14");
        assert_eq!(session.cost, Money::from_pounds(5));
        assert_eq!(session.max_participants, 12);
    }

    #[test]
    fn member_survives_encode_and_decode() {
        let member = crate::mocks::fixtures::member("uid-1", Some(crate::types::Role::Admin));
        let fields = encode_fields(&member, &["joinDate"]).unwrap();
        let document = json!({
            "name": "projects/p/databases/(default)/documents/users/uid-1",
            "fields": fields,
        });
        let decoded: Member = decode_document(&document).unwrap();
        assert_eq!(decoded, member);
    }

    #[test]
    fn malformed_document_names_itself() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/sessions/bad",
            "fields": { "title": { "integerValue": "3" } }
        });
        let err = decode_document::<TrainingSession>(&document).unwrap_err();
        assert!(err.to_string().contains("sessions/bad"));
    }
}
