//! Conversion between [`Message`] and its persisted row form.
//!
//! `parts` and `metadata` are stored as JSON text. Absent metadata is stored
//! as SQL NULL, never as an empty object, and reads back as `None`.

use serde_json::Value;
use threadkeep_types::error::ThreadStoreError;
use threadkeep_types::message::{Message, MessagePart, MessageRole};

/// One row of a thread unit's `messages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: String,
    pub role: String,
    pub parts: String,
    pub metadata: Option<String>,
    pub created_at: String,
}

/// Encode a message into its row form.
pub fn encode(message: &Message) -> Result<MessageRecord, ThreadStoreError> {
    let parts = serde_json::to_string(&message.parts).map_err(|e| corrupt(&message.id, e))?;
    // `Some(Null)` is stored as SQL NULL, the same as absent.
    let metadata = message
        .metadata
        .as_ref()
        .filter(|value| !value.is_null())
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| corrupt(&message.id, e))?;

    Ok(MessageRecord {
        id: message.id.clone(),
        role: message.role.to_string(),
        parts,
        metadata,
        created_at: message.created_at.clone(),
    })
}

/// Decode a stored row.
///
/// Fails with `CorruptRecord` on an unknown role or on text that is not valid
/// JSON of the expected shape. Never returns a partial message.
pub fn decode(record: MessageRecord) -> Result<Message, ThreadStoreError> {
    let MessageRecord {
        id,
        role,
        parts,
        metadata,
        created_at,
    } = record;

    let role: MessageRole = role.parse().map_err(|e: String| corrupt(&id, e))?;
    let parts: Vec<MessagePart> =
        serde_json::from_str(&parts).map_err(|e| corrupt(&id, format!("parts: {e}")))?;
    let metadata = match metadata.as_deref() {
        None | Some("") => None,
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => return Err(corrupt(&id, format!("metadata: {e}"))),
        },
    };

    Ok(Message {
        id,
        role,
        parts,
        created_at,
        metadata,
    })
}

fn corrupt(id: &str, reason: impl ToString) -> ThreadStoreError {
    ThreadStoreError::CorruptRecord {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(metadata: Option<Value>) -> Message {
        Message {
            id: "msg_1".to_string(),
            role: MessageRole::Assistant,
            parts: vec![
                MessagePart::text("hello"),
                serde_json::from_value(json!({"type": "step-start"})).unwrap(),
                serde_json::from_value(json!({
                    "type": "file",
                    "mediaType": "image/png",
                    "url": "https://example.com/a.png"
                }))
                .unwrap(),
            ],
            created_at: "2024-01-01T00:00:00Z".to_string(),
            metadata,
        }
    }

    #[test]
    fn test_absent_metadata_encodes_as_null() {
        let record = encode(&sample(None)).unwrap();
        assert!(record.metadata.is_none());
        assert_eq!(record.role, "assistant");

        let decoded = decode(record).unwrap();
        assert!(decoded.metadata.is_none());
    }

    #[test]
    fn test_empty_metadata_is_not_absent() {
        let msg = sample(Some(json!({})));
        let record = encode(&msg).unwrap();
        assert_eq!(record.metadata.as_deref(), Some("{}"));
        assert_eq!(decode(record).unwrap(), msg);
    }

    #[test]
    fn test_populated_message_round_trips() {
        let msg = sample(Some(json!({"model": "gpt-4o", "usage": {"tokens": 12}})));
        assert_eq!(decode(encode(&msg).unwrap()).unwrap(), msg);
    }

    #[test]
    fn test_parts_order_is_preserved() {
        let decoded = decode(encode(&sample(None)).unwrap()).unwrap();
        let kinds: Vec<&str> = decoded.parts.iter().map(MessagePart::kind).collect();
        assert_eq!(kinds, vec!["text", "step-start", "file"]);
    }

    #[test]
    fn test_invalid_parts_json_is_corrupt() {
        let mut record = encode(&sample(None)).unwrap();
        record.parts = "[{not json".to_string();

        match decode(record) {
            Err(ThreadStoreError::CorruptRecord { id, reason }) => {
                assert_eq!(id, "msg_1");
                assert!(reason.starts_with("parts"));
            }
            other => panic!("expected CorruptRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_metadata_json_is_corrupt() {
        let mut record = encode(&sample(None)).unwrap();
        record.metadata = Some("{oops".to_string());
        assert!(matches!(
            decode(record),
            Err(ThreadStoreError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_null_metadata_is_stored_as_absent() {
        let record = encode(&sample(Some(Value::Null))).unwrap();
        assert!(record.metadata.is_none());
        assert_eq!(decode(record).unwrap(), sample(None));
    }

    #[test]
    fn test_role_with_wrong_case_is_corrupt() {
        let mut record = encode(&sample(None)).unwrap();
        record.role = "USER".to_string();
        assert!(matches!(
            decode(record),
            Err(ThreadStoreError::CorruptRecord { ref id, .. }) if id == "msg_1"
        ));
    }

    #[test]
    fn test_unknown_role_is_corrupt() {
        let mut record = encode(&sample(None)).unwrap();
        record.role = "tool".to_string();
        assert!(matches!(
            decode(record),
            Err(ThreadStoreError::CorruptRecord { .. })
        ));
    }
}
