//! Thread message types.
//!
//! A [`Message`] is one turn in a conversation thread. Its `parts` are an
//! ordered list of tagged content segments, and its `createdAt` timestamp is
//! owned by the caller: stores persist it verbatim and never generate one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author of a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One content segment of a message, keyed on its `type` field.
///
/// Text parts are typed; every other kind (files, tool calls, reasoning,
/// step markers, ...) is carried as opaque key/value data so that it survives
/// a store round-trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPart", into = "RawPart")]
pub enum MessagePart {
    /// `{"type": "text", "text": ...}`. `extra` keeps any sibling keys the
    /// client attached (e.g. `state`, `providerMetadata`).
    Text {
        text: String,
        extra: Map<String, Value>,
    },
    /// Any non-text part. `fields` never contains the `type` key.
    Other {
        kind: String,
        fields: Map<String, Value>,
    },
}

impl MessagePart {
    /// A plain text part with no extra keys.
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text {
            text: text.into(),
            extra: Map::new(),
        }
    }

    /// The part's `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            MessagePart::Text { .. } => "text",
            MessagePart::Other { kind, .. } => kind,
        }
    }

    /// The text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { text, .. } => Some(text),
            MessagePart::Other { .. } => None,
        }
    }
}

/// Wire shape of a part: the `type` tag plus every other key.
#[derive(Serialize, Deserialize)]
struct RawPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl TryFrom<RawPart> for MessagePart {
    type Error = String;

    fn try_from(raw: RawPart) -> Result<Self, Self::Error> {
        let RawPart { kind, mut fields } = raw;
        if kind != "text" {
            return Ok(MessagePart::Other { kind, fields });
        }
        match fields.remove("text") {
            Some(Value::String(text)) => Ok(MessagePart::Text {
                text,
                extra: fields,
            }),
            Some(other) => Err(format!("text part has non-string text: {other}")),
            None => Err("text part is missing its text".to_string()),
        }
    }
}

impl From<MessagePart> for RawPart {
    fn from(part: MessagePart) -> Self {
        match part {
            MessagePart::Text { text, mut extra } => {
                extra.insert("text".to_string(), Value::String(text));
                RawPart {
                    kind: "text".to_string(),
                    fields: extra,
                }
            }
            MessagePart::Other { kind, fields } => RawPart { kind, fields },
        }
    }
}

/// A single message in a thread.
///
/// Serialized with camelCase keys (`createdAt`) to match the chat clients.
/// `metadata: null` on the wire deserializes to `None`, and `None` is omitted
/// when serializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique within its thread.
    pub id: String,
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
    /// ISO-8601 timestamp supplied by the caller.
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    /// Concatenated text of all text parts, in order.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(MessagePart::as_text).collect()
    }
}
