// src/domain/message.rs

//! Protocol message model.
//!
//! A Bayeux message is a JSON object. The transport layer only ever looks at
//! four fields (`id`, `channel`, `data`, `advice`) and only ever writes one
//! (`id`). Every other field (`successful`, `clientId`, `ext`, ...) belongs to
//! the session or protocol layer and is carried in [`Message::fields`] so that
//! a message survives a decode/encode cycle unchanged.
//!
//! A recognized field is only lifted out of the object when its value has
//! the expected shape: a string `id` or `channel`, a non-null `data`, an
//! object `advice`. Anything else (an explicit `null`, a numeric `id`, ...)
//! stays in [`Message::fields`] as received and is re-encoded verbatim, so
//! one odd message never makes a whole batch unreadable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reconnection directive sent by the server.
///
/// Its format is owned by the session layer; the transport forwards it
/// without looking inside.
pub type Advice = Map<String, Value>;

const ID: &str = "id";
const CHANNEL: &str = "channel";
const DATA: &str = "data";
const ADVICE: &str = "advice";

/// A single protocol message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Message {
    // ---
    /// Correlation key matching a reply to the request that caused it.
    pub id: Option<String>,

    /// Channel the message is published on or addressed to.
    pub channel: Option<String>,

    /// Application payload of an event message.
    pub data: Option<Value>,

    /// Server reconnection advice.
    pub advice: Option<Advice>,

    /// All remaining fields, preserved verbatim.
    ///
    /// A typed field that is set takes precedence over an entry of the same
    /// name here when encoding.
    pub fields: Map<String, Value>,
}

impl From<Map<String, Value>> for Message {
    fn from(mut fields: Map<String, Value>) -> Self {
        // ---
        let id = match fields.remove(ID) {
            Some(Value::String(id)) => Some(id),
            other => keep(&mut fields, ID, other),
        };
        let channel = match fields.remove(CHANNEL) {
            Some(Value::String(channel)) => Some(channel),
            other => keep(&mut fields, CHANNEL, other),
        };
        let data = match fields.remove(DATA) {
            Some(Value::Null) => keep(&mut fields, DATA, Some(Value::Null)),
            other => other,
        };
        let advice = match fields.remove(ADVICE) {
            Some(Value::Object(advice)) => Some(advice),
            other => keep(&mut fields, ADVICE, other),
        };

        Self {
            id,
            channel,
            data,
            advice,
            fields,
        }
    }
}

/// Put back a value that did not fit its typed field.
fn keep<T>(fields: &mut Map<String, Value>, name: &str, value: Option<Value>) -> Option<T> {
    if let Some(value) = value {
        fields.insert(name.to_string(), value);
    }
    None
}

impl From<Message> for Map<String, Value> {
    fn from(message: Message) -> Self {
        // ---
        let mut object = message.fields;

        if let Some(id) = message.id {
            object.insert(ID.into(), Value::String(id));
        }
        if let Some(channel) = message.channel {
            object.insert(CHANNEL.into(), Value::String(channel));
        }
        if let Some(data) = message.data {
            object.insert(DATA.into(), data);
        }
        if let Some(advice) = message.advice {
            object.insert(ADVICE.into(), Value::Object(advice));
        }
        object
    }
}

impl Message {
    /// Create a message addressed to `channel`.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            ..Self::default()
        }
    }

    /// Set the `data` field.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the `id` field.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `advice` field.
    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = Some(advice);
        self
    }

    /// Set an arbitrary passthrough field.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a passthrough field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// True if this message is an event to hand to the session for delivery,
    /// meaning it carries both `data` and `channel`.
    pub fn is_event(&self) -> bool {
        self.data.is_some() && self.channel.is_some()
    }
}

/// Body of a request or response: one message or an array of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    // ---
    /// An array of messages.
    Batch(Vec<Message>),

    /// A single message object.
    Single(Message),
}

impl Payload {
    /// Flatten into an ordered list of messages.
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Payload::Batch(messages) => messages,
            Payload::Single(message) => vec![message],
        }
    }

    /// Number of messages carried.
    pub fn len(&self) -> usize {
        match self {
            Payload::Batch(messages) => messages.len(),
            Payload::Single(_) => 1,
        }
    }

    /// True for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Message> for Payload {
    fn from(message: Message) -> Self {
        Payload::Single(message)
    }
}

impl From<Vec<Message>> for Payload {
    fn from(messages: Vec<Message>) -> Self {
        Payload::Batch(messages)
    }
}
