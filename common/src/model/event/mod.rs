//! Events and tags emitted on successful state changes

use serde::{Deserialize, Serialize};

/// A single key/value attribute of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

/// Structured record of what a message or block boundary changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type (e.g., "create_market")
    pub kind: String,
    /// Ordered attributes
    pub attributes: Vec<Tag>,
}

impl Event {
    pub fn new(kind: impl Into<String>, attributes: Vec<Tag>) -> Self {
        Self {
            kind: kind.into(),
            attributes,
        }
    }

    /// Look up the first attribute with the given key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}
