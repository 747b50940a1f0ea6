//! Comment records as an ordered sequence of opaque JSON values.
//!
//! Only `chat.content` is ever read or written; every other field, and every
//! record without a chat, passes through untouched with its key order intact.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::comments::RecordsError;

/// Translatable text pulled out of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Position of the originating record in the sequence.
    pub index: usize,
    pub text: String,
}

/// The upstream response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Records {
    items: Vec<Value>,
}

impl Records {
    /// Parse an upstream body. Anything but a JSON array is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, RecordsError> {
        match serde_json::from_slice(body)? {
            Value::Array(items) => Ok(Self { items }),
            other => Err(RecordsError::NotAnArray(kind_of(&other))),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every non-empty `chat.content`, in sequence order.
    pub fn extract(&self) -> Vec<ExtractedText> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let text = content_of(item)?;
                if text.is_empty() {
                    return None;
                }
                Some(ExtractedText {
                    index,
                    text: text.to_string(),
                })
            })
            .collect()
    }

    /// Overwrite `chat.content` for every index in `translations`.
    ///
    /// # Panics
    ///
    /// If an index is out of range or names a record without a chat object.
    /// Callers only pass indices obtained from [`Records::extract`].
    pub fn reassemble(&mut self, translations: &BTreeMap<usize, String>) {
        let len = self.items.len();
        for (&index, text) in translations {
            let Some(item) = self.items.get_mut(index) else {
                panic!("reassembly index {} out of range for {} records", index, len);
            };
            let Some(chat) = item.get_mut("chat").and_then(Value::as_object_mut) else {
                panic!("record {} carries no chat object", index);
            };
            chat.insert("content".to_string(), Value::String(text.clone()));
        }
    }

    /// Serialize back into the upstream's shape.
    pub fn to_vec(&self) -> Result<Vec<u8>, RecordsError> {
        Ok(serde_json::to_vec(&self.items)?)
    }
}

fn content_of(item: &Value) -> Option<&str> {
    item.get("chat")?.get("content")?.as_str()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
