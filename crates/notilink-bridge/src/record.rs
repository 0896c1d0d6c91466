use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded inbound notification.
///
/// Every field is always present; values missing on the wire are empty
/// strings. The three payload fields are opaque JSON documents encoded as
/// strings and are only decoded on request, see
/// [`NotificationRecord::primary_payload_value`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationRecord {
    /// Identifier of the record the notification is about.
    pub record_id: String,
    /// Identifier of the record in the originating external system.
    pub external_id: String,
    /// API name of the record's object type, e.g. `Case`.
    pub object_name: String,
    /// Comma-joined list of field API names that changed.
    pub field_names: String,
    pub heading: String,
    pub description: String,
    pub primary_payload: String,
    pub secondary_payload: String,
    pub tertiary_payload: String,
    /// Identifier of the user who submitted the change.
    pub submitted_by: String,
}

impl NotificationRecord {
    /// Iterates over the individual field names of the comma-joined list.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Decodes the primary payload. Returns `None` when it is empty.
    pub fn primary_payload_value(&self) -> Option<serde_json::Result<Value>> {
        decode_payload(&self.primary_payload)
    }

    /// Decodes the secondary payload. Returns `None` when it is empty.
    pub fn secondary_payload_value(&self) -> Option<serde_json::Result<Value>> {
        decode_payload(&self.secondary_payload)
    }

    /// Decodes the tertiary payload. Returns `None` when it is empty.
    pub fn tertiary_payload_value(&self) -> Option<serde_json::Result<Value>> {
        decode_payload(&self.tertiary_payload)
    }
}

fn decode_payload(payload: &str) -> Option<serde_json::Result<Value>> {
    if payload.is_empty() {
        None
    } else {
        Some(serde_json::from_str(payload))
    }
}

/// A single entry of a cache invalidation request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordChange {
    pub record_id: String,
}

impl RecordChange {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
        }
    }
}
