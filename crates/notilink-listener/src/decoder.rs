//! Decoding of inbound socket messages into [`NotificationRecord`]s.

use notilink_bridge::record::NotificationRecord;
use serde_json::Value;

const RECORD_ID_KEY: &str = "SalesforceId__c";
const EXTERNAL_ID_KEY: &str = "ExternalId__c";
const OBJECT_NAME_KEY: &str = "ObjectAPIName__c";
const FIELD_NAMES_KEY: &str = "FieldAPINames__c";
const HEADING_KEY: &str = "Heading__c";
const DESCRIPTION_KEY: &str = "Description__c";
const PRIMARY_PAYLOAD_KEY: &str = "PrimaryPayload__c";
const SECONDARY_PAYLOAD_KEY: &str = "SecondaryPayload__c";
const TERTIARY_PAYLOAD_KEY: &str = "TertiaryPayload__c";
const SUBMITTED_BY_KEY: &str = "SubmittedBy__c";

/// Errors that can occur while decoding a non-empty message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The message is not well-formed JSON.
    #[error("message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The message is JSON but has no object under `payload`.
    #[error("message has no payload object")]
    MissingPayload,
}

/// Decodes one raw message.
///
/// An absent or empty message means "no message" and yields `Ok(None)`.
/// Every field missing from the payload is set to an empty string, see
/// [`value_or_default`]. Unknown keys are ignored.
pub fn decode(raw: Option<&str>) -> Result<Option<NotificationRecord>, DecodeError> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let envelope: Value = serde_json::from_str(raw)?;
    let payload = envelope
        .get("payload")
        .and_then(Value::as_object)
        .ok_or(DecodeError::MissingPayload)?;
    let field = |key: &str| value_or_default(payload.get(key));

    Ok(Some(NotificationRecord {
        record_id: field(RECORD_ID_KEY),
        external_id: field(EXTERNAL_ID_KEY),
        object_name: field(OBJECT_NAME_KEY),
        field_names: field(FIELD_NAMES_KEY),
        heading: field(HEADING_KEY),
        description: field(DESCRIPTION_KEY),
        primary_payload: field(PRIMARY_PAYLOAD_KEY),
        secondary_payload: field(SECONDARY_PAYLOAD_KEY),
        tertiary_payload: field(TERTIARY_PAYLOAD_KEY),
        submitted_by: field(SUBMITTED_BY_KEY),
    }))
}

/// Replaces falsy values (absent, `null`, `""`, `false`, `0`) with an empty
/// string. Strings are kept as is, anything else is kept as its JSON text.
fn value_or_default(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
