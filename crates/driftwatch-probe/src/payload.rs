//! Identity payload validation.

use driftwatch_core::Identity;
use serde_json::Value;

use crate::error::MalformedResponseError;

const VERSION_FIELD: &str = "version";
const INSTANCE_ID_FIELD: &str = "instanceId";

/// Decode and validate an identity response body.
///
/// The body must be a JSON object with non-empty string `version` and
/// `instanceId` fields. Extra fields are ignored.
pub fn parse_identity(body: &[u8]) -> Result<Identity, MalformedResponseError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| MalformedResponseError::Decode(e.to_string()))?;
    let object = value.as_object().ok_or(MalformedResponseError::NotAnObject)?;

    let version = required_string(object, VERSION_FIELD)?;
    let instance_id = required_string(object, INSTANCE_ID_FIELD)?;
    Ok(Identity::new(version, instance_id))
}

fn required_string<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, MalformedResponseError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(MalformedResponseError::MissingField(field)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(MalformedResponseError::InvalidField(field)),
    }
}
