use serde_json::Value;
use thiserror::Error;

use crate::ChannelMessage;

/// Errors from encoding/decoding channel messages.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided value was not a JSON object.
    #[error("expected JSON object message payload, got {0}")]
    InvalidValueType(Value),
    /// The payload did not describe a valid message.
    #[error("decode: {0}")]
    Decode(#[source] serde_json::Error),
    /// Serialization failed.
    #[error("encode: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Encode a message into its JSON text form.
pub fn encode(msg: &ChannelMessage) -> Result<String, Error> {
    serde_json::to_string(msg).map_err(Error::Encode)
}

/// Decode JSON text into a message.
///
/// # Errors
/// Returns an error if the text is not valid JSON or lacks a `name` field.
pub fn decode(text: &str) -> Result<ChannelMessage, Error> {
    let value: Value = serde_json::from_str(text).map_err(Error::Decode)?;
    value_to_msg(value)
}

/// Encode a message into a JSON value.
pub fn msg_to_value(msg: &ChannelMessage) -> Result<Value, Error> {
    serde_json::to_value(msg).map_err(Error::Encode)
}

/// Decode a JSON value (object) into a message.
pub fn value_to_msg(value: Value) -> Result<ChannelMessage, Error> {
    match value {
        obj @ Value::Object(_) => serde_json::from_value(obj).map_err(Error::Decode),
        other => Err(Error::InvalidValueType(other)),
    }
}
