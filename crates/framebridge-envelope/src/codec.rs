use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EnvelopeError, Result};
use crate::token::ControlToken;

/// Operation name reserved for correlated results.
pub const RETURN_OPERATION: &str = "return";

/// Operation names starting with this marker are never remotely invocable.
pub const PRIVATE_MARKER: char = '_';

/// A decoded wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A bare control token.
    Control(ControlToken),
    /// A call to a named operation. `params` is `None` when the sender's
    /// parameters could not be recovered.
    Call {
        operation: String,
        params: Option<Value>,
    },
    /// A correlated result for an earlier call to `key`.
    Return { key: String, value: Value },
}

/// Wire form of an operation call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallWire<'a> {
    method_name: &'a str,
    params_json: String,
}

/// Wire form of a correlated result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReturnWire<'a> {
    method_name: &'static str,
    return_key: &'a str,
    return_value: &'a Value,
}

/// Loose view of an inbound object; every field is optional so that
/// validation happens here rather than in serde.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEnvelope {
    method_name: Option<Value>,
    params_json: Option<Value>,
    params: Option<Value>,
    return_key: Option<Value>,
    return_value: Option<Value>,
}

/// Serialize call parameters.
///
/// A string that already looks like JSON (starts with `{` or `[`) is passed
/// through verbatim; everything else is JSON-serialized.
pub fn encode_params(params: &Value) -> Result<String> {
    if let Value::String(text) = params {
        if text.starts_with('{') || text.starts_with('[') {
            return Ok(text.clone());
        }
    }
    Ok(serde_json::to_string(params)?)
}

/// Build the wire payload for a call to `operation`.
pub fn encode_call(operation: &str, params: &Value) -> Result<Value> {
    let wire = CallWire {
        method_name: operation,
        params_json: encode_params(params)?,
    };
    Ok(serde_json::to_value(wire)?)
}

/// Build the wire payload carrying the result of `operation`.
pub fn encode_return(operation: &str, value: &Value) -> Result<Value> {
    let wire = ReturnWire {
        method_name: RETURN_OPERATION,
        return_key: operation,
        return_value: value,
    };
    Ok(serde_json::to_value(wire)?)
}

/// Decode a posted payload, dropping anything unrecognized.
pub fn decode(raw: &Value) -> Option<Envelope> {
    match try_decode(raw) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            tracing::trace!(error = %err, "dropping inbound payload");
            None
        }
    }
}

/// Decode a posted payload, reporting why it was not an envelope.
pub fn try_decode(raw: &Value) -> Result<Envelope> {
    match raw {
        Value::String(text) => ControlToken::from_wire(text)
            .map(Envelope::Control)
            .ok_or_else(|| EnvelopeError::NotAnEnvelope(format!("unknown token {text:?}"))),
        Value::Object(_) => decode_object(raw),
        other => Err(EnvelopeError::NotAnEnvelope(format!(
            "unsupported payload type {}",
            json_type(other)
        ))),
    }
}

fn decode_object(raw: &Value) -> Result<Envelope> {
    let fields = RawEnvelope::deserialize(raw)?;
    let operation = match fields.method_name {
        Some(Value::String(name)) => name,
        _ => {
            return Err(EnvelopeError::NotAnEnvelope(
                "missing string methodName".to_string(),
            ))
        }
    };

    if operation == RETURN_OPERATION {
        let key = match fields.return_key {
            Some(Value::String(key)) => key,
            _ => {
                return Err(EnvelopeError::NotAnEnvelope(
                    "return without string returnKey".to_string(),
                ))
            }
        };
        return Ok(Envelope::Return {
            key,
            value: fields.return_value.unwrap_or(Value::Null),
        });
    }

    let parsed = match &fields.params_json {
        Some(Value::String(json)) => serde_json::from_str::<Value>(json).ok(),
        _ => None,
    };

    Ok(Envelope::Call {
        operation,
        params: parsed.or(fields.params),
    })
}

/// Returns true if `operation` carries the private marker.
pub fn is_private(operation: &str) -> bool {
    operation.starts_with(PRIVATE_MARKER)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Arguments handed to an operation.
///
/// An array parameter is spread into positional arguments; any other value
/// becomes the single argument; absent parameters mean no arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    /// Build arguments from decoded call parameters.
    pub fn from_params(params: Option<Value>) -> Self {
        match params {
            Some(Value::Array(items)) => Self(items),
            Some(value) => Self(vec![value]),
            None => Self(Vec::new()),
        }
    }

    /// Positional argument `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Positional argument `index` as a string.
    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_looking_strings_pass_through() {
        assert_eq!(encode_params(&json!("[1,2]")).unwrap(), "[1,2]");
        assert_eq!(encode_params(&json!("{\"a\":1}")).unwrap(), "{\"a\":1}");
        assert_eq!(encode_params(&json!("plain")).unwrap(), "\"plain\"");
        assert_eq!(encode_params(&json!({"a": 1})).unwrap(), "{\"a\":1}");
        assert_eq!(encode_params(&Value::Null).unwrap(), "null");
    }

    #[test]
    fn call_wire_shape() {
        let wire = encode_call("setLocalStorageItem", &json!(["k", 1])).unwrap();
        assert_eq!(
            wire,
            json!({"methodName": "setLocalStorageItem", "paramsJson": "[\"k\",1]"})
        );
    }

    #[test]
    fn return_wire_shape() {
        let wire = encode_return("getReferrer", &json!("https://ref.example/")).unwrap();
        assert_eq!(
            wire,
            json!({
                "methodName": "return",
                "returnKey": "getReferrer",
                "returnValue": "https://ref.example/"
            })
        );
    }

    #[test]
    fn decodes_control_tokens() {
        assert_eq!(
            decode(&json!("handshakeSucceeded")),
            Some(Envelope::Control(ControlToken::HandshakeSucceeded))
        );
        assert_eq!(decode(&json!("hello")), None);
    }

    #[test]
    fn decodes_calls() {
        let envelope = decode(&json!({"methodName": "onReady", "paramsJson": "[\"id-1\",\"bb\"]"}));
        assert_eq!(
            envelope,
            Some(Envelope::Call {
                operation: "onReady".to_string(),
                params: Some(json!(["id-1", "bb"])),
            })
        );
    }

    #[test]
    fn unparseable_params_fall_back_to_params_field() {
        let with_params = decode(&json!({
            "methodName": "setLocation",
            "paramsJson": "{broken",
            "params": "https://x.example/"
        }));
        assert_eq!(
            with_params,
            Some(Envelope::Call {
                operation: "setLocation".to_string(),
                params: Some(json!("https://x.example/")),
            })
        );

        let without = decode(&json!({"methodName": "getLocation", "paramsJson": "{broken"}));
        assert_eq!(
            without,
            Some(Envelope::Call {
                operation: "getLocation".to_string(),
                params: None,
            })
        );

        let missing = decode(&json!({"methodName": "getLocation"}));
        assert!(matches!(missing, Some(Envelope::Call { params: None, .. })));
    }

    #[test]
    fn decodes_returns() {
        let envelope = decode(&json!({"methodName": "return", "returnKey": "getLocation", "returnValue": 5}));
        assert_eq!(
            envelope,
            Some(Envelope::Return {
                key: "getLocation".to_string(),
                value: json!(5),
            })
        );
        assert_eq!(decode(&json!({"methodName": "return", "returnValue": 5})), None);
    }

    #[test]
    fn drops_other_payloads() {
        assert_eq!(decode(&json!(42)), None);
        assert_eq!(decode(&Value::Null), None);
        assert_eq!(decode(&json!(["handshake"])), None);
        assert_eq!(decode(&json!({"methodName": 7})), None);
        assert_eq!(decode(&json!({"paramsJson": "[]"})), None);
        assert!(matches!(
            try_decode(&json!(true)),
            Err(EnvelopeError::NotAnEnvelope(_))
        ));
    }

    #[test]
    fn arguments_spread_arrays() {
        let args = Arguments::from_params(Some(json!(["k", {"v": 1}])));
        assert_eq!(args.len(), 2);
        assert_eq!(args.str(0), Some("k"));
        assert_eq!(args.get(1), Some(&json!({"v": 1})));

        let single = Arguments::from_params(Some(json!({"eventType": "x"})));
        assert_eq!(single.len(), 1);

        assert!(Arguments::from_params(None).is_empty());
        assert_eq!(Arguments::from_params(Some(Value::Null)).len(), 1);
    }

    #[test]
    fn private_marker() {
        assert!(is_private("_onMessage"));
        assert!(!is_private("getReferrer"));
    }
}
