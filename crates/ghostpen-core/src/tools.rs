use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool definition sent to the model as part of every request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Result of one tool dispatch.
///
/// `success` is advisory: the engine only uses it to pick how the outcome
/// is shown to the human. The whole payload goes back to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub payload: Value,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl ToolOutcome {
    /// Successful outcome. `fields` must be a JSON object; `success: true`
    /// is inserted in front of it.
    pub fn ok(fields: Value) -> Self {
        Self::with_flag(true, fields)
    }

    /// Business-level failure with a machine code and a human message.
    pub fn failure(error: &str, message: impl Into<String>) -> Self {
        Self::with_flag(false, json!({"error": error, "message": message.into()}))
    }

    /// Business-level failure carrying extra fields next to `error`/`message`.
    pub fn failure_with(error: &str, message: impl Into<String>, extra: Value) -> Self {
        let mut outcome = Self::failure(error, message);
        if let (Some(target), Value::Object(extra)) = (outcome.payload.as_object_mut(), extra) {
            target.extend(extra);
        }
        outcome
    }

    fn with_flag(success: bool, fields: Value) -> Self {
        let mut payload = serde_json::Map::new();
        payload.insert("success".into(), Value::Bool(success));
        match fields {
            Value::Object(map) => payload.extend(map),
            Value::Null => {}
            other => {
                payload.insert("result".into(), other);
            }
        }
        Self {
            success,
            payload: Value::Object(payload),
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Machine error code, if the outcome is a failure.
    pub fn error_code(&self) -> Option<&str> {
        self.payload.get("error").and_then(Value::as_str)
    }

    /// Human-readable message, if the handler supplied one.
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(Value::as_str)
    }

    /// Serialized form placed into the ToolResult block.
    pub fn to_content(&self) -> String {
        self.payload.to_string()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
