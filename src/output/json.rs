//! JSON output on stdout.
//!
//! Every command prints exactly one object: `{"command", "response"}` on
//! success or `{"command", "error"}` on failure. Logs never go to stdout.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace};

use crate::error::BackendError;

/// Writes command results as JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub const fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// `{"command": <command>, "response": <response>}`
    pub fn response_value<T: Serialize + ?Sized>(command: &str, response: &T) -> Value {
        match serde_json::to_value(response) {
            Ok(response) => envelope(command, "response", response),
            Err(e) => Self::error_value(command, &BackendError::Json(e)),
        }
    }

    /// `{"command": <command>, "error": {"type", "message", "suggestion"}}`
    pub fn error_value(command: &str, error: &BackendError) -> Value {
        let mut detail = Map::new();
        detail.insert("type".to_string(), Value::from(error.kind()));
        detail.insert("message".to_string(), Value::from(error.to_string()));
        detail.insert(
            "suggestion".to_string(),
            error.suggestion().map_or(Value::Null, Value::from),
        );
        envelope(command, "error", Value::Object(detail))
    }

    /// Print a successful response.
    #[instrument(skip(self, response))]
    pub fn response<T: Serialize + ?Sized>(&self, command: &str, response: &T) {
        debug!("Printing response");
        self.print(&Self::response_value(command, response));
    }

    /// Print an error object.
    #[instrument(skip(self, error))]
    pub fn error(&self, command: &str, error: &BackendError) {
        debug!(error = %error, "Printing error");
        self.print(&Self::error_value(command, error));
    }

    fn print(&self, value: &Value) {
        let json = if self.pretty {
            format!("{value:#}")
        } else {
            value.to_string()
        };
        trace!(json_len = json.len(), "JSON serialized");
        println!("{json}");
    }
}

fn envelope(command: &str, field: &str, payload: Value) -> Value {
    let mut object = Map::new();
    object.insert("command".to_string(), Value::from(command));
    object.insert(field.to_string(), payload);
    Value::Object(object)
}
