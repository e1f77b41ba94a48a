use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `safespend {cmd} --help` for usage."),
            None => "Run `safespend --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn invalid_input_format(message: &str, received_format: &str) -> Self {
        Self::invalid_argument_with_recovery(
            message,
            vec![
                "Provide a supported input format (JSON array or CSV).".to_string(),
                "Run `safespend forecast --help` to confirm field requirements.".to_string(),
            ],
        )
        .with_data(json!({
            "received_format": received_format,
            "supported_formats": ["json_array", "csv"],
        }))
    }

    pub fn invalid_row(source_label: &str, row: usize, field: &str, detail: &str) -> Self {
        Self::invalid_argument_with_recovery(
            &format!("Row {row} of {source_label} has an invalid `{field}`: {detail}"),
            vec![
                format!("Fix the `{field}` value on row {row} and rerun the command."),
                "Run `safespend forecast --help` to review field rules.".to_string(),
            ],
        )
        .with_data(json!({
            "source": source_label,
            "row": row,
            "field": field,
        }))
    }

    pub fn source_read_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "source_read_failed",
            &format!("Could not read `{location}`: {detail}"),
            vec![
                "Verify the path exists and is readable.".to_string(),
                "Pass `-` to read the same content from stdin.".to_string(),
            ],
        )
    }

    pub fn config_invalid(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "config_invalid",
            &format!("Config file `{location}` is invalid: {detail}"),
            vec![
                format!("Fix or remove `{location}`."),
                "Unset `SAFESPEND_CONFIG` to fall back to built-in policy defaults.".to_string(),
            ],
        )
        .with_data(json!({
            "config_path": location,
        }))
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn is_internal(&self) -> bool {
        self.code.starts_with("internal_")
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
