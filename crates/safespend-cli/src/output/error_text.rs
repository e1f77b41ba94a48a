use safespend_client::ClientError;
use serde_json::Value;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        "The command could not finish.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
    ];

    if let Some(location) = error.data.as_ref().and_then(row_location) {
        lines.push(format!("  Where:    {location}"));
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if error.recovery_steps.is_empty() {
        lines.push("  1. Rerun with -v and report the log if this keeps happening.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}

fn row_location(data: &Value) -> Option<String> {
    let source = data.get("source").and_then(Value::as_str)?;
    let row = data.get("row").and_then(Value::as_u64)?;
    Some(format!("{source}, row {row}"))
}
