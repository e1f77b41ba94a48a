use std::io;

use serde_json::Value;

use super::format::{self, Column, money_field, text_field};

pub fn render_anomalies(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("anomalies output requires rows"))?;

    let range = range_label(
        data.get("from").and_then(Value::as_str),
        data.get("to").and_then(Value::as_str),
    );

    if rows.is_empty() {
        return Ok([
            format!("No unusual spending found {range}."),
            String::new(),
            "Each outflow is compared with its merchant history, or its category".to_string(),
            "when the merchant has too few rows to judge.".to_string(),
        ]
        .join("\n"));
    }

    let noun = if rows.len() == 1 { "charge" } else { "charges" };
    let mut lines = vec![
        format!("{} unusual {noun} {range}.", rows.len()),
        String::new(),
        "Findings:".to_string(),
    ];

    let columns = [
        Column::left("Date"),
        Column::left("Merchant"),
        Column::right("Amount"),
        Column::right("Over usual"),
        Column::left("Severity"),
        Column::left("Method"),
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                text_field(row, "occurred_on").to_string(),
                text_field(row, "merchant_name").to_string(),
                money_field(row, "amount"),
                money_field(row, "delta_amount"),
                text_field(row, "severity").to_string(),
                text_field(row, "method").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Finding",
    ));

    lines.push(String::new());
    lines.push("Why:".to_string());
    for row in rows {
        lines.push(format!(
            "  {}: {}",
            text_field(row, "transaction_id"),
            text_field(row, "commentary")
        ));
    }

    Ok(lines.join("\n"))
}

fn range_label(from: Option<&str>, to: Option<&str>) -> String {
    match (from, to) {
        (Some(from), Some(to)) => format!("between {from} and {to}"),
        (Some(from), None) => format!("since {from}"),
        (None, Some(to)) => format!("up to {to}"),
        (None, None) => "in the ledger".to_string(),
    }
}
