use std::io;

use serde_json::Value;

use super::format::{self, Column, money_field, text_field};

pub fn render_forecast(data: &Value) -> io::Result<String> {
    let safe = data
        .get("safe_to_spend_today")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("forecast output requires safe_to_spend_today"))?;
    let danger = data.get("danger").and_then(Value::as_bool).unwrap_or(false);

    let mut lines = vec![
        format!(
            "Safe to spend today ({}): {}",
            text_field(data, "today"),
            format::money(safe)
        ),
        format!(
            "Cycle {} to {}, {} day(s) left.",
            text_field(data, "cycle_start"),
            text_field(data, "cycle_end"),
            data.get("days_remaining")
                .and_then(Value::as_i64)
                .unwrap_or(0)
        ),
    ];
    if danger {
        lines.push(String::new());
        lines.push(
            "Warning: upcoming bills and your buffer exceed the cash you will have this cycle."
                .to_string(),
        );
    }

    lines.push(String::new());
    lines.push("Allowance:".to_string());
    lines.extend(format::key_value_rows(&[
        ("Daily base:", money_field(data, "daily_base_allowance")),
        ("Adjusted for pace:", money_field(data, "daily_adjusted_allowance")),
        ("Pace ratio:", text_field(data, "pace_ratio").to_string()),
        ("Rolled in today:", money_field(data, "roll_today")),
        (
            "Variable budget:",
            format!(
                "{} ({})",
                money_field(data, "variable_budget"),
                text_field(data, "budget_source").replace('_', " ")
            ),
        ),
        ("Variable spent:", money_field(data, "variable_spent")),
        ("Variable left:", money_field(data, "variable_remaining")),
    ]));

    lines.push(String::new());
    lines.push("Cash cap:".to_string());
    lines.extend(format::key_value_rows(&[
        ("Cash on hand:", money_field(data, "cash_on_hand")),
        ("Income due:", money_field(data, "future_income")),
        ("Fixed bills left:", money_field(data, "fixed_remaining")),
        ("Sinking funds left:", money_field(data, "sinking_remaining")),
        ("Buffer:", money_field(data, "buffer")),
        ("Hard cap:", money_field(data, "hard_cap")),
    ]));

    let obligations = data
        .get("obligations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    if !obligations.is_empty() {
        lines.push(String::new());
        lines.push("Obligations this cycle:".to_string());
        let columns = [
            Column::left("Merchant"),
            Column::left("Kind"),
            Column::right("Expected"),
            Column::right("Paid"),
            Column::right("Remaining"),
        ];
        let rows = obligations
            .iter()
            .map(|line| {
                vec![
                    text_field(line, "merchant").to_string(),
                    text_field(line, "class").to_string(),
                    money_field(line, "expected"),
                    money_field(line, "paid"),
                    money_field(line, "remaining"),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table_or_blocks(
            &columns,
            &rows,
            format::terminal_width(),
            "Obligation",
        ));
    }

    let notes = data
        .get("notes")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).collect::<Vec<&str>>())
        .unwrap_or_default();
    if !notes.is_empty() {
        lines.push(String::new());
        lines.push("Notes:".to_string());
        lines.extend(notes.iter().map(|note| format!("  - {note}")));
    }

    Ok(lines.join("\n"))
}
