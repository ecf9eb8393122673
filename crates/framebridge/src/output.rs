use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    /// The wire payload only, as compact JSON.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print a serializable record as one JSON line.
pub fn print_json<T: Serialize>(out: &T) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Print `rows` under `header` as a table.
pub fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

pub fn print_raw(payload: &Value) {
    let mut out = std::io::stdout();
    let _ = writeln!(out, "{payload}");
    let _ = out.flush();
}

/// Short single-line rendering of a JSON value for tables.
pub fn preview(value: &Value) -> String {
    const LIMIT: usize = 96;
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= LIMIT {
        return text;
    }
    let cut: String = text.chars().take(LIMIT).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn preview_truncates_long_values() {
        assert_eq!(preview(&json!("handshake")), "handshake");
        assert_eq!(preview(&json!({"a": 1})), "{\"a\":1}");
        let long = preview(&json!("x".repeat(200)));
        assert_eq!(long.chars().count(), 97);
        assert!(long.ends_with('…'));
    }
}
