//! Formatters turn a JSON value into text, JSON, Markdown or a box-drawn table.
//!
//! Reports and proofs reach this layer as [`serde_json::Value`]; objects keep
//! their insertion order, so sections render in the order they were built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use unicode_width::UnicodeWidthStr;

use civhub_types::Tolerance;

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OutputFormat: OutputFormat {
        #[default]
        Text => "text",
        Json => "json",
        Markdown => "markdown",
        Table => "table",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedOutput {
    pub content: String,
    pub format: OutputFormat,
    pub timestamp: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl FormattedOutput {
    #[must_use]
    pub fn new(content: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            content: content.into(),
            format,
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    pub fn with_balanced(mut self, balanced: bool) -> Self {
        self.metadata.insert("balanced".to_string(), Value::Bool(balanced));
        self
    }

    /// The `balanced` flag, when the formatter recorded one.
    #[must_use]
    pub fn balanced(&self) -> Option<bool> {
        self.metadata.get("balanced").and_then(Value::as_bool)
    }
}

pub(crate) fn is_even(positive: f64) -> bool {
    Tolerance::EXACT.accepts(positive - 50.0)
}

/// Filled and empty cell counts for a `width`-wide bar at `positive` percent.
pub(crate) fn bar_split(positive: f64, width: usize) -> (usize, usize) {
    let filled = (width as f64 * positive / 100.0).clamp(0.0, width as f64) as usize;
    (filled, width - filled)
}

/// Strings unquoted, everything else as compact JSON.
pub(crate) fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub trait Formatter {
    fn format(&self) -> OutputFormat;

    fn format_value(&self, value: &Value) -> FormattedOutput;

    fn format_equilibrium(&self, positive: f64, negative: f64, name: Option<&str>) -> FormattedOutput {
        self.format_value(&json!({
            "type": "equilibrium",
            "name": name.unwrap_or("balance"),
            "positive": positive,
            "negative": negative,
            "total": positive + negative,
            "balanced": is_even(positive),
        }))
    }

    /// `positive` and `negative` are `(pole name, percentage)`.
    fn format_duality(&self, positive: (&str, f64), negative: (&str, f64)) -> FormattedOutput {
        self.format_value(&json!({
            "type": "duality",
            "positive": { "name": positive.0, "value": positive.1 },
            "negative": { "name": negative.0, "value": negative.1 },
            "balanced": is_even(positive.1),
        }))
    }
}

#[must_use]
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::default()),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
        OutputFormat::Table => Box::new(TableFormatter),
    }
}

/// Indented `key: value` lines.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatter {
    indent: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl TextFormatter {
    #[must_use]
    pub const fn with_indent(indent: usize) -> Self {
        Self { indent }
    }

    fn object_lines(&self, map: &Map<String, Value>, level: usize, lines: &mut Vec<String>) {
        let pad = " ".repeat(self.indent * level);
        for (key, value) in map {
            match value {
                Value::Object(inner) => {
                    lines.push(format!("{pad}{key}:"));
                    self.object_lines(inner, level + 1, lines);
                }
                Value::Array(items) => {
                    lines.push(format!("{pad}{key}:"));
                    for item in items {
                        match item {
                            Value::Object(inner) => self.object_lines(inner, level + 1, lines),
                            other => lines.push(format!("{pad}  - {}", plain(other))),
                        }
                    }
                }
                other => lines.push(format!("{pad}{key}: {}", plain(other))),
            }
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Text
    }

    fn format_value(&self, value: &Value) -> FormattedOutput {
        let mut lines = Vec::new();
        match value {
            Value::Object(map) => self.object_lines(map, 0, &mut lines),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let n = i + 1;
                    match item {
                        Value::Object(inner) => {
                            lines.push(format!("{n}."));
                            self.object_lines(inner, 1, &mut lines);
                        }
                        other => lines.push(format!("{n}. {}", plain(other))),
                    }
                }
            }
            other => lines.push(plain(other)),
        }
        FormattedOutput::new(lines.join("\n"), OutputFormat::Text)
    }

    fn format_equilibrium(&self, positive: f64, negative: f64, name: Option<&str>) -> FormattedOutput {
        let title = name.unwrap_or("Balance");
        let (filled, empty) = bar_split(positive, 50);
        let balanced = is_even(positive);
        let status = if balanced { "✓ BALANCED" } else { "⚠ IMBALANCED" };

        let lines = [
            format!("═══ {title} ═══"),
            format!("  Positive: {positive:>6.2}%"),
            format!("  Negative: {negative:>6.2}%"),
            format!("  [{}{}]", "█".repeat(filled), "░".repeat(empty)),
            format!("  Status: {status}"),
            "═".repeat(title.width() + 8),
        ];
        FormattedOutput::new(lines.join("\n"), OutputFormat::Text).with_balanced(balanced)
    }

    fn format_duality(&self, positive: (&str, f64), negative: (&str, f64)) -> FormattedOutput {
        let (filled, empty) = bar_split(positive.1, 40);
        let lines = [
            "┌─ Duality ─┐".to_string(),
            format!("│ {:<15} │ {:<15} │", positive.0, negative.0),
            format!("│ {:>6.2}%          │ {:>6.2}%          │", positive.1, negative.1),
            format!("│ {}{} │", "█".repeat(filled), "░".repeat(empty)),
            format!("└{}┘", "─".repeat(37)),
        ];
        FormattedOutput::new(lines.join("\n"), OutputFormat::Text)
            .with_balanced(is_even(positive.1))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn format_value(&self, value: &Value) -> FormattedOutput {
        let content = serde_json::to_string_pretty(value).unwrap_or_else(|err| {
            tracing::warn!("Failed to pretty-print JSON: {err}");
            value.to_string()
        });
        FormattedOutput::new(content, OutputFormat::Json)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    fn object_lines(map: &Map<String, Value>, level: usize, lines: &mut Vec<String>) {
        for (key, value) in map {
            match value {
                Value::Object(inner) => {
                    lines.push(format!("{} {key}\n", "#".repeat(level)));
                    Self::object_lines(inner, level + 1, lines);
                }
                Value::Array(items) => {
                    lines.push(format!("{} {key}\n", "#".repeat(level)));
                    Self::list_lines(items, lines);
                    lines.push(String::new());
                }
                other => lines.push(format!("**{key}**: {}", plain(other))),
            }
        }
    }

    fn list_lines(items: &[Value], lines: &mut Vec<String>) {
        for item in items {
            match item {
                Value::Object(inner) => {
                    for (k, v) in inner {
                        lines.push(format!("- **{k}**: {}", plain(v)));
                    }
                }
                other => lines.push(format!("- {}", plain(other))),
            }
        }
    }
}

impl Formatter for MarkdownFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }

    fn format_value(&self, value: &Value) -> FormattedOutput {
        let mut lines = Vec::new();
        match value {
            Value::Object(map) => Self::object_lines(map, 1, &mut lines),
            Value::Array(items) => Self::list_lines(items, &mut lines),
            other => lines.push(format!("`{}`", plain(other))),
        }
        FormattedOutput::new(lines.join("\n"), OutputFormat::Markdown)
    }

    fn format_equilibrium(&self, positive: f64, negative: f64, name: Option<&str>) -> FormattedOutput {
        let title = name.unwrap_or("Balance");
        let balanced = is_even(positive);
        let status = if balanced { "✅ Balanced" } else { "⚠️ Imbalanced" };
        let lines = [
            format!("## {title}"),
            String::new(),
            "| Component | Value |".to_string(),
            "|-----------|-------|".to_string(),
            format!("| Positive | {positive:.2}% |"),
            format!("| Negative | {negative:.2}% |"),
            format!("| Status | {status} |"),
            String::new(),
        ];
        FormattedOutput::new(lines.join("\n"), OutputFormat::Markdown)
    }

    fn format_duality(&self, positive: (&str, f64), negative: (&str, f64)) -> FormattedOutput {
        let status = if is_even(positive.1) { "✅" } else { "⚠️" };
        let lines = [
            "## Duality".to_string(),
            String::new(),
            format!("| {} | {} | Status |", positive.0, negative.0),
            "|------------|------------|--------|".to_string(),
            format!("| {:.2}% | {:.2}% | {status} |", positive.1, negative.1),
            String::new(),
        ];
        FormattedOutput::new(lines.join("\n"), OutputFormat::Markdown)
    }
}

/// Box-drawn tables. Column widths are measured in terminal cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFormatter;

fn cell(value: &Value) -> String {
    match value {
        Value::Object(_) => "[object]".to_string(),
        Value::Array(_) => "[array]".to_string(),
        other => plain(other),
    }
}

fn pad_right(text: &str, width: usize) -> String {
    format!("{text}{}", " ".repeat(width.saturating_sub(text.width())))
}

fn center(text: &str, width: usize) -> String {
    let gap = width.saturating_sub(text.width());
    let left = gap / 2;
    format!("{}{text}{}", " ".repeat(left), " ".repeat(gap - left))
}

fn border(left: char, mid: char, right: char, widths: &[usize]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    format!("{left}{}{right}", segments.join(&mid.to_string()))
}

fn row(cells: &[String]) -> String {
    format!("│{}│", cells.join("│"))
}

impl TableFormatter {
    fn object_table(map: &Map<String, Value>) -> String {
        if map.is_empty() {
            return "(empty)".to_string();
        }
        let key_width = map.keys().map(|k| k.width()).max().unwrap_or(0) + 2;
        let value_width = map
            .values()
            .filter(|v| !v.is_object() && !v.is_array())
            .map(|v| plain(v).width())
            .max()
            .unwrap_or(0)
            + 2;
        let widths = [key_width, value_width.max(10)];

        let mut lines = vec![
            border('┌', '┬', '┐', &widths),
            row(&[center("Key", widths[0]), center("Value", widths[1])]),
            border('├', '┼', '┤', &widths),
        ];
        for (key, value) in map {
            lines.push(row(&[pad_right(key, widths[0]), pad_right(&cell(value), widths[1])]));
        }
        lines.push(border('└', '┴', '┘', &widths));
        lines.join("\n")
    }

    fn array_table(items: &[Value]) -> String {
        if items.is_empty() {
            return "(empty)".to_string();
        }
        let rows: Vec<&Map<String, Value>> = items.iter().filter_map(Value::as_object).collect();
        if rows.len() == items.len() {
            return Self::column_table(&rows);
        }

        let entries: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, cell(item)))
            .collect();
        let width = entries.iter().map(|e| e.width()).max().unwrap_or(0);
        let mut lines = vec![format!("┌{}┐", "─".repeat(width + 2))];
        for entry in &entries {
            lines.push(format!("│ {} │", pad_right(entry, width)));
        }
        lines.push(format!("└{}┘", "─".repeat(width + 2)));
        lines.join("\n")
    }

    fn column_table(rows: &[&Map<String, Value>]) -> String {
        let mut columns: Vec<&str> = Vec::new();
        for map in rows {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }

        let widths: Vec<usize> = columns
            .iter()
            .map(|column| {
                rows.iter()
                    .filter_map(|map| map.get(*column))
                    .filter(|v| !v.is_object() && !v.is_array())
                    .map(|v| plain(v).width())
                    .fold(column.width(), usize::max)
                    + 2
            })
            .collect();

        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| center(column, *width))
            .collect();
        let mut lines = vec![
            border('┌', '┬', '┐', &widths),
            row(&header),
            border('├', '┼', '┤', &widths),
        ];
        for map in rows {
            let cells: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(column, width)| {
                    let text = map.get(*column).map(cell).unwrap_or_default();
                    pad_right(&text, *width)
                })
                .collect();
            lines.push(row(&cells));
        }
        lines.push(border('└', '┴', '┘', &widths));
        lines.join("\n")
    }
}

impl Formatter for TableFormatter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Table
    }

    fn format_value(&self, value: &Value) -> FormattedOutput {
        let content = match value {
            Value::Object(map) => Self::object_table(map),
            Value::Array(items) => Self::array_table(items),
            other => plain(other),
        };
        FormattedOutput::new(content, OutputFormat::Table)
    }

    fn format_equilibrium(&self, positive: f64, negative: f64, name: Option<&str>) -> FormattedOutput {
        self.format_value(&json!({
            "Name": name.unwrap_or("Equilibrium"),
            "Positive": format!("{positive:.2}%"),
            "Negative": format!("{negative:.2}%"),
            "Balanced": if is_even(positive) { "Yes" } else { "No" },
        }))
    }
}
