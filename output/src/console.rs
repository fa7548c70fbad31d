//! Console display on top of a [`Formatter`].

use std::io::{self, Stdout, Write};
use std::mem;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::format::{
    FormattedOutput, Formatter, OutputFormat, TextFormatter, bar_split, create_formatter,
};

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DisplayStyle: DisplayStyle {
        Minimal => "minimal",
        #[default]
        Standard => "standard",
        Detailed => "detailed",
        Balanced => "balanced",
    }
}

impl DisplayStyle {
    /// Minimal output skips borders and balance bars.
    #[must_use]
    pub const fn decorated(self) -> bool {
        !matches!(self, DisplayStyle::Minimal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub style: DisplayStyle,
    pub format: OutputFormat,
    pub show_timestamps: bool,
    pub show_balance_indicators: bool,
    pub color_enabled: bool,
    pub indent_size: usize,
    pub max_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            style: DisplayStyle::Standard,
            format: OutputFormat::Text,
            show_timestamps: false,
            show_balance_indicators: true,
            color_enabled: true,
            indent_size: 2,
            max_width: 120,
        }
    }
}

impl DisplayConfig {
    fn timestamps(&self) -> bool {
        self.show_timestamps || self.style == DisplayStyle::Detailed
    }

    fn indicators(&self) -> bool {
        self.show_balance_indicators || self.style == DisplayStyle::Balanced
    }
}

#[derive(Debug, Clone, Copy)]
enum Color {
    Bold,
    Red,
    Green,
    Yellow,
}

impl Color {
    const RESET: &'static str = "\x1b[0m";

    const fn code(self) -> &'static str {
        match self {
            Color::Bold => "\x1b[1m",
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
        }
    }
}

/// Writes formatted output to `W` and keeps every [`FormattedOutput`] it
/// produced.
pub struct Console<W: Write> {
    config: DisplayConfig,
    formatter: Box<dyn Formatter>,
    out: W,
    history: Vec<FormattedOutput>,
}

impl Console<Stdout> {
    #[must_use]
    pub fn stdout(config: DisplayConfig) -> Self {
        Self::new(config, io::stdout())
    }
}

impl Console<Vec<u8>> {
    /// Captures output in memory.
    #[must_use]
    pub fn buffered(config: DisplayConfig) -> Self {
        Self::new(config, Vec::new())
    }

    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    pub fn take_contents(&mut self) -> String {
        let bytes = mem::take(&mut self.out);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl<W: Write> Console<W> {
    pub fn new(config: DisplayConfig, out: W) -> Self {
        let formatter: Box<dyn Formatter> = match config.format {
            OutputFormat::Text => Box::new(TextFormatter::with_indent(config.indent_size)),
            other => create_formatter(other),
        };
        Self {
            config,
            formatter,
            out,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    #[must_use]
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[FormattedOutput] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, content: &str) -> io::Result<()> {
        writeln!(self.out, "{content}")?;
        self.out.flush()
    }

    pub fn render_formatted(&mut self, output: &FormattedOutput) -> io::Result<()> {
        let mut content = output.content.clone();
        if self.config.timestamps() {
            content = format!("[{}]\n{content}", output.timestamp.format("%Y-%m-%d %H:%M:%S"));
        }
        if self.config.indicators()
            && let Some(balanced) = output.balanced()
        {
            let indicator = if balanced {
                self.paint("✓", Color::Green)
            } else {
                self.paint("⚠", Color::Yellow)
            };
            content = format!("{indicator} {content}");
        }
        self.render(&content)
    }

    fn record(&mut self, output: FormattedOutput) -> io::Result<()> {
        let result = self.render_formatted(&output);
        self.history.push(output);
        result
    }

    pub fn display(&mut self, value: &Value) -> io::Result<()> {
        let output = self.formatter.format_value(value);
        self.record(output)
    }

    pub fn display_equilibrium(
        &mut self,
        positive: f64,
        negative: f64,
        name: Option<&str>,
    ) -> io::Result<()> {
        let output = self.formatter.format_equilibrium(positive, negative, name);
        self.record(output)
    }

    pub fn display_duality(
        &mut self,
        positive: (&str, f64),
        negative: (&str, f64),
    ) -> io::Result<()> {
        let output = self.formatter.format_duality(positive, negative);
        self.record(output)
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.config.color_enabled {
            format!("{}{text}{}", color.code(), Color::RESET)
        } else {
            text.to_string()
        }
    }

    /// Level 1 is framed in `═`, level 2 underlined in `─`, deeper levels
    /// are plain.
    pub fn display_title(&mut self, title: &str, level: u8) -> io::Result<()> {
        let width = title.width().min(self.config.max_width);
        if !self.config.style.decorated() {
            return self.render(&format!("\n{title}"));
        }
        match level {
            1 => {
                let rule = "═".repeat(width);
                let title = self.paint(title, Color::Bold);
                self.render(&format!("\n{rule}\n{title}\n{rule}"))
            }
            2 => self.render(&format!("\n{title}\n{}", "─".repeat(width))),
            _ => self.render(&format!("\n{title}")),
        }
    }

    pub fn display_section(&mut self, title: &str, content: &Value) -> io::Result<()> {
        self.display_title(title, 2)?;
        self.display(content)
    }

    pub fn display_balance_bar(
        &mut self,
        positive: f64,
        negative: f64,
        width: usize,
        label: Option<&str>,
    ) -> io::Result<()> {
        if !self.config.style.decorated() {
            return Ok(());
        }
        let (filled, empty) = bar_split(positive, width.min(self.config.max_width));
        let bar = format!(
            "[{}{}]",
            self.paint(&"█".repeat(filled), Color::Green),
            self.paint(&"░".repeat(empty), Color::Red)
        );
        let line = match label {
            Some(label) => format!("{label}: {bar} ({positive:.1}% / {negative:.1}%)"),
            None => format!("{bar} ({positive:.1}% / {negative:.1}%)"),
        };
        self.render(&line)
    }

    pub fn display_meta_50_50(&mut self) -> io::Result<()> {
        self.display_title("META 50/50 EQUILIBRIUM", 1)?;
        self.display_balance_bar(50.0, 50.0, 50, Some("META Balance"))?;
        for line in [
            "The fundamental principle of perfect balance:",
            "",
            "  Positive: 50%  ←→  Negative: 50%",
            "",
            "  All systems derive from this balance.",
            "  OPERATIONAL 52/48 enables META 50/50.",
            "",
        ] {
            self.render(line)?;
        }
        Ok(())
    }

    pub fn display_operational_52_48(&mut self) -> io::Result<()> {
        self.display_title("OPERATIONAL 52/48", 2)?;
        self.display_balance_bar(52.0, 48.0, 50, Some("Operational"))?;
        for line in [
            "The enabling ratio for META 50/50:",
            "",
            "  Structure: 52%  ←→  Flexibility: 48%",
            "",
            "  Derived from PI/6 ≈ 0.5236",
            "",
        ] {
            self.render(line)?;
        }
        Ok(())
    }

    pub fn display_proof(
        &mut self,
        claim: &str,
        evidence: &[String],
        conclusion: &str,
        valid: bool,
    ) -> io::Result<()> {
        self.display_title("Proof", 2)?;
        let status = if valid {
            self.paint("✓ VALID", Color::Green)
        } else {
            self.paint("✗ INVALID", Color::Red)
        };
        self.render(&format!("Claim: {claim}"))?;
        self.render("\nEvidence:")?;
        for (i, item) in evidence.iter().enumerate() {
            self.render(&format!("  {}. {item}", i + 1))?;
        }
        self.render(&format!("\nConclusion: {conclusion}"))?;
        self.render(&format!("\nStatus: {status}"))
    }

    pub fn display_domain_summary(
        &mut self,
        name: &str,
        duality: (&str, &str),
        concepts: usize,
        balanced: bool,
    ) -> io::Result<()> {
        self.display_title(&format!("Domain: {name}"), 2)?;
        let status = if balanced {
            self.paint("✓ Balanced", Color::Green)
        } else {
            self.paint("⚠ Imbalanced", Color::Yellow)
        };
        self.render(&format!("  Duality: {} ↔ {}", duality.0, duality.1))?;
        self.render(&format!("  Concepts: {concepts}"))?;
        self.render(&format!("  Status: {status}"))?;
        self.display_balance_bar(50.0, 50.0, 30, Some("  Balance"))
    }
}
