//! Civilisation Hub command line.

mod commands;

use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use civhub_config::{CivhubConfig, persist_output_format};
use civhub_output::{Console, DisplayConfig, OutputFormat};

use crate::commands::{Command, Outcome, Session};

const EXAMPLES: &str = "\
Examples:
  civhub                          Show system status
  civhub --demo                   Run the full demonstration
  civhub --prove                  Show the META 50/50 proof
  civhub --domain physics         Report on one domain
  civhub --save                   Save every domain to the database
  civhub --list-saved             List saved domains
  civhub --db-stats               Show database statistics
  civhub --format json --prove    Emit structured output";

/// Civilisation Hub: META 50/50 equilibrium system.
#[derive(Debug, Parser)]
#[command(name = "civhub", version, after_help = EXAMPLES)]
struct Cli {
    /// Run the full system demonstration.
    #[arg(long)]
    demo: bool,

    /// Display the META 50/50 proof.
    #[arg(long)]
    prove: bool,

    /// Display system status (default).
    #[arg(long)]
    status: bool,

    /// Report on one domain.
    #[arg(long, value_name = "NAME")]
    domain: Option<String>,

    /// Save every domain to the database.
    #[arg(long)]
    save: bool,

    /// Save one domain to the database.
    #[arg(long, value_name = "NAME")]
    save_domain: Option<String>,

    /// List domains saved in the database.
    #[arg(long)]
    list_saved: bool,

    /// Show database statistics.
    #[arg(long)]
    db_stats: bool,

    /// Check that every saved domain is META compliant.
    #[arg(long)]
    validate_saved: bool,

    /// Remove a saved domain from the database.
    #[arg(long, value_name = "NAME")]
    delete_domain: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: text, json, markdown or table.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Store the value of --format in the config file.
    #[arg(long, requires = "format")]
    remember_format: bool,

    /// Database path (defaults to ~/.civhub/civhub.db).
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Disable ANSI colors.
    #[arg(long, global = true)]
    no_color: bool,
}

impl Cli {
    /// First set flag wins; status otherwise.
    fn command(&self) -> Command {
        if self.demo {
            Command::Demo
        } else if self.prove {
            Command::Prove
        } else if let Some(name) = &self.domain {
            Command::Domain(name.clone())
        } else if self.save {
            Command::Save
        } else if let Some(name) = &self.save_domain {
            Command::SaveDomain(name.clone())
        } else if self.list_saved {
            Command::ListSaved
        } else if self.db_stats {
            Command::DbStats
        } else if self.validate_saved {
            Command::ValidateSaved
        } else if let Some(name) = &self.delete_domain {
            Command::DeleteDomain(name.clone())
        } else {
            Command::Status
        }
    }

    fn display_config(&self, config: &CivhubConfig) -> Result<DisplayConfig> {
        let output = config.output();
        let format = match (self.format, output.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("Invalid output format in config: {raw}"))?,
            (None, None) => OutputFormat::default(),
        };

        let mut display = DisplayConfig {
            format,
            show_timestamps: output.timestamps,
            show_balance_indicators: output.balance_indicators,
            color_enabled: output.color && !self.no_color && io::stdout().is_terminal(),
            ..DisplayConfig::default()
        };
        if let Some(width) = output.width {
            display.max_width = width;
        }
        Ok(display)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = CivhubConfig::load()
        .context("Failed to load configuration")?
        .unwrap_or_default();
    init_tracing(cli.verbose, config.log_level());

    if cli.remember_format
        && let Some(format) = cli.format
    {
        persist_output_format(format.as_str()).context("Failed to save output format")?;
        tracing::info!(format = %format, "Saved output format to config");
    }

    let display = cli.display_config(&config)?;
    let command = cli.command();
    let format = &display.format;
    tracing::debug!(?command, format = %format, "Running command");

    let mut session = Session {
        console: Console::stdout(display),
        db_path: cli.db.clone().or_else(|| config.db_path()),
    };
    match session.run(&command)? {
        Outcome::Done => Ok(ExitCode::SUCCESS),
        Outcome::NotFound => Ok(ExitCode::from(1)),
    }
}

fn init_tracing(verbose: bool, configured: Option<&str>) {
    let fallback = if verbose {
        "debug"
    } else {
        configured.unwrap_or("warn")
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Reports own stdout; no log file means no logs.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = civhub_config::data_dir() {
        candidates.push(dir.join("logs").join("civhub.log"));
    }
    candidates.push(PathBuf::from(".civhub").join("logs").join("civhub.log"));
    candidates
}

#[cfg(test)]
mod tests {
    use std::iter;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(iter::once("civhub").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn status_is_default() {
        assert_eq!(parse(&[]).command(), Command::Status);
        assert_eq!(parse(&["--status"]).command(), Command::Status);
    }

    #[test]
    fn first_flag_in_priority_order_wins() {
        let cli = parse(&["--list-saved", "--domain", "physics", "--prove"]);
        assert_eq!(cli.command(), Command::Prove);

        let cli = parse(&["--delete-domain", "code", "--db-stats"]);
        assert_eq!(cli.command(), Command::DbStats);

        let cli = parse(&["--save-domain", "biology", "--validate-saved"]);
        assert_eq!(cli.command(), Command::SaveDomain("biology".to_string()));
    }

    #[test]
    fn format_flag_overrides_config() {
        let config: CivhubConfig = toml::from_str("[output]\nformat = \"markdown\"\nwidth = 80\n")
            .unwrap();

        let display = parse(&["--format", "json"]).display_config(&config).unwrap();
        assert_eq!(display.format, OutputFormat::Json);
        assert_eq!(display.max_width, 80);

        let display = parse(&[]).display_config(&config).unwrap();
        assert_eq!(display.format, OutputFormat::Markdown);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["civhub", "--format", "yaml"]).is_err());

        let config: CivhubConfig = toml::from_str("[output]\nformat = \"yaml\"\n").unwrap();
        assert!(parse(&[]).display_config(&config).is_err());
    }

    #[test]
    fn no_color_disables_color() {
        let display = parse(&["--no-color"])
            .display_config(&CivhubConfig::default())
            .unwrap();
        assert!(!display.color_enabled);
    }

    #[test]
    fn remember_format_requires_format() {
        assert!(Cli::try_parse_from(["civhub", "--remember-format"]).is_err());
    }
}
