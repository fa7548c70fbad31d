//! Presentation for Civilisation Hub: formatters, a console that renders
//! through them, and reporters that turn core components into [`Report`]s.

mod console;
mod format;
mod report;

pub use console::{Console, DisplayConfig, DisplayStyle};
pub use format::{
    FormattedOutput, Formatter, JsonFormatter, MarkdownFormatter, OutputFormat, TableFormatter,
    TextFormatter, create_formatter,
};
pub use report::{
    DomainReporter, EquilibriumReporter, EvolutionReporter, ParticipationReporter, Report,
    ReportKind, Reporter, Subsystems, SystemReporter, VerificationReporter, render_sections,
};
