//! Reports: titled, ordered sections built from one subsystem, rendered
//! through a [`Console`].

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use civhub_core::Hub;
use civhub_core::evolution::{EvolutionMetrics, EvolutionTracker};
use civhub_core::knowledge::KnowledgeDomain;
use civhub_core::participation::{
    ParticipationLevel, ParticipationMetrics, ParticipationTracker, RankBy,
};
use civhub_core::verification::{VerificationResult, VerificationType, Verifier};
use civhub_types::enables_meta;

use crate::console::Console;
use crate::format::is_even;

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ReportKind: ReportKind {
        Domain => "domain",
        Equilibrium => "equilibrium",
        Evolution => "evolution",
        Participation => "participation",
        Verification => "verification",
        #[default]
        System => "system",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub sections: Map<String, Value>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl Report {
    #[must_use]
    pub fn new(title: impl Into<String>, kind: ReportKind) -> Self {
        let mut metadata = Map::new();
        metadata.insert("kind".to_string(), Value::from(kind.as_str()));
        Self {
            title: title.into(),
            sections: Map::new(),
            summary: String::new(),
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Sections render in insertion order. Re-adding a name replaces its
    /// content in place.
    pub fn add_section(&mut self, name: impl Into<String>, content: Value) {
        self.sections.insert(name.into(), content);
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "title": self.title,
            "sections": self.sections,
            "summary": self.summary,
            "timestamp": self.timestamp.to_rfc3339(),
            "metadata": self.metadata,
        })
    }
}

pub trait Reporter {
    type Subject: ?Sized;
    const KIND: ReportKind;

    fn generate(&self, subject: &Self::Subject) -> Report;

    fn render<W: Write>(&self, report: &Report, console: &mut Console<W>) -> io::Result<()> {
        render_sections(report, console)
    }
}

/// Title, then every section, then the summary.
pub fn render_sections<W: Write>(report: &Report, console: &mut Console<W>) -> io::Result<()> {
    console.display_title(&report.title, 1)?;
    for (name, content) in &report.sections {
        console.display_section(name, content)?;
    }
    if !report.summary.is_empty() {
        console.display_title("Summary", 2)?;
        console.render(&report.summary)?;
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn counts<K: ToString>(entries: impl IntoIterator<Item = (K, usize)>) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(key, count)| (key.to_string(), Value::from(count)))
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainReporter;

impl Reporter for DomainReporter {
    type Subject = KnowledgeDomain;
    const KIND: ReportKind = ReportKind::Domain;

    fn generate(&self, knowledge: &KnowledgeDomain) -> Report {
        let domain = knowledge.domain();
        let stats = knowledge.stats();
        let proof = knowledge.proof();

        let mut report = Report::new(format!("Domain Report: {}", knowledge.name()), Self::KIND);
        report.set_metadata("domain_id", domain.id().to_string());
        report.add_section(
            "Overview",
            json!({
                "Name": domain.name(),
                "Type": domain.kind().as_str(),
                "State": domain.state().as_str(),
                "Description": domain.description(),
            }),
        );
        report.add_section(
            "Statistics",
            json!({
                "Total Concepts": stats.concepts,
                "Axioms": stats.axioms,
                "Relations": stats.relations,
                "Average Certainty": format!("{:.1}%", stats.average_certainty),
            }),
        );
        if !stats.concepts_by_type.is_empty() {
            report.add_section("Concepts by Type", counts(stats.concepts_by_type.clone()));
        }
        if let Some(duality) = &proof.duality {
            report.add_section(
                "Duality",
                json!({
                    "Positive Pole": duality.positive,
                    "Negative Pole": duality.negative,
                    "Balance": format!("{:.2}/{:.2}", duality.balance.0, duality.balance.1),
                    "Balanced": yes_no(duality.balanced),
                }),
            );
        }
        report.summary = proof.proof;
        report.set_metadata("balanced", stats.balanced);
        report
    }

    fn render<W: Write>(&self, report: &Report, console: &mut Console<W>) -> io::Result<()> {
        render_sections(report, console)?;
        if report.flag("balanced") == Some(true) {
            console.display_balance_bar(50.0, 50.0, 50, Some("Domain Balance"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EquilibriumReporter;

impl EquilibriumReporter {
    const META: &'static str = "META Balance";
    const OPERATIONAL: &'static str = "Operational Ratio";
}

impl Reporter for EquilibriumReporter {
    type Subject = Hub;
    const KIND: ReportKind = ReportKind::Equilibrium;

    fn generate(&self, hub: &Hub) -> Report {
        let meta = hub.meta_balance();
        let operational = hub.operational_ratio();
        let operational_valid = enables_meta(operational.structure, operational.flexibility);

        let mut report = Report::new("Equilibrium Report", Self::KIND);
        report.add_section(
            Self::META,
            json!({
                "Positive": percent(meta.positive),
                "Negative": percent(meta.negative),
                "Balanced": yes_no(meta.balanced),
            }),
        );
        report.add_section(
            Self::OPERATIONAL,
            json!({
                "Structure": percent(operational.structure),
                "Flexibility": percent(operational.flexibility),
                "Ratio": format!("{:.4}", operational.ratio),
            }),
        );
        report.add_section(
            "Validation",
            json!({
                "META Valid": yes_no(meta.balanced),
                "Operational Valid": yes_no(operational_valid),
            }),
        );

        let parameters = hub.meta().validated_parameters();
        if !parameters.is_empty() {
            let entries: Map<String, Value> = parameters
                .iter()
                .map(|(name, (positive, negative))| {
                    (name.clone(), Value::from(format!("{positive:.2}/{negative:.2}")))
                })
                .collect();
            report.add_section("Registered Parameters", Value::Object(entries));
        }

        report.summary = "META 50/50 equilibrium enables balanced system operation.".to_string();
        report.set_metadata("meta_valid", meta.balanced);
        report
    }

    fn render<W: Write>(&self, report: &Report, console: &mut Console<W>) -> io::Result<()> {
        console.display_title(&report.title, 1)?;
        if report.section(Self::META).is_some() {
            console.display_title(Self::META, 2)?;
            console.display_balance_bar(50.0, 50.0, 50, Some("META 50/50"))?;
        }
        if report.section(Self::OPERATIONAL).is_some() {
            console.display_title(Self::OPERATIONAL, 2)?;
            console.display_balance_bar(52.0, 48.0, 50, Some("Operational 52/48"))?;
        }
        for (name, content) in &report.sections {
            if name != Self::META && name != Self::OPERATIONAL {
                console.display_section(name, content)?;
            }
        }
        if !report.summary.is_empty() {
            console.render(&format!("\n{}", report.summary))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvolutionReporter;

impl Reporter for EvolutionReporter {
    type Subject = EvolutionTracker;
    const KIND: ReportKind = ReportKind::Evolution;

    fn generate(&self, tracker: &EvolutionTracker) -> Report {
        let validation = tracker.validate_all();
        let metrics = EvolutionMetrics::new(tracker);

        let mut report = Report::new("Evolution Report", Self::KIND);
        report.add_section(
            "Overview",
            json!({
                "Tracked Entities": validation.tracked_entities,
                "Balanced": validation.valid,
                "Unbalanced": validation.invalid,
            }),
        );
        report.add_section("Phase Distribution", counts(metrics.phase_distribution()));

        let (positive, negative) = metrics.aggregate_balance();
        report.add_section(
            "Aggregate Energy",
            json!({
                "Positive": percent(positive),
                "Negative": percent(negative),
                "Balanced": yes_no(is_even(positive)),
            }),
        );

        let mut entities = validation.entities;
        entities.sort_by(|a, b| a.entity_id.as_str().cmp(b.entity_id.as_str()));
        if !entities.is_empty() {
            let rows: Vec<Value> = entities
                .iter()
                .map(|status| {
                    let id = status.entity_id.as_str();
                    json!({
                        "Entity": id,
                        "Phase": status.phase.as_str(),
                        "Generation": status.generation,
                        "Velocity": format!("{:.2}", metrics.velocity(id)),
                        "Balanced": yes_no(status.balanced),
                    })
                })
                .collect();
            report.add_section("Entities", Value::Array(rows));
        }

        report.summary = if validation.tracked_entities == 0 {
            "No entities tracked".to_string()
        } else {
            format!(
                "{} of {} entities balanced",
                validation.valid, validation.tracked_entities
            )
        };
        report.set_metadata("all_valid", validation.all_valid);
        report
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParticipationReporter;

impl Reporter for ParticipationReporter {
    type Subject = ParticipationTracker;
    const KIND: ReportKind = ReportKind::Participation;

    fn generate(&self, tracker: &ParticipationTracker) -> Report {
        let validation = tracker.validate_all();
        let metrics = ParticipationMetrics::new(tracker);
        let active = tracker
            .states()
            .filter(|state| state.level() != ParticipationLevel::Inactive)
            .count();

        let mut report = Report::new("Participation Report", Self::KIND);
        report.add_section(
            "Overview",
            json!({
                "Total Participants": validation.tracked_participants,
                "Active Participants": active,
                "Total Records": validation.total_records,
            }),
        );
        report.add_section("Level Distribution", counts(metrics.level_distribution()));
        report.add_section(
            "Engagement Distribution",
            counts(metrics.engagement_distribution()),
        );

        let (give, receive) = metrics.aggregate_balance();
        report.add_section(
            "Give/Receive Balance",
            json!({
                "Give": percent(give),
                "Receive": percent(receive),
                "Balanced": yes_no(is_even(give)),
            }),
        );

        let top = metrics.top_participants(5, RankBy::Exchange);
        if !top.is_empty() {
            let rows: Vec<Value> = top
                .iter()
                .map(|(id, exchange)| {
                    json!({ "Participant": id.as_str(), "Exchange": format!("{exchange:.2}") })
                })
                .collect();
            report.add_section("Top Participants", Value::Array(rows));
        }

        report.summary = format!("{active} active of {} total", validation.tracked_participants);
        report.set_metadata("all_valid", validation.all_valid);
        report
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationReporter;

impl VerificationReporter {
    const MAX_FAILED: usize = 10;

    fn statement(verifier: &Verifier, result: &VerificationResult) -> String {
        verifier.claim(result.claim_id).map_or_else(
            || result.claim_id.to_string(),
            |claim| claim.statement().to_string(),
        )
    }

    fn reason(result: &VerificationResult) -> String {
        if !result.errors.is_empty() {
            return result.errors.join("; ");
        }
        match &result.rule {
            Some(rule) => format!("Rule '{rule}' not satisfied"),
            None => result.status.to_string(),
        }
    }
}

impl Reporter for VerificationReporter {
    type Subject = Verifier;
    const KIND: ReportKind = ReportKind::Verification;

    fn generate(&self, verifier: &Verifier) -> Report {
        let stats = verifier.stats();
        let mut report = Report::new("Verification Report", Self::KIND);
        report.add_section(
            "Summary",
            json!({
                "Total Claims": stats.total,
                "Passed": stats.verified,
                "Failed": stats.failed,
                "Inconclusive": stats.inconclusive,
                "Pass Rate": format!("{:.1}%", stats.rate),
            }),
        );

        let failed: Vec<Value> = verifier
            .results()
            .iter()
            .filter(|r| !r.passed())
            .take(Self::MAX_FAILED)
            .map(|r| json!({ "Claim": Self::statement(verifier, r), "Reason": Self::reason(r) }))
            .collect();
        if !failed.is_empty() {
            report.add_section("Failed Claims", Value::Array(failed));
        }

        let balance: Vec<Value> = verifier
            .results()
            .iter()
            .filter(|r| r.kind == VerificationType::Balance)
            .map(|r| {
                json!({
                    "Claim": Self::statement(verifier, r),
                    "Status": if r.passed() { "✓" } else { "✗" },
                    "Confidence": r.confidence.as_str(),
                    "Score": format!("{:.1}%", r.score_verified),
                })
            })
            .collect();
        if !balance.is_empty() {
            report.add_section("Balance Verifications", Value::Array(balance));
        }

        report.summary = format!(
            "Verification: {}/{} passed ({} failed)",
            stats.verified, stats.total, stats.failed
        );
        report.set_metadata("all_passed", stats.failed == 0);
        report
    }
}

/// Optional subsystems folded into [`SystemReporter::generate_full`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Subsystems<'a> {
    pub evolution: Option<&'a EvolutionTracker>,
    pub participation: Option<&'a ParticipationTracker>,
    pub verifier: Option<&'a Verifier>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemReporter;

impl SystemReporter {
    fn domain_rows(hub: &Hub) -> Value {
        Value::Array(
            hub.domains()
                .iter()
                .map(|d| {
                    json!({
                        "Name": d.name(),
                        "Concepts": d.concept_count(),
                        "Balanced": d.validate_balance(),
                    })
                })
                .collect(),
        )
    }

    /// One report covering the hub and whichever subsystems are supplied.
    /// Each subsystem contributes the sections of its own report.
    #[must_use]
    pub fn generate_full(&self, hub: &Hub, subsystems: Subsystems<'_>) -> Report {
        let mut report = Report::new("Full System Report", Self::KIND);
        let timestamp = report.timestamp.to_rfc3339();
        report.add_section(
            "System",
            json!({
                "Name": Hub::NAME,
                "Principle": "META 50/50",
                "Timestamp": timestamp,
            }),
        );
        if !hub.domains().is_empty() {
            report.add_section("Domains", Self::domain_rows(hub));
        }

        let mut all_balanced = hub.validate_system();
        let equilibrium = EquilibriumReporter.generate(hub);
        report.add_section("Equilibrium", Value::Object(equilibrium.sections));

        if let Some(tracker) = subsystems.evolution {
            let sub = EvolutionReporter.generate(tracker);
            all_balanced &= sub.flag("all_valid").unwrap_or(true);
            report.add_section("Evolution", Value::Object(sub.sections));
        }
        if let Some(tracker) = subsystems.participation {
            let sub = ParticipationReporter.generate(tracker);
            all_balanced &= sub.flag("all_valid").unwrap_or(true);
            report.add_section("Participation", Value::Object(sub.sections));
        }
        if let Some(verifier) = subsystems.verifier {
            let sub = VerificationReporter.generate(verifier);
            report.add_section("Verification", Value::Object(sub.sections));
        }

        report.set_metadata("all_balanced", all_balanced);
        report.summary = if all_balanced {
            "All systems balanced and operational."
        } else {
            "Some systems require balance adjustment."
        }
        .to_string();
        report
    }
}

impl Reporter for SystemReporter {
    type Subject = Hub;
    const KIND: ReportKind = ReportKind::System;

    fn generate(&self, hub: &Hub) -> Report {
        let mut report = Report::new("Civilisation Hub System Report", Self::KIND);
        report.add_section(
            "System Overview",
            json!({
                "Name": Hub::NAME,
                "Version": Hub::VERSION,
                "Principle": "META 50/50 Equilibrium",
            }),
        );
        report.add_section(
            "META Foundation",
            json!({
                "META Balance": "50/50 (Absolute)",
                "Operational Ratio": "52/48 (Enabling)",
                "Derived From": "PI/6 ≈ 0.5236",
            }),
        );
        report.add_section(
            "Domains",
            json!({
                "Count": hub.domains().len(),
                "Balanced": hub.domains().iter().filter(|d| d.validate_balance()).count(),
            }),
        );
        if !hub.domains().is_empty() {
            report.add_section("Domain Details", Self::domain_rows(hub));
        }

        let valid = hub.validate_system();
        report.set_metadata("all_balanced", valid);
        report.summary = if valid {
            "System maintains META 50/50 equilibrium across all components."
        } else {
            "Some components require balance adjustment."
        }
        .to_string();
        report
    }

    fn render<W: Write>(&self, report: &Report, console: &mut Console<W>) -> io::Result<()> {
        console.display_meta_50_50()?;
        render_sections(report, console)
    }
}

#[cfg(test)]
mod tests {
    use civhub_core::evolution::EvolutionPhase;
    use civhub_core::participation::ParticipationType;

    use super::*;
    use crate::console::DisplayConfig;

    fn hub() -> Hub {
        let mut hub = Hub::new();
        hub.initialize().unwrap();
        hub
    }

    fn plain_console() -> Console<Vec<u8>> {
        Console::buffered(DisplayConfig {
            color_enabled: false,
            ..DisplayConfig::default()
        })
    }

    #[test]
    fn sections_keep_insertion_order() {
        let mut report = Report::new("T", ReportKind::System);
        report.add_section("b", json!(1));
        report.add_section("a", json!(2));
        report.add_section("b", json!(3));
        let names: Vec<&String> = report.sections.keys().collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(report.section("b"), Some(&json!(3)));
        assert_eq!(report.to_value()["metadata"]["kind"], "system");
    }

    #[test]
    fn domain_report_for_catalog_entry() {
        let hub = hub();
        let physics = hub.domain("physics").unwrap();
        let report = DomainReporter.generate(physics);
        assert_eq!(report.title, "Domain Report: Physics");
        assert_eq!(report.flag("balanced"), Some(true));
        assert_eq!(report.section("Duality").unwrap()["Balanced"], "Yes");
        assert_eq!(
            report.section("Statistics").unwrap()["Total Concepts"],
            physics.concept_count()
        );

        let mut console = plain_console();
        DomainReporter.render(&report, &mut console).unwrap();
        let out = console.contents();
        assert!(out.contains("Domain Report: Physics"));
        assert!(out.contains("Domain Balance: ["));
    }

    #[test]
    fn equilibrium_report_renders_bars_first() {
        let hub = hub();
        let report = EquilibriumReporter.generate(&hub);
        assert_eq!(report.flag("meta_valid"), Some(true));
        assert_eq!(report.section("Validation").unwrap()["Operational Valid"], "Yes");
        assert_eq!(report.section("Registered Parameters").unwrap().as_object().unwrap().len(), 5);

        let mut console = plain_console();
        EquilibriumReporter.render(&report, &mut console).unwrap();
        let out = console.contents();
        let meta = out.find("META 50/50: [").unwrap();
        let operational = out.find("Operational 52/48: [").unwrap();
        let validation = out.find("\nValidation\n").unwrap();
        assert!(meta < operational && operational < validation);
        assert!(out.ends_with("META 50/50 equilibrium enables balanced system operation.\n"));
    }

    #[test]
    fn evolution_report_lists_entities_in_order() {
        let mut tracker = EvolutionTracker::new();
        tracker.register("beta", 100.0, EvolutionPhase::Genesis).unwrap();
        tracker.register("alpha", 50.0, EvolutionPhase::Growth).unwrap();
        tracker.evolve_balanced("alpha", 10.0, "growth").unwrap();

        let report = EvolutionReporter.generate(&tracker);
        let entities = report.section("Entities").unwrap().as_array().unwrap();
        assert_eq!(entities[0]["Entity"], "alpha");
        assert_eq!(entities[1]["Entity"], "beta");
        assert_eq!(report.summary, "2 of 2 entities balanced");
        assert_eq!(report.flag("all_valid"), Some(true));
    }

    #[test]
    fn empty_evolution_report() {
        let report = EvolutionReporter.generate(&EvolutionTracker::new());
        assert!(report.section("Entities").is_none());
        assert_eq!(report.summary, "No entities tracked");
    }

    #[test]
    fn participation_report_counts_active() {
        let mut tracker = ParticipationTracker::new();
        tracker.register("ana", 0.0).unwrap();
        tracker.register("ben", 0.0).unwrap();
        tracker
            .record_balanced("ana", 40.0, ParticipationType::Collaboration, "pairing")
            .unwrap();

        let report = ParticipationReporter.generate(&tracker);
        assert_eq!(report.section("Overview").unwrap()["Total Participants"], 2);
        assert_eq!(report.section("Give/Receive Balance").unwrap()["Balanced"], "Yes");
        let top = report.section("Top Participants").unwrap().as_array().unwrap();
        assert_eq!(top[0]["Participant"], "ana");
    }

    #[test]
    fn verification_report_splits_failures() {
        let mut verifier = Verifier::new();
        verifier.verify_balance(50.0, 50.0).unwrap();
        verifier.verify_balance(70.0, 30.0).unwrap();

        let report = VerificationReporter.generate(&verifier);
        assert_eq!(report.summary, "Verification: 1/2 passed (1 failed)");
        assert_eq!(report.flag("all_passed"), Some(false));
        let failed = report.section("Failed Claims").unwrap().as_array().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0]["Claim"], "Balance check: 70/30");
        let balance = report.section("Balance Verifications").unwrap().as_array().unwrap();
        assert_eq!(balance.len(), 2);
    }

    #[test]
    fn system_report_and_full_report() {
        let hub = hub();
        let report = SystemReporter.generate(&hub);
        assert_eq!(report.section("Domains").unwrap()["Count"], 5);
        assert_eq!(report.flag("all_balanced"), Some(true));

        let verifier = Verifier::new();
        let full = SystemReporter.generate_full(
            &hub,
            Subsystems {
                verifier: Some(&verifier),
                ..Subsystems::default()
            },
        );
        assert!(full.section("Equilibrium").unwrap().get("META Balance").is_some());
        assert!(full.section("Verification").is_some());
        assert!(full.section("Evolution").is_none());
        assert_eq!(full.summary, "All systems balanced and operational.");
    }

    #[test]
    fn system_render_opens_with_meta_banner() {
        let hub = hub();
        let report = SystemReporter.generate(&hub);
        let mut console = plain_console();
        SystemReporter.render(&report, &mut console).unwrap();
        let out = console.contents();
        assert!(out.trim_start().starts_with("══"));
        let banner = out.find("META 50/50 EQUILIBRIUM").unwrap();
        assert!(banner < out.find("Civilisation Hub System Report").unwrap());
    }
}
