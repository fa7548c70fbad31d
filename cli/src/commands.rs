use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use civhub_core::Hub;
use civhub_core::evolution::{EvolutionPhase, EvolutionTracker};
use civhub_core::participation::{ParticipationTracker, ParticipationType};
use civhub_core::verification::Verifier;
use civhub_output::{Console, DomainReporter, OutputFormat, Reporter, Subsystems, SystemReporter};
use civhub_store::DomainStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Demo,
    Prove,
    Domain(String),
    Save,
    SaveDomain(String),
    ListSaved,
    DbStats,
    ValidateSaved,
    DeleteDomain(String),
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Done,
    /// A named domain does not exist.
    NotFound,
}

pub(crate) struct Session<W: Write> {
    pub console: Console<W>,
    pub db_path: Option<PathBuf>,
}

impl<W: Write> Session<W> {
    pub fn run(&mut self, command: &Command) -> Result<Outcome> {
        let mut hub = Hub::new();
        hub.initialize().context("Failed to initialize hub")?;

        match command {
            Command::Demo => self.demo(&hub).map(|()| Outcome::Done),
            Command::Prove => self.prove(&hub).map(|()| Outcome::Done),
            Command::Domain(name) => self.domain(&hub, name),
            Command::Save => self.save(&hub).map(|()| Outcome::Done),
            Command::SaveDomain(name) => self.save_domain(&hub, name),
            Command::ListSaved => self.list_saved().map(|()| Outcome::Done),
            Command::DbStats => self.db_stats().map(|()| Outcome::Done),
            Command::ValidateSaved => self.validate_saved().map(|()| Outcome::Done),
            Command::DeleteDomain(name) => self.delete_domain(name),
            Command::Status => self.status(&hub).map(|()| Outcome::Done),
        }
    }

    fn text(&self) -> bool {
        self.console.config().format == OutputFormat::Text
    }

    fn store(&self) -> Result<DomainStore> {
        let path = self
            .db_path
            .as_ref()
            .context("Could not determine database path; pass --db")?;
        DomainStore::open(path)
    }

    fn status(&mut self, hub: &Hub) -> Result<()> {
        let c = &mut self.console;
        c.display_meta_50_50()?;
        c.display_operational_52_48()?;
        c.display_title("System Status", 1)?;

        let stats = hub.stats();
        c.display(&json!({
            "Version": stats.version,
            "META Balanced": yes_no(stats.meta_balanced),
            "Domains": stats.domains.count,
            "Total Concepts": stats.total_concepts,
            "System Valid": yes_no(stats.system_valid),
        }))?;

        c.display_title("Domains", 2)?;
        for domain in &stats.domains.details {
            c.render(&format!(
                "  {} {}: {} concepts",
                mark(domain.balanced),
                domain.name,
                domain.concepts
            ))?;
        }
        Ok(())
    }

    fn prove(&mut self, hub: &Hub) -> Result<()> {
        let proof = hub.proof();
        if !self.text() {
            self.console.display(&serde_json::to_value(&proof)?)?;
            return Ok(());
        }

        self.console.display_title("META 50/50 PROOF", 1)?;
        for entry in &proof.proofs {
            self.console
                .render(&format!("\n{} {}", mark(entry.valid), entry.component))?;
            self.console.render(&format!("    Claim: {}", entry.claim))?;
            self.console
                .render(&format!("    Evidence: {}", entry.evidence))?;
        }

        let evidence: Vec<String> = proof
            .proofs
            .iter()
            .filter(|p| p.valid)
            .map(|p| p.component.clone())
            .collect();
        self.console.display_proof(
            "Every component holds META 50/50",
            &evidence,
            &proof.conclusion,
            proof.all_valid,
        )?;
        Ok(())
    }

    fn domain(&mut self, hub: &Hub, name: &str) -> Result<Outcome> {
        let Some(knowledge) = hub.domain(name) else {
            self.console
                .render(&format!("Domain '{name}' not found."))?;
            return Ok(Outcome::NotFound);
        };
        let report = DomainReporter.generate(knowledge);
        DomainReporter.render(&report, &mut self.console)?;
        Ok(Outcome::Done)
    }

    fn demo(&mut self, hub: &Hub) -> Result<()> {
        self.console
            .display_title("CIVILISATION HUB DEMONSTRATION", 1)?;
        self.status(hub)?;
        self.prove(hub)?;

        self.console.display_title("Domain Details", 1)?;
        for knowledge in hub.domains() {
            let poles = knowledge
                .domain()
                .duality()
                .map(|d| (d.positive().name(), d.negative().name()))
                .unwrap_or(("-", "-"));
            self.console.display_domain_summary(
                knowledge.name(),
                poles,
                knowledge.concept_count(),
                knowledge.validate_balance(),
            )?;
        }

        let (evolution, participation, verifier) = sample_subsystems()?;
        let report = SystemReporter.generate_full(
            hub,
            Subsystems {
                evolution: Some(&evolution),
                participation: Some(&participation),
                verifier: Some(&verifier),
            },
        );
        SystemReporter.render(&report, &mut self.console)?;
        Ok(())
    }

    fn save(&mut self, hub: &Hub) -> Result<()> {
        let saved = self.store()?.save_all(hub.domains())?;
        if !self.text() {
            self.console.display(&json!({ "saved": saved }))?;
            return Ok(());
        }
        self.console
            .render(&format!("Saved {} domains to database:", saved.len()))?;
        for name in &saved {
            self.console.render(&format!("  ✓ {name}"))?;
        }
        Ok(())
    }

    fn save_domain(&mut self, hub: &Hub, name: &str) -> Result<Outcome> {
        let Some(knowledge) = hub.domain(name) else {
            if self.text() {
                self.console
                    .render(&format!("Domain '{name}' not found."))?;
            } else {
                self.console
                    .display(&json!({ "saved": Value::Null, "found": false, "domain": name }))?;
            }
            return Ok(Outcome::NotFound);
        };
        let inserted = self.store()?.save_domain(knowledge)?;
        if self.text() {
            self.console
                .render(&format!("Saved domain '{name}' to database."))?;
        } else {
            self.console.display(&json!({
                "saved": knowledge.name(),
                "found": true,
                "inserted": inserted,
            }))?;
        }
        Ok(Outcome::Done)
    }

    fn list_saved(&mut self) -> Result<()> {
        let listings = self.store()?.list_domains()?;
        if !self.text() {
            self.console.display(&serde_json::to_value(&listings)?)?;
            return Ok(());
        }
        if listings.is_empty() {
            self.console.render("No domains saved in database.")?;
            return Ok(());
        }
        self.console
            .render(&format!("Saved domains ({}):", listings.len()))?;
        for listing in &listings {
            let status = if listing.meta_compliant { "✓" } else { "○" };
            self.console.render(&format!(
                "  {status} {} ({}) - {} concepts",
                listing.name, listing.kind, listing.concept_count
            ))?;
        }
        Ok(())
    }

    fn db_stats(&mut self) -> Result<()> {
        let stats = self.store()?.stats()?;
        if !self.text() {
            self.console.display(&serde_json::to_value(&stats)?)?;
            return Ok(());
        }
        let c = &mut self.console;
        c.render("Database Statistics:")?;
        c.render(&format!("  Total domains: {}", stats.total_domains))?;
        c.render(&format!("  Total concepts: {}", stats.total_concepts))?;
        c.render(&format!("  META compliant: {}", stats.meta_compliant_domains))?;
        c.render(&format!("  Compliance rate: {:.1}%", stats.compliance_rate))?;
        Ok(())
    }

    fn validate_saved(&mut self) -> Result<()> {
        let validation = self.store()?.validate_persisted()?;
        if !self.text() {
            self.console.display(&serde_json::to_value(&validation)?)?;
            return Ok(());
        }
        let c = &mut self.console;
        c.render(&format!(
            "Persisted domains: {} compliant, {} non-compliant",
            validation.compliant, validation.non_compliant
        ))?;
        for status in &validation.domains {
            let note = if status.has_duality { "" } else { " (no duality)" };
            c.render(&format!("  {} {}{note}", mark(status.meta_compliant), status.name))?;
        }
        c.render(if validation.all_compliant {
            "All persisted domains are META compliant."
        } else {
            "Some persisted domains require balance adjustment."
        })?;
        Ok(())
    }

    fn delete_domain(&mut self, name: &str) -> Result<Outcome> {
        let found = self.store()?.delete_domain(name)?;
        if !self.text() {
            self.console
                .display(&json!({ "deleted": name, "found": found }))?;
        } else if found {
            self.console
                .render(&format!("Deleted domain '{name}' from database."))?;
        } else {
            self.console
                .render(&format!("Domain '{name}' not found in database."))?;
        }
        Ok(if found { Outcome::Done } else { Outcome::NotFound })
    }
}

fn mark(ok: bool) -> &'static str {
    if ok { "✓" } else { "✗" }
}

fn yes_no(ok: bool) -> Value {
    Value::from(if ok { "Yes" } else { "No" })
}

/// Small trackers shown in the demo's full system report.
fn sample_subsystems() -> Result<(EvolutionTracker, ParticipationTracker, Verifier)> {
    let mut evolution = EvolutionTracker::new();
    evolution.register("knowledge-graph", 100.0, EvolutionPhase::Genesis)?;
    evolution.register("domain-registry", 80.0, EvolutionPhase::Growth)?;
    evolution.evolve_balanced("knowledge-graph", 20.0, "concept expansion")?;
    evolution.evolve_balanced("domain-registry", 10.0, "new dualities")?;

    let mut participation = ParticipationTracker::new();
    participation.register("mathematics", 50.0)?;
    participation.register("physics", 30.0)?;
    participation.record_balanced(
        "mathematics",
        40.0,
        ParticipationType::Collaboration,
        "shared axioms",
    )?;
    participation.record_balanced(
        "physics",
        20.0,
        ParticipationType::Contribution,
        "conservation laws",
    )?;

    let mut verifier = Verifier::new();
    verifier.verify_balance(50.0, 50.0)?;
    verifier.verify_balance(52.0, 48.0)?;

    Ok((evolution, participation, verifier))
}
