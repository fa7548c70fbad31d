//! Phase transitions: a fixed rule table and an engine that applies it.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civhub_types::{EntityId, split_50_50, verify_meta};

use super::EvolutionError;
use super::state::{EvolutionDelta, EvolutionPhase, EvolutionState};
use super::tracker::{EvolutionTracker, TrackerProof};

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransitionType: TransitionType {
        Progression => "progression",
        Regression => "regression",
        Lateral => "lateral",
        Quantum => "quantum",
        Cyclic => "cyclic",
    }
}

type Condition = Box<dyn Fn(&EvolutionState) -> bool + Send + Sync>;

pub struct TransitionRule {
    name: String,
    from: EvolutionPhase,
    to: EvolutionPhase,
    kind: TransitionType,
    energy_cost: f64,
    description: String,
    condition: Option<Condition>,
}

impl fmt::Debug for TransitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRule")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("kind", &self.kind)
            .field("energy_cost", &self.energy_cost)
            .field("has_condition", &self.condition.is_some())
            .finish_non_exhaustive()
    }
}

impl TransitionRule {
    /// A rule named `"{from}_to_{to}"`.
    #[must_use]
    pub fn new(from: EvolutionPhase, to: EvolutionPhase, kind: TransitionType, energy_cost: f64) -> Self {
        Self {
            name: format!("{from}_to_{to}"),
            from,
            to,
            kind,
            energy_cost,
            description: String::new(),
            condition: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_condition(
        mut self,
        condition: impl Fn(&EvolutionState) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn from_phase(&self) -> EvolutionPhase {
        self.from
    }

    #[must_use]
    pub const fn to_phase(&self) -> EvolutionPhase {
        self.to
    }

    #[must_use]
    pub const fn kind(&self) -> TransitionType {
        self.kind
    }

    #[must_use]
    pub const fn energy_cost(&self) -> f64 {
        self.energy_cost
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The cost split 50/50 across positive and negative energy.
    #[must_use]
    pub fn cost_delta(&self) -> (f64, f64) {
        split_50_50(self.energy_cost)
    }

    #[must_use]
    pub fn can_apply(&self, state: &EvolutionState) -> bool {
        state.phase() == self.from
            && state.total_energy() >= self.energy_cost
            && self.condition.as_ref().is_none_or(|condition| condition(state))
    }

    pub fn energy_delta(&self) -> Result<EvolutionDelta, EvolutionError> {
        let (positive, negative) = self.cost_delta();
        EvolutionDelta::new(positive, negative, format!("Transition cost: {}", self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionResult {
    pub success: bool,
    pub entity_id: EntityId,
    pub from_phase: EvolutionPhase,
    pub to_phase: EvolutionPhase,
    pub transition_type: TransitionType,
    pub energy_consumed: f64,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl TransitionResult {
    fn failed(
        entity_id: &EntityId,
        from_phase: EvolutionPhase,
        to_phase: EvolutionPhase,
        transition_type: TransitionType,
        error: String,
    ) -> Self {
        Self {
            success: false,
            entity_id: entity_id.clone(),
            from_phase,
            to_phase,
            transition_type,
            energy_consumed: 0.0,
            timestamp: Utc::now(),
            error: Some(error),
        }
    }
}

const DEFAULT_TRANSITIONS: [(EvolutionPhase, EvolutionPhase, TransitionType, f64); 10] = [
    (EvolutionPhase::Genesis, EvolutionPhase::Growth, TransitionType::Progression, 10.0),
    (EvolutionPhase::Growth, EvolutionPhase::Maturation, TransitionType::Progression, 20.0),
    (EvolutionPhase::Maturation, EvolutionPhase::Equilibrium, TransitionType::Progression, 15.0),
    (EvolutionPhase::Maturation, EvolutionPhase::Transformation, TransitionType::Lateral, 25.0),
    (EvolutionPhase::Transformation, EvolutionPhase::Growth, TransitionType::Cyclic, 30.0),
    (EvolutionPhase::Transformation, EvolutionPhase::Equilibrium, TransitionType::Progression, 20.0),
    (EvolutionPhase::Equilibrium, EvolutionPhase::Decay, TransitionType::Regression, 5.0),
    (EvolutionPhase::Growth, EvolutionPhase::Decay, TransitionType::Regression, 15.0),
    (EvolutionPhase::Maturation, EvolutionPhase::Decay, TransitionType::Regression, 10.0),
    (EvolutionPhase::Decay, EvolutionPhase::Genesis, TransitionType::Cyclic, 50.0),
];

/// Ordered set of rules, at most one per (from, to) pair.
#[derive(Debug)]
pub struct TransitionMatrix {
    rules: Vec<TransitionRule>,
}

impl Default for TransitionMatrix {
    fn default() -> Self {
        let mut matrix = Self::empty();
        for (from, to, kind, cost) in DEFAULT_TRANSITIONS {
            matrix.add_rule(TransitionRule::new(from, to, kind, cost));
        }
        matrix
    }
}

impl TransitionMatrix {
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Inserts the rule, replacing any rule for the same phase pair in place.
    pub fn add_rule(&mut self, rule: TransitionRule) {
        match self
            .rules
            .iter_mut()
            .find(|existing| existing.from == rule.from && existing.to == rule.to)
        {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn remove_rule(&mut self, from: EvolutionPhase, to: EvolutionPhase) -> Option<TransitionRule> {
        let index = self.rules.iter().position(|r| r.from == from && r.to == to)?;
        Some(self.rules.remove(index))
    }

    #[must_use]
    pub fn rule(&self, from: EvolutionPhase, to: EvolutionPhase) -> Option<&TransitionRule> {
        self.rules.iter().find(|r| r.from == from && r.to == to)
    }

    pub fn valid_transitions(&self, from: EvolutionPhase) -> impl Iterator<Item = &TransitionRule> {
        self.rules.iter().filter(move |r| r.from == from)
    }

    #[must_use]
    pub fn is_valid(&self, from: EvolutionPhase, to: EvolutionPhase) -> bool {
        self.rule(from, to).is_some()
    }

    #[must_use]
    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    /// Every phase mapped to its reachable targets, in rule order.
    #[must_use]
    pub fn adjacency(&self) -> BTreeMap<EvolutionPhase, Vec<EvolutionPhase>> {
        let mut adjacency: BTreeMap<EvolutionPhase, Vec<EvolutionPhase>> = EvolutionPhase::all()
            .iter()
            .map(|phase| (*phase, Vec::new()))
            .collect();
        for rule in &self.rules {
            adjacency.entry(rule.from).or_default().push(rule.to);
        }
        adjacency
    }
}

/// Outcome of [`TransitionEngine::can_transition`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionCheck {
    pub allowed: bool,
    pub reason: String,
}

impl TransitionCheck {
    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStatus {
    pub name: String,
    pub from: EvolutionPhase,
    pub to: EvolutionPhase,
    #[serde(rename = "type")]
    pub kind: TransitionType,
    pub cost: f64,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleValidation {
    pub total_rules: usize,
    pub valid_rules: usize,
    pub all_valid: bool,
    pub rules: Vec<RuleStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionStatistics {
    pub total_transitions: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionProof {
    pub transition_validation: RuleValidation,
    pub tracker_state: TrackerProof,
    pub statistics: TransitionStatistics,
    pub proof: String,
}

/// Moves tracked entities between phases according to a [`TransitionMatrix`].
///
/// The rule cost is reported as consumed but never subtracted: energy only
/// grows through deltas.
#[derive(Debug, Default)]
pub struct TransitionEngine {
    tracker: EvolutionTracker,
    matrix: TransitionMatrix,
    log: Vec<TransitionResult>,
}

impl TransitionEngine {
    #[must_use]
    pub fn new(tracker: EvolutionTracker) -> Self {
        Self::with_matrix(tracker, TransitionMatrix::default())
    }

    #[must_use]
    pub fn with_matrix(tracker: EvolutionTracker, matrix: TransitionMatrix) -> Self {
        Self {
            tracker,
            matrix,
            log: Vec::new(),
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &EvolutionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut EvolutionTracker {
        &mut self.tracker
    }

    #[must_use]
    pub fn matrix(&self) -> &TransitionMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut TransitionMatrix {
        &mut self.matrix
    }

    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.log.len()
    }

    #[must_use]
    pub fn available_transitions(&self, entity_id: &str) -> Vec<&TransitionRule> {
        let Some(state) = self.tracker.state(entity_id) else {
            return Vec::new();
        };
        self.matrix
            .valid_transitions(state.phase())
            .filter(|rule| rule.can_apply(state))
            .collect()
    }

    #[must_use]
    pub fn can_transition(&self, entity_id: &str, to: EvolutionPhase) -> TransitionCheck {
        let Some(state) = self.tracker.state(entity_id) else {
            return TransitionCheck::deny("Entity not registered");
        };
        let Some(rule) = self.matrix.rule(state.phase(), to) else {
            return TransitionCheck::deny(format!(
                "No valid transition from {} to {to}",
                state.phase()
            ));
        };
        if !rule.can_apply(state) {
            if state.total_energy() < rule.energy_cost() {
                return TransitionCheck::deny(format!(
                    "Insufficient energy: need {}, have {}",
                    rule.energy_cost(),
                    state.total_energy()
                ));
            }
            return TransitionCheck::deny("Transition condition not met");
        }
        TransitionCheck {
            allowed: true,
            reason: "Transition allowed".to_string(),
        }
    }

    /// Attempts the transition. Attempts on registered entities are logged,
    /// successful or not.
    pub fn execute(&mut self, entity_id: &str, to: EvolutionPhase) -> TransitionResult {
        let entity = EntityId::from(entity_id);
        let Some(state) = self.tracker.state(entity_id) else {
            return TransitionResult::failed(
                &entity,
                EvolutionPhase::Genesis,
                to,
                TransitionType::Progression,
                "Entity not registered".to_string(),
            );
        };
        let from = state.phase();

        let result = match self.matrix.rule(from, to) {
            None => TransitionResult::failed(
                &entity,
                from,
                to,
                TransitionType::Progression,
                format!("No valid transition from {from} to {to}"),
            ),
            Some(rule) if !rule.can_apply(state) => TransitionResult::failed(
                &entity,
                from,
                to,
                rule.kind(),
                "Transition conditions not met".to_string(),
            ),
            Some(rule) => {
                let (kind, cost) = (rule.kind(), rule.energy_cost());
                match self.tracker.transition(entity_id, to) {
                    Ok(()) => TransitionResult {
                        success: true,
                        entity_id: entity,
                        from_phase: from,
                        to_phase: to,
                        transition_type: kind,
                        energy_consumed: cost,
                        timestamp: Utc::now(),
                        error: None,
                    },
                    Err(err) => TransitionResult::failed(&entity, from, to, kind, err.to_string()),
                }
            }
        };

        if result.success {
            tracing::debug!(entity = %entity_id, %from, %to, "Phase transition");
        } else {
            tracing::warn!(
                entity = %entity_id,
                %from,
                %to,
                error = result.error.as_deref().unwrap_or_default(),
                "Phase transition failed"
            );
        }
        self.log.push(result.clone());
        result
    }

    pub fn history(&self, entity_id: Option<&str>) -> impl Iterator<Item = &TransitionResult> {
        self.log
            .iter()
            .filter(move |r| entity_id.is_none_or(|id| r.entity_id.as_str() == id))
    }

    /// Shortest phase path (breadth-first) from the entity's current phase.
    #[must_use]
    pub fn path_to_phase(&self, entity_id: &str, target: EvolutionPhase) -> Option<Vec<EvolutionPhase>> {
        let start = self.tracker.state(entity_id)?.phase();
        if start == target {
            return Some(vec![target]);
        }
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([vec![start]]);
        while let Some(path) = queue.pop_front() {
            let current = *path.last()?;
            for rule in self.matrix.valid_transitions(current) {
                let next = rule.to_phase();
                if next == target {
                    let mut found = path.clone();
                    found.push(next);
                    return Some(found);
                }
                if visited.insert(next) {
                    let mut extended = path.clone();
                    extended.push(next);
                    queue.push_back(extended);
                }
            }
        }
        None
    }

    #[must_use]
    pub fn validate_all_transitions(&self) -> RuleValidation {
        let rules: Vec<RuleStatus> = self
            .matrix
            .rules()
            .iter()
            .map(|rule| {
                let (positive, negative) = rule.cost_delta();
                RuleStatus {
                    name: rule.name().to_string(),
                    from: rule.from_phase(),
                    to: rule.to_phase(),
                    kind: rule.kind(),
                    cost: rule.energy_cost(),
                    balanced: verify_meta(positive, negative),
                }
            })
            .collect();
        let valid_rules = rules.iter().filter(|r| r.balanced).count();
        RuleValidation {
            total_rules: rules.len(),
            valid_rules,
            all_valid: valid_rules == rules.len(),
            rules,
        }
    }

    #[must_use]
    pub fn proof(&self) -> TransitionProof {
        let validation = self.validate_all_transitions();
        let tracker_state = self.tracker.proof();
        let total = self.log.len();
        let successful = self.log.iter().filter(|r| r.success).count();
        let proof = if validation.all_valid && tracker_state.validation.all_valid {
            "Transition engine maintains META 50/50 equilibrium"
        } else {
            "Transition engine has META 50/50 violations"
        };
        TransitionProof {
            transition_validation: validation,
            tracker_state,
            statistics: TransitionStatistics {
                total_transitions: total,
                successful,
                failed: total - successful,
                success_rate: if total == 0 {
                    0.0
                } else {
                    successful as f64 / total as f64
                },
            },
            proof: proof.to_string(),
        }
    }
}
