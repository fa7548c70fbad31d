use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civhub_types::{Balanced, EntityId, calculate_balance, non_negative, split_50_50, split_52_48};

use super::EvolutionError;
use crate::DeltaPolicy;

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EvolutionPhase: EvolutionPhase {
        Genesis => "genesis",
        Growth => "growth",
        Maturation => "maturation",
        Transformation => "transformation",
        Decay => "decay",
        Equilibrium => "equilibrium",
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EvolutionDirection: EvolutionDirection {
        Positive => "positive",
        Negative => "negative",
        Neutral => "neutral",
    }
}

/// One change applied to an entity's energy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionDelta {
    positive_change: f64,
    negative_change: f64,
    timestamp: DateTime<Utc>,
    description: String,
}

impl EvolutionDelta {
    pub fn new(
        positive_change: f64,
        negative_change: f64,
        description: impl Into<String>,
    ) -> Result<Self, EvolutionError> {
        if non_negative("positive_change", positive_change).is_err()
            || non_negative("negative_change", negative_change).is_err()
        {
            return Err(EvolutionError::NegativeChange {
                positive: positive_change,
                negative: negative_change,
            });
        }
        Ok(Self {
            positive_change,
            negative_change,
            timestamp: Utc::now(),
            description: description.into(),
        })
    }

    #[must_use]
    pub const fn positive_change(&self) -> f64 {
        self.positive_change
    }

    #[must_use]
    pub const fn negative_change(&self) -> f64 {
        self.negative_change
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn net_change(&self) -> f64 {
        self.positive_change - self.negative_change
    }

    #[must_use]
    pub fn total_magnitude(&self) -> f64 {
        self.positive_change + self.negative_change
    }

    #[must_use]
    pub fn direction(&self) -> EvolutionDirection {
        let net = self.net_change();
        if net > 0.0 {
            EvolutionDirection::Positive
        } else if net < 0.0 {
            EvolutionDirection::Negative
        } else {
            EvolutionDirection::Neutral
        }
    }

    pub fn validate(&self) -> Result<(), EvolutionError> {
        if self.is_balanced() {
            return Ok(());
        }
        let (positive, negative) = self.balance();
        Err(EvolutionError::UnbalancedDelta { positive, negative })
    }
}

impl Balanced for EvolutionDelta {
    fn pair(&self) -> (f64, f64) {
        (self.positive_change, self.negative_change)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionSnapshot {
    pub entity_id: EntityId,
    pub timestamp: DateTime<Utc>,
    pub phase: EvolutionPhase,
    pub positive_energy: f64,
    pub negative_energy: f64,
    pub structure: f64,
    pub flexibility: f64,
    pub generation: u64,
}

impl EvolutionSnapshot {
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.positive_energy + self.negative_energy
    }
}

impl Balanced for EvolutionSnapshot {
    fn pair(&self) -> (f64, f64) {
        (self.positive_energy, self.negative_energy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyProof {
    pub positive: f64,
    pub negative: f64,
    pub total: f64,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalProof {
    pub structure: f64,
    pub flexibility: f64,
    pub ratio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionProof {
    pub entity_id: EntityId,
    pub phase: EvolutionPhase,
    pub generation: u64,
    pub energy: EnergyProof,
    pub meta_valid: bool,
    pub latest_delta_balanced: Option<bool>,
    pub operational: OperationalProof,
    pub proof: String,
}

/// Running energy totals of one entity.
///
/// Energy starts split 50/50 and only grows; structure and flexibility are
/// always the 52/48 split of the current total.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionState {
    entity_id: EntityId,
    phase: EvolutionPhase,
    positive_energy: f64,
    negative_energy: f64,
    structure: f64,
    flexibility: f64,
    generation: u64,
    latest_delta_balanced: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EvolutionState {
    pub fn new(
        entity_id: impl Into<EntityId>,
        initial_energy: f64,
        phase: EvolutionPhase,
    ) -> Result<Self, EvolutionError> {
        let initial_energy = non_negative("initial_energy", initial_energy)?;
        let (positive_energy, negative_energy) = split_50_50(initial_energy);
        let (structure, flexibility) = split_52_48(initial_energy);
        let now = Utc::now();
        Ok(Self {
            entity_id: entity_id.into(),
            phase,
            positive_energy,
            negative_energy,
            structure,
            flexibility,
            generation: 0,
            latest_delta_balanced: None,
            created_at: now,
            updated_at: now,
        })
    }

    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    #[must_use]
    pub const fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    #[must_use]
    pub const fn positive_energy(&self) -> f64 {
        self.positive_energy
    }

    #[must_use]
    pub const fn negative_energy(&self) -> f64 {
        self.negative_energy
    }

    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.positive_energy + self.negative_energy
    }

    #[must_use]
    pub const fn structure(&self) -> f64 {
        self.structure
    }

    #[must_use]
    pub const fn flexibility(&self) -> f64 {
        self.flexibility
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Balance of the most recently applied delta, if any.
    #[must_use]
    pub const fn latest_delta_balanced(&self) -> Option<bool> {
        self.latest_delta_balanced
    }

    /// Percentage split of structure and flexibility; `(52, 48)` when empty.
    #[must_use]
    pub fn operational_ratio(&self) -> (f64, f64) {
        if self.structure + self.flexibility == 0.0 {
            return (52.0, 48.0);
        }
        calculate_balance(self.structure, self.flexibility)
    }

    pub fn apply_delta(
        &mut self,
        delta: &EvolutionDelta,
        policy: DeltaPolicy,
    ) -> Result<(), EvolutionError> {
        let balanced = delta.is_balanced();
        if !policy.admits(balanced) {
            delta.validate()?;
        }
        self.positive_energy += delta.positive_change;
        self.negative_energy += delta.negative_change;
        (self.structure, self.flexibility) = split_52_48(self.total_energy());
        self.generation += 1;
        self.latest_delta_balanced = Some(balanced);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn transition_phase(&mut self, phase: EvolutionPhase) {
        self.phase = phase;
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn snapshot(&self) -> EvolutionSnapshot {
        EvolutionSnapshot {
            entity_id: self.entity_id.clone(),
            timestamp: Utc::now(),
            phase: self.phase,
            positive_energy: self.positive_energy,
            negative_energy: self.negative_energy,
            structure: self.structure,
            flexibility: self.flexibility,
            generation: self.generation,
        }
    }

    #[must_use]
    pub fn proof(&self) -> EvolutionProof {
        let (pos, neg) = self.balance();
        let (structure_pct, flexibility_pct) = self.operational_ratio();
        let meta_valid = self.is_balanced();
        EvolutionProof {
            entity_id: self.entity_id.clone(),
            phase: self.phase,
            generation: self.generation,
            energy: EnergyProof {
                positive: self.positive_energy,
                negative: self.negative_energy,
                total: self.total_energy(),
                balance: format!("{pos:.2}/{neg:.2}"),
            },
            meta_valid,
            latest_delta_balanced: self.latest_delta_balanced,
            operational: OperationalProof {
                structure: self.structure,
                flexibility: self.flexibility,
                ratio: format!("{structure_pct:.2}/{flexibility_pct:.2}"),
            },
            proof: if meta_valid {
                "Evolution state maintains META 50/50 equilibrium".to_string()
            } else {
                "Evolution state violates META 50/50".to_string()
            },
        }
    }
}

impl Balanced for EvolutionState {
    fn pair(&self) -> (f64, f64) {
        (self.positive_energy, self.negative_energy)
    }
}
