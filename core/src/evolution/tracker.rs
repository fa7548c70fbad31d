use std::collections::BTreeMap;

use serde::Serialize;

use civhub_types::{Balanced, EntityId};

use super::EvolutionError;
use super::state::{EvolutionDelta, EvolutionPhase, EvolutionProof, EvolutionSnapshot, EvolutionState};
use crate::DeltaPolicy;

#[derive(Debug, Clone)]
struct Tracked {
    state: EvolutionState,
    history: Vec<EvolutionSnapshot>,
    deltas: Vec<EvolutionDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityStatus {
    pub entity_id: EntityId,
    pub phase: EvolutionPhase,
    pub generation: u64,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerValidation {
    pub tracked_entities: usize,
    pub valid: usize,
    pub invalid: usize,
    pub all_valid: bool,
    pub entities: Vec<EntityStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerProof {
    #[serde(flatten)]
    pub validation: TrackerValidation,
    pub state_proofs: Vec<EvolutionProof>,
    pub proof: String,
}

/// Per-entity energy tracking with a snapshot after every change.
#[derive(Debug, Clone, Default)]
pub struct EvolutionTracker {
    policy: DeltaPolicy,
    entities: BTreeMap<EntityId, Tracked>,
}

impl EvolutionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: DeltaPolicy) -> Self {
        Self {
            policy,
            entities: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> DeltaPolicy {
        self.policy
    }

    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.entities.len()
    }

    pub fn register(
        &mut self,
        entity_id: impl Into<EntityId>,
        initial_energy: f64,
        phase: EvolutionPhase,
    ) -> Result<&EvolutionState, EvolutionError> {
        let entity_id = entity_id.into();
        if self.entities.contains_key(&entity_id) {
            return Err(EvolutionError::AlreadyRegistered(entity_id));
        }
        let state = EvolutionState::new(entity_id.clone(), initial_energy, phase)?;
        tracing::debug!(entity = %entity_id, initial_energy, %phase, "Registered evolution entity");
        let tracked = Tracked {
            history: vec![state.snapshot()],
            deltas: Vec::new(),
            state,
        };
        Ok(&self.entities.entry(entity_id).or_insert(tracked).state)
    }

    pub fn unregister(&mut self, entity_id: &str) -> Option<EvolutionState> {
        self.entities.remove(entity_id).map(|tracked| tracked.state)
    }

    #[must_use]
    pub fn state(&self, entity_id: &str) -> Option<&EvolutionState> {
        self.entities.get(entity_id).map(|tracked| &tracked.state)
    }

    pub fn states(&self) -> impl Iterator<Item = &EvolutionState> {
        self.entities.values().map(|tracked| &tracked.state)
    }

    #[must_use]
    pub fn history(&self, entity_id: &str) -> &[EvolutionSnapshot] {
        self.entities
            .get(entity_id)
            .map(|tracked| tracked.history.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn deltas(&self, entity_id: &str) -> &[EvolutionDelta] {
        self.entities
            .get(entity_id)
            .map(|tracked| tracked.deltas.as_slice())
            .unwrap_or_default()
    }

    /// Applies a change under the tracker's policy.
    pub fn evolve(
        &mut self,
        entity_id: &str,
        positive_change: f64,
        negative_change: f64,
        description: &str,
    ) -> Result<EvolutionDelta, EvolutionError> {
        self.apply(entity_id, positive_change, negative_change, description, self.policy)
    }

    pub fn evolve_balanced(
        &mut self,
        entity_id: &str,
        magnitude: f64,
        description: &str,
    ) -> Result<EvolutionDelta, EvolutionError> {
        let half = magnitude / 2.0;
        self.evolve(entity_id, half, half, description)
    }

    /// Applies a change even when it is not 50/50, flagging it on the state.
    pub fn evolve_asymmetric(
        &mut self,
        entity_id: &str,
        positive_change: f64,
        negative_change: f64,
        description: &str,
    ) -> Result<EvolutionDelta, EvolutionError> {
        self.apply(
            entity_id,
            positive_change,
            negative_change,
            description,
            DeltaPolicy::Flag,
        )
    }

    fn apply(
        &mut self,
        entity_id: &str,
        positive_change: f64,
        negative_change: f64,
        description: &str,
        policy: DeltaPolicy,
    ) -> Result<EvolutionDelta, EvolutionError> {
        let tracked = self
            .entities
            .get_mut(entity_id)
            .ok_or_else(|| EvolutionError::NotRegistered(EntityId::from(entity_id)))?;
        let delta = EvolutionDelta::new(positive_change, negative_change, description)?;
        if let Err(err) = tracked.state.apply_delta(&delta, policy) {
            tracing::warn!(entity = %entity_id, error = %err, "Rejected evolution delta");
            return Err(err);
        }
        if !delta.is_balanced() {
            tracing::debug!(entity = %entity_id, positive_change, negative_change, "Applied unbalanced delta");
        }
        tracked.history.push(tracked.state.snapshot());
        tracked.deltas.push(delta.clone());
        Ok(delta)
    }

    pub fn transition(&mut self, entity_id: &str, phase: EvolutionPhase) -> Result<(), EvolutionError> {
        let tracked = self
            .entities
            .get_mut(entity_id)
            .ok_or_else(|| EvolutionError::NotRegistered(EntityId::from(entity_id)))?;
        tracked.state.transition_phase(phase);
        tracked.history.push(tracked.state.snapshot());
        Ok(())
    }

    #[must_use]
    pub fn generation(&self, entity_id: &str) -> Option<u64> {
        self.state(entity_id).map(EvolutionState::generation)
    }

    #[must_use]
    pub fn validate_all(&self) -> TrackerValidation {
        let entities: Vec<EntityStatus> = self
            .states()
            .map(|state| EntityStatus {
                entity_id: state.entity_id().clone(),
                phase: state.phase(),
                generation: state.generation(),
                balanced: state.is_balanced(),
            })
            .collect();
        let valid = entities.iter().filter(|e| e.balanced).count();
        let invalid = entities.len() - valid;
        TrackerValidation {
            tracked_entities: entities.len(),
            valid,
            invalid,
            all_valid: invalid == 0,
            entities,
        }
    }

    #[must_use]
    pub fn proof(&self) -> TrackerProof {
        let validation = self.validate_all();
        let proof = if validation.all_valid {
            "Evolution tracker maintains META 50/50 equilibrium"
        } else {
            "Evolution tracker has entities violating META 50/50"
        };
        TrackerProof {
            state_proofs: self.states().map(EvolutionState::proof).collect(),
            validation,
            proof: proof.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(id: &str) -> EvolutionTracker {
        let mut tracker = EvolutionTracker::new();
        tracker.register(id, 100.0, EvolutionPhase::Genesis).unwrap();
        tracker
    }

    #[test]
    fn register_twice_fails() {
        let mut tracker = tracker_with("a");
        let err = tracker.register("a", 10.0, EvolutionPhase::Genesis).unwrap_err();
        assert_eq!(err.to_string(), "Entity already registered: a");
        assert_eq!(tracker.tracked_count(), 1);
        assert_eq!(tracker.history("a").len(), 1);
    }

    #[test]
    fn evolve_unregistered_fails() {
        let mut tracker = EvolutionTracker::new();
        assert!(matches!(
            tracker.evolve("ghost", 1.0, 1.0, ""),
            Err(EvolutionError::NotRegistered(_))
        ));
        assert_eq!(tracker.generation("ghost"), None);
    }

    #[test]
    fn balanced_evolution_preserves_balance() {
        let mut tracker = tracker_with("a");
        tracker.evolve_balanced("a", 40.0, "growth").unwrap();
        tracker.evolve("a", 5.0, 5.0, "").unwrap();

        let state = tracker.state("a").unwrap();
        assert!(state.is_balanced());
        assert_eq!(state.generation(), 2);
        assert_eq!(state.latest_delta_balanced(), Some(true));
        assert_eq!(tracker.deltas("a").len(), 2);
        assert_eq!(tracker.history("a").len(), 3);
    }

    #[test]
    fn strict_tracker_rejects_unbalanced_delta() {
        let mut tracker = tracker_with("a");
        assert!(matches!(
            tracker.evolve("a", 10.0, 0.0, ""),
            Err(EvolutionError::UnbalancedDelta { .. })
        ));
        let state = tracker.state("a").unwrap();
        assert!((state.total_energy() - 100.0).abs() < 1e-12);
        assert!(tracker.deltas("a").is_empty());
    }

    #[test]
    fn asymmetric_delta_is_flagged_until_compensated() {
        let mut tracker = tracker_with("a");
        tracker.evolve_asymmetric("a", 10.0, 0.0, "push").unwrap();
        assert!(!tracker.validate_all().all_valid);
        assert_eq!(tracker.state("a").unwrap().latest_delta_balanced(), Some(false));

        tracker.evolve_asymmetric("a", 0.0, 10.0, "pull").unwrap();
        assert!(tracker.validate_all().all_valid);
    }

    #[test]
    fn flag_policy_applies_unbalanced_evolve() {
        let mut tracker = EvolutionTracker::with_policy(DeltaPolicy::Flag);
        tracker.register("a", 0.0, EvolutionPhase::Genesis).unwrap();
        tracker.evolve("a", 3.0, 1.0, "").unwrap();
        assert!(!tracker.state("a").unwrap().is_balanced());
    }

    #[test]
    fn transition_records_snapshot() {
        let mut tracker = tracker_with("a");
        tracker.transition("a", EvolutionPhase::Growth).unwrap();
        let history = tracker.history("a");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].phase, EvolutionPhase::Growth);
        assert!(tracker.transition("b", EvolutionPhase::Growth).is_err());
    }

    #[test]
    fn unregister_drops_history() {
        let mut tracker = tracker_with("a");
        assert!(tracker.unregister("a").is_some());
        assert!(tracker.history("a").is_empty());
        assert!(tracker.unregister("a").is_none());
    }

    #[test]
    fn proof_reports_all_states() {
        let mut tracker = tracker_with("a");
        tracker.register("b", 50.0, EvolutionPhase::Growth).unwrap();
        let proof = tracker.proof();
        assert_eq!(proof.validation.tracked_entities, 2);
        assert_eq!(proof.state_proofs.len(), 2);
        assert_eq!(proof.proof, "Evolution tracker maintains META 50/50 equilibrium");
    }
}
