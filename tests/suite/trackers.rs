//! Evolution, participation and contribution trackers.

use civhub_core::DeltaPolicy;
use civhub_core::evolution::{
    EvolutionError, EvolutionMetrics, EvolutionPhase, EvolutionTracker, TransitionEngine,
};
use civhub_core::participation::{
    ContributionCategory, ContributionManager, ContributionStatus, ParticipationError,
    ParticipationLevel, ParticipationTracker, ParticipationType,
};
use civhub_types::Balanced;

use crate::common::approx;

#[test]
fn strict_tracker_rejects_unbalanced_delta_and_keeps_totals() {
    let mut tracker = EvolutionTracker::new();
    tracker.register("atlas", 100.0, EvolutionPhase::Genesis).unwrap();

    let err = tracker.evolve("atlas", 30.0, 10.0, "lopsided").unwrap_err();
    assert!(matches!(err, EvolutionError::UnbalancedDelta { .. }));

    let state = tracker.state("atlas").unwrap();
    assert!(approx(state.total_energy(), 100.0));
    assert_eq!(state.generation(), 0);
    assert!(state.is_balanced());
}

#[test]
fn flagging_tracker_applies_and_records_imbalance() {
    let mut tracker = EvolutionTracker::with_policy(DeltaPolicy::Flag);
    tracker.register("atlas", 100.0, EvolutionPhase::Genesis).unwrap();
    tracker.evolve("atlas", 30.0, 10.0, "lopsided").unwrap();

    let state = tracker.state("atlas").unwrap();
    assert_eq!(state.latest_delta_balanced(), Some(false));
    assert!(!state.is_balanced());
    assert!(!tracker.validate_all().all_valid);

    tracker.evolve("atlas", 0.0, 20.0, "compensate").unwrap();
    assert!(tracker.state("atlas").unwrap().is_balanced());
    assert!(tracker.validate_all().all_valid);
}

#[test]
fn balanced_evolution_keeps_operational_split() {
    let mut tracker = EvolutionTracker::new();
    tracker.register("atlas", 50.0, EvolutionPhase::Growth).unwrap();
    tracker.evolve_balanced("atlas", 50.0, "growth spurt").unwrap();

    let state = tracker.state("atlas").unwrap();
    assert!(approx(state.total_energy(), 100.0));
    assert!(approx(state.structure(), 52.0));
    assert!(approx(state.flexibility(), 48.0));
    assert_eq!(tracker.history("atlas").len(), 1);

    let metrics = EvolutionMetrics::new(&tracker);
    assert_eq!(metrics.phase_distribution().get(&EvolutionPhase::Growth), Some(&1));
}

#[test]
fn unknown_entity_is_an_error() {
    let mut tracker = EvolutionTracker::new();
    assert!(matches!(
        tracker.evolve_balanced("ghost", 10.0, ""),
        Err(EvolutionError::NotRegistered(_))
    ));
}

#[test]
fn transition_engine_finds_shortest_path() {
    let mut tracker = EvolutionTracker::new();
    tracker.register("atlas", 500.0, EvolutionPhase::Genesis).unwrap();
    let engine = TransitionEngine::new(tracker);

    let path = engine.path_to_phase("atlas", EvolutionPhase::Equilibrium).unwrap();
    assert_eq!(
        path,
        [
            EvolutionPhase::Genesis,
            EvolutionPhase::Growth,
            EvolutionPhase::Maturation,
            EvolutionPhase::Equilibrium,
        ]
    );
    assert_eq!(
        engine.path_to_phase("atlas", EvolutionPhase::Genesis).unwrap(),
        [EvolutionPhase::Genesis]
    );
    assert!(engine.path_to_phase("ghost", EvolutionPhase::Decay).is_none());
}

#[test]
fn transition_engine_rejects_missing_rule() {
    let mut tracker = EvolutionTracker::new();
    tracker.register("atlas", 500.0, EvolutionPhase::Genesis).unwrap();
    let mut engine = TransitionEngine::new(tracker);

    let result = engine.execute("atlas", EvolutionPhase::Equilibrium);
    assert!(!result.success);
    assert_eq!(
        engine.tracker().state("atlas").unwrap().phase(),
        EvolutionPhase::Genesis
    );
}

#[test]
fn participation_levels_follow_exchange() {
    let mut tracker = ParticipationTracker::new();
    tracker.register("ada", 0.0).unwrap();
    assert_eq!(tracker.level("ada"), ParticipationLevel::Inactive);

    tracker
        .record_balanced("ada", 60.0, ParticipationType::Collaboration, "pairing")
        .unwrap();
    assert_eq!(tracker.level("ada"), ParticipationLevel::Moderate);

    tracker
        .record_balanced("ada", 500.0, ParticipationType::Facilitation, "workshop")
        .unwrap();
    assert_eq!(tracker.level("ada"), ParticipationLevel::Intensive);
    assert!(tracker.validate_all().all_valid);
}

#[test]
fn strict_participation_rejects_one_sided_record() {
    let mut tracker = ParticipationTracker::new();
    tracker.register("ada", 20.0).unwrap();

    let err = tracker
        .record_participation("ada", 10.0, 0.0, ParticipationType::Consumption, "take")
        .unwrap_err();
    assert!(matches!(err, ParticipationError::UnbalancedRecord { .. }));
    assert_eq!(tracker.state("ada").unwrap().record_count(), 0);
    assert!(tracker.register("ada", 1.0).is_err());
}

#[test]
fn contribution_status_moves_pending_partial_balanced() {
    let mut manager = ContributionManager::new();
    let id = manager
        .create_contribution("ada", 40.0, ContributionCategory::Knowledge, "notes", &[], false)
        .unwrap()
        .id();
    let status = |m: &ContributionManager| m.contribution(id).unwrap().status();
    assert_eq!(status(&manager), ContributionStatus::Pending);

    manager.reciprocate(id, 15.0, None).unwrap();
    assert_eq!(status(&manager), ContributionStatus::Partial);

    let applied = manager.reciprocate(id, 100.0, None).unwrap();
    assert!(approx(applied, 25.0));
    assert_eq!(status(&manager), ContributionStatus::Balanced);
    assert!(manager.validate_all().system_balanced);
}
