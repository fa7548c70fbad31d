use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civhub_types::{Balanced, EntityId, calculate_balance, non_negative, split_50_50, split_52_48};

use super::ParticipationError;
use crate::DeltaPolicy;

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ParticipationType: ParticipationType {
        Contribution => "contribution",
        Consumption => "consumption",
        Collaboration => "collaboration",
        Observation => "observation",
        Facilitation => "facilitation",
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ParticipationLevel: ParticipationLevel {
        Inactive => "inactive",
        Minimal => "minimal",
        Moderate => "moderate",
        Active => "active",
        Intensive => "intensive",
    }
}

impl ParticipationLevel {
    /// Minimum total exchange for this level.
    #[must_use]
    pub const fn threshold(self) -> f64 {
        match self {
            ParticipationLevel::Inactive => 0.0,
            ParticipationLevel::Minimal => 10.0,
            ParticipationLevel::Moderate => 50.0,
            ParticipationLevel::Active => 200.0,
            ParticipationLevel::Intensive => 500.0,
        }
    }

    /// Highest level whose threshold `exchange` reaches.
    #[must_use]
    pub fn for_exchange(exchange: f64) -> Self {
        Self::all()
            .iter()
            .rev()
            .copied()
            .find(|level| exchange >= level.threshold())
            .unwrap_or(ParticipationLevel::Inactive)
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EngagementState: EngagementState {
        Dormant => "dormant",
        Warming => "warming",
        Engaged => "engaged",
        Peak => "peak",
        Cooling => "cooling",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationRecord {
    participant_id: EntityId,
    kind: ParticipationType,
    given: f64,
    received: f64,
    timestamp: DateTime<Utc>,
    description: String,
}

impl ParticipationRecord {
    pub fn new(
        participant_id: impl Into<EntityId>,
        given: f64,
        received: f64,
        kind: ParticipationType,
        description: impl Into<String>,
    ) -> Result<Self, ParticipationError> {
        if non_negative("given", given).is_err() || non_negative("received", received).is_err() {
            return Err(ParticipationError::NegativeValue { given, received });
        }
        Ok(Self {
            participant_id: participant_id.into(),
            kind,
            given,
            received,
            timestamp: Utc::now(),
            description: description.into(),
        })
    }

    #[must_use]
    pub fn participant_id(&self) -> &EntityId {
        &self.participant_id
    }

    #[must_use]
    pub const fn kind(&self) -> ParticipationType {
        self.kind
    }

    #[must_use]
    pub const fn given(&self) -> f64 {
        self.given
    }

    #[must_use]
    pub const fn received(&self) -> f64 {
        self.received
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
    pub fn total_exchange(&self) -> f64 {
        self.given + self.received
    }

    #[must_use]
    pub fn net_contribution(&self) -> f64 {
        self.given - self.received
    }

    pub fn validate(&self) -> Result<(), ParticipationError> {
        if self.is_balanced() {
            return Ok(());
        }
        let (given, received) = self.balance();
        Err(ParticipationError::UnbalancedRecord { given, received })
    }
}

impl Balanced for ParticipationRecord {
    fn pair(&self) -> (f64, f64) {
        (self.given, self.received)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationSnapshot {
    pub participant_id: EntityId,
    pub timestamp: DateTime<Utc>,
    pub level: ParticipationLevel,
    pub engagement_state: EngagementState,
    pub total_given: f64,
    pub total_received: f64,
    pub record_count: usize,
    pub structure: f64,
    pub flexibility: f64,
}

impl Balanced for ParticipationSnapshot {
    fn pair(&self) -> (f64, f64) {
        (self.total_given, self.total_received)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeProof {
    pub given: f64,
    pub received: f64,
    pub total: f64,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationProof {
    pub participant_id: EntityId,
    pub level: ParticipationLevel,
    pub engagement_state: EngagementState,
    pub exchange: ExchangeProof,
    pub meta_valid: bool,
    pub latest_record_balanced: Option<bool>,
    pub operational_ratio: String,
    pub record_count: usize,
    pub proof: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationState {
    participant_id: EntityId,
    total_given: f64,
    total_received: f64,
    structure: f64,
    flexibility: f64,
    level: ParticipationLevel,
    engagement_state: EngagementState,
    record_count: usize,
    latest_record_balanced: Option<bool>,
    updated_at: DateTime<Utc>,
}

impl ParticipationState {
    /// Splits `initial_exchange` 50/50. With nothing exchanged yet, the
    /// operational split is taken from a nominal 100.
    pub fn new(
        participant_id: impl Into<EntityId>,
        initial_exchange: f64,
    ) -> Result<Self, ParticipationError> {
        let initial_exchange = non_negative("initial_exchange", initial_exchange)?;
        let (total_given, total_received) = split_50_50(initial_exchange);
        let (structure, flexibility) = split_52_48(if initial_exchange > 0.0 {
            initial_exchange
        } else {
            100.0
        });
        Ok(Self {
            participant_id: participant_id.into(),
            total_given,
            total_received,
            structure,
            flexibility,
            level: ParticipationLevel::for_exchange(initial_exchange),
            engagement_state: EngagementState::Dormant,
            record_count: 0,
            latest_record_balanced: None,
            updated_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn participant_id(&self) -> &EntityId {
        &self.participant_id
    }

    #[must_use]
    pub const fn total_given(&self) -> f64 {
        self.total_given
    }

    #[must_use]
    pub const fn total_received(&self) -> f64 {
        self.total_received
    }

    #[must_use]
    pub fn total_exchange(&self) -> f64 {
        self.total_given + self.total_received
    }

    #[must_use]
    pub const fn level(&self) -> ParticipationLevel {
        self.level
    }

    #[must_use]
    pub const fn engagement_state(&self) -> EngagementState {
        self.engagement_state
    }

    #[must_use]
    pub const fn record_count(&self) -> usize {
        self.record_count
    }

    #[must_use]
    pub const fn latest_record_balanced(&self) -> Option<bool> {
        self.latest_record_balanced
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn operational_ratio(&self) -> (f64, f64) {
        if self.structure + self.flexibility == 0.0 {
            return (52.0, 48.0);
        }
        calculate_balance(self.structure, self.flexibility)
    }

    pub fn apply_record(
        &mut self,
        record: &ParticipationRecord,
        policy: DeltaPolicy,
    ) -> Result<(), ParticipationError> {
        let balanced = record.is_balanced();
        if !policy.admits(balanced) {
            record.validate()?;
        }
        self.total_given += record.given;
        self.total_received += record.received;
        (self.structure, self.flexibility) = split_52_48(self.total_exchange());
        self.level = ParticipationLevel::for_exchange(self.total_exchange());
        self.record_count += 1;
        self.latest_record_balanced = Some(balanced);
        self.updated_at = Utc::now();
        self.engagement_state = match self.record_count {
            0 => EngagementState::Dormant,
            1 | 2 => EngagementState::Warming,
            _ if matches!(
                self.level,
                ParticipationLevel::Active | ParticipationLevel::Intensive
            ) =>
            {
                EngagementState::Peak
            }
            _ => EngagementState::Engaged,
        };
        Ok(())
    }

    pub fn set_engagement_state(&mut self, state: EngagementState) {
        self.engagement_state = state;
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn snapshot(&self) -> ParticipationSnapshot {
        ParticipationSnapshot {
            participant_id: self.participant_id.clone(),
            timestamp: Utc::now(),
            level: self.level,
            engagement_state: self.engagement_state,
            total_given: self.total_given,
            total_received: self.total_received,
            record_count: self.record_count,
            structure: self.structure,
            flexibility: self.flexibility,
        }
    }

    #[must_use]
    pub fn proof(&self) -> ParticipationProof {
        let (given, received) = self.balance();
        let (structure, flexibility) = self.operational_ratio();
        let meta_valid = self.is_balanced();
        ParticipationProof {
            participant_id: self.participant_id.clone(),
            level: self.level,
            engagement_state: self.engagement_state,
            exchange: ExchangeProof {
                given: self.total_given,
                received: self.total_received,
                total: self.total_exchange(),
                balance: format!("{given:.2}/{received:.2}"),
            },
            meta_valid,
            latest_record_balanced: self.latest_record_balanced,
            operational_ratio: format!("{structure:.2}/{flexibility:.2}"),
            record_count: self.record_count,
            proof: if meta_valid {
                "Participation state maintains META 50/50 equilibrium".to_string()
            } else {
                "Participation state violates META 50/50".to_string()
            },
        }
    }
}

impl Balanced for ParticipationState {
    fn pair(&self) -> (f64, f64) {
        (self.total_given, self.total_received)
    }
}

#[derive(Debug, Clone)]
struct Participant {
    state: ParticipationState,
    records: Vec<ParticipationRecord>,
    history: Vec<ParticipationSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantStatus {
    pub participant_id: EntityId,
    pub level: ParticipationLevel,
    pub engagement: EngagementState,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationValidation {
    pub tracked_participants: usize,
    pub total_records: usize,
    pub valid: usize,
    pub invalid: usize,
    pub all_valid: bool,
    pub participants: Vec<ParticipantStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationTrackerProof {
    #[serde(flatten)]
    pub validation: ParticipationValidation,
    pub state_proofs: Vec<ParticipationProof>,
    pub proof: String,
}

/// Per-participant exchange tracking.
#[derive(Debug, Clone, Default)]
pub struct ParticipationTracker {
    policy: DeltaPolicy,
    participants: BTreeMap<EntityId, Participant>,
}

impl ParticipationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: DeltaPolicy) -> Self {
        Self {
            policy,
            participants: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn total_records(&self) -> usize {
        self.participants.values().map(|p| p.records.len()).sum()
    }

    #[must_use]
    pub fn is_registered(&self, participant_id: &str) -> bool {
        self.participants.contains_key(participant_id)
    }

    pub fn register(
        &mut self,
        participant_id: impl Into<EntityId>,
        initial_exchange: f64,
    ) -> Result<&ParticipationState, ParticipationError> {
        let participant_id = participant_id.into();
        if self.participants.contains_key(&participant_id) {
            return Err(ParticipationError::AlreadyRegistered(participant_id));
        }
        let state = ParticipationState::new(participant_id.clone(), initial_exchange)?;
        tracing::debug!(participant = %participant_id, initial_exchange, "Registered participant");
        let participant = Participant {
            history: vec![state.snapshot()],
            records: Vec::new(),
            state,
        };
        Ok(&self
            .participants
            .entry(participant_id)
            .or_insert(participant)
            .state)
    }

    pub fn unregister(&mut self, participant_id: &str) -> Option<ParticipationState> {
        self.participants.remove(participant_id).map(|p| p.state)
    }

    #[must_use]
    pub fn state(&self, participant_id: &str) -> Option<&ParticipationState> {
        self.participants.get(participant_id).map(|p| &p.state)
    }

    pub fn states(&self) -> impl Iterator<Item = &ParticipationState> {
        self.participants.values().map(|p| &p.state)
    }

    #[must_use]
    pub fn records(&self, participant_id: &str) -> &[ParticipationRecord] {
        self.participants
            .get(participant_id)
            .map(|p| p.records.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn history(&self, participant_id: &str) -> &[ParticipationSnapshot] {
        self.participants
            .get(participant_id)
            .map(|p| p.history.as_slice())
            .unwrap_or_default()
    }

    pub fn record_participation(
        &mut self,
        participant_id: &str,
        given: f64,
        received: f64,
        kind: ParticipationType,
        description: &str,
    ) -> Result<ParticipationRecord, ParticipationError> {
        self.apply(participant_id, given, received, kind, description, self.policy)
    }

    pub fn record_balanced(
        &mut self,
        participant_id: &str,
        exchange_amount: f64,
        kind: ParticipationType,
        description: &str,
    ) -> Result<ParticipationRecord, ParticipationError> {
        let half = exchange_amount / 2.0;
        self.record_participation(participant_id, half, half, kind, description)
    }

    /// Records an exchange even when it is not 50/50, flagging it on the state.
    pub fn record_asymmetric(
        &mut self,
        participant_id: &str,
        given: f64,
        received: f64,
        kind: ParticipationType,
        description: &str,
    ) -> Result<ParticipationRecord, ParticipationError> {
        self.apply(participant_id, given, received, kind, description, DeltaPolicy::Flag)
    }

    fn apply(
        &mut self,
        participant_id: &str,
        given: f64,
        received: f64,
        kind: ParticipationType,
        description: &str,
        policy: DeltaPolicy,
    ) -> Result<ParticipationRecord, ParticipationError> {
        let participant = self
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| ParticipationError::NotRegistered(EntityId::from(participant_id)))?;
        let record = ParticipationRecord::new(participant_id, given, received, kind, description)?;
        if let Err(err) = participant.state.apply_record(&record, policy) {
            tracing::warn!(participant = %participant_id, error = %err, "Rejected participation record");
            return Err(err);
        }
        participant.records.push(record.clone());
        participant.history.push(participant.state.snapshot());
        Ok(record)
    }

    /// Inactive for unknown participants.
    #[must_use]
    pub fn level(&self, participant_id: &str) -> ParticipationLevel {
        self.state(participant_id)
            .map_or(ParticipationLevel::Inactive, ParticipationState::level)
    }

    /// Dormant for unknown participants.
    #[must_use]
    pub fn engagement_state(&self, participant_id: &str) -> EngagementState {
        self.state(participant_id)
            .map_or(EngagementState::Dormant, ParticipationState::engagement_state)
    }

    pub fn set_engagement_state(
        &mut self,
        participant_id: &str,
        state: EngagementState,
    ) -> Result<(), ParticipationError> {
        let participant = self
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| ParticipationError::NotRegistered(EntityId::from(participant_id)))?;
        participant.state.set_engagement_state(state);
        Ok(())
    }

    #[must_use]
    pub fn validate_all(&self) -> ParticipationValidation {
        let participants: Vec<ParticipantStatus> = self
            .states()
            .map(|state| ParticipantStatus {
                participant_id: state.participant_id().clone(),
                level: state.level(),
                engagement: state.engagement_state(),
                balanced: state.is_balanced(),
            })
            .collect();
        let valid = participants.iter().filter(|p| p.balanced).count();
        let invalid = participants.len() - valid;
        ParticipationValidation {
            tracked_participants: participants.len(),
            total_records: self.total_records(),
            valid,
            invalid,
            all_valid: invalid == 0,
            participants,
        }
    }

    #[must_use]
    pub fn proof(&self) -> ParticipationTrackerProof {
        let validation = self.validate_all();
        let proof = if validation.all_valid {
            "Participation tracker maintains META 50/50 equilibrium"
        } else {
            "Participation tracker has participants violating META 50/50"
        };
        ParticipationTrackerProof {
            state_proofs: self.states().map(ParticipationState::proof).collect(),
            validation,
            proof: proof.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        assert_eq!(ParticipationLevel::for_exchange(0.0), ParticipationLevel::Inactive);
        assert_eq!(ParticipationLevel::for_exchange(9.99), ParticipationLevel::Inactive);
        assert_eq!(ParticipationLevel::for_exchange(10.0), ParticipationLevel::Minimal);
        assert_eq!(ParticipationLevel::for_exchange(199.0), ParticipationLevel::Moderate);
        assert_eq!(ParticipationLevel::for_exchange(200.0), ParticipationLevel::Active);
        assert_eq!(ParticipationLevel::for_exchange(5000.0), ParticipationLevel::Intensive);
    }

    #[test]
    fn record_rejects_negative_values() {
        let err = ParticipationRecord::new("p", -1.0, 0.0, ParticipationType::Consumption, "")
            .unwrap_err();
        assert_eq!(err.to_string(), "Participation values cannot be negative");
    }

    #[test]
    fn empty_state_uses_nominal_operational_split() {
        let state = ParticipationState::new("p", 0.0).unwrap();
        let (s, f) = state.operational_ratio();
        assert!((s - 52.0).abs() < 1e-9 && (f - 48.0).abs() < 1e-9);
        assert_eq!(state.level(), ParticipationLevel::Inactive);
        assert_eq!(state.engagement_state(), EngagementState::Dormant);
    }

    #[test]
    fn engagement_warms_then_peaks() {
        let mut tracker = ParticipationTracker::new();
        tracker.register("p", 0.0).unwrap();
        tracker
            .record_balanced("p", 100.0, ParticipationType::Collaboration, "")
            .unwrap();
        assert_eq!(tracker.engagement_state("p"), EngagementState::Warming);
        tracker
            .record_balanced("p", 20.0, ParticipationType::Contribution, "")
            .unwrap();
        tracker
            .record_balanced("p", 20.0, ParticipationType::Contribution, "")
            .unwrap();
        assert_eq!(tracker.level("p"), ParticipationLevel::Moderate);
        assert_eq!(tracker.engagement_state("p"), EngagementState::Engaged);
        tracker
            .record_balanced("p", 100.0, ParticipationType::Contribution, "")
            .unwrap();
        assert_eq!(tracker.level("p"), ParticipationLevel::Active);
        assert_eq!(tracker.engagement_state("p"), EngagementState::Peak);
        assert_eq!(tracker.history("p").len(), 5);
    }

    #[test]
    fn strict_tracker_rejects_unbalanced_records() {
        let mut tracker = ParticipationTracker::new();
        tracker.register("p", 10.0).unwrap();
        let err = tracker
            .record_participation("p", 8.0, 2.0, ParticipationType::Contribution, "")
            .unwrap_err();
        assert!(matches!(err, ParticipationError::UnbalancedRecord { .. }));
        assert_eq!(tracker.total_records(), 0);
        assert!(tracker.state("p").unwrap().is_balanced());
    }

    #[test]
    fn asymmetric_record_is_flagged() {
        let mut tracker = ParticipationTracker::new();
        tracker.register("p", 10.0).unwrap();
        tracker
            .record_asymmetric("p", 8.0, 2.0, ParticipationType::Facilitation, "")
            .unwrap();
        let state = tracker.state("p").unwrap();
        assert_eq!(state.latest_record_balanced(), Some(false));
        assert!(!tracker.validate_all().all_valid);
        assert_eq!(
            tracker.proof().proof,
            "Participation tracker has participants violating META 50/50"
        );
    }

    #[test]
    fn unknown_participants_get_defaults_and_errors() {
        let mut tracker = ParticipationTracker::new();
        assert_eq!(tracker.level("ghost"), ParticipationLevel::Inactive);
        assert_eq!(tracker.engagement_state("ghost"), EngagementState::Dormant);
        assert!(tracker
            .set_engagement_state("ghost", EngagementState::Cooling)
            .is_err());
        assert!(tracker
            .record_balanced("ghost", 1.0, ParticipationType::Observation, "")
            .is_err());
        tracker.register("p", 0.0).unwrap();
        assert!(tracker.register("p", 0.0).is_err());
        tracker
            .set_engagement_state("p", EngagementState::Cooling)
            .unwrap();
        assert_eq!(tracker.engagement_state("p"), EngagementState::Cooling);
    }
}
