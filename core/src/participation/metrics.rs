use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civhub_types::{Balanced, EntityId, calculate_balance};

use super::tracker::{
    EngagementState, ParticipationLevel, ParticipationProof, ParticipationRecord,
    ParticipationState, ParticipationTracker, ParticipationType,
};

civhub_types::string_enum! {
    /// Ranking key for [`ParticipationMetrics::top_participants`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RankBy: RankBy {
        #[default]
        Exchange => "exchange",
        Records => "records",
        Given => "given",
        Received => "received",
    }
}

impl RankBy {
    fn value_of(self, state: &ParticipationState) -> f64 {
        match self {
            RankBy::Exchange => state.total_exchange(),
            RankBy::Records => state.record_count() as f64,
            RankBy::Given => state.total_given(),
            RankBy::Received => state.total_received(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationMetricValues {
    pub engagement_rate: f64,
    pub exchange_velocity: f64,
    pub balance_stability: f64,
    pub contribution_ratio: f64,
    pub total_records: usize,
    pub snapshots: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub levels_achieved: Vec<ParticipationLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationReport {
    pub participant_id: EntityId,
    pub current_state: ParticipationProof,
    pub metrics: ParticipationMetricValues,
    pub participation_types: BTreeMap<ParticipationType, usize>,
    pub history_summary: ActivitySummary,
}

#[derive(Debug, Clone, Copy)]
pub struct ParticipationMetrics<'a> {
    tracker: &'a ParticipationTracker,
}

impl<'a> ParticipationMetrics<'a> {
    #[must_use]
    pub const fn new(tracker: &'a ParticipationTracker) -> Self {
        Self { tracker }
    }

    /// Records per hour between the first and last record.
    #[must_use]
    pub fn engagement_rate(&self, participant_id: &str) -> f64 {
        let records = self.tracker.records(participant_id);
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return 0.0;
        };
        if records.len() < 2 {
            return 0.0;
        }
        let seconds = (last.timestamp() - first.timestamp()).num_milliseconds() as f64 / 1000.0;
        if seconds == 0.0 {
            return records.len() as f64;
        }
        records.len() as f64 / (seconds / 3600.0)
    }

    /// Mean exchange per record.
    #[must_use]
    pub fn exchange_velocity(&self, participant_id: &str) -> f64 {
        let records = self.tracker.records(participant_id);
        if records.is_empty() {
            return 0.0;
        }
        records
            .iter()
            .map(ParticipationRecord::total_exchange)
            .sum::<f64>()
            / records.len() as f64
    }

    #[must_use]
    pub fn balance_stability(&self, participant_id: &str) -> f64 {
        let Some(state) = self.tracker.state(participant_id) else {
            return 0.0;
        };
        (1.0 - state.deviation() / 50.0).max(0.0)
    }

    /// Share of records that are contributions.
    #[must_use]
    pub fn contribution_ratio(&self, participant_id: &str) -> f64 {
        let records = self.tracker.records(participant_id);
        if records.is_empty() {
            return 0.0;
        }
        let contributions = records
            .iter()
            .filter(|r| r.kind() == ParticipationType::Contribution)
            .count();
        contributions as f64 / records.len() as f64
    }

    #[must_use]
    pub fn level_distribution(&self) -> BTreeMap<ParticipationLevel, usize> {
        let mut distribution: BTreeMap<ParticipationLevel, usize> = ParticipationLevel::all()
            .iter()
            .map(|level| (*level, 0))
            .collect();
        for state in self.tracker.states() {
            *distribution.entry(state.level()).or_default() += 1;
        }
        distribution
    }

    #[must_use]
    pub fn engagement_distribution(&self) -> BTreeMap<EngagementState, usize> {
        let mut distribution: BTreeMap<EngagementState, usize> = EngagementState::all()
            .iter()
            .map(|state| (*state, 0))
            .collect();
        for state in self.tracker.states() {
            *distribution.entry(state.engagement_state()).or_default() += 1;
        }
        distribution
    }

    #[must_use]
    pub fn aggregate_balance(&self) -> (f64, f64) {
        let (given, received) = self.tracker.states().fold((0.0, 0.0), |(g, r), state| {
            (g + state.total_given(), r + state.total_received())
        });
        calculate_balance(given, received)
    }

    /// Highest `n` participants by `by`, ties kept in registration-key order.
    #[must_use]
    pub fn top_participants(&self, n: usize, by: RankBy) -> Vec<(EntityId, f64)> {
        let mut ranked: Vec<(EntityId, f64)> = self
            .tracker
            .states()
            .map(|state| (state.participant_id().clone(), by.value_of(state)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    #[must_use]
    pub fn report(&self, participant_id: &str) -> Option<ParticipationReport> {
        let state = self.tracker.state(participant_id)?;
        let records = self.tracker.records(participant_id);
        let history = self.tracker.history(participant_id);

        let mut participation_types: BTreeMap<ParticipationType, usize> = ParticipationType::all()
            .iter()
            .map(|kind| (*kind, 0))
            .collect();
        for record in records {
            *participation_types.entry(record.kind()).or_default() += 1;
        }

        let mut levels_achieved = Vec::new();
        for snapshot in history {
            if !levels_achieved.contains(&snapshot.level) {
                levels_achieved.push(snapshot.level);
            }
        }

        Some(ParticipationReport {
            participant_id: state.participant_id().clone(),
            current_state: state.proof(),
            metrics: ParticipationMetricValues {
                engagement_rate: self.engagement_rate(participant_id),
                exchange_velocity: self.exchange_velocity(participant_id),
                balance_stability: self.balance_stability(participant_id),
                contribution_ratio: self.contribution_ratio(participant_id),
                total_records: records.len(),
                snapshots: history.len(),
            },
            participation_types,
            history_summary: ActivitySummary {
                first_activity: records.first().map(ParticipationRecord::timestamp),
                last_activity: records.last().map(ParticipationRecord::timestamp),
                levels_achieved,
            },
        })
    }
}
