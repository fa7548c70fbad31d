use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use civhub_types::{Balanced, EntityId, calculate_balance};

use super::state::{EvolutionDelta, EvolutionPhase, EvolutionProof};
use super::tracker::EvolutionTracker;

pub const DEFAULT_MOMENTUM_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionMetricValues {
    pub velocity: f64,
    pub stability: f64,
    pub momentum: f64,
    pub generations: u64,
    pub snapshots: usize,
    pub deltas_applied: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub first_snapshot: Option<DateTime<Utc>>,
    pub last_snapshot: Option<DateTime<Utc>>,
    pub phases_visited: Vec<EvolutionPhase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionReport {
    pub entity_id: EntityId,
    pub current_state: EvolutionProof,
    pub metrics: EvolutionMetricValues,
    pub history_summary: HistorySummary,
}

/// Read-only statistics over an [`EvolutionTracker`].
#[derive(Debug, Clone, Copy)]
pub struct EvolutionMetrics<'a> {
    tracker: &'a EvolutionTracker,
}

impl<'a> EvolutionMetrics<'a> {
    #[must_use]
    pub const fn new(tracker: &'a EvolutionTracker) -> Self {
        Self { tracker }
    }

    /// Mean delta magnitude per generation.
    #[must_use]
    pub fn velocity(&self, entity_id: &str) -> f64 {
        let deltas = self.tracker.deltas(entity_id);
        if deltas.is_empty() {
            return 0.0;
        }
        deltas.iter().map(EvolutionDelta::total_magnitude).sum::<f64>() / deltas.len() as f64
    }

    /// 1.0 at a perfect 50/50 split, falling to 0.0 at 100/0.
    #[must_use]
    pub fn stability(&self, entity_id: &str) -> f64 {
        let Some(state) = self.tracker.state(entity_id) else {
            return 0.0;
        };
        (1.0 - state.deviation() / 50.0).max(0.0)
    }

    /// Mean net change over the last `window` deltas.
    #[must_use]
    pub fn momentum(&self, entity_id: &str, window: usize) -> f64 {
        let deltas = self.tracker.deltas(entity_id);
        if deltas.is_empty() || window == 0 {
            return 0.0;
        }
        let recent = &deltas[deltas.len().saturating_sub(window)..];
        recent.iter().map(EvolutionDelta::net_change).sum::<f64>() / recent.len() as f64
    }

    #[must_use]
    pub fn phase_distribution(&self) -> BTreeMap<EvolutionPhase, usize> {
        let mut distribution: BTreeMap<EvolutionPhase, usize> =
            EvolutionPhase::all().iter().map(|phase| (*phase, 0)).collect();
        for state in self.tracker.states() {
            *distribution.entry(state.phase()).or_default() += 1;
        }
        distribution
    }

    /// Percentage split of all positive and negative energy combined.
    #[must_use]
    pub fn aggregate_balance(&self) -> (f64, f64) {
        let (positive, negative) = self.tracker.states().fold((0.0, 0.0), |(p, n), state| {
            (p + state.positive_energy(), n + state.negative_energy())
        });
        calculate_balance(positive, negative)
    }

    #[must_use]
    pub fn report(&self, entity_id: &str) -> Option<EvolutionReport> {
        let state = self.tracker.state(entity_id)?;
        let history = self.tracker.history(entity_id);
        let mut phases_visited: Vec<EvolutionPhase> = Vec::new();
        for snapshot in history {
            if !phases_visited.contains(&snapshot.phase) {
                phases_visited.push(snapshot.phase);
            }
        }
        Some(EvolutionReport {
            entity_id: state.entity_id().clone(),
            current_state: state.proof(),
            metrics: EvolutionMetricValues {
                velocity: self.velocity(entity_id),
                stability: self.stability(entity_id),
                momentum: self.momentum(entity_id, DEFAULT_MOMENTUM_WINDOW),
                generations: state.generation(),
                snapshots: history.len(),
                deltas_applied: self.tracker.deltas(entity_id).len(),
            },
            history_summary: HistorySummary {
                first_snapshot: history.first().map(|s| s.timestamp),
                last_snapshot: history.last().map(|s| s.timestamp),
                phases_visited,
            },
        })
    }
}
