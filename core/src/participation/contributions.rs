use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civhub_types::{
    BalanceError, Balanced, ContributionId, EntityId, PoolId, calculate_balance, non_negative,
    verify_meta,
};

use super::ContributionError;
use super::tracker::{ParticipationTracker, ParticipationType};

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ContributionCategory: ContributionCategory {
        Knowledge => "knowledge",
        Resource => "resource",
        Time => "time",
        #[default]
        Effort => "effort",
        Creative => "creative",
        Social => "social",
        Financial => "financial",
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ContributionStatus: ContributionStatus {
        Pending => "pending",
        Partial => "partial",
        Balanced => "balanced",
        Overflow => "overflow",
    }
}

const SETTLED_EPSILON: f64 = 0.001;

fn reciprocation_amount(amount: f64) -> Result<f64, ContributionError> {
    match non_negative("amount", amount) {
        Ok(amount) => Ok(amount),
        Err(BalanceError::Negative { .. }) => Err(ContributionError::NegativeReciprocation),
        Err(_) => Err(ContributionError::NonFiniteAmount),
    }
}

/// A contribution awaiting an equal reciprocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    id: ContributionId,
    contributor_id: EntityId,
    category: ContributionCategory,
    value: f64,
    reciprocated: f64,
    timestamp: DateTime<Utc>,
    description: String,
    tags: Vec<String>,
}

impl Contribution {
    pub fn new(
        contributor_id: impl Into<EntityId>,
        value: f64,
        category: ContributionCategory,
        description: impl Into<String>,
    ) -> Result<Self, ContributionError> {
        if non_negative("value", value).is_err() {
            return Err(ContributionError::NegativeValue);
        }
        Ok(Self {
            id: ContributionId::new(),
            contributor_id: contributor_id.into(),
            category,
            value,
            reciprocated: 0.0,
            timestamp: Utc::now(),
            description: description.into(),
            tags: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ContributionId {
        self.id
    }

    #[must_use]
    pub fn contributor_id(&self) -> &EntityId {
        &self.contributor_id
    }

    #[must_use]
    pub const fn category(&self) -> ContributionCategory {
        self.category
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub const fn reciprocated(&self) -> f64 {
        self.reciprocated
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
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn status(&self) -> ContributionStatus {
        if self.reciprocated == 0.0 {
            ContributionStatus::Pending
        } else if self.reciprocated < self.value {
            ContributionStatus::Partial
        } else if (self.reciprocated - self.value).abs() < SETTLED_EPSILON {
            ContributionStatus::Balanced
        } else {
            ContributionStatus::Overflow
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(
            self.status(),
            ContributionStatus::Pending | ContributionStatus::Partial
        )
    }

    /// Value still owed before the contribution is balanced.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        (self.value - self.reciprocated).max(0.0)
    }

    #[must_use]
    pub fn total_exchange(&self) -> f64 {
        self.value + self.reciprocated
    }

    /// Returns the amount actually applied, capped at [`Self::remaining`].
    pub fn reciprocate(&mut self, amount: f64) -> Result<f64, ContributionError> {
        let amount = reciprocation_amount(amount)?;
        let applied = amount.min(self.remaining());
        self.reciprocated += applied;
        Ok(applied)
    }

    pub fn force_balance(&mut self) {
        self.reciprocated = self.value;
    }
}

impl Balanced for Contribution {
    fn pair(&self) -> (f64, f64) {
        (self.value, self.reciprocated)
    }
}

/// Named group of contributions. Holds ids only; the manager owns the entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionPool {
    id: PoolId,
    name: String,
    category: ContributionCategory,
    description: String,
    created_at: DateTime<Utc>,
    members: Vec<ContributionId>,
}

impl ContributionPool {
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn category(&self) -> ContributionCategory {
        self.category
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn members(&self) -> &[ContributionId] {
        &self.members
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionCounts {
    pub total: usize,
    pub pending: usize,
    pub balanced: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionTotals {
    pub value: f64,
    pub reciprocated: f64,
    pub balance: String,
}

impl ContributionTotals {
    fn of<'a>(contributions: impl Iterator<Item = &'a Contribution>) -> (Self, bool) {
        let (value, reciprocated) = contributions.fold((0.0, 0.0), |(v, r), c| {
            (v + c.value, r + c.reciprocated)
        });
        let (a, b) = calculate_balance(value, reciprocated);
        (
            Self {
                value,
                reciprocated,
                balance: format!("{a:.2}/{b:.2}"),
            },
            verify_meta(value, reciprocated),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolProof {
    pub pool_id: PoolId,
    pub name: String,
    pub category: ContributionCategory,
    pub contributions: ContributionCounts,
    pub values: ContributionTotals,
    pub meta_valid: bool,
    pub proof: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorBalance {
    pub contributor_id: EntityId,
    pub total_contributed: f64,
    pub total_reciprocated: f64,
    pub balance: String,
    pub is_balanced: bool,
    pub contribution_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionValidation {
    pub total_contributions: usize,
    pub balanced_contributions: usize,
    pub pending_contributions: usize,
    pub pools: usize,
    pub totals: ContributionTotals,
    pub system_balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionProof {
    #[serde(flatten)]
    pub validation: ContributionValidation,
    pub pool_proofs: Vec<PoolProof>,
    pub proof: String,
}

/// Owns every contribution and pool, optionally mirroring settled exchanges
/// into a [`ParticipationTracker`].
#[derive(Debug, Clone, Default)]
pub struct ContributionManager {
    tracker: Option<ParticipationTracker>,
    contributions: Vec<Contribution>,
    index: HashMap<ContributionId, usize>,
    pools: Vec<ContributionPool>,
}

impl ContributionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tracker(tracker: ParticipationTracker) -> Self {
        Self {
            tracker: Some(tracker),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn tracker(&self) -> Option<&ParticipationTracker> {
        self.tracker.as_ref()
    }

    pub const fn tracker_mut(&mut self) -> Option<&mut ParticipationTracker> {
        self.tracker.as_mut()
    }

    #[must_use]
    pub fn contribution_count(&self) -> usize {
        self.contributions.len()
    }

    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn contributions(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.iter()
    }

    pub fn create_contribution(
        &mut self,
        contributor_id: impl Into<EntityId>,
        value: f64,
        category: ContributionCategory,
        description: &str,
        tags: &[&str],
        auto_balance: bool,
    ) -> Result<&Contribution, ContributionError> {
        let mut contribution = Contribution::new(contributor_id, value, category, description)?
            .with_tags(tags.iter().map(ToString::to_string).collect());
        if auto_balance {
            contribution.force_balance();
            if let Some(tracker) = self.tracker.as_mut()
                && let Err(err) = tracker.record_balanced(
                    contribution.contributor_id.as_str(),
                    value * 2.0,
                    ParticipationType::Contribution,
                    description,
                )
            {
                tracing::debug!(error = %err, "Skipped participation record for contribution");
            }
        }
        let slot = self.contributions.len();
        self.index.insert(contribution.id, slot);
        self.contributions.push(contribution);
        Ok(&self.contributions[slot])
    }

    #[must_use]
    pub fn contribution(&self, id: ContributionId) -> Option<&Contribution> {
        self.index.get(&id).map(|slot| &self.contributions[*slot])
    }

    fn contribution_mut(&mut self, id: ContributionId) -> Result<&mut Contribution, ContributionError> {
        let slot = *self
            .index
            .get(&id)
            .ok_or(ContributionError::ContributionNotFound(id))?;
        Ok(&mut self.contributions[slot])
    }

    /// Applies up to `amount`. Once the contribution settles, the
    /// reciprocator's side is recorded as a balanced exchange.
    pub fn reciprocate(
        &mut self,
        id: ContributionId,
        amount: f64,
        reciprocator: Option<&str>,
    ) -> Result<f64, ContributionError> {
        let contribution = self.contribution_mut(id)?;
        let applied = contribution.reciprocate(amount)?;
        let settled = contribution.is_balanced();
        if settled
            && let Some(reciprocator) = reciprocator
            && let Some(tracker) = self.tracker.as_mut()
            && let Err(err) = tracker.record_balanced(
                reciprocator,
                applied * 2.0,
                ParticipationType::Contribution,
                &format!("Reciprocation for {id}"),
            )
        {
            tracing::debug!(error = %err, "Skipped participation record for reciprocation");
        }
        Ok(applied)
    }

    pub fn by_contributor<'a>(
        &'a self,
        contributor_id: &'a str,
    ) -> impl Iterator<Item = &'a Contribution> + 'a {
        self.contributions
            .iter()
            .filter(move |c| c.contributor_id.as_str() == contributor_id)
    }

    /// Pending and partially reciprocated contributions.
    pub fn pending(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.iter().filter(|c| c.is_open())
    }

    pub fn balanced(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.status() == ContributionStatus::Balanced)
    }

    pub fn create_pool(
        &mut self,
        name: impl Into<String>,
        category: ContributionCategory,
        description: impl Into<String>,
    ) -> &ContributionPool {
        let slot = self.pools.len();
        self.pools.push(ContributionPool {
            id: PoolId::new(),
            name: name.into(),
            category,
            description: description.into(),
            created_at: Utc::now(),
            members: Vec::new(),
        });
        &self.pools[slot]
    }

    #[must_use]
    pub fn pool(&self, pool_id: PoolId) -> Option<&ContributionPool> {
        self.pools.iter().find(|p| p.id == pool_id)
    }

    pub fn pools(&self) -> impl Iterator<Item = &ContributionPool> {
        self.pools.iter()
    }

    pub fn add_to_pool(
        &mut self,
        pool_id: PoolId,
        contribution_id: ContributionId,
    ) -> Result<(), ContributionError> {
        if !self.index.contains_key(&contribution_id) {
            return Err(ContributionError::ContributionNotFound(contribution_id));
        }
        let pool = self
            .pools
            .iter_mut()
            .find(|p| p.id == pool_id)
            .ok_or(ContributionError::PoolNotFound(pool_id))?;
        if !pool.members.contains(&contribution_id) {
            pool.members.push(contribution_id);
        }
        Ok(())
    }

    fn pool_members<'a>(
        &'a self,
        pool: &'a ContributionPool,
    ) -> impl Iterator<Item = &'a Contribution> + 'a {
        pool.members.iter().filter_map(|id| self.contribution(*id))
    }

    /// Spreads `amount` over the pool's open contributions in proportion to
    /// what each still owes. Pending entries are served before partial ones.
    pub fn distribute_reciprocation(
        &mut self,
        pool_id: PoolId,
        amount: f64,
    ) -> Result<Vec<(ContributionId, f64)>, ContributionError> {
        let amount = reciprocation_amount(amount)?;
        let pool = self
            .pool(pool_id)
            .ok_or(ContributionError::PoolNotFound(pool_id))?;
        let mut open: Vec<(ContributionId, f64)> = Vec::new();
        for wanted in [ContributionStatus::Pending, ContributionStatus::Partial] {
            open.extend(
                self.pool_members(pool)
                    .filter(|c| c.status() == wanted)
                    .map(|c| (c.id, c.remaining())),
            );
        }
        let total_remaining: f64 = open.iter().map(|(_, remaining)| remaining).sum();
        if total_remaining == 0.0 {
            return Ok(Vec::new());
        }

        let mut distribution = Vec::new();
        let mut left = amount;
        for (id, remaining) in open {
            if left <= 0.0 {
                break;
            }
            let share = amount * (remaining / total_remaining);
            let applied = self
                .contribution_mut(id)?
                .reciprocate(remaining.min(share).min(left))?;
            distribution.push((id, applied));
            left -= applied;
        }
        Ok(distribution)
    }

    #[must_use]
    pub fn pool_proof(&self, pool_id: PoolId) -> Option<PoolProof> {
        let pool = self.pool(pool_id)?;
        let members: Vec<&Contribution> = self.pool_members(pool).collect();
        let (values, meta_valid) = ContributionTotals::of(members.iter().copied());
        Some(PoolProof {
            pool_id: pool.id,
            name: pool.name.clone(),
            category: pool.category,
            contributions: ContributionCounts {
                total: members.len(),
                pending: members
                    .iter()
                    .filter(|c| c.status() == ContributionStatus::Pending)
                    .count(),
                balanced: members
                    .iter()
                    .filter(|c| c.status() == ContributionStatus::Balanced)
                    .count(),
            },
            values,
            meta_valid,
            proof: if meta_valid {
                "Contribution pool maintains META 50/50 equilibrium".to_string()
            } else {
                "Contribution pool is not yet balanced".to_string()
            },
        })
    }

    #[must_use]
    pub fn contributor_balance(&self, contributor_id: &str) -> ContributorBalance {
        let contributions: Vec<&Contribution> = self.by_contributor(contributor_id).collect();
        let (totals, is_balanced) = ContributionTotals::of(contributions.iter().copied());
        ContributorBalance {
            contributor_id: EntityId::from(contributor_id),
            total_contributed: totals.value,
            total_reciprocated: totals.reciprocated,
            balance: totals.balance,
            is_balanced,
            contribution_count: contributions.len(),
            pending_count: contributions
                .iter()
                .filter(|c| c.status() != ContributionStatus::Balanced)
                .count(),
        }
    }

    #[must_use]
    pub fn validate_all(&self) -> ContributionValidation {
        let (totals, system_balanced) = ContributionTotals::of(self.contributions.iter());
        ContributionValidation {
            total_contributions: self.contributions.len(),
            balanced_contributions: self.balanced().count(),
            pending_contributions: self.pending().count(),
            pools: self.pools.len(),
            totals,
            system_balanced,
        }
    }

    #[must_use]
    pub fn proof(&self) -> ContributionProof {
        let validation = self.validate_all();
        let proof = if validation.system_balanced {
            "Contribution system maintains META 50/50 equilibrium"
        } else {
            "Contribution system is not yet balanced"
        };
        ContributionProof {
            pool_proofs: self
                .pools
                .iter()
                .filter_map(|p| self.pool_proof(p.id))
                .collect(),
            validation,
            proof: proof.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorPlan {
    pub contributor_id: EntityId,
    pub pending_contributions: usize,
    pub deficit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePlan {
    pub total_pending: usize,
    pub total_deficit: f64,
    pub contributors_affected: usize,
    pub contributor_plans: Vec<ContributorPlan>,
    pub action_required: bool,
}

/// Suggests and applies reciprocations on top of a [`ContributionManager`].
#[derive(Debug)]
pub struct ContributionMatcher<'a> {
    manager: &'a mut ContributionManager,
}

impl<'a> ContributionMatcher<'a> {
    pub const fn new(manager: &'a mut ContributionManager) -> Self {
        Self { manager }
    }

    /// Splits what remains equally among `reciprocators`.
    #[must_use]
    pub fn find_matches(
        contribution: &Contribution,
        reciprocators: &[EntityId],
    ) -> Vec<(EntityId, f64)> {
        if contribution.is_balanced() || reciprocators.is_empty() {
            return Vec::new();
        }
        let share = contribution.remaining() / reciprocators.len() as f64;
        reciprocators.iter().map(|id| (id.clone(), share)).collect()
    }

    pub fn auto_balance_contribution(&mut self, id: ContributionId) -> bool {
        match self.manager.contribution_mut(id) {
            Ok(contribution) => {
                contribution.force_balance();
                true
            }
            Err(_) => false,
        }
    }

    /// Returns how many open contributions were settled.
    pub fn balance_all_pending(&mut self) -> usize {
        let mut settled = 0;
        for contribution in &mut self.manager.contributions {
            if contribution.is_open() {
                contribution.force_balance();
                settled += 1;
            }
        }
        settled
    }

    #[must_use]
    pub fn system_deficit(&self) -> f64 {
        self.manager.pending().map(Contribution::remaining).sum()
    }

    #[must_use]
    pub fn balance_plan(&self) -> BalancePlan {
        let mut contributor_plans: Vec<ContributorPlan> = Vec::new();
        let mut total_pending = 0;
        for contribution in self.manager.pending() {
            total_pending += 1;
            let slot = match contributor_plans
                .iter()
                .position(|p| p.contributor_id == contribution.contributor_id)
            {
                Some(slot) => slot,
                None => {
                    contributor_plans.push(ContributorPlan {
                        contributor_id: contribution.contributor_id.clone(),
                        pending_contributions: 0,
                        deficit: 0.0,
                    });
                    contributor_plans.len() - 1
                }
            };
            let plan = &mut contributor_plans[slot];
            plan.pending_contributions += 1;
            plan.deficit += contribution.remaining();
        }
        let total_deficit = self.system_deficit();
        BalancePlan {
            total_pending,
            total_deficit,
            contributors_affected: contributor_plans.len(),
            contributor_plans,
            action_required: total_deficit > 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_from_pending_to_balanced() {
        let mut c = Contribution::new("a", 10.0, ContributionCategory::Time, "").unwrap();
        assert_eq!(c.status(), ContributionStatus::Pending);
        assert!((c.reciprocate(4.0).unwrap() - 4.0).abs() < f64::EPSILON);
        assert_eq!(c.status(), ContributionStatus::Partial);
        assert!((c.reciprocate(100.0).unwrap() - 6.0).abs() < 1e-12);
        assert_eq!(c.status(), ContributionStatus::Balanced);
        assert!(c.is_balanced());
        assert!(c.remaining().abs() < f64::EPSILON);
        assert_eq!(
            c.reciprocate(-1.0).unwrap_err().to_string(),
            "Reciprocation amount cannot be negative"
        );
    }

    #[test]
    fn negative_value_is_rejected() {
        assert!(Contribution::new("a", -1.0, ContributionCategory::Effort, "").is_err());
    }

    #[test]
    fn auto_balance_records_participation() {
        let mut tracker = ParticipationTracker::new();
        tracker.register("alice", 0.0).unwrap();
        let mut manager = ContributionManager::with_tracker(tracker);
        manager
            .create_contribution("alice", 25.0, ContributionCategory::Knowledge, "notes", &[], true)
            .unwrap();
        manager
            .create_contribution("nobody", 5.0, ContributionCategory::Knowledge, "", &[], true)
            .unwrap();
        let state = manager.tracker().unwrap().state("alice").unwrap();
        assert!((state.total_exchange() - 50.0).abs() < 1e-12);
        assert_eq!(manager.balanced().count(), 2);
    }

    #[test]
    fn reciprocation_records_for_reciprocator_once_settled() {
        let mut tracker = ParticipationTracker::new();
        tracker.register("bob", 0.0).unwrap();
        let mut manager = ContributionManager::with_tracker(tracker);
        let id = manager
            .create_contribution("alice", 10.0, ContributionCategory::Effort, "", &[], false)
            .unwrap()
            .id();
        manager.reciprocate(id, 4.0, Some("bob")).unwrap();
        assert_eq!(manager.tracker().unwrap().total_records(), 0);
        manager.reciprocate(id, 6.0, Some("bob")).unwrap();
        assert_eq!(manager.tracker().unwrap().total_records(), 1);
        assert!(manager.reciprocate(ContributionId::new(), 1.0, None).is_err());
    }

    #[test]
    fn pool_distribution_is_proportional() {
        let mut manager = ContributionManager::new();
        let pool = manager
            .create_pool("garden", ContributionCategory::Effort, "")
            .id();
        let a = manager
            .create_contribution("a", 30.0, ContributionCategory::Effort, "", &[], false)
            .unwrap()
            .id();
        let b = manager
            .create_contribution("b", 10.0, ContributionCategory::Effort, "", &[], false)
            .unwrap()
            .id();
        manager.add_to_pool(pool, a).unwrap();
        manager.add_to_pool(pool, b).unwrap();

        let applied = manager.distribute_reciprocation(pool, 20.0).unwrap();
        assert_eq!(applied.len(), 2);
        assert!((applied[0].1 - 15.0).abs() < 1e-9);
        assert!((applied[1].1 - 5.0).abs() < 1e-9);

        let proof = manager.pool_proof(pool).unwrap();
        assert!(!proof.meta_valid);
        assert_eq!(proof.contributions.total, 2);
        assert_eq!(proof.proof, "Contribution pool is not yet balanced");
        assert!(manager.add_to_pool(PoolId::new(), a).is_err());
    }

    #[test]
    fn pool_rejects_non_finite_amounts() {
        let mut manager = ContributionManager::new();
        let pool = manager
            .create_pool("library", ContributionCategory::Knowledge, "")
            .id();
        let id = manager
            .create_contribution("a", 12.0, ContributionCategory::Knowledge, "", &[], false)
            .unwrap()
            .id();
        manager.add_to_pool(pool, id).unwrap();

        for amount in [f64::NAN, f64::INFINITY] {
            assert_eq!(
                manager.distribute_reciprocation(pool, amount),
                Err(ContributionError::NonFiniteAmount)
            );
        }
        assert_eq!(
            manager.distribute_reciprocation(pool, -1.0),
            Err(ContributionError::NegativeReciprocation)
        );
        assert_eq!(
            manager.reciprocate(id, f64::NAN, None),
            Err(ContributionError::NonFiniteAmount)
        );
        assert!(manager.contribution(id).unwrap().reciprocated().abs() < f64::EPSILON);
    }

    #[test]
    fn pool_membership_and_tags() {
        let mut manager = ContributionManager::new();
        let pool = manager
            .create_pool("workshop", ContributionCategory::Creative, "")
            .id();
        let id = manager
            .create_contribution(
                "a",
                8.0,
                ContributionCategory::Creative,
                "mural",
                &["art", "public"],
                false,
            )
            .unwrap()
            .id();
        assert_eq!(manager.contribution(id).unwrap().tags(), ["art", "public"]);

        manager.add_to_pool(pool, id).unwrap();
        manager.add_to_pool(pool, id).unwrap();
        assert_eq!(manager.pool(pool).unwrap().members(), [id]);

        let applied = manager.distribute_reciprocation(pool, 8.0).unwrap();
        assert_eq!(applied, [(id, 8.0)]);
    }

    #[test]
    fn matcher_plans_and_settles() {
        let mut manager = ContributionManager::new();
        let first = manager
            .create_contribution("a", 10.0, ContributionCategory::Social, "", &[], false)
            .unwrap()
            .clone();
        manager
            .create_contribution("a", 6.0, ContributionCategory::Social, "", &[], false)
            .unwrap();
        manager
            .create_contribution("b", 4.0, ContributionCategory::Social, "", &[], false)
            .unwrap();

        let matches = ContributionMatcher::find_matches(
            &first,
            &[EntityId::from("x"), EntityId::from("y")],
        );
        assert_eq!(matches.len(), 2);
        assert!((matches[0].1 - 5.0).abs() < 1e-12);

        let mut matcher = ContributionMatcher::new(&mut manager);
        let plan = matcher.balance_plan();
        assert_eq!(plan.total_pending, 3);
        assert_eq!(plan.contributors_affected, 2);
        assert!((plan.contributor_plans[0].deficit - 16.0).abs() < 1e-12);
        assert!(plan.action_required);

        assert!(matcher.auto_balance_contribution(first.id()));
        assert!(!matcher.auto_balance_contribution(ContributionId::new()));
        assert_eq!(matcher.balance_all_pending(), 2);
        assert!(matcher.system_deficit().abs() < f64::EPSILON);
        assert!(manager.proof().validation.system_balanced);
    }

    #[test]
    fn contributor_balance_for_unknown_is_even() {
        let manager = ContributionManager::new();
        let balance = manager.contributor_balance("ghost");
        assert!(balance.is_balanced);
        assert_eq!(balance.balance, "50.00/50.00");
        assert_eq!(balance.contribution_count, 0);
    }
}
