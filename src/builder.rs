//! Reward and transition tables.
//!
//! Both tables are indexed by the dense state and action indices of a
//! [`StateSpace`]. Only feasible (state, action) pairs carry entries:
//! `Take` needs an offered task, `Move` needs a road to the destination.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::{PlannerError, PlannerResult};
use crate::model::{Action, State, StateSpace};
use crate::traits::{Id, TaskDistribution, Topology};

/// Allowed deviation from 1 of a transition row sum.
pub const ROW_SUM_TOLERANCE: f64 = 1e-4;

/// Immediate reward per (state, action). `None` marks an infeasible pair.
#[derive(Debug, Clone)]
pub struct RewardTable {
    action_count: usize,
    rewards: Vec<Option<f64>>,
}

impl RewardTable {
    pub fn get(&self, state: usize, action: usize) -> Option<f64> {
        self.rewards[state * self.action_count + action]
    }

    pub fn is_feasible(&self, state: usize, action: usize) -> bool {
        self.get(state, action).is_some()
    }

    pub fn feasible_count(&self) -> usize {
        self.rewards.iter().filter(|reward| reward.is_some()).count()
    }
}

/// Sparse successor distribution per (state, action).
///
/// Each feasible pair owns one row of `(next_state, probability)` covering
/// every state located at the city the action reaches.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    action_count: usize,
    rows: Vec<Option<Vec<(usize, f64)>>>,
}

impl TransitionTable {
    /// Successors of a pair; empty when the pair is infeasible.
    pub fn row(&self, state: usize, action: usize) -> &[(usize, f64)] {
        self.rows[state * self.action_count + action]
            .as_deref()
            .unwrap_or(&[])
    }

    pub fn probability(&self, state: usize, action: usize, next: usize) -> f64 {
        self.row(state, action)
            .iter()
            .find(|(successor, _)| *successor == next)
            .map(|(_, probability)| *probability)
            .unwrap_or(0.0)
    }

    /// Every feasible pair with the sum of its row.
    pub fn row_sums(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows.iter().enumerate().filter_map(|(i, row)| {
            row.as_ref().map(|row| {
                let sum: f64 = row.iter().map(|(_, probability)| probability).sum();
                (i / self.action_count, i % self.action_count, sum)
            })
        })
    }

    pub fn entry_count(&self) -> usize {
        self.rows.iter().flatten().map(Vec::len).sum()
    }
}

/// City reached by `action` from `state` if the pair is feasible.
pub fn feasible_destination<'a, T>(
    topology: &T,
    state: &'a State<T::Location>,
    action: &'a Action<T::Location>,
) -> Option<&'a T::Location>
where
    T: Topology,
{
    let reached = action.reached(state)?;
    match action {
        Action::Take => Some(reached),
        Action::Move(_) => topology
            .is_adjacent(state.location(), reached)
            .then_some(reached),
    }
}

pub fn build_rewards<T, D>(
    space: &StateSpace<T::Location>,
    topology: &T,
    oracle: &D,
    cost_per_km: f64,
) -> RewardTable
where
    T: Topology,
    D: TaskDistribution<Location = T::Location>,
{
    let action_count = space.action_count();
    let mut rewards = Vec::with_capacity(space.state_count() * action_count);

    for state in space.states() {
        for action in space.actions() {
            let from = state.location();
            let reward = feasible_destination(topology, state, action).map(|reached| {
                let travel_cost = topology.distance(from, reached) * cost_per_km;
                match action {
                    Action::Take => oracle.expected_reward(from, reached) - travel_cost,
                    Action::Move(_) => -travel_cost,
                }
            });
            rewards.push(reward);
        }
    }

    RewardTable {
        action_count,
        rewards,
    }
}

pub fn build_transitions<T, D>(
    space: &StateSpace<T::Location>,
    topology: &T,
    oracle: &D,
) -> TransitionTable
where
    T: Topology,
    D: TaskDistribution<Location = T::Location>,
{
    let action_count = space.action_count();
    let mut rows = Vec::with_capacity(space.state_count() * action_count);

    for state in space.states() {
        for action in space.actions() {
            let row = feasible_destination(topology, state, action).map(|reached| {
                space
                    .states_at(reached)
                    .map(|next| {
                        let probability = oracle.probability(reached, space.states()[next].task());
                        (next, probability)
                    })
                    .collect::<Vec<_>>()
            });
            rows.push(row);
        }
    }

    TransitionTable { action_count, rows }
}

/// True when every feasible row sums to 1 within [`ROW_SUM_TOLERANCE`].
pub fn verify(transitions: &TransitionTable) -> bool {
    transitions.row_sums().all(|(_, _, sum)| sums_to_one(sum))
}

fn sums_to_one(sum: f64) -> bool {
    (sum - 1.0).abs() < ROW_SUM_TOLERANCE
}

/// A fully built and verified MDP for one vehicle. [`MdpModel::build`] is
/// the only constructor, so every model handed to the solver has passed
/// [`verify`].
#[derive(Debug, Clone)]
pub struct MdpModel<L: Id> {
    space: Arc<StateSpace<L>>,
    rewards: RewardTable,
    transitions: TransitionTable,
}

impl<L: Id> MdpModel<L> {
    pub fn build<T, D>(topology: &T, oracle: &D, cost_per_km: f64) -> PlannerResult<Self>
    where
        T: Topology<Location = L>,
        D: TaskDistribution<Location = L>,
    {
        if !cost_per_km.is_finite() || cost_per_km < 0.0 {
            return Err(PlannerError::InvalidConfig {
                field: "cost-per-km".to_string(),
                reason: format!("must be a finite non-negative number, got {}", cost_per_km),
            });
        }

        let space = StateSpace::enumerate(topology)?;

        for location in space.locations() {
            let has_neighbour = space
                .locations()
                .iter()
                .any(|other| other != location && topology.is_adjacent(location, other));
            if !has_neighbour {
                return Err(PlannerError::IsolatedLocation {
                    location: format!("{:?}", location),
                });
            }
        }

        let rewards = build_rewards(&space, topology, oracle, cost_per_km);
        for (s, state) in space.states().iter().enumerate() {
            for (a, action) in space.actions().iter().enumerate() {
                if let Some(reward) = rewards.get(s, a) {
                    if !reward.is_finite() {
                        return Err(PlannerError::NonFiniteReward {
                            state: state.to_string(),
                            action: action.to_string(),
                            reward,
                        });
                    }
                }
            }
        }

        let transitions = build_transitions(&space, topology, oracle);
        if !verify(&transitions) {
            let (s, a, sum) = transitions
                .row_sums()
                .find(|(_, _, sum)| !sums_to_one(*sum))
                .unwrap_or((0, 0, f64::NAN));
            let state = space.states()[s].to_string();
            let action = space.actions()[a].to_string();
            error!(%state, %action, sum, "transition probabilities do not sum to 1");
            return Err(PlannerError::InconsistentModel { state, action, sum });
        }

        info!(
            locations = space.locations().len(),
            states = space.state_count(),
            actions = space.action_count(),
            feasible_pairs = rewards.feasible_count(),
            transitions = transitions.entry_count(),
            cost_per_km,
            "built MDP model"
        );

        Ok(Self {
            space: Arc::new(space),
            rewards,
            transitions,
        })
    }

    pub fn space(&self) -> &StateSpace<L> {
        &self.space
    }

    pub(crate) fn shared_space(&self) -> Arc<StateSpace<L>> {
        Arc::clone(&self.space)
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Immediate reward of a pair, `None` when infeasible or unknown.
    pub fn reward(&self, state: &State<L>, action: &Action<L>) -> Option<f64> {
        let s = self.space.state_index(state)?;
        let a = self.space.action_index(action)?;
        self.rewards.get(s, a)
    }
}
