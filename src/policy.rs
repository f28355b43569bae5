//! Frozen policy and decision-time execution.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::builder::MdpModel;
use crate::error::{PlannerError, PlannerResult};
use crate::model::{Action, State, StateSpace};
use crate::traits::Id;

/// Best action per state, as produced by value iteration.
#[derive(Debug, Clone)]
pub struct Policy<L: Id> {
    space: Arc<StateSpace<L>>,
    best_actions: Vec<usize>,
}

impl<L: Id> Policy<L> {
    pub(crate) fn new(space: Arc<StateSpace<L>>, best_actions: Vec<usize>) -> Self {
        debug_assert_eq!(space.state_count(), best_actions.len());
        Self { space, best_actions }
    }

    pub fn best_action(&self, state: &State<L>) -> Option<&Action<L>> {
        let s = self.space.state_index(state)?;
        Some(&self.space.actions()[self.best_actions[s]])
    }

    pub fn best_action_indices(&self) -> &[usize] {
        &self.best_actions
    }

    pub fn iter(&self) -> impl Iterator<Item = (&State<L>, &Action<L>)> + '_ {
        self.space
            .states()
            .iter()
            .zip(&self.best_actions)
            .map(move |(state, &a)| (state, &self.space.actions()[a]))
    }

    pub fn len(&self) -> usize {
        self.best_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_actions.is_empty()
    }
}

/// Expected discounted return per state.
#[derive(Debug, Clone)]
pub struct ValueFunction<L: Id> {
    space: Arc<StateSpace<L>>,
    values: Vec<f64>,
}

impl<L: Id> ValueFunction<L> {
    pub(crate) fn new(space: Arc<StateSpace<L>>, values: Vec<f64>) -> Self {
        debug_assert_eq!(space.state_count(), values.len());
        Self { space, values }
    }

    pub fn get(&self, state: &State<L>) -> Option<f64> {
        self.space.state_index(state).map(|s| self.values[s])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// A task the policy never accepts, with the immediate reward it would pay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclinedTask<L> {
    pub from: L,
    pub to: L,
    pub reward: f64,
}

/// Operator-facing summary of a policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDiagnostics<L> {
    /// Where the vehicle heads from each city when no task is on offer.
    pub preferred_moves: Vec<(L, L)>,
    pub declined_tasks: Vec<DeclinedTask<L>>,
}

impl<L: Id> PolicyDiagnostics<L> {
    pub fn collect(model: &MdpModel<L>, policy: &Policy<L>) -> Self {
        let mut preferred_moves = Vec::new();
        let mut declined_tasks = Vec::new();

        for (state, action) in policy.iter() {
            match (state, action) {
                (State::Idle { from }, Action::Move(dest)) => {
                    preferred_moves.push((from.clone(), dest.clone()));
                }
                (State::Carrying { from, to }, Action::Move(_)) => {
                    let reward = model.reward(state, &Action::Take).unwrap_or(f64::NAN);
                    declined_tasks.push(DeclinedTask {
                        from: from.clone(),
                        to: to.clone(),
                        reward,
                    });
                }
                _ => {}
            }
        }

        Self {
            preferred_moves,
            declined_tasks,
        }
    }

    pub fn log(&self) {
        for (from, dest) in &self.preferred_moves {
            info!(from = ?from, to = ?dest, "preferred move without task");
        }
        for task in &self.declined_tasks {
            info!(from = ?task.from, to = ?task.to, reward = task.reward, "task always declined");
        }
    }
}

/// A task offered to the vehicle at decision time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedTask<L> {
    pub pickup: L,
    pub delivery: L,
}

impl<L> ObservedTask<L> {
    pub fn new(pickup: L, delivery: L) -> Self {
        Self { pickup, delivery }
    }
}

/// Serves decisions from a frozen policy.
#[derive(Debug, Clone)]
pub struct PolicyExecutor<L: Id> {
    policy: Policy<L>,
    decisions: u64,
    total_profit: f64,
}

impl<L: Id> PolicyExecutor<L> {
    pub fn new(policy: Policy<L>) -> Self {
        Self {
            policy,
            decisions: 0,
            total_profit: 0.0,
        }
    }

    pub fn policy(&self) -> &Policy<L> {
        &self.policy
    }

    /// State observed by the vehicle. An offered task determines the state on
    /// its own; otherwise the vehicle is idle where it stands.
    pub fn state_for(&self, current: &L, task: Option<&ObservedTask<L>>) -> State<L> {
        match task {
            Some(task) => State::Carrying {
                from: task.pickup.clone(),
                to: task.delivery.clone(),
            },
            None => State::Idle {
                from: current.clone(),
            },
        }
    }

    pub fn act(&mut self, current: &L, task: Option<&ObservedTask<L>>) -> PlannerResult<Action<L>> {
        let state = self.state_for(current, task);
        let action = match self.policy.best_action(&state) {
            Some(action) => action.clone(),
            None => {
                error!(%state, "no precomputed action for observed state");
                return Err(PlannerError::UnknownState {
                    state: state.to_string(),
                });
            }
        };

        if self.decisions >= 1 {
            debug!(
                decisions = self.decisions,
                total_profit = self.total_profit,
                average_profit = self.total_profit / self.decisions as f64,
                "running profit"
            );
        }
        self.decisions += 1;

        Ok(action)
    }

    /// Record the cumulative profit reported by the host.
    pub fn record_profit(&mut self, total_profit: f64) {
        self.total_profit = total_profit;
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    pub fn total_profit(&self) -> f64 {
        self.total_profit
    }

    pub fn average_profit(&self) -> Option<f64> {
        (self.decisions > 0).then(|| self.total_profit / self.decisions as f64)
    }
}
