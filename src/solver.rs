//! Value iteration solver.
//!
//! Synchronous Bellman sweeps: every backup of a sweep reads the value
//! function frozen at the end of the previous sweep.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::builder::{MdpModel, RewardTable, TransitionTable};
use crate::config::PlannerConfig;
use crate::error::PlannerResult;
use crate::policy::{Policy, ValueFunction};
use crate::traits::Id;

/// How value iteration ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceReport {
    pub sweeps: usize,
    pub converged: bool,
    /// Summed absolute value change of the last sweep.
    pub final_delta: f64,
    pub delta_history: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Solution<L: Id> {
    pub policy: Policy<L>,
    pub values: ValueFunction<L>,
    pub report: ConvergenceReport,
}

#[instrument(skip_all, fields(states = model.space().state_count(), discount = config.discount_factor))]
pub fn solve<L: Id>(model: &MdpModel<L>, config: &PlannerConfig) -> PlannerResult<Solution<L>> {
    config.validate()?;

    let state_count = model.space().state_count();
    let action_count = model.space().action_count();
    let discount = config.discount_factor;
    let rewards = model.rewards();
    let transitions = model.transitions();

    let mut previous = vec![0.0; state_count];
    let mut best_actions = vec![0; state_count];
    let mut delta_history = Vec::new();
    let mut converged = false;

    for sweep in 1..=config.max_sweeps {
        let backups: Vec<(f64, usize)> = if config.parallel {
            (0..state_count)
                .into_par_iter()
                .map(|s| backup(s, action_count, rewards, transitions, discount, &previous))
                .collect()
        } else {
            (0..state_count)
                .map(|s| backup(s, action_count, rewards, transitions, discount, &previous))
                .collect()
        };
        let (current, actions): (Vec<f64>, Vec<usize>) = backups.into_iter().unzip();

        let delta: f64 = current
            .iter()
            .zip(&previous)
            .map(|(now, before)| (now - before).abs())
            .sum();
        delta_history.push(delta);
        previous = current;
        best_actions = actions;

        if sweep % 10 == 0 {
            debug!(sweep, delta, "value iteration sweep");
        }

        if sweep >= config.min_sweeps && delta <= config.tolerance {
            converged = true;
            break;
        }
    }

    let report = ConvergenceReport {
        sweeps: delta_history.len(),
        converged,
        final_delta: delta_history.last().copied().unwrap_or(0.0),
        delta_history,
    };

    if converged {
        info!(sweeps = report.sweeps, final_delta = report.final_delta, "value iteration converged");
    } else {
        warn!(
            sweeps = report.sweeps,
            final_delta = report.final_delta,
            "value iteration hit the sweep cap; keeping the last policy"
        );
    }

    let space = model.shared_space();
    Ok(Solution {
        policy: Policy::new(space.clone(), best_actions),
        values: ValueFunction::new(space, previous),
        report,
    })
}

/// Best action-value of one state against the previous value function.
/// Ties go to the lowest action index.
fn backup(
    state: usize,
    action_count: usize,
    rewards: &RewardTable,
    transitions: &TransitionTable,
    discount: f64,
    previous: &[f64],
) -> (f64, usize) {
    let mut best_value = f64::NEG_INFINITY;
    let mut best_action = 0;

    for action in 0..action_count {
        let Some(reward) = rewards.get(state, action) else {
            continue;
        };
        let expected: f64 = transitions
            .row(state, action)
            .iter()
            .map(|&(next, probability)| probability * previous[next])
            .sum();
        let q_value = reward + discount * expected;
        if q_value > best_value {
            best_value = q_value;
            best_action = action;
        }
    }

    (best_value, best_action)
}
