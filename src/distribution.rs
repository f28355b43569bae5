//! Tabulated task distribution.
//!
//! Each origin lists the tasks that may appear there with their probability
//! and expected reward. Whatever probability is left over is the chance that
//! no task shows up.

use std::collections::HashMap;

use crate::error::{PlannerError, PlannerResult};
use crate::traits::{Id, TaskDistribution};

/// Slack allowed when an origin's task probabilities add up to slightly over 1.
const PROBABILITY_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TaskOdds {
    probability: f64,
    reward: f64,
}

#[derive(Debug, Clone)]
pub struct TaskTable<L: Id> {
    // Destinations keep insertion order so sums are reproducible.
    tasks: HashMap<L, Vec<(L, TaskOdds)>>,
}

#[derive(Debug, Clone)]
pub struct TaskTableBuilder<L: Id> {
    entries: Vec<(L, L, TaskOdds)>,
}

impl<L: Id> Default for TaskTableBuilder<L> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<L: Id> TaskTableBuilder<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task from `origin` to `destination` appears with `probability` and
    /// pays `reward` on delivery. A later entry for the same pair replaces
    /// an earlier one.
    pub fn task(mut self, origin: L, destination: L, probability: f64, reward: f64) -> Self {
        self.entries.push((origin, destination, TaskOdds { probability, reward }));
        self
    }

    pub fn build(self) -> PlannerResult<TaskTable<L>> {
        let mut tasks: HashMap<L, Vec<(L, TaskOdds)>> = HashMap::new();

        for (origin, destination, odds) in self.entries {
            if origin == destination {
                return Err(invalid(&origin, "task destination equals its origin".to_string()));
            }
            if !(0.0..=1.0).contains(&odds.probability) {
                return Err(invalid(
                    &origin,
                    format!("probability {} outside [0, 1]", odds.probability),
                ));
            }
            if !odds.reward.is_finite() {
                return Err(invalid(&origin, format!("reward {} is not finite", odds.reward)));
            }
            let destinations = tasks.entry(origin).or_default();
            match destinations.iter_mut().find(|(known, _)| *known == destination) {
                Some(entry) => entry.1 = odds,
                None => destinations.push((destination, odds)),
            }
        }

        for (origin, destinations) in &tasks {
            let total: f64 = destinations.iter().map(|(_, odds)| odds.probability).sum();
            if total > 1.0 + PROBABILITY_SLACK {
                return Err(invalid(origin, format!("task probabilities sum to {}", total)));
            }
        }

        Ok(TaskTable { tasks })
    }
}

impl<L: Id> TaskTable<L> {
    pub fn builder() -> TaskTableBuilder<L> {
        TaskTableBuilder::new()
    }

    /// Probability that some task is available at `origin`.
    pub fn task_probability(&self, origin: &L) -> f64 {
        self.tasks
            .get(origin)
            .map(|destinations| destinations.iter().map(|(_, odds)| odds.probability).sum())
            .unwrap_or(0.0)
    }

    fn odds(&self, origin: &L, destination: &L) -> Option<&TaskOdds> {
        self.tasks
            .get(origin)?
            .iter()
            .find(|(known, _)| known == destination)
            .map(|(_, odds)| odds)
    }
}

impl<L: Id> TaskDistribution for TaskTable<L> {
    type Location = L;

    fn probability(&self, origin: &L, destination: Option<&L>) -> f64 {
        match destination {
            Some(destination) => self
                .odds(origin, destination)
                .map(|odds| odds.probability)
                .unwrap_or(0.0),
            None => (1.0 - self.task_probability(origin)).max(0.0),
        }
    }

    fn expected_reward(&self, origin: &L, destination: &L) -> f64 {
        self.odds(origin, destination)
            .map(|odds| odds.reward)
            .unwrap_or(0.0)
    }
}

fn invalid<L: Id>(origin: &L, reason: String) -> PlannerError {
    PlannerError::InvalidDistribution {
        origin: format!("{:?}", origin),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_task_takes_the_remainder() {
        let table = TaskTable::builder()
            .task("a", "b", 0.25, 10.0)
            .task("a", "c", 0.5, 20.0)
            .build()
            .unwrap();
        assert_eq!(table.probability(&"a", Some(&"b")), 0.25);
        assert_eq!(table.probability(&"a", None), 0.25);
        assert_eq!(table.probability(&"b", None), 1.0);
        assert_eq!(table.probability(&"b", Some(&"a")), 0.0);
    }

    #[test]
    fn test_rewards_default_to_zero() {
        let table = TaskTable::builder().task("a", "b", 0.5, 42.0).build().unwrap();
        assert_eq!(table.expected_reward(&"a", &"b"), 42.0);
        assert_eq!(table.expected_reward(&"b", &"a"), 0.0);
    }

    #[test]
    fn test_later_entry_replaces_earlier() {
        let table = TaskTable::builder()
            .task("a", "b", 0.9, 1.0)
            .task("a", "b", 0.3, 2.0)
            .build()
            .unwrap();
        assert_eq!(table.probability(&"a", Some(&"b")), 0.3);
        assert_eq!(table.expected_reward(&"a", &"b"), 2.0);
    }

    #[test]
    fn test_overfull_origin_is_rejected() {
        let err = TaskTable::builder()
            .task("a", "b", 0.7, 1.0)
            .task("a", "c", 0.7, 1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidDistribution { .. }));
    }

    #[test]
    fn test_self_task_is_rejected() {
        let err = TaskTable::builder().task("a", "a", 0.1, 1.0).build().unwrap_err();
        assert!(matches!(err, PlannerError::InvalidDistribution { .. }));
    }
}
