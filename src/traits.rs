//! Collaborator seams for the planner.
//!
//! The planner only queries these; concrete simulators implement them for
//! their own city and task types.

use std::fmt::Debug;
use std::hash::Hash;

/// Identifier for a location in the topology.
pub trait Id: Clone + Eq + Hash + Debug {}

impl<T> Id for T where T: Clone + Eq + Hash + Debug {}

/// An undirected graph of locations.
pub trait Topology {
    type Location: Id;

    /// All locations, in a stable order. The order drives state enumeration.
    fn locations(&self) -> Vec<Self::Location>;

    /// Whether a road connects `from` and `to` directly.
    fn is_adjacent(&self, from: &Self::Location, to: &Self::Location) -> bool;

    /// Travel distance between two locations (non-negative).
    fn distance(&self, from: &Self::Location, to: &Self::Location) -> f64;
}

/// Closed-form model of where tasks appear and what they pay.
pub trait TaskDistribution {
    type Location: Id;

    /// Probability that a task from `origin` to `destination` is available.
    /// `None` is the "no task" outcome. For a fixed origin, the probabilities
    /// over every destination plus `None` sum to 1.
    fn probability(&self, origin: &Self::Location, destination: Option<&Self::Location>) -> f64;

    /// Expected reward for delivering a task from `origin` to `destination`.
    fn expected_reward(&self, origin: &Self::Location, destination: &Self::Location) -> f64;
}
