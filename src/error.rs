//! Planner error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Topology has no locations")]
    EmptyTopology,

    #[error("Location {location} has no neighbours")]
    IsolatedLocation { location: String },

    #[error("Unknown location: {location}")]
    UnknownLocation { location: String },

    #[error("Topology is disconnected: {from} cannot reach {to}")]
    DisconnectedTopology { from: String, to: String },

    #[error("Invalid distance {distance} between {from} and {to}")]
    InvalidDistance { from: String, to: String, distance: f64 },

    #[error("Invalid task distribution at {origin}: {reason}")]
    InvalidDistribution { origin: String, reason: String },

    #[error("Reward for {state} / {action} is not finite: {reward}")]
    NonFiniteReward { state: String, action: String, reward: f64 },

    #[error("Transition probabilities for {state} / {action} sum to {sum}")]
    InconsistentModel { state: String, action: String, sum: f64 },

    #[error("Discount factor must be in [0, 1), got {value}")]
    InvalidDiscount { value: f64 },

    #[error("Configuration error: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("State is outside the policy domain: {state}")]
    UnknownState { state: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
