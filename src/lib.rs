//! reactive-planner core
//!
//! Offline MDP planning for a single reactive delivery vehicle: enumerate the
//! state space of a topology, build reward and transition tables from a task
//! distribution, solve them with value iteration and serve the frozen policy.

pub mod traits;
pub mod error;
pub mod config;
pub mod topology;
pub mod haversine;
pub mod distribution;
pub mod model;
pub mod builder;
pub mod solver;
pub mod policy;
pub mod agent;
