//! Planner configuration.
//!
//! Settings arrive either as JSON or as the flat key/value properties of an
//! agent settings file. Every key is optional.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.95;
pub const DEFAULT_MIN_SWEEPS: usize = 100;
pub const DEFAULT_MAX_SWEEPS: usize = 100_000;
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlannerConfig {
    /// Weight of future reward against immediate reward, in [0, 1).
    pub discount_factor: f64,
    /// Sweeps that always run before convergence is checked.
    pub min_sweeps: usize,
    /// Hard cap on sweeps; reaching it yields an unconverged solution.
    pub max_sweeps: usize,
    /// Convergence threshold on the summed absolute value change of a sweep.
    pub tolerance: f64,
    /// Compute the state backups of a sweep on the rayon pool.
    pub parallel: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            min_sweeps: DEFAULT_MIN_SWEEPS,
            max_sweeps: DEFAULT_MAX_SWEEPS,
            tolerance: DEFAULT_TOLERANCE,
            parallel: false,
        }
    }
}

impl PlannerConfig {
    pub fn with_discount(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_sweeps(mut self, min_sweeps: usize, max_sweeps: usize) -> Self {
        self.min_sweeps = min_sweeps;
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json(json: &str) -> PlannerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read settings from agent properties (`discount-factor`, `min-sweeps`,
    /// `max-sweeps`, `tolerance`, `parallel`). Unknown keys are ignored.
    pub fn from_properties(properties: &HashMap<String, String>) -> PlannerResult<Self> {
        let defaults = Self::default();
        let config = Self {
            discount_factor: read_property(properties, "discount-factor", defaults.discount_factor)?,
            min_sweeps: read_property(properties, "min-sweeps", defaults.min_sweeps)?,
            max_sweeps: read_property(properties, "max-sweeps", defaults.max_sweeps)?,
            tolerance: read_property(properties, "tolerance", defaults.tolerance)?,
            parallel: read_property(properties, "parallel", defaults.parallel)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if !(0.0..1.0).contains(&self.discount_factor) {
            return Err(PlannerError::InvalidDiscount {
                value: self.discount_factor,
            });
        }
        if self.max_sweeps == 0 {
            return Err(PlannerError::InvalidConfig {
                field: "max-sweeps".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_sweeps > self.max_sweeps {
            return Err(PlannerError::InvalidConfig {
                field: "min-sweeps".to_string(),
                reason: format!(
                    "{} exceeds max-sweeps {}",
                    self.min_sweeps, self.max_sweeps
                ),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(PlannerError::InvalidConfig {
                field: "tolerance".to_string(),
                reason: format!("must be a finite non-negative number, got {}", self.tolerance),
            });
        }
        Ok(())
    }
}

fn read_property<T>(properties: &HashMap<String, String>, key: &str, default: T) -> PlannerResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match properties.get(key) {
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| PlannerError::InvalidConfig {
            field: key.to_string(),
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}
