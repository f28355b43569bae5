//! One-shot setup of a reactive vehicle.
//!
//! Validates the configuration, builds and verifies the MDP, solves it and
//! hands back an executor over the frozen policy. Any failure aborts setup.

use tracing::info;

use crate::builder::MdpModel;
use crate::config::PlannerConfig;
use crate::error::PlannerResult;
use crate::model::Action;
use crate::policy::{ObservedTask, PolicyDiagnostics, PolicyExecutor, ValueFunction};
use crate::solver::{solve, ConvergenceReport};
use crate::traits::{Id, TaskDistribution, Topology};

#[derive(Debug, Clone)]
pub struct ReactiveAgent<L: Id> {
    executor: PolicyExecutor<L>,
    values: ValueFunction<L>,
    report: ConvergenceReport,
    diagnostics: PolicyDiagnostics<L>,
}

impl<L: Id> ReactiveAgent<L> {
    pub fn setup<T, D>(
        topology: &T,
        oracle: &D,
        cost_per_km: f64,
        config: &PlannerConfig,
    ) -> PlannerResult<Self>
    where
        T: Topology<Location = L>,
        D: TaskDistribution<Location = L>,
    {
        config.validate()?;
        info!(
            discount = config.discount_factor,
            cost_per_km, "setting up reactive agent"
        );

        let model = MdpModel::build(topology, oracle, cost_per_km)?;
        let solution = solve(&model, config)?;

        let diagnostics = PolicyDiagnostics::collect(&model, &solution.policy);
        diagnostics.log();

        Ok(Self {
            executor: PolicyExecutor::new(solution.policy),
            values: solution.values,
            report: solution.report,
            diagnostics,
        })
    }

    pub fn act(&mut self, current: &L, task: Option<&ObservedTask<L>>) -> PlannerResult<Action<L>> {
        self.executor.act(current, task)
    }

    pub fn executor(&self) -> &PolicyExecutor<L> {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut PolicyExecutor<L> {
        &mut self.executor
    }

    pub fn values(&self) -> &ValueFunction<L> {
        &self.values
    }

    pub fn report(&self) -> &ConvergenceReport {
        &self.report
    }

    pub fn diagnostics(&self) -> &PolicyDiagnostics<L> {
        &self.diagnostics
    }
}
