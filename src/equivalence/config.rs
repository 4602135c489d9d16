//! Configuration for grammar comparison

use crate::grouper::DEFAULT_SHAPE_DEPTH;
use crate::oracle::SolverConfig;
use std::time::Duration;

/// Configuration for a comparison run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceConfig {
    /// Per-query solver settings
    pub solver: SolverConfig,
    /// Threads discharging oracle queries; 1 runs them in order on the caller's thread
    pub workers: usize,
    /// Nonterminal levels unrolled when grouping alternatives by shape
    pub shape_depth: usize,
    /// Extract unsat cores to explain equivalent formulas
    pub justify: bool,
    /// Ask the oracle about alternatives whose shape only one grammar has,
    /// dropping those whose assertions never hold
    pub prune: bool,
}

impl Default for EquivalenceConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            workers: 1,
            shape_depth: DEFAULT_SHAPE_DEPTH,
            justify: true,
            prune: true,
        }
    }
}

impl EquivalenceConfig {
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.solver = SolverConfig::with_timeout(timeout);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.solver = SolverConfig::no_timeout();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// One worker per available CPU
    pub fn parallel(self) -> Self {
        self.with_workers(num_cpus::get())
    }

    pub fn with_shape_depth(mut self, depth: usize) -> Self {
        self.shape_depth = depth;
        self
    }

    pub fn with_justification(mut self, justify: bool) -> Self {
        self.justify = justify;
        self
    }

    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }
}
