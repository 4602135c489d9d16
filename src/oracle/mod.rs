//! Satisfiability oracle interface and adapters
//!
//! The comparison core only needs two capabilities from a solver: checking a
//! formula for satisfiability (with a model when it is satisfiable) and
//! extracting a minimal unsatisfiable subset of a list of conjuncts. Any
//! backend implementing [`Oracle`] can be substituted; [`Z3Oracle`] is the
//! default one.

pub mod counting;
pub mod decide;
pub mod solver;

use crate::assertion::Witness;
use crate::error::OracleError;
use crate::formula::{FieldTable, Formula};
use std::time::Duration;

pub use counting::CountingOracle;
pub use decide::{decide_equivalence, Decision, Justification, JustificationKind, Side};
pub use solver::{SolverConfig, Z3Oracle};

/// Answer to a satisfiability query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatOutcome {
    /// Satisfiable, with a value for every field of the query's table
    Sat(Witness),
    Unsat,
    /// Timeout or an undecidable fragment
    Unknown(String),
}

/// Answer to an unsat-core query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreOutcome {
    /// Indices of a minimal unsatisfiable subset of the conjuncts, ascending
    Core(Vec<usize>),
    /// The conjunction is satisfiable, so there is no core
    Satisfiable,
    Unknown(String),
}

/// A satisfiability backend.
///
/// Every variable of a query is a field of `fields` and ranges over that
/// field's domain. Implementations must be usable from several threads at
/// once; each call is independent.
pub trait Oracle: Send + Sync {
    fn check_sat(
        &self,
        formula: &Formula,
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<SatOutcome, OracleError>;

    fn unsat_core(
        &self,
        conjuncts: &[Formula],
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<CoreOutcome, OracleError>;

    /// Backend name for log messages
    fn name(&self) -> &str {
        "oracle"
    }
}
