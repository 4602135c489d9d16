//! Error taxonomy for grammar validation, oracle access and comparison

use crate::grammar::ByteSpec;
use thiserror::Error;

/// A grammar that violates the well-formedness invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar has no productions")]
    Empty,

    #[error("production '{0}' is defined more than once")]
    DuplicateProduction(String),

    #[error("production '{production}' references undefined nonterminal '{name}'")]
    UndefinedNonterminal { production: String, name: String },

    #[error("production '{0}' is a disjunction without alternatives")]
    EmptyDisjunction(String),

    #[error("production '{production}' asserts over field '{field}', which no terminal binds")]
    UndeclaredField { production: String, field: String },

    #[error("field '{field}' is bound as both '{first}' and '{second}'")]
    ConflictingField {
        field: String,
        first: ByteSpec,
        second: ByteSpec,
    },

    #[error("field '{field}' has unsupported byte specifier '{spec}'")]
    InvalidWidth { field: String, spec: ByteSpec },

    #[error("could not decode grammar: {0}")]
    Decode(String),
}

/// Failures of the satisfiability backend itself. Timeouts and `unknown`
/// answers are results, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("formula could not be translated for the oracle: {0}")]
    Translation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquivalenceError {
    #[error("malformed grammar: {0}")]
    MalformedGrammar(#[from] GrammarError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// A broken internal invariant, e.g. the grouper and the structural
    /// comparator disagreeing on a shape
    #[error("internal error: {0}")]
    Internal(String),
}
