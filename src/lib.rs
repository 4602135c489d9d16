//! Equivalence checking for annotated binary message grammars.
//!
//! Two grammars are compared by walking them structurally from their start
//! productions. Where the structure agrees, the assertions attached to it are
//! compared as formulas: first syntactically after normalization, then with
//! an SMT oracle. A difference comes back with a concrete witness, an
//! equivalence with the unsat cores that explain it.
//!
//! ```no_run
//! use bnf_equiv::{compare, Grammar, Production, Term, Terminal};
//!
//! let grammar = |bound: i64| {
//!     Grammar::new(vec![Production::conjunction(
//!         "Start",
//!         vec![Terminal::fixed("value", 1)
//!             .with_assertion(Term::field("value").less_than(bound))
//!             .into()],
//!     )])
//! };
//! let verdict = compare(&grammar(10)?, &grammar(5)?)?;
//! assert!(verdict.is_distinct());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assertion;
pub mod equivalence;
pub mod error;
pub mod formula;
pub mod grammar;
pub mod grouper;
pub mod oracle;

pub use assertion::{Assertion, CmpOp, Renames, Term, Witness};
pub use equivalence::{compare, EquivalenceChecker, EquivalenceConfig, Evidence, Verdict, VerdictKind};
pub use error::{EquivalenceError, GrammarError, OracleError};
pub use formula::{assertions_equal, build_formula, production_formula, Comparison, FieldTable, Formula};
pub use grammar::{
    Alternative, ByteSpec, Grammar, GrammarSource, Production, ProductionId, Rhs, RhsItem, Terminal,
};
pub use grouper::{group_alternatives, Shape, ShapeGroup, ShapeMismatch};
pub use oracle::{
    decide_equivalence, CoreOutcome, CountingOracle, Decision, Justification, JustificationKind,
    Oracle, SatOutcome, Side, SolverConfig, Z3Oracle,
};
