use bnf_equiv::{
    Assertion, CoreOutcome, FieldTable, Formula, Grammar, Oracle, OracleError, Production,
    RhsItem, SatOutcome, Terminal, Z3Oracle,
};
use std::time::Duration;

pub fn byte(field: &str) -> RhsItem {
    Terminal::fixed(field, 1).into()
}

/// Start := B[value:len=1] with `assertion` on the byte
pub fn single_value(assertion: Assertion) -> Grammar {
    Grammar::new(vec![Production::conjunction(
        "Start",
        vec![Terminal::fixed("value", 1).with_assertion(assertion).into()],
    )])
    .unwrap()
}

/// Delegates to z3 but gives up on any query mentioning `field`
pub struct GivesUpOn {
    pub field: &'static str,
    pub inner: Z3Oracle,
}

impl GivesUpOn {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            inner: Z3Oracle::new(),
        }
    }
}

impl Oracle for GivesUpOn {
    fn check_sat(
        &self,
        formula: &Formula,
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<SatOutcome, OracleError> {
        if formula.fields().contains(self.field) {
            return Ok(SatOutcome::Unknown("timeout".to_string()));
        }
        self.inner.check_sat(formula, fields, timeout)
    }

    fn unsat_core(
        &self,
        formulas: &[Formula],
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<CoreOutcome, OracleError> {
        self.inner.unsat_core(formulas, fields, timeout)
    }
}

/// An oracle whose backend cannot be reached
pub struct Unavailable;

impl Oracle for Unavailable {
    fn check_sat(
        &self,
        _formula: &Formula,
        _fields: &FieldTable,
        _timeout: Option<Duration>,
    ) -> Result<SatOutcome, OracleError> {
        Err(OracleError::Unavailable("solver not installed".to_string()))
    }

    fn unsat_core(
        &self,
        _formulas: &[Formula],
        _fields: &FieldTable,
        _timeout: Option<Duration>,
    ) -> Result<CoreOutcome, OracleError> {
        Err(OracleError::Unavailable("solver not installed".to_string()))
    }
}
