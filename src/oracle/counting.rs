//! Oracle wrapper that counts the queries passing through it

use crate::error::OracleError;
use crate::formula::{FieldTable, Formula};
use crate::oracle::{CoreOutcome, Oracle, SatOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Forwards every query to `inner` and records how many were made.
#[derive(Debug, Default)]
pub struct CountingOracle<O> {
    inner: O,
    sat_calls: AtomicUsize,
    core_calls: AtomicUsize,
}

impl<O> CountingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            sat_calls: AtomicUsize::new(0),
            core_calls: AtomicUsize::new(0),
        }
    }

    pub fn sat_calls(&self) -> usize {
        self.sat_calls.load(Ordering::SeqCst)
    }

    pub fn core_calls(&self) -> usize {
        self.core_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.sat_calls() + self.core_calls()
    }

    pub fn reset(&self) {
        self.sat_calls.store(0, Ordering::SeqCst);
        self.core_calls.store(0, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: Oracle> Oracle for CountingOracle<O> {
    fn check_sat(
        &self,
        formula: &Formula,
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<SatOutcome, OracleError> {
        self.sat_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.check_sat(formula, fields, timeout)
    }

    fn unsat_core(
        &self,
        conjuncts: &[Formula],
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<CoreOutcome, OracleError> {
        self.core_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.unsat_core(conjuncts, fields, timeout)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
