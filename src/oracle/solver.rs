//! Z3-backed oracle

use crate::assertion::{Assertion, CmpOp, Term, Witness};
use crate::error::OracleError;
use crate::formula::{FieldTable, Formula};
use crate::oracle::{CoreOutcome, Oracle, SatOutcome};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::time::Duration;
use z3::ast::{Bool, Int};
use z3::{Params, SatResult, Solver};

/// Configuration for the SMT solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Timeout for each SMT query (None means no timeout)
    pub timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SolverConfig {
    /// Create a config with no timeout
    pub fn no_timeout() -> Self {
        Self { timeout: None }
    }

    /// Create a config with a specific timeout in seconds
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Some(Duration::from_secs(secs)),
        }
    }

    /// Create a config with a specific timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Create a Z3 solver, applying `timeout` if one is given
pub fn create_solver(timeout: Option<Duration>) -> Solver {
    let solver = Solver::new();
    if let Some(timeout) = timeout {
        let mut params = Params::new();
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        params.set_u32("timeout", millis.max(1));
        solver.set_params(&params);
    }
    solver
}

/// Oracle running queries on an in-process Z3 solver.
///
/// Fields become integer constants bounded by their byte specifier's domain,
/// so `value < 10` and `value <= 9` are recognized as the same constraint.
#[derive(Debug, Clone, Default)]
pub struct Z3Oracle {
    config: SolverConfig,
}

impl Z3Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config.timeout` for calls that do not carry their own
    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    fn effective_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        timeout.or(self.config.timeout)
    }
}

/// Translates formulas over one field table into Z3 terms
struct Translator {
    vars: BTreeMap<String, Int>,
}

impl Translator {
    fn new(fields: &FieldTable) -> Self {
        let vars = fields
            .keys()
            .map(|name| (name.clone(), Int::new_const(name.as_str())))
            .collect();
        Self { vars }
    }

    /// Domain constraints for every field of the table
    fn domains(&self, fields: &FieldTable) -> Vec<Bool> {
        let zero = Int::from_u64(0);
        fields
            .iter()
            .filter_map(|(name, spec)| {
                let var = self.vars.get(name)?;
                let max = Int::from_u64(spec.max_value());
                Some(var.ge(&zero) & var.le(&max))
            })
            .collect()
    }

    fn term(&self, term: &Term) -> Result<Int, OracleError> {
        Ok(match term {
            Term::Field(name) => self.vars.get(name).cloned().ok_or_else(|| {
                OracleError::Translation(format!("field '{}' has no domain", name))
            })?,
            Term::Const(value) => Int::from_i64(*value),
            Term::Add(a, b) => Int::add(&[&self.term(a)?, &self.term(b)?]),
            Term::Sub(a, b) => Int::sub(&[&self.term(a)?, &self.term(b)?]),
            Term::Mul(a, b) => Int::mul(&[&self.term(a)?, &self.term(b)?]),
            Term::Mod(a, n) => {
                if *n == 0 {
                    return Err(OracleError::Translation(format!(
                        "remainder by zero in '{}'",
                        term
                    )));
                }
                self.term(a)?.modulo(&Int::from_i64(*n))
            }
        })
    }

    fn assertion(&self, assertion: &Assertion) -> Result<Bool, OracleError> {
        Ok(match assertion {
            Assertion::Compare { op, lhs, rhs } => {
                let lhs = self.term(lhs)?;
                let rhs = self.term(rhs)?;
                match op {
                    CmpOp::Eq => lhs.eq(&rhs),
                    CmpOp::Ne => lhs.eq(&rhs).not(),
                    CmpOp::Lt => lhs.lt(&rhs),
                    CmpOp::Le => lhs.le(&rhs),
                    CmpOp::Gt => lhs.gt(&rhs),
                    CmpOp::Ge => lhs.ge(&rhs),
                }
            }
            Assertion::Range { term, low, high } => {
                let value = self.term(term)?;
                value.ge(&Int::from_i64(*low)) & value.le(&Int::from_i64(*high))
            }
            Assertion::Not(inner) => self.assertion(inner)?.not(),
            Assertion::All(parts) => {
                let parts = parts
                    .iter()
                    .map(|p| self.assertion(p))
                    .collect::<Result<Vec<_>, _>>()?;
                conjunction(&parts)
            }
            Assertion::Any(parts) => {
                let parts = parts
                    .iter()
                    .map(|p| self.assertion(p))
                    .collect::<Result<Vec<_>, _>>()?;
                disjunction(&parts)
            }
        })
    }

    fn formula(&self, formula: &Formula) -> Result<Bool, OracleError> {
        Ok(match formula {
            Formula::True => Bool::from_bool(true),
            Formula::False => Bool::from_bool(false),
            Formula::Atom(a) => self.assertion(a)?,
            Formula::Not(inner) => self.formula(inner)?.not(),
            Formula::And(parts) => {
                let parts = parts
                    .iter()
                    .map(|p| self.formula(p))
                    .collect::<Result<Vec<_>, _>>()?;
                conjunction(&parts)
            }
            Formula::Or(parts) => {
                let parts = parts
                    .iter()
                    .map(|p| self.formula(p))
                    .collect::<Result<Vec<_>, _>>()?;
                disjunction(&parts)
            }
        })
    }
}

fn conjunction(parts: &[Bool]) -> Bool {
    if parts.is_empty() {
        return Bool::from_bool(true);
    }
    let refs: Vec<&Bool> = parts.iter().collect();
    Bool::and(&refs)
}

fn disjunction(parts: &[Bool]) -> Bool {
    if parts.is_empty() {
        return Bool::from_bool(false);
    }
    let refs: Vec<&Bool> = parts.iter().collect();
    Bool::or(&refs)
}

fn unknown_reason(solver: &Solver) -> String {
    solver
        .get_reason_unknown()
        .unwrap_or_else(|| "SMT solver returned unknown".to_string())
}

impl Oracle for Z3Oracle {
    fn check_sat(
        &self,
        formula: &Formula,
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<SatOutcome, OracleError> {
        let translator = Translator::new(fields);
        let query = translator.formula(formula)?;
        let solver = create_solver(self.effective_timeout(timeout));
        for domain in translator.domains(fields) {
            solver.assert(&domain);
        }
        solver.assert(&query);
        trace!("z3 check-sat: {}", formula);

        match solver.check() {
            SatResult::Unsat => Ok(SatOutcome::Unsat),
            SatResult::Unknown => Ok(SatOutcome::Unknown(unknown_reason(&solver))),
            SatResult::Sat => {
                let model = solver.get_model().ok_or_else(|| {
                    OracleError::Unavailable("solver reported sat without a model".to_string())
                })?;
                let mut witness = Witness::new();
                for (name, var) in &translator.vars {
                    let value = model
                        .eval(var, true)
                        .and_then(|v| v.as_u64())
                        .ok_or_else(|| {
                            OracleError::Translation(format!(
                                "model value of field '{}' is not a byte value",
                                name
                            ))
                        })?;
                    witness.insert(name.clone(), value);
                }
                debug!("z3 found witness {}", witness);
                Ok(SatOutcome::Sat(witness))
            }
        }
    }

    fn unsat_core(
        &self,
        conjuncts: &[Formula],
        fields: &FieldTable,
        timeout: Option<Duration>,
    ) -> Result<CoreOutcome, OracleError> {
        let translator = Translator::new(fields);
        let solver = create_solver(self.effective_timeout(timeout));
        for domain in translator.domains(fields) {
            solver.assert(&domain);
        }

        // Each conjunct is guarded by a fresh tracking literal so the core
        // can be mapped back to indices. Fresh constants never share a name
        // with a field.
        let mut tracked = Vec::with_capacity(conjuncts.len());
        for conjunct in conjuncts {
            let literal = Bool::fresh_const("core");
            solver.assert(&literal.implies(&translator.formula(conjunct)?));
            tracked.push(literal);
        }

        let core = match solver.check_assumptions(&tracked) {
            SatResult::Sat => return Ok(CoreOutcome::Satisfiable),
            SatResult::Unknown => return Ok(CoreOutcome::Unknown(unknown_reason(&solver))),
            SatResult::Unsat => solver.get_unsat_core(),
        };
        let mut indices: Vec<usize> = tracked
            .iter()
            .enumerate()
            .filter(|(_, lit)| core.iter().any(|c| c == *lit))
            .map(|(i, _)| i)
            .collect();

        // Shrink by deletion until every remaining conjunct is needed
        let mut i = 0;
        while i < indices.len() {
            let candidate: Vec<usize> = indices
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, idx)| *idx)
                .collect();
            let assumptions: Vec<Bool> = candidate.iter().map(|idx| tracked[*idx].clone()).collect();
            match solver.check_assumptions(&assumptions) {
                SatResult::Unsat => indices = candidate,
                _ => i += 1,
            }
        }

        debug!("z3 unsat core: {:?}", indices);
        Ok(CoreOutcome::Core(indices))
    }

    fn name(&self) -> &str {
        "z3"
    }
}
