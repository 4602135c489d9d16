//! Concrete evaluation of assertions against a field assignment

use super::{Assertion, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A concrete assignment of values to byte fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Witness(BTreeMap<String, u64>);

impl Witness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: u64) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: u64) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<u64> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", field, value)?;
        }
        write!(f, "}}")
    }
}

impl Term {
    /// Evaluate under `witness`; `None` if a field is unassigned or the
    /// arithmetic leaves the i128 range
    pub fn eval(&self, witness: &Witness) -> Option<i128> {
        match self {
            Term::Field(name) => witness.get(name).map(i128::from),
            Term::Const(value) => Some(i128::from(*value)),
            Term::Add(a, b) => a.eval(witness)?.checked_add(b.eval(witness)?),
            Term::Sub(a, b) => a.eval(witness)?.checked_sub(b.eval(witness)?),
            Term::Mul(a, b) => a.eval(witness)?.checked_mul(b.eval(witness)?),
            Term::Mod(a, n) => {
                let divisor = i128::from(*n);
                if divisor == 0 {
                    return None;
                }
                Some(a.eval(witness)?.rem_euclid(divisor))
            }
        }
    }
}

impl Assertion {
    /// Evaluate under `witness`; `None` if a mentioned field is unassigned
    pub fn eval(&self, witness: &Witness) -> Option<bool> {
        match self {
            Assertion::Compare { op, lhs, rhs } => {
                Some(op.holds(lhs.eval(witness)?, rhs.eval(witness)?))
            }
            Assertion::Range { term, low, high } => {
                let value = term.eval(witness)?;
                Some(i128::from(*low) <= value && value <= i128::from(*high))
            }
            Assertion::Not(inner) => inner.eval(witness).map(|b| !b),
            Assertion::All(parts) => {
                for part in parts {
                    if !part.eval(witness)? {
                        return Some(false);
                    }
                }
                Some(true)
            }
            Assertion::Any(parts) => {
                for part in parts {
                    if part.eval(witness)? {
                        return Some(true);
                    }
                }
                Some(false)
            }
        }
    }
}
