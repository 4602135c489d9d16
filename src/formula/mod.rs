//! Formulas: the unit of comparison exchanged with the oracle
//!
//! A [`Formula`] is built from grammar assertions by the builder, compared
//! cheaply by the normalizer, and only handed to an oracle when the cheap
//! check cannot settle the question.

pub mod builder;
pub mod normalize;

use crate::assertion::{Assertion, Renames, Witness};
use crate::grammar::{ByteSpec, Grammar};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub use builder::{build_formula, production_formula, FormulaBuilder};
pub use normalize::{assertions_equal, normalize, Comparison};

/// Byte specifier of every field a query mentions, used to bound the
/// oracle's variables
pub type FieldTable = BTreeMap<String, ByteSpec>;

/// A logical expression over assertions
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    True,
    False,
    Atom(Assertion),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

impl Formula {
    pub fn atom(assertion: Assertion) -> Self {
        Formula::Atom(assertion)
    }

    /// Conjunction; empty is `True`, a single part is returned as is
    pub fn and(mut parts: Vec<Formula>) -> Self {
        match parts.len() {
            0 => Formula::True,
            1 => parts.remove(0),
            _ => Formula::And(parts),
        }
    }

    /// Disjunction; empty is `False`, a single part is returned as is
    pub fn or(mut parts: Vec<Formula>) -> Self {
        match parts.len() {
            0 => Formula::False,
            1 => parts.remove(0),
            _ => Formula::Or(parts),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Formula::Not(Box::new(self))
    }

    /// Conjunction of a set of assertions
    pub fn all_of<'a>(assertions: impl IntoIterator<Item = &'a Assertion>) -> Self {
        Formula::and(assertions.into_iter().cloned().map(Formula::Atom).collect())
    }

    /// Top-level conjuncts, used as the candidates of an unsat core
    pub fn conjuncts(&self) -> Vec<Formula> {
        match self {
            Formula::And(parts) => parts.iter().flat_map(|p| p.conjuncts()).collect(),
            Formula::True => Vec::new(),
            other => vec![other.clone()],
        }
    }

    pub fn fields(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Formula::True | Formula::False => {}
            Formula::Atom(a) => a.collect_fields(out),
            Formula::Not(inner) => inner.collect_fields(out),
            Formula::And(parts) | Formula::Or(parts) => {
                for part in parts {
                    part.collect_fields(out);
                }
            }
        }
    }

    /// Evaluate under `witness`; `None` if a mentioned field is unassigned
    pub fn eval(&self, witness: &Witness) -> Option<bool> {
        match self {
            Formula::True => Some(true),
            Formula::False => Some(false),
            Formula::Atom(a) => a.eval(witness),
            Formula::Not(inner) => inner.eval(witness).map(|b| !b),
            Formula::And(parts) => {
                for part in parts {
                    if !part.eval(witness)? {
                        return Some(false);
                    }
                }
                Some(true)
            }
            Formula::Or(parts) => {
                for part in parts {
                    if part.eval(witness)? {
                        return Some(true);
                    }
                }
                Some(false)
            }
        }
    }

    pub fn rename_fields(&self, renames: &Renames) -> Formula {
        if renames.is_empty() {
            return self.clone();
        }
        match self {
            Formula::True | Formula::False => self.clone(),
            Formula::Atom(a) => Formula::Atom(a.rename_fields(renames)),
            Formula::Not(inner) => Formula::Not(Box::new(inner.rename_fields(renames))),
            Formula::And(parts) => {
                Formula::And(parts.iter().map(|p| p.rename_fields(renames)).collect())
            }
            Formula::Or(parts) => {
                Formula::Or(parts.iter().map(|p| p.rename_fields(renames)).collect())
            }
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Formula::True)
    }
}

impl From<Assertion> for Formula {
    fn from(assertion: Assertion) -> Self {
        Formula::Atom(assertion)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "true"),
            Formula::False => write!(f, "false"),
            Formula::Atom(a) => write!(f, "{}", a),
            Formula::Not(inner) => write!(f, "!({})", inner),
            Formula::And(parts) | Formula::Or(parts) => {
                let sep = if matches!(self, Formula::And(_)) {
                    " && "
                } else {
                    " || "
                };
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Field table for `formula`, with specifiers taken from `grammar`
pub fn field_table(grammar: &Grammar, formula: &Formula) -> FieldTable {
    formula
        .fields()
        .into_iter()
        .filter_map(|field| {
            grammar
                .field_spec(field)
                .map(|spec| (field.to_string(), spec))
        })
        .collect()
}

/// Union of two field tables. A field bound differently on the two sides
/// keeps the wider domain.
pub fn merge_tables(left: &FieldTable, right: &FieldTable) -> FieldTable {
    let mut merged = left.clone();
    for (field, spec) in right {
        merged
            .entry(field.clone())
            .and_modify(|existing| {
                if spec.max_value() > existing.max_value() {
                    *existing = *spec;
                }
            })
            .or_insert(*spec);
    }
    merged
}
