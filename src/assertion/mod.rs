//! Assertion language over named byte fields
//!
//! Assertions are the predicates a grammar attaches to terminals, productions
//! and alternatives: ranges, equalities, checksums and cross-field relations.
//! Field values are unsigned integers (see [`crate::grammar::ByteSpec`]).

pub mod eval;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub use eval::Witness;

/// Field substitution, old name to new name
pub type Renames = BTreeMap<String, String>;

/// Integer-valued expression over fields
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Field(String),
    Const(i64),
    Add(Box<Term>, Box<Term>),
    Sub(Box<Term>, Box<Term>),
    Mul(Box<Term>, Box<Term>),
    /// Euclidean remainder by a constant, used for checksums
    Mod(Box<Term>, i64),
}

impl Term {
    pub fn field(name: impl Into<String>) -> Self {
        Term::Field(name.into())
    }

    pub fn plus(self, rhs: impl Into<Term>) -> Self {
        Term::Add(Box::new(self), Box::new(rhs.into()))
    }

    pub fn minus(self, rhs: impl Into<Term>) -> Self {
        Term::Sub(Box::new(self), Box::new(rhs.into()))
    }

    pub fn times(self, rhs: impl Into<Term>) -> Self {
        Term::Mul(Box::new(self), Box::new(rhs.into()))
    }

    pub fn modulo(self, divisor: i64) -> Self {
        Term::Mod(Box::new(self), divisor)
    }

    pub fn less_than(self, rhs: impl Into<Term>) -> Assertion {
        Assertion::compare(CmpOp::Lt, self, rhs)
    }

    pub fn at_most(self, rhs: impl Into<Term>) -> Assertion {
        Assertion::compare(CmpOp::Le, self, rhs)
    }

    pub fn greater_than(self, rhs: impl Into<Term>) -> Assertion {
        Assertion::compare(CmpOp::Gt, self, rhs)
    }

    pub fn at_least(self, rhs: impl Into<Term>) -> Assertion {
        Assertion::compare(CmpOp::Ge, self, rhs)
    }

    pub fn equals(self, rhs: impl Into<Term>) -> Assertion {
        Assertion::compare(CmpOp::Eq, self, rhs)
    }

    pub fn not_equals(self, rhs: impl Into<Term>) -> Assertion {
        Assertion::compare(CmpOp::Ne, self, rhs)
    }

    pub fn in_range(self, low: i64, high: i64) -> Assertion {
        Assertion::Range {
            term: self,
            low,
            high,
        }
    }

    /// Collect the field names this term mentions
    pub fn collect_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Term::Field(name) => {
                out.insert(name.as_str());
            }
            Term::Const(_) => {}
            Term::Add(a, b) | Term::Sub(a, b) | Term::Mul(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            Term::Mod(a, _) => a.collect_fields(out),
        }
    }

    /// Apply `renames` to every field at once, so swapped names stay apart
    pub fn rename_fields(&self, renames: &Renames) -> Term {
        match self {
            Term::Field(name) => match renames.get(name) {
                Some(to) => Term::Field(to.clone()),
                None => self.clone(),
            },
            Term::Const(_) => self.clone(),
            Term::Add(a, b) => Term::Add(
                Box::new(a.rename_fields(renames)),
                Box::new(b.rename_fields(renames)),
            ),
            Term::Sub(a, b) => Term::Sub(
                Box::new(a.rename_fields(renames)),
                Box::new(b.rename_fields(renames)),
            ),
            Term::Mul(a, b) => Term::Mul(
                Box::new(a.rename_fields(renames)),
                Box::new(b.rename_fields(renames)),
            ),
            Term::Mod(a, n) => Term::Mod(Box::new(a.rename_fields(renames)), *n),
        }
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Const(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::Const(i64::from(value))
    }
}

impl From<&str> for Term {
    fn from(name: &str) -> Self {
        Term::Field(name.to_string())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Field(name) => write!(f, "{}", name),
            Term::Const(value) => write!(f, "{}", value),
            Term::Add(a, b) => write!(f, "({} + {})", a, b),
            Term::Sub(a, b) => write!(f, "({} - {})", a, b),
            Term::Mul(a, b) => write!(f, "({} * {})", a, b),
            Term::Mod(a, n) => write!(f, "({} mod {})", a, n),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    /// Whether swapping the operands leaves the meaning unchanged
    pub fn is_symmetric(&self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::Ne)
    }

    pub(crate) fn holds(&self, lhs: i128, rhs: i128) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }
}

/// A logical predicate over byte fields
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assertion {
    Compare { op: CmpOp, lhs: Term, rhs: Term },
    /// `low <= term <= high`
    Range { term: Term, low: i64, high: i64 },
    Not(Box<Assertion>),
    All(Vec<Assertion>),
    Any(Vec<Assertion>),
}

impl Assertion {
    pub fn compare(op: CmpOp, lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Assertion::Compare {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn negate(self) -> Self {
        Assertion::Not(Box::new(self))
    }

    /// Field names mentioned anywhere in this assertion
    pub fn fields(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_fields(&mut out);
        out
    }

    pub fn collect_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Assertion::Compare { lhs, rhs, .. } => {
                lhs.collect_fields(out);
                rhs.collect_fields(out);
            }
            Assertion::Range { term, .. } => term.collect_fields(out),
            Assertion::Not(inner) => inner.collect_fields(out),
            Assertion::All(parts) | Assertion::Any(parts) => {
                for part in parts {
                    part.collect_fields(out);
                }
            }
        }
    }

    /// Whether every field this assertion mentions is `field`
    pub fn only_mentions(&self, field: &str) -> bool {
        let fields = self.fields();
        !fields.is_empty() && fields.iter().all(|f| *f == field)
    }

    pub fn rename_fields(&self, renames: &Renames) -> Assertion {
        match self {
            Assertion::Compare { op, lhs, rhs } => Assertion::Compare {
                op: *op,
                lhs: lhs.rename_fields(renames),
                rhs: rhs.rename_fields(renames),
            },
            Assertion::Range { term, low, high } => Assertion::Range {
                term: term.rename_fields(renames),
                low: *low,
                high: *high,
            },
            Assertion::Not(inner) => Assertion::Not(Box::new(inner.rename_fields(renames))),
            Assertion::All(parts) => {
                Assertion::All(parts.iter().map(|p| p.rename_fields(renames)).collect())
            }
            Assertion::Any(parts) => {
                Assertion::Any(parts.iter().map(|p| p.rename_fields(renames)).collect())
            }
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Compare { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Assertion::Range { term, low, high } => write!(f, "{} in [{}, {}]", term, low, high),
            Assertion::Not(inner) => write!(f, "!({})", inner),
            Assertion::All(parts) => write_joined(f, parts, " && ", "true"),
            Assertion::Any(parts) => write_joined(f, parts, " || ", "false"),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    parts: &[Assertion],
    sep: &str,
    empty: &str,
) -> fmt::Result {
    if parts.is_empty() {
        return write!(f, "{}", empty);
    }
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", part)?;
    }
    write!(f, ")")
}
