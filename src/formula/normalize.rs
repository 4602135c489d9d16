//! Syntactic normalization and the cheap equality check that runs before
//! any oracle call

use crate::assertion::{Assertion, CmpOp, Term};
use crate::formula::Formula;

/// Outcome of the cheap comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Identical after normalization; no oracle call is needed
    Equal,
    /// Syntactically different, which says nothing about their meaning
    NeedsOracle,
}

/// Compare two formulas up to normalization
pub fn assertions_equal(left: &Formula, right: &Formula) -> Comparison {
    if left == right || normalize(left) == normalize(right) {
        Comparison::Equal
    } else {
        Comparison::NeedsOracle
    }
}

/// Normal form: assertion connectives lifted into the formula, nested
/// conjunctions and disjunctions flattened, neutral and absorbing constants
/// folded, operands of commutative operators sorted and de-duplicated,
/// `>`/`>=` rewritten as `<`/`<=`, double negation removed.
pub fn normalize(formula: &Formula) -> Formula {
    match formula {
        Formula::True | Formula::False => formula.clone(),
        Formula::Atom(assertion) => lift(assertion),
        Formula::Not(inner) => negate(normalize(inner)),
        Formula::And(parts) => conjoin(parts.iter().map(normalize).collect()),
        Formula::Or(parts) => disjoin(parts.iter().map(normalize).collect()),
    }
}

fn lift(assertion: &Assertion) -> Formula {
    match assertion {
        Assertion::Compare { op, lhs, rhs } => {
            Formula::Atom(orient(*op, normalize_term(lhs), normalize_term(rhs)))
        }
        Assertion::Range { term, low, high } => {
            if low > high {
                Formula::False
            } else {
                Formula::Atom(Assertion::Range {
                    term: normalize_term(term),
                    low: *low,
                    high: *high,
                })
            }
        }
        Assertion::Not(inner) => negate(lift(inner)),
        Assertion::All(parts) => conjoin(parts.iter().map(lift).collect()),
        Assertion::Any(parts) => disjoin(parts.iter().map(lift).collect()),
    }
}

fn orient(op: CmpOp, lhs: Term, rhs: Term) -> Assertion {
    let (op, lhs, rhs) = match op {
        CmpOp::Gt => (CmpOp::Lt, rhs, lhs),
        CmpOp::Ge => (CmpOp::Le, rhs, lhs),
        op if op.is_symmetric() && rhs < lhs => (op, rhs, lhs),
        op => (op, lhs, rhs),
    };
    Assertion::Compare { op, lhs, rhs }
}

fn normalize_term(term: &Term) -> Term {
    match term {
        Term::Field(_) | Term::Const(_) => term.clone(),
        Term::Add(a, b) => {
            let (a, b) = sorted_pair(normalize_term(a), normalize_term(b));
            Term::Add(Box::new(a), Box::new(b))
        }
        Term::Mul(a, b) => {
            let (a, b) = sorted_pair(normalize_term(a), normalize_term(b));
            Term::Mul(Box::new(a), Box::new(b))
        }
        Term::Sub(a, b) => Term::Sub(Box::new(normalize_term(a)), Box::new(normalize_term(b))),
        Term::Mod(a, n) => Term::Mod(Box::new(normalize_term(a)), *n),
    }
}

fn sorted_pair(a: Term, b: Term) -> (Term, Term) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}

fn negate(formula: Formula) -> Formula {
    match formula {
        Formula::True => Formula::False,
        Formula::False => Formula::True,
        Formula::Not(inner) => *inner,
        other => Formula::Not(Box::new(other)),
    }
}

fn conjoin(parts: Vec<Formula>) -> Formula {
    let mut flat = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Formula::True => {}
            Formula::False => return Formula::False,
            Formula::And(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat.sort();
    flat.dedup();
    Formula::and(flat)
}

fn disjoin(parts: Vec<Formula>) -> Formula {
    let mut flat = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Formula::False => {}
            Formula::True => return Formula::True,
            Formula::Or(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat.sort();
    flat.dedup();
    Formula::or(flat)
}
