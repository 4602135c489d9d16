//! Semantic comparison of two formulas through an oracle

use crate::assertion::Witness;
use crate::error::OracleError;
use crate::formula::{FieldTable, Formula};
use crate::oracle::{CoreOutcome, Oracle, SatOutcome};
use log::debug;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// One of the two grammars under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// What a justification explains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JustificationKind {
    /// One side's formula implies the other's
    #[default]
    Implication,
    /// An alternative was dropped because its assertions never hold
    Conflict,
}

/// Why one side's formula implies the other's: the premises of a minimal
/// unsatisfiable core of `premise && !conclusion`. For a conflict, the
/// conjuncts of the dropped alternative that cannot hold together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Justification {
    pub kind: JustificationKind,
    /// Side whose formula is the premise
    pub premise: Side,
    /// Location in the grammars, filled in by the driver
    pub location: String,
    /// Premise conjuncts that take part in the core
    pub because: Vec<String>,
    /// The implied formula, or the dropped alternative
    pub conclusion: String,
}

impl Justification {
    pub fn implication(premise: Side, because: Vec<String>, conclusion: String) -> Self {
        Self {
            kind: JustificationKind::Implication,
            premise,
            location: String::new(),
            because,
            conclusion,
        }
    }

    /// The alternative `conclusion` of `side` at `location` never matches
    pub fn conflict(side: Side, location: String, because: Vec<String>, conclusion: String) -> Self {
        Self {
            kind: JustificationKind::Conflict,
            premise: side,
            location,
            because,
            conclusion,
        }
    }
}

impl fmt::Display for Justification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.location.is_empty() {
            write!(f, "{}: ", self.location)?;
        }
        match self.kind {
            JustificationKind::Conflict => write!(
                f,
                "{} alternative never matches because {} is unsatisfiable",
                self.premise,
                self.because.join(" && ")
            ),
            JustificationKind::Implication if self.because.is_empty() => write!(
                f,
                "{} implies {} because {} always holds",
                self.premise,
                self.premise.other(),
                self.conclusion
            ),
            JustificationKind::Implication => write!(
                f,
                "{} implies {} because {} entails {}",
                self.premise,
                self.premise.other(),
                self.because.join(" && "),
                self.conclusion
            ),
        }
    }
}

/// Result of comparing two formulas semantically
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Equivalent(Vec<Justification>),
    /// `witness` satisfies the formula of `accepted_by` and violates the other
    Distinct { witness: Witness, accepted_by: Side },
    Unknown(String),
}

/// Decide whether `left` and `right` denote the same set of field
/// assignments.
///
/// The symmetric difference is checked first. When it is unsatisfiable and
/// `justify` is set, each direction of the implication is explained by a
/// minimal unsat core. An `unknown` from the oracle is passed through, never
/// read as either answer.
pub fn decide_equivalence(
    oracle: &dyn Oracle,
    left: &Formula,
    right: &Formula,
    fields: &FieldTable,
    timeout: Option<Duration>,
    justify: bool,
) -> Result<Decision, OracleError> {
    let difference = Formula::or(vec![
        Formula::and(vec![left.clone(), right.clone().not()]),
        Formula::and(vec![right.clone(), left.clone().not()]),
    ]);

    match oracle.check_sat(&difference, fields, timeout)? {
        SatOutcome::Unknown(reason) => Ok(Decision::Unknown(reason)),
        SatOutcome::Sat(witness) => {
            let accepted_by = if left.eval(&witness) == Some(true) {
                Side::Left
            } else {
                Side::Right
            };
            debug!("formulas differ on {}, accepted by {}", witness, accepted_by);
            Ok(Decision::Distinct {
                witness,
                accepted_by,
            })
        }
        SatOutcome::Unsat => {
            if !justify {
                return Ok(Decision::Equivalent(Vec::new()));
            }
            let mut justifications = Vec::new();
            for (premise, conclusion, side) in [(left, right, Side::Left), (right, left, Side::Right)]
            {
                if let Some(j) = justify_implication(oracle, premise, conclusion, side, fields, timeout)? {
                    justifications.push(j);
                }
            }
            Ok(Decision::Equivalent(justifications))
        }
    }
}

fn justify_implication(
    oracle: &dyn Oracle,
    premise: &Formula,
    conclusion: &Formula,
    side: Side,
    fields: &FieldTable,
    timeout: Option<Duration>,
) -> Result<Option<Justification>, OracleError> {
    let mut conjuncts = premise.conjuncts();
    let premise_count = conjuncts.len();
    conjuncts.push(conclusion.clone().not());

    match oracle.unsat_core(&conjuncts, fields, timeout)? {
        CoreOutcome::Core(indices) => Ok(Some(Justification::implication(
            side,
            indices
                .iter()
                .filter(|i| **i < premise_count)
                .map(|i| conjuncts[*i].to_string())
                .collect(),
            conclusion.to_string(),
        ))),
        // The symmetric difference was unsat, so this only happens when the
        // oracle gives up on the smaller query
        CoreOutcome::Satisfiable | CoreOutcome::Unknown(_) => Ok(None),
    }
}
