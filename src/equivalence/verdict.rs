//! Verdicts of a grammar comparison

use crate::assertion::{Renames, Witness};
use crate::oracle::{Justification, Side};
use serde::Serialize;
use std::fmt;

/// What made two grammars distinct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// The grammars cannot produce the same strings at all
    Structural { location: String, reason: String },
    /// The witness satisfies the assertions of `accepted_by` at `location`
    /// and violates the other side's
    Assertions {
        location: String,
        accepted_by: Side,
        left: String,
        right: String,
    },
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::Structural { location, reason } => write!(f, "{}: {}", location, reason),
            Evidence::Assertions {
                location,
                accepted_by,
                left,
                right,
            } => write!(
                f,
                "{}: only the {} side accepts (left: {}, right: {})",
                location, accepted_by, left, right
            ),
        }
    }
}

/// Outcome of one top-level comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Equivalent {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        justifications: Vec<Justification>,
    },
    /// `witness` is in the left grammar's field names. `renamed` maps each
    /// right field that was compared under another name to that name.
    Distinct {
        witness: Witness,
        evidence: Evidence,
        #[serde(skip_serializing_if = "Renames::is_empty")]
        renamed: Renames,
    },
    Unknown {
        reason: String,
    },
}

/// Verdict without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictKind {
    Equivalent,
    Distinct,
    Unknown,
}

impl Verdict {
    pub fn equivalent() -> Self {
        Verdict::Equivalent {
            justifications: Vec::new(),
        }
    }

    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Equivalent { .. } => VerdictKind::Equivalent,
            Verdict::Distinct { .. } => VerdictKind::Distinct,
            Verdict::Unknown { .. } => VerdictKind::Unknown,
        }
    }

    pub fn is_equivalent(&self) -> bool {
        self.kind() == VerdictKind::Equivalent
    }

    pub fn is_distinct(&self) -> bool {
        self.kind() == VerdictKind::Distinct
    }

    pub fn is_unknown(&self) -> bool {
        self.kind() == VerdictKind::Unknown
    }

    pub fn witness(&self) -> Option<&Witness> {
        match self {
            Verdict::Distinct { witness, .. } => Some(witness),
            _ => None,
        }
    }

    /// The witness under the field names of one grammar
    pub fn witness_for(&self, side: Side) -> Option<Witness> {
        let Verdict::Distinct {
            witness, renamed, ..
        } = self
        else {
            return None;
        };
        let mut own = witness.clone();
        if side == Side::Right {
            for (field, compared_as) in renamed {
                if let Some(value) = witness.get(compared_as) {
                    own.insert(field.clone(), value);
                }
            }
        }
        Some(own)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Equivalent { justifications } => {
                write!(f, "equivalent")?;
                for j in justifications {
                    write!(f, "\n  {}", j)?;
                }
                Ok(())
            }
            Verdict::Distinct {
                witness, evidence, ..
            } => {
                write!(f, "distinct, witness {}\n  {}", witness, evidence)
            }
            Verdict::Unknown { reason } => write!(f, "unknown: {}", reason),
        }
    }
}
