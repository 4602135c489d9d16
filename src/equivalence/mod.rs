//! The equivalence driver
//!
//! Compares two grammars by walking them structurally and asking an oracle
//! about whatever structure leaves open.

pub mod config;
pub mod pool;
pub mod verdict;
pub mod walk;

use crate::assertion::{Renames, Witness};
use crate::error::EquivalenceError;
use crate::grammar::{Grammar, GrammarSource};
use crate::oracle::{Oracle, Z3Oracle};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

pub use config::EquivalenceConfig;
pub use pool::Discharge;
pub use verdict::{Evidence, Verdict, VerdictKind};
pub use walk::{Mismatch, Obligation, Pruning, Walk, Walked, Walker};

/// Decides whether two grammars accept the same strings
#[derive(Clone)]
pub struct EquivalenceChecker {
    oracle: Arc<dyn Oracle>,
    config: EquivalenceConfig,
}

impl Default for EquivalenceChecker {
    fn default() -> Self {
        Self::new(Arc::new(Z3Oracle::new()))
    }
}

impl EquivalenceChecker {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            config: EquivalenceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EquivalenceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EquivalenceConfig {
        &self.config
    }

    /// Compare two grammars.
    ///
    /// Structural differences are reported without consulting the oracle.
    /// Otherwise the verdict is `Distinct` if any obligation differs,
    /// `Unknown` if the oracle gave up on one, and `Equivalent` only when
    /// every obligation was shown equal.
    pub fn compare(&self, left: &Grammar, right: &Grammar) -> Result<Verdict, EquivalenceError> {
        let start = Instant::now();
        report_unreachable("left", left);
        report_unreachable("right", right);

        let mut walker = Walker::new(left, right, self.config.shape_depth);
        if self.config.prune {
            walker = walker.with_pruning(Pruning {
                oracle: &*self.oracle,
                timeout: self.config.solver.timeout,
                justify: self.config.justify,
            });
        }
        if let Walk::Differ(mismatch) = walker.run()? {
            info!("grammars differ structurally at {}: {}", mismatch.location, mismatch.reason);
            return Ok(Verdict::Distinct {
                witness: Witness::new(),
                evidence: Evidence::Structural {
                    location: mismatch.location,
                    reason: mismatch.reason,
                },
                renamed: Renames::new(),
            });
        }

        let walked = walker.finish();
        info!(
            "structure matches; {} obligations settled by normalization, {} left for {}",
            walked.settled,
            walked.obligations.len(),
            self.oracle.name()
        );
        if !walked.renames.is_empty() {
            debug!("right fields compared under left names: {:?}", walked.renames);
        }
        let settings = Discharge {
            timeout: self.config.solver.timeout,
            justify: self.config.justify,
            workers: self.config.workers,
        };
        let verdict = match pool::discharge(&self.oracle, walked.obligations, settings)? {
            Verdict::Equivalent { justifications } if self.config.justify => {
                let mut all = walked.pruned;
                all.extend(justifications);
                Verdict::Equivalent { justifications: all }
            }
            Verdict::Distinct {
                witness, evidence, ..
            } => Verdict::Distinct {
                witness: with_right_names(witness, &walked.renames, left),
                evidence,
                renamed: walked.renames,
            },
            other => other,
        };
        info!("{:?} after {:?}", verdict.kind(), start.elapsed());
        Ok(verdict)
    }

    /// Compare grammars obtained from their producers
    pub fn compare_sources<L, R>(&self, left: &L, right: &R) -> Result<Verdict, EquivalenceError>
    where
        L: GrammarSource + ?Sized,
        R: GrammarSource + ?Sized,
    {
        let left = left.grammar()?;
        let right = right.grammar()?;
        self.compare(&left, &right)
    }
}

/// Compare two grammars with the z3 oracle and default settings
pub fn compare(left: &Grammar, right: &Grammar) -> Result<Verdict, EquivalenceError> {
    EquivalenceChecker::default().compare(left, right)
}

/// Adds each renamed right field under its own name, unless the left
/// grammar uses that name for something else
fn with_right_names(mut witness: Witness, renames: &Renames, left: &Grammar) -> Witness {
    for (field, compared_as) in renames {
        if left.field_spec(field).is_some() || witness.get(field).is_some() {
            continue;
        }
        if let Some(value) = witness.get(compared_as) {
            witness.insert(field.clone(), value);
        }
    }
    witness
}

fn report_unreachable(side: &str, grammar: &Grammar) {
    let unreachable = grammar.unreachable();
    if !unreachable.is_empty() {
        warn!(
            "{} grammar has productions unreachable from {}: {}",
            side,
            grammar.start().name,
            unreachable.join(", ")
        );
    }
}
