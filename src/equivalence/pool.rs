//! Discharging obligations through the oracle, in order or on worker threads

use crate::assertion::Renames;
use crate::equivalence::verdict::{Evidence, Verdict};
use crate::equivalence::walk::Obligation;
use crate::error::{EquivalenceError, OracleError};
use crate::oracle::{decide_equivalence, Decision, Justification, Oracle};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Settings shared by every oracle query of one run
#[derive(Debug, Clone, Copy)]
pub struct Discharge {
    pub timeout: Option<Duration>,
    pub justify: bool,
    pub workers: usize,
}

/// Message sent from a worker to the coordinator
#[derive(Debug)]
enum WorkerMessage {
    Decided { index: usize, decision: Decision },
    Failed { index: usize, error: OracleError },
}

/// Flag telling workers to leave pending obligations alone
#[derive(Debug, Default)]
struct StopFlag(AtomicBool);

impl StopFlag {
    fn should_stop(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn signal_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Folds decisions into a verdict: a difference wins over everything, an
/// unknown over equivalence
#[derive(Debug, Default)]
struct Outcome {
    justifications: Vec<Justification>,
    unknown: Option<String>,
}

impl Outcome {
    /// Record a decision; returns the verdict if it settles the run
    fn record(&mut self, obligation: &Obligation, decision: Decision) -> Option<Verdict> {
        match decision {
            Decision::Distinct {
                witness,
                accepted_by,
            } => Some(Verdict::Distinct {
                witness,
                evidence: Evidence::Assertions {
                    location: obligation.location.clone(),
                    accepted_by,
                    left: obligation.left.to_string(),
                    right: obligation.right.to_string(),
                },
                renamed: Renames::new(),
            }),
            Decision::Unknown(reason) => {
                warn!("{}: oracle gave up: {}", obligation.location, reason);
                if self.unknown.is_none() {
                    self.unknown = Some(format!("{}: {}", obligation.location, reason));
                }
                None
            }
            Decision::Equivalent(justifications) => {
                self.justifications
                    .extend(justifications.into_iter().map(|mut j| {
                        j.location = obligation.location.clone();
                        j
                    }));
                None
            }
        }
    }

    fn finish(self) -> Verdict {
        match self.unknown {
            Some(reason) => Verdict::Unknown { reason },
            None => Verdict::Equivalent {
                justifications: self.justifications,
            },
        }
    }
}

/// Decide every obligation and combine the answers
pub fn discharge(
    oracle: &Arc<dyn Oracle>,
    obligations: Vec<Obligation>,
    settings: Discharge,
) -> Result<Verdict, EquivalenceError> {
    if settings.workers <= 1 || obligations.len() <= 1 {
        return discharge_sequential(oracle.as_ref(), &obligations, settings);
    }
    discharge_parallel(oracle, obligations, settings)
}

fn discharge_sequential(
    oracle: &dyn Oracle,
    obligations: &[Obligation],
    settings: Discharge,
) -> Result<Verdict, EquivalenceError> {
    let mut outcome = Outcome::default();
    for obligation in obligations {
        let decision = decide(oracle, obligation, settings)?;
        if let Some(verdict) = outcome.record(obligation, decision) {
            return Ok(verdict);
        }
    }
    Ok(outcome.finish())
}

fn decide(oracle: &dyn Oracle, obligation: &Obligation, settings: Discharge) -> Result<Decision, OracleError> {
    debug!("{}: asking {}", obligation.location, oracle.name());
    decide_equivalence(
        oracle,
        &obligation.left,
        &obligation.right,
        &obligation.fields,
        settings.timeout,
        settings.justify,
    )
}

fn discharge_parallel(
    oracle: &Arc<dyn Oracle>,
    obligations: Vec<Obligation>,
    settings: Discharge,
) -> Result<Verdict, EquivalenceError> {
    let total = obligations.len();
    let workers = settings.workers.min(total);
    info!("discharging {} obligations on {} workers", total, workers);

    let obligations = Arc::new(obligations);
    let stop = Arc::new(StopFlag::default());

    let (job_tx, job_rx) = unbounded::<usize>();
    for index in 0..total {
        // The receiver is still held here, so this cannot fail
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    let (result_tx, result_rx) = unbounded();
    let handles: Vec<_> = (0..workers)
        .map(|worker_id| {
            let oracle = Arc::clone(oracle);
            let obligations = Arc::clone(&obligations);
            let stop = Arc::clone(&stop);
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            std::thread::spawn(move || {
                run_worker(worker_id, oracle.as_ref(), &obligations, jobs, results, &stop, settings)
            })
        })
        .collect();
    drop(result_tx);

    let mut decisions: Vec<Option<Decision>> = (0..total).map(|_| None).collect();
    let mut received = 0;
    while received < total {
        match result_rx.recv() {
            Ok(WorkerMessage::Decided { index, decision }) => {
                received += 1;
                if matches!(decision, Decision::Distinct { .. }) {
                    stop.signal_stop();
                    // Running queries are bounded by the timeout; their threads
                    // finish on their own and their answers are dropped
                    let mut outcome = Outcome::default();
                    if let Some(verdict) = outcome.record(&obligations[index], decision) {
                        return Ok(verdict);
                    }
                } else {
                    decisions[index] = Some(decision);
                }
            }
            Ok(WorkerMessage::Failed { index, error }) => {
                stop.signal_stop();
                warn!("{}: oracle failed: {}", obligations[index].location, error);
                return Err(error.into());
            }
            Err(_) => break,
        }
    }

    for handle in handles {
        let _ = handle.join();
    }

    if received < total {
        return Err(EquivalenceError::Internal(format!(
            "workers stopped after {} of {} obligations",
            received, total
        )));
    }

    // Combine in obligation order so the verdict does not depend on scheduling
    let mut outcome = Outcome::default();
    for (obligation, decision) in obligations.iter().zip(decisions) {
        if let Some(decision) = decision {
            if let Some(verdict) = outcome.record(obligation, decision) {
                return Ok(verdict);
            }
        }
    }
    Ok(outcome.finish())
}

fn run_worker(
    worker_id: usize,
    oracle: &dyn Oracle,
    obligations: &[Obligation],
    jobs: Receiver<usize>,
    results: Sender<WorkerMessage>,
    stop: &StopFlag,
    settings: Discharge,
) {
    while let Ok(index) = jobs.recv() {
        if stop.should_stop() {
            break;
        }
        let message = match decide(oracle, &obligations[index], settings) {
            Ok(decision) => WorkerMessage::Decided { index, decision },
            Err(error) => WorkerMessage::Failed { index, error },
        };
        if results.send(message).is_err() {
            break;
        }
    }
    debug!("worker {} finished", worker_id);
}
