//! Structural walk over two grammars
//!
//! The walk pairs up productions from the two start symbols and checks that
//! they have the same structure. Whatever structure cannot decide is left as
//! an [`Obligation`]: two formulas that must denote the same field
//! assignments.
//!
//! Terminals paired by the walk stand for the same value, so each right
//! field is compared under the name of the first left field it is paired
//! with. Fields never paired keep their names. Obligations are only formed
//! once the walk is over and every pairing is known; those whose formulas
//! then normalize to the same form are settled on the spot.

use crate::assertion::{Assertion, Renames};
use crate::error::EquivalenceError;
use crate::formula::{
    assertions_equal, field_table, merge_tables, normalize, Comparison, FieldTable, Formula,
    FormulaBuilder,
};
use crate::grammar::{Alternative, Grammar, ProductionId, Rhs, RhsItem, Terminal};
use crate::grouper::{group_alternatives, ShapeGroup, ShapeMismatch};
use crate::oracle::{CoreOutcome, Justification, Oracle, SatOutcome, Side};
use log::{debug, trace};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

/// Two formulas, one per grammar, that must be semantically equal.
/// Right fields appear under the names they were paired with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obligation {
    pub location: String,
    pub left: Formula,
    pub right: Formula,
    pub fields: FieldTable,
}

/// A structural difference: no string of one grammar can match the
/// corresponding part of the other
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub location: String,
    pub reason: String,
}

/// Result of walking a pair of grammar parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Walk {
    Same,
    Differ(Mismatch),
}

/// Everything a finished walk leaves for the oracle
#[derive(Debug, Clone, Default)]
pub struct Walked {
    pub obligations: Vec<Obligation>,
    /// Obligations settled by normalization alone
    pub settled: usize,
    /// Right fields compared under another name
    pub renames: Renames,
    /// Alternatives dropped because their assertions never hold
    pub pruned: Vec<Justification>,
}

/// Oracle used to drop alternatives whose assertions never hold
#[derive(Clone, Copy)]
pub struct Pruning<'o> {
    pub oracle: &'o dyn Oracle,
    pub timeout: Option<Duration>,
    /// Explain each drop with a minimal core instead of a plain check
    pub justify: bool,
}

macro_rules! walk_try {
    ($e:expr) => {
        if let Walk::Differ(m) = $e? {
            return Ok(Walk::Differ(m));
        }
    };
}

fn differ(location: &str, reason: impl Into<String>) -> Result<Walk, EquivalenceError> {
    Ok(Walk::Differ(Mismatch {
        location: location.to_string(),
        reason: reason.into(),
    }))
}

fn one_sided(location: &str, mismatch: ShapeMismatch) -> Result<Walk, EquivalenceError> {
    differ(
        location,
        format!(
            "alternatives of shape {} only in the {} grammar",
            mismatch.shape, mismatch.only_in
        ),
    )
}

/// A pair of formulas waiting for the final field pairing
struct Pending {
    location: String,
    left: Formula,
    right: Formula,
    /// Specifier of a paired terminal, which takes precedence over the grammars'
    fields: Option<FieldTable>,
}

pub struct Walker<'g> {
    left: &'g Grammar,
    right: &'g Grammar,
    shape_depth: usize,
    pruning: Option<Pruning<'g>>,
    /// Pairs on the current path; meeting one again is assumed equivalent
    active: HashSet<(ProductionId, ProductionId)>,
    /// Pairs whose comparison finished without a structural difference
    done: HashSet<(ProductionId, ProductionId)>,
    /// Right field to the left field it was first paired with
    paired: Renames,
    pending: Vec<Pending>,
    pruned: Vec<Justification>,
}

impl<'g> Walker<'g> {
    pub fn new(left: &'g Grammar, right: &'g Grammar, shape_depth: usize) -> Self {
        Self {
            left,
            right,
            shape_depth,
            pruning: None,
            active: HashSet::new(),
            done: HashSet::new(),
            paired: Renames::new(),
            pending: Vec::new(),
            pruned: Vec::new(),
        }
    }

    /// Check alternatives against `pruning.oracle` when their shapes do not
    /// line up. Without it only alternatives that normalize to `false` are
    /// dropped.
    pub fn with_pruning(mut self, pruning: Pruning<'g>) -> Self {
        self.pruning = Some(pruning);
        self
    }

    /// Walk both grammars from their start productions
    pub fn run(&mut self) -> Result<Walk, EquivalenceError> {
        self.productions(self.left.start_id(), self.right.start_id(), None)
    }

    /// Apply the field pairing and form the obligations
    pub fn finish(self) -> Walked {
        let renames = self.substitution();
        let Walker {
            left,
            right,
            pending,
            pruned,
            ..
        } = self;

        let mut obligations = Vec::new();
        let mut settled = 0;
        for p in pending {
            let renamed = p.right.rename_fields(&renames);
            if assertions_equal(&p.left, &renamed) == Comparison::Equal {
                trace!("{}: settled by normalization", p.location);
                settled += 1;
                continue;
            }

            let right_table: FieldTable = field_table(right, &p.right)
                .into_iter()
                .map(|(field, spec)| (renames.get(&field).cloned().unwrap_or(field), spec))
                .collect();
            let mut fields = merge_tables(&field_table(left, &p.left), &right_table);
            if let Some(own) = p.fields {
                fields.extend(own);
            }
            debug!("{}: obligation {} vs {}", p.location, p.left, renamed);
            obligations.push(Obligation {
                location: p.location,
                left: p.left,
                right: renamed,
                fields,
            });
        }

        Walked {
            obligations,
            settled,
            renames,
            pruned,
        }
    }

    /// The pairing without identities, plus fresh names for unpaired right
    /// fields that a renamed field would otherwise capture
    fn substitution(&self) -> Renames {
        let mut renames: Renames = self
            .paired
            .iter()
            .filter(|(from, to)| from != to)
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect();

        let mut taken: BTreeSet<String> = renames.values().cloned().collect();
        let captured: Vec<String> = self
            .right
            .fields()
            .keys()
            .filter(|field| !self.paired.contains_key(*field) && taken.contains(*field))
            .cloned()
            .collect();
        for field in captured {
            let mut fresh = format!("{}'", field);
            while taken.contains(&fresh)
                || self.left.fields().contains_key(&fresh)
                || self.right.fields().contains_key(&fresh)
            {
                fresh.push('\'');
            }
            debug!("right field {} compared as {}", field, fresh);
            taken.insert(fresh.clone());
            renames.insert(field, fresh);
        }
        renames
    }

    fn pair_fields(&mut self, left: &str, right: &str) {
        match self.paired.get(right) {
            Some(existing) if existing != left => debug!(
                "right field {} already stands for {}, not {}",
                right, existing, left
            ),
            Some(_) => {}
            None => {
                self.paired.insert(right.to_string(), left.to_string());
            }
        }
    }

    fn productions(
        &mut self,
        a: ProductionId,
        b: ProductionId,
        parent: Option<&str>,
    ) -> Result<Walk, EquivalenceError> {
        let key = (a, b);
        if self.done.contains(&key) {
            return Ok(Walk::Same);
        }
        if self.active.contains(&key) {
            trace!("assuming {:?} equivalent on re-entry", key);
            return Ok(Walk::Same);
        }

        let (left, right) = (self.left, self.right);
        let (pa, pb) = (left.by_id(a), right.by_id(b));
        let label = if pa.name == pb.name {
            pa.name.clone()
        } else {
            format!("{}~{}", pa.name, pb.name)
        };
        let location = match parent {
            Some(parent) => format!("{}/{}", parent, label),
            None => label,
        };

        self.active.insert(key);
        let result = self.rhs(a, b, &location);
        self.active.remove(&key);

        if let Ok(Walk::Same) = result {
            self.done.insert(key);
        }
        result
    }

    fn rhs(&mut self, a: ProductionId, b: ProductionId, location: &str) -> Result<Walk, EquivalenceError> {
        let (left, right) = (self.left, self.right);
        let (pa, pb) = (left.by_id(a), right.by_id(b));
        let assertions_a: Vec<&Assertion> = pa.assertions.iter().collect();
        let assertions_b: Vec<&Assertion> = pb.assertions.iter().collect();

        match (&pa.rhs, &pb.rhs) {
            (Rhs::Conjunction(items_a), Rhs::Conjunction(items_b)) => {
                walk_try!(self.sequences(items_a, &assertions_a, items_b, &assertions_b, location, false));
                Ok(Walk::Same)
            }
            (Rhs::Disjunction(alts_a), Rhs::Disjunction(alts_b)) => {
                // Production assertions constrain whichever alternative matched
                let groups = match group_alternatives(left, alts_a, right, alts_b, self.shape_depth) {
                    Ok(groups) => groups,
                    Err(mismatch) => {
                        let (kept_a, mut dropped) = self.prune(Side::Left, a, alts_a, &assertions_a, location)?;
                        let (kept_b, dropped_b) = self.prune(Side::Right, b, alts_b, &assertions_b, location)?;
                        if dropped.is_empty() && dropped_b.is_empty() {
                            return one_sided(location, mismatch);
                        }
                        let groups = match group_alternatives(left, kept_a, right, kept_b, self.shape_depth) {
                            Ok(groups) => groups,
                            Err(mismatch) => return one_sided(location, mismatch),
                        };
                        dropped.extend(dropped_b);
                        self.pruned.extend(dropped);
                        groups
                    }
                };
                for group in groups {
                    walk_try!(self.group(a, b, &group, &assertions_a, &assertions_b, location));
                }
                Ok(Walk::Same)
            }
            (rhs_a, rhs_b) => differ(location, format!("{} vs {}", rhs_a.kind(), rhs_b.kind())),
        }
    }

    /// Alternatives of production `id` on `side` that may match, and a
    /// justification for each one dropped. A side whose alternatives all
    /// conflict is kept whole.
    fn prune(
        &self,
        side: Side,
        id: ProductionId,
        alts: &'g [Alternative],
        context: &[&Assertion],
        location: &str,
    ) -> Result<(Vec<&'g Alternative>, Vec<Justification>), EquivalenceError> {
        let grammar = match side {
            Side::Left => self.left,
            Side::Right => self.right,
        };
        let mut kept = Vec::with_capacity(alts.len());
        let mut dropped = Vec::new();
        for (i, alt) in alts.iter().enumerate() {
            let formula = constrained(context, FormulaBuilder::new(grammar).within(id).alternative(alt));
            match self.conflict(grammar, &formula)? {
                Some(because) => {
                    debug!("{}#{}: {} alternative {} never matches", location, i, side, formula);
                    dropped.push(Justification::conflict(
                        side,
                        format!("{}#{}", location, i),
                        because,
                        formula.to_string(),
                    ));
                }
                None => kept.push(alt),
            }
        }
        if kept.is_empty() {
            return Ok((alts.iter().collect(), Vec::new()));
        }
        Ok((kept, dropped))
    }

    /// Conjuncts of `formula` that cannot hold together, `None` if it may hold
    fn conflict(&self, grammar: &Grammar, formula: &Formula) -> Result<Option<Vec<String>>, EquivalenceError> {
        let conjuncts = formula.conjuncts();
        let all = || conjuncts.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        if normalize(formula) == Formula::False {
            return Ok(Some(all()));
        }
        let Some(pruning) = self.pruning else {
            return Ok(None);
        };

        let fields = field_table(grammar, formula);
        if pruning.justify {
            match pruning.oracle.unsat_core(&conjuncts, &fields, pruning.timeout)? {
                CoreOutcome::Core(indices) => Ok(Some(
                    indices.iter().map(|i| conjuncts[*i].to_string()).collect(),
                )),
                CoreOutcome::Satisfiable | CoreOutcome::Unknown(_) => Ok(None),
            }
        } else {
            match pruning.oracle.check_sat(formula, &fields, pruning.timeout)? {
                SatOutcome::Unsat => Ok(Some(all())),
                SatOutcome::Sat(_) | SatOutcome::Unknown(_) => Ok(None),
            }
        }
    }

    fn group(
        &mut self,
        a: ProductionId,
        b: ProductionId,
        group: &ShapeGroup<'_>,
        context_a: &[&Assertion],
        context_b: &[&Assertion],
        location: &str,
    ) -> Result<Walk, EquivalenceError> {
        let location = format!("{}{{{}}}", location, group.shape);

        if group.is_pairwise() {
            let (alt_a, alt_b): (&Alternative, &Alternative) = (group.left[0], group.right[0]);
            let assertions_a: Vec<&Assertion> = alt_a.guards.iter().chain(context_a.iter().copied()).collect();
            let assertions_b: Vec<&Assertion> = alt_b.guards.iter().chain(context_b.iter().copied()).collect();
            return self.sequences(&alt_a.items, &assertions_a, &alt_b.items, &assertions_b, &location, true);
        }

        debug!(
            "{}: merging {} left and {} right alternatives",
            location,
            group.left.len(),
            group.right.len()
        );
        // Each right alternative is read against the left one in the same
        // position, or the first when the right side has more
        for (j, alt_b) in group.right.iter().enumerate() {
            if let Some(alt_a) = group.left.get(j).or_else(|| group.left.first()) {
                for (x, y) in alt_a.items.iter().zip(&alt_b.items) {
                    if let (RhsItem::Terminal(ta), RhsItem::Terminal(tb)) = (x, y) {
                        self.pair_fields(&ta.field, &tb.field);
                    }
                }
            }
        }
        let left = constrained(context_a, FormulaBuilder::new(self.left).within(a).alternatives(&group.left));
        let right = constrained(context_b, FormulaBuilder::new(self.right).within(b).alternatives(&group.right));
        self.obligation(location, left, right, None);
        Ok(Walk::Same)
    }

    /// Compare two item sequences with the assertions that constrain them.
    ///
    /// Assertions mentioning only one terminal's field are compared together
    /// with that terminal; the rest form one obligation. In a pairwise shape
    /// group the two sequences already agree structurally, so a structural
    /// difference here is an internal error.
    fn sequences(
        &mut self,
        items_a: &[RhsItem],
        assertions_a: &[&Assertion],
        items_b: &[RhsItem],
        assertions_b: &[&Assertion],
        location: &str,
        same_shape: bool,
    ) -> Result<Walk, EquivalenceError> {
        let structural = |reason: String| -> Result<Walk, EquivalenceError> {
            if same_shape {
                Err(EquivalenceError::Internal(format!(
                    "shape grouping and structural comparison disagree at {}: {}",
                    location, reason
                )))
            } else {
                differ(location, reason)
            }
        };

        if items_a.len() != items_b.len() {
            return structural(format!("{} items vs {}", items_a.len(), items_b.len()));
        }

        for (i, (x, y)) in items_a.iter().zip(items_b).enumerate() {
            let item_location = format!("{}[{}]", location, i);
            match (x, y) {
                (RhsItem::Terminal(ta), RhsItem::Terminal(tb)) => {
                    if ta.spec != tb.spec {
                        return structural(format!(
                            "{} vs {} at item {}",
                            ta.spec, tb.spec, i
                        ));
                    }
                    self.terminals(ta, assertions_a, tb, assertions_b, item_location);
                }
                (RhsItem::Nonterminal(na), RhsItem::Nonterminal(nb)) => {
                    let (Some(ia), Some(ib)) = (self.left.id_of(na), self.right.id_of(nb)) else {
                        return Err(EquivalenceError::Internal(format!(
                            "unresolved nonterminal {} or {} at {}",
                            na, nb, item_location
                        )));
                    };
                    walk_try!(self.productions(ia, ib, Some(location)));
                }
                (x, y) => {
                    return structural(format!("{} vs {} at item {}", x.kind(), y.kind(), i));
                }
            }
        }

        let residual_a = residual(items_a, assertions_a);
        let residual_b = residual(items_b, assertions_b);
        if !residual_a.is_empty() || !residual_b.is_empty() {
            self.obligation(
                location.to_string(),
                Formula::all_of(residual_a),
                Formula::all_of(residual_b),
                None,
            );
        }
        Ok(Walk::Same)
    }

    fn terminals(
        &mut self,
        ta: &Terminal,
        assertions_a: &[&Assertion],
        tb: &Terminal,
        assertions_b: &[&Assertion],
        location: String,
    ) {
        self.pair_fields(&ta.field, &tb.field);
        let left = Formula::all_of(ta.assertions.iter().chain(attached(ta, assertions_a)));
        let right = Formula::all_of(tb.assertions.iter().chain(attached(tb, assertions_b)));
        let mut fields = FieldTable::new();
        fields.insert(ta.field.clone(), ta.spec);
        self.obligation(location, left, right, Some(fields));
    }

    fn obligation(&mut self, location: String, left: Formula, right: Formula, fields: Option<FieldTable>) {
        self.pending.push(Pending {
            location,
            left,
            right,
            fields,
        });
    }
}

/// `formula` under the assertions of the production it belongs to
fn constrained(context: &[&Assertion], formula: Formula) -> Formula {
    let parts: Vec<Formula> = context
        .iter()
        .map(|a| Formula::Atom((*a).clone()))
        .chain(std::iter::once(formula))
        .filter(|f| !f.is_true())
        .collect();
    Formula::and(parts)
}

/// Assertions that constrain only `terminal`'s field
fn attached<'a>(terminal: &'a Terminal, assertions: &'a [&'a Assertion]) -> impl Iterator<Item = &'a Assertion> + 'a {
    assertions
        .iter()
        .copied()
        .filter(move |a| a.only_mentions(&terminal.field))
}

/// Assertions not attached to any terminal of the sequence
fn residual<'a>(items: &[RhsItem], assertions: &[&'a Assertion]) -> Vec<&'a Assertion> {
    assertions
        .iter()
        .copied()
        .filter(|a| {
            !items.iter().any(|item| match item {
                RhsItem::Terminal(t) => a.only_mentions(&t.field),
                RhsItem::Nonterminal(_) => false,
            })
        })
        .collect()
}
