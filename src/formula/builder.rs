//! Translation of grammar assertions into formulas

use crate::formula::Formula;
use crate::grammar::{Alternative, Grammar, ProductionId, Rhs, RhsItem, Terminal};

/// Builds formulas summarizing what a part of a grammar asserts.
///
/// Nonterminals are expanded in place. A production already being expanded
/// on the current path contributes `True`, which over-approximates recursive
/// constructs instead of unrolling them forever.
pub struct FormulaBuilder<'g> {
    grammar: &'g Grammar,
    stack: Vec<ProductionId>,
}

impl<'g> FormulaBuilder<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            stack: Vec::new(),
        }
    }

    /// Treat `id` as already being expanded
    pub fn within(mut self, id: ProductionId) -> Self {
        self.stack.push(id);
        self
    }

    pub fn terminal(&self, terminal: &Terminal) -> Formula {
        Formula::all_of(&terminal.assertions)
    }

    /// Summary of a production: its own assertions and those of everything it expands to
    pub fn production(&mut self, id: ProductionId) -> Formula {
        if self.stack.contains(&id) {
            return Formula::True;
        }
        self.stack.push(id);

        let grammar = self.grammar;
        let production = grammar.by_id(id);
        let mut parts: Vec<Formula> = production
            .assertions
            .iter()
            .cloned()
            .map(Formula::Atom)
            .collect();
        match &production.rhs {
            Rhs::Conjunction(items) => {
                for item in items {
                    parts.push(self.item(item));
                }
            }
            Rhs::Disjunction(alts) => {
                let cases = alts.iter().map(|alt| self.alternative(alt)).collect();
                parts.push(Formula::or(cases));
            }
        }

        self.stack.pop();
        Formula::and(parts.into_iter().filter(|p| !p.is_true()).collect())
    }

    pub fn item(&mut self, item: &RhsItem) -> Formula {
        match item {
            RhsItem::Terminal(t) => self.terminal(t),
            // Names are checked when the grammar is built
            RhsItem::Nonterminal(name) => match self.grammar.id_of(name) {
                Some(id) => self.production(id),
                None => Formula::True,
            },
        }
    }

    /// Guards of one alternative conjoined with what its items assert
    pub fn alternative(&mut self, alt: &Alternative) -> Formula {
        let mut parts: Vec<Formula> = alt.guards.iter().cloned().map(Formula::Atom).collect();
        for item in &alt.items {
            parts.push(self.item(item));
        }
        Formula::and(parts.into_iter().filter(|p| !p.is_true()).collect())
    }

    /// Disjunction over alternatives of their conjoined assertions
    pub fn alternatives(&mut self, alts: &[&Alternative]) -> Formula {
        Formula::or(alts.iter().map(|alt| self.alternative(alt)).collect())
    }
}

/// Build the formula of a group of alternatives: each alternative's
/// assertions conjoined, the alternatives disjoined
pub fn build_formula(grammar: &Grammar, alternatives: &[&Alternative]) -> Formula {
    FormulaBuilder::new(grammar).alternatives(alternatives)
}

/// Summary formula of the named production, `None` if it is not defined
pub fn production_formula(grammar: &Grammar, name: &str) -> Option<Formula> {
    let id = grammar.id_of(name)?;
    Some(FormulaBuilder::new(grammar).production(id))
}
