//! Productions and validated grammars

use crate::assertion::Assertion;
use crate::error::GrammarError;
use crate::grammar::types::{Alternative, ByteSpec, Rhs, RhsItem, Terminal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A named rewrite rule with its unconditional assertions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub name: String,
    pub rhs: Rhs,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

impl Production {
    pub fn conjunction(name: impl Into<String>, items: Vec<RhsItem>) -> Self {
        Self {
            name: name.into(),
            rhs: Rhs::Conjunction(items),
            assertions: Vec::new(),
        }
    }

    pub fn disjunction(name: impl Into<String>, alternatives: Vec<Alternative>) -> Self {
        Self {
            name: name.into(),
            rhs: Rhs::Disjunction(alternatives),
            assertions: Vec::new(),
        }
    }

    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Terminals appearing directly in this production
    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.rhs.items().filter_map(|item| match item {
            RhsItem::Terminal(t) => Some(t),
            RhsItem::Nonterminal(_) => None,
        })
    }

    /// Nonterminals referenced directly by this production
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.rhs.items().filter_map(|item| match item {
            RhsItem::Nonterminal(name) => Some(name.as_str()),
            RhsItem::Terminal(_) => None,
        })
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[RhsItem]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} := ", self.name)?;
        match &self.rhs {
            Rhs::Conjunction(items) => write_items(f, items)?,
            Rhs::Disjunction(alts) => {
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write_items(f, &alt.items)?;
                    for guard in &alt.guards {
                        write!(f, " [{}]", guard)?;
                    }
                }
            }
        }
        write!(f, ";")?;
        for terminal in self.terminals() {
            for assertion in &terminal.assertions {
                write!(f, "\n     assert({})", assertion)?;
            }
        }
        for assertion in &self.assertions {
            write!(f, "\n     assert({})", assertion)?;
        }
        Ok(())
    }
}

/// Index of a production within its grammar
pub type ProductionId = usize;

/// An immutable, well-formed grammar. The first production is the start symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Production>", into = "Vec<Production>")]
pub struct Grammar {
    productions: Vec<Production>,
    index: HashMap<String, ProductionId>,
    fields: BTreeMap<String, ByteSpec>,
}

impl Grammar {
    /// Build a grammar, checking that it is well formed
    pub fn new(productions: Vec<Production>) -> Result<Self, GrammarError> {
        if productions.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut index = HashMap::with_capacity(productions.len());
        for (id, production) in productions.iter().enumerate() {
            if index.insert(production.name.clone(), id).is_some() {
                return Err(GrammarError::DuplicateProduction(production.name.clone()));
            }
        }

        let mut fields: BTreeMap<String, ByteSpec> = BTreeMap::new();
        for production in &productions {
            if let Rhs::Disjunction(alts) = &production.rhs {
                if alts.is_empty() {
                    return Err(GrammarError::EmptyDisjunction(production.name.clone()));
                }
            }
            for name in production.references() {
                if !index.contains_key(name) {
                    return Err(GrammarError::UndefinedNonterminal {
                        production: production.name.clone(),
                        name: name.to_string(),
                    });
                }
            }
            for terminal in production.terminals() {
                if !terminal.spec.is_valid() {
                    return Err(GrammarError::InvalidWidth {
                        field: terminal.field.clone(),
                        spec: terminal.spec,
                    });
                }
                match fields.get(&terminal.field) {
                    Some(existing) if *existing != terminal.spec => {
                        return Err(GrammarError::ConflictingField {
                            field: terminal.field.clone(),
                            first: *existing,
                            second: terminal.spec,
                        });
                    }
                    Some(_) => {}
                    None => {
                        fields.insert(terminal.field.clone(), terminal.spec);
                    }
                }
            }
        }

        let grammar = Self {
            productions,
            index,
            fields,
        };
        grammar.check_assertion_fields()?;
        Ok(grammar)
    }

    fn check_assertion_fields(&self) -> Result<(), GrammarError> {
        for production in &self.productions {
            let mut mentioned = BTreeSet::new();
            for assertion in &production.assertions {
                assertion.collect_fields(&mut mentioned);
            }
            for terminal in production.terminals() {
                for assertion in &terminal.assertions {
                    assertion.collect_fields(&mut mentioned);
                }
            }
            if let Rhs::Disjunction(alts) = &production.rhs {
                for guard in alts.iter().flat_map(|a| a.guards.iter()) {
                    guard.collect_fields(&mut mentioned);
                }
            }
            if let Some(field) = mentioned.iter().find(|f| !self.fields.contains_key(**f)) {
                return Err(GrammarError::UndeclaredField {
                    production: production.name.clone(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a grammar from JSON
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let productions: Vec<Production> =
            serde_json::from_str(json).map_err(|e| GrammarError::Decode(e.to_string()))?;
        Self::new(productions)
    }

    pub fn start(&self) -> &Production {
        &self.productions[0]
    }

    pub fn start_id(&self) -> ProductionId {
        0
    }

    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id)
    }

    /// Production for an id obtained from this grammar
    pub(crate) fn by_id(&self, id: ProductionId) -> &Production {
        &self.productions[id]
    }

    pub fn id_of(&self, name: &str) -> Option<ProductionId> {
        self.index.get(name).copied()
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Byte specifier bound to each field name
    pub fn fields(&self) -> &BTreeMap<String, ByteSpec> {
        &self.fields
    }

    pub fn field_spec(&self, field: &str) -> Option<ByteSpec> {
        self.fields.get(field).copied()
    }

    /// Productions that cannot be reached from the start symbol
    pub fn unreachable(&self) -> Vec<&str> {
        let mut seen = vec![false; self.productions.len()];
        let mut stack = vec![self.start_id()];
        seen[0] = true;
        while let Some(id) = stack.pop() {
            for name in self.productions[id].references() {
                if let Some(next) = self.id_of(name) {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
        }
        self.productions
            .iter()
            .zip(seen)
            .filter(|(_, reached)| !reached)
            .map(|(p, _)| p.name.as_str())
            .collect()
    }
}

impl TryFrom<Vec<Production>> for Grammar {
    type Error = GrammarError;

    fn try_from(productions: Vec<Production>) -> Result<Self, Self::Error> {
        Grammar::new(productions)
    }
}

impl From<Grammar> for Vec<Production> {
    fn from(grammar: Grammar) -> Self {
        grammar.productions
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, production) in self.productions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", production)?;
        }
        Ok(())
    }
}

/// Anything that can hand over a grammar: an inference pass, a format description
/// loader, or an already-built grammar.
pub trait GrammarSource {
    fn grammar(&self) -> Result<Grammar, GrammarError>;
}

impl GrammarSource for Grammar {
    fn grammar(&self) -> Result<Grammar, GrammarError> {
        Ok(self.clone())
    }
}

impl GrammarSource for str {
    fn grammar(&self) -> Result<Grammar, GrammarError> {
        Grammar::from_json(self)
    }
}
