//! Core types for the grammar model

use crate::assertion::Assertion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest length tracked for a delimited region
pub const MAX_DELIMITED_LEN: u64 = u16::MAX as u64;

/// How a terminal carves its bytes out of the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteSpec {
    /// A fixed number of bytes (1..=8), read as an unsigned big-endian value
    Fixed(u8),
    /// A region ended by the given delimiter byte; its value is the region length
    Delimited(u8),
}

impl ByteSpec {
    /// Largest value a field of this spec can take
    pub fn max_value(&self) -> u64 {
        match self {
            ByteSpec::Fixed(n) if *n >= 8 => u64::MAX,
            ByteSpec::Fixed(n) => (1u64 << (8 * u32::from(*n))) - 1,
            ByteSpec::Delimited(_) => MAX_DELIMITED_LEN,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            ByteSpec::Fixed(n) => (1..=8).contains(n),
            ByteSpec::Delimited(_) => true,
        }
    }
}

impl fmt::Display for ByteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteSpec::Fixed(n) => write!(f, "len={}", n),
            ByteSpec::Delimited(d) => write!(f, "until=0x{:02x}", d),
        }
    }
}

/// A terminal: a named byte field and the assertions attached to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub field: String,
    pub spec: ByteSpec,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

impl Terminal {
    /// Create a fixed-size terminal without assertions
    pub fn fixed(field: impl Into<String>, len: u8) -> Self {
        Self {
            field: field.into(),
            spec: ByteSpec::Fixed(len),
            assertions: Vec::new(),
        }
    }

    /// Create a delimited terminal without assertions
    pub fn delimited(field: impl Into<String>, delimiter: u8) -> Self {
        Self {
            field: field.into(),
            spec: ByteSpec::Delimited(delimiter),
            assertions: Vec::new(),
        }
    }

    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B[{}:{}]", self.field, self.spec)
    }
}

/// One item of a right-hand side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhsItem {
    Terminal(Terminal),
    Nonterminal(String),
}

impl RhsItem {
    pub fn nonterminal(name: impl Into<String>) -> Self {
        RhsItem::Nonterminal(name.into())
    }

    /// Short kind name used in mismatch reports
    pub fn kind(&self) -> &'static str {
        match self {
            RhsItem::Terminal(_) => "terminal",
            RhsItem::Nonterminal(_) => "nonterminal",
        }
    }
}

impl From<Terminal> for RhsItem {
    fn from(terminal: Terminal) -> Self {
        RhsItem::Terminal(terminal)
    }
}

impl fmt::Display for RhsItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RhsItem::Terminal(t) => write!(f, "{}", t),
            RhsItem::Nonterminal(name) => write!(f, "{}", name),
        }
    }
}

/// One alternative of a disjunction, with the assertions guarding it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub items: Vec<RhsItem>,
    #[serde(default)]
    pub guards: Vec<Assertion>,
}

impl Alternative {
    pub fn new(items: Vec<RhsItem>) -> Self {
        Self {
            items,
            guards: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: Assertion) -> Self {
        self.guards.push(guard);
        self
    }
}

/// Right-hand side of a production
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rhs {
    Conjunction(Vec<RhsItem>),
    Disjunction(Vec<Alternative>),
}

impl Rhs {
    /// Iterate over every item of every alternative
    pub fn items(&self) -> Box<dyn Iterator<Item = &RhsItem> + '_> {
        match self {
            Rhs::Conjunction(items) => Box::new(items.iter()),
            Rhs::Disjunction(alts) => Box::new(alts.iter().flat_map(|a| a.items.iter())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Rhs::Conjunction(_) => "conjunction",
            Rhs::Disjunction(_) => "disjunction",
        }
    }
}
