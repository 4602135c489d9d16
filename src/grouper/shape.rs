//! Shapes: the structure of an alternative with its assertions erased

use crate::grammar::{Alternative, ByteSpec, Grammar, ProductionId, Rhs, RhsItem};
use std::collections::HashMap;
use std::fmt;

/// Shape of a single right-hand-side item
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemShape {
    Terminal(ByteSpec),
    Nonterminal(ProductionShape),
}

/// Shape of a production, unrolled to a fixed depth
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProductionShape {
    /// Unrolling stopped here
    Opaque,
    Sequence(Vec<ItemShape>),
    /// Sorted, de-duplicated shapes of the alternatives
    Choice(Vec<Shape>),
}

/// Shape of an alternative: the shapes of its items, in order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Shape(pub Vec<ItemShape>);

impl Shape {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Computes shapes for one grammar at a fixed depth, memoizing per
/// production and remaining depth
pub struct ShapeCache<'g> {
    grammar: &'g Grammar,
    depth: usize,
    memo: HashMap<(ProductionId, usize), ProductionShape>,
}

impl<'g> ShapeCache<'g> {
    pub fn new(grammar: &'g Grammar, depth: usize) -> Self {
        Self {
            grammar,
            depth,
            memo: HashMap::new(),
        }
    }

    pub fn alternative(&mut self, alt: &Alternative) -> Shape {
        self.items(&alt.items, self.depth)
    }

    pub fn production(&mut self, id: ProductionId) -> ProductionShape {
        self.production_at(id, self.depth)
    }

    fn items(&mut self, items: &[RhsItem], depth: usize) -> Shape {
        Shape(items.iter().map(|item| self.item(item, depth)).collect())
    }

    fn item(&mut self, item: &RhsItem, depth: usize) -> ItemShape {
        match item {
            RhsItem::Terminal(t) => ItemShape::Terminal(t.spec),
            RhsItem::Nonterminal(name) => match self.grammar.id_of(name) {
                Some(id) => ItemShape::Nonterminal(self.production_at(id, depth)),
                None => ItemShape::Nonterminal(ProductionShape::Opaque),
            },
        }
    }

    fn production_at(&mut self, id: ProductionId, depth: usize) -> ProductionShape {
        if depth == 0 {
            return ProductionShape::Opaque;
        }
        if let Some(shape) = self.memo.get(&(id, depth)) {
            return shape.clone();
        }
        let grammar = self.grammar;
        let shape = match &grammar.by_id(id).rhs {
            Rhs::Conjunction(items) => ProductionShape::Sequence(
                items.iter().map(|item| self.item(item, depth - 1)).collect(),
            ),
            Rhs::Disjunction(alts) => {
                let mut shapes: Vec<Shape> = alts
                    .iter()
                    .map(|alt| self.items(&alt.items, depth - 1))
                    .collect();
                shapes.sort();
                shapes.dedup();
                ProductionShape::Choice(shapes)
            }
        };
        self.memo.insert((id, depth), shape.clone());
        shape
    }
}

impl fmt::Display for ItemShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemShape::Terminal(spec) => write!(f, "B({})", spec),
            ItemShape::Nonterminal(p) => write!(f, "{}", p),
        }
    }
}

impl fmt::Display for ProductionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductionShape::Opaque => write!(f, "_"),
            ProductionShape::Sequence(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            ProductionShape::Choice(alts) => {
                write!(f, "(")?;
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", alt)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "]")
    }
}
