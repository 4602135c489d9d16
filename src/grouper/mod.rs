//! Grouping of disjunction alternatives by structural shape
//!
//! Two alternatives share a shape when they are the same sequence of
//! terminals and nonterminals, up to their assertions. Nonterminals are
//! unrolled a bounded number of levels, which keeps shape computation total
//! on recursive grammars.

pub mod shape;

use crate::grammar::{Alternative, Grammar};
use crate::oracle::Side;
use log::trace;
use std::collections::BTreeMap;

pub use shape::{ItemShape, ProductionShape, Shape, ShapeCache};

/// Default number of nonterminal levels unrolled into a shape
pub const DEFAULT_SHAPE_DEPTH: usize = 4;

/// Alternatives of both disjunctions that share one shape
#[derive(Debug, Clone)]
pub struct ShapeGroup<'a> {
    pub shape: Shape,
    pub left: Vec<&'a Alternative>,
    pub right: Vec<&'a Alternative>,
}

impl ShapeGroup<'_> {
    /// Exactly one alternative on each side
    pub fn is_pairwise(&self) -> bool {
        self.left.len() == 1 && self.right.len() == 1
    }
}

/// A shape produced by only one of the two disjunctions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub shape: Shape,
    pub only_in: Side,
}

/// Partition the alternatives of two disjunctions by shape.
///
/// Groups come back in shape order, so the result does not depend on the
/// order of the alternatives. Fails on the first shape (in that order)
/// present on one side only.
pub fn group_alternatives<'a>(
    left_grammar: &Grammar,
    left: impl IntoIterator<Item = &'a Alternative>,
    right_grammar: &Grammar,
    right: impl IntoIterator<Item = &'a Alternative>,
    depth: usize,
) -> Result<Vec<ShapeGroup<'a>>, ShapeMismatch> {
    let mut groups: BTreeMap<Shape, (Vec<&'a Alternative>, Vec<&'a Alternative>)> =
        BTreeMap::new();

    let mut left_shapes = ShapeCache::new(left_grammar, depth);
    for alt in left {
        let shape = left_shapes.alternative(alt);
        groups.entry(shape).or_default().0.push(alt);
    }
    let mut right_shapes = ShapeCache::new(right_grammar, depth);
    for alt in right {
        let shape = right_shapes.alternative(alt);
        groups.entry(shape).or_default().1.push(alt);
    }

    let mut result = Vec::with_capacity(groups.len());
    for (shape, (l, r)) in groups {
        if l.is_empty() {
            return Err(ShapeMismatch {
                shape,
                only_in: Side::Right,
            });
        }
        if r.is_empty() {
            return Err(ShapeMismatch {
                shape,
                only_in: Side::Left,
            });
        }
        trace!("shape {}: {} left, {} right", shape, l.len(), r.len());
        result.push(ShapeGroup {
            shape,
            left: l,
            right: r,
        });
    }
    Ok(result)
}
