use crate::common::{byte, single_value, Unavailable};
use bnf_equiv::{
    compare, Alternative, Assertion, CountingOracle, EquivalenceChecker, Evidence, Grammar,
    Production, RhsItem, Side, Term, Terminal, Verdict, VerdictKind, Z3Oracle,
};
use std::sync::Arc;

fn message() -> Grammar {
    // Start := B[kind] Body
    // Body  := B[short] (kind < 16) | B[a] B[b] (a + b == 255)
    Grammar::new(vec![
        Production::conjunction(
            "Start",
            vec![
                Terminal::fixed("kind", 1)
                    .with_assertion(Term::field("kind").in_range(1, 32))
                    .into(),
                RhsItem::nonterminal("Body"),
            ],
        ),
        Production::disjunction(
            "Body",
            vec![
                Alternative::new(vec![byte("short")]).with_guard(Term::field("kind").less_than(16)),
                Alternative::new(vec![byte("a"), byte("b")])
                    .with_guard(Term::field("a").plus(Term::field("b")).equals(255)),
            ],
        ),
    ])
    .unwrap()
}

#[test]
fn test_reflexive_without_oracle_calls() {
    let counting = Arc::new(CountingOracle::new(Z3Oracle::new()));
    let checker = EquivalenceChecker::new(counting.clone());

    for grammar in [message(), single_value(Term::field("value").less_than(10))] {
        assert_eq!(checker.compare(&grammar, &grammar).unwrap(), Verdict::equivalent());
    }
    assert_eq!(counting.total_calls(), 0);
}

#[test]
fn test_reflexive_even_when_oracle_unavailable() {
    let checker = EquivalenceChecker::new(Arc::new(Unavailable));
    let grammar = message();
    assert!(checker.compare(&grammar, &grammar).unwrap().is_equivalent());
}

#[test]
fn test_symmetric_verdicts() {
    let grammars = [
        single_value(Term::field("value").less_than(10)),
        single_value(Term::field("value").at_most(9)),
        single_value(Term::field("value").less_than(5)),
        message(),
    ];
    for a in &grammars {
        for b in &grammars {
            let ab = compare(a, b).unwrap();
            let ba = compare(b, a).unwrap();
            assert_eq!(ab.kind(), ba.kind(), "{} vs {}", a, b);
        }
    }
}

#[test]
fn test_distinct_sides_swap_with_arguments() {
    let a = single_value(Term::field("value").less_than(10));
    let b = single_value(Term::field("value").less_than(5));
    let side = |verdict: Verdict| match verdict {
        Verdict::Distinct {
            evidence: Evidence::Assertions { accepted_by, .. },
            ..
        } => accepted_by,
        other => panic!("expected distinct, got {:?}", other),
    };
    assert_eq!(side(compare(&a, &b).unwrap()), Side::Left);
    assert_eq!(side(compare(&b, &a).unwrap()), Side::Right);
}

#[test]
fn test_arity_mismatch_distinct_without_oracle() {
    let counting = Arc::new(CountingOracle::new(Z3Oracle::new()));
    let checker = EquivalenceChecker::new(counting.clone());
    let two = Grammar::new(vec![Production::conjunction("S", vec![byte("x"), byte("y")])]).unwrap();
    let three = Grammar::new(vec![Production::conjunction(
        "S",
        vec![byte("x"), byte("y"), byte("z")],
    )])
    .unwrap();

    let verdict = checker.compare(&two, &three).unwrap();
    match &verdict {
        Verdict::Distinct {
            witness,
            evidence: Evidence::Structural { location, .. },
            ..
        } => {
            assert!(witness.is_empty());
            assert_eq!(location, "S");
        }
        other => panic!("expected structural difference, got {:?}", other),
    }
    assert_eq!(counting.total_calls(), 0);
}

#[test]
fn test_split_alternatives_match_merged_guard() {
    // S := B[x] (x < 3) | B[x] (x > 7)   versus   S := B[x] (x < 3 || x > 7)
    let split = Grammar::new(vec![Production::disjunction(
        "S",
        vec![
            Alternative::new(vec![byte("x")]).with_guard(Term::field("x").less_than(3)),
            Alternative::new(vec![byte("x")]).with_guard(Term::field("x").greater_than(7)),
        ],
    )])
    .unwrap();
    let merged = |high: i64| {
        Grammar::new(vec![Production::disjunction(
            "S",
            vec![Alternative::new(vec![byte("x")]).with_guard(Assertion::Any(vec![
                Term::field("x").less_than(3),
                Term::field("x").greater_than(high),
            ]))],
        )])
        .unwrap()
    };

    assert!(compare(&split, &merged(7)).unwrap().is_equivalent());

    let verdict = compare(&split, &merged(8)).unwrap();
    assert_eq!(verdict.kind(), VerdictKind::Distinct);
    assert_eq!(verdict.witness().unwrap().get("x"), Some(8));
}

#[test]
fn test_shape_on_one_side_only_is_distinct() {
    let left = Grammar::new(vec![Production::disjunction(
        "S",
        vec![
            Alternative::new(vec![byte("x")]),
            Alternative::new(vec![byte("x"), byte("y")]),
        ],
    )])
    .unwrap();
    let right = Grammar::new(vec![Production::disjunction(
        "S",
        vec![Alternative::new(vec![byte("x")])],
    )])
    .unwrap();
    match compare(&left, &right).unwrap() {
        Verdict::Distinct {
            evidence: Evidence::Structural { reason, .. },
            ..
        } => assert!(reason.contains("left")),
        other => panic!("expected structural difference, got {:?}", other),
    }
}

#[test]
fn test_alternative_order_does_not_matter() {
    let alternatives = vec![
        Alternative::new(vec![byte("x")]).with_guard(Term::field("x").less_than(3)),
        Alternative::new(vec![byte("x"), byte("y")]),
        Alternative::new(vec![Terminal::fixed("w", 2).into()]),
    ];
    let mut reversed = alternatives.clone();
    reversed.reverse();
    let a = Grammar::new(vec![Production::disjunction("S", alternatives)]).unwrap();
    let b = Grammar::new(vec![Production::disjunction("S", reversed)]).unwrap();
    assert!(compare(&a, &b).unwrap().is_equivalent());
}
