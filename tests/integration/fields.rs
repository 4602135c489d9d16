use crate::common::{byte, single_value};
use bnf_equiv::{
    compare, production_formula, Alternative, CountingOracle, EquivalenceChecker,
    EquivalenceConfig, Evidence, Grammar, JustificationKind, Production, Side, Term, Terminal,
    Verdict, Witness, Z3Oracle,
};
use std::sync::Arc;

/// Start := B[field] with `field < bound`
fn bounded(field: &str, bound: i64) -> Grammar {
    Grammar::new(vec![Production::conjunction(
        "Start",
        vec![Terminal::fixed(field, 1)
            .with_assertion(Term::field(field).less_than(bound))
            .into()],
    )])
    .unwrap()
}

/// S := B[field] (field < 3) | B[field] (field > `high`)
fn outside(field: &str, high: i64) -> Grammar {
    Grammar::new(vec![Production::disjunction(
        "S",
        vec![
            Alternative::new(vec![byte(field)]).with_guard(Term::field(field).less_than(3)),
            Alternative::new(vec![byte(field)]).with_guard(Term::field(field).greater_than(high)),
        ],
    )])
    .unwrap()
}

/// S := B[first] B[second] with `first < second`, or `first <= second` when not `strict`
fn ordered(first: &str, second: &str, strict: bool) -> Grammar {
    let relation = if strict {
        Term::field(first).less_than(second)
    } else {
        Term::field(first).at_most(second)
    };
    Grammar::new(vec![
        Production::conjunction("S", vec![byte(first), byte(second)]).with_assertion(relation),
    ])
    .unwrap()
}

/// Checks that `verdict`'s witness is accepted by exactly one grammar, each
/// read in its own field names
fn assert_separates(verdict: &Verdict, left: &Grammar, left_start: &str, right: &Grammar, right_start: &str) {
    let for_left = verdict.witness_for(Side::Left).expect("distinct verdict");
    let for_right = verdict.witness_for(Side::Right).expect("distinct verdict");
    let accepted_left = production_formula(left, left_start).unwrap().eval(&for_left);
    let accepted_right = production_formula(right, right_start).unwrap().eval(&for_right);
    assert!(accepted_left.is_some(), "witness {} misses a left field", for_left);
    assert!(accepted_right.is_some(), "witness {} misses a right field", for_right);
    assert_ne!(accepted_left, accepted_right);
}

#[test]
fn test_renamed_terminal_equivalent() {
    let verdict = compare(&single_value(Term::field("value").less_than(10)), &bounded("v", 10)).unwrap();
    assert!(verdict.is_equivalent());
}

#[test]
fn test_renamed_terminal_witness_holds_for_both_grammars() {
    let left = single_value(Term::field("value").less_than(10));
    let right = bounded("v", 5);
    let verdict = compare(&left, &right).unwrap();
    assert!(verdict.is_distinct());
    assert_separates(&verdict, &left, "Start", &right, "Start");

    let witness = verdict.witness().unwrap();
    assert_eq!(witness.get("v"), witness.get("value"));
    match &verdict {
        Verdict::Distinct { renamed, .. } => {
            assert_eq!(renamed.get("v").map(String::as_str), Some("value"))
        }
        other => panic!("expected distinct, got {:?}", other),
    }
}

#[test]
fn test_renamed_fields_in_merged_alternatives() {
    assert!(compare(&outside("x", 7), &outside("y", 7)).unwrap().is_equivalent());

    let (left, right) = (outside("x", 7), outside("y", 8));
    let verdict = compare(&left, &right).unwrap();
    match &verdict {
        Verdict::Distinct {
            evidence: Evidence::Assertions { accepted_by, .. },
            ..
        } => assert_eq!(*accepted_by, Side::Left),
        other => panic!("expected distinct, got {:?}", other),
    }
    assert_eq!(verdict.witness_for(Side::Right).unwrap().get("y"), Some(8));
    assert_separates(&verdict, &left, "S", &right, "S");
}

#[test]
fn test_renamed_fields_in_cross_field_assertions() {
    let counting = Arc::new(CountingOracle::new(Z3Oracle::new()));
    let checker = EquivalenceChecker::new(counting.clone());
    let verdict = checker.compare(&ordered("a", "b", true), &ordered("x", "y", true)).unwrap();
    assert!(verdict.is_equivalent());
    assert_eq!(counting.total_calls(), 0);

    let (left, right) = (ordered("a", "b", true), ordered("x", "y", false));
    let verdict = compare(&left, &right).unwrap();
    assert!(verdict.is_distinct());
    let for_right = verdict.witness_for(Side::Right).unwrap();
    assert_eq!(for_right.get("x"), for_right.get("y"));
    assert_separates(&verdict, &left, "S", &right, "S");
}

#[test]
fn test_swapped_field_names_keep_witness_per_side() {
    // Right reads the bytes under each other's names
    let (left, right) = (ordered("a", "b", true), ordered("b", "a", false));
    let verdict = compare(&left, &right).unwrap();
    assert!(verdict.is_distinct());
    assert_separates(&verdict, &left, "S", &right, "S");
}

#[test]
fn test_disjunction_assertion_matches_guard() {
    // S := D{B[x]} asserting x < 5, against the same bound as a guard
    let left = Grammar::new(vec![Production::disjunction(
        "S",
        vec![Alternative::new(vec![byte("x")])],
    )
    .with_assertion(Term::field("x").less_than(5))])
    .unwrap();
    let right = Grammar::new(vec![Production::disjunction(
        "S",
        vec![Alternative::new(vec![byte("x")]).with_guard(Term::field("x").less_than(5))],
    )])
    .unwrap();

    let counting = Arc::new(CountingOracle::new(Z3Oracle::new()));
    let checker = EquivalenceChecker::new(counting.clone());
    assert!(checker.compare(&left, &right).unwrap().is_equivalent());
    assert!(checker.compare(&right, &left).unwrap().is_equivalent());
    assert_eq!(counting.total_calls(), 0);
}

#[test]
fn test_disjunction_assertion_over_merged_alternatives() {
    // Left: (B[x] | B[x] (x > 200)) asserting x < 5; right: B[x] (x < 5) | B[x] (x < 2)
    let left = Grammar::new(vec![Production::disjunction(
        "S",
        vec![
            Alternative::new(vec![byte("x")]),
            Alternative::new(vec![byte("x")]).with_guard(Term::field("x").greater_than(200)),
        ],
    )
    .with_assertion(Term::field("x").less_than(5))])
    .unwrap();
    let right = Grammar::new(vec![Production::disjunction(
        "S",
        vec![
            Alternative::new(vec![byte("x")]).with_guard(Term::field("x").less_than(5)),
            Alternative::new(vec![byte("x")]).with_guard(Term::field("x").less_than(2)),
        ],
    )])
    .unwrap();
    assert!(compare(&left, &right).unwrap().is_equivalent());

    let looser = outside("x", 200);
    let verdict = compare(&left, &looser).unwrap();
    assert!(verdict.is_distinct());
    assert_separates(&verdict, &left, "S", &looser, "S");
}

/// S := D{B[x]}, plus an alternative B[x] B[y] guarded by x < 3 and x > 7
/// when `with_conflict`
fn with_dead_alternative(with_conflict: bool) -> Grammar {
    let mut alternatives = vec![Alternative::new(vec![byte("x")])];
    if with_conflict {
        alternatives.push(
            Alternative::new(vec![byte("x"), byte("y")])
                .with_guard(Term::field("x").less_than(3))
                .with_guard(Term::field("x").greater_than(7)),
        );
    }
    Grammar::new(vec![Production::disjunction("S", alternatives)]).unwrap()
}

#[test]
fn test_conflicting_alternative_is_dropped() {
    let left = with_dead_alternative(false);
    let right = with_dead_alternative(true);

    match compare(&left, &right).unwrap() {
        Verdict::Equivalent { justifications } => {
            let conflict = justifications
                .iter()
                .find(|j| j.kind == JustificationKind::Conflict)
                .expect("dropped alternative is justified");
            assert_eq!(conflict.premise, Side::Right);
            assert_eq!(conflict.location, "S#1");
            assert_eq!(conflict.because.len(), 2);
            assert!(format!("{}", conflict).contains("never matches"));
        }
        other => panic!("expected equivalent, got {:?}", other),
    }
    assert!(compare(&right, &left).unwrap().is_equivalent());
}

#[test]
fn test_conflict_pruning_without_justification() {
    let checker = EquivalenceChecker::default()
        .with_config(EquivalenceConfig::default().with_justification(false));
    let verdict = checker
        .compare(&with_dead_alternative(false), &with_dead_alternative(true))
        .unwrap();
    assert_eq!(verdict, Verdict::equivalent());
}

#[test]
fn test_conflict_pruning_disabled_reports_shape() {
    let checker = EquivalenceChecker::default()
        .with_config(EquivalenceConfig::default().with_pruning(false));
    let verdict = checker
        .compare(&with_dead_alternative(false), &with_dead_alternative(true))
        .unwrap();
    match verdict {
        Verdict::Distinct {
            witness,
            evidence: Evidence::Structural { reason, .. },
            ..
        } => {
            assert_eq!(witness, Witness::new());
            assert!(reason.contains("right"));
        }
        other => panic!("expected structural difference, got {:?}", other),
    }
}
