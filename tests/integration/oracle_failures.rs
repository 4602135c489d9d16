use crate::common::{single_value, GivesUpOn, Unavailable};
use bnf_equiv::{
    EquivalenceChecker, EquivalenceError, Grammar, OracleError, Production, Term, Terminal,
    Verdict,
};
use std::sync::Arc;

/// Start := B[slow] B[fast], each with an upper bound
fn two_fields(slow: i64, fast: i64) -> Grammar {
    Grammar::new(vec![Production::conjunction(
        "Start",
        vec![
            Terminal::fixed("slow", 1)
                .with_assertion(Term::field("slow").less_than(slow))
                .into(),
            Terminal::fixed("fast", 1)
                .with_assertion(Term::field("fast").less_than(fast))
                .into(),
        ],
    )])
    .unwrap()
}

#[test]
fn test_unknown_is_never_upgraded() {
    let checker = EquivalenceChecker::new(Arc::new(GivesUpOn::new("slow")));
    match checker.compare(&two_fields(10, 10), &two_fields(11, 10)).unwrap() {
        Verdict::Unknown { reason } => {
            assert!(reason.contains("Start[0]"));
            assert!(reason.contains("timeout"));
        }
        other => panic!("expected unknown, got {:?}", other),
    }
}

#[test]
fn test_difference_elsewhere_beats_unknown() {
    let checker = EquivalenceChecker::new(Arc::new(GivesUpOn::new("slow")));
    let verdict = checker
        .compare(&two_fields(10, 10), &two_fields(11, 5))
        .unwrap();
    assert!(verdict.is_distinct());
    let fast = verdict.witness().unwrap().get("fast").unwrap();
    assert!((5..10).contains(&fast));
}

#[test]
fn test_unavailable_oracle_is_an_error() {
    let checker = EquivalenceChecker::new(Arc::new(Unavailable));
    let err = checker
        .compare(
            &single_value(Term::field("value").less_than(10)),
            &single_value(Term::field("value").at_most(9)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EquivalenceError::Oracle(OracleError::Unavailable(_))
    ));
}

#[test]
fn test_malformed_source_is_an_error() {
    let checker = EquivalenceChecker::default();
    let dangling = r#"[{"name":"S","rhs":{"conjunction":[{"nonterminal":"X"}]}}]"#;
    let err = checker
        .compare_sources(dangling, &single_value(Term::field("value").less_than(10)))
        .unwrap_err();
    assert!(matches!(err, EquivalenceError::MalformedGrammar(_)));
}
