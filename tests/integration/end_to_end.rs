use crate::common::single_value;
use bnf_equiv::{
    compare, production_formula, EquivalenceChecker, EquivalenceConfig, Evidence, Side, Term,
    Verdict,
};

#[test]
fn test_strict_and_non_strict_bound_equivalent() {
    let left = single_value(Term::field("value").less_than(10));
    let right = single_value(Term::field("value").at_most(9));

    match compare(&left, &right).unwrap() {
        Verdict::Equivalent { justifications } => {
            assert_eq!(justifications.len(), 2);
            assert_eq!(justifications[0].premise, Side::Left);
            assert_eq!(justifications[1].premise, Side::Right);
            assert!(justifications.iter().all(|j| j.location == "Start[0]"));
        }
        other => panic!("expected equivalent, got {:?}", other),
    }
}

#[test]
fn test_different_bounds_distinct_with_witness() {
    let left = single_value(Term::field("value").less_than(10));
    let right = single_value(Term::field("value").less_than(5));

    let verdict = compare(&left, &right).unwrap();
    let witness = verdict.witness().expect("distinct verdict carries a witness");
    let value = witness.get("value").unwrap();
    assert!((5..10).contains(&value), "witness value {} outside [5, 10)", value);

    // The witness is accepted by exactly one side
    let left_formula = production_formula(&left, "Start").unwrap();
    let right_formula = production_formula(&right, "Start").unwrap();
    assert_eq!(left_formula.eval(witness), Some(true));
    assert_eq!(right_formula.eval(witness), Some(false));

    match verdict {
        Verdict::Distinct {
            evidence: Evidence::Assertions { accepted_by, location, .. },
            ..
        } => {
            assert_eq!(accepted_by, Side::Left);
            assert_eq!(location, "Start[0]");
        }
        other => panic!("expected assertion evidence, got {:?}", other),
    }
}

#[test]
fn test_justification_can_be_disabled() {
    let left = single_value(Term::field("value").less_than(10));
    let right = single_value(Term::field("value").at_most(9));
    let checker = EquivalenceChecker::default()
        .with_config(EquivalenceConfig::default().with_justification(false));
    assert_eq!(checker.compare(&left, &right).unwrap(), Verdict::equivalent());
}

#[test]
fn test_verdict_json() {
    let left = single_value(Term::field("value").less_than(10));
    let right = single_value(Term::field("value").less_than(5));
    let json: serde_json::Value =
        serde_json::from_str(&compare(&left, &right).unwrap().to_json().unwrap()).unwrap();
    assert_eq!(json["verdict"], "distinct");
    let value = json["witness"]["value"].as_u64().unwrap();
    assert!((5..10).contains(&value));
}

#[test]
fn test_compare_json_sources() {
    let left = single_value(Term::field("value").less_than(10));
    let right = single_value(Term::field("value").at_most(9));
    let encoded = serde_json::to_string(&right).unwrap();

    let verdict = EquivalenceChecker::default()
        .compare_sources(&left, encoded.as_str())
        .unwrap();
    assert!(verdict.is_equivalent());
}

#[test]
fn test_checksum_relation() {
    use bnf_equiv::{Grammar, Production, Terminal};

    // Start := len payload check, with check == (len + payload) mod 256
    let grammar = |check: Term| {
        Grammar::new(vec![Production::conjunction(
            "Start",
            vec![
                Terminal::fixed("len", 1).into(),
                Terminal::fixed("payload", 1).into(),
                Terminal::fixed("check", 1).into(),
            ],
        )
        .with_assertion(Term::field("check").equals(check))])
        .unwrap()
    };
    let left = grammar(Term::field("len").plus(Term::field("payload")).modulo(256));
    let right = grammar(Term::field("payload").plus(Term::field("len")).modulo(256));
    assert!(compare(&left, &right).unwrap().is_equivalent());

    let off_by_one = grammar(
        Term::field("len")
            .plus(Term::field("payload"))
            .plus(1)
            .modulo(256),
    );
    let verdict = compare(&left, &off_by_one).unwrap();
    let witness = verdict.witness().unwrap();
    let formula = production_formula(&left, "Start").unwrap();
    let other = production_formula(&off_by_one, "Start").unwrap();
    assert_ne!(formula.eval(witness), other.eval(witness));
}
