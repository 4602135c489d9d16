use bnf_equiv::{
    EquivalenceChecker, EquivalenceConfig, Grammar, Production, RhsItem, Term, Terminal, Verdict,
};

/// Start := B[f0] .. B[f7], field i bounded by `bound(i)`
fn wide(bound: impl Fn(i64) -> bnf_equiv::Assertion) -> Grammar {
    let items: Vec<RhsItem> = (0..8)
        .map(|i| {
            Terminal::fixed(format!("f{}", i), 1)
                .with_assertion(bound(i))
                .into()
        })
        .collect();
    Grammar::new(vec![Production::conjunction("Start", items)]).unwrap()
}

fn checker(workers: usize) -> EquivalenceChecker {
    EquivalenceChecker::default().with_config(EquivalenceConfig::default().with_workers(workers))
}

#[test]
fn test_parallel_agrees_with_sequential() {
    let left = wide(|i| Term::field(format!("f{}", i)).less_than(10 + i));
    let right = wide(|i| Term::field(format!("f{}", i)).at_most(9 + i));

    let sequential = checker(1).compare(&left, &right).unwrap();
    let parallel = checker(4).compare(&left, &right).unwrap();
    assert_eq!(sequential, parallel);
    match parallel {
        Verdict::Equivalent { justifications } => assert_eq!(justifications.len(), 16),
        other => panic!("expected equivalent, got {:?}", other),
    }
}

#[test]
fn test_parallel_reports_difference() {
    let left = wide(|i| Term::field(format!("f{}", i)).less_than(10 + i));
    let right = wide(|i| {
        let bound = if i == 5 { 3 } else { 10 + i };
        Term::field(format!("f{}", i)).less_than(bound)
    });

    let verdict = EquivalenceChecker::default()
        .with_config(EquivalenceConfig::default().parallel())
        .compare(&left, &right)
        .unwrap();
    let value = verdict.witness().unwrap().get("f5").unwrap();
    assert!((3..15).contains(&value));
}
