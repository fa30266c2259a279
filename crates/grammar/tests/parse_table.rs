use rstest::rstest;
use treepath_grammar::{
    ConflictKind, Grammar, GrammarError, NamedSymbols, ParseError, Parser, Symbol,
};

fn unit(_: Vec<()>) -> Result<(), treepath_grammar::ActionError> {
    Ok(())
}

fn grammar(names: &[&str]) -> Grammar<()> {
    let symbols: NamedSymbols = names.iter().copied().collect();
    Grammar::new(symbols, Symbol(0)).unwrap()
}

#[test]
fn table_cells_follow_first_and_follow_sets() {
    // S -> a S | ε
    let (eos, a, s) = (Symbol(0), Symbol(1), Symbol(2));
    let mut g = grammar(&["$", "a", "S"]);
    g.start(s).unwrap().produces(&[a, s], unit).unwrap().produces(&[], unit).unwrap();
    let table = g.parse_table().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(s, a), Some(0));
    assert_eq!(table.get(s, eos), Some(1));
    assert_eq!(table.get(a, eos), None);
}

#[test]
fn first_first_conflict_names_the_rule() {
    // S -> a | a b
    let (a, b, s) = (Symbol(1), Symbol(2), Symbol(3));
    let mut g = grammar(&["$", "a", "b", "S"]);
    g.start(s).unwrap().produces(&[a], unit).unwrap().produces(&[a, b], unit).unwrap();
    let err = g.parse_table().unwrap_err();
    assert_eq!(
        err,
        GrammarError::Conflict {
            kind: ConflictKind::FirstFirst,
            rule: 1,
            description: "S ::= a b".into(),
            non_terminal: s,
            terminal: a,
            existing: 0,
        }
    );
    assert_eq!(err.to_string(), "First/First conflict (rule 1: S ::= a b)");
}

#[test]
fn first_follow_conflict_is_detected() {
    // S -> A a; A -> a | ε
    let (a, s, na) = (Symbol(1), Symbol(2), Symbol(3));
    let mut g = grammar(&["$", "a", "S", "A"]);
    g.start(s).unwrap().produces(&[na, a], unit).unwrap();
    g.symbol(na).produces(&[a], unit).unwrap().produces(&[], unit).unwrap();
    let err = g.parse_table().unwrap_err();
    assert!(
        matches!(err, GrammarError::Conflict { kind: ConflictKind::FirstFollow, rule: 2, .. }),
        "{err:?}"
    );
}

#[test]
fn nullable_rule_overlapping_its_follow_set_conflicts_with_itself() {
    // S -> A a; A -> B; B -> a | ε
    let (a, s, na, nb) = (Symbol(1), Symbol(2), Symbol(3), Symbol(4));
    let mut g = grammar(&["$", "a", "S", "A", "B"]);
    g.start(s).unwrap().produces(&[na, a], unit).unwrap();
    g.symbol(na).produces(&[nb], unit).unwrap();
    g.symbol(nb).produces(&[a], unit).unwrap().produces(&[], unit).unwrap();
    assert_eq!(
        g.parse_table().unwrap_err(),
        GrammarError::Conflict {
            kind: ConflictKind::FirstFollow,
            rule: 1,
            description: "A ::= B".into(),
            non_terminal: na,
            terminal: a,
            existing: 1,
        }
    );
}

#[test]
fn left_recursion_is_rejected_as_a_conflict() {
    // E -> E + n | n
    let (plus, n, e) = (Symbol(1), Symbol(2), Symbol(3));
    let mut g = grammar(&["$", "+", "n", "E"]);
    g.start(e).unwrap().produces(&[e, plus, n], unit).unwrap().produces(&[n], unit).unwrap();
    assert!(matches!(
        g.parse_table(),
        Err(GrammarError::Conflict { kind: ConflictKind::FirstFirst, .. })
    ));
}

#[rstest]
#[case(Symbol(9))]
#[case(Symbol(42))]
fn invalid_symbols_are_rejected(#[case] bad: Symbol) {
    let mut g = grammar(&["$", "a", "S"]);
    let err = g.symbol(Symbol(2)).produces(&[Symbol(1), bad], unit).err().unwrap();
    assert_eq!(err, GrammarError::InvalidSymbol { lhs: Symbol(2), symbol: bad });
    let err = g.add_rule(bad, &[], unit).unwrap_err();
    assert_eq!(err, GrammarError::InvalidSymbol { lhs: bad, symbol: bad });
    assert!(g.rules().is_empty());
}

#[test]
fn start_symbol_is_set_once() {
    let mut g = grammar(&["$", "a", "S", "T"]);
    g.start(Symbol(2)).unwrap();
    let err = g.start(Symbol(3)).err().unwrap();
    assert_eq!(err, GrammarError::DuplicateStart { existing: Symbol(2) });
}

#[test]
fn missing_start_symbol() {
    let mut g = grammar(&["$", "a", "S"]);
    g.symbol(Symbol(2)).produces(&[Symbol(1)], unit).unwrap();
    assert_eq!(g.parse_table().unwrap_err(), GrammarError::MissingStart);
    assert!(matches!(Parser::new(&g), Err(ParseError::Grammar(GrammarError::MissingStart))));
}

#[test]
fn adding_rules_invalidates_cached_tables() {
    let (a, b, s) = (Symbol(1), Symbol(2), Symbol(3));
    let mut g = grammar(&["$", "a", "b", "S"]);
    g.start(s).unwrap().produces(&[a], unit).unwrap();
    assert_eq!(g.parse_table().unwrap().len(), 1);
    assert!(!g.follow(s).unwrap().contains(&b));

    g.symbol(s).produces(&[b], unit).unwrap();
    assert_eq!(g.parse_table().unwrap().get(s, b), Some(1));

    g.symbol(s).produces(&[a, b], unit).unwrap();
    assert!(g.parse_table().is_err());
}
