//! Property tests: compiled filters against an independent evaluator

mod common;

use common::{item_record, Item};
use proptest::prelude::*;
use sqlrepo_core::compiler::{compile_filter, compile_join};
use sqlrepo_core::model::{Entity, Record, Value};
use sqlrepo_core::predicate::{eq, CompareOp, Connective, Predicate};

const LABELS: [&str; 4] = ["a", "b", "A", ""];

fn arb_leaf() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        (0i64..4).prop_map(|v| eq("id", v)),
        (-2i64..3).prop_map(|v| eq("amount", v)),
        (0usize..LABELS.len()).prop_map(|i| eq("label", LABELS[i])),
    ]
}

fn arb_predicate(with_or: bool) -> impl Strategy<Value = Predicate> {
    arb_leaf().prop_recursive(4, 16, 2, move |inner| {
        let connective = if with_or {
            prop_oneof![Just(Connective::And), Just(Connective::Or)].boxed()
        } else {
            Just(Connective::And).boxed()
        };
        (inner.clone(), connective, inner)
            .prop_map(|(l, op, r)| Predicate::combine(l, op, r))
    })
}

fn arb_record() -> impl Strategy<Value = Record> {
    (
        0i64..4,
        prop::option::of(-2i64..3),
        prop::option::of(0usize..LABELS.len()),
    )
        .prop_map(|(id, amount, label)| {
            Record::new()
                .with("id", Value::Integer(id))
                .with("amount", amount.map(Value::Integer).unwrap_or(Value::Null))
                .with(
                    "label",
                    label
                        .map(|i| Value::Text(LABELS[i].to_string()))
                        .unwrap_or(Value::Null),
                )
        })
}

/// Field-by-field reference evaluation
fn oracle(pred: &Predicate, record: &Record) -> bool {
    match pred {
        Predicate::Comparison {
            field,
            op: CompareOp::Eq,
            value,
        } => match (record.get(field), value) {
            (Value::Integer(a), sqlrepo_core::Literal::Integer(b)) => a == b,
            (Value::Text(a), sqlrepo_core::Literal::Text(b)) => a == b,
            _ => false,
        },
        Predicate::Combinator {
            left,
            op: Connective::And,
            right,
        } => oracle(left, record) && oracle(right, record),
        Predicate::Combinator {
            left,
            op: Connective::Or,
            right,
        } => oracle(left, record) || oracle(right, record),
        other => panic!("oracle does not cover {:?}", other),
    }
}

proptest! {
    #[test]
    fn eq_and_predicates_match_oracle(pred in arb_predicate(false), record in arb_record()) {
        let desc = Item::descriptor().unwrap();
        let filter = compile_filter(&pred, &desc).unwrap();
        prop_assert_eq!(filter.matches(&record), oracle(&pred, &record));
    }

    #[test]
    fn eq_and_or_predicates_match_oracle(pred in arb_predicate(true), record in arb_record()) {
        let desc = Item::descriptor().unwrap();
        let filter = compile_filter(&pred, &desc).unwrap();
        prop_assert_eq!(filter.matches(&record), oracle(&pred, &record));
    }

    #[test]
    fn join_params_match_comparisons(pred in arb_predicate(true)) {
        let desc = Item::descriptor().unwrap();
        let child = common::Ticket::descriptor().unwrap();
        // Item ids are integers, so ticket.lottery_id can point at them
        let clause = compile_join(&pred, &desc, &child, "lottery_id").unwrap();
        prop_assert_eq!(clause.params.len(), pred.comparison_count());
        let placeholders = clause.where_sql.matches('?').count();
        prop_assert_eq!(placeholders, pred.comparison_count());
        prop_assert_eq!(clause.where_sql.matches('(').count(), clause.where_sql.matches(')').count());
    }

    #[test]
    fn join_parent_filter_agrees_with_single_entity_filter(
        pred in arb_predicate(true),
        record in arb_record(),
    ) {
        let desc = Item::descriptor().unwrap();
        let child = common::Ticket::descriptor().unwrap();
        let clause = compile_join(&pred, &desc, &child, "lottery_id").unwrap();
        let filter = compile_filter(&pred, &desc).unwrap();
        prop_assert_eq!(clause.parent_filter.matches(&record), filter.matches(&record));
    }
}

#[test]
fn test_oracle_sanity() {
    let record = item_record(1, 10, "a");
    assert!(oracle(&eq("label", "a"), &record));
    assert!(!oracle(&eq("amount", 11), &record));
}
