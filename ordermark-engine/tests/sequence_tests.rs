use ordermark_engine::sequence::{generate, generate_for_rows, value_at};
use ordermark_engine::{EngineError, MarkAssignment, OrderDirection, RowBucket};
use ordermark_types::EntityId;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

fn ids(n: usize) -> Vec<EntityId> {
    (0..n).map(|_| EntityId::new()).collect()
}

fn values(assignments: &[MarkAssignment]) -> Vec<i64> {
    assignments.iter().map(|a| a.value).collect()
}

fn bucket(row_number: usize, members: &[EntityId]) -> RowBucket {
    RowBucket {
        row_number,
        members: members.to_vec(),
    }
}

// ── value_at ─────────────────────────────────────────────────────

#[test]
fn ascending_counts_up_from_start() {
    assert_eq!(value_at(0, 4, 1, OrderDirection::Ascending), Some(1));
    assert_eq!(value_at(3, 4, 1, OrderDirection::Ascending), Some(4));
    assert_eq!(value_at(2, 4, 100, OrderDirection::Ascending), Some(102));
}

#[test]
fn descending_ends_at_start() {
    assert_eq!(value_at(0, 4, 1, OrderDirection::Descending), Some(4));
    assert_eq!(value_at(3, 4, 1, OrderDirection::Descending), Some(1));
    assert_eq!(value_at(0, 3, 10, OrderDirection::Descending), Some(12));
}

#[test]
fn negative_start_is_allowed() {
    assert_eq!(value_at(0, 3, -1, OrderDirection::Ascending), Some(-1));
    assert_eq!(value_at(0, 3, -1, OrderDirection::Descending), Some(1));
}

#[test]
fn values_past_i64_range_are_none() {
    assert_eq!(value_at(1, 2, i64::MAX, OrderDirection::Ascending), None);
    assert_eq!(value_at(0, 2, i64::MAX, OrderDirection::Descending), None);
    assert_eq!(value_at(1, 2, i64::MAX, OrderDirection::Descending), Some(i64::MAX));
    assert_eq!(value_at(0, 1, i64::MIN, OrderDirection::Ascending), Some(i64::MIN));
}

// ── generate ─────────────────────────────────────────────────────

#[test]
fn generate_pairs_entities_with_values_in_order() {
    let order = ids(3);
    let assignments = generate(&order, 1, OrderDirection::Ascending).unwrap();

    let entities: Vec<EntityId> = assignments.iter().map(|a| a.entity).collect();
    assert_eq!(entities, order);
    assert_eq!(values(&assignments), vec![1, 2, 3]);
}

#[test]
fn generate_descending_covers_same_range() {
    let order = ids(4);
    let assignments = generate(&order, 5, OrderDirection::Descending).unwrap();
    assert_eq!(values(&assignments), vec![8, 7, 6, 5]);
}

#[test]
fn generate_keeps_first_position_of_repeats() {
    let order = ids(3);
    let repeated = vec![order[0], order[1], order[0], order[2], order[1]];
    let assignments = generate(&repeated, 1, OrderDirection::Ascending).unwrap();

    let entities: Vec<EntityId> = assignments.iter().map(|a| a.entity).collect();
    assert_eq!(entities, order);
    assert_eq!(values(&assignments), vec![1, 2, 3]);
}

#[test]
fn generate_empty_order() {
    assert!(generate(&[], 1, OrderDirection::Ascending).unwrap().is_empty());
}

#[test]
fn generate_rejects_range_past_i64_max() {
    let order = ids(3);
    let up = generate(&order, i64::MAX - 1, OrderDirection::Ascending);
    assert!(matches!(up, Err(EngineError::SequenceOverflow { count: 3, .. })));

    let down = generate(&order, i64::MAX - 1, OrderDirection::Descending);
    assert!(matches!(down, Err(EngineError::SequenceOverflow { .. })));

    let fits = generate(&order, i64::MAX - 2, OrderDirection::Ascending).unwrap();
    assert_eq!(values(&fits), vec![i64::MAX - 2, i64::MAX - 1, i64::MAX]);
}

// ── generate_for_rows ────────────────────────────────────────────

#[test]
fn rows_share_one_value() {
    let e = ids(5);
    let buckets = vec![bucket(1, &e[0..2]), bucket(2, &e[2..3]), bucket(3, &e[3..5])];
    let assignments = generate_for_rows(&buckets, 1, OrderDirection::Ascending).unwrap();
    assert_eq!(values(&assignments), vec![1, 1, 2, 3, 3]);
}

#[test]
fn empty_rows_do_not_consume_values() {
    let e = ids(2);
    let buckets = vec![bucket(1, &e[0..1]), bucket(2, &[]), bucket(3, &e[1..2])];

    let up = generate_for_rows(&buckets, 1, OrderDirection::Ascending).unwrap();
    assert_eq!(values(&up), vec![1, 2]);

    let down = generate_for_rows(&buckets, 1, OrderDirection::Descending).unwrap();
    assert_eq!(values(&down), vec![2, 1]);
}

#[test]
fn entity_in_two_rows_keeps_first() {
    let e = ids(2);
    let buckets = vec![bucket(1, &[e[0]]), bucket(2, &[e[0], e[1]])];
    let assignments = generate_for_rows(&buckets, 1, OrderDirection::Ascending).unwrap();

    assert_eq!(
        assignments,
        vec![
            MarkAssignment { entity: e[0], value: 1 },
            MarkAssignment { entity: e[1], value: 2 },
        ]
    );
}

#[test]
fn rows_reject_range_past_i64_max() {
    let e = ids(2);
    let buckets = vec![bucket(1, &e[0..1]), bucket(2, &e[1..2])];
    let result = generate_for_rows(&buckets, i64::MAX, OrderDirection::Ascending);
    assert!(matches!(result, Err(EngineError::SequenceOverflow { start: i64::MAX, count: 2 })));
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn generated_values_are_unique_and_contiguous(
        n in 0usize..40,
        start in -1000i64..1000,
        descending in any::<bool>(),
    ) {
        let direction = if descending { OrderDirection::Descending } else { OrderDirection::Ascending };
        let order = ids(n);
        let assignments = generate(&order, start, direction).unwrap();

        prop_assert_eq!(assignments.len(), n);
        let mut seen: Vec<i64> = values(&assignments);
        seen.sort_unstable();
        let expected: Vec<i64> = (0..n as i64).map(|i| start + i).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn duplicated_input_numbers_like_deduplicated_input(
        n in 1usize..20,
        picks in prop::collection::vec(0usize..20, 0..60),
        start in 0i64..100,
    ) {
        let pool = ids(n);
        let order: Vec<EntityId> = picks.iter().map(|i| pool[i % n]).collect();

        let mut seen = HashSet::new();
        let deduped: Vec<EntityId> = order.iter().copied().filter(|id| seen.insert(*id)).collect();

        prop_assert_eq!(
            generate(&order, start, OrderDirection::Ascending).unwrap(),
            generate(&deduped, start, OrderDirection::Ascending).unwrap()
        );
    }

    #[test]
    fn descending_mirrors_ascending(n in 1usize..40, start in -50i64..50) {
        let order = ids(n);
        let up = values(&generate(&order, start, OrderDirection::Ascending).unwrap());
        let mut down = values(&generate(&order, start, OrderDirection::Descending).unwrap());
        down.reverse();
        prop_assert_eq!(up, down);
    }
}
