use ordermark_document::{
    AttributeOwner, Batch, BatchKind, BatchStatus, Document, DocumentError, Failure, FailureKind,
    FailureSet, InMemoryDocument,
};
use ordermark_model::{AttributeDef, AttributeValue, BuiltinAttribute, DisplayUnit, ElementType, Entity};
use ordermark_types::EntityId;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn door(mark: &str) -> Entity {
    Entity::new("Doors")
        .with_attribute(AttributeDef::builtin(BuiltinAttribute::Mark), mark)
        .with_attribute(AttributeDef::builtin(BuiltinAttribute::InstanceComments), "")
        .with_attribute(AttributeDef::integer("Position"), 0_i64)
        .with_attribute(AttributeDef::text("Fire Rating").read_only(), "EI30")
        .with_attribute(AttributeDef::double("Offset", DisplayUnit::Millimeters), AttributeValue::Double(0.0))
}

fn mark_of(doc: &InMemoryDocument, id: EntityId) -> String {
    doc.display_text(id, "Mark").unwrap_or_default()
}

// ── Batch nesting ────────────────────────────────────────────────

#[test]
fn transaction_opens_at_top_level_and_inside_group() {
    let mut doc = InMemoryDocument::new();
    assert_eq!(doc.open_batch(BatchKind::Group, "g").unwrap(), BatchStatus::Started);
    assert_eq!(doc.open_batch(BatchKind::Transaction, "t").unwrap(), BatchStatus::Started);
    assert_eq!(doc.open_batch(BatchKind::SubTransaction, "").unwrap(), BatchStatus::Started);
    assert_eq!(doc.batch_depth(), 3);

    assert_eq!(doc.commit_batch().unwrap(), BatchStatus::Committed);
    assert_eq!(doc.commit_batch().unwrap(), BatchStatus::Committed);
    assert_eq!(doc.commit_batch().unwrap(), BatchStatus::Committed);
    assert_eq!(doc.batch_depth(), 0);
}

#[test]
fn sub_transaction_needs_a_transaction() {
    let mut doc = InMemoryDocument::new();
    let err = doc.open_batch(BatchKind::SubTransaction, "").unwrap_err();
    assert!(matches!(err, DocumentError::BatchNesting(_)));

    doc.open_batch(BatchKind::Group, "g").unwrap();
    let err = doc.open_batch(BatchKind::SubTransaction, "").unwrap_err();
    assert!(matches!(err, DocumentError::BatchNesting(_)));
}

#[test]
fn transaction_cannot_nest_in_transaction() {
    let mut doc = InMemoryDocument::new();
    doc.open_batch(BatchKind::Transaction, "outer").unwrap();
    let err = doc.open_batch(BatchKind::Transaction, "inner").unwrap_err();
    assert!(matches!(err, DocumentError::BatchNesting(_)));
}

#[test]
fn commit_without_batch_is_an_error() {
    let mut doc = InMemoryDocument::new();
    assert!(matches!(doc.commit_batch(), Err(DocumentError::BatchNesting(_))));
    assert!(matches!(doc.rollback_batch(), Err(DocumentError::BatchNesting(_))));
}

// ── Writes & rollback ────────────────────────────────────────────

#[test]
fn write_outside_batch_is_refused() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    let err = doc
        .set_attribute(AttributeOwner::Instance(id), "Mark", "B".into())
        .unwrap_err();
    assert!(matches!(err, DocumentError::NoOpenBatch));
    assert_eq!(mark_of(&doc, id), "A");
}

#[test]
fn committed_write_is_kept() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    {
        let mut tx = Batch::transaction(&mut doc, "Numerate").unwrap();
        tx.set_attribute(AttributeOwner::Instance(id), "Mark", "B".into())
            .unwrap();
        tx.commit().unwrap();
    }
    assert_eq!(mark_of(&doc, id), "B");
}

#[test]
fn rolled_back_write_is_discarded() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    {
        let mut tx = Batch::transaction(&mut doc, "Probe").unwrap();
        tx.set_attribute(AttributeOwner::Instance(id), "Mark", "B".into())
            .unwrap();
        tx.rollback().unwrap();
    }
    assert_eq!(mark_of(&doc, id), "A");
}

#[test]
fn dropped_batch_rolls_back() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    {
        let mut tx = Batch::transaction(&mut doc, "Abandoned").unwrap();
        tx.set_attribute(AttributeOwner::Instance(id), "Mark", "B".into())
            .unwrap();
    }
    assert_eq!(doc.batch_depth(), 0);
    assert_eq!(mark_of(&doc, id), "A");
}

#[test]
fn sub_transaction_commit_survives_only_if_outer_commits() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    {
        let mut tx = Batch::transaction(&mut doc, "outer").unwrap();
        {
            let mut sub = Batch::sub(&mut *tx).unwrap();
            sub.set_attribute(AttributeOwner::Instance(id), "Mark", "B".into())
                .unwrap();
            sub.commit().unwrap();
        }
        assert_eq!(mark_of(&tx, id), "B");
        tx.rollback().unwrap();
    }
    assert_eq!(mark_of(&doc, id), "A");
}

// ── Write validation ─────────────────────────────────────────────

#[test]
fn read_only_attribute_is_refused() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    let mut tx = Batch::transaction(&mut doc, "t").unwrap();
    let err = tx
        .set_attribute(AttributeOwner::Instance(id), "Fire Rating", "EI60".into())
        .unwrap_err();
    assert!(matches!(err, DocumentError::ReadOnly(name) if name == "Fire Rating"));
}

#[test]
fn storage_mismatch_is_refused() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    let mut tx = Batch::transaction(&mut doc, "t").unwrap();
    let err = tx
        .set_attribute(AttributeOwner::Instance(id), "Position", "seven".into())
        .unwrap_err();
    assert!(matches!(err, DocumentError::TypeMismatch { .. }));

    tx.set_attribute(AttributeOwner::Instance(id), "Position", 7_i64.into())
        .unwrap();
    tx.set_attribute(AttributeOwner::Instance(id), "Offset", AttributeValue::Double(2.5))
        .unwrap();
}

#[test]
fn missing_attribute_is_reported() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    let mut tx = Batch::transaction(&mut doc, "t").unwrap();
    let err = tx
        .set_attribute(AttributeOwner::Instance(id), "Width", "1".into())
        .unwrap_err();
    assert!(matches!(err, DocumentError::AttributeNotFound { .. }));
}

#[test]
fn type_attribute_resolves_and_writes_on_the_type() {
    let mut doc = InMemoryDocument::new();
    let ty = doc.add_type(ElementType::new("D1").with_attribute(AttributeDef::text("Type Mark"), "T"));
    let id = doc.add_entity(door("A").with_type(ty));

    assert!(doc.attribute(AttributeOwner::Instance(id), "Type Mark").is_none());
    let resolved = doc.attribute(AttributeOwner::Type(ty), "Type Mark").unwrap();
    assert_eq!(resolved.value, AttributeValue::text("T"));
    assert_eq!(doc.type_of(id), Some(ty));

    let mut tx = Batch::transaction(&mut doc, "t").unwrap();
    tx.set_attribute(AttributeOwner::Type(ty), "Type Mark", "U".into())
        .unwrap();
    tx.commit().unwrap();

    let resolved = doc.attribute(AttributeOwner::Type(ty), "Type Mark").unwrap();
    assert_eq!(resolved.value, AttributeValue::text("U"));
}

#[test]
fn builtin_lookup_uses_identity_not_name() {
    let mut doc = InMemoryDocument::new();
    let id = doc.add_entity(door("A"));
    let resolved = doc
        .builtin_attribute(AttributeOwner::Instance(id), BuiltinAttribute::InstanceComments)
        .unwrap();
    assert_eq!(resolved.def.name, "Comments");
    assert!(doc
        .builtin_attribute(AttributeOwner::Instance(id), BuiltinAttribute::SheetName)
        .is_none());
}

// ── Failures ─────────────────────────────────────────────────────

#[test]
fn duplicate_marks_are_posted_on_commit() {
    let mut doc = InMemoryDocument::new();
    let a = doc.add_entity(door("1"));
    let b = doc.add_entity(door("2"));

    let mut tx = Batch::transaction(&mut doc, "t").unwrap();
    tx.set_attribute(AttributeOwner::Instance(b), "Mark", "1".into())
        .unwrap();
    tx.commit().unwrap();

    let posted = doc.posted_warnings();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].kind, FailureKind::DuplicateValue);
    assert_eq!(posted[0].elements, vec![a, b]);
}

#[test]
fn pre_existing_duplicates_are_not_reported_again() {
    let mut doc = InMemoryDocument::new();
    doc.add_entity(door("1"));
    doc.add_entity(door("1"));
    let c = doc.add_entity(door("3"));

    let mut tx = Batch::transaction(&mut doc, "t").unwrap();
    tx.set_attribute(AttributeOwner::Instance(c), "Mark", "4".into())
        .unwrap();
    tx.commit().unwrap();

    assert!(doc.posted_warnings().is_empty());
}

#[test]
fn processors_can_dismiss_failures() {
    let mut doc = InMemoryDocument::new();
    doc.add_entity(door("1"));
    let b = doc.add_entity(door("2"));
    doc.queue_failure(Failure::new(FailureKind::GroupAtomViolation, "group changed"));

    let seen = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&seen);
    let id = doc.subscribe_failures(Box::new(move |set: &mut FailureSet| {
        *counter.borrow_mut() += set.len();
        set.dismiss_kind(&FailureKind::DuplicateValue);
    }));

    let mut tx = Batch::transaction(&mut doc, "t").unwrap();
    tx.set_attribute(AttributeOwner::Instance(b), "Mark", "1".into())
        .unwrap();
    tx.commit().unwrap();

    assert_eq!(*seen.borrow(), 2);
    let posted = doc.take_posted_warnings();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].kind, FailureKind::GroupAtomViolation);

    assert!(doc.unsubscribe_failures(id));
    assert!(!doc.unsubscribe_failures(id));
    assert_eq!(doc.subscription_count(), 0);
}

#[test]
fn failure_set_tracks_dismissals() {
    let mut set = FailureSet::new(vec![
        Failure::new(FailureKind::DuplicateValue, "a"),
        Failure::new(FailureKind::Other("x".into()), "b"),
        Failure::new(FailureKind::DuplicateValue, "c"),
    ]);
    assert_eq!(set.len(), 3);
    assert_eq!(set.dismiss_kind(&FailureKind::DuplicateValue), 2);
    assert_eq!(set.dismiss_kind(&FailureKind::DuplicateValue), 0);
    let remaining: Vec<String> = set.into_remaining().into_iter().map(|f| f.message).collect();
    assert_eq!(remaining, vec!["b".to_string()]);
}

#[test]
fn failure_serializes_with_snake_case_kind() {
    let failure = Failure::new(FailureKind::DuplicateValue, "dup");
    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json["kind"], "duplicate_value");
}
