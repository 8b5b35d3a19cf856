use ordermark_model::{
    Attribute, AttributeDef, AttributeValue, BuiltinAttribute, DisplayUnit, ElementType, Entity,
    Location, Segment,
};
use glam::DVec3;
use pretty_assertions::assert_eq;

fn make_entity() -> Entity {
    Entity::new("Doors")
        .with_attribute(AttributeDef::builtin(BuiltinAttribute::Mark), "D-1")
        .with_attribute(AttributeDef::integer("Position"), 7_i64)
        .with_attribute(
            AttributeDef::double("Offset", DisplayUnit::Millimeters),
            AttributeValue::Double(1.0),
        )
}

// ── Construction & fields ────────────────────────────────────────

#[test]
fn new_entity_is_ungrouped_and_untyped() {
    let e = Entity::new("Walls");
    assert_eq!(e.category, "Walls");
    assert!(e.type_id.is_none());
    assert!(e.group_id.is_none());
    assert!(e.attributes.is_empty());
    assert!(e.location.is_none());
}

#[test]
fn entities_get_distinct_ids() {
    assert_ne!(Entity::new("Walls").id, Entity::new("Walls").id);
}

// ── Attribute helpers ────────────────────────────────────────────

#[test]
fn get_text_returns_text_attribute() {
    let e = make_entity();
    assert_eq!(e.get_text("Mark"), Some("D-1"));
}

#[test]
fn get_text_returns_none_for_non_text() {
    let e = make_entity();
    assert_eq!(e.get_text("Position"), None);
}

#[test]
fn get_integer_and_double() {
    let e = make_entity();
    assert_eq!(e.get_integer("Position"), Some(7));
    assert_eq!(e.get_double("Offset"), Some(1.0));
    assert_eq!(e.get_double("Missing"), None);
}

#[test]
fn builtin_lookup_ignores_name_collisions() {
    let e = Entity::new("Walls").with_attribute(AttributeDef::text("Mark"), "shared");
    assert!(e.attribute("Mark").is_some());
    assert!(e.builtin(BuiltinAttribute::Mark).is_none());
}

#[test]
fn attribute_mut_allows_in_place_update() {
    let mut e = make_entity();
    e.attribute_mut("Mark").unwrap().value = AttributeValue::text("D-2");
    assert_eq!(e.get_text("Mark"), Some("D-2"));
}

#[test]
fn element_type_attributes() {
    let t = ElementType::new("900x2100")
        .with_attribute(AttributeDef::text("Type Mark"), "T1");
    assert_eq!(t.attribute("Type Mark").map(Attribute::name), Some("Type Mark"));
    assert!(t.builtin(BuiltinAttribute::Mark).is_none());
}

// ── Edges ────────────────────────────────────────────────────────

#[test]
fn edges_combine_location_and_outline() {
    let e = Entity::new("Walls")
        .with_location(Location::line(DVec3::ZERO, DVec3::X))
        .with_outline(vec![Segment::new(DVec3::Y, DVec3::ONE)]);
    assert_eq!(e.edges().len(), 2);
}

#[test]
fn point_entities_have_no_location_edges() {
    let e = Entity::new("Columns").with_location(Location::Point(DVec3::ONE));
    assert!(e.edges().is_empty());
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn entity_serialization_roundtrip() {
    let e = make_entity().with_location(Location::Point(DVec3::new(1.0, 2.0, 3.0)));
    let json = serde_json::to_string(&e).unwrap();
    let back: Entity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
}
