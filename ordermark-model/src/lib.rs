//! Entity and attribute model for ordermark.
//!
//! Defines the host-neutral shapes every other crate depends on:
//! - [`Entity`] / [`ElementType`]: model elements and their shared types
//! - [`AttributeDef`]: name, storage kind and mutation flags of an attribute
//! - [`AttributeValue`]: the value stored in an attribute slot
//! - [`BuiltinAttribute`]: attributes with a fixed host meaning (mark, comments, sheet name)
//! - [`Location`] / [`Segment`]: placement geometry used by spatial ordering
//!
//! The engine never owns these; a host document hands them out and takes
//! writes back through `ordermark-document`.

mod entity;
mod geometry;
mod schema;
mod value;

pub use entity::{Attribute, AttributeLevel, ElementType, Entity};
pub use geometry::{Location, Segment};
pub use schema::{AttributeDef, BuiltinAttribute, DisplayUnit, StorageKind};
pub use value::AttributeValue;
