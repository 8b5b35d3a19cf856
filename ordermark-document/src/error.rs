//! Error types for the document layer.

use ordermark_model::StorageKind;
use ordermark_types::{EntityId, GroupTypeId};
use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors a host document raises when asked to read or mutate its model.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Element, type, group or report not found.
    #[error("element not found: {0}")]
    NotFound(String),

    /// Owner has no attribute with this name.
    #[error("attribute \"{name}\" not found on {owner}")]
    AttributeNotFound { owner: String, name: String },

    /// Host refuses to write a read-only attribute.
    #[error("attribute \"{0}\" is read-only")]
    ReadOnly(String),

    /// Value does not match the attribute's storage kind.
    #[error("attribute \"{name}\" stores {expected:?} values")]
    TypeMismatch { name: String, expected: StorageKind },

    /// Attribute cannot be changed on a grouped instance.
    #[error(
        "attribute \"{0}\" cannot be changed on a group member unless its values vary by group instance"
    )]
    GroupedAttribute(String),

    /// A mutation was attempted with no batch open.
    #[error("modification outside of a transaction")]
    NoOpenBatch,

    /// A batch was opened, committed or rolled back out of order.
    #[error("batch nesting error: {0}")]
    BatchNesting(String),

    /// Entity already belongs to a group.
    #[error("entity {0} already belongs to a group")]
    AlreadyGrouped(EntityId),

    /// Group type is still used by a placed group.
    #[error("group type {0} is still in use")]
    GroupTypeInUse(GroupTypeId),

    /// Another element already uses this name.
    #[error("name already in use: {0}")]
    DuplicateName(String),

    /// The user canceled an operation the host was running.
    #[error("operation canceled")]
    Canceled,

    /// A group needs at least one member.
    #[error("cannot create an empty group")]
    EmptyGroup,
}
