//! Scoped batch guard.

use crate::document::{BatchKind, BatchStatus, Document};
use crate::error::DocumentResult;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// An open batch on a document.
///
/// Dereferences to the document so work happens through the guard. A batch
/// that is neither committed nor rolled back is rolled back on drop, so an
/// early return or `?` never leaves partial changes committed.
pub struct Batch<'a, D: Document + ?Sized> {
    doc: &'a mut D,
    kind: BatchKind,
    open: bool,
}

impl<'a, D: Document + ?Sized> Batch<'a, D> {
    /// Opens a batch of `kind`.
    pub fn open(doc: &'a mut D, kind: BatchKind, name: &str) -> DocumentResult<Self> {
        doc.open_batch(kind, name)?;
        Ok(Self {
            doc,
            kind,
            open: true,
        })
    }

    /// Opens a transaction.
    pub fn transaction(doc: &'a mut D, name: &str) -> DocumentResult<Self> {
        Self::open(doc, BatchKind::Transaction, name)
    }

    /// Opens a sub-transaction inside the current transaction.
    pub fn sub(doc: &'a mut D) -> DocumentResult<Self> {
        Self::open(doc, BatchKind::SubTransaction, "")
    }

    /// Opens a transaction group.
    pub fn group(doc: &'a mut D, name: &str) -> DocumentResult<Self> {
        Self::open(doc, BatchKind::Group, name)
    }

    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Commits the batch. For a group this assimilates its transactions.
    pub fn commit(mut self) -> DocumentResult<BatchStatus> {
        self.open = false;
        self.doc.commit_batch()
    }

    pub fn rollback(mut self) -> DocumentResult<BatchStatus> {
        self.open = false;
        self.doc.rollback_batch()
    }
}

impl<D: Document + ?Sized> Deref for Batch<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.doc
    }
}

impl<D: Document + ?Sized> DerefMut for Batch<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.doc
    }
}

impl<D: Document + ?Sized> Drop for Batch<'_, D> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.doc.rollback_batch() {
                warn!(kind = ?self.kind, error = %e, "Failed to roll back abandoned batch");
            }
        }
    }
}
