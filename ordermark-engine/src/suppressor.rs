use ordermark_document::{Document, FailureKind, FailureSet, SubscriptionId};
use std::cell::Cell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use tracing::{debug, warn};

/// Dismisses duplicate-value failures while it is alive.
///
/// Numbering row-merged reports deliberately gives several entities the same
/// mark, which hosts flag as a duplicate. The guard subscribes a processor
/// that dismisses exactly those failures; every other failure is still
/// posted. Dropping the guard unsubscribes it.
pub struct ConflictSuppressor<'a, D: Document + ?Sized> {
    doc: &'a mut D,
    subscription: SubscriptionId,
    dismissed: Rc<Cell<usize>>,
}

impl<'a, D: Document + ?Sized> ConflictSuppressor<'a, D> {
    pub fn install(doc: &'a mut D) -> Self {
        let dismissed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&dismissed);
        let subscription = doc.subscribe_failures(Box::new(move |failures: &mut FailureSet| {
            let count = failures.dismiss_kind(&FailureKind::DuplicateValue);
            if count > 0 {
                debug!(count, "Dismissed duplicate-value failures");
            }
            counter.set(counter.get() + count);
        }));
        Self {
            doc,
            subscription,
            dismissed,
        }
    }

    /// Failures dismissed so far.
    pub fn dismissed(&self) -> usize {
        self.dismissed.get()
    }
}

impl<D: Document + ?Sized> Deref for ConflictSuppressor<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.doc
    }
}

impl<D: Document + ?Sized> DerefMut for ConflictSuppressor<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.doc
    }
}

impl<D: Document + ?Sized> Drop for ConflictSuppressor<'_, D> {
    fn drop(&mut self) {
        if !self.doc.unsubscribe_failures(self.subscription) {
            warn!(subscription = ?self.subscription, "Failure processor was already removed");
        }
    }
}
