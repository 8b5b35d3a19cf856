//! Validation failures posted by the host when a transaction commits.
//!
//! Processors subscribed through [`Document::subscribe_failures`] see every
//! failure of a committing transaction and may dismiss individual ones;
//! whatever survives is posted to the user.
//!
//! [`Document::subscribe_failures`]: crate::Document::subscribe_failures

use ordermark_types::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Several elements carry the same identity value.
    DuplicateValue,
    /// A group edit broke the group's consistency.
    GroupAtomViolation,
    /// Anything else the host reports.
    Other(String),
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default)]
    pub elements: Vec<EntityId>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_elements(mut self, elements: Vec<EntityId>) -> Self {
        self.elements = elements;
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The failures of one committing transaction, as seen by processors.
#[derive(Debug, Default)]
pub struct FailureSet {
    entries: Vec<(Failure, bool)>,
}

impl FailureSet {
    pub fn new(failures: Vec<Failure>) -> Self {
        Self {
            entries: failures.into_iter().map(|f| (f, false)).collect(),
        }
    }

    /// Failures not yet dismissed.
    pub fn iter(&self) -> impl Iterator<Item = &Failure> {
        self.entries.iter().filter(|(_, d)| !d).map(|(f, _)| f)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dismisses every remaining failure of `kind`. Returns how many were dismissed.
    pub fn dismiss_kind(&mut self, kind: &FailureKind) -> usize {
        let mut dismissed = 0;
        for (failure, gone) in &mut self.entries {
            if !*gone && failure.kind == *kind {
                *gone = true;
                dismissed += 1;
            }
        }
        dismissed
    }

    /// Consumes the set, returning the failures nobody dismissed.
    pub fn into_remaining(self) -> Vec<Failure> {
        self.entries
            .into_iter()
            .filter(|(_, d)| !d)
            .map(|(f, _)| f)
            .collect()
    }
}

/// Hook invoked with the failures of every committing transaction.
pub trait FailureProcessor {
    fn process(&mut self, failures: &mut FailureSet);
}

impl<F> FailureProcessor for F
where
    F: FnMut(&mut FailureSet),
{
    fn process(&mut self, failures: &mut FailureSet) {
        self(failures)
    }
}

/// Handle returned by a failure subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);
