// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cheap change detection over trigger references.
//!
//! The fingerprint is the XOR of the identity of every object referenced by a
//! trigger event. Unset parameters contribute nothing. A reference appearing an
//! even number of times cancels itself out, so the fingerprint only detects
//! changes to the multiset parity of referenced identities.

use crate::source::{ObjectId, SceneSource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// XOR-accumulated identity hash
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub i64);

impl Fingerprint {
    /// Fold one identity into the fingerprint
    pub fn accumulate(&mut self, identity: i64) {
        self.0 ^= identity;
    }

    /// Recompute from the live references of `triggers`
    pub fn compute<S, I>(source: &S, triggers: I) -> Self
    where
        S: SceneSource + ?Sized,
        I: IntoIterator<Item = ObjectId>,
    {
        let mut fingerprint = Self::default();
        for trigger in triggers {
            for referenced in source.outbound_references(trigger).into_iter().flatten() {
                fingerprint.accumulate(source.instance_identity(referenced));
            }
        }
        fingerprint
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Outcome of a change check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCheck {
    /// Live references match the stored fingerprint
    Unchanged,
    /// Live references differ; the graph must be rebuilt
    Changed {
        /// Fingerprint the graph was built with
        stored: Fingerprint,
        /// Fingerprint of the live references
        current: Fingerprint,
    },
}

impl ChangeCheck {
    /// Whether a rebuild is required
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Compare the live references of `triggers` against `stored`
pub fn check<S, I>(source: &S, triggers: I, stored: Fingerprint) -> ChangeCheck
where
    S: SceneSource + ?Sized,
    I: IntoIterator<Item = ObjectId>,
{
    let current = Fingerprint::compute(source, triggers);
    if current == stored {
        ChangeCheck::Unchanged
    } else {
        ChangeCheck::Changed { stored, current }
    }
}
