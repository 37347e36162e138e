//! Lineage fingerprints.
//!
//! A lineage describes the *shape* of a derivation: which variable was
//! computed, with which relation, from which lineages. Two records with the
//! same lineage are the same derivation, even if they were computed in
//! different passes.
//!
//! Lineages are hash-consed in a [`LineageRegistry`]. Every distinct
//! [`LineageKey`] receives one [`LineageId`], so comparing fingerprints is an
//! integer comparison and, unlike a plain hash, never reports a false match.
use std::collections::HashMap;

use fsrel::variable::Variable;
use log::trace;
use smallvec::SmallVec;

use crate::{magic::INLINE_INPUTS, system::RelationId};

/// Interned lineage fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineageId(u32);

impl LineageId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural description of a derivation.
///
/// `inputs` holds the lineages of the direct inputs, sorted, so the key does
/// not depend on the order in which inputs were listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineageKey {
    pub name: Variable,
    pub source: Option<RelationId>,
    pub inputs: SmallVec<LineageId, INLINE_INPUTS>,
}

impl LineageKey {
    /// Lineage of a raw input column.
    pub fn seed(name: Variable) -> Self {
        Self {
            name,
            source: None,
            inputs: SmallVec::new(),
        }
    }

    /// Lineage of `name` computed by `source` from inputs with the given lineages.
    pub fn derived(
        name: Variable,
        source: RelationId,
        inputs: impl IntoIterator<Item = LineageId>,
    ) -> Self {
        let mut inputs: SmallVec<LineageId, INLINE_INPUTS> = inputs.into_iter().collect();
        inputs.sort_unstable();
        Self {
            name,
            source: Some(source),
            inputs,
        }
    }
}

/// Deduplicating store of lineage keys.
#[derive(Debug, Clone, Default)]
pub struct LineageRegistry {
    ids: HashMap<LineageKey, LineageId>,
}

impl LineageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `key` if this lineage was already registered.
    pub fn get(&self, key: &LineageKey) -> Option<LineageId> {
        self.ids.get(key).copied()
    }

    pub fn contains(&self, key: &LineageKey) -> bool {
        self.ids.contains_key(key)
    }

    /// Return the id of `key`, registering it when new.
    ///
    /// The boolean is `true` when the lineage was not known before.
    pub fn search_or_insert(&mut self, key: LineageKey) -> (LineageId, bool) {
        if let Some(&id) = self.ids.get(&key) {
            return (id, false);
        }

        let id = LineageId(self.ids.len() as u32);
        trace!(
            "New lineage {:?}: `{}` from {:?} over {:?}",
            id, key.name, key.source, key.inputs
        );
        self.ids.insert(key, id);
        (id, true)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
