//! Records and the arena holding them.
//!
//! A [`Record`] is one resolved column plus its provenance. Records live in a
//! [`RecordArena`] in creation order and refer to their inputs by
//! [`RecordId`]; since a record can only be built from records that already
//! exist, ancestry is a DAG by construction.
use std::{collections::HashMap, fmt};

use bit_set::BitSet;
use either::Either;
use fsrel::{column::Column, variable::Variable};
use log::debug;
use smallvec::SmallVec;

use crate::{
    lineage::{LineageId, LineageKey, LineageRegistry},
    magic::INLINE_INPUTS,
    system::RelationId,
};

/// Index of a record in its arena (creation order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Set of relations, stored as a bit set over [`RelationId`] indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSet(BitSet);

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: RelationId) -> bool {
        self.0.insert(id.0)
    }

    pub fn contains(&self, id: RelationId) -> bool {
        self.0.contains(id.0)
    }

    pub fn is_disjoint(&self, other: &RelationSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    pub fn union_with(&mut self, other: &RelationSet) {
        self.0.union_with(&other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.0.iter().map(RelationId)
    }

    pub fn len(&self) -> usize {
        self.0.count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RelationId> for RelationSet {
    fn from_iter<I: IntoIterator<Item = RelationId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// One known or derived column with its full provenance.
///
/// Immutable once created. `used_relations` and `lineage` are computed when
/// the record enters the arena and never change afterwards.
#[derive(Debug, Clone)]
pub struct Record {
    name: Variable,
    values: Column,
    source: Option<RelationId>,
    inputs: SmallVec<RecordId, INLINE_INPUTS>,
    used_relations: RelationSet,
    lineage: LineageId,
}

impl Record {
    /// Variable held by this record.
    pub fn name(&self) -> &Variable {
        &self.name
    }

    pub fn values(&self) -> &Column {
        &self.values
    }

    /// Relation that produced this record; `None` for a raw input.
    pub fn source(&self) -> Option<RelationId> {
        self.source
    }

    pub fn is_seed(&self) -> bool {
        self.source.is_none()
    }

    /// Records consumed directly to produce this one.
    pub fn inputs(&self) -> &[RecordId] {
        &self.inputs
    }

    /// Every relation appearing anywhere in this record's ancestry.
    pub fn used_relations(&self) -> &RelationSet {
        &self.used_relations
    }

    /// Lineage fingerprint: equal for two records exactly when they are the
    /// same derivation.
    pub fn lineage(&self) -> LineageId {
        self.lineage
    }
}

/// Append-only store of the records of one derivation run.
#[derive(Debug, Clone, Default)]
pub struct RecordArena {
    records: Vec<Record>,
    lineages: LineageRegistry,
    by_name: HashMap<Variable, Vec<RecordId>>,
}

impl RecordArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.0)
    }

    /// Records in creation order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (RecordId, &Record)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (RecordId(i), r))
    }

    /// Ids of every record holding `name`, in creation order.
    pub fn ids_by_name(&self, name: &str) -> impl Iterator<Item = RecordId> + '_ {
        match self.by_name.get(name) {
            Some(ids) => Either::Left(ids.iter().copied()),
            None => Either::Right(std::iter::empty()),
        }
    }

    /// Lineage key the derivation of `name` by `source` from `inputs` would have.
    ///
    /// # Panics
    ///
    /// Panics if an input id does not belong to this arena.
    pub fn lineage_key(
        &self,
        name: Variable,
        source: RelationId,
        inputs: &[RecordId],
    ) -> LineageKey {
        LineageKey::derived(name, source, inputs.iter().map(|&id| self[id].lineage))
    }

    /// Whether a record with this lineage already exists.
    pub fn contains_lineage(&self, key: &LineageKey) -> bool {
        self.lineages.contains(key)
    }

    /// Add a raw input column.
    pub fn push_seed(&mut self, name: Variable, values: Column) -> RecordId {
        let (lineage, _) = self
            .lineages
            .search_or_insert(LineageKey::seed(name.clone()));
        self.push(Record {
            name,
            values,
            source: None,
            inputs: SmallVec::new(),
            used_relations: RelationSet::new(),
            lineage,
        })
    }

    /// Add the record described by a derived lineage `key`, computed from `inputs`.
    ///
    /// Returns `None`, leaving the arena untouched, when a record with this
    /// lineage already exists.
    pub fn push_derived(
        &mut self,
        key: LineageKey,
        values: Column,
        inputs: SmallVec<RecordId, INLINE_INPUTS>,
    ) -> Option<RecordId> {
        if self.lineages.contains(&key) {
            return None;
        }

        let source = key.source;
        let mut used_relations: RelationSet = source.into_iter().collect();
        for &input in &inputs {
            used_relations.union_with(&self[input].used_relations);
        }

        let name = key.name.clone();
        let (lineage, _) = self.lineages.search_or_insert(key);

        let id = self.push(Record {
            name,
            values,
            source,
            inputs,
            used_relations,
            lineage,
        });
        debug!(
            "Derived record {} `{}` with {:?} from {:?}",
            id,
            self[id].name,
            source,
            self[id].inputs.as_slice()
        );
        Some(id)
    }

    fn push(&mut self, record: Record) -> RecordId {
        let id = RecordId(self.records.len());
        self.by_name
            .entry(record.name.clone())
            .or_default()
            .push(id);
        self.records.push(record);
        id
    }

    pub(crate) fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl std::ops::Index<RecordId> for RecordArena {
    type Output = Record;

    fn index(&self, id: RecordId) -> &Record {
        &self.records[id.0]
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn used_relations_accumulate_through_ancestry() {
        let mut arena = RecordArena::new();
        let b = arena.push_seed("b".into(), Column::from([1.0]));
        let c = arena.push_seed("c".into(), Column::from([2.0]));

        let key = arena.lineage_key("a".into(), RelationId(0), &[b, c]);
        assert!(!arena.contains_lineage(&key));
        let a = arena.push_derived(key, Column::from([2.0]), smallvec![b, c]).unwrap();

        let key = arena.lineage_key("d".into(), RelationId(3), &[a, c]);
        let d = arena.push_derived(key, Column::from([4.0]), smallvec![a, c]).unwrap();

        let used: Vec<_> = arena[d].used_relations().iter().collect();
        assert_eq!(used, [RelationId(0), RelationId(3)]);
        assert!(arena[b].used_relations().is_empty());
        assert_eq!(arena[d].inputs(), &[a, c]);
    }

    #[test]
    fn derived_lineage_is_recognised() {
        let mut arena = RecordArena::new();
        let b = arena.push_seed("b".into(), Column::from([1.0]));
        let key = arena.lineage_key("a".into(), RelationId(0), &[b]);
        arena.push_derived(key, Column::from([2.0]), smallvec![b]).unwrap();

        let again = arena.lineage_key("a".into(), RelationId(0), &[b]);
        assert!(arena.contains_lineage(&again));
        let other = arena.lineage_key("a".into(), RelationId(1), &[b]);
        assert!(!arena.contains_lineage(&other));
    }

    #[test]
    fn known_lineage_is_refused() {
        let mut arena = RecordArena::new();
        let b = arena.push_seed("b".into(), Column::from([1.0]));
        let key = arena.lineage_key("a".into(), RelationId(0), &[b]);
        let first = arena.push_derived(key.clone(), Column::from([2.0]), smallvec![b]);
        assert!(first.is_some());

        assert_eq!(arena.push_derived(key, Column::from([9.0]), smallvec![b]), None);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.ids_by_name("a").count(), 1);
    }

    #[test]
    fn records_are_indexed_by_name() {
        let mut arena = RecordArena::new();
        let b = arena.push_seed("b".into(), Column::from([1.0]));
        let key = arena.lineage_key("b".into(), RelationId(0), &[b]);
        let b2 = arena.push_derived(key, Column::from([1.0]), smallvec![b]).unwrap();

        let ids: Vec<_> = arena.ids_by_name("b").collect();
        assert_eq!(ids, [b, b2]);
        assert_eq!(arena.ids_by_name("zzz").count(), 0);
    }

    #[test]
    fn relation_set_disjointness() {
        let x: RelationSet = [RelationId(0), RelationId(2)].into_iter().collect();
        let y: RelationSet = [RelationId(1)].into_iter().collect();
        let z: RelationSet = [RelationId(2)].into_iter().collect();
        assert!(x.is_disjoint(&y));
        assert!(!x.is_disjoint(&z));
        assert!(RelationSet::new().is_disjoint(&x));
        assert_eq!(x.len(), 2);
        assert!(RelationSet::new().is_empty());
    }
}
