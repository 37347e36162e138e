//! Result of a derivation run.
use std::{collections::BTreeSet, fmt};

use crate::{
    derivator::DerivationRunInfo,
    record::{Record, RecordArena, RecordId},
    system::RelationId,
    utils::error::{FsError, FsResult},
};

/// Every record of a finished (or interrupted) run, with provenance queries.
#[derive(Debug, Clone)]
pub struct Derivation {
    arena: RecordArena,
    labels: Vec<String>,
    run_info: DerivationRunInfo,
}

/// Largest difference between two records of the same variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discrepancy {
    pub left: RecordId,
    pub right: RecordId,
    /// `None` when the two columns have different lengths.
    pub max_abs_diff: Option<f64>,
}

impl Derivation {
    pub(crate) fn new(arena: RecordArena, labels: Vec<String>, run_info: DerivationRunInfo) -> Self {
        Self {
            arena,
            labels,
            run_info,
        }
    }

    /// All records in creation order: seeds first, then derived records.
    pub fn records(&self) -> impl ExactSizeIterator<Item = (RecordId, &Record)> {
        self.arena.iter()
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.arena.get(id)
    }

    /// Like [`Derivation::get`], failing with [`FsError::UnknownRecord`].
    pub fn record(&self, id: RecordId) -> FsResult<&Record> {
        self.arena.get(id).ok_or(FsError::UnknownRecord(id))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Records created from the input table.
    pub fn seeds(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records().filter(|(_, r)| r.is_seed())
    }

    /// Records created by relations.
    pub fn derived(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records().filter(|(_, r)| !r.is_seed())
    }

    /// Every independent record of `name`, in creation order.
    pub fn by_name<'a>(&'a self, name: &str) -> impl Iterator<Item = (RecordId, &'a Record)> + 'a {
        self.arena
            .ids_by_name(name)
            .map(move |id| (id, &self.arena[id]))
    }

    /// Direct inputs of a record.
    pub fn inputs_of(&self, id: RecordId) -> FsResult<impl Iterator<Item = (RecordId, &Record)>> {
        let record = self.record(id)?;
        Ok(record.inputs().iter().map(move |&input| (input, &self.arena[input])))
    }

    /// Every record `id` transitively depends on, in creation order.
    pub fn ancestors(&self, id: RecordId) -> FsResult<Vec<RecordId>> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<RecordId> = self.record(id)?.inputs().to_vec();
        while let Some(next) = stack.pop() {
            if seen.insert(next) {
                stack.extend_from_slice(self.arena[next].inputs());
            }
        }
        Ok(seen.into_iter().collect())
    }

    /// Display name of a relation of the system this derivation ran on.
    pub fn relation_label(&self, id: RelationId) -> Option<&str> {
        self.labels.get(id.index()).map(String::as_str)
    }

    /// Render how a record was obtained, e.g. `b = ohm(c, d)`.
    ///
    /// Derived inputs are rendered recursively: `a = double(b = ohm(c, d))`.
    pub fn lineage(&self, id: RecordId) -> FsResult<Lineage<'_>> {
        self.record(id)?;
        Ok(Lineage {
            derivation: self,
            id,
        })
    }

    /// Pairwise comparison of every record of `name`.
    ///
    /// On consistent data all differences are close to zero; a large one
    /// points at a measurement or a relation that does not hold.
    pub fn discrepancies(&self, name: &str) -> Vec<Discrepancy> {
        let ids: Vec<RecordId> = self.arena.ids_by_name(name).collect();
        let mut out = Vec::new();
        for (i, &left) in ids.iter().enumerate() {
            for &right in &ids[i + 1..] {
                out.push(Discrepancy {
                    left,
                    right,
                    max_abs_diff: self.arena[left]
                        .values()
                        .max_abs_diff(self.arena[right].values()),
                });
            }
        }
        out
    }

    pub fn run_info(&self) -> &DerivationRunInfo {
        &self.run_info
    }

    pub fn into_records(self) -> Vec<Record> {
        self.arena.into_records()
    }
}

/// Recursive rendering of a record's provenance, see [`Derivation::lineage`].
#[derive(Debug, Clone, Copy)]
pub struct Lineage<'a> {
    derivation: &'a Derivation,
    id: RecordId,
}

impl Lineage<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>, id: RecordId) -> fmt::Result {
        let record = &self.derivation.arena[id];
        write!(f, "{}", record.name())?;
        let Some(source) = record.source() else {
            return Ok(());
        };

        match self.derivation.relation_label(source) {
            Some(label) => write!(f, " = {}(", label)?,
            None => write!(f, " = {}(", source)?,
        }
        for (i, &input) in record.inputs().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            self.write(f, input)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Lineage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.id)
    }
}
