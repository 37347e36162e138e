//! Fixed-point derivation runtime.
//!
//! A [`DerivationSession`] repeatedly applies every relation of a
//! [`FunctionSystem`] to the records known so far, until a full pass over the
//! relations produces nothing new.
//!
//! ## Core concepts
//! * [`DerivationSession`] – Mutable state of one run: the record arena, the
//!   configuration and the run counters.
//! * [`DerivationStatus`] – Outcome of a single pass.
//! * [`DerivationRunInfo`] – Snapshot metrics of a (possibly interrupted) run.
//!
//! ## One pass
//! For every relation, in registration order:
//! 1. the candidates are the records whose variable belongs to the relation
//!    and whose `used_relations` does not already contain it;
//! 2. for every output the relation can compute from the candidates, the
//!    input sets are enumerated (see [`enumerate`]);
//! 3. an input set whose lineage already exists is skipped, any other is
//!    computed and pushed as a new record.
//!
//! The circularity guard of step 1 and the duplicate check of step 3 bound
//! the number of distinct lineages, so the session always terminates.
//!
//! ## Typical usage
//! ```
//! use fscore::prelude::*;
//!
//! let system = FunctionSystem::new([Relation::total([
//!     ("a", Formula::pointwise(["b"], |x| x[0] * 2.0)),
//!     ("b", Formula::pointwise(["a"], |x| x[0] / 2.0)),
//! ])]);
//! let table = Table::from_columns([("b", [1.0, 2.0])]).unwrap();
//!
//! let mut session = system.session(&table);
//! while session.step().unwrap().is_continue() {}
//! let derivation = session.finish();
//! assert_eq!(derivation.by_name("a").count(), 1);
//! ```
//!
//! ## Budget semantics
//! * `pass_budget`: maximum number of passes run by
//!   [`DerivationSession::run_with_budget`]; unlimited if `None`.
//! * `time_budget`: wall-clock cutoff checked between passes; expiration
//!   returns `Continue`.
//! * A formula failure under [`FailurePolicy::Abort`] ends the session with an
//!   error; the records computed so far are dropped with it.
pub(crate) mod enumerate;

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    time::{Duration, Instant},
};

use fsrel::{relation::Relation, table::Table, variable::Variable};
use log::{debug, info, trace, warn};
use smallvec::SmallVec;
use strum::EnumIs;

use crate::{
    derivation::Derivation,
    lineage::LineageKey,
    magic::INLINE_INPUTS,
    record::{RecordArena, RecordId},
    system::{FunctionSystem, RelationId},
    utils::{
        conf::{DerivationConfig, FailurePolicy, PassVisibility},
        error::{FsError, FsResult},
    },
};

use self::enumerate::{InputSet, disjoint_product};

/// Outcome of a single derivation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum DerivationStatus {
    /// The pass added records; another pass may add more.
    Continue,
    /// Fixed point reached: the last pass added nothing.
    Terminated,
}

/// Snapshot metrics about a (possibly interrupted) derivation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivationRunInfo {
    /// Passes executed, including the final pass that found nothing.
    pub passes: usize,
    /// Records created from the input table.
    pub seeded: usize,
    /// Records created by relations.
    pub derived: usize,
    /// Input sets skipped because their lineage already existed.
    pub skipped_duplicates: usize,
    /// Input sets dropped after a formula failure under [`FailurePolicy::Skip`].
    pub failed: usize,
    /// Whether the fixed point was reached.
    pub terminated: bool,
    pub time_elapsed: Duration,
}

/// State of one derivation run over a [`FunctionSystem`].
#[derive(Debug)]
pub struct DerivationSession<'a> {
    system: &'a FunctionSystem,
    config: DerivationConfig,
    arena: RecordArena,
    rows: usize,
    /// Lineages whose formula failed under [`FailurePolicy::Skip`]; never retried.
    failed: HashSet<LineageKey>,
    run_info: DerivationRunInfo,
    start_time: Instant,
}

impl<'a> DerivationSession<'a> {
    /// Seed a session with one record per column of `table`, in name order.
    pub fn new(system: &'a FunctionSystem, table: &Table) -> Self {
        let mut arena = RecordArena::new();
        for (name, column) in table {
            arena.push_seed(name.clone(), column.clone());
        }
        debug!(
            "Seeded derivation with {} columns of {} rows over {} relations",
            arena.len(),
            table.row_count(),
            system.len()
        );

        Self {
            system,
            config: *system.config(),
            run_info: DerivationRunInfo {
                seeded: arena.len(),
                ..Default::default()
            },
            arena,
            rows: table.row_count(),
            failed: HashSet::new(),
            start_time: Instant::now(),
        }
    }

    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    /// Records known so far.
    pub fn records(&self) -> &RecordArena {
        &self.arena
    }

    pub fn run_info(&self) -> DerivationRunInfo {
        DerivationRunInfo {
            time_elapsed: self.start_time.elapsed(),
            ..self.run_info.clone()
        }
    }

    /// Run one pass over every relation.
    ///
    /// Calling `step` after termination is a no-op returning `Terminated`.
    pub fn step(&mut self) -> FsResult<DerivationStatus> {
        if self.run_info.terminated {
            return Ok(DerivationStatus::Terminated);
        }

        let pass_start = self.arena.len();
        self.run_info.passes += 1;

        let system = self.system;
        for (id, relation) in system.relations() {
            let visible = match self.config.visibility {
                PassVisibility::Immediate => self.arena.len(),
                PassVisibility::NextPass => pass_start,
            };
            self.apply_relation(id, relation, visible)?;
        }

        let added = self.arena.len() - pass_start;
        debug!(
            "Pass {} added {} records ({} total)",
            self.run_info.passes,
            added,
            self.arena.len()
        );

        if added == 0 {
            self.run_info.terminated = true;
            Ok(DerivationStatus::Terminated)
        } else {
            Ok(DerivationStatus::Continue)
        }
    }

    /// Step until termination or until a budget runs out.
    pub fn run_with_budget(
        &mut self,
        pass_budget: Option<usize>,
        time_budget: Option<Duration>,
    ) -> FsResult<DerivationStatus> {
        let started = Instant::now();
        let mut budget = pass_budget.unwrap_or(usize::MAX);
        loop {
            if let Some(time_budget) = time_budget {
                if started.elapsed() >= time_budget {
                    return Ok(DerivationStatus::Continue);
                }
            }
            if budget == 0 {
                return Ok(DerivationStatus::Continue);
            }

            match self.step()? {
                DerivationStatus::Continue => budget -= 1,
                DerivationStatus::Terminated => return Ok(DerivationStatus::Terminated),
            }
        }
    }

    /// Step to the fixed point and return every record.
    pub fn run(mut self) -> FsResult<Derivation> {
        self.run_with_budget(None, None)?;
        let derivation = self.finish();
        let info = derivation.run_info();
        info!(
            "Derivation reached a fixed point after {} passes: {} seeded, {} derived, {} duplicates skipped in {:?}",
            info.passes, info.seeded, info.derived, info.skipped_duplicates, info.time_elapsed
        );
        Ok(derivation)
    }

    /// Close the session.
    ///
    /// If the session has not terminated, the derivation only holds the
    /// records found so far (see [`DerivationRunInfo::terminated`]).
    pub fn finish(self) -> Derivation {
        let run_info = self.run_info();
        let labels = self
            .system
            .relations()
            .map(|(_, relation)| relation.to_string())
            .collect();
        Derivation::new(self.arena, labels, run_info)
    }

    fn apply_relation(
        &mut self,
        id: RelationId,
        relation: &Relation,
        visible: usize,
    ) -> FsResult<()> {
        // Candidate records per relation variable
        let mut slots: BTreeMap<Variable, Vec<RecordId>> = BTreeMap::new();
        for (record_id, record) in self.arena.iter().take(visible) {
            if record.used_relations().contains(id) || !relation.contains(record.name()) {
                continue;
            }
            slots.entry(record.name().clone()).or_default().push(record_id);
        }

        let known: BTreeSet<Variable> = slots.keys().cloned().collect();
        if !relation.can_produce(&known) {
            return Ok(());
        }

        for output in relation.producible(&known) {
            let inputs: SmallVec<&[RecordId], INLINE_INPUTS> = relation
                .inputs_for(output)
                .map(|v| slots.get(v).map_or(&[][..], Vec::as_slice))
                .collect();

            let combos = disjoint_product(&self.arena, &inputs);
            trace!(
                "{} can compute `{}` from {} input sets",
                id,
                output,
                combos.len()
            );
            for combo in combos {
                self.derive_one(id, relation, output, combo)?;
            }
        }
        Ok(())
    }

    fn derive_one(
        &mut self,
        id: RelationId,
        relation: &Relation,
        output: &Variable,
        inputs: InputSet,
    ) -> FsResult<()> {
        let key = self.arena.lineage_key(output.clone(), id, &inputs);
        if self.arena.contains_lineage(&key) {
            self.run_info.skipped_duplicates += 1;
            return Ok(());
        }
        if self.failed.contains(&key) {
            return Ok(());
        }

        let mut table = Table::with_rows(self.rows);
        for &input in &inputs {
            let record = &self.arena[input];
            table.insert(record.name().clone(), record.values().clone())?;
        }

        match relation.compute(output, &table) {
            Ok(values) => {
                if self.arena.push_derived(key, values, inputs).is_some() {
                    self.run_info.derived += 1;
                }
                Ok(())
            }
            Err(source) => match self.config.failure_policy {
                FailurePolicy::Abort => Err(FsError::DerivationAborted {
                    relation: id,
                    relation_name: relation.to_string(),
                    output: output.clone(),
                    source,
                }),
                FailurePolicy::Skip => {
                    warn!(
                        "Skipping `{}` with {} from {:?}: {}",
                        output,
                        id,
                        inputs.as_slice(),
                        source
                    );
                    self.failed.insert(key);
                    self.run_info.failed += 1;
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use fsrel::relation::Formula;

    use super::*;

    fn doubling() -> Relation {
        Relation::total([
            ("a", Formula::pointwise(["b"], |x| x[0] * 2.0)),
            ("b", Formula::pointwise(["a"], |x| x[0] / 2.0)),
        ])
    }

    #[test]
    fn steps_until_fixed_point() {
        let system = FunctionSystem::new([doubling()]);
        let table = Table::from_columns([("b", [1.0, 3.0])]).unwrap();

        let mut session = system.session(&table);
        assert!(session.step().unwrap().is_continue());
        assert!(session.step().unwrap().is_terminated());
        assert!(session.step().unwrap().is_terminated());

        let info = session.run_info();
        assert_eq!(info.passes, 2);
        assert_eq!(info.seeded, 1);
        assert_eq!(info.derived, 1);
        assert!(info.terminated);
    }

    #[test]
    fn pass_budget_interrupts() {
        let system = FunctionSystem::new([doubling()]);
        let table = Table::from_columns([("b", [1.0])]).unwrap();

        let mut session = system.session(&table);
        let status = session.run_with_budget(Some(1), None).unwrap();
        assert!(status.is_continue());
        assert!(!session.run_info().terminated);

        let derivation = session.finish();
        assert!(!derivation.run_info().terminated);
        assert_eq!(derivation.len(), 2);
    }

    #[test]
    fn time_budget_interrupts() {
        let system = FunctionSystem::new([doubling()]);
        let table = Table::from_columns([("b", [1.0])]).unwrap();

        let mut session = system.session(&table);
        let status = session.run_with_budget(None, Some(Duration::ZERO)).unwrap();
        assert!(status.is_continue());

        let info = session.run_info();
        assert_eq!(info.passes, 0);
        assert!(!info.terminated);
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn empty_table_terminates_at_once() {
        let system = FunctionSystem::new([doubling()]);
        let mut session = system.session(&Table::new());
        assert!(session.step().unwrap().is_terminated());
        assert!(session.records().is_empty());
    }

    #[test]
    fn relation_without_inputs_fires_once() {
        let constant = Relation::total([("g", Formula::pointwise::<&str, _>([], |_| 9.81))]);
        let system = FunctionSystem::new([constant]);
        let table = Table::from_columns([("m", [1.0, 2.0])]).unwrap();

        let derivation = system.derive(&table).unwrap();
        let g: Vec<_> = derivation.by_name("g").collect();
        assert_eq!(g.len(), 1);
        assert_eq!(g[0].1.values().values(), &[9.81, 9.81]);
    }
}
