//! A collection of relations forming one consistent model.
//!
//! A [`FunctionSystem`] is what a physics exercise calls "the setup": a small
//! number of relations, each tying a few variables together, which jointly
//! describe many more quantities than any single relation does. Given a table
//! of measured values, [`FunctionSystem::derive`] computes every value the
//! relations can produce, each relation used at most once along any lineage.
use std::{collections::HashMap, fmt, sync::Arc};

use fsrel::{relation::Relation, table::Table};
use log::debug;

use crate::{
    derivation::Derivation,
    derivator::DerivationSession,
    utils::{conf::DerivationConfig, error::FsResult, ref_id::ArcRefId},
};

/// Identity of a relation inside a [`FunctionSystem`]: its registration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId(pub(crate) usize);

impl RelationId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// An ordered set of relations plus the configuration used to derive with them.
///
/// Relations are told apart by identity. Registering the same `Arc<Relation>`
/// twice returns the id it already has; two separately built relations get
/// distinct ids even when they are structurally identical.
#[derive(Debug, Default, Clone)]
pub struct FunctionSystem {
    relations: Vec<Arc<Relation>>,
    index: HashMap<ArcRefId<Relation>, RelationId>,
    config: DerivationConfig,
}

impl FunctionSystem {
    /// Create a system from relations, in the order they will be visited.
    pub fn new<R: Into<Arc<Relation>>>(relations: impl IntoIterator<Item = R>) -> Self {
        let mut system = Self::default();
        for relation in relations {
            system.append(relation);
        }
        system
    }

    pub fn with_config(mut self, config: DerivationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DerivationConfig) {
        self.config = config;
    }

    /// Register a relation at the end of the visiting order.
    pub fn append(&mut self, relation: impl Into<Arc<Relation>>) -> RelationId {
        let relation = relation.into();
        let key = ArcRefId::new(Arc::clone(&relation));
        if let Some(&id) = self.index.get(&key) {
            debug!("Relation {} already registered as {}", relation, id);
            return id;
        }

        let id = RelationId(self.relations.len());
        debug!("Registered relation {} as {}", relation, id);
        self.relations.push(relation);
        self.index.insert(key, id);
        id
    }

    /// Id of an already registered relation.
    pub fn id_of(&self, relation: &Arc<Relation>) -> Option<RelationId> {
        self.index.get(&ArcRefId::new(Arc::clone(relation))).copied()
    }

    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(id.0).map(Arc::as_ref)
    }

    /// Relations in visiting order.
    pub fn relations(&self) -> impl ExactSizeIterator<Item = (RelationId, &Relation)> {
        self.relations
            .iter()
            .enumerate()
            .map(|(i, r)| (RelationId(i), r.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Open a stepwise derivation session over `table`.
    pub fn session(&self, table: &Table) -> DerivationSession<'_> {
        DerivationSession::new(self, table)
    }

    /// Derive every value reachable from `table` and return all records.
    ///
    /// Fails only when a formula fails under [`FailurePolicy::Abort`]; in that
    /// case nothing of the run is returned.
    ///
    /// [`FailurePolicy::Abort`]: crate::utils::conf::FailurePolicy::Abort
    pub fn derive(&self, table: &Table) -> FsResult<Derivation> {
        self.session(table).run()
    }
}

impl fmt::Display for FunctionSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, relation)) in self.relations().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", id, relation)?;
        }
        Ok(())
    }
}
