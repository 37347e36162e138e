//! Fixed-point derivation engine over systems of function relations.
//!
//! Given a [`system::FunctionSystem`] (a set of relations from `fsrel`) and a
//! table of known columns, the engine computes every value the relations can
//! produce and records how each one was obtained. Most consumers only need
//! [`system::FunctionSystem::derive`] and the queries of
//! [`derivation::Derivation`]; [`derivator::DerivationSession`] gives
//! pass-by-pass control.
//!
//! The crate logs through the `log` facade and never installs a logger.

pub mod derivation;
pub mod derivator;
pub mod lineage;
pub mod magic;
pub mod record;
pub mod system;
pub mod utils;

pub extern crate fsrel;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::derivation::{Derivation, Discrepancy};
    pub use crate::derivator::{DerivationRunInfo, DerivationSession, DerivationStatus};
    pub use crate::record::{Record, RecordId};
    pub use crate::system::{FunctionSystem, RelationId};
    pub use crate::utils::conf::{DerivationConfig, FailurePolicy, PassVisibility};
    pub use crate::utils::error::{FsError, FsResult};
    pub use fsrel::prelude::*;
}
