//! Data model for function systems.
//!
//! This crate describes *what* can be derived, not how the search happens:
//!
//! - [`variable::Variable`]: a named quantity;
//! - [`column::Column`] and [`table::Table`]: shared numeric columns grouped
//!   into equal-length tables;
//! - [`relation::Relation`]: a partial, invertible relation among variables,
//!   with one [`relation::Formula`] per variable it can compute.
//!
//! The fixed-point search over a set of relations lives in `fscore`.

pub mod column;
pub mod relation;
pub mod table;
pub mod utils;
pub mod variable;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::column::Column;
    pub use crate::relation::{Formula, Relation};
    pub use crate::table::Table;
    pub use crate::utils::{Error, FormulaError};
    pub use crate::variable::Variable;
}
