use strum::EnumIs;
use thiserror::Error;

use crate::variable::Variable;

/// Boxed error returned by a [`Formula`](crate::relation::Formula) when it cannot produce a column.
pub type FormulaError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, EnumIs, Error)]
pub enum Error {
    /// More than one variable of a relation is unknown; a relation resolves at most one.
    #[error(
        "Relation `{relation}` cannot be applied: {} of its variables are missing ({}). At most one unknown can be resolved.",
        missing.len(),
        DisplayList(missing)
    )]
    InsufficientInput {
        relation: String,
        missing: Vec<Variable>,
    },

    /// The requested output has no formula in this relation.
    #[error("Relation `{relation}` has no formula producing `{variable}`.")]
    NoFormula { relation: String, variable: Variable },

    /// A formula was registered for a variable that does not take part in the relation.
    #[error(
        "A formula was registered for `{variable}` but `{variable}` is not one of the relation variables."
    )]
    UnknownOutputVariable { variable: Variable },

    /// A table lookup referenced a column that is not present.
    #[error("The table has no column named `{variable}`.")]
    MissingColumn { variable: Variable },

    /// A column does not have the row count of the table it belongs to.
    #[error("Column `{variable}` has {found} rows but the table has {expected} rows.")]
    ColumnLengthMismatch {
        variable: Variable,
        expected: usize,
        found: usize,
    },

    /// The formula itself failed on otherwise valid input.
    #[error("Formula for `{output}` in relation `{relation}` failed: {source}")]
    FormulaEvaluation {
        relation: String,
        output: Variable,
        #[source]
        source: FormulaError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

struct DisplayList<'a>(&'a [Variable]);

impl std::fmt::Display for DisplayList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`{}`", v)?;
        }
        Ok(())
    }
}
