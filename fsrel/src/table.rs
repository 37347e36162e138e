//! Named columns of equal length.
//!
//! [`Table`] is both the dataset handed to the engine and the shape in which
//! a relation formula receives its inputs.
use std::collections::{BTreeMap, btree_map};

use crate::{
    column::Column,
    utils::{Error, Result},
    variable::Variable,
};

/// An ordered set of named columns sharing one row count.
///
/// The row count is fixed by the first inserted column and survives
/// [`Table::restrict`], so a formula with no inputs still knows how many
/// rows to produce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: BTreeMap<Variable, Column>,
    rows: Option<usize>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with a fixed row count.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            columns: BTreeMap::new(),
            rows: Some(rows),
        }
    }

    /// Build a table from `(name, column)` pairs, checking that lengths agree.
    ///
    /// A name given twice keeps the last column.
    pub fn from_columns<V, C>(columns: impl IntoIterator<Item = (V, C)>) -> Result<Self>
    where
        V: Into<Variable>,
        C: Into<Column>,
    {
        let mut table = Self::new();
        for (name, column) in columns {
            table.insert(name, column)?;
        }
        Ok(table)
    }

    /// Insert or replace a column.
    pub fn insert(&mut self, name: impl Into<Variable>, column: impl Into<Column>) -> Result<()> {
        let name = name.into();
        let column = column.into();
        match self.rows {
            Some(expected) if expected != column.len() => {
                return Err(Error::ColumnLengthMismatch {
                    variable: name,
                    expected,
                    found: column.len(),
                });
            }
            Some(_) => {}
            None => self.rows = Some(column.len()),
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Column lookup.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Column lookup failing with [`Error::MissingColumn`].
    ///
    /// This is the accessor formulas are expected to use, so that a missing
    /// input surfaces as a formula error rather than a panic.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns.get(name).ok_or_else(|| Error::MissingColumn {
            variable: Variable::new(name),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &Variable> {
        self.columns.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Variable, Column> {
        self.columns.iter()
    }

    /// Number of rows (zero for a table that never received a column).
    pub fn row_count(&self) -> usize {
        self.rows.unwrap_or(0)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Copy of this table keeping only the listed columns that are present.
    pub fn restrict<'a>(&self, names: impl IntoIterator<Item = &'a Variable>) -> Table {
        let columns = names
            .into_iter()
            .filter_map(|name| {
                self.columns
                    .get_key_value(name.as_str())
                    .map(|(k, c)| (k.clone(), c.clone()))
            })
            .collect();
        Table {
            columns,
            rows: self.rows,
        }
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a Variable, &'a Column);
    type IntoIter = btree_map::Iter<'a, Variable, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
