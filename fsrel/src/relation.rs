//! Partial, invertible relations among a fixed set of variables.
//!
//! A [`Relation`] states that its variables are tied together, e.g. `a = b * c`.
//! For every variable it *can* compute, it carries a [`Formula`] taking all the
//! other variables of the relation as input. Variables without a formula still
//! take part as inputs but are never produced; such a relation is *partial*.
//!
//! ```
//! use fsrel::{relation::{Formula, Relation}, table::Table};
//!
//! // a = b * c, solved for a and b only
//! let rel = Relation::new(
//!     ["a", "b", "c"],
//!     [
//!         ("a", Formula::pointwise(["b", "c"], |x| x[0] * x[1])),
//!         ("b", Formula::pointwise(["a", "c"], |x| x[0] / x[1])),
//!     ],
//! )
//! .unwrap();
//!
//! let table = Table::from_columns([("b", [2.0, 3.0]), ("c", [5.0, 7.0])]).unwrap();
//! let out = rel.apply(&table).unwrap();
//! assert_eq!(out.column("a").unwrap().values(), &[10.0, 21.0]);
//! ```
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use log::trace;
use smallvec::SmallVec;

use crate::{
    column::Column,
    table::Table,
    utils::{Error, FormulaError, Result},
    variable::Variable,
};

type FormulaFn = dyn Fn(&Table) -> std::result::Result<Column, FormulaError> + Send + Sync;

/// A function computing one variable of a relation from all the others.
///
/// The relation hands the formula a [`Table`] holding exactly the other
/// variables of the relation, never more.
pub struct Formula(Box<FormulaFn>);

impl Formula {
    /// Wrap a table-level function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Table) -> std::result::Result<Column, FormulaError> + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    /// Row-wise formula over the named inputs.
    ///
    /// For every row, `f` receives the values of `inputs` in the given order.
    pub fn pointwise<V, F>(inputs: impl IntoIterator<Item = V>, f: F) -> Self
    where
        V: Into<Variable>,
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        let inputs: Vec<Variable> = inputs.into_iter().map(Into::into).collect();
        Self::new(move |table: &Table| {
            let columns = inputs
                .iter()
                .map(|name| table.column(name))
                .collect::<Result<SmallVec<&Column, 4>>>()?;

            let mut row: SmallVec<f64, 4> = SmallVec::with_capacity(columns.len());
            let values: Column = (0..table.row_count())
                .map(|i| {
                    row.clear();
                    row.extend(columns.iter().map(|c| c[i]));
                    f(&row)
                })
                .collect();
            Ok(values)
        })
    }

    /// Evaluate the formula on a table.
    pub fn call(&self, table: &Table) -> std::result::Result<Column, FormulaError> {
        (self.0)(table)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formula(..)")
    }
}

/// A functional relation among a fixed set of variables.
///
/// Relations are immutable once constructed. They carry no identity of their
/// own: a system of relations tells them apart by registration, so two
/// structurally equal relations declared separately remain distinct.
#[derive(Debug)]
pub struct Relation {
    label: Option<String>,
    variables: BTreeSet<Variable>,
    formulas: BTreeMap<Variable, Formula>,
}

impl Relation {
    /// Create a (possibly partial) relation.
    ///
    /// Every formula output must be one of `variables`, otherwise
    /// [`Error::UnknownOutputVariable`] is returned.
    pub fn new<V, O>(
        variables: impl IntoIterator<Item = V>,
        formulas: impl IntoIterator<Item = (O, Formula)>,
    ) -> Result<Self>
    where
        V: Into<Variable>,
        O: Into<Variable>,
    {
        let variables: BTreeSet<Variable> = variables.into_iter().map(Into::into).collect();
        let mut map = BTreeMap::new();
        for (output, formula) in formulas {
            let output = output.into();
            if !variables.contains(&output) {
                return Err(Error::UnknownOutputVariable { variable: output });
            }
            map.insert(output, formula);
        }

        Ok(Self {
            label: None,
            variables,
            formulas: map,
        })
    }

    /// Create a relation where every variable has a formula.
    ///
    /// The variable set is the set of formula outputs.
    pub fn total<O: Into<Variable>>(formulas: impl IntoIterator<Item = (O, Formula)>) -> Self {
        let formulas: BTreeMap<Variable, Formula> = formulas
            .into_iter()
            .map(|(output, formula)| (output.into(), formula))
            .collect();
        Self {
            label: None,
            variables: formulas.keys().cloned().collect(),
            formulas,
        }
    }

    /// Attach a human readable label, used in logs and lineage rendering.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// All variables taking part in this relation.
    pub fn variables(&self) -> &BTreeSet<Variable> {
        &self.variables
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.variables.contains(variable)
    }

    /// Variables this relation has a formula for.
    pub fn outputs(&self) -> impl Iterator<Item = &Variable> {
        self.formulas.keys()
    }

    pub fn has_formula(&self, variable: &str) -> bool {
        self.formulas.contains_key(variable)
    }

    /// Inputs required to compute `output`: every other variable of the relation.
    pub fn inputs_for<'a>(&'a self, output: &'a str) -> impl Iterator<Item = &'a Variable> {
        self.variables.iter().filter(move |v| v.as_str() != output)
    }

    /// Number of inputs each formula takes.
    pub fn input_arity(&self) -> usize {
        self.variables.len().saturating_sub(1)
    }

    fn inputs_known(&self, output: &str, known: &BTreeSet<Variable>) -> bool {
        self.inputs_for(output).all(|v| known.contains(v))
    }

    /// Whether at least one output can be computed from `known`.
    pub fn can_produce(&self, known: &BTreeSet<Variable>) -> bool {
        self.outputs().any(|output| self.inputs_known(output, known))
    }

    /// Every output whose inputs are all in `known`.
    ///
    /// An output that is itself in `known` is still listed: computing it again
    /// yields an independent value to compare with.
    pub fn producible<'a>(
        &'a self,
        known: &'a BTreeSet<Variable>,
    ) -> impl Iterator<Item = &'a Variable> + 'a {
        self.outputs()
            .filter(move |output| self.inputs_known(output, known))
    }

    fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => {
                let names: Vec<&str> = self.variables.iter().map(Variable::as_str).collect();
                format!("{{{}}}", names.join(", "))
            }
        }
    }

    /// Compute a single output from `table`.
    ///
    /// The formula receives `table` restricted to [`Relation::inputs_for`]. The
    /// returned column must have the table's row count.
    pub fn compute(&self, output: &str, table: &Table) -> Result<Column> {
        let Some((output, formula)) = self.formulas.get_key_value(output) else {
            return Err(Error::NoFormula {
                relation: self.display_name(),
                variable: Variable::new(output),
            });
        };

        let inputs = table.restrict(self.inputs_for(output));
        if let Some(missing) = self.inputs_for(output).find(|v| !inputs.contains(v)) {
            return Err(Error::MissingColumn {
                variable: missing.clone(),
            });
        }

        trace!(
            "Evaluating `{}` with relation {} over {} rows",
            output,
            self.display_name(),
            inputs.row_count()
        );
        let column = formula
            .call(&inputs)
            .map_err(|source| Error::FormulaEvaluation {
                relation: self.display_name(),
                output: output.clone(),
                source,
            })?;

        if column.len() != inputs.row_count() {
            return Err(Error::ColumnLengthMismatch {
                variable: output.clone(),
                expected: inputs.row_count(),
                found: column.len(),
            });
        }
        Ok(column)
    }

    /// Apply the relation to a table.
    ///
    /// - two or more relation variables missing: [`Error::InsufficientInput`];
    /// - exactly one missing: that variable is computed (or [`Error::NoFormula`]);
    /// - none missing: every output with a formula is recomputed, which is
    ///   useful to compare measured against predicted values.
    ///
    /// Columns of `table` outside the relation are ignored.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        let missing: Vec<Variable> = self
            .variables
            .iter()
            .filter(|v| !table.contains(v))
            .cloned()
            .collect();

        if missing.len() > 1 {
            return Err(Error::InsufficientInput {
                relation: self.display_name(),
                missing,
            });
        }

        let mut out = Table::with_rows(table.row_count());
        match missing.first() {
            Some(unknown) => {
                out.insert(unknown.clone(), self.compute(unknown, table)?)?;
            }
            None => {
                for output in self.outputs() {
                    out.insert(output.clone(), self.compute(output, table)?)?;
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(names: &[&str]) -> BTreeSet<Variable> {
        names.iter().copied().map(Variable::from).collect()
    }

    fn product() -> Relation {
        Relation::total([
            ("a", Formula::pointwise(["b", "c"], |x| x[0] * x[1])),
            ("b", Formula::pointwise(["a", "c"], |x| x[0] / x[1])),
            ("c", Formula::pointwise(["a", "b"], |x| x[0] / x[1])),
        ])
    }

    #[test]
    fn queries_on_total_relation() {
        let rel = product();
        assert!(rel.can_produce(&known(&["b", "c"])));
        assert!(!rel.can_produce(&known(&["b"])));

        let all = known(&["a", "b", "c"]);
        let producible: Vec<_> = rel.producible(&all).map(Variable::as_str).collect();
        assert_eq!(producible, ["a", "b", "c"]);

        let inputs: Vec<_> = rel.inputs_for("b").map(Variable::as_str).collect();
        assert_eq!(inputs, ["a", "c"]);
        assert_eq!(rel.input_arity(), 2);
    }

    #[test]
    fn partial_relation_cannot_produce_missing_formula() {
        let rel = Relation::new(["a", "b"], [("a", Formula::pointwise(["b"], |x| x[0] * 2.0))])
            .unwrap();
        assert!(rel.can_produce(&known(&["b"])));
        assert!(!rel.can_produce(&known(&["a"])));

        let only_a = Table::from_columns([("a", [2.0])]).unwrap();
        assert!(rel.apply(&only_a).unwrap_err().is_no_formula());
    }

    #[test]
    fn formula_for_foreign_variable_is_rejected() {
        let err = Relation::new(["a", "b"], [("z", Formula::pointwise(["a"], |x| x[0]))])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownOutputVariable { variable } if variable == "z"));
    }

    #[test]
    fn apply_with_single_missing_variable() {
        let table = Table::from_columns([("b", [1.0, 2.0]), ("c", [3.0, 4.0])]).unwrap();
        let out = product().apply(&table).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.column("a").unwrap().values(), &[3.0, 8.0]);
    }

    #[test]
    fn apply_with_two_missing_variables_fails() {
        let table = Table::from_columns([("c", [1.0])]).unwrap();
        match product().apply(&table) {
            Err(Error::InsufficientInput { missing, .. }) => {
                assert_eq!(missing, [Variable::new("a"), Variable::new("b")]);
            }
            other => panic!("expected insufficient input, got {other:?}"),
        }
    }

    #[test]
    fn formula_only_sees_its_inputs() {
        let rel = Relation::total([
            (
                "x",
                Formula::new(|t: &Table| {
                    assert_eq!(t.len(), 1);
                    assert!(t.contains("y"));
                    Ok(t.column("y")?.map(|v| v + 1.0))
                }),
            ),
            ("y", Formula::pointwise(["x"], |x| x[0] - 1.0)),
        ]);
        let table = Table::from_columns([("y", [1.0]), ("unrelated", [9.0])]).unwrap();
        let out = rel.compute("x", &table).unwrap();
        assert_eq!(out.values(), &[2.0]);
    }

    #[test]
    fn wrong_output_length_is_reported() {
        let rel = Relation::total([
            ("x", Formula::new(|_: &Table| Ok(Column::from([1.0])))),
            ("y", Formula::pointwise(["x"], |x| x[0])),
        ]);
        let table = Table::from_columns([("y", [1.0, 2.0])]).unwrap();
        let err = rel.compute("x", &table).unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnLengthMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn failing_formula_is_wrapped() {
        let rel = Relation::total([
            ("x", Formula::new(|_: &Table| Err("domain error".into()))),
            ("y", Formula::pointwise(["x"], |x| x[0])),
        ])
        .with_label("broken");
        let table = Table::from_columns([("y", [1.0])]).unwrap();
        let err = rel.compute("x", &table).unwrap_err();
        assert!(err.is_formula_evaluation());
        assert!(err.to_string().contains("broken"));
    }
}
