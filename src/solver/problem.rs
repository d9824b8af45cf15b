//! A solver-neutral linear problem with optional integer columns.
use std::ops::{Bound, RangeBounds};

/// A column (decision variable) of a [`Problem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub(super) usize);

impl Variable {
    /// The position of this column in the problem
    pub fn index(self) -> usize {
        self.0
    }
}

/// Column data
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Objective coefficient
    pub cost: f64,
    /// Lower bound (may be `-inf`)
    pub lower: f64,
    /// Upper bound (may be `inf`)
    pub upper: f64,
    /// Whether the column must take an integer value
    pub integer: bool,
}

/// A linear constraint `lower <= Σ coeff × column <= upper`
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Lower bound (may be `-inf`)
    pub lower: f64,
    /// Upper bound (may be `inf`)
    pub upper: f64,
    /// Non-zero coefficients
    pub terms: Vec<(Variable, f64)>,
}

impl Row {
    /// Whether this row is an equality constraint
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }
}

/// A minimisation problem
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

/// Convert range bounds into a `(lower, upper)` pair
fn to_limits<B: RangeBounds<f64>>(bounds: &B) -> (f64, f64) {
    let lower = match bounds.start_bound() {
        Bound::Included(value) | Bound::Excluded(value) => *value,
        Bound::Unbounded => f64::NEG_INFINITY,
    };
    let upper = match bounds.end_bound() {
        Bound::Included(value) | Bound::Excluded(value) => *value,
        Bound::Unbounded => f64::INFINITY,
    };

    (lower, upper)
}

impl Problem {
    /// Add a continuous column
    pub fn add_column<B: RangeBounds<f64>>(&mut self, cost: f64, bounds: B) -> Variable {
        self.push_column(cost, &bounds, false)
    }

    /// Add an integer column
    pub fn add_integer_column<B: RangeBounds<f64>>(&mut self, cost: f64, bounds: B) -> Variable {
        self.push_column(cost, &bounds, true)
    }

    fn push_column<B: RangeBounds<f64>>(
        &mut self,
        cost: f64,
        bounds: &B,
        integer: bool,
    ) -> Variable {
        let (lower, upper) = to_limits(bounds);
        self.columns.push(Column {
            cost,
            lower,
            upper,
            integer,
        });

        Variable(self.columns.len() - 1)
    }

    /// Add a row
    pub fn add_row<B, I>(&mut self, bounds: B, terms: I)
    where
        B: RangeBounds<f64>,
        I: IntoIterator<Item = (Variable, f64)>,
    {
        let (lower, upper) = to_limits(&bounds);
        self.rows.push(Row {
            lower,
            upper,
            terms: terms.into_iter().filter(|(_, coeff)| *coeff != 0.0).collect(),
        });
    }

    /// Fix a column to a single value
    pub fn fix_column(&mut self, var: Variable, value: f64) {
        let column = &mut self.columns[var.0];
        column.lower = value;
        column.upper = value;
    }

    /// The columns of the problem
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The rows of the problem
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get a column's data
    pub fn column(&self, var: Variable) -> &Column {
        &self.columns[var.0]
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether any column is integer
    pub fn has_integer_columns(&self) -> bool {
        self.columns.iter().any(|column| column.integer)
    }
}
