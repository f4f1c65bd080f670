//! Dense matrices with labeled rows and columns.
//!
//! Used for branch probabilities (cells × terminal states) and fate
//! probabilities (cells × labels).

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::id::CellId;
use crate::series::{build_index, LabeledSeries};

/// Row-major dense matrix with cell-labeled rows and named columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledMatrix {
    rows: Vec<CellId>,
    columns: Vec<String>,
    values: Vec<f64>,
    #[serde(skip)]
    row_index: HashMap<CellId, usize>,
}

impl LabeledMatrix {
    pub fn new(rows: Vec<CellId>, columns: Vec<String>, values: Vec<f64>) -> Result<Self> {
        let expected = rows.len() * columns.len();
        if values.len() != expected {
            return Err(Error::InputShapeMismatch {
                context: "matrix values".to_string(),
                expected,
                actual: values.len(),
            });
        }
        let row_index = build_index(&rows)?;
        Ok(Self {
            rows,
            columns,
            values,
            row_index,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn row_labels(&self) -> &[CellId] {
        &self.rows
    }

    pub fn column_labels(&self) -> &[String] {
        &self.columns
    }

    /// Flat row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let c = self.ncols();
        &self.values[i * c..(i + 1) * c]
    }

    pub fn row_by_label(&self, label: &CellId) -> Option<&[f64]> {
        self.row_index.get(label).map(|&i| self.row(i))
    }

    pub fn get(&self, label: &CellId, column: &str) -> Option<f64> {
        let j = self.columns.iter().position(|c| c == column)?;
        self.row_by_label(label).map(|r| r[j])
    }

    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.row(i).iter().sum()).collect()
    }

    /// Apply `f` to every row, producing a series over the row labels.
    pub fn map_rows<F>(&self, f: F) -> LabeledSeries
    where
        F: Fn(&[f64]) -> f64,
    {
        let values = (0..self.nrows()).map(|i| f(self.row(i))).collect();
        LabeledSeries::from_unique(self.rows.clone(), values)
    }

    /// A new matrix with rows restricted to (and ordered by) `labels`.
    pub fn reindex_rows(&self, labels: &[CellId]) -> Result<Self> {
        let mut values = Vec::with_capacity(labels.len() * self.ncols());
        for label in labels {
            let row = self
                .row_by_label(label)
                .ok_or_else(|| Error::unknown_cell(label))?;
            values.extend_from_slice(row);
        }
        Self::new(labels.to_vec(), self.columns.clone(), values)
    }
}
