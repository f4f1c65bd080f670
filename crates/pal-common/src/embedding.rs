//! The labeled multiscale embedding consumed by the pipeline.
//!
//! Rows are cells, columns are embedding components. Storage is a single
//! row-major buffer so that distance kernels can take contiguous slices.

use std::collections::HashMap;

use pal_math::squared_euclidean;

use crate::error::{Error, Result};
use crate::id::CellId;
use crate::series::build_index;

/// Cells × components matrix with unique cell labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    cells: Vec<CellId>,
    components: Vec<String>,
    data: Vec<f64>,
    index: HashMap<CellId, usize>,
}

impl Embedding {
    /// Build an embedding from a row-major buffer.
    ///
    /// Rejects empty shapes, duplicate labels, mismatched buffer length,
    /// and NaN or infinite entries.
    pub fn new(cells: Vec<CellId>, components: Vec<String>, data: Vec<f64>) -> Result<Self> {
        if cells.is_empty() || components.is_empty() {
            return Err(Error::EmptyEmbedding);
        }
        let expected = cells.len() * components.len();
        if data.len() != expected {
            return Err(Error::InputShapeMismatch {
                context: "embedding data".to_string(),
                expected,
                actual: data.len(),
            });
        }
        let index = build_index(&cells)?;
        let d = components.len();
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteValue {
                label: cells[pos / d].to_string(),
                component: pos % d,
            });
        }
        Ok(Self {
            cells,
            components,
            data,
            index,
        })
    }

    /// Build an embedding from per-cell rows. Components are named `C0`, `C1`, ...
    pub fn from_rows(cells: Vec<CellId>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let d = rows.first().map(Vec::len).unwrap_or(0);
        if rows.len() != cells.len() {
            return Err(Error::InputShapeMismatch {
                context: "embedding rows".to_string(),
                expected: cells.len(),
                actual: rows.len(),
            });
        }
        let mut data = Vec::with_capacity(rows.len() * d);
        for row in &rows {
            if row.len() != d {
                return Err(Error::InputShapeMismatch {
                    context: "embedding row width".to_string(),
                    expected: d,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        let components = (0..d).map(|j| format!("C{j}")).collect();
        Self::new(cells, components, data)
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Flat row-major values.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let d = self.n_components();
        &self.data[i * d..(i + 1) * d]
    }

    pub fn position(&self, label: &CellId) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Row index of `label`, or [`Error::UnknownCell`].
    pub fn require(&self, label: &CellId) -> Result<usize> {
        self.position(label).ok_or_else(|| Error::unknown_cell(label))
    }

    /// Copy of component `j` across all cells.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.n_cells()).map(|i| self.row(i)[j]).collect()
    }

    /// Rescale every component to [0, 1]. Constant components become 0.
    pub fn min_max_scaled(&self) -> Self {
        let d = self.n_components();
        let mut lo = vec![f64::INFINITY; d];
        let mut hi = vec![f64::NEG_INFINITY; d];
        for i in 0..self.n_cells() {
            for (j, &v) in self.row(i).iter().enumerate() {
                lo[j] = lo[j].min(v);
                hi[j] = hi[j].max(v);
            }
        }
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(k, &v)| {
                let j = k % d;
                let range = hi[j] - lo[j];
                if range > 0.0 {
                    (v - lo[j]) / range
                } else {
                    0.0
                }
            })
            .collect();
        Self {
            cells: self.cells.clone(),
            components: self.components.clone(),
            data,
            index: self.index.clone(),
        }
    }

    /// Rows holding the maximum or minimum of some component.
    ///
    /// The first occurrence wins on ties. The result is deduplicated and
    /// sorted by row index.
    pub fn boundary_cells(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(2 * self.n_components());
        for j in 0..self.n_components() {
            let mut arg_lo = 0;
            let mut arg_hi = 0;
            for i in 1..self.n_cells() {
                let v = self.row(i)[j];
                if v < self.row(arg_lo)[j] {
                    arg_lo = i;
                }
                if v > self.row(arg_hi)[j] {
                    arg_hi = i;
                }
            }
            out.push(arg_lo);
            out.push(arg_hi);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Restrict to the given rows, in that order.
    pub fn subset(&self, rows: &[usize]) -> Result<Self> {
        let d = self.n_components();
        let mut data = Vec::with_capacity(rows.len() * d);
        let mut cells = Vec::with_capacity(rows.len());
        for &i in rows {
            if i >= self.n_cells() {
                return Err(Error::invalid_parameter(
                    "rows",
                    format!("row {i} out of range for {} cells", self.n_cells()),
                ));
            }
            cells.push(self.cells[i].clone());
            data.extend_from_slice(self.row(i));
        }
        Self::new(cells, self.components.clone(), data)
    }

    /// Candidate row closest to `target` in Euclidean distance.
    ///
    /// Ties go to the earliest candidate. None when `candidates` is empty.
    pub fn nearest_among(&self, target: usize, candidates: &[usize]) -> Option<usize> {
        let origin = self.row(target);
        let mut best: Option<(usize, f64)> = None;
        for &c in candidates {
            let d = squared_euclidean(origin, self.row(c));
            match best {
                Some((_, b)) if d >= b => {}
                _ => best = Some((c, d)),
            }
        }
        best.map(|(c, _)| c)
    }
}
