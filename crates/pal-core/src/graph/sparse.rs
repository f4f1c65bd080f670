//! Compressed sparse row matrices for kNN, affinity, and transition graphs.
//!
//! Row `i` occupies `indptr[i]..indptr[i + 1]` of `indices`/`data`, with
//! column indices strictly increasing within a row. Explicit zeros are
//! never stored.

use pal_common::{Error, Result};

/// Square or rectangular sparse matrix in CSR layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// An all-zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            indptr: vec![0; nrows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed. Zero results are dropped.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let mut entries: Vec<(usize, usize, f64)> = triplets.into_iter().collect();
        if let Some(&(r, c, _)) = entries.iter().find(|&&(r, c, _)| r >= nrows || c >= ncols) {
            return Err(Error::invalid_parameter(
                "triplets",
                format!("entry ({r}, {c}) outside a {nrows}x{ncols} matrix"),
            ));
        }
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut indptr = vec![0usize; nrows + 1];
        let mut indices = Vec::with_capacity(entries.len());
        let mut data: Vec<f64> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;
        for (r, c, v) in entries {
            if last == Some((r, c)) {
                if let Some(tail) = data.last_mut() {
                    *tail += v;
                }
                continue;
            }
            indptr[r + 1] += 1;
            indices.push(c);
            data.push(v);
            last = Some((r, c));
        }
        for i in 0..nrows {
            indptr[i + 1] += indptr[i];
        }
        let mut m = Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        };
        m.retain(|_, _, v| v != 0.0);
        Ok(m)
    }

    /// Build from a dense row-major buffer, skipping zeros.
    pub fn from_dense(nrows: usize, ncols: usize, values: &[f64]) -> Result<Self> {
        if values.len() != nrows * ncols {
            return Err(Error::InputShapeMismatch {
                context: "dense matrix".to_string(),
                expected: nrows * ncols,
                actual: values.len(),
            });
        }
        let triplets = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(k, &v)| (k / ncols, k % ncols, v));
        Self::from_triplets(nrows, ncols, triplets)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let span = self.indptr[i]..self.indptr[i + 1];
        (&self.indices[span.clone()], &self.data[span])
    }

    /// Iterate `(col, value)` over row `i`.
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (cols, vals) = self.row(i);
        cols.iter().copied().zip(vals.iter().copied())
    }

    /// Iterate every stored `(row, col, value)` in row-major order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.nrows).flat_map(move |i| self.row_iter(i).map(move |(j, v)| (i, j, v)))
    }

    /// Stored value at `(i, j)`, or 0.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (cols, vals) = self.row(i);
        match cols.binary_search(&j) {
            Ok(pos) => vals[pos],
            Err(_) => 0.0,
        }
    }

    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.nrows)
            .map(|i| self.row(i).1.iter().sum())
            .collect()
    }

    /// Keep only entries for which `keep(row, col, value)` holds.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, usize, f64) -> bool,
    {
        let mut indptr = Vec::with_capacity(self.nrows + 1);
        indptr.push(0);
        let mut write = 0;
        for i in 0..self.nrows {
            for read in self.indptr[i]..self.indptr[i + 1] {
                let (j, v) = (self.indices[read], self.data[read]);
                if keep(i, j, v) {
                    self.indices[write] = j;
                    self.data[write] = v;
                    write += 1;
                }
            }
            indptr.push(write);
        }
        self.indices.truncate(write);
        self.data.truncate(write);
        self.indptr = indptr;
    }

    pub fn transpose(&self) -> Self {
        let mut counts = vec![0usize; self.ncols + 1];
        for &j in &self.indices {
            counts[j + 1] += 1;
        }
        for j in 0..self.ncols {
            counts[j + 1] += counts[j];
        }
        let indptr = counts.clone();
        let mut next = counts;
        let mut indices = vec![0usize; self.nnz()];
        let mut data = vec![0.0; self.nnz()];
        for i in 0..self.nrows {
            for (j, v) in self.row_iter(i) {
                let dst = next[j];
                indices[dst] = i;
                data[dst] = v;
                next[j] += 1;
            }
        }
        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            indptr,
            indices,
            data,
        }
    }

    /// Undirected view of a non-negative weighted graph.
    ///
    /// An edge stored in either direction connects both endpoints. When both
    /// directions are stored the smaller weight is kept.
    pub fn symmetrize_min(&self) -> Self {
        let t = self.transpose();
        let mut triplets = Vec::with_capacity(2 * self.nnz());
        for i in 0..self.nrows {
            let (ac, av) = self.row(i);
            let (bc, bv) = t.row(i);
            let (mut p, mut q) = (0, 0);
            while p < ac.len() || q < bc.len() {
                let take_a = q >= bc.len() || (p < ac.len() && ac[p] < bc[q]);
                let take_b = p >= ac.len() || (q < bc.len() && bc[q] < ac[p]);
                if take_a {
                    triplets.push((i, ac[p], av[p]));
                    p += 1;
                } else if take_b {
                    triplets.push((i, bc[q], bv[q]));
                    q += 1;
                } else {
                    triplets.push((i, ac[p], av[p].min(bv[q])));
                    p += 1;
                    q += 1;
                }
            }
        }
        Self::from_sorted_unchecked(self.nrows, self.ncols, triplets)
    }

    /// Copy with `extra` entries added (summed on collision).
    pub fn with_entries(&self, extra: &[(usize, usize, f64)]) -> Result<Self> {
        let triplets = self.triplets().chain(extra.iter().copied());
        Self::from_triplets(self.nrows, self.ncols, triplets)
    }

    /// Scale each row to sum to one.
    ///
    /// A row with zero or non-finite total makes the chain undefined and is
    /// reported as [`Error::DegenerateChain`] naming the row.
    pub fn normalize_rows(&self) -> Result<Self> {
        let sums = self.row_sums();
        if let Some((state, &total)) = sums
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(Error::DegenerateChain {
                state,
                dimension: self.nrows,
                label: None,
                reason: format!("row has total affinity {total}"),
            });
        }
        let mut out = self.clone();
        for i in 0..self.nrows {
            for k in out.indptr[i]..out.indptr[i + 1] {
                out.data[k] /= sums[i];
            }
        }
        Ok(out)
    }

    /// `y = A x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.ncols);
        (0..self.nrows)
            .map(|i| self.row_iter(i).map(|(j, v)| v * x[j]).sum())
            .collect()
    }

    /// `y = Aᵀ x`.
    pub fn mul_transpose_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.nrows);
        let mut y = vec![0.0; self.ncols];
        for (i, &xi) in x.iter().enumerate() {
            if xi == 0.0 {
                continue;
            }
            for (j, v) in self.row_iter(i) {
                y[j] += v * xi;
            }
        }
        y
    }

    /// Dense row-major copy.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.nrows * self.ncols];
        for (i, j, v) in self.triplets() {
            out[i * self.ncols + j] = v;
        }
        out
    }

    fn from_sorted_unchecked(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
        let mut indptr = vec![0usize; nrows + 1];
        let mut indices = Vec::with_capacity(triplets.len());
        let mut data = Vec::with_capacity(triplets.len());
        for (r, c, v) in triplets {
            indptr[r + 1] += 1;
            indices.push(c);
            data.push(v);
        }
        for i in 0..nrows {
            indptr[i + 1] += indptr[i];
        }
        Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        }
    }
}
