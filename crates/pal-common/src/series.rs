//! Label-indexed vectors.
//!
//! A [`LabeledSeries`] is an ordered mapping from cell label to value with
//! stable insertion order. Pseudotime, entropy, and distance rows are all
//! carried as series so that results from differently ordered computations
//! can be aligned by label instead of by position.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::id::CellId;

/// Ordered label → value mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    labels: Vec<CellId>,
    values: Vec<f64>,
    index: HashMap<CellId, usize>,
}

impl LabeledSeries {
    /// Build a series; labels must be unique and match `values` in length.
    pub fn new(labels: Vec<CellId>, values: Vec<f64>) -> Result<Self> {
        if labels.len() != values.len() {
            return Err(Error::InputShapeMismatch {
                context: "series values".to_string(),
                expected: labels.len(),
                actual: values.len(),
            });
        }
        let index = build_index(&labels)?;
        Ok(Self {
            labels,
            values,
            index,
        })
    }

    /// Build a series from labels already known to be unique.
    pub(crate) fn from_unique(labels: Vec<CellId>, values: Vec<f64>) -> Self {
        debug_assert_eq!(labels.len(), values.len());
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self {
            labels,
            values,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[CellId] {
        &self.labels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, label: &CellId) -> Option<f64> {
        self.index.get(label).map(|&i| self.values[i])
    }

    pub fn position(&self, label: &CellId) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellId, f64)> {
        self.labels.iter().zip(self.values.iter().copied())
    }

    /// Values for `labels`, in that order. Fails on the first missing label.
    pub fn values_for(&self, labels: &[CellId]) -> Result<Vec<f64>> {
        labels
            .iter()
            .map(|l| self.get(l).ok_or_else(|| Error::unknown_cell(l)))
            .collect()
    }

    /// A new series restricted to (and ordered by) `labels`.
    pub fn reindex(&self, labels: &[CellId]) -> Result<Self> {
        let values = self.values_for(labels)?;
        Self::new(labels.to_vec(), values)
    }

    /// Pair up values of labels present in both series, in `self`'s order.
    ///
    /// Returns the shared labels and the two aligned value vectors.
    pub fn align(&self, other: &LabeledSeries) -> (Vec<CellId>, Vec<f64>, Vec<f64>) {
        let mut labels = Vec::new();
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (label, value) in self.iter() {
            if let Some(theirs) = other.get(label) {
                labels.push(label.clone());
                left.push(value);
                right.push(theirs);
            }
        }
        (labels, left, right)
    }

    /// Label of the largest value (first on ties). None when empty or all NaN.
    pub fn idxmax(&self) -> Option<&CellId> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.values.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| &self.labels[i])
    }
}

impl Serialize for LabeledSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (label, value) in self.iter() {
            map.serialize_entry(label, &value)?;
        }
        map.end()
    }
}

pub(crate) fn build_index(labels: &[CellId]) -> Result<HashMap<CellId, usize>> {
    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), i).is_some() {
            return Err(Error::DuplicateCell {
                label: label.to_string(),
            });
        }
    }
    Ok(index)
}
