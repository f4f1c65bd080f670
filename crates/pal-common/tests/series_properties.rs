//! Property-based tests for label alignment and scaling.

use proptest::prelude::*;
use pal_common::{CellId, Embedding, LabeledSeries};

fn labels(n: usize, prefix: &str) -> Vec<CellId> {
    (0..n).map(|i| CellId::new(format!("{prefix}{i}"))).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Reindexing by a permutation and back restores the series.
    #[test]
    fn reindex_round_trips(
        values in prop::collection::vec(-1e3..1e3f64, 1..40),
        seed in any::<u64>(),
    ) {
        let n = values.len();
        let series = LabeledSeries::new(labels(n, "c"), values).unwrap();
        let mut order = series.labels().to_vec();
        // Deterministic shuffle: rotate by a seed-derived offset and reverse.
        order.rotate_left((seed % n as u64) as usize);
        order.reverse();

        let shuffled = series.reindex(&order).unwrap();
        for label in &order {
            prop_assert_eq!(shuffled.get(label), series.get(label));
        }
        prop_assert_eq!(shuffled.reindex(series.labels()).unwrap(), series);
    }

    /// Alignment keeps exactly the shared labels, in the left series' order.
    #[test]
    fn align_keeps_shared_labels(
        left in prop::collection::vec(0.0..1.0f64, 1..30),
        right in prop::collection::vec(0.0..1.0f64, 1..30),
    ) {
        let a = LabeledSeries::new(labels(left.len(), "c"), left.clone()).unwrap();
        let b_labels: Vec<CellId> = labels(right.len(), "c").into_iter().rev().collect();
        let b = LabeledSeries::new(b_labels, right.clone()).unwrap();

        let (shared, va, vb) = a.align(&b);
        prop_assert_eq!(shared.len(), left.len().min(right.len()));
        prop_assert_eq!(va.len(), shared.len());
        for (k, label) in shared.iter().enumerate() {
            prop_assert_eq!(a.labels()[k].clone(), label.clone());
            prop_assert_eq!(Some(va[k]), a.get(label));
            prop_assert_eq!(Some(vb[k]), b.get(label));
        }
    }

    /// Min-max scaling maps every non-constant component onto [0, 1].
    #[test]
    fn min_max_scaling_is_bounded(
        rows in prop::collection::vec(prop::collection::vec(-50.0..50.0f64, 3), 2..30),
    ) {
        let n = rows.len();
        let embedding = Embedding::from_rows(labels(n, "c"), rows).unwrap();
        let scaled = embedding.min_max_scaled();
        prop_assert_eq!(scaled.cells(), embedding.cells());
        for v in scaled.data() {
            prop_assert!((-1e-12..=1.0 + 1e-12).contains(v), "scaled value {}", v);
        }
        for b in embedding.boundary_cells() {
            prop_assert!(b < n);
        }
    }
}
