//! Classification quality metrics.
//!
//! Retraining reports support-weighted precision/recall/F1 measured on the
//! full training corpus — a fit statistic, not a generalization estimate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Weighted average over labels present in `truth` (weight = label support).
/// Per-label terms with a zero denominator contribute zero instead of NaN.
pub fn evaluate(truth: &[u32], predicted: &[u32]) -> Metrics {
    debug_assert_eq!(truth.len(), predicted.len());
    if truth.is_empty() {
        return Metrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        };
    }

    // label → (true positives, predicted count, support)
    let mut tally: BTreeMap<u32, (f64, f64, f64)> = BTreeMap::new();
    for (&t, &p) in truth.iter().zip(predicted) {
        tally.entry(t).or_default().2 += 1.0;
        tally.entry(p).or_default().1 += 1.0;
        if t == p {
            tally.entry(t).or_default().0 += 1.0;
        }
    }

    let total = truth.len() as f64;
    let mut metrics = Metrics {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
    };
    for &(tp, pred, support) in tally.values() {
        if support == 0.0 {
            // label appears only in predictions; weightless
            continue;
        }
        let weight = support / total;
        let p = if pred > 0.0 { tp / pred } else { 0.0 };
        let r = tp / support;
        let f = if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        };
        metrics.precision += weight * p;
        metrics.recall += weight * r;
        metrics.f1 += weight * f;
    }
    metrics
}
