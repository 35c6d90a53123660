//! Incremental regression split statistics.
//!
//! A criterion tracks a dynamic subset of instance ids over a shared table
//! of `(value, weight)` responses. Adding and removing ids updates the
//! statistics in place, which lets the tree learner sweep a sorted feature
//! column by moving one id at a time from the right side to the left.

use crate::core::types::CriterionType;

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Target value and weight of one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Response {
    pub value: f64,
    pub weight: f64,
}

impl Response {
    pub fn new(value: f64, weight: f64) -> Self {
        Response { value, weight }
    }
}

/// Split statistic over a dynamic subset of response ids.
///
/// `add` and `remove` are inverses: removing an id right after adding it
/// restores the previous count, min and max exactly. Sums are compensated,
/// so a large response added and removed again does not absorb the smaller
/// ones already tracked. Sum updates are O(1); the min/max multiset makes
/// `add` and `remove` O(log n) in the number of distinct values.
pub trait RegressionCriterion: Clone + Send + Sync + Debug {
    /// Creates an empty criterion over `responses`.
    fn new(responses: Arc<[Response]>) -> Self;

    /// Fresh empty criterion over the same response table.
    fn create(&self) -> Self;

    /// Add response `id` to the tracked subset.
    fn add(&mut self, id: usize);

    /// Remove response `id` from the tracked subset.
    fn remove(&mut self, id: usize);

    /// Weighted mean of the tracked responses, 0 when the total weight is 0.
    fn value(&self) -> f64;

    /// Total weight of the tracked responses.
    fn total_weight(&self) -> f64;

    /// Number of tracked responses.
    fn count(&self) -> usize;

    /// Score of splitting a node into `left` and `right`. Symmetric in its
    /// arguments and 0 when either side is empty.
    fn splitting_gain(left: &Self, right: &Self) -> f64;

    fn criterion_type(&self) -> CriterionType;
}

/// Flips every non-sign bit of a negative value; its own inverse.
#[inline]
fn flip_negative(bits: i64) -> i64 {
    if bits < 0 {
        bits ^ i64::MAX
    } else {
        bits
    }
}

/// Maps an `f64` to an `i64` with the same total order.
#[inline]
fn order_key(value: f64) -> i64 {
    flip_negative(value.to_bits() as i64)
}

#[inline]
fn from_order_key(key: i64) -> f64 {
    f64::from_bits(flip_negative(key) as u64)
}

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    #[inline]
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    #[inline]
    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Multiset of response values supporting O(log n) min and max under removal.
#[derive(Debug, Clone, Default)]
struct ValueMultiset {
    counts: BTreeMap<i64, usize>,
}

impl ValueMultiset {
    fn insert(&mut self, value: f64) {
        *self.counts.entry(order_key(value)).or_insert(0) += 1;
    }

    fn remove(&mut self, value: f64) {
        let key = order_key(value);
        if let Some(count) = self.counts.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&key);
            }
        }
    }

    fn min(&self) -> Option<f64> {
        self.counts.keys().next().map(|&k| from_order_key(k))
    }

    fn max(&self) -> Option<f64> {
        self.counts.keys().next_back().map(|&k| from_order_key(k))
    }
}

/// Range-normalized separation of the two side means, weighted by how
/// evenly the total weight is split:
///
/// ```text
/// |mean(l) - mean(r)| / (max - min) * (w_l / W) * (w_r / W)
/// ```
///
/// where `min` and `max` range over both sides.
#[derive(Debug, Clone)]
pub struct MeanDivergence {
    responses: Arc<[Response]>,
    sum_value: CompensatedSum,
    sum_weight: CompensatedSum,
    count: usize,
    values: ValueMultiset,
}

impl MeanDivergence {
    /// Smallest tracked response value.
    pub fn min(&self) -> Option<f64> {
        self.values.min()
    }

    /// Largest tracked response value.
    pub fn max(&self) -> Option<f64> {
        self.values.max()
    }

    /// Weighted sum of the tracked response values.
    pub fn sum_value(&self) -> f64 {
        self.sum_value.value()
    }
}

impl RegressionCriterion for MeanDivergence {
    fn new(responses: Arc<[Response]>) -> Self {
        MeanDivergence {
            responses,
            sum_value: CompensatedSum::default(),
            sum_weight: CompensatedSum::default(),
            count: 0,
            values: ValueMultiset::default(),
        }
    }

    fn create(&self) -> Self {
        Self::new(Arc::clone(&self.responses))
    }

    fn add(&mut self, id: usize) {
        let r = self.responses[id];
        self.sum_value.add(r.value * r.weight);
        self.sum_weight.add(r.weight);
        self.count += 1;
        self.values.insert(r.value);
    }

    fn remove(&mut self, id: usize) {
        let r = self.responses[id];
        self.sum_value.add(-(r.value * r.weight));
        self.sum_weight.add(-r.weight);
        self.count -= 1;
        self.values.remove(r.value);
    }

    fn value(&self) -> f64 {
        let weight = self.sum_weight.value();
        if self.count == 0 || weight == 0.0 {
            0.0
        } else {
            self.sum_value.value() / weight
        }
    }

    fn total_weight(&self) -> f64 {
        self.sum_weight.value()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn splitting_gain(left: &Self, right: &Self) -> f64 {
        let (wl, wr) = (left.total_weight(), right.total_weight());
        if left.count == 0 || right.count == 0 || wl == 0.0 || wr == 0.0 {
            return 0.0;
        }
        let (min, max) = match (left.min(), left.max(), right.min(), right.max()) {
            (Some(lmin), Some(lmax), Some(rmin), Some(rmax)) => (lmin.min(rmin), lmax.max(rmax)),
            _ => return 0.0,
        };
        let range = max - min;
        if !(range > 0.0) {
            return 0.0;
        }
        let total = wl + wr;
        let balance = (wl * wr) / (total * total);
        (left.value() - right.value()).abs() / range * balance
    }

    fn criterion_type(&self) -> CriterionType {
        CriterionType::MeanDivergence
    }
}

/// Weighted squared-error reduction, `w_l * w_r / W * (mean(l) - mean(r))^2`.
#[derive(Debug, Clone)]
pub struct VarianceReduction {
    responses: Arc<[Response]>,
    sum_value: CompensatedSum,
    sum_weight: CompensatedSum,
    count: usize,
}

impl RegressionCriterion for VarianceReduction {
    fn new(responses: Arc<[Response]>) -> Self {
        VarianceReduction {
            responses,
            sum_value: CompensatedSum::default(),
            sum_weight: CompensatedSum::default(),
            count: 0,
        }
    }

    fn create(&self) -> Self {
        Self::new(Arc::clone(&self.responses))
    }

    fn add(&mut self, id: usize) {
        let r = self.responses[id];
        self.sum_value.add(r.value * r.weight);
        self.sum_weight.add(r.weight);
        self.count += 1;
    }

    fn remove(&mut self, id: usize) {
        let r = self.responses[id];
        self.sum_value.add(-(r.value * r.weight));
        self.sum_weight.add(-r.weight);
        self.count -= 1;
    }

    fn value(&self) -> f64 {
        let weight = self.sum_weight.value();
        if self.count == 0 || weight == 0.0 {
            0.0
        } else {
            self.sum_value.value() / weight
        }
    }

    fn total_weight(&self) -> f64 {
        self.sum_weight.value()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn splitting_gain(left: &Self, right: &Self) -> f64 {
        let (wl, wr) = (left.total_weight(), right.total_weight());
        if left.count == 0 || right.count == 0 || wl == 0.0 || wr == 0.0 {
            return 0.0;
        }
        let diff = left.value() - right.value();
        wl * wr / (wl + wr) * diff * diff
    }

    fn criterion_type(&self) -> CriterionType {
        CriterionType::VarianceReduction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn table(values: &[f64]) -> Arc<[Response]> {
        values.iter().map(|&v| Response::new(v, 1.0)).collect()
    }

    #[test]
    fn test_order_key_preserves_order() {
        let values = [-3.5, -1.0, -0.0, 0.0, 1e-300, 2.0, f64::INFINITY];
        for pair in values.windows(2) {
            assert!(order_key(pair[0]) <= order_key(pair[1]));
        }
        for &v in &values {
            assert_eq!(from_order_key(order_key(v)).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_mean_divergence_value_and_range() {
        let mut c = MeanDivergence::new(table(&[1.0, 3.0, -2.0]));
        assert_eq!(c.value(), 0.0);
        assert_eq!(c.min(), None);

        c.add(0);
        c.add(1);
        c.add(2);
        assert_relative_eq!(c.value(), 2.0 / 3.0);
        assert_eq!(c.min(), Some(-2.0));
        assert_eq!(c.max(), Some(3.0));

        c.remove(2);
        assert_eq!(c.min(), Some(1.0));
        assert_eq!(c.count(), 2);
    }

    #[test]
    fn test_large_response_does_not_absorb_sums() {
        let responses: Arc<[Response]> = vec![Response::new(0.1, 1.0), Response::new(1e17, 1.0)].into();
        let mut c = MeanDivergence::new(Arc::clone(&responses));
        c.add(0);
        c.add(1);
        c.remove(1);
        assert_eq!(c.sum_value(), 0.1);
        assert_eq!(c.value(), 0.1);
        assert_eq!(c.total_weight(), 1.0);
        assert_eq!((c.min(), c.max()), (Some(0.1), Some(0.1)));

        let mut v = VarianceReduction::new(responses);
        v.add(0);
        v.add(1);
        v.remove(1);
        assert_eq!(v.value(), 0.1);
    }

    #[test]
    fn test_min_max_with_duplicates() {
        let mut c = MeanDivergence::new(table(&[5.0, 5.0, 1.0]));
        c.add(0);
        c.add(1);
        c.add(2);
        c.remove(0);
        assert_eq!(c.max(), Some(5.0));
        c.remove(1);
        assert_eq!(c.max(), Some(1.0));
    }

    #[test]
    fn test_mean_divergence_gain() {
        let responses = table(&[0.0, 0.0, 4.0, 4.0]);
        let mut left = MeanDivergence::new(responses);
        let mut right = left.create();
        left.add(0);
        left.add(1);
        right.add(2);
        right.add(3);
        // |0 - 4| / 4 * 0.5 * 0.5
        assert_relative_eq!(MeanDivergence::splitting_gain(&left, &right), 0.25);
    }

    #[test]
    fn test_gain_zero_cases() {
        let responses = table(&[2.0, 2.0, 2.0]);
        let mut left = MeanDivergence::new(Arc::clone(&responses));
        let mut right = left.create();
        assert_eq!(MeanDivergence::splitting_gain(&left, &right), 0.0);

        left.add(0);
        assert_eq!(MeanDivergence::splitting_gain(&left, &right), 0.0);

        right.add(1);
        right.add(2);
        assert_eq!(MeanDivergence::splitting_gain(&left, &right), 0.0);

        let mut vl = VarianceReduction::new(responses);
        let mut vr = vl.create();
        vl.add(0);
        assert_eq!(VarianceReduction::splitting_gain(&vl, &vr), 0.0);
        vr.add(1);
        assert_eq!(VarianceReduction::splitting_gain(&vl, &vr), 0.0);
    }

    #[test]
    fn test_variance_reduction_gain() {
        let mut left = VarianceReduction::new(table(&[1.0, 3.0]));
        let mut right = left.create();
        left.add(0);
        right.add(1);
        // 1 * 1 / 2 * 4
        assert_relative_eq!(VarianceReduction::splitting_gain(&left, &right), 2.0);
        assert_eq!(left.criterion_type(), CriterionType::VarianceReduction);
    }

    fn responses_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((-100.0f64..100.0, 0.1f64..10.0), 2..40)
    }

    proptest! {
        #[test]
        fn prop_add_remove_restores_state(rs in responses_strategy(), split in 0usize..40) {
            let n = rs.len();
            let split = split % n;
            let responses: Arc<[Response]> =
                rs.iter().map(|&(v, w)| Response::new(v, w)).collect();
            let mut c = MeanDivergence::new(responses);
            for id in 0..split {
                c.add(id);
            }
            let (value, weight, count, min, max) =
                (c.value(), c.total_weight(), c.count(), c.min(), c.max());

            c.add(split);
            c.remove(split);

            prop_assert_eq!(c.count(), count);
            prop_assert_eq!(c.min(), min);
            prop_assert_eq!(c.max(), max);
            prop_assert!((c.total_weight() - weight).abs() <= 1e-12 * (1.0 + weight.abs()));
            prop_assert!((c.value() - value).abs() <= 1e-10 * (1.0 + value.abs()));
        }

        #[test]
        fn prop_gain_is_symmetric(rs in responses_strategy(), split in 1usize..40) {
            let n = rs.len();
            let split = 1 + split % (n - 1);
            let responses: Arc<[Response]> =
                rs.iter().map(|&(v, w)| Response::new(v, w)).collect();

            let mut left = MeanDivergence::new(Arc::clone(&responses));
            let mut right = left.create();
            let mut vl = VarianceReduction::new(responses);
            let mut vr = vl.create();
            for id in 0..n {
                if id < split {
                    left.add(id);
                    vl.add(id);
                } else {
                    right.add(id);
                    vr.add(id);
                }
            }

            let gain = MeanDivergence::splitting_gain(&left, &right);
            prop_assert_eq!(gain, MeanDivergence::splitting_gain(&right, &left));
            prop_assert!(gain >= 0.0 && gain <= 0.25 + 1e-12);
            prop_assert_eq!(
                VarianceReduction::splitting_gain(&vl, &vr),
                VarianceReduction::splitting_gain(&vr, &vl)
            );
        }
    }
}
