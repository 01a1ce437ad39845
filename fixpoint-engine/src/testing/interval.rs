//! A toy interval domain over `i64`, using `i64::MIN`/`i64::MAX` as the unbounded sentinels.
//! Exists purely so this workspace's own tests can run the iterator against something with real
//! widening/narrowing behavior, not to be a usable numerical domain in its own right.

use fixpoint_core::AbstractValue;

/// `[lo, hi]`, or bottom when `range` is `None`. `propagated`/`caught` track whether an
/// exceptional flow is live in each of the two buckets the call engine juggles around a callee
/// dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    range: Option<(i64, i64)>,
    propagated: bool,
    caught: bool,
}

impl Interval {
    pub fn point(v: i64) -> Self {
        Self { range: Some((v, v)), propagated: false, caught: false }
    }

    pub fn range(lo: i64, hi: i64) -> Self {
        assert!(lo <= hi);
        Self { range: Some((lo, hi)), propagated: false, caught: false }
    }

    pub fn top() -> Self {
        Self::range(i64::MIN, i64::MAX)
    }

    pub fn bounds(&self) -> Option<(i64, i64)> {
        self.range
    }

    fn saturating_union(a: (i64, i64), b: (i64, i64)) -> (i64, i64) {
        (a.0.min(b.0), a.1.max(b.1))
    }
}

/// `(lo, hi)` to jump straight to instead of widening one step at a time.
pub type IntervalThreshold = (i64, i64);

impl AbstractValue for Interval {
    type Threshold = IntervalThreshold;

    fn bottom() -> Self {
        Self { range: None, propagated: false, caught: false }
    }

    fn is_bottom(&self) -> bool {
        self.range.is_none() && !self.propagated && !self.caught
    }

    fn leq(&self, other: &Self) -> bool {
        let range_leq = match (self.range, other.range) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some((l1, h1)), Some((l2, h2))) => l2 <= l1 && h1 <= h2,
        };
        range_leq && (!self.propagated || other.propagated) && (!self.caught || other.caught)
    }

    fn join(&self, other: &Self) -> Self {
        let range = match (self.range, other.range) {
            (None, r) => r,
            (r, None) => r,
            (Some(a), Some(b)) => Some(Self::saturating_union(a, b)),
        };
        Self { range, propagated: self.propagated || other.propagated, caught: self.caught || other.caught }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self.range, other.range) {
            (Some((l1, h1)), Some((l2, h2))) => {
                let lo = l1.max(l2);
                let hi = h1.min(h2);
                let range = if lo <= hi { Some((lo, hi)) } else { None };
                Self { range, propagated: self.propagated && other.propagated, caught: self.caught && other.caught }
            }
            _ => Self::bottom(),
        }
    }

    fn widening(&self, other: &Self) -> Self {
        let range = match (self.range, other.range) {
            (None, r) => r,
            (r, None) => r,
            (Some((l1, h1)), Some((l2, h2))) => {
                let lo = if l2 < l1 { i64::MIN } else { l1 };
                let hi = if h2 > h1 { i64::MAX } else { h1 };
                Some((lo, hi))
            }
        };
        Self { range, propagated: self.propagated || other.propagated, caught: self.caught || other.caught }
    }

    fn widening_threshold(&self, other: &Self, threshold: &Self::Threshold) -> Self {
        let range = match (self.range, other.range) {
            (None, r) => r,
            (r, None) => r,
            (Some((l1, h1)), Some((l2, h2))) => {
                let lo = if l2 < l1 { threshold.0.min(l2) } else { l1 };
                let hi = if h2 > h1 { threshold.1.max(h2) } else { h1 };
                Some((lo, hi))
            }
        };
        Self { range, propagated: self.propagated || other.propagated, caught: self.caught || other.caught }
    }

    fn narrowing(&self, other: &Self) -> Self {
        let range = match (self.range, other.range) {
            (Some((l1, h1)), Some((l2, h2))) => {
                let lo = if l1 == i64::MIN { l2 } else { l1 };
                let hi = if h1 == i64::MAX { h2 } else { h1 };
                Some((lo, hi))
            }
            (r, _) => r,
        };
        Self { range, propagated: self.propagated, caught: self.caught }
    }

    fn narrowing_threshold(&self, other: &Self, threshold: &Self::Threshold) -> Self {
        let range = match (self.range, other.range) {
            (Some((l1, h1)), Some((l2, h2))) => {
                let lo = if l1 == i64::MIN { threshold.0.max(l2) } else { l1 };
                let hi = if h1 == i64::MAX { threshold.1.min(h2) } else { h1 };
                Some((lo, hi))
            }
            (r, _) => r,
        };
        Self { range, propagated: self.propagated, caught: self.caught }
    }

    fn set_normal_flow_to_bottom(&mut self) {
        self.range = None;
    }

    fn is_normal_flow_bottom(&self) -> bool {
        self.range.is_none()
    }

    fn ignore_exceptions(&self) -> Self {
        Self { range: self.range, propagated: false, caught: false }
    }

    fn merge_caught_in_propagated_exceptions(&mut self) {
        self.propagated |= self.caught;
        self.caught = false;
    }

    fn merge_propagated_in_caught_exceptions(&mut self) {
        self.caught |= self.propagated;
        self.propagated = false;
    }
}
