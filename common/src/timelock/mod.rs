//! Interval-value algebra backing time-locked balances.
//!
//! A time lock is a set of `(start, end, value)` items, kept in a
//! canonical form: sorted, non-overlapping, with contiguous items of
//! equal value merged. The canonical form is the piecewise-constant
//! projection "total value usable at instant t"; every operation is
//! defined through that projection. Both interval ends are inclusive.

use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Sentinel end time meaning "no upper bound".
pub const TIMELOCK_FOREVER: u64 = u64::MAX;

/// Sentinel start time meaning "valid from now".
pub const TIMELOCK_NOW: u64 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeLockError {
    #[error("time lock start time {start} is after end time {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("time lock item value is zero")]
    ZeroValue,
}

/// `value` units usable in the inclusive epoch `[start_time, end_time]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockItem {
    pub start_time: u64,
    pub end_time: u64,
    pub value: U256,
}

impl TimeLockItem {
    pub fn new(start_time: u64, end_time: u64, value: U256) -> Self {
        Self {
            start_time,
            end_time,
            value,
        }
    }

    pub fn validate(&self) -> Result<(), TimeLockError> {
        if self.start_time > self.end_time {
            return Err(TimeLockError::InvalidRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.value.is_zero() {
            return Err(TimeLockError::ZeroValue);
        }
        Ok(())
    }
}

impl Encodable for TimeLockItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.start_time);
        s.append(&self.end_time);
        s.append(&self.value);
    }
}

impl Decodable for TimeLockItem {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            start_time: rlp.val_at(0)?,
            end_time: rlp.val_at(1)?,
            value: rlp.val_at(2)?,
        })
    }
}

/// Canonical ordered set of time lock items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLock {
    items: Vec<TimeLockItem>,
}

impl TimeLock {
    /// Single-item lock; the item must be well formed.
    pub fn new(item: TimeLockItem) -> Result<Self, TimeLockError> {
        item.validate()?;
        Ok(Self { items: vec![item] })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from arbitrary items; malformed items are discarded and
    /// the rest canonicalized.
    pub fn from_items(items: Vec<TimeLockItem>) -> Self {
        Self {
            items: normalize(&items),
        }
    }

    pub fn items(&self) -> &[TimeLockItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_valid(&self) -> Result<(), TimeLockError> {
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }

    /// Pointwise sum of the two projections; associative and
    /// commutative.
    pub fn add(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut all = self.items.clone();
        all.extend_from_slice(&other.items);
        Self {
            items: normalize(&all),
        }
    }

    /// Pointwise difference. Returns `None` when `other` exceeds the
    /// receiver at any instant; callers must treat that as an
    /// insufficient-balance condition.
    pub fn sub(&self, other: &Self) -> Option<Self> {
        if other.is_empty() {
            return Some(self.clone());
        }
        let mut points: BTreeSet<u128> = BTreeSet::new();
        for item in self.items.iter().chain(other.items.iter()) {
            points.insert(item.start_time as u128);
            points.insert(item.end_time as u128 + 1);
        }
        let points: Vec<u128> = points.into_iter().collect();
        let mut out: Vec<TimeLockItem> = Vec::new();
        for window in points.windows(2) {
            let (p, q) = (window[0], window[1]);
            let have = segment_value(&self.items, p, q);
            let need = segment_value(&other.items, p, q);
            let value = have.checked_sub(need)?;
            if value.is_zero() {
                continue;
            }
            push_merged(&mut out, p, q, value);
        }
        Some(Self { items: out })
    }

    /// Whether the receiver is at least `other` at every instant.
    pub fn covers(&self, other: &Self) -> bool {
        self.sub(other).is_some()
    }

    /// Largest `v` such that `(start, end, v)` is covered by the
    /// receiver; zero when any instant of `[start, end]` is uncovered.
    pub fn get_spendable_value(&self, start: u64, end: u64) -> U256 {
        if start > end {
            return U256::zero();
        }
        let mut min_value: Option<U256> = None;
        let mut cursor = start;
        for item in &self.items {
            if item.end_time < cursor {
                continue;
            }
            if item.start_time > cursor {
                return U256::zero();
            }
            min_value = Some(match min_value {
                Some(v) => v.min(item.value),
                None => item.value,
            });
            if item.end_time >= end {
                return min_value.unwrap_or_default();
            }
            cursor = item.end_time + 1;
        }
        U256::zero()
    }

    /// Drop items that expired before `timestamp`.
    pub fn clear_expired(mut self, timestamp: u64) -> Self {
        self.items.retain(|item| item.end_time >= timestamp);
        self
    }
}

impl Encodable for TimeLock {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(1);
        s.append_list(&self.items);
    }
}

impl Decodable for TimeLock {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let items: Vec<TimeLockItem> = rlp.list_at(0)?;
        Ok(Self {
            items: normalize(&items),
        })
    }
}

/// Single-interval lock used for transfer requirements.
pub fn new_time_lock(value: U256, start: u64, end: u64) -> Result<TimeLock, TimeLockError> {
    TimeLock::new(TimeLockItem::new(start, end, value))
}

/// The lock equivalent of a plain balance: covers every instant from
/// `now` on.
pub fn whole_lifetime(value: U256, now: u64) -> TimeLock {
    TimeLock::from_items(vec![TimeLockItem::new(now, TIMELOCK_FOREVER, value)])
}

/// Leftover of converting `value` plain balance into the requirement
/// `[max(start, now), end]`: the complement within `(now, forever)`.
pub fn surplus_time_lock(value: U256, start: u64, end: u64, now: u64) -> TimeLock {
    let need = TimeLock::from_items(vec![TimeLockItem::new(start.max(now), end, value)]);
    whole_lifetime(value, now).sub(&need).unwrap_or_default()
}

/// An interval that behaves like a plain balance from the point of
/// view of `now`.
pub fn is_whole_lifetime(start: u64, end: u64, now: u64) -> bool {
    start <= now && end == TIMELOCK_FOREVER
}

// value of the projection over the constant segment [p, q)
fn segment_value(items: &[TimeLockItem], p: u128, q: u128) -> U256 {
    let mut value = U256::zero();
    for item in items {
        if (item.start_time as u128) <= p && (item.end_time as u128) >= q - 1 {
            value = value.saturating_add(item.value);
        }
    }
    value
}

fn push_merged(out: &mut Vec<TimeLockItem>, p: u128, q: u128, value: U256) {
    if let Some(last) = out.last_mut() {
        if last.value == value && (last.end_time as u128) + 1 == p {
            last.end_time = (q - 1) as u64;
            return;
        }
    }
    out.push(TimeLockItem::new(p as u64, (q - 1) as u64, value));
}

fn normalize(items: &[TimeLockItem]) -> Vec<TimeLockItem> {
    let valid: Vec<TimeLockItem> = items
        .iter()
        .filter(|item| item.validate().is_ok())
        .cloned()
        .collect();
    if valid.is_empty() {
        return Vec::new();
    }
    let mut points: BTreeSet<u128> = BTreeSet::new();
    for item in &valid {
        points.insert(item.start_time as u128);
        points.insert(item.end_time as u128 + 1);
    }
    let points: Vec<u128> = points.into_iter().collect();
    let mut out: Vec<TimeLockItem> = Vec::new();
    for window in points.windows(2) {
        let (p, q) = (window[0], window[1]);
        let value = segment_value(&valid, p, q);
        if value.is_zero() {
            continue;
        }
        push_merged(&mut out, p, q, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(items: &[(u64, u64, u64)]) -> TimeLock {
        TimeLock::from_items(
            items
                .iter()
                .map(|(s, e, v)| TimeLockItem::new(*s, *e, U256::from(*v)))
                .collect(),
        )
    }

    #[test]
    fn test_item_validation() {
        assert!(TimeLockItem::new(10, 5, U256::one()).validate().is_err());
        assert!(TimeLockItem::new(5, 10, U256::zero()).validate().is_err());
        assert!(TimeLockItem::new(5, 5, U256::one()).validate().is_ok());
    }

    #[test]
    fn test_normalize_merges_equal_adjacent() {
        let merged = lock(&[(0, 99, 5), (100, 200, 5)]);
        assert_eq!(merged.items().len(), 1);
        assert_eq!(merged.items()[0], TimeLockItem::new(0, 200, U256::from(5)));
    }

    #[test]
    fn test_normalize_splits_overlap() {
        // overlapping items stack their values on the overlap
        let stacked = lock(&[(0, 100, 5), (50, 150, 3)]);
        assert_eq!(
            stacked.items(),
            &[
                TimeLockItem::new(0, 49, U256::from(5)),
                TimeLockItem::new(50, 100, U256::from(8)),
                TimeLockItem::new(101, 150, U256::from(3)),
            ]
        );
    }

    #[test]
    fn test_add_is_commutative() {
        let a = lock(&[(0, 100, 5), (200, 300, 7)]);
        let b = lock(&[(50, 250, 2)]);
        assert_eq!(a.add(&b), b.add(&a));
    }

    #[test]
    fn test_sub_inverts_add() {
        let a = lock(&[(0, 100, 5), (200, TIMELOCK_FOREVER, 7)]);
        let b = lock(&[(10, 60, 3), (250, 400, 7)]);
        let sum = a.add(&b);
        assert_eq!(sum.sub(&b), Some(a.clone()));
        assert_eq!(sum.sub(&a), Some(b));
    }

    #[test]
    fn test_sub_undefined_when_not_covered() {
        let a = lock(&[(0, 100, 5)]);
        let b = lock(&[(50, 150, 5)]);
        assert_eq!(a.sub(&b), None);
        assert!(!a.covers(&b));

        let c = lock(&[(0, 100, 6)]);
        assert_eq!(a.sub(&c), None);
    }

    #[test]
    fn test_covers_pointwise() {
        let a = lock(&[(0, 100, 5), (101, 200, 3)]);
        assert!(a.covers(&lock(&[(0, 150, 3)])));
        assert!(a.covers(&lock(&[(20, 80, 5)])));
        assert!(!a.covers(&lock(&[(20, 120, 5)])));
        assert!(a.covers(&TimeLock::empty()));
        assert!(!TimeLock::empty().covers(&a));
    }

    #[test]
    fn test_spendable_value() {
        let a = lock(&[(0, 100, 5), (101, 200, 3)]);
        assert_eq!(a.get_spendable_value(0, 100), U256::from(5));
        assert_eq!(a.get_spendable_value(0, 200), U256::from(3));
        // gap after 200
        assert_eq!(a.get_spendable_value(0, 201), U256::zero());
        // uncovered start
        let b = lock(&[(50, 100, 5)]);
        assert_eq!(b.get_spendable_value(0, 100), U256::zero());
        // spendable matches the largest covered requirement
        let v = a.get_spendable_value(50, 150);
        assert!(a.covers(&lock(&[(50, 150, v.as_u64())])));
        assert!(!a.covers(&lock(&[(50, 150, v.as_u64() + 1)])));
    }

    #[test]
    fn test_clear_expired() {
        let a = lock(&[(0, 100, 5), (200, 300, 7)]);
        let cleared = a.clear_expired(150);
        assert_eq!(cleared, lock(&[(200, 300, 7)]));
        let all_gone = cleared.clear_expired(301);
        assert!(all_gone.is_empty());
    }

    #[test]
    fn test_surplus_around_requirement() {
        // converting 40 units at ts=500 for the epoch [1000, 2000]
        // leaves the complement on both sides
        let surplus = surplus_time_lock(U256::from(40), 1000, 2000, 500);
        assert_eq!(surplus, lock(&[(500, 999, 40), (2001, TIMELOCK_FOREVER, 40)]));

        // a requirement that already starts now only leaves the tail
        let tail = surplus_time_lock(U256::from(40), 200, 2000, 500);
        assert_eq!(tail, lock(&[(2001, TIMELOCK_FOREVER, 40)]));

        // whole-lifetime requirement leaves nothing
        let nothing = surplus_time_lock(U256::from(40), 0, TIMELOCK_FOREVER, 500);
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_whole_lifetime_equivalence() {
        let balance = whole_lifetime(U256::from(100), 500);
        // covers any single requirement of value <= 100 starting at or
        // after `now`
        assert!(balance.covers(&lock(&[(700, 9_000, 100)])));
        assert!(!balance.covers(&lock(&[(400, 9_000, 1)])));
        assert!(is_whole_lifetime(TIMELOCK_NOW, TIMELOCK_FOREVER, 500));
        assert!(is_whole_lifetime(500, TIMELOCK_FOREVER, 500));
        assert!(!is_whole_lifetime(501, TIMELOCK_FOREVER, 500));
    }

    #[test]
    fn test_rlp_roundtrip() {
        let a = lock(&[(0, 100, 5), (200, TIMELOCK_FOREVER, 7)]);
        let encoded = rlp::encode(&a);
        let decoded: TimeLock = rlp::decode(&encoded).expect("decodes");
        assert_eq!(a, decoded);

        let empty = TimeLock::empty();
        let decoded: TimeLock = rlp::decode(&rlp::encode(&empty)).expect("decodes");
        assert!(decoded.is_empty());
    }
}
