//! Largest-remainder (Hamilton) seat apportionment.
//!
//! Turns arbitrary non-negative weights into exactly [`TOTAL_SEATS`] integer
//! seats. The result depends only on the weights and their order: remainder
//! ties are broken by input position, so identical input always yields
//! identical seats.
//!
//! # Zero weights
//!
//! When every weight is zero there is no proportion to honor, so every key is
//! treated as weight 1 and the seats are spread uniformly.

use std::fmt::Display;

use serde::Serialize;
use tracing::warn;

use crate::error::{ReportError, ReportResult};

/// Seats distributed by every allocation.
pub const TOTAL_SEATS: u32 = 100;

/// Seats per key, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAllocation<K> {
    seats: Vec<(K, u32)>,
    requested_floor: u32,
    applied_floor: u32,
}

impl<K> SeatAllocation<K> {
    /// `(key, seats)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u32)> + '_ {
        self.seats.iter().map(|(key, seats)| (key, *seats))
    }

    /// Seats for a key.
    pub fn get<Q>(&self, key: &Q) -> Option<u32>
    where
        K: PartialEq<Q>,
        Q: ?Sized,
    {
        self.seats.iter().find(|(k, _)| k == key).map(|(_, s)| *s)
    }

    /// Sum of all seats; [`TOTAL_SEATS`] unless there were no keys.
    pub fn total(&self) -> u32 {
        self.seats.iter().map(|(_, s)| s).sum()
    }

    /// Minimum seats per key that was asked for.
    pub fn requested_floor(&self) -> u32 {
        self.requested_floor
    }

    /// Minimum seats per key that was actually guaranteed.
    pub fn applied_floor(&self) -> u32 {
        self.applied_floor
    }

    /// True when the requested floor could not be met for every key.
    pub fn floor_relaxed(&self) -> bool {
        self.applied_floor < self.requested_floor
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

/// Apportion [`TOTAL_SEATS`] seats with no per-key minimum.
pub fn apportion<K>(weights: &[(K, f64)]) -> ReportResult<SeatAllocation<K>>
where
    K: Clone + Display,
{
    apportion_with_floor(weights, 0)
}

/// Apportion [`TOTAL_SEATS`] seats guaranteeing every key at least `floor`.
///
/// `floor * keys` seats are reserved up front and only the rest is split by
/// weight. If the reservation does not fit in [`TOTAL_SEATS`] the floor is
/// lowered uniformly to `TOTAL_SEATS / keys` and the allocation reports
/// [`SeatAllocation::floor_relaxed`].
///
/// With no keys the allocation is empty.
pub fn apportion_with_floor<K>(weights: &[(K, f64)], floor: u32) -> ReportResult<SeatAllocation<K>>
where
    K: Clone + Display,
{
    for (key, weight) in weights {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(ReportError::InvalidWeight {
                key: key.to_string(),
                weight: *weight,
            });
        }
    }

    if weights.is_empty() {
        return Ok(SeatAllocation {
            seats: Vec::new(),
            requested_floor: floor,
            applied_floor: 0,
        });
    }

    let keys = u32::try_from(weights.len()).unwrap_or(u32::MAX);
    let applied_floor = if floor.saturating_mul(keys) <= TOTAL_SEATS {
        floor
    } else {
        let relaxed = TOTAL_SEATS / keys;
        warn!(
            requested = floor,
            applied = relaxed,
            keys,
            "Seat floor not feasible for key count; relaxing"
        );
        relaxed
    };
    let pool = TOTAL_SEATS - applied_floor * keys.min(TOTAL_SEATS);

    let raw: Vec<f64> = weights.iter().map(|(_, w)| *w).collect();
    let extra = largest_remainder(&raw, pool);

    Ok(SeatAllocation {
        seats: weights
            .iter()
            .zip(extra)
            .map(|((key, _), extra)| (key.clone(), applied_floor + extra))
            .collect(),
        requested_floor: floor,
        applied_floor,
    })
}

/// Hamilton method over plain weights; the output sums to `seats`.
///
/// Weights are scaled by the largest one before summing, so every share stays
/// within `0..=seats` even when the raw sum would overflow to infinity.
fn largest_remainder(weights: &[f64], seats: u32) -> Vec<u32> {
    let largest = weights.iter().copied().fold(0.0_f64, f64::max);
    let scaled: Vec<f64> = if largest > 0.0 {
        weights.iter().map(|&w| w / largest).collect()
    } else {
        vec![1.0; weights.len()]
    };
    let total: f64 = scaled.iter().sum();

    let shares: Vec<f64> = scaled
        .iter()
        .map(|&w| (w / total * f64::from(seats)).min(f64::from(seats)))
        .collect();

    let mut out: Vec<u32> = shares.iter().map(|s| s.floor() as u32).collect();
    let assigned: u32 = out.iter().sum();
    let remaining = seats.saturating_sub(assigned) as usize;

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    for &idx in order.iter().cycle().take(remaining) {
        out[idx] += 1;
    }
    out
}
