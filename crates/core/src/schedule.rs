//! Window overlap and capacity math for the conflict checker.
//!
//! All windows are half-open intervals `[start, end)`: a booking ending
//! at 14:00 does not collide with one starting at 14:00.

use crate::types::Timestamp;

/// A reserved `[start, end)` window.
pub type Window = (Timestamp, Timestamp);

/// Whether `[a_start, a_end)` and `[b_start, b_end)` share any instant.
pub fn overlaps(a_start: Timestamp, a_end: Timestamp, b_start: Timestamp, b_end: Timestamp) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether `[start, end)` lies entirely within `[outer_start, outer_end)`.
pub fn contained_in(
    start: Timestamp,
    end: Timestamp,
    outer_start: Timestamp,
    outer_end: Timestamp,
) -> bool {
    outer_start <= start && end <= outer_end
}

/// Peak number of `windows` simultaneously active at any instant inside
/// `[start, end)`.
///
/// Capacity must hold for every sub-interval, not just in aggregate, so a
/// plain count of overlapping rows over-rejects: two existing bookings
/// that touch the new window but not each other occupy one capacity unit
/// at a time, not two. Concurrency only changes where a window begins, so
/// sampling each window start (clamped into the probe range) plus the
/// probe start itself finds the maximum.
pub fn peak_concurrency(windows: &[Window], start: Timestamp, end: Timestamp) -> usize {
    let mut probes: Vec<Timestamp> = windows
        .iter()
        .filter(|(ws, we)| overlaps(*ws, *we, start, end))
        .map(|(ws, _)| (*ws).max(start))
        .collect();
    probes.push(start);

    probes
        .into_iter()
        .map(|t| {
            windows
                .iter()
                .filter(|(ws, we)| *ws <= t && t < *we)
                .count()
        })
        .max()
        .unwrap_or(0)
}
