pub mod html;
pub mod terminal;

use crate::compare::DiffRecord;

/// Order records by descending score. Equal scores fall back to the left
/// path, then the right path, so output is stable across runs.
pub fn rank(records: &mut [DiffRecord]) {
    records.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.left.cmp(&b.left))
            .then_with(|| a.right.cmp(&b.right))
    });
}

/// Score for display; dimension changes show both sizes instead of `inf`.
pub fn describe_score(record: &DiffRecord) -> String {
    match record.dimension_mismatch {
        Some((lw, lh, rw, rh)) => format!("dimensions changed: {lw}x{lh} -> {rw}x{rh}"),
        None => format!("{:.6}", record.score),
    }
}
