/// Percentage of `part` over `total`. Returns 0.0 for an empty denominator.
pub fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Rounds to two decimal places, the precision of every reported rate.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
