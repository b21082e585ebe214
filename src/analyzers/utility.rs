use crate::analyzers::types::Percentage;

/// Arithmetic mean of the present values. Returns `None` when there are none.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// Rounds to two decimals, ties to even (`0.125` becomes `0.12`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// `100 * part / total` rounded to two decimals, or [`Percentage::NoData`]
/// when `total` is zero.
pub fn calculate_percentage(part: f64, total: f64) -> Percentage {
    if total == 0.0 || !total.is_finite() || !part.is_finite() {
        return Percentage::NoData;
    }
    Percentage::Value(round2(100.0 * part / total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_with_zero_total() {
        assert_eq!(calculate_percentage(5.0, 0.0), Percentage::NoData);
        assert_eq!(calculate_percentage(0.0, 0.0), Percentage::NoData);
    }

    #[test]
    fn test_percentage_normal_values() {
        assert_eq!(calculate_percentage(50.0, 200.0), Percentage::Value(25.0));
        assert_eq!(calculate_percentage(1.0, 3.0), Percentage::Value(33.33));
    }

    #[test]
    fn test_percentage_ties_round_to_even() {
        assert_eq!(calculate_percentage(1.0, 800.0), Percentage::Value(0.12));
        assert_eq!(calculate_percentage(3.0, 800.0), Percentage::Value(0.38));
    }

    #[test]
    fn test_mean_skips_missing() {
        assert_eq!(mean(&[Some(2.0), None, Some(4.0)]), Some(3.0));
        assert_eq!(mean(&[None, None]), None);
        assert_eq!(mean(&[]), None);
    }
}
