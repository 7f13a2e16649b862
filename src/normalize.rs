//! Population-relative rescaling of one metric dimension.
//!
//! Values are z-scored with a doubled spread, `z = 2 * (v - mean) / sd`, and
//! the z-scores are then min-max rescaled onto `[0, 1]`. Degenerate input
//! (all values equal) maps to [`NEUTRAL`] for every student. The exact shape
//! matters: reproducing historical scores depends on it.

/// Value given to every student when a dimension carries no spread.
pub const NEUTRAL: f64 = 0.5;

/// Doubles the z-score spread before the final rescale.
const Z_STRETCH: f64 = 2.0;

pub fn normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    if values.iter().all(|value| *value == values[0]) {
        return vec![NEUTRAL; values.len()];
    }

    // The transform is affine, so dividing by the largest magnitude first
    // gives the same result for inputs whose squares overflow.
    let z = match z_scores(values) {
        Some(z) => z,
        None => {
            let scale = values.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
            let scaled: Vec<f64> = values.iter().map(|value| value / scale).collect();
            match z_scores(&scaled) {
                Some(z) => z,
                None => return vec![NEUTRAL; values.len()],
            }
        }
    };

    let min = z.iter().copied().fold(f64::INFINITY, f64::min);
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span == 0.0 || !span.is_finite() {
        return vec![NEUTRAL; values.len()];
    }

    z.into_iter().map(|value| (value - min) / span).collect()
}

/// `None` when the population deviation is zero or not representable.
fn z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / count;
    let sd = variance.sqrt();
    if sd == 0.0 || !sd.is_finite() {
        return None;
    }
    Some(
        values
            .iter()
            .map(|value| Z_STRETCH * (value - mean) / sd)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn constant_input_yields_neutral_vector() {
        assert_eq!(normalize(&[4.0, 4.0, 4.0]), vec![0.5, 0.5, 0.5]);
        assert_eq!(normalize(&[0.1, 0.1, 0.1]), vec![0.5, 0.5, 0.5]);
        assert_eq!(normalize(&[7.0]), vec![0.5]);
    }

    #[test]
    fn extremes_map_to_zero_and_one() {
        let out = normalize(&[3.0, 10.0, -2.0, 5.5]);
        assert_eq!(out.len(), 4);
        assert_eq!(out[1], 1.0);
        assert_eq!(out[2], 0.0);
        assert!(out.iter().all(|value| (0.0..=1.0).contains(value)));
    }

    #[test]
    fn interior_values_keep_linear_position() {
        // The z-score step is affine, so relative position survives.
        let out = normalize(&[0.0, 25.0, 100.0]);
        assert!(approx(out[0], 0.0));
        assert!(approx(out[1], 0.25));
        assert!(approx(out[2], 1.0));
    }

    #[test]
    fn two_distinct_values_split_to_bounds() {
        assert_eq!(normalize(&[60.0, 40.0]), vec![1.0, 0.0]);
    }

    #[test]
    fn huge_magnitudes_still_span_the_unit_range() {
        assert_eq!(normalize(&[1e200, -1e200, 0.0]), vec![1.0, 0.0, 0.5]);

        let out = normalize(&[f64::MAX, f64::MAX / 2.0, 0.0]);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[2], 0.0);
        assert!(approx(out[1], 0.5));
    }

    #[test]
    fn order_is_preserved() {
        let values = [9.0, 1.0, 5.0, 3.0];
        let out = normalize(&values);
        for i in 0..values.len() {
            for j in 0..values.len() {
                if values[i] < values[j] {
                    assert!(out[i] < out[j]);
                }
            }
        }
    }
}
