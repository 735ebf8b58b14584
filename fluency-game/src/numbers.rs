//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Clamp a f64 into `[0.0, 1.0]`, returning 0.0 for non-finite values.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Round a f64 and clamp it to the u32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Ratio of two counts, 0.0 when the denominator is zero.
#[must_use]
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    usize_to_f64(numerator) / usize_to_f64(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_unit_handles_non_finite_and_bounds() {
        assert!((clamp_unit(f64::NAN) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_unit(f64::INFINITY) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_unit(1.7) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_unit(-0.2) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_unit(0.35) - 0.35).abs() < f64::EPSILON);
    }

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_u32(599.6), 600);
        assert_eq!(round_f64_to_u32(f64::NAN), 0);
        assert_eq!(round_f64_to_u32(-5.0), 0);
        assert_eq!(round_f64_to_u32(f64::from(u32::MAX) * 2.0), u32::MAX);
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert!((ratio(3, 0) - 0.0).abs() < f64::EPSILON);
        assert!((ratio(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
