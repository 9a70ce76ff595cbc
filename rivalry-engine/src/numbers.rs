//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = f64::from(u32::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Replace NaN and infinities with zero so they never leak into scores.
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Clamp a signed value into an inclusive `u8` range.
#[must_use]
pub fn clamp_i32_to_u8(value: i32, min: u8, max: u8) -> u8 {
    let clamped = value.clamp(i32::from(min), i32::from(max));
    u8::try_from(clamped).unwrap_or(min)
}

/// Percentage difference against the larger of two non-negative values.
///
/// Returns 0 when both values are zero.
#[must_use]
pub fn symmetric_pct_diff(a: f64, b: f64) -> f64 {
    let larger = a.max(b);
    if larger <= 0.0 {
        return 0.0;
    }
    finite_or_zero((a - b).abs() / larger * 100.0)
}
