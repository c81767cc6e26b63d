//! Math helpers shared by track generation, projection, and simulation.
//!
//! All interpolation runs on normalized 0..1 percentages so the easing
//! curves compose with any range.

/// Clamp `value` into `[min, max]`.
pub fn limit(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Linear interpolation between `a` and `b`.
pub fn interpolate(a: f64, b: f64, percent: f64) -> f64 {
    a + (b - a) * percent
}

/// Quadratic ease-in.
pub fn ease_in(a: f64, b: f64, percent: f64) -> f64 {
    a + (b - a) * percent.powi(2)
}

/// Quadratic ease-out.
pub fn ease_out(a: f64, b: f64, percent: f64) -> f64 {
    a + (b - a) * (1.0 - (1.0 - percent).powi(2))
}

/// Cosine ease-in-out.
pub fn ease_in_out(a: f64, b: f64, percent: f64) -> f64 {
    a + (b - a) * (-(percent * std::f64::consts::PI).cos() / 2.0 + 0.5)
}

/// Exponential fog factor for a normalized distance, 1.0 = no fog.
pub fn exponential_fog(distance: f64, density: f64) -> f64 {
    1.0 / (distance * distance * density).exp()
}

/// Advance `start` by `increment`, wrapping into `[0, max)`.
pub fn increase(start: f64, increment: f64, max: f64) -> f64 {
    let mut result = start + increment;
    while result >= max {
        result -= max;
    }
    while result < 0.0 {
        result += max;
    }
    result
}

/// Fraction of the way through the current `total`-sized interval.
pub fn percent_remaining(n: f64, total: f64) -> f64 {
    (n % total) / total
}

/// Integrate a constant acceleration over `dt`.
pub fn accelerate(v: f64, accel: f64, dt: f64) -> f64 {
    v + accel * dt
}

/// Bounding overlap test between two centered intervals.
///
/// `percent` shrinks both boxes symmetrically (1.0 = full width).
pub fn overlap(x1: f64, w1: f64, x2: f64, w2: f64, percent: f64) -> bool {
    let half = percent / 2.0;
    let min1 = x1 - w1 * half;
    let max1 = x1 + w1 * half;
    let min2 = x2 - w2 * half;
    let max2 = x2 + w2 * half;
    !(max1 < min2 || min1 > max2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamps_both_ends() {
        assert_eq!(limit(5.0, 0.0, 3.0), 3.0);
        assert_eq!(limit(-5.0, 0.0, 3.0), 0.0);
        assert_eq!(limit(1.5, 0.0, 3.0), 1.5);
    }

    #[test]
    fn easing_hits_endpoints() {
        for f in [ease_in, ease_out, ease_in_out] {
            assert!((f(2.0, 10.0, 0.0) - 2.0).abs() < 1e-9);
            assert!((f(2.0, 10.0, 1.0) - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_at_midpoint() {
        assert!((ease_in_out(0.0, 10.0, 0.5) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn increase_wraps_around() {
        assert_eq!(increase(9.0, 3.0, 10.0), 2.0);
        assert_eq!(increase(1.0, -3.0, 10.0), 8.0);
        assert_eq!(increase(3.0, 4.0, 10.0), 7.0);
    }

    #[test]
    fn fog_is_one_at_zero_distance() {
        assert!((exponential_fog(0.0, 5.0) - 1.0).abs() < 1e-9);
        assert!(exponential_fog(1.0, 5.0) < 0.01);
    }

    #[test]
    fn overlap_detects_touching_and_disjoint() {
        assert!(overlap(0.0, 2.0, 1.0, 2.0, 1.0));
        assert!(!overlap(0.0, 1.0, 3.0, 1.0, 1.0));
        // shrunk boxes stop overlapping
        assert!(!overlap(0.0, 2.0, 1.8, 2.0, 0.1));
    }
}
