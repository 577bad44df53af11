//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in degrees into the range `(-180, 180]`.
///
/// Attitude angles from the simulator are reported in `[0, 360)`, so a small negative pitch shows
/// up as a value just under 360. Wrapping makes these directly comparable with a tolerance.
pub fn wrap_180_deg<T>(angle_deg: T) -> T
where
    T: Float
{
    let full = T::from(360.0).unwrap_or_else(T::zero);
    let half = T::from(180.0).unwrap_or_else(T::zero);

    let wrapped = rem_euclid(angle_deg, full);

    if wrapped > half {
        wrapped - full
    }
    else {
        wrapped
    }
}

/// Arithmetic mean of the values, or `None` if there are none.
pub fn mean<T, I>(values: I) -> Option<T>
where
    T: Float,
    I: IntoIterator<Item = T>
{
    let mut sum = T::zero();
    let mut count = 0usize;

    for v in values {
        sum = sum + v;
        count += 1;
    }

    match count {
        0 => None,
        n => T::from(n).map(|n| sum / n)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(370f64, 360f64), 10f64);
        assert_eq!(rem_euclid(-10f64, 360f64), 350f64);
        assert_eq!(rem_euclid(0f64, 360f64), 0f64);
    }

    #[test]
    fn test_wrap_180_deg() {
        assert_eq!(wrap_180_deg(359.5f64), -0.5f64);
        assert_eq!(wrap_180_deg(0.5f64), 0.5f64);
        assert_eq!(wrap_180_deg(-0.5f64), -0.5f64);
        assert_eq!(wrap_180_deg(180f64), 180f64);
        assert_eq!(wrap_180_deg(540f64), 180f64);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(vec![1f64, 2f64, 3f64]), Some(2f64));
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(clamp(&20f64, &-15f64, &15f64), 15f64);
        assert_eq!(clamp(&-20f64, &-15f64, &15f64), -15f64);
    }
}
