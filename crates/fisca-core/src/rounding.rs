//! Statutory rounding helpers.
//!
//! Legislated amounts round half away from zero. Resource bases round up to
//! a multiple of a fixed step (100 currency units for housing resources).

/// Round `value` to `decimals` decimal places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Round `value` up to the nearest multiple of `step`. A non-positive step
/// returns `value` unchanged.
pub fn ceil_to_multiple(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).ceil() * step
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ceil_result_is_a_multiple_and_not_below(value in 0.0f64..1.0e7) {
            let r = ceil_to_multiple(value, 100.0);
            prop_assert!(r >= value);
            prop_assert!(r - value < 100.0);
            prop_assert_eq!(r % 100.0, 0.0);
        }
    }
}
