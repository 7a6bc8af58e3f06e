//! Resource weighting of population transitions
//!
//! Resources per unit above 1 make growth more likely (capped at 1.5x);
//! resources per unit below 1 make decline more likely without bound.

/// Weight applied to growth entries
///
/// `W > 1` when resources exceed population, `W = 1` when equal,
/// `W < 1` when short.
pub fn growth_weight(resource_available: f64, alive_units: u32) -> f64 {
    let per_unit = resource_available / alive_units.max(1) as f64;
    1.0 + 0.5 * (1.0 - (-(per_unit - 1.0)).exp())
}

/// Weight applied to decline entries
///
/// `W = 1` when resources cover the population, growing as scarcity worsens.
pub fn decline_weight(resource_available: f64, alive_units: u32) -> f64 {
    let alive = alive_units.max(1) as f64;
    if resource_available >= alive {
        return 1.0;
    }
    (1.0 - resource_available / alive).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_weight_neutral_at_parity() {
        assert!((growth_weight(10.0, 10) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_growth_weight_bounded_above() {
        let w = growth_weight(1_000_000.0, 1);
        assert!(w > 1.49 && w <= 1.5);
    }

    #[test]
    fn test_growth_weight_below_one_when_short() {
        assert!(growth_weight(2.0, 10) < 1.0);
    }

    #[test]
    fn test_decline_weight() {
        assert_eq!(decline_weight(10.0, 10), 1.0);
        assert_eq!(decline_weight(50.0, 10), 1.0);
        assert!((decline_weight(0.0, 10) - std::f64::consts::E).abs() < 1e-12);
        assert!(decline_weight(5.0, 10) > 1.0);
    }
}
