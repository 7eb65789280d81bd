//! Utility and fairness scoring shared by every strategy

use crate::types::PartyConfig;

/// Floor applied to utilities before taking logarithms
pub const FAIRNESS_EPSILON: f64 = 1e-6;

/// Logistic inputs are clipped to this magnitude before exponentiation
const LOGISTIC_CLIP: f64 = 500.0;

/// Utility of `price` for a party centred on `target` with the given band.
///
/// The band is floored at 1.0 so a degenerate range stays finite.
pub fn utility_within(target: f64, min_price: f64, max_price: f64, price: f64) -> f64 {
    1.0 - (price - target).abs() / (max_price - min_price).abs().max(1.0)
}

/// Utility of `price` for the party described by `config`
pub fn utility(config: &PartyConfig, price: f64) -> f64 {
    utility_within(
        config.target_price(),
        config.min_price(),
        config.max_price(),
        price,
    )
}

/// One minus the absolute utility gap
pub fn simple_fairness(first: f64, second: f64) -> f64 {
    1.0 - (first - second).abs()
}

/// Nash-product criterion: sum of log utilities
pub fn proportional_fairness(first: f64, second: f64) -> f64 {
    first.max(FAIRNESS_EPSILON).ln() + second.max(FAIRNESS_EPSILON).ln()
}

/// Standard logistic function with range-limited input
pub fn logistic(x: f64) -> f64 {
    let x = x.clamp(-LOGISTIC_CLIP, LOGISTIC_CLIP);
    1.0 / (1.0 + (-x).exp())
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
