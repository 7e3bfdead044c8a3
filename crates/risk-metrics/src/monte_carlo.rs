//! Monte Carlo bootstrap resampling of daily returns.
//!
//! Resamples the observed daily-return series with replacement to build a
//! distribution of plausible whole-period outcomes. The sampler is driven by
//! an explicit seed rather than an ambient RNG, so runs are reproducible;
//! each iteration derives its own RNG from the master seed, which keeps the
//! parallel run bit-identical to a sequential one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed policy threshold: a sampled path counts toward
/// `probability_of_drawdown` when its compounded return is below -10%.
const DRAWDOWN_THRESHOLD: f64 = -0.10;

/// Distribution summary from a bootstrap run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub simulations: usize,
    pub confidence_level: f64,
    /// Mean of the compounded-return distribution.
    pub expected_return: f64,
    /// Standard deviation of the distribution.
    pub expected_volatility: f64,
    /// Return at the lower `1 - confidence_level` quantile.
    pub worst_case_return: f64,
    /// Return at the upper `confidence_level` quantile.
    pub best_case_return: f64,
    /// Fraction of sampled paths ending below zero.
    pub probability_of_loss: f64,
    /// Fraction of sampled paths ending below the -10% threshold.
    pub probability_of_drawdown: f64,
    /// Sorted compounded returns, one per simulation.
    pub return_distribution: Vec<f64>,
}

impl MonteCarloResult {
    fn zeroed(simulations: usize, confidence_level: f64) -> Self {
        Self {
            simulations,
            confidence_level,
            expected_return: 0.0,
            expected_volatility: 0.0,
            worst_case_return: 0.0,
            best_case_return: 0.0,
            probability_of_loss: 0.0,
            probability_of_drawdown: 0.0,
            return_distribution: Vec::new(),
        }
    }
}

/// Run a bootstrap simulation over `daily_returns`.
///
/// Each iteration draws `daily_returns.len()` samples with replacement and
/// compounds them into a whole-period return. An empty input yields an
/// all-zero result rather than an error.
pub fn run_monte_carlo(
    daily_returns: &[f64],
    simulations: usize,
    confidence_level: f64,
    seed: u64,
) -> MonteCarloResult {
    if daily_returns.is_empty() || simulations == 0 {
        debug!(simulations, "monte carlo skipped: empty return series");
        return MonteCarloResult::zeroed(simulations, confidence_level);
    }

    // Iterations are independent; each gets an RNG derived from the master
    // seed so ordering and parallelism cannot perturb the output.
    let mut distribution: Vec<f64> = (0..simulations)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut compounded = 1.0_f64;
            for _ in 0..daily_returns.len() {
                let sample = daily_returns[rng.gen_range(0..daily_returns.len())];
                compounded *= 1.0 + sample;
            }
            compounded - 1.0
        })
        .collect();

    distribution.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = distribution.len();
    let worst_idx = (((1.0 - confidence_level) * n as f64).floor() as usize).min(n - 1);
    let best_idx = ((confidence_level * n as f64).floor() as usize).min(n - 1);

    let mean = distribution.iter().sum::<f64>() / n as f64;
    let variance = distribution.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n as f64;

    let losses = distribution.iter().filter(|&&r| r < 0.0).count();
    let deep_losses = distribution
        .iter()
        .filter(|&&r| r < DRAWDOWN_THRESHOLD)
        .count();

    MonteCarloResult {
        simulations,
        confidence_level,
        expected_return: mean,
        expected_volatility: variance.sqrt(),
        worst_case_return: distribution[worst_idx],
        best_case_return: distribution[best_idx],
        probability_of_loss: losses as f64 / n as f64,
        probability_of_drawdown: deep_losses as f64 / n as f64,
        return_distribution: distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_returns_all_zero() {
        let result = run_monte_carlo(&[], 1000, 0.95, 42);
        assert_eq!(result.expected_return, 0.0);
        assert_eq!(result.expected_volatility, 0.0);
        assert_eq!(result.worst_case_return, 0.0);
        assert_eq!(result.best_case_return, 0.0);
        assert_eq!(result.probability_of_loss, 0.0);
        assert_eq!(result.probability_of_drawdown, 0.0);
        assert!(result.return_distribution.is_empty());
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let returns = vec![0.01, -0.02, 0.015, -0.005, 0.008];
        let a = run_monte_carlo(&returns, 500, 0.95, 7);
        let b = run_monte_carlo(&returns, 500, 0.95, 7);
        assert_eq!(a.return_distribution, b.return_distribution);
        assert_eq!(a.expected_return, b.expected_return);
        assert_eq!(a.worst_case_return, b.worst_case_return);
    }

    #[test]
    fn test_different_seeds_differ() {
        let returns = vec![0.01, -0.02, 0.015, -0.005, 0.008];
        let a = run_monte_carlo(&returns, 500, 0.95, 7);
        let b = run_monte_carlo(&returns, 500, 0.95, 8);
        assert_ne!(a.return_distribution, b.return_distribution);
    }

    #[test]
    fn test_distribution_sorted_and_sized() {
        let returns = vec![0.01, -0.02, 0.015];
        let result = run_monte_carlo(&returns, 200, 0.95, 1);
        assert_eq!(result.return_distribution.len(), 200);
        assert!(result
            .return_distribution
            .windows(2)
            .all(|w| w[0] <= w[1]));
        assert!(result.worst_case_return <= result.best_case_return);
    }

    #[test]
    fn test_all_positive_returns_have_no_loss_probability() {
        let returns = vec![0.01, 0.02, 0.005];
        let result = run_monte_carlo(&returns, 300, 0.95, 3);
        assert_eq!(result.probability_of_loss, 0.0);
        assert_eq!(result.probability_of_drawdown, 0.0);
        assert!(result.expected_return > 0.0);
    }

    #[test]
    fn test_all_negative_returns_always_lose() {
        let returns = vec![-0.01, -0.02, -0.005];
        let result = run_monte_carlo(&returns, 300, 0.95, 3);
        assert_eq!(result.probability_of_loss, 1.0);
        assert!(result.expected_return < 0.0);
    }

    #[test]
    fn test_constant_returns_have_zero_volatility() {
        // Every draw is identical, so every path compounds to the same value
        let returns = vec![0.01; 10];
        let result = run_monte_carlo(&returns, 100, 0.95, 9);
        assert!(result.expected_volatility < 1e-12);
        let expected = 1.01_f64.powi(10) - 1.0;
        assert!((result.expected_return - expected).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_probability_splits_mixed_paths() {
        // Draws from {-0.19, 0.0}: a path breaches -10% only when at least
        // one -0.19 draw lands, so the counter sits strictly inside (0, 1).
        let returns = vec![-0.19, 0.0];
        let result = run_monte_carlo(&returns, 400, 0.95, 5);
        assert!(result.probability_of_drawdown > 0.0);
        assert!(result.probability_of_drawdown < 1.0);
        assert!(result.probability_of_loss >= result.probability_of_drawdown);
    }

    #[test]
    fn test_drawdown_threshold_is_strict() {
        // A single -10% day per path compounds to the threshold itself,
        // which must not be counted; the comparison is strictly below.
        let at_threshold = run_monte_carlo(&[-0.10], 100, 0.95, 13);
        assert_eq!(at_threshold.probability_of_loss, 1.0);
        assert_eq!(at_threshold.probability_of_drawdown, 0.0);

        // A single -12.5% day per path ends below the threshold and counts.
        let below = run_monte_carlo(&[-0.125], 100, 0.95, 13);
        assert_eq!(below.probability_of_drawdown, 1.0);
    }

    #[test]
    fn test_quantile_indices() {
        let returns = vec![0.01, -0.02, 0.015, -0.005];
        let result = run_monte_carlo(&returns, 1000, 0.95, 11);
        // floor(0.05 * 1000) = 50, floor(0.95 * 1000) = 950
        assert_eq!(result.worst_case_return, result.return_distribution[50]);
        assert_eq!(result.best_case_return, result.return_distribution[950]);
    }
}
