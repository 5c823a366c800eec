//! Closed-form reference values for a fair coin.
//!
//! With `m_win = 1 + f(w - 1)` and `m_lose = 1 - f(1 - l)`:
//! - the mean terminal wealth after `n` flips is `E[m]^n`;
//! - log wealth grows by `g(f) = 0.5 ln m_win + 0.5 ln m_lose` per flip, so
//!   typical (median) wealth is `exp(n g(f))`;
//! - `g` is maximised at `f* = (a - b) / (2ab)` with `a = w - 1`, `b = 1 - l`.
//!
//! The rule of thumb `w * l >= 1` is `g(1) >= 0`, i.e. it only describes
//! staking everything. Partial stakes can grow even when `w * l < 1`.

use serde::Serialize;

use betsim_core::Bet;

/// Expected whole-wealth multiplier per flip.
pub fn expected_multiplier(bet: &Bet, fraction: f64) -> f64 {
    bet.multipliers(fraction).expected()
}

/// Expected terminal wealth, `E[m]^n`.
pub fn expected_terminal_mean(bet: &Bet, fraction: f64, flips: u64) -> f64 {
    powu(expected_multiplier(bet, fraction), flips)
}

/// Expected log growth per flip, `g(f)`.
pub fn log_growth_rate(bet: &Bet, fraction: f64) -> f64 {
    bet.multipliers(fraction).log_growth()
}

/// Median terminal wealth, `exp(n g(f))`.
///
/// Exact for even `n`. For odd `n` the two central outcomes are equally
/// likely and this is their geometric midpoint.
pub fn median_terminal_wealth(bet: &Bet, fraction: f64, flips: u64) -> f64 {
    if flips == 0 {
        return 1.0;
    }
    (flips as f64 * log_growth_rate(bet, fraction)).exp()
}

/// Growth-optimal allocation fraction within [0, 1].
///
/// `g` is concave and `g'(0) = (a - b) / 2`, so staking anything pays only
/// when `a > b`. This includes `w < 1 < l` bets, where the losing side of
/// the coin is the one that grows wealth.
pub fn growth_optimal_fraction(bet: &Bet) -> f64 {
    let a = bet.win_multiplier - 1.0;
    let b = 1.0 - bet.lose_multiplier;
    if a - b <= 0.0 {
        return 0.0;
    }
    // g' has no root: it stays positive up to f = 1.
    if a * b <= 0.0 {
        return 1.0;
    }
    ((a - b) / (2.0 * a * b)).clamp(0.0, 1.0)
}

/// Whether staking `fraction` grows typical wealth over time.
pub fn is_growth_positive(bet: &Bet, fraction: f64) -> bool {
    log_growth_rate(bet, fraction) > 0.0
}

/// Reference values for one grid cell, reported next to the sampled ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellTheory {
    pub expected_mean: f64,
    pub expected_median: f64,
    pub log_growth_per_flip: f64,
}

impl CellTheory {
    pub fn new(bet: &Bet, fraction: f64, flips: u64) -> Self {
        Self {
            expected_mean: expected_terminal_mean(bet, fraction, flips),
            expected_median: median_terminal_wealth(bet, fraction, flips),
            log_growth_per_flip: log_growth_rate(bet, fraction),
        }
    }
}

/// `base^exp` without truncating `exp` to `i32`.
fn powu(base: f64, exp: u64) -> f64 {
    match i32::try_from(exp) {
        Ok(e) => base.powi(e),
        Err(_) => base.powf(exp as f64),
    }
}
