use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Win/lose multipliers applied to the staked part of wealth.
///
/// On a win the stake is multiplied by `win_multiplier`, on a loss by
/// `lose_multiplier`. The unstaked remainder is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub win_multiplier: f64,
    pub lose_multiplier: f64,
}

impl Bet {
    /// Build a bet after checking `w > 0` and `l >= 0`.
    pub fn new(win_multiplier: f64, lose_multiplier: f64) -> Result<Self> {
        let bet = Self {
            win_multiplier,
            lose_multiplier,
        };
        bet.validate()?;
        Ok(bet)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.win_multiplier.is_finite() || self.win_multiplier <= 0.0 {
            return Err(SimError::InvalidWinMultiplier {
                value: self.win_multiplier,
            });
        }
        if !self.lose_multiplier.is_finite() || self.lose_multiplier < 0.0 {
            return Err(SimError::InvalidLoseMultiplier {
                value: self.lose_multiplier,
            });
        }
        Ok(())
    }

    /// Per-flip wealth multipliers when staking `fraction` of wealth.
    ///
    /// `m_win = 1 + f(w - 1)`, `m_lose = 1 - f(1 - l)`.
    #[inline]
    pub fn multipliers(&self, fraction: f64) -> FlipMultipliers {
        FlipMultipliers {
            win: 1.0 + fraction * (self.win_multiplier - 1.0),
            lose: 1.0 - fraction * (1.0 - self.lose_multiplier),
        }
    }

    /// The `w * l >= 1` rule of thumb. Exact only for `f = 1`.
    pub fn raw_product(&self) -> f64 {
        self.win_multiplier * self.lose_multiplier
    }
}

/// Whole-wealth multipliers for one flip at a fixed allocation fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipMultipliers {
    pub win: f64,
    pub lose: f64,
}

impl FlipMultipliers {
    /// Apply one flip. A zero loss multiplier is absorbing, even from `+inf`.
    #[inline]
    pub fn apply(&self, wealth: f64, won: bool) -> f64 {
        if won {
            wealth * self.win
        } else if self.lose == 0.0 {
            0.0
        } else {
            wealth * self.lose
        }
    }

    /// `E[m]` for a fair coin.
    pub fn expected(&self) -> f64 {
        0.5 * self.win + 0.5 * self.lose
    }

    /// Expected log growth per flip for a fair coin.
    ///
    /// `-inf` when a loss wipes out wealth entirely.
    pub fn log_growth(&self) -> f64 {
        0.5 * self.win.ln() + 0.5 * self.lose.ln()
    }
}

/// Check `fraction` lies within [0, 1].
pub fn validate_fraction(fraction: f64) -> Result<()> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(SimError::InvalidFraction { value: fraction });
    }
    Ok(())
}
