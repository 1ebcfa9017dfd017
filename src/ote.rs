//! Swing detection, the optimal-trade-entry zone, the "123" confirmation
//! rule and the composite score.
//!
//! Everything here is pure arithmetic over the candle window; none of it
//! can fail once the window is non-empty.

use serde::Serialize;
use std::fmt;

pub const FIB_TOP: f64 = 0.618;
pub const FIB_MID: f64 = 0.705;
pub const FIB_BOTTOM: f64 = 0.786;

/// How many trailing candles the 123 rule inspects.
pub const CONFIRMATION_LOOKBACK: usize = 10;
/// Closes in the trend mean, and also its fixed divisor.
pub const MA_PERIOD: usize = 20;

pub const BASE_SCORE: u32 = 50;
const NEAR_OTE: f64 = 0.02;
const CLOSE_TO_OTE: f64 = 0.05;
const NEAR_OTE_BONUS: u32 = 30;
const CLOSE_TO_OTE_BONUS: u32 = 15;
const TREND_BONUS: u32 = 10;
const CONFIRMATION_BONUS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SetupDirection {
    Long,
    Short,
}

impl fmt::Display for SetupDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupDirection::Long => write!(f, "LONG"),
            SetupDirection::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoints {
    pub high: f64,
    pub high_idx: usize,
    pub low: f64,
    pub low_idx: usize,
}

impl SwingPoints {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// LONG when the high printed after the low. Equal indices fall to SHORT.
    pub fn direction(&self) -> SetupDirection {
        if self.high_idx > self.low_idx {
            SetupDirection::Long
        } else {
            SetupDirection::Short
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OteZone {
    pub top: f64,
    pub mid: f64,
    pub bottom: f64,
    /// 100% retracement anchor.
    pub fib_0: f64,
    /// 0% retracement anchor.
    pub fib_1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setup {
    pub direction: SetupDirection,
    pub zone: OteZone,
    pub target: f64,
    pub stop: f64,
}

/// Maximum high and minimum low of the window with their positions.
/// Ties keep the earliest index. Returns `None` for an empty window.
pub fn find_swings(highs: &[f64], lows: &[f64]) -> Option<SwingPoints> {
    let (high_idx, high) = first_extreme(highs, |candidate, best| candidate > best)?;
    let (low_idx, low) = first_extreme(lows, |candidate, best| candidate < best)?;
    Some(SwingPoints {
        high,
        high_idx,
        low,
        low_idx,
    })
}

fn first_extreme(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<(usize, f64)> {
    let (&first, rest) = values.split_first()?;
    let mut best = (0, first);
    for (i, &v) in rest.iter().enumerate() {
        if better(v, best.1) {
            best = (i + 1, v);
        }
    }
    Some(best)
}

/// Derives direction, zone, target and stop from the swing points.
pub fn build_setup(swings: &SwingPoints) -> Setup {
    let range = swings.range();
    match swings.direction() {
        SetupDirection::Long => Setup {
            direction: SetupDirection::Long,
            zone: OteZone {
                top: swings.high - range * FIB_TOP,
                mid: swings.high - range * FIB_MID,
                bottom: swings.high - range * FIB_BOTTOM,
                fib_0: swings.low,
                fib_1: swings.high,
            },
            target: swings.high,
            stop: swings.low,
        },
        SetupDirection::Short => Setup {
            direction: SetupDirection::Short,
            zone: OteZone {
                top: swings.low + range * FIB_TOP,
                mid: swings.low + range * FIB_MID,
                bottom: swings.low + range * FIB_BOTTOM,
                fib_0: swings.high,
                fib_1: swings.low,
            },
            target: swings.low,
            stop: swings.high,
        },
    }
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

/// Higher low above the swing low (LONG) or lower high below the swing
/// high (SHORT), with price still on the right side of it.
pub fn is_123_valid(
    current_price: f64,
    direction: SetupDirection,
    highs: &[f64],
    lows: &[f64],
    swings: &SwingPoints,
) -> bool {
    match direction {
        SetupDirection::Long => {
            let recent = tail(lows, CONFIRMATION_LOOKBACK);
            let Some(higher_low) = recent.iter().copied().reduce(f64::min) else {
                return false;
            };
            current_price > higher_low && higher_low > swings.low
        }
        SetupDirection::Short => {
            let recent = tail(highs, CONFIRMATION_LOOKBACK);
            let Some(lower_high) = recent.iter().copied().reduce(f64::max) else {
                return false;
            };
            current_price < lower_high && lower_high < swings.high
        }
    }
}

/// Sum of the last [`MA_PERIOD`] closes divided by [`MA_PERIOD`].
/// Shorter windows are still divided by the full period.
pub fn moving_average(closes: &[f64]) -> f64 {
    tail(closes, MA_PERIOD).iter().sum::<f64>() / MA_PERIOD as f64
}

/// Points for how close price sits to the zone midpoint.
/// A zero midpoint scores nothing instead of dividing by it.
pub fn proximity_bonus(current_price: f64, ote_mid: f64) -> u32 {
    if ote_mid.abs() < f64::EPSILON {
        return 0;
    }
    let distance = (current_price - ote_mid).abs() / ote_mid;
    if distance < NEAR_OTE {
        NEAR_OTE_BONUS
    } else if distance < CLOSE_TO_OTE {
        CLOSE_TO_OTE_BONUS
    } else {
        0
    }
}

/// Base 50 plus proximity, trend and confirmation bonuses. Not clamped.
pub fn composite_score(
    current_price: f64,
    ote_mid: f64,
    direction: SetupDirection,
    ma20: f64,
    confirmed: bool,
) -> u32 {
    let mut score = BASE_SCORE + proximity_bonus(current_price, ote_mid);

    let with_trend = match direction {
        SetupDirection::Long => current_price > ma20,
        SetupDirection::Short => current_price < ma20,
    };
    if with_trend {
        score += TREND_BONUS;
    }
    if confirmed {
        score += CONFIRMATION_BONUS;
    }
    score
}
