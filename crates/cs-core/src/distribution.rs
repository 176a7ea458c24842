//! Duration sampler: constant, exponential, or triangular.
//!
//! A `TimeDistribution` is built from a `(min, mode, max)` triple and
//! classified once, at construction:
//!
//! - `mode <= 0`: constant zero.
//! - `max <= 0`: exponential with mean `mode`.
//! - otherwise `min` is clamped into `[0, mode]`, `max` raised to at least
//!   `mode`, and the result is triangular unless all three coincide.
//!
//! [`TimeDistribution::next_value`] draws a sample and caches it as the
//! *realized* value (`x_value`), which the model reads back for the rest of
//! the occurrence.

use std::fmt;

use crate::{SimRng, SimTime, TimeUnit};

/// `-ln(f64::MIN_POSITIVE)`: the largest value an exponential draw can reach,
/// as a multiple of its mean.
const EXPONENTIAL_MAX_FACTOR: f64 = 744.44;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistributionKind {
    #[default]
    Constant,
    Exponential,
    Triangular,
}

#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeDistribution {
    kind:    DistributionKind,
    min:     SimTime,
    mode:    SimTime,
    max:     SimTime,
    x_value: SimTime,
}

impl Default for TimeDistribution {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TimeDistribution {
    /// Constant zero with an undefined unit.
    pub const ZERO: TimeDistribution = TimeDistribution {
        kind:    DistributionKind::Constant,
        min:     SimTime::with_unit(0, TimeUnit::Undefined),
        mode:    SimTime::with_unit(0, TimeUnit::Undefined),
        max:     SimTime::with_unit(0, TimeUnit::Undefined),
        x_value: SimTime::with_unit(0, TimeUnit::Undefined),
    };

    /// Build and classify a distribution; all three bounds take `unit`.
    pub fn new(unit: TimeUnit, min: SimTime, mode: SimTime, max: SimTime) -> Self {
        let (mut min, mut mode, mut max) = (min, mode, max);
        let zero = SimTime::ZERO;
        let kind = if mode <= zero {
            min = zero;
            mode = zero;
            max = zero;
            DistributionKind::Constant
        } else if max <= zero {
            min = zero;
            max = zero;
            DistributionKind::Exponential
        } else {
            min = min.clamp(zero, mode);
            max = max.max(mode);
            Self::classify_bounded(min, mode, max)
        };
        let mut d = Self { kind, min, mode, max, x_value: mode };
        d.set_unit(unit);
        d
    }

    /// Same, with bounds given as values in `unit`.
    pub fn from_values(unit: TimeUnit, min: f64, mode: f64, max: f64) -> Self {
        Self::new(unit, SimTime::new(unit, min), SimTime::new(unit, mode), SimTime::new(unit, max))
    }

    pub fn constant(value: SimTime) -> Self {
        Self::new(value.unit, value, value, value)
    }

    /// Exponential with the given mean.
    pub fn exponential(mean: SimTime) -> Self {
        Self::new(mean.unit, SimTime::ZERO, mean, SimTime::ZERO)
    }

    pub fn triangular(min: SimTime, mode: SimTime, max: SimTime) -> Self {
        Self::new(mode.unit, min, mode, max)
    }

    fn classify_bounded(min: SimTime, mode: SimTime, max: SimTime) -> DistributionKind {
        if min < mode || mode < max {
            DistributionKind::Triangular
        } else {
            DistributionKind::Constant
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    #[inline] pub fn kind(&self) -> DistributionKind { self.kind }
    #[inline] pub fn min(&self) -> SimTime { self.min }
    #[inline] pub fn mode(&self) -> SimTime { self.mode }
    #[inline] pub fn max(&self) -> SimTime { self.max }

    /// The last sampled value (the mode until the first draw).
    #[inline]
    pub fn x_value(&self) -> SimTime {
        self.x_value
    }

    #[inline]
    pub fn unit(&self) -> TimeUnit {
        self.mode.unit
    }

    pub fn set_unit(&mut self, unit: TimeUnit) {
        self.min.unit = unit;
        self.mode.unit = unit;
        self.max.unit = unit;
        self.x_value.unit = unit;
    }

    /// Overwrite the realized value, e.g. to carry it between occurrences.
    #[inline]
    pub fn set_x_value(&mut self, value: SimTime) {
        self.x_value = value;
    }

    pub fn min_possible(&self) -> SimTime {
        match self.kind {
            DistributionKind::Constant    => self.mode,
            DistributionKind::Exponential => SimTime::EPSILON,
            DistributionKind::Triangular  => self.min,
        }
    }

    pub fn average(&self) -> SimTime {
        match self.kind {
            DistributionKind::Triangular => {
                let secs = (self.min.total_seconds() + self.mode.total_seconds() + self.max.total_seconds()) / 3.0;
                SimTime::new(TimeUnit::Seconds, secs).in_display_unit(self.unit())
            }
            _ => self.mode,
        }
    }

    pub fn max_possible(&self) -> SimTime {
        match self.kind {
            DistributionKind::Exponential => self.mode * EXPONENTIAL_MAX_FACTOR,
            _ => self.max,
        }
    }

    /// Force the bounds back into a consistent state after field edits.
    pub fn validate(&mut self) {
        let zero = SimTime::ZERO;
        if self.unit() == TimeUnit::Undefined || self.mode < zero {
            self.mode.ticks = 0;
        }
        if self.min > self.mode {
            self.min.ticks = self.mode.ticks;
        } else if self.min < zero {
            self.min.ticks = 0;
        }
        if !self.max.is_zero() && self.max < self.mode {
            self.max.ticks = self.mode.ticks;
        }
        self.kind = if self.mode <= zero {
            DistributionKind::Constant
        } else if self.max <= zero {
            DistributionKind::Exponential
        } else {
            Self::classify_bounded(self.min, self.mode, self.max)
        };
    }

    /// Draw a fresh sample, cache it, and return it.  Constants draw nothing
    /// from `rng`.
    pub fn next_value(&mut self, rng: &mut SimRng) -> SimTime {
        match self.kind {
            DistributionKind::Constant => {}
            DistributionKind::Exponential => {
                let u: f64 = rng.random();
                self.x_value = self.mode * -(1.0 - u).ln();
            }
            DistributionKind::Triangular => {
                let u: f64 = rng.random();
                let a = self.min.total_seconds();
                let c = self.mode.total_seconds();
                let b = self.max.total_seconds();
                let secs = if u <= (c - a) / (b - a) {
                    a + (u * (b - a) * (c - a)).sqrt()
                } else {
                    b - ((1.0 - u) * (b - a) * (b - c)).sqrt()
                };
                self.x_value = SimTime::new(TimeUnit::Seconds, secs).in_display_unit(self.unit());
            }
        }
        self.x_value
    }
}

/// Equality ignores the realized value; an undefined unit only equals an
/// undefined unit.
impl PartialEq for TimeDistribution {
    fn eq(&self, other: &Self) -> bool {
        (self.unit() == TimeUnit::Undefined) == (other.unit() == TimeUnit::Undefined)
            && self.min == other.min
            && self.mode == other.mode
            && self.max == other.max
    }
}

fn write_fixed_unit(f: &mut fmt::Formatter<'_>, t: SimTime, show_unit: bool) -> fmt::Result {
    let unit = t.unit.or_seconds();
    let value = t.in_unit(unit);
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if show_unit {
        write!(f, "{text}{}", unit.symbol())
    } else {
        f.write_str(text)
    }
}

/// `8h`, `≈8h` (exponential), or `1 ≤ 2h ≥ 3` (triangular).
impl fmt::Display for TimeDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DistributionKind::Constant => write_fixed_unit(f, self.mode, true),
            DistributionKind::Exponential => {
                f.write_str("≈")?;
                write_fixed_unit(f, self.mode, true)
            }
            DistributionKind::Triangular => {
                write_fixed_unit(f, self.min, false)?;
                f.write_str(" ≤ ")?;
                write_fixed_unit(f, self.mode, true)?;
                f.write_str(" ≥ ")?;
                write_fixed_unit(f, self.max, false)
            }
        }
    }
}
