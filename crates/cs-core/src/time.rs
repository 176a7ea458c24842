//! Simulation time model.
//!
//! # Design
//!
//! Time is a signed 64-bit tick count at a fixed 1,000 ticks per second,
//! paired with the [`TimeUnit`] the value was expressed in.  The unit is for
//! display only: equality, ordering and hashing look at ticks alone, and
//! arithmetic keeps the unit of the left operand.
//!
//! Tick 0 is a Monday at 00:00.  The calendar helpers below work on residues
//! modulo a day, week, month (365.25 / 12 days) or year (365.25 days) counted
//! from that epoch, which is all the recurrence logic needs.  Residues are
//! always in `[0, period)`, also for negative times.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::CoreError;

pub const TICKS_PER_SECOND: i64 = 1_000;
pub const TICKS_PER_MINUTE: i64 = 60 * TICKS_PER_SECOND;
pub const TICKS_PER_HOUR: i64 = 60 * TICKS_PER_MINUTE;
pub const TICKS_PER_DAY: i64 = 24 * TICKS_PER_HOUR;
pub const TICKS_PER_WEEK: i64 = 7 * TICKS_PER_DAY;
pub const TICKS_PER_MONTH: i64 = TICKS_PER_DAY * 36_525 / 1_200;
pub const TICKS_PER_YEAR: i64 = TICKS_PER_DAY * 36_525 / 100;

// ── TimeUnit ─────────────────────────────────────────────────────────────────

/// Unit a time value is expressed and displayed in.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeUnit {
    #[default]
    Undefined,
    Ticks,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    /// Number of ticks in one unit.  `Undefined` has none.
    #[inline]
    pub const fn ticks(self) -> i64 {
        match self {
            TimeUnit::Undefined => 0,
            TimeUnit::Ticks     => 1,
            TimeUnit::Seconds   => TICKS_PER_SECOND,
            TimeUnit::Minutes   => TICKS_PER_MINUTE,
            TimeUnit::Hours     => TICKS_PER_HOUR,
            TimeUnit::Days      => TICKS_PER_DAY,
            TimeUnit::Weeks     => TICKS_PER_WEEK,
            TimeUnit::Months    => TICKS_PER_MONTH,
            TimeUnit::Years     => TICKS_PER_YEAR,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            TimeUnit::Undefined => "",
            TimeUnit::Ticks     => "ticks",
            TimeUnit::Seconds   => "s",
            TimeUnit::Minutes   => "min",
            TimeUnit::Hours     => "h",
            TimeUnit::Days      => "d",
            TimeUnit::Weeks     => "wk",
            TimeUnit::Months    => "mo",
            TimeUnit::Years     => "a",
        }
    }

    /// Unit used to display values whose own unit is `Undefined`.
    #[inline]
    pub fn or_seconds(self) -> TimeUnit {
        if self == TimeUnit::Undefined { TimeUnit::Seconds } else { self }
    }
}

impl FromStr for TimeUnit {
    type Err = CoreError;

    /// Accepts variant names (case-insensitive) and symbols.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "" | "undefined"      => TimeUnit::Undefined,
            "ticks"               => TimeUnit::Ticks,
            "s" | "seconds"       => TimeUnit::Seconds,
            "min" | "minutes"     => TimeUnit::Minutes,
            "h" | "hours"         => TimeUnit::Hours,
            "d" | "days"          => TimeUnit::Days,
            "wk" | "weeks"        => TimeUnit::Weeks,
            "mo" | "months"       => TimeUnit::Months,
            "a" | "years"         => TimeUnit::Years,
            other => return Err(CoreError::Parse(format!("unknown time unit `{other}`"))),
        };
        Ok(unit)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ── SimTime ──────────────────────────────────────────────────────────────────

/// A point in, or a span of, simulated time.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime {
    pub ticks: i64,
    pub unit:  TimeUnit,
}

impl SimTime {
    pub const ZERO: SimTime = SimTime::with_unit(0, TimeUnit::Seconds);
    pub const EPSILON: SimTime = SimTime::with_unit(1, TimeUnit::Ticks);
    pub const ONE_SECOND: SimTime = SimTime::with_unit(TICKS_PER_SECOND, TimeUnit::Seconds);
    pub const ONE_MINUTE: SimTime = SimTime::with_unit(TICKS_PER_MINUTE, TimeUnit::Minutes);
    pub const ONE_HOUR: SimTime = SimTime::with_unit(TICKS_PER_HOUR, TimeUnit::Hours);
    pub const ONE_DAY: SimTime = SimTime::with_unit(TICKS_PER_DAY, TimeUnit::Days);
    pub const ONE_WEEK: SimTime = SimTime::with_unit(TICKS_PER_WEEK, TimeUnit::Weeks);
    pub const MAX: SimTime = SimTime::with_unit(i64::MAX, TimeUnit::Years);
    pub const MIN: SimTime = SimTime::with_unit(i64::MIN, TimeUnit::Years);
    /// Stand-in for "longer than anything the model cares about": three years.
    pub const ARBITRARY_LARGE_DURATION: SimTime =
        SimTime::with_unit(3 * TICKS_PER_YEAR, TimeUnit::Years);

    #[inline]
    pub const fn with_unit(ticks: i64, unit: TimeUnit) -> Self {
        Self { ticks, unit }
    }

    #[inline]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self::with_unit(ticks, TimeUnit::Ticks)
    }

    /// `value` units, rounded to the nearest tick.
    pub fn new(unit: TimeUnit, value: f64) -> Self {
        Self::with_unit((value * unit.ticks() as f64).round() as i64, unit)
    }

    /// A whole number of units; exact.
    #[inline]
    pub fn from_whole(unit: TimeUnit, value: i64) -> Self {
        Self::with_unit(value.saturating_mul(unit.ticks()), unit)
    }

    #[inline]
    pub fn hours(value: f64) -> Self {
        Self::new(TimeUnit::Hours, value)
    }

    #[inline]
    pub fn minutes(value: f64) -> Self {
        Self::new(TimeUnit::Minutes, value)
    }

    #[inline]
    pub fn days(value: f64) -> Self {
        Self::new(TimeUnit::Days, value)
    }

    /// Same instant, displayed in `unit`.
    #[inline]
    pub fn in_display_unit(self, unit: TimeUnit) -> Self {
        Self::with_unit(self.ticks, unit)
    }

    /// Value expressed in `unit` (seconds when `unit` is `Undefined`).
    pub fn in_unit(self, unit: TimeUnit) -> f64 {
        self.ticks as f64 / unit.or_seconds().ticks() as f64
    }

    /// Value expressed in this time's own display unit.
    #[inline]
    pub fn value(self) -> f64 {
        self.in_unit(self.unit)
    }

    #[inline]
    pub fn total_seconds(self) -> f64 {
        self.in_unit(TimeUnit::Seconds)
    }

    #[inline]
    pub fn total_minutes(self) -> f64 {
        self.in_unit(TimeUnit::Minutes)
    }

    #[inline]
    pub fn total_hours(self) -> f64 {
        self.in_unit(TimeUnit::Hours)
    }

    #[inline]
    pub fn total_days(self) -> f64 {
        self.in_unit(TimeUnit::Days)
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.ticks > 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.ticks < 0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.ticks == 0
    }

    /// The next representable instant.
    #[inline]
    pub fn next_up(self) -> Self {
        Self::with_unit(self.ticks.saturating_add(1), self.unit)
    }

    /// The previous representable instant.
    #[inline]
    pub fn next_down(self) -> Self {
        Self::with_unit(self.ticks.saturating_sub(1), self.unit)
    }

    // ── Calendar residues ────────────────────────────────────────────────

    #[inline]
    pub fn day_time(self) -> Self {
        Self::with_unit(self.ticks.rem_euclid(TICKS_PER_DAY), self.unit)
    }

    #[inline]
    pub fn week_time(self) -> Self {
        Self::with_unit(self.ticks.rem_euclid(TICKS_PER_WEEK), self.unit)
    }

    #[inline]
    pub fn month_time(self) -> Self {
        Self::with_unit(self.ticks.rem_euclid(TICKS_PER_MONTH), self.unit)
    }

    #[inline]
    pub fn year_time(self) -> Self {
        Self::with_unit(self.ticks.rem_euclid(TICKS_PER_YEAR), self.unit)
    }

    /// Day 7 of the week (tick 0 being a Monday).
    #[inline]
    pub fn is_sunday(self) -> bool {
        self.week_time().ticks >= 6 * TICKS_PER_DAY
    }

    /// Whether the time of day lies in `[min, max]`.  When `min >= max` the
    /// interval wraps over midnight.
    pub fn in_day_time_interval(self, min: SimTime, max: SimTime) -> bool {
        let d = self.day_time();
        if min >= max {
            d >= min || d <= max
        } else {
            min <= d && d <= max
        }
    }

    /// Forward distance from the time of day of `from` to the time of day of
    /// `to`, in `[0, 1 day)`.
    pub fn day_time_offset(from: SimTime, to: SimTime) -> SimTime {
        let ticks = (to.day_time().ticks - from.day_time().ticks).rem_euclid(TICKS_PER_DAY);
        Self::with_unit(ticks, to.unit)
    }

    /// Next instant at or after `self` whose time of day is `day_time`.
    ///
    /// With `allow_current == false` the result is strictly after `self`.
    pub fn next_day_time(self, day_time: SimTime, allow_current: bool) -> Self {
        self.next_residue(day_time.ticks, TICKS_PER_DAY, allow_current)
    }

    /// Next instant at or after `self` that is `anchor` into the week, where
    /// an anchor of one day means Monday 00:00 (the start of day 1).
    pub fn next_week_time(self, anchor: SimTime, allow_current: bool) -> Self {
        self.next_residue(anchor.ticks.saturating_sub(TICKS_PER_DAY), TICKS_PER_WEEK, allow_current)
    }

    /// Next instant at or after `self` that is `anchor` into the month, where
    /// an anchor of three days means the start of day 3.
    pub fn next_month_time(self, anchor: SimTime, allow_current: bool) -> Self {
        self.next_residue(anchor.ticks.saturating_sub(TICKS_PER_DAY), TICKS_PER_MONTH, allow_current)
    }

    fn next_residue(self, anchor: i64, period: i64, allow_current: bool) -> Self {
        let my = if allow_current { self.ticks } else { self.ticks.saturating_add(1) };
        let current = my.rem_euclid(period);
        let anchor = anchor.rem_euclid(period);
        let base = my.saturating_sub(current).saturating_add(anchor);
        let ticks = if anchor >= current { base } else { base.saturating_add(period) };
        Self::with_unit(ticks, self.unit)
    }

    // ── Formatting ───────────────────────────────────────────────────────

    /// Compact clock form: `1d 02:03:04`, or `02:03:04` under a day.
    pub fn to_ui_string(self) -> String {
        let sign = if self.ticks < 0 { "-" } else { "" };
        let t = self.ticks.unsigned_abs();
        let secs = t / TICKS_PER_SECOND as u64;
        let (d, h, m, s) = (secs / 86_400, (secs % 86_400) / 3_600, (secs % 3_600) / 60, secs % 60);
        if d > 0 {
            format!("{sign}{d}d {h:02}:{m:02}:{s:02}")
        } else {
            format!("{sign}{h:02}:{m:02}:{s:02}")
        }
    }
}

impl PartialEq for SimTime {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ticks == other.ticks
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks.cmp(&other.ticks)
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ticks.hash(state);
    }
}

/// ISO 8601 duration, e.g. `P11DT18H56M32.288S` or `PT0S`.
impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ticks == 0 {
            return f.write_str("PT0S");
        }
        if self.ticks < 0 {
            f.write_str("-")?;
        }
        let t = self.ticks.unsigned_abs();
        let day = TICKS_PER_DAY as u64;
        let (days, rest) = (t / day, t % day);
        let hours = rest / TICKS_PER_HOUR as u64;
        let minutes = (rest % TICKS_PER_HOUR as u64) / TICKS_PER_MINUTE as u64;
        let millis = rest % TICKS_PER_MINUTE as u64;
        f.write_str("P")?;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if rest > 0 {
            f.write_str("T")?;
            if hours > 0 {
                write!(f, "{hours}H")?;
            }
            if minutes > 0 {
                write!(f, "{minutes}M")?;
            }
            if millis > 0 {
                let (s, ms) = (millis / 1_000, millis % 1_000);
                if ms == 0 {
                    write!(f, "{s}S")?;
                } else {
                    let frac = format!("{ms:03}");
                    write!(f, "{s}.{}S", frac.trim_end_matches('0'))?;
                }
            }
        }
        Ok(())
    }
}

// ── Arithmetic ───────────────────────────────────────────────────────────────

impl Add for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime::with_unit(self.ticks.saturating_add(rhs.ticks), self.unit)
    }
}

impl Sub for SimTime {
    type Output = SimTime;
    #[inline]
    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime::with_unit(self.ticks.saturating_sub(rhs.ticks), self.unit)
    }
}

impl AddAssign for SimTime {
    #[inline]
    fn add_assign(&mut self, rhs: SimTime) {
        *self = *self + rhs;
    }
}

impl SubAssign for SimTime {
    #[inline]
    fn sub_assign(&mut self, rhs: SimTime) {
        *self = *self - rhs;
    }
}

impl Neg for SimTime {
    type Output = SimTime;
    #[inline]
    fn neg(self) -> SimTime {
        SimTime::with_unit(self.ticks.saturating_neg(), self.unit)
    }
}

impl Mul<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn mul(self, rhs: f64) -> SimTime {
        SimTime::with_unit((self.ticks as f64 * rhs).round() as i64, self.unit)
    }
}

impl Div<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn div(self, rhs: f64) -> SimTime {
        SimTime::with_unit((self.ticks as f64 / rhs).round() as i64, self.unit)
    }
}

impl Div<i64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn div(self, rhs: i64) -> SimTime {
        SimTime::with_unit(self.ticks / rhs, self.unit)
    }
}
