use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stored value meaning "no time limit".
pub const UNLIMITED_SENTINEL: u32 = 999;

/// Allowed per-question time limits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TimerDuration {
    Three,
    #[default]
    Five,
    Ten,
    Unlimited,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("timer duration must be 3, 5, 10 or unlimited, got {0}")]
pub struct TimerDurationError(pub String);

impl TimerDuration {
    pub const ALL: [TimerDuration; 4] = [
        TimerDuration::Three,
        TimerDuration::Five,
        TimerDuration::Ten,
        TimerDuration::Unlimited,
    ];

    pub fn seconds(self) -> Option<u32> {
        match self {
            TimerDuration::Three => Some(3),
            TimerDuration::Five => Some(5),
            TimerDuration::Ten => Some(10),
            TimerDuration::Unlimited => None,
        }
    }

    pub fn as_duration(self) -> Option<Duration> {
        self.seconds().map(|s| Duration::from_secs(u64::from(s)))
    }

    pub fn is_unlimited(self) -> bool {
        self == TimerDuration::Unlimited
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl TryFrom<u32> for TimerDuration {
    type Error = TimerDurationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(TimerDuration::Three),
            5 => Ok(TimerDuration::Five),
            10 => Ok(TimerDuration::Ten),
            UNLIMITED_SENTINEL => Ok(TimerDuration::Unlimited),
            other => Err(TimerDurationError(other.to_string())),
        }
    }
}

impl From<TimerDuration> for u32 {
    fn from(value: TimerDuration) -> Self {
        value.seconds().unwrap_or(UNLIMITED_SENTINEL)
    }
}

impl FromStr for TimerDuration {
    type Err = TimerDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unlimited") || s == "∞" {
            return Ok(TimerDuration::Unlimited);
        }
        let value: u32 = s.parse().map_err(|_| TimerDurationError(s.to_string()))?;
        TimerDuration::try_from(value)
    }
}

impl fmt::Display for TimerDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seconds() {
            Some(s) => write!(f, "{s}s"),
            None => f.write_str("unlimited"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Expired,
    /// Answered before the deadline.
    Stopped,
}

/// Single-shot countdown for one question, driven by explicit ticks.
#[derive(Clone, Debug)]
pub struct SessionTimer {
    phase: TimerPhase,
    duration: TimerDuration,
    remaining: Duration,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self {
            phase: TimerPhase::Idle,
            duration: TimerDuration::Five,
            remaining: Duration::ZERO,
        }
    }
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart from the full duration, whatever the current phase.
    pub fn start(&mut self, duration: TimerDuration) {
        self.duration = duration;
        self.remaining = duration.as_duration().unwrap_or(Duration::ZERO);
        self.phase = TimerPhase::Running;
    }

    /// Advance by `elapsed`. Returns `true` exactly once, on the tick that
    /// runs the countdown out. Unlimited timers never expire.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.phase != TimerPhase::Running || self.duration.is_unlimited() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.phase = TimerPhase::Expired;
            return true;
        }
        false
    }

    /// Cancel a running countdown. No-op in any other phase.
    pub fn stop(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Stopped;
        }
    }

    /// Return to `Idle`, e.g. when there is no question to time.
    pub fn clear(&mut self) {
        self.phase = TimerPhase::Idle;
        self.remaining = Duration::ZERO;
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// Fraction of time left in [0, 1]; always 1.0 when unlimited.
    pub fn progress(&self) -> f64 {
        match self.duration.as_duration() {
            Some(total) if !total.is_zero() => {
                (self.remaining.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 1.0,
        }
    }
}
