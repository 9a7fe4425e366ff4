use chrono::{DateTime, Duration, Utc};

/// Minimum spacing between two real requests from the same entity.
pub const MIN_TIME_BETWEEN_UPDATES: Duration = Duration::minutes(45);

/// Wall-clock gate that lets a call through at most once per interval.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_call: Option<DateTime<Utc>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn last_call(&self) -> Option<DateTime<Utc>> {
        self.last_call
    }

    /// Returns `true` and records `now` if a call may proceed.
    ///
    /// A clock that went backwards counts as "too soon".
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> bool {
        let allowed = match self.last_call {
            None => true,
            Some(last) => now - last >= self.min_interval,
        };

        if allowed {
            self.last_call = Some(now);
        }
        allowed
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(MIN_TIME_BETWEEN_UPDATES)
    }
}
