//! Bounds on how far back a discovery `start` may reach
//!
//! A FIND with `activeafter` far in the past scans almost every series of
//! the token, one too close to now misses series that report infrequently.
//! Requested start times are therefore clamped into
//! `[now - max_lookback, now - min_lookback]`.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Fallback when `lookback_min` cannot be parsed
pub const DEFAULT_MIN_LOOKBACK: Duration = Duration::from_secs(24 * 60 * 60);

/// Fallback when `lookback_max` cannot be parsed
pub const DEFAULT_MAX_LOOKBACK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configured lookback bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub min: Duration,
    pub max: Duration,
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_LOOKBACK,
            max: DEFAULT_MAX_LOOKBACK,
        }
    }
}

impl LookbackWindow {
    /// Parse the configured bounds, falling back per bound on malformed input
    pub fn from_config(min: &str, max: &str) -> Self {
        Self {
            min: parse_or_default("lookback_min", min, DEFAULT_MIN_LOOKBACK),
            max: parse_or_default("lookback_max", max, DEFAULT_MAX_LOOKBACK),
        }
    }

    /// Clamp `requested` relative to `now`
    pub fn clamp(&self, requested: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        clamp(requested, now, self.min, self.max)
    }
}

fn parse_or_default(key: &str, value: &str, default: Duration) -> Duration {
    match humantime::parse_duration(value.trim()) {
        Ok(duration) => duration,
        Err(e) => {
            tracing::warn!(
                key,
                value,
                error = %e,
                default = %humantime::format_duration(default),
                "Failed to parse lookback duration, using default"
            );
            default
        }
    }
}

/// Clamp a requested start time into `[now - max_lookback, now - min_lookback]`
///
/// Below the window the lower bound is returned, above it the upper bound;
/// anything inside is returned unchanged.
pub fn clamp(
    requested: DateTime<Utc>,
    now: DateTime<Utc>,
    min_lookback: Duration,
    max_lookback: Duration,
) -> DateTime<Utc> {
    let lower_bound = lookback_from(now, max_lookback);
    let upper_bound = lookback_from(now, min_lookback);

    if requested < lower_bound {
        tracing::info!(%requested, adjusted = %lower_bound, "Adjusted start time to minimum allowed value");
        return lower_bound;
    }

    if requested > upper_bound {
        tracing::info!(%requested, adjusted = %upper_bound, "Adjusted start time to maximum allowed value");
        return upper_bound;
    }

    requested
}

fn lookback_from(now: DateTime<Utc>, lookback: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(lookback)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_clamp_too_old_to_max_lookback() {
        let t = now();
        let window = LookbackWindow::default();

        let clamped = window.clamp(t - TimeDelta::days(30), t);
        assert_eq!(clamped, t - TimeDelta::days(7));
    }

    #[test]
    fn test_clamp_too_recent_to_min_lookback() {
        let t = now();
        let window = LookbackWindow::default();

        let clamped = window.clamp(t - TimeDelta::hours(1), t);
        assert_eq!(clamped, t - TimeDelta::hours(24));
    }

    #[test]
    fn test_clamp_inside_window_unchanged() {
        let t = now();
        let requested = t - TimeDelta::days(3);

        assert_eq!(LookbackWindow::default().clamp(requested, t), requested);
    }

    #[test]
    fn test_clamp_bounds_are_inclusive() {
        let t = now();
        let window = LookbackWindow::default();

        let lower = t - TimeDelta::days(7);
        let upper = t - TimeDelta::hours(24);
        assert_eq!(window.clamp(lower, t), lower);
        assert_eq!(window.clamp(upper, t), upper);
    }

    #[test]
    fn test_clamp_future_start() {
        let t = now();
        assert_eq!(
            LookbackWindow::default().clamp(t + TimeDelta::days(1), t),
            t - TimeDelta::hours(24)
        );
    }

    #[test]
    fn test_from_config_parses_durations() {
        let window = LookbackWindow::from_config("1h", "2d");
        assert_eq!(window.min, Duration::from_secs(3600));
        assert_eq!(window.max, Duration::from_secs(2 * 24 * 3600));
    }

    #[test]
    fn test_from_config_falls_back_per_bound() {
        let window = LookbackWindow::from_config("soon", "3d");
        assert_eq!(window.min, DEFAULT_MIN_LOOKBACK);
        assert_eq!(window.max, Duration::from_secs(3 * 24 * 3600));

        let window = LookbackWindow::from_config("6h", "");
        assert_eq!(window.min, Duration::from_secs(6 * 3600));
        assert_eq!(window.max, DEFAULT_MAX_LOOKBACK);
    }
}
