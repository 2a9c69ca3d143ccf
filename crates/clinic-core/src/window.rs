//! Query windows and the "now" they are anchored to.
//!
//! A consumer captures `now` once per query (through a [`Clock`]) and derives
//! every bound from that single value, so one logical query never straddles
//! two different "today"s.

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;

use crate::error::CoreError;
use crate::models::ScheduleConfig;

/// A closed time range `[lower, upper]` plus the instant it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub lower: NaiveDateTime,
    pub upper: NaiveDateTime,
    pub now: NaiveDateTime,
}

impl Window {
    /// Builds a window, rejecting `lower > upper`.
    pub fn new(
        lower: NaiveDateTime,
        upper: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<Self, CoreError> {
        let window = Self { lower, upper, now };
        window.validate()?;
        Ok(window)
    }

    /// Window of `days` days starting at `now`.
    pub fn days_from(now: NaiveDateTime, days: i64) -> Result<Self, CoreError> {
        let upper = now
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| CoreError::InvalidInput(format!("{} days from {} overflows", days, now)))?;
        Self::new(now, upper, now)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.lower > self.upper {
            return Err(CoreError::InvalidWindow {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.lower <= instant && instant <= self.upper
    }

    /// True when `other` lies entirely inside this window.
    pub fn covers(&self, other: &Window) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }
}

/// The standard views that consume schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleView {
    /// Portal home: the next week
    Dashboard,
    /// Full appointment / refill lists: the next quarter
    FullList,
}

/// Derives the standard windows from a captured `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    dashboard_days: i64,
    full_list_days: i64,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::from_config(&ScheduleConfig::default())
    }
}

impl WindowPolicy {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            dashboard_days: config.dashboard_days,
            full_list_days: config.full_list_days,
        }
    }

    pub fn dashboard_window(&self, now: NaiveDateTime) -> Result<Window, CoreError> {
        Window::days_from(now, self.dashboard_days)
    }

    pub fn full_list_window(&self, now: NaiveDateTime) -> Result<Window, CoreError> {
        Window::days_from(now, self.full_list_days)
    }

    pub fn window_for(&self, view: ScheduleView, now: NaiveDateTime) -> Result<Window, CoreError> {
        match view {
            ScheduleView::Dashboard => self.dashboard_window(now),
            ScheduleView::FullList => self.full_list_window(now),
        }
    }
}

/// `[now, now + 7 days]`
pub fn dashboard_window(now: NaiveDateTime) -> Result<Window, CoreError> {
    Window::days_from(now, 7)
}

/// `[now, now + 90 days]`
pub fn full_list_window(now: NaiveDateTime) -> Result<Window, CoreError> {
    Window::days_from(now, 90)
}

/// Source of the per-query "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in local naive time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(23, 59, 30)
            .unwrap()
    }

    #[test]
    fn test_dashboard_window_bounds() {
        let window = dashboard_window(now()).unwrap();
        assert_eq!(window.lower, now());
        assert_eq!(window.upper, now() + Duration::days(7));
        assert_eq!(window.now, now());
    }

    #[test]
    fn test_full_list_window_bounds() {
        let window = full_list_window(now()).unwrap();
        assert_eq!(window.lower, now());
        assert_eq!(window.upper, now() + Duration::days(90));
    }

    #[test]
    fn test_dashboard_nested_in_full_list() {
        let dashboard = dashboard_window(now()).unwrap();
        let full = full_list_window(now()).unwrap();
        assert!(full.covers(&dashboard));
        assert!(!dashboard.covers(&full));
    }

    #[test]
    fn test_policy_matches_free_functions_by_default() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.dashboard_window(now()).unwrap(), dashboard_window(now()).unwrap());
        assert_eq!(policy.full_list_window(now()).unwrap(), full_list_window(now()).unwrap());
        assert_eq!(
            policy.window_for(ScheduleView::FullList, now()).unwrap(),
            full_list_window(now()).unwrap()
        );
    }

    #[test]
    fn test_window_near_max_instant_is_an_error() {
        let late = NaiveDateTime::MAX - Duration::days(1);
        assert!(matches!(dashboard_window(late), Err(CoreError::InvalidInput(_))));
        assert!(matches!(full_list_window(late), Err(CoreError::InvalidInput(_))));
        assert!(matches!(
            WindowPolicy::default().dashboard_window(late),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_policy_rejects_negative_length() {
        let config = ScheduleConfig {
            dashboard_days: -1,
            ..ScheduleConfig::default()
        };
        let policy = WindowPolicy::from_config(&config);
        let result = policy.dashboard_window(now());
        assert!(matches!(result, Err(CoreError::InvalidWindow { .. })));
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        let result = Window::new(now(), now() - Duration::seconds(1), now());
        assert!(matches!(result, Err(CoreError::InvalidWindow { .. })));
    }

    #[test]
    fn test_zero_length_window_contains_its_instant() {
        let window = Window::new(now(), now(), now()).unwrap();
        assert!(window.contains(now()));
        assert!(!window.contains(now() + Duration::seconds(1)));
    }

    #[test]
    fn test_fixed_clock_is_stable() {
        let clock = FixedClock(now());
        assert_eq!(clock.now(), clock.now());
    }
}
