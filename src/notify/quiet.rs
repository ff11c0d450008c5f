// src/notify/quiet.rs

//! Quiet-hours push policy.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};

/// Push window policy for a configured set of subscriber identities.
///
/// Excluded subscribers only receive pushes Monday through Friday between
/// 09:00 and 18:59 local time; weekends are fully excluded for them. All
/// other subscribers are unaffected by time.
#[derive(Debug, Clone, Default)]
pub struct QuietHours {
    excluded: HashSet<String>,
}

impl QuietHours {
    pub fn new(excluded_users: impl IntoIterator<Item = String>) -> Self {
        Self {
            excluded: excluded_users.into_iter().collect(),
        }
    }

    /// Whether `user_id` may receive a push at `now`.
    pub fn allows(&self, user_id: &str, now: &DateTime<Local>) -> bool {
        if !self.excluded.contains(user_id) {
            return true;
        }
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        (9..=18).contains(&now.hour())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(year, month, day, hour, 30, 0).unwrap()
    }

    fn policy() -> QuietHours {
        QuietHours::new(vec!["348170".to_string()])
    }

    #[test]
    fn test_excluded_user_blocked_on_saturday() {
        // 2025-08-23 is a Saturday.
        assert!(!policy().allows("348170", &at(2025, 8, 23, 12)));
    }

    #[test]
    fn test_excluded_user_blocked_early_weekday() {
        // 2025-08-20 is a Wednesday.
        assert!(!policy().allows("348170", &at(2025, 8, 20, 8)));
    }

    #[test]
    fn test_excluded_user_allowed_weekday_office_hours() {
        assert!(policy().allows("348170", &at(2025, 8, 20, 10)));
    }

    #[test]
    fn test_excluded_user_blocked_late_evening() {
        assert!(!policy().allows("348170", &at(2025, 8, 20, 21)));
    }

    #[test]
    fn test_other_users_unaffected_by_time() {
        assert!(policy().allows("999999", &at(2025, 8, 23, 3)));
    }
}
