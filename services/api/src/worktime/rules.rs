use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Europe::Berlin;

use stechuhr_db::work_rule::models::WorkTimeRule;

/// Continuous work beyond this forces a clock-out regardless of any rule.
pub const MAX_CONTINUOUS_HOURS: i64 = 12;

/// Nobody stays clocked in past this local wall-clock time.
pub fn hard_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(22, 0, 0).expect("valid time")
}

/// Local wall-clock time-of-day for a UTC instant. All rule comparisons
/// happen on this value; UTC instants themselves are never compared against
/// rule times.
pub fn berlin_time_of_day(at: DateTime<Utc>) -> NaiveTime {
    at.with_timezone(&Berlin).time()
}

/// True when an active rule forbids logging in this early in the local day.
pub fn too_early_for_login(rule: &WorkTimeRule, now: DateTime<Utc>) -> bool {
    rule.is_active && berlin_time_of_day(now) < rule.earliest_login_time
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoClockOutReason {
    /// The user's active rule says the workday is over.
    RuleWindow(NaiveTime),
    /// Continuous work exceeded the 12-hour limit.
    MaxContinuousWork,
    /// Local time passed the 22:00 hard cutoff.
    HardCutoff,
}

impl AutoClockOutReason {
    pub fn message_for(&self, user_name: &str) -> String {
        match self {
            Self::RuleWindow(latest) => format!(
                "{user_name} wurde automatisch um {} Uhr ausgestempelt (Arbeitszeitregel).",
                latest.format("%H:%M")
            ),
            Self::MaxContinuousWork => format!(
                "{user_name} wurde nach {MAX_CONTINUOUS_HOURS} Stunden durchgehender Arbeitszeit automatisch ausgestempelt."
            ),
            Self::HardCutoff => {
                format!("{user_name} wurde um 22:00 Uhr automatisch ausgestempelt.")
            }
        }
    }
}

/// Decide whether an open entry must be force-closed right now.
///
/// Checked in order: the user's active rule window, the continuous-work
/// limit, the 22:00 local hard cutoff. Returns `None` while the user may
/// keep working.
pub fn auto_clock_out_reason(
    rule: Option<&WorkTimeRule>,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<AutoClockOutReason> {
    if let Some(rule) = rule {
        if rule.is_active && berlin_time_of_day(now) >= rule.latest_logout_time {
            return Some(AutoClockOutReason::RuleWindow(rule.latest_logout_time));
        }
    }

    if now - started_at >= Duration::hours(MAX_CONTINUOUS_HOURS) {
        return Some(AutoClockOutReason::MaxContinuousWork);
    }

    if berlin_time_of_day(now) >= hard_cutoff() {
        return Some(AutoClockOutReason::HardCutoff);
    }

    None
}
