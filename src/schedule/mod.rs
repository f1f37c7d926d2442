pub mod clock;
pub mod cron;
pub mod zone;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Timelike, Utc};

use crate::errors::RunAfterError;

pub use clock::{Clock, FakeClock, SystemClock};
pub use cron::{CronFields, Field};
pub use zone::DisplayZone;

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const CUSTOM_SCHEDULE: &str = "on a custom schedule";

/// Human-readable recurrence of a cron expression, e.g. "every day at 3:00 AM UTC".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDescription {
    text: String,
    custom: bool,
}

impl ScheduleDescription {
    fn recognized(text: String) -> Self {
        Self {
            text,
            custom: false,
        }
    }

    fn custom() -> Self {
        Self {
            text: CUSTOM_SCHEDULE.to_string(),
            custom: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the expression is valid but has no short description.
    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

impl fmt::Display for ScheduleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Describes cron expressions in a fixed display zone.
///
/// Cron hours and minutes are UTC wall-clock values. They are shifted into
/// the display zone on the clock's current date, so zones with daylight
/// saving render the offset in effect today. A shift across midnight moves
/// the weekday or day-of-month along with it.
pub struct ScheduleFormatter {
    zone: DisplayZone,
    clock: Arc<dyn Clock>,
}

impl ScheduleFormatter {
    pub fn new(zone: DisplayZone) -> Self {
        Self::with_clock(zone, Arc::new(SystemClock))
    }

    pub fn with_clock(zone: DisplayZone, clock: Arc<dyn Clock>) -> Self {
        Self { zone, clock }
    }

    /// Describe `expr`. Returns `None` for blank or invalid expressions and
    /// never panics, whatever the input.
    pub fn describe(&self, expr: &str) -> Option<ScheduleDescription> {
        let fields = match CronFields::parse(expr) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!("No schedule description for '{}': {}", expr, e);
                return None;
            }
        };
        Some(
            self.describe_fields(&fields)
                .unwrap_or_else(ScheduleDescription::custom),
        )
    }

    fn describe_fields(&self, f: &CronFields) -> Option<ScheduleDescription> {
        if !matches!(f.seconds, None | Some(Field::Value(0))) || f.month != Field::Any {
            return None;
        }

        let text = match (f.minute, f.hour, f.day_of_month, f.day_of_week) {
            (Field::Any, Field::Any, Field::Any, Field::Any) => "every minute".to_string(),
            // Uneven steps restart at the top of the hour, so the gap is not n.
            (Field::Step(n), Field::Any, Field::Any, Field::Any) if 60 % n == 0 => {
                format!("every {} minutes", n)
            }
            (Field::Value(m), Field::Any, Field::Any, Field::Any) => {
                let (_, minute, _) = self.localize(0, m)?;
                if minute == 0 {
                    "every hour".to_string()
                } else {
                    format!("every hour at minute {}", minute)
                }
            }
            (Field::Value(m), Field::Step(n), Field::Any, Field::Any) if 24 % n == 0 => {
                let (_, minute, _) = self.localize(0, m)?;
                if minute == 0 {
                    format!("every {} hours", n)
                } else {
                    format!("every {} hours at minute {}", n, minute)
                }
            }
            (Field::Value(m), Field::Value(h), Field::Any, Field::Any) => {
                let (hour, minute, _) = self.localize(h, m)?;
                format!("every day at {}", self.time_of_day(hour, minute))
            }
            (Field::Value(m), Field::Value(h), Field::Any, Field::Value(d)) => {
                let (hour, minute, shift) = self.localize(h, m)?;
                let weekday = WEEKDAYS.get((i64::from(d) + shift).rem_euclid(7) as usize)?;
                format!("every {} at {}", weekday, self.time_of_day(hour, minute))
            }
            (Field::Value(m), Field::Value(h), Field::Value(d), Field::Any) => {
                let (hour, minute, shift) = self.localize(h, m)?;
                let day = i64::from(d) + shift;
                // Shifted off the end of the month: no faithful short form.
                if !(1..=31).contains(&day) {
                    return None;
                }
                format!(
                    "on day {} of every month at {}",
                    day,
                    self.time_of_day(hour, minute)
                )
            }
            _ => return None,
        };

        Some(ScheduleDescription::recognized(text))
    }

    /// Convert a UTC time of day into the display zone. Returns the local
    /// hour, minute and the day shift (-1, 0 or 1).
    fn localize(&self, hour: u32, minute: u32) -> Option<(u32, u32, i64)> {
        let date = self.clock.now().date_naive();
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        let local = self.zone.wall_clock(date.and_time(time).and_utc());
        let shift = local.date().signed_duration_since(date).num_days();
        Some((local.hour(), local.minute(), shift))
    }

    fn time_of_day(&self, hour: u32, minute: u32) -> String {
        let (display_hour, meridiem) = match hour {
            0 => (12, "AM"),
            1..=11 => (hour, "AM"),
            12 => (12, "PM"),
            _ => (hour - 12, "PM"),
        };
        let suffix = if self.zone.is_utc() { " UTC" } else { "" };
        format!("{}:{:02} {}{}", display_hour, minute, meridiem, suffix)
    }
}

/// Describe `expr` in UTC or in the system's local zone.
pub fn describe_schedule(expr: &str, use_local_time: bool) -> Option<ScheduleDescription> {
    let zone = if use_local_time {
        DisplayZone::Local
    } else {
        DisplayZone::Utc
    };
    ScheduleFormatter::new(zone).describe(expr)
}

/// The sentence shown under the job form's schedule field.
pub fn run_sentence(description: &ScheduleDescription, use_local_time: bool) -> String {
    format!(
        "This job will run {}{}.",
        description,
        if use_local_time { " locally" } else { "" }
    )
}

pub fn validate_cron(expr: &str) -> Result<(), RunAfterError> {
    CronFields::parse(expr).map(|_| ())
}

/// Next occurrence of `expr` strictly after `after`, at minute precision
/// (a leading seconds field is ignored). `None` when the expression is
/// invalid or never fires.
pub fn next_run(expr: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let fields = CronFields::parse(expr).ok()?;
    let cron = croner::Cron::from_str(fields.expression()).ok()?;
    match cron.find_next_occurrence(&after, false) {
        Ok(next) => Some(next),
        Err(e) => {
            tracing::debug!("No next occurrence for '{}': {}", expr, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn january() -> Arc<dyn Clock> {
        Arc::new(FakeClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        ))
    }

    fn utc() -> ScheduleFormatter {
        ScheduleFormatter::with_clock(DisplayZone::Utc, january())
    }

    fn offset(hours: i32, minutes: i32) -> ScheduleFormatter {
        let offset = FixedOffset::east_opt(hours * 3600 + minutes * 60).unwrap();
        ScheduleFormatter::with_clock(DisplayZone::Fixed(offset), january())
    }

    fn text(formatter: &ScheduleFormatter, expr: &str) -> String {
        formatter
            .describe(expr)
            .unwrap_or_else(|| panic!("'{}' should be described", expr))
            .text()
            .to_string()
    }

    #[test]
    fn test_blank_expression_is_absent() {
        assert!(describe_schedule("", false).is_none());
        assert!(describe_schedule("", true).is_none());
        assert!(describe_schedule("   ", false).is_none());
    }

    #[test]
    fn test_minute_patterns() {
        let f = utc();
        assert_eq!(text(&f, "* * * * *"), "every minute");
        assert_eq!(text(&f, "*/1 * * * *"), "every minute");
        assert_eq!(text(&f, "*/15 * * * *"), "every 15 minutes");
        assert_eq!(
            describe_schedule("*/15 * * * *", false).unwrap().text(),
            "every 15 minutes"
        );
    }

    #[test]
    fn test_hour_patterns() {
        let f = utc();
        assert_eq!(text(&f, "0 * * * *"), "every hour");
        assert_eq!(text(&f, "45 * * * *"), "every hour at minute 45");
        assert_eq!(text(&f, "0 */6 * * *"), "every 6 hours");
        assert_eq!(text(&f, "5 */2 * * *"), "every 2 hours at minute 5");
    }

    #[test]
    fn test_uneven_steps_are_custom() {
        let f = utc();
        for expr in ["*/45 * * * *", "*/7 * * * *", "0 */5 * * *", "30 */7 * * *"] {
            let desc = f.describe(expr).unwrap_or_else(|| panic!("{} valid", expr));
            assert!(desc.is_custom(), "{} should be custom", expr);
        }
        assert_eq!(text(&f, "*/20 * * * *"), "every 20 minutes");
        assert_eq!(text(&f, "0 */8 * * *"), "every 8 hours");
    }

    #[test]
    fn test_malformed_lists_are_absent() {
        for expr in [",,,, * * * *", "*/+5 * * * *", "0 1-,3 * * *"] {
            assert!(describe_schedule(expr, false).is_none(), "{} should be absent", expr);
            assert!(validate_cron(expr).is_err(), "{} should be invalid", expr);
            assert!(next_run(expr, Utc::now()).is_none());
        }
    }

    #[test]
    fn test_daily_in_utc() {
        assert_eq!(text(&utc(), "0 3 * * *"), "every day at 3:00 AM UTC");
        assert_eq!(text(&utc(), "30 15 * * *"), "every day at 3:30 PM UTC");
        assert_eq!(text(&utc(), "0 0 * * *"), "every day at 12:00 AM UTC");
        assert_eq!(text(&utc(), "5 12 * * *"), "every day at 12:05 PM UTC");
        assert_eq!(
            describe_schedule("0 3 * * *", false).unwrap().text(),
            "every day at 3:00 AM UTC"
        );
    }

    #[test]
    fn test_daily_in_local_offset() {
        assert_eq!(text(&offset(2, 0), "0 3 * * *"), "every day at 5:00 AM");
        assert_eq!(text(&offset(-5, 0), "0 3 * * *"), "every day at 10:00 PM");
        assert_eq!(text(&offset(5, 30), "0 3 * * *"), "every day at 8:30 AM");
    }

    #[test]
    fn test_daily_in_named_zone_follows_dst() {
        let zone = DisplayZone::Named(chrono_tz::America::New_York);
        let clock = Arc::new(FakeClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        ));
        let f = ScheduleFormatter::with_clock(zone, clock.clone());
        assert_eq!(text(&f, "0 12 * * *"), "every day at 7:00 AM");

        clock.set(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap());
        assert_eq!(text(&f, "0 12 * * *"), "every day at 8:00 AM");
    }

    #[test]
    fn test_half_hour_offset_moves_minutes() {
        let f = offset(5, 30);
        assert_eq!(text(&f, "30 * * * *"), "every hour");
        assert_eq!(text(&f, "0 * * * *"), "every hour at minute 30");
    }

    #[test]
    fn test_weekly() {
        assert_eq!(text(&utc(), "0 9 * * 1"), "every Monday at 9:00 AM UTC");
        assert_eq!(text(&utc(), "0 9 * * 7"), "every Sunday at 9:00 AM UTC");
        // Monday 03:00 UTC is Sunday evening at UTC-5.
        assert_eq!(text(&offset(-5, 0), "0 3 * * 1"), "every Sunday at 10:00 PM");
        // Saturday 23:30 UTC is Sunday morning at UTC+2.
        assert_eq!(text(&offset(2, 0), "30 23 * * 6"), "every Sunday at 1:30 AM");
    }

    #[test]
    fn test_monthly() {
        assert_eq!(
            text(&utc(), "0 12 15 * *"),
            "on day 15 of every month at 12:00 PM UTC"
        );
        assert_eq!(
            text(&offset(2, 0), "0 23 14 * *"),
            "on day 15 of every month at 1:00 AM"
        );
    }

    #[test]
    fn test_monthly_shift_out_of_range_is_custom() {
        let desc = offset(-5, 0).describe("0 1 1 * *").expect("describe");
        assert!(desc.is_custom());
        let desc = offset(2, 0).describe("0 23 31 * *").expect("describe");
        assert!(desc.is_custom());
    }

    #[test]
    fn test_six_field_expressions() {
        assert_eq!(text(&utc(), "0 0 3 * * *"), "every day at 3:00 AM UTC");
        assert!(utc().describe("30 0 3 * * *").unwrap().is_custom());
        assert!(utc().describe("* * * * * *").unwrap().is_custom());
    }

    #[test]
    fn test_macros() {
        assert_eq!(text(&utc(), "@daily"), "every day at 12:00 AM UTC");
        assert_eq!(text(&utc(), "@hourly"), "every hour");
        assert_eq!(text(&utc(), "@weekly"), "every Sunday at 12:00 AM UTC");
        assert!(utc().describe("@yearly").unwrap().is_custom());
        assert!(utc().describe("@never").is_none());
    }

    #[test]
    fn test_custom_fallback() {
        let f = utc();
        for expr in [
            "0 9 * * MON-FRI",
            "0 9 * 1 *",
            "0,30 * * * *",
            "0 9 1 * 1",
            "* 3 * * *",
            "*/5 3 * * *",
        ] {
            let desc = f.describe(expr).unwrap_or_else(|| panic!("{} valid", expr));
            assert!(desc.is_custom(), "{} should be custom", expr);
            assert_eq!(desc.text(), "on a custom schedule");
        }
    }

    #[test]
    fn test_case_and_whitespace_tolerant() {
        let f = utc();
        assert_eq!(text(&f, "  0   3 * * *  "), "every day at 3:00 AM UTC");
        assert_eq!(text(&f, "\t0 3 * * *\n"), "every day at 3:00 AM UTC");
        assert_eq!(
            f.describe("0 9 * * mon-fri"),
            f.describe("0 9 * * MON-FRI")
        );
    }

    #[test]
    fn test_invalid_expressions_are_absent() {
        let f = utc();
        for expr in [
            "not a cron",
            "* * * *",
            "0 0 3 * * * *",
            "60 * * * *",
            "0 24 * * *",
            "*/0 * * * *",
            "0 3 32 * *",
            "0 9 * * FOO",
        ] {
            assert!(f.describe(expr).is_none(), "{} should be absent", expr);
        }
    }

    #[test]
    fn test_never_panics_on_garbage() {
        let inputs = [
            "",
            "*",
            "/",
            "*/",
            "-1 * * * *",
            "1-",
            ",,,, * * * *",
            "０ ３ * * *",
            "@",
            "\u{0}",
            "💥 💥 💥 💥 💥",
            "4294967296 * * * *",
            "*/4294967296 * * * *",
        ];
        for input in inputs {
            let _ = describe_schedule(input, false);
            let _ = describe_schedule(input, true);
            let _ = next_run(input, Utc::now());
        }
    }

    #[test]
    fn test_local_time_has_no_utc_suffix() {
        let desc = describe_schedule("0 3 * * *", true).expect("describe");
        assert!(desc.text().starts_with("every day at "));
        assert!(!desc.text().ends_with("UTC"));
    }

    #[test]
    fn test_run_sentence() {
        let desc = utc().describe("0 3 * * *").unwrap();
        assert_eq!(
            run_sentence(&desc, false),
            "This job will run every day at 3:00 AM UTC."
        );
        let desc = offset(2, 0).describe("0 3 * * *").unwrap();
        assert_eq!(
            run_sentence(&desc, true),
            "This job will run every day at 5:00 AM locally."
        );
    }

    #[test]
    fn test_next_run() {
        let after = Utc.with_ymd_and_hms(2024, 1, 15, 12, 7, 0).unwrap();
        assert_eq!(
            next_run("0 3 * * *", after),
            Some(Utc.with_ymd_and_hms(2024, 1, 16, 3, 0, 0).unwrap())
        );
        assert_eq!(
            next_run("*/15 * * * *", after),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 12, 15, 0).unwrap())
        );
        assert!(next_run("not a cron", after).is_none());
        assert!(next_run("", after).is_none());
    }

    #[test]
    fn test_validate_cron() {
        assert!(validate_cron("0 3 * * *").is_ok());
        match validate_cron("bad cron").unwrap_err() {
            RunAfterError::Cron(_) => {}
            other => panic!("Expected Cron, got: {:?}", other),
        }
    }
}
