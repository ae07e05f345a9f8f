//! Academic period resolution and semester-transition detection.
//!
//! Auto-progression must never crash a request path: a missing or malformed
//! start-date entry always resolves to "no transition".

use crate::models::{AcademicPeriod, AcademicSettings, Semester};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;

/// Configured start dates carry no time component; they take effect at
/// midnight UTC.
fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// The period the settings currently point at.
pub fn current_period(settings: &AcademicSettings) -> AcademicPeriod {
    AcademicPeriod {
        academic_year: settings.current_academic_year.clone(),
        semester: settings.current_semester,
    }
}

/// Next academic year label: `"2025/26"` becomes `"2026/27"`.
pub fn next_academic_year(academic_year: &str) -> Option<String> {
    let (start, _) = academic_year.split_once('/')?;
    let start: i32 = start.trim().parse().ok()?;
    let next_start = start + 1;
    let next_end = (next_start + 1).rem_euclid(100);
    Some(format!("{}/{:02}", next_start, next_end))
}

/// A pending semester transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterTransition {
    pub new_semester: Semester,
    pub new_academic_year: String,
}

/// Check whether the academic calendar should advance at `now`.
///
/// From semester 1, reaching the configured semester-2 start date of the
/// current year transitions within the year. Otherwise, reaching the
/// semester-1 start date of the next academic year rolls the year over.
pub fn should_transition(
    settings: &AcademicSettings,
    now: DateTime<Utc>,
) -> Option<SemesterTransition> {
    if settings.current_semester == Semester::First {
        let semester2_start = settings
            .semester_start_dates
            .get(&settings.current_academic_year)
            .and_then(|dates| dates.semester2);
        if let Some(start) = semester2_start {
            if now >= start_of_day_utc(start) {
                debug!(
                    academic_year = %settings.current_academic_year,
                    "semester 2 start date reached"
                );
                return Some(SemesterTransition {
                    new_semester: Semester::Second,
                    new_academic_year: settings.current_academic_year.clone(),
                });
            }
        }
    }

    let next_year = next_academic_year(&settings.current_academic_year)?;
    let semester1_start = settings
        .semester_start_dates
        .get(&next_year)
        .and_then(|dates| dates.semester1)?;
    if now >= start_of_day_utc(semester1_start) {
        debug!(academic_year = %next_year, "next academic year start date reached");
        return Some(SemesterTransition {
            new_semester: Semester::First,
            new_academic_year: next_year,
        });
    }

    None
}
