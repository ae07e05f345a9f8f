//! Booking portal window evaluation.
//!
//! Pure functions over the portal settings and a clock value. The portal is
//! open when it is enabled, not locked down, and the current instant lies
//! within the configured open/close bounds. Both bounds are optional
//! independently: an open bound with no close bound means "open forever once
//! reached"; no open bound with a close bound means "open until the deadline".

use crate::models::PortalSettings;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a configured window bound tolerantly.
///
/// Accepts epoch-millisecond digit strings, `YYYY-MM-DD`, `YYYY-MM-DD HH:mm`
/// (with or without seconds, space- or T-separated), and ISO 8601 with an
/// offset. Values without an offset are taken as UTC. An unparseable value is
/// logged and treated as absent; a malformed bound silently widening the
/// window is a configuration bug worth surfacing in the logs.
pub fn parse_window_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(millis) = raw.parse::<i64>() {
            if let Some(instant) = Utc.timestamp_millis_opt(millis).single() {
                return Some(instant);
            }
        }
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    warn!(
        value = raw,
        "unparseable booking portal timestamp, treating bound as absent"
    );
    None
}

/// Whether the booking portal is open at `now`. Both bounds are inclusive.
/// Fails safe: disabled or locked-down settings close the portal regardless
/// of the window.
pub fn is_open(settings: &PortalSettings, now: DateTime<Utc>) -> bool {
    if !settings.enabled || settings.emergency_lockdown {
        return false;
    }

    let open = settings.open_time.as_deref().and_then(parse_window_instant);
    let close = settings.close_time.as_deref().and_then(parse_window_instant);

    let reached_open = open.map_or(true, |t| now >= t);
    let before_close = close.map_or(true, |t| now <= t);
    reached_open && before_close
}
