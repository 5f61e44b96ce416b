use chrono::{DateTime, SubsecRound, Utc};

/// Floors a timestamp to whole seconds, mapping `None` to `None`.
///
/// OpenPGP carries creation and expiration times with second resolution;
/// every comparison in the validation engine goes through this first.
pub fn normalize_date(date: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    date.map(|d| d.trunc_subsecs(0))
}

/// The current time, floored to whole seconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
