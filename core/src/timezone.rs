use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

// The finder loads the embedded tz polygon table; build it once.
static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Resolve the timezone covering a coordinate pair. None when no
/// coordinates are available or the point maps to no known zone.
pub fn resolve_timezone(lat: Option<f64>, lon: Option<f64>) -> Option<Tz> {
    let (lat, lon) = (lat?, lon?);
    let name = FINDER.get_tz_name(lon, lat);
    if name.is_empty() {
        return None;
    }
    Tz::from_str(name).ok()
}

/// Shift a UTC instant to the session's local wall clock and drop the
/// offset, so downstream date arithmetic works on local values. Without
/// a resolved zone the session is treated as already being in UTC.
pub fn localize(ts: DateTime<Utc>, tz: Option<Tz>) -> NaiveDateTime {
    match tz {
        Some(tz) => ts.with_timezone(&tz).naive_local(),
        None => ts.naive_utc(),
    }
}
