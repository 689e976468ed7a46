//! Calendar-date conversion between IANA zones.

use crate::model::item::ItemAnchor;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Longest wall-clock gap we step over when a local time does not exist.
/// Samoa skipped a whole calendar day in 2011.
const MAX_GAP_HOURS: i64 = 48;

/// Parses an IANA zone identifier, ignoring surrounding whitespace.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// Calendar date of `anchor` as seen from `target`.
///
/// A missing time means start of day in the anchor's own zone.
pub fn bucket_date(anchor: &ItemAnchor, target: Tz) -> NaiveDate {
    let local = anchor.date.and_time(anchor.time.unwrap_or(NaiveTime::MIN));
    resolve_local(anchor.timezone, local)
        .with_timezone(&target)
        .date_naive()
}

/// Maps a wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// gap (DST spring-forward) move forward to the first valid hour.
fn resolve_local(zone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    if let Some(resolved) = zone.from_local_datetime(&local).earliest() {
        return resolved.with_timezone(&Utc);
    }
    (1..=MAX_GAP_HOURS)
        .filter_map(|hours| local.checked_add_signed(Duration::hours(hours)))
        .find_map(|shifted| zone.from_local_datetime(&shifted).earliest())
        .map(|resolved| resolved.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}
