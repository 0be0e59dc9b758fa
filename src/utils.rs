use crate::models::error::ModelError;
use crate::services::timetable::MINUTES_PER_DAY;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use std::fmt::Display;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parse an RFC 3339 reference instant.
///
/// Text that reads as a wall-clock time without a UTC offset is refused
/// with [`ModelError::Precondition`]: the engine only accepts instants.
pub fn parse_reference(text: &str) -> Result<DateTime<FixedOffset>, ModelError> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at);
    }
    if NAIVE_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
    {
        return Err(ModelError::Precondition(format!(
            "reference instant '{}' has no UTC offset",
            text
        )));
    }
    Err(ModelError::Data {
        path: "reference".to_string(),
        reason: format!("'{}' is not an RFC 3339 timestamp", text),
    })
}

/// Render a minutes-since-Monday offset as `Wed 12:00`.
pub fn format_m_offset(m_offset: i64) -> String {
    let day = m_offset.div_euclid(MINUTES_PER_DAY);
    let minute = m_offset.rem_euclid(MINUTES_PER_DAY);
    let name = WEEKDAYS[day.rem_euclid(7) as usize];
    let week = day.div_euclid(7);
    let clock = format!("{} {:02}:{:02}", name, minute / 60, minute % 60);
    match week {
        0 => clock,
        w => format!("{} (week {:+})", clock, w),
    }
}

/// Local wall-clock rendering with the zone abbreviation, e.g.
/// `Wed 2022-04-06 12:00 CEST`.
pub fn format_local<Z>(at: &DateTime<Z>) -> String
where
    Z: TimeZone,
    Z::Offset: Display,
{
    at.format("%a %Y-%m-%d %H:%M %Z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Europe::Vienna;

    #[test]
    fn parses_offset_instants() {
        let at = parse_reference("2022-04-06T12:00:00+02:00").unwrap();
        assert_eq!(at.with_timezone(&Utc), Utc.with_ymd_and_hms(2022, 4, 6, 10, 0, 0).unwrap());
        let at = parse_reference(" 2022-04-06T10:00:00Z ").unwrap();
        assert_eq!(at.offset().local_minus_utc(), 0);
    }

    #[test]
    fn naive_reference_is_a_precondition_error() {
        for text in ["2022-04-06T12:00:00", "2022-04-06 12:00", "2022-04-06T12:00:00.250"] {
            assert!(
                matches!(parse_reference(text), Err(ModelError::Precondition(_))),
                "accepted {}",
                text
            );
        }
        assert!(matches!(parse_reference("next tuesday"), Err(ModelError::Data { .. })));
    }

    #[test]
    fn formats_offsets() {
        assert_eq!(format_m_offset(0), "Mon 00:00");
        assert_eq!(format_m_offset(5040), "Thu 12:00");
        assert_eq!(format_m_offset(10079), "Sun 23:59");
        assert_eq!(format_m_offset(10080 + 420), "Mon 07:00 (week +1)");
        assert_eq!(format_m_offset(-60), "Sun 23:00 (week -1)");
    }

    #[test]
    fn formats_local_instants() {
        let at = Vienna.with_ymd_and_hms(2022, 4, 6, 12, 0, 0).unwrap();
        assert_eq!(format_local(&at), "Wed 2022-04-06 12:00 CEST");
        let at = Utc.with_ymd_and_hms(2022, 1, 3, 7, 5, 0).unwrap();
        assert_eq!(format_local(&at), "Mon 2022-01-03 07:05 UTC");
    }
}
