use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates. Use with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a timestamp written either in RFC 3339 or without an
/// offset, in which case it is taken as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Which end of a day a bare `YYYY-MM-DD` date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Like [`parse_timestamp`] but also accepts a bare date.
#[must_use]
pub fn parse_date_bound(value: &str, bound: DayBound) -> Option<DateTime<Utc>> {
    if let Some(timestamp) = parse_timestamp(value) {
        return Some(timestamp);
    }

    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    let time = match bound {
        DayBound::Start => NaiveTime::from_hms_opt(0, 0, 0)?,
        DayBound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?,
    };
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value).ok_or_else(|| {
        serde::de::Error::invalid_value(
            serde::de::Unexpected::Str(&value),
            &"an RFC 3339 or YYYY-MM-DDTHH:MM:SS timestamp",
        )
    })
}

pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "timestamp")] DateTime<Utc>);

    Option::<Wrapper>::deserialize(deserializer).map(|v| v.map(|Wrapper(inner)| inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets_and_naive_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T09:30:00-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T14:30"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn bare_dates_cover_the_whole_day() {
        let start = parse_date_bound("2024-03-01", DayBound::Start).unwrap();
        let end = parse_date_bound("2024-03-01", DayBound::End).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end.date_naive(), start.date_naive());
        assert!(end > Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap());
        assert_eq!(parse_date_bound("2024-13-01", DayBound::Start), None);
    }

    #[test]
    fn day_end_includes_sub_millisecond_timestamps() {
        let end = parse_date_bound("2024-03-01", DayBound::End).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_500);
        assert!(late <= end);
        assert!(end < Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn double_option_keeps_explicit_null() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            notas: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"notas":null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"notas":"x"}"#).unwrap();
        assert_eq!(absent.notas, None);
        assert_eq!(cleared.notas, Some(None));
        assert_eq!(set.notas, Some(Some("x".to_string())));
    }
}
