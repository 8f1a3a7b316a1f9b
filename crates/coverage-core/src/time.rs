use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// A FHIR `date` (or the calendar date of a `dateTime`).
///
/// The original text is kept so that encoding a decoded resource reproduces
/// the input exactly; comparisons use the calendar date only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FhirDate {
    raw: String,
    date: Date,
}

impl FhirDate {
    pub fn new(date: Date) -> Self {
        Self {
            raw: format_date(date),
            date,
        }
    }

    /// Parses a strict `YYYY-MM-DD` date.
    pub fn parse_date(s: &str) -> Result<Self> {
        let date = Date::parse(s, format_description!("[year]-[month]-[day]")).map_err(|e| {
            CoreError::malformed_input(format!("Failed to parse FHIR date '{s}': {e}"))
        })?;
        Ok(Self {
            raw: s.to_string(),
            date,
        })
    }

    /// Parses a `YYYY-MM-DD` date or an RFC 3339 date-time.
    ///
    /// A date-time contributes its calendar date in its own offset.
    pub fn parse_date_or_datetime(s: &str) -> Result<Self> {
        if s.contains(['T', 't']) {
            let datetime = OffsetDateTime::parse(s, &Rfc3339).map_err(|e| {
                CoreError::malformed_input(format!("Failed to parse FHIR dateTime '{s}': {e}"))
            })?;
            return Ok(Self {
                raw: s.to_string(),
                date: datetime.date(),
            });
        }
        Self::parse_date(s)
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Today's calendar date in UTC.
///
/// Only for process boundaries (CLI); business logic takes the date as input.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

impl fmt::Display for FhirDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for FhirDate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        FhirDate::parse_date_or_datetime(s)
    }
}

impl From<Date> for FhirDate {
    fn from(date: Date) -> Self {
        FhirDate::new(date)
    }
}

impl Serialize for FhirDate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for FhirDate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FhirDate::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_parse_plain_date() {
        let d = FhirDate::parse_date("2024-06-15").unwrap();
        assert_eq!(d.date(), date!(2024 - 06 - 15));
        assert_eq!(d.to_string(), "2024-06-15");
    }

    #[test]
    fn test_parse_datetime_keeps_raw_text() {
        let d = FhirDate::parse_date_or_datetime("2024-06-15T23:30:00-05:00").unwrap();
        assert_eq!(d.date(), date!(2024 - 06 - 15));
        assert_eq!(d.as_str(), "2024-06-15T23:30:00-05:00");
    }

    #[test]
    fn test_parse_datetime_with_lowercase_separator() {
        let d = FhirDate::parse_date_or_datetime("2024-06-15t10:00:00Z").unwrap();
        assert_eq!(d.date(), date!(2024 - 06 - 15));
        assert_eq!(d.as_str(), "2024-06-15t10:00:00Z");
    }

    #[test]
    fn test_strict_date_rejects_datetime_and_partials() {
        assert!(FhirDate::parse_date("2024-06-15T00:00:00Z").is_err());
        assert!(FhirDate::parse_date("2024-06").is_err());
        assert!(FhirDate::parse_date("2024").is_err());
        assert!(FhirDate::parse_date("2024-02-30").is_err());
        assert!(FhirDate::parse_date("").is_err());
    }

    #[test]
    fn test_new_formats_date() {
        let d = FhirDate::new(date!(2025 - 01 - 01));
        assert_eq!(d.as_str(), "2025-01-01");
        assert_eq!(format_date(date!(2024 - 12 - 31)), "2024-12-31");
    }

    #[test]
    fn test_serde_uses_raw_text() {
        let d: FhirDate = serde_json::from_str("\"2024-01-01\"").unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2024-01-01\"");
        assert!(serde_json::from_str::<FhirDate>("\"not a date\"").is_err());
    }
}
