use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::{ClientError, ClientResult};

/// Calendar month used as the fallback cycle when income history is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FocusMonth {
    first_day: NaiveDate,
}

impl FocusMonth {
    pub fn containing(date: NaiveDate) -> Self {
        let first_day = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
        Self { first_day }
    }

    /// Parses `YYYY-MM`.
    pub fn parse(value: &str, command: Option<&str>) -> ClientResult<Self> {
        let invalid = || {
            ClientError::invalid_argument_for_command(
                "`month` must use YYYY-MM format with a real calendar month.",
                command,
            )
        };
        let bytes = value.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        for index in [0usize, 1, 2, 3, 5, 6] {
            if !bytes[index].is_ascii_digit() {
                return Err(invalid());
            }
        }
        let year = value[0..4].parse::<i32>().map_err(|_| invalid())?;
        let month = value[5..7].parse::<u32>().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(invalid)
    }

    pub fn first_day(self) -> NaiveDate {
        self.first_day
    }

    pub fn days_in_month(self) -> i64 {
        self.first_day
            .checked_add_months(Months::new(1))
            .map_or(31, |next| days_between(self.first_day, next))
    }

    pub fn as_string(self) -> String {
        self.first_day.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub fn build_filter(
    from: Option<&str>,
    to: Option<&str>,
    command: &str,
) -> ClientResult<DateFilter> {
    let parsed_from = match from {
        Some(value) => Some(parse_iso_date_strict(value, "from", command)?),
        None => None,
    };
    let parsed_to = match to {
        Some(value) => Some(parse_iso_date_strict(value, "to", command)?),
        None => None,
    };

    if let (Some(start), Some(end)) = (parsed_from, parsed_to)
        && start > end
    {
        return Err(ClientError::invalid_argument_for_command(
            "Invalid date range: `from` must be on or before `to`.",
            Some(command),
        ));
    }

    Ok(DateFilter {
        from: parsed_from,
        to: parsed_to,
    })
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// `None` when the shift leaves chrono's calendar range.
pub fn checked_add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

/// Cycle-scale shifts; saturates at the calendar bounds.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    checked_add_days(date, days).unwrap_or(if days < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

/// Accepts RFC 3339 instants or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_occurred_at(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if looks_like_iso_date(trimmed) {
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

pub fn parse_iso_date_strict(value: &str, field_name: &str, command: &str) -> ClientResult<NaiveDate> {
    if !looks_like_iso_date(value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with valid calendar values."),
            Some(command),
        )
    })
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}
