use std::fmt;

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use serde::Deserialize;

/// Longest title the admin form accepts.
pub const TITLE_MAX_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Field values for a record that does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl NewTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Timestamps go to SQLite as fixed-width UTC text so that string
/// comparison orders them chronologically.
pub fn to_storage(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_storage(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Value for an `<input type="datetime-local" step="1">`, down to the second.
pub fn to_form_value(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognised date-time {0:?}")]
pub struct DueDateError(pub String);

/// Parses a submitted due date. Blank input means "no due date".
/// Values without an offset are taken as UTC.
pub fn parse_due_date(input: &str) -> Result<Option<DateTime<Utc>>, DueDateError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Some(Utc.from_utc_datetime(&naive)));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(Utc.from_utc_datetime(&naive)));
    }
    Err(DueDateError(input.to_string()))
}

/// Date range filters offered by the admin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    PastSevenDays,
    ThisMonth,
    ThisYear,
    NoDate,
    HasDate,
}

impl DateFilter {
    pub const RANGES: [DateFilter; 4] = [
        DateFilter::Today,
        DateFilter::PastSevenDays,
        DateFilter::ThisMonth,
        DateFilter::ThisYear,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(Self::Today),
            "past_7_days" => Some(Self::PastSevenDays),
            "this_month" => Some(Self::ThisMonth),
            "this_year" => Some(Self::ThisYear),
            "no_date" => Some(Self::NoDate),
            "has_date" => Some(Self::HasDate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::PastSevenDays => "past_7_days",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
            Self::NoDate => "no_date",
            Self::HasDate => "has_date",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::PastSevenDays => "Past 7 days",
            Self::ThisMonth => "This month",
            Self::ThisYear => "This year",
            Self::NoDate => "No date",
            Self::HasDate => "Has date",
        }
    }

    /// Half-open `[start, end)` window relative to `now`, or `None` for the
    /// null checks.
    pub fn range(self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let midnight =
            |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
        let tomorrow = today.succ_opt()?;
        let (start, end) = match self {
            Self::Today => (today, tomorrow),
            Self::PastSevenDays => (today - Duration::days(7), tomorrow),
            Self::ThisMonth => {
                let first = today.with_day(1)?;
                let next = if first.month() == 12 {
                    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
                };
                (first, next)
            }
            Self::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
            ),
            Self::NoDate | Self::HasDate => return None,
        };
        Some((midnight(start)?, midnight(end)?))
    }
}

/// Admin list query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminQuery {
    pub q: Option<String>,
    pub is_resolved: Option<String>,
    pub due_date: Option<String>,
    pub created_at: Option<String>,
}

/// Parsed search and filter criteria for the admin list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFilter {
    pub terms: Vec<String>,
    pub is_resolved: Option<bool>,
    pub due_date: Option<DateFilter>,
    pub created_at: Option<DateFilter>,
}

impl TodoFilter {
    /// Unknown filter values are dropped rather than rejected.
    pub fn from_query(query: &AdminQuery) -> Self {
        let terms = query
            .q
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let is_resolved = match query.is_resolved.as_deref() {
            Some("yes") => Some(true),
            Some("no") => Some(false),
            _ => None,
        };
        let due_date = query.due_date.as_deref().and_then(DateFilter::parse);
        // created_at is never null, so the null checks do not apply
        let created_at = query
            .created_at
            .as_deref()
            .and_then(DateFilter::parse)
            .filter(|f| !matches!(f, DateFilter::NoDate | DateFilter::HasDate));
        Self {
            terms,
            is_resolved,
            due_date,
            created_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
