use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Trailing window used when explicit dates cannot be parsed.
pub const DEFAULT_WINDOW_DAYS: i64 = 180;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HalfYear {
    First,
    Second,
}

impl HalfYear {
    /// `"2"` selects the second half; anything else falls back to the first.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("2") => HalfYear::Second,
            _ => HalfYear::First,
        }
    }

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            HalfYear::First => 1,
            HalfYear::Second => 2,
        }
    }
}

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    #[must_use]
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        let start = Duration::try_days(days)
            .and_then(|window| today.checked_sub_signed(window))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, today)
    }

    /// `None` only for years chrono cannot represent.
    #[must_use]
    pub fn half_year(year: i32, half: HalfYear) -> Option<Self> {
        let (start, end) = match half {
            HalfYear::First => (
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year, 6, 30)?,
            ),
            HalfYear::Second => (
                NaiveDate::from_ymd_opt(year, 7, 1)?,
                NaiveDate::from_ymd_opt(year, 12, 31)?,
            ),
        };
        Some(Self { start, end })
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Half-open UTC bounds `[start 00:00, end + 1 day 00:00)` for timestamp columns.
    #[must_use]
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let lower = self.start.and_time(NaiveTime::MIN).and_utc();
        let upper = self
            .end
            .succ_opt()
            .map_or(DateTime::<Utc>::MAX_UTC, |next| {
                next.and_time(NaiveTime::MIN).and_utc()
            });
        (lower, upper)
    }

    /// Slug used in export file names, e.g. `2025-01-01_2025-06-30`.
    #[must_use]
    pub fn slug(&self) -> String {
        format!(
            "{}_{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Raw range selectors as they arrive on a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub desde: Option<String>,
    pub hasta: Option<String>,
    pub anio: Option<String>,
    pub semestre: Option<String>,
}

impl RangeQuery {
    fn explicit(&self) -> (Option<&str>, Option<&str>) {
        fn non_blank(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        (non_blank(&self.desde), non_blank(&self.hasta))
    }
}

/// `today - days`, saturating at the earliest representable date.
#[must_use]
pub fn days_before(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Calendar dates only; years outside `1..=9999` count as unparseable.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .filter(|d| (1..=9999).contains(&d.year()))
}

/// Resolve raw selectors into a concrete range.
///
/// Explicit `desde`/`hasta` win over `anio`/`semestre`. With only one
/// explicit bound the other side is filled in (`hasta` defaults to today,
/// `desde` to 180 days before `hasta`). Any explicit bound that fails to
/// parse yields the trailing 180-day window ending `today`. Without
/// explicit bounds, an unusable `anio` means the current year and an
/// unusable `semestre` means the first half.
#[must_use]
pub fn resolve_range(query: &RangeQuery, today: NaiveDate) -> DateRange {
    let trailing = DateRange::trailing(today, DEFAULT_WINDOW_DAYS);

    let (desde, hasta) = query.explicit();
    if desde.is_some() || hasta.is_some() {
        return match (desde.map(parse_date), hasta.map(parse_date)) {
            (Some(Some(from)), Some(Some(to))) => DateRange::new(from, to),
            (Some(Some(from)), None) => DateRange::new(from, today),
            (None, Some(Some(to))) => DateRange::trailing(to, DEFAULT_WINDOW_DAYS),
            _ => trailing,
        };
    }

    let year = query
        .anio
        .as_deref()
        .and_then(|y| y.trim().parse::<i32>().ok())
        .filter(|y| (1..=9999).contains(y))
        .unwrap_or_else(|| today.year());
    let half = HalfYear::parse_lenient(query.semestre.as_deref());

    DateRange::half_year(year, half).unwrap_or(trailing)
}
