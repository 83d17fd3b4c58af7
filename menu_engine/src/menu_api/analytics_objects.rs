use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{db_types::Money, traits::AnalyticsError};

/// Start and end hour (local clock) of the first shift.
pub const SHIFT1_HOURS: (u32, u32) = (6, 14);
/// Start and end hour (local clock) of the second shift.
pub const SHIFT2_HOURS: (u32, u32) = (14, 22);
pub const TOP_PRODUCTS_LIMIT: u32 = 5;

//--------------------------------------    AnalyticsPeriod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsPeriod {
    Today,
    /// The last 7 days, counted from local midnight
    Week,
    /// The last 30 days, counted from local midnight
    Month,
    /// The last 365 days, counted from local midnight
    Year,
    /// Today, 06:00 to 14:00 local time
    Shift1,
    /// Today, 14:00 to 22:00 local time
    Shift2,
}

impl AnalyticsPeriod {
    pub fn is_shift(&self) -> bool {
        matches!(self, Self::Shift1 | Self::Shift2)
    }
}

impl Display for AnalyticsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Shift1 => "shift1",
            Self::Shift2 => "shift2",
        };
        f.write_str(s)
    }
}

impl FromStr for AnalyticsPeriod {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "shift1" => Ok(Self::Shift1),
            "shift2" => Ok(Self::Shift2),
            s => Err(AnalyticsError::InvalidPeriod(s.to_string())),
        }
    }
}

//--------------------------------------       DateBound       ---------------------------------------------------------
/// One end of an explicit date range. A bare date covers the whole (local) day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

impl FromStr for DateBound {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::Date(d));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|t| Self::Instant(t.with_timezone(&Utc)))
            .map_err(|_| AnalyticsError::InvalidDateRange(format!("'{s}' is not a YYYY-MM-DD date or RFC 3339 time")))
    }
}

//--------------------------------------     AnalyticsQuery    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsQuery {
    AllTime,
    Period(AnalyticsPeriod),
    /// Both bounds are inclusive.
    Range { start: DateBound, end: DateBound },
}

impl AnalyticsQuery {
    /// Builds a query from the raw request parameters. An explicit date range takes precedence over a named period,
    /// and needs both bounds.
    pub fn from_params(
        period: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, AnalyticsError> {
        match (non_empty(start_date), non_empty(end_date)) {
            (Some(start), Some(end)) => Ok(Self::Range { start: start.parse()?, end: end.parse()? }),
            (Some(_), None) | (None, Some(_)) => {
                Err(AnalyticsError::InvalidDateRange("both start_date and end_date are required".to_string()))
            },
            (None, None) => match non_empty(period) {
                Some(p) => Ok(Self::Period(p.parse()?)),
                None => Ok(Self::AllTime),
            },
        }
    }

    pub fn period(&self) -> Option<AnalyticsPeriod> {
        match self {
            Self::Period(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_shift(&self) -> bool {
        self.period().map(|p| p.is_shift()).unwrap_or(false)
    }

    /// Resolves the query into a concrete window, using `now` for "today" and for the local clock.
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Option<TimeWindow>, AnalyticsError> {
        let tz = now.timezone();
        let today = now.date_naive();
        let midnight = local_time(&tz, today, 0);
        let window = match self {
            Self::AllTime => None,
            Self::Period(AnalyticsPeriod::Today) => {
                Some(TimeWindow::between(midnight, local_time(&tz, today + Duration::days(1), 0)))
            },
            Self::Period(AnalyticsPeriod::Week) => Some(TimeWindow::since(midnight - Duration::days(7))),
            Self::Period(AnalyticsPeriod::Month) => Some(TimeWindow::since(midnight - Duration::days(30))),
            Self::Period(AnalyticsPeriod::Year) => Some(TimeWindow::since(midnight - Duration::days(365))),
            Self::Period(AnalyticsPeriod::Shift1) => {
                let (from, to) = SHIFT1_HOURS;
                Some(TimeWindow::between(local_time(&tz, today, from), local_time(&tz, today, to)))
            },
            Self::Period(AnalyticsPeriod::Shift2) => {
                let (from, to) = SHIFT2_HOURS;
                Some(TimeWindow::between(local_time(&tz, today, from), local_time(&tz, today, to)))
            },
            Self::Range { start, end } => {
                let start = match start {
                    DateBound::Date(d) => local_time(&tz, *d, 0),
                    DateBound::Instant(t) => *t,
                };
                let end = match end {
                    DateBound::Date(d) => local_time(&tz, *d + Duration::days(1), 0),
                    DateBound::Instant(t) => *t + Duration::nanoseconds(1),
                };
                if end <= start {
                    return Err(AnalyticsError::InvalidDateRange("start_date is after end_date".to_string()));
                }
                Some(TimeWindow::between(start, end))
            },
        };
        Ok(window)
    }
}

/// Today's local midnight for the clock `now`, as a UTC instant.
pub fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    local_time(&now.timezone(), now.date_naive(), 0)
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// The instant at which the local clock reads `hour:00` on `date`. When a DST jump skips that time, the wall-clock
/// value is read as UTC instead.
fn local_time<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::default()) + Duration::hours(i64::from(hour));
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

//--------------------------------------       TimeWindow      ---------------------------------------------------------
/// A half-open range `[start, end)` on order creation time. An `end` of `None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end: Some(end) }
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        *t >= self.start && self.end.map(|e| *t < e).unwrap_or(true)
    }
}

//--------------------------------------     Report objects    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub total_orders: i64,
    pub total_revenue: Money,
    pub avg_order_value: Money,
    pub cash_orders: i64,
    pub card_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_name: String,
    pub total_quantity: i64,
    pub order_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAverages {
    pub overall_avg: Money,
    pub weekly_avg: Money,
    pub monthly_avg: Money,
}

/// The analytics response. `top_products` is only present for owners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub period: Option<AnalyticsPeriod>,
    pub statistics: OrderStatistics,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub top_products: Option<Vec<TopProduct>>,
}
