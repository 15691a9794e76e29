use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::HostelId;
use crate::identity::UserId;

/// Counter fields tracked per listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Views,
    Contacts,
    Favorites,
    SearchAppearances,
}

/// All-time aggregate for one listing. Only ever moved by an in-place
/// increment, except favorites which is a derived recount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TotalCounters {
    pub views: u64,
    pub contacts: u64,
    pub favorites: u64,
    pub search_appearances: u64,
}

/// Daily aggregate, uniquely keyed by (listing, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounters {
    pub hostel: HostelId,
    pub date: NaiveDate,
    pub views: u64,
    pub contacts: u64,
    pub favorites: u64,
    pub search_appearances: u64,
}

impl DailyCounters {
    pub fn empty(hostel: HostelId, date: NaiveDate) -> Self {
        Self {
            hostel,
            date,
            views: 0,
            contacts: 0,
            favorites: 0,
            search_appearances: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPeriod {
    Weekly,
    Monthly,
}

impl SummaryPeriod {
    pub const fn label(self) -> &'static str {
        match self {
            SummaryPeriod::Weekly => "weekly",
            SummaryPeriod::Monthly => "monthly",
        }
    }

    /// Inclusive end of the reporting window starting at `start`.
    pub fn window_end(self, start: NaiveDate) -> NaiveDate {
        match self {
            SummaryPeriod::Weekly => start + Duration::days(6),
            SummaryPeriod::Monthly => month_end(start),
        }
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Periodic rollup of the daily counters, upserted by
/// (listing, period, start_date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSummary {
    pub hostel: HostelId,
    pub period: SummaryPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_views: u64,
    pub total_contacts: u64,
    pub total_favorites: u64,
    pub total_searches: u64,
    /// contacts / views * 100, defined as 0 when there are no views.
    pub conversion_rate: f64,
}

/// A student's saved listing, unique per (user, hostel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub user: UserId,
    pub hostel: HostelId,
    pub created_at: DateTime<Utc>,
}

/// Identifier wrapper for reviews.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ReviewId(pub u64);

/// A student's rating of a listing, unique per (user, hostel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user: UserId,
    pub hostel: HostelId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Whatsapp,
    Call,
    SearchClick,
}

/// A logged student interaction with a listing. Views and contacts feed the
/// analytics counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user: UserId,
    pub hostel: HostelId,
    pub kind: InteractionKind,
    pub safety_confirmed: bool,
    pub occurred_at: DateTime<Utc>,
}
