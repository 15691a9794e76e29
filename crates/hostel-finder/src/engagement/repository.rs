use chrono::NaiveDate;

use crate::catalog::HostelId;
use crate::error::{RepositoryError, StoreError};
use crate::identity::UserId;
use crate::search::SearchRecord;

use super::domain::{
    DailyCounters, EngagementSummary, Favorite, Interaction, Metric, Review, ReviewId,
    SummaryPeriod, TotalCounters,
};

/// Counter and summary storage.
///
/// Increment methods must apply the `+1` in place under the store's own
/// synchronization (an atomic UPDATE or equivalent); callers never
/// read-modify-write a counter.
pub trait AnalyticsRepository: Send + Sync {
    fn increment_daily(
        &self,
        hostel: HostelId,
        date: NaiveDate,
        metric: Metric,
    ) -> Result<(), StoreError>;
    fn increment_total(&self, hostel: HostelId, metric: Metric) -> Result<(), StoreError>;
    /// Overwrite the all-time favorites counter with a recount result.
    fn set_total_favorites(&self, hostel: HostelId, count: u64) -> Result<(), StoreError>;
    fn totals(&self, hostel: HostelId) -> Result<TotalCounters, StoreError>;
    fn daily_between(
        &self,
        hostel: HostelId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyCounters>, StoreError>;
    fn upsert_summary(&self, summary: EngagementSummary)
        -> Result<EngagementSummary, StoreError>;
    fn summary(
        &self,
        hostel: HostelId,
        period: SummaryPeriod,
        start: NaiveDate,
    ) -> Result<Option<EngagementSummary>, StoreError>;
    fn record_search(&self, record: SearchRecord) -> Result<(), StoreError>;
}

/// Favorites, reviews, and interaction logs.
pub trait EngagementStore: Send + Sync {
    /// Unique per (user, hostel); a duplicate is a `Conflict`.
    fn insert_favorite(&self, favorite: Favorite) -> Result<Favorite, RepositoryError>;
    fn remove_favorite(&self, user: UserId, hostel: HostelId) -> Result<(), RepositoryError>;
    fn favorites_for(&self, user: UserId) -> Result<Vec<Favorite>, StoreError>;
    fn favorites_count(&self, hostel: HostelId) -> Result<u64, StoreError>;

    /// Unique per (user, hostel); a duplicate is a `Conflict`.
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn update_review(&self, review: Review) -> Result<(), RepositoryError>;
    fn remove_review(&self, id: ReviewId) -> Result<(), RepositoryError>;
    fn review(&self, id: ReviewId) -> Result<Option<Review>, StoreError>;
    fn reviews_for(&self, hostel: HostelId) -> Result<Vec<Review>, StoreError>;

    fn insert_interaction(&self, interaction: Interaction) -> Result<(), StoreError>;
}
