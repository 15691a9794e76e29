use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use crate::catalog::{HostelId, ListingStore};
use crate::error::{RepositoryError, StoreError, ValidationError};
use crate::identity::{
    require_hostel_owner, require_student, AuthorizationError, IdentityError, Principal,
};
use crate::search::{SearchEventSink, SearchRecord};

use super::domain::{
    DailyCounters, EngagementSummary, Favorite, Interaction, InteractionKind, Metric, Review,
    ReviewId, SummaryPeriod, TotalCounters,
};
use super::repository::{AnalyticsRepository, EngagementStore};

/// Error raised by the engagement services.
#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error("hostel not found")]
    HostelNotFound,
    #[error("listing is already in favorites")]
    DuplicateFavorite,
    #[error("favorite not found")]
    FavoriteNotFound,
    #[error("you have already reviewed this listing")]
    DuplicateReview,
    #[error("review not found")]
    ReviewNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdentityError> for EngagementError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Authorization(err) => Self::Authorization(err),
            IdentityError::Store(err) => Self::Store(err),
        }
    }
}

/// Counter aggregation: atomic daily/all-time increments, a derived
/// favorites recount, and periodic summary rollups.
pub struct AnalyticsService<A, E> {
    analytics: Arc<A>,
    engagement: Arc<E>,
}

impl<A, E> AnalyticsService<A, E>
where
    A: AnalyticsRepository + 'static,
    E: EngagementStore + 'static,
{
    pub fn new(analytics: Arc<A>, engagement: Arc<E>) -> Self {
        Self {
            analytics,
            engagement,
        }
    }

    pub fn record_view(&self, hostel: HostelId, on: NaiveDate) -> Result<(), StoreError> {
        self.analytics.increment_daily(hostel, on, Metric::Views)?;
        self.analytics.increment_total(hostel, Metric::Views)
    }

    pub fn record_contact(&self, hostel: HostelId, on: NaiveDate) -> Result<(), StoreError> {
        self.analytics
            .increment_daily(hostel, on, Metric::Contacts)?;
        self.analytics.increment_total(hostel, Metric::Contacts)
    }

    pub fn record_search_appearance(
        &self,
        hostel: HostelId,
        on: NaiveDate,
    ) -> Result<(), StoreError> {
        self.analytics
            .increment_daily(hostel, on, Metric::SearchAppearances)?;
        self.analytics
            .increment_total(hostel, Metric::SearchAppearances)
    }

    /// Favorite totals are recounted from the live relation rather than
    /// incremented, so removals can never leave the counter drifted.
    pub fn recompute_favorites_count(&self, hostel: HostelId) -> Result<u64, StoreError> {
        let count = self.engagement.favorites_count(hostel)?;
        self.analytics.set_total_favorites(hostel, count)?;
        Ok(count)
    }

    /// Daily favorites movement plus the all-time recount, used when a
    /// favorite is added.
    pub fn record_favorite(&self, hostel: HostelId, on: NaiveDate) -> Result<(), StoreError> {
        self.analytics
            .increment_daily(hostel, on, Metric::Favorites)?;
        self.recompute_favorites_count(hostel)?;
        Ok(())
    }

    /// Roll the daily counters up into a weekly or monthly summary. Re-running
    /// for the same (listing, period, start) overwrites the previous row.
    pub fn generate_summary(
        &self,
        hostel: HostelId,
        period: SummaryPeriod,
        start_date: NaiveDate,
    ) -> Result<EngagementSummary, StoreError> {
        let end_date = period.window_end(start_date);
        let rows = self.analytics.daily_between(hostel, start_date, end_date)?;

        let total_views: u64 = rows.iter().map(|row| row.views).sum();
        let total_contacts: u64 = rows.iter().map(|row| row.contacts).sum();
        let total_favorites: u64 = rows.iter().map(|row| row.favorites).sum();
        let total_searches: u64 = rows.iter().map(|row| row.search_appearances).sum();

        let conversion_rate = if total_views > 0 {
            total_contacts as f64 / total_views as f64 * 100.0
        } else {
            0.0
        };

        self.analytics.upsert_summary(EngagementSummary {
            hostel,
            period,
            start_date,
            end_date,
            total_views,
            total_contacts,
            total_favorites,
            total_searches,
            conversion_rate,
        })
    }

    pub fn totals(&self, hostel: HostelId) -> Result<TotalCounters, StoreError> {
        self.analytics.totals(hostel)
    }

    pub fn daily_between(
        &self,
        hostel: HostelId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyCounters>, StoreError> {
        self.analytics.daily_between(hostel, start, end)
    }
}

impl<A, E> SearchEventSink for AnalyticsService<A, E>
where
    A: AnalyticsRepository + 'static,
    E: EngagementStore + 'static,
{
    fn record_query(&self, record: &SearchRecord) -> Result<(), StoreError> {
        self.analytics.record_search(record.clone())
    }

    fn record_appearance(&self, hostel: HostelId, on: NaiveDate) -> Result<(), StoreError> {
        self.record_search_appearance(hostel, on)
    }
}

/// Reviews for one listing along with the recounted average rating.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewsView {
    pub average_rating: Option<f64>,
    pub reviews: Vec<Review>,
}

/// Owner dashboard snapshot: all-time totals plus the trailing week.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsOverview {
    pub totals: TotalCounters,
    pub last_seven_days: Vec<DailyCounters>,
}

static REVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_review_id() -> ReviewId {
    ReviewId(REVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Student-facing engagement: favorites, reviews, and interaction logs, with
/// their best-effort analytics side effects.
pub struct EngagementService<L, E, A> {
    listings: Arc<L>,
    store: Arc<E>,
    analytics: Arc<AnalyticsService<A, E>>,
}

impl<L, E, A> EngagementService<L, E, A>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
{
    pub fn new(listings: Arc<L>, store: Arc<E>, analytics: Arc<AnalyticsService<A, E>>) -> Self {
        Self {
            listings,
            store,
            analytics,
        }
    }

    fn require_hostel(&self, hostel: HostelId) -> Result<(), EngagementError> {
        self.listings
            .hostel(hostel)?
            .map(|_| ())
            .ok_or(EngagementError::HostelNotFound)
    }

    pub fn add_favorite(
        &self,
        principal: &Principal,
        hostel: HostelId,
        now: DateTime<Utc>,
    ) -> Result<Favorite, EngagementError> {
        require_student(principal)?;
        self.require_hostel(hostel)?;

        let favorite = Favorite {
            user: principal.id,
            hostel,
            created_at: now,
        };
        let stored = match self.store.insert_favorite(favorite) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(EngagementError::DuplicateFavorite),
            Err(other) => return Err(StoreError::from(other).into()),
        };

        if let Err(err) = self.analytics.record_favorite(hostel, now.date_naive()) {
            warn!(error = %err, hostel = hostel.0, "failed to record favorite counters");
        }
        Ok(stored)
    }

    pub fn remove_favorite(
        &self,
        principal: &Principal,
        hostel: HostelId,
    ) -> Result<(), EngagementError> {
        require_student(principal)?;
        match self.store.remove_favorite(principal.id, hostel) {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(EngagementError::FavoriteNotFound),
            Err(other) => return Err(StoreError::from(other).into()),
        }

        if let Err(err) = self.analytics.recompute_favorites_count(hostel) {
            warn!(error = %err, hostel = hostel.0, "failed to recount favorites");
        }
        Ok(())
    }

    pub fn favorites_for(&self, principal: &Principal) -> Result<Vec<Favorite>, EngagementError> {
        require_student(principal)?;
        Ok(self.store.favorites_for(principal.id)?)
    }

    pub fn add_review(
        &self,
        principal: &Principal,
        hostel: HostelId,
        rating: u8,
        comment: String,
        now: DateTime<Utc>,
    ) -> Result<Review, EngagementError> {
        require_student(principal)?;
        validate_review(rating, &comment)?;
        self.require_hostel(hostel)?;

        let review = Review {
            id: next_review_id(),
            user: principal.id,
            hostel,
            rating,
            comment,
            created_at: now,
        };
        match self.store.insert_review(review) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => Err(EngagementError::DuplicateReview),
            Err(other) => Err(StoreError::from(other).into()),
        }
    }

    pub fn update_review(
        &self,
        principal: &Principal,
        id: ReviewId,
        rating: u8,
        comment: String,
    ) -> Result<Review, EngagementError> {
        let mut review = self
            .store
            .review(id)?
            .ok_or(EngagementError::ReviewNotFound)?;
        if review.user != principal.id {
            return Err(AuthorizationError::NotRecordOwner.into());
        }
        validate_review(rating, &comment)?;

        review.rating = rating;
        review.comment = comment;
        match self.store.update_review(review.clone()) {
            Ok(()) => Ok(review),
            Err(RepositoryError::NotFound) => Err(EngagementError::ReviewNotFound),
            Err(other) => Err(StoreError::from(other).into()),
        }
    }

    pub fn delete_review(
        &self,
        principal: &Principal,
        id: ReviewId,
    ) -> Result<(), EngagementError> {
        let review = self
            .store
            .review(id)?
            .ok_or(EngagementError::ReviewNotFound)?;
        if review.user != principal.id {
            return Err(AuthorizationError::NotRecordOwner.into());
        }
        match self.store.remove_review(id) {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(EngagementError::ReviewNotFound),
            Err(other) => Err(StoreError::from(other).into()),
        }
    }

    /// Reviews plus an average recounted from the live rows, so deletions are
    /// reflected immediately.
    pub fn reviews_for(&self, hostel: HostelId) -> Result<ReviewsView, EngagementError> {
        self.require_hostel(hostel)?;
        let reviews = self.store.reviews_for(hostel)?;
        let average_rating = if reviews.is_empty() {
            None
        } else {
            let sum: u64 = reviews.iter().map(|review| review.rating as u64).sum();
            Some(sum as f64 / reviews.len() as f64)
        };
        Ok(ReviewsView {
            average_rating,
            reviews,
        })
    }

    /// Log an interaction and move the matching counters best-effort; the
    /// log entry itself is the primary operation.
    pub fn record_interaction(
        &self,
        principal: &Principal,
        hostel: HostelId,
        kind: InteractionKind,
        safety_confirmed: bool,
        now: DateTime<Utc>,
    ) -> Result<(), EngagementError> {
        require_student(principal)?;
        self.require_hostel(hostel)?;

        self.store.insert_interaction(Interaction {
            user: principal.id,
            hostel,
            kind,
            safety_confirmed,
            occurred_at: now,
        })?;

        let today = now.date_naive();
        let counter_result = match kind {
            InteractionKind::View => self.analytics.record_view(hostel, today),
            InteractionKind::Whatsapp | InteractionKind::Call => {
                self.analytics.record_contact(hostel, today)
            }
            InteractionKind::SearchClick => Ok(()),
        };
        if let Err(err) = counter_result {
            warn!(error = %err, hostel = hostel.0, "failed to record interaction counters");
        }
        Ok(())
    }

    /// Owner dashboard: totals plus the trailing seven days of counters.
    pub fn analytics_overview(
        &self,
        principal: &Principal,
        hostel: HostelId,
        today: NaiveDate,
    ) -> Result<AnalyticsOverview, EngagementError> {
        self.require_owner_or_reviewer(principal, hostel)?;
        let totals = self.analytics.totals(hostel)?;
        let last_seven_days =
            self.analytics
                .daily_between(hostel, today - Duration::days(6), today)?;
        Ok(AnalyticsOverview {
            totals,
            last_seven_days,
        })
    }

    /// Summary generation is an explicit on-demand report; failures propagate
    /// to the caller.
    pub fn generate_summary(
        &self,
        principal: &Principal,
        hostel: HostelId,
        period: SummaryPeriod,
        start_date: NaiveDate,
    ) -> Result<EngagementSummary, EngagementError> {
        self.require_owner_or_reviewer(principal, hostel)?;
        Ok(self.analytics.generate_summary(hostel, period, start_date)?)
    }

    fn require_owner_or_reviewer(
        &self,
        principal: &Principal,
        hostel: HostelId,
    ) -> Result<(), EngagementError> {
        let listing = self
            .listings
            .hostel(hostel)?
            .ok_or(EngagementError::HostelNotFound)?;
        if principal.reviewer {
            return Ok(());
        }
        require_hostel_owner(principal, listing.owner)?;
        Ok(())
    }
}

fn validate_review(rating: u8, comment: &str) -> Result<(), ValidationError> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::new(
            "rating",
            "rating must be between 1 and 5",
        ));
    }
    if comment.trim().is_empty() {
        return Err(ValidationError::new("comment", "comment must not be empty"));
    }
    Ok(())
}
