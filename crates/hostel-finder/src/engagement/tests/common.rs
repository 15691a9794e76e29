use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::catalog::{
    City, CoordinateBounds, Hostel, HostelId, ListingStore, OwnerContact, Room, RoomId,
};
use crate::engagement::domain::{
    DailyCounters, EngagementSummary, Favorite, Interaction, Metric, Review, ReviewId,
    SummaryPeriod, TotalCounters,
};
use crate::engagement::repository::{AnalyticsRepository, EngagementStore};
use crate::engagement::service::{AnalyticsService, EngagementService};
use crate::error::{RepositoryError, StoreError};
use crate::identity::{Gender, Principal, Role, UserId};
use crate::search::SearchRecord;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 12, 9, 0, 0).unwrap()
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn student(id: u64) -> Principal {
    Principal {
        id: UserId(id),
        role: Role::Student,
        gender: Gender::Female,
        phone: "03007654321".to_string(),
        phone_verified: true,
        verified: false,
        reviewer: false,
    }
}

pub(super) fn owner(id: u64) -> Principal {
    Principal {
        id: UserId(id),
        role: Role::Owner,
        gender: Gender::Male,
        phone: "03001234567".to_string(),
        phone_verified: true,
        verified: true,
        reviewer: false,
    }
}

#[derive(Default)]
pub(super) struct StubListings {
    pub(super) hostels: Mutex<Vec<Hostel>>,
}

impl StubListings {
    pub(super) fn with_hostel(id: u64, owner_id: u64) -> Self {
        let hostel = Hostel {
            id: HostelId(id),
            owner: UserId(owner_id),
            name: format!("Hostel {id}"),
            city: City::Lahore,
            latitude: 31.5,
            longitude: 74.3,
            map_link: None,
            gender: Gender::Male,
            description: None,
            verified: false,
            created_at: now(),
        };
        Self {
            hostels: Mutex::new(vec![hostel]),
        }
    }
}

impl ListingStore for StubListings {
    fn insert_hostel(&self, hostel: Hostel) -> Result<Hostel, StoreError> {
        self.hostels
            .lock()
            .expect("hostel mutex poisoned")
            .push(hostel.clone());
        Ok(hostel)
    }

    fn update_hostel(&self, _hostel: Hostel) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn remove_hostel(&self, _id: HostelId) -> Result<Vec<RoomId>, RepositoryError> {
        Ok(Vec::new())
    }

    fn hostel(&self, id: HostelId) -> Result<Option<Hostel>, StoreError> {
        Ok(self
            .hostels
            .lock()
            .expect("hostel mutex poisoned")
            .iter()
            .find(|hostel| hostel.id == id)
            .cloned())
    }

    fn hostels(&self) -> Result<Vec<Hostel>, StoreError> {
        Ok(self.hostels.lock().expect("hostel mutex poisoned").clone())
    }

    fn hostels_within(&self, _bounds: &CoordinateBounds) -> Result<Vec<Hostel>, StoreError> {
        self.hostels()
    }

    fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        Ok(room)
    }

    fn update_room(&self, _room: Room) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn remove_room(&self, _id: RoomId) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn room(&self, _id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(None)
    }

    fn rooms_for(&self, _hostel: HostelId) -> Result<Vec<Room>, StoreError> {
        Ok(Vec::new())
    }

    fn owner_contact(&self, _id: UserId) -> Result<Option<OwnerContact>, StoreError> {
        Ok(None)
    }
}

#[derive(Default)]
pub(super) struct MemoryAnalytics {
    pub(super) daily: Mutex<HashMap<(HostelId, NaiveDate), DailyCounters>>,
    pub(super) totals: Mutex<HashMap<HostelId, TotalCounters>>,
    pub(super) summaries:
        Mutex<HashMap<(HostelId, SummaryPeriod, NaiveDate), EngagementSummary>>,
    pub(super) searches: Mutex<Vec<SearchRecord>>,
}

impl AnalyticsRepository for MemoryAnalytics {
    fn increment_daily(
        &self,
        hostel: HostelId,
        date: NaiveDate,
        metric: Metric,
    ) -> Result<(), StoreError> {
        let mut guard = self.daily.lock().expect("daily mutex poisoned");
        let row = guard
            .entry((hostel, date))
            .or_insert_with(|| DailyCounters::empty(hostel, date));
        match metric {
            Metric::Views => row.views += 1,
            Metric::Contacts => row.contacts += 1,
            Metric::Favorites => row.favorites += 1,
            Metric::SearchAppearances => row.search_appearances += 1,
        }
        Ok(())
    }

    fn increment_total(&self, hostel: HostelId, metric: Metric) -> Result<(), StoreError> {
        let mut guard = self.totals.lock().expect("totals mutex poisoned");
        let row = guard.entry(hostel).or_default();
        match metric {
            Metric::Views => row.views += 1,
            Metric::Contacts => row.contacts += 1,
            Metric::Favorites => row.favorites += 1,
            Metric::SearchAppearances => row.search_appearances += 1,
        }
        Ok(())
    }

    fn set_total_favorites(&self, hostel: HostelId, count: u64) -> Result<(), StoreError> {
        let mut guard = self.totals.lock().expect("totals mutex poisoned");
        guard.entry(hostel).or_default().favorites = count;
        Ok(())
    }

    fn totals(&self, hostel: HostelId) -> Result<TotalCounters, StoreError> {
        Ok(self
            .totals
            .lock()
            .expect("totals mutex poisoned")
            .get(&hostel)
            .copied()
            .unwrap_or_default())
    }

    fn daily_between(
        &self,
        hostel: HostelId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyCounters>, StoreError> {
        let guard = self.daily.lock().expect("daily mutex poisoned");
        let mut rows: Vec<DailyCounters> = guard
            .values()
            .filter(|row| row.hostel == hostel && row.date >= start && row.date <= end)
            .copied()
            .collect();
        rows.sort_by_key(|row| row.date);
        Ok(rows)
    }

    fn upsert_summary(
        &self,
        summary: EngagementSummary,
    ) -> Result<EngagementSummary, StoreError> {
        self.summaries
            .lock()
            .expect("summary mutex poisoned")
            .insert(
                (summary.hostel, summary.period, summary.start_date),
                summary.clone(),
            );
        Ok(summary)
    }

    fn summary(
        &self,
        hostel: HostelId,
        period: SummaryPeriod,
        start: NaiveDate,
    ) -> Result<Option<EngagementSummary>, StoreError> {
        Ok(self
            .summaries
            .lock()
            .expect("summary mutex poisoned")
            .get(&(hostel, period, start))
            .cloned())
    }

    fn record_search(&self, record: SearchRecord) -> Result<(), StoreError> {
        self.searches
            .lock()
            .expect("search mutex poisoned")
            .push(record);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryEngagement {
    pub(super) favorites: Mutex<Vec<Favorite>>,
    pub(super) reviews: Mutex<Vec<Review>>,
    pub(super) interactions: Mutex<Vec<Interaction>>,
}

impl EngagementStore for MemoryEngagement {
    fn insert_favorite(&self, favorite: Favorite) -> Result<Favorite, RepositoryError> {
        let mut guard = self.favorites.lock().expect("favorite mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.user == favorite.user && existing.hostel == favorite.hostel)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(favorite.clone());
        Ok(favorite)
    }

    fn remove_favorite(&self, user: UserId, hostel: HostelId) -> Result<(), RepositoryError> {
        let mut guard = self.favorites.lock().expect("favorite mutex poisoned");
        let before = guard.len();
        guard.retain(|favorite| !(favorite.user == user && favorite.hostel == hostel));
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn favorites_for(&self, user: UserId) -> Result<Vec<Favorite>, StoreError> {
        Ok(self
            .favorites
            .lock()
            .expect("favorite mutex poisoned")
            .iter()
            .filter(|favorite| favorite.user == user)
            .cloned()
            .collect())
    }

    fn favorites_count(&self, hostel: HostelId) -> Result<u64, StoreError> {
        Ok(self
            .favorites
            .lock()
            .expect("favorite mutex poisoned")
            .iter()
            .filter(|favorite| favorite.hostel == hostel)
            .count() as u64)
    }

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut guard = self.reviews.lock().expect("review mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.user == review.user && existing.hostel == review.hostel)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(review.clone());
        Ok(review)
    }

    fn update_review(&self, review: Review) -> Result<(), RepositoryError> {
        let mut guard = self.reviews.lock().expect("review mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == review.id) {
            Some(existing) => {
                *existing = review;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn remove_review(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let mut guard = self.reviews.lock().expect("review mutex poisoned");
        let before = guard.len();
        guard.retain(|review| review.id != id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        Ok(self
            .reviews
            .lock()
            .expect("review mutex poisoned")
            .iter()
            .find(|review| review.id == id)
            .cloned())
    }

    fn reviews_for(&self, hostel: HostelId) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .lock()
            .expect("review mutex poisoned")
            .iter()
            .filter(|review| review.hostel == hostel)
            .cloned()
            .collect())
    }

    fn insert_interaction(&self, interaction: Interaction) -> Result<(), StoreError> {
        self.interactions
            .lock()
            .expect("interaction mutex poisoned")
            .push(interaction);
        Ok(())
    }
}

pub(super) type Services = (
    Arc<AnalyticsService<MemoryAnalytics, MemoryEngagement>>,
    Arc<EngagementService<StubListings, MemoryEngagement, MemoryAnalytics>>,
    Arc<MemoryAnalytics>,
    Arc<MemoryEngagement>,
);

pub(super) fn build_services(listings: StubListings) -> Services {
    let analytics_repo = Arc::new(MemoryAnalytics::default());
    let engagement_store = Arc::new(MemoryEngagement::default());
    let analytics = Arc::new(AnalyticsService::new(
        analytics_repo.clone(),
        engagement_store.clone(),
    ));
    let service = Arc::new(EngagementService::new(
        Arc::new(listings),
        engagement_store.clone(),
        analytics.clone(),
    ));
    (analytics, service, analytics_repo, engagement_store)
}
