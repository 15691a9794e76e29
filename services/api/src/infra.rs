use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use tracing::info;

use hostel_finder::catalog::{
    City, CoordinateBounds, FacilityKey, Hostel, HostelId, ListingStore, OwnerContact, Room,
    RoomId, RoomType,
};
use hostel_finder::engagement::{
    AnalyticsRepository, DailyCounters, EngagementStore, EngagementSummary, Favorite,
    Interaction, Metric, Review, ReviewId, SummaryPeriod, TotalCounters,
};
use hostel_finder::error::{RepositoryError, StoreError};
use hostel_finder::identity::{Gender, Principal, PrincipalProvider, Role, UserId};
use hostel_finder::moderation::{
    NotificationError, NotificationSender, OtpDelivery, TargetStore, VerificationRepository,
    VerificationRequest, VerificationStatus, VerificationTarget,
};
use hostel_finder::search::SearchRecord;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// An account row as the identity provider would hold it.
#[derive(Debug, Clone)]
pub(crate) struct UserProfile {
    pub(crate) id: UserId,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) city: String,
    pub(crate) phone: String,
    pub(crate) role: Role,
    pub(crate) gender: Gender,
    pub(crate) phone_verified: bool,
    pub(crate) verified: bool,
    pub(crate) reviewer: bool,
}

impl UserProfile {
    fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
            gender: self.gender,
            phone: self.phone.clone(),
            phone_verified: self.phone_verified,
            verified: self.verified,
            reviewer: self.reviewer,
        }
    }

    pub(crate) fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Patch applied to a profile; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub(crate) struct ProfileUpdate {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) city: Option<String>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, UserProfile>,
    hostels: HashMap<HostelId, Hostel>,
    rooms: HashMap<RoomId, Room>,
    favorites: Vec<Favorite>,
    reviews: Vec<Review>,
    interactions: Vec<Interaction>,
    daily: HashMap<(HostelId, NaiveDate), DailyCounters>,
    totals: HashMap<HostelId, TotalCounters>,
    summaries: HashMap<(HostelId, SummaryPeriod, NaiveDate), EngagementSummary>,
    searches: Vec<SearchRecord>,
    requests: Vec<VerificationRequest>,
}

/// In-memory stand-in for the relational store, implementing every repository
/// boundary the domain crate defines.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub(crate) fn insert_user(&self, profile: UserProfile) {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .users
            .insert(profile.id, profile);
    }

    /// Apply a profile patch, returning the fresh principal and the list of
    /// changed field names for the passive-invalidation event.
    pub(crate) fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<(Principal, Vec<&'static str>), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let profile = inner.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        let mut changed = Vec::new();
        if let Some(first_name) = update.first_name {
            if profile.first_name != first_name {
                profile.first_name = first_name;
                if !changed.contains(&"name") {
                    changed.push("name");
                }
            }
        }
        if let Some(last_name) = update.last_name {
            if profile.last_name != last_name {
                profile.last_name = last_name;
                if !changed.contains(&"name") {
                    changed.push("name");
                }
            }
        }
        if let Some(phone) = update.phone {
            if profile.phone != phone {
                profile.phone = phone;
                changed.push("phone");
            }
        }
        if let Some(email) = update.email {
            if profile.email != email {
                profile.email = email;
                changed.push("email");
            }
        }
        if let Some(city) = update.city {
            if profile.city != city {
                profile.city = city;
                changed.push("city");
            }
        }

        Ok((profile.principal(), changed))
    }
}

impl ListingStore for InMemoryStore {
    fn insert_hostel(&self, hostel: Hostel) -> Result<Hostel, StoreError> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .hostels
            .insert(hostel.id, hostel.clone());
        Ok(hostel)
    }

    fn update_hostel(&self, hostel: Hostel) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.hostels.contains_key(&hostel.id) {
            inner.hostels.insert(hostel.id, hostel);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn remove_hostel(&self, id: HostelId) -> Result<Vec<RoomId>, RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.hostels.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let removed: Vec<RoomId> = inner
            .rooms
            .values()
            .filter(|room| room.hostel == id)
            .map(|room| room.id)
            .collect();
        for room in &removed {
            inner.rooms.remove(room);
        }
        Ok(removed)
    }

    fn hostel(&self, id: HostelId) -> Result<Option<Hostel>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .hostels
            .get(&id)
            .cloned())
    }

    fn hostels(&self) -> Result<Vec<Hostel>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut hostels: Vec<Hostel> = inner.hostels.values().cloned().collect();
        hostels.sort_by_key(|hostel| hostel.id);
        Ok(hostels)
    }

    fn hostels_within(&self, bounds: &CoordinateBounds) -> Result<Vec<Hostel>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .hostels
            .values()
            .filter(|hostel| bounds.contains(hostel.latitude, hostel.longitude))
            .cloned()
            .collect())
    }

    fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .rooms
            .insert(room.id, room.clone());
        Ok(room)
    }

    fn update_room(&self, room: Room) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.rooms.contains_key(&room.id) {
            inner.rooms.insert(room.id, room);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn remove_room(&self, id: RoomId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner
            .rooms
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .rooms
            .get(&id)
            .cloned())
    }

    fn rooms_for(&self, hostel: HostelId) -> Result<Vec<Room>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut rooms: Vec<Room> = inner
            .rooms
            .values()
            .filter(|room| room.hostel == hostel)
            .cloned()
            .collect();
        rooms.sort_by_key(|room| room.id);
        Ok(rooms)
    }

    fn owner_contact(&self, id: UserId) -> Result<Option<OwnerContact>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .users
            .get(&id)
            .map(|profile| OwnerContact {
                id,
                full_name: profile.full_name(),
                phone: profile.phone.clone(),
                verified: profile.verified,
            }))
    }
}

impl AnalyticsRepository for InMemoryStore {
    fn increment_daily(
        &self,
        hostel: HostelId,
        date: NaiveDate,
        metric: Metric,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let row = inner
            .daily
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
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let totals = inner.totals.entry(hostel).or_default();
        match metric {
            Metric::Views => totals.views += 1,
            Metric::Contacts => totals.contacts += 1,
            Metric::Favorites => totals.favorites += 1,
            Metric::SearchAppearances => totals.search_appearances += 1,
        }
        Ok(())
    }

    fn set_total_favorites(&self, hostel: HostelId, count: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.totals.entry(hostel).or_default().favorites = count;
        Ok(())
    }

    fn totals(&self, hostel: HostelId) -> Result<TotalCounters, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .totals
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
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut rows: Vec<DailyCounters> = inner
            .daily
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
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .summaries
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
            .inner
            .lock()
            .expect("store mutex poisoned")
            .summaries
            .get(&(hostel, period, start))
            .cloned())
    }

    fn record_search(&self, record: SearchRecord) -> Result<(), StoreError> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .searches
            .push(record);
        Ok(())
    }
}

impl EngagementStore for InMemoryStore {
    fn insert_favorite(&self, favorite: Favorite) -> Result<Favorite, RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner
            .favorites
            .iter()
            .any(|existing| existing.user == favorite.user && existing.hostel == favorite.hostel)
        {
            return Err(RepositoryError::Conflict);
        }
        inner.favorites.push(favorite.clone());
        Ok(favorite)
    }

    fn remove_favorite(&self, user: UserId, hostel: HostelId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let before = inner.favorites.len();
        inner
            .favorites
            .retain(|favorite| !(favorite.user == user && favorite.hostel == hostel));
        if inner.favorites.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn favorites_for(&self, user: UserId) -> Result<Vec<Favorite>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .favorites
            .iter()
            .filter(|favorite| favorite.user == user)
            .cloned()
            .collect())
    }

    fn favorites_count(&self, hostel: HostelId) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .favorites
            .iter()
            .filter(|favorite| favorite.hostel == hostel)
            .count() as u64)
    }

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner
            .reviews
            .iter()
            .any(|existing| existing.user == review.user && existing.hostel == review.hostel)
        {
            return Err(RepositoryError::Conflict);
        }
        inner.reviews.push(review.clone());
        Ok(review)
    }

    fn update_review(&self, review: Review) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        match inner
            .reviews
            .iter_mut()
            .find(|existing| existing.id == review.id)
        {
            Some(existing) => {
                *existing = review;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn remove_review(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let before = inner.reviews.len();
        inner.reviews.retain(|review| review.id != id);
        if inner.reviews.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .reviews
            .iter()
            .find(|review| review.id == id)
            .cloned())
    }

    fn reviews_for(&self, hostel: HostelId) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .reviews
            .iter()
            .filter(|review| review.hostel == hostel)
            .cloned()
            .collect())
    }

    fn insert_interaction(&self, interaction: Interaction) -> Result<(), StoreError> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .interactions
            .push(interaction);
        Ok(())
    }
}

impl VerificationRepository for InMemoryStore {
    fn insert_pending(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError> {
        // Uniqueness check and insert happen under the same lock; the
        // relational equivalent is a partial unique index on
        // (target, status = pending).
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.requests.iter().any(|existing| {
            existing.target == request.target && existing.status == VerificationStatus::Pending
        }) {
            return Err(RepositoryError::Conflict);
        }
        inner.requests.push(request.clone());
        Ok(request)
    }

    fn update(&self, request: VerificationRequest) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        match inner
            .requests
            .iter_mut()
            .find(|existing| existing.id == request.id)
        {
            Some(existing) => {
                *existing = request;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(
        &self,
        id: &hostel_finder::moderation::RequestId,
    ) -> Result<Option<VerificationRequest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .requests
            .iter()
            .find(|request| &request.id == id)
            .cloned())
    }

    fn for_target(
        &self,
        target: VerificationTarget,
    ) -> Result<Vec<VerificationRequest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .requests
            .iter()
            .filter(|request| request.target == target)
            .cloned()
            .collect())
    }

    fn for_submitter(&self, user: UserId) -> Result<Vec<VerificationRequest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .requests
            .iter()
            .filter(|request| request.submitter == user)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<VerificationRequest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .requests
            .clone())
    }

    fn remove_for_target(&self, target: VerificationTarget) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let before = inner.requests.len();
        inner.requests.retain(|request| request.target != target);
        Ok(before - inner.requests.len())
    }
}

impl TargetStore for InMemoryStore {
    fn user_exists(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .users
            .contains_key(&id))
    }

    fn hostel_owner(&self, id: HostelId) -> Result<Option<UserId>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .hostels
            .get(&id)
            .map(|hostel| hostel.owner))
    }

    fn room_hostel(&self, id: RoomId) -> Result<Option<HostelId>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .rooms
            .get(&id)
            .map(|room| room.hostel))
    }

    fn is_verified(&self, target: VerificationTarget) -> Result<bool, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(match target {
            VerificationTarget::User(id) => inner
                .users
                .get(&id)
                .map(|profile| profile.verified)
                .unwrap_or(false),
            VerificationTarget::Hostel(id) => inner
                .hostels
                .get(&id)
                .map(|hostel| hostel.verified)
                .unwrap_or(false),
            VerificationTarget::Room(id) => inner
                .rooms
                .get(&id)
                .map(|room| room.verified)
                .unwrap_or(false),
        })
    }

    fn set_verified(&self, target: VerificationTarget, verified: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        match target {
            VerificationTarget::User(id) => {
                if let Some(profile) = inner.users.get_mut(&id) {
                    profile.verified = verified;
                }
            }
            VerificationTarget::Hostel(id) => {
                if let Some(hostel) = inner.hostels.get_mut(&id) {
                    hostel.verified = verified;
                }
            }
            VerificationTarget::Room(id) => {
                if let Some(room) = inner.rooms.get_mut(&id) {
                    room.verified = verified;
                }
            }
        }
        Ok(())
    }
}

impl PrincipalProvider for InMemoryStore {
    fn principal(&self, id: UserId) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store mutex poisoned")
            .users
            .get(&id)
            .map(UserProfile::principal))
    }
}

/// Notification sender that logs the click-to-chat link instead of calling a
/// messaging gateway.
#[derive(Default)]
pub(crate) struct LoggingNotifier;

impl NotificationSender for LoggingNotifier {
    fn deliver(&self, delivery: OtpDelivery) -> Result<(), NotificationError> {
        info!(phone = %delivery.phone, link = %delivery.link, "whatsapp otp link ready");
        Ok(())
    }
}

/// Seed accounts and listings so `serve --seed` and the demo have data to
/// work against.
pub(crate) fn seed_store(store: &InMemoryStore) {
    store.insert_user(UserProfile {
        id: UserId(1),
        first_name: "Areeba".to_string(),
        last_name: "Khan".to_string(),
        email: "areeba.admin@example.com".to_string(),
        city: "lahore".to_string(),
        phone: "03000000001".to_string(),
        role: Role::Owner,
        gender: Gender::Female,
        phone_verified: true,
        verified: true,
        reviewer: true,
    });
    store.insert_user(UserProfile {
        id: UserId(2),
        first_name: "Bilal".to_string(),
        last_name: "Ahmed".to_string(),
        email: "bilal.owner@example.com".to_string(),
        city: "lahore".to_string(),
        phone: "03001234567".to_string(),
        role: Role::Owner,
        gender: Gender::Male,
        phone_verified: true,
        verified: true,
        reviewer: false,
    });
    store.insert_user(UserProfile {
        id: UserId(3),
        first_name: "Sana".to_string(),
        last_name: "Riaz".to_string(),
        email: "sana.student@example.com".to_string(),
        city: "lahore".to_string(),
        phone: "03007654321".to_string(),
        role: Role::Student,
        gender: Gender::Female,
        phone_verified: false,
        verified: false,
        reviewer: false,
    });

    let now = Utc::now();
    let hostels = [
        (1u64, "Gulberg Boys Hostel", 31.52, 74.32, Gender::Male),
        (2u64, "Model Town Girls Hostel", 31.48, 74.32, Gender::Female),
    ];
    for (id, name, latitude, longitude, gender) in hostels {
        store
            .insert_hostel(Hostel {
                id: HostelId(id),
                owner: UserId(2),
                name: name.to_string(),
                city: City::Lahore,
                latitude,
                longitude,
                map_link: None,
                gender,
                description: Some("Walking distance from the main campus".to_string()),
                verified: false,
                created_at: now,
            })
            .expect("in-memory insert cannot fail");
    }

    let rooms = [
        (1u64, 1u64, RoomType::Shared, 12000u32, 4u32, 2u32),
        (2, 1, RoomType::Independent, 25000, 1, 1),
        (3, 2, RoomType::Shared, 14000, 3, 3),
    ];
    for (id, hostel, room_type, rent, total, available) in rooms {
        store
            .insert_room(Room {
                id: RoomId(id),
                hostel: HostelId(hostel),
                room_type,
                media: Vec::new(),
                total_capacity: total,
                available_capacity: available,
                rent,
                security_deposit: rent,
                facilities: [FacilityKey::Wifi, FacilityKey::Laundry, FacilityKey::Security]
                    .into_iter()
                    .collect(),
                description: None,
                is_available: true,
                verified: false,
                created_at: now,
            })
            .expect("in-memory insert cannot fail");
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
