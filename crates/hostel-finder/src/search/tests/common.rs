use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::catalog::{
    City, CoordinateBounds, FacilityKey, Hostel, HostelId, ListingStore, OwnerContact, Room,
    RoomId, RoomType,
};
use crate::error::{RepositoryError, StoreError};
use crate::identity::{Gender, UserId};
use crate::search::domain::{SearchQuery, SearchRecord};
use crate::search::service::{SearchEventSink, SearchService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 12, 10, 30, 0).unwrap()
}

pub(super) fn query() -> SearchQuery {
    SearchQuery {
        latitude: 31.5,
        longitude: 74.3,
        radius_km: 5.0,
        gender: None,
        min_price: None,
        max_price: None,
        facilities: BTreeSet::new(),
    }
}

pub(super) fn facility_set(keys: &[FacilityKey]) -> BTreeSet<FacilityKey> {
    keys.iter().copied().collect()
}

pub(super) fn hostel(id: u64, owner: u64, latitude: f64, longitude: f64) -> Hostel {
    Hostel {
        id: HostelId(id),
        owner: UserId(owner),
        name: format!("Hostel {id}"),
        city: City::Lahore,
        latitude,
        longitude,
        map_link: None,
        gender: Gender::Male,
        description: None,
        verified: false,
        created_at: now(),
    }
}

pub(super) fn room(id: u64, hostel: u64, rent: u32) -> Room {
    Room {
        id: RoomId(id),
        hostel: HostelId(hostel),
        room_type: RoomType::Shared,
        media: Vec::new(),
        total_capacity: 4,
        available_capacity: 2,
        rent,
        security_deposit: rent * 2,
        facilities: facility_set(&[FacilityKey::Wifi, FacilityKey::Laundry]),
        description: None,
        is_available: true,
        verified: false,
        created_at: now(),
    }
}

#[derive(Default)]
pub(super) struct MemoryListings {
    pub(super) hostels: Mutex<Vec<Hostel>>,
    pub(super) rooms: Mutex<Vec<Room>>,
    pub(super) owners: Mutex<HashMap<UserId, OwnerContact>>,
    pub(super) unavailable: Mutex<bool>,
}

impl MemoryListings {
    pub(super) fn seeded(hostels: Vec<Hostel>, rooms: Vec<Room>) -> Self {
        let owners = hostels
            .iter()
            .map(|hostel| {
                (
                    hostel.owner,
                    OwnerContact {
                        id: hostel.owner,
                        full_name: format!("Owner {}", hostel.owner.0),
                        phone: "03001234567".to_string(),
                        verified: true,
                    },
                )
            })
            .collect();
        Self {
            hostels: Mutex::new(hostels),
            rooms: Mutex::new(rooms),
            owners: Mutex::new(owners),
            unavailable: Mutex::new(false),
        }
    }

    pub(super) fn set_unavailable(&self) {
        *self.unavailable.lock().expect("flag mutex poisoned") = true;
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if *self.unavailable.lock().expect("flag mutex poisoned") {
            Err(StoreError::Unavailable("listings store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ListingStore for MemoryListings {
    fn insert_hostel(&self, hostel: Hostel) -> Result<Hostel, StoreError> {
        self.hostels
            .lock()
            .expect("hostel mutex poisoned")
            .push(hostel.clone());
        Ok(hostel)
    }

    fn update_hostel(&self, hostel: Hostel) -> Result<(), RepositoryError> {
        let mut guard = self.hostels.lock().expect("hostel mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == hostel.id) {
            Some(existing) => {
                *existing = hostel;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn remove_hostel(&self, id: HostelId) -> Result<Vec<RoomId>, RepositoryError> {
        let mut hostels = self.hostels.lock().expect("hostel mutex poisoned");
        let before = hostels.len();
        hostels.retain(|hostel| hostel.id != id);
        if hostels.len() == before {
            return Err(RepositoryError::NotFound);
        }
        let mut rooms = self.rooms.lock().expect("room mutex poisoned");
        let removed = rooms
            .iter()
            .filter(|room| room.hostel == id)
            .map(|room| room.id)
            .collect();
        rooms.retain(|room| room.hostel != id);
        Ok(removed)
    }

    fn hostel(&self, id: HostelId) -> Result<Option<Hostel>, StoreError> {
        self.check_available()?;
        Ok(self
            .hostels
            .lock()
            .expect("hostel mutex poisoned")
            .iter()
            .find(|hostel| hostel.id == id)
            .cloned())
    }

    fn hostels(&self) -> Result<Vec<Hostel>, StoreError> {
        self.check_available()?;
        Ok(self.hostels.lock().expect("hostel mutex poisoned").clone())
    }

    fn hostels_within(&self, bounds: &CoordinateBounds) -> Result<Vec<Hostel>, StoreError> {
        self.check_available()?;
        Ok(self
            .hostels
            .lock()
            .expect("hostel mutex poisoned")
            .iter()
            .filter(|hostel| bounds.contains(hostel.latitude, hostel.longitude))
            .cloned()
            .collect())
    }

    fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        self.rooms
            .lock()
            .expect("room mutex poisoned")
            .push(room.clone());
        Ok(room)
    }

    fn update_room(&self, room: Room) -> Result<(), RepositoryError> {
        let mut guard = self.rooms.lock().expect("room mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == room.id) {
            Some(existing) => {
                *existing = room;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn remove_room(&self, id: RoomId) -> Result<(), RepositoryError> {
        let mut guard = self.rooms.lock().expect("room mutex poisoned");
        let before = guard.len();
        guard.retain(|room| room.id != id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        self.check_available()?;
        Ok(self
            .rooms
            .lock()
            .expect("room mutex poisoned")
            .iter()
            .find(|room| room.id == id)
            .cloned())
    }

    fn rooms_for(&self, hostel: HostelId) -> Result<Vec<Room>, StoreError> {
        self.check_available()?;
        Ok(self
            .rooms
            .lock()
            .expect("room mutex poisoned")
            .iter()
            .filter(|room| room.hostel == hostel)
            .cloned()
            .collect())
    }

    fn owner_contact(&self, id: UserId) -> Result<Option<OwnerContact>, StoreError> {
        self.check_available()?;
        Ok(self
            .owners
            .lock()
            .expect("owner mutex poisoned")
            .get(&id)
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemorySink {
    pub(super) queries: Mutex<Vec<SearchRecord>>,
    pub(super) appearances: Mutex<Vec<(HostelId, NaiveDate)>>,
    pub(super) failing: Mutex<bool>,
}

impl MemorySink {
    pub(super) fn failing() -> Self {
        Self {
            failing: Mutex::new(true),
            ..Self::default()
        }
    }

    pub(super) fn recorded_queries(&self) -> Vec<SearchRecord> {
        self.queries.lock().expect("query mutex poisoned").clone()
    }

    pub(super) fn recorded_appearances(&self) -> Vec<(HostelId, NaiveDate)> {
        self.appearances
            .lock()
            .expect("appearance mutex poisoned")
            .clone()
    }
}

impl SearchEventSink for MemorySink {
    fn record_query(&self, record: &SearchRecord) -> Result<(), StoreError> {
        if *self.failing.lock().expect("failing mutex poisoned") {
            return Err(StoreError::Unavailable("sink offline".to_string()));
        }
        self.queries
            .lock()
            .expect("query mutex poisoned")
            .push(record.clone());
        Ok(())
    }

    fn record_appearance(&self, hostel: HostelId, on: NaiveDate) -> Result<(), StoreError> {
        if *self.failing.lock().expect("failing mutex poisoned") {
            return Err(StoreError::Unavailable("sink offline".to_string()));
        }
        self.appearances
            .lock()
            .expect("appearance mutex poisoned")
            .push((hostel, on));
        Ok(())
    }
}

pub(super) fn build_service(
    listings: MemoryListings,
    sink: MemorySink,
) -> (
    SearchService<MemoryListings, MemorySink>,
    Arc<MemoryListings>,
    Arc<MemorySink>,
) {
    let listings = Arc::new(listings);
    let sink = Arc::new(sink);
    let service = SearchService::new(listings.clone(), sink.clone());
    (service, listings, sink)
}
