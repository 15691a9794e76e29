use crate::error::{RepositoryError, StoreError};
use crate::identity::UserId;

use super::domain::{Hostel, HostelId, OwnerContact, Room, RoomId};

/// Coordinate window used by the store to pre-filter candidates before the
/// search engine computes exact distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl CoordinateBounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

/// Storage abstraction over listings, rooms, and owner contact details.
pub trait ListingStore: Send + Sync {
    fn insert_hostel(&self, hostel: Hostel) -> Result<Hostel, StoreError>;
    fn update_hostel(&self, hostel: Hostel) -> Result<(), RepositoryError>;
    /// Remove a hostel and all of its rooms, returning the removed room ids
    /// so callers can propagate deletion events.
    fn remove_hostel(&self, id: HostelId) -> Result<Vec<RoomId>, RepositoryError>;
    fn hostel(&self, id: HostelId) -> Result<Option<Hostel>, StoreError>;
    fn hostels(&self) -> Result<Vec<Hostel>, StoreError>;
    fn hostels_within(&self, bounds: &CoordinateBounds) -> Result<Vec<Hostel>, StoreError>;

    fn insert_room(&self, room: Room) -> Result<Room, StoreError>;
    fn update_room(&self, room: Room) -> Result<(), RepositoryError>;
    fn remove_room(&self, id: RoomId) -> Result<(), RepositoryError>;
    fn room(&self, id: RoomId) -> Result<Option<Room>, StoreError>;
    fn rooms_for(&self, hostel: HostelId) -> Result<Vec<Room>, StoreError>;

    fn owner_contact(&self, id: UserId) -> Result<Option<OwnerContact>, StoreError>;
}
