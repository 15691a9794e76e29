use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{RepositoryError, StoreError, ValidationError};
use crate::identity::{
    require_hostel_owner, require_owner_role, AuthorizationError, IdentityError, Principal,
};
use crate::moderation::repository::ChangeObserver;
use crate::moderation::VerificationTarget;

use super::domain::{
    hostel_changed_fields, room_changed_fields, Hostel, HostelDraft, HostelId, Room, RoomDraft,
    RoomId,
};
use super::repository::ListingStore;

static HOSTEL_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ROOM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_hostel_id() -> HostelId {
    HostelId(HOSTEL_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_room_id() -> RoomId {
    RoomId(ROOM_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Error raised by listing and room maintenance.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error("hostel not found")]
    HostelNotFound,
    #[error("room not found")]
    RoomNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdentityError> for CatalogError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Authorization(err) => Self::Authorization(err),
            IdentityError::Store(err) => Self::Store(err),
        }
    }
}

/// Maintenance service for hostels and rooms. Every update computes the
/// changed-field diff and hands it to the observer so approved verifications
/// covering those fields are demoted.
pub struct CatalogService<L, O> {
    store: Arc<L>,
    observer: Arc<O>,
}

impl<L, O> CatalogService<L, O>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
{
    pub fn new(store: Arc<L>, observer: Arc<O>) -> Self {
        Self { store, observer }
    }

    pub fn create_hostel(
        &self,
        principal: &Principal,
        draft: HostelDraft,
        now: DateTime<Utc>,
    ) -> Result<Hostel, CatalogError> {
        require_owner_role(principal)?;
        draft.validate()?;

        let hostel = Hostel {
            id: next_hostel_id(),
            owner: principal.id,
            name: draft.name,
            city: draft.city,
            latitude: draft.latitude,
            longitude: draft.longitude,
            map_link: draft.map_link,
            gender: draft.gender,
            description: draft.description,
            verified: false,
            created_at: now,
        };
        Ok(self.store.insert_hostel(hostel)?)
    }

    pub fn update_hostel(
        &self,
        principal: &Principal,
        id: HostelId,
        draft: HostelDraft,
    ) -> Result<Hostel, CatalogError> {
        let before = self
            .store
            .hostel(id)?
            .ok_or(CatalogError::HostelNotFound)?;
        require_hostel_owner(principal, before.owner)?;
        draft.validate()?;

        let after = Hostel {
            name: draft.name,
            city: draft.city,
            latitude: draft.latitude,
            longitude: draft.longitude,
            map_link: draft.map_link,
            gender: draft.gender,
            description: draft.description,
            ..before.clone()
        };

        self.store
            .update_hostel(after.clone())
            .map_err(|err| self.map_hostel_repo_err(err))?;

        let changed = hostel_changed_fields(&before, &after);
        if !changed.is_empty() {
            self.observer
                .entity_changed(VerificationTarget::Hostel(id), &changed)?;
        }
        Ok(after)
    }

    pub fn delete_hostel(
        &self,
        principal: &Principal,
        id: HostelId,
    ) -> Result<(), CatalogError> {
        let hostel = self
            .store
            .hostel(id)?
            .ok_or(CatalogError::HostelNotFound)?;
        require_hostel_owner(principal, hostel.owner)?;

        let removed_rooms = self
            .store
            .remove_hostel(id)
            .map_err(|err| self.map_hostel_repo_err(err))?;

        for room in removed_rooms {
            self.observer
                .entity_removed(VerificationTarget::Room(room))?;
        }
        self.observer
            .entity_removed(VerificationTarget::Hostel(id))?;
        Ok(())
    }

    pub fn add_room(
        &self,
        principal: &Principal,
        hostel_id: HostelId,
        draft: RoomDraft,
        now: DateTime<Utc>,
    ) -> Result<Room, CatalogError> {
        let hostel = self
            .store
            .hostel(hostel_id)?
            .ok_or(CatalogError::HostelNotFound)?;
        require_hostel_owner(principal, hostel.owner)?;
        draft.validate()?;

        let room = Room {
            id: next_room_id(),
            hostel: hostel_id,
            room_type: draft.room_type,
            media: draft.media,
            total_capacity: draft.total_capacity,
            available_capacity: draft.available_capacity,
            rent: draft.rent,
            security_deposit: draft.security_deposit,
            facilities: draft.facilities,
            description: draft.description,
            is_available: draft.is_available,
            verified: false,
            created_at: now,
        };
        Ok(self.store.insert_room(room)?)
    }

    pub fn update_room(
        &self,
        principal: &Principal,
        id: RoomId,
        draft: RoomDraft,
    ) -> Result<Room, CatalogError> {
        let before = self.store.room(id)?.ok_or(CatalogError::RoomNotFound)?;
        let hostel = self
            .store
            .hostel(before.hostel)?
            .ok_or(CatalogError::HostelNotFound)?;
        require_hostel_owner(principal, hostel.owner)?;
        draft.validate()?;

        let after = Room {
            room_type: draft.room_type,
            media: draft.media,
            total_capacity: draft.total_capacity,
            available_capacity: draft.available_capacity,
            rent: draft.rent,
            security_deposit: draft.security_deposit,
            facilities: draft.facilities,
            description: draft.description,
            is_available: draft.is_available,
            ..before.clone()
        };

        self.store
            .update_room(after.clone())
            .map_err(|err| self.map_room_repo_err(err))?;

        let changed = room_changed_fields(&before, &after);
        if !changed.is_empty() {
            self.observer
                .entity_changed(VerificationTarget::Room(id), &changed)?;
        }
        Ok(after)
    }

    pub fn delete_room(&self, principal: &Principal, id: RoomId) -> Result<(), CatalogError> {
        let room = self.store.room(id)?.ok_or(CatalogError::RoomNotFound)?;
        let hostel = self
            .store
            .hostel(room.hostel)?
            .ok_or(CatalogError::HostelNotFound)?;
        require_hostel_owner(principal, hostel.owner)?;

        self.store
            .remove_room(id)
            .map_err(|err| self.map_room_repo_err(err))?;
        self.observer
            .entity_removed(VerificationTarget::Room(id))?;
        Ok(())
    }

    pub fn hostel_detail(&self, id: HostelId) -> Result<(Hostel, Vec<Room>), CatalogError> {
        let hostel = self
            .store
            .hostel(id)?
            .ok_or(CatalogError::HostelNotFound)?;
        let rooms = self.store.rooms_for(id)?;
        Ok((hostel, rooms))
    }

    pub fn list_hostels(&self) -> Result<Vec<Hostel>, CatalogError> {
        Ok(self.store.hostels()?)
    }

    fn map_hostel_repo_err(&self, err: RepositoryError) -> CatalogError {
        match err {
            RepositoryError::NotFound => CatalogError::HostelNotFound,
            other => CatalogError::Store(StoreError::from(other)),
        }
    }

    fn map_room_repo_err(&self, err: RepositoryError) -> CatalogError {
        match err {
            RepositoryError::NotFound => CatalogError::RoomNotFound,
            other => CatalogError::Store(StoreError::from(other)),
        }
    }
}
