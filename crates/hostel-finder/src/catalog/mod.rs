//! Listing catalog: hostels, rooms, and the fixed vocabularies they draw
//! from. Updates feed changed-field diffs into the verification workflow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    hostel_changed_fields, room_changed_fields, City, FacilityKey, Hostel, HostelDraft, HostelId,
    OwnerContact, Room, RoomDraft, RoomId, RoomType,
};
pub use repository::{CoordinateBounds, ListingStore};
pub use router::{catalog_router, CatalogRoutes};
pub use service::{CatalogError, CatalogService};
