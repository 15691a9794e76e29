use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::catalog::{Hostel, HostelId, ListingStore};
use crate::error::{StoreError, ValidationError};
use crate::identity::{AuthorizationError, IdentityError, UserId};

use super::domain::{RankedResults, RoomMatch, SearchQuery, SearchRecord};
use super::geo;

/// Fire-and-forget boundary for search side effects: the audit record and the
/// per-listing search-appearance counters. Failures behind this trait are
/// logged and never fail the search itself.
pub trait SearchEventSink: Send + Sync {
    fn record_query(&self, record: &SearchRecord) -> Result<(), StoreError>;
    fn record_appearance(&self, hostel: HostelId, on: NaiveDate) -> Result<(), StoreError>;
}

/// Error raised by the search pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdentityError> for SearchError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Authorization(err) => Self::Authorization(err),
            IdentityError::Store(err) => Self::Store(err),
        }
    }
}

/// Geo search engine: validates, ranks by haversine distance, filters rooms,
/// and records analytics events best-effort.
pub struct SearchService<L, E> {
    listings: Arc<L>,
    events: Arc<E>,
}

struct RankedHostel {
    hostel: Hostel,
    distance_km: f64,
}

impl<L, E> SearchService<L, E>
where
    L: ListingStore + 'static,
    E: SearchEventSink + 'static,
{
    pub fn new(listings: Arc<L>, events: Arc<E>) -> Self {
        Self { listings, events }
    }

    pub fn search(
        &self,
        user: Option<UserId>,
        query: &SearchQuery,
        now: DateTime<Utc>,
    ) -> Result<RankedResults, SearchError> {
        query.validate()?;

        let bounds = geo::bounds_for(query.latitude, query.longitude, query.radius_km);
        let candidates = self.listings.hostels_within(&bounds)?;

        let mut ranked: Vec<RankedHostel> = candidates
            .into_iter()
            .filter_map(|hostel| {
                let distance = geo::haversine_km(
                    query.latitude,
                    query.longitude,
                    hostel.latitude,
                    hostel.longitude,
                );
                (distance <= query.radius_km).then(|| RankedHostel {
                    distance_km: geo::round_km(distance),
                    hostel,
                })
            })
            .collect();

        // Rounded distances keep the id tie-break deterministic.
        ranked.sort_by(|a, b| {
            let da = (a.distance_km * 100.0).round() as u64;
            let db = (b.distance_km * 100.0).round() as u64;
            da.cmp(&db).then(a.hostel.id.cmp(&b.hostel.id))
        });

        self.record_events(user, query, &ranked, now);

        let mut rooms = Vec::new();
        for entry in &ranked {
            if let Some(gender) = query.gender {
                if entry.hostel.gender != gender {
                    continue;
                }
            }

            let Some(owner) = self.listings.owner_contact(entry.hostel.owner)? else {
                warn!(
                    hostel = entry.hostel.id.0,
                    owner = entry.hostel.owner.0,
                    "owner contact missing, skipping listing in results"
                );
                continue;
            };

            for room in self.listings.rooms_for(entry.hostel.id)? {
                if !room.is_available {
                    continue;
                }
                if let Some(min) = query.min_price {
                    if room.rent < min {
                        continue;
                    }
                }
                if let Some(max) = query.max_price {
                    if room.rent > max {
                        continue;
                    }
                }
                if !query.facilities.is_subset(&room.facilities) {
                    continue;
                }

                rooms.push(RoomMatch {
                    room_id: room.id,
                    hostel_id: entry.hostel.id,
                    hostel_name: entry.hostel.name.clone(),
                    room_type: room.room_type,
                    total_capacity: room.total_capacity,
                    available_capacity: room.available_capacity,
                    rent: room.rent,
                    security_deposit: room.security_deposit,
                    facilities: room.facilities,
                    verified: room.verified,
                    distance_km: entry.distance_km,
                    owner: owner.clone(),
                });
            }
        }

        Ok(RankedResults {
            count: rooms.len(),
            rooms,
        })
    }

    /// Best-effort side effects: the search must not fail when the audit
    /// store is down, so every sink error degrades to a warning.
    fn record_events(
        &self,
        user: Option<UserId>,
        query: &SearchQuery,
        ranked: &[RankedHostel],
        now: DateTime<Utc>,
    ) {
        let record = SearchRecord {
            user,
            latitude: query.latitude,
            longitude: query.longitude,
            radius_km: query.radius_km,
            gender: query.gender,
            min_price: query.min_price,
            max_price: query.max_price,
            facilities: query.facilities.clone(),
            searched_at: now,
        };
        if let Err(err) = self.events.record_query(&record) {
            warn!(error = %err, "failed to persist search history");
        }

        let today = now.date_naive();
        for entry in ranked {
            if let Err(err) = self.events.record_appearance(entry.hostel.id, today) {
                warn!(
                    error = %err,
                    hostel = entry.hostel.id.0,
                    "failed to record search appearance"
                );
            }
        }
    }
}
