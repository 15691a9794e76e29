use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{FacilityKey, HostelId, OwnerContact, RoomId, RoomType};
use crate::error::ValidationError;
use crate::identity::{Gender, UserId};

pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 50.0;

/// Raw query-string parameters as they arrive on the wire. Everything is a
/// string so that each field can fail validation by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub facilities: Option<String>,
}

/// A validated search query. Construction via [`SearchQuery::parse`] or a
/// literal followed by [`SearchQuery::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub gender: Option<Gender>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub facilities: BTreeSet<FacilityKey>,
}

impl SearchQuery {
    /// Parse and validate raw parameters, field by field in a fixed order.
    pub fn parse(params: &RawSearchParams) -> Result<Self, ValidationError> {
        let latitude = require_number(params.lat.as_deref(), "lat")?;
        let longitude = require_number(params.lng.as_deref(), "lng")?;
        let radius_km = require_number(params.radius.as_deref(), "radius")?;

        let gender = match params.gender.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Gender::from_key(raw).ok_or_else(|| {
                ValidationError::new("gender", "must be one of male, female, other")
            })?),
        };

        let min_price = parse_price(params.min_price.as_deref(), "min_price")?;
        let max_price = parse_price(params.max_price.as_deref(), "max_price")?;

        let mut facilities = BTreeSet::new();
        if let Some(raw) = params.facilities.as_deref() {
            for key in raw.split(',').map(str::trim).filter(|key| !key.is_empty()) {
                let facility = FacilityKey::from_key(key).ok_or_else(|| {
                    ValidationError::new("facilities", format!("unknown facility key '{key}'"))
                })?;
                facilities.insert(facility);
            }
        }

        let query = Self {
            latitude,
            longitude,
            radius_km,
            gender,
            min_price,
            max_price,
            facilities,
        };
        query.validate()?;
        Ok(query)
    }

    /// Range and ordering checks; run before any part of a search executes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::new(
                "lat",
                "Latitude must be between -90 and 90 degrees",
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::new(
                "lng",
                "Longitude must be between -180 and 180 degrees",
            ));
        }
        if !self.radius_km.is_finite() || self.radius_km < MIN_RADIUS_KM {
            return Err(ValidationError::new(
                "radius",
                "Search radius must be at least 1 kilometer",
            ));
        }
        if self.radius_km > MAX_RADIUS_KM {
            return Err(ValidationError::new(
                "radius",
                "Search radius cannot exceed 50 kilometers",
            ));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ValidationError::new(
                    "min_price",
                    "minimum price cannot exceed maximum price",
                ));
            }
        }
        Ok(())
    }
}

fn require_number(raw: Option<&str>, field: &'static str) -> Result<f64, ValidationError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ValidationError::new(field, "is required"))?;
    raw.parse::<f64>()
        .map_err(|_| ValidationError::new(field, "must be a number"))
}

fn parse_price(raw: Option<&str>, field: &'static str) -> Result<Option<u32>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ValidationError::new(field, "must be a non-negative amount")),
    }
}

/// Audit record persisted for every executed search; never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub user: Option<UserId>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub gender: Option<Gender>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub facilities: BTreeSet<FacilityKey>,
    pub searched_at: DateTime<Utc>,
}

/// One room surfaced by a search, annotated with its listing's distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomMatch {
    pub room_id: RoomId,
    pub hostel_id: HostelId,
    pub hostel_name: String,
    pub room_type: RoomType,
    pub total_capacity: u32,
    pub available_capacity: u32,
    pub rent: u32,
    pub security_deposit: u32,
    pub facilities: BTreeSet<FacilityKey>,
    pub verified: bool,
    pub distance_km: f64,
    pub owner: OwnerContact,
}

/// Search response: rooms in ascending listing-distance order plus a count.
/// An empty result is a valid outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResults {
    pub count: usize,
    pub rooms: Vec<RoomMatch>,
}
