use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{Gender, UserId};

/// Identifier wrapper for hostel listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct HostelId(pub u64);

/// Identifier wrapper for rentable rooms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RoomId(pub u64);

/// Cities the marketplace operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Karachi,
    Lahore,
    Islamabad,
    Multan,
    Bahawalpur,
    Rawalpindi,
    Faisalabad,
    Peshawar,
    Quetta,
}

impl City {
    pub const fn as_key(self) -> &'static str {
        match self {
            City::Karachi => "karachi",
            City::Lahore => "lahore",
            City::Islamabad => "islamabad",
            City::Multan => "multan",
            City::Bahawalpur => "bahawalpur",
            City::Rawalpindi => "rawalpindi",
            City::Faisalabad => "faisalabad",
            City::Peshawar => "peshawar",
            City::Quetta => "quetta",
        }
    }
}

/// Room layouts offered by hostels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Shared,
    Independent,
}

impl RoomType {
    pub const fn label(self) -> &'static str {
        match self {
            RoomType::Shared => "shared",
            RoomType::Independent => "independent",
        }
    }
}

/// Fixed facility vocabulary; search filters and room records both draw from
/// this set, so an unknown key is always a validation failure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKey {
    Wifi,
    Laundry,
    Mess,
    Ac,
    Heater,
    Parking,
    Security,
    Cctv,
    Generator,
    StudyArea,
}

impl FacilityKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "wifi" => Some(Self::Wifi),
            "laundry" => Some(Self::Laundry),
            "mess" => Some(Self::Mess),
            "ac" => Some(Self::Ac),
            "heater" => Some(Self::Heater),
            "parking" => Some(Self::Parking),
            "security" => Some(Self::Security),
            "cctv" => Some(Self::Cctv),
            "generator" => Some(Self::Generator),
            "study_area" => Some(Self::StudyArea),
            _ => None,
        }
    }

    pub const fn as_key(self) -> &'static str {
        match self {
            FacilityKey::Wifi => "wifi",
            FacilityKey::Laundry => "laundry",
            FacilityKey::Mess => "mess",
            FacilityKey::Ac => "ac",
            FacilityKey::Heater => "heater",
            FacilityKey::Parking => "parking",
            FacilityKey::Security => "security",
            FacilityKey::Cctv => "cctv",
            FacilityKey::Generator => "generator",
            FacilityKey::StudyArea => "study_area",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FacilityKey::Wifi => "Wi-Fi",
            FacilityKey::Laundry => "Laundry",
            FacilityKey::Mess => "Mess / Dining",
            FacilityKey::Ac => "Air Conditioning",
            FacilityKey::Heater => "Room Heater",
            FacilityKey::Parking => "Parking",
            FacilityKey::Security => "24/7 Security",
            FacilityKey::Cctv => "CCTV Cameras",
            FacilityKey::Generator => "Backup Generator",
            FacilityKey::StudyArea => "Study Area",
        }
    }
}

/// A hostel listing owned by an owner-role user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hostel {
    pub id: HostelId,
    pub owner: UserId,
    pub name: String,
    pub city: City,
    pub latitude: f64,
    pub longitude: f64,
    pub map_link: Option<String>,
    pub gender: Gender,
    pub description: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// A rentable unit within a hostel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub hostel: HostelId,
    pub room_type: RoomType,
    pub media: Vec<String>,
    pub total_capacity: u32,
    pub available_capacity: u32,
    pub rent: u32,
    pub security_deposit: u32,
    pub facilities: BTreeSet<FacilityKey>,
    pub description: Option<String>,
    pub is_available: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Owner contact details surfaced on search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerContact {
    pub id: UserId,
    pub full_name: String,
    pub phone: String,
    pub verified: bool,
}

/// Inbound listing fields, validated before they touch the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostelDraft {
    pub name: String,
    pub city: City,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub map_link: Option<String>,
    pub gender: Gender,
    #[serde(default)]
    pub description: Option<String>,
}

impl HostelDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "name must not be empty"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::new(
                "latitude",
                "Latitude must be between -90 and 90 degrees",
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::new(
                "longitude",
                "Longitude must be between -180 and 180 degrees",
            ));
        }
        Ok(())
    }
}

/// Inbound room fields, validated before they touch the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDraft {
    pub room_type: RoomType,
    #[serde(default)]
    pub media: Vec<String>,
    pub total_capacity: u32,
    pub available_capacity: u32,
    pub rent: u32,
    pub security_deposit: u32,
    #[serde(default)]
    pub facilities: BTreeSet<FacilityKey>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl RoomDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total_capacity == 0 {
            return Err(ValidationError::new(
                "total_capacity",
                "total capacity must be at least 1",
            ));
        }
        if self.available_capacity > self.total_capacity {
            return Err(ValidationError::new(
                "available_capacity",
                format!(
                    "available capacity {} exceeds total capacity {}",
                    self.available_capacity, self.total_capacity
                ),
            ));
        }
        if self.rent == 0 {
            return Err(ValidationError::new("rent", "rent must be positive"));
        }
        if self.security_deposit == 0 {
            return Err(ValidationError::new(
                "security_deposit",
                "security deposit must be positive",
            ));
        }
        Ok(())
    }
}

/// Field names that differ between two revisions of a hostel. The workflow
/// module filters this list against its verification-relevant subset.
pub fn hostel_changed_fields(before: &Hostel, after: &Hostel) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if before.name != after.name {
        changed.push("name");
    }
    if before.city != after.city {
        changed.push("city");
    }
    if before.latitude != after.latitude {
        changed.push("latitude");
    }
    if before.longitude != after.longitude {
        changed.push("longitude");
    }
    if before.map_link != after.map_link {
        changed.push("map_link");
    }
    if before.gender != after.gender {
        changed.push("gender");
    }
    if before.description != after.description {
        changed.push("description");
    }
    changed
}

/// Field names that differ between two revisions of a room.
pub fn room_changed_fields(before: &Room, after: &Room) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if before.room_type != after.room_type {
        changed.push("room_type");
    }
    if before.total_capacity != after.total_capacity {
        changed.push("total_capacity");
    }
    if before.available_capacity != after.available_capacity {
        changed.push("available_capacity");
    }
    if before.rent != after.rent {
        changed.push("rent");
    }
    if before.security_deposit != after.security_deposit {
        changed.push("security_deposit");
    }
    if before.facilities != after.facilities {
        changed.push("facilities");
    }
    if before.description != after.description {
        changed.push("description");
    }
    if before.media != after.media {
        changed.push("media");
    }
    if before.is_available != after.is_available {
        changed.push("is_available");
    }
    changed
}
