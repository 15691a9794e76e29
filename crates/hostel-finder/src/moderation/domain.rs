use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{HostelId, RoomId};
use crate::error::ValidationError;
use crate::identity::UserId;

use super::otp::OtpChallenge;

/// Identifier wrapper for verification requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// The entity a verification request vouches for. Exactly one variant, never
/// a row of nullable references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VerificationTarget {
    User(UserId),
    Hostel(HostelId),
    Room(RoomId),
}

impl VerificationTarget {
    pub const fn kind(self) -> TargetKind {
        match self {
            VerificationTarget::User(_) => TargetKind::User,
            VerificationTarget::Hostel(_) => TargetKind::Hostel,
            VerificationTarget::Room(_) => TargetKind::Room,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    User,
    Hostel,
    Room,
}

impl TargetKind {
    pub const fn label(self) -> &'static str {
        match self {
            TargetKind::User => "user",
            TargetKind::Hostel => "hostel",
            TargetKind::Room => "room",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque reference into the external document/media store. The core never
/// touches pixel data, only references and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef(pub String);

impl DocumentRef {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// How a room image was captured. Gallery uploads are rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    Camera,
    Gallery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomImage {
    pub reference: DocumentRef,
    pub source: CaptureSource,
}

/// Kind-specific evidence submitted with a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    User {
        cnic_front: DocumentRef,
        cnic_back: DocumentRef,
        passport_photo: DocumentRef,
    },
    Hostel {
        utility_bill: DocumentRef,
    },
    Room {
        images: Vec<RoomImage>,
    },
}

impl Evidence {
    pub const fn kind(&self) -> TargetKind {
        match self {
            Evidence::User { .. } => TargetKind::User,
            Evidence::Hostel { .. } => TargetKind::Hostel,
            Evidence::Room { .. } => TargetKind::Room,
        }
    }

    /// Completeness rules per kind; the whole submission fails on the first
    /// missing or ineligible piece, nothing is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Evidence::User {
                cnic_front,
                cnic_back,
                passport_photo,
            } => {
                if cnic_front.is_empty() {
                    return Err(ValidationError::new(
                        "cnic_front",
                        "front CNIC image is required",
                    ));
                }
                if cnic_back.is_empty() {
                    return Err(ValidationError::new(
                        "cnic_back",
                        "back CNIC image is required",
                    ));
                }
                if passport_photo.is_empty() {
                    return Err(ValidationError::new(
                        "passport_photo",
                        "passport-style photo is required",
                    ));
                }
            }
            Evidence::Hostel { utility_bill } => {
                if utility_bill.is_empty() {
                    return Err(ValidationError::new(
                        "utility_bill",
                        "utility bill or property document is required",
                    ));
                }
            }
            Evidence::Room { images } => {
                if images.is_empty() {
                    return Err(ValidationError::new(
                        "images",
                        "at least one room image is required",
                    ));
                }
                if images
                    .iter()
                    .any(|image| image.source == CaptureSource::Gallery)
                {
                    return Err(ValidationError::new(
                        "images",
                        "gallery-sourced images are not accepted",
                    ));
                }
                if images.iter().any(|image| image.reference.is_empty()) {
                    return Err(ValidationError::new(
                        "images",
                        "every room image needs a storage reference",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// Admin decision recorded on terminal states; retained through a passive
/// demotion for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewer: UserId,
    pub notes: Option<String>,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Approved,
    Rejected,
}

/// A verification request owned by the submitting user; the target is a weak
/// reference used for lookup only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: RequestId,
    pub submitter: UserId,
    pub target: VerificationTarget,
    pub evidence: Evidence,
    pub status: VerificationStatus,
    pub review: Option<ReviewRecord>,
    pub submitted_at: DateTime<Utc>,
    pub whatsapp_number: Option<String>,
    pub phone_challenge: Option<OtpChallenge>,
    pub phone_verified: bool,
}

impl VerificationRequest {
    /// Sanitized representation for API responses; the active OTP code never
    /// leaves the store.
    pub fn view(&self) -> VerificationRequestView {
        VerificationRequestView {
            id: self.id.clone(),
            submitter: self.submitter,
            target: self.target,
            status: self.status.label(),
            review: self.review.clone(),
            submitted_at: self.submitted_at,
            phone_verified: self.phone_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationRequestView {
    pub id: RequestId,
    pub submitter: UserId,
    pub target: VerificationTarget,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewRecord>,
    pub submitted_at: DateTime<Utc>,
    pub phone_verified: bool,
}

/// Fields whose change invalidates an approved verification, per kind.
pub const USER_VERIFICATION_FIELDS: &[&str] = &["name", "phone", "email", "city"];
pub const HOSTEL_VERIFICATION_FIELDS: &[&str] =
    &["name", "city", "latitude", "longitude", "map_link"];
pub const ROOM_VERIFICATION_FIELDS: &[&str] = &[
    "room_type",
    "total_capacity",
    "available_capacity",
    "rent",
    "security_deposit",
    "facilities",
    "description",
];

pub fn verification_fields(kind: TargetKind) -> &'static [&'static str] {
    match kind {
        TargetKind::User => USER_VERIFICATION_FIELDS,
        TargetKind::Hostel => HOSTEL_VERIFICATION_FIELDS,
        TargetKind::Room => ROOM_VERIFICATION_FIELDS,
    }
}
