//! Authenticated principal model and the capability guards applied before
//! every mutating operation.
//!
//! Credentials live with the external identity provider; the core only ever
//! sees a resolved [`Principal`] and checks role, ownership, and reviewer
//! capability through the guard functions in this module.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identifier wrapper for registered users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub u64);

/// Marketplace roles carried by every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Owner,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Owner => "owner",
        }
    }
}

/// Gender vocabulary shared by user profiles and listing restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn as_key(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Resolved caller identity supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub gender: Gender,
    pub phone: String,
    pub phone_verified: bool,
    pub verified: bool,
    pub reviewer: bool,
}

/// Lookup boundary to the external identity provider.
pub trait PrincipalProvider: Send + Sync {
    fn principal(&self, id: UserId) -> Result<Option<Principal>, StoreError>;
}

/// Capability failures raised by the guards below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("authentication required")]
    MissingCredentials,
    #[error("unknown principal")]
    UnknownPrincipal,
    #[error("{} role required", .0.label())]
    RoleRequired(Role),
    #[error("reviewer capability required")]
    ReviewerRequired,
    #[error("caller does not own this hostel")]
    NotHostelOwner,
    #[error("caller does not own this record")]
    NotRecordOwner,
}

/// Principal resolution failure: either the caller is not authorized or the
/// provider itself was unreachable.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Header carrying the provider-resolved user id on inbound requests.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id_from_headers(headers: &HeaderMap) -> Result<Option<UserId>, AuthorizationError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(|id| Some(UserId(id)))
        .ok_or(AuthorizationError::UnknownPrincipal)
}

/// Resolve the caller, failing when no credential header is present.
pub fn authenticate<P: PrincipalProvider>(
    provider: &P,
    headers: &HeaderMap,
) -> Result<Principal, IdentityError> {
    let id = user_id_from_headers(headers)?.ok_or(AuthorizationError::MissingCredentials)?;
    provider
        .principal(id)?
        .ok_or_else(|| AuthorizationError::UnknownPrincipal.into())
}

/// Resolve the caller when a credential header is present, otherwise treat
/// the request as anonymous.
pub fn authenticate_optional<P: PrincipalProvider>(
    provider: &P,
    headers: &HeaderMap,
) -> Result<Option<Principal>, IdentityError> {
    match user_id_from_headers(headers)? {
        None => Ok(None),
        Some(id) => provider
            .principal(id)?
            .map(Some)
            .ok_or_else(|| AuthorizationError::UnknownPrincipal.into()),
    }
}

pub fn require_student(principal: &Principal) -> Result<(), AuthorizationError> {
    if principal.role == Role::Student {
        Ok(())
    } else {
        Err(AuthorizationError::RoleRequired(Role::Student))
    }
}

pub fn require_owner_role(principal: &Principal) -> Result<(), AuthorizationError> {
    if principal.role == Role::Owner {
        Ok(())
    } else {
        Err(AuthorizationError::RoleRequired(Role::Owner))
    }
}

pub fn require_reviewer(principal: &Principal) -> Result<(), AuthorizationError> {
    if principal.reviewer {
        Ok(())
    } else {
        Err(AuthorizationError::ReviewerRequired)
    }
}

pub fn require_hostel_owner(
    principal: &Principal,
    owner: UserId,
) -> Result<(), AuthorizationError> {
    if principal.id == owner {
        Ok(())
    } else {
        Err(AuthorizationError::NotHostelOwner)
    }
}
