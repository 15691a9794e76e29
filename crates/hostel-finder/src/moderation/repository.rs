use crate::catalog::HostelId;
use crate::error::{RepositoryError, StoreError};
use crate::identity::UserId;

use super::domain::{RequestId, VerificationRequest, VerificationTarget};

/// Storage abstraction for verification requests.
pub trait VerificationRepository: Send + Sync {
    /// Insert a new pending request, failing with `Conflict` when the target
    /// already has one in flight. Implementations must serialize the
    /// uniqueness check with the insert; a check-then-insert in the caller
    /// races under concurrent submissions.
    fn insert_pending(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError>;
    fn update(&self, request: VerificationRequest) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<VerificationRequest>, StoreError>;
    fn for_target(
        &self,
        target: VerificationTarget,
    ) -> Result<Vec<VerificationRequest>, StoreError>;
    fn for_submitter(&self, user: UserId) -> Result<Vec<VerificationRequest>, StoreError>;
    fn all(&self) -> Result<Vec<VerificationRequest>, StoreError>;
    /// Drop every request referencing the target, returning how many were
    /// removed. Used on target deletion so no dangling references survive.
    fn remove_for_target(&self, target: VerificationTarget) -> Result<usize, StoreError>;
}

/// Lookup and verified-flag access for the entities a request can vouch for.
pub trait TargetStore: Send + Sync {
    fn user_exists(&self, id: UserId) -> Result<bool, StoreError>;
    fn hostel_owner(&self, id: HostelId) -> Result<Option<UserId>, StoreError>;
    fn room_hostel(&self, id: crate::catalog::RoomId) -> Result<Option<HostelId>, StoreError>;
    fn is_verified(&self, target: VerificationTarget) -> Result<bool, StoreError>;
    fn set_verified(&self, target: VerificationTarget, verified: bool) -> Result<(), StoreError>;
}

/// Payload handed to the external messaging channel; the core only formats
/// it, delivery is not its concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDelivery {
    pub phone: String,
    pub link: String,
}

pub trait NotificationSender: Send + Sync {
    fn deliver(&self, delivery: OtpDelivery) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification channel unavailable: {0}")]
    Channel(String),
}

/// Entity-mutation events the verification workflow subscribes to. The
/// catalog calls these with the changed-field diff instead of relying on an
/// implicit save hook.
pub trait ChangeObserver: Send + Sync {
    fn entity_changed(
        &self,
        target: VerificationTarget,
        changed_fields: &[&'static str],
    ) -> Result<(), StoreError>;
    fn entity_removed(&self, target: VerificationTarget) -> Result<(), StoreError>;
}

/// Observer for compositions that run without the verification workflow.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ChangeObserver for NullObserver {
    fn entity_changed(
        &self,
        _target: VerificationTarget,
        _changed_fields: &[&'static str],
    ) -> Result<(), StoreError> {
        Ok(())
    }

    fn entity_removed(&self, _target: VerificationTarget) -> Result<(), StoreError> {
        Ok(())
    }
}
