use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{RepositoryError, StoreError, ValidationError};
use crate::identity::{require_reviewer, AuthorizationError, IdentityError, Principal};

use super::domain::{
    verification_fields, Evidence, RequestId, ReviewOutcome, ReviewRecord, TargetKind,
    VerificationRequest, VerificationStatus, VerificationTarget,
};
use super::otp::{whatsapp_link, OtpChallenge, OtpOutcome};
use super::repository::{
    ChangeObserver, NotificationError, NotificationSender, OtpDelivery, TargetStore,
    VerificationRepository,
};

/// Service owning the verification state machine: submissions, reviewer
/// decisions, passive invalidation, and the WhatsApp OTP sub-flow.
pub struct VerificationService<R, T, N> {
    repository: Arc<R>,
    targets: Arc<T>,
    notifier: Arc<N>,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("vr-{id:06}"))
}

/// Error raised by the verification service.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error("a pending {0} verification request already exists for this target")]
    DuplicatePending(TargetKind),
    #[error("verification request not found")]
    RequestNotFound,
    #[error("verification target not found")]
    TargetNotFound,
    #[error("request has already been decided")]
    AlreadyDecided,
    #[error("verify your account before submitting a hostel verification")]
    SubmitterNotVerified,
    #[error("verify the hostel before submitting a room verification")]
    HostelNotVerified,
    #[error("no verification code has been issued for this request")]
    NoActiveChallenge,
    #[error("verification code has expired")]
    OtpExpired,
    #[error("verification code does not match")]
    OtpMismatch,
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdentityError> for ModerationError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Authorization(err) => Self::Authorization(err),
            IdentityError::Store(err) => Self::Store(err),
        }
    }
}

impl<R, T, N> VerificationService<R, T, N>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(repository: Arc<R>, targets: Arc<T>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            targets,
            notifier,
        }
    }

    /// Submit a new verification request for review.
    pub fn submit(
        &self,
        principal: &Principal,
        target: VerificationTarget,
        evidence: Evidence,
        now: DateTime<Utc>,
    ) -> Result<VerificationRequest, ModerationError> {
        if evidence.kind() != target.kind() {
            return Err(ValidationError::new(
                "evidence",
                "evidence does not match the target kind",
            )
            .into());
        }
        evidence.validate()?;
        self.check_submission_preconditions(principal, target)?;

        let request = VerificationRequest {
            id: next_request_id(),
            submitter: principal.id,
            target,
            evidence,
            status: VerificationStatus::Pending,
            review: None,
            submitted_at: now,
            whatsapp_number: None,
            phone_challenge: None,
            phone_verified: false,
        };

        match self.repository.insert_pending(request) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => {
                Err(ModerationError::DuplicatePending(target.kind()))
            }
            Err(other) => Err(StoreError::from(other).into()),
        }
    }

    fn check_submission_preconditions(
        &self,
        principal: &Principal,
        target: VerificationTarget,
    ) -> Result<(), ModerationError> {
        match target {
            VerificationTarget::User(user) => {
                if user != principal.id {
                    return Err(AuthorizationError::NotRecordOwner.into());
                }
                if !self.targets.user_exists(user)? {
                    return Err(ModerationError::TargetNotFound);
                }
            }
            VerificationTarget::Hostel(hostel) => {
                if !principal.verified {
                    return Err(ModerationError::SubmitterNotVerified);
                }
                let owner = self
                    .targets
                    .hostel_owner(hostel)?
                    .ok_or(ModerationError::TargetNotFound)?;
                if owner != principal.id {
                    return Err(AuthorizationError::NotHostelOwner.into());
                }
            }
            VerificationTarget::Room(room) => {
                let hostel = self
                    .targets
                    .room_hostel(room)?
                    .ok_or(ModerationError::TargetNotFound)?;
                let owner = self
                    .targets
                    .hostel_owner(hostel)?
                    .ok_or(ModerationError::TargetNotFound)?;
                if owner != principal.id {
                    return Err(AuthorizationError::NotHostelOwner.into());
                }
                if !self
                    .targets
                    .is_verified(VerificationTarget::Hostel(hostel))?
                {
                    return Err(ModerationError::HostelNotVerified);
                }
            }
        }
        Ok(())
    }

    /// Record a reviewer decision. On approval the target's verified flag and
    /// the request status move together; a failed status write rolls the flag
    /// back so the two are never observed inconsistent.
    pub fn decide(
        &self,
        reviewer: &Principal,
        id: &RequestId,
        outcome: ReviewOutcome,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<VerificationRequest, ModerationError> {
        require_reviewer(reviewer)?;

        let mut request = self
            .repository
            .fetch(id)?
            .ok_or(ModerationError::RequestNotFound)?;
        if request.status != VerificationStatus::Pending {
            return Err(ModerationError::AlreadyDecided);
        }

        let notes = notes.map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
        if outcome == ReviewOutcome::Rejected && notes.is_none() {
            return Err(ValidationError::new("notes", "a rejection reason is required").into());
        }

        request.status = match outcome {
            ReviewOutcome::Approved => VerificationStatus::Approved,
            ReviewOutcome::Rejected => VerificationStatus::Rejected,
        };
        request.review = Some(ReviewRecord {
            reviewer: reviewer.id,
            notes,
            decided_at: now,
        });

        if outcome == ReviewOutcome::Approved {
            self.targets.set_verified(request.target, true)?;
        }

        if let Err(err) = self.repository.update(request.clone()) {
            if outcome == ReviewOutcome::Approved {
                let _ = self.targets.set_verified(request.target, false);
            }
            return Err(StoreError::from(err).into());
        }

        Ok(request)
    }

    /// Passive invalidation: when verification-relevant fields of the target
    /// changed, demote approved requests back to pending and clear the
    /// verified flag, together.
    pub fn entity_changed(
        &self,
        target: VerificationTarget,
        changed_fields: &[&'static str],
    ) -> Result<(), ModerationError> {
        let relevant = verification_fields(target.kind());
        if !changed_fields.iter().any(|field| relevant.contains(field)) {
            return Ok(());
        }

        let approved: Vec<VerificationRequest> = self
            .repository
            .for_target(target)?
            .into_iter()
            .filter(|request| request.status == VerificationStatus::Approved)
            .collect();

        self.targets.set_verified(target, false)?;

        let mut demoted: Vec<VerificationRequest> = Vec::new();
        for mut request in approved {
            request.status = VerificationStatus::Pending;
            if let Err(err) = self.repository.update(request.clone()) {
                for mut rollback in demoted {
                    rollback.status = VerificationStatus::Approved;
                    let _ = self.repository.update(rollback);
                }
                let _ = self.targets.set_verified(target, true);
                return Err(StoreError::from(err).into());
            }
            demoted.push(request);
        }

        Ok(())
    }

    /// Remove every request referencing a deleted target.
    pub fn entity_removed(&self, target: VerificationTarget) -> Result<(), ModerationError> {
        self.repository.remove_for_target(target)?;
        Ok(())
    }

    /// Issue a fresh OTP for the WhatsApp channel and hand the click-to-chat
    /// link to the notification sender. Returns the link for the caller.
    pub fn start_phone_challenge(
        &self,
        principal: &Principal,
        id: &RequestId,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ModerationError> {
        let mut request = self
            .repository
            .fetch(id)?
            .ok_or(ModerationError::RequestNotFound)?;
        if request.submitter != principal.id {
            return Err(AuthorizationError::NotRecordOwner.into());
        }
        if request.target.kind() != TargetKind::User {
            return Err(ValidationError::new(
                "request",
                "phone verification applies to user requests only",
            )
            .into());
        }
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(ValidationError::new(
                "whatsapp_number",
                "a WhatsApp number is required",
            )
            .into());
        }

        let challenge = OtpChallenge::issue(now);
        let message = format!(
            "Your Hostel Finder verification code is: {}",
            challenge.code
        );
        let link = whatsapp_link(phone, &message);

        request.whatsapp_number = Some(phone.to_string());
        request.phone_challenge = Some(challenge);
        request.phone_verified = false;
        self.repository
            .update(request)
            .map_err(StoreError::from)?;

        self.notifier.deliver(OtpDelivery {
            phone: phone.to_string(),
            link: link.clone(),
        })?;

        Ok(link)
    }

    /// Check a submitted OTP against the active challenge. Expired or
    /// mismatched codes fail without mutating any state.
    pub fn confirm_phone_challenge(
        &self,
        principal: &Principal,
        id: &RequestId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationRequest, ModerationError> {
        let mut request = self
            .repository
            .fetch(id)?
            .ok_or(ModerationError::RequestNotFound)?;
        if request.submitter != principal.id {
            return Err(AuthorizationError::NotRecordOwner.into());
        }
        let challenge = request
            .phone_challenge
            .as_ref()
            .ok_or(ModerationError::NoActiveChallenge)?;

        match challenge.verify(code, now) {
            OtpOutcome::Expired => Err(ModerationError::OtpExpired),
            OtpOutcome::Mismatch => Err(ModerationError::OtpMismatch),
            OtpOutcome::Verified => {
                request.phone_verified = true;
                self.repository
                    .update(request.clone())
                    .map_err(StoreError::from)?;
                Ok(request)
            }
        }
    }

    /// Reviewers see every request; everyone else sees their own.
    pub fn list_for(
        &self,
        principal: &Principal,
    ) -> Result<Vec<VerificationRequest>, ModerationError> {
        let requests = if principal.reviewer {
            self.repository.all()?
        } else {
            self.repository.for_submitter(principal.id)?
        };
        Ok(requests)
    }
}

impl<R, T, N> ChangeObserver for VerificationService<R, T, N>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
{
    fn entity_changed(
        &self,
        target: VerificationTarget,
        changed_fields: &[&'static str],
    ) -> Result<(), StoreError> {
        VerificationService::entity_changed(self, target, changed_fields)
            .map_err(|err| match err {
                ModerationError::Store(store) => store,
                other => StoreError::Unavailable(other.to_string()),
            })
    }

    fn entity_removed(&self, target: VerificationTarget) -> Result<(), StoreError> {
        VerificationService::entity_removed(self, target).map_err(|err| match err {
            ModerationError::Store(store) => store,
            other => StoreError::Unavailable(other.to_string()),
        })
    }
}
