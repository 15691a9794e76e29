//! Verification workflow: a per-entity state machine gating the verified
//! badge on admin review of submitted evidence, with passive invalidation
//! when the covered fields change afterwards.

pub mod domain;
pub mod otp;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    verification_fields, CaptureSource, DocumentRef, Evidence, RequestId, ReviewOutcome,
    ReviewRecord, RoomImage, TargetKind, VerificationRequest, VerificationRequestView,
    VerificationStatus, VerificationTarget,
};
pub use otp::{whatsapp_link, OtpChallenge, OtpOutcome};
pub use repository::{
    ChangeObserver, NotificationError, NotificationSender, NullObserver, OtpDelivery,
    TargetStore, VerificationRepository,
};
pub use router::{moderation_router, ModerationRoutes};
pub use service::{ModerationError, VerificationService};
