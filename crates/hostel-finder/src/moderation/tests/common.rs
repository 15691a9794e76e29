use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::catalog::{HostelId, RoomId};
use crate::error::{RepositoryError, StoreError};
use crate::identity::{Gender, Principal, Role, UserId};
use crate::moderation::domain::{
    CaptureSource, DocumentRef, Evidence, RequestId, RoomImage, VerificationRequest,
    VerificationStatus, VerificationTarget,
};
use crate::moderation::repository::{
    NotificationError, NotificationSender, OtpDelivery, TargetStore, VerificationRepository,
};
use crate::moderation::service::VerificationService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 12, 14, 0, 0).unwrap()
}

pub(super) fn owner(id: u64, verified: bool) -> Principal {
    Principal {
        id: UserId(id),
        role: Role::Owner,
        gender: Gender::Male,
        phone: "03001234567".to_string(),
        phone_verified: false,
        verified,
        reviewer: false,
    }
}

pub(super) fn reviewer(id: u64) -> Principal {
    Principal {
        id: UserId(id),
        role: Role::Owner,
        gender: Gender::Other,
        phone: "03009999999".to_string(),
        phone_verified: true,
        verified: true,
        reviewer: true,
    }
}

pub(super) fn doc(reference: &str) -> DocumentRef {
    DocumentRef(reference.to_string())
}

pub(super) fn user_evidence() -> Evidence {
    Evidence::User {
        cnic_front: doc("media://cnic-front"),
        cnic_back: doc("media://cnic-back"),
        passport_photo: doc("media://photo"),
    }
}

pub(super) fn hostel_evidence() -> Evidence {
    Evidence::Hostel {
        utility_bill: doc("media://bill"),
    }
}

pub(super) fn camera_images(count: usize) -> Evidence {
    Evidence::Room {
        images: (0..count)
            .map(|index| RoomImage {
                reference: doc(&format!("media://room-{index}")),
                source: CaptureSource::Camera,
            })
            .collect(),
    }
}

#[derive(Default)]
pub(super) struct MemoryVerifications {
    pub(super) requests: Mutex<Vec<VerificationRequest>>,
    pub(super) fail_updates: Mutex<bool>,
}

impl MemoryVerifications {
    pub(super) fn fail_updates(&self) {
        *self.fail_updates.lock().expect("flag mutex poisoned") = true;
    }

    pub(super) fn stored(&self, id: &RequestId) -> Option<VerificationRequest> {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .iter()
            .find(|request| &request.id == id)
            .cloned()
    }
}

impl VerificationRepository for MemoryVerifications {
    fn insert_pending(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError> {
        // Check and insert under one lock, the in-memory equivalent of a
        // partial unique index on (target, status=pending).
        let mut guard = self.requests.lock().expect("request mutex poisoned");
        if guard.iter().any(|existing| {
            existing.target == request.target
                && existing.status == VerificationStatus::Pending
        }) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(request.clone());
        Ok(request)
    }

    fn update(&self, request: VerificationRequest) -> Result<(), RepositoryError> {
        if *self.fail_updates.lock().expect("flag mutex poisoned") {
            return Err(RepositoryError::Unavailable("updates disabled".to_string()));
        }
        let mut guard = self.requests.lock().expect("request mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == request.id) {
            Some(existing) => {
                *existing = request;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<VerificationRequest>, StoreError> {
        Ok(self.stored(id))
    }

    fn for_target(
        &self,
        target: VerificationTarget,
    ) -> Result<Vec<VerificationRequest>, StoreError> {
        Ok(self
            .requests
            .lock()
            .expect("request mutex poisoned")
            .iter()
            .filter(|request| request.target == target)
            .cloned()
            .collect())
    }

    fn for_submitter(&self, user: UserId) -> Result<Vec<VerificationRequest>, StoreError> {
        Ok(self
            .requests
            .lock()
            .expect("request mutex poisoned")
            .iter()
            .filter(|request| request.submitter == user)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<VerificationRequest>, StoreError> {
        Ok(self
            .requests
            .lock()
            .expect("request mutex poisoned")
            .clone())
    }

    fn remove_for_target(&self, target: VerificationTarget) -> Result<usize, StoreError> {
        let mut guard = self.requests.lock().expect("request mutex poisoned");
        let before = guard.len();
        guard.retain(|request| request.target != target);
        Ok(before - guard.len())
    }
}

#[derive(Default)]
pub(super) struct MemoryTargets {
    pub(super) users: Mutex<HashSet<UserId>>,
    pub(super) hostel_owners: Mutex<HashMap<HostelId, UserId>>,
    pub(super) room_hostels: Mutex<HashMap<RoomId, HostelId>>,
    pub(super) verified: Mutex<HashSet<VerificationTarget>>,
}

impl MemoryTargets {
    pub(super) fn with_user(self, id: u64) -> Self {
        self.users.lock().expect("user mutex poisoned").insert(UserId(id));
        self
    }

    pub(super) fn with_hostel(self, hostel: u64, owner: u64) -> Self {
        self.hostel_owners
            .lock()
            .expect("hostel mutex poisoned")
            .insert(HostelId(hostel), UserId(owner));
        self
    }

    pub(super) fn with_room(self, room: u64, hostel: u64) -> Self {
        self.room_hostels
            .lock()
            .expect("room mutex poisoned")
            .insert(RoomId(room), HostelId(hostel));
        self
    }

    pub(super) fn mark_verified(&self, target: VerificationTarget) {
        self.verified
            .lock()
            .expect("verified mutex poisoned")
            .insert(target);
    }

    pub(super) fn verified_contains(&self, target: VerificationTarget) -> bool {
        self.verified
            .lock()
            .expect("verified mutex poisoned")
            .contains(&target)
    }
}

impl TargetStore for MemoryTargets {
    fn user_exists(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.users.lock().expect("user mutex poisoned").contains(&id))
    }

    fn hostel_owner(&self, id: HostelId) -> Result<Option<UserId>, StoreError> {
        Ok(self
            .hostel_owners
            .lock()
            .expect("hostel mutex poisoned")
            .get(&id)
            .copied())
    }

    fn room_hostel(&self, id: RoomId) -> Result<Option<HostelId>, StoreError> {
        Ok(self
            .room_hostels
            .lock()
            .expect("room mutex poisoned")
            .get(&id)
            .copied())
    }

    fn is_verified(&self, target: VerificationTarget) -> Result<bool, StoreError> {
        Ok(self.verified_contains(target))
    }

    fn set_verified(&self, target: VerificationTarget, verified: bool) -> Result<(), StoreError> {
        let mut guard = self.verified.lock().expect("verified mutex poisoned");
        if verified {
            guard.insert(target);
        } else {
            guard.remove(&target);
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    pub(super) deliveries: Mutex<Vec<OtpDelivery>>,
}

impl MemoryNotifier {
    pub(super) fn deliveries(&self) -> Vec<OtpDelivery> {
        self.deliveries
            .lock()
            .expect("delivery mutex poisoned")
            .clone()
    }
}

impl NotificationSender for MemoryNotifier {
    fn deliver(&self, delivery: OtpDelivery) -> Result<(), NotificationError> {
        self.deliveries
            .lock()
            .expect("delivery mutex poisoned")
            .push(delivery);
        Ok(())
    }
}

pub(super) type Service = VerificationService<MemoryVerifications, MemoryTargets, MemoryNotifier>;

pub(super) fn build_service(
    targets: MemoryTargets,
) -> (
    Service,
    Arc<MemoryVerifications>,
    Arc<MemoryTargets>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryVerifications::default());
    let targets = Arc::new(targets);
    let notifier = Arc::new(MemoryNotifier::default());
    let service = VerificationService::new(repository.clone(), targets.clone(), notifier.clone());
    (service, repository, targets, notifier)
}
