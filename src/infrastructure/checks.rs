use crate::domain::order::Order;
use crate::domain::ports::{Clock, CommitReadiness, InventoryCheck};
use crate::error::CredentialDefect;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Order checks answered from configured flags instead of live services.
///
/// Everything passes by default.
#[derive(Debug)]
pub struct StaticOrderChecks {
    inventory: AtomicBool,
    can_commit: AtomicBool,
    valid_artwork_version: AtomicBool,
    credit_card_defect: Mutex<Option<CredentialDefect>>,
}

impl Default for StaticOrderChecks {
    fn default() -> Self {
        Self {
            inventory: AtomicBool::new(true),
            can_commit: AtomicBool::new(true),
            valid_artwork_version: AtomicBool::new(true),
            credit_card_defect: Mutex::new(None),
        }
    }
}

impl StaticOrderChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_inventory(&self, available: bool) {
        self.inventory.store(available, Ordering::SeqCst);
    }

    pub fn set_can_commit(&self, can_commit: bool) {
        self.can_commit.store(can_commit, Ordering::SeqCst);
    }

    pub fn set_valid_artwork_version(&self, valid: bool) {
        self.valid_artwork_version.store(valid, Ordering::SeqCst);
    }

    pub fn set_credit_card_defect(&self, defect: Option<CredentialDefect>) {
        *self
            .credit_card_defect
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = defect;
    }
}

#[async_trait]
impl InventoryCheck for StaticOrderChecks {
    async fn has_inventory(&self, _order: &Order) -> bool {
        self.inventory.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitReadiness for StaticOrderChecks {
    async fn can_commit(&self, _order: &Order) -> bool {
        self.can_commit.load(Ordering::SeqCst)
    }

    async fn valid_artwork_version(&self, _order: &Order) -> bool {
        self.valid_artwork_version.load(Ordering::SeqCst)
    }

    async fn credit_card_defect(&self, _order: &Order) -> Option<CredentialDefect> {
        *self
            .credit_card_defect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
