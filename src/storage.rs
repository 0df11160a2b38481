//! Registration storage for the service graph
//!
//! Uses DashMap for lock-free concurrent access.

use crate::{CallSite, Result, ServiceType};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A registered call site plus its memoized validation outcome.
pub(crate) struct Registration {
    pub(crate) call_site: Arc<CallSite>,
    /// Registration sequence number; build validates in this order
    order: u64,
    validation: OnceCell<Result<()>>,
}

impl Registration {
    /// Run `validate` at most once and return its outcome.
    #[inline]
    pub(crate) fn validated_with<F>(&self, validate: F) -> Result<()>
    where
        F: FnOnce(&CallSite) -> Result<()>,
    {
        self.validation
            .get_or_init(|| validate(&self.call_site))
            .clone()
    }

    #[inline]
    pub(crate) fn is_validated(&self) -> bool {
        self.validation.get().is_some()
    }
}

/// Thread-safe map from service type to registration.
pub(crate) struct RegistrationStorage {
    registrations: DashMap<ServiceType, Arc<Registration>, RandomState>,
    next_order: AtomicU64,
}

impl RegistrationStorage {
    /// Create empty storage; 8 shards suit typical graphs of a few dozen services.
    #[inline]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        };
        Self {
            registrations: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
            next_order: AtomicU64::new(0),
        }
    }

    /// Insert or replace; a replacement starts unvalidated.
    ///
    /// Returns true when an earlier registration was replaced.
    pub(crate) fn insert(&self, service_type: ServiceType, call_site: CallSite) -> bool {
        let registration = Registration {
            call_site: Arc::new(call_site),
            order: self.next_order.fetch_add(1, Ordering::Relaxed),
            validation: OnceCell::new(),
        };
        self.registrations
            .insert(service_type, Arc::new(registration))
            .is_some()
    }

    #[inline]
    pub(crate) fn get(&self, service_type: &ServiceType) -> Option<Arc<Registration>> {
        self.registrations.get(service_type).map(|r| Arc::clone(r.value()))
    }

    #[inline]
    pub(crate) fn contains(&self, service_type: &ServiceType) -> bool {
        self.registrations.contains_key(service_type)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// All registrations, oldest first.
    pub(crate) fn in_order(&self) -> Vec<(ServiceType, Arc<Registration>)> {
        let mut entries: Vec<_> = self
            .registrations
            .iter()
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();
        entries.sort_by_key(|(_, registration)| registration.order);
        entries
    }
}

impl std::fmt::Debug for RegistrationStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationStorage")
            .field("count", &self.len())
            .finish()
    }
}
