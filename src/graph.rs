//! Service graph
//!
//! The `ServiceGraph` holds one call-site tree per registered service and
//! the [`CallSiteValidator`] that guards it. Registration happens first,
//! `build()` locks the graph and validates, and [`ResolutionScope`]s check
//! every request before handing a call site to the caller to materialize.

use crate::scope::ResolutionScope;
use crate::storage::{Registration, RegistrationStorage};
use crate::{
    CallSite, CallSiteValidator, CaptureView, DiError, Result, ServiceType, ValidationOptions,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Registered call sites plus their lifetime validation.
///
/// Cloning is cheap and shares the same registrations and capture table.
///
/// # Examples
///
/// ```rust
/// use callsite_validator::{CallSite, DiError, ServiceGraph, ServiceType};
///
/// struct AppConfig;
/// struct DbContext;
///
/// let config = ServiceType::of::<AppConfig>();
/// let db = ServiceType::of::<DbContext>();
///
/// let graph = ServiceGraph::new();
/// graph
///     .register(config, CallSite::singleton(config, CallSite::new_of::<AppConfig>()))
///     .unwrap();
/// graph
///     .register(db, CallSite::scoped(db, CallSite::new_of::<DbContext>()))
///     .unwrap();
/// graph.build().unwrap();
///
/// assert!(graph.root().resolve(config).is_ok());
/// assert!(matches!(
///     graph.root().resolve(db),
///     Err(DiError::DirectScopedFromRoot { .. })
/// ));
/// assert!(graph.create_scope().resolve(db).is_ok());
/// ```
#[derive(Clone)]
pub struct ServiceGraph {
    storage: Arc<RegistrationStorage>,
    validator: Arc<CallSiteValidator>,
    options: ValidationOptions,
    locked: Arc<AtomicBool>,
}

impl ServiceGraph {
    /// Create an empty graph with default options.
    #[inline]
    pub fn new() -> Self {
        Self::with_options(ValidationOptions::default())
    }

    #[inline]
    pub fn with_options(options: ValidationOptions) -> Self {
        Self::with_capacity(0, options)
    }

    /// Create with pre-allocated room for `capacity` services.
    pub fn with_capacity(capacity: usize, options: ValidationOptions) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "callsite_validator",
            capacity,
            validate_scopes = options.validates_scopes(),
            validate_on_build = options.validates_on_build(),
            "Creating service graph"
        );

        Self {
            storage: Arc::new(RegistrationStorage::with_capacity(capacity)),
            validator: Arc::new(CallSiteValidator::with_capacity(capacity)),
            options,
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register the call-site tree for `service_type`, replacing any earlier one.
    pub fn register(&self, service_type: ServiceType, call_site: CallSite) -> Result<()> {
        if self.is_locked() {
            return Err(DiError::Locked);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "callsite_validator",
            service = service_type.name(),
            kind = call_site.kind(),
            replaces = self.storage.contains(&service_type),
            "Registering call site"
        );

        self.storage.insert(service_type, call_site);

        Ok(())
    }

    /// Lock the graph and, if enabled, validate every registration.
    ///
    /// Every service is validated even after a failure; all failures are
    /// returned together in registration order. Building again returns the
    /// same outcome.
    pub fn build(&self) -> Result<()> {
        self.locked.store(true, Ordering::Release);

        if !self.options.validates_on_build() {
            #[cfg(feature = "logging")]
            debug!(
                target: "callsite_validator",
                service_count = self.storage.len(),
                "Graph built, validation deferred to first resolution"
            );
            return Ok(());
        }

        let errors: Vec<DiError> = self
            .storage
            .in_order()
            .into_iter()
            .filter_map(|(service_type, registration)| {
                self.ensure_validated(service_type, &registration).err()
            })
            .collect();

        if errors.is_empty() {
            #[cfg(feature = "logging")]
            debug!(
                target: "callsite_validator",
                service_count = self.storage.len(),
                captured = self.validator.len(),
                "Graph built and validated"
            );
            Ok(())
        } else {
            #[cfg(feature = "logging")]
            warn!(
                target: "callsite_validator",
                failures = errors.len(),
                "Graph validation failed"
            );
            Err(DiError::BuildFailed { errors })
        }
    }

    /// Validate a registration once; later calls return the memoized outcome.
    pub(crate) fn ensure_validated(
        &self,
        service_type: ServiceType,
        registration: &Registration,
    ) -> Result<()> {
        registration.validated_with(|call_site| {
            self.validator
                .validate_call_site(service_type, call_site)
                .map(|_| ())
        })
    }

    pub(crate) fn registration(&self, service_type: ServiceType) -> Result<Arc<Registration>> {
        self.storage
            .get(&service_type)
            .ok_or_else(|| DiError::not_found(service_type))
    }

    /// The root scope
    #[inline]
    pub fn root(&self) -> ResolutionScope {
        ResolutionScope::root(self.clone())
    }

    /// A fresh child scope of the root
    #[inline]
    pub fn create_scope(&self) -> ResolutionScope {
        ResolutionScope::child(self.clone())
    }

    #[inline]
    pub fn contains(&self, service_type: ServiceType) -> bool {
        self.storage.contains(&service_type)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    #[inline]
    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Read-only view of this graph's capture table.
    #[inline]
    pub fn captures(&self) -> CaptureView<'_> {
        self.validator.view()
    }

    /// Resolution-time check against the capture table.
    #[inline]
    pub(crate) fn validate_resolution(&self, service_type: ServiceType, is_root_scope: bool) -> Result<()> {
        self.validator.validate_resolution(service_type, is_root_scope)
    }
}

impl Default for ServiceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceGraph")
            .field("services", &self.len())
            .field("captured", &self.validator.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}
