//! Captive-dependency validation
//!
//! [`CallSiteValidator`] walks each service's call-site graph once at build
//! time. A scoped node below a singleton is rejected on the spot. Otherwise
//! the first scoped service found is remembered in the capture table, which
//! [`CallSiteValidator::validate_resolution`] consults whenever the root
//! scope resolves that service.

use crate::call_site::{
    CallSite, ClosedEnumerableCallSite, ConstructorCallSite, InterceptionCallSite,
    ScopedCallSite, SingletonCallSite, TransientCallSite,
};
use crate::visitor::{walk, CallSiteVisitor, Descend};
use crate::{DiError, Result, ServiceType};
use ahash::RandomState;
use dashmap::DashMap;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Path state: the nearest singleton above the current node, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationState {
    singleton: Option<ServiceType>,
}

impl ValidationState {
    /// Nearest enclosing singleton on this path
    #[inline]
    pub fn singleton(&self) -> Option<ServiceType> {
        self.singleton
    }
}

/// The lifetime rules, one hook per node kind.
///
/// Output is the first scoped service found in the subtree.
struct ScopeRules;

impl ScopeRules {
    fn first_captured(results: Vec<Option<ServiceType>>) -> Option<ServiceType> {
        results.into_iter().flatten().next()
    }
}

impl CallSiteVisitor for ScopeRules {
    type State = ValidationState;
    type Output = Option<ServiceType>;
    type Error = DiError;

    fn enter_transient(
        &mut self,
        _site: &TransientCallSite,
        state: &ValidationState,
    ) -> Result<Descend<ValidationState, Option<ServiceType>>> {
        Ok(Descend::Into(*state))
    }

    fn enter_singleton(
        &mut self,
        site: &SingletonCallSite,
        _state: &ValidationState,
    ) -> Result<Descend<ValidationState, Option<ServiceType>>> {
        Ok(Descend::Into(ValidationState {
            singleton: Some(site.service_type),
        }))
    }

    fn enter_scoped(
        &mut self,
        site: &ScopedCallSite,
        state: &ValidationState,
    ) -> Result<Descend<ValidationState, Option<ServiceType>>> {
        // scope accessors are fine to hold from singletons
        if matches!(*site.service, CallSite::ServiceScopeService) {
            return Ok(Descend::Stop(None));
        }

        if let Some(singleton) = state.singleton {
            #[cfg(feature = "logging")]
            warn!(
                target: "callsite_validator",
                scoped = site.service_type.name(),
                singleton = singleton.name(),
                "Scoped service captured by singleton"
            );

            return Err(DiError::scoped_in_singleton(site.service_type, singleton));
        }

        Ok(Descend::Stop(Some(site.service_type)))
    }

    fn enter_interception(
        &mut self,
        _site: &InterceptionCallSite,
        state: &ValidationState,
    ) -> Result<Descend<ValidationState, Option<ServiceType>>> {
        Ok(Descend::Into(*state))
    }

    fn combine_constructor(
        &mut self,
        _site: &ConstructorCallSite,
        results: Vec<Option<ServiceType>>,
    ) -> Option<ServiceType> {
        Self::first_captured(results)
    }

    fn combine_enumerable(
        &mut self,
        _site: &ClosedEnumerableCallSite,
        results: Vec<Option<ServiceType>>,
    ) -> Option<ServiceType> {
        Self::first_captured(results)
    }

    fn visit_empty_enumerable(&mut self, _: ServiceType, _: &ValidationState) -> Result<Option<ServiceType>> {
        Ok(None)
    }

    fn visit_constant(&mut self, _: ServiceType, _: &ValidationState) -> Result<Option<ServiceType>> {
        Ok(None)
    }

    fn visit_create_instance(&mut self, _: ServiceType, _: &ValidationState) -> Result<Option<ServiceType>> {
        Ok(None)
    }

    fn visit_instance_service(&mut self, _: ServiceType, _: &ValidationState) -> Result<Option<ServiceType>> {
        Ok(None)
    }

    fn visit_service_provider(&mut self, _: &ValidationState) -> Result<Option<ServiceType>> {
        Ok(None)
    }

    fn visit_service_scope(&mut self, _: &ValidationState) -> Result<Option<ServiceType>> {
        Ok(None)
    }

    fn visit_factory(&mut self, _: ServiceType, _: &ValidationState) -> Result<Option<ServiceType>> {
        Ok(None)
    }
}

/// Build-time lifetime validator and its capture table.
///
/// The table maps a service to the first scoped service in its call-site
/// tree. It is written while services are validated and read on every root
/// resolution; `DashMap` keeps reads lock-free and safe against a late
/// re-validation.
///
/// # Examples
///
/// ```rust
/// use callsite_validator::{CallSite, CallSiteValidator, DiError, ServiceType};
///
/// struct DbContext;
/// struct UserService;
///
/// let db = ServiceType::of::<DbContext>();
/// let users = ServiceType::of::<UserService>();
///
/// let validator = CallSiteValidator::new();
/// validator
///     .validate_call_site(db, &CallSite::scoped(db, CallSite::new_of::<DbContext>()))
///     .unwrap();
/// validator
///     .validate_call_site(
///         users,
///         &CallSite::transient(CallSite::constructor(
///             users,
///             vec![CallSite::scoped(db, CallSite::new_of::<DbContext>())],
///         )),
///     )
///     .unwrap();
///
/// // Inside a scope both are fine
/// assert!(validator.validate_resolution(users, false).is_ok());
///
/// // From the root they are not
/// assert!(matches!(
///     validator.validate_resolution(users, true),
///     Err(DiError::ScopedCapturedFromRoot { .. })
/// ));
/// ```
pub struct CallSiteValidator {
    /// service -> first scoped service in its subtree
    scoped_services: DashMap<ServiceType, ServiceType, RandomState>,
}

impl CallSiteValidator {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with room for `capacity` captured services.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        // small tables are the norm; 8 shards keep creation cheap
        let shard_amount = if capacity <= 64 { 8 } else { 16 };
        Self {
            scoped_services: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
        }
    }

    /// Validate the call-site tree of `service_type`.
    ///
    /// Returns the first scoped service found in the tree and records it in
    /// the capture table, replacing any earlier entry. When nothing is
    /// captured, or validation fails, the entry is removed.
    pub fn validate_call_site(
        &self,
        service_type: ServiceType,
        call_site: &CallSite,
    ) -> Result<Option<ServiceType>> {
        #[cfg(feature = "logging")]
        trace!(
            target: "callsite_validator",
            service = service_type.name(),
            kind = call_site.kind(),
            "Validating call site"
        );

        let outcome = walk(&mut ScopeRules, call_site, ValidationState::default());

        match &outcome {
            Ok(Some(scoped)) => {
                self.scoped_services.insert(service_type, *scoped);

                #[cfg(feature = "logging")]
                debug!(
                    target: "callsite_validator",
                    service = service_type.name(),
                    scoped = scoped.name(),
                    "Service captures scoped dependency"
                );
            }
            Ok(None) | Err(_) => {
                self.scoped_services.remove(&service_type);
            }
        }

        outcome
    }

    /// Check a resolution request against the capture table.
    ///
    /// Only root-scope requests can fail. This is a pure read.
    #[inline]
    pub fn validate_resolution(&self, service_type: ServiceType, is_root_scope: bool) -> Result<()> {
        if !is_root_scope {
            return Ok(());
        }

        match self.scoped_services.get(&service_type) {
            Some(scoped) => {
                let err = DiError::resolved_from_root(service_type, *scoped);

                #[cfg(feature = "logging")]
                debug!(
                    target: "callsite_validator",
                    service = service_type.name(),
                    scoped = scoped.name(),
                    "Rejected root resolution"
                );

                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Scoped service captured by `service_type`, if any.
    #[inline]
    pub fn captured(&self, service_type: ServiceType) -> Option<ServiceType> {
        self.scoped_services.get(&service_type).map(|r| *r.value())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scoped_services.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scoped_services.is_empty()
    }

    /// Read-only handle on the capture table.
    #[inline]
    pub fn view(&self) -> CaptureView<'_> {
        CaptureView { validator: self }
    }
}

/// Read-only view of a capture table.
///
/// Handed out by a built [`ServiceGraph`](crate::ServiceGraph); it cannot
/// validate, insert or remove, so the table stays as `build()` left it.
#[derive(Clone, Copy)]
pub struct CaptureView<'a> {
    validator: &'a CallSiteValidator,
}

impl CaptureView<'_> {
    /// Scoped service captured by `service_type`, if any.
    #[inline]
    pub fn captured(&self, service_type: ServiceType) -> Option<ServiceType> {
        self.validator.captured(service_type)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.validator.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.validator.is_empty()
    }
}

impl std::fmt::Debug for CaptureView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureView")
            .field("captured", &self.len())
            .finish()
    }
}

impl Default for CallSiteValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallSiteValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSiteValidator")
            .field("captured", &self.len())
            .finish()
    }
}
