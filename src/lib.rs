//! # callsite-validator - Captive Dependency Detection for DI Graphs
//!
//! Static lifetime checks for a dependency-injection container's call-site
//! graphs. A singleton that ends up holding a scoped instance, directly or
//! through any chain of dependencies, keeps that instance alive past its
//! scope. This crate rejects such graphs when the container is built, and
//! rejects root-scope requests for anything that needs a scope.
//!
//! ## Features
//!
//! - **Exhaustive walker** - one visitor hook per call-site kind, checked at compile time
//! - **Path-local state** - the enclosing singleton travels down by value, never sideways
//! - **Lock-free capture table** - `DashMap` reads on every root resolution
//! - **Precise errors** - every violation names the offending pair of services
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use callsite_validator::{CallSite, CallSiteValidator, DiError, ServiceType};
//!
//! struct DbContext;
//! struct ReportCache;
//!
//! let db = ServiceType::of::<DbContext>();
//! let cache = ServiceType::of::<ReportCache>();
//!
//! // A singleton cache built over a scoped DbContext
//! let site = CallSite::singleton(
//!     cache,
//!     CallSite::constructor(cache, vec![CallSite::scoped(db, CallSite::new_of::<DbContext>())]),
//! );
//!
//! let validator = CallSiteValidator::new();
//! let err = validator.validate_call_site(cache, &site).unwrap_err();
//! assert_eq!(
//!     err,
//!     DiError::ScopedCapturedBySingleton { scoped: db, singleton: cache }
//! );
//! ```
//!
//! ## Resolution Checks
//!
//! ```rust
//! use callsite_validator::{CallSite, DiError, ServiceGraph, ServiceType};
//!
//! struct DbContext;
//! struct OrderService;
//!
//! let db = ServiceType::of::<DbContext>();
//! let orders = ServiceType::of::<OrderService>();
//! let scoped_db = CallSite::scoped(db, CallSite::new_of::<DbContext>());
//!
//! let graph = ServiceGraph::new();
//! graph.register(db, scoped_db.clone()).unwrap();
//! graph
//!     .register(orders, CallSite::transient(CallSite::constructor(orders, vec![scoped_db])))
//!     .unwrap();
//! graph.build().unwrap();
//!
//! // The root scope has no unit of work to put a DbContext in
//! assert_eq!(
//!     graph.root().resolve(orders).unwrap_err(),
//!     DiError::ScopedCapturedFromRoot { service: orders, scoped: db }
//! );
//!
//! // A request scope does
//! assert!(graph.create_scope().resolve(orders).is_ok());
//! ```

mod call_site;
mod error;
mod graph;
#[cfg(feature = "logging")]
pub mod logging;
mod options;
mod scope;
mod service_type;
mod storage;
mod validator;
pub mod visitor;

pub use call_site::*;
pub use error::*;
pub use graph::*;
pub use options::*;
pub use scope::*;
pub use service_type::*;
pub use validator::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::visitor::{CallSiteVisitor, Descend, walk};
    pub use crate::{
        CallSite, CallSiteValidator, DiError, ResolutionScope, Result, ScopeId, ServiceGraph,
        ServiceLifetime, ServiceType, ValidationOptions,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Repository {}
    trait Notifier {}

    struct AppConfig;
    struct DbContext;
    struct SqlRepository;
    struct EmailNotifier;
    struct SmsNotifier;
    struct OrderService;
    struct ReportJob;
    struct ScopeFactory;

    fn ty<T: ?Sized + 'static>() -> ServiceType {
        ServiceType::of::<T>()
    }

    fn db() -> CallSite {
        CallSite::scoped(ty::<DbContext>(), CallSite::new_of::<DbContext>())
    }

    fn repository() -> CallSite {
        CallSite::scoped(
            ty::<dyn Repository>(),
            CallSite::constructor(ty::<SqlRepository>(), vec![db()]),
        )
    }

    fn notifiers() -> CallSite {
        CallSite::enumerable(
            ty::<dyn Notifier>(),
            vec![
                CallSite::singleton(ty::<EmailNotifier>(), CallSite::new_of::<EmailNotifier>()),
                CallSite::transient(CallSite::new_of::<SmsNotifier>()),
            ],
        )
    }

    fn order_service() -> CallSite {
        CallSite::transient(CallSite::constructor(
            ty::<OrderService>(),
            vec![
                CallSite::Constant { service_type: ty::<AppConfig>() },
                repository(),
                notifiers(),
                CallSite::ServiceProviderService,
            ],
        ))
    }

    fn app_graph() -> ServiceGraph {
        let graph = ServiceGraph::new();
        graph
            .register(ty::<AppConfig>(), CallSite::Constant { service_type: ty::<AppConfig>() })
            .unwrap();
        graph.register(ty::<DbContext>(), db()).unwrap();
        graph.register(ty::<dyn Repository>(), repository()).unwrap();
        graph.register(ty::<dyn Notifier>(), notifiers()).unwrap();
        graph.register(ty::<OrderService>(), order_service()).unwrap();
        graph
            .register(
                ty::<ScopeFactory>(),
                CallSite::singleton(
                    ty::<ScopeFactory>(),
                    CallSite::constructor(
                        ty::<ScopeFactory>(),
                        vec![CallSite::scoped(ty::<ScopeFactory>(), CallSite::ServiceScopeService)],
                    ),
                ),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_application_graph_builds() {
        let graph = app_graph();
        graph.build().unwrap();

        let captures = graph.captures();
        assert_eq!(captures.captured(ty::<DbContext>()), Some(ty::<DbContext>()));
        // a scoped node does not look past itself
        assert_eq!(captures.captured(ty::<dyn Repository>()), Some(ty::<dyn Repository>()));
        assert_eq!(captures.captured(ty::<OrderService>()), Some(ty::<dyn Repository>()));
        assert_eq!(captures.captured(ty::<dyn Notifier>()), None);
        assert_eq!(captures.captured(ty::<ScopeFactory>()), None);
        assert_eq!(captures.len(), 3);
    }

    #[test]
    fn test_application_root_resolution() {
        let graph = app_graph();
        graph.build().unwrap();
        let root = graph.root();

        assert!(root.resolve_type::<AppConfig>().is_ok());
        assert!(root.resolve_type::<dyn Notifier>().is_ok());
        assert!(root.resolve_type::<ScopeFactory>().is_ok());
        assert_eq!(
            root.resolve_type::<dyn Repository>().unwrap_err(),
            DiError::DirectScopedFromRoot { service: ty::<dyn Repository>() }
        );
        assert_eq!(
            root.resolve_type::<OrderService>().unwrap_err(),
            DiError::ScopedCapturedFromRoot {
                service: ty::<OrderService>(),
                scoped: ty::<dyn Repository>(),
            }
        );

        let request = graph.create_scope();
        for service in [ty::<DbContext>(), ty::<dyn Repository>(), ty::<OrderService>()] {
            assert!(request.resolve(service).is_ok());
        }
    }

    #[test]
    fn test_singleton_job_over_scoped_repository_fails_build() {
        let graph = app_graph();
        graph
            .register(
                ty::<ReportJob>(),
                CallSite::singleton(
                    ty::<ReportJob>(),
                    CallSite::constructor(
                        ty::<ReportJob>(),
                        vec![notifiers(), CallSite::intercepted(repository())],
                    ),
                ),
            )
            .unwrap();

        let err = graph.build().unwrap_err();
        assert_eq!(
            err,
            DiError::BuildFailed {
                errors: vec![DiError::scoped_in_singleton(
                    ty::<dyn Repository>(),
                    ty::<ReportJob>()
                )],
            }
        );
        assert!(err.to_string().contains("from singleton"));

        // the failed service is never treated as validated-and-clean
        assert!(graph.captures().captured(ty::<ReportJob>()).is_none());
        assert!(graph.create_scope().resolve_type::<ReportJob>().is_err());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let validator = CallSiteValidator::default();
        let result: Result<Option<ServiceType>> =
            validator.validate_call_site(ty::<AppConfig>(), &CallSite::ServiceProviderService);
        assert_eq!(result, Ok(None));
        assert_eq!(ServiceLifetime::Transient.to_string(), "transient");
    }
}
