//! Resolution scopes
//!
//! The root scope lives as long as the process, so it may not hand out
//! anything whose call-site tree needs a scoped instance. Child scopes may.

use crate::{CallSite, Result, ServiceGraph, ServiceType};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Identity of a resolution scope.
///
/// Id 0 belongs to the root scope; child scopes draw ids from a process-wide
/// counter, so ids are never reused across graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// The root scope of every graph
    pub const ROOT: ScopeId = ScopeId(0);

    fn next_child() -> Self {
        static NEXT_CHILD: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_CHILD.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Whether resolutions in this scope face the root-scope check.
    #[inline]
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            write!(f, "child#{}", self.0)
        }
    }
}

/// Entry point for resolution requests against a [`ServiceGraph`].
///
/// # Examples
///
/// ```rust
/// use callsite_validator::{CallSite, ServiceGraph, ServiceType};
///
/// struct RequestContext;
///
/// let ctx = ServiceType::of::<RequestContext>();
/// let graph = ServiceGraph::new();
/// graph
///     .register(ctx, CallSite::scoped(ctx, CallSite::new_of::<RequestContext>()))
///     .unwrap();
/// graph.build().unwrap();
///
/// let request = graph.create_scope();
/// assert!(!request.is_root());
/// assert!(request.resolve_type::<RequestContext>().is_ok());
/// assert!(graph.root().resolve(ctx).is_err());
/// ```
#[derive(Clone)]
pub struct ResolutionScope {
    graph: ServiceGraph,
    id: ScopeId,
    depth: u32,
}

impl ResolutionScope {
    pub(crate) fn root(graph: ServiceGraph) -> Self {
        Self {
            graph,
            id: ScopeId::ROOT,
            depth: 0,
        }
    }

    pub(crate) fn child(graph: ServiceGraph) -> Self {
        Self::nested(graph, 1)
    }

    /// Create a scope nested inside this one.
    pub fn create_scope(&self) -> Self {
        Self::nested(self.graph.clone(), self.depth + 1)
    }

    fn nested(graph: ServiceGraph, depth: u32) -> Self {
        let id = ScopeId::next_child();

        #[cfg(feature = "logging")]
        debug!(
            target: "callsite_validator",
            scope = %id,
            depth,
            "Opening child scope"
        );

        Self { graph, id, depth }
    }

    /// Check a request for `service_type` and return its call site.
    ///
    /// The service is validated first if that has not happened yet. Root
    /// requests are then rejected when the service is scoped or depends on a
    /// scoped service.
    pub fn resolve(&self, service_type: ServiceType) -> Result<Arc<CallSite>> {
        let registration = self.graph.registration(service_type)?;

        if self.graph.options().validates_scopes() {
            self.graph.ensure_validated(service_type, &registration)?;
            self.graph.validate_resolution(service_type, self.id.is_root())?;
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "callsite_validator",
            service = service_type.name(),
            scope = %self.id,
            "Resolution allowed"
        );

        Ok(Arc::clone(&registration.call_site))
    }

    /// Typed shortcut for [`resolve`](Self::resolve).
    #[inline]
    pub fn resolve_type<T: ?Sized + 'static>(&self) -> Result<Arc<CallSite>> {
        self.resolve(ServiceType::of::<T>())
    }

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Nesting depth; the root is 0.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn graph(&self) -> &ServiceGraph {
        &self.graph
    }
}

impl std::fmt::Debug for ResolutionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionScope")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiError;

    struct DbContext;
    struct OrderService;
    struct Clock;
    struct Missing;

    fn ty<T: 'static>() -> ServiceType {
        ServiceType::of::<T>()
    }

    fn built_graph() -> ServiceGraph {
        let db = CallSite::scoped(ty::<DbContext>(), CallSite::new_of::<DbContext>());
        let graph = ServiceGraph::new();
        graph.register(ty::<DbContext>(), db.clone()).unwrap();
        graph
            .register(
                ty::<OrderService>(),
                CallSite::transient(CallSite::constructor(ty::<OrderService>(), vec![db])),
            )
            .unwrap();
        graph
            .register(
                ty::<Clock>(),
                CallSite::singleton(ty::<Clock>(), CallSite::new_of::<Clock>()),
            )
            .unwrap();
        graph.build().unwrap();
        graph
    }

    #[test]
    fn test_scope_ids() {
        let graph = built_graph();
        let root = graph.root();
        let a = graph.create_scope();
        let b = a.create_scope();

        assert_eq!(root.id(), ScopeId::ROOT);
        assert_eq!(graph.root().id(), root.id());
        assert_eq!(root.id().to_string(), "root");
        assert!(!a.id().is_root());
        assert!(a.id() < b.id());
        assert_eq!(b.id().to_string(), format!("child#{}", b.id().get()));
    }

    #[test]
    fn test_root_rejects_scoped() {
        let graph = built_graph();
        let root = graph.root();

        assert!(root.is_root());
        assert_eq!(
            root.resolve(ty::<DbContext>()).unwrap_err(),
            DiError::DirectScopedFromRoot { service: ty::<DbContext>() }
        );
        assert_eq!(
            root.resolve(ty::<OrderService>()).unwrap_err(),
            DiError::ScopedCapturedFromRoot {
                service: ty::<OrderService>(),
                scoped: ty::<DbContext>(),
            }
        );
        assert!(root.resolve_type::<Clock>().is_ok());
    }

    #[test]
    fn test_child_scopes_allow_scoped() {
        let graph = built_graph();
        let request = graph.create_scope();
        let nested = request.create_scope();

        for scope in [&request, &nested] {
            assert!(!scope.is_root());
            assert!(scope.resolve(ty::<DbContext>()).is_ok());
            assert!(scope.resolve(ty::<OrderService>()).is_ok());
        }
        assert_eq!(nested.depth(), 2);
        assert_ne!(request.id(), nested.id());
    }

    #[test]
    fn test_resolve_returns_registered_call_site() {
        let graph = built_graph();
        let site = graph.create_scope().resolve_type::<Clock>().unwrap();
        assert_eq!(
            *site,
            CallSite::singleton(ty::<Clock>(), CallSite::new_of::<Clock>())
        );
    }

    #[test]
    fn test_unknown_service() {
        let graph = built_graph();
        assert_eq!(
            graph.create_scope().resolve_type::<Missing>().unwrap_err(),
            DiError::not_found(ty::<Missing>())
        );
    }

    #[test]
    fn test_repeated_root_resolution_is_stable() {
        let graph = built_graph();
        let root = graph.root();
        let first = root.resolve(ty::<OrderService>());
        let second = root.resolve(ty::<OrderService>());
        assert_eq!(first, second);
    }
}
