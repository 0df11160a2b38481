//! Call-site graph
//!
//! A call site describes how one instance of a dependency is produced. The
//! graph for a service is a tree rooted at that service, built upstream and
//! guaranteed acyclic.

use crate::ServiceType;
use std::fmt;

/// Instance-caching lifetime of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    /// One instance for the whole process
    Singleton,
    /// One instance per scope
    Scoped,
    /// A fresh instance on every request
    Transient,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        })
    }
}

/// A node of the call-site graph.
///
/// The set of kinds is closed; every visitor matches it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSite {
    Transient(TransientCallSite),
    Constructor(ConstructorCallSite),
    Singleton(SingletonCallSite),
    Scoped(ScopedCallSite),
    ClosedEnumerable(ClosedEnumerableCallSite),
    EmptyEnumerable { item_type: ServiceType },
    Constant { service_type: ServiceType },
    CreateInstance { implementation: ServiceType },
    InstanceService { service_type: ServiceType },
    ServiceProviderService,
    ServiceScopeService,
    FactoryService { service_type: ServiceType },
    Interception(InterceptionCallSite),
}

/// New instance per request of the wrapped call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientCallSite {
    pub service: Box<CallSite>,
}

/// Constructor invocation; parameters are kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorCallSite {
    pub implementation: ServiceType,
    pub parameters: Vec<CallSite>,
}

/// Process-wide cached instance of `service_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonCallSite {
    pub service_type: ServiceType,
    pub service: Box<CallSite>,
}

/// Per-scope cached instance of `service_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedCallSite {
    pub service_type: ServiceType,
    pub service: Box<CallSite>,
}

/// Every registered implementation of `item_type`, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedEnumerableCallSite {
    pub item_type: ServiceType,
    pub services: Vec<CallSite>,
}

/// Decoration wrapper; contributes nothing beyond its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptionCallSite {
    pub target: Box<CallSite>,
}

impl CallSite {
    pub fn transient(service: CallSite) -> Self {
        Self::Transient(TransientCallSite {
            service: Box::new(service),
        })
    }

    pub fn constructor(implementation: ServiceType, parameters: Vec<CallSite>) -> Self {
        Self::Constructor(ConstructorCallSite {
            implementation,
            parameters,
        })
    }

    pub fn singleton(service_type: ServiceType, service: CallSite) -> Self {
        Self::Singleton(SingletonCallSite {
            service_type,
            service: Box::new(service),
        })
    }

    pub fn scoped(service_type: ServiceType, service: CallSite) -> Self {
        Self::Scoped(ScopedCallSite {
            service_type,
            service: Box::new(service),
        })
    }

    /// Enumeration call site; an empty list becomes [`CallSite::EmptyEnumerable`].
    pub fn enumerable(item_type: ServiceType, services: Vec<CallSite>) -> Self {
        if services.is_empty() {
            Self::EmptyEnumerable { item_type }
        } else {
            Self::ClosedEnumerable(ClosedEnumerableCallSite {
                item_type,
                services,
            })
        }
    }

    pub fn intercepted(target: CallSite) -> Self {
        Self::Interception(InterceptionCallSite {
            target: Box::new(target),
        })
    }

    /// Shorthand for a parameterless constructor of `T`.
    pub fn new_of<T: ?Sized + 'static>() -> Self {
        Self::CreateInstance {
            implementation: ServiceType::of::<T>(),
        }
    }

    /// Caching lifetime imposed by this node, if it caches at all.
    pub fn lifetime(&self) -> Option<ServiceLifetime> {
        match self {
            Self::Singleton(_) => Some(ServiceLifetime::Singleton),
            Self::Scoped(_) => Some(ServiceLifetime::Scoped),
            Self::Transient(_) => Some(ServiceLifetime::Transient),
            _ => None,
        }
    }

    /// Direct children in traversal order.
    pub fn children(&self) -> &[CallSite] {
        match self {
            Self::Transient(site) => std::slice::from_ref(&*site.service),
            Self::Singleton(site) => std::slice::from_ref(&*site.service),
            Self::Scoped(site) => std::slice::from_ref(&*site.service),
            Self::Interception(site) => std::slice::from_ref(&*site.target),
            Self::Constructor(site) => &site.parameters,
            Self::ClosedEnumerable(site) => &site.services,
            Self::EmptyEnumerable { .. }
            | Self::Constant { .. }
            | Self::CreateInstance { .. }
            | Self::InstanceService { .. }
            | Self::ServiceProviderService
            | Self::ServiceScopeService
            | Self::FactoryService { .. } => &[],
        }
    }

    /// Length of the longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(CallSite::depth).max().unwrap_or(0)
    }

    /// Short kind name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transient(_) => "Transient",
            Self::Constructor(_) => "Constructor",
            Self::Singleton(_) => "Singleton",
            Self::Scoped(_) => "Scoped",
            Self::ClosedEnumerable(_) => "ClosedEnumerable",
            Self::EmptyEnumerable { .. } => "EmptyEnumerable",
            Self::Constant { .. } => "Constant",
            Self::CreateInstance { .. } => "CreateInstance",
            Self::InstanceService { .. } => "InstanceService",
            Self::ServiceProviderService => "ServiceProviderService",
            Self::ServiceScopeService => "ServiceScopeService",
            Self::FactoryService { .. } => "FactoryService",
            Self::Interception(_) => "Interception",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repo;
    struct Handler;

    #[test]
    fn test_lifetime_display() {
        assert_eq!(ServiceLifetime::Scoped.to_string(), "scoped");
        assert_eq!(ServiceLifetime::Singleton.to_string(), "singleton");
    }

    #[test]
    fn test_enumerable_without_services_is_empty() {
        let site = CallSite::enumerable(ServiceType::of::<Handler>(), vec![]);
        assert!(matches!(site, CallSite::EmptyEnumerable { .. }));

        let site = CallSite::enumerable(ServiceType::of::<Handler>(), vec![CallSite::new_of::<Handler>()]);
        assert_eq!(site.kind(), "ClosedEnumerable");
    }

    #[test]
    fn test_depth_and_children() {
        let repo = ServiceType::of::<Repo>();
        let site = CallSite::singleton(
            repo,
            CallSite::constructor(
                repo,
                vec![
                    CallSite::ServiceProviderService,
                    CallSite::transient(CallSite::new_of::<Handler>()),
                ],
            ),
        );

        assert_eq!(site.depth(), 4);
        assert_eq!(site.children().len(), 1);
        assert_eq!(site.children()[0].children().len(), 2);
        assert_eq!(site.lifetime(), Some(ServiceLifetime::Singleton));
        assert_eq!(CallSite::ServiceScopeService.lifetime(), None);
    }
}
