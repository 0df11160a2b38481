//! Error types for call-site validation

use crate::ServiceType;
use thiserror::Error;

/// Errors raised while validating or resolving services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// A singleton's call-site tree contains a scoped dependency
    #[error("Cannot consume scoped service '{scoped}' from singleton '{singleton}'.")]
    ScopedCapturedBySingleton {
        scoped: ServiceType,
        singleton: ServiceType,
    },

    /// A scoped service was requested directly from the root scope
    #[error("Cannot resolve scoped service '{service}' from root provider.")]
    DirectScopedFromRoot { service: ServiceType },

    /// A service requested from the root scope transitively needs a scoped one
    #[error(
        "Cannot resolve '{service}' from root provider because it requires scoped service '{scoped}'."
    )]
    ScopedCapturedFromRoot {
        service: ServiceType,
        scoped: ServiceType,
    },

    /// Service was not registered with the graph
    #[error("Service not found: {service}")]
    NotFound { service: ServiceType },

    /// Graph was already built and cannot take new registrations
    #[error("Service graph is locked - cannot register new services")]
    Locked,

    /// Build-time validation failed for one or more services
    #[error("Some services are not able to be constructed ({} errors), first: {}", .errors.len(), first_message(.errors))]
    BuildFailed { errors: Vec<DiError> },
}

fn first_message(errors: &[DiError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

impl DiError {
    /// Create a ScopedCapturedBySingleton error
    #[inline]
    pub fn scoped_in_singleton(scoped: ServiceType, singleton: ServiceType) -> Self {
        Self::ScopedCapturedBySingleton { scoped, singleton }
    }

    /// Create the root-resolution error matching what was captured.
    ///
    /// A service that captured itself is scoped, anything else is transitive.
    #[inline]
    pub fn resolved_from_root(service: ServiceType, scoped: ServiceType) -> Self {
        if service == scoped {
            Self::DirectScopedFromRoot { service }
        } else {
            Self::ScopedCapturedFromRoot { service, scoped }
        }
    }

    /// Create a NotFound error
    #[inline]
    pub fn not_found(service: ServiceType) -> Self {
        Self::NotFound { service }
    }

    /// Whether this error reports a captive scoped dependency
    pub fn is_lifetime_violation(&self) -> bool {
        match self {
            Self::ScopedCapturedBySingleton { .. }
            | Self::DirectScopedFromRoot { .. }
            | Self::ScopedCapturedFromRoot { .. } => true,
            Self::BuildFailed { errors } => errors.iter().any(Self::is_lifetime_violation),
            Self::NotFound { .. } | Self::Locked => false,
        }
    }
}

/// Result type alias for validation operations
pub type Result<T> = std::result::Result<T, DiError>;
