//! Service type identifiers
//!
//! A [`ServiceType`] names a registered contract. It is the key of the
//! capture table and the unit reported in every lifetime error.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque, hashable identifier of a service contract.
///
/// Identity is the [`TypeId`]; the type name is carried only for diagnostics.
///
/// # Examples
///
/// ```rust
/// use callsite_validator::ServiceType;
///
/// trait Repository {}
/// struct SqlRepository;
///
/// let contract = ServiceType::of::<dyn Repository>();
/// let implementation = ServiceType::of::<SqlRepository>();
///
/// assert_ne!(contract, implementation);
/// assert!(implementation.name().ends_with("SqlRepository"));
/// ```
#[derive(Clone, Copy)]
pub struct ServiceType {
    type_id: TypeId,
    name: &'static str,
}

impl ServiceType {
    /// Identifier for `T`, which may be unsized (`dyn Trait`).
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceType({})", self.name)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
