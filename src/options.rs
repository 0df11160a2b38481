//! Validation settings for a [`ServiceGraph`](crate::ServiceGraph)

/// Controls when lifetime validation runs.
///
/// # Examples
///
/// ```rust
/// use callsite_validator::ValidationOptions;
///
/// // Validate lazily, on first resolution of each service
/// let options = ValidationOptions::new().validate_on_build(false);
/// assert!(options.validates_scopes());
/// assert!(!options.validates_on_build());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    validate_scopes: bool,
    validate_on_build: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            validate_scopes: true,
            validate_on_build: true,
        }
    }
}

impl ValidationOptions {
    /// Both checks enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// No lifetime checks at all; resolution is never rejected.
    pub fn disabled() -> Self {
        Self {
            validate_scopes: false,
            validate_on_build: false,
        }
    }

    /// Enable or disable scope validation entirely
    pub fn validate_scopes(mut self, enabled: bool) -> Self {
        self.validate_scopes = enabled;
        self
    }

    /// Validate every registration during `build()` instead of on first use
    pub fn validate_on_build(mut self, enabled: bool) -> Self {
        self.validate_on_build = enabled;
        self
    }

    #[inline]
    pub fn validates_scopes(&self) -> bool {
        self.validate_scopes
    }

    /// True only when scope validation is on as well.
    #[inline]
    pub fn validates_on_build(&self) -> bool {
        self.validate_scopes && self.validate_on_build
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate_everything() {
        let options = ValidationOptions::default();
        assert!(options.validates_scopes());
        assert!(options.validates_on_build());
    }

    #[test]
    fn test_build_validation_needs_scope_validation() {
        let options = ValidationOptions::new().validate_scopes(false);
        assert!(!options.validates_on_build());
        assert_eq!(ValidationOptions::disabled(), options.validate_on_build(false));
    }
}
