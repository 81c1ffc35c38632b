//! Container settings.

use std::borrow::Cow;

/// The name looked up when a requested deliverable does not exist.
pub const DEFAULT_SENTINEL: &str = "unknown";

/// Tunables for a [`Container`](crate::container::Container).
///
/// # Examples
/// ```
/// use chauffeur_registry::settings::ContainerSettings;
///
/// let settings = ContainerSettings::default();
/// assert_eq!(settings.sentinel(), "unknown");
/// assert!(settings.require_sentinel());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSettings {
    sentinel: Cow<'static, str>,
    require_sentinel: bool,
}

impl ContainerSettings {
    /// Sets the fallback deliverable's name.
    pub fn with_sentinel(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.sentinel = name.into();
        self
    }

    /// Whether building a container without the sentinel is an error.
    ///
    /// Turn this off for containers that only wire services and never
    /// look deliverables up by name.
    pub fn with_require_sentinel(mut self, require: bool) -> Self {
        self.require_sentinel = require;
        self
    }

    /// The fallback deliverable's name.
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Whether the sentinel must be registered.
    pub fn require_sentinel(&self) -> bool {
        self.require_sentinel
    }
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            sentinel: Cow::Borrowed(DEFAULT_SENTINEL),
            require_sentinel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_sentinel() {
        let settings = ContainerSettings::default()
            .with_sentinel(String::from("help"))
            .with_require_sentinel(false);
        assert_eq!(settings.sentinel(), "help");
        assert!(!settings.require_sentinel());
    }
}
