//! Finder settings.
//!
//! Settings are usually embedded in an application's configuration file:
//!
//! ```yaml
//! default-count: 100
//! default-lookup-limit: 5000
//! extra-key-dimensions: warn
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What to do with dimensions that accompany a key dimension resolved on the
/// fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtraDimensionPolicy {
    /// Fail the request, naming the extra dimensions.
    #[default]
    Reject,
    /// Log a warning and ignore them.
    Warn,
}

/// Defaults applied by a finder when a locator leaves them out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FinderSettings {
    /// Page size when the locator has no `count`.
    pub default_count: Option<u64>,
    /// Scan budget when the locator has no `lookupLimit`.
    pub default_lookup_limit: Option<u64>,
    /// Handling of extra dimensions on the fast path.
    pub extra_key_dimensions: ExtraDimensionPolicy,
}

impl FinderSettings {
    /// Loads settings from YAML.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Sets the default page size.
    pub fn default_count(mut self, count: u64) -> Self {
        self.default_count = Some(count);
        self
    }

    /// Sets the default scan budget.
    pub fn default_lookup_limit(mut self, limit: u64) -> Self {
        self.default_lookup_limit = Some(limit);
        self
    }

    /// Sets the extra dimension policy.
    pub fn extra_key_dimensions(mut self, policy: ExtraDimensionPolicy) -> Self {
        self.extra_key_dimensions = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinderError;

    #[test]
    fn from_yaml() {
        let settings = FinderSettings::from_yaml(
            "default-count: 100\ndefault-lookup-limit: 5000\nextra-key-dimensions: warn\n",
        )
        .unwrap();
        assert_eq!(
            settings,
            FinderSettings::default()
                .default_count(100)
                .default_lookup_limit(5000)
                .extra_key_dimensions(ExtraDimensionPolicy::Warn)
        );
    }

    #[test]
    fn missing_keys_use_defaults() {
        let settings = FinderSettings::from_yaml("default-count: 20\n").unwrap();
        assert_eq!(settings.default_lookup_limit, None);
        assert_eq!(settings.extra_key_dimensions, ExtraDimensionPolicy::Reject);
    }

    #[test]
    fn unknown_policy_is_an_error() {
        let err = FinderSettings::from_yaml("extra-key-dimensions: ignore\n").unwrap_err();
        assert!(matches!(err, FinderError::Settings(_)));
    }
}
