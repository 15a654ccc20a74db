//! Federation configuration

use serde::{Deserialize, Serialize};

/// Configuration for a [`Federation`](crate::Federation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// Cache mutable graph handles by name (default: true)
    ///
    /// With caching disabled every mutable resolution goes to the providers
    /// and handle identity is whatever the provider returns.
    pub cache_enabled: bool,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
        }
    }
}

impl FederationConfig {
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}
