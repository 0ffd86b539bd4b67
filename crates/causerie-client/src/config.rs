//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client runs with zero
//! configuration.

use causerie_shared::constants::MAX_IMAGE_BYTES;
use causerie_shared::strings;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum accepted image attachment size in bytes.
    /// Env: `CAUSERIE_MAX_IMAGE_BYTES`
    /// Default: 5 MiB
    pub max_image_bytes: usize,

    /// Sender name recorded when the identity has no display name.
    /// Env: `CAUSERIE_NAME_FALLBACK`
    /// Default: `"User"`
    pub display_name_fallback: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            display_name_fallback: strings::SENDER_NAME_FALLBACK.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CAUSERIE_MAX_IMAGE_BYTES") {
            if let Ok(bytes) = val.parse::<usize>() {
                config.max_image_bytes = bytes;
            } else {
                tracing::warn!(
                    value = %val,
                    "Invalid CAUSERIE_MAX_IMAGE_BYTES, using default"
                );
            }
        }

        if let Ok(name) = std::env::var("CAUSERIE_NAME_FALLBACK") {
            if !name.is_empty() {
                config.display_name_fallback = name;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(config.display_name_fallback, "User");
    }
}
