//! Configuration types for edit compositing operations

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard ceiling for the feather radius, in pixels
pub const MAX_FEATHER: u32 = 32;

/// Hard ceiling for bbox padding, in pixels
pub const MAX_PADDING: u32 = 128;

/// Configuration for edit compositing operations
///
/// Passed by immutable value through the pipeline; there is no global
/// mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditConfig {
    /// Longest edge of the patch sent to the model, in pixels
    pub max_patch_edge: u32,

    /// Feather radius applied when the caller omits one (0-32)
    pub default_feather: u32,

    /// BBox padding applied when the caller omits one (0-128)
    pub default_padding: u32,

    /// Radius of the surrounding ring sampled as the color-match target
    pub color_match_ring: u32,

    /// Lower clamp for the per-channel color gain
    pub color_gain_min: f32,

    /// Upper clamp for the per-channel color gain
    pub color_gain_max: f32,

    /// End-to-end deadline for the external model call
    pub model_timeout: Duration,

    /// Apply a 1-pixel soft dilation to the decoded mask, compensating
    /// for anti-aliased brush edges
    pub soft_dilate_mask: bool,

    /// Byte budget for the stored base image
    pub max_input_bytes: u64,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            max_patch_edge: 1024,
            default_feather: 2,
            default_padding: 12,
            color_match_ring: 8,
            color_gain_min: 0.6,
            color_gain_max: 1.6,
            model_timeout: Duration::from_secs(60),
            soft_dilate_mask: false,
            max_input_bytes: 20 * 1024 * 1024,
        }
    }
}

impl EditConfig {
    /// Create a new configuration builder for fluent construction
    #[must_use]
    pub fn builder() -> EditConfigBuilder {
        EditConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Feather default above 32 px
    /// - Padding default above 128 px
    /// - Non-positive or inverted color gain clamp
    /// - Zero patch edge, timeout, or byte budget
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_patch_edge == 0 {
            return Err(crate::error::EditError::invalid_config(
                "max_patch_edge must be at least 1",
            ));
        }
        if self.default_feather > MAX_FEATHER {
            return Err(crate::error::EditError::invalid_config(format!(
                "default_feather {} outside 0-{}",
                self.default_feather, MAX_FEATHER
            )));
        }
        if self.default_padding > MAX_PADDING {
            return Err(crate::error::EditError::invalid_config(format!(
                "default_padding {} outside 0-{}",
                self.default_padding, MAX_PADDING
            )));
        }
        if !(self.color_gain_min > 0.0 && self.color_gain_min <= self.color_gain_max) {
            return Err(crate::error::EditError::invalid_config(format!(
                "color gain clamp [{}, {}] must satisfy 0 < min <= max",
                self.color_gain_min, self.color_gain_max
            )));
        }
        if self.model_timeout.is_zero() {
            return Err(crate::error::EditError::invalid_config(
                "model_timeout must be positive",
            ));
        }
        if self.max_input_bytes == 0 {
            return Err(crate::error::EditError::invalid_config(
                "max_input_bytes must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder for [`EditConfig`]
#[derive(Debug, Default)]
pub struct EditConfigBuilder {
    config: EditConfig,
}

impl EditConfigBuilder {
    /// Set the longest patch edge sent to the model
    #[must_use]
    pub fn max_patch_edge(mut self, edge: u32) -> Self {
        self.config.max_patch_edge = edge;
        self
    }

    /// Set the default feather radius
    #[must_use]
    pub fn default_feather(mut self, feather: u32) -> Self {
        self.config.default_feather = feather;
        self
    }

    /// Set the default bbox padding
    #[must_use]
    pub fn default_padding(mut self, padding: u32) -> Self {
        self.config.default_padding = padding;
        self
    }

    /// Set the color-match ring radius
    #[must_use]
    pub fn color_match_ring(mut self, ring: u32) -> Self {
        self.config.color_match_ring = ring;
        self
    }

    /// Set the per-channel color gain clamp
    #[must_use]
    pub fn color_gain_clamp(mut self, min: f32, max: f32) -> Self {
        self.config.color_gain_min = min;
        self.config.color_gain_max = max;
        self
    }

    /// Set the model call deadline
    #[must_use]
    pub fn model_timeout(mut self, timeout: Duration) -> Self {
        self.config.model_timeout = timeout;
        self
    }

    /// Enable or disable mask soft dilation
    #[must_use]
    pub fn soft_dilate_mask(mut self, enabled: bool) -> Self {
        self.config.soft_dilate_mask = enabled;
        self
    }

    /// Set the base-image byte budget
    #[must_use]
    pub fn max_input_bytes(mut self, bytes: u64) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// Returns `EditError::InvalidConfig` when any parameter is outside
    /// its valid range.
    pub fn build(self) -> crate::Result<EditConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditConfig::default();
        assert_eq!(config.max_patch_edge, 1024);
        assert_eq!(config.default_feather, 2);
        assert_eq!(config.default_padding, 12);
        assert_eq!(config.color_match_ring, 8);
        assert!(!config.soft_dilate_mask);
        assert_eq!(config.model_timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EditConfig::builder()
            .max_patch_edge(1536)
            .default_feather(4)
            .default_padding(24)
            .soft_dilate_mask(true)
            .build()
            .unwrap();

        assert_eq!(config.max_patch_edge, 1536);
        assert_eq!(config.default_feather, 4);
        assert_eq!(config.default_padding, 24);
        assert!(config.soft_dilate_mask);
    }

    #[test]
    fn test_config_validation_rejects_out_of_range() {
        assert!(EditConfig::builder().default_feather(33).build().is_err());
        assert!(EditConfig::builder().default_padding(129).build().is_err());
        assert!(EditConfig::builder().max_patch_edge(0).build().is_err());
        assert!(EditConfig::builder()
            .color_gain_clamp(1.6, 0.6)
            .build()
            .is_err());
        assert!(EditConfig::builder()
            .color_gain_clamp(0.0, 1.6)
            .build()
            .is_err());
        assert!(EditConfig::builder()
            .model_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = EditConfig::builder()
            .max_patch_edge(1536)
            .color_gain_clamp(0.5, 2.0)
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let back: EditConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
