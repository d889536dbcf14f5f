//! Encode/decode configuration

use serde::{Deserialize, Serialize};

/// How per-frame temporaries (resampled channel copies, block map) are released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalMode {
    /// Dropped before `encode_frame` returns
    #[default]
    Synchronous,
    /// Moved to a detached thread and dropped there; no completion signal
    Background,
}

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Maximum per-element deviation for a relative transform to count as identity
    pub identity_tolerance: f64,
    /// Release strategy for temporaries
    pub disposal: DisposalMode,
    /// Pack and resample on the rayon pool (false = current thread only)
    pub parallel: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            identity_tolerance: 1e-6,
            disposal: DisposalMode::Synchronous,
            parallel: true,
        }
    }
}

/// Decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Voxel offset added to every decoded leaf origin
    ///
    /// Pass the encoder's `origin_offset` to restore absolute index
    /// coordinates. Offsets are rounded down to a multiple of 8 voxels. The
    /// grid transforms are compensated by the applied offset, so world-space
    /// placement is the same with or without an offset.
    pub offset: Option<[i32; 3]>,
    /// Build leaves on the rayon pool
    pub parallel: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            offset: None,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_config_defaults() {
        let config = EncodeConfig::default();
        assert_eq!(config.disposal, DisposalMode::Synchronous);
        assert!(config.parallel);
        assert!(config.identity_tolerance > 0.0);
    }

    #[test]
    fn test_encode_config_from_toml() {
        let config: EncodeConfig = toml::from_str(
            r#"
            disposal = "background"
            parallel = false
            "#,
        )
        .unwrap();
        assert_eq!(config.disposal, DisposalMode::Background);
        assert!(!config.parallel);
        assert_eq!(config.identity_tolerance, 1e-6);
    }

    #[test]
    fn test_decode_config_from_toml() {
        let config: DecodeConfig = toml::from_str("offset = [8, -16, 0]").unwrap();
        assert_eq!(config.offset, Some([8, -16, 0]));
        assert!(config.parallel);
    }
}
