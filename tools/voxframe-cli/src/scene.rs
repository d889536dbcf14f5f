//! Scene file parsing
//!
//! A scene describes the channels of one frame as boxes of constant value:
//!
//! ```toml
//! [encode]
//! disposal = "background"
//!
//! [[channels]]
//! name = "density"
//! voxel_size = 0.5
//! translation = [0.0, 1.0, 0.0]
//!
//! [[channels.boxes]]
//! min = [0, 0, 0]
//! max = [15, 7, 7]
//! value = 1.0
//!
//! [[channels]]
//! name = "velocity"
//! kind = "vec3"
//!
//! [[channels.boxes]]
//! min = [0, 0, 0]
//! max = [7, 7, 7]
//! value = [0.0, 1.0, 0.0]
//! ```
//!
//! A channel without boxes is kept as an empty (invalid) channel so its name
//! still occupies a slot in the frame.

use anyhow::{Context, Result};
use glam::DVec3;
use serde::Deserialize;
use std::path::Path;
use voxframe::channel::Channel;
use voxframe::grid::{Coord, Grid};
use voxframe::math::Transform;
use voxframe::{ChannelInput, EncodeConfig};

/// Scene file structure
#[derive(Debug, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// Voxel kind of a scene channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Float,
    Vec3,
}

/// Single channel entry
#[derive(Debug, Deserialize)]
pub struct ChannelEntry {
    pub name: String,
    #[serde(default)]
    pub kind: ChannelKind,
    #[serde(default = "default_voxel_size")]
    pub voxel_size: f64,
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub boxes: Vec<BoxEntry>,
}

fn default_voxel_size() -> f64 {
    1.0
}

/// Inclusive index-space box of constant value
#[derive(Debug, Deserialize)]
pub struct BoxEntry {
    pub min: [i32; 3],
    pub max: [i32; 3],
    pub value: BoxValue,
}

/// Scalar or vector box value
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoxValue {
    Scalar(f32),
    Vector([f32; 3]),
}

impl Scene {
    /// Load scene from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scene: {}", path.display()))
    }

    /// Parse and validate scene from string
    pub fn parse(content: &str) -> Result<Self> {
        let scene: Self = toml::from_str(content).context("Failed to parse scene file")?;
        scene.validate()?;
        Ok(scene)
    }

    fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            anyhow::bail!("Scene declares no channels");
        }
        for channel in &self.channels {
            if !(channel.voxel_size.is_finite() && channel.voxel_size > 0.0) {
                anyhow::bail!(
                    "Channel '{}': voxel_size must be positive (got {})",
                    channel.name,
                    channel.voxel_size
                );
            }
            for b in &channel.boxes {
                if (0..3).any(|i| b.min[i] > b.max[i]) {
                    anyhow::bail!(
                        "Channel '{}': box min {:?} exceeds max {:?}",
                        channel.name,
                        b.min,
                        b.max
                    );
                }
                if channel.kind == ChannelKind::Float && matches!(b.value, BoxValue::Vector(_)) {
                    anyhow::bail!(
                        "Channel '{}': vector value in a float channel",
                        channel.name
                    );
                }
            }
        }
        Ok(())
    }

    /// Build encoder inputs in declaration order
    pub fn inputs(&self) -> Vec<ChannelInput> {
        self.channels
            .iter()
            .map(|entry| ChannelInput::new(entry.name.as_str(), Some(entry.build())))
            .collect()
    }
}

impl ChannelEntry {
    pub fn transform(&self) -> Transform {
        Transform::from_scale_translation(self.voxel_size, DVec3::from_array(self.translation))
    }

    /// Rasterize the boxes into a grid
    pub fn build(&self) -> Channel {
        let transform = self.transform();
        let bounds = |b: &BoxEntry| (Coord::from(b.min), Coord::from(b.max));
        match self.kind {
            ChannelKind::Float => {
                let mut grid = Grid::with_transform(self.name.as_str(), transform, 0.0f32);
                for b in &self.boxes {
                    let (min, max) = bounds(b);
                    if let BoxValue::Scalar(v) = b.value {
                        grid.fill_box(min, max, v);
                    }
                }
                Channel::from(grid)
            }
            ChannelKind::Vec3 => {
                let mut grid = Grid::with_transform(self.name.as_str(), transform, [0.0f32; 3]);
                for b in &self.boxes {
                    let (min, max) = bounds(b);
                    let value = match b.value {
                        BoxValue::Scalar(v) => [v; 3],
                        BoxValue::Vector(v) => v,
                    };
                    grid.fill_box(min, max, value);
                }
                Channel::from(grid)
            }
        }
    }
}
