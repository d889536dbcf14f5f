//! Named channels and their voxel kinds

use glam::DVec3;

use crate::grid::{Grid, VoxelValue};
use crate::math::Transform;

/// Voxel element kind of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelKind {
    /// One float per voxel
    Float1,
    /// Three floats per voxel
    Float3,
}

/// Grid storage for each supported voxel kind
#[derive(Debug, Clone, PartialEq)]
pub enum GridData {
    Float(Grid<f32>),
    Vec3(Grid<[f32; 3]>),
}

/// A sparse volume participating in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    data: GridData,
}

impl From<Grid<f32>> for Channel {
    fn from(grid: Grid<f32>) -> Self {
        Self {
            data: GridData::Float(grid),
        }
    }
}

impl From<Grid<[f32; 3]>> for Channel {
    fn from(grid: Grid<[f32; 3]>) -> Self {
        Self {
            data: GridData::Vec3(grid),
        }
    }
}

impl Channel {
    pub fn data(&self) -> &GridData {
        &self.data
    }

    pub fn kind(&self) -> VoxelKind {
        match self.data {
            GridData::Float(_) => VoxelKind::Float1,
            GridData::Vec3(_) => VoxelKind::Float3,
        }
    }

    pub fn name(&self) -> &str {
        match &self.data {
            GridData::Float(g) => g.name(),
            GridData::Vec3(g) => g.name(),
        }
    }

    pub fn transform(&self) -> &Transform {
        match &self.data {
            GridData::Float(g) => g.transform(),
            GridData::Vec3(g) => g.transform(),
        }
    }

    /// Voxel scale used to pick the frame origin
    ///
    /// Channels are expected to have cubic voxels; for anisotropic voxels the
    /// X size is used.
    pub fn voxel_scale(&self) -> f64 {
        let size = self.transform().voxel_size();
        if !size.abs_diff_eq(DVec3::splat(size.x), f32::EPSILON as f64) {
            tracing::warn!(
                channel = self.name(),
                x = size.x,
                y = size.y,
                z = size.z,
                "non-uniform voxel size, using x"
            );
        }
        size.x
    }

    /// True if the channel can contribute blocks to a frame
    ///
    /// Requires at least one active voxel and a non-degenerate active bounding box.
    pub fn is_valid(&self) -> bool {
        let (empty, bbox, count) = match &self.data {
            GridData::Float(g) => (g.is_empty(), g.active_bbox(), g.active_voxel_count()),
            GridData::Vec3(g) => (g.is_empty(), g.active_bbox(), g.active_voxel_count()),
        };
        !empty && bbox.is_some_and(|b| !b.is_degenerate()) && count > 0
    }

    /// Single-float copy of the channel
    ///
    /// Float3 voxels are reduced to their magnitude.
    pub fn to_scalar_grid(&self) -> Grid<f32> {
        match &self.data {
            GridData::Float(g) => g.clone(),
            GridData::Vec3(g) => g.map_values(|v| v.to_scalar()),
        }
    }
}
