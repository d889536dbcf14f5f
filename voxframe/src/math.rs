//! Affine transforms and block-alignment helpers
//!
//! [`Transform`] maps index space to world space using column vectors
//! (`world = M * index`). On the wire it is stored as 16 floats, row-major in
//! the row-vector convention, so the translation lands in elements 12..14.

use glam::{DMat3, DMat4, DVec3};

use crate::BLOCK_SIZE;

/// Tolerance used when snapping index-space bounds to block boundaries
pub const BLOCK_EPSILON: f64 = f32::EPSILON as f64;

// ============================================================================
// Transform
// ============================================================================

/// Affine index → world transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: DMat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform (index space == world space)
    pub const IDENTITY: Self = Self {
        matrix: DMat4::IDENTITY,
    };

    /// Create from a column-vector affine matrix
    pub const fn from_matrix(matrix: DMat4) -> Self {
        Self { matrix }
    }

    /// Uniform voxel size with a world-space translation of the index origin
    pub fn from_scale_translation(voxel_size: f64, translation: DVec3) -> Self {
        Self::from_matrix(DMat4::from_scale_rotation_translation(
            DVec3::splat(voxel_size),
            glam::DQuat::IDENTITY,
            translation,
        ))
    }

    /// Uniform voxel size, index origin at the world origin
    pub fn from_voxel_size(voxel_size: f64) -> Self {
        Self::from_scale_translation(voxel_size, DVec3::ZERO)
    }

    /// Underlying column-vector matrix
    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Linear (rotation + scale) part
    pub fn linear(&self) -> DMat3 {
        DMat3::from_mat4(self.matrix)
    }

    /// World-space length of one voxel step along each index axis
    pub fn voxel_size(&self) -> DVec3 {
        let linear = self.linear();
        DVec3::new(
            linear.x_axis.length(),
            linear.y_axis.length(),
            linear.z_axis.length(),
        )
    }

    /// World-space volume of one voxel
    pub fn voxel_volume(&self) -> f64 {
        self.linear().determinant().abs()
    }

    /// Map an index-space position to world space
    pub fn index_to_world(&self, index: DVec3) -> DVec3 {
        self.matrix.transform_point3(index)
    }

    /// Map a world-space position to index space
    pub fn world_to_index(&self, world: DVec3) -> DVec3 {
        self.matrix.inverse().transform_point3(world)
    }

    /// Inverse transform (world → index)
    pub fn inverse(&self) -> Self {
        Self::from_matrix(self.matrix.inverse())
    }

    /// Apply `self` after `first`: `result(p) = self(first(p))`
    pub fn after(&self, first: &Transform) -> Self {
        Self::from_matrix(self.matrix * first.matrix)
    }

    /// Shift the index space by `offset` voxels
    ///
    /// The result maps `i` to where `self` maps `i + offset`, i.e. the offset is
    /// expressed through the linear part and added to the translation.
    pub fn post_translate_index(&self, offset: DVec3) -> Self {
        let shift = self.linear() * offset;
        let mut matrix = self.matrix;
        matrix.w_axis += shift.extend(0.0);
        Self::from_matrix(matrix)
    }

    /// True if every element is within `tolerance` of the identity matrix
    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.matrix.abs_diff_eq(DMat4::IDENTITY, tolerance)
    }

    /// Wire layout: row-major, row-vector convention, translation in 12..14
    pub fn to_raw(&self) -> [f32; 16] {
        self.matrix.to_cols_array().map(|v| v as f32)
    }

    /// Inverse of [`Transform::to_raw`]
    pub fn from_raw(raw: &[f32; 16]) -> Self {
        Self::from_matrix(DMat4::from_cols_array(&raw.map(f64::from)))
    }

    /// True if every element of a wire transform is (nearly) zero
    pub fn is_raw_empty(raw: &[f32; 16]) -> bool {
        raw.iter().all(|v| v.abs() < f32::EPSILON)
    }
}

// ============================================================================
// Block Alignment
// ============================================================================

/// Floor after nudging up by [`BLOCK_EPSILON`]
#[inline]
pub fn floor_with_epsilon(value: f64) -> i32 {
    (value + BLOCK_EPSILON).floor() as i32
}

/// Ceil after nudging down by [`BLOCK_EPSILON`]
#[inline]
pub fn ceil_with_epsilon(value: f64) -> i32 {
    (value - BLOCK_EPSILON).ceil() as i32
}

/// Round down to a multiple of [`BLOCK_SIZE`] (works for negatives)
#[inline]
pub const fn floor_to_block(value: i32) -> i32 {
    value - (value & (BLOCK_SIZE - 1))
}

/// Round up to a multiple of [`BLOCK_SIZE`]
#[inline]
pub const fn ceil_to_block(value: i32) -> i32 {
    floor_to_block(value + BLOCK_SIZE - 1)
}
