//! Two-level sparse volume
//!
//! A [`Grid`] stores voxels in 8³ [`LeafNode`]s keyed by their origin, plus
//! constant active tiles of [`TILE_SIZE`]³ voxels for large uniform regions.
//! Tiles and leaves never overlap: filling a tile drops the leaves it covers,
//! and writing a voxel inside a tile voxelizes that tile first.
//!
//! Index space maps to world space through the grid's [`Transform`].

mod coord;
mod leaf;


use std::collections::BTreeMap;
use std::fmt::Debug;

use glam::DVec3;

use crate::BLOCK_SIZE;
use crate::math::Transform;

pub use coord::{Coord, CoordBBox};
pub use leaf::LeafNode;

/// Edge length of a constant tile, in voxels
pub const TILE_SIZE: i32 = 128;

/// Fractional sample positions closer than this to a voxel centre snap to it
const SAMPLE_EPSILON: f64 = 1e-6;

// ============================================================================
// Voxel Values
// ============================================================================

/// Element type storable in a [`Grid`]
pub trait VoxelValue: Copy + PartialEq + Send + Sync + Debug + 'static {
    /// Additive identity
    const ZERO: Self;

    /// Linear interpolation, `t` in 0..=1
    fn interpolate(a: Self, b: Self, t: f64) -> Self;

    /// Scalar used when the value is packed into a single-float block
    fn to_scalar(self) -> f32;
}

impl VoxelValue for f32 {
    const ZERO: Self = 0.0;

    #[inline]
    fn interpolate(a: Self, b: Self, t: f64) -> Self {
        (a as f64 + (b as f64 - a as f64) * t) as f32
    }

    #[inline]
    fn to_scalar(self) -> f32 {
        self
    }
}

impl VoxelValue for [f32; 3] {
    const ZERO: Self = [0.0; 3];

    #[inline]
    fn interpolate(a: Self, b: Self, t: f64) -> Self {
        std::array::from_fn(|i| f32::interpolate(a[i], b[i], t))
    }

    /// Vector magnitude
    #[inline]
    fn to_scalar(self) -> f32 {
        let [x, y, z] = self;
        (x * x + y * y + z * z).sqrt()
    }
}

// ============================================================================
// Grid
// ============================================================================

/// Named sparse volume with an index → world transform
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T: VoxelValue> {
    name: String,
    transform: Transform,
    background: T,
    leaves: BTreeMap<Coord, LeafNode<T>>,
    tiles: BTreeMap<Coord, T>,
}

impl<T: VoxelValue> Grid<T> {
    /// Empty grid with an identity transform
    pub fn new(name: impl Into<String>, background: T) -> Self {
        Self::with_transform(name, Transform::IDENTITY, background)
    }

    /// Empty grid with the given transform
    pub fn with_transform(name: impl Into<String>, transform: Transform, background: T) -> Self {
        Self {
            name: name.into(),
            transform,
            background,
            leaves: BTreeMap::new(),
            tiles: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn background(&self) -> T {
        self.background
    }

    // ------------------------------------------------------------------------
    // Voxel access
    // ------------------------------------------------------------------------

    /// Stored value and activity at `coord`
    ///
    /// Inactive voxels inside a leaf return whatever the leaf holds; voxels
    /// outside every leaf and tile return the background.
    pub fn value_and_active(&self, coord: Coord) -> (T, bool) {
        if let Some(leaf) = self.leaves.get(&coord.align_down(BLOCK_SIZE)) {
            let offset = leaf.offset_of(coord);
            return (leaf.get(offset), leaf.is_active(offset));
        }
        match self.tiles.get(&coord.align_down(TILE_SIZE)) {
            Some(&value) => (value, true),
            None => (self.background, false),
        }
    }

    pub fn get_value(&self, coord: Coord) -> T {
        self.value_and_active(coord).0
    }

    pub fn is_active(&self, coord: Coord) -> bool {
        self.value_and_active(coord).1
    }

    /// Set a voxel and mark it active
    pub fn set_value(&mut self, coord: Coord, value: T) {
        self.voxelize_tile(coord.align_down(TILE_SIZE));
        let origin = coord.align_down(BLOCK_SIZE);
        let background = self.background;
        let leaf = self
            .leaves
            .entry(origin)
            .or_insert_with(|| LeafNode::new(origin, background));
        let offset = leaf.offset_of(coord);
        leaf.set(offset, value);
    }

    /// Set every voxel in the inclusive box `[a, b]` to `value` and mark it active
    pub fn fill_box(&mut self, a: Coord, b: Coord, value: T) {
        let bbox = CoordBBox::new(a.min(b), a.max(b));

        let overlapping: Vec<Coord> = self
            .tiles
            .keys()
            .copied()
            .filter(|&origin| boxes_overlap(&CoordBBox::cube(origin, TILE_SIZE), &bbox))
            .collect();
        for origin in overlapping {
            self.voxelize_tile(origin);
        }

        let lo = bbox.min.align_down(BLOCK_SIZE);
        let hi = bbox.max.align_down(BLOCK_SIZE);
        let step = BLOCK_SIZE as usize;
        for x in (lo.x..=hi.x).step_by(step) {
            for y in (lo.y..=hi.y).step_by(step) {
                for z in (lo.z..=hi.z).step_by(step) {
                    let origin = Coord::new(x, y, z);
                    let node = CoordBBox::cube(origin, BLOCK_SIZE);
                    let clip = CoordBBox::new(node.min.max(bbox.min), node.max.min(bbox.max));
                    if clip == node {
                        self.leaves.insert(origin, LeafNode::filled(origin, value));
                        continue;
                    }
                    let background = self.background;
                    let leaf = self
                        .leaves
                        .entry(origin)
                        .or_insert_with(|| LeafNode::new(origin, background));
                    for c in clip.iter() {
                        let offset = leaf.offset_of(c);
                        leaf.set(offset, value);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Tiles
    // ------------------------------------------------------------------------

    /// Make the [`TILE_SIZE`]³ region containing `coord` a constant active tile
    ///
    /// Leaves inside the region are discarded.
    pub fn fill_tile(&mut self, coord: Coord, value: T) {
        let origin = coord.align_down(TILE_SIZE);
        let region = CoordBBox::cube(origin, TILE_SIZE);
        self.leaves.retain(|&leaf_origin, _| !region.contains(leaf_origin));
        self.tiles.insert(origin, value);
    }

    /// Replace every active tile with fully active leaves of the same value
    pub fn voxelize_active_tiles(&mut self) {
        let origins: Vec<Coord> = self.tiles.keys().copied().collect();
        for origin in origins {
            self.voxelize_tile(origin);
        }
    }

    fn voxelize_tile(&mut self, origin: Coord) {
        let Some(value) = self.tiles.remove(&origin) else {
            return;
        };
        let step = BLOCK_SIZE as usize;
        for x in (origin.x..origin.x + TILE_SIZE).step_by(step) {
            for y in (origin.y..origin.y + TILE_SIZE).step_by(step) {
                for z in (origin.z..origin.z + TILE_SIZE).step_by(step) {
                    let leaf_origin = Coord::new(x, y, z);
                    self.leaves
                        .insert(leaf_origin, LeafNode::filled(leaf_origin, value));
                }
            }
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    // ------------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------------

    /// Leaves in ascending origin order
    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode<T>> {
        self.leaves.values()
    }

    /// Leaf containing `coord`, if any
    pub fn leaf(&self, coord: Coord) -> Option<&LeafNode<T>> {
        self.leaves.get(&coord.align_down(BLOCK_SIZE))
    }

    /// Insert a leaf, replacing any leaf at the same origin
    ///
    /// A tile covering the leaf is voxelized first.
    pub fn insert_leaf(&mut self, leaf: LeafNode<T>) {
        self.voxelize_tile(leaf.origin().align_down(TILE_SIZE));
        self.leaves.insert(leaf.origin(), leaf);
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Drop leaves with no active voxels
    pub fn prune_inactive(&mut self) {
        self.leaves.retain(|_, leaf| leaf.has_active());
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// True if the grid has no leaves and no tiles
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.tiles.is_empty()
    }

    pub fn active_voxel_count(&self) -> u64 {
        let tile_voxels = (TILE_SIZE as u64).pow(3);
        let leaf_count: u64 = self.leaves.values().map(|l| l.active_count() as u64).sum();
        leaf_count + self.tiles.len() as u64 * tile_voxels
    }

    /// Bounds of every active voxel, `None` if nothing is active
    pub fn active_bbox(&self) -> Option<CoordBBox> {
        let leaves = self.leaves.values().filter_map(LeafNode::active_bbox);
        let tiles = self
            .tiles
            .keys()
            .map(|&origin| CoordBBox::cube(origin, TILE_SIZE));
        leaves.chain(tiles).reduce(CoordBBox::union)
    }

    /// Trilinear sample at a fractional index-space position
    ///
    /// The sample is active if the nearest voxel (halves rounded away from
    /// zero) is active; `None` otherwise. Inactive corners contribute their
    /// stored value, usually the background.
    pub fn sample(&self, position: DVec3) -> Option<T> {
        let mut base = position.floor();
        let mut frac = position - base;
        for axis in 0..3 {
            if frac[axis] < SAMPLE_EPSILON {
                frac[axis] = 0.0;
            } else if frac[axis] > 1.0 - SAMPLE_EPSILON {
                frac[axis] = 0.0;
                base[axis] += 1.0;
            }
        }

        let nearest = (base + frac).round();
        if !self.is_active(Coord::new(nearest.x as i32, nearest.y as i32, nearest.z as i32)) {
            return None;
        }

        let base = Coord::new(base.x as i32, base.y as i32, base.z as i32);
        let corners: [T; 8] = std::array::from_fn(|i| {
            let d = Coord::new((i >> 2) as i32 & 1, (i >> 1) as i32 & 1, i as i32 & 1);
            self.get_value(base + d)
        });

        let along_z: [T; 4] =
            std::array::from_fn(|i| T::interpolate(corners[2 * i], corners[2 * i + 1], frac.z));
        let along_y = [
            T::interpolate(along_z[0], along_z[1], frac.y),
            T::interpolate(along_z[2], along_z[3], frac.y),
        ];
        Some(T::interpolate(along_y[0], along_y[1], frac.x))
    }

    /// Copy of the grid with every value converted, keeping topology
    pub fn map_values<U: VoxelValue>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            name: self.name.clone(),
            transform: self.transform,
            background: f(self.background),
            leaves: self
                .leaves
                .iter()
                .map(|(&origin, leaf)| (origin, leaf.map(&f)))
                .collect(),
            tiles: self.tiles.iter().map(|(&origin, &v)| (origin, f(v))).collect(),
        }
    }
}

fn boxes_overlap(a: &CoordBBox, b: &CoordBBox) -> bool {
    a.min.x <= b.max.x
        && b.min.x <= a.max.x
        && a.min.y <= b.max.y
        && b.min.y <= a.max.y
        && a.min.z <= b.max.z
        && b.min.z <= a.max.z
}
