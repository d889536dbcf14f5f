//! 8³ leaf nodes

use super::coord::{Coord, CoordBBox};
use super::VoxelValue;
use crate::{BLOCK_LOG2, BLOCK_SIZE, BLOCK_VOXEL_COUNT};

/// Words in the 512-bit active mask
const MASK_WORDS: usize = BLOCK_VOXEL_COUNT / 64;

/// Dense 8³ block of voxels with a per-voxel active mask
///
/// Values are stored in scan order `(x << 6) | (y << 3) | z`, so z varies
/// fastest. This is the order channel blocks use on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode<T: VoxelValue> {
    origin: Coord,
    values: Box<[T; BLOCK_VOXEL_COUNT]>,
    active: [u64; MASK_WORDS],
}

impl<T: VoxelValue> LeafNode<T> {
    /// Empty leaf: every voxel inactive and set to `background`
    ///
    /// `origin` is snapped down to the 8-voxel grid.
    pub fn new(origin: Coord, background: T) -> Self {
        Self {
            origin: origin.align_down(BLOCK_SIZE),
            values: Box::new([background; BLOCK_VOXEL_COUNT]),
            active: [0; MASK_WORDS],
        }
    }

    /// Leaf with every voxel set to `value` and active
    pub fn filled(origin: Coord, value: T) -> Self {
        let mut leaf = Self::new(origin, value);
        leaf.active = [u64::MAX; MASK_WORDS];
        leaf
    }

    /// Fully active leaf taking ownership of a dense value buffer
    pub fn from_values(origin: Coord, values: Box<[T; BLOCK_VOXEL_COUNT]>) -> Self {
        Self {
            origin: origin.align_down(BLOCK_SIZE),
            values,
            active: [u64::MAX; MASK_WORDS],
        }
    }

    /// Scan-order offset of a leaf-local coordinate (each axis in 0..8)
    #[inline]
    pub const fn offset(x: i32, y: i32, z: i32) -> usize {
        ((x << (2 * BLOCK_LOG2)) | (y << BLOCK_LOG2) | z) as usize
    }

    /// Leaf-local coordinate of a scan-order offset
    #[inline]
    pub const fn local_coord(offset: usize) -> Coord {
        let o = offset as i32;
        Coord::new(o >> (2 * BLOCK_LOG2), (o >> BLOCK_LOG2) & 7, o & 7)
    }

    /// Scan-order offset of a global coordinate inside this leaf
    #[inline]
    pub fn offset_of(&self, coord: Coord) -> usize {
        let local = coord - self.origin;
        Self::offset(local.x, local.y, local.z)
    }

    pub fn origin(&self) -> Coord {
        self.origin
    }

    /// Node bounds (all 512 voxels, active or not)
    pub fn node_bbox(&self) -> CoordBBox {
        CoordBBox::cube(self.origin, BLOCK_SIZE)
    }

    /// Dense voxel buffer in scan order
    pub fn values(&self) -> &[T; BLOCK_VOXEL_COUNT] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T; BLOCK_VOXEL_COUNT] {
        &mut self.values
    }

    #[inline]
    pub fn get(&self, offset: usize) -> T {
        self.values[offset]
    }

    /// Set a value and mark it active
    #[inline]
    pub fn set(&mut self, offset: usize, value: T) {
        self.values[offset] = value;
        self.set_active(offset, true);
    }

    #[inline]
    pub fn is_active(&self, offset: usize) -> bool {
        self.active[offset / 64] & (1 << (offset % 64)) != 0
    }

    #[inline]
    pub fn set_active(&mut self, offset: usize, on: bool) {
        let bit = 1u64 << (offset % 64);
        if on {
            self.active[offset / 64] |= bit;
        } else {
            self.active[offset / 64] &= !bit;
        }
    }

    pub fn active_count(&self) -> u32 {
        self.active.iter().map(|w| w.count_ones()).sum()
    }

    pub fn has_active(&self) -> bool {
        self.active.iter().any(|&w| w != 0)
    }

    /// Bounds of the active voxels, `None` if the leaf is inactive
    pub fn active_bbox(&self) -> Option<CoordBBox> {
        let mut bbox: Option<CoordBBox> = None;
        for offset in 0..BLOCK_VOXEL_COUNT {
            if self.is_active(offset) {
                let c = self.origin + Self::local_coord(offset);
                bbox = Some(match bbox {
                    Some(b) => b.expand(c),
                    None => CoordBBox::new(c, c),
                });
            }
        }
        bbox
    }

    /// Convert every value, keeping the active mask
    pub fn map<U: VoxelValue>(&self, f: impl Fn(T) -> U) -> LeafNode<U> {
        let values: Box<[U; BLOCK_VOXEL_COUNT]> =
            Box::new(std::array::from_fn(|i| f(self.values[i])));
        LeafNode {
            origin: self.origin,
            values,
            active: self.active,
        }
    }
}
