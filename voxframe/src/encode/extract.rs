//! Leaf walk: block map and global block-space bounds

use std::collections::BTreeMap;

use crate::frame::BlockAabb;
use crate::grid::{Coord, CoordBBox, Grid};
use crate::math::{ceil_to_block, ceil_with_epsilon, floor_to_block, floor_with_epsilon};
use crate::{BLOCK_SIZE, BLOCK_VOXEL_COUNT};

/// One channel's voxels inside a spatial block
#[derive(Debug, Clone, Copy)]
pub struct BlockRef<'a> {
    pub slot: usize,
    pub voxels: &'a [f32; BLOCK_VOXEL_COUNT],
}

/// Every occupied block, keyed by absolute block coordinate
#[derive(Debug, Default)]
pub struct BlockMap<'a> {
    /// Union of all leaf bounds, in blocks (max exclusive)
    pub aabb: BlockAabb,
    /// Channel entries per block, ascending by slot
    pub blocks: BTreeMap<Coord, Vec<BlockRef<'a>>>,
}

impl BlockMap<'_> {
    pub fn is_empty(&self) -> bool {
        self.aabb.is_empty() || self.blocks.is_empty()
    }

    /// Total number of channel blocks
    pub fn channel_block_count(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }
}

/// Block-space bounds of an index-space box
///
/// Min is floored and max ceiled to the block grid, then both are divided by
/// [`BLOCK_SIZE`]. A leaf node at the origin gives `{0,0,0 .. 1,1,1}`.
pub fn block_aabb(bbox: &CoordBBox) -> BlockAabb {
    let lo = |v: i32| floor_to_block(floor_with_epsilon(v as f64)) / BLOCK_SIZE;
    let hi = |v: i32| ceil_to_block(ceil_with_epsilon(v as f64)) / BLOCK_SIZE;
    BlockAabb {
        min_x: lo(bbox.min.x),
        min_y: lo(bbox.min.y),
        min_z: lo(bbox.min.z),
        max_x: hi(bbox.max.x),
        max_y: hi(bbox.max.y),
        max_z: hi(bbox.max.z),
    }
}

/// Walk the leaves of every prepared channel, in slot order
///
/// `channels[slot]` is `None` for slots without data.
pub fn extract_blocks(channels: &[Option<Grid<f32>>]) -> BlockMap<'_> {
    let mut map = BlockMap {
        aabb: BlockAabb::EMPTY,
        blocks: BTreeMap::new(),
    };

    for (slot, grid) in channels.iter().enumerate() {
        let Some(grid) = grid else { continue };
        if grid.is_empty() {
            continue;
        }
        for leaf in grid.leaves() {
            let aabb = block_aabb(&leaf.node_bbox());
            map.aabb = map.aabb.union(aabb);
            let key = Coord::new(aabb.min_x, aabb.min_y, aabb.min_z);
            map.blocks.entry(key).or_default().push(BlockRef {
                slot,
                voxels: leaf.values(),
            });
        }
        tracing::debug!(
            channel = grid.name(),
            leaves = grid.leaf_count(),
            "extracted channel blocks"
        );
    }

    map
}
