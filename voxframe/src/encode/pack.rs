//! Flat frame layout, block copy and channel statistics

use rayon::prelude::*;

use super::extract::{BlockMap, BlockRef};
use crate::error::{Result, try_alloc};
use crate::frame::{ChannelBlock, ChannelInfo, ChannelStatistics, SparseFrame, SpatialBlockInfo};
use crate::grid::Coord;
use crate::math::Transform;
use crate::{BLOCK_SIZE, BLOCK_VOXEL_COUNT};

/// Voxel volumes below this are treated as a collapsed transform
const MIN_VOXEL_VOLUME: f64 = f64::EPSILON;

// ============================================================================
// Per-Block Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct BlockStatistics {
    min: f32,
    max: f32,
    /// Sum of positive voxels / 512
    mean_positive: f32,
    /// Sum of non-positive voxels / 512
    mean_negative: f32,
}

impl Default for BlockStatistics {
    fn default() -> Self {
        Self {
            min: f32::MAX,
            max: f32::MIN,
            mean_positive: 0.0,
            mean_negative: 0.0,
        }
    }
}

impl BlockStatistics {
    fn of(voxels: &[f32; BLOCK_VOXEL_COUNT]) -> Self {
        let mut stats = Self::default();
        let mut positive = 0.0f32;
        let mut negative = 0.0f32;
        for &v in voxels {
            stats.min = stats.min.min(v);
            stats.max = stats.max.max(v);
            if v > 0.0 {
                positive += v;
            } else {
                negative += v;
            }
        }
        stats.mean_positive = positive / BLOCK_VOXEL_COUNT as f32;
        stats.mean_negative = negative / BLOCK_VOXEL_COUNT as f32;
        stats
    }
}

/// Running per-channel fold over block statistics
#[derive(Debug, Clone, Copy)]
struct ChannelAccumulator {
    min: f32,
    max: f32,
    mean_positive: f64,
    mean_negative: f64,
    blocks: u32,
}

impl Default for ChannelAccumulator {
    fn default() -> Self {
        Self {
            min: f32::MAX,
            max: f32::MIN,
            mean_positive: 0.0,
            mean_negative: 0.0,
            blocks: 0,
        }
    }
}

impl ChannelAccumulator {
    fn add(&mut self, block: &BlockStatistics) {
        self.min = self.min.min(block.min);
        self.max = self.max.max(block.max);
        self.mean_positive += block.mean_positive as f64;
        self.mean_negative += block.mean_negative as f64;
        self.blocks += 1;
    }

    fn finish(&self) -> Option<ChannelStatistics> {
        if self.blocks == 0 {
            return None;
        }
        let n = self.blocks as f64;
        Some(ChannelStatistics {
            min: self.min,
            max: self.max,
            mean_positive: (self.mean_positive / n) as f32,
            mean_negative: (self.mean_negative / n) as f32,
            voxel_count: self.blocks * BLOCK_VOXEL_COUNT as u32,
        })
    }
}

// ============================================================================
// Packing
// ============================================================================

/// Output slots owned by one spatial block
///
/// Every spatial block writes only into its own disjoint sub-slices, so
/// blocks can be packed in any order on any thread.
struct SpatialSlot<'o, 'm> {
    coord: Coord,
    refs: &'m [BlockRef<'m>],
    offset: u32,
    info: &'o mut SpatialBlockInfo,
    blocks: &'o mut [ChannelBlock],
    channel_index: &'o mut [u32],
    stats: &'o mut [BlockStatistics],
}

impl SpatialSlot<'_, '_> {
    fn pack(self, aabb_min: Coord) {
        let rel = self.coord - aabb_min;
        self.info.coords = rel.to_array();
        self.info.channel_blocks_offset = self.offset;

        for (i, block_ref) in self.refs.iter().enumerate() {
            self.blocks[i].voxels = *block_ref.voxels;
            self.stats[i] = BlockStatistics::of(&self.blocks[i].voxels);
            self.channel_index[i] = block_ref.slot as u32;
            self.info.channel_mask |= 1 << block_ref.slot;
            self.info.channel_count += 1;
        }
    }
}

/// Lay out, copy and summarize every block of `map`
///
/// `names` lists every slot; `transforms[slot]` is the index → world transform
/// of the slot's prepared channel, `None` for slots without data.
pub fn pack_frame(
    names: &[&str],
    map: &BlockMap<'_>,
    transforms: &[Option<Transform>],
    parallel: bool,
) -> Result<SparseFrame> {
    if map.is_empty() {
        return Ok(SparseFrame::empty(names));
    }

    let entries: Vec<(&Coord, &Vec<BlockRef<'_>>)> = map.blocks.iter().collect();
    let spatial_count = entries.len();
    let channel_count = map.channel_block_count();
    if spatial_count == 0 || channel_count == 0 {
        return Ok(SparseFrame::empty(names));
    }

    let mut spatial_blocks =
        try_alloc("spatial blocks", spatial_count, SpatialBlockInfo::default())?;
    let mut blocks = try_alloc("channel blocks", channel_count, ChannelBlock::default())?;
    let mut channel_index_per_block = try_alloc("channel index per block", channel_count, 0u32)?;
    let mut block_stats = try_alloc("block statistics", channel_count, BlockStatistics::default())?;

    {
        let mut slots = Vec::with_capacity(spatial_count);
        let mut rest_blocks = blocks.as_mut_slice();
        let mut rest_index = channel_index_per_block.as_mut_slice();
        let mut rest_stats = block_stats.as_mut_slice();
        let mut offset = 0u32;

        for (info, &(&coord, refs)) in spatial_blocks.iter_mut().zip(&entries) {
            let n = refs.len();
            let (blocks, tail) = std::mem::take(&mut rest_blocks).split_at_mut(n);
            rest_blocks = tail;
            let (channel_index, tail) = std::mem::take(&mut rest_index).split_at_mut(n);
            rest_index = tail;
            let (stats, tail) = std::mem::take(&mut rest_stats).split_at_mut(n);
            rest_stats = tail;

            slots.push(SpatialSlot {
                coord,
                refs: refs.as_slice(),
                offset,
                info,
                blocks,
                channel_index,
                stats,
            });
            offset += n as u32;
        }

        let aabb_min = Coord::from(map.aabb.min());
        if parallel {
            slots.into_par_iter().for_each(|slot| slot.pack(aabb_min));
        } else {
            slots.into_iter().for_each(|slot| slot.pack(aabb_min));
        }
    }

    let mut accumulators = vec![ChannelAccumulator::default(); names.len()];
    for (&slot, stats) in channel_index_per_block.iter().zip(&block_stats) {
        if let Some(acc) = accumulators.get_mut(slot as usize) {
            acc.add(stats);
        }
    }

    let origin_offset = Coord::from(map.aabb.min()).scale(BLOCK_SIZE);
    let channels = names
        .iter()
        .enumerate()
        .map(|(slot, &name)| {
            let mut info = ChannelInfo::new(name);
            let Some(statistics) = accumulators[slot].finish() else {
                return info;
            };
            info.statistics = statistics;
            if let Some(transform) = transforms.get(slot).copied().flatten() {
                if transform.voxel_volume().abs() > MIN_VOXEL_VOLUME {
                    info.transform = transform
                        .post_translate_index(origin_offset.as_dvec3())
                        .to_raw();
                } else {
                    tracing::warn!(channel = name, "degenerate channel transform, using identity");
                }
            }
            info
        })
        .collect();

    tracing::debug!(
        spatial_blocks = spatial_count,
        channel_blocks = channel_count,
        "packed frame blocks"
    );

    Ok(SparseFrame {
        aabb: map.aabb.rebased(),
        spatial_blocks,
        blocks,
        channel_index_per_block,
        channels,
        origin_offset: origin_offset.to_array(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::BlockAabb;

    #[test]
    fn test_block_statistics() {
        let mut voxels = [0.0f32; BLOCK_VOXEL_COUNT];
        voxels[0] = 512.0;
        voxels[1] = -256.0;
        let stats = BlockStatistics::of(&voxels);
        assert_eq!(stats.min, -256.0);
        assert_eq!(stats.max, 512.0);
        assert_eq!(stats.mean_positive, 1.0);
        assert_eq!(stats.mean_negative, -0.5);
    }

    #[test]
    fn test_all_negative_block_max() {
        let stats = BlockStatistics::of(&[-3.0; BLOCK_VOXEL_COUNT]);
        assert_eq!(stats.max, -3.0);
        assert_eq!(stats.min, -3.0);
        assert_eq!(stats.mean_positive, 0.0);
        assert_eq!(stats.mean_negative, -3.0);
    }

    #[test]
    fn test_accumulator_means_over_blocks() {
        let mut acc = ChannelAccumulator::default();
        assert!(acc.finish().is_none());
        acc.add(&BlockStatistics::of(&[1.0; BLOCK_VOXEL_COUNT]));
        acc.add(&BlockStatistics::of(&[0.0; BLOCK_VOXEL_COUNT]));
        let stats = acc.finish().unwrap();
        assert_eq!(stats.mean_positive, 0.5);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.voxel_count, 1024);
    }

    #[test]
    fn test_empty_map_gives_sentinel() {
        let map = BlockMap::default();
        let frame = pack_frame(&["density"], &map, &[None], true).unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.channels.len(), 1);
        assert_eq!(frame.aabb, BlockAabb::default());
    }
}
