//! Decompressed buffers → per-channel grids
//!
//! The engine hands back two flat buffers per frame:
//!
//! ```text
//! spatial (u32):  [ packed coord | channel_blocks_offset | channel_mask ] × spatial_block_count
//! channel (u16):  [ 512 half floats ] × channel_block_count
//! ```
//!
//! [`unpack_blocks`] turns them into full-precision blocks; [`build_grids`]
//! rebuilds one sparse grid per channel from those blocks.


use bitcode::{Decode, Encode};
use rayon::prelude::*;

use crate::config::DecodeConfig;
use crate::error::{FrameError, Result, try_alloc};
use crate::frame::{ChannelBlock, SpatialBlockInfo};
use crate::grid::{Coord, Grid, LeafNode};
use crate::math::Transform;
use crate::wire::{decode_f16_slice, unpack_coords};
use crate::{BLOCK_SIZE, BLOCK_VOXEL_COUNT};

/// u32 words per spatial block in the decompressed spatial buffer
pub const SPATIAL_WORDS: usize = 3;

/// Channel entry of a decompressed frame
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct FrameChannel {
    pub name: String,
    /// Index → world transform in wire layout; all zeros means identity
    pub transform: [f32; 16],
}

/// Shape of a decompressed frame
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
pub struct FrameInfo {
    /// Channels in slot order; slot `i` owns mask bit `1 << i`
    pub channels: Vec<FrameChannel>,
    pub spatial_block_count: usize,
    pub channel_block_count: usize,
}

impl FrameInfo {
    /// Expected length of the spatial buffer, in u32 words
    pub fn spatial_len(&self) -> usize {
        self.spatial_block_count * SPATIAL_WORDS
    }

    /// Expected length of the channel buffer, in u16 halves
    pub fn channel_len(&self) -> usize {
        self.channel_block_count * BLOCK_VOXEL_COUNT
    }

    fn check_buffers(&self, spatial: &[u32], channel: &[u16]) -> Result<()> {
        if spatial.len() != self.spatial_len() {
            return Err(FrameError::BufferSizeMismatch {
                buffer: "spatial",
                expected: self.spatial_len(),
                actual: spatial.len(),
            });
        }
        if channel.len() != self.channel_len() {
            return Err(FrameError::BufferSizeMismatch {
                buffer: "channel",
                expected: self.channel_len(),
                actual: channel.len(),
            });
        }
        Ok(())
    }
}

/// Full-precision blocks of a decompressed frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Coordinates are the unpacked 10-bit block coordinates
    pub spatial_blocks: Vec<SpatialBlockInfo>,
    pub blocks: Vec<ChannelBlock>,
}

impl DecodedFrame {
    /// Channel block holding `slot` for a spatial block, if present
    ///
    /// The index is the spatial block's offset plus the number of lower
    /// slots present in its mask.
    pub fn channel_block_index(spatial: &SpatialBlockInfo, slot: usize) -> Option<usize> {
        let bit = 1u32.checked_shl(slot as u32)?;
        if spatial.channel_mask & bit == 0 {
            return None;
        }
        let below = (spatial.channel_mask & (bit - 1)).count_ones();
        Some(spatial.channel_blocks_offset as usize + below as usize)
    }
}

/// Unpack coordinates and decode halves
///
/// Fails if either buffer does not match `info`, or if a spatial block
/// references channel blocks past the end of the channel buffer.
pub fn unpack_blocks(info: &FrameInfo, spatial: &[u32], channel: &[u16]) -> Result<DecodedFrame> {
    info.check_buffers(spatial, channel)?;

    let spatial_blocks: Vec<SpatialBlockInfo> = spatial
        .chunks_exact(SPATIAL_WORDS)
        .map(|words| {
            let [x, y, z] = unpack_coords(words[0]);
            SpatialBlockInfo {
                coords: [x as i32, y as i32, z as i32],
                channel_blocks_offset: words[1],
                channel_mask: words[2],
                channel_count: words[2].count_ones(),
            }
        })
        .collect();

    for (i, block) in spatial_blocks.iter().enumerate() {
        let end = block.channel_blocks_offset as usize + block.channel_count as usize;
        if end > info.channel_block_count {
            return Err(FrameError::ChannelBlockOutOfRange {
                spatial_block: i,
                index: end.saturating_sub(1),
                count: info.channel_block_count,
            });
        }
    }

    let mut blocks = try_alloc(
        "channel blocks",
        info.channel_block_count,
        ChannelBlock::default(),
    )?;
    blocks
        .par_iter_mut()
        .zip(channel.par_chunks_exact(BLOCK_VOXEL_COUNT))
        .try_for_each(|(block, halves)| decode_f16_slice(halves, &mut block.voxels))?;

    Ok(DecodedFrame {
        spatial_blocks,
        blocks,
    })
}

/// Rebuild one grid per channel from unpacked blocks
///
/// Every block becomes a fully active leaf at `coords * 8 + offset`. Leaves
/// are block-aligned, so the offset is rounded down to a multiple of 8 first.
/// The grid transform is shifted by minus the applied offset, so world
/// positions do not depend on the offset.
pub fn build_grids(
    info: &FrameInfo,
    frame: &DecodedFrame,
    config: &DecodeConfig,
) -> Result<Vec<Grid<f32>>> {
    if info.channels.is_empty() || frame.spatial_blocks.is_empty() || frame.blocks.is_empty() {
        return Ok(Vec::new());
    }

    let requested = Coord::from(config.offset.unwrap_or([0; 3]));
    let offset = requested.align_down(BLOCK_SIZE);
    if offset != requested {
        tracing::warn!(
            requested = ?requested.to_array(),
            applied = ?offset.to_array(),
            "decode offset is not block-aligned, rounding down"
        );
    }
    let mut grids = Vec::with_capacity(info.channels.len());

    for (slot, channel) in info.channels.iter().enumerate() {
        let base = if Transform::is_raw_empty(&channel.transform) {
            Transform::IDENTITY
        } else {
            Transform::from_raw(&channel.transform)
        };
        let transform = base.post_translate_index(-offset.as_dvec3());

        let mut work = Vec::new();
        for (i, spatial) in frame.spatial_blocks.iter().enumerate() {
            let Some(index) = DecodedFrame::channel_block_index(spatial, slot) else {
                continue;
            };
            if index >= frame.blocks.len() {
                return Err(FrameError::ChannelBlockOutOfRange {
                    spatial_block: i,
                    index,
                    count: frame.blocks.len(),
                });
            }
            let origin = Coord::from(spatial.coords).scale(BLOCK_SIZE) + offset;
            work.push((origin, index));
        }

        let build = |&(origin, index): &(Coord, usize)| {
            LeafNode::from_values(origin, Box::new(frame.blocks[index].voxels))
        };
        let leaves: Vec<LeafNode<f32>> = if config.parallel {
            work.par_iter().map(build).collect()
        } else {
            work.iter().map(build).collect()
        };

        let mut grid = Grid::with_transform(channel.name.as_str(), transform, 0.0f32);
        for leaf in leaves {
            grid.insert_leaf(leaf);
        }
        grid.prune_inactive();

        tracing::debug!(channel = %channel.name, leaves = grid.leaf_count(), "decoded channel");
        grids.push(grid);
    }

    Ok(grids)
}

/// Unpack decompressed buffers and rebuild every channel grid
pub fn decode_frame(
    info: &FrameInfo,
    spatial: &[u32],
    channel: &[u16],
    config: &DecodeConfig,
) -> Result<Vec<Grid<f32>>> {
    let frame = unpack_blocks(info, spatial, channel)?;
    let grids = build_grids(info, &frame, config)?;
    tracing::info!(
        channels = grids.len(),
        spatial_blocks = frame.spatial_blocks.len(),
        channel_blocks = frame.blocks.len(),
        "decoded frame"
    );
    Ok(grids)
}
