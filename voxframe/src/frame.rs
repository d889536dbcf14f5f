//! Sparse frame: the flat block layout handed to the compression engine
//!
//! A frame is a list of occupied 8³ spatial blocks. Each spatial block points
//! at a contiguous run of channel blocks, one per channel present in it, in
//! ascending channel order:
//!
//! ```text
//! spatial_blocks:  [ S0 (mask 0b011) | S1 (mask 0b010) | ... ]
//!                     │                 │
//!                     ▼                 ▼
//! blocks:          [ C0 ch0 | C1 ch1  | C2 ch1 | ... ]
//! channel_index:   [   0    |   1     |   1    | ... ]
//! ```

use bytemuck::{Pod, Zeroable};

use crate::BLOCK_VOXEL_COUNT;
use crate::math::Transform;

// ============================================================================
// Wire Structs
// ============================================================================

/// One occupied block of the frame
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SpatialBlockInfo {
    /// Block coordinate, relative to the frame AABB minimum
    pub coords: [i32; 3],
    /// Index of this block's first entry in [`SparseFrame::blocks`]
    pub channel_blocks_offset: u32,
    /// Bit `1 << slot` for every channel present
    pub channel_mask: u32,
    /// Number of channels present (`channel_mask.count_ones()`)
    pub channel_count: u32,
}

/// 8³ dense voxels of one channel, in leaf scan order
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ChannelBlock {
    pub voxels: [f32; BLOCK_VOXEL_COUNT],
}

impl Default for ChannelBlock {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}

/// Block-space bounding box, max exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockAabb {
    pub min_x: i32,
    pub min_y: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub max_z: i32,
}

impl BlockAabb {
    /// Inverted box; the union with any box yields that box
    pub const EMPTY: Self = Self {
        min_x: i32::MAX,
        min_y: i32::MAX,
        min_z: i32::MAX,
        max_x: i32::MIN,
        max_y: i32::MIN,
        max_z: i32::MIN,
    };

    pub const fn min(&self) -> [i32; 3] {
        [self.min_x, self.min_y, self.min_z]
    }

    pub const fn max(&self) -> [i32; 3] {
        [self.max_x, self.max_y, self.max_z]
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            min_z: self.min_z.min(other.min_z),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// True if any axis has no extent
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y || self.max_z <= self.min_z
    }

    /// Same extent with the minimum moved to the origin
    pub fn rebased(&self) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            min_z: 0,
            max_x: self.max_x - self.min_x,
            max_y: self.max_y - self.min_y,
            max_z: self.max_z - self.min_z,
        }
    }
}

// ============================================================================
// Channel Metadata
// ============================================================================

/// Aggregate voxel statistics of one channel over the whole frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStatistics {
    pub min: f32,
    pub max: f32,
    /// Mean over blocks of (sum of positive voxels / 512)
    pub mean_positive: f32,
    /// Mean over blocks of (sum of non-positive voxels / 512)
    pub mean_negative: f32,
    /// 512 × number of blocks containing the channel
    pub voxel_count: u32,
}

impl Default for ChannelStatistics {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            mean_positive: 0.0,
            mean_negative: 0.0,
            voxel_count: 0,
        }
    }
}

/// Per-channel entry of a frame, in slot order
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub name: String,
    /// Index → world transform of the frame-local index space (see [`Transform::to_raw`])
    pub transform: [f32; 16],
    pub statistics: ChannelStatistics,
}

impl ChannelInfo {
    /// Entry with identity transform and zeroed statistics
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY.to_raw(),
            statistics: ChannelStatistics::default(),
        }
    }
}

// ============================================================================
// Sparse Frame
// ============================================================================

/// Block-sparse multi-channel frame
///
/// Produced by [`encode_frame`](crate::encode_frame), owned by the caller and
/// released as a unit when dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseFrame {
    /// Occupied block range; min is (0, 0, 0) unless the frame is empty
    pub aabb: BlockAabb,
    pub spatial_blocks: Vec<SpatialBlockInfo>,
    pub blocks: Vec<ChannelBlock>,
    /// Channel slot of each entry in `blocks`
    pub channel_index_per_block: Vec<u32>,
    pub channels: Vec<ChannelInfo>,
    /// Voxel offset removed when the AABB was moved to the origin
    ///
    /// Adding it to `coords * 8` of any spatial block gives the block's
    /// original index-space position in the origin channel.
    pub origin_offset: [i32; 3],
}

impl SparseFrame {
    /// Frame with no blocks; channel names are kept with default info
    pub fn empty<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            aabb: BlockAabb::default(),
            spatial_blocks: Vec::new(),
            blocks: Vec::new(),
            channel_index_per_block: Vec::new(),
            channels: names.iter().map(|n| ChannelInfo::new(n.as_ref())).collect(),
            origin_offset: [0; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spatial_blocks.is_empty()
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    /// Slot of a channel by name
    pub fn channel_slot(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    /// Channel blocks belonging to one spatial block
    pub fn blocks_of(&self, spatial: &SpatialBlockInfo) -> &[ChannelBlock] {
        let start = spatial.channel_blocks_offset as usize;
        &self.blocks[start..start + spatial.channel_count as usize]
    }

    /// Raw bytes of the spatial block array
    pub fn spatial_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spatial_blocks)
    }

    /// Raw bytes of the channel block array
    pub fn block_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_struct_sizes() {
        assert_eq!(std::mem::size_of::<SpatialBlockInfo>(), 24);
        assert_eq!(std::mem::size_of::<ChannelBlock>(), 512 * 4);
    }

    #[test]
    fn test_aabb_union_and_rebase() {
        let a = BlockAabb {
            min_x: 2,
            min_y: -1,
            min_z: 0,
            max_x: 3,
            max_y: 0,
            max_z: 1,
        };
        let b = BlockAabb {
            min_x: 4,
            min_y: 0,
            min_z: 0,
            max_x: 6,
            max_y: 1,
            max_z: 1,
        };
        let u = BlockAabb::EMPTY.union(a).union(b);
        assert_eq!(u.min(), [2, -1, 0]);
        assert_eq!(u.max(), [6, 1, 1]);
        assert!(!u.is_empty());
        assert_eq!(u.rebased().max(), [4, 2, 1]);
        assert!(BlockAabb::EMPTY.is_empty());
        assert!(BlockAabb::default().is_empty());
    }

    #[test]
    fn test_empty_frame_lists_channels() {
        let frame = SparseFrame::empty(&["density", "temperature"]);
        assert!(frame.is_empty());
        assert_eq!(frame.channel_names().collect::<Vec<_>>(), ["density", "temperature"]);
        assert_eq!(frame.channel_slot("temperature"), Some(1));
        assert_eq!(frame.channels[0].statistics, ChannelStatistics::default());
        assert!(frame.spatial_bytes().is_empty());
    }

    #[test]
    fn test_byte_views() {
        let mut frame = SparseFrame::empty(&["density"]);
        frame.spatial_blocks.push(SpatialBlockInfo {
            coords: [1, 2, 3],
            channel_blocks_offset: 0,
            channel_mask: 1,
            channel_count: 1,
        });
        frame.blocks.push(ChannelBlock::default());
        assert_eq!(frame.spatial_bytes().len(), 24);
        assert_eq!(&frame.spatial_bytes()[0..4], &1i32.to_ne_bytes());
        assert_eq!(frame.block_bytes().len(), 2048);
        assert_eq!(frame.blocks_of(&frame.spatial_blocks[0]).len(), 1);
    }
}
