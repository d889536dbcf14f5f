//! voxframe: block-sparse frame codec for multi-channel sparse volumes
//!
//! Converts a set of named, independently transformed sparse volumes
//! ("channels") into a single flat [`SparseFrame`] of 8³ voxel blocks, and
//! reconstructs sparse volumes from the decompressed form of such a frame.
//!
//! The frame is the hand-off format between a volumetric host and an opaque
//! block compression engine. This crate owns both sides of that boundary
//! except the engine itself, which is reached through the traits in
//! [`engine`].
//!
//! # Modules
//!
//! - [`wire`] - Bit-level packing: block coordinates, half-float decoding
//! - [`grid`] - Two-level sparse volume (tiles + 8³ leaves) with affine transforms
//! - [`channel`] - Named channels with a closed set of voxel kinds
//! - [`encode`] - Channels → [`SparseFrame`] (registry, alignment, resampling, packing)
//! - [`decode`] - Decompressed buffers → per-channel grids
//! - [`engine`] - Compressor/decompressor interface and a reference engine
//!
//! # Usage
//!
//! ```
//! use voxframe::{ChannelInput, EncodeConfig, encode_frame};
//! use voxframe::channel::Channel;
//! use voxframe::grid::{Coord, Grid};
//!
//! let mut density = Grid::<f32>::new("density", 0.0);
//! density.fill_box(Coord::new(0, 0, 0), Coord::new(7, 7, 7), 1.0);
//!
//! let inputs = vec![ChannelInput::new("density", Some(Channel::from(density)))];
//! let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();
//!
//! assert_eq!(frame.spatial_blocks.len(), 1);
//! assert_eq!(frame.channels[0].statistics.voxel_count, 512);
//! ```

pub mod channel;
pub mod config;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod error;
pub mod frame;
pub mod grid;
pub mod math;
pub mod wire;

pub use channel::{Channel, GridData, VoxelKind};
pub use config::{DecodeConfig, DisposalMode, EncodeConfig};
pub use decode::{DecodedFrame, FrameChannel, FrameInfo, build_grids, decode_frame, unpack_blocks};
pub use encode::{ChannelInput, encode_frame};
pub use engine::{
    CompressedFrame, DecompressedFrame, EngineRegistry, FrameCompressor, FrameDecompressor,
    ReferenceEngine,
};
pub use error::{FrameError, Result};
pub use frame::{
    BlockAabb, ChannelBlock, ChannelInfo, ChannelStatistics, SparseFrame, SpatialBlockInfo,
};
pub use wire::{f16_to_f32, f32_to_f16, pack_coords, try_pack_coords, unpack_coords};

// =============================================================================
// Constants
// =============================================================================

/// Edge length of a block, in voxels
pub const BLOCK_SIZE: i32 = 8;

/// log2 of [`BLOCK_SIZE`]
pub const BLOCK_LOG2: u32 = 3;

/// Voxels per block (8³)
pub const BLOCK_VOXEL_COUNT: usize = 512;

/// Maximum number of channel slots in one frame
///
/// Channel masks are `u32` on the wire, but per-frame statistics and the
/// engine are sized for eight channels. Entries beyond this are dropped.
pub const MAX_CHANNELS: usize = 8;

/// Bits per axis in a packed block coordinate
pub const COORD_BITS: u32 = 10;

/// Largest block coordinate representable per axis (1023)
pub const COORD_MAX: u32 = (1 << COORD_BITS) - 1;
