//! Compression engine interface
//!
//! The production engine is an external, opaque codec. This module defines
//! the boundary it is reached through:
//!
//! - [`FrameCompressor`] consumes a [`SparseFrame`] (optionally a subset of
//!   its channels) and produces an opaque [`CompressedFrame`]
//! - [`FrameDecompressor`] turns a [`CompressedFrame`] back into the
//!   decompressed buffers [`crate::decode`] works on
//! - [`EngineRegistry`] owns engine instances behind `u32` handles, the way a
//!   host plugin addresses them
//!
//! [`ReferenceEngine`] implements both directions with a simple half-float
//! container and is used for round-trip testing.

mod reference;

#[cfg(test)]
mod tests;

use hashbrown::HashMap;

use crate::config::DecodeConfig;
use crate::decode::{DecodedFrame, FrameInfo, build_grids, unpack_blocks};
use crate::error::{FrameError, Result};
use crate::frame::SparseFrame;
use crate::grid::Grid;

pub use reference::ReferenceEngine;

/// Opaque engine output for one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedFrame {
    pub bytes: Vec<u8>,
}

/// Decompressed form of a frame, in the engine's buffer layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecompressedFrame {
    pub info: FrameInfo,
    /// Three u32 words per spatial block
    pub spatial: Vec<u32>,
    /// 512 f16 values per channel block
    pub channel: Vec<u16>,
}

impl DecompressedFrame {
    /// Unpack into full-precision blocks
    pub fn unpack(&self) -> Result<DecodedFrame> {
        unpack_blocks(&self.info, &self.spatial, &self.channel)
    }

    /// Unpack and rebuild one grid per channel
    pub fn decode(&self, config: &DecodeConfig) -> Result<Vec<Grid<f32>>> {
        build_grids(&self.info, &self.unpack()?, config)
    }
}

/// Frame → compressed bytes
pub trait FrameCompressor: Send {
    /// Compress `frame`, keeping only the named channels (all when empty)
    fn compress_frame(
        &mut self,
        frame: &SparseFrame,
        channels: &[String],
    ) -> Result<CompressedFrame>;
}

/// Compressed bytes → decompressed buffers
pub trait FrameDecompressor: Send {
    fn decompress_frame(&mut self, frame: &CompressedFrame) -> Result<DecompressedFrame>;
}

// ============================================================================
// Handle Registry
// ============================================================================

/// Engine instances addressed by opaque handles
///
/// Handles start at 1; 0 is never handed out.
pub struct EngineRegistry {
    next_handle: u32,
    compressors: HashMap<u32, Box<dyn FrameCompressor>>,
    decompressors: HashMap<u32, Box<dyn FrameDecompressor>>,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            compressors: HashMap::new(),
            decompressors: HashMap::new(),
        }
    }

    fn allocate_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        handle
    }

    pub fn create_compressor(&mut self, compressor: Box<dyn FrameCompressor>) -> u32 {
        let handle = self.allocate_handle();
        self.compressors.insert(handle, compressor);
        tracing::debug!(handle, "compressor created");
        handle
    }

    pub fn create_decompressor(&mut self, decompressor: Box<dyn FrameDecompressor>) -> u32 {
        let handle = self.allocate_handle();
        self.decompressors.insert(handle, decompressor);
        tracing::debug!(handle, "decompressor created");
        handle
    }

    pub fn compress(
        &mut self,
        handle: u32,
        frame: &SparseFrame,
        channels: &[String],
    ) -> Result<CompressedFrame> {
        self.compressors
            .get_mut(&handle)
            .ok_or(FrameError::InvalidHandle(handle))?
            .compress_frame(frame, channels)
    }

    pub fn decompress(
        &mut self,
        handle: u32,
        frame: &CompressedFrame,
    ) -> Result<DecompressedFrame> {
        self.decompressors
            .get_mut(&handle)
            .ok_or(FrameError::InvalidHandle(handle))?
            .decompress_frame(frame)
    }

    pub fn release_compressor(&mut self, handle: u32) -> Result<()> {
        self.compressors
            .remove(&handle)
            .map(drop)
            .ok_or(FrameError::InvalidHandle(handle))
    }

    pub fn release_decompressor(&mut self, handle: u32) -> Result<()> {
        self.decompressors
            .remove(&handle)
            .map(drop)
            .ok_or(FrameError::InvalidHandle(handle))
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.compressors.len() + self.decompressors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
