//! Reference engine: half-float block container
//!
//! Stores the decompressed buffer layout directly, so decompression is exact
//! up to f16 quantization. Useful for exercising the full
//! encode → compress → decompress → decode path without the real codec.
//!
//! Container layout:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Magic: "VXRF" (4 bytes)              │
//! ├──────────────────────────────────────┤
//! │ ReferenceContainer (bitcode)         │
//! │ ├── version: u32                     │
//! │ ├── info: FrameInfo                  │
//! │ ├── spatial: Vec<u32>                │
//! │ └── channel: Vec<u16>                │
//! └──────────────────────────────────────┘
//! ```

use bitcode::{Decode, Encode};
use hashbrown::HashSet;

use super::{CompressedFrame, DecompressedFrame, FrameCompressor, FrameDecompressor};
use crate::decode::{FrameChannel, FrameInfo};
use crate::error::{FrameError, Result};
use crate::frame::SparseFrame;
use crate::wire::{f32_to_f16, try_pack_coords};

/// Container magic bytes
pub const MAGIC: &[u8; 4] = b"VXRF";

/// Current container version
pub const VERSION: u32 = 1;

#[derive(Debug, Clone, Encode, Decode)]
struct ReferenceContainer {
    version: u32,
    info: FrameInfo,
    spatial: Vec<u32>,
    channel: Vec<u16>,
}

/// Lossless-layout, half-precision engine
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngine;

impl ReferenceEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Frame slots kept by a channel selection, with their new slot index
fn select_slots(frame: &SparseFrame, channels: &[String]) -> Vec<Option<usize>> {
    if channels.is_empty() {
        return (0..frame.channels.len()).map(Some).collect();
    }

    let wanted: HashSet<&str> = channels.iter().map(String::as_str).collect();
    for name in &wanted {
        if frame.channel_slot(name).is_none() {
            tracing::warn!(channel = name, "requested channel not in frame");
        }
    }

    let mut next = 0;
    frame
        .channels
        .iter()
        .map(|c| {
            wanted.contains(c.name.as_str()).then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

impl FrameCompressor for ReferenceEngine {
    fn compress_frame(
        &mut self,
        frame: &SparseFrame,
        channels: &[String],
    ) -> Result<CompressedFrame> {
        let remap = select_slots(frame, channels);
        let kept = remap.iter().flatten().count();
        let limit = u32::BITS as usize;
        if kept > limit {
            return Err(FrameError::TooManyChannels { count: kept, limit });
        }

        let mut spatial = Vec::with_capacity(frame.spatial_blocks.len() * 3);
        let mut channel = Vec::new();
        let mut spatial_block_count = 0;
        let mut channel_block_count = 0u32;

        for block in &frame.spatial_blocks {
            let mut mask = 0u32;
            let first = channel_block_count;
            let start = block.channel_blocks_offset as usize;
            let end = start + block.channel_count as usize;

            for index in start..end {
                let (Some(&old_slot), Some(voxels)) =
                    (frame.channel_index_per_block.get(index), frame.blocks.get(index))
                else {
                    return Err(FrameError::ChannelBlockOutOfRange {
                        spatial_block: spatial_block_count,
                        index,
                        count: frame.blocks.len(),
                    });
                };
                let Some(new_slot) = remap.get(old_slot as usize).copied().flatten() else {
                    continue;
                };
                mask |= 1u32 << new_slot;
                channel.extend(voxels.voxels.iter().map(|&v| f32_to_f16(v)));
                channel_block_count += 1;
            }

            if mask == 0 {
                continue;
            }
            let [x, y, z] = block.coords;
            spatial.extend([try_pack_coords(x, y, z)?, first, mask]);
            spatial_block_count += 1;
        }

        let info = FrameInfo {
            channels: frame
                .channels
                .iter()
                .zip(&remap)
                .filter(|(_, slot)| slot.is_some())
                .map(|(c, _)| FrameChannel {
                    name: c.name.clone(),
                    transform: c.transform,
                })
                .collect(),
            spatial_block_count,
            channel_block_count: channel_block_count as usize,
        };

        tracing::debug!(
            spatial_blocks = info.spatial_block_count,
            channel_blocks = info.channel_block_count,
            channels = info.channels.len(),
            "reference engine compressed frame"
        );

        let container = ReferenceContainer {
            version: VERSION,
            info,
            spatial,
            channel,
        };
        let mut bytes = MAGIC.to_vec();
        bytes.extend(bitcode::encode(&container));
        Ok(CompressedFrame { bytes })
    }
}

impl FrameDecompressor for ReferenceEngine {
    fn decompress_frame(&mut self, frame: &CompressedFrame) -> Result<DecompressedFrame> {
        let bytes = &frame.bytes;
        if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
            return Err(FrameError::Serialization("invalid reference container magic".into()));
        }
        let container: ReferenceContainer = bitcode::decode(&bytes[MAGIC.len()..])?;
        if container.version != VERSION {
            return Err(FrameError::Serialization(format!(
                "unsupported reference container version {} (expected {VERSION})",
                container.version
            )));
        }
        Ok(DecompressedFrame {
            info: container.info,
            spatial: container.spatial,
            channel: container.channel,
        })
    }
}
