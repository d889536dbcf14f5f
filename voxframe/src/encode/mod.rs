//! Channels → [`SparseFrame`]
//!
//! Pipeline, one stage per submodule:
//!
//! 1. [`registry`] - slot per input name, mask bit per valid channel
//! 2. [`align`] - pick the origin channel, relative transforms
//! 3. [`resample`] - voxelized single-float copies in the origin index space
//! 4. [`extract`] - ordered block map and global block bounds
//! 5. [`pack`] - flat arrays, statistics, re-based bounds

pub mod align;
pub mod extract;
pub mod pack;
pub mod registry;
pub mod resample;


use crate::channel::Channel;
use crate::config::{DisposalMode, EncodeConfig};
use crate::error::Result;
use crate::frame::SparseFrame;
use crate::grid::Grid;
use crate::math::Transform;

use align::Alignment;
use registry::ChannelRegistry;

/// One named entry of a frame
///
/// `channel` is `None` when the host has no data for the name in this frame;
/// the slot (and its mask bit) is still reserved.
#[derive(Debug, Clone)]
pub struct ChannelInput {
    pub name: String,
    pub channel: Option<Channel>,
}

impl ChannelInput {
    pub fn new(name: impl Into<String>, channel: Option<Channel>) -> Self {
        Self {
            name: name.into(),
            channel,
        }
    }
}

/// Build a sparse frame from an ordered list of channels
///
/// The only error is [`FrameError::AllocationFailed`](crate::FrameError::AllocationFailed).
/// Missing, empty and surplus channels are skipped (see [`ChannelRegistry`]);
/// if nothing remains the frame is empty but still lists every slot name.
pub fn encode_frame(inputs: &[ChannelInput], config: &EncodeConfig) -> Result<SparseFrame> {
    let registry = ChannelRegistry::new(inputs);
    let names = registry.names();

    let Some(alignment) = Alignment::compute(&registry) else {
        tracing::info!(channels = names.len(), "no valid channels, empty frame");
        return Ok(SparseFrame::empty(&names));
    };

    let prepared = prepare_channels(&registry, &alignment, config);
    let transforms: Vec<Option<Transform>> = prepared
        .iter()
        .map(|grid| grid.as_ref().map(|g| *g.transform()))
        .collect();

    let frame = {
        let map = extract::extract_blocks(&prepared);
        pack::pack_frame(&names, &map, &transforms, config.parallel)
    };

    dispose(prepared, config.disposal);

    let frame = frame?;
    tracing::info!(
        spatial_blocks = frame.spatial_blocks.len(),
        channel_blocks = frame.blocks.len(),
        aabb = ?frame.aabb.max(),
        "encoded frame"
    );
    Ok(frame)
}

/// Voxelized, aligned working copy of every valid slot
fn prepare_channels(
    registry: &ChannelRegistry<'_>,
    alignment: &Alignment,
    config: &EncodeConfig,
) -> Vec<Option<Grid<f32>>> {
    let degenerate = alignment.origin_transform.voxel_volume() <= f64::EPSILON;
    if degenerate {
        tracing::warn!("origin transform is degenerate, channels are not resampled");
    }

    registry
        .slots()
        .iter()
        .map(|slot| {
            let channel = slot.channel?;
            let relative = match alignment.relative[slot.index] {
                Some(relative) if !degenerate => relative,
                _ => Transform::IDENTITY,
            };
            Some(resample::prepare_channel(
                channel,
                &relative,
                &alignment.origin_transform,
                config.identity_tolerance,
                config.parallel,
            ))
        })
        .collect()
}

/// Release per-frame temporaries
fn dispose(prepared: Vec<Option<Grid<f32>>>, mode: DisposalMode) {
    match mode {
        DisposalMode::Synchronous => drop(prepared),
        DisposalMode::Background => {
            let spawned = std::thread::Builder::new()
                .name("voxframe-dispose".into())
                .spawn(move || drop(prepared));
            if let Err(e) = spawned {
                // The closure (and the grids) were dropped on this thread
                tracing::warn!(error = %e, "could not spawn disposal thread");
            }
        }
    }
}
