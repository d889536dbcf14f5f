//! Roundtrip command - scene → frame → reference engine → grids, with error report
//!
//! Compares every decompressed channel block against the block it was packed
//! from, so the reported error is the engine's quantization error only.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use voxframe::{
    DecodeConfig, DecodedFrame, DecompressedFrame, FrameDecompressor, ReferenceEngine,
    SparseFrame, SpatialBlockInfo,
};

use crate::encode::{compress, encode_scene};
use crate::report::{FrameReport, GridReport, print_json};

/// Arguments for the roundtrip command
#[derive(Args)]
pub struct RoundtripArgs {
    /// Scene file (.toml)
    pub scene: PathBuf,

    /// Channels to send through the engine (comma-separated, default: all)
    #[arg(long, value_delimiter = ',')]
    pub channels: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct RoundtripReport {
    pub frame: FrameReport,
    pub compressed_bytes: usize,
    pub channels: Vec<ChannelError>,
    pub grids: Vec<GridReport>,
}

/// Decompression error of one channel
#[derive(Debug, Serialize)]
pub struct ChannelError {
    pub name: String,
    pub blocks: usize,
    pub max_error: f32,
}

/// Per-channel maximum absolute difference between source and decoded blocks
pub fn compare(frame: &SparseFrame, out: &DecompressedFrame) -> Result<Vec<ChannelError>> {
    let decoded = out.unpack().context("Failed to unpack decompressed frame")?;
    let by_coords: HashMap<[i32; 3], &SpatialBlockInfo> =
        frame.spatial_blocks.iter().map(|b| (b.coords, b)).collect();

    let mut errors = Vec::with_capacity(out.info.channels.len());
    for (slot, channel) in out.info.channels.iter().enumerate() {
        let source_slot = frame
            .channel_slot(&channel.name)
            .with_context(|| format!("Decompressed channel '{}' not in frame", channel.name))?;

        let mut blocks = 0;
        let mut max_error = 0.0f32;
        for spatial in &decoded.spatial_blocks {
            let Some(index) = DecodedFrame::channel_block_index(spatial, slot) else {
                continue;
            };
            let source = by_coords
                .get(&spatial.coords)
                .and_then(|s| DecodedFrame::channel_block_index(s, source_slot))
                .with_context(|| {
                    format!("Block {:?} of '{}' not in frame", spatial.coords, channel.name)
                })?;

            let a = &frame.blocks[source].voxels;
            let b = &decoded.blocks[index].voxels;
            max_error = a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs())
                .fold(max_error, f32::max);
            blocks += 1;
        }

        errors.push(ChannelError {
            name: channel.name.clone(),
            blocks,
            max_error,
        });
    }
    Ok(errors)
}

/// Execute the roundtrip command
pub fn execute(args: RoundtripArgs) -> Result<()> {
    let frame = encode_scene(&args.scene)?;
    let compressed = compress(&frame, &args.channels)?;
    let out = ReferenceEngine::new()
        .decompress_frame(&compressed)
        .context("Failed to decompress frame")?;

    let channels = compare(&frame, &out)?;
    let config = DecodeConfig {
        offset: Some(frame.origin_offset),
        ..DecodeConfig::default()
    };
    let grids = out.decode(&config).context("Failed to decode frame")?;

    let report = RoundtripReport {
        frame: FrameReport::new(&frame),
        compressed_bytes: compressed.bytes.len(),
        channels,
        grids: grids.iter().map(GridReport::new).collect(),
    };

    if args.json {
        return print_json(&report);
    }

    report.frame.print();
    println!("=== Roundtrip ({} bytes) ===", report.compressed_bytes);
    for c in &report.channels {
        println!("  [{}] {} blocks, max error {:e}", c.name, c.blocks, c.max_error);
    }
    for grid in &report.grids {
        grid.print();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxframe::channel::Channel;
    use voxframe::grid::{Coord, Grid};
    use voxframe::{ChannelInput, EncodeConfig, encode_frame};

    fn frame() -> SparseFrame {
        let mut density = Grid::new("density", 0.0f32);
        density.fill_box(Coord::ZERO, Coord::new(15, 7, 7), 0.1);
        let mut heat = Grid::new("heat", 0.0f32);
        heat.fill_box(Coord::new(8, 0, 0), Coord::new(15, 7, 7), 1.5);
        let inputs = vec![
            ChannelInput::new("density", Some(Channel::from(density))),
            ChannelInput::new("heat", Some(Channel::from(heat))),
        ];
        encode_frame(&inputs, &EncodeConfig::default()).unwrap()
    }

    #[test]
    fn test_compare_reports_quantization_error() {
        let frame = frame();
        let compressed = compress(&frame, &[]).unwrap();
        let out = ReferenceEngine::new().decompress_frame(&compressed).unwrap();
        let errors = compare(&frame, &out).unwrap();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].blocks, 2);
        assert!(errors[0].max_error > 0.0);
        assert!(errors[0].max_error < 1e-3);
        assert_eq!(errors[1].blocks, 1);
        assert_eq!(errors[1].max_error, 0.0);
    }

    #[test]
    fn test_compare_channel_subset() {
        let frame = frame();
        let compressed = compress(&frame, &["heat".to_string()]).unwrap();
        let out = ReferenceEngine::new().decompress_frame(&compressed).unwrap();
        let errors = compare(&frame, &out).unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "heat");
        assert_eq!(errors[0].blocks, 1);
    }

    #[test]
    fn test_roundtrip_execute() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("scene.toml");
        std::fs::write(
            &scene,
            r#"
[encode]
parallel = false

[[channels]]
name = "density"
translation = [-4.0, 0.0, 0.0]

[[channels.boxes]]
min = [-8, 0, 0]
max = [7, 7, 7]
value = 0.25
"#,
        )
        .unwrap();

        execute(RoundtripArgs {
            scene,
            channels: Vec::new(),
            json: true,
        })
        .unwrap();
    }
}
