//! Inspect command - decompress a frame file and summarize its grids

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use voxframe::{
    CompressedFrame, DecodeConfig, DecompressedFrame, FrameDecompressor, ReferenceEngine,
};

use crate::report::{GridReport, print_json};

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Compressed frame file (.vxrf)
    pub input: PathBuf,

    /// Voxel offset added to decoded leaves, e.g. the encoder's origin offset
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub offset: Option<Vec<i32>>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub compressed_bytes: usize,
    pub spatial_blocks: usize,
    pub channel_blocks: usize,
    pub grids: Vec<GridReport>,
}

pub fn parse_offset(values: Option<&[i32]>) -> Result<Option<[i32; 3]>> {
    values
        .map(|v| {
            <[i32; 3]>::try_from(v)
                .map_err(|_| anyhow::anyhow!("Offset needs exactly 3 values (got {})", v.len()))
        })
        .transpose()
}

/// Read and decompress a reference-engine frame file
pub fn load_frame(path: &std::path::Path) -> Result<(usize, DecompressedFrame)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read frame: {}", path.display()))?;
    let len = bytes.len();
    let frame = ReferenceEngine::new()
        .decompress_frame(&CompressedFrame { bytes })
        .with_context(|| format!("Failed to decompress frame: {}", path.display()))?;
    Ok((len, frame))
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let config = DecodeConfig {
        offset: parse_offset(args.offset.as_deref())?,
        ..DecodeConfig::default()
    };
    let (compressed_bytes, frame) = load_frame(&args.input)?;
    let grids = frame.decode(&config).context("Failed to decode frame")?;

    let report = InspectReport {
        compressed_bytes,
        spatial_blocks: frame.info.spatial_block_count,
        channel_blocks: frame.info.channel_block_count,
        grids: grids.iter().map(GridReport::new).collect(),
    };

    if args.json {
        return print_json(&report);
    }

    println!("=== {} ===", args.input.display());
    println!(
        "  {} bytes, {} spatial blocks, {} channel blocks",
        report.compressed_bytes, report.spatial_blocks, report.channel_blocks
    );
    if report.grids.is_empty() {
        println!("  (no blocks)");
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
    use voxframe::{ChannelInput, EncodeConfig, FrameCompressor, encode_frame};

    fn write_frame(path: &std::path::Path) {
        let mut density = Grid::new("density", 0.0f32);
        density.fill_box(Coord::new(-8, 0, 0), Coord::new(-1, 7, 7), 1.0);
        let inputs = vec![ChannelInput::new("density", Some(Channel::from(density)))];
        let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();
        let compressed = ReferenceEngine::new().compress_frame(&frame, &[]).unwrap();
        std::fs::write(path, compressed.bytes).unwrap();
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset(None).unwrap(), None);
        assert_eq!(parse_offset(Some(&[-8, 0, 16])).unwrap(), Some([-8, 0, 16]));
        assert!(parse_offset(Some(&[1, 2])).is_err());
    }

    #[test]
    fn test_load_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.vxrf");
        write_frame(&path);

        let (bytes, frame) = load_frame(&path).unwrap();
        assert!(bytes > 4);
        assert_eq!(frame.info.spatial_block_count, 1);

        let config = DecodeConfig {
            offset: Some([-8, 0, 0]),
            ..DecodeConfig::default()
        };
        let grids = frame.decode(&config).unwrap();
        assert_eq!(grids[0].get_value(Coord::new(-8, 0, 0)), 1.0);
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.vxrf");
        std::fs::write(&path, b"not a frame").unwrap();
        let result = execute(InspectArgs {
            input: path,
            offset: None,
            json: false,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_execute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.vxrf");
        write_frame(&path);
        execute(InspectArgs {
            input: path,
            offset: Some(vec![-8, 0, 0]),
            json: true,
        })
        .unwrap();
    }
}
