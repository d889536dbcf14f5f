//! Encode command - scene → frame → reference-compressed file

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use voxframe::{CompressedFrame, EngineRegistry, ReferenceEngine, SparseFrame, encode_frame};

use crate::report::{FrameReport, print_json};
use crate::scene::Scene;

/// Arguments for the encode command
#[derive(Args)]
pub struct EncodeArgs {
    /// Scene file (.toml)
    pub scene: PathBuf,

    /// Output file (defaults to the scene path with a .vxrf extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Channels to keep in the compressed frame (comma-separated, default: all)
    #[arg(long, value_delimiter = ',')]
    pub channels: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Load a scene and encode it into a frame
pub fn encode_scene(path: &Path) -> Result<SparseFrame> {
    let scene = Scene::load(path)?;
    encode_frame(&scene.inputs(), &scene.encode)
        .with_context(|| format!("Failed to encode scene: {}", path.display()))
}

/// Compress through a registry-owned reference engine
pub fn compress(frame: &SparseFrame, channels: &[String]) -> Result<CompressedFrame> {
    let mut registry = EngineRegistry::new();
    let handle = registry.create_compressor(Box::new(ReferenceEngine::new()));
    let compressed = registry
        .compress(handle, frame, channels)
        .context("Failed to compress frame");
    registry.release_compressor(handle)?;
    compressed
}

/// Execute the encode command
pub fn execute(args: EncodeArgs) -> Result<()> {
    let frame = encode_scene(&args.scene)?;
    let compressed = compress(&frame, &args.channels)?;

    let output = args
        .output
        .unwrap_or_else(|| args.scene.with_extension("vxrf"));
    std::fs::write(&output, &compressed.bytes)
        .with_context(|| format!("Failed to write frame: {}", output.display()))?;

    tracing::info!(
        path = %output.display(),
        bytes = compressed.bytes.len(),
        "wrote compressed frame"
    );

    let report = FrameReport::new(&frame);
    if args.json {
        print_json(&report)
    } else {
        report.print();
        println!("  Output:        {} ({} bytes)", output.display(), compressed.bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
[[channels]]
name = "density"
translation = [-8.0, 0.0, 0.0]

[[channels.boxes]]
min = [0, 0, 0]
max = [15, 7, 7]
value = 0.5

[[channels]]
name = "temperature"

[[channels.boxes]]
min = [0, 0, 0]
max = [7, 7, 7]
value = 300.0
"#;

    #[test]
    fn test_encode_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("smoke.toml");
        std::fs::write(&scene, SCENE).unwrap();

        execute(EncodeArgs {
            scene: scene.clone(),
            output: None,
            channels: Vec::new(),
            json: true,
        })
        .unwrap();

        let bytes = std::fs::read(dir.path().join("smoke.vxrf")).unwrap();
        assert!(bytes.starts_with(b"VXRF"));
    }

    #[test]
    fn test_encode_scene() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("scene.toml");
        std::fs::write(&scene, SCENE).unwrap();

        let frame = encode_scene(&scene).unwrap();
        assert_eq!(frame.channels.len(), 2);
        assert_eq!(frame.spatial_blocks.len(), 2);
        assert_eq!(frame.blocks.len(), 3);
    }

    #[test]
    fn test_encode_missing_scene() {
        let result = execute(EncodeArgs {
            scene: PathBuf::from("/nonexistent/scene.toml"),
            output: None,
            channels: Vec::new(),
            json: false,
        });
        assert!(result.is_err());
    }
}
