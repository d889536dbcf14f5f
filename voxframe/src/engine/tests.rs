use super::*;
use crate::channel::Channel;
use crate::config::EncodeConfig;
use crate::encode::{ChannelInput, encode_frame};
use crate::frame::ChannelInfo;
use crate::grid::Coord;
use crate::wire::unpack_coords;

fn sample_frame() -> SparseFrame {
    let mut density = Grid::new("density", 0.0f32);
    density.fill_box(Coord::ZERO, Coord::splat(7), 0.5);
    let mut temperature = Grid::new("temperature", 0.0f32);
    temperature.fill_box(Coord::new(8, 0, 0), Coord::new(15, 7, 7), 300.0);
    temperature.fill_box(Coord::ZERO, Coord::splat(7), -2.0);
    let inputs = vec![
        ChannelInput::new("density", Some(Channel::from(density))),
        ChannelInput::new("flames", None),
        ChannelInput::new("temperature", Some(Channel::from(temperature))),
    ];
    encode_frame(&inputs, &EncodeConfig::default()).unwrap()
}

fn roundtrip(frame: &SparseFrame, channels: &[String]) -> DecompressedFrame {
    let mut engine = ReferenceEngine::new();
    let compressed = engine.compress_frame(frame, channels).unwrap();
    engine.decompress_frame(&compressed).unwrap()
}

#[test]
fn test_reference_roundtrip_all_channels() {
    let frame = sample_frame();
    let out = roundtrip(&frame, &[]);

    assert_eq!(out.info.channels.len(), 3);
    assert_eq!(out.info.spatial_block_count, frame.spatial_blocks.len());
    assert_eq!(out.info.channel_block_count, frame.blocks.len());
    assert_eq!(out.spatial.len(), frame.spatial_blocks.len() * 3);

    let decoded = out.unpack().unwrap();
    for (a, b) in decoded.spatial_blocks.iter().zip(&frame.spatial_blocks) {
        assert_eq!(a, b);
    }
    assert_eq!(decoded.blocks, frame.blocks);
    assert_eq!(out.info.channels[2].transform, frame.channels[2].transform);
}

#[test]
fn test_reference_channel_subset() {
    let frame = sample_frame();
    let out = roundtrip(&frame, &["temperature".to_string()]);

    assert_eq!(out.info.channels.len(), 1);
    assert_eq!(out.info.channels[0].name, "temperature");
    assert_eq!(out.info.spatial_block_count, 2);
    assert_eq!(out.info.channel_block_count, 2);

    let decoded = out.unpack().unwrap();
    for block in &decoded.spatial_blocks {
        assert_eq!(block.channel_mask, 0b1);
    }
    assert_eq!(decoded.blocks[0].voxels[0], -2.0);
    assert_eq!(decoded.blocks[1].voxels[0], 300.0);
}

#[test]
fn test_reference_subset_drops_empty_blocks() {
    let frame = sample_frame();
    let out = roundtrip(&frame, &["density".to_string(), "missing".to_string()]);
    assert_eq!(out.info.spatial_block_count, 1);
    assert_eq!(unpack_coords(out.spatial[0]), [0, 0, 0]);
    assert_eq!(out.spatial[1..3], [0, 0b1]);
}

#[test]
fn test_reference_rejects_bad_container() {
    let mut engine = ReferenceEngine::new();
    let bad = CompressedFrame {
        bytes: b"NOPE1234".to_vec(),
    };
    assert!(matches!(
        engine.decompress_frame(&bad),
        Err(FrameError::Serialization(_))
    ));

    let mut truncated = engine.compress_frame(&sample_frame(), &[]).unwrap();
    truncated.bytes.truncate(10);
    assert!(engine.decompress_frame(&truncated).is_err());
}

#[test]
fn test_reference_rejects_unpackable_coords() {
    let mut frame = sample_frame();
    frame.spatial_blocks[0].coords = [1024, 0, 0];
    let mut engine = ReferenceEngine::new();
    assert_eq!(
        engine.compress_frame(&frame, &[]),
        Err(FrameError::CoordinateOutOfRange { x: 1024, y: 0, z: 0 })
    );
}

#[test]
fn test_reference_rejects_too_many_channels() {
    let mut frame = sample_frame();
    frame.channels = (0..33).map(|i| ChannelInfo::new(format!("ch{i}"))).collect();
    let mut engine = ReferenceEngine::new();
    assert_eq!(
        engine.compress_frame(&frame, &[]),
        Err(FrameError::TooManyChannels { count: 33, limit: 32 })
    );

    // A subset that fits the mask is fine
    let subset: Vec<String> = (30..33).map(|i| format!("ch{i}")).collect();
    let compressed = engine.compress_frame(&frame, &subset).unwrap();
    let out = engine.decompress_frame(&compressed).unwrap();
    assert_eq!(out.info.channels.len(), 3);
    assert_eq!(out.info.spatial_block_count, 0);
}

#[test]
fn test_registry_handles() {
    let mut registry = EngineRegistry::new();
    assert!(registry.is_empty());
    let c = registry.create_compressor(Box::new(ReferenceEngine::new()));
    let d = registry.create_decompressor(Box::new(ReferenceEngine::new()));
    assert_ne!(c, 0);
    assert_ne!(c, d);
    assert_eq!(registry.len(), 2);

    let frame = sample_frame();
    let compressed = registry.compress(c, &frame, &[]).unwrap();
    let out = registry.decompress(d, &compressed).unwrap();
    assert_eq!(out.info.channel_block_count, frame.blocks.len());

    assert_eq!(registry.compress(d, &frame, &[]), Err(FrameError::InvalidHandle(d)));
    registry.release_compressor(c).unwrap();
    assert_eq!(registry.release_compressor(c), Err(FrameError::InvalidHandle(c)));
    assert_eq!(registry.decompress(c, &compressed), Err(FrameError::InvalidHandle(c)));
    registry.release_decompressor(d).unwrap();
    assert!(registry.is_empty());
}

#[test]
fn test_decompressed_frame_decode() {
    let frame = sample_frame();
    let grids = roundtrip(&frame, &[]).decode(&DecodeConfig::default()).unwrap();
    assert_eq!(grids.len(), 3);
    assert_eq!(grids[0].get_value(Coord::new(1, 2, 3)), 0.5);
    assert!(grids[1].is_empty());
    assert_eq!(grids[2].get_value(Coord::new(9, 0, 0)), 300.0);
}
