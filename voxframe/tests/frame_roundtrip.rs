//! End-to-end tests: channels → frame → reference engine → grids.

use glam::DVec3;
use voxframe::channel::Channel;
use voxframe::grid::{Coord, Grid};
use voxframe::math::Transform;
use voxframe::{
    ChannelInput, DecodeConfig, EncodeConfig, FrameCompressor, FrameDecompressor, ReferenceEngine,
    SparseFrame, encode_frame, f16_to_f32, f32_to_f16, pack_coords, unpack_coords,
};

fn quantized(v: f32) -> f32 {
    f16_to_f32(f32_to_f16(v))
}

fn gradient(c: Coord) -> f32 {
    let [x, y, z] = c.to_array();
    (x + 2 * y - z) as f32 * 0.25
}

fn through_engine(frame: &SparseFrame, config: &DecodeConfig) -> Vec<Grid<f32>> {
    let mut engine = ReferenceEngine::new();
    let compressed = engine.compress_frame(frame, &[]).unwrap();
    engine
        .decompress_frame(&compressed)
        .unwrap()
        .decode(config)
        .unwrap()
}

#[test]
fn scenario_single_block() {
    let mut density = Grid::new("density", 0.0f32);
    density.fill_box(Coord::ZERO, Coord::splat(7), 1.0);
    let inputs = vec![ChannelInput::new("density", Some(Channel::from(density)))];
    let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();

    assert_eq!((frame.aabb.min(), frame.aabb.max()), ([0, 0, 0], [1, 1, 1]));
    assert_eq!(frame.spatial_blocks.len(), 1);
    assert_eq!(frame.blocks.len(), 1);
    let stats = frame.channels[0].statistics;
    assert_eq!((stats.min, stats.max), (1.0, 1.0));
    assert_eq!((stats.mean_positive, stats.mean_negative), (1.0, 0.0));
    assert_eq!(stats.voxel_count, 512);
}

#[test]
fn scenario_two_channels() {
    let mut density = Grid::new("density", 0.0f32);
    density.fill_box(Coord::ZERO, Coord::splat(7), 2.0);
    let mut velocity = Grid::new("velocity", 0.0f32);
    velocity.fill_box(Coord::new(8, 0, 0), Coord::new(15, 7, 7), 2.0);
    let inputs = vec![
        ChannelInput::new("density", Some(Channel::from(density))),
        ChannelInput::new("velocity", Some(Channel::from(velocity))),
    ];
    let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();

    assert_eq!(frame.aabb.max(), [2, 1, 1]);
    assert_eq!(frame.spatial_blocks.len(), 2);
    assert_eq!(frame.blocks.len(), 2);
    let masks: Vec<u32> = frame.spatial_blocks.iter().map(|b| b.channel_mask).collect();
    assert_eq!(masks, [0b01, 0b10]);
    assert!(frame.spatial_blocks.iter().all(|b| b.channel_count == 1));
}

#[test]
fn scenario_no_valid_channels() {
    let inputs = vec![
        ChannelInput::new("density", None),
        ChannelInput::new("flames", Some(Channel::from(Grid::new("flames", 0.0f32)))),
    ];
    let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();
    assert!(frame.is_empty());
    assert!(frame.spatial_blocks.is_empty());
    assert!(frame.blocks.is_empty());
    assert_eq!(frame.channel_names().collect::<Vec<_>>(), ["density", "flames"]);

    assert!(through_engine(&frame, &DecodeConfig::default()).is_empty());
    drop(frame);
}

#[test]
fn scenario_pack_coords() {
    assert_eq!(unpack_coords(pack_coords(5, 500, 1023)), [5, 500, 1023]);
}

#[test]
fn roundtrip_restores_absolute_coordinates() {
    let min = Coord::new(-16, 8, -8);
    let max = Coord::new(-9, 23, -1);
    let mut density = Grid::new("density", 0.0f32);
    for c in voxframe::grid::CoordBBox::new(min, max).iter() {
        density.set_value(c, gradient(c));
    }
    let inputs = vec![ChannelInput::new("density", Some(Channel::from(density)))];
    let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();
    assert_eq!(frame.origin_offset, [-16, 8, -8]);
    assert_eq!(frame.aabb.max(), [1, 2, 1]);

    let config = DecodeConfig {
        offset: Some(frame.origin_offset),
        ..DecodeConfig::default()
    };
    let grids = through_engine(&frame, &config);
    assert_eq!(grids.len(), 1);
    let decoded = &grids[0];
    assert_eq!(decoded.leaf_count(), 2);
    assert_eq!(decoded.active_voxel_count(), 1024);
    for c in voxframe::grid::CoordBBox::new(min, max).iter() {
        assert_eq!(decoded.get_value(c), quantized(gradient(c)), "voxel {c:?}");
    }
    // Index space is back to the source's, so the transform is identity again
    assert!(decoded.transform().is_identity(1e-9));
}

#[test]
fn roundtrip_without_offset_keeps_world_placement() {
    let mut density = Grid::new("density", 0.0f32);
    density.fill_box(Coord::new(24, -8, 0), Coord::new(31, -1, 7), 0.75);
    let inputs = vec![ChannelInput::new("density", Some(Channel::from(density)))];
    let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();

    let grids = through_engine(&frame, &DecodeConfig::default());
    let decoded = &grids[0];
    let leaf = decoded.leaves().next().unwrap();
    assert_eq!(leaf.origin(), Coord::ZERO);
    assert_eq!(
        decoded.transform().index_to_world(DVec3::ZERO),
        DVec3::new(24.0, -8.0, 0.0)
    );
}

#[test]
fn half_resolution_channel_doubles_extent() {
    let mut density = Grid::new("density", 0.0f32);
    density.fill_box(Coord::ZERO, Coord::splat(7), 1.0);
    let mut velocity = Grid::with_transform("velocity", Transform::from_voxel_size(2.0), 0.0f32);
    velocity.fill_box(Coord::ZERO, Coord::splat(7), 1.0);
    let inputs = vec![
        ChannelInput::new("density", Some(Channel::from(density))),
        ChannelInput::new("velocity", Some(Channel::from(velocity))),
    ];
    let frame = encode_frame(&inputs, &EncodeConfig::default()).unwrap();
    assert_eq!(frame.aabb.max(), [2, 2, 2]);

    let grids = through_engine(&frame, &DecodeConfig::default());
    assert_eq!(grids[0].leaf_count(), 1);
    assert_eq!(grids[1].leaf_count(), 8);
    assert_eq!(grids[1].get_value(Coord::splat(14)), 1.0);
    assert_eq!(
        grids[1].transform().voxel_size(),
        grids[0].transform().voxel_size()
    );
}
