//! Voxelization and resampling into the origin index space

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::channel::Channel;
use crate::grid::{Coord, Grid, LeafNode};
use crate::math::Transform;
use crate::{BLOCK_SIZE, BLOCK_VOXEL_COUNT};

/// Working copy of one channel, ready for block extraction
///
/// The copy is single-float, has no tiles, and lives in the origin index space.
pub fn prepare_channel(
    channel: &Channel,
    relative: &Transform,
    origin_transform: &Transform,
    tolerance: f64,
    parallel: bool,
) -> Grid<f32> {
    let mut grid = channel.to_scalar_grid();
    grid.voxelize_active_tiles();

    if relative.is_identity(tolerance) {
        return grid;
    }

    tracing::debug!(
        channel = grid.name(),
        leaves = grid.leaf_count(),
        "resampling into origin index space"
    );
    resample(&grid, relative, *origin_transform, parallel)
}

/// Resample `source` through `relative` (source index → target index)
///
/// Values are trilinear; a target voxel is active when the source voxel
/// nearest to its preimage is active. A box sampler that activates on any of
/// the 8 corners would grow each edge by a voxel and can add blocks.
/// The result has `target_transform`.
pub fn resample(
    source: &Grid<f32>,
    relative: &Transform,
    target_transform: Transform,
    parallel: bool,
) -> Grid<f32> {
    let to_source = relative.inverse();
    let origins: Vec<Coord> = target_leaf_origins(source, relative).into_iter().collect();

    let build = |origin: &Coord| -> Option<LeafNode<f32>> {
        let mut leaf = LeafNode::new(*origin, source.background());
        for offset in 0..BLOCK_VOXEL_COUNT {
            let target = *origin + LeafNode::<f32>::local_coord(offset);
            let position = to_source.index_to_world(target.as_dvec3());
            if let Some(value) = source.sample(position) {
                leaf.set(offset, value);
            }
        }
        leaf.has_active().then_some(leaf)
    };

    let leaves: Vec<LeafNode<f32>> = if parallel {
        origins.par_iter().filter_map(build).collect()
    } else {
        origins.iter().filter_map(build).collect()
    };

    let mut out = Grid::with_transform(source.name(), target_transform, source.background());
    for leaf in leaves {
        out.insert_leaf(leaf);
    }
    out
}

/// Target leaves that can receive an active voxel
///
/// Each source leaf, grown by one voxel, is mapped through `relative` and
/// every target leaf its bounds touch is kept.
fn target_leaf_origins(source: &Grid<f32>, relative: &Transform) -> BTreeSet<Coord> {
    let mut origins = BTreeSet::new();
    for leaf in source.leaves() {
        if !leaf.has_active() {
            continue;
        }
        let node = leaf.node_bbox();
        let lo = node.min.as_dvec3() - 1.0;
        let hi = node.max.as_dvec3() + 1.0;

        let mut min = glam::DVec3::splat(f64::MAX);
        let mut max = glam::DVec3::splat(f64::MIN);
        for i in 0..8 {
            let corner = glam::DVec3::new(
                if i & 4 != 0 { hi.x } else { lo.x },
                if i & 2 != 0 { hi.y } else { lo.y },
                if i & 1 != 0 { hi.z } else { lo.z },
            );
            let p = relative.index_to_world(corner);
            min = min.min(p);
            max = max.max(p);
        }

        let lo = Coord::new(min.x.floor() as i32, min.y.floor() as i32, min.z.floor() as i32)
            .align_down(BLOCK_SIZE);
        let hi = Coord::new(max.x.ceil() as i32, max.y.ceil() as i32, max.z.ceil() as i32)
            .align_down(BLOCK_SIZE);
        let step = BLOCK_SIZE as usize;
        for x in (lo.x..=hi.x).step_by(step) {
            for y in (lo.y..=hi.y).step_by(step) {
                for z in (lo.z..=hi.z).step_by(step) {
                    origins.insert(Coord::new(x, y, z));
                }
            }
        }
    }
    origins
}
