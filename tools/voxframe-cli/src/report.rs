//! Human and JSON summaries of frames and decoded grids

use anyhow::{Context, Result};
use glam::DVec3;
use serde::Serialize;
use voxframe::SparseFrame;
use voxframe::grid::{Coord, Grid};

/// Summary of an encoded frame
#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub aabb_max: [i32; 3],
    pub origin_offset: [i32; 3],
    pub spatial_blocks: usize,
    pub channel_blocks: usize,
    pub frame_bytes: usize,
    pub channels: Vec<ChannelReport>,
}

#[derive(Debug, Serialize)]
pub struct ChannelReport {
    pub name: String,
    pub blocks: usize,
    pub min: f32,
    pub max: f32,
    pub mean_positive: f32,
    pub mean_negative: f32,
    pub voxel_count: u32,
}

impl FrameReport {
    pub fn new(frame: &SparseFrame) -> Self {
        let channels = frame
            .channels
            .iter()
            .enumerate()
            .map(|(slot, info)| ChannelReport {
                name: info.name.clone(),
                blocks: frame
                    .channel_index_per_block
                    .iter()
                    .filter(|&&i| i as usize == slot)
                    .count(),
                min: info.statistics.min,
                max: info.statistics.max,
                mean_positive: info.statistics.mean_positive,
                mean_negative: info.statistics.mean_negative,
                voxel_count: info.statistics.voxel_count,
            })
            .collect();

        Self {
            aabb_max: frame.aabb.max(),
            origin_offset: frame.origin_offset,
            spatial_blocks: frame.spatial_blocks.len(),
            channel_blocks: frame.blocks.len(),
            frame_bytes: frame.spatial_bytes().len() + frame.block_bytes().len(),
            channels,
        }
    }

    pub fn print(&self) {
        println!("=== Frame ===");
        println!(
            "  Blocks:        {:?} (spatial {}, channel {})",
            self.aabb_max, self.spatial_blocks, self.channel_blocks
        );
        println!("  Origin offset: {:?}", self.origin_offset);
        println!("  Size:          {} bytes", self.frame_bytes);
        for c in &self.channels {
            if c.blocks == 0 {
                println!("  [{}] empty", c.name);
                continue;
            }
            println!(
                "  [{}] {} blocks, range {}..{}, mean +{:.4} / {:.4}",
                c.name, c.blocks, c.min, c.max, c.mean_positive, c.mean_negative
            );
        }
    }
}

/// Summary of one decoded grid
#[derive(Debug, Serialize)]
pub struct GridReport {
    pub name: String,
    pub leaves: usize,
    pub active_voxels: u64,
    pub index_min: Option<[i32; 3]>,
    pub index_max: Option<[i32; 3]>,
    pub world_min: Option<[f64; 3]>,
    pub world_max: Option<[f64; 3]>,
}

impl GridReport {
    pub fn new(grid: &Grid<f32>) -> Self {
        let bbox = grid.active_bbox();
        let world = |c: Coord| grid.transform().index_to_world(c.as_dvec3());
        let world_bounds: Option<(DVec3, DVec3)> = bbox.map(|b| {
            let (lo, hi) = (world(b.min), world(b.max + Coord::splat(1)));
            (lo.min(hi), lo.max(hi))
        });

        Self {
            name: grid.name().to_string(),
            leaves: grid.leaf_count(),
            active_voxels: grid.active_voxel_count(),
            index_min: bbox.map(|b| b.min.to_array()),
            index_max: bbox.map(|b| b.max.to_array()),
            world_min: world_bounds.map(|(lo, _)| lo.to_array()),
            world_max: world_bounds.map(|(_, hi)| hi.to_array()),
        }
    }

    pub fn print(&self) {
        match (self.index_min, self.index_max) {
            (Some(min), Some(max)) => println!(
                "  [{}] {} leaves, {} voxels, index {:?}..={:?}",
                self.name, self.leaves, self.active_voxels, min, max
            ),
            _ => println!("  [{}] empty", self.name),
        }
    }
}

/// Pretty-print any report as JSON on stdout
pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}
