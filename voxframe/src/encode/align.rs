//! Origin selection and relative transforms
//!
//! The frame is expressed in the index space of one channel, the origin:
//! the valid channel with the smallest voxels. Every other channel gets the
//! transform taking its own index space into the origin's.

use super::registry::ChannelRegistry;
use crate::math::Transform;

/// Common index space of a frame
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Slot of the origin channel
    pub origin_slot: usize,
    /// Index → world transform of the origin channel
    pub origin_transform: Transform,
    /// Per slot: channel index space → origin index space (`None` for invalid slots)
    pub relative: Vec<Option<Transform>>,
}

impl Alignment {
    /// Compute the alignment, `None` if no slot holds a valid channel
    pub fn compute(registry: &ChannelRegistry<'_>) -> Option<Self> {
        let mut origin: Option<(usize, f64)> = None;
        for slot in registry.valid_slots() {
            let Some(channel) = slot.channel else { continue };
            let scale = channel.voxel_scale();
            // Strictly smaller, so the earliest slot wins ties
            if origin.is_none_or(|(_, best)| scale < best) {
                origin = Some((slot.index, scale));
            }
        }
        let (origin_slot, scale) = origin?;
        let origin_transform = *registry.slots()[origin_slot].channel?.transform();
        let to_origin = origin_transform.inverse();

        let relative = registry
            .slots()
            .iter()
            .map(|slot| slot.channel.map(|c| to_origin.after(c.transform())))
            .collect();

        tracing::debug!(
            origin = registry.slots()[origin_slot].name,
            voxel_size = scale,
            "selected frame origin"
        );

        Some(Self {
            origin_slot,
            origin_transform,
            relative,
        })
    }

    /// True if the slot's channel already lives in the origin index space
    pub fn is_aligned(&self, slot: usize, tolerance: f64) -> bool {
        self.relative
            .get(slot)
            .copied()
            .flatten()
            .is_some_and(|t| t.is_identity(tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::encode::ChannelInput;
    use crate::grid::{Coord, Grid};
    use glam::DVec3;

    fn input(name: &str, transform: Transform) -> ChannelInput {
        let mut grid = Grid::with_transform(name, transform, 0.0f32);
        grid.set_value(Coord::ZERO, 1.0);
        ChannelInput::new(name, Some(Channel::from(grid)))
    }

    #[test]
    fn test_smallest_voxels_become_origin() {
        let inputs = vec![
            input("density", Transform::from_voxel_size(0.5)),
            input("temperature", Transform::from_voxel_size(0.25)),
            input("flames", Transform::from_voxel_size(0.25)),
        ];
        let registry = ChannelRegistry::new(&inputs);
        let alignment = Alignment::compute(&registry).unwrap();
        assert_eq!(alignment.origin_slot, 1);
        assert!(alignment.is_aligned(1, 1e-9));
        assert!(alignment.is_aligned(2, 1e-9));
        assert!(!alignment.is_aligned(0, 1e-9));

        // density index 1 lands on origin index 2
        let rel = alignment.relative[0].unwrap();
        assert!(
            rel.index_to_world(DVec3::X)
                .abs_diff_eq(DVec3::new(2.0, 0.0, 0.0), 1e-9)
        );
    }

    #[test]
    fn test_translation_is_relative() {
        let inputs = vec![
            input("a", Transform::from_scale_translation(1.0, DVec3::new(4.0, 0.0, 0.0))),
            input("b", Transform::from_scale_translation(1.0, DVec3::new(12.0, 0.0, 0.0))),
        ];
        let registry = ChannelRegistry::new(&inputs);
        let alignment = Alignment::compute(&registry).unwrap();
        assert_eq!(alignment.origin_slot, 0);
        let rel = alignment.relative[1].unwrap();
        assert!(
            rel.index_to_world(DVec3::ZERO)
                .abs_diff_eq(DVec3::new(8.0, 0.0, 0.0), 1e-9)
        );
    }

    #[test]
    fn test_no_valid_channel() {
        let inputs = vec![ChannelInput::new("density", None)];
        let registry = ChannelRegistry::new(&inputs);
        assert!(Alignment::compute(&registry).is_none());
    }
}
