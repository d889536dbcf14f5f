//! Channel slots and mask bits
//!
//! A frame has one slot per input entry, in input order. The slot index fixes
//! the channel's mask bit (`1 << slot`), so the bit assignment depends only on
//! the order of names. Invalid or missing channels keep their slot but never
//! set their bit.

use hashbrown::HashSet;

use super::ChannelInput;
use crate::MAX_CHANNELS;
use crate::channel::Channel;

/// One named slot of the frame
#[derive(Debug, Clone, Copy)]
pub struct ChannelSlot<'a> {
    pub index: usize,
    pub name: &'a str,
    /// `None` when the channel is missing or failed validation
    pub channel: Option<&'a Channel>,
}

impl ChannelSlot<'_> {
    /// Mask bit of this slot
    pub const fn bit(&self) -> u32 {
        1 << self.index
    }

    pub fn is_valid(&self) -> bool {
        self.channel.is_some()
    }
}

/// Ordered, validated channel slots for one frame
#[derive(Debug, Clone)]
pub struct ChannelRegistry<'a> {
    slots: Vec<ChannelSlot<'a>>,
}

impl<'a> ChannelRegistry<'a> {
    /// Validate and order the inputs
    ///
    /// Entries past [`MAX_CHANNELS`] are dropped. A name that repeats an
    /// earlier one keeps its slot but carries no data.
    pub fn new(inputs: &'a [ChannelInput]) -> Self {
        if inputs.len() > MAX_CHANNELS {
            let dropped: Vec<&str> = inputs[MAX_CHANNELS..]
                .iter()
                .map(|i| i.name.as_str())
                .collect();
            tracing::warn!(
                limit = MAX_CHANNELS,
                ?dropped,
                "too many channels, extra entries dropped"
            );
        }

        let mut seen = HashSet::new();
        let slots = inputs
            .iter()
            .take(MAX_CHANNELS)
            .enumerate()
            .map(|(index, input)| {
                let name = input.name.as_str();
                let first = seen.insert(name);
                let channel = match &input.channel {
                    None => {
                        tracing::debug!(channel = name, "channel missing");
                        None
                    }
                    Some(_) if !first => {
                        tracing::warn!(channel = name, "duplicate channel name, ignoring data");
                        None
                    }
                    Some(c) if !c.is_valid() => {
                        tracing::warn!(channel = name, "channel is empty or degenerate, skipping");
                        None
                    }
                    Some(c) => Some(c),
                };
                ChannelSlot {
                    index,
                    name,
                    channel,
                }
            })
            .collect();

        Self { slots }
    }

    pub fn slots(&self) -> &[ChannelSlot<'a>] {
        &self.slots
    }

    /// Slots holding a usable channel
    pub fn valid_slots(&self) -> impl Iterator<Item = &ChannelSlot<'a>> {
        self.slots.iter().filter(|s| s.is_valid())
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.slots.iter().map(|s| s.name).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Coord, Grid};

    fn active(name: &str) -> ChannelInput {
        let mut grid = Grid::new(name, 0.0f32);
        grid.set_value(Coord::ZERO, 1.0);
        ChannelInput::new(name, Some(Channel::from(grid)))
    }

    #[test]
    fn test_slots_follow_input_order() {
        let inputs = vec![
            active("density"),
            ChannelInput::new("flames", None),
            active("temperature"),
        ];
        let registry = ChannelRegistry::new(&inputs);
        assert_eq!(registry.names(), ["density", "flames", "temperature"]);
        let bits: Vec<u32> = registry.valid_slots().map(ChannelSlot::bit).collect();
        assert_eq!(bits, [0b001, 0b100]);
    }

    #[test]
    fn test_empty_channel_keeps_slot() {
        let inputs = vec![
            ChannelInput::new("density", Some(Channel::from(Grid::new("density", 0.0f32)))),
            active("temperature"),
        ];
        let registry = ChannelRegistry::new(&inputs);
        assert_eq!(registry.len(), 2);
        assert!(!registry.slots()[0].is_valid());
        assert_eq!(registry.slots()[1].bit(), 0b10);
    }

    #[test]
    fn test_truncates_to_max_channels() {
        let inputs: Vec<ChannelInput> = (0..10).map(|i| active(&format!("ch{i}"))).collect();
        let registry = ChannelRegistry::new(&inputs);
        assert_eq!(registry.len(), MAX_CHANNELS);
        assert_eq!(registry.slots().last().unwrap().name, "ch7");
    }

    #[test]
    fn test_duplicate_name_carries_no_data() {
        let inputs = vec![active("density"), active("density")];
        let registry = ChannelRegistry::new(&inputs);
        assert!(registry.slots()[0].is_valid());
        assert!(!registry.slots()[1].is_valid());
    }
}
