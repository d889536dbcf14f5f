//! Error types for frame encoding, decoding and engine calls
//!
//! Per-channel validation failures, empty frames, channel-limit truncation and
//! degenerate transforms are not errors: they are handled where they occur and
//! show up in the produced frame. Everything here aborts the operation.

/// Frame codec error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// An output array could not be allocated
    #[error("failed to allocate {count} elements for {what}")]
    AllocationFailed {
        /// Which array was being allocated
        what: &'static str,
        /// Requested element count
        count: usize,
    },

    /// A block coordinate does not fit the 10-bit packed wire format
    #[error("block coordinate ({x}, {y}, {z}) exceeds packed range 0..={max}", max = crate::COORD_MAX)]
    CoordinateOutOfRange {
        /// X block coordinate
        x: i32,
        /// Y block coordinate
        y: i32,
        /// Z block coordinate
        z: i32,
    },

    /// A decompressed buffer has the wrong number of elements
    #[error("{buffer} buffer has {actual} elements, expected {expected}")]
    BufferSizeMismatch {
        /// Which buffer
        buffer: &'static str,
        /// Expected element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },

    /// A spatial block references a channel block past the end of the buffer
    #[error("spatial block {spatial_block} references channel block {index} (count {count})")]
    ChannelBlockOutOfRange {
        /// Index of the offending spatial block
        spatial_block: usize,
        /// Referenced channel block index
        index: usize,
        /// Number of channel blocks available
        count: usize,
    },

    /// More channels than a `u32` channel mask can address
    #[error("{count} channels exceed the channel mask limit of {limit}")]
    TooManyChannels {
        /// Channels requested
        count: usize,
        /// Mask bits available
        limit: usize,
    },

    /// A compressor or decompressor handle is unknown or already released
    #[error("invalid engine handle {0}")]
    InvalidHandle(u32),

    /// Engine container could not be (de)serialized
    #[error("frame serialization failed: {0}")]
    Serialization(String),
}

impl From<bitcode::Error> for FrameError {
    fn from(e: bitcode::Error) -> Self {
        FrameError::Serialization(e.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FrameError>;

/// Allocate a vector of exactly `count` copies of `value`
///
/// Reports allocation failure as [`FrameError::AllocationFailed`] instead of
/// aborting the process.
pub(crate) fn try_alloc<T: Clone>(what: &'static str, count: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(count)
        .map_err(|_| FrameError::AllocationFailed { what, count })?;
    v.resize(count, value);
    Ok(v)
}
