//! Bit-level wire helpers shared by both directions
//!
//! - Block coordinates: three 10-bit axes packed into one `u32`
//! - Half floats: f16 bits → f32 with denormals flushed to zero
//!
//! Decompressed buffers coming back from the engine use exactly these layouts.

use half::f16;

use crate::error::{FrameError, Result};
use crate::{COORD_BITS, COORD_MAX};

// ============================================================================
// Block Coordinate Packing
// ============================================================================

/// Pack a block coordinate into a `u32`
///
/// Bit layout: `[unused:2][z:10][y:10][x:10]`
///
/// Each axis is masked to 10 bits, so coordinates outside `0..=1023` wrap.
/// Use [`try_pack_coords`] when the input is not known to be in range.
#[inline]
pub const fn pack_coords(x: u32, y: u32, z: u32) -> u32 {
    (x & COORD_MAX) | ((y & COORD_MAX) << COORD_BITS) | ((z & COORD_MAX) << (2 * COORD_BITS))
}

/// Pack a block coordinate, rejecting axes outside `0..=1023`
pub fn try_pack_coords(x: i32, y: i32, z: i32) -> Result<u32> {
    let in_range = |v: i32| (0..=COORD_MAX as i32).contains(&v);
    if in_range(x) && in_range(y) && in_range(z) {
        Ok(pack_coords(x as u32, y as u32, z as u32))
    } else {
        Err(FrameError::CoordinateOutOfRange { x, y, z })
    }
}

/// Unpack a `u32` into its three 10-bit axes
///
/// Bits 30-31 are ignored.
#[inline]
pub const fn unpack_coords(packed: u32) -> [u32; 3] {
    [
        packed & COORD_MAX,
        (packed >> COORD_BITS) & COORD_MAX,
        (packed >> (2 * COORD_BITS)) & COORD_MAX,
    ]
}

// ============================================================================
// Half-Float Conversion
// ============================================================================

/// Convert f16 bits to f32, flushing denormals to zero
///
/// Matches the engine's GPU-side decoder bit for bit:
/// 1. move exponent+mantissa (bits 0-14) up by 13
/// 2. add `0x3800_0000` to rebias the exponent (15 → 127)
/// 3. zero the magnitude when the half exponent field is zero
/// 4. re-insert the sign at bit 31
///
/// Infinities and NaNs are not special-cased.
#[inline]
pub const fn f16_to_f32(bits: u16) -> f32 {
    let bits = bits as u32;
    let magnitude = (bits & 0x7FFF) << 13;
    let sign = (bits & 0x8000) << 16;
    let exponent = bits & 0x7C00;

    let magnitude = if exponent == 0 {
        0
    } else {
        magnitude + 0x3800_0000
    };

    f32::from_bits(magnitude | sign)
}

/// Convert f32 to f16 bits (round to nearest even)
#[inline]
pub fn f32_to_f16(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

/// Decode a slice of f16 bits into an f32 slice of the same length
pub fn decode_f16_slice(src: &[u16], dst: &mut [f32]) -> Result<()> {
    if src.len() != dst.len() {
        return Err(FrameError::BufferSizeMismatch {
            buffer: "f16",
            expected: dst.len(),
            actual: src.len(),
        });
    }
    for (out, &bits) in dst.iter_mut().zip(src) {
        *out = f16_to_f32(bits);
    }
    Ok(())
}
