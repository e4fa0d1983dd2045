//! The fixed-layout 64-bit blocks.
//!
//! BC1 through BC5 and the ATC formats are all built from the blocks in this
//! module. 128-bit formats are two 64-bit blocks back to back, with the alpha
//! (or red) block first.

use crate::color::{Rgb555, Rgb565};

/// A BC1 color block: two RGB565 endpoints and 16 2-bit indexes.
///
/// If `color0 > color1` (as u16), the block has 4 colors. Otherwise it has 3
/// colors and index 3 is reserved for black/transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ColorBlock {
    pub color0: Rgb565,
    pub color1: Rgb565,
    pub indexes: [u8; 16],
}
impl ColorBlock {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let [c0_lo, c0_hi, c1_lo, c1_hi, i0, i1, i2, i3] = bytes;
        Self {
            color0: Rgb565::from_u16(u16::from_le_bytes([c0_lo, c0_hi])),
            color1: Rgb565::from_u16(u16::from_le_bytes([c1_lo, c1_hi])),
            indexes: unpack_2_bit(u32::from_le_bytes([i0, i1, i2, i3])),
        }
    }
    pub fn to_bytes(&self) -> [u8; 8] {
        let c0 = self.color0.to_u16().to_le_bytes();
        let c1 = self.color1.to_u16().to_le_bytes();
        let [i0, i1, i2, i3] = pack_2_bit(&self.indexes).to_le_bytes();
        [c0[0], c0[1], c1[0], c1[1], i0, i1, i2, i3]
    }

    /// Whether the block uses the 3-color palette.
    pub fn is_3_color(&self) -> bool {
        self.color0.to_u16() <= self.color1.to_u16()
    }
}

/// A block of one interpolated 8-bit channel: two endpoints and 16 3-bit
/// indexes.
///
/// Used by BC4, both halves of BC5, the alpha of BC3, and the alpha of
/// interpolated-alpha ATC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ScalarBlock {
    pub value0: u8,
    pub value1: u8,
    pub indexes: [u8; 16],
}
impl ScalarBlock {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let indexes = u64::from_le_bytes(bytes) >> 16;
        Self {
            value0: bytes[0],
            value1: bytes[1],
            indexes: std::array::from_fn(|i| ((indexes >> (i * 3)) & 0b111) as u8),
        }
    }
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut packed = self.value0 as u64 | (self.value1 as u64) << 8;
        for (i, &index) in self.indexes.iter().enumerate() {
            debug_assert!(index < 8);
            packed |= (index as u64) << (16 + i * 3);
        }
        packed.to_le_bytes()
    }

    /// Whether the block uses 6 interpolated values (as opposed to 4
    /// interpolated values plus 0 and 255).
    pub fn is_8_value(&self) -> bool {
        self.value0 > self.value1
    }
}

/// 16 explicit 4-bit alpha values, low nibble first.
///
/// Used by BC2 and explicit-alpha ATC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ExplicitAlphaBlock {
    pub alphas: [u8; 16],
}
impl ExplicitAlphaBlock {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let packed = u64::from_le_bytes(bytes);
        Self {
            alphas: std::array::from_fn(|i| ((packed >> (i * 4)) & 0xF) as u8),
        }
    }
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut packed = 0_u64;
        for (i, &alpha) in self.alphas.iter().enumerate() {
            debug_assert!(alpha < 16);
            packed |= (alpha as u64) << (i * 4);
        }
        packed.to_le_bytes()
    }
}

/// An ATC color block.
///
/// `color0` is RGB555 with the palette mode in bit 15, `color1` is RGB565.
/// The indexes use the same 2-bit layout as BC1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct AtcBlock {
    pub color0: Rgb555,
    pub color1: Rgb565,
    /// `false`: `c0, 2/3 c0 + 1/3 c1, 1/3 c0 + 2/3 c1, c1`
    ///
    /// `true`: `black, c0 - c1 / 4, c0, c1`
    pub alternate_mode: bool,
    pub indexes: [u8; 16],
}
impl AtcBlock {
    const MODE_BIT: u16 = 0x8000;

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let [c0_lo, c0_hi, c1_lo, c1_hi, i0, i1, i2, i3] = bytes;
        let c0 = u16::from_le_bytes([c0_lo, c0_hi]);
        Self {
            color0: Rgb555::from_u16(c0),
            color1: Rgb565::from_u16(u16::from_le_bytes([c1_lo, c1_hi])),
            alternate_mode: c0 & Self::MODE_BIT != 0,
            indexes: unpack_2_bit(u32::from_le_bytes([i0, i1, i2, i3])),
        }
    }
    pub fn to_bytes(&self) -> [u8; 8] {
        let mode = if self.alternate_mode { Self::MODE_BIT } else { 0 };
        let c0 = (self.color0.to_u16() | mode).to_le_bytes();
        let c1 = self.color1.to_u16().to_le_bytes();
        let [i0, i1, i2, i3] = pack_2_bit(&self.indexes).to_le_bytes();
        [c0[0], c0[1], c1[0], c1[1], i0, i1, i2, i3]
    }
}

fn unpack_2_bit(packed: u32) -> [u8; 16] {
    std::array::from_fn(|i| ((packed >> (i * 2)) & 0b11) as u8)
}
fn pack_2_bit(indexes: &[u8; 16]) -> u32 {
    let mut packed = 0;
    for (i, &index) in indexes.iter().enumerate() {
        debug_assert!(index < 4);
        packed |= (index as u32) << (i * 2);
    }
    packed
}

/// Splits a 128-bit block into its two 64-bit halves.
pub(crate) fn split_16(x: [u8; 16]) -> ([u8; 8], [u8; 8]) {
    let lower = [x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]];
    let upper = [x[8], x[9], x[10], x[11], x[12], x[13], x[14], x[15]];
    (lower, upper)
}
pub(crate) fn join_16(lower: [u8; 8], upper: [u8; 8]) -> [u8; 16] {
    let mut out = [0; 16];
    out[..8].copy_from_slice(&lower);
    out[8..].copy_from_slice(&upper);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexes(modulo: u8) -> [u8; 16] {
        std::array::from_fn(|i| (i as u8 * 5 + 3) % modulo)
    }

    #[test]
    fn color_block() {
        let block = ColorBlock {
            color0: Rgb565::new(31, 0, 17),
            color1: Rgb565::new(1, 63, 0),
            indexes: indexes(4),
        };
        let bytes = block.to_bytes();
        assert_eq!(&bytes[..4], &[0x11, 0xF8, 0xE0, 0x0F]);
        assert_eq!(ColorBlock::from_bytes(bytes), block);
        assert!(!block.is_3_color());
    }

    #[test]
    fn scalar_block() {
        let block = ScalarBlock {
            value0: 10,
            value1: 200,
            indexes: indexes(8),
        };
        let bytes = block.to_bytes();
        assert_eq!(bytes[0], 10);
        assert_eq!(bytes[1], 200);
        assert_eq!(bytes[2] & 0b111, 3);
        assert_eq!(ScalarBlock::from_bytes(bytes), block);
        assert!(!block.is_8_value());
    }

    #[test]
    fn explicit_alpha_block() {
        let block = ExplicitAlphaBlock {
            alphas: indexes(16),
        };
        let bytes = block.to_bytes();
        // pixel 0 in the low nibble
        assert_eq!(bytes[0], 3 | (8 << 4));
        assert_eq!(ExplicitAlphaBlock::from_bytes(bytes), block);
    }

    #[test]
    fn atc_block() {
        for alternate_mode in [false, true] {
            let block = AtcBlock {
                color0: Rgb555::new(31, 2, 9),
                color1: Rgb565::new(4, 60, 30),
                alternate_mode,
                indexes: indexes(4),
            };
            let bytes = block.to_bytes();
            assert_eq!(bytes[1] & 0x80 != 0, alternate_mode);
            assert_eq!(AtcBlock::from_bytes(bytes), block);
        }
    }

    #[test]
    fn split_join() {
        let block: [u8; 16] = std::array::from_fn(|i| i as u8);
        let (lower, upper) = split_16(block);
        assert_eq!(lower[7], 7);
        assert_eq!(upper[0], 8);
        assert_eq!(join_16(lower, upper), block);
    }
}
