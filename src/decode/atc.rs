//! ATC (Adreno texture compression).

use crate::block::{split_16, AtcBlock, ExplicitAlphaBlock, ScalarBlock};

use super::bc::{decode_explicit_alpha, decode_scalar};

/// Returns the 4 palette entries of an ATC color block as RGBA8.
pub(crate) fn atc_palette(block: &AtcBlock) -> [[u8; 4]; 4] {
    let [r0, g0, b0] = block.color0.to_rgb8();
    let [r1, g1, b1] = block.color1.to_rgb8_replicate();

    if block.alternate_mode {
        let sub = |a: u8, b: u8| a.saturating_sub(b / 4);
        [
            [0, 0, 0, 255],
            [sub(r0, r1), sub(g0, g1), sub(b0, b1), 255],
            [r0, g0, b0, 255],
            [r1, g1, b1, 255],
        ]
    } else {
        let third = |a: u8, b: u8| ((2 * a as u16 + b as u16 + 1) / 3) as u8;
        [
            [r0, g0, b0, 255],
            [third(r0, r1), third(g0, g1), third(b0, b1), 255],
            [third(r1, r0), third(g1, g0), third(b1, b0), 255],
            [r1, g1, b1, 255],
        ]
    }
}

pub(crate) fn decode_atc_color(block: &AtcBlock) -> [[u8; 4]; 16] {
    let palette = atc_palette(block);
    block.indexes.map(|i| palette[i as usize & 3])
}

pub(crate) fn decode_atc(bytes: [u8; 8]) -> [[u8; 4]; 16] {
    decode_atc_color(&AtcBlock::from_bytes(bytes))
}

pub(crate) fn decode_atc_explicit_alpha(bytes: [u8; 16]) -> [[u8; 4]; 16] {
    let (alpha_bytes, color_bytes) = split_16(bytes);
    let mut pixels = decode_atc(color_bytes);
    let alpha = decode_explicit_alpha(&ExplicitAlphaBlock::from_bytes(alpha_bytes));
    for (pixel, a) in pixels.iter_mut().zip(alpha) {
        pixel[3] = a;
    }
    pixels
}

pub(crate) fn decode_atc_interpolated_alpha(bytes: [u8; 16]) -> [[u8; 4]; 16] {
    let (alpha_bytes, color_bytes) = split_16(bytes);
    let mut pixels = decode_atc(color_bytes);
    let alpha = decode_scalar(&ScalarBlock::from_bytes(alpha_bytes));
    for (pixel, a) in pixels.iter_mut().zip(alpha) {
        pixel[3] = a;
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Rgb555, Rgb565};

    #[test]
    fn standard_mode() {
        let block = AtcBlock {
            color0: Rgb555::new(31, 31, 31),
            color1: Rgb565::new(0, 0, 0),
            alternate_mode: false,
            indexes: [0; 16],
        };
        let palette = atc_palette(&block);
        assert_eq!(palette[0], [255, 255, 255, 255]);
        assert_eq!(palette[1], [170, 170, 170, 255]);
        assert_eq!(palette[2], [85, 85, 85, 255]);
        assert_eq!(palette[3], [0, 0, 0, 255]);
    }

    #[test]
    fn alternate_mode() {
        let block = AtcBlock {
            color0: Rgb555::new(31, 16, 0),
            color1: Rgb565::new(31, 0, 0),
            alternate_mode: true,
            indexes: [0; 16],
        };
        let palette = atc_palette(&block);
        assert_eq!(palette[0], [0, 0, 0, 255]);
        assert_eq!(palette[1], [255 - 63, 132, 0, 255]);
        assert_eq!(palette[2], [255, 132, 0, 255]);
        assert_eq!(palette[3], [255, 0, 0, 255]);
    }

    #[test]
    fn explicit_alpha() {
        let alpha = ExplicitAlphaBlock { alphas: [15; 16] };
        let color = AtcBlock::default();
        let bytes = crate::block::join_16(alpha.to_bytes(), color.to_bytes());
        let pixels = decode_atc_explicit_alpha(bytes);
        assert_eq!(pixels[9], [0, 0, 0, 255]);
    }
}
