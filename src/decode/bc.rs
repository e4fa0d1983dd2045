//! BC1 through BC5.
//!
//! https://learn.microsoft.com/en-us/windows/win32/direct3d10/d3d10-graphics-programming-guide-resources-block-compression

use crate::block::{split_16, ColorBlock, ExplicitAlphaBlock, ScalarBlock};
use crate::color::n4;
use crate::ColorComponent;

/// How the palette of a [`ColorBlock`] is derived from its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorMode {
    /// BC1 with 1-bit alpha. Index 3 of the 3-color palette is transparent
    /// black.
    PunchThrough,
    /// BC1 without alpha. Index 3 of the 3-color palette is opaque black.
    Opaque,
    /// The color block of BC2 and BC3. The palette always has 4 colors.
    FourColor,
}

/// Returns the 4 palette entries of a color block as RGBA8.
pub(crate) fn color_palette(block: &ColorBlock, mode: ColorMode) -> [[u8; 4]; 4] {
    fn rgba([r, g, b]: [u8; 3]) -> [u8; 4] {
        [r, g, b, 255]
    }

    let c0 = block.color0;
    let c1 = block.color1;

    let (c2, c3) = if mode == ColorMode::FourColor || !block.is_3_color() {
        (rgba(c0.one_third_rgb8(c1)), rgba(c1.one_third_rgb8(c0)))
    } else if mode == ColorMode::PunchThrough {
        (rgba(c0.mid_rgb8(c1)), [0, 0, 0, 0])
    } else {
        (rgba(c0.mid_rgb8(c1)), [0, 0, 0, 255])
    };

    [rgba(c0.to_rgb8()), rgba(c1.to_rgb8()), c2, c3]
}

pub(crate) fn decode_color(block: &ColorBlock, mode: ColorMode) -> [[u8; 4]; 16] {
    let palette = color_palette(block, mode);
    block.indexes.map(|i| palette[i as usize & 3])
}

/// Returns the 8 palette entries of a scalar block.
pub(crate) fn scalar_palette(block: &ScalarBlock) -> [u8; 8] {
    let c0 = block.value0;
    let c1 = block.value1;
    let v0 = c0 as u32;
    let v1 = c1 as u32;

    // exact rounding of (a*v0 + b*v1) / 7 and / 5
    let by_7 = |a: u32, b: u32| (((a * v0 + b * v1) * 9360 + 32160) >> 16) as u8;
    let by_5 = |a: u32, b: u32| (((a * v0 + b * v1) * 13104 + 30288) >> 16) as u8;

    if block.is_8_value() {
        [
            c0,
            c1,
            by_7(6, 1),
            by_7(5, 2),
            by_7(4, 3),
            by_7(3, 4),
            by_7(2, 5),
            by_7(1, 6),
        ]
    } else {
        [
            c0,
            c1,
            by_5(4, 1),
            by_5(3, 2),
            by_5(2, 3),
            by_5(1, 4),
            0,
            255,
        ]
    }
}

pub(crate) fn decode_scalar(block: &ScalarBlock) -> [u8; 16] {
    let palette = scalar_palette(block);
    block.indexes.map(|i| palette[i as usize & 7])
}

pub(crate) fn decode_explicit_alpha(block: &ExplicitAlphaBlock) -> [u8; 16] {
    block.alphas.map(n4::n8)
}

pub(crate) fn decode_bc1(bytes: [u8; 8], punch_through: bool) -> [[u8; 4]; 16] {
    let mode = if punch_through {
        ColorMode::PunchThrough
    } else {
        ColorMode::Opaque
    };
    decode_color(&ColorBlock::from_bytes(bytes), mode)
}

pub(crate) fn decode_bc2(bytes: [u8; 16]) -> [[u8; 4]; 16] {
    let (alpha_bytes, color_bytes) = split_16(bytes);
    let mut pixels = decode_color(&ColorBlock::from_bytes(color_bytes), ColorMode::FourColor);
    let alpha = decode_explicit_alpha(&ExplicitAlphaBlock::from_bytes(alpha_bytes));
    for (pixel, a) in pixels.iter_mut().zip(alpha) {
        pixel[3] = a;
    }
    pixels
}

pub(crate) fn decode_bc3(bytes: [u8; 16]) -> [[u8; 4]; 16] {
    let (alpha_bytes, color_bytes) = split_16(bytes);
    let mut pixels = decode_color(&ColorBlock::from_bytes(color_bytes), ColorMode::FourColor);
    let alpha = decode_scalar(&ScalarBlock::from_bytes(alpha_bytes));
    for (pixel, a) in pixels.iter_mut().zip(alpha) {
        pixel[3] = a;
    }
    pixels
}

/// Channels that are not written by BC4/BC5 are 0, alpha is 255.
const EMPTY_PIXEL: [u8; 4] = [0, 0, 0, 255];

pub(crate) fn decode_bc4(bytes: [u8; 8], component: ColorComponent) -> [[u8; 4]; 16] {
    let values = decode_scalar(&ScalarBlock::from_bytes(bytes));
    values.map(|v| {
        let mut pixel = EMPTY_PIXEL;
        component.insert(&mut pixel, v);
        pixel
    })
}

pub(crate) fn decode_bc5(bytes: [u8; 16], components: [ColorComponent; 2]) -> [[u8; 4]; 16] {
    let (first, second) = split_16(bytes);
    let first = decode_scalar(&ScalarBlock::from_bytes(first));
    let second = decode_scalar(&ScalarBlock::from_bytes(second));

    std::array::from_fn(|i| {
        let mut pixel = EMPTY_PIXEL;
        components[0].insert(&mut pixel, first[i]);
        components[1].insert(&mut pixel, second[i]);
        pixel
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb565;

    fn color_block(color0: Rgb565, color1: Rgb565) -> ColorBlock {
        ColorBlock {
            color0,
            color1,
            indexes: std::array::from_fn(|i| (i % 4) as u8),
        }
    }

    #[test]
    fn bc1_four_color() {
        let block = color_block(Rgb565::WHITE, Rgb565::BLACK);
        assert!(!block.is_3_color());
        let palette = color_palette(&block, ColorMode::PunchThrough);
        assert_eq!(palette[0], [255, 255, 255, 255]);
        assert_eq!(palette[1], [0, 0, 0, 255]);
        assert_eq!(palette[2], [170, 170, 170, 255]);
        assert_eq!(palette[3], [85, 85, 85, 255]);
    }

    #[test]
    fn bc1_three_color() {
        let block = color_block(Rgb565::BLACK, Rgb565::WHITE);
        assert!(block.is_3_color());

        let palette = color_palette(&block, ColorMode::PunchThrough);
        assert_eq!(palette[2], [128, 128, 128, 255]);
        assert_eq!(palette[3], [0, 0, 0, 0]);

        let palette = color_palette(&block, ColorMode::Opaque);
        assert_eq!(palette[3], [0, 0, 0, 255]);

        // BC2 and BC3 ignore the endpoint order
        let palette = color_palette(&block, ColorMode::FourColor);
        assert_eq!(palette[2], [85, 85, 85, 255]);
        assert_eq!(palette[3], [170, 170, 170, 255]);
    }

    #[test]
    fn scalar_palettes() {
        let block = ScalarBlock {
            value0: 255,
            value1: 0,
            indexes: [0; 16],
        };
        let palette = scalar_palette(&block);
        assert_eq!(palette, [255, 0, 219, 182, 146, 109, 73, 36]);

        let block = ScalarBlock {
            value0: 0,
            value1: 255,
            indexes: [0; 16],
        };
        let palette = scalar_palette(&block);
        assert_eq!(palette, [0, 255, 51, 102, 153, 204, 0, 255]);

        let equal = ScalarBlock {
            value0: 77,
            value1: 77,
            indexes: [0; 16],
        };
        assert_eq!(&scalar_palette(&equal)[..6], &[77; 6]);
    }

    #[test]
    fn bc4_targets() {
        let block = ScalarBlock {
            value0: 200,
            value1: 100,
            indexes: [1; 16],
        };
        let bytes = block.to_bytes();

        assert_eq!(decode_bc4(bytes, ColorComponent::R)[0], [100, 0, 0, 255]);
        assert_eq!(decode_bc4(bytes, ColorComponent::A)[5], [0, 0, 0, 100]);
        assert_eq!(
            decode_bc4(bytes, ColorComponent::Luminance)[15],
            [100, 100, 100, 255]
        );
    }

    #[test]
    fn bc5_targets() {
        let first = ScalarBlock {
            value0: 10,
            value1: 20,
            indexes: [0; 16],
        };
        let second = ScalarBlock {
            value0: 30,
            value1: 40,
            indexes: [1; 16],
        };
        let bytes = crate::block::join_16(first.to_bytes(), second.to_bytes());
        let pixels = decode_bc5(bytes, [ColorComponent::B, ColorComponent::R]);
        assert_eq!(pixels[3], [40, 0, 10, 255]);
    }

    #[test]
    fn bc2_alpha() {
        let alpha = ExplicitAlphaBlock {
            alphas: std::array::from_fn(|i| i as u8),
        };
        let color = color_block(Rgb565::WHITE, Rgb565::WHITE);
        let bytes = crate::block::join_16(alpha.to_bytes(), color.to_bytes());
        let pixels = decode_bc2(bytes);
        assert_eq!(pixels[0][3], 0);
        assert_eq!(pixels[1][3], 17);
        assert_eq!(pixels[15][3], 255);
    }
}
