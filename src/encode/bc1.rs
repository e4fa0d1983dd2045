//! BC1, BC2 and BC3 encoding.
//!
//! All three share the same color block. BC2 and BC3 only add an alpha block
//! in front of it.

use crate::block::{join_16, ColorBlock, ExplicitAlphaBlock};
use crate::color::{n4, Rgb565};
use crate::decode::{color_palette, ColorMode};
use crate::{CompressionQuality, EncodeOptions};

use super::bc4::scalar_strategy;
use super::bcn_util::{
    search_endpoints, search_scalar_block, Endpoints, Patience, Strategy, VARIATION_COUNT,
};

/// A completely transparent BC1 block in 3-color mode.
///
/// Any endpoints with `color0 <= color1` would work. `color0 == color1` is
/// avoided, since some decoders do not handle it correctly.
const TRANSPARENT_BLOCK: ColorBlock = ColorBlock {
    color0: Rgb565::BLACK,
    color1: Rgb565::WHITE,
    indexes: [3; 16],
};

const RGB565_LIMITS: Endpoints = ([31, 63, 31], [31, 63, 31]);

/// The endpoint search of color blocks. ATC uses the same strategies.
pub(crate) const fn color_strategy(quality: CompressionQuality) -> Strategy {
    match quality {
        CompressionQuality::Fast => Strategy::BOUNDING_BOX,
        CompressionQuality::Balanced => Strategy {
            use_pca: true,
            max_tries: 2 * VARIATION_COUNT,
            error_threshold: 64.0,
            patience: Some(Patience {
                min_tries: 0,
                streak: VARIATION_COUNT,
            }),
        },
        CompressionQuality::BestQuality => Strategy {
            use_pca: true,
            max_tries: 8 * VARIATION_COUNT,
            error_threshold: 8.0,
            patience: Some(Patience {
                min_tries: 2 * VARIATION_COUNT,
                streak: 2 * VARIATION_COUNT,
            }),
        },
    }
}

/// Assigns every pixel the palette entry closest to it.
///
/// Pixels in the `reserved` bit mask get index 3 and add no error. All other
/// pixels choose from the first `choices` palette entries. Returns the
/// indexes and the sum of the weighted squared errors.
pub(crate) fn fit_palette(
    colors: &[[u8; 3]; 16],
    palette: &[[u8; 4]; 4],
    choices: usize,
    reserved: u16,
    weights: [f32; 3],
) -> ([u8; 16], f32) {
    let mut indexes = [0_u8; 16];
    let mut total_error = 0.0;

    for (i, color) in colors.iter().enumerate() {
        if reserved & (1 << i) != 0 {
            indexes[i] = 3;
            continue;
        }

        let mut best = 0;
        let mut best_error = f32::INFINITY;
        for (p, entry) in palette[..choices].iter().enumerate() {
            let error: f32 = (0..3)
                .map(|c| {
                    let d = color[c] as f32 - entry[c] as f32;
                    d * d * weights[c]
                })
                .sum();
            if error < best_error {
                best = p as u8;
                best_error = error;
            }
        }
        indexes[i] = best;
        total_error += best_error;
    }

    (indexes, total_error)
}

/// Searches the endpoints of a color block.
///
/// `candidates` are the colors the endpoints are derived from. If
/// `three_color` is set, the endpoints are ordered so that the block uses the
/// 3-color palette, otherwise the 4-color palette is preferred.
fn search_color_block(
    colors: &[[u8; 3]; 16],
    candidates: &[[u8; 3]],
    reserved: u16,
    mode: ColorMode,
    three_color: bool,
    weights: [f32; 3],
    strategy: &Strategy,
) -> (ColorBlock, f32) {
    search_endpoints(
        candidates,
        RGB565_LIMITS,
        strategy,
        |high, low| {
            let high = Rgb565::from_rgb8(high);
            let low = Rgb565::from_rgb8(low);
            ([high.r, high.g, high.b], [low.r, low.g, low.b])
        },
        |(e0, e1)| {
            let a = Rgb565::new(e0[0], e0[1], e0[2]);
            let b = Rgb565::new(e1[0], e1[1], e1[2]);
            let swap = if three_color {
                a.to_u16() > b.to_u16()
            } else {
                a.to_u16() < b.to_u16()
            };
            let (color0, color1) = if swap { (b, a) } else { (a, b) };

            let mut block = ColorBlock {
                color0,
                color1,
                indexes: [0; 16],
            };
            let palette = color_palette(&block, mode);
            let choices = if mode == ColorMode::PunchThrough && block.is_3_color() {
                3
            } else {
                4
            };
            let (indexes, error) = fit_palette(colors, &palette, choices, reserved, weights);
            block.indexes = indexes;
            (error, (block, error))
        },
    )
}

/// Encodes the color block of BC1-3.
///
/// `transparent` is a bit mask of the pixels that must decode as transparent.
/// It must be 0 unless `mode` is [`ColorMode::PunchThrough`].
fn encode_color(
    pixels: &[[u8; 4]; 16],
    transparent: u16,
    mode: ColorMode,
    options: &EncodeOptions,
) -> ColorBlock {
    debug_assert!(transparent == 0 || mode == ColorMode::PunchThrough);

    if transparent == u16::MAX {
        return TRANSPARENT_BLOCK;
    }

    let colors = pixels.map(|[r, g, b, _]| [r, g, b]);
    let weights = options.error_metric.weights();
    let strategy = color_strategy(options.quality);

    let opaque: Vec<[u8; 3]> = colors
        .iter()
        .enumerate()
        .filter(|(i, _)| transparent & (1 << i) == 0)
        .map(|(_, &c)| c)
        .collect();

    if transparent != 0 {
        let (block, _) =
            search_color_block(&colors, &opaque, transparent, mode, true, weights, &strategy);
        return block;
    }

    let (four, four_error) =
        search_color_block(&colors, &opaque, 0, mode, false, weights, &strategy);

    // Without alpha, index 3 of the 3-color palette is black. Black pixels
    // can use it, so the endpoints only have to cover the other colors.
    if mode == ColorMode::Opaque && four_error > 0.0 {
        let non_black: Vec<[u8; 3]> = opaque.iter().copied().filter(|&c| c != [0; 3]).collect();
        if !non_black.is_empty() && non_black.len() < opaque.len() {
            let (three, three_error) =
                search_color_block(&colors, &non_black, 0, mode, true, weights, &strategy);
            if three_error < four_error {
                return three;
            }
        }
    }

    four
}

fn transparent_mask(pixels: &[[u8; 4]; 16], alpha_threshold: u8) -> u16 {
    pixels
        .iter()
        .enumerate()
        .filter(|(_, p)| p[3] < alpha_threshold)
        .fold(0, |mask, (i, _)| mask | (1 << i))
}

/// Encodes a BC1 block. If `alpha_threshold` is set, pixels with an alpha
/// below it are encoded as transparent.
pub(crate) fn encode_bc1(
    pixels: &[[u8; 4]; 16],
    alpha_threshold: Option<u8>,
    options: &EncodeOptions,
) -> [u8; 8] {
    let (mode, transparent) = match alpha_threshold {
        Some(threshold) => (ColorMode::PunchThrough, transparent_mask(pixels, threshold)),
        None => (ColorMode::Opaque, 0),
    };
    encode_color(pixels, transparent, mode, options).to_bytes()
}

pub(crate) fn encode_bc2(pixels: &[[u8; 4]; 16], options: &EncodeOptions) -> [u8; 16] {
    let alpha = ExplicitAlphaBlock {
        alphas: pixels.map(|p| n4::from_n8(p[3])),
    };
    let color = encode_color(pixels, 0, ColorMode::FourColor, options);
    join_16(alpha.to_bytes(), color.to_bytes())
}

pub(crate) fn encode_bc3(pixels: &[[u8; 4]; 16], options: &EncodeOptions) -> [u8; 16] {
    let alpha = search_scalar_block(&pixels.map(|p| p[3]), &scalar_strategy(options.quality));
    let color = encode_color(pixels, 0, ColorMode::FourColor, options);
    join_16(alpha.to_bytes(), color.to_bytes())
}
