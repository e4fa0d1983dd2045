//! ATC encoding.
//!
//! The encoder only produces the standard mode, whose palette interpolates
//! between the two endpoints like BC1.

use crate::block::{join_16, AtcBlock, ExplicitAlphaBlock};
use crate::color::{n4, Rgb555, Rgb565};
use crate::decode::atc_palette;
use crate::EncodeOptions;

use super::bc1::{color_strategy, fit_palette};
use super::bc4::scalar_strategy;
use super::bcn_util::{search_endpoints, search_scalar_block, Endpoints};

/// color0 is RGB555, color1 is RGB565.
const ATC_LIMITS: Endpoints = ([31, 31, 31], [31, 63, 31]);

fn encode_atc_color(pixels: &[[u8; 4]; 16], options: &EncodeOptions) -> AtcBlock {
    let colors = pixels.map(|[r, g, b, _]| [r, g, b]);
    let weights = options.error_metric.weights();

    search_endpoints(
        &colors,
        ATC_LIMITS,
        &color_strategy(options.quality),
        |high, low| {
            let c0 = Rgb555::from_rgb8(low);
            let c1 = Rgb565::from_rgb8(high);
            ([c0.r, c0.g, c0.b], [c1.r, c1.g, c1.b])
        },
        |(e0, e1)| {
            let mut block = AtcBlock {
                color0: Rgb555::new(e0[0], e0[1], e0[2]),
                color1: Rgb565::new(e1[0], e1[1], e1[2]),
                alternate_mode: false,
                indexes: [0; 16],
            };
            let palette = atc_palette(&block);
            let (indexes, error) = fit_palette(&colors, &palette, 4, 0, weights);
            block.indexes = indexes;
            (error, block)
        },
    )
}

pub(crate) fn encode_atc(pixels: &[[u8; 4]; 16], options: &EncodeOptions) -> [u8; 8] {
    encode_atc_color(pixels, options).to_bytes()
}

pub(crate) fn encode_atc_explicit_alpha(
    pixels: &[[u8; 4]; 16],
    options: &EncodeOptions,
) -> [u8; 16] {
    let alpha = ExplicitAlphaBlock {
        alphas: pixels.map(|p| n4::from_n8(p[3])),
    };
    join_16(alpha.to_bytes(), encode_atc(pixels, options))
}

pub(crate) fn encode_atc_interpolated_alpha(
    pixels: &[[u8; 4]; 16],
    options: &EncodeOptions,
) -> [u8; 16] {
    let alpha = search_scalar_block(&pixels.map(|p| p[3]), &scalar_strategy(options.quality));
    join_16(alpha.to_bytes(), encode_atc(pixels, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_rgba, DecodeOptions};
    use crate::{CompressionFormat, CompressionQuality};

    fn decode(format: CompressionFormat, bytes: &[u8]) -> [[u8; 4]; 16] {
        decode_rgba(format, bytes, &DecodeOptions::default())
            .unwrap()
            .into_pixels()
    }

    #[test]
    fn two_colors() {
        // both colors are exact in RGB555 and RGB565
        let pixels: [[u8; 4]; 16] = std::array::from_fn(|i| {
            if i % 2 == 0 {
                [255, 0, 255, 255]
            } else {
                [0, 255, 0, 255]
            }
        });
        // the bounding box is gray, so this needs the principal axis
        for quality in [CompressionQuality::Balanced, CompressionQuality::BestQuality] {
            let options = EncodeOptions {
                quality,
                ..Default::default()
            };
            let bytes = encode_atc(&pixels, &options);
            assert!(!AtcBlock::from_bytes(bytes).alternate_mode);
            assert_eq!(decode(CompressionFormat::Atc, &bytes), pixels);
        }
    }

    #[test]
    fn alpha_variants() {
        let pixels: [[u8; 4]; 16] = std::array::from_fn(|i| [128, 64, 32, i as u8 * 17]);
        let options = EncodeOptions::default();

        let bytes = encode_atc_explicit_alpha(&pixels, &options);
        let decoded = decode(CompressionFormat::AtcExplicitAlpha, &bytes);
        for (d, p) in decoded.iter().zip(&pixels) {
            assert_eq!(d[3], p[3]);
        }

        let bytes = encode_atc_interpolated_alpha(&pixels, &options);
        let decoded = decode(CompressionFormat::AtcInterpolatedAlpha, &bytes);
        for (d, p) in decoded.iter().zip(&pixels) {
            // 16 values spread over 8 palette entries
            assert!(d[3].abs_diff(p[3]) <= 32, "{d:?} vs {p:?}");
        }
    }
}
