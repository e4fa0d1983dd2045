use crate::block::join_16;
use crate::{ColorComponent, CompressionQuality};

use super::bcn_util::{search_scalar_block, ScalarStrategy};

/// The endpoint search of scalar blocks. The alpha blocks of BC3 and ATC use
/// the same strategies.
pub(crate) const fn scalar_strategy(quality: CompressionQuality) -> ScalarStrategy {
    let variations = match quality {
        CompressionQuality::Fast => 3,
        CompressionQuality::Balanced => 4,
        CompressionQuality::BestQuality => 8,
    };
    ScalarStrategy {
        variations,
        error_threshold: 5,
    }
}

fn encode_channel(
    pixels: &[[u8; 4]; 16],
    component: ColorComponent,
    quality: CompressionQuality,
) -> [u8; 8] {
    let values = pixels.map(|p| component.extract(p));
    search_scalar_block(&values, &scalar_strategy(quality)).to_bytes()
}

pub(crate) fn encode_bc4(
    pixels: &[[u8; 4]; 16],
    component: ColorComponent,
    quality: CompressionQuality,
) -> [u8; 8] {
    encode_channel(pixels, component, quality)
}

pub(crate) fn encode_bc5(
    pixels: &[[u8; 4]; 16],
    components: [ColorComponent; 2],
    quality: CompressionQuality,
) -> [u8; 16] {
    join_16(
        encode_channel(pixels, components[0], quality),
        encode_channel(pixels, components[1], quality),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ScalarBlock;
    use crate::decode::{decode_rgba, DecodeOptions};
    use crate::CompressionFormat;

    #[test]
    fn pure_extremes() {
        let pixels: [[u8; 4]; 16] =
            std::array::from_fn(|i| if i < 5 { [0, 0, 0, 255] } else { [255, 0, 0, 255] });
        for quality in [
            CompressionQuality::Fast,
            CompressionQuality::Balanced,
            CompressionQuality::BestQuality,
        ] {
            let bytes = encode_bc4(&pixels, ColorComponent::R, quality);
            let block = ScalarBlock::from_bytes(bytes);
            assert_eq!((block.value0, block.value1), (0, 255));

            let decoded = decode_rgba(CompressionFormat::Bc4, &bytes, &DecodeOptions::default())
                .unwrap()
                .into_pixels();
            assert_eq!(decoded, pixels);
        }
    }

    #[test]
    fn bc5_channels() {
        let pixels: [[u8; 4]; 16] =
            std::array::from_fn(|i| [0, 10 + i as u8 * 3, 0, 200 - i as u8]);
        let bytes = encode_bc5(
            &pixels,
            [ColorComponent::A, ColorComponent::G],
            CompressionQuality::BestQuality,
        );

        let options = DecodeOptions {
            bc5_components: (ColorComponent::A, ColorComponent::G),
            ..Default::default()
        };
        let decoded = decode_rgba(CompressionFormat::Bc5, &bytes, &options)
            .unwrap()
            .into_pixels();
        for (d, p) in decoded.iter().zip(&pixels) {
            assert!(d[1].abs_diff(p[1]) <= 4, "{d:?} vs {p:?}");
            assert!(d[3].abs_diff(p[3]) <= 2, "{d:?} vs {p:?}");
            assert_eq!(d[0], 0);
            assert_eq!(d[2], 0);
        }
    }

    #[test]
    fn luminance_source() {
        let pixels = [[90, 90, 90, 255]; 16];
        let bytes = encode_bc4(&pixels, ColorComponent::Luminance, CompressionQuality::Fast);
        let block = ScalarBlock::from_bytes(bytes);
        let palette = crate::decode::scalar_palette(&block);
        for index in block.indexes {
            assert!(palette[index as usize].abs_diff(90) <= 1);
        }
    }
}
