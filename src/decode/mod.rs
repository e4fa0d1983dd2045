use crate::{CodecError, ColorComponent, CompressionFormat, HdrTile, RgbaTile};

mod atc;
mod bc;
mod bc6;
mod bc7;

pub(crate) use bc::{color_palette, scalar_palette, ColorMode};
pub(crate) use atc::atc_palette;
pub(crate) use bc6::{decode_bc6_block, unquantize, Bc6Format};
#[cfg(test)]
pub(crate) use bc6::finish_unquantize;
pub(crate) use bc7::decode_bc7_block;

/// Options for decoding blocks.
///
/// Only BC4 and BC5 have options. All other formats ignore them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct DecodeOptions {
    /// The channel a decoded BC4 value is written to.
    ///
    /// All other color channels are 0 and alpha is 255, unless alpha is the
    /// target. [`ColorComponent::Luminance`] writes R, G, and B.
    ///
    /// Default: [`ColorComponent::R`]
    pub bc4_component: ColorComponent,
    /// The channels the two values of a decoded BC5 block are written to.
    ///
    /// The two channels must be different, and
    /// [`ColorComponent::Luminance`] is not supported.
    ///
    /// Default: `(R, G)`
    pub bc5_components: (ColorComponent, ColorComponent),
}
impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            bc4_component: ColorComponent::R,
            bc5_components: (ColorComponent::R, ColorComponent::G),
        }
    }
}
impl DecodeOptions {
    /// Checks that the options can be used to decode the given format.
    pub(crate) fn validate(&self, format: CompressionFormat) -> Result<(), CodecError> {
        if format == CompressionFormat::Bc5 {
            let (first, second) = self.bc5_components;
            for component in [first, second] {
                if component == ColorComponent::Luminance {
                    return Err(CodecError::UnsupportedComponent { format, component });
                }
            }
            if first == second {
                return Err(CodecError::UnsupportedComponent {
                    format,
                    component: second,
                });
            }
        }
        Ok(())
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes.try_into().map_err(|_| CodecError::InvalidInputSize {
        expected: N,
        actual: bytes.len(),
    })
}

/// Decodes one block of an LDR format.
///
/// The options must already be validated.
pub(crate) fn decode_rgba(
    format: CompressionFormat,
    block: &[u8],
    options: &DecodeOptions,
) -> Result<RgbaTile, CodecError> {
    let pixels = match format {
        CompressionFormat::Bc1 => bc::decode_bc1(to_array(block)?, false),
        CompressionFormat::Bc1WithAlpha => bc::decode_bc1(to_array(block)?, true),
        CompressionFormat::Bc2 => bc::decode_bc2(to_array(block)?),
        CompressionFormat::Bc3 => bc::decode_bc3(to_array(block)?),
        CompressionFormat::Bc4 => bc::decode_bc4(to_array(block)?, options.bc4_component),
        CompressionFormat::Bc5 => {
            let (first, second) = options.bc5_components;
            bc::decode_bc5(to_array(block)?, [first, second])
        }
        CompressionFormat::Bc7 => bc7::decode_bc7(to_array(block)?),
        CompressionFormat::Atc => atc::decode_atc(to_array(block)?),
        CompressionFormat::AtcExplicitAlpha => atc::decode_atc_explicit_alpha(to_array(block)?),
        CompressionFormat::AtcInterpolatedAlpha => {
            atc::decode_atc_interpolated_alpha(to_array(block)?)
        }
        CompressionFormat::Bc6U | CompressionFormat::Bc6S => {
            return Err(CodecError::UnsupportedFormat(format))
        }
    };
    Ok(RgbaTile::new(pixels))
}

/// Decodes one block of an HDR format.
pub(crate) fn decode_hdr(format: CompressionFormat, block: &[u8]) -> Result<HdrTile, CodecError> {
    let bc6_format = match format {
        CompressionFormat::Bc6U => Bc6Format::UnsignedF16,
        CompressionFormat::Bc6S => Bc6Format::SignedF16,
        _ => return Err(CodecError::UnsupportedFormat(format)),
    };
    Ok(HdrTile::new(bc6::decode_bc6(to_array(block)?, bc6_format)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_size_is_rejected() {
        let options = DecodeOptions::default();
        assert_eq!(
            decode_rgba(CompressionFormat::Bc1, &[0; 16], &options),
            Err(CodecError::InvalidInputSize {
                expected: 8,
                actual: 16
            })
        );
        assert_eq!(
            decode_hdr(CompressionFormat::Bc6U, &[0; 15]),
            Err(CodecError::InvalidInputSize {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn hdr_and_ldr_are_separate() {
        let options = DecodeOptions::default();
        assert_eq!(
            decode_rgba(CompressionFormat::Bc6S, &[0; 16], &options),
            Err(CodecError::UnsupportedFormat(CompressionFormat::Bc6S))
        );
        assert_eq!(
            decode_hdr(CompressionFormat::Bc7, &[0; 16]),
            Err(CodecError::UnsupportedFormat(CompressionFormat::Bc7))
        );
    }

    #[test]
    fn bc5_components() {
        let mut options = DecodeOptions::default();
        assert!(options.validate(CompressionFormat::Bc5).is_ok());

        options.bc5_components = (ColorComponent::G, ColorComponent::G);
        assert!(options.validate(CompressionFormat::Bc5).is_err());
        // other formats don't care
        assert!(options.validate(CompressionFormat::Bc4).is_ok());

        options.bc5_components = (ColorComponent::Luminance, ColorComponent::G);
        assert_eq!(
            options.validate(CompressionFormat::Bc5),
            Err(CodecError::UnsupportedComponent {
                format: CompressionFormat::Bc5,
                component: ColorComponent::Luminance
            })
        );
    }
}
