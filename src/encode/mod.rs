use crate::{CodecError, ColorComponent, CompressionFormat, HdrTile, RgbaTile};

mod atc;
mod bc1;
mod bc4;
mod bc6;
mod bc7;
mod bcn_util;
mod clustering;
mod least_squares;

/// Options for encoding blocks.
///
/// ## See also
///
/// - [`encode_block`](crate::encode_block)
/// - [`encode_tiles`](crate::encode_tiles)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct EncodeOptions {
    /// The compression quality.
    ///
    /// Default: [`CompressionQuality::Balanced`]
    pub quality: CompressionQuality,
    /// The error metric of the color endpoint search.
    ///
    /// This is only used by BC1-3 and the ATC formats. BC7 always uses a
    /// YCbCr based metric and BC6H measures the error in log space.
    ///
    /// Default: [`ErrorMetric::Perceptual`]
    pub error_metric: ErrorMetric,
    /// Pixels with an alpha value below this threshold are transparent in
    /// [`CompressionFormat::Bc1WithAlpha`].
    ///
    /// All other formats ignore this option.
    ///
    /// Default: `128`
    pub alpha_threshold: u8,
    /// The channel encoded by BC4.
    ///
    /// Default: [`ColorComponent::R`]
    pub bc4_component: ColorComponent,
    /// The two channels encoded by BC5. They must be different.
    ///
    /// Default: `(R, G)`
    pub bc5_components: (ColorComponent, ColorComponent),
}
impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: CompressionQuality::Balanced,
            error_metric: ErrorMetric::Perceptual,
            alpha_threshold: 128,
            bc4_component: ColorComponent::R,
            bc5_components: (ColorComponent::R, ColorComponent::G),
        }
    }
}
impl EncodeOptions {
    pub(crate) fn validate(&self, format: CompressionFormat) -> Result<(), CodecError> {
        if format == CompressionFormat::Bc5 {
            let (first, second) = self.bc5_components;
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

/// The error metric encoders use to choose color endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorMetric {
    /// The error of all color channels is weighted equally.
    Uniform,
    /// Green is weighted most and blue least, roughly following how bright
    /// each channel appears.
    #[default]
    Perceptual,
}
impl ErrorMetric {
    /// The weights of R, G and B. They add up to 1.
    pub(crate) const fn weights(self) -> [f32; 3] {
        match self {
            ErrorMetric::Uniform => [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            ErrorMetric::Perceptual => [0.3, 0.6, 0.1],
        }
    }
}

/// The level of trade-off between compression quality and speed.
///
/// The quality only changes how hard the encoder searches for good
/// endpoints, never the format of the output. For a given tile, a higher
/// quality never produces a larger error than a lower quality.
///
/// - `Fast`: Endpoints are taken from the bounding box of the colors.
/// - `Balanced`: Endpoints are refined with a short local search.
/// - `BestQuality`: More search, more candidates, and lower thresholds for
///   stopping early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CompressionQuality {
    Fast,
    #[default]
    Balanced,
    BestQuality,
}

fn check_output_size(format: CompressionFormat, out: &[u8]) -> Result<(), CodecError> {
    let expected = format.block_byte_size();
    if out.len() != expected {
        return Err(CodecError::InvalidInputSize {
            expected,
            actual: out.len(),
        });
    }
    Ok(())
}

/// Encodes one tile of an LDR format into `out`.
///
/// The options must already be validated.
pub(crate) fn encode_rgba(
    format: CompressionFormat,
    tile: &RgbaTile,
    options: &EncodeOptions,
    out: &mut [u8],
) -> Result<(), CodecError> {
    if format.is_hdr() {
        return Err(CodecError::UnsupportedFormat(format));
    }
    check_output_size(format, out)?;

    let pixels = tile.pixels();
    match format {
        CompressionFormat::Bc1 => out.copy_from_slice(&bc1::encode_bc1(pixels, None, options)),
        CompressionFormat::Bc1WithAlpha => out.copy_from_slice(&bc1::encode_bc1(
            pixels,
            Some(options.alpha_threshold),
            options,
        )),
        CompressionFormat::Bc2 => out.copy_from_slice(&bc1::encode_bc2(pixels, options)),
        CompressionFormat::Bc3 => out.copy_from_slice(&bc1::encode_bc3(pixels, options)),
        CompressionFormat::Bc4 => out.copy_from_slice(&bc4::encode_bc4(
            pixels,
            options.bc4_component,
            options.quality,
        )),
        CompressionFormat::Bc5 => {
            let (first, second) = options.bc5_components;
            out.copy_from_slice(&bc4::encode_bc5(pixels, [first, second], options.quality))
        }
        CompressionFormat::Bc7 => out.copy_from_slice(&bc7::encode_bc7(tile, options.quality)),
        CompressionFormat::Atc => out.copy_from_slice(&atc::encode_atc(pixels, options)),
        CompressionFormat::AtcExplicitAlpha => {
            out.copy_from_slice(&atc::encode_atc_explicit_alpha(pixels, options))
        }
        CompressionFormat::AtcInterpolatedAlpha => {
            out.copy_from_slice(&atc::encode_atc_interpolated_alpha(pixels, options))
        }
        CompressionFormat::Bc6U | CompressionFormat::Bc6S => {
            return Err(CodecError::UnsupportedFormat(format))
        }
    }
    Ok(())
}

/// Encodes one tile of an HDR format into `out`.
pub(crate) fn encode_hdr(
    format: CompressionFormat,
    tile: &HdrTile,
    options: &EncodeOptions,
    out: &mut [u8],
) -> Result<(), CodecError> {
    let signed = match format {
        CompressionFormat::Bc6U => false,
        CompressionFormat::Bc6S => true,
        _ => return Err(CodecError::UnsupportedFormat(format)),
    };
    check_output_size(format, out)?;

    out.copy_from_slice(&bc6::encode_bc6(tile, signed, options.quality));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_size_is_checked() {
        let options = EncodeOptions::default();
        let tile = RgbaTile::solid([1, 2, 3, 4]);

        let mut out = [0; 16];
        assert_eq!(
            encode_rgba(CompressionFormat::Bc1, &tile, &options, &mut out),
            Err(CodecError::InvalidInputSize {
                expected: 8,
                actual: 16
            })
        );
        // nothing was written
        assert_eq!(out, [0; 16]);

        let mut out = [0; 8];
        assert!(encode_rgba(CompressionFormat::Atc, &tile, &options, &mut out).is_ok());
    }

    #[test]
    fn hdr_and_ldr_are_separate() {
        let options = EncodeOptions::default();
        let mut out = [0; 16];
        assert_eq!(
            encode_rgba(
                CompressionFormat::Bc6U,
                &RgbaTile::solid([0; 4]),
                &options,
                &mut out
            ),
            Err(CodecError::UnsupportedFormat(CompressionFormat::Bc6U))
        );
        assert_eq!(
            encode_hdr(
                CompressionFormat::Bc3,
                &HdrTile::solid([0.0; 3]),
                &options,
                &mut out
            ),
            Err(CodecError::UnsupportedFormat(CompressionFormat::Bc3))
        );
    }

    #[test]
    fn bc5_needs_two_channels() {
        let mut options = EncodeOptions::default();
        assert!(options.validate(CompressionFormat::Bc5).is_ok());

        options.bc5_components = (ColorComponent::Luminance, ColorComponent::A);
        assert!(options.validate(CompressionFormat::Bc5).is_ok());

        options.bc5_components = (ColorComponent::B, ColorComponent::B);
        assert_eq!(
            options.validate(CompressionFormat::Bc5),
            Err(CodecError::UnsupportedComponent {
                format: CompressionFormat::Bc5,
                component: ColorComponent::B
            })
        );
    }

    #[test]
    fn metric_weights() {
        for metric in [ErrorMetric::Uniform, ErrorMetric::Perceptual] {
            let sum: f32 = metric.weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }
}
