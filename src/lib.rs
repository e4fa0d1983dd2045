//! Encoders and decoders for block-compressed texture formats.
//!
//! All formats compress 4x4 tiles of pixels into fixed-size blocks. This
//! crate handles the blocks themselves: BC1-BC7 (including BC6H for HDR
//! images) and the ATC formats. Containers like DDS or KTX are out of scope.
//!
//! There are two levels of API:
//!
//! - Single blocks: [`encode_block`], [`decode_block`] and their HDR
//!   versions [`encode_block_hdr`] and [`decode_block_hdr`].
//! - Many blocks: [`encode_tiles`], [`decode_tiles`], [`encode_image`], and
//!   [`decode_image`] (plus HDR versions). These can run in parallel, report
//!   progress, and be cancelled through an [`OperationContext`].
//!
//! ```
//! use bcn::{decode_block, encode_block, CompressionFormat, DecodeOptions, EncodeOptions, RgbaTile};
//!
//! let tile = RgbaTile::solid([255, 0, 0, 255]);
//! let mut block = [0; 8];
//! encode_block(CompressionFormat::Bc1, &tile, &EncodeOptions::default(), &mut block)?;
//!
//! let decoded = decode_block(CompressionFormat::Bc1, &block, &DecodeOptions::default())?;
//! assert_eq!(decoded, tile);
//! # Ok::<(), bcn::CodecError>(())
//! ```

#![forbid(unsafe_code)]

mod bcn_data;
mod block;
mod color;
mod decode;
mod encode;
mod error;
mod format;
mod harness;
mod pixel;
mod progress;

pub use color::{round_to_f16, Lab, Rgb555, Rgb565, Rgbe, Xyz, YCbCr, YCbCrAlpha};
pub use decode::DecodeOptions;
pub use encode::{CompressionQuality, EncodeOptions, ErrorMetric};
pub use error::*;
pub use format::*;
pub use harness::*;
pub use pixel::*;
pub use progress::ProgressElement;

/// Encodes one tile into `out`.
///
/// `out` must be exactly [`CompressionFormat::block_byte_size`] bytes long.
/// BC6H formats are rejected with [`CodecError::UnsupportedFormat`], use
/// [`encode_block_hdr`] for them.
pub fn encode_block(
    format: CompressionFormat,
    tile: &RgbaTile,
    options: &EncodeOptions,
    out: &mut [u8],
) -> Result<(), CodecError> {
    options.validate(format)?;
    encode::encode_rgba(format, tile, options, out)
}

/// Encodes one HDR tile into `out`.
///
/// Only BC6H formats are supported. [`CompressionFormat::Bc6U`] clamps
/// negative values to 0. Values are clamped to the largest finite half float
/// and NaN is encoded as 0.
pub fn encode_block_hdr(
    format: CompressionFormat,
    tile: &HdrTile,
    options: &EncodeOptions,
    out: &mut [u8],
) -> Result<(), CodecError> {
    options.validate(format)?;
    encode::encode_hdr(format, tile, options, out)
}

/// Decodes one block.
///
/// `block` must be exactly [`CompressionFormat::block_byte_size`] bytes
/// long. BC6H formats are rejected with [`CodecError::UnsupportedFormat`],
/// use [`decode_block_hdr`] for them.
pub fn decode_block(
    format: CompressionFormat,
    block: &[u8],
    options: &DecodeOptions,
) -> Result<RgbaTile, CodecError> {
    options.validate(format)?;
    decode::decode_rgba(format, block, options)
}

/// Decodes one BC6H block.
///
/// Blocks with a reserved mode decode to black.
pub fn decode_block_hdr(format: CompressionFormat, block: &[u8]) -> Result<HdrTile, CodecError> {
    decode::decode_hdr(format, block)
}
