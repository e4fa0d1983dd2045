use bitflags::bitflags;

/// A block-compressed texture format.
///
/// All formats compress 4x4 pixel tiles into blocks of a fixed size. The size
/// of a block can be queried with [`CompressionFormat::block_byte_size`].
///
/// | Format                   | Bytes | Pixels      | Alpha          |
/// | ------------------------ | ----- | ----------- | -------------- |
/// | `Bc1`                    | 8     | RGBA8       | opaque         |
/// | `Bc1WithAlpha`           | 8     | RGBA8       | 1-bit          |
/// | `Bc2`                    | 16    | RGBA8       | 4-bit explicit |
/// | `Bc3`                    | 16    | RGBA8       | interpolated   |
/// | `Bc4`                    | 8     | 1 channel   | -              |
/// | `Bc5`                    | 16    | 2 channels  | -              |
/// | `Bc6U`                   | 16    | RGB float   | -              |
/// | `Bc6S`                   | 16    | RGB float   | -              |
/// | `Bc7`                    | 16    | RGBA8       | yes            |
/// | `Atc`                    | 8     | RGBA8       | opaque         |
/// | `AtcExplicitAlpha`       | 16    | RGBA8       | 4-bit explicit |
/// | `AtcInterpolatedAlpha`   | 16    | RGBA8       | interpolated   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CompressionFormat {
    /// BC1 (DXT1) without alpha. Decoded pixels are always opaque.
    Bc1,
    /// BC1 (DXT1) with 1-bit punch-through alpha.
    Bc1WithAlpha,
    /// BC2 (DXT3): BC1 color plus explicit 4-bit alpha.
    Bc2,
    /// BC3 (DXT5): BC1 color plus an interpolated alpha block.
    Bc3,
    /// BC4 (ATI1/RGTC1): a single 8-bit channel.
    Bc4,
    /// BC5 (ATI2/RGTC2): two independent 8-bit channels.
    Bc5,
    /// BC6H with unsigned half-float endpoints.
    Bc6U,
    /// BC6H with signed half-float endpoints.
    Bc6S,
    /// BC7 (BPTC).
    Bc7,
    /// ATC RGB.
    Atc,
    /// ATC RGBA with explicit 4-bit alpha.
    AtcExplicitAlpha,
    /// ATC RGBA with interpolated alpha.
    AtcInterpolatedAlpha,
}

bitflags! {
    /// Properties of a [`CompressionFormat`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatFlags: u8 {
        /// The format stores an alpha channel.
        const ALPHA = 0x1;
        /// The format stores floating-point (HDR) colors.
        const HDR = 0x2;
        /// The format stores signed values.
        const SIGNED = 0x4;
        /// The format encodes one or two selectable channels instead of colors.
        const CHANNELS = 0x8;
        /// The format allows multiple partitions (subsets) per block.
        const PARTITIONED = 0x10;
    }
}

impl CompressionFormat {
    /// All supported formats.
    pub const ALL: [CompressionFormat; 12] = [
        CompressionFormat::Bc1,
        CompressionFormat::Bc1WithAlpha,
        CompressionFormat::Bc2,
        CompressionFormat::Bc3,
        CompressionFormat::Bc4,
        CompressionFormat::Bc5,
        CompressionFormat::Bc6U,
        CompressionFormat::Bc6S,
        CompressionFormat::Bc7,
        CompressionFormat::Atc,
        CompressionFormat::AtcExplicitAlpha,
        CompressionFormat::AtcInterpolatedAlpha,
    ];

    /// The number of bytes of a single compressed 4x4 block.
    pub const fn block_byte_size(self) -> usize {
        match self {
            CompressionFormat::Bc1
            | CompressionFormat::Bc1WithAlpha
            | CompressionFormat::Bc4
            | CompressionFormat::Atc => 8,
            CompressionFormat::Bc2
            | CompressionFormat::Bc3
            | CompressionFormat::Bc5
            | CompressionFormat::Bc6U
            | CompressionFormat::Bc6S
            | CompressionFormat::Bc7
            | CompressionFormat::AtcExplicitAlpha
            | CompressionFormat::AtcInterpolatedAlpha => 16,
        }
    }

    pub const fn flags(self) -> FormatFlags {
        match self {
            CompressionFormat::Bc1 | CompressionFormat::Atc => FormatFlags::empty(),
            CompressionFormat::Bc1WithAlpha
            | CompressionFormat::Bc2
            | CompressionFormat::Bc3
            | CompressionFormat::AtcExplicitAlpha
            | CompressionFormat::AtcInterpolatedAlpha => FormatFlags::ALPHA,
            CompressionFormat::Bc4 | CompressionFormat::Bc5 => FormatFlags::CHANNELS,
            CompressionFormat::Bc6U => {
                FormatFlags::HDR.union(FormatFlags::PARTITIONED)
            }
            CompressionFormat::Bc6S => FormatFlags::HDR
                .union(FormatFlags::SIGNED)
                .union(FormatFlags::PARTITIONED),
            CompressionFormat::Bc7 => FormatFlags::ALPHA.union(FormatFlags::PARTITIONED),
        }
    }

    /// Whether blocks of this format store floating-point colors.
    ///
    /// HDR formats are encoded from [`HdrTile`](crate::HdrTile)s and decoded
    /// to them. All other formats use [`RgbaTile`](crate::RgbaTile)s.
    pub const fn is_hdr(self) -> bool {
        self.flags().contains(FormatFlags::HDR)
    }

    pub const fn supports_alpha(self) -> bool {
        self.flags().contains(FormatFlags::ALPHA)
    }
}

/// A channel of an RGBA8 pixel used as the source (encoding) or target
/// (decoding) of BC4 and BC5 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorComponent {
    #[default]
    R,
    G,
    B,
    A,
    /// The luma of the pixel, `Y` of YCbCr scaled to `0..=255`.
    ///
    /// When decoding, the value is written to the R, G, and B channels.
    Luminance,
}

impl ColorComponent {
    /// Extracts the component from an RGBA8 pixel.
    pub fn extract(self, pixel: [u8; 4]) -> u8 {
        match self {
            ColorComponent::R => pixel[0],
            ColorComponent::G => pixel[1],
            ColorComponent::B => pixel[2],
            ColorComponent::A => pixel[3],
            ColorComponent::Luminance => {
                let y = crate::color::YCbCr::from_rgb8([pixel[0], pixel[1], pixel[2]]).y;
                (y * 255.0 + 0.5).clamp(0.0, 255.0) as u8
            }
        }
    }

    /// Writes the given value into the component of an RGBA8 pixel.
    pub fn insert(self, pixel: &mut [u8; 4], value: u8) {
        match self {
            ColorComponent::R => pixel[0] = value,
            ColorComponent::G => pixel[1] = value,
            ColorComponent::B => pixel[2] = value,
            ColorComponent::A => pixel[3] = value,
            ColorComponent::Luminance => {
                pixel[0] = value;
                pixel[1] = value;
                pixel[2] = value;
            }
        }
    }
}
