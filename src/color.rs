//! Quantized colors and color space conversions.
//!
//! Everything in here is a plain value type. The encoders use these types to
//! build palettes and error metrics, the decoders use them to expand endpoints.

use half::f16;

/// Functions for converting **FROM Unorm4** values to other formats.
pub(crate) mod n4 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 15);
        x * 17
    }
    /// Rounds a Unorm8 value to the nearest Unorm4 value.
    #[inline(always)]
    pub fn from_n8(x: u8) -> u8 {
        ((x as u16 * 15 + 127) / 255) as u8
    }
}

/// Functions for converting **FROM Unorm5** values to other formats.
pub(crate) mod n5 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 31);
        ((x as u16 * 2108 + 92) >> 8) as u8
    }
    /// Bit replication, `(x << 3) | (x >> 2)`.
    #[inline(always)]
    pub fn n8_replicate(x: u8) -> u8 {
        debug_assert!(x <= 31);
        (x << 3) | (x >> 2)
    }
    #[inline(always)]
    pub fn from_n8(x: u8) -> u8 {
        ((x as u16 * 31 + 127) / 255) as u8
    }
}

/// Functions for converting **FROM Unorm6** values to other formats.
pub(crate) mod n6 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 63);
        ((x as u16 * 1036 + 132) >> 8) as u8
    }
    #[inline(always)]
    pub fn n8_replicate(x: u8) -> u8 {
        debug_assert!(x <= 63);
        (x << 2) | (x >> 4)
    }
    #[inline(always)]
    pub fn from_n8(x: u8) -> u8 {
        ((x as u16 * 63 + 127) / 255) as u8
    }
}

/// A 16-bit color with 5 bits of red, 6 bits of green, and 5 bits of blue.
///
/// The packed layout is `rrrrrggggggbbbbb` (red in the high bits), the layout
/// of BC1 endpoints and of the second ATC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb565 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
impl Rgb565 {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(31, 63, 31);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        debug_assert!(r < 32);
        debug_assert!(g < 64);
        debug_assert!(b < 32);
        Self { r, g, b }
    }

    /// Rounds an RGB8 color to the nearest representable color.
    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        Self::new(n5::from_n8(r), n6::from_n8(g), n5::from_n8(b))
    }
    /// Expands the color to RGB8 using exact rounding.
    pub fn to_rgb8(self) -> [u8; 3] {
        [n5::n8(self.r), n6::n8(self.g), n5::n8(self.b)]
    }
    /// Expands the color to RGB8 using bit replication.
    pub fn to_rgb8_replicate(self) -> [u8; 3] {
        [
            n5::n8_replicate(self.r),
            n6::n8_replicate(self.g),
            n5::n8_replicate(self.b),
        ]
    }

    pub const fn from_u16(q: u16) -> Self {
        Self {
            r: ((q >> 11) & 0x1F) as u8,
            g: ((q >> 5) & 0x3F) as u8,
            b: (q & 0x1F) as u8,
        }
    }
    pub const fn to_u16(self) -> u16 {
        (self.r as u16) << 11 | (self.g as u16) << 5 | self.b as u16
    }

    /// The nearest RGB8 color that represents `self * 2/3 + color * 1/3`.
    pub(crate) fn one_third_rgb8(self, color: Self) -> [u8; 3] {
        let r = self.r as u32 * 2 + color.r as u32;
        let g = self.g as u32 * 2 + color.g as u32;
        let b = self.b as u32 * 2 + color.b as u32;

        [
            ((r * 351 + 61) >> 7) as u8,
            ((g * 2763 + 1039) >> 11) as u8,
            ((b * 351 + 61) >> 7) as u8,
        ]
    }
    /// The nearest RGB8 color that represents `self * 1/2 + color * 1/2`.
    pub(crate) fn mid_rgb8(self, color: Self) -> [u8; 3] {
        let r = self.r as u32 + color.r as u32;
        let g = self.g as u32 + color.g as u32;
        let b = self.b as u32 + color.b as u32;

        [
            ((r * 1053 + 125) >> 8) as u8,
            ((g * 4145 + 1019) >> 11) as u8,
            ((b * 1053 + 125) >> 8) as u8,
        ]
    }
}

/// A 15-bit color with 5 bits per channel.
///
/// The packed layout is `xrrrrrgggggbbbbb`. The top bit is not part of the
/// color; ATC uses it as a mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb555 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
impl Rgb555 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        debug_assert!(r < 32);
        debug_assert!(g < 32);
        debug_assert!(b < 32);
        Self { r, g, b }
    }

    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        Self::new(n5::from_n8(r), n5::from_n8(g), n5::from_n8(b))
    }
    /// Expands the color to RGB8 using bit replication.
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            n5::n8_replicate(self.r),
            n5::n8_replicate(self.g),
            n5::n8_replicate(self.b),
        ]
    }

    /// Unpacks the low 15 bits. The top bit is ignored.
    pub const fn from_u16(q: u16) -> Self {
        Self {
            r: ((q >> 10) & 0x1F) as u8,
            g: ((q >> 5) & 0x1F) as u8,
            b: (q & 0x1F) as u8,
        }
    }
    pub const fn to_u16(self) -> u16 {
        (self.r as u16) << 10 | (self.g as u16) << 5 | self.b as u16
    }
}

/// Luma and chroma of a color. All channels are relative to RGB values in
/// `0..=1`, so `y` is in `0..=1` and `cb`/`cr` are in `-0.5..=0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YCbCr {
    pub y: f32,
    pub cb: f32,
    pub cr: f32,
}
impl YCbCr {
    pub fn from_rgb([r, g, b]: [f32; 3]) -> Self {
        Self {
            y: 0.2989 * r + 0.5866 * g + 0.1145 * b,
            cb: -0.1687 * r - 0.3313 * g + 0.5000 * b,
            cr: 0.5000 * r - 0.4184 * g - 0.0816 * b,
        }
    }
    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        const F: f32 = 1.0 / 255.0;
        Self::from_rgb([r as f32 * F, g as f32 * F, b as f32 * F])
    }

    /// Converts back to RGB. The result is clamped to `0..=1`.
    pub fn to_rgb(self) -> [f32; 3] {
        let Self { y, cb, cr } = self;
        [
            (y + 1.4022 * cr).clamp(0.0, 1.0),
            (y - 0.3456 * cb - 0.7145 * cr).clamp(0.0, 1.0),
            (y + 1.7710 * cb).clamp(0.0, 1.0),
        ]
    }
    pub fn to_rgb8(self) -> [u8; 3] {
        self.to_rgb().map(|c| (c * 255.0 + 0.5) as u8)
    }

    /// Euclidean distance with the squared luma difference weighted by
    /// `y_weight`.
    pub fn distance_weighted(self, other: Self, y_weight: f32) -> f32 {
        let dy = self.y - other.y;
        let dcb = self.cb - other.cb;
        let dcr = self.cr - other.cr;
        (dy * dy * y_weight + dcb * dcb + dcr * dcr).sqrt()
    }
}

/// [`YCbCr`] plus an alpha channel in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YCbCrAlpha {
    pub y: f32,
    pub cb: f32,
    pub cr: f32,
    pub alpha: f32,
}
impl YCbCrAlpha {
    pub fn from_rgba8([r, g, b, a]: [u8; 4]) -> Self {
        let YCbCr { y, cb, cr } = YCbCr::from_rgb8([r, g, b]);
        Self {
            y,
            cb,
            cr,
            alpha: a as f32 * (1.0 / 255.0),
        }
    }

    /// `sqrt(4*dy^2 + dcb^2 + dcr^2 + da^2)`
    pub fn distance(self, other: Self) -> f32 {
        let dy = self.y - other.y;
        let dcb = self.cb - other.cb;
        let dcr = self.cr - other.cr;
        let da = self.alpha - other.alpha;
        (4.0 * dy * dy + dcb * dcb + dcr * dcr + da * da).sqrt()
    }
}

/// CIE XYZ (D65 illuminant, 2° observer) scaled so that white has `y == 100`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
impl Xyz {
    /// Converts an sRGB color with channels in `0..=1`.
    pub fn from_srgb([r, g, b]: [f32; 3]) -> Self {
        fn linearize(n: f32) -> f32 {
            let linear = if n > 0.04045 {
                ((n + 0.055) / 1.055).powf(2.4)
            } else {
                n / 12.92
            };
            linear * 100.0
        }

        let (r, g, b) = (linearize(r), linearize(g), linearize(b));
        Self {
            x: r * 0.4124 + g * 0.3576 + b * 0.1805,
            y: r * 0.2126 + g * 0.7152 + b * 0.0722,
            z: r * 0.0193 + g * 0.1192 + b * 0.9505,
        }
    }
    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        const F: f32 = 1.0 / 255.0;
        Self::from_srgb([r as f32 * F, g as f32 * F, b as f32 * F])
    }

    /// Converts back to linear RGB, scaled by 100. No transfer function is
    /// applied and the result is not clamped.
    pub fn to_linear_rgb(self) -> [f32; 3] {
        let Self { x, y, z } = self;
        [
            3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z,
            -0.969_266 * x + 1.876_010_8 * y + 0.041_556 * z,
            0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z,
        ]
    }
}

/// CIE L*a*b* relative to the D65 white point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}
impl Lab {
    pub fn from_xyz(xyz: Xyz) -> Self {
        const REF_X: f32 = 95.047;
        const REF_Y: f32 = 100.0;
        const REF_Z: f32 = 108.883;

        fn pivot(n: f32) -> f32 {
            if n > 0.008856 {
                n.cbrt()
            } else {
                7.787 * n + 16.0 / 116.0
            }
        }

        let x = pivot(xyz.x / REF_X);
        let y = pivot(xyz.y / REF_Y);
        let z = pivot(xyz.z / REF_Z);

        Self {
            l: 116.0 * y - 16.0,
            a: 500.0 * (x - y),
            b: 200.0 * (y - z),
        }
    }
    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::from_xyz(Xyz::from_rgb8(rgb))
    }
}

/// A shared-exponent RGB color as used by Radiance HDR files.
///
/// The mantissas store the 8 most significant bits of each channel relative
/// to the largest channel. `e == 0` encodes black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgbe {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub e: u8,
}
impl Rgbe {
    pub fn from_rgb([r, g, b]: [f32; 3]) -> Self {
        let max = r.max(g).max(b);
        if !(max > 1e-32) {
            return Self::default();
        }

        let (_, exponent) = frexp(max);
        let scale = ldexp(1.0, 8 - exponent);
        Self {
            r: (scale * r) as u8,
            g: (scale * g) as u8,
            b: (scale * b) as u8,
            e: (exponent + 128).clamp(0, 255) as u8,
        }
    }

    /// Expands the color. Mantissas are reconstructed at the center of their
    /// quantization interval.
    pub fn to_rgb(self, exposure: f32) -> [f32; 3] {
        if self.e == 0 {
            return [0.0; 3];
        }

        let f = ldexp(1.0, self.e as i32 - (128 + 8)) / exposure;
        [
            (self.r as f32 + 0.5) * f,
            (self.g as f32 + 0.5) * f,
            (self.b as f32 + 0.5) * f,
        ]
    }
}

/// Splits a finite, positive `x` into a mantissa in `0.5..1` and an exponent
/// such that `x == m * 2^e`.
pub(crate) fn frexp(x: f32) -> (f32, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }

    let bits = x.to_bits();
    let biased = ((bits >> 23) & 0xFF) as i32;
    if biased == 0 {
        // subnormal, normalize first
        let (m, e) = frexp(x * (1u64 << 32) as f32);
        return (m, e - 32);
    }

    let exponent = biased - 126;
    let mantissa = f32::from_bits((bits & 0x807F_FFFF) | (126 << 23));
    (mantissa, exponent)
}

/// `x * 2^exp`
pub(crate) fn ldexp(mut x: f32, mut exp: i32) -> f32 {
    // step through the normal range so intermediate powers never overflow
    while exp > 127 {
        x *= 2f32.powi(127);
        exp -= 127;
    }
    while exp < -126 {
        x *= 2f32.powi(-126);
        exp += 126;
    }
    x * 2f32.powi(exp)
}

/// Rounds an f32 to the nearest half-precision float and returns its bits.
pub(crate) fn f32_to_f16_bits(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}
pub(crate) fn f16_bits_to_f32(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

/// Rounds all channels through half precision.
pub fn round_to_f16(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| f16::from_f32(c).to_f32())
}
