use crate::color::{YCbCr, YCbCrAlpha};
use crate::CodecError;

/// A 4x4 tile of pixels in row-major order.
///
/// A tile always contains exactly 16 pixels. The pixel at `(x, y)` is stored
/// at index `y * 4 + x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile<P> {
    pixels: [P; 16],
}

/// A tile of 8-bit RGBA pixels. Used by all formats except BC6H.
pub type RgbaTile = Tile<[u8; 4]>;
/// A tile of floating-point RGB pixels. Used by BC6H.
pub type HdrTile = Tile<[f32; 3]>;

impl<P: Copy> Tile<P> {
    pub const fn new(pixels: [P; 16]) -> Self {
        Self { pixels }
    }
    pub fn from_fn(f: impl FnMut(usize) -> P) -> Self {
        Self {
            pixels: std::array::from_fn(f),
        }
    }
    /// Creates a tile where every pixel has the given value.
    pub const fn solid(pixel: P) -> Self {
        Self {
            pixels: [pixel; 16],
        }
    }

    /// Creates a tile from a flat slice of exactly 16 pixels.
    pub fn from_slice(pixels: &[P]) -> Result<Self, CodecError> {
        match <[P; 16]>::try_from(pixels) {
            Ok(pixels) => Ok(Self { pixels }),
            Err(_) => Err(CodecError::InvalidInputSize {
                expected: 16,
                actual: pixels.len(),
            }),
        }
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// ## Panics
    ///
    /// If `x` or `y` is 4 or larger.
    pub fn get(&self, x: usize, y: usize) -> P {
        assert!(x < 4 && y < 4, "pixel ({x}, {y}) is outside of the tile");
        self.pixels[y * 4 + x]
    }
    pub fn set(&mut self, x: usize, y: usize, pixel: P) {
        assert!(x < 4 && y < 4, "pixel ({x}, {y}) is outside of the tile");
        self.pixels[y * 4 + x] = pixel;
    }

    pub fn pixels(&self) -> &[P; 16] {
        &self.pixels
    }
    pub fn pixels_mut(&mut self) -> &mut [P; 16] {
        &mut self.pixels
    }
    pub fn into_pixels(self) -> [P; 16] {
        self.pixels
    }

    pub fn map<Q: Copy>(self, f: impl FnMut(P) -> Q) -> Tile<Q> {
        Tile {
            pixels: self.pixels.map(f),
        }
    }
}
impl<P: Copy + Default> Default for Tile<P> {
    fn default() -> Self {
        Self {
            pixels: [P::default(); 16],
        }
    }
}
impl<P> std::ops::Index<usize> for Tile<P> {
    type Output = P;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pixels[index]
    }
}
impl<P> std::ops::IndexMut<usize> for Tile<P> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.pixels[index]
    }
}
impl<P> From<[P; 16]> for Tile<P> {
    fn from(pixels: [P; 16]) -> Self {
        Self { pixels }
    }
}

impl RgbaTile {
    /// Whether any pixel has an alpha value below `cutoff`.
    pub fn has_transparent_pixels(&self, cutoff: u8) -> bool {
        self.pixels.iter().any(|p| p[3] < cutoff)
    }
    /// Whether any pixel has an RGB value of exactly `(0, 0, 0)`.
    ///
    /// Alpha is ignored.
    pub fn has_black_pixels(&self) -> bool {
        self.pixels.iter().any(|p| p[0] == 0 && p[1] == 0 && p[2] == 0)
    }
    pub fn is_opaque(&self) -> bool {
        self.pixels.iter().all(|p| p[3] == 255)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// The sum of squared differences over all four channels.
    pub fn squared_error(&self, other: &Self) -> u32 {
        let mut sum = 0;
        for (a, b) in self.pixels.iter().zip(other.pixels.iter()) {
            for c in 0..4 {
                let d = a[c] as i32 - b[c] as i32;
                sum += (d * d) as u32;
            }
        }
        sum
    }

    /// The mean luma-weighted YCbCr distance of the RGB channels. Alpha is
    /// ignored.
    pub fn ycbcr_error(&self, other: &Self) -> f32 {
        let mut sum = 0.0;
        for (a, b) in self.pixels.iter().zip(other.pixels.iter()) {
            let a = YCbCr::from_rgb8([a[0], a[1], a[2]]);
            let b = YCbCr::from_rgb8([b[0], b[1], b[2]]);
            sum += a.distance_weighted(b, 4.0);
        }
        sum / 16.0
    }

    /// The mean YCbCr+alpha distance, see [`YCbCrAlpha::distance`].
    pub fn ycbcr_alpha_error(&self, other: &Self) -> f32 {
        let mut sum = 0.0;
        for (a, b) in self.pixels.iter().zip(other.pixels.iter()) {
            sum += YCbCrAlpha::from_rgba8(*a).distance(YCbCrAlpha::from_rgba8(*b));
        }
        sum / 16.0
    }
}

impl HdrTile {
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn has_negative_pixels(&self) -> bool {
        self.pixels.iter().any(|p| p.iter().any(|&c| c < 0.0))
    }

    /// The sum of squared differences of `sign(c) * ln(1 + |c|)` over all
    /// channels.
    ///
    /// The logarithm compresses the dynamic range, so errors in bright pixels
    /// do not dominate errors in dark pixels.
    pub fn log_error(&self, other: &Self) -> f32 {
        fn log(c: f32) -> f32 {
            c.signum() * c.abs().ln_1p()
        }

        let mut sum = 0.0;
        for (a, b) in self.pixels.iter().zip(other.pixels.iter()) {
            for c in 0..3 {
                let d = log(a[c]) - log(b[c]);
                sum += d * d;
            }
        }
        sum
    }

    /// The sum of squared differences over all channels.
    pub fn squared_error(&self, other: &Self) -> f32 {
        let mut sum = 0.0;
        for (a, b) in self.pixels.iter().zip(other.pixels.iter()) {
            for c in 0..3 {
                let d = a[c] - b[c];
                sum += d * d;
            }
        }
        sum
    }
}

/// The peak signal-to-noise ratio in dB between two sequences of tiles.
///
/// All four channels contribute. Identical inputs return `f64::INFINITY`.
///
/// ## Panics
///
/// If the two slices have different lengths.
pub fn psnr(original: &[RgbaTile], other: &[RgbaTile]) -> f64 {
    assert_eq!(original.len(), other.len());

    let mut sum = 0_u64;
    for (a, b) in original.iter().zip(other) {
        sum += a.squared_error(b) as u64;
    }
    if sum == 0 {
        return f64::INFINITY;
    }

    let mse = sum as f64 / (original.len() * 16 * 4) as f64;
    20.0 * 255.0_f64.log10() - 10.0 * mse.log10()
}
