#![allow(unused)]

use bcn::*;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

pub const QUALITIES: [CompressionQuality; 3] = [
    CompressionQuality::Fast,
    CompressionQuality::Balanced,
    CompressionQuality::BestQuality,
];

pub fn ldr_formats() -> impl Iterator<Item = CompressionFormat> {
    CompressionFormat::ALL.into_iter().filter(|f| !f.is_hdr())
}
pub fn hdr_formats() -> impl Iterator<Item = CompressionFormat> {
    CompressionFormat::ALL.into_iter().filter(|f| f.is_hdr())
}

pub fn create_rng() -> impl Rng {
    rand_chacha::ChaChaRng::seed_from_u64(123456789)
}

pub fn hash_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let bytes: [u8; 32] = result.into();

    let mut hex = String::new();
    for byte in bytes.iter() {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
pub fn hash_hex_f32(data: &[f32]) -> String {
    let mut hasher = Sha256::new();
    for f in data {
        hasher.update(f.to_le_bytes());
    }
    let result = hasher.finalize();
    let bytes: [u8; 32] = result.into();

    let mut hex = String::new();
    for byte in bytes.iter() {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

pub fn options(quality: CompressionQuality) -> EncodeOptions {
    let mut options = EncodeOptions::default();
    options.quality = quality;
    options
}

/// Uniform noise in all four channels.
pub fn random_tile(rng: &mut impl Rng) -> RgbaTile {
    RgbaTile::from_fn(|_| rng.gen())
}

/// A linear gradient between two random colors, plus a little noise.
pub fn smooth_tile(rng: &mut impl Rng) -> RgbaTile {
    let from: [u8; 4] = rng.gen();
    let to: [u8; 4] = rng.gen();
    RgbaTile::from_fn(|i| {
        let t = ((i % 4) + (i / 4)) as f32 / 6.0;
        std::array::from_fn(|c| {
            let v = from[c] as f32 * (1.0 - t) + to[c] as f32 * t;
            let noise = rng.gen_range(-2.0..=2.0);
            (v + noise).round().clamp(0.0, 255.0) as u8
        })
    })
}

pub fn random_hdr_tile(rng: &mut impl Rng, signed: bool) -> HdrTile {
    let low = if signed { -8.0 } else { 0.0 };
    HdrTile::from_fn(|_| std::array::from_fn(|_| rng.gen_range(low..8.0)))
}

/// A random image with smooth areas and some edges.
pub fn random_image(rng: &mut impl Rng, width: usize, height: usize) -> Vec<[u8; 4]> {
    let base: [u8; 4] = rng.gen();
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let edge = if (x / 5 + y / 3) % 2 == 0 { 0 } else { 90 };
            std::array::from_fn(|c| {
                let v = base[c] as usize + x * 3 + y * 2 + edge + rng.gen_range(0..4);
                (v % 256) as u8
            })
        })
        .collect()
}

pub fn encode(format: CompressionFormat, tile: &RgbaTile, options: &EncodeOptions) -> Vec<u8> {
    let mut out = vec![0; format.block_byte_size()];
    encode_block(format, tile, options, &mut out).unwrap();
    out
}
pub fn decode(format: CompressionFormat, bytes: &[u8]) -> RgbaTile {
    decode_block(format, bytes, &DecodeOptions::default()).unwrap()
}
pub fn round_trip(format: CompressionFormat, tile: &RgbaTile, options: &EncodeOptions) -> RgbaTile {
    decode(format, &encode(format, tile, options))
}

pub fn encode_hdr(format: CompressionFormat, tile: &HdrTile, options: &EncodeOptions) -> Vec<u8> {
    let mut out = vec![0; format.block_byte_size()];
    encode_block_hdr(format, tile, options, &mut out).unwrap();
    out
}
pub fn round_trip_hdr(
    format: CompressionFormat,
    tile: &HdrTile,
    options: &EncodeOptions,
) -> HdrTile {
    decode_block_hdr(format, &encode_hdr(format, tile, options)).unwrap()
}

/// The error that matters for a format, e.g. BC4 only stores one channel.
pub fn format_error(format: CompressionFormat, original: &RgbaTile, other: &RgbaTile) -> u32 {
    let mask: [bool; 4] = match format {
        CompressionFormat::Bc1 | CompressionFormat::Atc => [true, true, true, false],
        CompressionFormat::Bc4 => [true, false, false, false],
        CompressionFormat::Bc5 => [true, true, false, false],
        _ => [true; 4],
    };
    original
        .pixels()
        .iter()
        .zip(other.pixels())
        .map(|(a, b)| {
            (0..4)
                .filter(|&c| mask[c])
                .map(|c| {
                    let d = a[c] as i32 - b[c] as i32;
                    (d * d) as u32
                })
                .sum::<u32>()
        })
        .sum()
}
