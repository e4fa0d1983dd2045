//! BC6H encoding.
//!
//! Candidates are `(mode, partition, endpoints)` triples. Each candidate is
//! quantized, indexed, and scored by decoding it again and measuring the
//! error in log space. Delta encoded modes can fail to represent endpoints
//! that are far apart. Such candidates are skipped, and since the list always
//! starts with mode [`Bc6Mode::M10_10`], at least one candidate succeeds.

use glam::{Vec3A, Vec4};

use crate::bcn_data::{interpolate, weights};
use crate::block::{Bc6Block, Bc6Mode};
use crate::color::f32_to_f16_bits;
use crate::decode::{decode_bc6_block, unquantize, Bc6Format};
use crate::{CompressionQuality, HdrTile};

use super::bcn_util::ColorLine3;
use super::clustering::{cluster_pixels, rank_partitions};
use super::least_squares::refine_endpoints;

const SPATIAL_WEIGHT: f32 = 0.01;
const CLUSTER_ITERATIONS: usize = 10;

/// The largest finite half float.
const F16_MAX_BITS: u16 = 0x7BFF;

const SINGLE_SUBSET_MODES: [Bc6Mode; 4] =
    [Bc6Mode::M10_10, Bc6Mode::M11_9, Bc6Mode::M12_8, Bc6Mode::M16_4];
const TWO_SUBSET_MODES: [Bc6Mode; 10] = [
    Bc6Mode::M6_666,
    Bc6Mode::M7_666,
    Bc6Mode::M8_655,
    Bc6Mode::M8_565,
    Bc6Mode::M8_556,
    Bc6Mode::M9_555,
    Bc6Mode::M10_555,
    Bc6Mode::M11_544,
    Bc6Mode::M11_454,
    Bc6Mode::M11_445,
];

/// How the endpoints of a candidate are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    /// The per channel minimum and maximum of each subset, oriented along the
    /// principal axis of its pixels.
    BoundingBox,
    /// The per channel minimum and maximum without orientation. Only tried if
    /// it differs from [`Fit::BoundingBox`].
    Diagonal,
    /// The oriented bounding box, refined with least squares.
    LeastSquares,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    mode: Bc6Mode,
    partition: u8,
    fit: Fit,
}

/// Same idea as the BC7 tiers: `min_candidates` is the budget of the tier
/// below, and the error threshold is only checked after that many
/// candidates.
struct Tier {
    candidates: usize,
    min_candidates: usize,
    error_threshold: f32,
}

const fn tier(quality: CompressionQuality) -> Tier {
    let per_partition = TWO_SUBSET_MODES.len() * 2;
    let single = SINGLE_SUBSET_MODES.len();
    match quality {
        CompressionQuality::Fast => Tier {
            candidates: 2 * single,
            min_candidates: 0,
            error_threshold: 1e-4,
        },
        CompressionQuality::Balanced => Tier {
            candidates: 3 * single + per_partition,
            min_candidates: 2 * single,
            error_threshold: 1e-5,
        },
        CompressionQuality::BestQuality => Tier {
            candidates: 3 * single + 4 * per_partition,
            min_candidates: 3 * single + per_partition,
            error_threshold: 1e-6,
        },
    }
}

pub(crate) fn encode_bc6(tile: &HdrTile, signed: bool, quality: CompressionQuality) -> [u8; 16] {
    let format = if signed {
        Bc6Format::SignedF16
    } else {
        Bc6Format::UnsignedF16
    };
    let tier = tier(quality);
    let tile = &tile.map(|p| p.map(|c| representable(c, signed)));
    let targets = tile.pixels().map(|p| p.map(|c| prequantize(c, signed)));

    let mut best: Option<(Bc6Block, f32)> = None;
    for (n, candidate) in candidates(tile).into_iter().take(tier.candidates).enumerate() {
        if let Some((_, best_error)) = best {
            if n >= tier.min_candidates && best_error < tier.error_threshold {
                log::trace!("BC6H: stopping after {n} candidates with error {best_error}");
                break;
            }
        }

        let Some(endpoints) = candidate_endpoints(tile, candidate, signed) else {
            continue;
        };
        let Some(block) = encode_candidate(&targets, candidate, &endpoints, format) else {
            log::trace!(
                "BC6H: {:?} cannot encode partition {}, the deltas overflow",
                candidate.mode,
                candidate.partition
            );
            continue;
        };

        let decoded = HdrTile::new(decode_bc6_block(&block, format));
        let error = tile.log_error(&decoded);
        if best.map_or(true, |(_, best_error)| error < best_error) {
            best = Some((block, error));
        }
    }

    match best {
        Some((block, _)) => block.pack(),
        None => Bc6Block {
            mode: Bc6Mode::M10_10,
            partition: 0,
            endpoints: [[0; 3]; 4],
            indexes: [0; 16],
        }
        .pack(),
    }
}

/// All candidates in the order they are tried.
fn candidates(tile: &HdrTile) -> Vec<Candidate> {
    let mut list = Vec::new();
    for fit in [Fit::BoundingBox, Fit::Diagonal, Fit::LeastSquares] {
        for mode in SINGLE_SUBSET_MODES {
            list.push(Candidate {
                mode,
                partition: 0,
                fit,
            });
        }
    }

    for partition in ranked_partitions(tile) {
        for fit in [Fit::BoundingBox, Fit::LeastSquares] {
            for mode in TWO_SUBSET_MODES {
                list.push(Candidate {
                    mode,
                    partition,
                    fit,
                });
            }
        }
    }
    list
}

/// The 32 partitions of BC6H, best match for the pixels first.
fn ranked_partitions(tile: &HdrTile) -> Vec<u8> {
    let points = tile
        .pixels()
        .map(|p| p.map(log_space))
        .map(|[r, g, b]| Vec4::new(r, g, b, 0.0));
    let clusters = cluster_pixels(&points, 2, CLUSTER_ITERATIONS, SPATIAL_WEIGHT);
    rank_partitions(&clusters, 2, 32)
}

/// The logarithmic space of [`HdrTile::log_error`].
fn log_space(c: f32) -> f32 {
    c.signum() * c.abs().ln_1p()
}

fn bounding_box(pixels: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut low = [f32::INFINITY; 3];
    let mut high = [f32::NEG_INFINITY; 3];
    for p in pixels {
        for c in 0..3 {
            low[c] = low[c].min(p[c]);
            high[c] = high[c].max(p[c]);
        }
    }
    (low, high)
}

/// The channels that fall while the dominant channel of the principal axis
/// rises.
fn falling_channels(pixels: &[[f32; 3]]) -> [bool; 3] {
    let points: Vec<Vec3A> = pixels
        .iter()
        .map(|p| Vec3A::from(p.map(log_space)))
        .collect();
    let axis = ColorLine3::new(&points).direction();
    let dominant = (0..3)
        .max_by(|&a, &b| axis[a].abs().total_cmp(&axis[b].abs()))
        .unwrap_or(0);
    [0, 1, 2].map(|c| axis[c] * axis[dominant] < 0.0)
}

/// The target endpoints of all subsets as floats.
fn candidate_endpoints(tile: &HdrTile, candidate: Candidate, signed: bool) -> Option<[[f32; 3]; 4]> {
    let mode = candidate.mode;
    let subsets = Bc6Block {
        mode,
        partition: candidate.partition,
        endpoints: [[0; 3]; 4],
        indexes: [0; 16],
    }
    .subset_map();

    // least squares works on non-negative half floats
    if candidate.fit == Fit::LeastSquares && signed && tile.has_negative_pixels() {
        return None;
    }

    let mut endpoints = [[0.0; 3]; 4];
    for s in 0..mode.subsets() as usize {
        let members: Vec<[f32; 3]> = tile
            .pixels()
            .iter()
            .zip(&subsets)
            .filter(|(_, &id)| id as usize == s)
            .map(|(&p, _)| p.map(|c| if signed { c } else { c.max(0.0) }))
            .collect();
        if members.is_empty() {
            continue;
        }

        let (mut low, mut high) = bounding_box(&members);
        let falling = falling_channels(&members);
        if candidate.fit == Fit::Diagonal {
            if !falling.contains(&true) {
                return None;
            }
        } else {
            for c in (0..3).filter(|&c| falling[c]) {
                std::mem::swap(&mut low[c], &mut high[c]);
            }
        }

        if candidate.fit == Fit::LeastSquares {
            (low, high) = refine_endpoints(&members, low, high, mode.index_bits())?;
        }
        endpoints[s * 2] = low;
        endpoints[s * 2 + 1] = high;
    }
    Some(endpoints)
}

/// Replaces NaN with 0 and clamps to the finite half floats of the format.
fn representable(value: f32, signed: bool) -> f32 {
    const MAX: f32 = 65504.0;
    if value.is_nan() {
        0.0
    } else if signed {
        value.clamp(-MAX, MAX)
    } else {
        value.clamp(0.0, MAX)
    }
}

/// Maps a float to the integer domain of unquantized endpoints. This is the
/// inverse of the final scaling of the decoder, which truncates, so the
/// division rounds up.
fn prequantize(value: f32, signed: bool) -> i32 {
    let value = if value.is_nan() {
        0.0
    } else if signed {
        value
    } else {
        value.max(0.0)
    };

    let bits = f32_to_f16_bits(value);
    let magnitude = (bits & 0x7FFF).min(F16_MAX_BITS) as i32;
    if signed {
        let q = ((magnitude * 32 + 30) / 31).min(0x7FFF);
        if bits & 0x8000 != 0 {
            -q
        } else {
            q
        }
    } else {
        ((magnitude * 64 + 30) / 31).min(0xFFFF)
    }
}

/// Quantizes a prequantized value to `bits` bits. The result is signed if
/// `signed` is set.
fn quantize(value: i32, bits: u8, signed: bool) -> i32 {
    if bits >= 16 {
        return value;
    }
    if signed {
        let max = (1 << (bits - 1)) - 1;
        let q = (value.abs() >> (16 - bits)).min(max);
        if value < 0 {
            -q
        } else {
            q
        }
    } else {
        value >> (16 - bits)
    }
}

fn fits_signed(value: i32, bits: u8) -> bool {
    let half = 1 << (bits - 1);
    (-half..half).contains(&value)
}

/// Whether every endpoint can be stored as a delta from endpoint 0.
fn deltas_fit(mode: Bc6Mode, endpoints: &[[i32; 3]; 4]) -> bool {
    if !mode.is_transformed() {
        return true;
    }
    let count = mode.subsets() as usize * 2;
    let delta_bits = mode.delta_bits();
    endpoints[1..count].iter().all(|e| {
        (0..3).all(|c| fits_signed(e[c] - endpoints[0][c], delta_bits[c]))
    })
}

/// Stores quantized endpoints in the bit fields of `mode`.
fn to_raw(mode: Bc6Mode, endpoints: &[[i32; 3]; 4]) -> [[u16; 3]; 4] {
    let bits = mode.endpoint_bits();
    let delta_bits = mode.delta_bits();
    let count = mode.subsets() as usize * 2;
    let mask = |value: i32, width: u8| (value & ((1 << width) - 1)) as u16;

    let mut raw = [[0; 3]; 4];
    raw[0] = endpoints[0].map(|c| mask(c, bits));
    for i in 1..count {
        for c in 0..3 {
            raw[i][c] = if mode.is_transformed() {
                mask(endpoints[i][c] - endpoints[0][c], delta_bits[c])
            } else {
                mask(endpoints[i][c], bits)
            };
        }
    }
    raw
}

/// Quantizes the endpoints, picks the indexes, and fixes the anchors.
///
/// Returns `None` if the endpoints cannot be delta encoded in `mode`.
fn encode_candidate(
    targets: &[[i32; 3]; 16],
    candidate: Candidate,
    endpoints: &[[f32; 3]; 4],
    format: Bc6Format,
) -> Option<Bc6Block> {
    let mode = candidate.mode;
    let bits = mode.endpoint_bits();
    let signed = format.is_signed();

    let mut quantized = endpoints.map(|e| e.map(|c| quantize(prequantize(c, signed), bits, signed)));
    if !deltas_fit(mode, &quantized) {
        return None;
    }

    let mut block = Bc6Block {
        mode,
        partition: candidate.partition,
        endpoints: [[0; 3]; 4],
        indexes: [0; 16],
    };
    let subsets = block.subset_map();
    let unquantized = quantized.map(|e| e.map(|c| unquantize(c, bits, format)));
    let weights = weights(mode.index_bits());

    for (i, target) in targets.iter().enumerate() {
        let s = subsets[i] as usize;
        block.indexes[i] = nearest_index(target, unquantized[s * 2], unquantized[s * 2 + 1], weights);
    }

    // the high bit of anchor indexes is implicitly 0
    let high_bit = 1 << (mode.index_bits() - 1);
    let max_index = (1 << mode.index_bits()) - 1;
    let anchors = block.anchors();
    for (s, &anchor) in anchors[..mode.subsets() as usize].iter().enumerate() {
        if block.indexes[anchor as usize] & high_bit == 0 {
            continue;
        }
        quantized.swap(s * 2, s * 2 + 1);
        for (index, &id) in block.indexes.iter_mut().zip(&subsets) {
            if id as usize == s {
                *index = max_index - *index;
            }
        }
    }
    // swapping changes the deltas
    if !deltas_fit(mode, &quantized) {
        return None;
    }

    block.endpoints = to_raw(mode, &quantized);
    Some(block)
}

fn nearest_index(target: &[i32; 3], e0: [i32; 3], e1: [i32; 3], weights: &[u8]) -> u8 {
    let mut best = 0;
    let mut best_error = i64::MAX;
    for (index, &w) in weights.iter().enumerate() {
        let error: i64 = (0..3)
            .map(|c| {
                let d = (interpolate(e0[c], e1[c], w) - target[c]) as i64;
                d * d
            })
            .sum();
        if error < best_error {
            best = index as u8;
            best_error = error;
        }
    }
    best
}
