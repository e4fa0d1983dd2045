use std::ops::Range;

use glam::Vec4;

use crate::bcn_data::{interpolate, subset_map, weights};
use crate::block::{promote, unquantize_endpoint, Bc7Block, ModeInfo, PBits, MODES};
use crate::decode::decode_bc7_block;
use crate::{CompressionQuality, RgbaTile};

use super::bcn_util::{hill_climb, ColorLine4, Patience, Strategy};
use super::clustering::{cluster_pixels, rank_partitions};

/// The weight of pixel positions when clustering.
const SPATIAL_WEIGHT: f32 = 0.01;
const CLUSTER_ITERATIONS: usize = 10;

/// The search effort of one quality tier.
///
/// `min_candidates` is the candidate budget of the tier below. The error
/// threshold is only checked after that many candidates, so a tier always
/// sees at least every candidate the tier below sees.
struct Tier {
    candidates: usize,
    min_candidates: usize,
    error_threshold: f32,
    refine: Strategy,
}

const fn tier(quality: CompressionQuality) -> Tier {
    match quality {
        CompressionQuality::Fast => Tier {
            candidates: 6,
            min_candidates: 0,
            error_threshold: 0.002,
            refine: Strategy::BOUNDING_BOX,
        },
        CompressionQuality::Balanced => Tier {
            candidates: 24,
            min_candidates: 6,
            error_threshold: 0.001,
            refine: Strategy {
                use_pca: false,
                max_tries: 32,
                error_threshold: 0.001,
                patience: Some(Patience {
                    min_tries: 0,
                    streak: 12,
                }),
            },
        },
        CompressionQuality::BestQuality => Tier {
            candidates: 96,
            min_candidates: 24,
            error_threshold: 0.0002,
            refine: Strategy {
                use_pca: false,
                max_tries: 128,
                error_threshold: 0.0002,
                patience: Some(Patience {
                    min_tries: 32,
                    streak: 32,
                }),
            },
        },
    }
}

/// Quantized endpoints and their p-bits.
type State = ([[u8; 4]; 6], [u8; 6]);

pub(crate) fn encode_bc7(tile: &RgbaTile, quality: CompressionQuality) -> [u8; 16] {
    let tier = tier(quality);

    let mut best_block = Bc7Block::default();
    let mut best_error = f32::INFINITY;
    for (n, (mode, partition)) in candidates(tile)
        .into_iter()
        .take(tier.candidates)
        .enumerate()
    {
        if n >= tier.min_candidates && best_error < tier.error_threshold {
            log::trace!("BC7: stopping after {n} candidates with error {best_error}");
            break;
        }

        let (block, error) = encode_candidate(tile, mode, partition, &tier.refine);
        if error < best_error {
            best_block = block;
            best_error = error;
        }
    }

    best_block.pack()
}

/// Returns all `(mode, partition)` pairs worth trying, most promising first.
///
/// Single subset modes come first. After them, the partitions are tried in
/// the order of how well they match the clusters of the pixels.
fn candidates(tile: &RgbaTile) -> Vec<(u8, u8)> {
    let opaque = tile.is_opaque();
    let points = tile
        .pixels()
        .map(|[r, g, b, a]| Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0);

    let clusters3 = cluster_pixels(&points, 3, CLUSTER_ITERATIONS, SPATIAL_WEIGHT);
    let mut clusters2 = cluster_pixels(&points, 2, CLUSTER_ITERATIONS, SPATIAL_WEIGHT);
    if clusters2.count < 2 {
        clusters2 = clusters3;
    }
    let ranked2 = rank_partitions(&clusters2, 2, 64);
    let ranked3 = rank_partitions(&clusters3, 3, 64);

    let mut list = vec![(6, 0), (5, 0), (4, 0)];
    for (&p2, &p3) in ranked2.iter().zip(&ranked3) {
        list.push((1, p2));
        list.push((3, p2));
        if !opaque {
            list.push((7, p2));
        }
        // mode 0 only has 4 partition bits
        if p3 < 16 {
            list.push((0, p3));
        }
        list.push((2, p3));
    }
    list
}

fn to_u8(v: Vec4) -> [u8; 4] {
    let v = (v * 255.0).clamp(Vec4::ZERO, Vec4::splat(255.0)).round();
    [v.x as u8, v.y as u8, v.z as u8, v.w as u8]
}

/// Modes 4 and 5 store alpha with its own set of indexes.
fn has_separate_alpha(info: &ModeInfo) -> bool {
    info.index2_bits > 0
}

fn encode_candidate(
    tile: &RgbaTile,
    mode: u8,
    partition: u8,
    strategy: &Strategy,
) -> (Bc7Block, f32) {
    let info = &MODES[mode as usize];
    let subsets = subset_map(info.subsets, partition);
    let pixels = tile.pixels();
    let joint_alpha = info.has_alpha() && !has_separate_alpha(info);

    let mut targets = [[0_u8; 4]; 6];
    for s in 0..info.subsets as usize {
        let members: Vec<[u8; 4]> = pixels
            .iter()
            .zip(&subsets)
            .filter(|(_, &id)| id as usize == s)
            .map(|(&p, _)| p)
            .collect();
        if members.is_empty() {
            continue;
        }

        let points: Vec<Vec4> = members
            .iter()
            .map(|&[r, g, b, a]| {
                let a = if joint_alpha { a as f32 } else { 0.0 };
                Vec4::new(r as f32, g as f32, b as f32, a) / 255.0
            })
            .collect();
        let line = ColorLine4::new(&points);
        let (low, high) = line.extremes(&points);
        let mut e0 = to_u8(low);
        let mut e1 = to_u8(high);

        if has_separate_alpha(info) {
            e0[3] = members.iter().map(|p| p[3]).min().unwrap_or(255);
            e1[3] = members.iter().map(|p| p[3]).max().unwrap_or(255);
        }
        targets[s * 2] = e0;
        targets[s * 2 + 1] = e1;
    }

    let start = quantize_endpoints(info, &targets);
    let (error, block) = evaluate(tile, mode, partition, start);
    let (_, error, block) = hill_climb(
        (start, error, block),
        strategy,
        |state, i| vary(info, state, i),
        |state| evaluate(tile, mode, partition, state),
    );
    (block, error)
}

/// Quantizes one 8-bit channel to `bits` bits plus an optional p-bit, such
/// that the unquantized value is as close as possible.
fn quantize_channel(value: u8, bits: u8, p_bit: Option<u8>) -> u8 {
    let precision = bits + p_bit.is_some() as u8;
    let expand = |q: i32| -> i32 {
        let full = match p_bit {
            Some(p) => (q << 1) | (p & 1) as i32,
            None => q,
        };
        promote(full as u8, precision) as i32
    };

    let scaled = value as f32 * ((1 << precision) - 1) as f32 / 255.0;
    let guess = match p_bit {
        Some(p) => ((scaled - p as f32) / 2.0).round() as i32,
        None => scaled.round() as i32,
    };

    let max = (1 << bits) - 1;
    (guess - 1..=guess + 1)
        .map(|q| q.clamp(0, max))
        .min_by_key(|&q| (expand(q) - value as i32).abs())
        .unwrap_or(0) as u8
}

fn quantize_endpoint(info: &ModeInfo, target: [u8; 4], p_bit: Option<u8>) -> [u8; 4] {
    let [r, g, b] = [target[0], target[1], target[2]]
        .map(|v| quantize_channel(v, info.color_bits, p_bit));
    let a = if info.has_alpha() {
        quantize_channel(target[3], info.alpha_bits, p_bit)
    } else {
        0
    };
    [r, g, b, a]
}

fn endpoint_error(info: &ModeInfo, target: [u8; 4], quantized: [u8; 4], p_bit: u8) -> i32 {
    let unquantized = unquantize_endpoint(info, quantized, p_bit);
    let channels = if info.has_alpha() { 4 } else { 3 };
    (0..channels)
        .map(|c| {
            let d = unquantized[c] as i32 - target[c] as i32;
            d * d
        })
        .sum()
}

/// Quantizes all endpoints and picks the p-bits closest to the targets.
fn quantize_endpoints(info: &ModeInfo, targets: &[[u8; 4]; 6]) -> State {
    let mut endpoints = [[0_u8; 4]; 6];
    let mut p_bits = [0_u8; 6];
    let count = info.endpoint_count();

    match info.p_bits {
        PBits::None => {
            for i in 0..count {
                endpoints[i] = quantize_endpoint(info, targets[i], None);
            }
        }
        PBits::Unique => {
            for i in 0..count {
                let mut best_error = i32::MAX;
                for p in 0..2 {
                    let q = quantize_endpoint(info, targets[i], Some(p));
                    let error = endpoint_error(info, targets[i], q, p);
                    if error < best_error {
                        best_error = error;
                        endpoints[i] = q;
                        p_bits[i] = p;
                    }
                }
            }
        }
        PBits::Shared => {
            for s in 0..info.subsets as usize {
                let mut best_error = i32::MAX;
                for p in 0..2 {
                    let q0 = quantize_endpoint(info, targets[s * 2], Some(p));
                    let q1 = quantize_endpoint(info, targets[s * 2 + 1], Some(p));
                    let error = endpoint_error(info, targets[s * 2], q0, p)
                        + endpoint_error(info, targets[s * 2 + 1], q1, p);
                    if error < best_error {
                        best_error = error;
                        endpoints[s * 2] = q0;
                        endpoints[s * 2 + 1] = q1;
                        p_bits[s * 2] = p;
                        p_bits[s * 2 + 1] = p;
                    }
                }
            }
        }
    }

    (endpoints, p_bits)
}

/// The `i`-th variation of the quantized endpoints.
///
/// One round moves every channel of every endpoint up and down, then flips
/// every p-bit. Later rounds move channels further.
fn vary(info: &ModeInfo, (mut endpoints, mut p_bits): State, i: usize) -> State {
    let channels = if info.has_alpha() { 4 } else { 3 };
    let count = info.endpoint_count();
    let channel_moves = count * channels * 2;
    let flips = match info.p_bits {
        PBits::None => 0,
        PBits::Shared => info.subsets as usize,
        PBits::Unique => count,
    };

    let j = i % (channel_moves + flips);
    let step = (1 + i / (channel_moves + flips)).min(255) as i32;

    if j < channel_moves {
        let e = j / (channels * 2);
        let c = (j / 2) % channels;
        let direction = if j % 2 == 0 { 1 } else { -1 };
        let bits = if c < 3 { info.color_bits } else { info.alpha_bits };
        let max = (1 << bits) - 1;
        let value = endpoints[e][c] as i32 + direction * step;
        endpoints[e][c] = value.clamp(0, max) as u8;
    } else {
        let f = j - channel_moves;
        match info.p_bits {
            PBits::Shared => {
                p_bits[f * 2] ^= 1;
                p_bits[f * 2 + 1] ^= 1;
            }
            _ => p_bits[f] ^= 1,
        }
    }

    (endpoints, p_bits)
}

/// Completes a block from its endpoints and returns its error.
fn evaluate(
    tile: &RgbaTile,
    mode: u8,
    partition: u8,
    (endpoints, p_bits): State,
) -> (f32, Bc7Block) {
    let mut block = Bc7Block {
        mode,
        partition,
        rotation: 0,
        index_selection: false,
        endpoints,
        p_bits,
        indexes: [0; 16],
        indexes2: [0; 16],
    };
    assign_indexes(&mut block, tile.pixels());
    fix_anchors(&mut block);

    let decoded = RgbaTile::new(decode_bc7_block(&block));
    (tile.ycbcr_alpha_error(&decoded), block)
}

fn nearest_index(
    pixel: [u8; 4],
    e0: [u8; 4],
    e1: [u8; 4],
    weights: &[u8],
    channels: Range<usize>,
) -> u8 {
    let mut best = 0;
    let mut best_error = i32::MAX;
    for (index, &w) in weights.iter().enumerate() {
        let error: i32 = channels
            .clone()
            .map(|c| {
                let d = interpolate(e0[c] as i32, e1[c] as i32, w) - pixel[c] as i32;
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

fn assign_indexes(block: &mut Bc7Block, pixels: &[[u8; 4]; 16]) {
    let info = block.info();
    let endpoints = block.unquantized_endpoints();
    let subsets = block.subset_map();
    let separate_alpha = has_separate_alpha(info);
    let color_channels = if info.has_alpha() && !separate_alpha {
        0..4
    } else {
        0..3
    };

    for (i, &pixel) in pixels.iter().enumerate() {
        let s = subsets[i].min(2) as usize;
        let e0 = endpoints[s * 2];
        let e1 = endpoints[s * 2 + 1];

        block.indexes[i] = nearest_index(
            pixel,
            e0,
            e1,
            weights(info.index_bits),
            color_channels.clone(),
        );
        if separate_alpha {
            block.indexes2[i] = nearest_index(pixel, e0, e1, weights(info.index2_bits), 3..4);
        }
    }
}

/// Makes sure that the most significant bit of every anchor index is 0.
///
/// Swapping the two endpoints of a subset mirrors its palette, so mirroring
/// the indexes of the subset keeps the decoded pixels the same. This gives
/// the same indexes as recomputing them, since the weight tables are
/// symmetric.
fn fix_anchors(block: &mut Bc7Block) {
    let info = *block.info();
    let subsets = block.subset_map();
    let anchors = block.anchors();
    let separate_alpha = has_separate_alpha(&info);

    let index_max = (1 << info.index_bits) - 1;
    let high_bit = 1 << (info.index_bits - 1);
    for s in 0..info.subsets as usize {
        if block.indexes[anchors[s] as usize] & high_bit == 0 {
            continue;
        }

        let (e0, e1) = (s * 2, s * 2 + 1);
        if separate_alpha {
            // alpha has its own indexes
            for c in 0..3 {
                let t = block.endpoints[e0][c];
                block.endpoints[e0][c] = block.endpoints[e1][c];
                block.endpoints[e1][c] = t;
            }
        } else {
            block.endpoints.swap(e0, e1);
            block.p_bits.swap(e0, e1);
        }
        for (index, &subset) in block.indexes.iter_mut().zip(&subsets) {
            if subset as usize == s {
                *index = index_max - *index;
            }
        }
    }

    if separate_alpha {
        let index_max = (1 << info.index2_bits) - 1;
        let high_bit = 1 << (info.index2_bits - 1);
        if block.indexes2[0] & high_bit != 0 {
            let t = block.endpoints[0][3];
            block.endpoints[0][3] = block.endpoints[1][3];
            block.endpoints[1][3] = t;
            for index in &mut block.indexes2 {
                *index = index_max - *index;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_bits_make_8_bit_exact() {
        let info = &MODES[3];
        for v in 0..=255_u8 {
            let q = quantize_channel(v, info.color_bits, Some(v & 1));
            assert_eq!(promote((q << 1) | (v & 1), 8), v);
        }

        let info = &MODES[5];
        for v in [0, 1, 127, 128, 254, 255] {
            let q = quantize_channel(v, info.alpha_bits, None);
            assert_eq!(q, v);
        }
    }

    #[test]
    fn quantized_channels_are_in_range() {
        for info in &MODES {
            for v in [0, 1, 2, 100, 200, 253, 254, 255] {
                for p in [None, Some(0), Some(1)] {
                    let q = quantize_channel(v, info.color_bits, p);
                    assert!(q < 1 << info.color_bits);
                }
            }
        }
    }

    #[test]
    fn anchors_have_a_zero_high_bit() {
        let pixels: [[u8; 4]; 16] = std::array::from_fn(|i| {
            let v = (i * 16) as u8;
            [v, 255 - v, v / 2, 255 - v / 3]
        });

        let cases = [(0, 3), (1, 20), (2, 40), (3, 1), (4, 0), (5, 0), (6, 0), (7, 9)];
        for (mode, partition) in cases {
            let info = &MODES[mode as usize];
            let max = ((1_u16 << info.color_bits) - 1) as u8;
            let alpha_max = if info.has_alpha() {
                ((1_u16 << info.alpha_bits) - 1) as u8
            } else {
                0
            };

            // the bright endpoint first, which often puts the anchors in the
            // upper half of the palette
            let mut block = Bc7Block {
                mode,
                partition,
                ..Default::default()
            };
            for s in 0..info.subsets as usize {
                block.endpoints[s * 2] = [max, max, max, alpha_max];
                match info.p_bits {
                    PBits::None => {}
                    PBits::Shared => {
                        block.p_bits[s * 2] = 1;
                        block.p_bits[s * 2 + 1] = 1;
                    }
                    PBits::Unique => block.p_bits[s * 2] = 1,
                }
            }
            assign_indexes(&mut block, &pixels);
            let before = decode_bc7_block(&block);

            fix_anchors(&mut block);
            assert_eq!(decode_bc7_block(&block), before, "mode {mode}");

            let high_bit = 1 << (info.index_bits - 1);
            for anchor in &block.anchors()[..info.subsets as usize] {
                assert_eq!(block.indexes[*anchor as usize] & high_bit, 0, "mode {mode}");
            }
            if info.index2_bits > 0 {
                assert_eq!(block.indexes2[0] & (1 << (info.index2_bits - 1)), 0);
            }

            // packing keeps everything
            assert_eq!(Bc7Block::unpack(block.pack()), Some(block));
        }
    }

    #[test]
    fn two_colors_are_exact() {
        // even and odd channels, so both colors are exact with p-bits
        let a = [140, 160, 180, 255];
        let b = [11, 51, 91, 255];
        let split = subset_map(2, 17);
        let tile = RgbaTile::from_fn(|i| if split[i] == 0 { a } else { b });

        for quality in [
            CompressionQuality::Fast,
            CompressionQuality::Balanced,
            CompressionQuality::BestQuality,
        ] {
            let bytes = encode_bc7(&tile, quality);
            let decoded = crate::decode::decode_rgba(
                crate::CompressionFormat::Bc7,
                &bytes,
                &Default::default(),
            )
            .unwrap();
            assert_eq!(decoded, tile, "{quality:?}");
        }
    }

    #[test]
    fn solid_tiles_are_close() {
        for color in [[0, 0, 0, 255], [255, 255, 255, 255], [77, 133, 201, 40]] {
            let tile = RgbaTile::solid(color);
            let bytes = encode_bc7(&tile, CompressionQuality::Balanced);
            let decoded = crate::decode::decode_rgba(
                crate::CompressionFormat::Bc7,
                &bytes,
                &Default::default(),
            )
            .unwrap();
            // one step of alpha is about 0.004
            let error = tile.ycbcr_alpha_error(&decoded);
            assert!(error < 0.005, "{color:?}: {error}");
        }
    }

    #[test]
    fn solid_tiles_keep_the_partition_order() {
        let tile = RgbaTile::solid([10, 200, 30, 255]);
        let partitions: Vec<u8> = candidates(&tile)
            .iter()
            .filter(|&&(mode, _)| mode == 1)
            .map(|&(_, partition)| partition)
            .collect();
        assert_eq!(partitions, (0..64).collect::<Vec<u8>>());
    }
}
