use bcn::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{seq::SliceRandom, Rng, RngCore};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut out = vec![0; len];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut out);
    out
}

const BLOCKS: usize = 64 * 1024;

fn bench_decoder(c: &mut Criterion, format: CompressionFormat) {
    bench_decoder_with(c, format, |_| {});
}
fn bench_decoder_with(
    c: &mut Criterion,
    format: CompressionFormat,
    data_modifier: impl FnOnce(&mut [u8]),
) {
    let mut bytes = random_bytes(BLOCKS * format.block_byte_size());
    data_modifier(&mut bytes);
    let options = DecodeOptions::default();
    let context = OperationContext::new();

    c.bench_function(&format!("{format:?} - {BLOCKS} blocks"), |b| {
        b.iter(|| {
            if format.is_hdr() {
                let result = decode_tiles_hdr(format, black_box(&bytes), &context);
                black_box(result).unwrap();
            } else {
                let result = decode_tiles(format, black_box(&bytes), &options, &context);
                black_box(result).unwrap();
            }
        });
    });
}

/// This sets the BC7 block modes such that each mode is equally likely.
///
/// The block mode is decided by the number of leading zeros, so for random
/// bytes 50% of the blocks would be mode 0.
fn random_bc7_modes(data: &mut [u8]) {
    let mut rng = rand::thread_rng();
    for i in (0..data.len()).step_by(16) {
        let mode: u8 = rng.gen_range(0..8);
        data[i] = (data[i] | 1) << mode;
    }
}

const BC6_MODES: [(u8, u8); 14] = [
    (0b00, 2),
    (0b01, 2),
    (0b00010, 5),
    (0b00110, 5),
    (0b01010, 5),
    (0b01110, 5),
    (0b10010, 5),
    (0b10110, 5),
    (0b11010, 5),
    (0b11110, 5),
    (0b00011, 5),
    (0b00111, 5),
    (0b01011, 5),
    (0b01111, 5),
];
/// This sets the BC6 block modes such that each valid mode is equally likely.
fn random_bc6_modes(data: &mut [u8]) {
    let mut rng = rand::thread_rng();
    for i in (0..data.len()).step_by(16) {
        if let Some(&(mode, mode_bits)) = BC6_MODES.choose(&mut rng) {
            data[i] = (data[i] << mode_bits) | mode;
        }
    }
}

pub fn compressed(c: &mut Criterion) {
    bench_decoder(c, CompressionFormat::Bc1);
    bench_decoder(c, CompressionFormat::Bc2);
    bench_decoder(c, CompressionFormat::Bc3);
    bench_decoder(c, CompressionFormat::Bc4);
    bench_decoder(c, CompressionFormat::Bc5);
    bench_decoder(c, CompressionFormat::Atc);
    bench_decoder(c, CompressionFormat::AtcInterpolatedAlpha);
    bench_decoder_with(c, CompressionFormat::Bc7, random_bc7_modes);
    bench_decoder_with(c, CompressionFormat::Bc6U, random_bc6_modes);
    bench_decoder_with(c, CompressionFormat::Bc6S, random_bc6_modes);
}

criterion_group!(benches, compressed);
criterion_main!(benches);
