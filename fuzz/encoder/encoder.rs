#![no_main]

use bcn::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Just no panic
    let Some((&selector, data)) = data.split_first() else {
        return;
    };
    let format = CompressionFormat::ALL[selector as usize % CompressionFormat::ALL.len()];
    let quality = match selector / 16 % 3 {
        0 => CompressionQuality::Fast,
        1 => CompressionQuality::Balanced,
        _ => CompressionQuality::BestQuality,
    };
    let mut options = EncodeOptions::default();
    options.quality = quality;
    options.alpha_threshold = selector;
    let mut out = [0; 16];
    let out = &mut out[..format.block_byte_size()];

    if format.is_hdr() {
        let Some(bytes) = data.get(..16 * 3 * 4) else {
            return;
        };
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let tile = HdrTile::from_fn(|i| [floats[i * 3], floats[i * 3 + 1], floats[i * 3 + 2]]);
        encode_block_hdr(format, &tile, &options, out).expect("valid block");
        let decoded = decode_block_hdr(format, out).expect("valid block");
        assert!(decoded.as_floats().iter().all(|c| c.is_finite()));
    } else {
        let Some(bytes) = data.get(..64) else {
            return;
        };
        let tile = RgbaTile::from_fn(|i| [bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]]);
        encode_block(format, &tile, &options, out).expect("valid block");
        decode_block(format, out, &DecodeOptions::default()).expect("valid block");
    }
});
