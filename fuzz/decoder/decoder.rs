#![no_main]

use bcn::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Just no panic
    let Some((&selector, data)) = data.split_first() else {
        return;
    };
    let format = CompressionFormat::ALL[selector as usize % CompressionFormat::ALL.len()];
    let blocks = data.len() / format.block_byte_size();
    let data = &data[..blocks * format.block_byte_size()];
    let context = OperationContext::new();

    if format.is_hdr() {
        let tiles = decode_tiles_hdr(format, data, &context).expect("whole blocks");
        for tile in tiles {
            assert!(tile.as_floats().iter().all(|c| c.is_finite()));
        }
    } else {
        let components = [
            ColorComponent::R,
            ColorComponent::G,
            ColorComponent::B,
            ColorComponent::A,
            ColorComponent::Luminance,
        ];
        let mut options = DecodeOptions::default();
        options.bc4_component = components[selector as usize % 5];
        decode_tiles(format, data, &options, &context).expect("whole blocks");
    }
});
