use crate::bcn_data::{interpolate, weights};
use crate::block::Bc7Block;

/// Decodes a BC7 block. Blocks of the reserved mode 8 decode to transparent
/// black.
pub(crate) fn decode_bc7(bytes: [u8; 16]) -> [[u8; 4]; 16] {
    match Bc7Block::unpack(bytes) {
        Some(block) => decode_bc7_block(&block),
        // From the D3D11 functional spec: Mode 8 (LSB 0x00) is reserved and should not
        // be used by the encoder. If this mode is given to the hardware,
        // an all 0 block will be returned.
        None => [[0; 4]; 16],
    }
}

pub(crate) fn decode_bc7_block(block: &Bc7Block) -> [[u8; 4]; 16] {
    let info = block.info();
    let endpoints = block.unquantized_endpoints();
    let subset_map = block.subset_map();

    let (color_indexes, color_bits, alpha_indexes, alpha_bits) = if info.index2_bits == 0 {
        (&block.indexes, info.index_bits, &block.indexes, info.index_bits)
    } else if block.index_selection {
        (&block.indexes2, info.index2_bits, &block.indexes, info.index_bits)
    } else {
        (&block.indexes, info.index_bits, &block.indexes2, info.index2_bits)
    };
    let color_weights = weights(color_bits);
    let alpha_weights = weights(alpha_bits);

    let mut output = [[0_u8; 4]; 16];
    for (pixel_index, pixel) in output.iter_mut().enumerate() {
        // The `.min(2)` allows LLVM to prove that bounds checks are unnecessary
        let subset = subset_map[pixel_index].min(2) as usize;
        let e0 = endpoints[subset * 2];
        let e1 = endpoints[subset * 2 + 1];

        let cw = color_weights[color_indexes[pixel_index] as usize % color_weights.len()];
        let aw = alpha_weights[alpha_indexes[pixel_index] as usize % alpha_weights.len()];

        let lerp = |c: usize, w: u8| interpolate(e0[c] as i32, e1[c] as i32, w) as u8;
        *pixel = [lerp(0, cw), lerp(1, cw), lerp(2, cw), lerp(3, aw)];
    }

    swap_channels(&mut output, block.rotation);
    output
}

fn swap_channels(output: &mut [[u8; 4]; 16], rotation: u8) {
    let channel = match rotation {
        1 => 0,
        2 => 1,
        3 => 2,
        _ => return,
    };
    for pixel in output.iter_mut() {
        pixel.swap(channel, 3);
    }
}
