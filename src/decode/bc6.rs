use crate::bcn_data::{interpolate, weights};
use crate::block::Bc6Block;
use crate::color::f16_bits_to_f32;

// Spec:
// https://microsoft.github.io/DirectX-Specs/d3d/archive/D3D11_3_FunctionalSpec.htm#19.5.13%20BC6H%20/%20DXGI_FORMAT_BC6H

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Bc6Format {
    UnsignedF16,
    SignedF16,
}
impl Bc6Format {
    pub fn is_signed(self) -> bool {
        self == Bc6Format::SignedF16
    }
}

/// Decodes a BC6H block to RGB floats. Blocks with a reserved mode decode to
/// black.
pub(crate) fn decode_bc6(bytes: [u8; 16], format: Bc6Format) -> [[f32; 3]; 16] {
    match Bc6Block::unpack(bytes) {
        Some(block) => decode_bc6_block(&block, format),
        // Modes 10011, 10111, 11011, and 11111 are reserved and should not be
        // used by the encoder. If hardware is given these modes, the resulting
        // decompressed block must contain zeroes in all channels (except the
        // alpha channel).
        None => [[0.0; 3]; 16],
    }
}

pub(crate) fn decode_bc6_block(block: &Bc6Block, format: Bc6Format) -> [[f32; 3]; 16] {
    decode_bc6_block_f16(block, format).map(|p| p.map(f16_bits_to_f32))
}

/// Decodes to the half-float bit patterns of all pixels.
pub(crate) fn decode_bc6_block_f16(block: &Bc6Block, format: Bc6Format) -> [[u16; 3]; 16] {
    let mode = block.mode;
    let precision = mode.endpoint_bits();
    let endpoints = decode_endpoints(block, format);
    let unquantized = endpoints.map(|e| e.map(|c| unquantize(c, precision, format)));

    let subset_map = block.subset_map();
    let weights = weights(mode.index_bits());

    let mut output = [[0_u16; 3]; 16];
    for (pixel_index, pixel) in output.iter_mut().enumerate() {
        let subset = (subset_map[pixel_index] & 1) as usize;
        let e0 = unquantized[subset * 2];
        let e1 = unquantized[subset * 2 + 1];
        let w = weights[block.indexes[pixel_index] as usize % weights.len()];
        *pixel = [0, 1, 2].map(|c| finish_unquantize(interpolate(e0[c], e1[c], w), format));
    }
    output
}

/// Sign extends and undoes the delta transform. The returned endpoints are
/// quantized to [`Bc6Mode::endpoint_bits`](crate::block::Bc6Mode::endpoint_bits).
pub(crate) fn decode_endpoints(block: &Bc6Block, format: Bc6Format) -> [[i32; 3]; 4] {
    let mode = block.mode;
    let a_bits = mode.endpoint_bits();
    let delta_bits = mode.delta_bits();
    let signed = format.is_signed();
    let endpoint_count = mode.subsets() as usize * 2;

    let mut endpoints = block.endpoints.map(|e| e.map(|c| c as i32));

    // sign extend the endpoints
    if signed {
        endpoints[0] = endpoints[0].map(|c| sign_extend(c, a_bits));
    }
    if mode.is_transformed() || signed {
        for e in &mut endpoints[1..endpoint_count] {
            for (c, bits) in e.iter_mut().zip(delta_bits) {
                *c = sign_extend(*c, bits);
            }
        }
    }

    if mode.is_transformed() {
        // transform B0 -> B0+A0
        let a0 = endpoints[0];
        let mask = (1 << a_bits) - 1;
        for e in &mut endpoints[1..endpoint_count] {
            for (c, base) in e.iter_mut().zip(a0) {
                *c = c.wrapping_add(base) & mask;
                if signed {
                    *c = sign_extend(*c, a_bits);
                }
            }
        }
    }

    endpoints
}

pub(crate) fn sign_extend(x: i32, bit_count: u8) -> i32 {
    debug_assert!(bit_count > 0);
    debug_assert!(bit_count < 32);

    let shift = 32 - bit_count as u32;
    (x << shift) >> shift
}

pub(crate) fn unquantize(mut component: i32, u_bits_per_comp: u8, format: Bc6Format) -> i32 {
    let mut unq: i32;
    match format {
        Bc6Format::UnsignedF16 => {
            if u_bits_per_comp >= 15 {
                unq = component;
            } else if component == 0 {
                unq = 0;
            } else if component == ((1 << u_bits_per_comp) - 1) {
                unq = 0xFFFF;
            } else {
                unq = ((component << 16) + 0x8000) >> u_bits_per_comp;
            }
        }
        Bc6Format::SignedF16 => {
            if u_bits_per_comp >= 16 {
                unq = component;
            } else {
                let mut s = false;
                if component < 0 {
                    s = true;
                    component = -component;
                }

                if component == 0 {
                    unq = 0;
                } else if component >= ((1 << (u_bits_per_comp - 1)) - 1) {
                    unq = 0x7FFF;
                } else {
                    unq = ((component << 15) + 0x4000) >> (u_bits_per_comp - 1);
                }

                if s {
                    unq = -unq;
                }
            }
        }
    }

    unq
}

/// Scales an interpolated value to the half-float bit pattern.
pub(crate) fn finish_unquantize(mut component: i32, format: Bc6Format) -> u16 {
    match format {
        Bc6Format::UnsignedF16 => {
            component = (component * 31) >> 6; // scale the magnitude by 31/64
            component as u16
        }
        Bc6Format::SignedF16 => {
            component = if component < 0 {
                -(((-component) * 31) >> 5)
            } else {
                (component * 31) >> 5
            }; // scale the magnitude by 31/32
            let mut s = 0;
            if component < 0 {
                s = 0x8000;
                component = -component;
            }
            (s | component) as u16
        }
    }
}
