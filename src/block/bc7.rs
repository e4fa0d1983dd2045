//! BC7 mode table and block layout.
//!
//! https://learn.microsoft.com/en-us/windows/win32/direct3d11/bc7-format-mode-reference

use super::bits::{BitReader, BitWriter};
use crate::bcn_data;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PBits {
    None,
    /// One p-bit per subset, shared by both endpoints.
    Shared,
    /// One p-bit per endpoint.
    Unique,
}

/// The field widths of one BC7 mode.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ModeInfo {
    pub subsets: u8,
    pub partition_bits: u8,
    pub rotation_bits: u8,
    pub index_selection_bits: u8,
    pub color_bits: u8,
    pub alpha_bits: u8,
    pub p_bits: PBits,
    pub index_bits: u8,
    pub index2_bits: u8,
}
impl ModeInfo {
    const fn new(
        subsets: u8,
        partition_bits: u8,
        rotation_bits: u8,
        index_selection_bits: u8,
        color_bits: u8,
        alpha_bits: u8,
        p_bits: PBits,
        index_bits: u8,
        index2_bits: u8,
    ) -> Self {
        Self {
            subsets,
            partition_bits,
            rotation_bits,
            index_selection_bits,
            color_bits,
            alpha_bits,
            p_bits,
            index_bits,
            index2_bits,
        }
    }

    pub const fn endpoint_count(&self) -> usize {
        self.subsets as usize * 2
    }
    pub const fn has_alpha(&self) -> bool {
        self.alpha_bits > 0
    }
    pub const fn has_p_bits(&self) -> bool {
        !matches!(self.p_bits, PBits::None)
    }
    /// The precision of color channels after the p-bit is appended.
    pub const fn color_precision(&self) -> u8 {
        self.color_bits + self.has_p_bits() as u8
    }
    pub const fn alpha_precision(&self) -> u8 {
        if self.alpha_bits == 0 {
            0
        } else {
            self.alpha_bits + self.has_p_bits() as u8
        }
    }
}

#[rustfmt::skip]
pub(crate) const MODES: [ModeInfo; 8] = [
    //            subsets  part  rot  isel  color  alpha  p-bits          idx  idx2
    ModeInfo::new(3,       4,    0,   0,    4,     0,     PBits::Unique,  3,   0),
    ModeInfo::new(2,       6,    0,   0,    6,     0,     PBits::Shared,  3,   0),
    ModeInfo::new(3,       6,    0,   0,    5,     0,     PBits::None,    2,   0),
    ModeInfo::new(2,       6,    0,   0,    7,     0,     PBits::Unique,  2,   0),
    ModeInfo::new(1,       0,    2,   1,    5,     6,     PBits::None,    2,   3),
    ModeInfo::new(1,       0,    2,   0,    7,     8,     PBits::None,    2,   2),
    ModeInfo::new(1,       0,    0,   0,    7,     7,     PBits::Unique,  4,   0),
    ModeInfo::new(2,       6,    0,   0,    5,     5,     PBits::Unique,  2,   0),
];

/// The fields of a BC7 block.
///
/// Endpoints are stored quantized without their p-bit. Entries beyond the
/// mode's endpoint count, and the alpha of modes without alpha, are 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Bc7Block {
    pub mode: u8,
    pub partition: u8,
    /// 0 = none, 1 = swap R and A, 2 = swap G and A, 3 = swap B and A.
    pub rotation: u8,
    /// Mode 4 only: if set, the 2-bit indexes select alpha and the 3-bit
    /// indexes select color.
    pub index_selection: bool,
    pub endpoints: [[u8; 4]; 6],
    /// One p-bit per endpoint. Modes with shared p-bits use the same value for
    /// both endpoints of a subset.
    pub p_bits: [u8; 6],
    pub indexes: [u8; 16],
    pub indexes2: [u8; 16],
}
impl Bc7Block {
    pub fn info(&self) -> &'static ModeInfo {
        &MODES[self.mode as usize & 7]
    }

    /// The anchor pixels of the primary indexes.
    pub fn anchors(&self) -> [u8; 3] {
        bcn_data::anchors(self.info().subsets, self.partition)
    }
    pub fn subset_map(&self) -> [u8; 16] {
        bcn_data::subset_map(self.info().subsets, self.partition)
    }

    pub fn pack(&self) -> [u8; 16] {
        let info = self.info();
        let endpoint_count = info.endpoint_count();
        let subsets = info.subsets as usize;

        let mut stream = BitWriter::new();
        stream.write(1 << self.mode, self.mode + 1);
        stream.write(self.partition as u64, info.partition_bits);
        stream.write(self.rotation as u64, info.rotation_bits);
        stream.write(self.index_selection as u64, info.index_selection_bits);

        for channel in 0..3 {
            for endpoint in &self.endpoints[..endpoint_count] {
                stream.write(endpoint[channel] as u64, info.color_bits);
            }
        }
        if info.has_alpha() {
            for endpoint in &self.endpoints[..endpoint_count] {
                stream.write(endpoint[3] as u64, info.alpha_bits);
            }
        }

        match info.p_bits {
            PBits::None => {}
            PBits::Shared => {
                for subset in 0..subsets {
                    stream.write(self.p_bits[subset * 2] as u64, 1);
                }
            }
            PBits::Unique => {
                for &p in &self.p_bits[..endpoint_count] {
                    stream.write(p as u64, 1);
                }
            }
        }

        let anchors = self.anchors();
        stream.write_indexes(&self.indexes, info.index_bits, &anchors[..subsets]);
        if info.index2_bits > 0 {
            stream.write_indexes(&self.indexes2, info.index2_bits, &[0]);
        }

        stream.finish()
    }

    /// Returns `None` for the reserved mode 8 (a block whose first byte is 0).
    pub fn unpack(block: [u8; 16]) -> Option<Self> {
        let mut stream = BitReader::new(block);

        // instead of doing it in a loopty loop, just count trailing zeros
        let mode = stream.low_u8().trailing_zeros() as u8;
        if mode >= 8 {
            return None;
        }
        stream.skip(mode + 1);

        let info = &MODES[mode as usize];
        let endpoint_count = info.endpoint_count();
        let subsets = info.subsets as usize;

        let mut result = Self {
            mode,
            partition: stream.read(info.partition_bits),
            rotation: stream.read(info.rotation_bits),
            index_selection: stream.read(info.index_selection_bits) != 0,
            ..Default::default()
        };

        for channel in 0..3 {
            for endpoint in &mut result.endpoints[..endpoint_count] {
                endpoint[channel] = stream.read(info.color_bits);
            }
        }
        if info.has_alpha() {
            for endpoint in &mut result.endpoints[..endpoint_count] {
                endpoint[3] = stream.read(info.alpha_bits);
            }
        }

        match info.p_bits {
            PBits::None => {}
            PBits::Shared => {
                for subset in 0..subsets {
                    let p = stream.read(1);
                    result.p_bits[subset * 2] = p;
                    result.p_bits[subset * 2 + 1] = p;
                }
            }
            PBits::Unique => {
                for p in &mut result.p_bits[..endpoint_count] {
                    *p = stream.read(1);
                }
            }
        }

        let anchors = result.anchors();
        result.indexes = stream.read_indexes(info.index_bits, &anchors[..subsets]);
        if info.index2_bits > 0 {
            result.indexes2 = stream.read_indexes(info.index2_bits, &[0]);
        }

        Some(result)
    }

    /// Returns the 8-bit endpoints with p-bits applied. Alpha is 255 for
    /// modes without alpha.
    pub fn unquantized_endpoints(&self) -> [[u8; 4]; 6] {
        let info = self.info();
        let mut output = [[0; 4]; 6];
        for (i, out) in output[..info.endpoint_count()].iter_mut().enumerate() {
            let e = self.endpoints[i];
            let p = self.p_bits[i];
            *out = unquantize_endpoint(info, e, p);
        }
        output
    }
}

/// Expands one quantized endpoint to 8 bits per channel.
pub(crate) fn unquantize_endpoint(info: &ModeInfo, e: [u8; 4], p: u8) -> [u8; 4] {
    let with_p = |v: u8| {
        if info.has_p_bits() {
            (v << 1) | (p & 1)
        } else {
            v
        }
    };

    let color_precision = info.color_precision();
    let [r, g, b] = [e[0], e[1], e[2]].map(|v| promote(with_p(v), color_precision));
    let a = if info.has_alpha() {
        promote(with_p(e[3]), info.alpha_precision())
    } else {
        255
    };
    [r, g, b, a]
}

#[inline]
pub(crate) fn promote(mut number: u8, number_bits: u8) -> u8 {
    debug_assert!((4..=8).contains(&number_bits));
    if number_bits == 8 {
        return number;
    }
    number <<= 8 - number_bits;
    number |= number >> number_bits;
    number
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_bits(info: &ModeInfo, mode: u8) -> u32 {
        let endpoints = info.endpoint_count() as u32;
        let p = match info.p_bits {
            PBits::None => 0,
            PBits::Shared => info.subsets as u32,
            PBits::Unique => endpoints,
        };
        let index2 = if info.index2_bits > 0 {
            16 * info.index2_bits as u32 - 1
        } else {
            0
        };
        mode as u32 + 1
            + info.partition_bits as u32
            + info.rotation_bits as u32
            + info.index_selection_bits as u32
            + endpoints * (3 * info.color_bits as u32 + info.alpha_bits as u32)
            + p
            + 16 * info.index_bits as u32
            - info.subsets as u32
            + index2
    }

    #[test]
    fn all_modes_are_128_bits() {
        for (mode, info) in MODES.iter().enumerate() {
            assert_eq!(total_bits(info, mode as u8), 128, "mode {mode}");
        }
    }

    #[test]
    fn pack_unpack() {
        for mode in 0..8_u8 {
            let info = &MODES[mode as usize];
            let color_max = (1 << info.color_bits) - 1;
            let alpha_max = if info.has_alpha() {
                (1_u16 << info.alpha_bits) - 1
            } else {
                0
            } as u8;

            let mut block = Bc7Block {
                mode,
                partition: 13 & ((1 << info.partition_bits) - 1) as u8,
                rotation: if info.rotation_bits > 0 { 2 } else { 0 },
                index_selection: info.index_selection_bits > 0,
                ..Default::default()
            };
            for i in 0..info.endpoint_count() {
                block.endpoints[i] = [
                    (i as u8 * 7 + 1) & color_max,
                    (i as u8 * 3 + 2) & color_max,
                    color_max - i as u8,
                    alpha_max.saturating_sub(i as u8 * 2),
                ];
                block.p_bits[i] = match info.p_bits {
                    PBits::None => 0,
                    PBits::Shared => (i as u8 / 2) & 1,
                    PBits::Unique => i as u8 % 2,
                };
            }
            let anchors = block.anchors();
            let index_max = (1 << info.index_bits) - 1;
            for pixel in 0..16 {
                let mut index = (pixel as u8 * 5 + mode) & index_max;
                if anchors[..info.subsets as usize].contains(&(pixel as u8)) {
                    index >>= 1;
                }
                block.indexes[pixel] = index;
            }
            if info.index2_bits > 0 {
                let index2_max = (1 << info.index2_bits) - 1;
                for pixel in 1..16 {
                    block.indexes2[pixel] = (pixel as u8 * 3) & index2_max;
                }
            }

            let bytes = block.pack();
            assert_eq!(bytes[0].trailing_zeros() as u8, mode);
            assert_eq!(Bc7Block::unpack(bytes), Some(block), "mode {mode}");
        }
    }

    #[test]
    fn reserved_mode() {
        assert_eq!(Bc7Block::unpack([0; 16]), None);
    }

    #[test]
    fn promote_replicates_high_bits() {
        assert_eq!(promote(0b11111, 5), 255);
        assert_eq!(promote(0, 5), 0);
        assert_eq!(promote(0b10000, 5), 0b1000_0100);
        assert_eq!(promote(0b1010101, 7), 0b1010_1011);
        assert_eq!(promote(77, 8), 77);
    }

    #[test]
    fn unquantize_with_p_bits() {
        let mode6 = &MODES[6];
        assert_eq!(unquantize_endpoint(mode6, [127, 0, 64, 127], 1), [255, 1, 129, 255]);
        let mode1 = &MODES[1];
        assert_eq!(unquantize_endpoint(mode1, [63, 0, 0, 0], 1)[0], 255);
        assert_eq!(unquantize_endpoint(mode1, [63, 0, 0, 0], 1)[3], 255);
    }
}
