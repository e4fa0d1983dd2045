//! BC6H mode table and block layout.
//!
//! https://microsoft.github.io/DirectX-Specs/d3d/archive/D3D11_3_FunctionalSpec.htm#19.5.13%20BC6H%20/%20DXGI_FORMAT_BC6H
//!
//! Endpoint bits are scattered all over the block in an order that is
//! different for every mode. Each mode has a list of [`Field`]s that describes
//! where which endpoint bits are stored. The same list is used for reading
//! and writing.

use super::bits::{BitReader, BitWriter};
use crate::bcn_data::PARTITION_SET_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Bc6Mode {
    // 2 subsets, 3-bit indexes
    M10_555,
    M7_666,
    M11_544,
    M11_454,
    M11_445,
    M9_555,
    M8_655,
    M8_565,
    M8_556,
    M6_666,
    // 1 subset, 4-bit indexes
    M10_10,
    M11_9,
    M12_8,
    M16_4,
}
impl Bc6Mode {
    pub const ALL: [Self; 14] = [
        Self::M10_555,
        Self::M7_666,
        Self::M11_544,
        Self::M11_454,
        Self::M11_445,
        Self::M9_555,
        Self::M8_655,
        Self::M8_565,
        Self::M8_556,
        Self::M6_666,
        Self::M10_10,
        Self::M11_9,
        Self::M12_8,
        Self::M16_4,
    ];

    /// The mode value and its length in bits.
    const fn mode_bits(self) -> (u8, u8) {
        match self {
            Self::M10_555 => (0b00, 2),
            Self::M7_666 => (0b01, 2),
            Self::M11_544 => (0b00010, 5),
            Self::M11_454 => (0b00110, 5),
            Self::M11_445 => (0b01010, 5),
            Self::M9_555 => (0b01110, 5),
            Self::M8_655 => (0b10010, 5),
            Self::M8_565 => (0b10110, 5),
            Self::M8_556 => (0b11010, 5),
            Self::M6_666 => (0b11110, 5),
            Self::M10_10 => (0b00011, 5),
            Self::M11_9 => (0b00111, 5),
            Self::M12_8 => (0b01011, 5),
            Self::M16_4 => (0b01111, 5),
        }
    }
    /// Returns `None` for the 4 reserved mode values.
    fn read(stream: &mut BitReader) -> Option<Self> {
        let low2 = stream.read(2);
        match low2 {
            0b00 => Some(Self::M10_555),
            0b01 => Some(Self::M7_666),
            _ => {
                let bits = (stream.read(3) << 2) | low2;
                Self::ALL.into_iter().find(|m| m.mode_bits() == (bits, 5))
            }
        }
    }

    pub const fn subsets(self) -> u8 {
        match self {
            Self::M10_10 | Self::M11_9 | Self::M12_8 | Self::M16_4 => 1,
            _ => 2,
        }
    }
    pub const fn index_bits(self) -> u8 {
        if self.subsets() == 1 {
            4
        } else {
            3
        }
    }

    /// The number of bits of the first endpoint. This is also the precision
    /// of all endpoints after the delta transform.
    pub const fn endpoint_bits(self) -> u8 {
        match self {
            Self::M10_555 | Self::M10_10 => 10,
            Self::M7_666 => 7,
            Self::M11_544 | Self::M11_454 | Self::M11_445 | Self::M11_9 => 11,
            Self::M9_555 => 9,
            Self::M8_655 | Self::M8_565 | Self::M8_556 => 8,
            Self::M6_666 => 6,
            Self::M12_8 => 12,
            Self::M16_4 => 16,
        }
    }
    /// The number of bits per channel of all other endpoints.
    pub const fn delta_bits(self) -> [u8; 3] {
        match self {
            Self::M10_555 | Self::M9_555 => [5, 5, 5],
            Self::M7_666 | Self::M6_666 => [6, 6, 6],
            Self::M11_544 => [5, 4, 4],
            Self::M11_454 => [4, 5, 4],
            Self::M11_445 => [4, 4, 5],
            Self::M8_655 => [6, 5, 5],
            Self::M8_565 => [5, 6, 5],
            Self::M8_556 => [5, 5, 6],
            Self::M10_10 => [10, 10, 10],
            Self::M11_9 => [9, 9, 9],
            Self::M12_8 => [8, 8, 8],
            Self::M16_4 => [4, 4, 4],
        }
    }
    /// Whether all endpoints except the first are stored as deltas to the
    /// first endpoint.
    pub const fn is_transformed(self) -> bool {
        !matches!(self, Self::M6_666 | Self::M10_10)
    }

    fn fields(self) -> &'static [Field] {
        match self {
            Self::M10_555 => FIELDS_10_555,
            Self::M7_666 => FIELDS_7_666,
            Self::M11_544 => FIELDS_11_544,
            Self::M11_454 => FIELDS_11_454,
            Self::M11_445 => FIELDS_11_445,
            Self::M9_555 => FIELDS_9_555,
            Self::M8_655 => FIELDS_8_655,
            Self::M8_565 => FIELDS_8_565,
            Self::M8_556 => FIELDS_8_556,
            Self::M6_666 => FIELDS_6_666,
            Self::M10_10 => FIELDS_10_10,
            Self::M11_9 => FIELDS_11_9,
            Self::M12_8 => FIELDS_12_8,
            Self::M16_4 => FIELDS_16_4,
        }
    }
}

/// The fields of a BC6H block.
///
/// Endpoints are the raw stored bits, in the order `w, x, y, z`. `w` and `x`
/// are the endpoints of subset 0, `y` and `z` those of subset 1. Depending on
/// the mode, `x`, `y`, and `z` may be deltas to `w` and are not sign
/// extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bc6Block {
    pub mode: Bc6Mode,
    pub partition: u8,
    pub endpoints: [[u16; 3]; 4],
    pub indexes: [u8; 16],
}
impl Bc6Block {
    pub fn anchors(&self) -> [u8; 2] {
        if self.mode.subsets() == 1 {
            [0, 0]
        } else {
            PARTITION_SET_2[self.partition as usize & 31].anchors()
        }
    }
    pub fn subset_map(&self) -> [u8; 16] {
        if self.mode.subsets() == 1 {
            [0; 16]
        } else {
            let partition = PARTITION_SET_2[self.partition as usize & 31];
            std::array::from_fn(|i| partition.subset(i))
        }
    }

    pub fn pack(&self) -> [u8; 16] {
        let mut stream = BitWriter::new();

        let (mode, mode_len) = self.mode.mode_bits();
        stream.write(mode as u64, mode_len);

        for field in self.mode.fields() {
            let value = self.endpoints[field.endpoint as usize][field.channel as usize];
            let bits = (value >> field.shift) & ((1 << field.len) - 1);
            if field.reversed {
                stream.write_rev(bits as u8, field.len);
            } else {
                stream.write(bits as u64, field.len);
            }
        }

        let subsets = self.mode.subsets() as usize;
        if subsets == 2 {
            stream.write(self.partition as u64, 5);
        }
        let anchors = self.anchors();
        stream.write_indexes(&self.indexes, self.mode.index_bits(), &anchors[..subsets]);

        stream.finish()
    }

    /// Returns `None` if the block uses one of the reserved modes.
    pub fn unpack(block: [u8; 16]) -> Option<Self> {
        let mut stream = BitReader::new(block);
        let mode = Bc6Mode::read(&mut stream)?;

        let mut endpoints = [[0_u16; 3]; 4];
        for field in mode.fields() {
            let bits = if field.reversed {
                stream.read_rev(field.len) as u16
            } else {
                stream.read_u32(field.len) as u16
            };
            endpoints[field.endpoint as usize][field.channel as usize] |= bits << field.shift;
        }

        let subsets = mode.subsets() as usize;
        let partition = if subsets == 2 { stream.read(5) } else { 0 };

        let mut result = Self {
            mode,
            partition,
            endpoints,
            indexes: [0; 16],
        };
        let anchors = result.anchors();
        result.indexes = stream.read_indexes(mode.index_bits(), &anchors[..subsets]);
        Some(result)
    }
}

/// A run of endpoint bits in the block: `len` bits of one channel of one
/// endpoint, starting at bit `shift` of the value.
#[derive(Debug, Clone, Copy)]
struct Field {
    endpoint: u8,
    channel: u8,
    shift: u8,
    len: u8,
    /// The bits are stored with the most significant bit first.
    reversed: bool,
}

const W: u8 = 0;
const X: u8 = 1;
const Y: u8 = 2;
const Z: u8 = 3;
const R: u8 = 0;
const G: u8 = 1;
const B: u8 = 2;

/// Bit `index` of a channel.
const fn bit(channel: u8, endpoint: u8, index: u8) -> Field {
    Field {
        endpoint,
        channel,
        shift: index,
        len: 1,
        reversed: false,
    }
}
/// Bits `high..=0` of a channel.
const fn range(channel: u8, endpoint: u8, high: u8) -> Field {
    Field {
        endpoint,
        channel,
        shift: 0,
        len: high + 1,
        reversed: false,
    }
}
/// Bits `10..10 + len` of a channel, most significant bit first.
const fn ext_rev(channel: u8, endpoint: u8, len: u8) -> Field {
    Field {
        endpoint,
        channel,
        shift: 10,
        len,
        reversed: true,
    }
}

const FIELDS_10_555: &[Field] = &[
    bit(G, Y, 4),
    bit(B, Y, 4),
    bit(B, Z, 4),
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 4),
    bit(G, Z, 4),
    range(G, Y, 3),
    range(G, X, 4),
    bit(B, Z, 0),
    range(G, Z, 3),
    range(B, X, 4),
    bit(B, Z, 1),
    range(B, Y, 3),
    range(R, Y, 4),
    bit(B, Z, 2),
    range(R, Z, 4),
    bit(B, Z, 3),
];

const FIELDS_7_666: &[Field] = &[
    bit(G, Y, 5),
    bit(G, Z, 4),
    bit(G, Z, 5),
    range(R, W, 6),
    bit(B, Z, 0),
    bit(B, Z, 1),
    bit(B, Y, 4),
    range(G, W, 6),
    bit(B, Y, 5),
    bit(B, Z, 2),
    bit(G, Y, 4),
    range(B, W, 6),
    bit(B, Z, 3),
    bit(B, Z, 5),
    bit(B, Z, 4),
    range(R, X, 5),
    range(G, Y, 3),
    range(G, X, 5),
    range(G, Z, 3),
    range(B, X, 5),
    range(B, Y, 3),
    range(R, Y, 5),
    range(R, Z, 5),
];

const FIELDS_11_544: &[Field] = &[
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 4),
    bit(R, W, 10),
    range(G, Y, 3),
    range(G, X, 3),
    bit(G, W, 10),
    bit(B, Z, 0),
    range(G, Z, 3),
    range(B, X, 3),
    bit(B, W, 10),
    bit(B, Z, 1),
    range(B, Y, 3),
    range(R, Y, 4),
    bit(B, Z, 2),
    range(R, Z, 4),
    bit(B, Z, 3),
];

const FIELDS_11_454: &[Field] = &[
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 3),
    bit(R, W, 10),
    bit(G, Z, 4),
    range(G, Y, 3),
    range(G, X, 4),
    bit(G, W, 10),
    range(G, Z, 3),
    range(B, X, 3),
    bit(B, W, 10),
    bit(B, Z, 1),
    range(B, Y, 3),
    range(R, Y, 3),
    bit(B, Z, 0),
    bit(B, Z, 2),
    range(R, Z, 3),
    bit(G, Y, 4),
    bit(B, Z, 3),
];

const FIELDS_11_445: &[Field] = &[
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 3),
    bit(R, W, 10),
    bit(B, Y, 4),
    range(G, Y, 3),
    range(G, X, 3),
    bit(G, W, 10),
    bit(B, Z, 0),
    range(G, Z, 3),
    range(B, X, 4),
    bit(B, W, 10),
    range(B, Y, 3),
    range(R, Y, 3),
    bit(B, Z, 1),
    bit(B, Z, 2),
    range(R, Z, 3),
    bit(B, Z, 4),
    bit(B, Z, 3),
];

const FIELDS_9_555: &[Field] = &[
    range(R, W, 8),
    bit(B, Y, 4),
    range(G, W, 8),
    bit(G, Y, 4),
    range(B, W, 8),
    bit(B, Z, 4),
    range(R, X, 4),
    bit(G, Z, 4),
    range(G, Y, 3),
    range(G, X, 4),
    bit(B, Z, 0),
    range(G, Z, 3),
    range(B, X, 4),
    bit(B, Z, 1),
    range(B, Y, 3),
    range(R, Y, 4),
    bit(B, Z, 2),
    range(R, Z, 4),
    bit(B, Z, 3),
];

const FIELDS_8_655: &[Field] = &[
    range(R, W, 7),
    bit(G, Z, 4),
    bit(B, Y, 4),
    range(G, W, 7),
    bit(B, Z, 2),
    bit(G, Y, 4),
    range(B, W, 7),
    bit(B, Z, 3),
    bit(B, Z, 4),
    range(R, X, 5),
    range(G, Y, 3),
    range(G, X, 4),
    bit(B, Z, 0),
    range(G, Z, 3),
    range(B, X, 4),
    bit(B, Z, 1),
    range(B, Y, 3),
    range(R, Y, 5),
    range(R, Z, 5),
];

const FIELDS_8_565: &[Field] = &[
    range(R, W, 7),
    bit(B, Z, 0),
    bit(B, Y, 4),
    range(G, W, 7),
    bit(G, Y, 5),
    bit(G, Y, 4),
    range(B, W, 7),
    bit(G, Z, 5),
    bit(B, Z, 4),
    range(R, X, 4),
    bit(G, Z, 4),
    range(G, Y, 3),
    range(G, X, 5),
    range(G, Z, 3),
    range(B, X, 4),
    bit(B, Z, 1),
    range(B, Y, 3),
    range(R, Y, 4),
    bit(B, Z, 2),
    range(R, Z, 4),
    bit(B, Z, 3),
];

const FIELDS_8_556: &[Field] = &[
    range(R, W, 7),
    bit(B, Z, 1),
    bit(B, Y, 4),
    range(G, W, 7),
    bit(B, Y, 5),
    bit(G, Y, 4),
    range(B, W, 7),
    bit(B, Z, 5),
    bit(B, Z, 4),
    range(R, X, 4),
    bit(G, Z, 4),
    range(G, Y, 3),
    range(G, X, 4),
    bit(B, Z, 0),
    range(G, Z, 3),
    range(B, X, 5),
    range(B, Y, 3),
    range(R, Y, 4),
    bit(B, Z, 2),
    range(R, Z, 4),
    bit(B, Z, 3),
];

const FIELDS_6_666: &[Field] = &[
    range(R, W, 5),
    bit(G, Z, 4),
    bit(B, Z, 0),
    bit(B, Z, 1),
    bit(B, Y, 4),
    range(G, W, 5),
    bit(G, Y, 5),
    bit(B, Y, 5),
    bit(B, Z, 2),
    bit(G, Y, 4),
    range(B, W, 5),
    bit(G, Z, 5),
    bit(B, Z, 3),
    bit(B, Z, 5),
    bit(B, Z, 4),
    range(R, X, 5),
    range(G, Y, 3),
    range(G, X, 5),
    range(G, Z, 3),
    range(B, X, 5),
    range(B, Y, 3),
    range(R, Y, 5),
    range(R, Z, 5),
];

const FIELDS_10_10: &[Field] = &[
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 9),
    range(G, X, 9),
    range(B, X, 9),
];
const FIELDS_11_9: &[Field] = &[
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 8),
    bit(R, W, 10),
    range(G, X, 8),
    bit(G, W, 10),
    range(B, X, 8),
    bit(B, W, 10),
];
const FIELDS_12_8: &[Field] = &[
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 7),
    ext_rev(R, W, 2),
    range(G, X, 7),
    ext_rev(G, W, 2),
    range(B, X, 7),
    ext_rev(B, W, 2),
];
const FIELDS_16_4: &[Field] = &[
    range(R, W, 9),
    range(G, W, 9),
    range(B, W, 9),
    range(R, X, 3),
    ext_rev(R, W, 6),
    range(G, X, 3),
    ext_rev(G, W, 6),
    range(B, X, 3),
    ext_rev(B, W, 6),
];
