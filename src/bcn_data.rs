//! Partition tables and interpolation weights shared by the BC6H and BC7
//! encoders and decoders.
//!
//! Partition layouts are written as 16 digits (one subset id per pixel, row
//! major). A `-` marks the following pixel as the anchor of its subset. The
//! anchor of subset 0 is always pixel 0 and is not marked.

/// Interpolation weights for 2-bit indexes, out of 64.
pub(crate) const WEIGHTS_2: [u8; 4] = [0, 21, 43, 64];
/// Interpolation weights for 3-bit indexes, out of 64.
pub(crate) const WEIGHTS_3: [u8; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
/// Interpolation weights for 4-bit indexes, out of 64.
pub(crate) const WEIGHTS_4: [u8; 16] = [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

/// Returns the weight table for the given index bit count (2, 3, or 4).
pub(crate) fn weights(index_bits: u8) -> &'static [u8] {
    match index_bits {
        2 => &WEIGHTS_2,
        3 => &WEIGHTS_3,
        _ => &WEIGHTS_4,
    }
}

/// `((64 - w) * e0 + w * e1 + 32) >> 6`
#[inline]
pub(crate) fn interpolate(e0: i32, e1: i32, weight: u8) -> i32 {
    let w = weight as i32;
    ((64 - w) * e0 + w * e1 + 32) >> 6
}

/// A 2-subset partition. The subset id of each pixel is one bit of a u16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Partition2 {
    subsets: u16,
    anchor_1: u8,
}
impl Partition2 {
    pub const fn subset(self, pixel: usize) -> u8 {
        debug_assert!(pixel < 16);
        ((self.subsets >> pixel) & 1) as u8
    }
    /// The anchor pixel of each subset.
    pub const fn anchors(self) -> [u8; 2] {
        [0, self.anchor_1]
    }
}

/// A 3-subset partition. The subset id of each pixel is stored in 2 bits of
/// a u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Partition3 {
    subsets: u32,
    anchor_1: u8,
    anchor_2: u8,
}
impl Partition3 {
    pub const fn subset(self, pixel: usize) -> u8 {
        debug_assert!(pixel < 16);
        ((self.subsets >> (pixel * 2)) & 0b11) as u8
    }
    pub const fn anchors(self) -> [u8; 3] {
        [0, self.anchor_1, self.anchor_2]
    }
}

/// Subset ids of all 16 pixels for the given subset count (1, 2, or 3) and
/// partition id.
pub(crate) fn subset_map(subset_count: u8, partition: u8) -> [u8; 16] {
    let partition = partition as usize & 63;
    match subset_count {
        2 => std::array::from_fn(|i| PARTITION_SET_2[partition].subset(i)),
        3 => std::array::from_fn(|i| PARTITION_SET_3[partition].subset(i)),
        _ => [0; 16],
    }
}
/// The anchor pixel of each subset. Unused entries are 0.
pub(crate) fn anchors(subset_count: u8, partition: u8) -> [u8; 3] {
    let partition = partition as usize & 63;
    match subset_count {
        2 => {
            let [a0, a1] = PARTITION_SET_2[partition].anchors();
            [a0, a1, 0]
        }
        3 => PARTITION_SET_3[partition].anchors(),
        _ => [0; 3],
    }
}

const fn p2(data: [u8; 17]) -> Partition2 {
    let mut subsets: u16 = 0;
    let mut anchor_1 = 0;

    let mut pixel = 0;
    let mut i = 0;
    while i < data.len() {
        let d = data[i];
        i += 1;

        if d == b'-' {
            anchor_1 = pixel;
        } else {
            let d = d - b'0';
            assert!(d <= 1);
            subsets |= (d as u16) << pixel;
            pixel += 1;
        }
    }
    assert!(pixel == 16);
    assert!(anchor_1 != 0);

    let result = Partition2 { subsets, anchor_1 };
    assert!(result.subset(0) == 0);
    assert!(result.subset(anchor_1 as usize) == 1);
    result
}
const fn p3(data: [u8; 18]) -> Partition3 {
    let mut subsets: u32 = 0;
    let mut marked = [0_u8; 2];
    let mut marked_count = 0;

    let mut pixel = 0;
    let mut i = 0;
    while i < data.len() {
        let d = data[i];
        i += 1;

        if d == b'-' {
            marked[marked_count] = pixel;
            marked_count += 1;
        } else {
            let d = (d - b'0') as u32;
            assert!(d <= 2);
            subsets |= d << (pixel * 2);
            pixel += 1;
        }
    }
    assert!(pixel == 16);
    assert!(marked_count == 2);

    // the marks are in pixel order, not subset order
    let first_subset = (subsets >> (marked[0] as u32 * 2)) & 0b11;
    let (anchor_1, anchor_2) = if first_subset == 1 {
        (marked[0], marked[1])
    } else {
        (marked[1], marked[0])
    };

    let result = Partition3 {
        subsets,
        anchor_1,
        anchor_2,
    };
    assert!(result.subset(0) == 0);
    assert!(result.subset(anchor_1 as usize) == 1);
    assert!(result.subset(anchor_2 as usize) == 2);
    result
}

pub(crate) const PARTITION_SET_2: [Partition2; 64] = [
    // 0
    p2(*b"001100110011001-1"),
    p2(*b"000100010001000-1"),
    p2(*b"011101110111011-1"),
    p2(*b"000100110011011-1"),
    p2(*b"000000010001001-1"),
    p2(*b"001101110111111-1"),
    p2(*b"000100110111111-1"),
    p2(*b"000000010011011-1"),
    p2(*b"000000000001001-1"),
    p2(*b"001101111111111-1"),
    p2(*b"000000010111111-1"),
    p2(*b"000000000001011-1"),
    p2(*b"000101111111111-1"),
    p2(*b"000000001111111-1"),
    p2(*b"000011111111111-1"),
    p2(*b"000000000000111-1"),
    // 16
    p2(*b"000010001110111-1"),
    p2(*b"01-11000100000000"),
    p2(*b"00000000-10001110"),
    p2(*b"01-11001100010000"),
    p2(*b"00-11000100000000"),
    p2(*b"00001000-11001110"),
    p2(*b"00000000-10001100"),
    p2(*b"011100110011000-1"),
    p2(*b"00-11000100010000"),
    p2(*b"00001000-10001100"),
    p2(*b"01-10011001100110"),
    p2(*b"00-11011001101100"),
    p2(*b"00010111-11101000"),
    p2(*b"00001111-11110000"),
    p2(*b"01-11000110001110"),
    p2(*b"00-11100110011100"),
    // 32
    p2(*b"010101010101010-1"),
    p2(*b"000011110000111-1"),
    p2(*b"010110-1001011010"),
    p2(*b"00110011-11001100"),
    p2(*b"00-11110000111100"),
    p2(*b"01010101-10101010"),
    p2(*b"011010010110100-1"),
    p2(*b"010110101010010-1"),
    p2(*b"01-11001111001110"),
    p2(*b"00010011-11001000"),
    p2(*b"00-11001001001100"),
    p2(*b"00-11101111011100"),
    p2(*b"01-10100110010110"),
    p2(*b"001111001100001-1"),
    p2(*b"011001101001100-1"),
    p2(*b"000001-1001100000"),
    // 48
    p2(*b"010011-1001000000"),
    p2(*b"00-10011100100000"),
    p2(*b"000000-1001110010"),
    p2(*b"00000100-11100100"),
    p2(*b"011011001001001-1"),
    p2(*b"001101101100100-1"),
    p2(*b"01-10001110011100"),
    p2(*b"00-11100111000110"),
    p2(*b"011011001100100-1"),
    p2(*b"011000110011100-1"),
    p2(*b"011111101000000-1"),
    p2(*b"000110001110011-1"),
    p2(*b"000011110011001-1"),
    p2(*b"00-11001111110000"),
    p2(*b"00-10001011101110"),
    p2(*b"010001000111011-1"),
];
pub(crate) const PARTITION_SET_3: [Partition3; 64] = [
    // 0
    p3(*b"001-100110221222-2"),
    p3(*b"000-10011-22112221"),
    p3(*b"00002001-2211221-1"),
    p3(*b"022-200220011011-1"),
    p3(*b"00000000-1122112-2"),
    p3(*b"001-100110022002-2"),
    p3(*b"002-200221111111-1"),
    p3(*b"00110011-2211221-1"),
    p3(*b"00000000-1111222-2"),
    p3(*b"00001111-1111222-2"),
    p3(*b"000011-112222222-2"),
    p3(*b"001200-120012001-2"),
    p3(*b"011201-120112011-2"),
    p3(*b"01220-1220122012-2"),
    p3(*b"001-101121122122-2"),
    p3(*b"001-12001-22002220"),
    // 16
    p3(*b"000-100110112112-2"),
    p3(*b"011-10011-20012200"),
    p3(*b"00001122-1122112-2"),
    p3(*b"002-200220022111-1"),
    p3(*b"011-101110222022-2"),
    p3(*b"000-10001-22212221"),
    p3(*b"000000-110122012-2"),
    p3(*b"00001100-22-102210"),
    p3(*b"012-20-12200110000"),
    p3(*b"00120012-1122222-2"),
    p3(*b"011012-21-12210110"),
    p3(*b"000001-1012-211221"),
    p3(*b"00221102-1102002-2"),
    p3(*b"01100-1102002222-2"),
    p3(*b"0011012201-22001-1"),
    p3(*b"00002000-2211222-1"),
    // 32
    p3(*b"00000002-1122122-2"),
    p3(*b"022-200220012001-1"),
    p3(*b"001-100120022022-2"),
    p3(*b"01200-12001-200120"),
    p3(*b"000011-1122-220000"),
    p3(*b"01201201-20-120120"),
    p3(*b"01202012-1-2010120"),
    p3(*b"0011220011-22001-1"),
    p3(*b"001111-222200001-1"),
    p3(*b"010-101012222222-2"),
    p3(*b"00000000-2121212-1"),
    p3(*b"00221-1220022112-2"),
    p3(*b"002-200110022001-1"),
    p3(*b"022012-210220122-1"),
    p3(*b"010122-222222010-1"),
    p3(*b"00002121-2121212-1"),
    // 48
    p3(*b"010-101010101222-2"),
    p3(*b"022-201110222011-1"),
    p3(*b"00021-1120002111-2"),
    p3(*b"00002-1122112211-2"),
    p3(*b"02220-1110111022-2"),
    p3(*b"00021112-1112000-2"),
    p3(*b"01100-1100110222-2"),
    p3(*b"0000000021-12211-2"),
    p3(*b"01100-1102222222-2"),
    p3(*b"0022001100-11002-2"),
    p3(*b"00221122-1122002-2"),
    p3(*b"0000000000002-11-2"),
    p3(*b"000-200010002000-1"),
    p3(*b"022212220222-122-2"),
    p3(*b"010-122222222222-2"),
    p3(*b"011-12011-22012220"),
];
