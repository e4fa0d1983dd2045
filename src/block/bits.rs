//! Little-endian bit streams over 128-bit blocks.
//!
//! Bit 0 of a block is the least significant bit of its first byte. Fields are
//! read and written starting at bit 0.

pub(crate) struct BitReader {
    state: u128,
}
impl BitReader {
    pub fn new(block: [u8; 16]) -> Self {
        Self {
            state: u128::from_le_bytes(block),
        }
    }

    pub fn low_u8(&self) -> u8 {
        self.state as u8
    }

    #[inline(always)]
    pub fn skip(&mut self, n: u8) {
        self.state >>= n;
    }

    #[inline]
    pub fn read(&mut self, count: u8) -> u8 {
        debug_assert!(count <= 8);
        let mask = (1_u16 << count).wrapping_sub(1) as u8;
        let bits = self.state as u8 & mask;
        self.skip(count);
        bits
    }
    #[inline]
    pub fn read_u32(&mut self, count: u8) -> u32 {
        debug_assert!(count <= 31);
        let mask = (1_u32 << count).wrapping_sub(1);
        let bits = self.state as u32 & mask;
        self.skip(count);
        bits
    }
    /// Reads `count` bits where the first bit in the stream is the most
    /// significant bit of the result.
    #[inline]
    pub fn read_rev(&mut self, count: u8) -> u8 {
        debug_assert!(count <= 8);
        let bits = self.read(count);
        if count >= 2 {
            bits.reverse_bits() >> (8 - count)
        } else {
            bits
        }
    }

    /// Reads 16 indexes of `bits` bits each. The index of each anchor pixel
    /// is stored with one bit less since its most significant bit is
    /// implicitly 0.
    pub fn read_indexes(&mut self, bits: u8, anchors: &[u8]) -> [u8; 16] {
        let mut indexes = [0; 16];
        for (pixel, index) in indexes.iter_mut().enumerate() {
            let count = if anchors.contains(&(pixel as u8)) {
                bits - 1
            } else {
                bits
            };
            *index = self.read(count);
        }
        indexes
    }
}

pub(crate) struct BitWriter {
    data: u128,
    bits: u8,
}
impl BitWriter {
    pub fn new() -> Self {
        Self { data: 0, bits: 0 }
    }

    #[inline(always)]
    pub fn write(&mut self, value: u64, bits: u8) {
        debug_assert!(bits <= 64);
        debug_assert!(bits == 64 || value < (1 << bits));
        debug_assert!(self.bits as u32 + bits as u32 <= 128);

        if bits > 0 {
            self.data |= (value as u128) << self.bits;
            self.bits += bits;
        }
    }
    /// The inverse of [`BitReader::read_rev`].
    pub fn write_rev(&mut self, value: u8, bits: u8) {
        debug_assert!(bits <= 8);
        let value = if bits >= 2 {
            value.reverse_bits() >> (8 - bits)
        } else {
            value
        };
        self.write(value as u64, bits);
    }

    /// The inverse of [`BitReader::read_indexes`].
    ///
    /// The most significant bit of every anchor index must be 0.
    pub fn write_indexes(&mut self, indexes: &[u8; 16], bits: u8, anchors: &[u8]) {
        for (pixel, &index) in indexes.iter().enumerate() {
            let count = if anchors.contains(&(pixel as u8)) {
                debug_assert!(index < (1 << (bits - 1)), "anchor index MSB is set");
                bits - 1
            } else {
                bits
            };
            self.write(index as u64, count);
        }
    }

    pub fn finish(self) -> [u8; 16] {
        debug_assert!(self.bits == 128);
        self.data.to_le_bytes()
    }
}
