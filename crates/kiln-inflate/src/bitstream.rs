//! `BitStreamReader` API
//!
//! This module provides an interface to read bits (and aligned bytes) for
//! huffman decoding.
//!
//! Deflate packs bits starting at the least significant bit of each byte,
//! the reader keeps up to 63 of them in a `u64` buffer.

pub struct BitStreamReader<'src> {
    // buffer from which we are pulling in bits from
    // used in decompression.
    src:       &'src [u8],
    // position in our buffer,
    position:  usize,
    bits_left: u8,
    buffer:    u64,
    // number of zero bytes shifted in after the
    // end of `src` was reached
    over_read: usize
}

impl<'src> BitStreamReader<'src> {
    /// Create a new `BitStreamReader` instance
    pub fn new(in_buffer: &'src [u8]) -> BitStreamReader<'src> {
        BitStreamReader {
            bits_left: 0,
            buffer:    0,
            src:       in_buffer,
            position:  0,
            over_read: 0
        }
    }

    /// Refill the bitstream ensuring the buffer has bits between
    /// 56 and 63.
    ///
    /// Past the end of the input, zero bytes are shifted in and counted,
    /// see [`is_overread`](Self::is_overread)
    #[inline(always)]
    pub fn refill(&mut self) {
        /*
         * The refill always guarantees refills between 56-63
         *
         * Bits stored will never go above 63 and if bits are in the range 56-63 no refills occur.
         */
        let mut buf = [0; 8];

        match self.src.get(self.position..self.position + 8) {
            Some(bytes) => {
                buf.copy_from_slice(bytes);
                // create a u64 from an array of u8's
                let new_buffer = u64::from_le_bytes(buf);
                // num indicates how many bytes we actually consumed.
                let num = 63 ^ self.bits_left;
                // offset position
                self.position += (num >> 3) as usize;
                // shift number of bits
                self.buffer |= new_buffer << self.bits_left;
                // update bits left
                // bits left are now between 56-63
                self.bits_left |= 56;
            }
            None => self.refill_slow()
        }
    }

    #[inline(never)]
    fn refill_slow(&mut self) {
        while self.bits_left < 56 {
            let byte = match self.src.get(self.position) {
                Some(byte) => {
                    self.position += 1;
                    *byte
                }
                None => {
                    self.over_read += 1;
                    0
                }
            };
            self.buffer |= u64::from(byte) << self.bits_left;
            self.bits_left += 8;
        }
    }

    /// Return true if more bits were consumed than the input contains
    ///
    /// Only the padding zeros from [`refill`](Self::refill) can be consumed
    /// past the end, so this is exact to the byte.
    #[inline(always)]
    pub const fn is_overread(&self) -> bool {
        self.over_read * 8 > self.bits_left as usize
    }

    #[inline(always)]
    pub const fn peek_bits<const LOOKAHEAD: usize>(&self) -> usize {
        (self.buffer & ((1 << LOOKAHEAD) - 1)) as usize
    }

    #[inline(always)]
    pub fn get_bits(&mut self, num_bits: u8) -> u64 {
        debug_assert!(self.bits_left >= num_bits);

        let mask = (1_u64 << num_bits) - 1;

        let value = self.buffer & mask;

        self.buffer >>= num_bits;

        self.bits_left -= num_bits;

        value
    }

    /// Return true if the bit buffer can satisfy
    /// `bits` read without refilling,
    pub const fn has(&self, bits: u8) -> bool {
        self.bits_left >= bits
    }

    #[inline(always)]
    pub fn drop_bits(&mut self, bits: u8) {
        debug_assert!(self.bits_left >= bits);
        self.bits_left -= bits;
        self.buffer >>= bits;
    }

    /// Discard the bits up to the next byte boundary and give back
    /// whole bytes held in the bit buffer to the byte stream.
    ///
    /// After this, [`get_position`](Self::get_position) points at the first
    /// byte that has not been consumed.
    ///
    /// Returns false if the stream was already over-read.
    pub fn align_to_byte(&mut self) -> bool {
        self.drop_bits(self.bits_left & 7);

        let buffered = usize::from(self.bits_left >> 3);

        if self.over_read > buffered {
            return false;
        }
        self.position -= buffered - self.over_read;

        self.buffer = 0;
        self.bits_left = 0;
        self.over_read = 0;

        true
    }

    /// Read `len` bytes from a byte aligned position.
    ///
    /// Must only be called after [`align_to_byte`](Self::align_to_byte)
    pub fn read_aligned_bytes(&mut self, len: usize) -> Option<&'src [u8]> {
        debug_assert_eq!(self.bits_left, 0);

        let end = self.position.checked_add(len)?;
        let bytes = self.src.get(self.position..end)?;

        self.position = end;

        Some(bytes)
    }

    /// Get position the stream is in this buffer
    pub const fn get_position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use crate::bitstream::BitStreamReader;

    #[test]
    fn reads_lsb_first() {
        let data = [0b1010_0101, 0xFF];
        let mut stream = BitStreamReader::new(&data);
        stream.refill();

        assert_eq!(stream.get_bits(1), 1);
        assert_eq!(stream.get_bits(2), 0b10);
        assert_eq!(stream.get_bits(5), 0b10100);
        assert_eq!(stream.get_bits(8), 0xFF);
        assert!(!stream.is_overread());

        stream.drop_bits(1);
        assert!(stream.is_overread());
    }

    #[test]
    fn align_gives_back_buffered_bytes() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A];
        let mut stream = BitStreamReader::new(&data);
        stream.refill();
        stream.drop_bits(3);

        assert!(stream.align_to_byte());
        assert_eq!(stream.get_position(), 1);
        assert_eq!(stream.read_aligned_bytes(2), Some(&data[1..3]));
        assert_eq!(stream.get_position(), 3);
        assert_eq!(stream.read_aligned_bytes(8), None);
    }
}
