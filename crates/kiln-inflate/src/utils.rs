/// make_decode_table_entry() creates a fast table entry for the given symbol
/// by packing the symbol into the upper bits and the codeword length into the
/// lower four bits.
///
/// A zero entry is never produced since every codeword has a length of at least one,
/// zero therefore marks a slot the fast table cannot resolve.
#[inline(always)]
pub(crate) const fn make_decode_table_entry(sym: usize, len: u32) -> u16 {
    ((sym as u16) << 4) | (len as u16)
}

/// Reverse the lower `len` bits of `code`
///
/// Huffman codewords are stored most significant bit first while
/// the bit reader hands out the least significant bit first.
#[inline(always)]
pub(crate) const fn reverse_bits(code: u32, len: u32) -> u32 {
    code.reverse_bits() >> (32 - len)
}

/// Copy a match of `length` bytes starting `offset` bytes back from the end of `dest`
#[inline(always)]
pub(crate) fn copy_rep_matches(dest: &mut Vec<u8>, offset: usize, length: usize) {
    // REP MATCHES (LITERAL + REP MATCH).
    //
    // As in most LZ77-based compressors, the length can be larger than the offset,
    // yielding a form of run-length encoding (RLE). For instance,
    // "xababab" could be encoded as
    //
    //   <literal: "xab"> <copy: offset=2 length=4>
    //
    // When the ranges don't overlap a single slice copy does it, otherwise
    // the source grows by one byte after every byte copied.
    let start = dest.len() - offset;

    if offset >= length {
        dest.extend_from_within(start..start + length);
        return;
    }
    for i in 0..length {
        let byte = dest[start + i];
        dest.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::{copy_rep_matches, reverse_bits};

    #[test]
    fn overlapping_match_repeats() {
        let mut data = b"xab".to_vec();
        copy_rep_matches(&mut data, 2, 4);
        assert_eq!(&data, b"xababab");
    }

    #[test]
    fn disjoint_match_copies() {
        let mut data = b"hello ".to_vec();
        copy_rep_matches(&mut data, 6, 5);
        assert_eq!(&data, b"hello hello");
    }

    #[test]
    fn reverses_codewords() {
        assert_eq!(reverse_bits(0b110, 3), 0b011);
        assert_eq!(reverse_bits(0b1, 1), 0b1);
        assert_eq!(reverse_bits(0b0010011, 7), 0b1100100);
    }
}
