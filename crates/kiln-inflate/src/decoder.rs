use crate::bitstream::BitStreamReader;
use crate::constants::{
    DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN, DEFLATE_BLOCKTYPE_STATIC, DEFLATE_BLOCKTYPE_UNCOMPRESSED,
    DEFLATE_END_OF_BLOCK, DEFLATE_MAX_CODEWORD_LENGTH, DEFLATE_MAX_DECLARED_LITLEN_SYMS,
    DEFLATE_MAX_DECLARED_OFFSET_SYMS, DEFLATE_NUM_LITLEN_SYMS, DEFLATE_NUM_OFFSET_SYMS,
    DEFLATE_NUM_PRECODE_SYMS, DEFLATE_PRECODE_LENS_PERMUTATION, FAST_TABLE_BITS, LENGTH_BASE,
    LENGTH_EXTRA_BITS, MAX_SEQUENCE_BITS, OFFSET_BASE, OFFSET_EXTRA_BITS
};
use crate::errors::{DecodeErrorStatus, InflateDecodeErrors};
use crate::utils::{copy_rep_matches, make_decode_table_entry, reverse_bits};

/// Options that can influence decompression
/// in Deflate/Zlib
#[derive(Copy, Clone, Debug)]
pub struct DeflateOptions {
    limit:            usize,
    confirm_checksum: bool,
    size_hint:        usize
}

impl Default for DeflateOptions {
    fn default() -> Self {
        DeflateOptions {
            limit:            1 << 30,
            confirm_checksum: true,
            size_hint:        37000
        }
    }
}

impl DeflateOptions {
    /// Get deflate/zlib limit option
    ///
    /// The decoder won't extend the inbuilt limit and will
    /// return an error if the limit is exceeded
    ///
    /// # Note
    /// This is provided as a best effort, correctly quiting
    /// is detrimental to speed and hence this should not be relied too much.
    pub const fn get_limit(&self) -> usize {
        self.limit
    }

    /// Set a limit to the internal vector
    /// used to store decoded zlib/deflate output.
    ///
    /// When the stream would produce more, the first `limit`
    /// bytes are kept in the error's `data` field.
    ///
    /// # Arguments
    /// limit: The new decompressor limit
    /// # Returns
    /// A modified version of DeflateDecoder
    #[must_use]
    pub fn set_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Get whether the decoder will confirm a checksum
    /// after decoding
    pub const fn get_confirm_checksum(&self) -> bool {
        self.confirm_checksum
    }

    /// Set whether the decoder should confirm a checksum
    /// after decoding
    ///
    /// Note, you should definitely confirm your checksum, use
    /// this with caution, otherwise data returned may be corrupt
    #[must_use]
    pub fn set_confirm_checksum(mut self, yes: bool) -> Self {
        self.confirm_checksum = yes;
        self
    }

    /// Get the default size hint for the decompressor
    pub const fn get_size_hint(&self) -> usize {
        self.size_hint
    }

    /// Set the size hint for the decompressor
    ///
    /// This can be used to prevent multiple re-allocations
    /// when the decompressed size is known up front
    #[must_use]
    pub fn set_size_hint(mut self, hint: usize) -> Self {
        self.size_hint = hint;
        self
    }
}

/// A canonical huffman decode table
///
/// Codewords up to `FAST_TABLE_BITS` long resolve with one lookup,
/// longer ones walk the per-length counts.
#[derive(Clone)]
struct DecodeTable {
    fast:    [u16; 1 << FAST_TABLE_BITS],
    counts:  [u16; DEFLATE_MAX_CODEWORD_LENGTH + 1],
    symbols: [u16; DEFLATE_NUM_LITLEN_SYMS]
}

impl Default for DecodeTable {
    fn default() -> Self {
        DecodeTable {
            fast:    [0; 1 << FAST_TABLE_BITS],
            counts:  [0; DEFLATE_MAX_CODEWORD_LENGTH + 1],
            symbols: [0; DEFLATE_NUM_LITLEN_SYMS]
        }
    }
}

/// A deflate decoder instance.
///
/// The decoder manages output buffer as opposed to requiring the caller to provide a pre-allocated buffer
/// it tracks number of bytes written and on successfully reaching the
/// end of the block, will return a vector with exactly
/// the number of decompressed bytes.
///
/// This means that it may use up huge amounts of memory if not checked, but
/// there are [options] that can prevent that
///
/// [options]: DeflateOptions
pub struct DeflateDecoder<'a> {
    data:                &'a [u8],
    position:            usize,
    stream:              BitStreamReader<'a>,
    is_last_block:       bool,
    static_codes_loaded: bool,
    litlen_table:        Box<DecodeTable>,
    offset_table:        Box<DecodeTable>,
    options:             DeflateOptions
}

impl<'a> DeflateDecoder<'a> {
    /// Create a new decompressor that will read compressed
    /// data from `data` and return a new vector containing new data
    ///
    /// # Arguments
    /// - `data`: The compressed data. Data can be of any type
    /// gzip,zlib or raw deflate.
    ///
    /// # Returns
    /// A decoder instance which will pull compressed data from `data` to inflate the output output
    pub fn new(data: &'a [u8]) -> DeflateDecoder<'a> {
        DeflateDecoder::new_with_options(data, DeflateOptions::default())
    }

    /// Create new decoder with specified options
    ///
    /// This can be used to fine tune the decoder to the user's
    /// needs.
    ///
    /// # Arguments
    /// - `data`: The compressed data to decompress
    /// - `options`: Options to influence the decoder
    pub fn new_with_options(data: &'a [u8], options: DeflateOptions) -> DeflateDecoder<'a> {
        DeflateDecoder {
            data,
            position: 0,
            stream: BitStreamReader::new(data),
            is_last_block: false,
            static_codes_loaded: false,
            litlen_table: Box::default(),
            offset_table: Box::default(),
            options
        }
    }

    /// Decode zlib-encoded data returning the uncompressed in a `Vec<u8>`
    /// or an error if something went wrong.
    ///
    /// Bytes following the adler32 trailer are ignored.
    ///
    /// # Returns
    /// - The uncompressed data if successfully decoded
    /// - An error if unsuccessful
    #[cfg(feature = "zlib")]
    pub fn decode_zlib(&mut self) -> Result<Vec<u8>, InflateDecodeErrors> {
        if self.data.len() < 2 {
            return Err(InflateDecodeErrors::new_with_error(
                DecodeErrorStatus::InsufficientData
            ));
        }

        // Zlib flags
        // See https://www.ietf.org/rfc/rfc1950.txt for
        // the RFC
        let cmf = self.data[0];
        let flg = self.data[1];

        let cm = cmf & 0xF;
        let cinfo = cmf >> 4;

        // confirm we have the right deflate methods
        if cm != 8 {
            if cm == 15 {
                return Err(InflateDecodeErrors::new_with_error(DecodeErrorStatus::Generic(
                    "CM of 15 is preserved by the standard,currently don't know how to handle it"
                )));
            }
            return Err(InflateDecodeErrors::new_with_error(
                DecodeErrorStatus::GenericStr(format!("Unknown zlib compression method {cm}"))
            ));
        }
        if cinfo > 7 {
            return Err(InflateDecodeErrors::new_with_error(
                DecodeErrorStatus::GenericStr(format!(
                    "Unknown cinfo `{cinfo}` greater than 7, not allowed"
                ))
            ));
        }
        let flag_checks = (u16::from(cmf) * 256) + u16::from(flg);

        if flag_checks % 31 != 0 {
            return Err(InflateDecodeErrors::new_with_error(DecodeErrorStatus::Generic(
                "FCHECK integrity not preserved"
            )));
        }
        if (flg >> 5) & 1 == 1 {
            return Err(InflateDecodeErrors::new_with_error(DecodeErrorStatus::Generic(
                "Preset dictionaries are not supported"
            )));
        }

        self.position = 2;

        let data = self.decode_deflate()?;

        if self.options.confirm_checksum {
            let trailer = match self.stream.read_aligned_bytes(4) {
                Some(trailer) => trailer,
                None => {
                    return Err(InflateDecodeErrors::new(
                        DecodeErrorStatus::InsufficientData,
                        data
                    ))
                }
            };
            let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
            let mut hasher = simd_adler32::Adler32::new();
            hasher.write(&data);
            let found = hasher.finish();

            if expected != found {
                return Err(InflateDecodeErrors::new(
                    DecodeErrorStatus::MismatchedAdler(expected, found),
                    data
                ));
            }
        }

        Ok(data)
    }

    /// Decode a deflate stream returning the data as `Vec<u8>` or an error
    /// indicating what went wrong.
    ///
    /// On return, the stream is byte aligned right after the last block.
    pub fn decode_deflate(&mut self) -> Result<Vec<u8>, InflateDecodeErrors> {
        let capacity = self.options.size_hint.min(self.options.limit);
        let mut out = Vec::with_capacity(capacity);

        match self.start_deflate_block(&mut out) {
            Ok(()) => Ok(out),
            Err(error) => Err(InflateDecodeErrors::new(error, out))
        }
    }

    fn start_deflate_block(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeErrorStatus> {
        // re-read the stream so that we can remove code read by zlib
        let data = self
            .data
            .get(self.position..)
            .ok_or(DecodeErrorStatus::InsufficientData)?;

        self.stream = BitStreamReader::new(data);
        self.is_last_block = false;
        self.static_codes_loaded = false;

        while !self.is_last_block {
            self.stream.refill();

            if self.stream.is_overread() {
                return Err(DecodeErrorStatus::InsufficientData);
            }

            self.is_last_block = self.stream.get_bits(1) == 1;
            let block_type = self.stream.get_bits(2);

            match block_type {
                DEFLATE_BLOCKTYPE_UNCOMPRESSED => self.copy_stored_block(out)?,
                DEFLATE_BLOCKTYPE_STATIC => {
                    if !self.static_codes_loaded {
                        self.load_static_tables()?;
                    }
                    self.decode_huffman_block(out)?;
                }
                DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN => {
                    self.static_codes_loaded = false;
                    self.read_dynamic_tables()?;
                    self.decode_huffman_block(out)?;
                }
                _ => return Err(DecodeErrorStatus::Generic("Reserved block type 3 encountered"))
            }
        }

        if !self.stream.align_to_byte() {
            return Err(DecodeErrorStatus::InsufficientData);
        }
        self.position += self.stream.get_position();

        Ok(())
    }

    /// Uncompressed block: copy 'len' bytes literally from the input
    /// buffer to the output buffer.
    fn copy_stored_block(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeErrorStatus> {
        /*
         * The RFC says that
         * skip any remaining bits in current partially
         *       processed byte
         *     read LEN and NLEN (see next section)
         *     copy LEN bytes of data to output
         */
        if !self.stream.align_to_byte() {
            return Err(DecodeErrorStatus::InsufficientData);
        }
        let header = self
            .stream
            .read_aligned_bytes(4)
            .ok_or(DecodeErrorStatus::InsufficientData)?;

        let len = u16::from_le_bytes([header[0], header[1]]);
        let nlen = u16::from_le_bytes([header[2], header[3]]);

        if len != !nlen {
            return Err(DecodeErrorStatus::Generic("Len and nlen do not match"));
        }
        let len = usize::from(len);

        let bytes = self
            .stream
            .read_aligned_bytes(len)
            .ok_or(DecodeErrorStatus::InsufficientData)?;

        let limit = self.options.limit;

        if out.len() + len > limit {
            let current = out.len() + len;
            out.extend_from_slice(&bytes[..limit - out.len()]);

            return Err(DecodeErrorStatus::OutputLimitExceeded(limit, current));
        }
        out.extend_from_slice(bytes);

        Ok(())
    }

    fn load_static_tables(&mut self) -> Result<(), DecodeErrorStatus> {
        let mut lens = [0_u8; DEFLATE_NUM_LITLEN_SYMS];

        lens[000..144].fill(8);
        lens[144..256].fill(9);
        lens[256..280].fill(7);
        lens[280..288].fill(8);

        build_decode_table(&lens, &mut self.litlen_table)?;
        build_decode_table(&[5_u8; DEFLATE_NUM_OFFSET_SYMS], &mut self.offset_table)?;

        self.static_codes_loaded = true;

        Ok(())
    }

    /// Read the code length codes and build the literal/length and
    /// offset tables of a dynamic block
    fn read_dynamic_tables(&mut self) -> Result<(), DecodeErrorStatus> {
        // the block header read at most 3 bits after a refill
        let num_litlen_syms = 257 + self.stream.get_bits(5) as usize;
        let num_offset_syms = 1 + self.stream.get_bits(5) as usize;
        let num_explicit_precode_lens = 4 + self.stream.get_bits(4) as usize;

        if num_litlen_syms > DEFLATE_MAX_DECLARED_LITLEN_SYMS
            || num_offset_syms > DEFLATE_MAX_DECLARED_OFFSET_SYMS
        {
            return Err(DecodeErrorStatus::Generic("Too many symbols in dynamic block header"));
        }

        let mut precode_lens = [0; DEFLATE_NUM_PRECODE_SYMS];

        for i in DEFLATE_PRECODE_LENS_PERMUTATION
            .iter()
            .take(num_explicit_precode_lens)
        {
            if !self.stream.has(3) {
                self.stream.refill();
            }
            precode_lens[usize::from(*i)] = self.stream.get_bits(3) as u8;
        }

        let mut precode_table = DecodeTable::default();
        build_decode_table(&precode_lens, &mut precode_table)?;

        /* Decode the litlen and offset codeword lengths. */
        let total = num_litlen_syms + num_offset_syms;
        let mut lens = [0_u8; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS];
        let mut i = 0;

        while i < total {
            // 7 bit precode + 7 extra bits for the longest zero run
            if !self.stream.has(14) {
                self.stream.refill();
            }
            if self.stream.is_overread() {
                return Err(DecodeErrorStatus::InsufficientData);
            }
            let presym = decode_symbol(&mut self.stream, &precode_table)?;

            let (rep_val, rep_count) = match presym {
                0..=15 => {
                    // explicit codeword length
                    lens[i] = presym as u8;
                    i += 1;
                    continue;
                }
                16 => {
                    // repeat previous length three to 6 times
                    if i == 0 {
                        return Err(DecodeErrorStatus::Generic(
                            "Code length repeat with no previous length"
                        ));
                    }
                    (lens[i - 1], 3 + self.stream.get_bits(2) as usize)
                }
                // repeat zero 3-10 times.
                17 => (0, 3 + self.stream.get_bits(3) as usize),
                // repeat zero 11-138 times.
                18 => (0, 11 + self.stream.get_bits(7) as usize),
                _ => return Err(DecodeErrorStatus::CorruptData)
            };

            if i + rep_count > total {
                return Err(DecodeErrorStatus::Generic("Code length repeat overflows header"));
            }
            lens[i..i + rep_count].fill(rep_val);
            i += rep_count;
        }

        if lens[usize::from(DEFLATE_END_OF_BLOCK)] == 0 {
            return Err(DecodeErrorStatus::Generic("Block has no end of block code"));
        }

        build_decode_table(&lens[..num_litlen_syms], &mut self.litlen_table)?;
        build_decode_table(&lens[num_litlen_syms..total], &mut self.offset_table)?;

        Ok(())
    }

    /// Decode literals and matches until the end of block code
    fn decode_huffman_block(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeErrorStatus> {
        let limit = self.options.limit;

        loop {
            if !self.stream.has(MAX_SEQUENCE_BITS) {
                self.stream.refill();
            }
            if self.stream.is_overread() {
                return Err(DecodeErrorStatus::InsufficientData);
            }

            let litlen = decode_symbol(&mut self.stream, &self.litlen_table)?;

            if litlen < DEFLATE_END_OF_BLOCK {
                if out.len() >= limit {
                    return Err(DecodeErrorStatus::OutputLimitExceeded(limit, out.len() + 1));
                }
                out.push(litlen as u8);
                continue;
            }
            if litlen == DEFLATE_END_OF_BLOCK {
                if self.stream.is_overread() {
                    return Err(DecodeErrorStatus::InsufficientData);
                }
                return Ok(());
            }

            let length_sym = usize::from(litlen - 257);

            if length_sym >= LENGTH_BASE.len() {
                return Err(DecodeErrorStatus::CorruptData);
            }
            let length = usize::from(LENGTH_BASE[length_sym])
                + self.stream.get_bits(LENGTH_EXTRA_BITS[length_sym]) as usize;

            let offset_sym = usize::from(decode_symbol(&mut self.stream, &self.offset_table)?);

            if offset_sym >= OFFSET_BASE.len() {
                return Err(DecodeErrorStatus::CorruptData);
            }
            let offset = usize::from(OFFSET_BASE[offset_sym])
                + self.stream.get_bits(OFFSET_EXTRA_BITS[offset_sym]) as usize;

            if offset > out.len() {
                return Err(DecodeErrorStatus::GenericStr(format!(
                    "Match offset {offset} points before the start of the output of {} bytes",
                    out.len()
                )));
            }

            if out.len() + length > limit {
                let current = out.len() + length;
                copy_rep_matches(out, offset, limit - out.len());

                return Err(DecodeErrorStatus::OutputLimitExceeded(limit, current));
            }
            copy_rep_matches(out, offset, length);
        }
    }
}

/// Build the decode table for a canonical huffman code whose
/// codeword lengths are given by `lens`
///
/// An overfull code is nonsensical, so is considered invalid. An incomplete
/// code is valid only when it is empty or holds a single codeword of length 1.
fn build_decode_table(lens: &[u8], table: &mut DecodeTable) -> Result<(), DecodeErrorStatus> {
    let mut offsets = [0_u16; DEFLATE_MAX_CODEWORD_LENGTH + 2];

    table.counts.fill(0);
    table.fast.fill(0);

    // count how many codewords have each length, including 0.
    for len in lens {
        table.counts[usize::from(*len)] += 1;
    }
    table.counts[0] = 0;

    // A codeword of length 'n' uses proportion '1/(2^n)' of the codespace.
    let mut codespace_left: i32 = 1;

    for len in 1..=DEFLATE_MAX_CODEWORD_LENGTH {
        codespace_left = (codespace_left << 1) - i32::from(table.counts[len]);

        if codespace_left < 0 {
            return Err(DecodeErrorStatus::Generic("Overfull huffman code"));
        }
    }

    for len in 1..=DEFLATE_MAX_CODEWORD_LENGTH {
        offsets[len + 1] = offsets[len] + table.counts[len];
    }
    // Sort the symbols primarily by increasing codeword length and
    // secondarily by increasing symbol value
    for (sym, len) in lens.iter().enumerate() {
        if *len != 0 {
            let pos = &mut offsets[usize::from(*len)];
            table.symbols[usize::from(*pos)] = sym as u16;
            *pos += 1;
        }
    }

    if codespace_left > 0 {
        let used: u16 = table.counts.iter().sum();

        if used == 0 {
            // An empty code is allowed. This can happen for the
            // offset code in DEFLATE, since a dynamic Huffman block
            // need not contain any matches. Any lookup fails.
            return Ok(());
        }
        if used == 1 && table.counts[1] == 1 {
            // A single used symbol of length 1, assign both codewords
            // '0' and '1' to it the way zlib does
            let entry = make_decode_table_entry(usize::from(table.symbols[0]), 1);
            table.fast.fill(entry);
            return Ok(());
        }
        return Err(DecodeErrorStatus::Generic("Incomplete huffman code"));
    }

    // Enumerate the codewords in lexicographic order, each codeword
    // no longer than FAST_TABLE_BITS gets 2^(FAST_TABLE_BITS-len) entries
    // spaced 2^len apart since the codewords are bit-reversed.
    let mut codeword = 0_u32;
    let mut index = 0;

    for len in 1..=FAST_TABLE_BITS {
        for _ in 0..table.counts[len] {
            let entry = make_decode_table_entry(usize::from(table.symbols[index]), len as u32);
            let mut j = reverse_bits(codeword, len as u32) as usize;

            while j < table.fast.len() {
                table.fast[j] = entry;
                j += 1 << len;
            }
            codeword += 1;
            index += 1;
        }
        codeword <<= 1;
    }

    Ok(())
}

/// Decode a single symbol, the caller must ensure at least 15 bits are buffered
#[inline(always)]
fn decode_symbol(
    stream: &mut BitStreamReader, table: &DecodeTable
) -> Result<u16, DecodeErrorStatus> {
    let entry = table.fast[stream.peek_bits::<FAST_TABLE_BITS>()];

    if entry != 0 {
        stream.drop_bits((entry & 15) as u8);
        return Ok(entry >> 4);
    }
    decode_symbol_slow(stream, table)
}

#[inline(never)]
fn decode_symbol_slow(
    stream: &mut BitStreamReader, table: &DecodeTable
) -> Result<u16, DecodeErrorStatus> {
    let bits = stream.peek_bits::<DEFLATE_MAX_CODEWORD_LENGTH>();

    let mut code = 0_i32;
    let mut first = 0_i32;
    let mut index = 0_i32;

    for len in 1..=DEFLATE_MAX_CODEWORD_LENGTH {
        code |= ((bits >> (len - 1)) & 1) as i32;

        let count = i32::from(table.counts[len]);

        if code - first < count {
            stream.drop_bits(len as u8);
            return Ok(table.symbols[(index + code - first) as usize]);
        }
        index += count;
        first = (first + count) << 1;
        code <<= 1;
    }
    Err(DecodeErrorStatus::CorruptData)
}

#[cfg(test)]
mod tests {
    use crate::decoder::{build_decode_table, DecodeTable};
    use crate::errors::DecodeErrorStatus;
    use crate::{DeflateDecoder, DeflateOptions};

    #[test]
    fn rejects_overfull_code() {
        let mut table = DecodeTable::default();
        let lens = [1, 1, 1];

        assert_eq!(
            build_decode_table(&lens, &mut table).err(),
            Some(DecodeErrorStatus::Generic("Overfull huffman code"))
        );
    }

    #[test]
    fn accepts_empty_and_single_codes() {
        let mut table = DecodeTable::default();

        assert!(build_decode_table(&[0; 30], &mut table).is_ok());
        assert!(build_decode_table(&[0, 0, 1, 0], &mut table).is_ok());
        // two codes of length 2 leave half the codespace unused
        assert!(build_decode_table(&[2, 2], &mut table).is_err());
    }

    #[test]
    fn stored_block() {
        // final stored block holding "abc"
        let data = [0b001, 3, 0, !3, !0, b'a', b'b', b'c'];
        let mut decoder = DeflateDecoder::new(&data);

        assert_eq!(decoder.decode_deflate().unwrap(), b"abc");
    }

    #[test]
    fn stored_block_respects_limit() {
        let data = [0b001, 3, 0, !3, !0, b'a', b'b', b'c'];
        let options = DeflateOptions::default().set_limit(2);
        let mut decoder = DeflateDecoder::new_with_options(&data, options);

        let err = decoder.decode_deflate().unwrap_err();
        assert_eq!(err.error, DecodeErrorStatus::OutputLimitExceeded(2, 3));
        assert_eq!(err.data, b"ab");
    }

    #[test]
    fn reserved_block_type() {
        let data = [0b111, 0, 0, 0];
        let mut decoder = DeflateDecoder::new(&data);

        assert!(decoder.decode_deflate().is_err());
    }
}
