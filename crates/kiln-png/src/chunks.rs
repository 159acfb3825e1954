//! Splitting a png stream into chunks
use alloc::format;

use kiln_core::bytestream::ZByteReader;
use kiln_core::log::{trace, warn};
use kiln_core::options::DecoderOptions;

use crate::constants::{PNG_MAX_U31, PNG_SIGNATURE};
use crate::crc::crc32_slice8;
use crate::enums::{is_ancillary, PngChunkType};
use crate::error::PngDecodeErrors;

/// A single chunk record
#[derive(Copy, Clone, Debug)]
pub struct Chunk<'a> {
    pub length:     usize,
    pub chunk_type: PngChunkType,
    pub tag:        [u8; 4],
    pub data:       &'a [u8],
    pub crc:        u32,
    /// Offset of the chunk's length field from the start of the stream
    pub position:   usize
}

/// A lazy iterator over the chunks of a png stream
///
/// The signature is checked on construction and the first record must be `IHDR`.
/// Iteration stops after `IEND`, at a clean end of input, or after the first error.
///
/// Unknown ancillary chunks, and animation chunks when animated decoding is off,
/// are skipped here and never reach the caller.
pub struct ChunkReader<'a> {
    stream:          ZByteReader<'a>,
    confirm_crc:     bool,
    strict:          bool,
    decode_animated: bool,
    seen_header:     bool,
    done:            bool
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8], options: &DecoderOptions) -> Result<ChunkReader<'a>, PngDecodeErrors> {
        let mut stream = ZByteReader::new(data);

        match stream.read_fixed_bytes_or_error::<8>() {
            Ok(signature) if signature == PNG_SIGNATURE => (),
            _ => return Err(PngDecodeErrors::BadSignature)
        }

        Ok(ChunkReader {
            stream,
            confirm_crc: options.png_get_confirm_crc(),
            strict: options.png_get_strict_ancillary(),
            decode_animated: options.png_get_decode_animated(),
            seen_header: false,
            done: false
        })
    }

    /// Current offset into the stream
    pub const fn position(&self) -> usize {
        self.stream.position()
    }

    /// Read the next chunk, returning `None` for chunks that should be skipped
    fn read_chunk(&mut self) -> Result<Option<Chunk<'a>>, PngDecodeErrors> {
        let position = self.stream.position();

        if !self.stream.has(8) {
            return Err(PngDecodeErrors::Generic(format!(
                "Truncated chunk header at offset {position}, {} bytes left",
                self.stream.remaining()
            )));
        }
        let length = self.stream.get_u32_be_err()? as usize;
        let tag = self.stream.read_fixed_bytes_or_error::<4>()?;

        if !tag.iter().all(u8::is_ascii_alphabetic) {
            return Err(
                PngDecodeErrors::GenericStatic("Chunk tag is not four ASCII letters")
                    .in_chunk(tag, position)
            );
        }
        if length > PNG_MAX_U31 {
            return Err(
                PngDecodeErrors::Generic(format!("Chunk length {length} larger than 2^31-1"))
                    .in_chunk(tag, position)
            );
        }
        if !self.stream.has(length + 4 /*crc*/) {
            return Err(PngDecodeErrors::Generic(format!(
                "Not enough bytes for chunk, bytes requested are {}, but bytes present are {}",
                length + 4,
                self.stream.remaining()
            ))
            .in_chunk(tag, position));
        }
        let data = self.stream.get(length)?;
        let crc = self.stream.get_u32_be_err()?;

        if self.confirm_crc {
            // crc covers the tag and the data
            let calc_crc = !crc32_slice8(data, crc32_slice8(&tag, u32::MAX));

            if crc != calc_crc {
                return Err(PngDecodeErrors::BadCrc(crc, calc_crc).in_chunk(tag, position));
            }
        }
        let chunk_type = PngChunkType::from_tag(tag);

        if !self.seen_header {
            // checked before anything can be skipped
            if chunk_type != PngChunkType::IHDR {
                return Err(PngDecodeErrors::GenericStatic("First chunk not IHDR, Corrupt PNG")
                    .in_chunk(tag, position));
            }
            self.seen_header = true;
        }
        if chunk_type == PngChunkType::unkn {
            if !is_ancillary(tag) || self.strict {
                return Err(PngDecodeErrors::UnknownChunk(tag).in_chunk(tag, position));
            }
            warn!(
                "Skipping unknown ancillary chunk {:?}",
                core::str::from_utf8(&tag).unwrap_or("XXXX")
            );
            return Ok(None);
        }
        if chunk_type.is_animation_chunk() && !self.decode_animated {
            trace!("Skipping animation chunk {:?}", chunk_type);
            return Ok(None);
        }
        trace!("Chunk {:?}, length {} at offset {}", chunk_type, length, position);

        Ok(Some(Chunk {
            length,
            chunk_type,
            tag,
            data,
            crc,
            position
        }))
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>, PngDecodeErrors>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.stream.eof() {
                self.done = true;
                return None;
            }
            match self.read_chunk() {
                Ok(Some(chunk)) => {
                    // anything after IEND is ignored
                    if chunk.chunk_type == PngChunkType::IEND {
                        self.done = true;

                        if !self.stream.eof() {
                            warn!("{} trailing bytes after IEND", self.stream.remaining());
                        }
                    }
                    return Some(Ok(chunk));
                }
                Ok(None) => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl core::iter::FusedIterator for ChunkReader<'_> {}

#[cfg(test)]
mod tests {
    use kiln_core::options::DecoderOptions;

    use crate::chunks::ChunkReader;
    use crate::constants::PNG_SIGNATURE;
    use crate::crc::calc_crc;
    use crate::enums::PngChunkType;
    use crate::error::{ErrorKind, PngDecodeErrors};

    fn chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(data);

        let mut crc_data = tag.to_vec();
        crc_data.extend_from_slice(data);
        out.extend_from_slice(&calc_crc(&crc_data).to_be_bytes());
        out
    }

    fn stream(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        for c in chunks {
            out.extend_from_slice(c);
        }
        out
    }

    #[test]
    fn bad_signature() {
        let options = DecoderOptions::default();
        let err = ChunkReader::new(b"\x89PNG\r\n\x1a\x0b", &options).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Signature);

        let err = ChunkReader::new(b"\x89PN", &options).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Signature);
    }

    #[test]
    fn stops_at_iend() {
        let data = stream(&[
            chunk(b"IHDR", &[0; 13]),
            chunk(b"IEND", &[]),
            chunk(b"JUNK", &[1, 2])
        ]);
        let options = DecoderOptions::default();
        let types: Vec<PngChunkType> = ChunkReader::new(&data, &options)
            .unwrap()
            .map(|c| c.unwrap().chunk_type)
            .collect();

        assert_eq!(types, [PngChunkType::IHDR, PngChunkType::IEND]);
    }

    #[test]
    fn crc_mismatch_depends_on_options() {
        let mut bad = chunk(b"tEXt", b"Title\0kiln");
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        let data = stream(&[chunk(b"IHDR", &[0; 13]), bad, chunk(b"IEND", &[])]);

        let options = DecoderOptions::default().png_set_confirm_crc(true);
        let err = ChunkReader::new(&data, &options)
            .unwrap()
            .nth(1)
            .unwrap()
            .unwrap_err();

        assert!(matches!(
            err,
            PngDecodeErrors::ChunkContext { chunk, position: 33, .. } if &chunk == b"tEXt"
        ));
        assert_eq!(err.kind(), ErrorKind::Format);

        let options = DecoderOptions::default().png_set_confirm_crc(false);
        assert_eq!(
            ChunkReader::new(&data, &options).unwrap().filter(Result::is_ok).count(),
            3
        );
    }

    #[test]
    fn unknown_chunks() {
        let ihdr = chunk(b"IHDR", &[0; 13]);
        let data = stream(&[ihdr.clone(), chunk(b"prVt", &[1]), chunk(b"IEND", &[])]);

        let lenient = DecoderOptions::default().png_set_strict_ancillary(false);
        let chunks: Vec<_> = ChunkReader::new(&data, &lenient).unwrap().collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(Result::is_ok));

        let strict = DecoderOptions::default().png_set_strict_ancillary(true);
        let second = ChunkReader::new(&data, &strict).unwrap().nth(1).unwrap();
        assert!(matches!(second, Err(e) if e.chunk() == Some(*b"prVt")));

        // critical chunks are never skipped
        let data = stream(&[ihdr, chunk(b"CRIT", &[1]), chunk(b"IEND", &[])]);
        let second = ChunkReader::new(&data, &lenient).unwrap().nth(1).unwrap();
        assert!(second.is_err());
    }

    #[test]
    fn animation_chunks_skipped_unless_enabled() {
        let data = stream(&[
            chunk(b"IHDR", &[0; 13]),
            chunk(b"acTL", &[0, 0, 0, 1, 0, 0, 0, 0]),
            chunk(b"IEND", &[])
        ]);

        let options = DecoderOptions::new_safe();
        assert_eq!(ChunkReader::new(&data, &options).unwrap().count(), 2);

        let options = options.png_set_decode_animated(true);
        let second = ChunkReader::new(&data, &options).unwrap().nth(1).unwrap();
        assert_eq!(second.unwrap().chunk_type, PngChunkType::acTL);
    }

    #[test]
    fn truncated_and_malformed_records() {
        let options = DecoderOptions::default();

        let mut data = stream(&[chunk(b"IHDR", &[0; 13])]);
        data.truncate(data.len() - 6);
        let mut reader = ChunkReader::new(&data, &options).unwrap();
        assert!(reader.next().unwrap().is_err());
        // fused after an error
        assert!(reader.next().is_none());

        let data = stream(&[chunk(b"ID@T", &[])]);
        assert!(ChunkReader::new(&data, &options)
            .unwrap()
            .next()
            .unwrap()
            .is_err());

        // clean end of input simply ends iteration
        let data = stream(&[]);
        assert!(ChunkReader::new(&data, &options).unwrap().next().is_none());
    }

    #[test]
    fn header_must_come_first() {
        let ihdr = chunk(b"IHDR", &[0; 13]);
        let iend = chunk(b"IEND", &[]);
        let options = DecoderOptions::default();

        // chunks that would otherwise be skipped still count as the first record
        for first in [chunk(b"prVt", &[1]), chunk(b"acTL", &[0; 8]), chunk(b"IEND", &[])] {
            let data = stream(&[first, ihdr.clone(), iend.clone()]);
            let mut reader = ChunkReader::new(&data, &options).unwrap();

            let err = reader.next().unwrap().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format);
            assert_eq!(err.position(), Some(8));
            assert!(reader.next().is_none());
        }
    }
}
