use alloc::format;

use kiln_core::bytestream::ZByteReader;
use kiln_core::log::{info, trace, warn};

use crate::chunks::Chunk;
use crate::constants::PNG_MAX_U31;
use crate::decoder::{AnimationControl, FrameControl, PngDecoder};
use crate::enums::{is_ancillary, BlendOp, DisposeOp, InterlaceMethod, PngChunkType, PngColor};
use crate::error::PngDecodeErrors;

impl<'a> PngDecoder<'a> {
    /// Decide what to do with an error raised while handling `chunk`
    ///
    /// Errors in critical chunks are always returned. Errors in ancillary chunks are
    /// returned in strict mode, otherwise they are logged and the chunk is dropped.
    pub(crate) fn handle_chunk_error(
        &self, chunk: &Chunk, err: PngDecodeErrors
    ) -> Result<(), PngDecodeErrors> {
        if !is_ancillary(chunk.tag) || self.options.png_get_strict_ancillary() {
            return Err(err.in_chunk(chunk.tag, chunk.position));
        }
        warn!(
            "Ignoring malformed {:?} chunk at offset {}: {:?}",
            chunk.chunk_type, chunk.position, err
        );
        Ok(())
    }

    /// Check ordering and multiplicity rules that do not depend on chunk contents
    pub(crate) fn check_chunk_order(&mut self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        let kind = chunk.chunk_type;

        let result = if kind.is_unique() && self.seen(kind) {
            Err(PngDecodeErrors::Generic(format!("Multiple {kind:?} chunks")))
        } else if kind.should_appear_before_idat() && self.seen(PngChunkType::IDAT) {
            Err(PngDecodeErrors::Generic(format!(
                "{kind:?} chunk must appear before IDAT"
            )))
        } else if kind.should_appear_before_plte() && self.seen(PngChunkType::PLTE) {
            Err(PngDecodeErrors::Generic(format!(
                "{kind:?} chunk must appear before PLTE"
            )))
        } else {
            Ok(())
        };
        self.seen_chunks |= 1 << (kind as u32);

        result
    }

    pub(crate) fn parse_ihdr(&mut self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        if chunk.length != 13 {
            return Err(PngDecodeErrors::GenericStatic("BAD IHDR length"));
        }
        let mut stream = ZByteReader::new(chunk.data);

        let width = stream.get_u32_be_err()? as usize;
        let height = stream.get_u32_be_err()? as usize;

        if width == 0 || height == 0 {
            return Err(PngDecodeErrors::GenericStatic("Width or height cannot be zero"));
        }
        if width > PNG_MAX_U31 || height > PNG_MAX_U31 {
            return Err(PngDecodeErrors::GenericStatic(
                "Width or height larger than 2^31-1"
            ));
        }
        if width > self.options.get_max_width() {
            return Err(PngDecodeErrors::LimitExceeded(
                "width",
                width,
                self.options.get_max_width()
            ));
        }
        if height > self.options.get_max_height() {
            return Err(PngDecodeErrors::LimitExceeded(
                "height",
                height,
                self.options.get_max_height()
            ));
        }
        // the output must be allocatable before anything is allocated
        let max_size = isize::MAX as usize;

        match width.checked_mul(height).and_then(|x| x.checked_mul(4)) {
            Some(size) if size <= max_size => (),
            _ => {
                return Err(PngDecodeErrors::LimitExceeded(
                    "size",
                    width.saturating_mul(height).saturating_mul(4),
                    max_size
                ));
            }
        }

        let depth = stream.get_u8_err()?;
        let color_int = stream.get_u8_err()?;

        let color = PngColor::from_int(color_int)
            .ok_or_else(|| PngDecodeErrors::Generic(format!("Unknown color value {color_int}")))?;

        if !color.allows_depth(depth) {
            return Err(PngDecodeErrors::Generic(format!(
                "Bit depth {depth} is not allowed for color type {color:?}"
            )));
        }
        if stream.get_u8_err()? != 0 {
            return Err(PngDecodeErrors::GenericStatic("Unknown compression method"));
        }
        let filter_method = stream.get_u8_err()?;

        if filter_method != 0 {
            return Err(PngDecodeErrors::Generic(format!(
                "Unknown filter method {filter_method}"
            )));
        }
        let interlace_method = stream.get_u8_err()?;

        let interlace_method = InterlaceMethod::from_int(interlace_method).ok_or_else(|| {
            PngDecodeErrors::Generic(format!("Unknown interlace method {interlace_method}"))
        })?;

        self.png_info.width = width;
        self.png_info.height = height;
        self.png_info.depth = depth;
        self.png_info.color = color;
        self.png_info.component = color.num_components();
        self.png_info.interlace_method = interlace_method;

        info!("Width: {}", width);
        info!("Height: {}", height);
        info!("Color type: {:?}", color);
        info!("Depth: {:?}", depth);
        info!("Interlace: {:?}", interlace_method);

        Ok(())
    }

    pub(crate) fn parse_plte(&mut self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        match self.png_info.color {
            PngColor::Luma | PngColor::LumaA => {
                return Err(PngDecodeErrors::GenericStatic(
                    "PLTE chunk is not allowed for grayscale images"
                ));
            }
            _ => ()
        }
        if chunk.length % 3 != 0 || chunk.length == 0 {
            return Err(PngDecodeErrors::Generic(format!(
                "Invalid PLTE length {}",
                chunk.length
            )));
        }
        let entries = chunk.length / 3;

        if entries > 256 {
            return Err(PngDecodeErrors::Generic(format!(
                "PLTE has {entries} entries, more than 256"
            )));
        }
        if self.png_info.color == PngColor::Palette && entries > 1 << self.png_info.depth {
            return Err(PngDecodeErrors::Generic(format!(
                "PLTE has {entries} entries, more than a {} bit image can index",
                self.png_info.depth
            )));
        }
        if self.png_info.color != PngColor::Palette {
            // a suggested palette for truecolor images, only kept to size hIST
            trace!("Suggested palette of {} entries", entries);
        }

        self.palette.clear();
        self.palette
            .extend(chunk.data.chunks_exact(3).map(|c| [c[0], c[1], c[2], 255]));

        Ok(())
    }

    pub(crate) fn parse_trns(&mut self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        let mut stream = ZByteReader::new(chunk.data);

        match self.png_info.color {
            PngColor::Luma => {
                if chunk.length != 2 {
                    return Err(PngDecodeErrors::GenericStatic(
                        "tRNS chunk for grayscale images must be 2 bytes"
                    ));
                }
                let gray = stream.get_u16_be_err()?;
                self.trns_key = Some([gray, gray, gray]);
            }
            PngColor::RGB => {
                if chunk.length != 6 {
                    return Err(PngDecodeErrors::GenericStatic(
                        "tRNS chunk for truecolor images must be 6 bytes"
                    ));
                }
                let red = stream.get_u16_be_err()?;
                let green = stream.get_u16_be_err()?;
                let blue = stream.get_u16_be_err()?;

                self.trns_key = Some([red, green, blue]);
            }
            PngColor::Palette => {
                if !self.seen(PngChunkType::PLTE) {
                    return Err(PngDecodeErrors::GenericStatic("tRNS chunk before PLTE"));
                }
                if chunk.length > self.palette.len() {
                    return Err(PngDecodeErrors::Generic(format!(
                        "tRNS has {} entries, but the palette has {}",
                        chunk.length,
                        self.palette.len()
                    )));
                }
                // entries past the end of tRNS stay opaque
                for (entry, alpha) in self.palette.iter_mut().zip(chunk.data) {
                    entry[3] = *alpha;
                }
            }
            PngColor::LumaA | PngColor::RGBA => {
                return Err(PngDecodeErrors::GenericStatic(
                    "tRNS chunk is not allowed for images with an alpha channel"
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn parse_gama(&mut self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        if chunk.length != 4 {
            return Err(PngDecodeErrors::GenericStatic("gAMA chunk must be 4 bytes"));
        }
        let gamma = ZByteReader::new(chunk.data).get_u32_be_err()?;

        if gamma == 0 {
            return Err(PngDecodeErrors::GenericStatic("gAMA value cannot be zero"));
        }
        self.png_info.gamma = Some(gamma as f32 / 100_000.0);

        Ok(())
    }

    pub(crate) fn parse_actl(&mut self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        if chunk.length != 8 {
            return Err(PngDecodeErrors::GenericStatic("acTL chunk must be 8 bytes"));
        }
        let mut stream = ZByteReader::new(chunk.data);

        let num_frames = stream.get_u32_be_err()?;
        let num_plays = stream.get_u32_be_err()?;

        if num_frames == 0 {
            return Err(PngDecodeErrors::GenericStatic("acTL declares zero frames"));
        }
        info!("Animated image, {} frames, {} plays", num_frames, num_plays);

        self.png_info.animation = Some(AnimationControl {
            num_frames,
            num_plays
        });
        Ok(())
    }

    pub(crate) fn parse_fctl(&mut self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        if chunk.length != 26 {
            return Err(PngDecodeErrors::GenericStatic("fcTL chunk must be 26 bytes"));
        }
        let mut stream = ZByteReader::new(chunk.data);

        let sequence_number = stream.get_u32_be_err()?;
        let width = stream.get_u32_be_err()? as usize;
        let height = stream.get_u32_be_err()? as usize;
        let x_offset = stream.get_u32_be_err()? as usize;
        let y_offset = stream.get_u32_be_err()? as usize;
        let delay_num = stream.get_u16_be_err()?;
        let delay_denom = stream.get_u16_be_err()?;
        let dispose_op = stream.get_u8_err()?;
        let blend_op = stream.get_u8_err()?;

        let dispose_op = DisposeOp::from_int(dispose_op)
            .ok_or_else(|| PngDecodeErrors::Generic(format!("Unknown dispose op {dispose_op}")))?;
        let blend_op = BlendOp::from_int(blend_op)
            .ok_or_else(|| PngDecodeErrors::Generic(format!("Unknown blend op {blend_op}")))?;

        if width == 0 || height == 0 {
            return Err(PngDecodeErrors::GenericStatic("fcTL frame cannot be empty"));
        }
        let fits_x = x_offset.checked_add(width).map_or(false, |x| x <= self.png_info.width);
        let fits_y = y_offset.checked_add(height).map_or(false, |y| y <= self.png_info.height);

        if !fits_x || !fits_y {
            return Err(PngDecodeErrors::GenericStatic(
                "fcTL frame extends outside the image"
            ));
        }
        let frame = FrameControl {
            sequence_number,
            width,
            height,
            x_offset,
            y_offset,
            delay_num,
            delay_denom,
            dispose_op,
            blend_op
        };

        if !self.seen(PngChunkType::IDAT) {
            // this frame is the default image
            if x_offset != 0 || y_offset != 0 {
                return Err(PngDecodeErrors::GenericStatic(
                    "fcTL for the default image must cover the whole image"
                ));
            }
            if width != self.png_info.width || height != self.png_info.height {
                return Err(PngDecodeErrors::GenericStatic(
                    "fcTL for the default image must match IHDR dimensions"
                ));
            }
            self.png_info.default_frame = Some(frame);
        } else {
            trace!("Frame {:?} is not part of the default image", frame);
        }
        Ok(())
    }

    /// Validate the shape of ancillary chunks whose contents the decoder does not use
    ///
    /// Nothing is stored, the chunk is only checked so strict mode can reject it.
    pub(crate) fn check_ancillary(&self, chunk: &Chunk) -> Result<(), PngDecodeErrors> {
        let data = chunk.data;
        let color = self.png_info.color;

        match chunk.chunk_type {
            PngChunkType::cHRM => expect_length(chunk, 32),
            PngChunkType::pHYs => {
                expect_length(chunk, 9)?;
                if data[8] > 1 {
                    return Err(PngDecodeErrors::Generic(format!(
                        "Unknown pHYs unit {}",
                        data[8]
                    )));
                }
                Ok(())
            }
            PngChunkType::sRGB => {
                expect_length(chunk, 1)?;
                if data[0] > 3 {
                    return Err(PngDecodeErrors::Generic(format!(
                        "Unknown sRGB rendering intent {}",
                        data[0]
                    )));
                }
                Ok(())
            }
            PngChunkType::tIME => {
                expect_length(chunk, 7)?;
                // year, month, day, hour, minute, second
                let [_, _, month, day, hour, minute, second] = data else {
                    return Err(PngDecodeErrors::GenericStatic("BAD tIME length"));
                };
                if !(1..=12).contains(month)
                    || !(1..=31).contains(day)
                    || *hour > 23
                    || *minute > 59
                    || *second > 60
                {
                    return Err(PngDecodeErrors::GenericStatic("tIME holds an invalid date"));
                }
                Ok(())
            }
            PngChunkType::bKGD => match color {
                PngColor::Palette => {
                    expect_length(chunk, 1)?;
                    if !self.seen(PngChunkType::PLTE) {
                        return Err(PngDecodeErrors::GenericStatic("bKGD chunk before PLTE"));
                    }
                    if usize::from(data[0]) >= self.palette.len() {
                        return Err(PngDecodeErrors::PaletteIndexOutOfRange(
                            data[0],
                            self.palette.len()
                        ));
                    }
                    Ok(())
                }
                PngColor::Luma | PngColor::LumaA => expect_length(chunk, 2),
                PngColor::RGB | PngColor::RGBA => expect_length(chunk, 6)
            },
            PngChunkType::sBIT => {
                let expected = match color {
                    PngColor::Palette => 3,
                    _ => usize::from(color.num_components())
                };
                expect_length(chunk, expected)?;

                let sample_depth = match color {
                    PngColor::Palette => 8,
                    _ => self.png_info.depth
                };
                if data.iter().any(|&bits| bits == 0 || bits > sample_depth) {
                    return Err(PngDecodeErrors::Generic(format!(
                        "sBIT values must be between 1 and {sample_depth}"
                    )));
                }
                Ok(())
            }
            PngChunkType::hIST => {
                if !self.seen(PngChunkType::PLTE) {
                    return Err(PngDecodeErrors::GenericStatic("hIST chunk before PLTE"));
                }
                expect_length(chunk, self.palette.len() * 2)
            }
            PngChunkType::tEXt => keyword_length(data).map(|_| ()),
            PngChunkType::zTXt | PngChunkType::iCCP => {
                let keyword = keyword_length(data)?;

                match data.get(keyword + 1) {
                    Some(0) => Ok(()),
                    _ => Err(PngDecodeErrors::Generic(format!(
                        "{:?} chunk has an unknown compression method",
                        chunk.chunk_type
                    )))
                }
            }
            PngChunkType::iTXt => {
                let keyword = keyword_length(data)?;

                match data.get(keyword + 1..keyword + 3) {
                    Some([0 | 1, 0]) => (),
                    _ => {
                        return Err(PngDecodeErrors::GenericStatic(
                            "iTXt chunk has an unknown compression flag or method"
                        ))
                    }
                }
                // language tag and translated keyword, each null terminated
                let nulls = data[keyword + 3..].iter().filter(|&&b| b == 0).count();

                if nulls < 2 {
                    return Err(PngDecodeErrors::GenericStatic(
                        "iTXt chunk is missing its language tag or translated keyword"
                    ));
                }
                Ok(())
            }
            PngChunkType::sPLT => {
                let keyword = keyword_length(data)?;

                let entry_size = match data.get(keyword + 1) {
                    Some(8) => 6,
                    Some(16) => 10,
                    _ => {
                        return Err(PngDecodeErrors::GenericStatic(
                            "sPLT sample depth must be 8 or 16"
                        ))
                    }
                };
                if (data.len() - keyword - 2) % entry_size != 0 {
                    return Err(PngDecodeErrors::GenericStatic(
                        "sPLT length is not a whole number of entries"
                    ));
                }
                Ok(())
            }
            PngChunkType::eXIf => {
                if data.starts_with(b"MM\0*") || data.starts_with(b"II*\0") {
                    Ok(())
                } else {
                    Err(PngDecodeErrors::GenericStatic(
                        "eXIf chunk does not start with a TIFF header"
                    ))
                }
            }
            _ => {
                trace!("Skipping {:?} chunk", chunk.chunk_type);
                Ok(())
            }
        }
    }
}

fn expect_length(chunk: &Chunk, length: usize) -> Result<(), PngDecodeErrors> {
    if chunk.length != length {
        return Err(PngDecodeErrors::Generic(format!(
            "{:?} chunk must be {length} bytes, found {}",
            chunk.chunk_type, chunk.length
        )));
    }
    Ok(())
}

/// Length of the null terminated keyword starting text like chunks
fn keyword_length(data: &[u8]) -> Result<usize, PngDecodeErrors> {
    match data.iter().take(80).position(|&b| b == 0) {
        Some(length @ 1..=79) => Ok(length),
        _ => Err(PngDecodeErrors::GenericStatic(
            "Keyword must be 1 to 79 bytes followed by a null byte"
        ))
    }
}
