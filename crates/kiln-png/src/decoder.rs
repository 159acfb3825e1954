use alloc::vec;
use alloc::vec::Vec;

use kiln_core::log::{trace, warn};
use kiln_core::options::DecoderOptions;
use kiln_inflate::{DeflateDecoder, DeflateOptions};

use crate::chunks::ChunkReader;
use crate::enums::{BlendOp, DisposeOp, InterlaceMethod, PngChunkType, PngColor};
use crate::error::PngDecodeErrors;
use crate::expand::{PixelLayout, SampleExpander};
use crate::filters::defilter_rows;
use crate::interlace::{pass_dimensions, raw_image_size, row_bytes, scatter_row};

/// Contents of an `acTL` chunk
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AnimationControl {
    /// Number of frames, the default image included if it is part of the animation
    pub num_frames: u32,
    /// Times to loop the animation, zero means forever
    pub num_plays:  u32
}

/// Contents of an `fcTL` chunk
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameControl {
    pub sequence_number: u32,
    pub width:           usize,
    pub height:          usize,
    pub x_offset:        usize,
    pub y_offset:        usize,
    pub delay_num:       u16,
    pub delay_denom:     u16,
    pub dispose_op:      DisposeOp,
    pub blend_op:        BlendOp
}

/// Image information gathered from the headers
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PngInfo {
    pub width:            usize,
    pub height:           usize,
    /// Bits per sample
    pub depth:            u8,
    pub color:            PngColor,
    /// Samples per pixel in the encoded data
    pub component:        u8,
    pub interlace_method: InterlaceMethod,
    /// Image gamma from `gAMA`
    pub gamma:            Option<f32>,
    /// Present for animated images when animated decoding is enabled
    pub animation:        Option<AnimationControl>,
    /// Frame control of the default image, if it is the first frame of the animation
    pub default_frame:    Option<FrameControl>
}

/// A PNG decoder producing RGBA8 pixels
///
/// Every color type and depth is converted to four 8 bit channels,
/// 16 bit samples keep their high byte and images without alpha are opaque
/// apart from pixels matching their `tRNS` color key.
///
/// A decoder borrows its input and holds no state shared with other decoders,
/// decoding several images concurrently is done with one decoder per image.
pub struct PngDecoder<'a> {
    data:                   &'a [u8],
    pub(crate) options:     DecoderOptions,
    pub(crate) png_info:    PngInfo,
    pub(crate) palette:     Vec<[u8; 4]>,
    pub(crate) trns_key:    Option<[u16; 3]>,
    pub(crate) seen_chunks: u32,
    idat_chunks:            Vec<u8>,
    idat_position:          usize,
    idat_ended:             bool,
    seen_iend:              bool,
    headers_decoded:        bool
}

impl<'a> PngDecoder<'a> {
    /// Create a new decoder with default options
    pub fn new(data: &'a [u8]) -> PngDecoder<'a> {
        PngDecoder::new_with_options(data, DecoderOptions::default())
    }

    /// Create a new decoder with the specified options
    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> PngDecoder<'a> {
        PngDecoder {
            data,
            options,
            png_info: PngInfo::default(),
            palette: Vec::new(),
            trns_key: None,
            seen_chunks: 0,
            idat_chunks: Vec::new(),
            idat_position: 0,
            idat_ended: false,
            seen_iend: false,
            headers_decoded: false
        }
    }

    pub(crate) const fn seen(&self, kind: PngChunkType) -> bool {
        self.seen_chunks & (1 << (kind as u32)) != 0
    }

    /// Read every chunk of the image, validating headers and
    /// collecting the compressed image data
    ///
    /// Called by [`decode`](Self::decode) if needed, call it directly to
    /// inspect [`get_info`](Self::get_info) before decoding pixels.
    pub fn decode_headers(&mut self) -> Result<(), PngDecodeErrors> {
        if self.headers_decoded {
            return Ok(());
        }
        let reader = ChunkReader::new(self.data, &self.options)?;

        for chunk in reader {
            let chunk = chunk?;

            if self.seen(PngChunkType::IDAT) && chunk.chunk_type != PngChunkType::IDAT {
                self.idat_ended = true;
            }
            if let Err(err) = self.check_chunk_order(&chunk) {
                self.handle_chunk_error(&chunk, err)?;
                continue;
            }
            let result = match chunk.chunk_type {
                PngChunkType::IHDR => self.parse_ihdr(&chunk),
                PngChunkType::PLTE => self.parse_plte(&chunk),
                PngChunkType::IDAT => {
                    if self.idat_ended {
                        Err(PngDecodeErrors::GenericStatic("IDAT chunks are not contiguous"))
                    } else {
                        if self.idat_chunks.is_empty() {
                            self.idat_position = chunk.position;
                        }
                        self.idat_chunks.extend_from_slice(chunk.data);
                        Ok(())
                    }
                }
                PngChunkType::tRNS => self.parse_trns(&chunk),
                PngChunkType::gAMA => self.parse_gama(&chunk),
                PngChunkType::acTL => self.parse_actl(&chunk),
                PngChunkType::fcTL => self.parse_fctl(&chunk),
                PngChunkType::IEND => {
                    self.seen_iend = true;
                    Ok(())
                }
                PngChunkType::fdAT | PngChunkType::unkn => {
                    trace!("Skipping {:?} chunk", chunk.chunk_type);
                    Ok(())
                }
                _ => self.check_ancillary(&chunk)
            };
            if let Err(err) = result {
                self.handle_chunk_error(&chunk, err)?;
            }
        }

        if !self.seen(PngChunkType::IHDR) {
            return Err(PngDecodeErrors::GenericStatic("No IHDR chunk, Corrupt PNG"));
        }
        if !self.seen(PngChunkType::IDAT) {
            return Err(PngDecodeErrors::GenericStatic("No IDAT chunks, Corrupt PNG"));
        }
        if self.png_info.color == PngColor::Palette && self.palette.is_empty() {
            return Err(PngDecodeErrors::GenericStatic(
                "Indexed image without a PLTE chunk"
            ));
        }
        if !self.seen_iend {
            if self.options.png_get_strict_ancillary() {
                return Err(PngDecodeErrors::GenericStatic("No IEND chunk, truncated PNG"));
            }
            warn!("No IEND chunk, image may be truncated");
        }
        self.headers_decoded = true;

        Ok(())
    }

    /// Image information, available after the headers are decoded
    pub const fn get_info(&self) -> Option<&PngInfo> {
        if self.headers_decoded {
            Some(&self.png_info)
        } else {
            None
        }
    }

    /// Image width and height, available after the headers are decoded
    pub const fn dimensions(&self) -> Option<(usize, usize)> {
        if self.headers_decoded {
            Some((self.png_info.width, self.png_info.height))
        } else {
            None
        }
    }

    /// Bytes needed to hold the decoded image, `width * height * 4`
    ///
    /// Available after the headers are decoded
    pub fn output_buffer_size(&self) -> Option<usize> {
        let (width, height) = self.dimensions()?;
        width.checked_mul(height)?.checked_mul(4)
    }

    /// Decode the image returning RGBA8 pixels in row major order
    pub fn decode(&mut self) -> Result<Vec<u8>, PngDecodeErrors> {
        self.decode_headers()?;

        let size = self
            .output_buffer_size()
            .ok_or(PngDecodeErrors::GenericStatic("Image dimensions overflow"))?;

        let mut out = vec![0; size];
        self.decode_into(&mut out)?;

        Ok(out)
    }

    /// Decode the image into a caller supplied buffer
    ///
    /// `out` must be at least [`output_buffer_size`](Self::output_buffer_size) bytes,
    /// only that many bytes are written.
    pub fn decode_into(&mut self, out: &mut [u8]) -> Result<(), PngDecodeErrors> {
        self.decode_headers()?;

        let size = self
            .output_buffer_size()
            .ok_or(PngDecodeErrors::GenericStatic("Image dimensions overflow"))?;

        if out.len() < size {
            return Err(PngDecodeErrors::TooSmallOutput(size, out.len()));
        }
        let idat_position = self.idat_position;

        self.decode_pixels(&mut out[..size])
            .map_err(|err| err.in_chunk(*b"IDAT", idat_position))
    }

    fn decode_pixels(&self, out: &mut [u8]) -> Result<(), PngDecodeErrors> {
        let info = &self.png_info;
        let interlaced = info.interlace_method == InterlaceMethod::Adam7;

        let raw_size = raw_image_size(
            info.width,
            info.height,
            info.component,
            info.depth,
            interlaced
        )
        .ok_or(PngDecodeErrors::GenericStatic("Image dimensions overflow"))?;

        let data = self.inflate(raw_size)?;

        if data.len() < raw_size {
            return Err(PngDecodeErrors::ShortData(raw_size, data.len()));
        }
        let layout = PixelLayout::new(info.color, info.depth, self.trns_key)
            .ok_or(PngDecodeErrors::GenericStatic("Unsupported color type and depth"))?;

        let expander = SampleExpander::new(layout, &self.palette);

        // filters operate on whole pixels, or whole bytes below 8 bits per pixel
        let bpp = usize::max(
            1,
            usize::from(info.component) * usize::from(info.depth) / 8
        );
        let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(out);

        let width = info.width;

        if !interlaced {
            let stride = row_bytes(width, info.component, info.depth)
                .ok_or(PngDecodeErrors::GenericStatic("Image dimensions overflow"))?;

            let mut unfiltered = vec![0; stride * info.height];

            defilter_rows(&data, &mut unfiltered, stride, info.height, bpp)?;

            for (row, px_row) in unfiltered
                .chunks_exact(stride)
                .zip(pixels.chunks_exact_mut(width))
            {
                expander.expand_row(row, px_row)?;
            }
            return Ok(());
        }

        let mut unfiltered = Vec::new();
        let mut row_pixels = vec![[0_u8; 4]; width];
        let mut offset = 0;

        for pass in 0..7 {
            let (pass_width, pass_height) = pass_dimensions(width, info.height, pass);

            if pass_width == 0 || pass_height == 0 {
                continue;
            }
            let stride = row_bytes(pass_width, info.component, info.depth)
                .ok_or(PngDecodeErrors::GenericStatic("Image dimensions overflow"))?;

            let pass_len = (stride + 1) * pass_height;
            let pass_data = data
                .get(offset..offset + pass_len)
                .ok_or(PngDecodeErrors::ShortData(offset + pass_len, data.len()))?;

            unfiltered.resize(stride * pass_height, 0);

            defilter_rows(pass_data, &mut unfiltered, stride, pass_height, bpp)?;

            let row_out = &mut row_pixels[..pass_width];

            for (pass_y, row) in unfiltered.chunks_exact(stride).enumerate() {
                expander.expand_row(row, row_out)?;
                scatter_row(pass, pass_y, row_out, pixels, width);
            }
            offset += pass_len;
        }
        Ok(())
    }

    /// Undo deflate encoding of the concatenated IDAT chunks
    ///
    /// Output is capped at `raw_size`, a stream expanding past it is an error.
    fn inflate(&self, raw_size: usize) -> Result<Vec<u8>, PngDecodeErrors> {
        let options = DeflateOptions::default()
            .set_limit(raw_size)
            .set_size_hint(raw_size)
            .set_confirm_checksum(self.options.inflate_get_confirm_adler());

        let mut decoder = DeflateDecoder::new_with_options(&self.idat_chunks, options);

        decoder
            .decode_zlib()
            .map_err(PngDecodeErrors::ZlibDecodeErrors)
    }
}
