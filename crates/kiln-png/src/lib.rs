//! A png decoder producing RGBA8 pixels
//!
//! This features a PNG reader in Rust which decodes valid
//! ISO/IEC 15948:2003 (E) images of every color type and bit depth into
//! four 8 bit channels per pixel.
//!
//! # Features
//! - Bounds checked inflate decoder, output is capped by the size the header implies
//! - CRC and Adler-32 verification that can be turned off
//! - Adam7 interlaced images
//! - Strict or lenient handling of ancillary chunks
//!
//! # Usage
//! Add the library to `Cargo.toml`
//!
//! ```toml
//! kiln-png="0.1"
//! ```
//!
//! #### Decode to RGBA8
//!
//! ```no_run
//! use kiln_png::decode;
//! use kiln_png::kiln_core::options::DecoderOptions;
//!
//! let options = DecoderOptions::default().png_set_confirm_crc(false);
//! let pixels = decode(&[], options);
//! ```
//!
//! The output always has `width * height * 4` bytes in R, G, B, A order,
//! rows top to bottom.
//!
//! # Extracting metadata
//!
//! Use a [`PngDecoder`] and [`decode_headers`](PngDecoder::decode_headers) to read
//! the headers before decoding pixels, image metadata is then accessible via
//! [`get_info()`](PngDecoder::get_info)
//!
//!```no_run
//! use kiln_png::PngDecoder;
//! let mut decoder = PngDecoder::new(&[]);
//!
//! decoder.decode_headers().unwrap();
//! let (width, height) = decoder.dimensions().unwrap();
//! let mut pixels = vec![0; decoder.output_buffer_size().unwrap()];
//!
//! decoder.decode_into(&mut pixels).unwrap();
//! ```
//!
//! # Errors
//!
//! Every failure is classified by [`PngDecodeErrors::kind`](error::PngDecodeErrors::kind)
//! as a signature, format, compression or limit error. Nothing is returned
//! for an image that fails to decode.
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::op_ref, clippy::identity_op)]
extern crate alloc;

use alloc::vec::Vec;

pub use chunks::{Chunk, ChunkReader};
pub use crc::calc_crc;
pub use decoder::{AnimationControl, FrameControl, PngDecoder, PngInfo};
pub use enums::{BlendOp, DisposeOp, InterlaceMethod, PngChunkType, PngColor};
pub use kiln_core;
use kiln_core::options::DecoderOptions;

use crate::error::PngDecodeErrors;

mod chunks;
mod constants;
mod crc;
mod decoder;
mod enums;
pub mod error;
mod expand;
mod filters;
mod headers;
mod interlace;

/// Decode a png image into RGBA8 pixels
///
/// The returned buffer is exactly `width * height * 4` bytes long.
/// Each call is independent, the decoder lives only for the duration of the call.
pub fn decode(data: &[u8], options: DecoderOptions) -> Result<Vec<u8>, PngDecodeErrors> {
    PngDecoder::new_with_options(data, options).decode()
}
