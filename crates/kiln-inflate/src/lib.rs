//! A bounds checked deflate decoder.
//!
//! This crate features a deflate/zlib decoder whose output is capped
//! by a caller provided limit, every read of the input and every write
//! of the output is bounds checked so malformed streams end in an error.
//!
//! Use it if
//! - The decompressed size is known up front and anything beyond it is an error
//! - You want a 100% safe, pure rust implementation.
//!
//! # Usage
//!
//! Decoding deflate data
//!
//! ```no_run
//! use kiln_inflate::DeflateDecoder;
//! let totally_valid_data = [0;23];
//! let mut decoder = DeflateDecoder::new(&totally_valid_data);
//!
//! let decompressed = decoder.decode_deflate();
//! ```
//!
//! Decoding zlib data
//! ```no_run
//! use kiln_inflate::DeflateDecoder;
//! let totally_valid_data = [0;23];
//! let mut decoder = DeflateDecoder::new(&totally_valid_data);
//!
//! let decompressed = decoder.decode_zlib();
//! ```
//!
//! Decoding zlib data without confirming the adler32 checksum
//! and with an upper bound on the output size
//! ```no_run
//! use kiln_inflate::DeflateDecoder;
//! use kiln_inflate::DeflateOptions;
//! let totally_valid_data = [0;23];
//! let options = DeflateOptions::default()
//!                     .set_confirm_checksum(false)
//!                     .set_limit(1024);
//! let mut decoder = DeflateDecoder::new_with_options(&totally_valid_data, options);
//!
//! let decompressed = decoder.decode_zlib();
//! ```
pub use crate::decoder::{DeflateDecoder, DeflateOptions};

mod bitstream;
mod constants;
mod decoder;
pub mod errors;
mod utils;
