//! Decoder options
//!
//! This module exposes a struct for which all kiln decoders
//! get shared options for decoding
//!
//! All supported options are put into one `DecoderOptions` so that the
//! same value can be reused for every decode call.
pub use decoder::{DecoderFlags, DecoderOptions};

mod decoder;
