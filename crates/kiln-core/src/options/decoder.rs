/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Global Decoder options

fn default_flags() -> DecoderFlags {
    DecoderFlags {
        inflate_confirm_adler: true,
        png_confirm_crc:       true,
        png_strict_ancillary:  false,
        png_decode_animated:   false
    }
}

/// Every check enabled
///
/// Confirms CRC and adler, rejects malformed or unknown
/// ancillary chunks.
fn strict_flags() -> DecoderFlags {
    DecoderFlags {
        inflate_confirm_adler: true,
        png_confirm_crc:       true,
        png_strict_ancillary:  true,
        png_decode_animated:   false
    }
}

/// Fast decoder options
///
/// Disables png adler and crc checking and skips
/// anything ancillary that does not parse.
fn fast_flags() -> DecoderFlags {
    DecoderFlags {
        inflate_confirm_adler: false,
        png_confirm_crc:       false,
        png_strict_ancillary:  false,
        png_decode_animated:   false
    }
}

/// Decoder options that are flags
///
/// NOTE: When you extend this, add true or false to
/// all options above that return a `DecoderFlag`
#[derive(Copy, Debug, Clone, Default, Eq, PartialEq)]
pub struct DecoderFlags {
    /// Whether the decoder should confirm and report adler mismatch
    inflate_confirm_adler: bool,
    /// Whether the PNG decoder should confirm crc
    png_confirm_crc:       bool,
    /// Whether the png decoder should reject malformed or unknown
    /// ancillary chunks instead of skipping them
    png_strict_ancillary:  bool,
    /// Whether the png decoder should interpret APNG chunks
    png_decode_animated:   bool
}

/// Decoder options
///
/// Not all options are respected by decoders
/// Each option specifies decoders that respect it
///
/// The struct is small and `Copy`, configure it with the
/// builder style setters and hand it to a decoder.
///
/// # Example
/// ```
/// use kiln_core::options::DecoderOptions;
///
/// let options = DecoderOptions::default()
///     .png_set_confirm_crc(false)
///     .png_set_strict_ancillary(true);
///
/// assert!(!options.png_get_confirm_crc());
/// assert!(options.png_get_strict_ancillary());
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DecoderOptions {
    /// Maximum width for which decoders will
    /// not try to decode images larger than
    /// the specified width.
    ///
    /// - Default value: 16384
    /// - Respected by: `all decoders`
    max_width:  usize,
    /// Maximum height for which decoders will not
    /// try to decode images larger than the
    /// specified height
    ///
    /// - Default value: 16384
    /// - Respected by: `all decoders`
    max_height: usize,
    /// Boolean flags that influence decoding
    flags:      DecoderFlags
}

impl DecoderOptions {
    /// Options with every integrity check enabled and
    /// strict handling of ancillary chunks
    pub fn new_safe() -> DecoderOptions {
        DecoderOptions::default().set_decoder_flags(strict_flags())
    }

    /// Options that skip CRC and adler confirmation
    ///
    /// Useful when comparing speed against decoders that do not
    /// confirm checksums
    pub fn new_fast() -> DecoderOptions {
        DecoderOptions::default().set_decoder_flags(fast_flags())
    }

    /// Get maximum width configured for which the decoder
    /// should not try to decode images greater than this width
    pub const fn get_max_width(&self) -> usize {
        self.max_width
    }

    /// Get maximum height configured for which the decoder should
    /// not try to decode images greater than this height
    pub const fn get_max_height(&self) -> usize {
        self.max_height
    }

    /// Return true if every integrity check is enabled
    /// and ancillary chunks are handled strictly
    pub fn get_strict_mode(&self) -> bool {
        let flags = self.flags;

        flags.png_confirm_crc && flags.inflate_confirm_adler && flags.png_strict_ancillary
    }

    /// Set maximum width for which the decoder should not try
    /// decoding images greater than that width
    pub fn set_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    /// Set maximum height for which the decoder should not try
    /// decoding images greater than that height
    pub fn set_max_height(mut self, height: usize) -> Self {
        self.max_height = height;
        self
    }

    fn set_decoder_flags(mut self, flags: DecoderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set whether the decoder should be in strict mode
    ///
    /// This toggles CRC confirmation, adler confirmation
    /// and strict ancillary chunk handling together
    pub fn set_strict_mode(mut self, yes: bool) -> Self {
        self.flags.png_confirm_crc = yes;
        self.flags.inflate_confirm_adler = yes;
        self.flags.png_strict_ancillary = yes;
        self
    }

    /// Whether the inflate decoder should confirm
    /// adler checksums
    pub const fn inflate_get_confirm_adler(&self) -> bool {
        self.flags.inflate_confirm_adler
    }

    /// Set whether the inflate decoder should confirm
    /// adler checksums
    pub fn inflate_set_confirm_adler(mut self, yes: bool) -> Self {
        self.flags.inflate_confirm_adler = yes;
        self
    }

    /// Whether the png decoder should confirm
    /// CRC 32 checksums
    pub const fn png_get_confirm_crc(&self) -> bool {
        self.flags.png_confirm_crc
    }

    /// Set whether the png decoder should confirm
    /// CRC 32 checksums
    ///
    /// When false, checksums are still read but never compared.
    pub fn png_set_confirm_crc(mut self, yes: bool) -> Self {
        self.flags.png_confirm_crc = yes;
        self
    }

    /// Whether the png decoder rejects malformed or
    /// unknown ancillary chunks
    pub const fn png_get_strict_ancillary(&self) -> bool {
        self.flags.png_strict_ancillary
    }

    /// Set whether the png decoder should reject malformed or
    /// unknown ancillary chunks.
    ///
    /// When false, such chunks are skipped with a warning.
    pub fn png_set_strict_ancillary(mut self, yes: bool) -> Self {
        self.flags.png_strict_ancillary = yes;
        self
    }

    /// Whether the png decoder should interpret
    /// animated png chunks
    pub const fn png_get_decode_animated(&self) -> bool {
        self.flags.png_decode_animated
    }

    /// Set whether the png decoder should interpret animated png chunks.
    ///
    /// When false, `acTL`, `fcTL` and `fdAT` chunks are skipped. When true
    /// their metadata is parsed and validated, the default image is still
    /// the one returned.
    pub fn png_set_decode_animated(mut self, yes: bool) -> Self {
        self.flags.png_decode_animated = yes;
        self
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_width:  1 << 14,
            max_height: 1 << 14,
            flags:      default_flags()
        }
    }
}
