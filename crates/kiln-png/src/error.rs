//! Errors possible during png decoding
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt::{Debug, Display, Formatter};

use kiln_core::bytestream::ZByteIoError;
use kiln_inflate::errors::InflateDecodeErrors;

/// Broad classification of a decoding failure
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The input does not start with the png signature
    Signature,
    /// A structural violation in the container or the pixel data
    Format,
    /// The compressed image data is malformed or has the wrong length
    Compression,
    /// Dimensions or buffers exceed what the caller allowed
    Limit
}

/// Errors possible during decoding
///
/// Use [`kind`](PngDecodeErrors::kind) to classify an error and
/// [`position`](PngDecodeErrors::position) to find where in the stream it happened.
pub enum PngDecodeErrors {
    /// Image signature is not a valid png signature
    BadSignature,
    /// A format error with a static reason
    GenericStatic(&'static str),
    /// A format error with a reason built at runtime
    Generic(String),
    /// Stored and calculated crc do not match, expected, found
    BadCrc(u32, u32),
    /// A critical chunk we do not know how to handle, or an
    /// unknown ancillary chunk while in strict mode
    UnknownChunk([u8; 4]),
    /// Filter byte of a scanline is not one of the five filters,
    /// filter byte, row
    UnknownFilter(u8, usize),
    /// A palette index past the end of the palette,
    /// index, palette length
    PaletteIndexOutOfRange(u8, usize),
    /// Problems arising from zlib decoding
    ZlibDecodeErrors(InflateDecodeErrors),
    /// Decompressed image data is shorter than the header implies,
    /// expected, found
    ShortData(usize, usize),
    /// Image dimensions exceed the configured ceiling,
    /// dimension name, value, maximum
    LimitExceeded(&'static str, usize, usize),
    /// The caller supplied buffer is too small,
    /// expected, found
    TooSmallOutput(usize, usize),
    /// An error raised while handling a specific chunk
    ChunkContext {
        chunk:    [u8; 4],
        position: usize,
        error:    Box<PngDecodeErrors>
    }
}

impl PngDecodeErrors {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadSignature => ErrorKind::Signature,
            Self::ZlibDecodeErrors(_) | Self::ShortData(_, _) => ErrorKind::Compression,
            Self::LimitExceeded(_, _, _) | Self::TooSmallOutput(_, _) => ErrorKind::Limit,
            Self::ChunkContext { error, .. } => error.kind(),
            _ => ErrorKind::Format
        }
    }

    /// Byte offset in the input of the chunk where the error happened, if known
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::ChunkContext { position, .. } => Some(*position),
            _ => None
        }
    }

    /// Tag of the chunk where the error happened, if known
    pub fn chunk(&self) -> Option<[u8; 4]> {
        match self {
            Self::ChunkContext { chunk, .. } => Some(*chunk),
            Self::UnknownChunk(chunk) => Some(*chunk),
            _ => None
        }
    }

    /// Attach the chunk tag and its offset to an error
    pub(crate) fn in_chunk(self, chunk: [u8; 4], position: usize) -> PngDecodeErrors {
        match self {
            // keep the innermost context
            Self::ChunkContext { .. } => self,
            error => Self::ChunkContext {
                chunk,
                position,
                error: Box::new(error)
            }
        }
    }
}

impl Debug for PngDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadSignature => writeln!(f, "Bad PNG signature, not a png"),
            Self::GenericStatic(val) => writeln!(f, "{val}"),
            Self::Generic(val) => writeln!(f, "{val}"),
            Self::BadCrc(expected, found) => writeln!(
                f,
                "CRC does not match, expected {expected:#010x} but found {found:#010x}"
            ),
            Self::UnknownChunk(chunk) => writeln!(
                f,
                "Unknown chunk {:?} cannot be skipped",
                core::str::from_utf8(chunk).unwrap_or("XXXX")
            ),
            Self::UnknownFilter(filter, row) => {
                writeln!(f, "Unknown filter {filter} on row {row}")
            }
            Self::PaletteIndexOutOfRange(index, len) => writeln!(
                f,
                "Palette index {index} out of range for a palette of {len} entries"
            ),
            Self::ZlibDecodeErrors(err) => writeln!(f, "Error decoding idat chunks {err:?}"),
            Self::ShortData(expected, found) => writeln!(
                f,
                "Not enough image data, expected {expected} bytes but found {found}"
            ),
            Self::LimitExceeded(dimension, value, max) => writeln!(
                f,
                "Image {dimension} {value} larger than maximum configured {dimension} {max}, aborting"
            ),
            Self::TooSmallOutput(expected, found) => writeln!(
                f,
                "Too small output, expected buffer with at least {expected} bytes but got one with {found} bytes"
            ),
            Self::ChunkContext {
                chunk,
                position,
                error
            } => write!(
                f,
                "In chunk {:?} at offset {position}: {error:?}",
                core::str::from_utf8(chunk).unwrap_or("XXXX")
            )
        }
    }
}

impl Display for PngDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PngDecodeErrors {}

impl From<&'static str> for PngDecodeErrors {
    fn from(val: &'static str) -> Self {
        Self::GenericStatic(val)
    }
}

impl From<String> for PngDecodeErrors {
    fn from(val: String) -> Self {
        Self::Generic(val)
    }
}

impl From<InflateDecodeErrors> for PngDecodeErrors {
    fn from(val: InflateDecodeErrors) -> Self {
        Self::ZlibDecodeErrors(val)
    }
}

impl From<ZByteIoError> for PngDecodeErrors {
    fn from(val: ZByteIoError) -> Self {
        Self::Generic(alloc::format!("{val:?}"))
    }
}
