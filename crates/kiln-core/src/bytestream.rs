/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A bounds checked reader over an in-memory buffer
//!
//! All reads either succeed in full or return an error without
//! moving the position, so callers can report where a read failed.
use core::fmt::{Debug, Display, Formatter};

/// Errors returned by [`ZByteReader`]
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum ZByteIoError {
    /// requested, available
    NotEnoughBytes(usize, usize),
    Generic(&'static str)
}

impl Debug for ZByteIoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ZByteIoError::NotEnoughBytes(requested, available) => {
                writeln!(
                    f,
                    "Not enough bytes, requested {requested} but only {available} are available"
                )
            }
            ZByteIoError::Generic(reason) => writeln!(f, "{reason}")
        }
    }
}

impl Display for ZByteIoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ZByteIoError {}

impl From<&'static str> for ZByteIoError {
    fn from(value: &'static str) -> Self {
        ZByteIoError::Generic(value)
    }
}

/// An encapsulation of a byte stream
///
/// The lifetime parameter is from the stream we read from,
/// slices returned by [`get`](Self::get) borrow from it directly.
pub struct ZByteReader<'a> {
    stream:   &'a [u8],
    position: usize
}

enum Mode {
    // Big endian
    BE,
    // Little Endian
    LE
}

impl<'a> ZByteReader<'a> {
    pub const fn new(buf: &'a [u8]) -> ZByteReader<'a> {
        ZByteReader {
            stream:   buf,
            position: 0
        }
    }

    /// Skip `num` bytes ahead of the stream.
    ///
    /// Fails if fewer than `num` bytes remain.
    pub fn skip(&mut self, num: usize) -> Result<(), ZByteIoError> {
        if !self.has(num) {
            return Err(ZByteIoError::NotEnoughBytes(num, self.remaining()));
        }
        self.position += num;
        Ok(())
    }

    /// Return the next `num` bytes and advance past them
    pub fn get(&mut self, num: usize) -> Result<&'a [u8], ZByteIoError> {
        let end = self
            .position
            .checked_add(num)
            .ok_or(ZByteIoError::Generic("Read length overflows"))?;

        match self.stream.get(self.position..end) {
            Some(bytes) => {
                self.position = end;
                Ok(bytes)
            }
            None => Err(ZByteIoError::NotEnoughBytes(num, self.remaining()))
        }
    }

    /// Look at `num_bytes` starting at `position` bytes past the current
    /// position, without advancing
    pub fn peek_at(&self, position: usize, num_bytes: usize) -> Result<&'a [u8], ZByteIoError> {
        let start = self.position.saturating_add(position);
        let end = start.saturating_add(num_bytes);

        self.stream
            .get(start..end)
            .ok_or(ZByteIoError::NotEnoughBytes(num_bytes, self.remaining()))
    }

    /// Read exactly `N` bytes into an array
    pub fn read_fixed_bytes_or_error<const N: usize>(&mut self) -> Result<[u8; N], ZByteIoError> {
        let mut space = [0; N];
        space.copy_from_slice(self.get(N)?);
        Ok(space)
    }

    /// Return true if at least `num` bytes remain in the stream
    pub const fn has(&self, num: usize) -> bool {
        self.remaining() >= num
    }

    /// Number of bytes not yet consumed
    pub const fn remaining(&self) -> usize {
        // Must be saturating to prevent underflow
        self.stream.len().saturating_sub(self.position)
    }

    pub const fn eof(&self) -> bool {
        self.remaining() == 0
    }

    pub const fn position(&self) -> usize {
        self.position
    }

    pub const fn len(&self) -> usize {
        self.stream.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }
}

macro_rules! get_single_type {
    ($name:tt,$name2:tt,$name3:tt,$name4:tt,$name5:tt,$int_type:tt) => {
        impl<'a> ZByteReader<'a> {
            #[inline(always)]
            fn $name(&mut self, mode: Mode) -> Result<$int_type, ZByteIoError> {
                const SIZE_OF_VAL: usize = core::mem::size_of::<$int_type>();

                let space = self.read_fixed_bytes_or_error::<SIZE_OF_VAL>()?;

                match mode {
                    Mode::LE => Ok($int_type::from_le_bytes(space)),
                    Mode::BE => Ok($int_type::from_be_bytes(space))
                }
            }

            pub fn $name2(&mut self) -> Result<$int_type, ZByteIoError> {
                self.$name(Mode::BE)
            }

            pub fn $name3(&mut self) -> Result<$int_type, ZByteIoError> {
                self.$name(Mode::LE)
            }

            /// Read a big endian value, returning zero if there are
            /// not enough bytes
            pub fn $name4(&mut self) -> $int_type {
                self.$name(Mode::BE).unwrap_or(0)
            }

            /// Read a little endian value, returning zero if there are
            /// not enough bytes
            pub fn $name5(&mut self) -> $int_type {
                self.$name(Mode::LE).unwrap_or(0)
            }
        }
    };
}

get_single_type!(get_u16_inner, get_u16_be_err, get_u16_le_err, get_u16_be, get_u16_le, u16);
get_single_type!(get_u32_inner, get_u32_be_err, get_u32_le_err, get_u32_be, get_u32_le, u32);

impl<'a> ZByteReader<'a> {
    pub fn get_u8_err(&mut self) -> Result<u8, ZByteIoError> {
        let [byte] = self.read_fixed_bytes_or_error::<1>()?;
        Ok(byte)
    }

    /// Read a single byte, returning zero at the end of the stream
    pub fn get_u8(&mut self) -> u8 {
        self.get_u8_err().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::bytestream::{ZByteIoError, ZByteReader};

    #[test]
    fn reads_big_endian() {
        let data = [0x00, 0x00, 0x01, 0x02, 0xAB, 0xCD];
        let mut reader = ZByteReader::new(&data);

        assert_eq!(reader.get_u32_be_err(), Ok(0x0102));
        assert_eq!(reader.get_u16_be(), 0xABCD);
        assert!(reader.eof());
    }

    #[test]
    fn failed_reads_do_not_advance() {
        let data = [1, 2, 3];
        let mut reader = ZByteReader::new(&data);

        assert_eq!(reader.get_u32_be_err(), Err(ZByteIoError::NotEnoughBytes(4, 3)));
        assert_eq!(reader.position(), 0);
        assert!(reader.skip(4).is_err());
        assert_eq!(reader.get(3), Ok(&data[..]));
        assert_eq!(reader.get_u8(), 0);
    }

    #[test]
    fn peek_does_not_consume() {
        let data = [9, 8, 7, 6];
        let mut reader = ZByteReader::new(&data);
        reader.skip(1).unwrap();

        assert_eq!(reader.peek_at(1, 2), Ok(&data[2..4]));
        assert!(reader.peek_at(2, 2).is_err());
        assert_eq!(reader.position(), 1);
    }
}
