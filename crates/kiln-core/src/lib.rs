/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core routines shared by the kiln decoders
//!
//! It currently contains
//!
//! - A bounds checked big endian byte reader over in-memory buffers
//! - Decoder options shared by the png and inflate decoders
//! - A logging shim which forwards to the `log` crate when the `log` feature is enabled
//!
//! # Features
//!  - `std`: Implements `std::error::Error` for the errors defined here
//!  - `log`: Forwards the logging macros to the `log` crate, otherwise they compile to nothing
#![cfg_attr(not(feature = "std"), no_std)]
#![macro_use]
extern crate alloc;

pub mod bytestream;
pub mod log;
pub mod options;
