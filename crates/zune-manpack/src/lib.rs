/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Decoding and encoding ManPack (`.mp`) images
//!
//! ManPack is a lossless codec for 32 bit pixels, each pixel is a `u32`
//! in `0xAARRGGBB` order. The top byte is either ignored ([RGB32]) or
//! alpha ([ARGB32]), in both cases it is stored bit exact.
//!
//! Images are predicted per channel, run length encoded and the
//! resulting `(value, run)` pairs are huffman coded. When that does not
//! pay off the pixels are stored raw, so a compressed image is never
//! larger than `width*height*4` plus the 20 byte header.
//!
//! # Features
//! - Decoding and encoding
//! -`no_std`
//! - Fuzz tested
//!
//! # Example
//! ```
//! use zune_manpack::{compress_image, decompress_image};
//!
//! let pixels = [0xFF00_0000_u32; 16];
//! let compressed = compress_image(4, 4, &pixels).unwrap();
//! let image = decompress_image(&compressed).unwrap();
//!
//! assert_eq!(image.pixels(), &pixels);
//! ```
//!
//! ## `no_std`
//! You can use `no_std` with alloc feature to compile for `no_std` endpoints
//!
//! [RGB32]: PixelLayout::Rgb32
//! [ARGB32]: PixelLayout::Argb32

#![cfg_attr(not(feature = "std"), no_std)]
#![macro_use]
extern crate alloc;
extern crate core;

pub use constants::MANPACK_HEADER_SIZE;
pub use decoder::*;
pub use encoder::*;
pub use errors::*;
pub use header::{CompressionMethod, ManpackHeader};
pub use image::*;
pub use predictor::Predictor;
pub use zune_core;

mod bitstream;
mod constants;
mod decoder;
mod encoder;
mod errors;
mod header;
mod huffman;
mod image;
mod predictor;
mod rle;
