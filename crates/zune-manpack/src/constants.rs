/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

pub const MANPACK_MAGIC: u32 = u32::from_be_bytes(*b"mpak");
pub const MANPACK_VERSION: u8 = 1;
// magic + version + layout + method + predictor + width + height + payload length
pub const MANPACK_HEADER_SIZE: usize = 20;

// payload methods
pub const METHOD_STORED: u8 = 0;
pub const METHOD_HUFFMAN: u8 = 1;

/// Longest run a single `(value, run)` pair may describe
pub const MAX_RUN: u32 = 65535;
/// Longest canonical huffman code we emit or accept
pub const MAX_CODE_LENGTH: usize = 32;
