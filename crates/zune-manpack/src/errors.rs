/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors possible during encoding and decoding.
use alloc::string::String;
use core::fmt::{Debug, Display, Formatter};

use zune_core::bytestream::ZByteIoError;
use zune_core::colorspace::ColorSpace;

/// Possible Errors that may occur during decoding
///
/// Header errors ([`TruncatedHeader`], [`WrongMagicBytes`], [`UnsupportedVersion`])
/// indicate a foreign or cut off file, [`CorruptPayload`] indicates a
/// file that looks like ours but whose contents are inconsistent.
///
/// [`TruncatedHeader`]: ManpackErrors::TruncatedHeader
/// [`WrongMagicBytes`]: ManpackErrors::WrongMagicBytes
/// [`UnsupportedVersion`]: ManpackErrors::UnsupportedVersion
/// [`CorruptPayload`]: ManpackErrors::CorruptPayload
pub enum ManpackErrors {
    /// The buffer is shorter than the fixed size header
    ///
    /// # Arguments
    /// - 1st argument is the number of bytes the header needs
    /// - 2nd argument is number of bytes actually present
    TruncatedHeader(usize, usize),
    /// The image does not start with the `mpak` magic bytes
    WrongMagicBytes,
    /// The header declares a format version we cannot decode
    UnsupportedVersion(u8),
    /// Structural inconsistency inside the header or the payload
    CorruptPayload(&'static str),
    /// Generic message
    Generic(String),
    /// To small output size
    ///
    /// # Arguments
    /// - 1st argument is the number of pixels the image has
    /// - 2nd argument is the number of pixels the output can hold
    TooSmallOutput(usize, usize),
    IoErrors(ZByteIoError)
}

impl Debug for ManpackErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ManpackErrors::TruncatedHeader(expected, found) => {
                writeln!(
                    f,
                    "Truncated header, expected at least {expected} bytes but found {found}"
                )
            }
            ManpackErrors::WrongMagicBytes => {
                writeln!(f, "Wrong magic bytes, expected `mpak` as image start")
            }
            ManpackErrors::UnsupportedVersion(version) => {
                writeln!(
                    f,
                    "Unsupported format version {version}, expected {}",
                    crate::constants::MANPACK_VERSION
                )
            }
            ManpackErrors::CorruptPayload(reason) => {
                writeln!(f, "Corrupt payload: {reason}")
            }
            ManpackErrors::Generic(val) => {
                writeln!(f, "{val}")
            }
            ManpackErrors::TooSmallOutput(expected, found) => {
                writeln!(
                    f,
                    "Too small output size, expected {expected}, but found {found}"
                )
            }
            ManpackErrors::IoErrors(value) => {
                writeln!(f, "I/O error {:?}", value)
            }
        }
    }
}

impl From<ZByteIoError> for ManpackErrors {
    fn from(value: ZByteIoError) -> Self {
        ManpackErrors::IoErrors(value)
    }
}

/// Errors encountered during encoding
pub enum ManpackEncodeErrors {
    /// Width or height is zero
    EmptyImage,
    /// Pixel count does not match `width*height`
    ///
    /// # Arguments
    /// - 1st argument is the expected number of pixels
    /// - 2nd argument is the length of the pixel slice
    InvalidDimensions(usize, usize),
    /// The dimension cannot be stored in the 32 bit header field
    TooLargeDimensions(usize),
    /// Unsupported colorspace
    ///
    /// The first argument is the colorspace encountered
    /// The second argument is list of supported colorspaces
    UnsupportedColorspace(ColorSpace, &'static [ColorSpace]),

    IoError(ZByteIoError)
}

impl Debug for ManpackEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ManpackEncodeErrors::EmptyImage => {
                writeln!(f, "Cannot encode an image with a zero width or height")
            }
            ManpackEncodeErrors::InvalidDimensions(expected, found) => {
                writeln!(
                    f,
                    "Expected {expected} pixels from image dimensions but found {found}"
                )
            }
            ManpackEncodeErrors::TooLargeDimensions(found) => {
                writeln!(
                    f,
                    "Too large image dimensions {found}, manpack can only encode images less than {}",
                    u32::MAX
                )
            }
            ManpackEncodeErrors::UnsupportedColorspace(found, supported) => {
                writeln!(f, "Cannot encode image with colorspace {found:?} into manpack, supported ones are {supported:?}")
            }
            ManpackEncodeErrors::IoError(v) => {
                writeln!(f, "I/O error {:?}", v)
            }
        }
    }
}

impl Display for ManpackEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}
impl Display for ManpackErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ManpackEncodeErrors {}

#[cfg(feature = "std")]
impl std::error::Error for ManpackErrors {}

impl From<ZByteIoError> for ManpackEncodeErrors {
    fn from(value: ZByteIoError) -> Self {
        Self::IoError(value)
    }
}
