/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Container header
//!
//! | offset | size | field                                       |
//! |--------|------|---------------------------------------------|
//! | 0      | 4    | magic `mpak`                                |
//! | 4      | 1    | format version                              |
//! | 5      | 1    | pixel layout, `0` RGB32, `1` ARGB32         |
//! | 6      | 1    | payload method, `0` stored, `1` huffman     |
//! | 7      | 1    | predictor                                   |
//! | 8      | 4    | width                                       |
//! | 12     | 4    | height                                      |
//! | 16     | 4    | payload length in bytes                     |
//!
//! All integers are big endian.

use zune_core::bytestream::{ZByteWriterTrait, ZWriter};

use crate::constants::{
    MANPACK_HEADER_SIZE, MANPACK_MAGIC, MANPACK_VERSION, MAX_RUN, METHOD_HUFFMAN, METHOD_STORED
};
use crate::errors::{ManpackEncodeErrors, ManpackErrors};
use crate::image::PixelLayout;
use crate::predictor::Predictor;

/// How the payload following the header is stored
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CompressionMethod {
    /// Raw big endian pixel words, used when compression does not pay off
    Stored,
    /// Predicted, run length encoded and huffman coded pixels
    Huffman
}

impl CompressionMethod {
    pub const fn name(self) -> &'static str {
        match self {
            CompressionMethod::Stored => "stored",
            CompressionMethod::Huffman => "huffman"
        }
    }
}

/// Everything the fixed size header of a `.mp` file describes
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ManpackHeader {
    pub version:        u8,
    pub width:          usize,
    pub height:         usize,
    pub layout:         PixelLayout,
    pub method:         CompressionMethod,
    pub predictor:      Predictor,
    pub payload_length: usize
}

impl ManpackHeader {
    /// Number of pixels described, `None` on overflow
    pub fn pixel_count(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Size of the whole container, header included
    pub const fn file_size(&self) -> usize {
        MANPACK_HEADER_SIZE + self.payload_length
    }

    pub(crate) fn write<T: ZByteWriterTrait>(
        &self, writer: &mut ZWriter<T>
    ) -> Result<(), ManpackEncodeErrors> {
        // callers checked these fit
        debug_assert!(self.width <= u32::MAX as usize);
        debug_assert!(self.height <= u32::MAX as usize);
        debug_assert!(self.payload_length <= u32::MAX as usize);

        let method = match self.method {
            CompressionMethod::Stored => METHOD_STORED,
            CompressionMethod::Huffman => METHOD_HUFFMAN
        };

        writer.write_all(&MANPACK_MAGIC.to_be_bytes())?;
        writer.write_u8_err(self.version)?;
        writer.write_u8_err(self.layout.to_byte())?;
        writer.write_u8_err(method)?;
        writer.write_u8_err(self.predictor.to_byte())?;
        writer.write_u32_be_err(self.width as u32)?;
        writer.write_u32_be_err(self.height as u32)?;
        writer.write_u32_be_err(self.payload_length as u32)?;

        Ok(())
    }

    /// Parse and sanity check a header
    ///
    /// Apart from checking each field this also rejects dimensions
    /// that the declared payload could never describe, which keeps
    /// corrupt headers from triggering huge allocations.
    pub(crate) fn parse(bytes: &[u8; MANPACK_HEADER_SIZE]) -> Result<ManpackHeader, ManpackErrors> {
        let magic = read_u32_be(bytes, 0);

        if magic != MANPACK_MAGIC {
            return Err(ManpackErrors::WrongMagicBytes);
        }
        let version = bytes[4];

        if version != MANPACK_VERSION {
            return Err(ManpackErrors::UnsupportedVersion(version));
        }
        let layout = PixelLayout::from_byte(bytes[5])
            .ok_or(ManpackErrors::CorruptPayload("unknown pixel layout"))?;

        let method = match bytes[6] {
            METHOD_STORED => CompressionMethod::Stored,
            METHOD_HUFFMAN => CompressionMethod::Huffman,
            _ => return Err(ManpackErrors::CorruptPayload("unknown payload method"))
        };
        let predictor = Predictor::from_byte(bytes[7])
            .ok_or(ManpackErrors::CorruptPayload("unknown predictor"))?;

        // stored pixels are written as is, never predicted
        if method == CompressionMethod::Stored && predictor != Predictor::None {
            return Err(ManpackErrors::CorruptPayload(
                "stored payload cannot carry a predictor"
            ));
        }
        let width = read_u32_be(bytes, 8) as usize;
        let height = read_u32_be(bytes, 12) as usize;
        let payload_length = read_u32_be(bytes, 16) as usize;

        if width == 0 || height == 0 {
            return Err(ManpackErrors::CorruptPayload("zero image dimensions"));
        }
        let header = ManpackHeader {
            version,
            width,
            height,
            layout,
            method,
            predictor,
            payload_length
        };
        let pixels = header
            .pixel_count()
            .ok_or(ManpackErrors::CorruptPayload("image dimensions overflow"))?;

        if !header.can_describe(payload_length) {
            return Err(ManpackErrors::CorruptPayload(
                "payload length cannot describe image dimensions"
            ));
        }
        Ok(header)
    }

    /// Whether a payload of `length` bytes could hold this image
    ///
    /// Stored pixels take exactly four bytes each, huffman pairs
    /// take at least two bits and cover at most `MAX_RUN` pixels.
    pub(crate) fn can_describe(&self, length: usize) -> bool {
        let Some(pixels) = self.pixel_count() else {
            return false;
        };
        match self.method {
            CompressionMethod::Stored => pixels.checked_mul(4) == Some(length),
            CompressionMethod::Huffman => {
                let max_pairs = length.saturating_mul(8) / 2;
                max_pairs.saturating_mul(MAX_RUN as usize) >= pixels
            }
        }
    }
}

fn read_u32_be(bytes: &[u8; MANPACK_HEADER_SIZE], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3]
    ])
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use zune_core::bytestream::ZWriter;

    use crate::constants::MANPACK_HEADER_SIZE;
    use crate::errors::ManpackErrors;
    use crate::header::{CompressionMethod, ManpackHeader};
    use crate::image::PixelLayout;
    use crate::predictor::Predictor;

    fn sample() -> ManpackHeader {
        ManpackHeader {
            version:        1,
            width:          640,
            height:         480,
            layout:         PixelLayout::Argb32,
            method:         CompressionMethod::Huffman,
            predictor:      Predictor::Paeth,
            payload_length: 1234
        }
    }

    fn to_array(header: &ManpackHeader) -> [u8; MANPACK_HEADER_SIZE] {
        let mut bytes: Vec<u8> = vec![];
        header.write(&mut ZWriter::new(&mut bytes)).unwrap();
        bytes.try_into().unwrap()
    }

    #[test]
    fn test_header_layout() {
        let bytes = to_array(&sample());

        assert_eq!(&bytes[0..4], b"mpak");
        assert_eq!(&bytes[4..8], &[1, 1, 1, 4]);
        assert_eq!(&bytes[8..12], &640_u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &480_u32.to_be_bytes());
        assert_eq!(&bytes[16..20], &1234_u32.to_be_bytes());

        assert_eq!(ManpackHeader::parse(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_field_errors() {
        let good = to_array(&sample());

        let mut bad = good;
        bad[0] = b'x';
        assert!(matches!(ManpackHeader::parse(&bad), Err(ManpackErrors::WrongMagicBytes)));

        let mut bad = good;
        bad[4] = 9;
        assert!(matches!(ManpackHeader::parse(&bad), Err(ManpackErrors::UnsupportedVersion(9))));

        for position in [5, 6, 7] {
            let mut bad = good;
            bad[position] = 200;
            assert!(matches!(ManpackHeader::parse(&bad), Err(ManpackErrors::CorruptPayload(_))));
        }

        let mut bad = good;
        bad[8..12].copy_from_slice(&[0; 4]);
        assert!(matches!(ManpackHeader::parse(&bad), Err(ManpackErrors::CorruptPayload(_))));
    }

    #[test]
    fn test_implausible_payload_length() {
        let mut header = sample();
        header.method = CompressionMethod::Stored;
        header.predictor = Predictor::None;
        // stored pixels must take exactly four bytes each
        assert!(matches!(
            ManpackHeader::parse(&to_array(&header)),
            Err(ManpackErrors::CorruptPayload(_))
        ));

        header.payload_length = 640 * 480 * 4;
        assert!(ManpackHeader::parse(&to_array(&header)).is_ok());
    }

    #[test]
    fn test_stored_rejects_predictor() {
        let mut header = sample();
        header.method = CompressionMethod::Stored;
        header.payload_length = 640 * 480 * 4;

        for predictor in Predictor::ALL {
            header.predictor = predictor;
            let parsed = ManpackHeader::parse(&to_array(&header));

            if predictor == Predictor::None {
                assert_eq!(parsed.unwrap(), header);
            } else {
                assert!(matches!(parsed, Err(ManpackErrors::CorruptPayload(_))));
            }
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_huge_huffman_dimensions() {
        let mut header = sample();
        header.width = 0xFFFF_FFFF;
        header.height = 0x0001_0000;
        header.payload_length = 0xFFFF_FFF0;

        // the declared length alone is plausible, the real one is not
        let parsed = ManpackHeader::parse(&to_array(&header)).unwrap();
        assert!(parsed.can_describe(0xFFFF_FFF0));
        assert!(!parsed.can_describe(0));
        assert!(!parsed.can_describe(1024));
    }
}
