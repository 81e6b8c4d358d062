/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use alloc::vec::Vec;

use zune_core::bit_depth::BitDepth;
use zune_core::bytestream::{ZByteWriterTrait, ZWriter};
use zune_core::colorspace::ColorSpace;
use zune_core::log::trace;
use zune_core::options::EncoderOptions;

use crate::bitstream::BitStreamWriter;
use crate::constants::{MANPACK_HEADER_SIZE, MANPACK_VERSION};
use crate::errors::ManpackEncodeErrors;
use crate::header::{CompressionMethod, ManpackHeader};
use crate::huffman::{calculate_weights, HuffmanEncoder, HuffmanTable};
use crate::image::{PixelLayout, PixelSource};
use crate::predictor::{forward_transform, Predictor};
use crate::rle::run_length_encode;

const SUPPORTED_COLORSPACES: [ColorSpace; 2] = [ColorSpace::RGB, ColorSpace::RGBA];

/// ManPack encoder
///
/// Pixels are 32 bit words laid out as `0xAARRGGBB`, with the top byte
/// either alpha (`RGBA` colorspace) or unused (`RGB` colorspace). All
/// 32 bits are kept in both cases.
///
/// # Example
/// - Encode a 100 by 100 ARGB32 image
///
/// ```
/// use zune_core::bit_depth::BitDepth;
/// use zune_core::colorspace::ColorSpace;
/// use zune_core::options::EncoderOptions;
/// use zune_manpack::ManpackEncoder;
/// use zune_manpack::ManpackEncodeErrors;
///
/// const W:usize=100;
/// const H:usize=100;
///
/// fn main()->Result<(), ManpackEncodeErrors>{
///     let pixels = std::array::from_fn::<u32,{W * H},_>(|i| (i % 7) as u32 * 0x0101_0101);
///     let mut encoder = ManpackEncoder::new(&pixels,EncoderOptions::new(W,H,ColorSpace::RGBA,BitDepth::Eight));
///     let mut sink: Vec<u8> = vec![];
///     let written = encoder.encode(&mut sink)?;
///     assert!(written <= encoder.max_size());
///     Ok(())
///}
/// ```
pub struct ManpackEncoder<'a> {
    // raw pixels, one word per pixel
    pixel_data: &'a [u32],
    options:    EncoderOptions,
    predictor:  Predictor
}

impl<'a> ManpackEncoder<'a> {
    /// Create a new encoder which will encode the pixels
    ///
    /// # Arguments
    /// - data: Pixel data, size must be equal to `width*height`
    /// - options: Encoder details for data, this contains width, height and colorspace,
    ///   only `RGB` and `RGBA` are accepted
    #[allow(clippy::redundant_field_names)]
    pub fn new(data: &'a [u32], options: EncoderOptions) -> ManpackEncoder<'a> {
        ManpackEncoder {
            pixel_data: data,
            options:    options,
            predictor:  Predictor::default()
        }
    }
    /// Choose the spatial predictor applied before entropy coding
    ///
    /// Defaults to [`Predictor::Left`]
    pub fn set_predictor(&mut self, predictor: Predictor) {
        self.predictor = predictor;
    }

    pub const fn predictor(&self) -> Predictor {
        self.predictor
    }

    /// Return the maximum size for which the encoder can safely
    /// encode the image without fearing for an out of space error
    ///
    /// The encoder falls back to storing raw pixels when compression
    /// does not help, so output never exceeds this.
    pub fn max_size(&self) -> usize {
        self.options.width() * self.options.height() * 4 + MANPACK_HEADER_SIZE
    }

    fn layout(&self) -> Result<PixelLayout, ManpackEncodeErrors> {
        let colorspace = self.options.colorspace();

        PixelLayout::from_colorspace(colorspace).ok_or(
            ManpackEncodeErrors::UnsupportedColorspace(colorspace, &SUPPORTED_COLORSPACES)
        )
    }

    /// Check dimensions against the pixel slice, returning the pixel count
    fn check_dimensions(&self) -> Result<usize, ManpackEncodeErrors> {
        let width = self.options.width();
        let height = self.options.height();

        if width == 0 || height == 0 {
            return Err(ManpackEncodeErrors::EmptyImage);
        }
        if width > u32::MAX as usize {
            return Err(ManpackEncodeErrors::TooLargeDimensions(width));
        }
        if height > u32::MAX as usize {
            return Err(ManpackEncodeErrors::TooLargeDimensions(height));
        }
        let expected = width
            .checked_mul(height)
            .ok_or(ManpackEncodeErrors::TooLargeDimensions(width.max(height)))?;

        if self.pixel_data.len() != expected {
            return Err(ManpackEncodeErrors::InvalidDimensions(
                expected,
                self.pixel_data.len()
            ));
        }
        // the stored fallback has to fit the 32 bit payload length
        if expected.checked_mul(4).map_or(true, |x| x > u32::MAX as usize) {
            return Err(ManpackEncodeErrors::TooLargeDimensions(expected));
        }
        Ok(expected)
    }

    /// Predict, run length encode and huffman code the pixels
    ///
    /// Returns `None` without building the payload if it would not
    /// be smaller than `limit` bytes.
    fn encode_huffman(&self, limit: usize) -> Result<Option<Vec<u8>>, ManpackEncodeErrors> {
        let residuals = forward_transform(self.pixel_data, self.options.width(), self.predictor);
        let pairs = run_length_encode(&residuals);

        trace!(
            "{} residuals collapsed into {} runs",
            residuals.len(),
            pairs.len()
        );

        let value_table = HuffmanTable::from_weights(&calculate_weights(pairs.iter().map(|p| p.0)));
        let run_table = HuffmanTable::from_weights(&calculate_weights(pairs.iter().map(|p| p.1)));

        let values = HuffmanEncoder::new(&value_table);
        let runs = HuffmanEncoder::new(&run_table);

        // size the payload before writing anything
        let bits: usize = pairs
            .iter()
            .map(|(value, run)| usize::from(values.code_length(*value) + runs.code_length(*run)))
            .sum();
        let estimate =
            4 + value_table.serialized_size() + run_table.serialized_size() + (bits + 7) / 8;

        trace!("Huffman payload estimate: {estimate} bytes, limit: {limit} bytes");

        if estimate >= limit {
            return Ok(None);
        }
        let mut bitstream = BitStreamWriter::new();

        for (value, run) in &pairs {
            values.encode_symbol(*value, &mut bitstream);
            runs.encode_symbol(*run, &mut bitstream);
        }
        debug_assert_eq!(bitstream.bits_written(), bits);

        let mut payload = Vec::with_capacity(estimate);
        {
            let mut writer = ZWriter::new(&mut payload);

            writer.write_u32_be_err(pairs.len() as u32)?;
            value_table.write(&mut writer)?;
            run_table.write(&mut writer)?;
            writer.write_all(&bitstream.finish())?;
        }
        debug_assert_eq!(payload.len(), estimate);

        Ok(Some(payload))
    }

    fn encode_stored(&self) -> Vec<u8> {
        self.pixel_data
            .iter()
            .flat_map(|pix| pix.to_be_bytes())
            .collect()
    }

    /// Encode into a sink
    ///
    /// # Arguments.
    /// - sink: Where to write the encoded container to
    ///
    /// # Returns
    /// - Ok(size): Actual bytes used for encoding
    /// - Err: The error encountered during encoding
    pub fn encode<T: ZByteWriterTrait>(&mut self, sink: T) -> Result<usize, ManpackEncodeErrors> {
        let layout = self.layout()?;
        let pixel_count = self.check_dimensions()?;

        trace!(
            "Encoding {}x{} image, layout: {:?}, predictor: {:?}",
            self.options.width(),
            self.options.height(),
            layout,
            self.predictor
        );

        let stored_size = pixel_count * 4;

        // stored pixels skip prediction so the header must say so
        let (method, predictor, payload) = match self.encode_huffman(stored_size)? {
            Some(payload) => (CompressionMethod::Huffman, self.predictor, payload),
            None => {
                trace!("Compression does not pay off, storing raw pixels");
                (CompressionMethod::Stored, Predictor::None, self.encode_stored())
            }
        };
        let header = ManpackHeader {
            version: MANPACK_VERSION,
            width: self.options.width(),
            height: self.options.height(),
            layout,
            method,
            predictor,
            payload_length: payload.len()
        };

        let mut stream = ZWriter::new(sink);

        header.write(&mut stream)?;
        stream.write_all(&payload)?;

        let len = stream.bytes_written();

        trace!("Wrote {len} bytes using {} payload", method.name());

        Ok(len)
    }
}

/// Compress an ARGB32 image held in a flat row major slice
///
/// `pixels.len()` must equal `width * height`.
///
/// # Example
/// ```
/// let pixels = [1, 2, 3, 1, 2, 3, 5, 6, 7, 1, 5, 7];
/// let compressed = zune_manpack::compress_image(4, 3, &pixels).unwrap();
/// let image = zune_manpack::decompress_image(&compressed).unwrap();
/// assert_eq!(image.pixels(), &pixels);
/// ```
pub fn compress_image(
    width: usize, height: usize, pixels: &[u32]
) -> Result<Vec<u8>, ManpackEncodeErrors> {
    compress_with_layout(width, height, PixelLayout::Argb32, pixels)
}

/// Compress pixels whose top byte has the meaning given by `layout`
pub fn compress_with_layout(
    width: usize, height: usize, layout: PixelLayout, pixels: &[u32]
) -> Result<Vec<u8>, ManpackEncodeErrors> {
    let options = EncoderOptions::new(width, height, layout.colorspace(), BitDepth::Eight);
    let mut encoder = ManpackEncoder::new(pixels, options);

    let mut output = Vec::with_capacity(MANPACK_HEADER_SIZE + pixels.len());
    encoder.encode(&mut output)?;

    Ok(output)
}

/// Compress pixels without explicit dimensions
///
/// The pixels are treated as a single row, so the decoded image is
/// `pixels.len()` wide and one pixel high.
pub fn compress_pixels(pixels: &[u32]) -> Result<Vec<u8>, ManpackEncodeErrors> {
    compress_image(pixels.len(), 1, pixels)
}

/// Compress an image from any pixel source
pub fn compress_source<S: PixelSource + ?Sized>(
    source: &S
) -> Result<Vec<u8>, ManpackEncodeErrors> {
    let (width, height) = source.dimensions();

    if width == 0 || height == 0 {
        return Err(ManpackEncodeErrors::EmptyImage);
    }
    let count = width
        .checked_mul(height)
        .ok_or(ManpackEncodeErrors::TooLargeDimensions(width.max(height)))?;

    let mut pixels = Vec::with_capacity(count);

    for y in 0..height {
        for x in 0..width {
            pixels.push(source.pixel(x, y));
        }
    }
    compress_with_layout(width, height, source.layout(), &pixels)
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use zune_core::bit_depth::BitDepth;
    use zune_core::colorspace::ColorSpace;
    use zune_core::options::EncoderOptions;

    use crate::constants::MANPACK_HEADER_SIZE;
    use crate::errors::ManpackEncodeErrors;
    use crate::{compress_image, compress_pixels, ManpackEncoder, Predictor};

    #[test]
    fn test_invalid_dimensions() {
        let pixels = [0_u32; 11];
        let err = compress_image(3, 4, &pixels).unwrap_err();
        assert!(matches!(err, ManpackEncodeErrors::InvalidDimensions(12, 11)));
    }

    #[test]
    fn test_empty_image() {
        let err = compress_image(0, 5, &[]).unwrap_err();
        assert!(matches!(err, ManpackEncodeErrors::EmptyImage));

        let err = compress_pixels(&[]).unwrap_err();
        assert!(matches!(err, ManpackEncodeErrors::EmptyImage));
    }

    #[test]
    fn test_unsupported_colorspace() {
        let pixels = [0_u32; 4];
        let options = EncoderOptions::new(2, 2, ColorSpace::Luma, BitDepth::Eight);
        let mut sink: Vec<u8> = vec![];
        let err = ManpackEncoder::new(&pixels, options)
            .encode(&mut sink)
            .unwrap_err();
        assert!(matches!(err, ManpackEncodeErrors::UnsupportedColorspace(ColorSpace::Luma, _)));
    }

    #[test]
    fn test_flat_image_compresses() {
        let pixels = vec![0xFF00_FF00; 256 * 256];
        let compressed = compress_image(256, 256, &pixels).unwrap();
        // header, pair count, two tiny tables and a few bits
        assert!(compressed.len() < 64, "{} bytes", compressed.len());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let pixels: Vec<u32> = (0..40 * 30_u32).map(|i| (i / 7) * 0x0001_0203).collect();

        let options = || EncoderOptions::new(40, 30, ColorSpace::RGBA, BitDepth::Eight);

        for predictor in Predictor::ALL {
            let mut first: Vec<u8> = vec![];
            let mut encoder = ManpackEncoder::new(&pixels, options());
            encoder.set_predictor(predictor);
            encoder.encode(&mut first).unwrap();

            let mut second: Vec<u8> = vec![];
            let mut encoder = ManpackEncoder::new(&pixels, options());
            encoder.set_predictor(predictor);
            encoder.encode(&mut second).unwrap();

            assert_eq!(first, second);
            assert!(first.len() <= encoder.max_size());
        }
    }

    #[test]
    fn test_single_pixel_is_bounded() {
        let compressed = compress_image(1, 1, &[0xDEAD_BEEF]).unwrap();
        assert!(compressed.len() <= 4 + MANPACK_HEADER_SIZE);
    }

    #[test]
    fn test_stored_header_has_no_predictor() {
        let pixels = [0x0123_4567, 0x89AB_CDEF, 0xFEDC_BA98, 0x7654_3210];

        for predictor in Predictor::ALL {
            let options = EncoderOptions::new(2, 2, ColorSpace::RGBA, BitDepth::Eight);
            let mut encoder = ManpackEncoder::new(&pixels, options);
            encoder.set_predictor(predictor);

            let mut sink: Vec<u8> = vec![];
            encoder.encode(&mut sink).unwrap();

            // stored method, no predictor, raw big endian words
            assert_eq!(&sink[6..8], &[0, 0]);
            assert_eq!(&sink[MANPACK_HEADER_SIZE..MANPACK_HEADER_SIZE + 4], &[0x01, 0x23, 0x45, 0x67]);
            // the caller's choice is kept for the next encode
            assert_eq!(encoder.predictor(), predictor);
        }
    }
}
