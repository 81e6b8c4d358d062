/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use alloc::vec::Vec;
use alloc::{format, vec};

use zune_core::bytestream::{ZByteReaderTrait, ZCursor, ZReader};
use zune_core::colorspace::ColorSpace;
use zune_core::log::{trace, warn};
use zune_core::options::DecoderOptions;

use crate::bitstream::BitStreamReader;
use crate::constants::{MANPACK_HEADER_SIZE, MAX_RUN};
use crate::errors::ManpackErrors;
use crate::header::{CompressionMethod, ManpackHeader};
use crate::huffman::HuffmanTable;
use crate::image::{ManpackImage, PixelLayout};
use crate::predictor::{inverse_transform, Predictor};

/// A ManPack decoder
///
/// The decoder is initialized by calling `new`
/// and either of [`decode_headers`] to decode headers
/// or [`decode`] to return uncompressed pixels
///
/// Additional methods are provided that give more
/// details of the compressed image like width and height
/// are accessible after decoding headers
///
/// [`decode_headers`]:ManpackDecoder::decode_headers
/// [`decode`]:ManpackDecoder::decode
pub struct ManpackDecoder<T>
where
    T: ZByteReaderTrait
{
    header:  Option<ManpackHeader>,
    payload: Option<Vec<u8>>,
    stream:  ZReader<T>,
    options: DecoderOptions
}

impl<T> ManpackDecoder<T>
where
    T: ZByteReaderTrait
{
    /// Create a new decoder with the default options
    ///
    /// # Arguments
    /// - `data`: The compressed `.mp` data
    ///
    /// # Example
    ///
    /// ```no_run
    /// use zune_core::bytestream::ZCursor;
    /// let mut decoder = zune_manpack::ManpackDecoder::new(ZCursor::new(b""));
    /// // additional code
    /// ```
    pub fn new(data: T) -> ManpackDecoder<T> {
        ManpackDecoder::new_with_options(data, DecoderOptions::default())
    }
    /// Create a new decoder that obeys specified restrictions
    ///
    /// E.g can be used to set width and height limits to prevent OOM attacks,
    /// a few bytes of runs can expand to a very large image.
    ///
    /// # Example
    /// ```
    /// use zune_core::bytestream::ZCursor;
    /// use zune_core::options::DecoderOptions;
    /// use zune_manpack::ManpackDecoder;
    /// // only decode images less than 10 in both width and height
    ///
    /// let options = DecoderOptions::default().set_max_width(10).set_max_height(10);
    ///
    /// let mut decoder = ManpackDecoder::new_with_options(ZCursor::new(b""), options);
    /// ```
    pub fn new_with_options(data: T, options: DecoderOptions) -> ManpackDecoder<T> {
        ManpackDecoder {
            header: None,
            payload: None,
            stream: ZReader::new(data),
            options
        }
    }
    /// Decode the container header storing needed information into
    /// the decoder instance
    ///
    /// # Returns
    ///
    /// - On success: Nothing
    /// - On error: The error encountered when decoding headers
    ///     error type will be an instance of [ManpackErrors]
    pub fn decode_headers(&mut self) -> Result<(), ManpackErrors> {
        if self.header.is_some() {
            return Ok(());
        }
        let mut bytes = [0_u8; MANPACK_HEADER_SIZE];
        let mut filled = 0;

        // readers may hand out fewer bytes than asked for
        while filled < MANPACK_HEADER_SIZE {
            let read = self
                .stream
                .read_bytes(&mut bytes[filled..])
                .map_err(|_| ManpackErrors::TruncatedHeader(MANPACK_HEADER_SIZE, filled))?;

            if read == 0 {
                return Err(ManpackErrors::TruncatedHeader(MANPACK_HEADER_SIZE, filled));
            }
            filled += read;
        }
        let header = ManpackHeader::parse(&bytes)?;

        if header.width > self.options.max_width() {
            let msg = format!(
                "Width {} greater than max configured width {}",
                header.width,
                self.options.max_width()
            );
            return Err(ManpackErrors::Generic(msg));
        }

        if header.height > self.options.max_height() {
            let msg = format!(
                "Height {} greater than max configured height {}",
                header.height,
                self.options.max_height()
            );
            return Err(ManpackErrors::Generic(msg));
        }

        trace!("Image width: {:?}", header.width);
        trace!("Image height: {:?}", header.height);
        trace!("Pixel layout: {:?}", header.layout);
        trace!("Payload: {} {} bytes", header.method.name(), header.payload_length);
        trace!("Predictor: {:?}", header.predictor);

        self.header = Some(header);

        Ok(())
    }

    /// Return the number of pixels a decoded image holds
    ///
    /// # Returns
    ///  - `Some(usize)`: Minimum number of `u32`s needed to decode the image
    ///  - `None`: Indicates the image headers were not decoded.
    pub fn output_buffer_size(&self) -> Option<usize> {
        // parse guarantees the product does not overflow
        self.header.and_then(|h| h.pixel_count())
    }

    /// Decode the image, returning the pixel words
    ///
    /// Headers are decoded first if that was not done yet.
    ///
    /// # Returns
    /// - On success: `width*height` pixels in row major order
    /// - On error: An instance of [ManpackErrors] which gives a reason why the image could not
    /// be decoded
    pub fn decode(&mut self) -> Result<Vec<u32>, ManpackErrors> {
        self.decode_headers()?;

        let size = self
            .output_buffer_size()
            .ok_or(ManpackErrors::CorruptPayload("image dimensions overflow"))?;

        // confirm the payload exists before trusting the dimensions
        self.read_payload()?;

        let mut output = vec![0; size];

        self.decode_into(&mut output)?;

        Ok(output)
    }

    /// Decode the image into a [`ManpackImage`] carrying dimensions and layout
    pub fn decode_image(&mut self) -> Result<ManpackImage, ManpackErrors> {
        let pixels = self.decode()?;
        let header = self
            .header
            .ok_or(ManpackErrors::CorruptPayload("missing header"))?;

        Ok(ManpackImage {
            width: header.width,
            height: header.height,
            layout: header.layout,
            pixels
        })
    }

    /// Decode a compressed image and store the pixels into the output buffer
    ///
    /// Returns an error if the buffer cannot hold the image
    ///
    /// # Arguments
    ///
    /// * `pixels`: Output buffer for which we will write decoded
    /// pixels, only the first `width*height` entries are touched
    pub fn decode_into(&mut self, pixels: &mut [u32]) -> Result<(), ManpackErrors> {
        self.decode_headers()?;

        let header = self
            .header
            .ok_or(ManpackErrors::CorruptPayload("missing header"))?;

        let size = header
            .pixel_count()
            .ok_or(ManpackErrors::CorruptPayload("image dimensions overflow"))?;

        if pixels.len() < size {
            return Err(ManpackErrors::TooSmallOutput(size, pixels.len()));
        }
        self.read_payload()?;

        let strict = self.options.strict_mode();
        let payload = self
            .payload
            .as_deref()
            .ok_or(ManpackErrors::CorruptPayload("missing payload"))?;

        let output = &mut pixels[..size];

        match header.method {
            CompressionMethod::Stored => decode_stored(payload, output)?,
            CompressionMethod::Huffman => {
                decode_huffman(payload, output, strict)?;
                inverse_transform(output, header.width, header.predictor);
            }
        }

        trace!("Finished decoding image");

        Ok(())
    }

    /// Read and check the payload following the header
    ///
    /// Bytes are pulled in chunks so memory use is bounded by the input
    /// actually present, not by what the header claims.
    fn read_payload(&mut self) -> Result<(), ManpackErrors> {
        if self.payload.is_some() {
            return Ok(());
        }
        let header = self
            .header
            .ok_or(ManpackErrors::CorruptPayload("missing header"))?;

        // one byte past the declared length is enough to spot trailing data
        let limit = header.payload_length.saturating_add(1);
        let mut payload = Vec::new();
        let mut chunk = [0_u8; 4096];

        while payload.len() < limit {
            let wanted = (limit - payload.len()).min(chunk.len());
            let read = self.stream.read_bytes(&mut chunk[..wanted])?;

            if read == 0 {
                break;
            }
            payload.extend_from_slice(&chunk[..read]);
        }
        if payload.len() != header.payload_length {
            trace!(
                "Declared payload length {} but found {} bytes",
                header.payload_length,
                payload.len()
            );
            return Err(ManpackErrors::CorruptPayload(
                "payload length does not match declared length"
            ));
        }
        if !header.can_describe(payload.len()) {
            return Err(ManpackErrors::CorruptPayload(
                "payload length cannot describe image dimensions"
            ));
        }
        if header.method == CompressionMethod::Huffman {
            check_pair_count(&payload, header.pixel_count().unwrap_or(usize::MAX))?;
        }
        self.payload = Some(payload);

        Ok(())
    }

    /// Returns the header fields or `None` if headers haven't been decoded
    pub const fn header(&self) -> Option<ManpackHeader> {
        self.header
    }

    /// Return the width and height of the image
    ///
    /// Or none if the headers haven't been decoded
    ///
    /// # Example
    ///
    /// ```no_run
    /// use zune_core::bytestream::ZCursor;
    /// use zune_manpack::ManpackDecoder;
    /// let mut decoder = ManpackDecoder::new(ZCursor::new(b""));
    ///
    /// decoder.decode_headers().unwrap();
    /// // get dimensions now.
    /// let (w,h)=decoder.dimensions().unwrap();
    /// ```
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.header.map(|h| (h.width, h.height))
    }

    /// Meaning of the top byte of every pixel
    pub fn layout(&self) -> Option<PixelLayout> {
        self.header.map(|h| h.layout)
    }

    /// Colorspace obtained when unpacking the pixel words into bytes
    ///
    /// This is [RGB] for RGB32 images and [RGBA] for ARGB32 images
    ///
    /// [RGB]: zune_core::colorspace::ColorSpace::RGB
    /// [RGBA]: zune_core::colorspace::ColorSpace::RGBA
    pub fn colorspace(&self) -> Option<ColorSpace> {
        self.header.map(|h| h.layout.colorspace())
    }

    /// Predictor the image was encoded with
    pub fn predictor(&self) -> Option<Predictor> {
        self.header.map(|h| h.predictor)
    }
}

fn decode_stored(payload: &[u8], output: &mut [u32]) -> Result<(), ManpackErrors> {
    if payload.len() != output.len() * 4 {
        return Err(ManpackErrors::CorruptPayload(
            "stored payload does not match image size"
        ));
    }
    for (pix, bytes) in output.iter_mut().zip(payload.chunks_exact(4)) {
        *pix = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    Ok(())
}

/// Reject pair counts that cannot cover the image
///
/// Every pair needs at least two bits of bitstream and expands to at
/// most `MAX_RUN` pixels.
fn check_pair_count(payload: &[u8], pixels: usize) -> Result<usize, ManpackErrors> {
    let count = payload
        .get(..4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize)
        .ok_or(ManpackErrors::CorruptPayload("truncated pair count"))?;

    if count > pixels {
        return Err(ManpackErrors::CorruptPayload("more runs than pixels"));
    }
    if count.saturating_mul(MAX_RUN as usize) < pixels {
        return Err(ManpackErrors::CorruptPayload("too few runs to cover image"));
    }
    if count.saturating_mul(2) > (payload.len() - 4).saturating_mul(8) {
        return Err(ManpackErrors::CorruptPayload("pair count exceeds payload"));
    }
    Ok(count)
}

/// Expand the huffman coded `(value, run)` pairs into residuals
fn decode_huffman(payload: &[u8], output: &mut [u32], strict: bool) -> Result<(), ManpackErrors> {
    let total = output.len();
    let pair_count = check_pair_count(payload, total)?;

    // check_pair_count confirmed the four count bytes are there
    let tables = &payload[4..];
    let mut reader = ZReader::new(ZCursor::new(tables));

    let values = HuffmanTable::read(&mut reader, tables.len())?;

    let position = reader.position()? as usize;
    let runs = HuffmanTable::read(&mut reader, tables.len().saturating_sub(position))?;

    let position = reader.position()? as usize;
    let mut bitstream = BitStreamReader::new(tables.get(position..).unwrap_or(&[]));

    let mut filled = 0;

    for _ in 0..pair_count {
        let value = values.decode_symbol(&mut bitstream)?;
        let run = runs.decode_symbol(&mut bitstream)? as usize;

        if run == 0 || run > MAX_RUN as usize {
            return Err(ManpackErrors::CorruptPayload("run length out of range"));
        }
        let end = filled + run;

        if end > total {
            return Err(ManpackErrors::CorruptPayload("runs overflow image"));
        }
        output[filled..end].fill(value);
        filled = end;
    }
    if filled != total {
        return Err(ManpackErrors::CorruptPayload(
            "decoded pixel count does not match image dimensions"
        ));
    }
    if !bitstream.is_clean_end() {
        if bitstream.has_unread_bytes() {
            return Err(ManpackErrors::CorruptPayload("trailing bytes after bitstream"));
        }
        if strict {
            return Err(ManpackErrors::CorruptPayload("non zero padding bits"));
        }
        warn!("Non zero padding bits at end of bitstream");
    }
    Ok(())
}

/// Decompress a complete `.mp` buffer
///
/// No limits are placed on image dimensions, use [`ManpackDecoder::new_with_options`]
/// when decoding untrusted input.
pub fn decompress_image(data: &[u8]) -> Result<ManpackImage, ManpackErrors> {
    let options = DecoderOptions::default()
        .set_max_width(usize::MAX)
        .set_max_height(usize::MAX);

    ManpackDecoder::new_with_options(ZCursor::new(data), options).decode_image()
}
