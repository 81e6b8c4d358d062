/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};

use log::{debug, info};
use zune_bmp::BmpDecoder;
use zune_core::bit_depth::BitDepth;
use zune_core::bytestream::ZCursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::{DecoderOptions, EncoderOptions};
use zune_jpeg::JpegDecoder;
use zune_manpack::{pack_argb, ManpackImage, PixelLayout};
use zune_qoi::QoiEncoder;

use crate::errors::CliErrors;

/// Formats we know how to turn into 32 bit pixels
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputFormat {
    Bmp,
    Jpeg
}

impl InputFormat {
    pub fn guess_format(data: &[u8]) -> Option<InputFormat> {
        if zune_bmp::probe_bmp(data) {
            return Some(InputFormat::Bmp);
        }
        if data.starts_with(&[0xFF, 0xD8]) {
            return Some(InputFormat::Jpeg);
        }
        None
    }
}

pub fn read_file(path: &OsStr) -> Result<Vec<u8>, CliErrors> {
    info!("Reading {:?} to memory", path);
    Ok(std::fs::read(path)?)
}

pub fn write_file(path: &OsStr, data: &[u8]) -> Result<(), CliErrors> {
    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path)?;

    let mut buf_writer = BufWriter::new(file);
    buf_writer.write_all(data)?;
    buf_writer.flush()?;

    info!("Wrote {} bytes to {:?}", data.len(), path);
    Ok(())
}

/// Load a BMP or JPEG file as 32 bit pixels
pub fn load_input_image(path: &OsStr, options: DecoderOptions) -> Result<ManpackImage, CliErrors> {
    let data = read_file(path)?;

    match InputFormat::guess_format(&data) {
        Some(InputFormat::Bmp) => {
            debug!("Treating {:?} as a bmp file", path);
            decode_bmp(&data, options)
        }
        Some(InputFormat::Jpeg) => {
            debug!("Treating {:?} as a jpg file", path);
            decode_jpeg(&data, options)
        }
        None => Err(CliErrors::Input(format!(
            "{:?} is neither a BMP nor a JPEG image",
            path
        )))
    }
}

fn decode_bmp(data: &[u8], options: DecoderOptions) -> Result<ManpackImage, CliErrors> {
    let mut decoder = BmpDecoder::new_with_options(ZCursor::new(data), options);

    let pixels = decoder
        .decode()
        .map_err(|e| CliErrors::Input(format!("{e:?}")))?;

    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| CliErrors::Input("bmp headers not decoded".to_string()))?;
    let colorspace = decoder
        .colorspace()
        .ok_or_else(|| CliErrors::Input("bmp headers not decoded".to_string()))?;

    image_from_bytes(width, height, colorspace, &pixels)
}

fn decode_jpeg(data: &[u8], options: DecoderOptions) -> Result<ManpackImage, CliErrors> {
    let options = options.jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);

    let pixels = decoder
        .decode()
        .map_err(|e| CliErrors::Input(format!("{e:?}")))?;

    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| CliErrors::Input("jpeg headers not decoded".to_string()))?;

    image_from_bytes(width, height, ColorSpace::RGBA, &pixels)
}

/// Pack interleaved 8 bit samples into `0xAARRGGBB` pixels
///
/// Images without alpha become RGB32 with the unused byte set to `0xFF`.
pub fn image_from_bytes(
    width: usize, height: usize, colorspace: ColorSpace, bytes: &[u8]
) -> Result<ManpackImage, CliErrors> {
    let (layout, pixels): (PixelLayout, Vec<u32>) = match colorspace {
        ColorSpace::RGB => (
            PixelLayout::Rgb32,
            bytes
                .chunks_exact(3)
                .map(|c| pack_argb(c[0], c[1], c[2], 0xFF))
                .collect()
        ),
        ColorSpace::RGBA => (
            PixelLayout::Argb32,
            bytes
                .chunks_exact(4)
                .map(|c| pack_argb(c[0], c[1], c[2], c[3]))
                .collect()
        ),
        ColorSpace::Luma => (
            PixelLayout::Rgb32,
            bytes.iter().map(|c| pack_argb(*c, *c, *c, 0xFF)).collect()
        ),
        ColorSpace::LumaA => (
            PixelLayout::Argb32,
            bytes
                .chunks_exact(2)
                .map(|c| pack_argb(c[0], c[0], c[0], c[1]))
                .collect()
        ),
        other => {
            return Err(CliErrors::Input(format!(
                "Cannot convert {other:?} pixels into 32 bit pixels"
            )))
        }
    };

    ManpackImage::new(width, height, layout, pixels).ok_or_else(|| {
        CliErrors::Input(format!(
            "Pixel data does not match dimensions {width}x{height}"
        ))
    })
}

/// Encode a decompressed image as QOI so it can be viewed elsewhere
pub fn encode_qoi(image: &ManpackImage) -> Result<Vec<u8>, CliErrors> {
    let colorspace = image.layout().colorspace();

    let bytes = match image.layout() {
        PixelLayout::Rgb32 => image.to_rgb(),
        PixelLayout::Argb32 => image.to_rgba()
    };
    let options = EncoderOptions::new(image.width(), image.height(), colorspace, BitDepth::Eight);

    let mut output = Vec::new();

    QoiEncoder::new(&bytes, options)
        .encode(&mut output)
        .map_err(|e| CliErrors::GenericString(format!("Could not encode qoi: {e:?}")))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use zune_core::colorspace::ColorSpace;
    use zune_manpack::PixelLayout;

    use crate::file_io::{image_from_bytes, InputFormat};

    #[test]
    fn test_rgb_packing() {
        let image = image_from_bytes(2, 1, ColorSpace::RGB, &[1, 2, 3, 4, 5, 6]).unwrap();

        assert_eq!(image.layout(), PixelLayout::Rgb32);
        assert_eq!(image.pixels(), &[0xFF01_0203, 0xFF04_0506]);
    }

    #[test]
    fn test_rgba_packing() {
        let image = image_from_bytes(1, 1, ColorSpace::RGBA, &[1, 2, 3, 4]).unwrap();

        assert_eq!(image.layout(), PixelLayout::Argb32);
        assert_eq!(image.pixels(), &[0x0401_0203]);
        assert_eq!(image.to_rgba(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_luma_packing() {
        let image = image_from_bytes(2, 1, ColorSpace::LumaA, &[9, 128, 7, 0]).unwrap();
        assert_eq!(image.pixels(), &[0x8009_0909, 0x0007_0707]);
    }

    #[test]
    fn test_short_buffer() {
        assert!(image_from_bytes(2, 2, ColorSpace::RGB, &[0; 9]).is_err());
        assert!(image_from_bytes(1, 1, ColorSpace::CMYK, &[0; 4]).is_err());
    }

    #[test]
    fn test_guess_format() {
        assert_eq!(InputFormat::guess_format(&[0xFF, 0xD8, 0xFF]), Some(InputFormat::Jpeg));
        assert_eq!(InputFormat::guess_format(b"mpak"), None);
    }
}
