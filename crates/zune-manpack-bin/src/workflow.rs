/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::ffi::OsStr;
use std::path::Path;

use clap::ArgMatches;
use log::{debug, info, warn};
use zune_core::bit_depth::BitDepth;
use zune_core::bytestream::ZCursor;
use zune_core::options::{DecoderOptions, EncoderOptions};
use zune_manpack::{ManpackDecoder, ManpackEncoder, ManpackImage, Predictor};

use crate::cmd_parsers::global_options::CmdOptions;
use crate::cmd_parsers::{get_decoder_options, get_predictor};
use crate::errors::CliErrors;
use crate::file_io::{encode_qoi, load_input_image, read_file, write_file};
use crate::probe_files::probe_input_files;

pub(crate) fn run_subcommand(args: &ArgMatches, cmd_opts: &CmdOptions) -> Result<(), CliErrors> {
    let options = get_decoder_options(cmd_opts);

    match args.subcommand() {
        Some(("compress", sub)) => {
            let predictor = get_predictor(sub);

            for (in_file, out_file) in file_pairs(sub)? {
                let image = load_input_image(in_file, options)?;
                let compressed = compress(&image, predictor)?;

                write_file(out_file, &compressed)?;
                report_ratio(out_file, &image, compressed.len());
            }
            Ok(())
        }
        Some(("decompress", sub)) => {
            for (in_file, out_file) in file_pairs(sub)? {
                if Path::new(out_file).extension() != Some(OsStr::new("qoi")) {
                    warn!("{:?} does not end in .qoi, writing qoi data anyway", out_file);
                }
                let data = read_file(in_file)?;
                let image = decompress(&data, options)?;

                write_file(out_file, &encode_qoi(&image)?)?;
            }
            Ok(())
        }
        Some(("roundtrip", sub)) => {
            let predictor = get_predictor(sub);

            for (in_file, out_file) in file_pairs(sub)? {
                let image = load_input_image(in_file, options)?;
                roundtrip(&image, out_file, predictor, options)?;
            }
            Ok(())
        }
        Some(("probe", sub)) => probe_input_files(sub),
        Some((name, _)) => Err(CliErrors::GenericString(format!(
            "Unknown subcommand {name}"
        ))),
        None => Err(CliErrors::GenericString("No subcommand given".to_string()))
    }
}

/// Pair up `-i` and `-o` arguments in the order they were given
fn file_pairs(args: &ArgMatches) -> Result<Vec<(&OsStr, &OsStr)>, CliErrors> {
    let inputs: Vec<&OsStr> = args.get_raw("in").into_iter().flatten().collect();
    let outputs: Vec<&OsStr> = args.get_raw("out").into_iter().flatten().collect();

    if inputs.len() != outputs.len() {
        return Err(CliErrors::GenericString(format!(
            "Got {} input files but {} output files",
            inputs.len(),
            outputs.len()
        )));
    }
    for (in_file, out_file) in inputs.iter().zip(outputs.iter()) {
        verify_file_paths(in_file, out_file)?;
    }
    Ok(inputs.into_iter().zip(outputs).collect())
}

fn verify_file_paths(p0: &OsStr, p1: &OsStr) -> Result<(), CliErrors> {
    if p0 == p1 {
        return Err(CliErrors::GenericString(format!(
            "Cannot use {:?} as both input and output",
            p0
        )));
    }
    Ok(())
}

fn compress(image: &ManpackImage, predictor: Predictor) -> Result<Vec<u8>, CliErrors> {
    let (width, height) = image.dimensions();
    let options = EncoderOptions::new(width, height, image.layout().colorspace(), BitDepth::Eight);

    let mut encoder = ManpackEncoder::new(image.pixels(), options);
    encoder.set_predictor(predictor);

    let mut output = Vec::with_capacity(encoder.max_size());
    encoder.encode(&mut output)?;

    debug!("Compressed {}x{} image with {:?} predictor", width, height, predictor);

    Ok(output)
}

fn decompress(data: &[u8], options: DecoderOptions) -> Result<ManpackImage, CliErrors> {
    Ok(ManpackDecoder::new_with_options(ZCursor::new(data), options).decode_image()?)
}

/// Compress, write, read back and compare
fn roundtrip(
    image: &ManpackImage, out_file: &OsStr, predictor: Predictor, options: DecoderOptions
) -> Result<(), CliErrors> {
    let compressed = compress(image, predictor)?;
    write_file(out_file, &compressed)?;

    let written = read_file(out_file)?;

    if written != compressed {
        return Err(CliErrors::GenericString(format!(
            "{:?} changed between writing and reading",
            out_file
        )));
    }
    let decoded = decompress(&written, options)?;

    check_identical(image, &decoded)?;
    report_ratio(out_file, image, written.len());

    println!("{:?}: round trip ok", out_file);
    Ok(())
}

/// Confirm two images carry the same dimensions and pixels
fn check_identical(expected: &ManpackImage, found: &ManpackImage) -> Result<(), CliErrors> {
    if expected.dimensions() != found.dimensions() {
        return Err(CliErrors::GenericString(format!(
            "Dimensions changed from {:?} to {:?}",
            expected.dimensions(),
            found.dimensions()
        )));
    }
    if let Some(index) = expected
        .pixels()
        .iter()
        .zip(found.pixels())
        .position(|(a, b)| a != b)
    {
        return Err(CliErrors::Mismatch(index));
    }
    Ok(())
}

fn report_ratio(out_file: &OsStr, image: &ManpackImage, compressed_size: usize) {
    let raw_size = image.pixels().len() * 4;
    let ratio = raw_size as f64 / compressed_size.max(1) as f64;

    info!(
        "{:?}: {} bytes raw, {} bytes compressed, ratio {:.3}",
        out_file, raw_size, compressed_size, ratio
    );
}

#[cfg(test)]
mod tests {
    use zune_core::options::DecoderOptions;
    use zune_manpack::{ManpackImage, PixelLayout, Predictor};

    use crate::errors::CliErrors;
    use crate::workflow::{check_identical, compress, decompress};

    fn sample() -> ManpackImage {
        let pixels = (0..48).map(|i| 0xFF00_0000 | (i * 0x0003_0201)).collect();
        ManpackImage::new(8, 6, PixelLayout::Rgb32, pixels).unwrap()
    }

    #[test]
    fn test_compress_then_decompress() {
        let image = sample();

        for predictor in Predictor::ALL {
            let compressed = compress(&image, predictor).unwrap();
            let decoded = decompress(&compressed, DecoderOptions::default()).unwrap();

            assert_eq!(decoded, image);
        }
    }

    #[test]
    fn test_mismatch_is_reported() {
        let image = sample();
        let mut pixels = image.pixels().to_vec();
        pixels[13] ^= 1;
        let other = ManpackImage::new(8, 6, PixelLayout::Rgb32, pixels).unwrap();

        assert!(matches!(check_identical(&image, &other), Err(CliErrors::Mismatch(13))));
        assert!(check_identical(&image, &image).is_ok());
    }
}
