/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::path::PathBuf;

use clap::ArgMatches;
use log::warn;
use zune_core::bytestream::ZCursor;
use zune_core::options::DecoderOptions;
use zune_manpack::ManpackDecoder;

use crate::errors::CliErrors;
use crate::file_io::read_file;
use crate::serde::Metadata;

/// Probe input files, extract metadata, and print to standard output.
pub fn probe_input_files(args: &ArgMatches) -> Result<(), CliErrors> {
    for in_file in args.get_raw("in").into_iter().flatten() {
        if !PathBuf::from(in_file).exists() {
            warn!("{:?} does not exist, skipping", in_file);
            continue;
        }
        let data = read_file(in_file)?;

        // set to high to remove restrictions.
        // We'll just be reading headers so it doesn't matter
        let options = DecoderOptions::new_cmd()
            .set_max_height(usize::MAX)
            .set_max_width(usize::MAX);

        let mut decoder = ManpackDecoder::new_with_options(ZCursor::new(&data), options);

        if let Err(e) = decoder.decode_headers() {
            warn!("Could not probe {:?}: {:?}", in_file, e);
            continue;
        }
        if let Some(header) = decoder.header() {
            let real_metadata = Metadata::new(in_file.to_os_string(), data.len() as u64, &header);

            let json = serde_json::to_string_pretty(&real_metadata)
                .map_err(|e| CliErrors::GenericString(e.to_string()))?;
            println!("{json}");
        }
    }
    Ok(())
}
