/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![no_main]

use libfuzzer_sys::fuzz_target;
use zune_manpack::zune_core::bytestream::ZCursor;
use zune_manpack::zune_core::options::DecoderOptions;

fuzz_target!(|data: &[u8]| {
    // keep allocations small, a tiny payload may legally expand into huge runs
    let options = DecoderOptions::default()
        .set_max_width(1024)
        .set_max_height(1024);

    let mut decoder = zune_manpack::ManpackDecoder::new_with_options(ZCursor::new(data), options);
    let _ = decoder.decode();
});
