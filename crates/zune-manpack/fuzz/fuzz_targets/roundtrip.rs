/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    // first byte picks the width, the rest are pixels
    let pixels: Vec<u32> = data[1..]
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let width = usize::from(data[0]).clamp(1, pixels.len().max(1));
    let height = pixels.len() / width;

    if height == 0 {
        return;
    }
    let pixels = &pixels[..width * height];

    let compressed = zune_manpack::compress_image(width, height, pixels).unwrap();
    assert!(compressed.len() <= width * height * 4 + zune_manpack::MANPACK_HEADER_SIZE);

    let image = zune_manpack::decompress_image(&compressed).unwrap();
    assert_eq!(image.pixels(), pixels);
});
