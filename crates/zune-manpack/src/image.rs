/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use alloc::vec::Vec;

use zune_core::colorspace::ColorSpace;

/// Layout of a single 32 bit pixel
///
/// Both layouts store blue in the low byte, then green, then red.
/// The top byte is unused for [`Rgb32`](PixelLayout::Rgb32) (conventionally `0xFF`)
/// and alpha for [`Argb32`](PixelLayout::Argb32).
///
/// The codec keeps all 32 bits of every pixel regardless of the layout,
/// the layout only tells consumers whether the top byte carries alpha.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PixelLayout {
    Rgb32,
    Argb32
}

impl PixelLayout {
    pub(crate) const fn to_byte(self) -> u8 {
        match self {
            PixelLayout::Rgb32 => 0,
            PixelLayout::Argb32 => 1
        }
    }

    pub(crate) const fn from_byte(byte: u8) -> Option<PixelLayout> {
        match byte {
            0 => Some(PixelLayout::Rgb32),
            1 => Some(PixelLayout::Argb32),
            _ => None
        }
    }
    /// Map a zune colorspace to a pixel layout
    ///
    /// Only `RGB` and `RGBA` have a 32 bit representation
    pub const fn from_colorspace(colorspace: ColorSpace) -> Option<PixelLayout> {
        match colorspace {
            ColorSpace::RGB => Some(PixelLayout::Rgb32),
            ColorSpace::RGBA => Some(PixelLayout::Argb32),
            _ => None
        }
    }
    /// The colorspace obtained when unpacking pixels of this layout
    /// via [`ManpackImage::to_rgba`] or [`ManpackImage::to_rgb`]
    pub const fn colorspace(self) -> ColorSpace {
        match self {
            PixelLayout::Rgb32 => ColorSpace::RGB,
            PixelLayout::Argb32 => ColorSpace::RGBA
        }
    }
}

/// Pack four 8 bit components into an `0xAARRGGBB` pixel
#[inline(always)]
pub const fn pack_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from_be_bytes([a, r, g, b])
}

/// Something the encoder can pull pixels from
///
/// This lets callers hand over images owned by other libraries
/// without first copying them into a flat buffer of their own.
pub trait PixelSource {
    /// Width and height of the image, in that order
    fn dimensions(&self) -> (usize, usize);
    /// Meaning of the top byte of each pixel
    fn layout(&self) -> PixelLayout;
    /// Pixel at column `x` and row `y`
    ///
    /// Only called with `x < width` and `y < height`
    fn pixel(&self, x: usize, y: usize) -> u32;
}

/// A decoded image
///
/// Pixels are stored row by row with no padding, so
/// `pixels.len() == width * height` always holds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManpackImage {
    pub(crate) width:  usize,
    pub(crate) height: usize,
    pub(crate) layout: PixelLayout,
    pub(crate) pixels: Vec<u32>
}

impl ManpackImage {
    /// Create an image from its parts
    ///
    /// Returns `None` if either dimension is zero or the pixel count
    /// does not match the dimensions
    pub fn new(
        width: usize, height: usize, layout: PixelLayout, pixels: Vec<u32>
    ) -> Option<ManpackImage> {
        if width == 0 || height == 0 || width.checked_mul(height) != Some(pixels.len()) {
            return None;
        }
        Some(ManpackImage {
            width,
            height,
            layout,
            pixels
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub const fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Consume the image returning the pixel words
    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Pixel words as bytes in native endian order
    ///
    /// This is the memory representation toolkits expect when constructing an
    /// image from a RGB32/ARGB32 buffer.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|pix| pix.to_ne_bytes()).collect()
    }

    /// Unpack pixels into interleaved `R,G,B,A` bytes
    ///
    /// For [`Rgb32`](PixelLayout::Rgb32) images alpha is forced to `255`
    pub fn to_rgba(&self) -> Vec<u8> {
        let force_opaque = self.layout == PixelLayout::Rgb32;

        let mut out = Vec::with_capacity(self.pixels.len() * 4);

        for pix in &self.pixels {
            let [a, r, g, b] = pix.to_be_bytes();
            let a = if force_opaque { 255 } else { a };
            out.extend_from_slice(&[r, g, b, a]);
        }
        out
    }

    /// Unpack pixels into interleaved `R,G,B` bytes dropping the top byte
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);

        for pix in &self.pixels {
            let [_, r, g, b] = pix.to_be_bytes();
            out.extend_from_slice(&[r, g, b]);
        }
        out
    }
}

impl PixelSource for ManpackImage {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn layout(&self) -> PixelLayout {
        self.layout
    }

    fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use crate::image::{pack_argb, ManpackImage, PixelLayout};

    #[test]
    fn test_new_rejects_mismatched_pixels() {
        assert!(ManpackImage::new(2, 2, PixelLayout::Rgb32, vec![0; 3]).is_none());
        assert!(ManpackImage::new(0, 2, PixelLayout::Rgb32, vec![]).is_none());
        assert!(ManpackImage::new(2, 2, PixelLayout::Rgb32, vec![0; 4]).is_some());
    }

    #[test]
    fn test_to_rgba_forces_opaque_rgb32() {
        let pixels = vec![pack_argb(10, 20, 30, 0), pack_argb(1, 2, 3, 4)];

        let rgb = ManpackImage::new(2, 1, PixelLayout::Rgb32, pixels.clone()).unwrap();
        assert_eq!(rgb.to_rgba(), [10, 20, 30, 255, 1, 2, 3, 255]);
        assert_eq!(rgb.to_rgb(), [10, 20, 30, 1, 2, 3]);

        let argb = ManpackImage::new(2, 1, PixelLayout::Argb32, pixels).unwrap();
        assert_eq!(argb.to_rgba(), [10, 20, 30, 0, 1, 2, 3, 4]);
    }
}
