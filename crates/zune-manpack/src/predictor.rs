/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Spatial prediction
//!
//! Each pixel is predicted from already coded neighbours and only the
//! difference is handed to the entropy coder. Flat areas turn into long runs
//! of zero residuals.
//!
//! All arithmetic is done per 8 bit channel with wrapping, so the four
//! channels of a pixel never bleed into each other.

use alloc::vec::Vec;

/// Prediction applied before entropy coding
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum Predictor {
    /// Store pixels as is
    None,
    /// Left neighbour, upper neighbour for the first column
    #[default]
    Left,
    /// Upper neighbour, left neighbour for the first row
    Up,
    /// Per channel mean of left and upper neighbours
    Average,
    /// PNG paeth predictor on left, upper and upper left neighbours
    Paeth
}

impl Predictor {
    pub const ALL: [Predictor; 5] = [
        Predictor::None,
        Predictor::Left,
        Predictor::Up,
        Predictor::Average,
        Predictor::Paeth
    ];

    pub(crate) const fn to_byte(self) -> u8 {
        match self {
            Predictor::None => 0,
            Predictor::Left => 1,
            Predictor::Up => 2,
            Predictor::Average => 3,
            Predictor::Paeth => 4
        }
    }

    pub(crate) const fn from_byte(byte: u8) -> Option<Predictor> {
        match byte {
            0 => Some(Predictor::None),
            1 => Some(Predictor::Left),
            2 => Some(Predictor::Up),
            3 => Some(Predictor::Average),
            4 => Some(Predictor::Paeth),
            _ => None
        }
    }

    /// Lower case name, as accepted on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Predictor::None => "none",
            Predictor::Left => "left",
            Predictor::Up => "up",
            Predictor::Average => "average",
            Predictor::Paeth => "paeth"
        }
    }
}

#[inline(always)]
fn map_channels<F: Fn(u8, u8) -> u8>(a: u32, b: u32, func: F) -> u32 {
    let a = a.to_be_bytes();
    let b = b.to_be_bytes();

    u32::from_be_bytes([
        func(a[0], b[0]),
        func(a[1], b[1]),
        func(a[2], b[2]),
        func(a[3], b[3])
    ])
}

#[inline(always)]
pub(crate) fn sub_channels(a: u32, b: u32) -> u32 {
    map_channels(a, b, u8::wrapping_sub)
}

#[inline(always)]
pub(crate) fn add_channels(a: u32, b: u32) -> u32 {
    map_channels(a, b, u8::wrapping_add)
}

#[inline(always)]
fn average_channels(a: u32, b: u32) -> u32 {
    map_channels(a, b, |x, y| ((u16::from(x) + u16::from(y)) >> 1) as u8)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let a = i16::from(a);
    let b = i16::from(b);
    let c = i16::from(c);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

fn paeth_channels(left: u32, up: u32, up_left: u32) -> u32 {
    let a = left.to_be_bytes();
    let b = up.to_be_bytes();
    let c = up_left.to_be_bytes();

    u32::from_be_bytes([
        paeth(a[0], b[0], c[0]),
        paeth(a[1], b[1], c[1]),
        paeth(a[2], b[2], c[2]),
        paeth(a[3], b[3], c[3])
    ])
}

/// Predict pixel at `pos` from `pixels[..pos]`
///
/// Only entries before `pos` are read, which lets the decoder run the
/// prediction on the buffer it is reconstructing in place.
#[inline(always)]
fn predict(predictor: Predictor, pixels: &[u32], width: usize, pos: usize) -> u32 {
    let x = pos % width;
    let has_left = x > 0;
    let has_up = pos >= width;

    let left = if has_left { pixels[pos - 1] } else { 0 };
    let up = if has_up { pixels[pos - width] } else { 0 };

    match predictor {
        Predictor::None => 0,
        Predictor::Left => {
            if has_left {
                left
            } else {
                up
            }
        }
        Predictor::Up => {
            if has_up {
                up
            } else {
                left
            }
        }
        Predictor::Average => average_channels(left, up),
        Predictor::Paeth => {
            let up_left = if has_left && has_up {
                pixels[pos - width - 1]
            } else {
                0
            };
            paeth_channels(left, up, up_left)
        }
    }
}

/// Turn pixels into prediction residuals
///
/// `width` must be non zero and divide `pixels.len()`
pub(crate) fn forward_transform(pixels: &[u32], width: usize, predictor: Predictor) -> Vec<u32> {
    debug_assert!(width > 0 && pixels.len() % width == 0);

    if predictor == Predictor::None {
        return pixels.to_vec();
    }
    pixels
        .iter()
        .enumerate()
        .map(|(pos, pix)| sub_channels(*pix, predict(predictor, pixels, width, pos)))
        .collect()
}

/// Turn residuals back into pixels, in place
///
/// Runs in the same scan order as [`forward_transform`] so every
/// neighbour a prediction needs is already reconstructed.
pub(crate) fn inverse_transform(residuals: &mut [u32], width: usize, predictor: Predictor) {
    debug_assert!(width > 0 && residuals.len() % width == 0);

    if predictor == Predictor::None {
        return;
    }
    for pos in 0..residuals.len() {
        let prediction = predict(predictor, residuals, width, pos);
        residuals[pos] = add_channels(residuals[pos], prediction);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::predictor::{
        add_channels, forward_transform, inverse_transform, paeth, sub_channels, Predictor
    };

    #[test]
    fn test_channels_do_not_borrow() {
        // 0x00 - 0x01 in the low byte must not touch the green byte
        assert_eq!(sub_channels(0x1020_3000, 0x0000_0001), 0x1020_30FF);
        assert_eq!(add_channels(0x1020_30FF, 0x0000_0001), 0x1020_3000);
    }

    #[test]
    fn test_paeth_matches_reference() {
        assert_eq!(paeth(10, 20, 10), 20);
        assert_eq!(paeth(20, 10, 10), 20);
        assert_eq!(paeth(5, 5, 5), 5);
        assert_eq!(paeth(0, 0, 0), 0);
    }

    #[test]
    fn test_flat_image_gives_zero_residuals() {
        let pixels = vec![0xFF12_3456; 6 * 4];
        let residuals = forward_transform(&pixels, 6, Predictor::Left);
        // first pixel has nothing to predict from
        assert_eq!(residuals[0], 0xFF12_3456);
        assert!(residuals[1..].iter().all(|x| *x == 0));
    }

    #[test]
    fn test_all_predictors_invert() {
        let pixels: Vec<u32> = (0..35_u32)
            .map(|i| i.wrapping_mul(0x9E37_79B9) ^ (i << 3))
            .collect();

        for predictor in Predictor::ALL {
            let mut residuals = forward_transform(&pixels, 7, predictor);
            inverse_transform(&mut residuals, 7, predictor);
            assert_eq!(residuals, pixels, "{predictor:?} did not invert");
        }
    }

    #[test]
    fn test_byte_mapping() {
        for predictor in Predictor::ALL {
            assert_eq!(Predictor::from_byte(predictor.to_byte()), Some(predictor));
        }
        assert_eq!(Predictor::from_byte(5), None);
    }
}
