/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! `BitStreamReader` and `BitStreamWriter` API
//!
//! Huffman codes are written most significant bit first, bits fill each
//! byte starting from its top bit and the final byte is padded with zeroes.

use alloc::vec::Vec;

pub(crate) struct BitStreamWriter {
    output:    Vec<u8>,
    // pending bits live in the low `bits_used` bits
    buffer:    u64,
    bits_used: u8
}

impl BitStreamWriter {
    pub fn new() -> BitStreamWriter {
        BitStreamWriter {
            output:    Vec::new(),
            buffer:    0,
            bits_used: 0
        }
    }
    /// Append the low `length` bits of `code`, most significant first
    ///
    /// `length` must be at most 32
    #[inline(always)]
    pub fn put_bits(&mut self, code: u32, length: u8) {
        debug_assert!(length <= 32);

        if length == 0 {
            return;
        }
        let mask = (1_u64 << length) - 1;

        self.buffer = (self.buffer << length) | (u64::from(code) & mask);
        self.bits_used += length;

        while self.bits_used >= 8 {
            self.bits_used -= 8;
            self.output.push((self.buffer >> self.bits_used) as u8);
        }
        // only the pending bits matter, drop the rest so shifts never overflow
        self.buffer &= (1_u64 << self.bits_used) - 1;
    }

    /// Number of bits written so far, padding excluded
    pub fn bits_written(&self) -> usize {
        self.output.len() * 8 + usize::from(self.bits_used)
    }

    /// Pad the last byte with zeroes and return the bytes
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits_used > 0 {
            let pad = 8 - self.bits_used;
            self.output.push((self.buffer << pad) as u8);
        }
        self.output
    }
}

pub(crate) struct BitStreamReader<'src> {
    // buffer from which we are pulling in bits from
    src:       &'src [u8],
    // position in our buffer,
    position:  usize,
    // bits are consumed from the top of the buffer
    buffer:    u64,
    bits_left: u8
}

impl<'src> BitStreamReader<'src> {
    /// Create a new `BitStreamReader` instance
    pub fn new(in_buffer: &'src [u8]) -> BitStreamReader<'src> {
        BitStreamReader {
            src:       in_buffer,
            position:  0,
            buffer:    0,
            bits_left: 0
        }
    }
    /// Refill the bit buffer with as many whole bytes as fit
    #[inline(always)]
    fn refill(&mut self) {
        while self.bits_left <= 56 {
            match self.src.get(self.position) {
                Some(byte) => {
                    self.buffer |= u64::from(*byte) << (56 - self.bits_left);
                    self.bits_left += 8;
                    self.position += 1;
                }
                None => break
            }
        }
    }

    /// Read a single bit, or `None` when the stream is exhausted
    #[inline(always)]
    pub fn get_bit(&mut self) -> Option<u32> {
        if self.bits_left == 0 {
            self.refill();

            if self.bits_left == 0 {
                return None;
            }
        }
        let bit = (self.buffer >> 63) as u32;

        self.buffer <<= 1;
        self.bits_left -= 1;

        Some(bit)
    }

    /// Return true if the bits left over after the last read are
    /// all zero and fit in a single padding byte
    pub fn is_clean_end(&mut self) -> bool {
        self.refill();

        // padding never spans a whole byte
        self.bits_left < 8 && self.position == self.src.len() && self.buffer == 0
    }
    /// Return true if any byte was not pulled into the bit buffer
    pub fn has_unread_bytes(&mut self) -> bool {
        self.refill();
        self.bits_left >= 8 || self.position != self.src.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::bitstream::{BitStreamReader, BitStreamWriter};

    #[test]
    fn test_bits_are_msb_first() {
        let mut writer = BitStreamWriter::new();
        writer.put_bits(0b1, 1);
        writer.put_bits(0b01, 2);
        writer.put_bits(0b11111, 5);
        writer.put_bits(0b101, 3);
        assert_eq!(writer.bits_written(), 11);

        let bytes = writer.finish();
        assert_eq!(bytes, [0b1011_1111, 0b1010_0000]);
    }

    #[test]
    fn test_reader_consumes_writer_output() {
        let mut writer = BitStreamWriter::new();
        writer.put_bits(u32::MAX, 32);
        writer.put_bits(0, 3);
        writer.put_bits(0xABCD_EF01, 32);

        let bytes = writer.finish();
        let mut reader = BitStreamReader::new(&bytes);

        let mut read = |count: usize| {
            let mut value = 0_u64;
            for _ in 0..count {
                value = (value << 1) | u64::from(reader.get_bit().unwrap());
            }
            value
        };
        assert_eq!(read(32), u64::from(u32::MAX));
        assert_eq!(read(3), 0);
        assert_eq!(read(32), 0xABCD_EF01);

        assert!(reader.is_clean_end());
        // five padding bits remain, then nothing
        for _ in 0..5 {
            assert_eq!(reader.get_bit(), Some(0));
        }
        assert_eq!(reader.get_bit(), None);
    }

    #[test]
    fn test_dirty_padding_is_detected() {
        let bytes = [0b1000_0001];
        let mut reader = BitStreamReader::new(&bytes);
        assert_eq!(reader.get_bit(), Some(1));
        assert!(!reader.is_clean_end());
    }
}
