/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Canonical huffman coding over 32 bit symbols
//!
//! Code lengths come from a classic huffman tree, the codes themselves are
//! assigned canonically so a table only needs to store how many codes exist
//! per length and the symbols in code order.
//!
//! Serialized table layout (big endian)
//!
//! | field          | size                    |
//! |----------------|-------------------------|
//! | symbol count   | u32                     |
//! | max length     | u8, `1..=32`            |
//! | codes / length | `max length` x u32      |
//! | symbols        | `symbol count` x u32    |
use alloc::collections::{BTreeMap, BinaryHeap};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Reverse;

use zune_core::bytestream::{ZByteIoError, ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::trace;

use crate::bitstream::{BitStreamReader, BitStreamWriter};
use crate::constants::MAX_CODE_LENGTH;
use crate::errors::{ManpackEncodeErrors, ManpackErrors};

/// Count how often each symbol occurs
pub(crate) fn calculate_weights(symbols: impl Iterator<Item = u32>) -> BTreeMap<u32, usize> {
    let mut weights = BTreeMap::new();

    for symbol in symbols {
        *weights.entry(symbol).or_insert(0_usize) += 1;
    }
    weights
}

/// Depth of every leaf in a huffman tree built over `weights`
///
/// Ties are broken by node creation order which keeps the result
/// independent of anything but the input.
fn tree_depths(weights: &[usize]) -> Vec<usize> {
    let leaves = weights.len();

    // leaves are nodes 0..leaves, inner nodes get appended
    let mut parents = vec![usize::MAX; 2 * leaves - 1];
    let mut heap = BinaryHeap::with_capacity(leaves);

    for (id, weight) in weights.iter().enumerate() {
        heap.push(Reverse((*weight, id)));
    }
    let mut next_id = leaves;

    while heap.len() > 1 {
        // merge two lightest items into one
        let (Some(Reverse((w1, a))), Some(Reverse((w2, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        parents[a] = next_id;
        parents[b] = next_id;
        heap.push(Reverse((w1.saturating_add(w2), next_id)));
        next_id += 1;
    }
    // parents always have a larger id than their children,
    // so walking ids downwards visits parents first
    let root = next_id - 1;
    let mut depths = vec![0_usize; next_id];

    for id in (0..root).rev() {
        depths[id] = depths[parents[id]] + 1;
    }
    depths.truncate(leaves);
    depths
}

/// Compute code lengths no longer than `max_length` for every symbol
///
/// Returns `(symbol, length)` pairs in symbol order.
pub(crate) fn build_code_lengths(
    weights: &BTreeMap<u32, usize>, max_length: usize
) -> Vec<(u32, u8)> {
    if weights.is_empty() {
        return Vec::new();
    }
    if weights.len() == 1 {
        // a lone symbol still needs one bit, an empty code cannot be read back
        return weights.keys().map(|symbol| (*symbol, 1)).collect();
    }
    let mut scaled: Vec<usize> = weights.values().copied().collect();

    loop {
        let depths = tree_depths(&scaled);
        let longest = depths.iter().copied().max().unwrap_or(0);

        if longest <= max_length {
            return weights
                .keys()
                .zip(depths)
                .map(|(symbol, depth)| (*symbol, depth as u8))
                .collect();
        }
        trace!("Longest code {longest} bits exceeds {max_length}, flattening weights");
        // converges, with all weights at one the tree is balanced
        for weight in scaled.iter_mut() {
            *weight = (*weight >> 1).max(1);
        }
    }
}

/// A canonical huffman table
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct HuffmanTable {
    // number of codes of each length, index 0 unused
    counts:     [u32; MAX_CODE_LENGTH + 1],
    // symbols sorted by (length, symbol), i.e. in code order
    symbols:    Vec<u32>,
    max_length: usize
}

impl HuffmanTable {
    /// Create a table from `(symbol, length)` pairs
    pub fn from_code_lengths(lengths: &[(u32, u8)]) -> HuffmanTable {
        let mut sorted = lengths.to_vec();
        sorted.sort_unstable_by_key(|(symbol, length)| (*length, *symbol));

        let mut counts = [0; MAX_CODE_LENGTH + 1];

        for (_, length) in &sorted {
            counts[usize::from(*length)] += 1;
        }
        let max_length = sorted.last().map_or(0, |(_, l)| usize::from(*l));

        HuffmanTable {
            counts,
            symbols: sorted.into_iter().map(|(symbol, _)| symbol).collect(),
            max_length
        }
    }

    /// Build an optimal table for the given symbol frequencies
    pub fn from_weights(weights: &BTreeMap<u32, usize>) -> HuffmanTable {
        let lengths = build_code_lengths(weights, MAX_CODE_LENGTH);
        let table = HuffmanTable::from_code_lengths(&lengths);

        trace!(
            "Huffman table for {} symbols, longest code: {} bits",
            table.symbols.len(),
            table.max_length
        );
        table
    }

    /// Assign canonical codes, returning `symbol -> (code, length)`
    pub fn codes(&self) -> BTreeMap<u32, (u32, u8)> {
        let mut codes = BTreeMap::new();
        let mut code = 0_u64;
        let mut symbols = self.symbols.iter();

        for length in 1..=self.max_length {
            code <<= 1;

            for _ in 0..self.counts[length] {
                if let Some(symbol) = symbols.next() {
                    codes.insert(*symbol, (code as u32, length as u8));
                }
                code += 1;
            }
        }
        codes
    }

    /// Size of the serialized table in bytes
    pub fn serialized_size(&self) -> usize {
        4 + 1 + 4 * self.max_length + 4 * self.symbols.len()
    }

    pub fn write<T: ZByteWriterTrait>(
        &self, writer: &mut ZWriter<T>
    ) -> Result<(), ManpackEncodeErrors> {
        writer.write_u32_be_err(self.symbols.len() as u32)?;
        writer.write_u8_err(self.max_length as u8)?;

        for count in &self.counts[1..=self.max_length] {
            writer.write_u32_be_err(*count)?;
        }
        for symbol in &self.symbols {
            writer.write_u32_be_err(*symbol)?;
        }
        Ok(())
    }

    /// Read and validate a serialized table
    ///
    /// `available` is the number of bytes left in the payload, it bounds
    /// allocations made from counts we have not verified yet.
    pub fn read<T: ZByteReaderTrait>(
        reader: &mut ZReader<T>, available: usize
    ) -> Result<HuffmanTable, ManpackErrors> {
        const TRUNCATED: ManpackErrors = ManpackErrors::CorruptPayload("truncated huffman table");

        let symbol_count = read_u32_be(reader).map_err(|_| TRUNCATED)? as usize;
        let max_length = usize::from(read_u8(reader).map_err(|_| TRUNCATED)?);

        if symbol_count == 0 {
            return Err(ManpackErrors::CorruptPayload("empty huffman table"));
        }
        if !(1..=MAX_CODE_LENGTH).contains(&max_length) {
            return Err(ManpackErrors::CorruptPayload("huffman code length out of range"));
        }
        if symbol_count.saturating_add(max_length).saturating_mul(4) > available {
            return Err(TRUNCATED);
        }
        let mut counts = [0; MAX_CODE_LENGTH + 1];

        for count in counts[1..=max_length].iter_mut() {
            *count = read_u32_be(reader).map_err(|_| TRUNCATED)?;
        }
        let mut symbols = Vec::with_capacity(symbol_count);

        for _ in 0..symbol_count {
            symbols.push(read_u32_be(reader).map_err(|_| TRUNCATED)?);
        }
        let table = HuffmanTable {
            counts,
            symbols,
            max_length
        };
        table.validate()?;

        Ok(table)
    }

    /// Check that the lengths describe a usable prefix code
    fn validate(&self) -> Result<(), ManpackErrors> {
        let total: u64 = self.counts.iter().map(|c| u64::from(*c)).sum();

        if total != self.symbols.len() as u64 {
            return Err(ManpackErrors::CorruptPayload(
                "huffman code counts do not match symbol count"
            ));
        }
        // Kraft sum, measured in units of the longest code
        let mut left = 1_i64;

        for length in 1..=self.max_length {
            left <<= 1;
            left -= i64::from(self.counts[length]);

            if left < 0 {
                return Err(ManpackErrors::CorruptPayload("over-subscribed huffman code"));
            }
        }
        let lone_symbol = self.symbols.len() == 1 && self.counts[1] == 1;

        if left != 0 && !lone_symbol {
            return Err(ManpackErrors::CorruptPayload("incomplete huffman code"));
        }
        // symbols of the same length must be in increasing order
        let mut start = 0;

        for length in 1..=self.max_length {
            let end = start + self.counts[length] as usize;

            if self.symbols[start..end].windows(2).any(|w| w[0] >= w[1]) {
                return Err(ManpackErrors::CorruptPayload("huffman symbols out of order"));
            }
            start = end;
        }
        Ok(())
    }

    /// Decode a single symbol
    pub fn decode_symbol(&self, stream: &mut BitStreamReader) -> Result<u32, ManpackErrors> {
        // code, first code of this length and index of that code in `symbols`
        let mut code = 0_u64;
        let mut first = 0_u64;
        let mut index = 0_usize;

        for length in 1..=self.max_length {
            let bit = stream
                .get_bit()
                .ok_or(ManpackErrors::CorruptPayload("bitstream ended early"))?;

            code |= u64::from(bit);

            let count = u64::from(self.counts[length]);

            if code >= first && code - first < count {
                return Ok(self.symbols[index + (code - first) as usize]);
            }
            index += count as usize;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(ManpackErrors::CorruptPayload("invalid huffman code"))
    }
}

/// Lookup from symbol to its canonical code
pub(crate) struct HuffmanEncoder {
    codes: BTreeMap<u32, (u32, u8)>
}

impl HuffmanEncoder {
    pub fn new(table: &HuffmanTable) -> HuffmanEncoder {
        HuffmanEncoder {
            codes: table.codes()
        }
    }

    /// Code length of `symbol`, zero if the table has no code for it
    pub fn code_length(&self, symbol: u32) -> u8 {
        self.codes.get(&symbol).map_or(0, |(_, length)| *length)
    }

    #[inline(always)]
    pub fn encode_symbol(&self, symbol: u32, stream: &mut BitStreamWriter) {
        // tables are always built over every symbol we write
        if let Some((code, length)) = self.codes.get(&symbol) {
            stream.put_bits(*code, *length);
        }
    }
}

fn read_u8<T: ZByteReaderTrait>(reader: &mut ZReader<T>) -> Result<u8, ZByteIoError> {
    let mut byte = [0; 1];
    reader.read_exact_bytes(&mut byte)?;
    Ok(byte[0])
}

fn read_u32_be<T: ZByteReaderTrait>(reader: &mut ZReader<T>) -> Result<u32, ZByteIoError> {
    let mut bytes = [0; 4];
    reader.read_exact_bytes(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use alloc::vec::Vec;

    use zune_core::bytestream::{ZCursor, ZReader, ZWriter};

    use crate::bitstream::{BitStreamReader, BitStreamWriter};
    use crate::errors::ManpackErrors;
    use crate::huffman::{build_code_lengths, calculate_weights, HuffmanEncoder, HuffmanTable};

    fn weights_of(pairs: &[(u32, usize)]) -> BTreeMap<u32, usize> {
        pairs.iter().copied().collect()
    }

    fn kraft_is_complete(lengths: &[(u32, u8)], max: usize) -> bool {
        let sum: u64 = lengths.iter().map(|(_, l)| 1_u64 << (max - usize::from(*l))).sum();
        sum == 1_u64 << max
    }

    #[test]
    fn test_heavier_symbols_get_shorter_codes() {
        let weights = weights_of(&[
            (0, 30),
            (1, 100),
            (2, 20),
            (3, 10),
            (4, 70),
            (5, 90),
            (6, 60),
            (7, 80),
            (8, 50),
            (9, 40)
        ]);
        let lengths: BTreeMap<u32, u8> = build_code_lengths(&weights, 32).into_iter().collect();
        let expected_order = [1, 5, 7, 4, 6, 8, 9, 0, 2, 3];

        for pair in expected_order.windows(2) {
            assert!(lengths[&pair[0]] <= lengths[&pair[1]]);
        }
    }

    #[test]
    fn test_code_lengths_are_stable() {
        let weights = weights_of(&[
            (0, 30),
            (1, 100),
            (2, 20),
            (3, 10),
            (4, 10),
            (5, 50),
            (6, 25),
            (7, 50),
            (8, 25),
            (9, 10)
        ]);
        let first = build_code_lengths(&weights, 32);

        for _ in 0..5 {
            assert_eq!(first, build_code_lengths(&weights, 32));
        }
    }

    #[test]
    fn test_empty_and_lone_symbol() {
        assert!(build_code_lengths(&BTreeMap::new(), 32).is_empty());
        assert_eq!(build_code_lengths(&weights_of(&[(42, 7)]), 32), vec![(42, 1)]);
    }

    #[test]
    fn test_lengths_are_capped() {
        // fibonacci weights produce the deepest possible tree
        let mut fib = vec![1_usize, 1];
        while fib.len() < 40 {
            let next = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(next);
        }
        let weights: BTreeMap<u32, usize> =
            fib.iter().enumerate().map(|(i, w)| (i as u32, *w)).collect();

        let unlimited = build_code_lengths(&weights, 64);
        assert!(unlimited.iter().any(|(_, l)| *l > 12));

        let capped = build_code_lengths(&weights, 12);
        assert!(capped.iter().all(|(_, l)| *l <= 12));
        assert!(kraft_is_complete(&capped, 12));
    }

    #[test]
    fn test_canonical_codes_are_prefix_free() {
        let weights = calculate_weights([5_u32, 5, 5, 5, 9, 9, 1, 2, 3].into_iter());
        let table = HuffmanTable::from_weights(&weights);
        let codes: Vec<(u32, u8)> = table.codes().into_values().collect();

        for (i, (code_a, len_a)) in codes.iter().enumerate() {
            for (j, (code_b, len_b)) in codes.iter().enumerate() {
                if i != j && len_a <= len_b {
                    assert_ne!(code_b >> (len_b - len_a), *code_a);
                }
            }
        }
    }

    #[test]
    fn test_table_serialization() {
        let weights = calculate_weights([1_u32, 2, 3, 1, 2, 3, 5, 6, 7, 1, 5, 7].into_iter());
        let table = HuffmanTable::from_weights(&weights);

        let mut bytes: Vec<u8> = vec![];
        table.write(&mut ZWriter::new(&mut bytes)).unwrap();
        assert_eq!(bytes.len(), table.serialized_size());

        let mut reader = ZReader::new(ZCursor::new(&bytes));
        let read_back = HuffmanTable::read(&mut reader, bytes.len()).unwrap();
        assert_eq!(table, read_back);
    }

    #[test]
    fn test_over_subscribed_table_is_rejected() {
        let mut bytes: Vec<u8> = vec![];
        bytes.extend_from_slice(&3_u32.to_be_bytes());
        bytes.push(1);
        // three codes of length one cannot exist
        bytes.extend_from_slice(&3_u32.to_be_bytes());
        for symbol in [1_u32, 2, 3] {
            bytes.extend_from_slice(&symbol.to_be_bytes());
        }
        let mut reader = ZReader::new(ZCursor::new(&bytes));
        let err = HuffmanTable::read(&mut reader, bytes.len()).unwrap_err();
        assert!(matches!(err, ManpackErrors::CorruptPayload(_)));
    }

    #[test]
    fn test_symbols_survive_bitstream() {
        let data = [1_u32, 1, 6, 5, 4, 3, 2, 6, 5, 4, 3, 2, 1, 1, 5, u32::MAX];
        let table = HuffmanTable::from_weights(&calculate_weights(data.iter().copied()));
        let encoder = HuffmanEncoder::new(&table);

        let mut writer = BitStreamWriter::new();
        for symbol in data {
            encoder.encode_symbol(symbol, &mut writer);
        }
        let bytes = writer.finish();
        let mut reader = BitStreamReader::new(&bytes);

        let decoded: Vec<u32> = (0..data.len())
            .map(|_| table.decode_symbol(&mut reader).unwrap())
            .collect();
        assert_eq!(&decoded[..], &data[..]);
    }
}
