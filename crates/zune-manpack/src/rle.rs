/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use alloc::vec::Vec;

use crate::constants::MAX_RUN;

/// Collapse consecutive equal values into `(value, run)` pairs
///
/// Runs longer than [`MAX_RUN`] are split, so every run is in `1..=MAX_RUN`.
pub(crate) fn run_length_encode(values: &[u32]) -> Vec<(u32, u32)> {
    let mut pairs: Vec<(u32, u32)> = Vec::new();

    for value in values {
        match pairs.last_mut() {
            Some((last, run)) if *last == *value && *run < MAX_RUN => *run += 1,
            _ => pairs.push((*value, 1))
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::constants::MAX_RUN;
    use crate::rle::run_length_encode;

    #[test]
    fn test_runs_collapse() {
        let pairs = run_length_encode(&[0, 0, 0, 7, 7, 1, 0]);
        assert_eq!(pairs, vec![(0, 3), (7, 2), (1, 1), (0, 1)]);
    }

    #[test]
    fn test_long_runs_split() {
        let values = vec![9; MAX_RUN as usize * 2 + 5];
        let pairs = run_length_encode(&values);
        assert_eq!(pairs, vec![(9, MAX_RUN), (9, MAX_RUN), (9, 5)]);
    }

    #[test]
    fn test_empty() {
        let pairs: Vec<(u32, u32)> = run_length_encode(&[]);
        assert!(pairs.is_empty());
    }
}
