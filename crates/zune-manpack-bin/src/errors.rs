/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use std::fmt::{Debug, Formatter};

use zune_manpack::{ManpackEncodeErrors, ManpackErrors};

/// Errors that stop a command line workflow
pub enum CliErrors {
    Io(std::io::Error),
    Decode(ManpackErrors),
    Encode(ManpackEncodeErrors),
    /// An input image in another format could not be loaded
    Input(String),
    /// Decompressed pixels differ from the input
    ///
    /// Argument is the index of the first differing pixel
    Mismatch(usize),
    GenericString(String)
}

impl Debug for CliErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CliErrors::Io(err) => writeln!(f, "I/O error: {err}"),
            CliErrors::Decode(err) => writeln!(f, "Could not decode .mp file: {err:?}"),
            CliErrors::Encode(err) => writeln!(f, "Could not encode .mp file: {err:?}"),
            CliErrors::Input(reason) => writeln!(f, "Could not load input image: {reason}"),
            CliErrors::Mismatch(index) => {
                writeln!(f, "Round trip mismatch, first differing pixel at {index}")
            }
            CliErrors::GenericString(reason) => writeln!(f, "{reason}")
        }
    }
}

impl From<std::io::Error> for CliErrors {
    fn from(value: std::io::Error) -> Self {
        CliErrors::Io(value)
    }
}

impl From<ManpackErrors> for CliErrors {
    fn from(value: ManpackErrors) -> Self {
        CliErrors::Decode(value)
    }
}

impl From<ManpackEncodeErrors> for CliErrors {
    fn from(value: ManpackEncodeErrors) -> Self {
        CliErrors::Encode(value)
    }
}
