/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use clap::builder::PossibleValue;
use clap::{value_parser, Arg, ArgAction, Command, ValueEnum};
use zune_manpack::Predictor;

pub mod help_strings;

/// Predictor choice as understood by clap
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PredictorArg(pub Predictor);

impl ValueEnum for PredictorArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Self(Predictor::Left),
            Self(Predictor::None),
            Self(Predictor::Up),
            Self(Predictor::Average),
            Self(Predictor::Paeth)
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.0.name()))
    }
}

fn input_arg(help: &'static str) -> Arg {
    Arg::new("in")
        .short('i')
        .long("input")
        .help(help)
        .action(ArgAction::Append)
        .required(true)
}

fn output_arg(help: &'static str) -> Arg {
    Arg::new("out")
        .short('o')
        .long("output")
        .help(help)
        .action(ArgAction::Append)
        .required(true)
}

fn predictor_arg() -> Arg {
    Arg::new("predictor")
        .long("predictor")
        .help_heading("ENCODER")
        .help("Spatial predictor applied before entropy coding")
        .long_help(help_strings::PREDICTOR_HELP)
        .value_parser(value_parser!(PredictorArg))
        .default_value("left")
}

#[rustfmt::skip]
pub fn create_cmd_args() -> Command {
    Command::new("manpack")
        .about("Lossless compression of 32 bit images into the ManPack (.mp) format")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("compress")
            .about("Compress BMP or JPEG images into .mp files")
            .arg(input_arg("BMP or JPEG file to compress"))
            .arg(output_arg("Where to write the .mp file"))
            .arg(predictor_arg()))
        .subcommand(Command::new("decompress")
            .about("Decompress .mp files into QOI images")
            .arg(input_arg(".mp file to decompress"))
            .arg(output_arg("Where to write the .qoi file")))
        .subcommand(Command::new("roundtrip")
            .about("Compress, write, read back and verify images")
            .long_about(help_strings::ROUNDTRIP_HELP)
            .arg(input_arg("BMP or JPEG file to compress"))
            .arg(output_arg("Where to write the .mp file"))
            .arg(predictor_arg()))
        .subcommand(Command::new("probe")
            .about("Print .mp header information as JSON")
            .arg(input_arg(".mp files to inspect")))
        .arg(Arg::new("debug")
            .long("debug")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display debug information and higher"))
        .arg(Arg::new("trace")
            .long("trace")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display very verbose information"))
        .arg(Arg::new("warn")
            .long("warn")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display warnings and errors"))
        .arg(Arg::new("info")
            .long("info")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display information about the decoding options"))
        .arg(Arg::new("max-width")
            .long("max-width")
            .global(true)
            .help_heading("ADVANCED")
            .help("Maximum width of images to decode")
            .value_parser(value_parser!(usize))
            .default_value("32768"))
        .arg(Arg::new("max-height")
            .long("max-height")
            .global(true)
            .help_heading("ADVANCED")
            .help("Maximum height of images to decode")
            .value_parser(value_parser!(usize))
            .default_value("32768"))
        .arg(Arg::new("strict")
            .long("strict")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("ADVANCED")
            .help("Treat most warnings as errors")
            .long_help(help_strings::STRICT_HELP))
}

#[cfg(test)]
mod tests {
    use zune_manpack::Predictor;

    use crate::cmd_args::{create_cmd_args, PredictorArg};

    #[test]
    fn test_command_is_valid() {
        create_cmd_args().debug_assert();
    }

    #[test]
    fn test_predictor_flag() {
        let matches = create_cmd_args()
            .try_get_matches_from(["manpack", "compress", "-i", "a.bmp", "-o", "a.mp", "--predictor", "paeth"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        assert_eq!(sub.get_one::<PredictorArg>("predictor"), Some(&PredictorArg(Predictor::Paeth)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = create_cmd_args()
            .try_get_matches_from(["manpack", "probe", "-i", "a.mp", "--strict", "--max-width", "10"])
            .unwrap();

        assert!(matches.get_flag("strict"));
        assert_eq!(matches.get_one::<usize>("max-width"), Some(&10));
    }
}
