/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use clap::parser::ValueSource;
use clap::ArgMatches;
use log::{info, Level};

#[derive(Debug, Copy, Clone)]
pub struct CmdOptions {
    pub max_width:   usize,
    pub max_height:  usize,
    pub strict_mode: bool
}

impl CmdOptions {
    pub fn new() -> CmdOptions {
        CmdOptions {
            max_width:   0,
            max_height:  0,
            strict_mode: false
        }
    }
}

pub fn parse_options(options: &ArgMatches) -> CmdOptions {
    let mut cmd_options = CmdOptions::new();

    let width = *options.get_one::<usize>("max-width").unwrap();
    let height = *options.get_one::<usize>("max-height").unwrap();

    cmd_options.max_width = width;
    cmd_options.max_height = height;

    if options.value_source("strict") == Some(ValueSource::CommandLine) {
        info!("Enabling strict mode");
        cmd_options.strict_mode = true;
    }
    cmd_options
}

/// Set up logging options
pub fn setup_logger(options: &ArgMatches) {
    let log_level;

    if *options.get_one::<bool>("debug").unwrap() {
        log_level = Level::Debug;
    } else if *options.get_one::<bool>("trace").unwrap() {
        log_level = Level::Trace;
    } else if *options.get_one::<bool>("warn").unwrap() {
        log_level = Level::Warn
    } else if *options.get_one::<bool>("info").unwrap() {
        log_level = Level::Info;
    } else {
        log_level = Level::Warn;
    }

    simple_logger::init_with_level(log_level).unwrap();

    info!("Initialized logger");
    info!("Log level :{}", log_level);
}

#[cfg(test)]
mod tests {
    use crate::cmd_args::create_cmd_args;
    use crate::cmd_parsers::global_options::parse_options;

    #[test]
    fn test_defaults() {
        let matches = create_cmd_args()
            .try_get_matches_from(["manpack", "probe", "-i", "a.mp"])
            .unwrap();
        let options = parse_options(&matches);

        assert_eq!(options.max_width, 32768);
        assert_eq!(options.max_height, 32768);
        assert!(!options.strict_mode);
    }

    #[test]
    fn test_limits_and_strict() {
        let matches = create_cmd_args()
            .try_get_matches_from([
                "manpack",
                "--max-height",
                "7",
                "decompress",
                "-i",
                "a.mp",
                "-o",
                "a.qoi",
                "--strict"
            ])
            .unwrap();
        let options = parse_options(&matches);

        assert_eq!(options.max_height, 7);
        assert!(options.strict_mode);
    }
}
