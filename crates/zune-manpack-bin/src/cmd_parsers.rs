use clap::ArgMatches;
use zune_core::options::DecoderOptions;
use zune_manpack::Predictor;

use crate::cmd_args::PredictorArg;
use crate::cmd_parsers::global_options::CmdOptions;

pub mod global_options;

/// Decoder options for reading input images and `.mp` files
pub fn get_decoder_options(cmd_opts: &CmdOptions) -> DecoderOptions {
    DecoderOptions::new_cmd()
        .set_max_height(cmd_opts.max_height)
        .set_max_width(cmd_opts.max_width)
        .set_strict_mode(cmd_opts.strict_mode)
}

/// Predictor requested by a subcommand, `left` if it takes none
pub fn get_predictor(options: &ArgMatches) -> Predictor {
    options
        .try_get_one::<PredictorArg>("predictor")
        .ok()
        .flatten()
        .map_or(Predictor::default(), |arg| arg.0)
}
