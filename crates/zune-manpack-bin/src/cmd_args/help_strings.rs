pub static PREDICTOR_HELP: &str = "Spatial predictor applied before entropy coding

Each pixel is replaced by its per channel difference from a prediction
made out of already coded neighbours.

none:    store pixels as is
left:    left neighbour
up:      upper neighbour
average: mean of left and upper neighbours
paeth:   PNG paeth predictor";

pub static ROUNDTRIP_HELP: &str = "Compress, write, read back and verify images

The input is compressed and written to the output path, the written
file is then read again, decompressed and compared pixel by pixel
with the input. The compression ratio is reported on success.";

pub static STRICT_HELP: &str = "Treat most warnings as errors

In strict mode non zero padding bits at the end of a .mp bitstream
are rejected instead of being ignored";
