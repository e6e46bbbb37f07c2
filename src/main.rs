use std::env::args_os;

use accel_est::{args::Args, run_main};
use clap::Parser;
use eyre::Result;
fn main() -> Result<()> {
    let args = args_os();
    let args = Args::parse_from(args);
    run_main::main(args)
}
