mod args;
mod grade;

use clap::Parser;
use log::info;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose && std::env::var("RUST_LOG").is_err() {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    if let Err(e) = grade::run_grading(&args) {
        grade::print_error(&e);
        std::process::exit(1);
    }
}
