use clap::Parser;
use vpascan::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
