use std::process::ExitCode;

use postag::Smoothing;

fn main() -> ExitCode {
    postag::cli::main(Smoothing::Plain)
}
