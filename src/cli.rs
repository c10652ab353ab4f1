use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use crate::{corpus::Document, errors::Result, hmm::Smoothing, pos_tagger::PosTagger};

/// Train a part-of-speech tagger on the 1st XML file, tag the 2nd XML file,
/// and write the result to the 3rd XML file.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Argv {
    /// tagged training corpus
    #[arg(value_name = "TRAIN_XML")]
    pub train: PathBuf,
    /// untagged corpus to tag
    #[arg(value_name = "TEST_XML")]
    pub test: PathBuf,
    /// where to write the tagged corpus
    #[arg(value_name = "OUTPUT_XML")]
    pub output: PathBuf,
}

/// Runs the whole pipeline. Nothing is written unless every step succeeds.
pub fn run(argv: &Argv, smoothing: Smoothing) -> Result<()> {
    let training = Document::from_path(&argv.train)?;
    log::info!("read training file: {} sentences", training.num_sentences());
    let mut testing = Document::from_path(&argv.test)?;
    log::info!("read testing file: {} sentences", testing.num_sentences());

    let mut tagger = PosTagger::new(smoothing);
    tagger.train(&training)?;
    drop(training);
    log::info!("trained");

    tagger.tag(&mut testing)?;
    testing.to_path(&argv.output)?;
    log::info!("write tagged corpus to {}", argv.output.display());
    Ok(())
}

/// Entry point shared by the binaries; they differ only in `smoothing`.
pub fn main(smoothing: Smoothing) -> ExitCode {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("argv: {:?}, smoothing: {}", argv, smoothing);
    match run(&argv, smoothing) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
