//! Part-of-speech tagging with a bigram hidden Markov model.
//!
//! Tag priors, tag transitions and word emissions are estimated from a tagged
//! corpus; sentences are then tagged with the Viterbi algorithm. Transitions
//! use add-one smoothing, emissions either plain relative frequencies or
//! Good-Turing re-estimated counts (see [`Smoothing`]).

pub mod cli;
pub mod corpus;
pub mod errors;
pub mod evaluation;
pub mod hmm;
pub mod pos_tagger;
pub mod quark;

pub use corpus::{Document, Paragraph, Sentence, Token};
pub use errors::{Error, Result};
pub use evaluation::{Estimation, Evaluation};
pub use hmm::{
    model::{HmmModel, Model},
    tagger::{HmmTagger, Tagger},
    trainer::HmmTrainer,
    Annotate, Observation, Smoothing,
};
pub use pos_tagger::PosTagger;
