use std::time::Instant;

use crate::{
    corpus::{Document, Sentence},
    errors::{Error, Result},
    evaluation::Evaluation,
    hmm::{model::HmmModel, tagger::HmmTagger, trainer::HmmTrainer, Observation, Smoothing},
};

/// Trains a bigram HMM on a tagged document and tags other documents with it.
///
/// ```
/// use postag::{Document, PosTagger, Smoothing, Token};
///
/// let training = Document::from(vec![vec![vec![
///     Token::with_pos("the", "DT"),
///     Token::with_pos("dog", "NN"),
///     Token::with_pos("runs", "VB"),
/// ]]]);
/// let mut tagger = PosTagger::new(Smoothing::Plain);
/// tagger.train(&training)?;
///
/// let mut sentence = vec![Token::new("The"), Token::new("dog"), Token::new("runs")];
/// tagger.tag_sentence(&mut sentence)?;
/// assert_eq!(sentence[2].pos(), Some("VB"));
/// # Ok::<(), postag::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct PosTagger {
    smoothing: Smoothing,
    model: Option<HmmModel>,
}

impl PosTagger {
    pub fn new(smoothing: Smoothing) -> Self {
        Self { smoothing, model: None }
    }

    pub fn from_model(model: HmmModel) -> Self {
        Self { smoothing: model.smoothing(), model: Some(model) }
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn model(&self) -> Option<&HmmModel> {
        self.model.as_ref()
    }

    /// Replaces the current model with one estimated from `training`.
    pub fn train(&mut self, training: &Document) -> Result<()> {
        self.model = None;
        let mut trainer = HmmTrainer::new(self.smoothing);
        trainer.append_document(training)?;
        self.model = Some(trainer.train());
        Ok(())
    }

    fn tagger(&self) -> Result<HmmTagger<'_>> {
        match &self.model {
            Some(model) => HmmTagger::new(model),
            None => Err(Error::NotTrained),
        }
    }

    /// Sets the `pos` attribute of every token. Empty sentences are left untouched.
    pub fn tag_sentence(&self, sentence: &mut Sentence) -> Result<()> {
        if sentence.is_empty() {
            return Ok(());
        }
        self.tagger()?.tag_sentence(sentence);
        Ok(())
    }

    /// Tags every sentence of every paragraph in document order.
    pub fn tag(&self, doc: &mut Document) -> Result<()> {
        let mut tagger = self.tagger()?;
        let begin = Instant::now();
        for sentence in doc.sentences_mut() {
            tagger.tag_sentence(sentence);
        }
        log::info!(
            "tagged {} sentences ({} tokens), time cost: {:?}",
            doc.num_sentences(),
            doc.num_tokens(),
            begin.elapsed()
        );
        Ok(())
    }

    /// Tags a copy of `gold` and compares the result with its `pos` attributes.
    ///
    /// Tokens without a gold tag are scored as mismatches.
    pub fn evaluate(&self, gold: &Document) -> Result<Evaluation> {
        let mut tagger = self.tagger()?;
        let mut evaluation = Evaluation::default();
        for sentence in gold.sentences() {
            let reference: Vec<&str> = sentence.iter().map(|t| Observation::pos(t).unwrap_or("")).collect();
            let prediction = tagger.tag(sentence);
            evaluation.accumulate(&reference, &prediction);
        }
        evaluation.evaluate();
        Ok(evaluation)
    }
}
