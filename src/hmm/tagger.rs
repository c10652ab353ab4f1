use super::{
    context::HmmContext,
    model::{HmmModel, Model, START},
    Annotate, Observation,
};
use crate::{
    errors::{Error, Result},
    quark::StringTable,
};

pub trait Tagger {
    /// Computes the state scores of a sentence.
    fn set_sentence<O: Observation>(&mut self, sentence: &[O]);
    /// Number of items of the current sentence.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Best label sequence of the current sentence and its score.
    fn viterbi(&mut self, labels: &mut [usize]) -> f64;
    /// Score of the given label sequence for the current sentence.
    fn score(&self, labels: &[usize]) -> f64;
}

/// Viterbi decoder bound to a trained model.
///
/// Label #l stands for tag id l + 1; the start sentinel is never assigned.
pub struct HmmTagger<'a> {
    model: &'a HmmModel,
    ctx: HmmContext,
}

impl<'a> HmmTagger<'a> {
    pub fn new(model: &'a HmmModel) -> Result<Self> {
        if !model.is_trained() {
            return Err(Error::NotTrained);
        }
        let num_labels = model.num_labels();
        let mut ctx = HmmContext::new(num_labels, 0);
        // Transition scores do not depend on the sentence.
        for j in 0..num_labels {
            ctx.start[j] = model.transition(START, to_tag(j));
            for i in 0..num_labels {
                ctx.trans[num_labels * i + j] = model.transition(to_tag(i), to_tag(j));
            }
        }
        Ok(Self { model, ctx })
    }

    pub fn model(&self) -> &'a HmmModel {
        self.model
    }

    pub fn label(&self, l: usize) -> &'a str {
        self.model.tags.to_str(to_tag(l)).unwrap_or("N/A")
    }

    /// Returns the best tag for every word of `sentence`.
    pub fn tag<O: Observation>(&mut self, sentence: &[O]) -> Vec<&'a str> {
        if sentence.is_empty() {
            return Vec::new();
        }
        self.set_sentence(sentence);
        let mut labels = vec![0; sentence.len()];
        let score = self.viterbi(&mut labels);
        log::trace!("viterbi score: {score}");
        labels.into_iter().map(|l| self.label(l)).collect()
    }

    /// Writes the best tag of every word into its `pos` attribute.
    pub fn tag_sentence<A: Annotate>(&mut self, sentence: &mut [A]) {
        if sentence.is_empty() {
            return;
        }
        let tags = self.tag(sentence);
        for (token, tag) in sentence.iter_mut().zip(tags) {
            token.set_pos(tag);
        }
    }
}

impl<'a> Tagger for HmmTagger<'a> {
    fn set_sentence<O: Observation>(&mut self, sentence: &[O]) {
        let num_labels = self.ctx.num_labels;
        self.ctx.set_num_items(sentence.len());
        for (t, o) in sentence.iter().enumerate() {
            let word = self.model.word_id(&o.word());
            for j in 0..num_labels {
                self.ctx.state[num_labels * t + j] = self.model.emission(to_tag(j), word);
            }
        }
    }

    fn len(&self) -> usize {
        self.ctx.num_items()
    }

    fn viterbi(&mut self, labels: &mut [usize]) -> f64 {
        self.ctx.viterbi(labels)
    }

    fn score(&self, labels: &[usize]) -> f64 {
        self.ctx.score(labels)
    }
}

#[inline]
fn to_tag(label: usize) -> usize {
    label + START + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        corpus::Token,
        hmm::{trainer::HmmTrainer, Smoothing, EPSILON},
    };

    fn train(smoothing: Smoothing, corpus: &[&[(&str, &str)]]) -> HmmModel {
        let mut trainer = HmmTrainer::new(smoothing);
        for &sentence in corpus {
            trainer.append(sentence).unwrap();
        }
        trainer.train()
    }

    #[test]
    fn untrained_model() {
        let model = HmmModel::default();
        match HmmTagger::new(&model) {
            Err(Error::NotTrained) => {}
            _ => panic!("test fail"),
        }
    }

    #[test]
    fn toy_sentence() {
        let model = train(Smoothing::Plain, &[&[("the", "DT"), ("dog", "NN"), ("runs", "VB")]]);
        let mut tagger = HmmTagger::new(&model).unwrap();
        assert_eq!(tagger.tag(&["the", "dog", "runs"]), vec!["DT", "NN", "VB"]);
        assert_eq!(tagger.tag(&["The", "DOG", "Runs"]), vec!["DT", "NN", "VB"]);
        assert_eq!(tagger.len(), 3);
    }

    #[test]
    fn unknown_word_uses_prior() {
        let model = train(
            Smoothing::Plain,
            &[&[("the", "DT"), ("dog", "NN")], &[("a", "DT"), ("cat", "NN")], &[("fish", "NN")]],
        );
        let mut tagger = HmmTagger::new(&model).unwrap();
        tagger.set_sentence(&["zebra"]);
        for l in 0..model.num_labels() {
            let tag = to_tag(l);
            let expected = model.prior(tag).unwrap() + model.transition(START, tag);
            assert!((tagger.score(&[l]) - expected).abs() < 1e-9);
        }
        let tags = tagger.tag(&["zebra"]);
        assert_eq!(tags.len(), 1);
        assert!(model.labels().contains(&tags[0]));
    }

    #[test]
    fn known_word_unseen_with_tag() {
        let model = train(Smoothing::Plain, &[&[("the", "DT"), ("dog", "NN")]]);
        let mut tagger = HmmTagger::new(&model).unwrap();
        tagger.set_sentence(&["dog"]);
        let dt = model.tag_id("DT").unwrap() - 1;
        let expected = EPSILON + model.transition(START, dt + 1);
        assert!((tagger.score(&[dt]) - expected).abs() < 1e-6);
    }

    #[test]
    fn tag_sentence_sets_pos() {
        let model = train(Smoothing::GoodTuring, &[&[("the", "DT"), ("dog", "NN"), ("runs", "VB")]]);
        let mut tagger = HmmTagger::new(&model).unwrap();
        let mut sentence = vec![Token::new("the"), Token::new("dog"), Token::new("flies")];
        tagger.tag_sentence(&mut sentence);
        assert!(sentence.iter().all(|t| t.pos().is_some()));
        assert_eq!(sentence[0].pos(), Some("DT"));

        let mut empty: Vec<Token> = vec![];
        tagger.tag_sentence(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn deterministic() {
        let model = train(
            Smoothing::GoodTuring,
            &[&[("time", "NN"), ("flies", "VBZ"), ("fast", "RB")], &[("fruit", "NN"), ("flies", "NNS"), ("like", "VBP")]],
        );
        let mut tagger = HmmTagger::new(&model).unwrap();
        let first = tagger.tag(&["time", "flies", "like", "an", "arrow"]);
        for _ in 0..10 {
            assert_eq!(tagger.tag(&["time", "flies", "like", "an", "arrow"]), first);
        }
        assert_eq!(first.len(), 5);
    }
}
