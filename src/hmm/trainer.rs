use std::{collections::HashMap, time::Instant};

use super::{
    frequency::FrequencyTable, model::HmmModel, model::START, Observation, Smoothing, EPSILON,
    PREVIOUS_TAG, START_TAG,
};
use crate::{
    corpus::Document,
    errors::{Error, Result},
    quark::{Quark, StringTable, TextVectorizer},
};

/// Raw frequencies gathered from tagged sentences.
#[derive(Debug)]
struct Counts {
    tags: Quark,
    words: Quark,
    tag: Vec<usize>,
    word: Vec<usize>,
    /// (previous tag, tag) -> count
    tag_tag: HashMap<(usize, usize), usize>,
    /// (tag, word) -> count
    tag_word: HashMap<(usize, usize), usize>,
    num_tokens: usize,
    num_sentences: usize,
}

impl Default for Counts {
    fn default() -> Self {
        let mut tags = Quark::default();
        tags.find_or_insert(START_TAG);
        Self {
            tags,
            words: Quark::default(),
            tag: vec![0],
            word: Vec::new(),
            tag_tag: HashMap::new(),
            tag_word: HashMap::new(),
            num_tokens: 0,
            num_sentences: 0,
        }
    }
}

impl Counts {
    fn add_tag(&mut self, tag: &str) -> usize {
        let id = self.tags.find_or_insert(tag);
        if id == self.tag.len() {
            self.tag.push(0);
        }
        self.tag[id] += 1;
        id
    }

    fn add_word(&mut self, word: &str) -> usize {
        let id = self.words.find_or_insert(word);
        if id == self.word.len() {
            self.word.push(0);
        }
        self.word[id] += 1;
        id
    }

    fn add_sentence<'a>(&mut self, items: impl Iterator<Item = (String, &'a str)>) {
        self.tag[START] += 1;
        let mut prev = START;
        for (word, tag) in items {
            let curr = self.add_tag(tag);
            let wid = self.add_word(&word);
            *self.tag_word.entry((curr, wid)).or_default() += 1;
            *self.tag_tag.entry((prev, curr)).or_default() += 1;
            prev = curr;
            self.num_tokens += 1;
        }
        self.num_sentences += 1;
    }
}

/// Accumulates tagged sentences and estimates an [`HmmModel`] from them.
#[derive(Debug, Default)]
pub struct HmmTrainer {
    smoothing: Smoothing,
    counts: Counts,
    num_appended: usize,
}

impl HmmTrainer {
    pub fn new(smoothing: Smoothing) -> Self {
        Self { smoothing, ..Default::default() }
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn num_tokens(&self) -> usize {
        self.counts.num_tokens
    }

    /// Counts one tagged sentence. Empty sentences are ignored.
    ///
    /// The sentence is rejected as a whole if a token lacks a tag or uses a
    /// reserved one.
    pub fn append<O: Observation>(&mut self, sentence: &[O]) -> Result<()> {
        let index = self.num_appended;
        self.num_appended += 1;
        if sentence.is_empty() {
            return Ok(());
        }
        let tags = sentence
            .iter()
            .enumerate()
            .map(|(position, o)| match o.pos() {
                Some(tag) if tag == START_TAG || tag == PREVIOUS_TAG => Err(Error::ReservedTag(tag.to_string())),
                Some(tag) => Ok(tag),
                None => Err(Error::MissingTag { sentence: index, position }),
            })
            .collect::<Result<Vec<_>>>()?;
        self.counts.add_sentence(sentence.iter().map(Observation::word).zip(tags));
        Ok(())
    }

    pub fn append_document(&mut self, doc: &Document) -> Result<()> {
        for sentence in doc.sentences() {
            self.append(sentence)?;
        }
        Ok(())
    }

    /// Turns the accumulated counts into a model and resets the trainer.
    pub fn train(&mut self) -> HmmModel {
        let counts = std::mem::take(&mut self.counts);
        self.num_appended = 0;
        if counts.num_tokens == 0 {
            log::warn!("no tagged tokens, the model is empty");
            return HmmModel { smoothing: self.smoothing, unseen_emission: EPSILON, ..Default::default() };
        }
        let begin = Instant::now();
        log::info!(
            "train (smoothing: {}, sentences: {}, tokens: {}, tags: {}, words: {})",
            self.smoothing,
            counts.num_sentences,
            counts.num_tokens,
            counts.tags.len(),
            counts.words.len()
        );

        let n = counts.num_tokens as f64;
        let priors = counts.tag.iter().map(|&c| (c as f64 / n).ln()).collect();
        let transitions = laplace_transitions(&counts);
        let (emissions, unseen_emission) = match self.smoothing {
            Smoothing::Plain => (plain_emissions(&counts), EPSILON),
            Smoothing::GoodTuring => good_turing_emissions(&counts),
        };
        log::debug!(
            "transitions: {}, emissions: {}, unseen emission: {}",
            transitions.len(),
            emissions.len(),
            unseen_emission
        );
        log::info!("time cost: {:?}", begin.elapsed());

        HmmModel {
            smoothing: self.smoothing,
            tags: counts.tags,
            words: counts.words,
            priors,
            transitions,
            emissions,
            unseen_emission,
        }
    }
}

/// `ln((c(i, j) + 1) / (c(i) + |tags|))` for every observed pair.
fn laplace_transitions(counts: &Counts) -> HashMap<(usize, usize), f64> {
    let num_tags = counts.tags.len() as f64;
    counts
        .tag_tag
        .iter()
        .map(|(&(i, j), &c)| ((i, j), ((c as f64 + 1.0) / (counts.tag[i] as f64 + num_tags)).ln()))
        .collect()
}

/// `ln(c(t, w) / c(w))`.
fn plain_emissions(counts: &Counts) -> HashMap<(usize, usize), f64> {
    counts
        .tag_word
        .iter()
        .map(|(&(t, w), &c)| ((t, w), (c as f64 / counts.word[w] as f64).ln()))
        .collect()
}

/// `ln(r' * c(t, w) / c(w))` with the Good-Turing adjusted count `r'`, plus the
/// shared score `ln(N[1] / |emissions|)` for unseen pairs.
fn good_turing_emissions(counts: &Counts) -> (HashMap<(usize, usize), f64>, f64) {
    let freq = FrequencyTable::from_counts(counts.tag_word.values().copied());
    let emissions: HashMap<_, _> = counts
        .tag_word
        .iter()
        .map(|(&(t, w), &c)| {
            let r = freq.adjusted_count(c).unwrap_or(c as f64);
            ((t, w), (r * c as f64 / counts.word[w] as f64).ln())
        })
        .collect();
    let unseen = match freq.singletons() {
        Some(n1) => (n1 as f64 / emissions.len() as f64).ln(),
        None => EPSILON,
    };
    (emissions, unseen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::model::Model;

    const TOY: [(&str, &str); 3] = [("the", "DT"), ("dog", "NN"), ("runs", "VB")];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn counts_toy_sentence() {
        let mut trainer = HmmTrainer::new(Smoothing::Plain);
        trainer.append(&TOY).unwrap();
        assert_eq!(trainer.num_tokens(), 3);
        let model = trainer.train();
        assert_eq!(model.labels(), vec!["DT", "NN", "VB"]);
        assert_eq!(model.num_tags(), 4);
        let dt = model.tag_id("DT").unwrap();
        let nn = model.tag_id("NN").unwrap();
        // one START and one DT out of three tokens
        assert!(close(model.prior(START).unwrap(), (1.0f64 / 3.0).ln()));
        assert!(close(model.prior(dt).unwrap(), (1.0f64 / 3.0).ln()));
        // (1 + 1) / (1 + 4)
        assert!(close(model.transition(START, dt), 0.4f64.ln()));
        assert!(close(model.transition(dt, nn), 0.4f64.ln()));
        assert_eq!(model.num_transitions(), 3);
        assert!(close(model.emission(dt, model.word_id("the")), 0.0));
        assert_eq!(model.emission(dt, model.word_id("dog")), EPSILON);
    }

    #[test]
    fn start_counted_once_per_sentence() {
        let mut trainer = HmmTrainer::new(Smoothing::Plain);
        trainer.append(&TOY).unwrap();
        trainer.append(&[("dogs", "NN")]).unwrap();
        trainer.append::<(&str, &str)>(&[]).unwrap();
        let model = trainer.train();
        // two non-empty sentences over four tokens
        assert!(close(model.prior(START).unwrap(), 0.5f64.ln()));
        let nn = model.tag_id("NN").unwrap();
        // START -> NN seen once, START seen twice, four tags
        assert!(close(model.transition(START, nn), (2.0f64 / 6.0).ln()));
    }

    #[test]
    fn words_are_case_folded() {
        let mut trainer = HmmTrainer::new(Smoothing::Plain);
        trainer.append(&[("The", "DT"), ("the", "DT"), ("THE", "DT")]).unwrap();
        let model = trainer.train();
        assert_eq!(model.words().len(), 1);
        assert!(model.is_known("the"));
    }

    #[test]
    fn missing_tag_rejects_sentence() {
        let mut trainer = HmmTrainer::new(Smoothing::Plain);
        trainer.append(&TOY).unwrap();
        let ret = trainer.append(&["untagged"]);
        match ret {
            Err(Error::MissingTag { sentence: 1, position: 0 }) => {}
            _ => panic!("test fail"),
        }
        assert_eq!(trainer.num_tokens(), 3);
    }

    #[test]
    fn reserved_tags() {
        let mut trainer = HmmTrainer::new(Smoothing::Plain);
        for tag in [START_TAG, PREVIOUS_TAG] {
            match trainer.append(&[("x", tag)]) {
                Err(Error::ReservedTag(t)) => assert_eq!(t, tag),
                _ => panic!("test fail"),
            }
        }
        assert_eq!(trainer.num_tokens(), 0);
    }

    #[test]
    fn empty_corpus() {
        let mut trainer = HmmTrainer::new(Smoothing::GoodTuring);
        let model = trainer.train();
        assert!(!model.is_trained());
        assert_eq!(model.num_transitions(), 0);
        assert_eq!(model.num_emissions(), 0);
    }

    #[test]
    fn train_resets_counts() {
        let mut trainer = HmmTrainer::new(Smoothing::Plain);
        trainer.append(&TOY).unwrap();
        let first = trainer.train();
        assert_eq!(trainer.num_tokens(), 0);
        trainer.append(&[("a", "DT")]).unwrap();
        let second = trainer.train();
        assert_eq!(first.num_labels(), 3);
        assert_eq!(second.num_labels(), 1);
    }

    #[test]
    fn good_turing_toy() {
        let mut trainer = HmmTrainer::new(Smoothing::GoodTuring);
        trainer.append(&TOY).unwrap();
        let model = trainer.train();
        let dt = model.tag_id("DT").unwrap();
        // all three pairs are singletons: r' = 2 * 1 / 3
        assert!(close(model.emission(dt, model.word_id("the")), (2.0f64 / 3.0).ln()));
        // N[1] / |emissions| = 3 / 3
        assert!(close(model.unseen_emission(), 0.0));
        assert!(close(model.emission(dt, model.word_id("dog")), 0.0));
    }

    #[test]
    fn good_turing_without_singletons() {
        let mut trainer = HmmTrainer::new(Smoothing::GoodTuring);
        trainer.append(&[("a", "DT"), ("a", "DT")]).unwrap();
        let model = trainer.train();
        assert_eq!(model.unseen_emission(), EPSILON);
        let dt = model.tag_id("DT").unwrap();
        // N[2] = 1, N[3] absent: r' = 3 * 1 / 1, ln(3 * 2 / 2)
        assert!(close(model.emission(dt, model.word_id("a")), 3.0f64.ln()));
    }

    #[test]
    fn transitions_are_log_probabilities() {
        let mut trainer = HmmTrainer::new(Smoothing::Plain);
        trainer.append(&TOY).unwrap();
        trainer.append(&[("a", "DT"), ("cat", "NN"), ("sleeps", "VB"), ("quietly", "RB")]).unwrap();
        let model = trainer.train();
        let n = model.num_tags();
        for i in 0..n {
            for j in 0..n {
                let score = model.transition(i, j);
                assert!(score.is_finite() && score <= 0.0, "{i} -> {j}: {score}");
            }
        }
        for (id, _) in model.tags().iter() {
            assert!(model.prior(id).unwrap().is_finite());
        }
    }
}
