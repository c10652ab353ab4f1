use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::{Smoothing, EPSILON, START_TAG};
use crate::{
    errors::{Error, Result},
    quark::{Quark, StringTable},
};

/// Tag id of the start sentinel. Decodable labels are the tag ids after it.
pub(crate) const START: usize = 0;

pub trait Model {
    /// Number of tags the decoder may assign.
    fn num_labels(&self) -> usize;
    fn labels(&self) -> Vec<&str>;
    /// Writes the model in a plain-text format.
    fn dump<W: Write>(&self, w: W) -> Result<()>;
}

/// Trained bigram HMM. All scores are natural logarithms.
///
/// Tags are interned in `tags` with the start sentinel at id 0; the known
/// vocabulary is `words`. `transitions` is keyed by `(previous, current)` tag
/// ids and `emissions` by `(tag, word)` ids; both only hold observed pairs.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmModel {
    pub(crate) smoothing: Smoothing,
    pub(crate) tags: Quark,
    pub(crate) words: Quark,
    pub(crate) priors: Vec<f64>,
    #[serde(with = "pairs")]
    pub(crate) transitions: HashMap<(usize, usize), f64>,
    #[serde(with = "pairs")]
    pub(crate) emissions: HashMap<(usize, usize), f64>,
    /// Score of a known word paired with a tag it was never seen with.
    pub(crate) unseen_emission: f64,
}

impl HmmModel {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        Self::load(BufReader::new(f))
    }

    pub fn load<R: Read>(rdr: R) -> Result<Self> {
        let model: HmmModel = serde_json::from_reader(rdr)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save<W: Write>(&self, w: W) -> Result<()> {
        serde_json::to_writer(w, self)?;
        Ok(())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.save(&mut w)?;
        w.flush()?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.tags.is_empty() {
            return Ok(());
        }
        if self.tags.to_str(START) != Some(START_TAG) {
            return Err(Error::InvalidModel(format!("tag #0 must be {START_TAG}")));
        }
        if self.priors.len() != self.tags.len() {
            return Err(Error::InvalidModel(format!(
                "{} priors for {} tags",
                self.priors.len(),
                self.tags.len()
            )));
        }
        let n = self.tags.len();
        if self.transitions.keys().any(|&(i, j)| i >= n || j >= n) {
            return Err(Error::InvalidModel("transition refers to an unknown tag".into()));
        }
        if self.emissions.keys().any(|&(t, w)| t >= n || w >= self.words.len()) {
            return Err(Error::InvalidModel("emission refers to an unknown tag or word".into()));
        }
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        self.num_labels() > 0
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// All tags including the start sentinel.
    pub fn tags(&self) -> &Quark {
        &self.tags
    }

    pub fn words(&self) -> &Quark {
        &self.words
    }

    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    pub fn tag_id(&self, tag: &str) -> Option<usize> {
        self.tags.to_id(tag)
    }

    pub fn word_id(&self, word: &str) -> Option<usize> {
        self.words.to_id(word)
    }

    pub fn is_known(&self, word: &str) -> bool {
        self.words.to_id(word).is_some()
    }

    pub fn prior(&self, tag: usize) -> Option<f64> {
        self.priors.get(tag).copied()
    }

    /// `ln P(cur | prev)`; pairs never observed get `ln(1 / |tags|)`.
    pub fn transition(&self, prev: usize, cur: usize) -> f64 {
        match self.transitions.get(&(prev, cur)) {
            Some(&score) => score,
            None => self.uniform_transition(),
        }
    }

    pub fn uniform_transition(&self) -> f64 {
        -(self.tags.len().max(1) as f64).ln()
    }

    /// Emission score of `tag` for a word id; `None` stands for an unknown word.
    pub fn emission(&self, tag: usize, word: Option<usize>) -> f64 {
        match word {
            None => self.prior(tag).unwrap_or(EPSILON),
            Some(w) => self.emissions.get(&(tag, w)).copied().unwrap_or(self.unseen_emission),
        }
    }

    pub fn unseen_emission(&self) -> f64 {
        self.unseen_emission
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn num_emissions(&self) -> usize {
        self.emissions.len()
    }

    fn tag_name(&self, id: usize) -> &str {
        self.tags.to_str(id).unwrap_or("N/A")
    }
}

impl Model for HmmModel {
    fn num_labels(&self) -> usize {
        self.tags.len().saturating_sub(1)
    }

    fn labels(&self) -> Vec<&str> {
        self.tags.iter().skip(START + 1).map(|(_, s)| s).collect()
    }

    fn dump<W: Write>(&self, mut w: W) -> Result<()> {
        writeln!(w, "SMOOTHING = {}", self.smoothing)?;
        writeln!(w, "UNSEEN_EMISSION = {}", self.unseen_emission)?;

        writeln!(w, "TAGS = {{")?;
        for (id, tag) in self.tags.iter() {
            writeln!(w, "    {:5}: {} ({:.6})", id, tag, self.prior(id).unwrap_or(EPSILON))?;
        }
        writeln!(w, "}}")?;

        let mut transitions: Vec<_> = self.transitions.iter().collect();
        transitions.sort_by_key(|(k, _)| **k);
        writeln!(w, "TRANSITIONS = {{")?;
        for (&(i, j), score) in transitions {
            writeln!(w, "    {} --> {}: {:.6}", self.tag_name(i), self.tag_name(j), score)?;
        }
        writeln!(w, "}}")?;

        let mut emissions: Vec<_> = self.emissions.iter().collect();
        emissions.sort_by_key(|(k, _)| **k);
        writeln!(w, "EMISSIONS = {{")?;
        for (&(t, word), score) in emissions {
            let word = self.words.to_str(word).unwrap_or("N/A");
            writeln!(w, "    {} --> {}: {:.6}", self.tag_name(t), word, score)?;
        }
        writeln!(w, "}}")?;
        Ok(())
    }
}

/// Serializes pair-keyed maps as sorted `[first, second, score]` triples.
mod pairs {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(m: &HashMap<(usize, usize), f64>, s: S) -> Result<S::Ok, S::Error> {
        let mut v: Vec<(usize, usize, f64)> = m.iter().map(|(&(a, b), &x)| (a, b, x)).collect();
        v.sort_by_key(|&(a, b, _)| (a, b));
        v.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<HashMap<(usize, usize), f64>, D::Error> {
        let v = Vec::<(usize, usize, f64)>::deserialize(d)?;
        Ok(v.into_iter().map(|(a, b, x)| ((a, b), x)).collect())
    }
}
