use std::collections::BTreeMap;

/// Count-of-counts: how many distinct events were observed exactly `c` times.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrequencyTable {
    m: BTreeMap<usize, usize>,
}

impl FrequencyTable {
    pub fn from_counts<I: IntoIterator<Item = usize>>(counts: I) -> Self {
        let mut table = Self::default();
        for c in counts {
            table.add(c);
        }
        table
    }

    pub fn add(&mut self, count: usize) {
        *self.m.entry(count).or_default() += 1;
    }

    /// Number of events seen exactly `count` times.
    pub fn get(&self, count: usize) -> Option<usize> {
        self.m.get(&count).copied()
    }

    pub fn singletons(&self) -> Option<usize> {
        self.get(1)
    }

    /// Good-Turing adjusted count `(c+1) * N[c+1] / N[c]`.
    ///
    /// `N[c+1]` is taken as 1 when no event was seen `c+1` times. `None` if
    /// no event was seen `c` times.
    pub fn adjusted_count(&self, count: usize) -> Option<f64> {
        let n_c = self.get(count)?;
        let n_next = self.get(count + 1).unwrap_or(1);
        Some(((count + 1) * n_next) as f64 / n_c as f64)
    }

    pub fn len(&self) -> usize {
        self.m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }
}
