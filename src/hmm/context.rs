/// Viterbi work space over a lattice of `T` items and `L` labels.
///
/// All scores are in the logarithm domain.
#[derive(Debug, Default, Clone)]
pub(crate) struct HmmContext {
    /// The total number of labels (L).
    pub num_labels: usize,

    /// The number of items (T) in the current sentence.
    num_items: usize,

    /// The maximum number of items the buffers can hold.
    cap_items: usize,

    /// Transition scores from the start sentinel.
    /// This is a [L] vector whose element [j] is the score of BOS -> #j.
    pub start: Vec<f64>,

    /// Transition scores.
    /// This is a [L][L] matrix whose element [i][j] is the score of #i -> #j.
    pub trans: Vec<f64>,

    /// State (emission) scores.
    /// This is a [T][L] matrix whose element [t][l] is the score of label #l
    /// emitting item #t.
    pub state: Vec<f64>,

    /// Best path scores.
    /// This is a [T][L] matrix whose element [t][l] is the score of the best
    /// path from BOS arriving at (t, l).
    path_score: Vec<f64>,

    /// Backward edges.
    /// This is a [T][L] matrix whose element [t][j] is the label #i at t-1
    /// on the best path arriving at (t, j).
    backward_edge: Vec<usize>,
}

impl HmmContext {
    pub fn new(num_labels: usize, num_items: usize) -> Self {
        let mut this = Self {
            num_labels,
            start: vec![0.0; num_labels],
            trans: vec![0.0; num_labels * num_labels],
            ..Default::default()
        };
        this.set_num_items(num_items);
        this.num_items = 0;
        this
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Resizes the per-item buffers and clears the state scores.
    pub fn set_num_items(&mut self, num_items: usize) {
        let size = num_items * self.num_labels;
        self.num_items = num_items;
        if self.cap_items < num_items {
            self.state.resize(size, 0.0);
            self.path_score.resize(size, 0.0);
            self.backward_edge.resize(size, 0);
            self.cap_items = num_items;
        }
        self.state[..size].fill(0.0);
    }

    #[inline]
    fn at(&self, t: usize, l: usize) -> usize {
        self.num_labels * t + l
    }

    /// Fills the lattice and writes the best label sequence into `labels`.
    ///
    /// Returns the score of that sequence. Ties resolve to the lowest label.
    pub fn viterbi(&mut self, labels: &mut [usize]) -> f64 {
        let num_items = self.num_items;
        let num_labels = self.num_labels;
        if num_items == 0 || num_labels == 0 {
            return 0.0;
        }
        debug_assert_eq!(labels.len(), num_items);

        // Scores at (0, *).
        for j in 0..num_labels {
            let k = self.at(0, j);
            self.path_score[k] = self.start[j] + self.state[k];
        }

        // Scores at (t, *).
        for t in 1..num_items {
            for j in 0..num_labels {
                let mut max_score = f64::NEG_INFINITY;
                let mut argmax = 0;
                for i in 0..num_labels {
                    // Transit from (t-1, i) to (t, j).
                    let score = self.path_score[self.at(t - 1, i)] + self.trans[num_labels * i + j];
                    if max_score < score {
                        max_score = score;
                        argmax = i;
                    }
                }
                let k = self.at(t, j);
                self.backward_edge[k] = argmax;
                self.path_score[k] = max_score + self.state[k];
            }
        }

        // Best node at T-1.
        let mut max_score = f64::NEG_INFINITY;
        labels[num_items - 1] = 0;
        for i in 0..num_labels {
            let score = self.path_score[self.at(num_items - 1, i)];
            if max_score < score {
                max_score = score;
                labels[num_items - 1] = i;
            }
        }

        // Trace the backward edges.
        for t in (0..num_items - 1).rev() {
            let next = labels[t + 1];
            labels[t] = self.backward_edge[self.at(t + 1, next)];
        }
        max_score
    }

    /// Score of an arbitrary label path over the current state scores.
    pub fn score(&self, labels: &[usize]) -> f64 {
        let Some(&first) = labels.first() else {
            return 0.0;
        };
        let mut i = first;
        let mut r = self.start[i] + self.state[self.at(0, i)];
        for (t, &j) in labels.iter().enumerate().skip(1) {
            r += self.trans[self.num_labels * i + j];
            r += self.state[self.at(t, j)];
            i = j;
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ln(x: f64) -> f64 {
        x.ln()
    }

    #[test]
    fn init() {
        let ctx = HmmContext::new(9, 12);
        assert_eq!(ctx.num_items, 0);
        assert_eq!(ctx.cap_items, 12);
        assert_eq!(ctx.trans.len(), 81);
    }

    #[test]
    fn grow_keeps_capacity() {
        let mut ctx = HmmContext::new(3, 2);
        ctx.set_num_items(5);
        assert_eq!(ctx.cap_items, 5);
        assert_eq!(ctx.state.len(), 15);
        ctx.set_num_items(1);
        assert_eq!(ctx.cap_items, 5);
        assert_eq!(ctx.num_items(), 1);
    }

    // Two labels where the locally best label at t=0 is not on the best path.
    fn garden_path() -> HmmContext {
        let mut ctx = HmmContext::new(2, 2);
        ctx.set_num_items(2);
        ctx.start = vec![ln(0.5), ln(0.5)];
        ctx.trans = vec![ln(0.5), ln(0.5), ln(0.99), ln(0.01)];
        ctx.state = vec![ln(0.6), ln(0.4), ln(0.99), ln(0.01)];
        ctx
    }

    #[test]
    fn viterbi_traces_back() {
        let mut ctx = garden_path();
        let mut labels = vec![usize::MAX; 2];
        let score = ctx.viterbi(&mut labels);
        // 0.4 * 0.99 * 0.99 (path 1 -> 0) beats 0.6 * 0.5 * 0.99 (path 0 -> 0)
        assert_eq!(labels, vec![1, 0]);
        assert!((score - ctx.score(&labels)).abs() < 1e-9);
        assert!(ctx.score(&[0, 0]) < score);
    }

    #[test]
    fn viterbi_ties_pick_first_label() {
        let mut ctx = HmmContext::new(3, 3);
        ctx.set_num_items(3);
        let mut labels = vec![usize::MAX; 3];
        ctx.viterbi(&mut labels);
        assert_eq!(labels, vec![0, 0, 0]);
    }

    #[test]
    fn viterbi_empty() {
        let mut ctx = HmmContext::new(3, 0);
        let mut labels = vec![];
        assert_eq!(ctx.viterbi(&mut labels), 0.0);
    }
}
