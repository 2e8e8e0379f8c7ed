//! Probability-based fragment match scoring
use crate::matcher::FragmentMatches;
use crate::scorer::ScoreType;

/// The smallest score reported, used instead of `-0.0` or tiny negative values when
/// the tail probability rounds to one.
pub const MINIMUM_PROBABILITY_SCORE: ScoreType = 1e-6;

/// Natural logarithms of `0!..=n!`
fn ln_factorial_table(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    table.push(0.0);
    let mut acc = 0.0;
    for i in 1..=n {
        acc += (i as f64).ln();
        table.push(acc);
    }
    table
}

/// The probability of observing at least `k` successes in `n` Bernoulli trials
/// with success probability `p`.
pub fn binomial_upper_tail(n: usize, k: usize, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n || p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }
    let ln_fact = ln_factorial_table(n);
    let ln_p = p.ln();
    let ln_q = (1.0 - p).ln();
    // Summed from the far end of the tail so that each shorter tail is a prefix of
    // the longer one, which keeps the result monotone in `k`
    let tail: f64 = (k..=n)
        .rev()
        .map(|j| {
            let ln_choose = ln_fact[n] - ln_fact[j] - ln_fact[n - j];
            (ln_choose + j as f64 * ln_p + (n - j) as f64 * ln_q).exp()
        })
        .sum();
    tail.min(1.0)
}

/// An implementation of the Andromeda score[^1], the Phred-scaled probability of
/// matching at least `k` of `n` fragments by chance, when each fragment has a
/// `max_peaks_per_delta / delta` chance of landing on a peak.
///
/// ```math
/// S = -10 \log_{10} \sum_{j=k}^{n} \binom{n}{j} p^j (1 - p)^{n - j}
/// ```
///
/// # References
/// [^1]: Cox, J., Neuhauser, N., Michalski, A., Scheltema, R. A., Olsen, J. V., & Mann, M.
///       (2011). Andromeda: A Peptide Search Engine Integrated into the MaxQuant
///       Environment. Journal of Proteome Research, 10(4), 1794–1805.
///       <https://doi.org/10.1021/pr101065j>
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AndromedaScorer {
    /// The width of the m/z window the peak density is measured over
    pub delta: f64,
    /// How many of the most intense peaks are retained per `delta`
    pub max_peaks_per_delta: f64,
}

impl Default for AndromedaScorer {
    fn default() -> Self {
        Self {
            delta: 100.0,
            max_peaks_per_delta: 12.0,
        }
    }
}

impl AndromedaScorer {
    pub fn new(delta: f64, max_peaks_per_delta: f64) -> Self {
        Self {
            delta,
            max_peaks_per_delta,
        }
    }

    /// The per-fragment chance of a random match
    pub fn match_probability(&self) -> f64 {
        debug_assert!(self.delta > 0.0, "Andromeda delta must be positive");
        self.max_peaks_per_delta / self.delta
    }

    /// Score `matched_count` successes out of `total` fragments
    pub fn score_counts(&self, total: usize, matched_count: usize) -> ScoreType {
        let probability = binomial_upper_tail(total, matched_count, self.match_probability())
            .max(f64::MIN_POSITIVE);
        (-10.0 * probability.log10()).max(MINIMUM_PROBABILITY_SCORE)
    }

    /// Score a list of per-fragment match flags
    pub fn score(&self, matched: &[bool]) -> ScoreType {
        let k = matched.iter().filter(|m| **m).count();
        self.score_counts(matched.len(), k)
    }

    /// Score the outcome of [`match_fragments_restricted`](crate::matcher::match_fragments_restricted)
    pub fn score_fragments(&self, fragments: &FragmentMatches) -> ScoreType {
        self.score(&fragments.matched)
    }
}

/// Score `matched_count` of `total` fragments with a one-off [`AndromedaScorer`]
pub fn andromeda_score(total: usize, matched_count: usize, delta: f64, max_peaks_per_delta: f64) -> ScoreType {
    AndromedaScorer::new(delta, max_peaks_per_delta).score_counts(total, matched_count)
}
