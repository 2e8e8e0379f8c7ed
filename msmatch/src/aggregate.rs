//! Combine sub-scores into a single rank score and a match verdict
use crate::params::{RetentionAxis, SearchParameters, TargetOmics};
use crate::result::MatchResult;
use crate::scorer::{is_not_computed, ScoreType};

/// The Andromeda score at which the squashed term reaches one half
pub const ANDROMEDA_MIDPOINT: f64 = 25.0;
/// The steepness of the Andromeda squashing curve
pub const ANDROMEDA_SLOPE: f64 = 0.1;

/// Map an unbounded Andromeda score into `[0, 1)` with a logistic curve
#[inline]
pub fn squash_andromeda(score: ScoreType) -> ScoreType {
    1.0 / (1.0 + (-ANDROMEDA_SLOPE * (score - ANDROMEDA_MIDPOINT)).exp())
}

/// The weight given to each term of the total score.
///
/// A weight of zero drops a term from the total even when it was computed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightTable {
    /// Applied to the mean of the three dot products
    pub dot_product: f64,
    pub reverse_dot_product: f64,
    pub presence: f64,
    pub retention: f64,
    pub mass: f64,
    pub ccs: f64,
    pub isotope: f64,
    pub andromeda: f64,
    /// Whether a caller-supplied spectrum penalty halves the dot product term
    pub spectrum_penalty_applies: bool,
}

impl WeightTable {
    pub const GENERAL: Self = Self {
        dot_product: 1.0,
        reverse_dot_product: 0.5,
        presence: 0.5,
        retention: 1.0,
        mass: 1.0,
        ccs: 1.0,
        isotope: 0.0,
        andromeda: 1.0,
        spectrum_penalty_applies: true,
    };

    /// Class-specific weighting, leaning on diagnostic fragment presence over retention
    pub const CLASS_SPECIFIC: Self = Self {
        dot_product: 0.5,
        reverse_dot_product: 1.0,
        presence: 1.5,
        retention: 0.5,
        mass: 1.0,
        ccs: 1.0,
        isotope: 0.0,
        andromeda: 1.0,
        spectrum_penalty_applies: false,
    };

    pub const fn for_target(target: TargetOmics) -> Self {
        match target {
            TargetOmics::Metabolomics | TargetOmics::Proteomics => Self::GENERAL,
            TargetOmics::Lipidomics => Self::CLASS_SPECIFIC,
        }
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::GENERAL
    }
}

/// Computes [`MatchResult::total_score`] and [`MatchResult::is_spectrum_match`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreAggregator {
    pub target: TargetOmics,
    pub weights: WeightTable,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new(TargetOmics::default())
    }
}

impl ScoreAggregator {
    pub fn new(target: TargetOmics) -> Self {
        Self {
            target,
            weights: WeightTable::for_target(target),
        }
    }

    /// Replace the weight table chosen for the target
    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    /// The weighted sum of every enabled, computed term of `scores`.
    ///
    /// When `spectrum_penalty` is set and the weight table allows it, the
    /// dot product term is halved.
    pub fn total_score(
        &self,
        scores: &MatchResult,
        params: &SearchParameters,
        spectrum_penalty: bool,
    ) -> ScoreType {
        let w = &self.weights;
        let retention = match params.retention_axis {
            RetentionAxis::Time => scores.rt_similarity,
            RetentionAxis::Index => scores.ri_similarity,
        };
        let spectral = {
            let mean = scores.spectral_mean();
            if spectrum_penalty && w.spectrum_penalty_applies && !is_not_computed(mean) {
                mean * 0.5
            } else {
                mean
            }
        };
        let andromeda = if is_not_computed(scores.andromeda_score) {
            scores.andromeda_score
        } else {
            squash_andromeda(scores.andromeda_score)
        };

        let terms = [
            (params.use_time_for_scoring, retention, w.retention),
            (params.use_ccs_for_scoring, scores.ccs_similarity, w.ccs),
            (true, scores.accurate_mass_similarity, w.mass),
            (true, scores.isotope_similarity, w.isotope),
            (true, spectral, w.dot_product),
            (true, scores.reverse_dot_product, w.reverse_dot_product),
            (true, scores.matched_peaks_percentage, w.presence),
            (true, andromeda, w.andromeda),
        ];

        terms
            .into_iter()
            .filter(|(enabled, value, _)| *enabled && !is_not_computed(*value))
            .map(|(_, value, weight)| value * weight)
            .sum()
    }

    /// Whether every spectral cutoff in `params` is met. Independent of the total score.
    pub fn is_spectrum_match(&self, scores: &MatchResult, params: &SearchParameters) -> bool {
        let passes = scores.weighted_dot_product >= params.weighted_dot_product_cutoff
            && scores.simple_dot_product >= params.simple_dot_product_cutoff
            && scores.reverse_dot_product >= params.reverse_dot_product_cutoff
            && scores.matched_peaks_percentage >= params.matched_peaks_percentage_cutoff
            && scores.matched_peaks_count >= params.minimum_matched_peaks;
        match self.target {
            TargetOmics::Proteomics => {
                passes && scores.andromeda_score >= params.andromeda_score_cutoff
            }
            TargetOmics::Metabolomics | TargetOmics::Lipidomics => passes,
        }
    }

    /// Fill in the total score and spectrum match verdict on `scores`
    pub fn aggregate(
        &self,
        scores: &mut MatchResult,
        params: &SearchParameters,
        spectrum_penalty: bool,
    ) {
        scores.total_score = self.total_score(scores, params, spectrum_penalty);
        scores.is_spectrum_match = self.is_spectrum_match(scores, params);
        tracing::trace!(
            "Aggregated total score {:0.4} (spectrum match: {})",
            scores.total_score,
            scores.is_spectrum_match
        );
    }
}
