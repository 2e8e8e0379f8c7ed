//! The per-comparison score record
use crate::scorer::{ScoreType, NOT_COMPUTED};

/// Every sub-score computed for one query against one reference entry.
///
/// Any score left at [`NOT_COMPUTED`] could not be computed for this pair, usually
/// because an axis was missing from one side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchResult {
    pub weighted_dot_product: ScoreType,
    pub simple_dot_product: ScoreType,
    pub reverse_dot_product: ScoreType,
    /// The fraction of countable reference peaks observed in the query
    pub matched_peaks_percentage: ScoreType,
    pub matched_peaks_count: i32,
    pub library_peak_count: i32,
    pub isotope_similarity: ScoreType,
    pub rt_similarity: ScoreType,
    pub ri_similarity: ScoreType,
    pub ccs_similarity: ScoreType,
    pub accurate_mass_similarity: ScoreType,
    pub andromeda_score: ScoreType,

    pub is_precursor_mz_match: bool,
    pub is_rt_match: bool,
    pub is_ri_match: bool,
    pub is_ccs_match: bool,

    pub total_score: ScoreType,
    pub is_spectrum_match: bool,
}

impl Default for MatchResult {
    fn default() -> Self {
        Self {
            weighted_dot_product: NOT_COMPUTED,
            simple_dot_product: NOT_COMPUTED,
            reverse_dot_product: NOT_COMPUTED,
            matched_peaks_percentage: NOT_COMPUTED,
            matched_peaks_count: -1,
            library_peak_count: -1,
            isotope_similarity: NOT_COMPUTED,
            rt_similarity: NOT_COMPUTED,
            ri_similarity: NOT_COMPUTED,
            ccs_similarity: NOT_COMPUTED,
            accurate_mass_similarity: NOT_COMPUTED,
            andromeda_score: NOT_COMPUTED,
            is_precursor_mz_match: false,
            is_rt_match: false,
            is_ri_match: false,
            is_ccs_match: false,
            total_score: 0.0,
            is_spectrum_match: false,
        }
    }
}

impl MatchResult {
    /// The mean of the three dot products, or [`NOT_COMPUTED`] if any of them is missing
    pub fn spectral_mean(&self) -> ScoreType {
        let terms = [
            self.weighted_dot_product,
            self.simple_dot_product,
            self.reverse_dot_product,
        ];
        if terms.iter().any(|t| *t < 0.0) {
            return NOT_COMPUTED;
        }
        terms.iter().sum::<ScoreType>() / 3.0
    }

    /// Order by `total_score`, highest first
    pub fn total_cmp_desc(&self, other: &Self) -> std::cmp::Ordering {
        other.total_score.total_cmp(&self.total_score)
    }
}
