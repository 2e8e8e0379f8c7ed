//! High level APIs for comparing a query scan against reference library entries
use mzpeaks::{prelude::*, Tolerance};

use crate::aggregate::ScoreAggregator;
use crate::matcher::{match_fragments_restricted, match_peaks};
use crate::params::SearchParameters;
use crate::peaks::{FragmentPeak, IsotopicPeak};
use crate::probability::AndromedaScorer;
use crate::proximity::{
    is_precursor_mz_match, isotope_ratio_similarity, optional_gaussian_similarity,
    optional_within_tolerance, precursor_mz_similarity,
};
use crate::result::MatchResult;
use crate::scorer::{
    matched_peak_presence, ReverseDotProduct, ScoreType, SimpleDotProduct,
    SpectralSimilarityScorer, WeightedDotProduct, NOT_COMPUTED,
};

/// A borrowed view of one spectrum and the scalar properties measured or
/// recorded alongside it.
///
/// Peaks must be sorted by m/z. Because everything is borrowed, the same
/// library entry can be compared against many queries at once.
#[derive(Debug, Clone, Copy)]
pub struct ScanProperties<'a, C: CentroidLike> {
    pub peaks: &'a [C],
    pub precursor_mz: Option<f64>,
    pub retention_time: Option<f64>,
    pub retention_index: Option<f64>,
    pub ccs: Option<f64>,
    pub isotopes: &'a [IsotopicPeak],
    /// Annotated fragments, only read from the reference side for Andromeda scoring
    pub fragments: Option<&'a [FragmentPeak]>,
}

impl<'a, C: CentroidLike> ScanProperties<'a, C> {
    pub fn new(peaks: &'a [C]) -> Self {
        Self {
            peaks,
            precursor_mz: None,
            retention_time: None,
            retention_index: None,
            ccs: None,
            isotopes: &[],
            fragments: None,
        }
    }

    pub fn with_precursor_mz(mut self, mz: f64) -> Self {
        self.precursor_mz = Some(mz);
        self
    }

    pub fn with_retention_time(mut self, time: f64) -> Self {
        self.retention_time = Some(time);
        self
    }

    pub fn with_retention_index(mut self, index: f64) -> Self {
        self.retention_index = Some(index);
        self
    }

    pub fn with_ccs(mut self, ccs: f64) -> Self {
        self.ccs = Some(ccs);
        self
    }

    pub fn with_isotopes(mut self, isotopes: &'a [IsotopicPeak]) -> Self {
        self.isotopes = isotopes;
        self
    }

    pub fn with_fragments(mut self, fragments: &'a [FragmentPeak]) -> Self {
        self.fragments = Some(fragments);
        self
    }
}

/// Runs every scorer over a query and reference pair with a fixed set of
/// [`SearchParameters`].
///
/// The engine holds no mutable state and may be shared freely between threads.
#[derive(Debug, Clone)]
pub struct SpectrumMatcher {
    params: SearchParameters,
    aggregator: ScoreAggregator,
}

impl Default for SpectrumMatcher {
    fn default() -> Self {
        Self::new(SearchParameters::default())
    }
}

impl SpectrumMatcher {
    /// Create a [`SpectrumMatcher`] that weights scores for `params.target_omics`
    pub fn new(params: SearchParameters) -> Self {
        let aggregator = ScoreAggregator::new(params.target_omics);
        Self { params, aggregator }
    }

    pub fn with_aggregator(mut self, aggregator: ScoreAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn params(&self) -> &SearchParameters {
        &self.params
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    /// Compare `query` against `reference` and aggregate the result.
    pub fn compare<C: CentroidLike, D: CentroidLike>(
        &self,
        query: &ScanProperties<C>,
        reference: &ScanProperties<D>,
    ) -> MatchResult {
        self.compare_with_penalty(query, reference, false)
    }

    /// As [`SpectrumMatcher::compare`], additionally flagging the query's spectrum
    /// as penalized. Whether the flag has any effect depends on the weight table.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn compare_with_penalty<C: CentroidLike, D: CentroidLike>(
        &self,
        query: &ScanProperties<C>,
        reference: &ScanProperties<D>,
        spectrum_penalty: bool,
    ) -> MatchResult {
        let params = &self.params;
        let mut result = self.spectral_scores(query.peaks, reference.peaks);

        if let (Some(q), Some(r)) = (query.precursor_mz, reference.precursor_mz) {
            result.accurate_mass_similarity = precursor_mz_similarity(q, r, params.ms1_tolerance);
            result.is_precursor_mz_match = is_precursor_mz_match(q, r, params.ms1_tolerance);
        }

        result.rt_similarity = optional_gaussian_similarity(
            query.retention_time,
            reference.retention_time,
            params.rt_tolerance,
        );
        result.is_rt_match = optional_within_tolerance(
            query.retention_time,
            reference.retention_time,
            params.rt_tolerance,
        );
        result.ri_similarity = optional_gaussian_similarity(
            query.retention_index,
            reference.retention_index,
            params.ri_tolerance,
        );
        result.is_ri_match = optional_within_tolerance(
            query.retention_index,
            reference.retention_index,
            params.ri_tolerance,
        );
        result.ccs_similarity =
            optional_gaussian_similarity(query.ccs, reference.ccs, params.ccs_tolerance);
        result.is_ccs_match = optional_within_tolerance(query.ccs, reference.ccs, params.ccs_tolerance);

        result.isotope_similarity =
            isotope_ratio_similarity(query.isotopes, reference.isotopes, params.ms1_tolerance);

        result.andromeda_score = match reference.fragments {
            Some(fragments) if !query.peaks.is_empty() && !fragments.is_empty() => {
                let matches = match_fragments_restricted(
                    query.peaks,
                    fragments,
                    Tolerance::Da(params.ms2_tolerance),
                );
                AndromedaScorer::new(params.andromeda_delta, params.andromeda_max_peaks)
                    .score_fragments(&matches)
            }
            _ => NOT_COMPUTED,
        };

        self.aggregator.aggregate(&mut result, params, spectrum_penalty);

        tracing::debug!(
            "Compared {} query peaks to {} reference peaks: dot={:0.3}/{:0.3}/{:0.3} presence={:0.3} total={:0.3}",
            query.peaks.len(),
            reference.peaks.len(),
            result.weighted_dot_product,
            result.simple_dot_product,
            result.reverse_dot_product,
            result.matched_peaks_percentage,
            result.total_score,
        );
        result
    }

    /// Compute only the dot products and peak presence, leaving every other score uncomputed.
    pub fn spectral_scores<C: CentroidLike, D: CentroidLike>(
        &self,
        query: &[C],
        reference: &[D],
    ) -> MatchResult {
        let params = &self.params;
        let tol = params.ms2_tolerance;
        let (begin, end) = (params.mass_range_begin, params.mass_range_end);

        let presence = matched_peak_presence(query, reference, tol, begin, end);
        MatchResult {
            weighted_dot_product: WeightedDotProduct::default()
                .score(query, reference, tol, begin, end),
            simple_dot_product: SimpleDotProduct::default().score(query, reference, tol, begin, end),
            reverse_dot_product: ReverseDotProduct::default()
                .score(query, reference, tol, begin, end),
            matched_peaks_percentage: presence.ratio,
            matched_peaks_count: presence.matched_count,
            library_peak_count: presence.library_peak_count,
            ..Default::default()
        }
    }

    /// The cosine over peaks paired directly or across the precursor m/z shift.
    ///
    /// Returns [`NOT_COMPUTED`] unless both scans carry a precursor m/z and peaks.
    pub fn modified_cosine<C: CentroidLike, D: CentroidLike>(
        &self,
        query: &ScanProperties<C>,
        reference: &ScanProperties<D>,
    ) -> ScoreType {
        match (query.precursor_mz, reference.precursor_mz) {
            (Some(q), Some(r)) if !query.peaks.is_empty() && !reference.peaks.is_empty() => {
                match_peaks(
                    query.peaks,
                    q,
                    reference.peaks,
                    r,
                    Tolerance::Da(self.params.ms2_tolerance),
                )
                .modified_cosine()
            }
            _ => NOT_COMPUTED,
        }
    }
}

/// A single-shot comparison of `query` against `reference`.
///
/// # Note
/// When comparing many pairs with the same parameters, create a [`SpectrumMatcher`]
/// once and call [`SpectrumMatcher::compare`] instead.
pub fn compare_spectra<C: CentroidLike, D: CentroidLike>(
    query: &ScanProperties<C>,
    reference: &ScanProperties<D>,
    params: SearchParameters,
) -> MatchResult {
    SpectrumMatcher::new(params).compare(query, reference)
}
