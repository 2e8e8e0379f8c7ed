//! Spectrum similarity scoring.
//!
//! All of the scorers here are built on top of [`SpectrumAlignment`]. They return
//! [`NOT_COMPUTED`] when either spectrum is empty, and `0.0` when a comparison is
//! possible but one side carries no signal.
use mzpeaks::prelude::*;

use crate::align::{AlignedBin, AlignmentExtent, SpectrumAlignment};
use crate::peaks::base_peak_intensity;

pub type ScoreType = f64;

/// The sentinel returned when a score cannot be computed. It is never a valid score.
pub const NOT_COMPUTED: ScoreType = -1.0;

/// Test whether `score` is a sentinel rather than a real value
#[inline]
pub fn is_not_computed(score: ScoreType) -> bool {
    score < 0.0
}

/// Normalized intensity below which an aligned bin is left out of the dot product
pub const REFERENCE_INTENSITY_CUTOFF: f64 = 0.01;

/// Normalized intensity above which an aligned bin counts toward the peak-count penalty
pub const SIGNIFICANT_PEAK_THRESHOLD: f64 = 0.1;

/// The ceiling intensities are rescaled to for [`SimpleDotProduct`]
pub const SIMPLE_DOT_PRODUCT_SCALE: f64 = 999.0;

/// Fraction of the reference base peak a bin needs to be counted by [`matched_peak_presence`]
pub const PRESENCE_RELATIVE_THRESHOLD: f64 = 0.01;

/// The discount applied to a dot product when a spectrum has only
/// `significant_peaks` bins above [`SIGNIFICANT_PEAK_THRESHOLD`].
pub fn peak_count_penalty(significant_peaks: usize) -> f64 {
    match significant_peaks {
        0 | 1 => 0.75,
        2 => 0.88,
        3 => 0.94,
        4 => 0.97,
        _ => 1.0,
    }
}

/// The three members of the dot product family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DotProductKind {
    Weighted,
    Simple,
    Reverse,
}

impl DotProductKind {
    /// The alignment each variant walks
    pub const fn extent(&self) -> AlignmentExtent {
        match self {
            Self::Weighted | Self::Simple => AlignmentExtent::Union,
            Self::Reverse => AlignmentExtent::Reference,
        }
    }

    /// Whether each bin is weighted by its m/z
    pub const fn is_mz_weighted(&self) -> bool {
        matches!(self, Self::Weighted | Self::Reverse)
    }

    /// The ceiling normalized intensities are rescaled to
    pub const fn scale(&self) -> f64 {
        match self {
            Self::Simple => SIMPLE_DOT_PRODUCT_SCALE,
            Self::Weighted | Self::Reverse => 1.0,
        }
    }
}

/// A similarity metric between an experimental and a reference spectrum
pub trait SpectralSimilarityScorer {
    /// Compare `experimental` against `reference`, both sorted by m/z, summing
    /// peaks within `tolerance` Da and ignoring anything outside
    /// `[range_begin, range_end]`.
    fn score<M: CentroidLike, R: CentroidLike>(
        &self,
        experimental: &[M],
        reference: &[R],
        tolerance: f64,
        range_begin: f64,
        range_end: f64,
    ) -> ScoreType;

    fn kind(&self) -> DotProductKind;
}

/// Accumulates the normalized, optionally m/z weighted cosine over a set of aligned bins.
///
/// ```math
/// S = \frac{\left(\sum_i w_i \sqrt{m_i r_i}\right)^2}{\sum_i w_i m_i \sum_i w_i r_i} \times \text{penalty}
/// ```
///
/// The reference-extent variant drops bins whose normalized reference intensity is
/// under [`REFERENCE_INTENSITY_CUTOFF`] and counts significant peaks on the reference
/// alone. The union-extent variants treat both sides alike: a bin is dropped only when
/// both sides are under the cutoff, and the penalty uses whichever side has fewer
/// significant peaks, so swapping the spectra never changes the score.
///
/// The peak-count penalty only applies when some bin holds significant signal on
/// one side and next to nothing on the other, i.e. a peak one spectrum cannot
/// account for. Two identical spectra are never discounted, however sparse.
fn normalized_dot_product(bins: &[AlignedBin], kind: DotProductKind) -> ScoreType {
    let (base_measured, base_reference) = bins.iter().fold((0.0f64, 0.0f64), |(m, r), bin| {
        (m.max(bin.measured), r.max(bin.reference))
    });
    if base_measured <= 0.0 || base_reference <= 0.0 {
        return 0.0;
    }

    let symmetric = kind.extent() == AlignmentExtent::Union;
    let scale = kind.scale();
    let mut significant_measured = 0usize;
    let mut significant_reference = 0usize;
    let mut unexplained_signal = false;
    let mut scalar_measured = 0.0;
    let mut scalar_reference = 0.0;
    let mut covariance = 0.0;

    for bin in bins {
        let reference = bin.reference / base_reference;
        let measured = bin.measured / base_measured;
        if reference > SIGNIFICANT_PEAK_THRESHOLD {
            significant_reference += 1;
        }
        if measured > SIGNIFICANT_PEAK_THRESHOLD {
            significant_measured += 1;
        }

        let unexplained_measured =
            measured > SIGNIFICANT_PEAK_THRESHOLD && reference < REFERENCE_INTENSITY_CUTOFF;
        let unexplained_reference =
            reference > SIGNIFICANT_PEAK_THRESHOLD && measured < REFERENCE_INTENSITY_CUTOFF;
        let discard = if symmetric {
            unexplained_signal |= unexplained_measured || unexplained_reference;
            reference.max(measured) < REFERENCE_INTENSITY_CUTOFF
        } else {
            unexplained_signal |= unexplained_measured;
            reference < REFERENCE_INTENSITY_CUTOFF
        };
        if discard {
            continue;
        }

        let weight = if kind.is_mz_weighted() { bin.mz } else { 1.0 };
        let measured = measured * scale;
        let reference = reference * scale;
        scalar_measured += measured * weight;
        scalar_reference += reference * weight;
        covariance += (measured * reference).sqrt() * weight;
    }

    if scalar_measured == 0.0 || scalar_reference == 0.0 {
        return 0.0;
    }

    let significant_peaks = if symmetric {
        significant_measured.min(significant_reference)
    } else {
        significant_reference
    };
    let penalty = if unexplained_signal {
        peak_count_penalty(significant_peaks)
    } else {
        1.0
    };

    tracing::trace!(
        "{kind:?} dot product over {} bins: covariance={covariance:0.4} measured={scalar_measured:0.4} reference={scalar_reference:0.4} penalty={penalty}",
        bins.len()
    );

    (covariance.powi(2) / (scalar_measured * scalar_reference) * penalty).clamp(0.0, 1.0)
}

fn dot_product<M: CentroidLike, R: CentroidLike>(
    kind: DotProductKind,
    experimental: &[M],
    reference: &[R],
    tolerance: f64,
    range_begin: f64,
    range_end: f64,
) -> ScoreType {
    if experimental.is_empty() || reference.is_empty() {
        return NOT_COMPUTED;
    }
    let mut bins = Vec::with_capacity(experimental.len() + reference.len());
    bins.extend(SpectrumAlignment::new(
        reference,
        experimental,
        tolerance,
        range_begin,
        range_end,
        kind.extent(),
    ));
    normalized_dot_product(&bins, kind)
}

/// An m/z weighted cosine over the union of both spectra's m/z range, which
/// favors agreement among higher mass fragments.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightedDotProduct {}

impl SpectralSimilarityScorer for WeightedDotProduct {
    fn score<M: CentroidLike, R: CentroidLike>(
        &self,
        experimental: &[M],
        reference: &[R],
        tolerance: f64,
        range_begin: f64,
        range_end: f64,
    ) -> ScoreType {
        dot_product(
            self.kind(),
            experimental,
            reference,
            tolerance,
            range_begin,
            range_end,
        )
    }

    fn kind(&self) -> DotProductKind {
        DotProductKind::Weighted
    }
}

/// An unweighted cosine over the union of both spectra's m/z range, with
/// intensities rescaled to a 0-999 range.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleDotProduct {}

impl SpectralSimilarityScorer for SimpleDotProduct {
    fn score<M: CentroidLike, R: CentroidLike>(
        &self,
        experimental: &[M],
        reference: &[R],
        tolerance: f64,
        range_begin: f64,
        range_end: f64,
    ) -> ScoreType {
        dot_product(
            self.kind(),
            experimental,
            reference,
            tolerance,
            range_begin,
            range_end,
        )
    }

    fn kind(&self) -> DotProductKind {
        DotProductKind::Simple
    }
}

/// An m/z weighted cosine restricted to the reference spectrum's m/z range, so
/// experimental peaks outside the reference's coverage are ignored. Not symmetric.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReverseDotProduct {}

impl SpectralSimilarityScorer for ReverseDotProduct {
    fn score<M: CentroidLike, R: CentroidLike>(
        &self,
        experimental: &[M],
        reference: &[R],
        tolerance: f64,
        range_begin: f64,
        range_end: f64,
    ) -> ScoreType {
        dot_product(
            self.kind(),
            experimental,
            reference,
            tolerance,
            range_begin,
            range_end,
        )
    }

    fn kind(&self) -> DotProductKind {
        DotProductKind::Reverse
    }
}

/// How many of the reference spectrum's peaks were observed in the experimental spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresenceScore {
    pub ratio: ScoreType,
    pub matched_count: i32,
    pub library_peak_count: i32,
}

impl PresenceScore {
    pub const NOT_COMPUTED: Self = Self {
        ratio: NOT_COMPUTED,
        matched_count: -1,
        library_peak_count: -1,
    };

    pub fn new(matched_count: i32, library_peak_count: i32) -> Self {
        let ratio = if library_peak_count > 0 {
            matched_count as f64 / library_peak_count as f64
        } else {
            0.0
        };
        Self {
            ratio,
            matched_count,
            library_peak_count,
        }
    }

    pub fn is_computed(&self) -> bool {
        !is_not_computed(self.ratio)
    }
}

/// Count the reference peaks with at least [`PRESENCE_RELATIVE_THRESHOLD`] of the
/// reference base peak intensity, and how many of them have any experimental
/// signal within `tolerance`.
///
/// Returns `(0, 0)` when no reference peak qualifies, and [`PresenceScore::NOT_COMPUTED`]
/// when either spectrum is empty.
pub fn matched_peak_presence<M: CentroidLike, R: CentroidLike>(
    experimental: &[M],
    reference: &[R],
    tolerance: f64,
    range_begin: f64,
    range_end: f64,
) -> PresenceScore {
    if experimental.is_empty() || reference.is_empty() {
        return PresenceScore::NOT_COMPUTED;
    }
    let threshold = base_peak_intensity(reference) * PRESENCE_RELATIVE_THRESHOLD;
    let (matched, counted) = SpectrumAlignment::new(
        reference,
        experimental,
        tolerance,
        range_begin,
        range_end,
        AlignmentExtent::Reference,
    )
    .filter(|bin| bin.reference > 0.0 && bin.reference >= threshold)
    .fold((0, 0), |(matched, counted), bin| {
        (matched + (bin.measured > 0.0) as i32, counted + 1)
    });
    PresenceScore::new(matched, counted)
}

#[cfg(test)]
mod test {
    use mzpeaks::CentroidPeak;

    use super::*;

    fn spectrum(points: &[(f64, f32)]) -> Vec<CentroidPeak> {
        points
            .iter()
            .enumerate()
            .map(|(i, (mz, int))| CentroidPeak::new(*mz, *int, i as u32))
            .collect()
    }

    fn score_all(a: &[CentroidPeak], b: &[CentroidPeak]) -> [ScoreType; 3] {
        [
            WeightedDotProduct::default().score(a, b, 0.01, 0.0, 2000.0),
            SimpleDotProduct::default().score(a, b, 0.01, 0.0, 2000.0),
            ReverseDotProduct::default().score(a, b, 0.01, 0.0, 2000.0),
        ]
    }

    #[test]
    fn test_penalty_table() {
        assert_eq!(peak_count_penalty(1), 0.75);
        assert_eq!(peak_count_penalty(2), 0.88);
        assert_eq!(peak_count_penalty(3), 0.94);
        assert_eq!(peak_count_penalty(4), 0.97);
        assert_eq!(peak_count_penalty(5), 1.0);
        assert_eq!(peak_count_penalty(40), 1.0);
    }

    #[test]
    fn test_self_similarity() {
        let s = spectrum(&[(85.03, 200.0), (127.04, 999.0), (145.05, 310.0), (301.1, 50.0)]);
        for score in score_all(&s, &s) {
            assert!((score - 1.0).abs() < 1e-9, "{score}");
        }
    }

    #[test]
    fn test_sparse_reference_penalized() {
        let experimental = spectrum(&[(100.0, 1000.0), (200.0, 800.0), (300.0, 600.0)]);
        let reference = spectrum(&[(100.0, 1000.0)]);
        let [weighted, simple, reverse] = score_all(&experimental, &reference);
        // One bin agrees, two carry only experimental signal, and the sparser side
        // has a single significant peak
        let expected_weighted = 100.0f64.powi(2) / ((100.0 + 160.0 + 180.0) * 100.0) * 0.75;
        assert!((weighted - expected_weighted).abs() < 1e-9, "{weighted}");
        assert!((simple - 0.75 / 2.4).abs() < 1e-9, "{simple}");
        // The reverse scorer never sees the peaks beyond the reference's range
        assert!((reverse - 1.0).abs() < 1e-9, "{reverse}");
    }

    #[test]
    fn test_missing_reference_peak_penalized() {
        let experimental = spectrum(&[(100.0, 1000.0)]);
        let reference = spectrum(&[(100.0, 1000.0), (200.0, 1000.0)]);
        let [weighted, simple, _] = score_all(&experimental, &reference);
        assert!((weighted - 0.75 / 3.0).abs() < 1e-9, "{weighted}");
        assert!((simple - 0.75 * 0.5).abs() < 1e-9, "{simple}");
        let [weighted_swapped, simple_swapped, _] = score_all(&reference, &experimental);
        assert_eq!(weighted, weighted_swapped);
        assert_eq!(simple, simple_swapped);
    }

    #[test]
    fn test_noise_bins_dropped() {
        let experimental = spectrum(&[(100.0, 1000.0), (150.0, 5.0), (200.0, 500.0)]);
        let reference = spectrum(&[(100.0, 1000.0), (200.0, 500.0), (250.0, 4.0)]);
        let [weighted, simple, _] = score_all(&experimental, &reference);
        // Both 150 and 250 are under 1% of the base peak on either side
        assert!((weighted - 1.0).abs() < 1e-9, "{weighted}");
        assert!((simple - 1.0).abs() < 1e-9, "{simple}");
    }

    #[test]
    fn test_disjoint_spectra() {
        let a = spectrum(&[(100.0, 10.0), (200.0, 10.0)]);
        let b = spectrum(&[(150.0, 10.0), (250.0, 10.0)]);
        for score in score_all(&a, &b) {
            assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn test_zero_base() {
        let a = spectrum(&[(100.0, 0.0)]);
        let b = spectrum(&[(100.0, 10.0)]);
        for score in score_all(&a, &b) {
            assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn test_empty_sentinel() {
        let a = spectrum(&[(100.0, 10.0)]);
        let empty = Vec::new();
        for score in score_all(&empty, &a) {
            assert_eq!(score, NOT_COMPUTED);
        }
        for score in score_all(&a, &empty) {
            assert_eq!(score, NOT_COMPUTED);
        }
        assert_eq!(
            matched_peak_presence(&empty, &a, 0.01, 0.0, 1000.0),
            PresenceScore::NOT_COMPUTED
        );
    }

    #[test]
    fn test_weighting_favors_high_mass() {
        let reference = spectrum(&[(100.0, 100.0), (200.0, 100.0), (300.0, 100.0), (400.0, 100.0), (900.0, 100.0)]);
        let low_miss = spectrum(&[(200.0, 100.0), (300.0, 100.0), (400.0, 100.0), (900.0, 100.0)]);
        let high_miss = spectrum(&[(100.0, 100.0), (200.0, 100.0), (300.0, 100.0), (400.0, 100.0)]);
        let weighted = WeightedDotProduct::default();
        let a = weighted.score(&low_miss, &reference, 0.01, 0.0, 2000.0);
        let b = weighted.score(&high_miss, &reference, 0.01, 0.0, 2000.0);
        assert!(a > b, "{a} <= {b}");
        let simple = SimpleDotProduct::default();
        let a = simple.score(&low_miss, &reference, 0.01, 0.0, 2000.0);
        let b = simple.score(&high_miss, &reference, 0.01, 0.0, 2000.0);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_presence() {
        let experimental = spectrum(&[(100.0, 500.0)]);
        let reference = spectrum(&[(100.0, 500.0), (200.0, 500.0), (250.0, 1.0)]);
        let presence = matched_peak_presence(&experimental, &reference, 0.01, 0.0, 1000.0);
        // The 250 m/z peak is under 1% of the base peak and is not counted
        assert_eq!(presence.library_peak_count, 2);
        assert_eq!(presence.matched_count, 1);
        assert_eq!(presence.ratio, 0.5);
    }

    #[test]
    fn test_presence_no_countable_peaks() {
        let experimental = spectrum(&[(100.0, 500.0)]);
        let reference = spectrum(&[(100.0, 500.0)]);
        let presence = matched_peak_presence(&experimental, &reference, 0.01, 300.0, 1000.0);
        assert_eq!(presence, PresenceScore::new(0, 0));
        assert_eq!(presence.ratio, 0.0);
    }
}
