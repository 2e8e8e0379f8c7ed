//! Peak-to-peak assignment between two spectra.
//!
//! Nothing here mutates the peaks it is given. Which peak matched which is
//! reported as index maps owned by the result, so the same spectra can be shared
//! by any number of concurrent comparisons.
use std::collections::HashMap;

use mzpeaks::{prelude::*, Tolerance};

use crate::peaks::{is_mz_sorted, tolerance_width, FragmentAnnotation, FragmentPeak};

/// A reference peak paired with the query peak assigned to it
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchedPeak {
    /// The reference peak's m/z
    pub mz: f64,
    /// The reference peak's intensity
    pub intensity: f64,
    /// The intensity of the query peak assigned to it
    pub matched_intensity: f64,
    /// Whether the pair matched directly, rather than after shifting the query peak
    /// by the precursor mass difference
    pub is_product_ion: bool,
}

/// Records which side of a [`match_peaks`] call became the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// The first spectrum had the smaller precursor m/z and is the query
    #[default]
    AsGiven,
    /// The second spectrum had the smaller precursor m/z, so the two were swapped
    Swapped,
}

/// The outcome of a greedy one-to-one peak assignment
#[derive(Debug, Clone, Default)]
pub struct PeakMatches {
    /// One entry per assigned pair, in the order they were assigned
    pub pairs: Vec<MatchedPeak>,
    /// For each reference peak, the index of the query peak assigned to it
    pub reference_to_query: Vec<Option<usize>>,
    /// For each query peak, whether it was consumed by some pairing
    pub query_matched: Vec<bool>,
    pub orientation: Orientation,
    query_total: f64,
    reference_total: f64,
}

impl PeakMatches {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The number of pairs that matched without a precursor shift
    pub fn product_ion_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_product_ion).count()
    }

    /// The number of pairs that only matched after the precursor shift
    pub fn neutral_loss_count(&self) -> usize {
        self.len() - self.product_ion_count()
    }

    /// The cosine between the square-root-scaled intensities of both spectra,
    /// counting only assigned pairs in the numerator.
    ///
    /// Returns `0.0` when either spectrum has no signal.
    pub fn modified_cosine(&self) -> f64 {
        if self.query_total <= 0.0 || self.reference_total <= 0.0 {
            return 0.0;
        }
        let shared: f64 = self
            .pairs
            .iter()
            .map(|p| (p.intensity * p.matched_intensity).sqrt())
            .sum();
        shared / (self.query_total * self.reference_total).sqrt()
    }
}

/// The index range of `peaks` whose m/z falls strictly within `(center - width, center + width)`
#[inline]
fn open_window<C: CentroidLike>(peaks: &[C], center: f64, width: f64) -> std::ops::Range<usize> {
    let lower = center - width;
    let upper = center + width;
    let start = peaks.partition_point(|p| p.mz() <= lower);
    let end = peaks.partition_point(|p| p.mz() < upper);
    start..end.max(start)
}

fn match_oriented<Q: CentroidLike, R: CentroidLike>(
    query: &[Q],
    query_precursor_mz: f64,
    reference: &[R],
    reference_precursor_mz: f64,
    error_tolerance: Tolerance,
    orientation: Orientation,
) -> PeakMatches {
    debug_assert!(is_mz_sorted(query), "query peaks must be sorted by m/z");
    debug_assert!(is_mz_sorted(reference), "reference peaks must be sorted by m/z");

    let precursor_diff = reference_precursor_mz - query_precursor_mz;

    let mut query_matched = vec![false; query.len()];
    let mut reference_to_query = vec![None; reference.len()];
    let mut pairs = Vec::with_capacity(reference.len().min(query.len()));

    let mut order: Vec<usize> = (0..reference.len()).collect();
    order.sort_by(|a, b| reference[*b].intensity().total_cmp(&reference[*a].intensity()));

    for ref_index in order {
        let ref_peak = &reference[ref_index];
        let ref_mz = ref_peak.mz();
        let ref_intensity = ref_peak.intensity() as f64;
        let width = tolerance_width(error_tolerance, ref_mz);

        // Candidates either sit on the reference peak directly or sit one precursor
        // difference below it. Direct candidates are visited first so they win ties.
        let direct = open_window(query, ref_mz, width);
        let shifted = open_window(query, ref_mz - precursor_diff, width);

        let mut best: Option<(usize, f64, bool)> = None;
        for (query_index, is_direct) in direct
            .map(|i| (i, true))
            .chain(shifted.map(|i| (i, false)))
        {
            if query_matched[query_index] {
                continue;
            }
            let delta = (query[query_index].intensity() as f64 - ref_intensity).abs();
            match best {
                Some((_, best_delta, _)) if delta >= best_delta => {}
                _ => best = Some((query_index, delta, is_direct)),
            }
        }

        if let Some((query_index, _, is_direct)) = best {
            query_matched[query_index] = true;
            reference_to_query[ref_index] = Some(query_index);
            pairs.push(MatchedPeak {
                mz: ref_mz,
                intensity: ref_intensity,
                matched_intensity: query[query_index].intensity() as f64,
                is_product_ion: is_direct,
            });
        }
    }

    tracing::trace!(
        "Matched {} of {} reference peaks against {} query peaks (precursor shift {precursor_diff:0.4})",
        pairs.len(),
        reference.len(),
        query.len()
    );

    PeakMatches {
        pairs,
        reference_to_query,
        query_matched,
        orientation,
        query_total: query.iter().map(|p| p.intensity() as f64).sum(),
        reference_total: reference.iter().map(|p| p.intensity() as f64).sum(),
    }
}

/// Greedily pair peaks between two spectra, tolerating a shift equal to the
/// difference between their precursor m/z.
///
/// The spectrum with the smaller precursor m/z is always treated as the query and
/// the other as the reference, regardless of argument order; [`PeakMatches::orientation`]
/// reports whether the arguments were swapped. Reference peaks are visited from most
/// to least intense, and each takes the unassigned query peak closest to it in
/// intensity among those within `error_tolerance` of either its m/z or its m/z minus
/// the precursor difference. No peak on either side is used twice.
///
/// This is a greedy assignment, not an optimal bipartite matching.
pub fn match_peaks<A: CentroidLike, B: CentroidLike>(
    first: &[A],
    first_precursor_mz: f64,
    second: &[B],
    second_precursor_mz: f64,
    error_tolerance: Tolerance,
) -> PeakMatches {
    if first_precursor_mz <= second_precursor_mz {
        match_oriented(
            first,
            first_precursor_mz,
            second,
            second_precursor_mz,
            error_tolerance,
            Orientation::AsGiven,
        )
    } else {
        match_oriented(
            second,
            second_precursor_mz,
            first,
            first_precursor_mz,
            error_tolerance,
            Orientation::Swapped,
        )
    }
}

/// The reference fragments retained for probability scoring and whether each
/// found a partner in the experimental spectrum.
#[derive(Debug, Clone, Default)]
pub struct FragmentMatches {
    /// Indices into the reference spectrum of the fragments that were considered
    pub considered: Vec<usize>,
    /// Parallel to `considered`
    pub matched: Vec<bool>,
}

impl FragmentMatches {
    /// The number of fragments considered
    pub fn total(&self) -> usize {
        self.considered.len()
    }

    /// The number of considered fragments that were matched
    pub fn matched_count(&self) -> usize {
        self.matched.iter().filter(|m| **m).count()
    }
}

/// Match annotated reference fragments against an experimental spectrum for
/// probability scoring.
///
/// Fragments are assigned one-to-one in the same greedy order as [`match_peaks`]:
/// most intense fragment first, each taking the unassigned experimental peak within
/// `error_tolerance` closest to it in intensity. No precursor shift is applied. The
/// following fragments are dropped from the result entirely, so they count toward
/// neither the trial count nor the success count:
/// - peaks annotated as the precursor
/// - fragments with a charge state above one
/// - water and ammonia losses whose parent fragment was not itself matched
pub fn match_fragments_restricted<C: CentroidLike>(
    experimental: &[C],
    reference: &[FragmentPeak],
    error_tolerance: Tolerance,
) -> FragmentMatches {
    debug_assert!(is_mz_sorted(experimental), "experimental peaks must be sorted by m/z");

    let is_eligible = |a: &FragmentAnnotation| !a.is_precursor() && a.charge.abs() <= 1;

    let mut order: Vec<usize> = (0..reference.len())
        .filter(|i| is_eligible(&reference[*i].annotation))
        .collect();
    order.sort_by(|a, b| reference[*b].intensity.total_cmp(&reference[*a].intensity));

    let mut query_matched = vec![false; experimental.len()];
    let mut hits = vec![false; reference.len()];
    for ref_index in order {
        let frag = &reference[ref_index];
        let width = tolerance_width(error_tolerance, frag.mz);
        let best = open_window(experimental, frag.mz, width)
            .filter(|i| !query_matched[*i])
            .min_by(|a, b| {
                let da = (experimental[*a].intensity() - frag.intensity).abs();
                let db = (experimental[*b].intensity() - frag.intensity).abs();
                da.total_cmp(&db)
            });
        if let Some(query_index) = best {
            query_matched[query_index] = true;
            hits[ref_index] = true;
        }
    }

    let parent_hits: HashMap<FragmentAnnotation, bool> = reference
        .iter()
        .zip(hits.iter())
        .filter(|(frag, _)| frag.annotation.is_backbone() && frag.annotation.neutral_loss.is_none())
        .fold(HashMap::new(), |mut acc, (frag, hit)| {
            *acc.entry(frag.annotation).or_insert(false) |= *hit;
            acc
        });

    let mut result = FragmentMatches::default();
    for (i, (frag, hit)) in reference.iter().zip(hits).enumerate() {
        if !is_eligible(&frag.annotation) {
            continue;
        }
        if let Some(parent) = frag.annotation.parent() {
            if !parent_hits.get(&parent).copied().unwrap_or_default() {
                continue;
            }
        }
        result.considered.push(i);
        result.matched.push(hit);
    }
    tracing::trace!(
        "Matched {} of {} considered fragments",
        result.matched_count(),
        result.total()
    );
    result
}
