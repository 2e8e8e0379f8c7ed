//! Scalar axis similarity: retention time and index, collision cross section,
//! precursor m/z, and isotope ratios.
use crate::peaks::IsotopicPeak;
use crate::scorer::{ScoreType, NOT_COMPUTED};

/// The m/z above which a fixed Da tolerance is treated as the ppm error it represents here
pub const PPM_CROSSOVER_MZ: f64 = 500.0;

/// A Gaussian falloff on the difference between `actual` and `reference`
///
/// ```math
/// s = \exp\left(-\frac{1}{2}\left(\frac{a - r}{t}\right)^2\right)
/// ```
///
/// Returns [`NOT_COMPUTED`] when either value is not positive, meaning the axis is
/// unavailable for one side of the comparison.
#[inline]
pub fn gaussian_similarity(actual: f64, reference: f64, tolerance: f64) -> ScoreType {
    if actual <= 0.0 || reference <= 0.0 {
        return NOT_COMPUTED;
    }
    debug_assert!(tolerance > 0.0, "similarity tolerance must be positive, got {tolerance}");
    let z = (actual - reference) / tolerance;
    (-0.5 * z * z).exp()
}

/// Whether `actual` and `reference` lie within `tolerance` of each other.
///
/// Always `false` when either value is not positive.
#[inline]
pub fn is_within_tolerance(actual: f64, reference: f64, tolerance: f64) -> bool {
    if actual <= 0.0 || reference <= 0.0 {
        return false;
    }
    (actual - reference).abs() <= tolerance
}

/// As [`gaussian_similarity`], treating `None` as an unavailable axis
#[inline]
pub fn optional_gaussian_similarity(
    actual: Option<f64>,
    reference: Option<f64>,
    tolerance: f64,
) -> ScoreType {
    match (actual, reference) {
        (Some(a), Some(r)) => gaussian_similarity(a, r, tolerance),
        _ => NOT_COMPUTED,
    }
}

/// As [`is_within_tolerance`], treating `None` as an unavailable axis
#[inline]
pub fn optional_within_tolerance(actual: Option<f64>, reference: Option<f64>, tolerance: f64) -> bool {
    match (actual, reference) {
        (Some(a), Some(r)) => is_within_tolerance(a, r, tolerance),
        _ => false,
    }
}

/// Scale a Da `tolerance` for use at `mz`.
///
/// Below [`PPM_CROSSOVER_MZ`] the tolerance is used as-is. Above it, the tolerance
/// is converted to the ppm error it represents at the crossover and that ppm error
/// is applied at `mz`.
#[inline]
pub fn mass_scaled_tolerance(mz: f64, tolerance: f64) -> f64 {
    if mz <= PPM_CROSSOVER_MZ {
        return tolerance;
    }
    let ppm = tolerance / PPM_CROSSOVER_MZ * 1e6;
    mz * ppm * 1e-6
}

/// The Gaussian similarity of two precursor m/z values using a [`mass_scaled_tolerance`]
/// computed at `actual`.
pub fn precursor_mz_similarity(actual: f64, reference: f64, tolerance: f64) -> ScoreType {
    gaussian_similarity(actual, reference, mass_scaled_tolerance(actual, tolerance))
}

/// Whether two precursor m/z values agree within a [`mass_scaled_tolerance`] computed at `actual`.
pub fn is_precursor_mz_match(actual: f64, reference: f64, tolerance: f64) -> bool {
    is_within_tolerance(actual, reference, mass_scaled_tolerance(actual, tolerance))
}

/// Compare two isotopic envelopes by their abundance ratios relative to the
/// monoisotopic peak.
///
/// For each isotope after the first that both envelopes share, the disagreement
/// is `|a - b|` when both ratios are at most one, and `1 - min(a, b) / max(a, b)`
/// otherwise. The similarity is one minus the summed disagreement, floored at zero.
///
/// Returns [`NOT_COMPUTED`] when either envelope is empty, has a non-positive
/// monoisotopic abundance, or when the monoisotopic peaks differ by more than `mz_tolerance`.
pub fn isotope_ratio_similarity(
    query: &[IsotopicPeak],
    reference: &[IsotopicPeak],
    mz_tolerance: f64,
) -> ScoreType {
    let (Some(q0), Some(r0)) = (query.first(), reference.first()) else {
        return NOT_COMPUTED;
    };
    if q0.relative_abundance <= 0.0 || r0.relative_abundance <= 0.0 {
        return NOT_COMPUTED;
    }
    if (q0.mz - r0.mz).abs() > mz_tolerance {
        return NOT_COMPUTED;
    }

    let disagreement: f64 = query
        .iter()
        .zip(reference.iter())
        .skip(1)
        .map(|(q, r)| {
            let a = q.relative_abundance / q0.relative_abundance;
            let b = r.relative_abundance / r0.relative_abundance;
            if a <= 1.0 && b <= 1.0 {
                (a - b).abs()
            } else if a > b {
                1.0 - b / a
            } else if b > a {
                1.0 - a / b
            } else {
                0.0
            }
        })
        .sum();

    (1.0 - disagreement).max(0.0)
}
