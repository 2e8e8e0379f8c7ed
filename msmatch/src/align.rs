//! Two-pointer alignment of a pair of m/z-sorted peak lists.
//!
//! Each step of the alignment centers a window of `±tolerance` on a *focus* m/z,
//! sums the intensity of every peak from each spectrum falling within
//! `[focus - tolerance, focus + tolerance)`, and then moves the focus to the
//! next peak that has not yet been consumed. The bins therefore sit on real peak
//! positions rather than a fixed-width grid.
use std::iter::FusedIterator;

use mzpeaks::prelude::*;

use crate::peaks::is_mz_sorted;

/// Which peaks may become the focus of an aligned bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlignmentExtent {
    /// Only reference peaks are visited, and the alignment spans the reference
    /// spectrum's own m/z range.
    #[default]
    Reference,
    /// Peaks from either spectrum are visited, and the alignment spans the union
    /// of both spectra's m/z ranges.
    Union,
}

/// The summed signal of both spectra around a single focus m/z
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignedBin {
    pub mz: f64,
    pub measured: f64,
    pub reference: f64,
}

impl AlignedBin {
    pub fn new(mz: f64, measured: f64, reference: f64) -> Self {
        Self {
            mz,
            measured,
            reference,
        }
    }
}

/// A lazy iterator over [`AlignedBin`]s.
///
/// Both spectra must be sorted by m/z. Each spectrum has its own cursor which
/// only ever moves forward, so a full pass costs `O(|reference| + |measured|)`.
#[derive(Debug, Clone)]
pub struct SpectrumAlignment<'a, R: CentroidLike, M: CentroidLike> {
    reference: &'a [R],
    measured: &'a [M],
    tolerance: f64,
    extent: AlignmentExtent,
    focus: Option<f64>,
    upper_bound: f64,
    reference_cursor: usize,
    measured_cursor: usize,
}

impl<'a, R: CentroidLike, M: CentroidLike> SpectrumAlignment<'a, R, M> {
    pub fn new(
        reference: &'a [R],
        measured: &'a [M],
        tolerance: f64,
        range_begin: f64,
        range_end: f64,
        extent: AlignmentExtent,
    ) -> Self {
        debug_assert!(is_mz_sorted(reference), "reference peaks must be sorted by m/z");
        debug_assert!(is_mz_sorted(measured), "measured peaks must be sorted by m/z");
        debug_assert!(tolerance > 0.0, "alignment tolerance must be positive, got {tolerance}");

        let mut this = Self {
            reference,
            measured,
            tolerance,
            extent,
            focus: None,
            upper_bound: f64::NEG_INFINITY,
            reference_cursor: 0,
            measured_cursor: 0,
        };

        // A window of zero width never consumes a peak and would never advance
        if reference.is_empty() || measured.is_empty() || !(tolerance > 0.0) {
            return this;
        }

        let ref_first = reference[0].mz();
        let ref_last = reference[reference.len() - 1].mz();
        let (lower, upper) = match extent {
            AlignmentExtent::Reference => (ref_first, ref_last),
            AlignmentExtent::Union => {
                let meas_first = measured[0].mz();
                let meas_last = measured[measured.len() - 1].mz();
                (ref_first.min(meas_first), ref_last.max(meas_last))
            }
        };
        this.focus = Some(lower.max(range_begin));
        this.upper_bound = upper.min(range_end);
        this
    }

    /// Sum the intensities of the peaks starting at `cursor` within `[lower, upper)`,
    /// leaving `cursor` on the first peak at or above `upper`. Peaks below `lower`
    /// are skipped over without being counted.
    #[inline]
    fn sum_window<C: CentroidLike>(peaks: &[C], cursor: &mut usize, lower: f64, upper: f64) -> f64 {
        let mut total = 0.0;
        while let Some(peak) = peaks.get(*cursor) {
            let mz = peak.mz();
            if mz >= upper {
                break;
            }
            if mz >= lower {
                total += peak.intensity() as f64;
            }
            *cursor += 1;
        }
        total
    }

    fn next_focus(&self) -> Option<f64> {
        let reference_next = self.reference.get(self.reference_cursor).map(|p| p.mz());
        match self.extent {
            AlignmentExtent::Reference => reference_next,
            AlignmentExtent::Union => {
                let measured_next = self.measured.get(self.measured_cursor).map(|p| p.mz());
                match (reference_next, measured_next) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                }
            }
        }
    }
}

impl<R: CentroidLike, M: CentroidLike> Iterator for SpectrumAlignment<'_, R, M> {
    type Item = AlignedBin;

    fn next(&mut self) -> Option<Self::Item> {
        let focus = self.focus?;
        if focus > self.upper_bound {
            self.focus = None;
            return None;
        }
        let lower = focus - self.tolerance;
        let upper = focus + self.tolerance;
        let measured = Self::sum_window(self.measured, &mut self.measured_cursor, lower, upper);
        let reference = Self::sum_window(self.reference, &mut self.reference_cursor, lower, upper);
        self.focus = self.next_focus();
        Some(AlignedBin::new(focus, measured, reference))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.focus.is_none() {
            return (0, Some(0));
        }
        let remaining = match self.extent {
            AlignmentExtent::Reference => self.reference.len() - self.reference_cursor,
            AlignmentExtent::Union => {
                (self.reference.len() - self.reference_cursor)
                    + (self.measured.len() - self.measured_cursor)
            }
        };
        // A focus set from `range_begin` may not sit on a peak, so allow one extra
        (0, Some(remaining + 1))
    }
}

impl<R: CentroidLike, M: CentroidLike> FusedIterator for SpectrumAlignment<'_, R, M> {}

/// Align `measured` against `reference`, visiting only the reference spectrum's peaks.
pub fn align<'a, R: CentroidLike, M: CentroidLike>(
    reference: &'a [R],
    measured: &'a [M],
    tolerance: f64,
    range_begin: f64,
    range_end: f64,
) -> SpectrumAlignment<'a, R, M> {
    SpectrumAlignment::new(
        reference,
        measured,
        tolerance,
        range_begin,
        range_end,
        AlignmentExtent::Reference,
    )
}

/// Align `measured` against `reference`, visiting peaks from both spectra.
pub fn align_union<'a, R: CentroidLike, M: CentroidLike>(
    reference: &'a [R],
    measured: &'a [M],
    tolerance: f64,
    range_begin: f64,
    range_end: f64,
) -> SpectrumAlignment<'a, R, M> {
    SpectrumAlignment::new(
        reference,
        measured,
        tolerance,
        range_begin,
        range_end,
        AlignmentExtent::Union,
    )
}
