//! Peak types and helpers shared by the scoring components.
use std::cmp::Ordering;

use mzpeaks::{prelude::*, IndexType, Tolerance, MZ};

/// The fragment ion series a reference peak was annotated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IonSeries {
    /// The intact precursor ion, or one of its isotopes
    Precursor,
    /// An N-terminal backbone fragment (a/b/c-type)
    NTerminal,
    /// A C-terminal backbone fragment (x/y/z-type)
    CTerminal,
    /// Anything else, including unannotated peaks
    #[default]
    Other,
}

/// A small neutral loss riding on a backbone fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeutralLoss {
    Water,
    Ammonia,
}

/// Describes what a reference peak is believed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentAnnotation {
    pub series: IonSeries,
    /// The position of the fragment along its series, e.g. the `3` in `y3`
    pub ordinal: u16,
    pub charge: i32,
    pub neutral_loss: Option<NeutralLoss>,
}

impl Default for FragmentAnnotation {
    fn default() -> Self {
        Self {
            series: IonSeries::Other,
            ordinal: 0,
            charge: 1,
            neutral_loss: None,
        }
    }
}

impl FragmentAnnotation {
    pub fn new(
        series: IonSeries,
        ordinal: u16,
        charge: i32,
        neutral_loss: Option<NeutralLoss>,
    ) -> Self {
        Self {
            series,
            ordinal,
            charge,
            neutral_loss,
        }
    }

    pub fn precursor() -> Self {
        Self::new(IonSeries::Precursor, 0, 1, None)
    }

    pub fn is_precursor(&self) -> bool {
        matches!(self.series, IonSeries::Precursor)
    }

    pub fn is_backbone(&self) -> bool {
        matches!(self.series, IonSeries::NTerminal | IonSeries::CTerminal)
    }

    /// The annotation of the fragment this satellite lost its water or ammonia from.
    pub fn parent(&self) -> Option<FragmentAnnotation> {
        self.neutral_loss.map(|_| Self {
            neutral_loss: None,
            ..*self
        })
    }
}

/// A reference spectrum peak carrying a [`FragmentAnnotation`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentPeak {
    pub mz: f64,
    pub intensity: f32,
    pub index: IndexType,
    pub annotation: FragmentAnnotation,
}

impl FragmentPeak {
    pub fn new(mz: f64, intensity: f32, annotation: FragmentAnnotation) -> Self {
        Self {
            mz,
            intensity,
            index: 0,
            annotation,
        }
    }
}

impl PartialOrd for FragmentPeak {
    /// Fragments order by m/z, then by intensity. Two fragments at the same
    /// position with different annotations are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.mz.partial_cmp(&other.mz) {
            Some(Ordering::Equal) => match self.intensity.partial_cmp(&other.intensity) {
                Some(Ordering::Equal) => (self == other).then_some(Ordering::Equal),
                ord => ord,
            },
            ord => ord,
        }
    }
}

impl CoordinateLike<MZ> for FragmentPeak {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.mz
    }
}

impl IntensityMeasurement for FragmentPeak {
    #[inline]
    fn intensity(&self) -> f32 {
        self.intensity
    }
}

impl IndexedCoordinate<MZ> for FragmentPeak {
    #[inline]
    fn get_index(&self) -> IndexType {
        self.index
    }

    #[inline]
    fn set_index(&mut self, index: IndexType) {
        self.index = index
    }
}

/// One member of an isotopic envelope. The first member of a pattern is the monoisotopic peak.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsotopicPeak {
    pub mz: f64,
    pub relative_abundance: f64,
}

impl IsotopicPeak {
    pub fn new(mz: f64, relative_abundance: f64) -> Self {
        Self {
            mz,
            relative_abundance,
        }
    }
}

/// The half-width of a [`Tolerance`] window around `mz` in Daltons
#[inline]
pub fn tolerance_width(tolerance: Tolerance, mz: f64) -> f64 {
    match tolerance {
        Tolerance::Da(width) => width,
        Tolerance::PPM(ppm) => mz * ppm * 1e-6,
    }
}

/// The largest intensity in `peaks`, or zero for an empty list
pub fn base_peak_intensity<C: CentroidLike>(peaks: &[C]) -> f64 {
    peaks
        .iter()
        .map(|p| p.intensity() as f64)
        .fold(0.0, f64::max)
}

/// Check that `peaks` is sorted ascending by m/z
pub fn is_mz_sorted<C: CentroidLike>(peaks: &[C]) -> bool {
    peaks.windows(2).all(|w| w[0].mz() <= w[1].mz())
}
