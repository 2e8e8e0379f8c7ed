//! Score mass spectra and their scalar properties against reference library entries.
//!
//! The building blocks are a two-pointer [`align`](align::align)ment of peak lists,
//! the [dot product family](scorer) built on top of it, a greedy shift-tolerant
//! [peak matcher](matcher::match_peaks), the [Andromeda score](probability::AndromedaScorer),
//! [Gaussian proximity](proximity) scoring for retention, CCS, and precursor m/z, and a
//! [weighted aggregator](aggregate::ScoreAggregator). [`SpectrumMatcher`] runs all of them
//! over a pair of [`ScanProperties`].
pub mod align;
pub mod matcher;
pub mod peaks;
pub mod probability;
pub mod proximity;
pub mod scorer;

pub mod aggregate;
pub mod params;
pub mod result;

pub mod api;

pub use crate::aggregate::{ScoreAggregator, WeightTable};
pub use crate::api::{compare_spectra, ScanProperties, SpectrumMatcher};
pub use crate::params::{
    ParameterError, RetentionAxis, SearchParameters, SearchParametersBuilder, TargetOmics,
};
pub use crate::peaks::{FragmentAnnotation, FragmentPeak, IonSeries, IsotopicPeak, NeutralLoss};
pub use crate::result::MatchResult;
pub use crate::scorer::{ScoreType, NOT_COMPUTED};
