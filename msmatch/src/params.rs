//! Search parameters shared by every comparison in a run
use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// The kind of compounds being searched, which selects the score weighting and
/// which cutoffs decide a spectrum match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TargetOmics {
    /// General small molecule identification
    #[default]
    Metabolomics,
    /// Lipid identification, which relies on class-diagnostic fragments over retention
    Lipidomics,
    /// Peptide identification, which additionally requires a passing Andromeda score
    Proteomics,
}

impl Display for TargetOmics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Metabolomics => "metabolomics",
            Self::Lipidomics => "lipidomics",
            Self::Proteomics => "proteomics",
        };
        f.write_str(name)
    }
}

impl FromStr for TargetOmics {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metabolomics" | "general" => Ok(Self::Metabolomics),
            "lipidomics" => Ok(Self::Lipidomics),
            "proteomics" => Ok(Self::Proteomics),
            _ => Err(ParameterError::UnknownTargetOmics(s.to_string())),
        }
    }
}

/// Which retention coordinate is compared when retention contributes to the total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RetentionAxis {
    #[default]
    Time,
    Index,
}

impl Display for RetentionAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Time => f.write_str("time"),
            Self::Index => f.write_str("index"),
        }
    }
}

impl FromStr for RetentionAxis {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" | "rt" => Ok(Self::Time),
            "index" | "ri" => Ok(Self::Index),
            _ => Err(ParameterError::UnknownRetentionAxis(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("The {name} tolerance must be a finite, positive number, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },
    #[error("The mass range {begin}-{end} is empty or not finite")]
    InvalidMassRange { begin: f64, end: f64 },
    #[error("The Andromeda delta must be positive, got {0}")]
    InvalidAndromedaDelta(f64),
    #[error("The Andromeda peak count must be positive, got {0}")]
    InvalidAndromedaPeakCount(f64),
    #[error("{0} is not a recognized target omics")]
    UnknownTargetOmics(String),
    #[error("{0} is not a recognized retention axis")]
    UnknownRetentionAxis(String),
}

/// The tolerances, cutoffs, and switches used to compare spectra.
///
/// Instances built through [`SearchParametersBuilder`] have been validated.
/// Values constructed directly are trusted as-is, and nonsensical values produce
/// nonsensical scores rather than errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchParameters {
    /// The precursor m/z tolerance in Da
    pub ms1_tolerance: f64,
    /// The fragment m/z tolerance in Da
    pub ms2_tolerance: f64,
    /// The retention time tolerance in minutes
    pub rt_tolerance: f64,
    pub ri_tolerance: f64,
    pub ccs_tolerance: f64,

    pub mass_range_begin: f64,
    pub mass_range_end: f64,

    pub weighted_dot_product_cutoff: f64,
    pub simple_dot_product_cutoff: f64,
    pub reverse_dot_product_cutoff: f64,
    /// The minimum fraction of countable reference peaks observed
    pub matched_peaks_percentage_cutoff: f64,
    pub minimum_matched_peaks: i32,
    pub andromeda_score_cutoff: f64,

    pub andromeda_delta: f64,
    pub andromeda_max_peaks: f64,

    pub use_time_for_scoring: bool,
    pub use_ccs_for_scoring: bool,
    pub retention_axis: RetentionAxis,
    pub target_omics: TargetOmics,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            ms1_tolerance: 0.01,
            ms2_tolerance: 0.025,
            rt_tolerance: 0.5,
            ri_tolerance: 100.0,
            ccs_tolerance: 10.0,
            mass_range_begin: 0.0,
            mass_range_end: 2000.0,
            weighted_dot_product_cutoff: 0.15,
            simple_dot_product_cutoff: 0.15,
            reverse_dot_product_cutoff: 0.3,
            matched_peaks_percentage_cutoff: 0.0,
            minimum_matched_peaks: 0,
            andromeda_score_cutoff: 0.1,
            andromeda_delta: 100.0,
            andromeda_max_peaks: 12.0,
            use_time_for_scoring: false,
            use_ccs_for_scoring: false,
            retention_axis: RetentionAxis::Time,
            target_omics: TargetOmics::Metabolomics,
        }
    }
}

impl SearchParameters {
    pub fn builder() -> SearchParametersBuilder {
        SearchParametersBuilder::default()
    }

    /// Check the tolerances, mass range, and Andromeda parameters for values that
    /// can only produce degenerate scores.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [
            ("MS1", self.ms1_tolerance),
            ("MS2", self.ms2_tolerance),
            ("retention time", self.rt_tolerance),
            ("retention index", self.ri_tolerance),
            ("CCS", self.ccs_tolerance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParameterError::InvalidTolerance { name, value });
            }
        }
        if !self.mass_range_begin.is_finite()
            || !self.mass_range_end.is_finite()
            || self.mass_range_begin > self.mass_range_end
        {
            return Err(ParameterError::InvalidMassRange {
                begin: self.mass_range_begin,
                end: self.mass_range_end,
            });
        }
        if !(self.andromeda_delta > 0.0) {
            return Err(ParameterError::InvalidAndromedaDelta(self.andromeda_delta));
        }
        if !(self.andromeda_max_peaks > 0.0) {
            return Err(ParameterError::InvalidAndromedaPeakCount(
                self.andromeda_max_peaks,
            ));
        }
        Ok(())
    }
}

/// Assembles a [`SearchParameters`], validating it once in [`SearchParametersBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct SearchParametersBuilder {
    params: SearchParameters,
}

impl From<SearchParameters> for SearchParametersBuilder {
    fn from(params: SearchParameters) -> Self {
        Self { params }
    }
}

impl SearchParametersBuilder {
    pub fn ms1_tolerance(&mut self, value: f64) -> &mut Self {
        self.params.ms1_tolerance = value;
        self
    }

    pub fn ms2_tolerance(&mut self, value: f64) -> &mut Self {
        self.params.ms2_tolerance = value;
        self
    }

    pub fn rt_tolerance(&mut self, value: f64) -> &mut Self {
        self.params.rt_tolerance = value;
        self
    }

    pub fn ri_tolerance(&mut self, value: f64) -> &mut Self {
        self.params.ri_tolerance = value;
        self
    }

    pub fn ccs_tolerance(&mut self, value: f64) -> &mut Self {
        self.params.ccs_tolerance = value;
        self
    }

    pub fn mass_range(&mut self, begin: f64, end: f64) -> &mut Self {
        self.params.mass_range_begin = begin;
        self.params.mass_range_end = end;
        self
    }

    pub fn dot_product_cutoffs(&mut self, weighted: f64, simple: f64, reverse: f64) -> &mut Self {
        self.params.weighted_dot_product_cutoff = weighted;
        self.params.simple_dot_product_cutoff = simple;
        self.params.reverse_dot_product_cutoff = reverse;
        self
    }

    pub fn matched_peaks_percentage_cutoff(&mut self, value: f64) -> &mut Self {
        self.params.matched_peaks_percentage_cutoff = value;
        self
    }

    pub fn minimum_matched_peaks(&mut self, value: i32) -> &mut Self {
        self.params.minimum_matched_peaks = value;
        self
    }

    pub fn andromeda(&mut self, delta: f64, max_peaks: f64, cutoff: f64) -> &mut Self {
        self.params.andromeda_delta = delta;
        self.params.andromeda_max_peaks = max_peaks;
        self.params.andromeda_score_cutoff = cutoff;
        self
    }

    pub fn use_time_for_scoring(&mut self, value: bool) -> &mut Self {
        self.params.use_time_for_scoring = value;
        self
    }

    pub fn use_ccs_for_scoring(&mut self, value: bool) -> &mut Self {
        self.params.use_ccs_for_scoring = value;
        self
    }

    pub fn retention_axis(&mut self, value: RetentionAxis) -> &mut Self {
        self.params.retention_axis = value;
        self
    }

    pub fn target_omics(&mut self, value: TargetOmics) -> &mut Self {
        self.params.target_omics = value;
        self
    }

    pub fn build(&self) -> Result<SearchParameters, ParameterError> {
        self.params.validate()?;
        Ok(self.params.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = SearchParameters::builder().build().unwrap();
        assert_eq!(params, SearchParameters::default());
        assert_eq!(params.andromeda_max_peaks / params.andromeda_delta, 0.12);
    }

    #[test]
    fn test_builder_rejects() {
        let err = SearchParameters::builder()
            .ms2_tolerance(-0.1)
            .build()
            .unwrap_err();
        assert!(matches!(err, ParameterError::InvalidTolerance { name: "MS2", .. }));

        let err = SearchParameters::builder()
            .rt_tolerance(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, ParameterError::InvalidTolerance { .. }));

        let err = SearchParameters::builder()
            .mass_range(500.0, 100.0)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ParameterError::InvalidMassRange {
                begin: 500.0,
                end: 100.0
            }
        );

        let err = SearchParameters::builder()
            .andromeda(0.0, 12.0, 0.1)
            .build()
            .unwrap_err();
        assert_eq!(err, ParameterError::InvalidAndromedaDelta(0.0));
    }

    #[test]
    fn test_builder_sets() {
        let params = SearchParameters::builder()
            .ms1_tolerance(0.005)
            .target_omics(TargetOmics::Lipidomics)
            .use_time_for_scoring(true)
            .retention_axis(RetentionAxis::Index)
            .build()
            .unwrap();
        assert_eq!(params.ms1_tolerance, 0.005);
        assert_eq!(params.target_omics, TargetOmics::Lipidomics);
        assert!(params.use_time_for_scoring);
        assert_eq!(params.retention_axis, RetentionAxis::Index);
    }

    #[test]
    fn test_target_omics_names() {
        for target in [
            TargetOmics::Metabolomics,
            TargetOmics::Lipidomics,
            TargetOmics::Proteomics,
        ] {
            assert_eq!(target.to_string().parse::<TargetOmics>().unwrap(), target);
        }
        assert_eq!("General".parse::<TargetOmics>().unwrap(), TargetOmics::Metabolomics);
        assert!("glycomics".parse::<TargetOmics>().is_err());
    }
}
