use std::fmt::Display;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use msmatch::TargetOmics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgTargetOmics {
    #[default]
    /// Small molecules, weighting retention and spectral similarity evenly
    Metabolomics,
    /// Lipids, weighting diagnostic fragment presence over retention
    Lipidomics,
    /// Peptides, additionally requiring a passing Andromeda score for a spectrum match
    Proteomics,
}

impl From<ArgTargetOmics> for TargetOmics {
    fn from(value: ArgTargetOmics) -> Self {
        match value {
            ArgTargetOmics::Metabolomics => TargetOmics::Metabolomics,
            ArgTargetOmics::Lipidomics => TargetOmics::Lipidomics,
            ArgTargetOmics::Proteomics => TargetOmics::Proteomics,
        }
    }
}

impl Display for ArgTargetOmics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", TargetOmics::from(*self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgRetentionAxis {
    #[default]
    Time,
    Index,
}

pub(crate) fn non_negative_float_f64(s: &str) -> Result<f64, String> {
    let value = s.parse::<f64>().map_err(|e| e.to_string())?;
    if value < 0.0 {
        Err(format!("`{s}` is less than zero"))
    } else {
        Ok(value)
    }
}

/// Search parameters that may be given on the command line.
///
/// Anything left unset falls through to the configuration files, environment
/// variables, or built-in defaults, in that order.
#[derive(Args, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchArgs {
    /// The precursor m/z tolerance in Da
    #[arg(short = 'p', long = "ms1-tolerance", value_parser = non_negative_float_f64)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms1_tolerance: Option<f64>,

    /// The fragment m/z tolerance in Da
    #[arg(short = 'f', long = "ms2-tolerance", value_parser = non_negative_float_f64)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms2_tolerance: Option<f64>,

    /// The retention time tolerance in minutes
    #[arg(long = "rt-tolerance", value_parser = non_negative_float_f64)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt_tolerance: Option<f64>,

    /// The lowest fragment m/z compared
    #[arg(long = "mass-range-begin", value_parser = non_negative_float_f64)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass_range_begin: Option<f64>,

    /// The highest fragment m/z compared
    #[arg(long = "mass-range-end", value_parser = non_negative_float_f64)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass_range_end: Option<f64>,

    /// The fewest matched library peaks for a spectrum match
    #[arg(long = "minimum-matched-peaks")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_matched_peaks: Option<i32>,

    /// The kind of compounds being searched, which selects the score weighting
    #[arg(short = 'm', long = "target-omics")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_omics: Option<ArgTargetOmics>,

    /// Which retention coordinate is compared when retention is scored
    #[arg(long = "retention-axis")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_axis: Option<ArgRetentionAxis>,

    /// Include retention time similarity in the total score
    #[arg(long = "use-time-for-scoring")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_time_for_scoring: Option<bool>,
}
