use mzpeaks::CentroidPeak;
use serde::Serialize;

use msmatch::{MatchResult, ScanProperties};

pub(crate) type CPeak = CentroidPeak;

/// A centroided spectrum and the scalar properties the search uses
#[derive(Debug, Clone)]
pub struct SpectrumRecord {
    pub id: String,
    pub index: usize,
    pub ms_level: u8,
    pub precursor_mz: Option<f64>,
    /// In minutes
    pub start_time: f64,
    pub peaks: Vec<CPeak>,
}

impl SpectrumRecord {
    /// Borrow as [`ScanProperties`]. A start time of zero is treated as unrecorded.
    pub fn as_scan_properties(&self) -> ScanProperties<'_, CPeak> {
        let mut props = ScanProperties::new(&self.peaks);
        if let Some(mz) = self.precursor_mz {
            props = props.with_precursor_mz(mz);
        }
        if self.start_time > 0.0 {
            props = props.with_retention_time(self.start_time);
        }
        props
    }
}

/// One ranked library match for a query
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub query_id: String,
    pub query_index: usize,
    pub query_precursor_mz: Option<f64>,
    pub rank: usize,
    pub library_id: String,
    pub library_index: usize,
    pub library_precursor_mz: Option<f64>,
    pub modified_cosine: f64,
    #[serde(flatten)]
    pub scores: MatchResult,
}

pub(crate) const DEFAULT_TOP_N: usize = 5;
pub(crate) const DEFAULT_CONFIG_FILE: &str = "msmatcher.toml";
pub(crate) const ENV_PREFIX: &str = "MSMATCHER_";
