use std::path::Path;

use mzdata::io::{infer_format, MassSpectrometryFormat};
use mzdata::prelude::*;
use tracing::{debug, warn};

use mzpeaks::prelude::*;

use crate::driver::MSMatcherError;
use crate::types::{CPeak, SpectrumRecord};

/// Which spectra of a file to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumSelection {
    /// MSn spectra with a precursor, for queries
    TandemWithPrecursor,
    /// Every spectrum, for library entries
    All,
}

/// Read every spectrum of `path` that `selection` admits, centroided and sorted by m/z.
///
/// Spectra that cannot be centroided are skipped with a warning.
pub fn read_spectra<P: AsRef<Path>>(
    path: P,
    selection: SpectrumSelection,
) -> Result<Vec<SpectrumRecord>, MSMatcherError> {
    let path = path.as_ref();
    let (ms_format, compressed) = infer_format(path)?;
    debug!(
        "Detected {ms_format:?} from {} (compressed? {compressed})",
        path.display()
    );
    if !matches!(
        ms_format,
        MassSpectrometryFormat::MGF | MassSpectrometryFormat::MzML
    ) {
        return Err(MSMatcherError::FormatUnknownOrNotSupportedError(
            path.display().to_string(),
            ms_format,
        ));
    }
    let reader = mzdata::MZReader::open_path(path)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for scan in reader {
        let ms_level = scan.ms_level();
        let precursor_mz = scan.precursor().map(|prec| prec.ion().mz);
        if selection == SpectrumSelection::TandemWithPrecursor
            && (ms_level < 2 || precursor_mz.is_none())
        {
            skipped += 1;
            continue;
        }
        let id = scan.id().to_string();
        let index = scan.index();
        let start_time = scan.start_time();
        let centroided = match scan.into_centroid() {
            Ok(centroided) => centroided,
            Err(e) => {
                warn!("Skipping {id}, it could not be centroided: {e:?}");
                skipped += 1;
                continue;
            }
        };
        let mut peaks: Vec<CPeak> = centroided.peaks.iter().cloned().collect();
        peaks.sort_by(|a, b| a.mz().total_cmp(&b.mz()));
        records.push(SpectrumRecord {
            id,
            index,
            ms_level,
            precursor_mz,
            start_time,
            peaks,
        });
    }
    debug!(
        "Read {} spectra from {}, skipped {skipped}",
        records.len(),
        path.display()
    );
    Ok(records)
}
