use mzpeaks::CentroidPeak;
use rayon::prelude::*;

use msmatch::{
    FragmentAnnotation, FragmentPeak, IonSeries, MatchResult, ScanProperties, SearchParameters,
    SpectrumMatcher, TargetOmics,
};

struct LibraryEntry {
    peaks: Vec<CentroidPeak>,
    fragments: Vec<FragmentPeak>,
    precursor_mz: f64,
}

fn library() -> Vec<LibraryEntry> {
    (0..16)
        .map(|i| {
            let shift = i as f64 * 1.5;
            let points = [
                (120.08 + shift, 300.0),
                (233.16 + shift, 999.0),
                (346.25 + shift, 450.0),
                (475.29 + shift, 120.0),
            ];
            let peaks = points
                .iter()
                .enumerate()
                .map(|(j, (mz, int))| CentroidPeak::new(*mz, *int as f32, j as u32))
                .collect();
            let fragments = points
                .iter()
                .enumerate()
                .map(|(j, (mz, int))| {
                    FragmentPeak::new(
                        *mz,
                        *int as f32,
                        FragmentAnnotation::new(IonSeries::NTerminal, j as u16 + 1, 1, None),
                    )
                })
                .collect();
            LibraryEntry {
                peaks,
                fragments,
                precursor_mz: 600.0 + shift,
            }
        })
        .collect()
}

fn queries() -> Vec<(Vec<CentroidPeak>, f64)> {
    (0..8)
        .map(|i| {
            let shift = i as f64 * 3.0;
            let peaks = vec![
                CentroidPeak::new(120.081 + shift, 280.0, 0),
                CentroidPeak::new(233.158 + shift, 900.0, 1),
                CentroidPeak::new(300.0 + shift, 50.0, 2),
                CentroidPeak::new(346.252 + shift, 470.0, 3),
            ];
            (peaks, 600.001 + shift)
        })
        .collect()
}

fn score_all(matcher: &SpectrumMatcher, library: &[LibraryEntry], query: &[CentroidPeak], mz: f64) -> Vec<MatchResult> {
    let q = ScanProperties::new(query).with_precursor_mz(mz);
    library
        .iter()
        .map(|entry| {
            let r = ScanProperties::new(&entry.peaks)
                .with_precursor_mz(entry.precursor_mz)
                .with_fragments(&entry.fragments);
            matcher.compare(&q, &r)
        })
        .collect()
}

#[test_log::test]
fn shared_library_gives_identical_results() {
    let params = SearchParameters::builder()
        .target_omics(TargetOmics::Proteomics)
        .build()
        .unwrap();
    let matcher = SpectrumMatcher::new(params);
    let library = library();
    let queries = queries();

    let sequential: Vec<Vec<MatchResult>> = queries
        .iter()
        .map(|(peaks, mz)| score_all(&matcher, &library, peaks, *mz))
        .collect();

    let parallel: Vec<Vec<MatchResult>> = queries
        .par_iter()
        .map(|(peaks, mz)| score_all(&matcher, &library, peaks, *mz))
        .collect();

    assert_eq!(sequential, parallel);

    // Every query has an exact counterpart in the library
    for (i, results) in sequential.iter().enumerate() {
        let best = results
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_score.total_cmp(&b.1.total_score))
            .map(|(j, _)| j)
            .unwrap();
        assert_eq!(best, i * 2);
        assert!(results[best].is_precursor_mz_match);
        assert!(results[best].andromeda_score > 0.0);
    }
}
