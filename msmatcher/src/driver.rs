use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use clap::Parser;
use serde::{Deserialize, Serialize};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use itertools::{Either, Itertools};
use rayon::prelude::*;
use thiserror::Error;

use mzdata::io::MassSpectrometryFormat;
use tracing::{debug, info, warn};

use msmatch::proximity::mass_scaled_tolerance;
use msmatch::{ParameterError, SearchParameters, SearchParametersBuilder, SpectrumMatcher};

use crate::args::SearchArgs;
use crate::read::{read_spectra, SpectrumSelection};
use crate::types::{Hit, SpectrumRecord, DEFAULT_CONFIG_FILE, DEFAULT_TOP_N, ENV_PREFIX};
use crate::write::{write_hits, HitFormat};

#[derive(Debug, Error)]
pub enum MSMatcherError {
    #[error("An IO error occurred: {0}")]
    IOError(
        #[source]
        #[from]
        io::Error,
    ),
    #[error("The input file format for {0} was either unknown or not supported ({1:?})")]
    FormatUnknownOrNotSupportedError(String, MassSpectrometryFormat),
    #[error("Failed to read the configuration: {0}")]
    ConfigurationError(#[source] Box<figment::Error>),
    #[error("Invalid search parameters: {0}")]
    ParameterError(
        #[source]
        #[from]
        ParameterError,
    ),
    #[error("Failed to build the thread pool: {0}")]
    ThreadPoolError(
        #[source]
        #[from]
        rayon::ThreadPoolBuildError,
    ),
    #[error("Failed to serialize a hit: {0}")]
    SerializationError(
        #[source]
        #[from]
        serde_json::Error,
    ),
    #[error("Failed to render the configuration: {0}")]
    RenderConfigurationError(
        #[source]
        #[from]
        toml::ser::Error,
    ),
    #[error("Failed to configure logging: {0}")]
    LoggingError(String),
}

impl From<figment::Error> for MSMatcherError {
    fn from(value: figment::Error) -> Self {
        Self::ConfigurationError(Box::new(value))
    }
}

/// Search tandem mass spectra against a spectral library.
///
/// Read query spectra and library spectra from mzML or MGF files, score every query
/// against the library entries whose precursor m/z is compatible, and write the best
/// ranked hits for each query as a table.
#[derive(Parser, Debug, Deserialize, Serialize)]
#[command(author, version)]
#[serde(default)]
pub struct MSMatcher {
    /// The path to read the query spectra from
    #[arg()]
    pub query_file: PathBuf,

    /// The path to read the library spectra from
    #[arg()]
    pub library_file: PathBuf,

    /// The path to write the hits to, or if '-' is passed, write to STDOUT.
    ///
    /// If the path ends with `.gz`, the output is gzip compressed.
    #[arg(short = 'o', long = "output-file", default_value = "-")]
    pub output_file: PathBuf,

    /// The path to write a log file to, in addition to STDERR
    #[arg(short = 'l', long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// A TOML configuration file to read additional search parameters from.
    ///
    /// Configurations are also read from `msmatcher.toml` in the working directory.
    /// Environment variables prefixed with `MSMATCHER_` will be read too.
    #[arg(long = "config-file")]
    pub config_file: Option<PathBuf>,

    /// The number of threads to use, passing a value < 1 to use all available threads
    #[arg(
        short='t',
        long="threads",
        default_value_t=-1,
    )]
    pub threads: i32,

    /// The number of hits to report for each query
    #[arg(short = 'n', long = "top-n", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Write hits as JSON lines instead of a tab-separated table
    #[arg(long = "json")]
    pub json: bool,

    /// Score every library entry, not just those with a compatible precursor m/z
    #[arg(long = "no-precursor-filter")]
    pub no_precursor_filter: bool,

    /// Print the effective search parameters as TOML and exit
    #[arg(long = "print-config")]
    pub print_config: bool,

    #[command(flatten)]
    #[serde(flatten)]
    pub search: SearchArgs,
}

impl Default for MSMatcher {
    fn default() -> Self {
        Self {
            query_file: PathBuf::new(),
            library_file: PathBuf::new(),
            output_file: PathBuf::from("-"),
            log_file: None,
            config_file: None,
            threads: -1,
            top_n: DEFAULT_TOP_N,
            json: false,
            no_precursor_filter: false,
            print_config: false,
            search: SearchArgs::default(),
        }
    }
}

/// Library entries with a precursor m/z, ordered by it, and those without
struct LibraryIndex<'a> {
    by_precursor: Vec<(f64, &'a SpectrumRecord)>,
    all: &'a [SpectrumRecord],
}

impl<'a> LibraryIndex<'a> {
    fn new(library: &'a [SpectrumRecord]) -> Self {
        let by_precursor = library
            .iter()
            .filter_map(|rec| rec.precursor_mz.map(|mz| (mz, rec)))
            .sorted_by(|a, b| a.0.total_cmp(&b.0))
            .collect();
        Self {
            by_precursor,
            all: library,
        }
    }

    /// The entries whose precursor m/z lies within the mass scaled `tolerance` of `mz`
    fn candidates(&self, mz: f64, tolerance: f64) -> impl Iterator<Item = &'a SpectrumRecord> + '_ {
        let width = mass_scaled_tolerance(mz, tolerance);
        let start = self.by_precursor.partition_point(|(p, _)| *p < mz - width);
        let end = self.by_precursor.partition_point(|(p, _)| *p <= mz + width);
        self.by_precursor[start..end].iter().map(|(_, rec)| *rec)
    }
}

impl MSMatcher {
    /// Layer the search parameters from defaults, `msmatcher.toml`, the `--config-file`,
    /// `MSMATCHER_` environment variables, and finally command line arguments.
    pub fn search_parameters(&self) -> Result<SearchParameters, MSMatcherError> {
        let mut config = Figment::from(Serialized::defaults(SearchParameters::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE));
        if let Some(path) = self.config_file.as_ref() {
            config = config.merge(Toml::file_exact(path));
        }
        config = config
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::globals(&self.search));
        let params: SearchParameters = config.extract()?;
        debug!("Search parameters: {params:?}");
        Ok(SearchParametersBuilder::from(params).build()?)
    }

    fn create_threadpool(&self) -> Result<rayon::ThreadPool, MSMatcherError> {
        let num_threads = if self.threads > 0 {
            self.threads as usize
        } else {
            thread::available_parallelism()?.into()
        };
        debug!("Using {} cores", num_threads);
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?)
    }

    pub fn main(&self) -> Result<(), MSMatcherError> {
        let params = self.search_parameters()?;
        if self.print_config {
            print!("{}", toml::to_string_pretty(&params)?);
            return Ok(());
        }
        info!(
            "msmatcher v{}",
            option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
        );
        info!("Query: {}", self.query_file.display());
        info!("Library: {}", self.library_file.display());
        info!("Output: {}", self.output_file.display());
        info!("Target: {}", params.target_omics);
        self.create_threadpool()?.install(|| self.run(params))
    }

    fn run(&self, params: SearchParameters) -> Result<(), MSMatcherError> {
        let start = Instant::now();
        let queries = read_spectra(&self.query_file, SpectrumSelection::TandemWithPrecursor)?;
        let library = read_spectra(&self.library_file, SpectrumSelection::All)?;
        info!("Query Spectra: {}", queries.len());
        info!("Library Spectra: {}", library.len());
        if queries.is_empty() {
            warn!("No MSn spectra with a precursor were found in the query file");
        }
        let read_done = Instant::now();

        let matcher = SpectrumMatcher::new(params);
        let index = LibraryIndex::new(&library);
        let hits: Vec<Vec<Hit>> = queries
            .par_iter()
            .map(|query| self.search_query(&matcher, query, &index))
            .collect();

        let searched = Instant::now();
        let n_queries_with_hits = hits.iter().filter(|h| !h.is_empty()).count();
        let n_spectrum_matches = hits
            .iter()
            .filter_map(|h| h.first())
            .filter(|h| h.scores.is_spectrum_match)
            .count();
        info!("Queries With Candidates: {n_queries_with_hits}");
        info!("Spectrum Matches: {n_spectrum_matches}");

        let format = if self.json {
            HitFormat::JsonLines
        } else {
            HitFormat::Tsv
        };
        let n_written = write_hits(&self.output_file, hits.iter().flatten(), format)?;
        info!("Hits Written: {n_written}");

        let done = Instant::now();
        debug!("Reading Time: {:0.3?}", read_done - start);
        debug!("Search Time: {:0.3?}", searched - read_done);
        info!("Total Elapsed Time: {:0.3?}", done - start);
        Ok(())
    }

    fn search_query(
        &self,
        matcher: &SpectrumMatcher,
        query: &SpectrumRecord,
        index: &LibraryIndex<'_>,
    ) -> Vec<Hit> {
        let query_props = query.as_scan_properties();
        let candidates = match (self.no_precursor_filter, query.precursor_mz) {
            (false, Some(mz)) => Either::Left(index.candidates(mz, matcher.params().ms1_tolerance)),
            _ => Either::Right(index.all.iter()),
        };

        let hits: Vec<Hit> = candidates
            .map(|entry| {
                let entry_props = entry.as_scan_properties();
                let scores = matcher.compare(&query_props, &entry_props);
                let modified_cosine = matcher.modified_cosine(&query_props, &entry_props);
                Hit {
                    query_id: query.id.clone(),
                    query_index: query.index,
                    query_precursor_mz: query.precursor_mz,
                    rank: 0,
                    library_id: entry.id.clone(),
                    library_index: entry.index,
                    library_precursor_mz: entry.precursor_mz,
                    modified_cosine,
                    scores,
                }
            })
            .sorted_by(|a, b| {
                a.scores
                    .total_cmp_desc(&b.scores)
                    .then_with(|| a.library_index.cmp(&b.library_index))
            })
            .take(self.top_n)
            .enumerate()
            .map(|(i, mut hit)| {
                hit.rank = i + 1;
                hit
            })
            .collect();
        if let Some(best) = hits.first() {
            debug!(
                "{} best hit {} total={:0.3}",
                query.id, best.library_id, best.scores.total_score
            );
        }
        hits
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::CPeak;

    fn record(index: usize, precursor_mz: Option<f64>) -> SpectrumRecord {
        SpectrumRecord {
            id: format!("entry={index}"),
            index,
            ms_level: 2,
            precursor_mz,
            start_time: 0.0,
            peaks: Vec::<CPeak>::new(),
        }
    }

    #[test]
    fn test_candidates() {
        let library = vec![
            record(0, Some(300.0)),
            record(1, Some(180.0)),
            record(2, None),
            record(3, Some(180.005)),
            record(4, Some(180.5)),
        ];
        let index = LibraryIndex::new(&library);
        let found: Vec<_> = index.candidates(180.0, 0.01).map(|r| r.index).collect();
        assert_eq!(found, vec![1, 3]);
        assert_eq!(index.candidates(1000.0, 0.01).count(), 0);
        assert_eq!(index.all.len(), 5);
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let driver = MSMatcher::parse_from([
            "msmatcher",
            "query.mgf",
            "library.mgf",
            "-f",
            "0.05",
            "-m",
            "lipidomics",
        ]);
        let params = driver.search_parameters().unwrap();
        assert_eq!(params.ms2_tolerance, 0.05);
        assert_eq!(params.ms1_tolerance, SearchParameters::default().ms1_tolerance);
        assert_eq!(params.target_omics, msmatch::TargetOmics::Lipidomics);
        assert_eq!(driver.top_n, DEFAULT_TOP_N);
    }

    #[test]
    fn test_invalid_parameters() {
        let driver = MSMatcher::parse_from([
            "msmatcher",
            "query.mgf",
            "library.mgf",
            "--mass-range-begin",
            "900",
            "--mass-range-end",
            "100",
        ]);
        assert!(matches!(
            driver.search_parameters(),
            Err(MSMatcherError::ParameterError(
                ParameterError::InvalidMassRange { .. }
            ))
        ));
    }
}
