use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use msmatch::ScoreType;

use crate::driver::MSMatcherError;
use crate::types::Hit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitFormat {
    Tsv,
    JsonLines,
}

/// Where hits are written: STDOUT, a plain file, or a gzip compressed file
pub(crate) enum OutputSink {
    Stdout(io::BufWriter<io::Stdout>),
    File(io::BufWriter<fs::File>),
    Gzip(GzEncoder<io::BufWriter<fs::File>>),
}

impl OutputSink {
    pub(crate) fn open(path: &Path) -> io::Result<Self> {
        if path.as_os_str() == "-" {
            return Ok(Self::Stdout(io::BufWriter::new(io::stdout())));
        }
        let handle = io::BufWriter::new(fs::File::create(path)?);
        if path.extension().is_some_and(|ext| ext == "gz") {
            debug!("Compressing output to {}", path.display());
            Ok(Self::Gzip(GzEncoder::new(handle, Compression::best())))
        } else {
            Ok(Self::File(handle))
        }
    }

    /// Flush everything, writing the gzip trailer if there is one
    pub(crate) fn finish(self) -> io::Result<()> {
        match self {
            Self::Stdout(mut inner) => inner.flush(),
            Self::File(mut inner) => inner.flush(),
            Self::Gzip(inner) => inner.finish()?.flush(),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(inner) => inner.write(buf),
            Self::File(inner) => inner.write(buf),
            Self::Gzip(inner) => inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(inner) => inner.flush(),
            Self::File(inner) => inner.flush(),
            Self::Gzip(inner) => inner.flush(),
        }
    }
}

pub(crate) const TSV_COLUMNS: &[&str] = &[
    "query_id",
    "query_index",
    "query_precursor_mz",
    "rank",
    "library_id",
    "library_index",
    "library_precursor_mz",
    "total_score",
    "is_spectrum_match",
    "weighted_dot_product",
    "simple_dot_product",
    "reverse_dot_product",
    "matched_peaks_percentage",
    "matched_peaks_count",
    "library_peak_count",
    "accurate_mass_similarity",
    "is_precursor_mz_match",
    "rt_similarity",
    "modified_cosine",
    "andromeda_score",
];

fn fmt_optional_mz(value: Option<f64>) -> String {
    value.map(|v| format!("{v:0.5}")).unwrap_or_default()
}

fn fmt_score(value: ScoreType) -> String {
    format!("{value:0.5}")
}

pub(crate) fn write_tsv_row<W: Write>(writer: &mut W, hit: &Hit) -> io::Result<()> {
    let scores = &hit.scores;
    let fields = [
        hit.query_id.clone(),
        hit.query_index.to_string(),
        fmt_optional_mz(hit.query_precursor_mz),
        hit.rank.to_string(),
        hit.library_id.clone(),
        hit.library_index.to_string(),
        fmt_optional_mz(hit.library_precursor_mz),
        fmt_score(scores.total_score),
        scores.is_spectrum_match.to_string(),
        fmt_score(scores.weighted_dot_product),
        fmt_score(scores.simple_dot_product),
        fmt_score(scores.reverse_dot_product),
        fmt_score(scores.matched_peaks_percentage),
        scores.matched_peaks_count.to_string(),
        scores.library_peak_count.to_string(),
        fmt_score(scores.accurate_mass_similarity),
        scores.is_precursor_mz_match.to_string(),
        fmt_score(scores.rt_similarity),
        fmt_score(hit.modified_cosine),
        fmt_score(scores.andromeda_score),
    ];
    writeln!(writer, "{}", fields.join("\t"))
}

/// Write `hits` to `path` in `format`, returning the number of hits written
pub fn write_hits<'a, I: IntoIterator<Item = &'a Hit>>(
    path: &Path,
    hits: I,
    format: HitFormat,
) -> Result<usize, MSMatcherError> {
    let mut sink = OutputSink::open(path)?;
    let n = write_hits_to(&mut sink, hits, format)?;
    sink.finish()?;
    Ok(n)
}

pub(crate) fn write_hits_to<'a, W: Write, I: IntoIterator<Item = &'a Hit>>(
    writer: &mut W,
    hits: I,
    format: HitFormat,
) -> Result<usize, MSMatcherError> {
    let mut n = 0;
    match format {
        HitFormat::Tsv => {
            writeln!(writer, "{}", TSV_COLUMNS.join("\t"))?;
            for hit in hits {
                write_tsv_row(writer, hit)?;
                n += 1;
            }
        }
        HitFormat::JsonLines => {
            for hit in hits {
                serde_json::to_writer(&mut *writer, hit)?;
                writer.write_all(b"\n")?;
                n += 1;
            }
        }
    }
    Ok(n)
}

#[cfg(test)]
mod test {
    use super::*;
    use msmatch::MatchResult;

    fn hit() -> Hit {
        Hit {
            query_id: "index=3".into(),
            query_index: 3,
            query_precursor_mz: Some(181.0707),
            rank: 1,
            library_id: "glucose".into(),
            library_index: 0,
            library_precursor_mz: None,
            modified_cosine: 0.5,
            scores: MatchResult {
                total_score: 1.25,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_tsv() {
        let mut buf = Vec::new();
        let n = write_hits_to(&mut buf, [hit()].iter(), HitFormat::Tsv).unwrap();
        assert_eq!(n, 1);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('\t').count(), TSV_COLUMNS.len());
        let row: Vec<_> = lines[1].split('\t').collect();
        assert_eq!(row.len(), TSV_COLUMNS.len());
        assert_eq!(row[0], "index=3");
        assert_eq!(row[2], "181.07070");
        assert_eq!(row[6], "");
        assert_eq!(row[7], "1.25000");
        assert_eq!(row[9], "-1.00000");
    }

    #[test]
    fn test_json_lines() {
        let mut buf = Vec::new();
        write_hits_to(&mut buf, [hit(), hit()].iter(), HitFormat::JsonLines).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["library_id"], "glucose");
        assert_eq!(value["total_score"], 1.25);
        assert_eq!(value["library_precursor_mz"], serde_json::Value::Null);
    }
}
