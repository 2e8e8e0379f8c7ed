use std::fs;
use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use msmatcher::{MSMatcher, MSMatcherError};

#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn make_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy()
}

/// Log to STDERR, and to `log_file` too if one is given. The returned guard must be
/// held until logging is finished.
fn configure_log(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, MSMatcherError> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(fs::File::create(path)?);
            let layer = fmt::layer()
                .compact()
                .with_ansi(false)
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_writer(writer)
                .with_filter(make_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_writer(io::stderr)
                .with_filter(make_filter()),
        )
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| MSMatcherError::LoggingError(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| MSMatcherError::LoggingError(e.to_string()))?;
    Ok(guard)
}

fn main() -> ExitCode {
    let args = MSMatcher::parse();
    let guard = match configure_log(args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let status = match args.main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    };
    drop(guard);
    status
}
