mod args;
mod driver;
mod read;
mod types;
mod write;

pub use args::*;
pub use driver::{MSMatcher, MSMatcherError};
pub use read::{read_spectra, SpectrumSelection};
pub use types::{Hit, SpectrumRecord};
pub use write::{write_hits, HitFormat};
