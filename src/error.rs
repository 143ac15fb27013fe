use thiserror::Error;

/// Errors for malformed inputs and parameters. Degenerate measurement
/// outcomes (flat CCF, empty overlap, failed fit) are reported through
/// [`crate::measure::MeasurementStatus`] and never through this enum.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid static parameters: bad dispersion header, inverted or empty
    /// velocity grid, mismatched or non-monotonic spectrum arrays.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No usable pseudo-continuum window in the flux data.
    #[error("normalization error: {0}")]
    Normalization(String),

    /// Malformed spectrum file.
    #[error("load error: {0}")]
    Load(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
