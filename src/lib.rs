//! Radial-velocity measurement for 1-D stellar spectra.
//!
//! The pipeline cross-correlates an observed spectrum against a reference
//! template (solar, synthetic model, or telluric) over a grid of trial
//! velocities and refines the coarse maximum with a local Gaussian fit:
//!
//! ```text
//! observed ─┐
//!           ├─ window ─ normalize ─ cross-correlate ─ fit peak ─ RvResult
//! template ─┘
//! ```
//!
//! Entry points: [`measure::measure_rv`] for in-memory spectra,
//! [`data::loader::load_file`] + [`wcs::LinearWcs`] to get spectra out of
//! files with FITS-style dispersion keywords.

pub mod ccf;
pub mod data;
pub mod doppler;
pub mod error;
pub mod fit;
mod interp;
pub mod measure;
pub mod normalize;
pub mod wcs;

pub use ccf::{cross_correlate, CcfCurve, Polarity, VelocityGrid};
pub use data::loader::{load_file, SpectrumFile};
pub use data::model::{Header, HeaderValue, Spectrum};
pub use doppler::{shift_and_resample, shift_axis, EdgePolicy};
pub use error::{Error, Result};
pub use fit::{fit_ccf_peak, FitConfig, Gaussian, PeakFit};
pub use measure::{
    measure_against, measure_rv, shift_template, MeasureConfig, MeasurementStatus,
    ReferenceProvider, RvResult,
};
pub use normalize::{normalize_continuum, ContinuumConfig};
pub use wcs::{vac_to_air, LinearWcs, WavelengthUnit};

/// Speed of light in km/s, shared by the Doppler shifter and the
/// cross-correlator.
pub const SPEED_OF_LIGHT_KMS: f64 = 299_792.458;
