//! Non-relativistic Doppler shift of a spectrum.

use crate::data::model::Spectrum;
use crate::error::Result;
use crate::interp::interpolate;
use crate::SPEED_OF_LIGHT_KMS;

/// How to fill flux at original-grid points the shifted axis no longer
/// covers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EdgePolicy {
    /// Replicate the nearest in-range flux value.
    #[default]
    Replicate,
    /// Use a caller-supplied constant.
    Fill(f64),
}

/// Scale a wavelength axis by (1 + v/c). Flux is untouched; this is the
/// cheap mode used to march a template across the velocity grid.
pub fn shift_axis(wavelength: &[f64], velocity_kms: f64) -> Vec<f64> {
    let factor = 1.0 + velocity_kms / SPEED_OF_LIGHT_KMS;
    wavelength.iter().map(|w| w * factor).collect()
}

/// Doppler-shift a spectrum and re-evaluate the flux at the ORIGINAL
/// wavelength points, so the result represents the shifted spectrum at the
/// original sampling.
///
/// Points outside the shifted axis's coverage take the [`EdgePolicy`] value.
/// Zero overlap is not an error: RV shifts are small relative to spectral
/// width, and an all-fill result is the honest answer when they are not.
pub fn shift_and_resample(spectrum: &Spectrum, velocity_kms: f64, edge: EdgePolicy) -> Result<Spectrum> {
    let shifted = shift_axis(spectrum.wavelength(), velocity_kms);
    let flux = spectrum.flux();

    let lo_fill = match edge {
        EdgePolicy::Replicate => flux.first().copied().unwrap_or(0.0),
        EdgePolicy::Fill(v) => v,
    };
    let hi_fill = match edge {
        EdgePolicy::Replicate => flux.last().copied().unwrap_or(0.0),
        EdgePolicy::Fill(v) => v,
    };

    let resampled: Vec<f64> = spectrum
        .wavelength()
        .iter()
        .map(|&w| match interpolate(&shifted, flux, w) {
            Some(f) => f,
            None if shifted.first().is_some_and(|&s| w < s) => lo_fill,
            None => hi_fill,
        })
        .collect();

    spectrum.with_flux(resampled)
}
