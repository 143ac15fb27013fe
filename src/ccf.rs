//! Cross-correlation of an observed spectrum against a template over a grid
//! of trial radial velocities.

use log::debug;
use serde::Serialize;

use crate::data::model::Spectrum;
use crate::doppler::shift_axis;
use crate::error::{Error, Result};
use crate::interp::{covers, interpolate};

// ---------------------------------------------------------------------------
// VelocityGrid
// ---------------------------------------------------------------------------

/// Half-open grid of trial velocities [rvmin, rvmax) with spacing `step`,
/// all in km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityGrid {
    rvmin: f64,
    rvmax: f64,
    step: f64,
}

impl VelocityGrid {
    pub fn new(rvmin: f64, rvmax: f64, step: f64) -> Result<Self> {
        if rvmax <= rvmin {
            return Err(Error::Configuration(format!(
                "rvmax ({rvmax}) must exceed rvmin ({rvmin})"
            )));
        }
        if step <= 0.0 || !step.is_finite() {
            return Err(Error::Configuration(format!(
                "velocity step must be positive, got {step}"
            )));
        }
        Ok(VelocityGrid { rvmin, rvmax, step })
    }

    /// The trial velocities, half-open: rvmin, rvmin+step, ... < rvmax.
    pub fn values(&self) -> Vec<f64> {
        let n = ((self.rvmax - self.rvmin) / self.step).ceil() as usize;
        (0..n)
            .map(|i| self.rvmin + i as f64 * self.step)
            .filter(|v| *v < self.rvmax)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CCF curve
// ---------------------------------------------------------------------------

/// A correlation curve: score per trial velocity. Ephemeral, produced and
/// consumed within one measurement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CcfCurve {
    pub velocities: Vec<f64>,
    pub scores: Vec<f64>,
}

impl CcfCurve {
    pub fn is_empty(&self) -> bool {
        self.velocities.is_empty()
    }
}

/// Orientation of spectral lines in the input flux.
///
/// Correlation maxima mark alignment only when lines point up, so absorption
/// spectra must be negated. `AbsorptionDips` has the engine apply 1 − flux
/// itself; `PeaksUp` trusts the caller to have done it already.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    AbsorptionDips,
    PeaksUp,
}

fn oriented_flux(spectrum: &Spectrum, polarity: Polarity) -> Vec<f64> {
    match polarity {
        Polarity::AbsorptionDips => spectrum.flux().iter().map(|f| 1.0 - f).collect(),
        Polarity::PeaksUp => spectrum.flux().to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Cross-correlator
// ---------------------------------------------------------------------------

/// Cross-correlate `observed` against `template` over `grid`.
///
/// The template axis is the one shifted (cheaper, and the noisy observed
/// data is never resampled). Per trial velocity the score is the sum of
/// elementwise products of observed flux and template flux interpolated at
/// the observed wavelengths inside the shifted coverage; no overlap scores 0.
///
/// Degenerate inputs (either side empty, an all-zero curve, or a flat curve)
/// produce an empty [`CcfCurve`] rather than an error. Otherwise exact-zero
/// scores are interpolation-failure markers, not genuine low correlation:
/// they are replaced with the curve mean before min-max normalizing to
/// [0, 1], which keeps them from corrupting the normalization.
pub fn cross_correlate(
    observed: &Spectrum,
    template: &Spectrum,
    grid: &VelocityGrid,
    polarity: Polarity,
) -> CcfCurve {
    if observed.is_empty() || template.is_empty() {
        debug!("ccf: empty input, no measurement possible");
        return CcfCurve::default();
    }

    let w = observed.wavelength();
    let f = oriented_flux(observed, polarity);
    let tf = oriented_flux(template, polarity);

    let velocities = grid.values();
    let mut scores = Vec::with_capacity(velocities.len());

    for &rv in &velocities {
        let tw = shift_axis(template.wavelength(), rv);
        let mut score = 0.0;
        let mut overlap = 0usize;
        for (i, &wi) in w.iter().enumerate() {
            if !covers(&tw, wi) {
                continue;
            }
            if let Some(ti) = interpolate(&tw, &tf, wi) {
                score += f[i] * ti;
                overlap += 1;
            }
        }
        if overlap == 0 {
            score = 0.0;
        }
        scores.push(score);
    }

    if scores.iter().all(|&s| s == 0.0) {
        debug!("ccf: curve is uniformly zero, no measurement possible");
        return CcfCurve::default();
    }

    // Zeros mark velocities where the shifted template missed the observed
    // axis entirely; park them at the mean so min-max scaling is untouched.
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    for s in &mut scores {
        if *s == 0.0 {
            *s = mean;
        }
    }

    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        debug!("ccf: curve is flat after zero replacement");
        return CcfCurve::default();
    }
    for s in &mut scores {
        *s = (*s - min) / (max - min);
    }

    CcfCurve { velocities, scores }
}
