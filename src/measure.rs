//! The RV measurement pipeline: window the template, normalize both
//! spectra, cross-correlate, fit the peak.

use log::{debug, info};
use serde::Serialize;

use crate::ccf::{cross_correlate, CcfCurve, Polarity, VelocityGrid};
use crate::data::model::Spectrum;
use crate::doppler::shift_axis;
use crate::error::Result;
use crate::fit::{fit_ccf_peak, FitConfig};
use crate::normalize::{normalize_continuum, ContinuumConfig};

// ---------------------------------------------------------------------------
// Configuration and result types
// ---------------------------------------------------------------------------

/// All tunables for one measurement, every hardcoded constant of the
/// measurement recipe made explicit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureConfig {
    pub grid: VelocityGrid,
    /// Extra wavelength coverage (same units as the axes) kept on each side
    /// when windowing the template, to tolerate the shift being measured.
    pub window_pad: f64,
    pub continuum: ContinuumConfig,
    pub fit: FitConfig,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        MeasureConfig {
            grid: VelocityGrid::new(0.0, 150.0, 1.0).expect("default grid is valid"),
            window_pad: 10.0,
            continuum: ContinuumConfig::default(),
            fit: FitConfig::default(),
        }
    }
}

/// Terminal state of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasurementStatus {
    /// A CCF peak was located (the fit itself may still have fallen back to
    /// the coarse maximum; see `fit_succeeded`).
    Done,
    /// Empty overlap or flat CCF: no peak to measure. Not an error.
    NoMeasurement,
    /// The template has no samples in the padded observed range. Distinct
    /// from a genuine zero-velocity measurement.
    TemplateUnusable,
}

/// One RV measurement: the estimate, the curves behind it, and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RvResult {
    /// Radial velocity in km/s; 0 for NoMeasurement / TemplateUnusable.
    pub rv: f64,
    /// The normalized CCF curve (empty unless status is Done).
    pub ccf: CcfCurve,
    /// The fitted Gaussian sampled on the velocity grid, for display.
    pub fitted: CcfCurve,
    /// Whether the Gaussian fit converged (false means the coarse-grid
    /// maximum was reported).
    pub fit_succeeded: bool,
    pub status: MeasurementStatus,
}

impl RvResult {
    fn degenerate(status: MeasurementStatus) -> Self {
        RvResult {
            rv: 0.0,
            ccf: CcfCurve::default(),
            fitted: CcfCurve::default(),
            fit_succeeded: false,
            status,
        }
    }
}

// ---------------------------------------------------------------------------
// Reference-spectrum provider
// ---------------------------------------------------------------------------

/// Source of reference spectra (solar, model, telluric), injected into the
/// pipeline instead of a process-wide download cache. Implementations decide
/// what an id means: a file stem, a catalog key, a URL.
pub trait ReferenceProvider {
    fn fetch(&self, id: &str) -> anyhow::Result<Spectrum>;
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Measure the radial velocity of `observed` against `template`.
///
/// Both spectra are taken raw (absorption dips down); continuum
/// normalization and the 1 − flux orientation happen inside. Degenerate
/// conditions come back as a status, never an error; only malformed data
/// (unusable continuum) errors out.
pub fn measure_rv(
    observed: &Spectrum,
    template: &Spectrum,
    config: &MeasureConfig,
) -> Result<RvResult> {
    // Windowing: restrict the template to the observed range plus padding.
    let (Some(&w0), Some(&w1)) = (
        observed.wavelength().first(),
        observed.wavelength().last(),
    ) else {
        debug!("measure: observed spectrum is empty");
        return Ok(RvResult::degenerate(MeasurementStatus::NoMeasurement));
    };
    let windowed = template.window(w0 - config.window_pad, w1 + config.window_pad);
    if windowed.is_empty() {
        debug!(
            "measure: template has no coverage in [{:.2}, {:.2}]",
            w0 - config.window_pad,
            w1 + config.window_pad
        );
        return Ok(RvResult::degenerate(MeasurementStatus::TemplateUnusable));
    }

    // Normalizing.
    let obs = observed.with_flux(normalize_continuum(observed.flux(), &config.continuum)?)?;
    let tpl = windowed.with_flux(normalize_continuum(windowed.flux(), &config.continuum)?)?;

    // Correlating.
    let ccf = cross_correlate(&obs, &tpl, &config.grid, Polarity::AbsorptionDips);
    if ccf.is_empty() {
        return Ok(RvResult::degenerate(MeasurementStatus::NoMeasurement));
    }

    // Fitting.
    let peak = fit_ccf_peak(&ccf, &config.fit);
    let fitted = CcfCurve {
        velocities: ccf.velocities.clone(),
        scores: peak.model.evaluate_all(&ccf.velocities),
    };
    info!(
        "measure: rv = {:.2} km/s (fit {})",
        peak.rv,
        if peak.converged { "converged" } else { "fell back to grid maximum" }
    );

    Ok(RvResult {
        rv: peak.rv,
        ccf,
        fitted,
        fit_succeeded: peak.converged,
        status: MeasurementStatus::Done,
    })
}

/// Fetch a template by id from a [`ReferenceProvider`] and measure against
/// it. Provider failures surface as-is; they are infrastructure errors, not
/// measurement outcomes.
pub fn measure_against(
    observed: &Spectrum,
    provider: &dyn ReferenceProvider,
    template_id: &str,
    config: &MeasureConfig,
) -> anyhow::Result<RvResult> {
    let template = provider.fetch(template_id)?;
    Ok(measure_rv(observed, &template, config)?)
}

/// Doppler-shift a template's axis by a measured RV for diagnostic overlay
/// against the observed spectrum. Display-only; feeding the result back into
/// [`measure_rv`] would just re-measure ~0.
pub fn shift_template(template: &Spectrum, rv_kms: f64) -> Result<Spectrum> {
    Spectrum::new(shift_axis(template.wavelength(), rv_kms), template.flux().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Continuum at 1.0 (in raw counts, 1000) with several absorption lines.
    fn raw_spectrum(axis_shift_kms: f64) -> Spectrum {
        let w: Vec<f64> = (0..6000).map(|i| 5000.0 + i as f64 * 0.05).collect();
        let lines = [5050.0, 5120.0, 5133.0, 5200.0, 5261.0];
        let factor = 1.0 + axis_shift_kms / crate::SPEED_OF_LIGHT_KMS;
        let f: Vec<f64> = w
            .iter()
            .map(|&x| {
                let absorbed: f64 = lines
                    .iter()
                    .map(|&c| {
                        let c = c * factor;
                        0.55 * (-(x - c).powi(2) / (2.0 * 0.15_f64.powi(2))).exp()
                    })
                    .sum();
                1000.0 * (1.0 - absorbed.min(0.95))
            })
            .collect();
        Spectrum::new(w, f).unwrap()
    }

    #[test]
    fn recovers_known_shift() {
        let template = raw_spectrum(0.0);
        let observed = raw_spectrum(30.0);
        let result = measure_rv(&observed, &template, &MeasureConfig::default()).unwrap();
        assert_eq!(result.status, MeasurementStatus::Done);
        assert!(result.fit_succeeded);
        assert!((result.rv - 30.0).abs() < 1.0, "rv = {}", result.rv);
        assert_eq!(result.ccf.velocities.len(), 150);
        assert_eq!(result.fitted.velocities.len(), 150);
    }

    #[test]
    fn zero_shift_measures_near_zero() {
        let template = raw_spectrum(0.0);
        let observed = raw_spectrum(0.0);
        let result = measure_rv(&observed, &template, &MeasureConfig::default()).unwrap();
        assert_eq!(result.status, MeasurementStatus::Done);
        // Peak at the grid edge: only the right half of the peak is in the
        // fit window, so allow a wider tolerance than the interior case.
        assert!(result.rv.abs() < 2.0, "rv = {}", result.rv);
    }

    #[test]
    fn disjoint_template_is_unusable() {
        let observed = raw_spectrum(0.0);
        let w: Vec<f64> = (0..100).map(|i| 9000.0 + i as f64 * 0.05).collect();
        let f = vec![1.0; 100];
        let template = Spectrum::new(w, f).unwrap();
        let result = measure_rv(&observed, &template, &MeasureConfig::default()).unwrap();
        assert_eq!(result.status, MeasurementStatus::TemplateUnusable);
        assert_eq!(result.rv, 0.0);
        assert!(result.ccf.is_empty());
    }

    #[test]
    fn empty_observed_is_no_measurement() {
        let template = raw_spectrum(0.0);
        let result =
            measure_rv(&Spectrum::empty(), &template, &MeasureConfig::default()).unwrap();
        assert_eq!(result.status, MeasurementStatus::NoMeasurement);
    }

    #[test]
    fn shift_template_moves_axis_only() {
        let template = raw_spectrum(0.0);
        let shifted = shift_template(&template, 30.0).unwrap();
        assert_eq!(shifted.flux(), template.flux());
        assert!(shifted.wavelength()[0] > template.wavelength()[0]);
    }

    #[test]
    fn provider_backed_measurement() {
        struct Fixed(Spectrum);
        impl ReferenceProvider for Fixed {
            fn fetch(&self, _id: &str) -> anyhow::Result<Spectrum> {
                Ok(self.0.clone())
            }
        }
        let observed = raw_spectrum(30.0);
        let provider = Fixed(raw_spectrum(0.0));
        let result =
            measure_against(&observed, &provider, "sun", &MeasureConfig::default()).unwrap();
        assert_eq!(result.status, MeasurementStatus::Done);
        assert!((result.rv - 30.0).abs() < 1.0);
    }
}
