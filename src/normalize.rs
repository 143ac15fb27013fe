//! Continuum pseudo-normalization: bring the continuum of a raw spectrum to
//! 1.0 using the brightest points below a spike-rejection ceiling.

use crate::error::{Error, Result};

/// Tunables for the pseudo-continuum estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuumConfig {
    /// Flux values at or above this (after the first median division) are
    /// treated as cosmic-ray or emission spikes and excluded.
    pub ceiling: f64,
    /// How many of the largest sub-ceiling values form the continuum sample.
    pub window: usize,
}

impl Default for ContinuumConfig {
    fn default() -> Self {
        ContinuumConfig {
            ceiling: 1.2,
            window: 50,
        }
    }
}

/// Median of a sample. Not defined for empty input; callers guard.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Normalize flux so the pseudo-continuum sits at 1.0.
///
/// Steps: divide by the median (or the maximum when the median is 0), then
/// divide by the median of the `window` largest values below `ceiling`, then
/// clip negative flux to 0. Fails with [`Error::Normalization`] when nothing
/// falls below the ceiling.
pub fn normalize_continuum(flux: &[f64], config: &ContinuumConfig) -> Result<Vec<f64>> {
    if flux.is_empty() {
        return Err(Error::Normalization("empty flux array".into()));
    }

    let med = median(flux);
    let scale = if med != 0.0 {
        med
    } else {
        flux.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    };
    if scale == 0.0 || !scale.is_finite() {
        return Err(Error::Normalization(
            "flux has no usable scale (all zero or non-finite)".into(),
        ));
    }
    let mut out: Vec<f64> = flux.iter().map(|f| f / scale).collect();

    // Continuum sample: the `window` largest values below the ceiling.
    let mut below: Vec<f64> = out.iter().cloned().filter(|f| *f < config.ceiling).collect();
    if below.is_empty() {
        return Err(Error::Normalization(format!(
            "no flux below {} to estimate a pseudo-continuum",
            config.ceiling
        )));
    }
    below.sort_by(|a, b| b.total_cmp(a));
    below.truncate(config.window);

    let continuum = median(&below);
    if continuum == 0.0 {
        return Err(Error::Normalization(
            "pseudo-continuum sample has zero median".into(),
        ));
    }

    for f in &mut out {
        *f /= continuum;
        if *f < 0.0 {
            *f = 0.0;
        }
    }
    Ok(out)
}
