//! Linear wavelength calibration: reconstruct the wavelength axis from the
//! CRVAL1/CDELT1/NAXIS1 dispersion keywords, plus the vacuum→air correction
//! applied to synthetic model spectra.

use crate::data::model::Header;
use crate::error::{Error, Result};

/// Unit of the dispersion keywords. `Nanometre` scales the reconstructed
/// axis by 10 so the rest of the pipeline works in Ångström.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavelengthUnit {
    #[default]
    Angstrom,
    Nanometre,
}

/// Linear world-coordinate system: wavelength[i] = crval1 + i · cdelt1.
/// Derived once from header data, immutable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearWcs {
    crval1: f64,
    cdelt1: f64,
    naxis1: usize,
}

impl LinearWcs {
    pub fn new(crval1: f64, cdelt1: f64, naxis1: i64) -> Result<Self> {
        if naxis1 <= 0 {
            return Err(Error::Configuration(format!(
                "NAXIS1 must be positive, got {naxis1}"
            )));
        }
        if cdelt1 == 0.0 || !cdelt1.is_finite() {
            return Err(Error::Configuration(format!(
                "CDELT1 must be finite and non-zero, got {cdelt1}"
            )));
        }
        Ok(LinearWcs {
            crval1,
            cdelt1,
            naxis1: naxis1 as usize,
        })
    }

    /// Pull CRVAL1, CDELT1 and NAXIS1 out of a file header.
    pub fn from_header(header: &Header) -> Result<Self> {
        let keyword = |name: &str| {
            header
                .get(name)
                .ok_or_else(|| Error::Configuration(format!("header is missing {name}")))
        };
        let crval1 = keyword("CRVAL1")?
            .as_f64()
            .ok_or_else(|| Error::Configuration("CRVAL1 is not numeric".into()))?;
        let cdelt1 = keyword("CDELT1")?
            .as_f64()
            .ok_or_else(|| Error::Configuration("CDELT1 is not numeric".into()))?;
        let naxis1 = keyword("NAXIS1")?
            .as_i64()
            .ok_or_else(|| Error::Configuration("NAXIS1 is not an integer".into()))?;
        LinearWcs::new(crval1, cdelt1, naxis1)
    }

    pub fn naxis1(&self) -> usize {
        self.naxis1
    }

    /// Materialize the equidistant wavelength axis.
    pub fn wavelength_axis(&self, unit: WavelengthUnit) -> Vec<f64> {
        let scale = match unit {
            WavelengthUnit::Angstrom => 1.0,
            WavelengthUnit::Nanometre => 10.0,
        };
        (0..self.naxis1)
            .map(|i| (self.crval1 + i as f64 * self.cdelt1) * scale)
            .collect()
    }
}

/// Edlén 1953 refractive index of air at the given vacuum wavelength (Å).
fn refractive_index(wavelength: f64, density: f64) -> f64 {
    let s2 = (1e4 / wavelength).powi(2);
    let n = 1.0 + 6.4328e-5 + 2.94981e-2 / (146.0 - s2) + 2.554e-4 / (41.0 - s2);
    density * n
}

/// Convert vacuum wavelengths to air wavelengths. Synthetic model spectra
/// are tabulated in vacuum; ground-based observations are in air.
pub fn vac_to_air(wavelength: &[f64]) -> Vec<f64> {
    wavelength
        .iter()
        .map(|&w| w / refractive_index(w, 1.0))
        .collect()
}
