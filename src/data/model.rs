use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// HeaderValue – a single keyword value from a spectrum file header
// ---------------------------------------------------------------------------

/// A dynamically-typed header value mirroring the scalar types found in
/// FITS-style headers (CRVAL1, CDELT1, NAXIS1, OBJECT, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::String(s) => write!(f, "{s}"),
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Bool(b) => write!(f, "{b}"),
            HeaderValue::Null => write!(f, "<null>"),
        }
    }
}

impl HeaderValue {
    /// Interpret the value as an `f64` (dispersion keywords are numeric but
    /// files are inconsistent about int vs float).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(i) => Some(*i),
            HeaderValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }
}

/// Header keywords: keyword → scalar value.
pub type Header = BTreeMap<String, HeaderValue>;

// ---------------------------------------------------------------------------
// Spectrum – one wavelength-calibrated 1-D spectrum
// ---------------------------------------------------------------------------

/// A 1-D spectrum: wavelength axis and flux, same length, wavelength
/// strictly increasing. Immutable once built; every transform in this crate
/// returns a new `Spectrum`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelength: Vec<f64>,
    flux: Vec<f64>,
}

impl Spectrum {
    /// Build a spectrum, validating the interpolation preconditions:
    /// equal lengths and a strictly increasing wavelength axis.
    pub fn new(wavelength: Vec<f64>, flux: Vec<f64>) -> Result<Self> {
        if wavelength.len() != flux.len() {
            return Err(Error::Configuration(format!(
                "wavelength has {} points but flux has {}",
                wavelength.len(),
                flux.len()
            )));
        }
        if wavelength.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Configuration(
                "wavelength axis is not strictly increasing".into(),
            ));
        }
        Ok(Spectrum { wavelength, flux })
    }

    /// An empty spectrum (valid, zero points).
    pub fn empty() -> Self {
        Spectrum {
            wavelength: Vec::new(),
            flux: Vec::new(),
        }
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// New spectrum with the same axis and the given flux.
    pub fn with_flux(&self, flux: Vec<f64>) -> Result<Self> {
        Spectrum::new(self.wavelength.clone(), flux)
    }

    /// Restrict to wavelengths in the open interval (lo, hi).
    pub fn window(&self, lo: f64, hi: f64) -> Self {
        let pairs: Vec<(f64, f64)> = self
            .wavelength
            .iter()
            .zip(&self.flux)
            .filter(|(w, _)| **w > lo && **w < hi)
            .map(|(w, f)| (*w, *f))
            .collect();
        Spectrum {
            wavelength: pairs.iter().map(|(w, _)| *w).collect(),
            flux: pairs.iter().map(|(_, f)| *f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(Spectrum::new(vec![1.0, 2.0], vec![1.0]).is_err());
    }

    #[test]
    fn rejects_non_monotonic_axis() {
        assert!(Spectrum::new(vec![1.0, 3.0, 2.0], vec![1.0, 1.0, 1.0]).is_err());
        assert!(Spectrum::new(vec![1.0, 1.0], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn window_is_exclusive() {
        let s = Spectrum::new(vec![1.0, 2.0, 3.0, 4.0], vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        let cut = s.window(1.0, 4.0);
        assert_eq!(cut.wavelength(), &[2.0, 3.0]);
        assert_eq!(cut.flux(), &[20.0, 30.0]);
    }

    #[test]
    fn header_value_coercions() {
        assert_eq!(HeaderValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(HeaderValue::Float(3.0).as_i64(), Some(3));
        assert_eq!(HeaderValue::Float(3.5).as_i64(), None);
        assert_eq!(HeaderValue::String("x".into()).as_f64(), None);
    }
}
