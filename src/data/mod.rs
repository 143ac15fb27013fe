/// Data layer: spectrum types and file loading.
///
/// Architecture:
/// ```text
///  .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SpectrumFile (flux + header)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ LinearWcs │  CRVAL1/CDELT1/NAXIS1 → wavelength axis (when needed)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Spectrum  │  validated (wavelength, flux) pair
///   └──────────┘
/// ```
pub mod loader;
pub mod model;
