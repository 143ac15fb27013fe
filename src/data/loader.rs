use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;

use super::model::{Header, HeaderValue, Spectrum};
use crate::measure::ReferenceProvider;
use crate::wcs::{LinearWcs, WavelengthUnit};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Raw contents of a spectrum file: flux, an optional explicit wavelength
/// axis, and the header keywords. When the axis is absent it is
/// reconstructed from the CRVAL1/CDELT1/NAXIS1 keywords.
#[derive(Debug, Clone)]
pub struct SpectrumFile {
    pub flux: Vec<f64>,
    pub wavelength: Option<Vec<f64>>,
    pub header: Header,
}

impl SpectrumFile {
    /// Turn the file contents into a validated [`Spectrum`], building the
    /// wavelength axis from the header when none was stored explicitly.
    pub fn into_spectrum(self, unit: WavelengthUnit) -> crate::error::Result<Spectrum> {
        let wavelength = match self.wavelength {
            Some(w) => w,
            None => {
                let wcs = LinearWcs::from_header(&self.header)?;
                wcs.wavelength_axis(unit)
            }
        };
        Spectrum::new(wavelength, self.flux)
    }
}

/// Load a spectrum from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.json` – `{ "flux": [...], "header": {...}, "wavelength": [...]? }`
/// * `.csv`  – header row `wavelength,flux`, one sample per row
pub fn load_file(path: &Path) -> Result<SpectrumFile> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// {
///   "flux": [1020.0, 1019.2, ...],
///   "wavelength": [5000.0, 5000.05, ...],
///   "header": { "CRVAL1": 5000.0, "CDELT1": 0.05, "NAXIS1": 4000 }
/// }
/// ```
///
/// `wavelength` and `header` are each optional, but one of the two must
/// supply an axis for [`SpectrumFile::into_spectrum`] to succeed.
fn load_json(path: &Path) -> Result<SpectrumFile> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let obj = root.as_object().context("Expected top-level JSON object")?;

    let flux = json_array_to_f64(obj.get("flux"), "flux")?;
    let wavelength = match obj.get("wavelength") {
        Some(_) => Some(json_array_to_f64(obj.get("wavelength"), "wavelength")?),
        None => None,
    };

    let mut header = Header::new();
    if let Some(h) = obj.get("header") {
        let h = h.as_object().context("'header' is not a JSON object")?;
        for (key, val) in h {
            header.insert(key.clone(), json_to_header(val));
        }
    }

    Ok(SpectrumFile {
        flux,
        wavelength,
        header,
    })
}

fn json_array_to_f64(val: Option<&JsonValue>, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("{col}[{j}]: not a number"))
        })
        .collect()
}

fn json_to_header(val: &JsonValue) -> HeaderValue {
    match val {
        JsonValue::String(s) => HeaderValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                HeaderValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                HeaderValue::Float(f)
            } else {
                HeaderValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => HeaderValue::Bool(*b),
        JsonValue::Null => HeaderValue::Null,
        other => HeaderValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with `wavelength` and `flux` columns, one sample
/// per row. The axis is explicit, so no dispersion keywords are needed.
fn load_csv(path: &Path) -> Result<SpectrumFile> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let w_idx = headers
        .iter()
        .position(|h| h == "wavelength")
        .context("CSV missing 'wavelength' column")?;
    let f_idx = headers
        .iter()
        .position(|h| h == "flux")
        .context("CSV missing 'flux' column")?;

    let mut wavelength = Vec::new();
    let mut flux = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        wavelength.push(parse_float(record.get(w_idx).unwrap_or(""), row_no, "wavelength")?);
        flux.push(parse_float(record.get(f_idx).unwrap_or(""), row_no, "flux")?);
    }

    Ok(SpectrumFile {
        flux,
        wavelength: Some(wavelength),
        header: Header::new(),
    })
}

fn parse_float(s: &str, row: usize, col: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{s}' is not a number"))
}

// ---------------------------------------------------------------------------
// Directory-backed reference provider
// ---------------------------------------------------------------------------

/// Resolves reference ids ("sun", "telluric_NIR", ...) to spectrum files in
/// a directory, trying the supported extensions in order. The directory is
/// whatever the caller points at; nothing is downloaded or cached.
pub struct DirectoryProvider {
    dir: PathBuf,
    unit: WavelengthUnit,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>, unit: WavelengthUnit) -> Self {
        DirectoryProvider {
            dir: dir.into(),
            unit,
        }
    }
}

impl ReferenceProvider for DirectoryProvider {
    fn fetch(&self, id: &str) -> Result<Spectrum> {
        for ext in ["json", "csv"] {
            let candidate = self.dir.join(format!("{id}.{ext}"));
            if candidate.is_file() {
                let spectrum = load_file(&candidate)?.into_spectrum(self.unit)?;
                return Ok(spectrum);
            }
        }
        bail!(
            "no reference spectrum '{id}' (.json or .csv) in {}",
            self.dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn json_with_header_axis() {
        let path = write_temp(
            "rusty_rv_loader_header.json",
            r#"{"flux": [1.0, 2.0, 3.0],
                "header": {"CRVAL1": 5000.0, "CDELT1": 0.5, "NAXIS1": 3,
                           "OBJECT": "HD 1234"}}"#,
        );
        let file = load_file(&path).unwrap();
        assert_eq!(file.flux, vec![1.0, 2.0, 3.0]);
        assert_eq!(
            file.header.get("OBJECT"),
            Some(&HeaderValue::String("HD 1234".into()))
        );
        let spectrum = file.into_spectrum(WavelengthUnit::Angstrom).unwrap();
        assert_eq!(spectrum.wavelength(), &[5000.0, 5000.5, 5001.0]);
    }

    #[test]
    fn json_with_explicit_axis() {
        let path = write_temp(
            "rusty_rv_loader_axis.json",
            r#"{"flux": [1.0, 2.0], "wavelength": [6000.0, 6001.0]}"#,
        );
        let spectrum = load_file(&path)
            .unwrap()
            .into_spectrum(WavelengthUnit::Angstrom)
            .unwrap();
        assert_eq!(spectrum.wavelength(), &[6000.0, 6001.0]);
    }

    #[test]
    fn json_without_any_axis_fails_late() {
        let path = write_temp("rusty_rv_loader_noaxis.json", r#"{"flux": [1.0, 2.0]}"#);
        let file = load_file(&path).unwrap();
        assert!(file.into_spectrum(WavelengthUnit::Angstrom).is_err());
    }

    #[test]
    fn csv_round_trip() {
        let path = write_temp(
            "rusty_rv_loader.csv",
            "wavelength,flux\n5000.0,1.0\n5000.5,0.8\n5001.0,1.1\n",
        );
        let spectrum = load_file(&path)
            .unwrap()
            .into_spectrum(WavelengthUnit::Angstrom)
            .unwrap();
        assert_eq!(spectrum.len(), 3);
        assert_eq!(spectrum.flux()[1], 0.8);
    }

    #[test]
    fn unsupported_extension() {
        assert!(load_file(Path::new("spectrum.fits")).is_err());
    }
}
