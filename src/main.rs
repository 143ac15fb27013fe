use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rusty_rv::{
    load_file, measure_rv, vac_to_air, MeasureConfig, MeasurementStatus, Spectrum, VelocityGrid,
    WavelengthUnit,
};

#[derive(Parser)]
#[command(name = "rusty-rv")]
#[command(about = "Measure the radial velocity of a spectrum against a reference template")]
#[command(version)]
struct Cli {
    /// Observed spectrum (.json or .csv)
    observed: PathBuf,

    /// Reference template: solar, model, or telluric spectrum (.json or .csv)
    template: PathBuf,

    /// Lowest trial velocity in km/s
    #[arg(long, default_value = "0.0")]
    rvmin: f64,

    /// Highest trial velocity in km/s (exclusive)
    #[arg(long, default_value = "150.0")]
    rvmax: f64,

    /// Velocity step in km/s
    #[arg(long, default_value = "1.0")]
    step: f64,

    /// Dispersion keywords are in nm; convert the axis to Ångström
    #[arg(long)]
    convert: bool,

    /// Template wavelengths are vacuum values; correct them to air
    #[arg(long)]
    vacuum: bool,

    /// Emit the full result (rv, status, CCF and fitted curves) as JSON
    #[arg(long)]
    json: bool,
}

fn load_spectrum(path: &PathBuf, unit: WavelengthUnit) -> Result<Spectrum> {
    let spectrum = load_file(path)?
        .into_spectrum(unit)
        .with_context(|| format!("building wavelength axis for {}", path.display()))?;
    Ok(spectrum)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let unit = if cli.convert {
        WavelengthUnit::Nanometre
    } else {
        WavelengthUnit::Angstrom
    };

    let observed = load_spectrum(&cli.observed, unit)
        .with_context(|| format!("loading observed spectrum {}", cli.observed.display()))?;
    let mut template = load_spectrum(&cli.template, unit)
        .with_context(|| format!("loading template {}", cli.template.display()))?;

    if cli.vacuum {
        template = Spectrum::new(vac_to_air(template.wavelength()), template.flux().to_vec())?;
    }

    let config = MeasureConfig {
        grid: VelocityGrid::new(cli.rvmin, cli.rvmax, cli.step)?,
        ..MeasureConfig::default()
    };

    let result = measure_rv(&observed, &template, &config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    match result.status {
        MeasurementStatus::Done => {
            println!(
                "RV for {} is {:.2} km/s{}",
                cli.observed.display(),
                result.rv,
                if result.fit_succeeded {
                    ""
                } else {
                    " (grid maximum; Gaussian fit did not converge)"
                }
            );
        }
        MeasurementStatus::NoMeasurement => {
            println!(
                "No measurable correlation between {} and {}",
                cli.observed.display(),
                cli.template.display()
            );
        }
        MeasurementStatus::TemplateUnusable => {
            println!(
                "Template {} has no coverage in the observed wavelength range",
                cli.template.display()
            );
        }
    }
    Ok(())
}
