//! Sub-grid peak localization: fit a 1-D Gaussian to the samples around the
//! CCF maximum with a damped least-squares (Levenberg–Marquardt) loop.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::ccf::CcfCurve;

/// Tunables for the local peak fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    /// Samples taken on each side of the CCF maximum (clipped at the curve
    /// edges).
    pub window: usize,
    /// Seed standard deviation in km/s.
    pub seed_stddev: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            window: 10,
            seed_stddev: 5.0,
        }
    }
}

/// A 1-D Gaussian: amplitude · exp(−(x − mean)² / (2 stddev²)).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub amplitude: f64,
    pub mean: f64,
    pub stddev: f64,
}

impl Gaussian {
    pub fn evaluate(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.stddev;
        self.amplitude * (-0.5 * z * z).exp()
    }

    pub fn evaluate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// Outcome of the peak fit. On fallback `rv` is the coarse-grid argmax
/// velocity and `model` is the seed Gaussian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakFit {
    /// Sub-grid RV estimate in km/s.
    pub rv: f64,
    /// False when the fit did not converge and the coarse maximum was used.
    pub converged: bool,
    /// The fitted (or seed) Gaussian, for diagnostic display.
    pub model: Gaussian,
}

/// Fit the CCF peak. The curve must be min-max normalized (max = 1); ties at
/// the maximum resolve to the lowest velocity. Never fails: any degenerate
/// window or non-converging fit falls back to the coarse maximum, and an
/// empty curve reports rv = 0 unconverged.
pub fn fit_ccf_peak(curve: &CcfCurve, config: &FitConfig) -> PeakFit {
    if curve.is_empty() {
        return PeakFit {
            rv: 0.0,
            converged: false,
            model: Gaussian {
                amplitude: 1.0,
                mean: 0.0,
                stddev: config.seed_stddev,
            },
        };
    }

    // Strictly-greater comparison keeps the first (lowest-velocity) sample
    // on ties; Iterator::max_by would keep the last.
    let mut peak_idx = 0;
    for (i, &s) in curve.scores.iter().enumerate() {
        if s > curve.scores[peak_idx] {
            peak_idx = i;
        }
    }
    let coarse_rv = curve.velocities[peak_idx];

    let seed = Gaussian {
        amplitude: 1.0,
        mean: coarse_rv,
        stddev: config.seed_stddev,
    };
    let fallback = PeakFit {
        rv: coarse_rv,
        converged: false,
        model: seed,
    };

    let lo = peak_idx.saturating_sub(config.window);
    let hi = (peak_idx + config.window).min(curve.velocities.len());
    let xs = &curve.velocities[lo..hi];
    let ys = &curve.scores[lo..hi];

    // Three free parameters; anything smaller is a degenerate edge window.
    if xs.len() < 4 {
        debug!("peak fit: window of {} points is degenerate", xs.len());
        return fallback;
    }

    match levenberg_marquardt(xs, ys, seed) {
        Some(model) => PeakFit {
            rv: model.mean,
            converged: true,
            model,
        },
        None => {
            debug!("peak fit: did not converge, falling back to grid maximum");
            fallback
        }
    }
}

/// Damped Gauss–Newton iteration for the three Gaussian parameters.
/// Returns `None` when the normal equations cannot be solved or the
/// parameters leave the finite domain.
fn levenberg_marquardt(xs: &[f64], ys: &[f64], seed: Gaussian) -> Option<Gaussian> {
    const MAX_ITER: usize = 100;
    const STEP_TOL: f64 = 1e-10;

    let n = xs.len();
    let mut params = seed;
    let mut lambda = 1e-3;
    let mut cost = residual_cost(xs, ys, &params);

    for _ in 0..MAX_ITER {
        let mut jac = DMatrix::zeros(n, 3);
        let mut resid = DVector::zeros(n);
        for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
            let z = (x - params.mean) / params.stddev;
            let e = (-0.5 * z * z).exp();
            let g = params.amplitude * e;
            resid[i] = y - g;
            jac[(i, 0)] = e;
            jac[(i, 1)] = g * z / params.stddev;
            jac[(i, 2)] = g * z * z / params.stddev;
        }

        let jtj = jac.transpose() * &jac;
        let jtr = jac.transpose() * &resid;

        // Marquardt damping on the diagonal.
        let mut lhs = jtj.clone();
        for d in 0..3 {
            lhs[(d, d)] += lambda * jtj[(d, d)].max(1e-12);
        }

        let svd = lhs.svd(true, true);
        let delta = svd.solve(&jtr, 1e-12).ok()?;

        let trial = Gaussian {
            amplitude: params.amplitude + delta[0],
            mean: params.mean + delta[1],
            stddev: params.stddev + delta[2],
        };
        if !trial.amplitude.is_finite()
            || !trial.mean.is_finite()
            || !trial.stddev.is_finite()
            || trial.stddev == 0.0
        {
            return None;
        }

        let trial_cost = residual_cost(xs, ys, &trial);
        if trial_cost < cost {
            params = trial;
            cost = trial_cost;
            lambda = (lambda / 10.0).max(1e-12);
            if delta.norm() < STEP_TOL {
                return Some(params);
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                // Damping saturated without progress.
                return Some(params);
            }
        }
    }
    Some(params)
}

fn residual_cost(xs: &[f64], ys: &[f64], g: &Gaussian) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - g.evaluate(x);
            r * r
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_curve(center: f64, stddev: f64) -> CcfCurve {
        let velocities: Vec<f64> = (0..150).map(|i| i as f64).collect();
        let g = Gaussian {
            amplitude: 1.0,
            mean: center,
            stddev,
        };
        let scores = g.evaluate_all(&velocities);
        CcfCurve { velocities, scores }
    }

    #[test]
    fn recovers_gaussian_center() {
        let curve = synthetic_curve(42.0, 4.0);
        let fit = fit_ccf_peak(&curve, &FitConfig::default());
        assert!(fit.converged);
        assert!((fit.rv - 42.0).abs() < 0.1, "rv = {}", fit.rv);
    }

    #[test]
    fn recovers_off_grid_center() {
        // Peak between grid points; the fit must land sub-grid.
        let curve = synthetic_curve(42.37, 4.0);
        let fit = fit_ccf_peak(&curve, &FitConfig::default());
        assert!(fit.converged);
        assert!((fit.rv - 42.37).abs() < 0.1, "rv = {}", fit.rv);
    }

    #[test]
    fn window_clips_at_curve_edges() {
        // Maximum at index 2: the left side of the ±10 window is clipped.
        let curve = synthetic_curve(2.0, 4.0);
        let fit = fit_ccf_peak(&curve, &FitConfig::default());
        assert!((fit.rv - 2.0).abs() < 0.5, "rv = {}", fit.rv);
    }

    #[test]
    fn degenerate_window_falls_back() {
        // Two-point curve: window cannot support three parameters.
        let curve = CcfCurve {
            velocities: vec![0.0, 1.0],
            scores: vec![0.2, 1.0],
        };
        let fit = fit_ccf_peak(&curve, &FitConfig::default());
        assert!(!fit.converged);
        assert_eq!(fit.rv, 1.0);
    }

    #[test]
    fn tie_resolves_to_lowest_velocity() {
        let curve = CcfCurve {
            velocities: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            scores: vec![0.1, 1.0, 0.5, 1.0, 0.1],
        };
        let fit = fit_ccf_peak(&curve, &FitConfig { window: 1, seed_stddev: 5.0 });
        // Window of 2 points around index 1 is degenerate → coarse argmax,
        // which must be the first of the tied maxima.
        assert_eq!(fit.rv, 1.0);
        assert!(!fit.converged);
    }
}
