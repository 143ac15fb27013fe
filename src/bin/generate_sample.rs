//! Generate a synthetic template/observed spectrum pair for trying the CLI:
//!
//! ```sh
//! cargo run --bin generate_sample
//! cargo run -- observed.json template.json
//! ```
//!
//! The observed spectrum carries the template's absorption lines redshifted
//! by a known velocity plus photon-like noise, so the measured RV should
//! come out near `TRUE_RV_KMS`.

use serde_json::json;

use rusty_rv::SPEED_OF_LIGHT_KMS;

const CRVAL1: f64 = 5000.0;
const CDELT1: f64 = 0.05;
const NAXIS1: usize = 6000;
const TRUE_RV_KMS: f64 = 30.0;

/// Absorption lines: (center Å, sigma Å, depth).
const LINES: [(f64, f64, f64); 6] = [
    (5050.3, 0.15, 0.55),
    (5087.9, 0.12, 0.40),
    (5120.0, 0.18, 0.65),
    (5133.4, 0.15, 0.35),
    (5201.7, 0.14, 0.50),
    (5260.2, 0.16, 0.45),
];

fn gaussian(x: f64, mu: f64, sigma: f64, depth: f64) -> f64 {
    depth * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn absorption_flux(wavelengths: &[f64], shift_factor: f64, continuum: f64) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&w| {
            let absorbed: f64 = LINES
                .iter()
                .map(|&(mu, sigma, depth)| gaussian(w, mu * shift_factor, sigma, depth))
                .sum();
            continuum * (1.0 - absorbed.min(0.95))
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_json(path: &str, flux: &[f64]) {
    let doc = json!({
        "flux": flux,
        "header": {
            "CRVAL1": CRVAL1,
            "CDELT1": CDELT1,
            "NAXIS1": NAXIS1,
            "OBJECT": "synthetic",
        },
    });
    std::fs::write(path, serde_json::to_string(&doc).expect("serialize spectrum"))
        .expect("write spectrum file");
    println!("Wrote {path}");
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let wavelengths: Vec<f64> = (0..NAXIS1).map(|i| CRVAL1 + i as f64 * CDELT1).collect();

    // Template at rest, noiseless.
    let template = absorption_flux(&wavelengths, 1.0, 1000.0);
    write_json("template.json", &template);

    // Observed: redshifted lines, photon-like noise on the counts.
    let factor = 1.0 + TRUE_RV_KMS / SPEED_OF_LIGHT_KMS;
    let observed: Vec<f64> = absorption_flux(&wavelengths, factor, 1000.0)
        .into_iter()
        .map(|f| f + rng.gauss(0.0, 0.003 * f.max(1.0)))
        .collect();
    write_json("observed.json", &observed);

    println!(
        "True shift: {TRUE_RV_KMS} km/s over {} samples ({CRVAL1}–{:.1} Å)",
        NAXIS1,
        CRVAL1 + (NAXIS1 - 1) as f64 * CDELT1
    );
}
