//! Constructors for grid-cell module sets.
//!
//! The readout lattice of a biological grid module is hexagonal; the square
//! lattice is the usual simplification for analysis. The random generators
//! reproduce the parameter recipes used to build module sets for
//! high-dimensional uniqueness experiments: per-module scale factors drawn
//! around 1, per-column lengths normalized to the module scale, and column
//! directions uniform on the circle (or rows of a Haar-random orthogonal
//! matrix for the orthogonal variant).

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::error::GridCodeError;
use crate::types::GridModule;

/// Standard deviation of the per-module scale jitter around 1.
const SCALE_JITTER: f64 = 0.2;

/// The square readout lattice.
pub fn square_lattice() -> [[f64; 2]; 2] {
    [[1.0, 0.0], [0.0, 1.0]]
}

/// The hexagonal readout lattice: unit vectors 60 degrees apart.
pub fn hexagonal_lattice() -> [[f64; 2]; 2] {
    [[1.0, 0.0], [0.5, 3.0_f64.sqrt() / 2.0]]
}

fn random_point_on_circle<R: Rng + ?Sized>(rng: &mut R) -> [f64; 2] {
    let angle = rng.gen_range(0.0..TAU);
    [angle.cos(), angle.sin()]
}

/// Per-module scale factors `1 + N(0, 0.2)`, normalized to mean 1.
fn module_scales<R: Rng + ?Sized>(rng: &mut R, num_modules: usize) -> Vec<f64> {
    let jitter = Normal::new(1.0, SCALE_JITTER).expect("constant parameters are valid");
    let mut scales: Vec<f64> = (0..num_modules).map(|_| jitter.sample(rng)).collect();
    let mean = scales.iter().sum::<f64>() / num_modules as f64;
    for scale in &mut scales {
        *scale /= mean;
    }
    scales
}

/// Generate `num_modules` modules whose domain-to-plane columns have random
/// circle directions and lengths with mean `1 / scale` per module.
pub fn random_modules<R: Rng + ?Sized>(
    rng: &mut R,
    num_modules: usize,
    num_dims: usize,
    lattice_basis: [[f64; 2]; 2],
) -> Result<Vec<GridModule>, GridCodeError> {
    if num_modules == 0 {
        return Ok(Vec::new());
    }

    let mut modules = Vec::with_capacity(num_modules);
    for scale in module_scales(rng, num_modules) {
        let mut lengths: Vec<f64> = (0..num_dims).map(|_| rng.gen::<f64>()).collect();
        let mean = lengths.iter().sum::<f64>() / num_dims.max(1) as f64;
        for length in &mut lengths {
            *length /= mean * scale;
        }

        let mut row0 = vec![0.0; num_dims];
        let mut row1 = vec![0.0; num_dims];
        for (col, length) in lengths.into_iter().enumerate() {
            let direction = random_point_on_circle(rng);
            row0[col] = length * direction[0];
            row1[col] = length * direction[1];
        }

        modules.push(GridModule::new([row0, row1], lattice_basis)?);
    }
    Ok(modules)
}

/// Generate `num_modules` modules whose domain-to-plane maps are the first
/// two rows of a Haar-random orthogonal matrix, scaled per module.
///
/// Falls back to [`random_modules`] for a one-dimensional domain, where no
/// orthogonal pair exists.
pub fn orthogonal_modules<R: Rng + ?Sized>(
    rng: &mut R,
    num_modules: usize,
    num_dims: usize,
    lattice_basis: [[f64; 2]; 2],
) -> Result<Vec<GridModule>, GridCodeError> {
    if num_dims < 2 {
        return random_modules(rng, num_modules, num_dims, lattice_basis);
    }
    if num_modules == 0 {
        return Ok(Vec::new());
    }

    let mut modules = Vec::with_capacity(num_modules);
    for scale in module_scales(rng, num_modules) {
        let (mut row0, mut row1) = orthonormal_rows(rng, num_dims);
        for value in row0.iter_mut().chain(row1.iter_mut()) {
            *value /= scale;
        }
        modules.push(GridModule::new([row0, row1], lattice_basis)?);
    }
    Ok(modules)
}

/// Two orthonormal rows of a Haar-random orthogonal matrix: Gaussian samples
/// run through Gram-Schmidt. Degenerate draws are resampled.
fn orthonormal_rows<R: Rng + ?Sized>(rng: &mut R, num_dims: usize) -> (Vec<f64>, Vec<f64>) {
    loop {
        let mut a: Vec<f64> = (0..num_dims).map(|_| rng.sample(StandardNormal)).collect();
        let norm_a = a.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm_a < 1e-9 {
            continue;
        }
        for value in &mut a {
            *value /= norm_a;
        }

        let mut b: Vec<f64> = (0..num_dims).map(|_| rng.sample(StandardNormal)).collect();
        let projection: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        for (value, &basis) in b.iter_mut().zip(&a) {
            *value -= projection * basis;
        }
        let norm_b = b.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm_b < 1e-9 {
            continue;
        }
        for value in &mut b {
            *value /= norm_b;
        }

        return (a, b);
    }
}
