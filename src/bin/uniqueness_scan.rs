//! Measure the grid-code uniqueness range of a generated module set.
//!
//! Run with: cargo run --release --bin uniqueness_scan
//!
//! Usage:
//!   uniqueness_scan                          Default: 1 module, 2 dims
//!   uniqueness_scan -m 2 -d 3 --hex          2 hexagonal modules, 3 dims
//!   uniqueness_scan --orthogonal -s 99       Orthogonal projections, seed 99
//!
//! Multi-module scans can run a long time: joint zeros get rarer with every
//! module added.
//!
//! Progress is logged every 10 seconds; set RUST_LOG=info to see it.

use std::time::Instant;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grid_uniqueness::bases::{
    hexagonal_lattice, orthogonal_modules, random_modules, square_lattice,
};
use grid_uniqueness::compute_grid_uniqueness_hypercube;

#[derive(Parser, Debug)]
#[command(name = "uniqueness_scan", version, about)]
struct Args {
    /// Number of grid modules
    #[arg(short, long, default_value_t = 1)]
    modules: usize,

    /// Domain dimensions
    #[arg(short, long, default_value_t = 2)]
    dims: usize,

    /// Readout resolution (diameter of the zero-disk)
    #[arg(long, default_value_t = 0.2)]
    readout_resolution: f64,

    /// Half-side of the ignored central hypercube
    #[arg(long, default_value_t = 0.1)]
    ignored_center: f64,

    /// Random seed for module generation
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Use a hexagonal readout lattice instead of a square one
    #[arg(long)]
    hex: bool,

    /// Draw projections from Haar-random orthogonal matrices
    #[arg(long)]
    orthogonal: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let lattice = if args.hex {
        hexagonal_lattice()
    } else {
        square_lattice()
    };

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let modules = if args.orthogonal {
        orthogonal_modules(&mut rng, args.modules, args.dims, lattice)
    } else {
        random_modules(&mut rng, args.modules, args.dims, lattice)
    };
    let modules = match modules {
        Ok(modules) => modules,
        Err(err) => {
            eprintln!("failed to generate modules: {}", err);
            std::process::exit(1);
        }
    };

    println!(
        "Scanning {} modules, {} dims, readout {}, seed {}...",
        args.modules, args.dims, args.readout_resolution, args.seed
    );

    let start = Instant::now();
    match compute_grid_uniqueness_hypercube(
        &modules,
        args.readout_resolution,
        args.ignored_center,
    ) {
        Ok(output) => {
            println!("{:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
            println!("Hypercube side length upper bound: {}", output.upper_bound);
            println!("Grid code zero found at: {:?}", output.witness);
        }
        Err(err) => {
            eprintln!("scan failed: {}", err);
            std::process::exit(1);
        }
    }
}
