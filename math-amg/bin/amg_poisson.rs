//! AMG on model Poisson problems
//!
//! Builds a hierarchy for a finite-difference Laplacian, prints its level
//! statistics and solves `A x = 1` with V-cycles or AMG-preconditioned CG.
//!
//! Usage:
//!     cargo run --bin amg-poisson --release -- --n 129 --aggressive a1 --pcg

use anyhow::Context;
use clap::{Parser, ValueEnum};
use math_amg::{
    AmgConfig, AmgHierarchy, AmgSmoother, AmgSolveConfig, CgConfig, CsrMatrix, cg, export,
    gallery, pcg,
};
use ndarray::Array1;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "amg-poisson",
    about = "Build an AMG hierarchy for a model Laplacian and solve with it"
)]
struct Cli {
    /// Model problem
    #[arg(long, value_enum, default_value_t = Problem::Poisson2d)]
    problem: Problem,

    /// Grid points per direction
    #[arg(long, default_value_t = 33)]
    n: usize,

    /// JSON file with an AmgConfig (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Aggressive coarsening on the first level (overrides the config file)
    #[arg(long, value_enum)]
    aggressive: Option<Aggressive>,

    /// Smoother (overrides the config file)
    #[arg(long, value_enum)]
    smoother: Option<SmootherChoice>,

    /// Maximum number of V-cycles or CG iterations
    #[arg(long, default_value_t = 100)]
    cycles: usize,

    /// Relative residual tolerance
    #[arg(long, default_value_t = 1e-8)]
    tol: f64,

    /// Use AMG as a preconditioner for CG instead of a stationary solver
    #[arg(long)]
    pcg: bool,

    /// Also run unpreconditioned CG for comparison
    #[arg(long)]
    compare_cg: bool,

    /// Directory for Matrix Market dumps and coarse/fine scatter files
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Write the setup diagnostics as JSON to this file
    #[arg(long)]
    diagnostics: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Problem {
    Laplacian1d,
    Poisson2d,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Aggressive {
    None,
    A1,
    A2,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SmootherChoice {
    Sgs,
    Jacobi,
    L1Jacobi,
}

impl From<SmootherChoice> for AmgSmoother {
    fn from(choice: SmootherChoice) -> Self {
        match choice {
            SmootherChoice::Sgs => AmgSmoother::SymmetricGaussSeidel,
            SmootherChoice::Jacobi => AmgSmoother::Jacobi,
            SmootherChoice::L1Jacobi => AmgSmoother::L1Jacobi,
        }
    }
}

fn build_config(args: &Cli) -> anyhow::Result<AmgConfig> {
    let mut config = match &args.config {
        Some(path) => AmgConfig::from_file(path)
            .with_context(|| format!("reading AMG config {}", path.display()))?,
        None => AmgConfig::default(),
    };

    match args.aggressive {
        Some(Aggressive::None) => config.aggressive_coarsening = false,
        Some(Aggressive::A1) => {
            config.aggressive_coarsening = true;
            config.aggressive_paths = AmgConfig::aggressive_a1().aggressive_paths;
        }
        Some(Aggressive::A2) => {
            config.aggressive_coarsening = true;
            config.aggressive_paths = AmgConfig::aggressive_a2().aggressive_paths;
        }
        None => {}
    }
    if let Some(smoother) = args.smoother {
        config.smoother = smoother.into();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();
    anyhow::ensure!(args.n >= 2, "--n must be at least 2");

    let (matrix, positions): (CsrMatrix<f64>, Option<Vec<(f64, f64)>>) = match args.problem {
        Problem::Laplacian1d => (gallery::laplacian_1d(args.n), None),
        Problem::Poisson2d => (
            gallery::poisson_2d(args.n),
            Some(gallery::grid_positions(args.n)),
        ),
    };
    let config = build_config(&args)?;

    println!(
        "Problem {:?}: {} unknowns, {} nonzeros",
        args.problem,
        matrix.num_rows,
        matrix.nnz()
    );

    let amg = AmgHierarchy::new(&matrix, config)?;
    let diagnostics = amg.diagnostics();

    println!("\nLevel        DOFs         NNZ");
    for (l, (dofs, nnz)) in diagnostics
        .level_dofs
        .iter()
        .zip(&diagnostics.level_nnz)
        .enumerate()
    {
        println!("{l:>5} {dofs:>11} {nnz:>11}");
    }
    println!(
        "Grid complexity {:.3}, operator complexity {:.3}, setup {:.1} ms",
        diagnostics.grid_complexity, diagnostics.operator_complexity, diagnostics.setup_time_ms
    );

    if let Some(path) = &args.diagnostics {
        let json = serde_json::to_string_pretty(&diagnostics)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    if let Some(dir) = &args.dump {
        export::write_hierarchy(&amg, dir, "")?;
        if let Some(positions) = &positions {
            for level in 0..amg.num_levels() {
                export::write_coarsening(&amg, level, positions, dir)?;
            }
        }
        println!("Hierarchy written to {}", dir.display());
    }

    let b = Array1::from_elem(matrix.num_rows, 1.0);
    let start = Instant::now();

    if args.pcg {
        let cg_config = CgConfig {
            max_iterations: args.cycles,
            tolerance: args.tol,
            print_interval: 0,
        };
        let solution = pcg(&matrix, &amg, &b, &cg_config);
        println!(
            "\nAMG-PCG: {} iterations, residual {:.3e}, converged {} ({:.1} ms)",
            solution.iterations,
            solution.residual,
            solution.converged,
            start.elapsed().as_secs_f64() * 1000.0
        );

        if args.compare_cg {
            let plain = cg(&matrix, &b, &cg_config);
            println!(
                "CG:      {} iterations, residual {:.3e}, converged {}",
                plain.iterations, plain.residual, plain.converged
            );
        }
    } else {
        let solve_config = AmgSolveConfig {
            max_cycles: args.cycles,
            tolerance: args.tol,
            print_interval: 10,
        };
        let solution = amg.solve(&b, None, &solve_config)?;
        println!(
            "\nAMG V-cycles: {} cycles, residual {:.3e}, converged {} ({:.1} ms)",
            solution.cycles,
            solution.residual,
            solution.converged,
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    Ok(())
}
