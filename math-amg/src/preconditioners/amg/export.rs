//! Debug output for inspecting a hierarchy
//!
//! Operators are written in Matrix Market coordinate format (1-based, one
//! entry per line), splittings as gnuplot "x y" scatter files over the
//! finest-level node positions.

use super::hierarchy::AmgHierarchy;
use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::{CoarseSolver, ComplexField, Smoother};
use num_traits::ToPrimitive;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `matrix` as a Matrix Market coordinate file
pub fn write_matrix_market<T: ComplexField, P: AsRef<Path>>(
    matrix: &CsrMatrix<T>,
    path: P,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let field = if T::IS_COMPLEX { "complex" } else { "real" };

    writeln!(out, "%%MatrixMarket matrix coordinate {field} general")?;
    writeln!(out, "{} {} {}", matrix.num_rows, matrix.num_cols, matrix.nnz())?;

    for row in 0..matrix.num_rows {
        for (col, value) in matrix.row_entries(row) {
            let re = value.re().to_f64().unwrap_or(f64::NAN);
            if T::IS_COMPLEX {
                let im = value.im().to_f64().unwrap_or(f64::NAN);
                writeln!(out, "{} {} {:.17e} {:.17e}", row + 1, col + 1, re, im)?;
            } else {
                writeln!(out, "{} {} {:.17e}", row + 1, col + 1, re)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Write every level operator as `{prefix}A{l}.mtx` and the transfer pair of
/// each non-coarsest level as `{prefix}P{l}.mtx` / `{prefix}R{l}.mtx`
pub fn write_hierarchy<T, S, C, P>(
    hierarchy: &AmgHierarchy<'_, T, S, C>,
    dir: P,
    prefix: &str,
) -> Result<()>
where
    T: ComplexField,
    S: Smoother<T>,
    C: CoarseSolver<T>,
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    for (l, level) in hierarchy.levels().iter().enumerate() {
        write_matrix_market(level.matrix(), dir.join(format!("{prefix}A{l}.mtx")))?;
        if let (Some(p), Some(r)) = (level.prolongation(), level.restriction()) {
            write_matrix_market(p, dir.join(format!("{prefix}P{l}.mtx")))?;
            write_matrix_market(r, dir.join(format!("{prefix}R{l}.mtx")))?;
        }
    }

    log::debug!(
        "Wrote {} level operators to {}",
        hierarchy.num_levels(),
        dir.display()
    );
    Ok(())
}

/// Write `coarse{level}.dat` and `fine{level}.dat` with the finest-level
/// positions of the Coarse and non-Coarse nodes of `level`
///
/// The coarsest level has no splitting; all of its nodes go to the coarse file.
pub fn write_coarsening<T, S, C, P>(
    hierarchy: &AmgHierarchy<'_, T, S, C>,
    level: usize,
    positions: &[(f64, f64)],
    dir: P,
) -> Result<()>
where
    T: ComplexField,
    S: Smoother<T>,
    C: CoarseSolver<T>,
    P: AsRef<Path>,
{
    let finest = hierarchy.level(0).size();
    if positions.len() != finest {
        return Err(AmgError::DimensionMismatch {
            level: 0,
            expected: finest,
            got: positions.len(),
        });
    }
    if level >= hierarchy.num_levels() {
        return Err(AmgError::InvalidConfig(format!(
            "level {level} out of range, hierarchy has {} levels",
            hierarchy.num_levels()
        )));
    }

    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let mut coarse = BufWriter::new(File::create(dir.join(format!("coarse{level}.dat")))?);
    let mut fine = BufWriter::new(File::create(dir.join(format!("fine{level}.dat")))?);

    let splitting = hierarchy.splitting(level);
    for i in 0..hierarchy.level(level).size() {
        let (x, y) = positions[hierarchy.finest_index(level, i)];
        let is_coarse = splitting.is_none_or(|s| s.state(i).is_coarse());
        let out = if is_coarse { &mut coarse } else { &mut fine };
        writeln!(out, "{x} {y}")?;
    }

    coarse.flush()?;
    fine.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preconditioners::amg::config::AmgConfig;
    use num_complex::Complex64;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("amg_export_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn laplacian(n: usize) -> CsrMatrix<f64> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0));
            if i > 0 {
                triplets.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, triplets)
    }

    #[test]
    fn test_matrix_market_real() {
        let dir = scratch_dir("real");
        let path = dir.join("a.mtx");
        write_matrix_market(&laplacian(4), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("%%MatrixMarket matrix coordinate real general")
        );
        assert_eq!(lines.next(), Some("4 4 10"));
        let first: Vec<&str> = lines.next().unwrap().split_whitespace().collect();
        assert_eq!(first[..2], ["1", "1"]);
        assert_eq!(first[2].parse::<f64>().unwrap(), 2.0);
        assert_eq!(lines.count(), 9);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_matrix_market_complex() {
        let dir = scratch_dir("complex");
        let path = dir.join("z.mtx");
        let m = CsrMatrix::from_triplets(2, 2, vec![(1, 0, Complex64::new(1.5, -2.0))]);
        write_matrix_market(&m, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("complex general"));
        assert_eq!(lines[1], "2 2 1");
        let values: Vec<f64> = lines[2]
            .split_whitespace()
            .skip(2)
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(values, vec![1.5, -2.0]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_hierarchy_and_coarsening() {
        let dir = scratch_dir("hierarchy");
        let n = 64;
        let matrix = laplacian(n);
        let amg = AmgHierarchy::new(
            &matrix,
            AmgConfig {
                min_coarse_size: 10,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(amg.num_levels() >= 2);

        write_hierarchy(&amg, &dir, "lap_").unwrap();
        for l in 0..amg.num_levels() {
            assert!(dir.join(format!("lap_A{l}.mtx")).exists());
        }
        let last = amg.num_levels() - 1;
        assert!(dir.join("lap_P0.mtx").exists());
        assert!(dir.join("lap_R0.mtx").exists());
        assert!(!dir.join(format!("lap_P{last}.mtx")).exists());

        let positions: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, 0.0)).collect();
        write_coarsening(&amg, 0, &positions, &dir).unwrap();
        let coarse = std::fs::read_to_string(dir.join("coarse0.dat")).unwrap();
        let fine = std::fs::read_to_string(dir.join("fine0.dat")).unwrap();
        assert_eq!(coarse.lines().count(), amg.level(1).size());
        assert_eq!(coarse.lines().count() + fine.lines().count(), n);

        assert!(write_coarsening(&amg, 0, &positions[1..], &dir).is_err());
        assert!(write_coarsening(&amg, amg.num_levels(), &positions, &dir).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
