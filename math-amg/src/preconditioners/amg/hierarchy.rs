//! AMG level hierarchy
//!
//! Setup repeatedly coarsens the current operator, builds the transfer pair
//! (P, R = Pᵀ) and the Galerkin operator R*A*P, and pushes it as the next
//! level until the operator is small or dense enough to be solved directly,
//! coarsening stalls, or `max_levels` is reached. The coarsest operator is
//! then factorized once.
//!
//! The finest operator is borrowed from the caller; coarse operators are
//! owned by their level.

use super::coarsening::{CoarseSplitting, split};
use super::config::AmgConfig;
use super::galerkin::galerkin_product;
use super::interpolation::{build_prolongation, build_restriction};
use super::scratch::PositionMap;
use super::smoother::LevelSmoother;
use crate::direct::LuFactorization;
use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::{CoarseSolver, ComplexField, Smoother};
use ndarray::Array1;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Mutex;
use std::time::Instant;

/// Coarsest levels above this size make the dense direct solve expensive
const LARGE_COARSE_LEVEL: usize = 5000;

/// Reusable vectors of one cycle step
#[derive(Debug)]
pub(super) struct CycleScratch<T: ComplexField> {
    pub residual: Array1<T>,
    pub coarse_rhs: Array1<T>,
    pub coarse_correction: Array1<T>,
}

impl<T: ComplexField> CycleScratch<T> {
    fn new(fine: usize, coarse: usize) -> Self {
        Self {
            residual: Array1::from_elem(fine, T::zero()),
            coarse_rhs: Array1::from_elem(coarse, T::zero()),
            coarse_correction: Array1::from_elem(coarse, T::zero()),
        }
    }
}

/// Everything a non-coarsest level needs to hand work to the next level
#[derive(Debug)]
pub(super) struct LevelTransfer<T: ComplexField, S> {
    pub prolongation: CsrMatrix<T>,
    pub restriction: CsrMatrix<T>,
    pub splitting: CoarseSplitting,
    pub smoother: S,
    pub scratch: Mutex<CycleScratch<T>>,
}

/// Single level in the AMG hierarchy
#[derive(Debug)]
pub struct AmgLevel<'a, T: ComplexField, S> {
    pub(super) matrix: Cow<'a, CsrMatrix<T>>,
    pub(super) parent_index: Vec<usize>,
    pub(super) transfer: Option<LevelTransfer<T, S>>,
}

impl<T: ComplexField, S> AmgLevel<'_, T, S> {
    /// System matrix of this level
    pub fn matrix(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    /// Number of unknowns on this level
    pub fn size(&self) -> usize {
        self.matrix.num_rows
    }

    /// Node of the next finer level behind each node of this level (empty on
    /// the finest level)
    pub fn parent_index(&self) -> &[usize] {
        &self.parent_index
    }

    /// Prolongation to this level from the next coarser one
    pub fn prolongation(&self) -> Option<&CsrMatrix<T>> {
        self.transfer.as_ref().map(|t| &t.prolongation)
    }

    /// Restriction from this level to the next coarser one
    pub fn restriction(&self) -> Option<&CsrMatrix<T>> {
        self.transfer.as_ref().map(|t| &t.restriction)
    }

    /// Coarse/fine splitting that produced the next coarser level
    pub fn splitting(&self) -> Option<&CoarseSplitting> {
        self.transfer.as_ref().map(|t| &t.splitting)
    }

    pub fn smoother(&self) -> Option<&S> {
        self.transfer.as_ref().map(|t| &t.smoother)
    }

    pub fn is_coarsest(&self) -> bool {
        self.transfer.is_none()
    }
}

/// Algebraic multigrid hierarchy
///
/// Classical AMG with greedy coarsening, direct/indirect interpolation and
/// Galerkin coarse operators. Used as a stationary solver through
/// [`iterate`](AmgHierarchy::iterate) / [`solve`](AmgHierarchy::solve) or as
/// a [`Preconditioner`](crate::traits::Preconditioner) for Krylov methods.
#[derive(Debug)]
pub struct AmgHierarchy<'a, T, S = LevelSmoother<T>, C = LuFactorization<T>>
where
    T: ComplexField,
    S: Smoother<T>,
    C: CoarseSolver<T>,
{
    /// Levels from finest (0) to coarsest
    pub(super) levels: Vec<AmgLevel<'a, T, S>>,

    /// Factorized coarsest operator
    pub(super) coarse_solver: C,

    /// Residual buffer of the coarsest level
    pub(super) coarse_residual: Mutex<Array1<T>>,

    pub(super) config: AmgConfig,

    /// Statistics
    setup_time_ms: f64,
    grid_complexity: f64,
    operator_complexity: f64,
}

impl<'a, T: ComplexField> AmgHierarchy<'a, T> {
    /// Build the hierarchy with the default smoother and LU coarse solver
    pub fn new(matrix: &'a CsrMatrix<T>, config: AmgConfig) -> Result<Self> {
        Self::with_components(matrix, config)
    }
}

impl<'a, T, S, C> AmgHierarchy<'a, T, S, C>
where
    T: ComplexField,
    S: Smoother<T>,
    C: CoarseSolver<T>,
{
    /// Build the hierarchy with smoother `S` and coarsest-level solver `C`
    pub fn with_components(matrix: &'a CsrMatrix<T>, config: AmgConfig) -> Result<Self> {
        config.validate()?;
        if matrix.num_rows != matrix.num_cols {
            return Err(AmgError::DimensionMismatch {
                level: 0,
                expected: matrix.num_rows,
                got: matrix.num_cols,
            });
        }

        let start = Instant::now();
        log::info!(
            "AMG setup: {} unknowns, {} nonzeros",
            matrix.num_rows,
            matrix.nnz()
        );

        let mut levels = vec![AmgLevel {
            matrix: Cow::Borrowed(matrix),
            parent_index: Vec::new(),
            transfer: None,
        }];

        while levels.len() < config.max_levels {
            let level = levels.len() - 1;
            let current: &CsrMatrix<T> = &levels[level].matrix;
            let n = current.num_rows;

            if n < config.min_coarse_size {
                log::debug!("level {level}: {n} rows below min_coarse_size, stopping");
                break;
            }
            if current.density() > config.max_coarse_density {
                log::debug!(
                    "level {level}: density {:.3} above max_coarse_density, stopping",
                    current.density()
                );
                break;
            }

            let level_start = Instant::now();
            let smoother = S::init(current, &config)?;
            let aggressive = config.aggressive_coarsening && level == 0;
            let mut map = PositionMap::new(n);

            let splitting = split(current, &config, aggressive, &mut map)?;
            let num_coarse = splitting.num_coarse();
            if num_coarse == 0 || num_coarse >= n {
                log::info!("level {level}: coarsening stalled at {n} nodes");
                break;
            }
            log::debug!(
                "level {level}: coarsening took {:.2} ms",
                level_start.elapsed().as_secs_f64() * 1000.0
            );

            let phase = Instant::now();
            let prolongation = build_prolongation(current, &splitting, &config, aggressive, level, &mut map)?;
            let restriction = build_restriction(&prolongation);
            log::debug!(
                "level {level}: interpolation took {:.2} ms, P has {} nonzeros",
                phase.elapsed().as_secs_f64() * 1000.0,
                prolongation.nnz()
            );

            let phase = Instant::now();
            let coarse = galerkin_product(&restriction, current, &prolongation, &mut map);
            debug_assert!(map.is_clear());
            log::debug!(
                "level {level}: Galerkin product took {:.2} ms",
                phase.elapsed().as_secs_f64() * 1000.0
            );

            log::info!(
                "AMG level {}: {} -> {} nodes ({:.1}x), coarse nnz {}, density {:.4}",
                level,
                n,
                num_coarse,
                n as f64 / num_coarse as f64,
                coarse.nnz(),
                coarse.density()
            );

            let parent_index = splitting.parent_index().to_vec();
            levels[level].transfer = Some(LevelTransfer {
                prolongation,
                restriction,
                splitting,
                smoother,
                scratch: Mutex::new(CycleScratch::new(n, num_coarse)),
            });
            levels.push(AmgLevel {
                matrix: Cow::Owned(coarse),
                parent_index,
                transfer: None,
            });
        }

        let coarsest = levels.len() - 1;
        let coarsest_size = levels[coarsest].size();
        if coarsest_size > LARGE_COARSE_LEVEL {
            log::warn!(
                "coarsest level {coarsest} has {coarsest_size} unknowns; dense direct solve will be slow"
            );
        }
        let coarse_solver = C::factorize(&levels[coarsest].matrix)?;
        let coarse_residual = Mutex::new(Array1::from_elem(coarsest_size, T::zero()));

        let setup_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        let (grid_complexity, operator_complexity) = compute_complexities(&levels);

        log::info!(
            "AMG setup done in {:.1} ms: {} levels, grid complexity {:.3}, operator complexity {:.3}",
            setup_time_ms,
            levels.len(),
            grid_complexity,
            operator_complexity
        );

        Ok(Self {
            levels,
            coarse_solver,
            coarse_residual,
            config,
            setup_time_ms,
            grid_complexity,
            operator_complexity,
        })
    }

    /// Get number of levels in hierarchy
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Level `l` (0 = finest)
    pub fn level(&self, l: usize) -> &AmgLevel<'a, T, S> {
        &self.levels[l]
    }

    pub fn levels(&self) -> &[AmgLevel<'a, T, S>] {
        &self.levels
    }

    /// Number of unknowns per level, finest first
    pub fn level_sizes(&self) -> Vec<usize> {
        self.levels.iter().map(AmgLevel::size).collect()
    }

    /// System matrix of level `l`
    pub fn operator(&self, l: usize) -> &CsrMatrix<T> {
        self.levels[l].matrix()
    }

    pub fn prolongation(&self, l: usize) -> Option<&CsrMatrix<T>> {
        self.levels[l].prolongation()
    }

    pub fn restriction(&self, l: usize) -> Option<&CsrMatrix<T>> {
        self.levels[l].restriction()
    }

    pub fn splitting(&self, l: usize) -> Option<&CoarseSplitting> {
        self.levels[l].splitting()
    }

    /// Finest-level index of node `i` on `level`
    pub fn finest_index(&self, level: usize, i: usize) -> usize {
        (1..=level)
            .rev()
            .fold(i, |index, l| self.levels[l].parent_index[index])
    }

    /// Get configuration
    pub fn config(&self) -> &AmgConfig {
        &self.config
    }

    /// Get setup time in milliseconds
    pub fn setup_time_ms(&self) -> f64 {
        self.setup_time_ms
    }

    /// Get grid complexity (sum of DOFs / fine DOFs)
    pub fn grid_complexity(&self) -> f64 {
        self.grid_complexity
    }

    /// Get operator complexity (sum of nnz / fine nnz)
    pub fn operator_complexity(&self) -> f64 {
        self.operator_complexity
    }

    /// Get diagnostic information
    pub fn diagnostics(&self) -> AmgDiagnostics {
        AmgDiagnostics {
            num_levels: self.levels.len(),
            grid_complexity: self.grid_complexity,
            operator_complexity: self.operator_complexity,
            setup_time_ms: self.setup_time_ms,
            level_dofs: self.level_sizes(),
            level_nnz: self.levels.iter().map(|l| l.matrix.nnz()).collect(),
        }
    }
}

/// Compute grid and operator complexities
fn compute_complexities<T: ComplexField, S>(levels: &[AmgLevel<'_, T, S>]) -> (f64, f64) {
    let fine_dofs = levels[0].size() as f64;
    let fine_nnz = levels[0].matrix.nnz() as f64;
    if fine_dofs == 0.0 || fine_nnz == 0.0 {
        return (1.0, 1.0);
    }

    let total_dofs: f64 = levels.iter().map(|l| l.size() as f64).sum();
    let total_nnz: f64 = levels.iter().map(|l| l.matrix.nnz() as f64).sum();

    (total_dofs / fine_dofs, total_nnz / fine_nnz)
}

/// Diagnostic information about AMG setup
#[derive(Debug, Clone, Serialize)]
pub struct AmgDiagnostics {
    /// Number of levels
    pub num_levels: usize,
    /// Grid complexity
    pub grid_complexity: f64,
    /// Operator complexity
    pub operator_complexity: f64,
    /// Setup time in milliseconds
    pub setup_time_ms: f64,
    /// DOFs per level
    pub level_dofs: Vec<usize>,
    /// NNZ per level
    pub level_nnz: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    /// Create a simple 1D Laplacian matrix for testing
    fn create_1d_laplacian(n: usize) -> CsrMatrix<Complex64> {
        let mut triplets: Vec<(usize, usize, Complex64)> = Vec::new();

        for i in 0..n {
            triplets.push((i, i, Complex64::new(2.0, 0.0)));
            if i > 0 {
                triplets.push((i, i - 1, Complex64::new(-1.0, 0.0)));
            }
            if i < n - 1 {
                triplets.push((i, i + 1, Complex64::new(-1.0, 0.0)));
            }
        }

        CsrMatrix::from_triplets(n, n, triplets)
    }

    fn small_coarse(min_coarse_size: usize) -> AmgConfig {
        AmgConfig {
            min_coarse_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_amg_creation() {
        let matrix = create_1d_laplacian(200);
        let amg = AmgHierarchy::new(&matrix, small_coarse(20)).unwrap();

        assert!(amg.num_levels() >= 2);
        assert!(amg.grid_complexity() >= 1.0);
        assert!(amg.operator_complexity() >= 1.0);

        let sizes = amg.level_sizes();
        assert!(sizes.windows(2).all(|w| w[1] < w[0]), "sizes {sizes:?}");
        assert!(amg.level(amg.num_levels() - 1).is_coarsest());
    }

    #[test]
    fn test_finest_matrix_is_borrowed() {
        let matrix = create_1d_laplacian(150);
        let amg = AmgHierarchy::new(&matrix, small_coarse(20)).unwrap();

        assert!(std::ptr::eq(amg.operator(0), &matrix));
        assert!(matches!(amg.levels[0].matrix, Cow::Borrowed(_)));
        assert!(matches!(amg.levels[1].matrix, Cow::Owned(_)));
    }

    #[test]
    fn test_max_levels_bounds_hierarchy() {
        let matrix = create_1d_laplacian(400);
        let config = AmgConfig {
            max_levels: 2,
            min_coarse_size: 4,
            ..Default::default()
        };
        let amg = AmgHierarchy::new(&matrix, config).unwrap();
        assert_eq!(amg.num_levels(), 2);
        assert!(amg.prolongation(1).is_none());
        assert_eq!(amg.prolongation(0).unwrap().num_cols, amg.level_sizes()[1]);
    }

    #[test]
    fn test_parent_index_chain() {
        let matrix = create_1d_laplacian(300);
        let amg = AmgHierarchy::new(&matrix, small_coarse(10)).unwrap();
        assert!(amg.num_levels() >= 3);

        for l in 1..amg.num_levels() {
            let parents = amg.level(l).parent_index();
            assert_eq!(parents.len(), amg.level_sizes()[l]);
            let splitting = amg.splitting(l - 1).unwrap();
            for (c, &p) in parents.iter().enumerate() {
                assert_eq!(splitting.coarse_index(p), Some(c));
            }
        }

        let deepest = amg.num_levels() - 1;
        let f = amg.finest_index(deepest, 0);
        assert!(f < 300);
        assert_eq!(amg.finest_index(0, 7), 7);
    }

    #[test]
    fn test_rejects_non_square_and_bad_config() {
        let rect: CsrMatrix<f64> = CsrMatrix::new(3, 4);
        assert!(matches!(
            AmgHierarchy::new(&rect, AmgConfig::default()),
            Err(AmgError::DimensionMismatch { level: 0, .. })
        ));

        let square: CsrMatrix<f64> = CsrMatrix::identity(3);
        let bad = AmgConfig {
            max_levels: 0,
            ..Default::default()
        };
        assert!(matches!(
            AmgHierarchy::new(&square, bad),
            Err(AmgError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_diagnostics() {
        let matrix = create_1d_laplacian(200);
        let amg = AmgHierarchy::new(&matrix, small_coarse(20)).unwrap();

        let diag = amg.diagnostics();

        assert!(diag.num_levels >= 2);
        assert_eq!(diag.level_dofs.len(), diag.num_levels);
        assert_eq!(diag.level_nnz.len(), diag.num_levels);
        assert_eq!(diag.level_nnz[0], matrix.nnz());
        assert!(diag.grid_complexity >= 1.0);
        assert!(diag.setup_time_ms >= 0.0);
    }
}
