//! Interpolation (prolongation) and restriction operators
//!
//! Weights are computed on entry norms and stored as real values:
//! for a fine row i with interpolatory coarse neighbours C_i,
//!
//! ```text
//! v_ij  = -‖a_ij‖
//! alpha = -(Σ_j v_ij / Σ_{j∈C_i} v_ij) / ‖a_ii‖
//! P_ic  = alpha * v_ij        (c = coarse index of j)
//! ```
//!
//! With aggressive coarsening, fine-indirect nodes interpolate through the
//! finished rows of their fine neighbours, keeping only coarse columns
//! reached by enough distinct paths. Plain fine nodes whose coarse
//! neighbours were all demoted by the second pass are treated the same way.
//! This runs in rounds, each round using only rows finished in earlier
//! rounds, so the result does not depend on node order.
//!
//! The neighbour sum of an indirect row runs over every off-diagonal entry,
//! weak ones included, not only over the strong and two-hop values of the
//! classical multipass scheme. Rows of zero-row-sum matrices keep `P·1 = 1`.

use super::coarsening::{CoarseSplitting, NodeState};
use super::config::{AmgConfig, StrengthNorm};
use super::scratch::PositionMap;
use super::strength::strong_cutoff;
use crate::error::{AmgError, Result};
use crate::sparse::{CsrBuilder, CsrMatrix};
use crate::traits::ComplexField;
use num_traits::{One, Zero};

type WeightRow<R> = Vec<(usize, R)>;

/// Unscaled interpolation row
struct RawRow<R> {
    entries: WeightRow<R>,
    sum_neighbors: R,
    sum_interpolatory: R,
}

#[derive(Debug, Clone, Copy)]
struct IndirectEntry<R> {
    value: R,
    paths: usize,
    direct: bool,
}

/// Build the prolongation P (n_fine x n_coarse) of one level
pub(crate) fn build_prolongation<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    splitting: &CoarseSplitting,
    config: &AmgConfig,
    aggressive: bool,
    level: usize,
    map: &mut PositionMap,
) -> Result<CsrMatrix<T>> {
    let n = matrix.num_rows;
    let norm = config.strength_norm;
    let mut rows: Vec<WeightRow<T::Real>> = vec![Vec::new(); n];
    let mut finished = vec![true; n];
    let mut pending = Vec::new();

    if !aggressive {
        let indirect = (0..n)
            .find(|&i| splitting.state(i) == NodeState::FineIndirect && !matrix.is_unconnected(i));
        if let Some(node) = indirect {
            return Err(AmgError::UnexpectedIndirectFine { node });
        }
    }

    for i in 0..n {
        match splitting.state(i) {
            NodeState::Coarse => {
                if let Some(c) = splitting.coarse_index(i) {
                    rows[i].push((c, T::Real::one()));
                }
            }
            _ if matrix.is_unconnected(i) => {}
            NodeState::FineIndirect => {
                finished[i] = false;
                pending.push(i);
            }
            _ => {
                let raw = direct_row(matrix, splitting, i, config.strength_threshold, norm);
                if aggressive && raw.entries.is_empty() && !raw.sum_neighbors.is_zero() {
                    finished[i] = false;
                    pending.push(i);
                    continue;
                }
                let diagonal = norm.eval(matrix.diagonal_value(i));
                rows[i] = scale_row::<T>(raw, diagonal, level, i)?;
            }
        }
    }

    let mut round = 0;
    while !pending.is_empty() {
        round += 1;
        let mut completed = Vec::new();
        let mut waiting = Vec::new();
        for &i in &pending {
            match indirect_row(matrix, splitting, &rows, &finished, i, config, map) {
                Some(raw) => {
                    let diagonal = norm.eval(matrix.diagonal_value(i));
                    completed.push((i, scale_row::<T>(raw, diagonal, level, i)?));
                }
                None => waiting.push(i),
            }
        }
        if completed.is_empty() {
            return Err(AmgError::UnstableInterpolation {
                level,
                row: waiting[0],
            });
        }
        log::debug!(
            "indirect interpolation round {}: {} rows, {} waiting",
            round,
            completed.len(),
            waiting.len()
        );
        for (i, row) in completed {
            rows[i] = row;
            finished[i] = true;
        }
        pending = waiting;
    }

    let nnz = rows.iter().map(Vec::len).sum();
    let mut builder = CsrBuilder::with_capacity(n, splitting.num_coarse(), nnz);
    for mut row in rows {
        row.sort_unstable_by_key(|&(c, _)| c);
        builder.add_row_entries(row.into_iter().map(|(c, w)| (c, T::from_real(w))));
    }
    Ok(builder.finish())
}

/// Restriction R = Pᵀ
pub(crate) fn build_restriction<T: ComplexField>(prolongation: &CsrMatrix<T>) -> CsrMatrix<T> {
    prolongation.transpose()
}

/// Sum of `v_ij` over every off-diagonal entry of `row`
fn neighbor_sum<T: ComplexField>(matrix: &CsrMatrix<T>, row: usize, norm: StrengthNorm) -> T::Real {
    matrix
        .off_diagonal(row)
        .fold(T::Real::zero(), |acc, (_, a)| acc - norm.eval(a))
}

fn direct_row<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    splitting: &CoarseSplitting,
    i: usize,
    theta: f64,
    norm: StrengthNorm,
) -> RawRow<T::Real> {
    let cutoff = strong_cutoff(matrix, i, theta, norm);
    let mut sum_interpolatory = T::Real::zero();
    let mut entries = Vec::new();

    for (j, a) in matrix.off_diagonal(i) {
        let strength = norm.eval(a);
        if strength < cutoff {
            continue;
        }
        if let Some(c) = splitting.coarse_index(j) {
            entries.push((c, -strength));
            sum_interpolatory -= strength;
        }
    }

    RawRow {
        entries,
        sum_neighbors: neighbor_sum(matrix, i, norm),
        sum_interpolatory,
    }
}

/// Two-hop row of `i` through finished neighbour rows, `None` if no strong
/// neighbour is usable yet
fn indirect_row<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    splitting: &CoarseSplitting,
    rows: &[WeightRow<T::Real>],
    finished: &[bool],
    i: usize,
    config: &AmgConfig,
    map: &mut PositionMap,
) -> Option<RawRow<T::Real>> {
    let norm = config.strength_norm;
    let cutoff = strong_cutoff(matrix, i, config.strength_threshold, norm);
    let empty = || IndirectEntry {
        value: T::Real::zero(),
        paths: 0,
        direct: false,
    };

    let mut acc = map.row::<IndirectEntry<T::Real>>();
    for (j, a) in matrix.off_diagonal(i) {
        let strength = norm.eval(a);
        if strength < cutoff {
            continue;
        }
        let v = -strength;
        if let Some(c) = splitting.coarse_index(j) {
            let entry = acc.entry_or_insert_with(c, empty);
            entry.value += v;
            entry.direct = true;
        } else if finished[j] {
            for &(c, p) in &rows[j] {
                let entry = acc.entry_or_insert_with(c, empty);
                entry.value += v * p;
                entry.paths += 1;
            }
        }
    }

    if acc.len() == 0 {
        return None;
    }
    let accumulated = acc.finish();

    let required = match splitting.state(i) {
        NodeState::FineIndirect => config.aggressive_paths,
        _ => 1,
    };
    let qualifies = |e: &IndirectEntry<T::Real>, min: usize| e.direct || e.paths >= min;
    // columns are never all dropped: fall back to single paths
    let required = if accumulated.iter().any(|(_, e)| qualifies(e, required)) {
        required
    } else {
        1
    };

    let mut entries = Vec::with_capacity(accumulated.len());
    let mut sum_interpolatory = T::Real::zero();
    for (c, entry) in accumulated {
        if qualifies(&entry, required) {
            sum_interpolatory += entry.value;
            entries.push((c, entry.value));
        }
    }

    Some(RawRow {
        entries,
        sum_neighbors: neighbor_sum(matrix, i, norm),
        sum_interpolatory,
    })
}

fn scale_row<T: ComplexField>(
    raw: RawRow<T::Real>,
    diagonal: T::Real,
    level: usize,
    row: usize,
) -> Result<WeightRow<T::Real>> {
    let RawRow {
        mut entries,
        sum_neighbors,
        sum_interpolatory,
    } = raw;

    if sum_interpolatory.is_zero() {
        if sum_neighbors.is_zero() {
            return Ok(Vec::new());
        }
        return Err(AmgError::UnstableInterpolation { level, row });
    }
    if diagonal.is_zero() {
        return Err(AmgError::UnstableInterpolation { level, row });
    }

    let alpha = -(sum_neighbors / sum_interpolatory) / diagonal;
    for (_, w) in entries.iter_mut() {
        *w *= alpha;
    }
    Ok(entries)
}
