//! Galerkin coarse operator AH = R * A * P
//!
//! Computed row by row without intermediate products. Every output row
//! starts with a zero diagonal so the coarse diagonal is always stored,
//! then accumulates r * a * p through the position map.

use super::scratch::PositionMap;
use crate::sparse::{CsrBuilder, CsrMatrix};
use crate::traits::ComplexField;

/// Triple product R * A * P
pub(crate) fn galerkin_product<T: ComplexField>(
    restriction: &CsrMatrix<T>,
    matrix: &CsrMatrix<T>,
    prolongation: &CsrMatrix<T>,
    map: &mut PositionMap,
) -> CsrMatrix<T> {
    assert_eq!(restriction.num_cols, matrix.num_rows, "R and A do not chain");
    assert_eq!(matrix.num_cols, prolongation.num_rows, "A and P do not chain");
    debug_assert!(prolongation.num_cols <= map.len());

    let n = restriction.num_rows;
    let mut builder = CsrBuilder::with_capacity(n, prolongation.num_cols, matrix.nnz());

    for i in 0..n {
        let mut row = map.row::<T>();
        row.entry_or_insert_with(i, T::zero);

        for (k, r) in restriction.row_entries(i) {
            if r.is_zero() {
                continue;
            }
            for (l, a) in matrix.row_entries(k) {
                let ra = r * a;
                if ra.is_zero() {
                    continue;
                }
                for (j, p) in prolongation.row_entries(l) {
                    if p.is_zero() {
                        continue;
                    }
                    *row.entry_or_insert_with(j, T::zero) += ra * p;
                }
            }
        }

        let mut entries = row.finish();
        entries.sort_unstable_by_key(|&(j, _)| j);
        builder.add_row_entries(entries);
    }

    builder.finish()
}
