//! Strength of connection
//!
//! Entry (i,j) is strong if ‖a_ij‖ >= θ * max_k!=i ‖a_ik‖, with ‖·‖ the
//! configured [`StrengthNorm`]. Rows without off-diagonal entries are
//! isolated and never enter the graph.

use super::coarsening::{NodeInfo, NodeState};
use super::config::StrengthNorm;
use super::heap::RatingHeap;
use crate::sparse::CsrMatrix;
use crate::traits::ComplexField;
use num_traits::Zero;

/// Directed graph of strong connections in compressed adjacency form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongGraph {
    offsets: Vec<usize>,
    targets: Vec<usize>,
}

impl StrongGraph {
    pub(crate) fn with_capacity(num_nodes: usize, num_edges: usize) -> Self {
        let mut offsets = Vec::with_capacity(num_nodes + 1);
        offsets.push(0);
        Self {
            offsets,
            targets: Vec::with_capacity(num_edges),
        }
    }

    /// Append the adjacency list of the next node
    pub(crate) fn push_node(&mut self, neighbors: impl IntoIterator<Item = usize>) {
        self.targets.extend(neighbors);
        self.offsets.push(self.targets.len());
    }

    /// Strong connections of `matrix` for threshold `theta`
    pub fn from_matrix<T: ComplexField>(
        matrix: &CsrMatrix<T>,
        theta: f64,
        norm: StrengthNorm,
    ) -> Self {
        let mut graph = Self::with_capacity(matrix.num_rows, matrix.nnz());
        for i in 0..matrix.num_rows {
            let cutoff = strong_cutoff(matrix, i, theta, norm);
            graph.push_node(
                matrix
                    .off_diagonal(i)
                    .filter(|&(_, v)| norm.eval(v) >= cutoff)
                    .map(|(j, _)| j),
            );
        }
        graph
    }

    pub fn num_nodes(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn num_edges(&self) -> usize {
        self.targets.len()
    }

    /// Strongly connected neighbours of node `i`
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.targets[self.offsets[i]..self.offsets[i + 1]]
    }

    pub fn degree(&self, i: usize) -> usize {
        self.offsets[i + 1] - self.offsets[i]
    }
}

/// Largest off-diagonal entry norm of `row` (zero for isolated rows)
pub(crate) fn max_off_diagonal<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    row: usize,
    norm: StrengthNorm,
) -> T::Real {
    matrix
        .off_diagonal(row)
        .map(|(_, v)| norm.eval(v))
        .fold(T::Real::zero(), |acc, v| if v > acc { v } else { acc })
}

/// θ · dmax for `row`
pub(crate) fn strong_cutoff<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    row: usize,
    theta: f64,
    norm: StrengthNorm,
) -> T::Real {
    T::real_from_f64(theta) * max_off_diagonal(matrix, row, norm)
}

/// Initial state of the first coarsening pass
pub(crate) struct FirstPass {
    pub graph: StrongGraph,
    pub nodes: Vec<NodeInfo>,
    pub heap: RatingHeap,
    pub unassigned: usize,
}

/// Build the strong graph and seed ratings and heap.
///
/// Isolated rows are marked Fine right away. Every other node is rated by
/// its number of strong connections and inserted into the heap.
pub(crate) fn build_first_pass<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    theta: f64,
    norm: StrengthNorm,
) -> FirstPass {
    let n = matrix.num_rows;
    let graph = StrongGraph::from_matrix(matrix, theta, norm);
    let mut nodes = vec![NodeInfo::default(); n];
    let mut heap = RatingHeap::new(n);
    let mut unassigned = 0;

    for i in 0..n {
        if matrix.is_unconnected(i) {
            nodes[i].mark(NodeState::Fine);
            continue;
        }
        nodes[i].rating = graph.degree(i) as i64;
        heap.insert(i, &nodes);
        unassigned += 1;
    }

    log::debug!(
        "strength graph: {} nodes, {} strong edges, {} isolated",
        n,
        graph.num_edges(),
        n - unassigned
    );

    FirstPass {
        graph,
        nodes,
        heap,
        unassigned,
    }
}
