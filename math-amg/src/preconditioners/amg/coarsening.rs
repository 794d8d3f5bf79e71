//! Coarse/fine splitting
//!
//! Greedy maximal-independent-set style coarsening on the strong graph: the
//! node with the highest rating becomes coarse, its unassigned strong
//! neighbours become fine, and the nodes next to those new fine nodes gain
//! rating so that they are preferred as the next coarse candidates.
//!
//! Aggressive coarsening runs the same greedy pass a second time on a graph
//! over the first-pass coarse nodes, connecting two of them when enough
//! two-hop paths through fine nodes exist. Losers of the second pass are
//! `FineIndirect` and interpolate through their fine neighbours.

use super::config::AmgConfig;
use super::heap::RatingHeap;
use super::scratch::PositionMap;
use super::strength::{StrongGraph, build_first_pass};
use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::ComplexField;

const NO_COARSE_INDEX: usize = usize::MAX;

/// Assignment of a node during coarsening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum NodeState {
    /// Not decided yet
    #[default]
    Unassigned,
    /// Kept on the coarse level
    Coarse,
    /// Interpolated directly from coarse neighbours
    Fine,
    /// Interpolated through fine neighbours (aggressive coarsening only)
    FineIndirect,
}

impl NodeState {
    pub fn is_assigned(self) -> bool {
        self != NodeState::Unassigned
    }

    pub fn is_coarse(self) -> bool {
        self == NodeState::Coarse
    }

    /// Fine or fine-indirect
    pub fn is_fine(self) -> bool {
        matches!(self, NodeState::Fine | NodeState::FineIndirect)
    }
}

/// Rating and state of one node during a coarsening pass
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NodeInfo {
    pub rating: i64,
    pub state: NodeState,
}

impl NodeInfo {
    #[cfg(test)]
    pub(crate) fn with_rating(rating: i64) -> Self {
        Self {
            rating,
            state: NodeState::Unassigned,
        }
    }

    pub(crate) fn is_assigned(&self) -> bool {
        self.state.is_assigned()
    }

    /// Settle the node; states never change once assigned
    pub(crate) fn mark(&mut self, state: NodeState) {
        debug_assert!(
            !self.is_assigned() && state.is_assigned(),
            "invalid transition {:?} -> {:?}",
            self.state,
            state
        );
        self.state = state;
    }
}

/// Result of coarsening one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoarseSplitting {
    states: Vec<NodeState>,
    coarse_index: Vec<usize>,
    parent_index: Vec<usize>,
}

impl CoarseSplitting {
    /// Number coarse nodes in the order given by `coarse_order`
    pub(crate) fn from_order(states: Vec<NodeState>, coarse_order: &[usize]) -> Self {
        let mut coarse_index = vec![NO_COARSE_INDEX; states.len()];
        for (c, &node) in coarse_order.iter().enumerate() {
            debug_assert!(states[node].is_coarse());
            coarse_index[node] = c;
        }
        Self {
            states,
            coarse_index,
            parent_index: coarse_order.to_vec(),
        }
    }

    /// Number of nodes on the fine level
    pub fn num_nodes(&self) -> usize {
        self.states.len()
    }

    /// Number of nodes on the coarse level
    pub fn num_coarse(&self) -> usize {
        self.parent_index.len()
    }

    pub fn state(&self, node: usize) -> NodeState {
        self.states[node]
    }

    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    /// Coarse-level index of a coarse node
    pub fn coarse_index(&self, node: usize) -> Option<usize> {
        match self.coarse_index[node] {
            NO_COARSE_INDEX => None,
            c => Some(c),
        }
    }

    /// Fine-level node behind each coarse index
    pub fn parent_index(&self) -> &[usize] {
        &self.parent_index
    }

    /// Number of nodes in `state`
    pub fn count(&self, state: NodeState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }
}

/// Greedy coarsening pass.
///
/// Returns the coarse nodes in selection order. Losers are marked
/// `fine_state`.
pub(crate) fn coarsen(
    graph: &StrongGraph,
    nodes: &mut [NodeInfo],
    heap: &mut RatingHeap,
    mut unassigned: usize,
    fine_state: NodeState,
) -> Result<Vec<usize>> {
    let mut selected = Vec::new();
    let mut newly_fine = Vec::new();

    while unassigned > 0 {
        let Some(best) = heap.remove_max(nodes) else {
            break;
        };
        if nodes[best].is_assigned() {
            return Err(AmgError::NodeAlreadyAssigned { node: best });
        }

        nodes[best].mark(NodeState::Coarse);
        selected.push(best);
        unassigned -= 1;

        newly_fine.clear();
        for &j in graph.neighbors(best) {
            if nodes[j].is_assigned() {
                continue;
            }
            heap.remove(j, nodes);
            nodes[j].mark(fine_state);
            newly_fine.push(j);
            unassigned -= 1;
        }

        for &f in &newly_fine {
            for &k in graph.neighbors(f) {
                if nodes[k].is_assigned() {
                    continue;
                }
                nodes[k].rating += 1;
                heap.upheap(k, nodes);
            }
        }
    }

    debug_assert_eq!(unassigned, 0, "heap exhausted with unassigned nodes");
    Ok(selected)
}

/// Graph over the coarse nodes of `first`: a→b if at least `paths` strong
/// paths a→f→b exist through fine nodes f.
pub(crate) fn second_order_graph(
    graph: &StrongGraph,
    first: &[NodeInfo],
    paths: usize,
    map: &mut PositionMap,
) -> StrongGraph {
    let n = graph.num_nodes();
    let mut graph2 = StrongGraph::with_capacity(n, graph.num_edges());

    for b in 0..n {
        if !first[b].state.is_coarse() {
            graph2.push_node(std::iter::empty());
            continue;
        }

        let mut row = map.row::<usize>();
        for &f in graph.neighbors(b) {
            if !first[f].state.is_fine() {
                continue;
            }
            for &c in graph.neighbors(f) {
                if c != b && first[c].state.is_coarse() {
                    *row.entry_or_insert_with(c, || 0) += 1;
                }
            }
        }

        let mut targets: Vec<usize> = row
            .finish()
            .into_iter()
            .filter(|&(_, count)| count >= paths)
            .map(|(c, _)| c)
            .collect();
        targets.sort_unstable();
        graph2.push_node(targets);
    }

    graph2
}

/// Coarse/fine splitting of `matrix`, with the aggressive second pass when
/// `aggressive` is set
pub(crate) fn split<T: ComplexField>(
    matrix: &CsrMatrix<T>,
    config: &AmgConfig,
    aggressive: bool,
    map: &mut PositionMap,
) -> Result<CoarseSplitting> {
    let n = matrix.num_rows;
    let first_pass = build_first_pass(matrix, config.strength_threshold, config.strength_norm);
    let graph = first_pass.graph;
    let mut nodes = first_pass.nodes;
    let mut heap = first_pass.heap;

    let selected = coarsen(
        &graph,
        &mut nodes,
        &mut heap,
        first_pass.unassigned,
        NodeState::Fine,
    )?;
    log::debug!("first pass: {} coarse of {} nodes", selected.len(), n);

    if !aggressive {
        let states = nodes.iter().map(|node| node.state).collect();
        return Ok(CoarseSplitting::from_order(states, &selected));
    }

    let graph2 = second_order_graph(&graph, &nodes, config.aggressive_paths, map);

    // only first-pass coarse nodes take part; everything else starts settled
    let mut second = vec![NodeInfo::default(); n];
    let mut immediate = Vec::new();
    let mut unassigned = 0;
    heap.reset();
    for b in 0..n {
        if !nodes[b].state.is_coarse() {
            second[b].mark(NodeState::Fine);
            continue;
        }
        match graph2.degree(b) {
            0 => {
                second[b].mark(NodeState::Coarse);
                immediate.push(b);
            }
            degree => {
                second[b].rating = degree as i64;
                heap.insert(b, &second);
                unassigned += 1;
            }
        }
    }

    let winners = coarsen(
        &graph2,
        &mut second,
        &mut heap,
        unassigned,
        NodeState::FineIndirect,
    )?;

    let states: Vec<NodeState> = nodes
        .iter()
        .zip(&second)
        .map(|(first, second)| {
            if first.state.is_coarse() {
                second.state
            } else {
                first.state
            }
        })
        .collect();

    log::debug!(
        "aggressive pass (A{}): {} immediately coarse, {} selected, {} fine-indirect",
        config.aggressive_paths,
        immediate.len(),
        winners.len(),
        selected.len() - immediate.len() - winners.len()
    );

    immediate.extend(winners);
    Ok(CoarseSplitting::from_order(states, &immediate))
}
