//! Indexed max-heap over node ratings
//!
//! The coarsener repeatedly takes the node with the highest rating, removes
//! its neighbours, and raises the rating of nodes two hops away. The heap
//! stores node indices and keeps a position table so arbitrary removal and
//! increase-key are O(log n). Ratings live in the caller's [`NodeInfo`]
//! array and are passed to every operation.
//!
//! Ordering is by `(rating, Reverse(index))`: equal ratings go to the smaller
//! node index, which makes coarsening reproducible across runs and platforms.

use super::coarsening::NodeInfo;

const NOT_IN_HEAP: usize = usize::MAX;

#[derive(Debug, Clone)]
pub(crate) struct RatingHeap {
    heap: Vec<usize>,
    position: Vec<usize>,
}

#[inline]
fn ranks_above(a: usize, b: usize, nodes: &[NodeInfo]) -> bool {
    let (ra, rb) = (nodes[a].rating, nodes[b].rating);
    ra > rb || (ra == rb && a < b)
}

impl RatingHeap {
    /// Empty heap for nodes `0..capacity`
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            position: vec![NOT_IN_HEAP; capacity],
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub(crate) fn contains(&self, node: usize) -> bool {
        self.position[node] != NOT_IN_HEAP
    }

    /// Remove every node, keeping the allocation
    pub(crate) fn reset(&mut self) {
        for &node in &self.heap {
            self.position[node] = NOT_IN_HEAP;
        }
        self.heap.clear();
    }

    pub(crate) fn insert(&mut self, node: usize, nodes: &[NodeInfo]) {
        debug_assert!(!self.contains(node), "node {node} inserted twice");
        self.position[node] = self.heap.len();
        self.heap.push(node);
        self.sift_up(self.heap.len() - 1, nodes);
    }

    /// Highest-rated node, smallest index on ties
    pub(crate) fn remove_max(&mut self, nodes: &[NodeInfo]) -> Option<usize> {
        let top = *self.heap.first()?;
        self.remove_at(0, nodes);
        Some(top)
    }

    /// Remove `node` if present
    pub(crate) fn remove(&mut self, node: usize, nodes: &[NodeInfo]) {
        let pos = self.position[node];
        if pos != NOT_IN_HEAP {
            self.remove_at(pos, nodes);
        }
    }

    /// Restore heap order after the rating of `node` increased
    pub(crate) fn upheap(&mut self, node: usize, nodes: &[NodeInfo]) {
        let pos = self.position[node];
        if pos != NOT_IN_HEAP {
            self.sift_up(pos, nodes);
        }
    }

    fn remove_at(&mut self, pos: usize, nodes: &[NodeInfo]) {
        let last = self.heap.len() - 1;
        self.swap(pos, last);
        let removed = self.heap.pop();
        if let Some(node) = removed {
            self.position[node] = NOT_IN_HEAP;
        }
        if pos < self.heap.len() {
            self.sift_down(pos, nodes);
            self.sift_up(pos, nodes);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.position[self.heap[a]] = a;
        self.position[self.heap[b]] = b;
    }

    fn sift_up(&mut self, mut pos: usize, nodes: &[NodeInfo]) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !ranks_above(self.heap[pos], self.heap[parent], nodes) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize, nodes: &[NodeInfo]) {
        let n = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= n {
                break;
            }
            let right = left + 1;
            let mut best = left;
            if right < n && ranks_above(self.heap[right], self.heap[left], nodes) {
                best = right;
            }
            if !ranks_above(self.heap[best], self.heap[pos], nodes) {
                break;
            }
            self.swap(pos, best);
            pos = best;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infos(ratings: &[i64]) -> Vec<NodeInfo> {
        ratings.iter().map(|&r| NodeInfo::with_rating(r)).collect()
    }

    #[test]
    fn test_remove_max_order_and_ties() {
        let nodes = infos(&[2, 5, 5, 1, 3]);
        let mut heap = RatingHeap::new(nodes.len());
        for i in [4, 3, 2, 1, 0] {
            heap.insert(i, &nodes);
        }
        assert_eq!(heap.len(), 5);

        let order: Vec<usize> = std::iter::from_fn(|| heap.remove_max(&nodes)).collect();
        assert_eq!(order, vec![1, 2, 4, 0, 3]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_remove_arbitrary_and_upheap() {
        let mut nodes = infos(&[4, 3, 2, 1, 0]);
        let mut heap = RatingHeap::new(nodes.len());
        for i in 0..nodes.len() {
            heap.insert(i, &nodes);
        }

        heap.remove(0, &nodes);
        assert!(!heap.contains(0));

        nodes[4].rating = 10;
        heap.upheap(4, &nodes);
        assert_eq!(heap.remove_max(&nodes), Some(4));
        assert_eq!(heap.remove_max(&nodes), Some(1));

        heap.reset();
        assert!(heap.is_empty());
        assert!(!heap.contains(2));
        assert_eq!(heap.remove_max(&nodes), None);
    }
}
