//! Periodic k-d tree used as the bucket layer of the spatial index.
//!
//! Points are split at the median of the widest axis of their bounding box
//! until a node holds at most [`LEAF_CAPACITY`] points. Depth therefore stays
//! logarithmic in the point count however clustered the catalog is.
//!
//! Boxes live in wrapped coordinates `[0, L)^D`. The gap between a query and a
//! box is measured per axis with the minimum-image convention, using the same
//! [`PeriodicBox::wrap_delta`] arithmetic as point distances, so the gap never
//! exceeds the computed distance to any point inside the box.

use super::SmallBuffer;
use crate::geometry::periodic_box::PeriodicBox;
use std::cmp::Ordering;

/// Largest number of points stored in a leaf.
pub(in crate::core) const LEAF_CAPACITY: usize = 8;

/// Inline capacity of the candidate list; covers the `k = 2` pairing query.
pub(in crate::core) const NEAREST_INLINE_CAPACITY: usize = 4;

/// Candidate kept while a k-nearest search is running.
#[derive(Clone, Copy, Debug)]
pub(in crate::core) struct Candidate {
    pub(in crate::core) distance_squared: f64,
    pub(in crate::core) index: usize,
}

impl Candidate {
    /// Ascending by distance, ties broken by lowest index.
    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.distance_squared
            .total_cmp(&other.distance_squared)
            .then_with(|| self.index.cmp(&other.index))
    }
}

pub(in crate::core) type Candidates = SmallBuffer<Candidate, NEAREST_INLINE_CAPACITY>;

#[derive(Clone, Debug)]
struct Node<const D: usize> {
    lower: [f64; D],
    upper: [f64; D],
    /// The node owns `order[start..end]`.
    start: usize,
    end: usize,
    /// Smallest point index below this node.
    min_index: usize,
    children: Option<(usize, usize)>,
}

/// Bounded nearest-neighbour search state.
struct NearestSearch<'q, const D: usize> {
    query: &'q [f64; D],
    k: usize,
    bound_squared: Option<f64>,
    best: Candidates,
}

impl<const D: usize> NearestSearch<'_, D> {
    /// Whether no point of `node`, whose gap to the query is `gap`, can enter the result.
    fn excludes(&self, node: &Node<D>, gap: f64) -> bool {
        if self.bound_squared.is_some_and(|b| gap > b) {
            return true;
        }
        if self.best.len() < self.k {
            return false;
        }
        self.best
            .last()
            .is_some_and(|worst| match gap.total_cmp(&worst.distance_squared) {
                Ordering::Greater => true,
                Ordering::Equal => node.min_index > worst.index,
                Ordering::Less => false,
            })
    }

    fn offer(&mut self, candidate: Candidate) {
        if self.bound_squared.is_some_and(|b| candidate.distance_squared > b) {
            return;
        }
        if self.best.len() == self.k
            && self
                .best
                .last()
                .is_some_and(|worst| candidate.cmp_rank(worst) != Ordering::Less)
        {
            return;
        }
        let slot = self
            .best
            .partition_point(|kept| kept.cmp_rank(&candidate) == Ordering::Less);
        self.best.insert(slot, candidate);
        if self.best.len() > self.k {
            self.best.pop();
        }
    }
}

/// Immutable k-d tree over wrapped positions in a periodic box.
#[derive(Clone, Debug)]
pub(in crate::core) struct PeriodicKdTree<const D: usize> {
    domain: PeriodicBox<D>,
    positions: Vec<[f64; D]>,
    order: Vec<usize>,
    nodes: Vec<Node<D>>,
}

impl<const D: usize> PeriodicKdTree<D> {
    /// Builds the tree. `positions` must already lie in `[0, L)^D`.
    pub(in crate::core) fn build(domain: PeriodicBox<D>, positions: Vec<[f64; D]>) -> Self {
        let n = positions.len();
        let mut tree = Self {
            domain,
            positions,
            order: (0..n).collect(),
            nodes: Vec::with_capacity(2 * n.div_ceil(LEAF_CAPACITY)),
        };
        if n > 0 {
            tree.build_node(0, n);
        }
        tree
    }

    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let members = &self.order[start..end];
        let (lower, upper) = bounding_box(&self.positions, members);
        let min_index = members.iter().copied().min().unwrap_or(usize::MAX);
        let id = self.nodes.len();
        self.nodes.push(Node {
            lower,
            upper,
            start,
            end,
            min_index,
            children: None,
        });
        if end - start <= LEAF_CAPACITY {
            return id;
        }

        let axis = widest_axis(&lower, &upper);
        let mid = (end - start) / 2;
        let positions = &self.positions;
        // Index breaks coordinate ties so duplicates split by index as well.
        self.order[start..end].select_nth_unstable_by(mid, |&a, &b| {
            positions[a][axis]
                .total_cmp(&positions[b][axis])
                .then_with(|| a.cmp(&b))
        });
        let left = self.build_node(start, start + mid);
        let right = self.build_node(start + mid, end);
        self.nodes[id].children = Some((left, right));
        id
    }

    pub(in crate::core) fn len(&self) -> usize {
        self.positions.len()
    }

    pub(in crate::core) fn position(&self, index: usize) -> Option<&[f64; D]> {
        self.positions.get(index)
    }

    pub(in crate::core) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes on the longest root-to-leaf path; `0` when empty.
    pub(in crate::core) fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: SmallBuffer<(usize, usize), 64> = SmallBuffer::new();
        if !self.nodes.is_empty() {
            stack.push((0, 1));
        }
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let Some((left, right)) = self.nodes[id].children {
                stack.push((left, level + 1));
                stack.push((right, level + 1));
            }
        }
        deepest
    }

    /// Up to `k` points nearest to `query`, ascending by `(distance, index)`,
    /// skipping points whose squared distance exceeds `bound_squared`.
    /// `query` must already lie in `[0, L)^D`.
    pub(in crate::core) fn nearest(
        &self,
        query: &[f64; D],
        k: usize,
        bound_squared: Option<f64>,
    ) -> Candidates {
        let mut search = NearestSearch {
            query,
            k,
            bound_squared,
            best: Candidates::new(),
        };
        if k > 0 && !self.nodes.is_empty() {
            let gap = self.gap_squared(&self.nodes[0], query);
            if !search.excludes(&self.nodes[0], gap) {
                self.search_nearest(0, &mut search);
            }
        }
        search.best
    }

    fn search_nearest(&self, id: usize, search: &mut NearestSearch<'_, D>) {
        let node = &self.nodes[id];
        let Some((left, right)) = node.children else {
            for &index in &self.order[node.start..node.end] {
                search.offer(Candidate {
                    distance_squared: self
                        .domain
                        .distance_squared(search.query, &self.positions[index]),
                    index,
                });
            }
            return;
        };

        let left_gap = self.gap_squared(&self.nodes[left], search.query);
        let right_gap = self.gap_squared(&self.nodes[right], search.query);
        let visits = if right_gap < left_gap {
            [(right, right_gap), (left, left_gap)]
        } else {
            [(left, left_gap), (right, right_gap)]
        };
        for (child, gap) in visits {
            // Re-checked per child: the first visit may have tightened the worst candidate.
            if !search.excludes(&self.nodes[child], gap) {
                self.search_nearest(child, search);
            }
        }
    }

    /// Calls `f(index, distance)` for every point within `radius` of `query`
    /// until `f` returns `false`. `query` must already lie in `[0, L)^D`.
    ///
    /// Returns `false` if the visitor stopped the walk early.
    pub(in crate::core) fn visit_within<F>(&self, query: &[f64; D], radius: f64, f: &mut F) -> bool
    where
        F: FnMut(usize, f64) -> bool,
    {
        if self.nodes.is_empty() {
            return true;
        }
        self.visit_node(0, query, radius, f)
    }

    fn visit_node<F>(&self, id: usize, query: &[f64; D], radius: f64, f: &mut F) -> bool
    where
        F: FnMut(usize, f64) -> bool,
    {
        let node = &self.nodes[id];
        if self.gap_squared(node, query).sqrt() > radius {
            return true;
        }
        match node.children {
            Some((left, right)) => {
                self.visit_node(left, query, radius, f) && self.visit_node(right, query, radius, f)
            }
            None => {
                for &index in &self.order[node.start..node.end] {
                    let distance = self.domain.distance(query, &self.positions[index]);
                    if distance <= radius && !f(index, distance) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Squared minimum-image gap between `query` and the box of `node`.
    fn gap_squared(&self, node: &Node<D>, query: &[f64; D]) -> f64 {
        let mut gaps = [0.0; D];
        for (axis, gap) in gaps.iter_mut().enumerate() {
            let q = query[axis];
            if q < node.lower[axis] || q > node.upper[axis] {
                let to_lower = self.domain.wrap_delta(node.lower[axis] - q).abs();
                let to_upper = self.domain.wrap_delta(node.upper[axis] - q).abs();
                *gap = to_lower.min(to_upper);
            }
        }
        gaps.iter().map(|g| g * g).sum()
    }
}

fn bounding_box<const D: usize>(positions: &[[f64; D]], members: &[usize]) -> ([f64; D], [f64; D]) {
    let mut lower = [f64::INFINITY; D];
    let mut upper = [f64::NEG_INFINITY; D];
    for &index in members {
        for (axis, &coord) in positions[index].iter().enumerate() {
            lower[axis] = lower[axis].min(coord);
            upper[axis] = upper[axis].max(coord);
        }
    }
    (lower, upper)
}

fn widest_axis<const D: usize>(lower: &[f64; D], upper: &[f64; D]) -> usize {
    (0..D)
        .max_by(|&a, &b| (upper[a] - lower[a]).total_cmp(&(upper[b] - lower[b])))
        .unwrap_or(0)
}
