//! The overhang-tag graph.
//!
//! Vertices are distinct overhang values and every part is a directed edge
//! from its left overhang to its right overhang, weighted by the part's
//! position in the catalog. Parallel edges and self-loops are kept: two
//! parts with the same overhang pair are two distinct edges.

use std::collections::HashMap;

use bit_set::BitSet;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::{Bfs, EdgeFiltered, Reversed},
    Direction,
};

use crate::{
    catalog::{Catalog, PartIndex},
    part::Overhang,
};

pub(crate) type Index = u32;
pub(crate) type OGraph = DiGraph<Overhang, PartIndex, Index>;

/// Directed multigraph over overhang tags with parts as edges.
#[derive(Debug, Clone)]
pub struct OverhangGraph {
    graph: OGraph,
    nodes: HashMap<Overhang, NodeIndex<Index>>,
    // Outgoing parts of each node, in catalog order. petgraph iterates edges
    // newest-first, so this is materialized once at construction.
    outgoing: Vec<Vec<PartIndex>>,
}

impl OverhangGraph {
    /// Build the graph of every part in `catalog`.
    pub fn new(catalog: &Catalog) -> Self {
        let mut graph = OGraph::default();
        let mut nodes = HashMap::new();

        let mut node_for = |graph: &mut OGraph, tag: &Overhang| {
            *nodes
                .entry(tag.clone())
                .or_insert_with(|| graph.add_node(tag.clone()))
        };

        for (ix, part) in catalog.iter().enumerate() {
            let src = node_for(&mut graph, part.left_overhang());
            let dst = node_for(&mut graph, part.right_overhang());
            graph.add_edge(src, dst, ix);
        }

        let outgoing = graph
            .node_indices()
            .map(|n| {
                let mut parts: Vec<PartIndex> = graph
                    .edges_directed(n, Direction::Outgoing)
                    .map(|e| *e.weight())
                    .collect();
                parts.sort_unstable();
                parts
            })
            .collect();

        Self {
            graph,
            nodes,
            outgoing,
        }
    }

    /// Number of distinct overhang tags.
    pub fn tag_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of parts (edges), including parallel edges and self-loops.
    pub fn part_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_tag(&self, tag: &Overhang) -> bool {
        self.nodes.contains_key(tag)
    }

    /// Return the parts whose left overhang is `tag`, in catalog order.
    pub fn parts_from(&self, tag: &Overhang) -> &[PartIndex] {
        self.nodes
            .get(tag)
            .map(|n| self.outgoing[n.index()].as_slice())
            .unwrap_or(&[])
    }

    /// Return the set of parts from whose right overhang `end` can be reached
    /// by following zero or more edges, ignoring the no-reuse rule.
    ///
    /// A part outside this set can never be followed by a completed assembly,
    /// so the search skips it.
    pub fn parts_reaching(&self, end: &Overhang) -> BitSet {
        let mut tags = BitSet::with_capacity(self.graph.node_count());
        if let Some(&target) = self.nodes.get(end) {
            let reversed = Reversed(&self.graph);
            let mut bfs = Bfs::new(reversed, target);
            while let Some(n) = bfs.next(reversed) {
                tags.insert(n.index());
            }
        }

        let mut parts = BitSet::with_capacity(self.graph.edge_count());
        for e in self.graph.edge_indices() {
            if let Some((_, dst)) = self.graph.edge_endpoints(e) {
                if tags.contains(dst.index()) {
                    parts.insert(self.graph[e]);
                }
            }
        }
        parts
    }

    /// Return `true` iff `end` can be reached from `from` by following parts
    /// that are not in `avoid`. Each part is followed at most once, so a hit
    /// means a real path of distinct parts exists.
    pub fn reaches_avoiding(&self, from: &Overhang, end: &Overhang, avoid: &BitSet) -> bool {
        let (Some(&source), Some(&target)) = (self.nodes.get(from), self.nodes.get(end)) else {
            return false;
        };
        let unused = EdgeFiltered::from_fn(&self.graph, |e| !avoid.contains(*e.weight()));
        let mut bfs = Bfs::new(&unused, source);
        while let Some(n) = bfs.next(&unused) {
            if n == target {
                return true;
            }
        }
        false
    }
}
