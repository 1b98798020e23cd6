//! Enumerate every assembly of catalog parts between two overhangs.
//!
//! An assembly is a simple path through the [`OverhangGraph`]: it starts with
//! a part whose left overhang is the query's start tag, chains each part's
//! right overhang into the next part's left overhang, never reuses a part,
//! and ends on the first part whose right overhang is the query's end tag.
//! Reaching the end tag closes the assembly, so under the default
//! [`EndPolicy::StopAtFirstMatch`] a path is never extended past that point.
//!
//! Candidates are tried in catalog order and paths are reported in
//! depth-first pre-order, so a fixed catalog always produces the same
//! sequence of assemblies regardless of [`SearchMode`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use bit_set::BitSet;
use clap::ValueEnum;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    assembly::{sort_by_length, Assembly},
    catalog::{Catalog, PartIndex},
    graph::OverhangGraph,
    part::{Overhang, PartError},
};

/// Strategy for walking the overhang graph. Both strategies build paths
/// immutably and produce identical output in identical order.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum SearchMode {
    /// Recurse on an extended copy of the current path.
    #[default]
    Recursive,
    /// Walk an explicit stack over an arena of parent-linked path nodes.
    ///
    /// The arena keeps every explored node until the search returns, so
    /// memory grows with the size of the search tree rather than with the
    /// depth of the longest path.
    Iterative,
}

/// What happens when a path reaches the end overhang.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum EndPolicy {
    /// Record the path and stop extending it. The end overhang closes the
    /// assembly, so no part ending on it is ever used as an inner link.
    #[default]
    StopAtFirstMatch,
    /// Record the path and keep extending it, so longer assemblies that pass
    /// through the end overhang are reported as well.
    AllowPassThrough,
}

/// A start/end overhang pair to search between.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub start: Overhang,
    pub end: Overhang,
}

impl Query {
    pub fn new(start: Overhang, end: Overhang) -> Self {
        Self { start, end }
    }

    /// Parse both tags, failing on the first malformed one.
    pub fn parse(start: &str, end: &str) -> Result<Self, PartError> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
        })
    }
}

/// The guard that cut a search short.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Limit {
    /// An extension past this many parts was pruned.
    MaxLength(usize),
    /// More than this many assemblies exist.
    MaxResults(usize),
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Limit::MaxLength(n) => write!(f, "maximum assembly length {n}"),
            Limit::MaxResults(n) => write!(f, "maximum result count {n}"),
        }
    }
}

/// Thrown when a search does not run to completion. An empty result is not
/// an error; callers only see this when the result would be incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search truncated by {limit} after {} assemblies", .partial.len())]
    Truncated {
        limit: Limit,
        partial: Vec<Assembly>,
    },

    #[error("search cancelled")]
    Cancelled,
}

/// Knobs for a single search.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub policy: EndPolicy,
    pub max_length: Option<usize>,
    pub max_results: Option<usize>,
    /// Stable-sort results by ascending length before returning them.
    pub sort_by_length: bool,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SearchConfig {
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: EndPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn sorted(mut self) -> Self {
        self.sort_by_length = true;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Return every assembly from `start` to `end`, in depth-first discovery
/// order, with the default configuration.
pub fn enumerate(
    catalog: &Catalog,
    start: &Overhang,
    end: &Overhang,
) -> Result<Vec<Assembly>, SearchError> {
    let query = Query::new(start.clone(), end.clone());
    enumerate_with(catalog, &query, &SearchConfig::default())
}

/// Return every assembly matching `query` under `config`.
pub fn enumerate_with(
    catalog: &Catalog,
    query: &Query,
    config: &SearchConfig,
) -> Result<Vec<Assembly>, SearchError> {
    let graph = OverhangGraph::new(catalog);
    search_graph(catalog, &graph, query, config)
}

/// Run independent queries against one catalog in parallel. Results are in
/// the same order as `queries`.
pub fn enumerate_batch(
    catalog: &Catalog,
    queries: &[Query],
    config: &SearchConfig,
) -> Vec<Result<Vec<Assembly>, SearchError>> {
    let graph = OverhangGraph::new(catalog);
    queries
        .par_iter()
        .map(|query| search_graph(catalog, &graph, query, config))
        .collect()
}

fn search_graph(
    catalog: &Catalog,
    graph: &OverhangGraph,
    query: &Query,
    config: &SearchConfig,
) -> Result<Vec<Assembly>, SearchError> {
    debug!(
        start = %query.start,
        end = %query.end,
        parts = catalog.len(),
        tags = graph.tag_count(),
        mode = ?config.mode,
        policy = ?config.policy,
        "enumerating assemblies"
    );

    let mut search = Search {
        catalog,
        graph,
        query,
        config,
        reaching: graph.parts_reaching(&query.end),
        results: Vec::new(),
        pruned: None,
    };

    let outcome = match config.mode {
        SearchMode::Recursive => search.recurse(&[], &BitSet::with_capacity(catalog.len())),
        SearchMode::Iterative => search.iterate(),
    };

    let Search {
        mut results,
        pruned,
        ..
    } = search;
    if config.sort_by_length {
        sort_by_length(&mut results);
    }

    match (outcome, pruned) {
        (Err(Abort::Cancelled), _) => {
            debug!(found = results.len(), "search cancelled");
            Err(SearchError::Cancelled)
        }
        (Err(Abort::Limit(limit)), _) | (Ok(()), Some(limit)) => {
            warn!(%limit, found = results.len(), "search truncated");
            Err(SearchError::Truncated {
                limit,
                partial: results,
            })
        }
        (Ok(()), None) => {
            debug!(found = results.len(), "search finished");
            Ok(results)
        }
    }
}

/// Reasons to unwind the whole search immediately.
enum Abort {
    Cancelled,
    Limit(Limit),
}

/// State shared by every step of one search.
struct Search<'a> {
    catalog: &'a Catalog,
    graph: &'a OverhangGraph,
    query: &'a Query,
    config: &'a SearchConfig,
    // Parts after which the end tag is still reachable.
    reaching: BitSet,
    results: Vec<Assembly>,
    // Set when `max_length` pruned a live extension.
    pruned: Option<Limit>,
}

impl<'a> Search<'a> {
    /// Return `true` iff `path` ends on the end overhang.
    fn is_terminal(&self, path_end: Option<PartIndex>) -> bool {
        path_end.is_some_and(|ix| self.catalog[ix].right_overhang() == &self.query.end)
    }

    /// The overhang the next part must start with.
    fn next_tag(&self, path_end: Option<PartIndex>) -> &'a Overhang {
        let (catalog, query) = (self.catalog, self.query);
        match path_end {
            None => &query.start,
            Some(ix) => catalog[ix].right_overhang(),
        }
    }

    /// Collect a completed path.
    fn record(&mut self, path: Vec<PartIndex>) -> Result<(), Abort> {
        if let Some(max) = self.config.max_results {
            if self.results.len() >= max {
                return Err(Abort::Limit(Limit::MaxResults(max)));
            }
        }
        self.results.push(Assembly::new(path));
        Ok(())
    }

    /// Decide whether `part` may extend a path of `len` parts that already
    /// uses `used`. Checked once per extension.
    fn admit(&mut self, part: PartIndex, len: usize, used: &BitSet) -> Result<bool, Abort> {
        if used.contains(part) || !self.reaching.contains(part) {
            return Ok(false);
        }
        if let Some(cancel) = &self.config.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(Abort::Cancelled);
            }
        }
        if let Some(max) = self.config.max_length {
            if len + 1 > max {
                // Only flag the cut if `part` could still have led to the end
                // tag without reusing anything already on the path.
                let mut avoid = used.clone();
                avoid.insert(part);
                let from = self.catalog[part].right_overhang();
                if self.graph.reaches_avoiding(from, &self.query.end, &avoid) {
                    self.pruned = Some(Limit::MaxLength(max));
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Recursive walk: every child call receives its own extended copy of
    /// the path and of the used-part set.
    fn recurse(&mut self, path: &[PartIndex], used: &BitSet) -> Result<(), Abort> {
        // A path that reaches the end tag is complete.
        let last = path.last().copied();
        if self.is_terminal(last) {
            self.record(path.to_vec())?;
            if self.config.policy == EndPolicy::StopAtFirstMatch {
                return Ok(());
            }
        }

        let graph = self.graph;
        for &part in graph.parts_from(self.next_tag(last)) {
            if !self.admit(part, path.len(), used)? {
                continue;
            }

            let mut next_path = Vec::with_capacity(path.len() + 1);
            next_path.extend_from_slice(path);
            next_path.push(part);

            let mut next_used = used.clone();
            next_used.insert(part);

            self.recurse(&next_path, &next_used)?;
        }

        Ok(())
    }

    /// Like recurse, but runs iteratively over a [`PathArena`].
    fn iterate(&mut self) -> Result<(), Abort> {
        let mut arena = PathArena::default();

        // Do the usual trick of transforming recursive algorithms into
        // iterative ones by maintaining a stack of instances. Children are
        // pushed in reverse catalog order so they pop in catalog order.
        let mut stack: Vec<(Option<usize>, BitSet)> =
            vec![(None, BitSet::with_capacity(self.catalog.len()))];
        let mut children = Vec::new();

        while let Some((node, used)) = stack.pop() {
            let last = node.map(|n| arena.part(n));
            if self.is_terminal(last) {
                self.record(arena.path(node))?;
                if self.config.policy == EndPolicy::StopAtFirstMatch {
                    continue;
                }
            }

            let len = arena.len_of(node);
            let graph = self.graph;
            children.clear();
            for &part in graph.parts_from(self.next_tag(last)) {
                if self.admit(part, len, &used)? {
                    children.push(part);
                }
            }

            for &part in children.iter().rev() {
                let child = arena.push(part, node);
                let mut next_used = used.clone();
                next_used.insert(part);
                stack.push((Some(child), next_used));
            }
        }

        Ok(())
    }
}

/// A node in a [`PathArena`]: the last part of a path plus a link to the
/// node holding the rest of it.
#[derive(Debug, Clone, Copy)]
struct PathNode {
    part: PartIndex,
    parent: Option<usize>,
    len: usize,
}

/// Append-only storage of paths sharing common prefixes. Nodes are never
/// modified after insertion.
#[derive(Debug, Default)]
struct PathArena {
    nodes: Vec<PathNode>,
}

impl PathArena {
    fn push(&mut self, part: PartIndex, parent: Option<usize>) -> usize {
        let len = self.len_of(parent) + 1;
        self.nodes.push(PathNode { part, parent, len });
        self.nodes.len() - 1
    }

    fn part(&self, node: usize) -> PartIndex {
        self.nodes[node].part
    }

    fn len_of(&self, node: Option<usize>) -> usize {
        node.map_or(0, |n| self.nodes[n].len)
    }

    /// Materialize the path ending at `node`, first part first.
    fn path(&self, node: Option<usize>) -> Vec<PartIndex> {
        let mut path = Vec::with_capacity(self.len_of(node));
        let mut cursor = node;
        while let Some(n) = cursor {
            path.push(self.nodes[n].part);
            cursor = self.nodes[n].parent;
        }
        path.reverse();
        path
    }
}
