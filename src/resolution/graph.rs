//! Component dependency graph.
//!
//! Nodes are roster indices; an edge `A -> B` means A's formula reads B.

use std::collections::BTreeSet;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

#[derive(Debug)]
pub(crate) struct DependencyGraph {
    graph: DiGraph<usize, ()>,
}

impl DependencyGraph {
    /// Creates a graph with one node per roster entry.
    pub(crate) fn with_nodes(count: usize) -> Self {
        let mut graph = DiGraph::with_capacity(count, count);
        for index in 0..count {
            graph.add_node(index);
        }
        Self { graph }
    }

    /// Records that `dependent` reads `dependency`. Repeated edges collapse.
    pub(crate) fn add_dependency(&mut self, dependent: usize, dependency: usize) {
        self.graph
            .update_edge(NodeIndex::new(dependent), NodeIndex::new(dependency), ());
    }

    /// Direct dependencies of `node`, in roster order.
    pub(crate) fn dependencies(&self, node: usize) -> Vec<usize> {
        let mut deps: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(node), Direction::Outgoing)
            .map(|idx| self.graph[idx])
            .collect();
        deps.sort_unstable();
        deps
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Kahn's algorithm with ties broken by roster index.
    ///
    /// Returns the full order, or `Err` with the nodes left unordered when
    /// the graph has a cycle.
    pub(crate) fn stable_order(&self) -> Result<Vec<usize>, Vec<usize>> {
        let count = self.graph.node_count();
        let mut pending: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .count()
            })
            .collect();

        let mut ready: BTreeSet<usize> = (0..count).filter(|&node| pending[node] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for dependent in self
                .graph
                .neighbors_directed(NodeIndex::new(node), Direction::Incoming)
            {
                let dependent = self.graph[dependent];
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() == count {
            Ok(order)
        } else {
            let ordered: BTreeSet<usize> = order.into_iter().collect();
            Err((0..count).filter(|node| !ordered.contains(node)).collect())
        }
    }

    /// Every cycle in the graph, one entry per strongly connected component
    /// that contains a cycle. Members and cycles are in roster order.
    pub(crate) fn cycles(&self) -> Vec<Vec<usize>> {
        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|idx| self.graph[idx]).collect();
                members.sort_unstable();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }
}
