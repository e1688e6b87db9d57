//! Node and graph primitive shared by the provenance and connectivity graphs.
//!
//! Nodes never own each other. A [`Graph`] owns every [`Node`] and relations
//! are stored as identifier keys, so dropping a graph needs no ordering.

use crate::error::{Error, Result};
use crate::identifier::Identifier;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relation kind carried by a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GraphKind {
    /// Directed parent -> child, "gave rise to". Kept acyclic.
    Provenance,
    /// Undirected "linked within tolerance". May contain cycles.
    Connectivity,
}

/// Direction followed by [`Graph::breadth_first_search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Traversal {
    /// Follow parent -> child edges.
    Children,
    /// Follow child -> parent edges.
    Parents,
    /// Follow every relation regardless of direction.
    Undirected,
}

/// A vertex holding one identifier and its relations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    value: Identifier,
    children: BTreeSet<Identifier>,
    parents: BTreeSet<Identifier>,
    links: BTreeSet<Identifier>,
}

impl Node {
    /// Creates an unrelated node.
    #[must_use]
    pub fn new(value: Identifier) -> Self {
        Self {
            value,
            children: BTreeSet::new(),
            parents: BTreeSet::new(),
            links: BTreeSet::new(),
        }
    }

    /// Returns the identifier held by this node.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Identifier {
        self.value
    }

    /// Direct provenance children.
    pub fn children(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.children.iter().copied()
    }

    /// Direct provenance parents.
    pub fn parents(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.parents.iter().copied()
    }

    /// Undirected connectivity neighbours.
    pub fn links(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.links.iter().copied()
    }

    fn neighbours(&self, mode: Traversal) -> Vec<Identifier> {
        match mode {
            Traversal::Children => self.children.iter().copied().collect(),
            Traversal::Parents => self.parents.iter().copied().collect(),
            Traversal::Undirected => {
                let all: BTreeSet<Identifier> = self
                    .children
                    .iter()
                    .chain(&self.parents)
                    .chain(&self.links)
                    .copied()
                    .collect();
                all.into_iter().collect()
            }
        }
    }
}

/// Collection of nodes keyed by identifier, all sharing one relation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Graph {
    kind: GraphKind,
    nodes: BTreeMap<Identifier, Node>,
}

impl Graph {
    /// Creates an empty graph of the given kind.
    #[must_use]
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            nodes: BTreeMap::new(),
        }
    }

    /// Creates an empty directed provenance graph.
    #[must_use]
    pub fn provenance() -> Self {
        Self::new(GraphKind::Provenance)
    }

    /// Creates an empty undirected connectivity graph.
    #[must_use]
    pub fn connectivity() -> Self {
        Self::new(GraphKind::Connectivity)
    }

    /// Returns the relation kind of this graph.
    #[must_use]
    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if a node exists for `value`.
    #[must_use]
    pub fn contains(&self, value: Identifier) -> bool {
        self.nodes.contains_key(&value)
    }

    /// Inserts a node for `value`. Returns false if it already existed.
    pub fn add_node(&mut self, value: Identifier) -> bool {
        if self.nodes.contains_key(&value) {
            return false;
        }
        self.nodes.insert(value, Node::new(value));
        true
    }

    /// Looks up the node for `value`.
    #[must_use]
    pub fn node(&self, value: Identifier) -> Option<&Node> {
        self.nodes.get(&value)
    }

    /// Iterates over all nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    fn require(&self, value: Identifier) -> Result<&Node> {
        self.nodes
            .get(&value)
            .ok_or(Error::UnknownIdentifier(value))
    }

    fn require_kind(&self, kind: GraphKind, operation: &'static str) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(Error::WrongGraphKind {
                operation,
                kind: self.kind,
            })
        }
    }

    /// Adds a directed provenance edge `parent -> child`.
    ///
    /// Both nodes must exist. Rejects self-loops and any edge that would
    /// close a cycle.
    pub fn add_child(&mut self, parent: Identifier, child: Identifier) -> Result<()> {
        self.require_kind(GraphKind::Provenance, "add_child")?;
        if parent == child {
            return Err(Error::SelfLink(parent));
        }
        self.require(parent)?;
        self.require(child)?;
        if self
            .breadth_first_search(child, Traversal::Children)?
            .contains(&parent)
        {
            return Err(Error::CycleDetected { parent, child });
        }

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parents.insert(parent);
        }
        Ok(())
    }

    /// Adds a mutual undirected connectivity edge between `a` and `b`.
    pub fn link(&mut self, a: Identifier, b: Identifier) -> Result<()> {
        self.require_kind(GraphKind::Connectivity, "link")?;
        if a == b {
            return Err(Error::SelfLink(a));
        }
        self.require(a)?;
        self.require(b)?;

        if let Some(node) = self.nodes.get_mut(&a) {
            node.links.insert(b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.links.insert(a);
        }
        Ok(())
    }

    /// Removes the undirected edge between `a` and `b`. Returns whether it existed.
    pub fn unlink(&mut self, a: Identifier, b: Identifier) -> Result<bool> {
        self.require_kind(GraphKind::Connectivity, "unlink")?;
        self.require(a)?;
        self.require(b)?;

        let mut removed = false;
        if let Some(node) = self.nodes.get_mut(&a) {
            removed |= node.links.remove(&b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            removed |= node.links.remove(&a);
        }
        Ok(removed)
    }

    /// Breadth-first traversal from `start`.
    ///
    /// Returns every reachable identifier exactly once, `start` first, in
    /// breadth-first order. Neighbours are expanded in identifier order, so
    /// the result is deterministic.
    pub fn breadth_first_search(&self, start: Identifier, mode: Traversal) -> Result<Vec<Identifier>> {
        self.require(start)?;

        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut order = Vec::new();

        while let Some(current) = queue.pop_front() {
            order.push(current);
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for next in node.neighbours(mode) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        Ok(order)
    }

    /// Undirected component containing `start`.
    pub fn flood_fill(&self, start: Identifier) -> Result<BTreeSet<Identifier>> {
        Ok(self
            .breadth_first_search(start, Traversal::Undirected)?
            .into_iter()
            .collect())
    }

    /// All undirected components, seeded from unvisited nodes in identifier order.
    #[must_use]
    pub fn connected_components(&self) -> Vec<BTreeSet<Identifier>> {
        let mut visited = BTreeSet::new();
        let mut components = Vec::new();

        for &seed in self.nodes.keys() {
            if visited.contains(&seed) {
                continue;
            }
            // seed comes from our own key set, so the lookup cannot fail
            if let Ok(component) = self.flood_fill(seed) {
                visited.extend(component.iter().copied());
                components.push(component);
            }
        }

        components
    }

    /// True if the directed child relation contains a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        let mut in_degree: BTreeMap<Identifier, usize> = self
            .nodes
            .iter()
            .map(|(id, node)| (*id, node.parents.len()))
            .collect();
        let mut ready: VecDeque<Identifier> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut removed = 0;

        while let Some(id) = ready.pop_front() {
            removed += 1;
            for child in &self.nodes[&id].children {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(*child);
                    }
                }
            }
        }

        removed != self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{Category, IdentifierRegistry, Subtype};

    fn ids(registry: &IdentifierRegistry, n: usize) -> Vec<Identifier> {
        (0..n)
            .map(|_| registry.make_id(Category::Track, Subtype::Detector).unwrap())
            .collect()
    }

    fn provenance_with(values: &[Identifier]) -> Graph {
        let mut graph = Graph::provenance();
        for &v in values {
            graph.add_node(v);
        }
        graph
    }

    #[test]
    fn test_add_child_sets_both_directions() {
        let registry = IdentifierRegistry::new();
        let v = ids(&registry, 2);
        let mut graph = provenance_with(&v);
        graph.add_child(v[0], v[1]).unwrap();

        assert_eq!(graph.node(v[0]).unwrap().children().collect::<Vec<_>>(), vec![v[1]]);
        assert_eq!(graph.node(v[1]).unwrap().parents().collect::<Vec<_>>(), vec![v[0]]);
    }

    #[test]
    fn test_add_child_rejects_cycle() {
        let registry = IdentifierRegistry::new();
        let v = ids(&registry, 3);
        let mut graph = provenance_with(&v);
        graph.add_child(v[0], v[1]).unwrap();
        graph.add_child(v[1], v[2]).unwrap();

        assert_eq!(
            graph.add_child(v[2], v[0]),
            Err(Error::CycleDetected {
                parent: v[2],
                child: v[0]
            })
        );
        assert_eq!(graph.add_child(v[1], v[1]), Err(Error::SelfLink(v[1])));
        assert!(!graph.has_cycle());
    }

    #[test]
    fn test_relations_respect_graph_kind() {
        let registry = IdentifierRegistry::new();
        let v = ids(&registry, 2);
        let mut graph = provenance_with(&v);
        assert!(matches!(
            graph.link(v[0], v[1]),
            Err(Error::WrongGraphKind { .. })
        ));

        let mut links = Graph::connectivity();
        links.add_node(v[0]);
        links.add_node(v[1]);
        assert!(matches!(
            links.add_child(v[0], v[1]),
            Err(Error::WrongGraphKind { .. })
        ));
    }

    #[test]
    fn test_bfs_modes() {
        // a -> b -> d, a -> c
        let registry = IdentifierRegistry::new();
        let v = ids(&registry, 4);
        let (a, b, c, d) = (v[0], v[1], v[2], v[3]);
        let mut graph = provenance_with(&v);
        graph.add_child(a, b).unwrap();
        graph.add_child(a, c).unwrap();
        graph.add_child(b, d).unwrap();

        assert_eq!(
            graph.breadth_first_search(a, Traversal::Children).unwrap(),
            vec![a, b, c, d]
        );
        assert_eq!(
            graph.breadth_first_search(d, Traversal::Parents).unwrap(),
            vec![d, b, a]
        );
        assert_eq!(
            graph.breadth_first_search(c, Traversal::Undirected).unwrap(),
            vec![c, a, b, d]
        );
    }

    #[test]
    fn test_bfs_terminates_on_cycles() {
        let registry = IdentifierRegistry::new();
        let v = ids(&registry, 3);
        let mut graph = Graph::connectivity();
        for &id in &v {
            graph.add_node(id);
        }
        graph.link(v[0], v[1]).unwrap();
        graph.link(v[1], v[2]).unwrap();
        graph.link(v[2], v[0]).unwrap();

        let order = graph.breadth_first_search(v[1], Traversal::Undirected).unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(graph.flood_fill(v[0]).unwrap().len(), 3);
    }

    #[test]
    fn test_connected_components_and_unlink() {
        let registry = IdentifierRegistry::new();
        let v = ids(&registry, 5);
        let mut graph = Graph::connectivity();
        for &id in &v {
            graph.add_node(id);
        }
        graph.link(v[0], v[1]).unwrap();
        graph.link(v[2], v[3]).unwrap();

        let components = graph.connected_components();
        assert_eq!(components.len(), 3);
        assert_eq!(components[0], BTreeSet::from([v[0], v[1]]));
        assert_eq!(components[2], BTreeSet::from([v[4]]));

        assert!(graph.unlink(v[0], v[1]).unwrap());
        assert!(!graph.unlink(v[0], v[1]).unwrap());
        assert_eq!(graph.connected_components().len(), 4);
    }

    #[test]
    fn test_unknown_start() {
        let registry = IdentifierRegistry::new();
        let v = ids(&registry, 1);
        let graph = Graph::provenance();
        assert_eq!(
            graph.breadth_first_search(v[0], Traversal::Children),
            Err(Error::UnknownIdentifier(v[0]))
        );
    }
}
