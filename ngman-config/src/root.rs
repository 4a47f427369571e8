//! Top-level directive collection
//!
//! Top-level directives are kept as an ordered sequence rather than a map
//! keyed by name. Two directives with the same name (two `server` blocks,
//! two `include` lines) both survive, and file order is the save order.
//! [`RootDirectives::to_name_map`] offers the name-keyed view for callers
//! that want one; it keeps only the last directive of each name.

use crate::node::DirectiveNode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered top-level directives of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootDirectives {
    nodes: Vec<DirectiveNode>,
}

impl RootDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirectiveNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DirectiveNode> {
        self.nodes.iter_mut()
    }

    pub fn as_slice(&self) -> &[DirectiveNode] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<DirectiveNode> {
        self.nodes
    }

    /// First top-level directive with the given name
    pub fn get(&self, name: &str) -> Option<&DirectiveNode> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DirectiveNode> {
        self.nodes.iter_mut().find(|n| n.name() == name)
    }

    /// Every top-level directive with the given name, in file order
    pub fn get_all<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a DirectiveNode> + use<'a, 'n> {
        self.nodes.iter().filter(move |n| n.name() == name)
    }

    pub fn push(&mut self, node: DirectiveNode) {
        self.nodes.push(node);
    }

    /// Insert at `index`, clamped to the end
    pub fn insert(&mut self, index: usize, node: DirectiveNode) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
    }

    /// Remove every top-level directive with the given name
    pub fn remove_all(&mut self, name: &str) -> Vec<DirectiveNode> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| n.name() == name);
        self.nodes = kept;
        removed
    }

    pub fn retain(&mut self, f: impl FnMut(&DirectiveNode) -> bool) {
        self.nodes.retain(f);
    }

    /// Name-keyed view. Duplicate names collapse: the last directive with a
    /// given name wins, earlier ones are not reachable through the map.
    pub fn to_name_map(&self) -> HashMap<&str, &DirectiveNode> {
        self.nodes.iter().map(|n| (n.name(), n)).collect()
    }

    // ========================================
    // Paths
    // ========================================

    /// Resolve a slash separated path such as `http/server[1]/listen`.
    ///
    /// `[n]` picks the n-th (0-based) directive of that name among its
    /// siblings; without it the first one is used.
    pub fn select(&self, path: &str) -> Option<&DirectiveNode> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let (name, index) = parse_segment(segments.next()?)?;
        let mut node = self.nodes.iter().filter(|n| n.name() == name).nth(index)?;

        for segment in segments {
            let (name, index) = parse_segment(segment)?;
            node = node.find_all(name).nth(index)?;
        }
        Some(node)
    }

    pub fn select_mut(&mut self, path: &str) -> Option<&mut DirectiveNode> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let (name, index) = parse_segment(segments.next()?)?;
        let mut node = self.nodes.iter_mut().filter(|n| n.name() == name).nth(index)?;

        for segment in segments {
            let (name, index) = parse_segment(segment)?;
            node = node
                .children_mut()?
                .iter_mut()
                .filter(|n| n.name() == name)
                .nth(index)?;
        }
        Some(node)
    }
}

/// `server[2]` -> `("server", 2)`, `listen` -> `("listen", 0)`
fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    match segment.strip_suffix(']') {
        Some(rest) => {
            let (name, index) = rest.split_once('[')?;
            Some((name, index.parse().ok()?))
        }
        None => Some((segment, 0)),
    }
}

impl From<Vec<DirectiveNode>> for RootDirectives {
    fn from(nodes: Vec<DirectiveNode>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<DirectiveNode> for RootDirectives {
    fn from_iter<I: IntoIterator<Item = DirectiveNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RootDirectives {
    type Item = &'a DirectiveNode;
    type IntoIter = std::slice::Iter<'a, DirectiveNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl IntoIterator for RootDirectives {
    type Item = DirectiveNode;
    type IntoIter = std::vec::IntoIter<DirectiveNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
