use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;
use znayu_protocol::ThemeLink;

/// Undirected graph of semantic themes. An edge means the two themes may be
/// combined in one sentence (e.g. `location` and `building`).
#[derive(Debug, Clone, Default)]
pub struct ThemeGraph {
    graph: UnGraph<String, ()>,
    index_map: HashMap<String, NodeIndex>,
}

impl ThemeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_links(links: &[ThemeLink]) -> Self {
        let mut graph = Self::new();
        for link in links {
            graph.add_link(&link.a, &link.b);
        }
        graph
    }

    pub fn add_theme(&mut self, theme: &str) -> NodeIndex {
        if let Some(idx) = self.index_map.get(theme) {
            return *idx;
        }
        let idx = self.graph.add_node(theme.to_string());
        self.index_map.insert(theme.to_string(), idx);
        idx
    }

    pub fn add_link(&mut self, a: &str, b: &str) {
        let a_idx = self.add_theme(a);
        let b_idx = self.add_theme(b);
        if self.graph.find_edge(a_idx, b_idx).is_none() {
            self.graph.add_edge(a_idx, b_idx, ());
        }
    }

    /// Equal themes, or themes joined by a declared link. Links are not transitive.
    pub fn are_compatible(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match (self.index_map.get(a), self.index_map.get(b)) {
            (Some(a_idx), Some(b_idx)) => self.graph.contains_edge(*a_idx, *b_idx),
            _ => false,
        }
    }

    pub fn neighbours(&self, theme: &str) -> Vec<&str> {
        let Some(idx) = self.index_map.get(theme) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors(*idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn theme_count(&self) -> usize {
        self.graph.node_count()
    }
}
