//! Prerequisite graph for the chapters of one book
//!
//! Keeps prerequisite edges as a set, rejects self-loops and cycles, and
//! produces a reading order. Uses petgraph for graph operations.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding prerequisite would create a cycle: {0} -> {1}")]
    CycleDetected(String, String),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Chapter cannot be its own prerequisite: {0}")]
    SelfPrerequisite(String),
}

/// A prerequisite graph for the chapters of a single book
#[derive(Debug, Default)]
pub struct PrerequisiteGraph {
    /// Edges point from a prerequisite to the chapter that needs it
    graph: DiGraph<String, ()>,

    /// Map from chapter title to node index
    node_map: HashMap<String, NodeIndex>,
}

impl PrerequisiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from chapter titles and `(chapter, prerequisite)` edges
    pub fn from_edges<'a>(
        chapters: impl IntoIterator<Item = &'a str>,
        edges: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        for title in chapters {
            graph.add_chapter(title);
        }

        for (chapter, prerequisite) in edges {
            graph.add_prerequisite(chapter, prerequisite)?;
        }

        Ok(graph)
    }

    /// Adds a chapter node (no-op if present)
    pub fn add_chapter(&mut self, title: &str) {
        if !self.node_map.contains_key(title) {
            let idx = self.graph.add_node(title.to_string());
            self.node_map.insert(title.to_string(), idx);
        }
    }

    /// Adds the edge `chapter` requires `prerequisite`
    ///
    /// Adding an edge that already exists leaves the graph unchanged.
    pub fn add_prerequisite(&mut self, chapter: &str, prerequisite: &str) -> Result<(), GraphError> {
        if chapter == prerequisite {
            return Err(GraphError::SelfPrerequisite(chapter.to_string()));
        }

        let chapter_idx = self.index(chapter)?;
        let prereq_idx = self.index(prerequisite)?;

        if self.graph.find_edge(prereq_idx, chapter_idx).is_some() {
            return Ok(());
        }

        // The new edge closes a cycle if the prerequisite already depends on the chapter
        if has_path_connecting(&self.graph, chapter_idx, prereq_idx, None) {
            return Err(GraphError::CycleDetected(
                chapter.to_string(),
                prerequisite.to_string(),
            ));
        }

        self.graph.add_edge(prereq_idx, chapter_idx, ());
        Ok(())
    }

    /// Removes an edge, returning false if it did not exist
    pub fn remove_prerequisite(&mut self, chapter: &str, prerequisite: &str) -> bool {
        let (Some(&chapter_idx), Some(&prereq_idx)) =
            (self.node_map.get(chapter), self.node_map.get(prerequisite))
        else {
            return false;
        };

        match self.graph.find_edge(prereq_idx, chapter_idx) {
            Some(edge) => {
                self.graph.remove_edge(edge);
                true
            }
            None => false,
        }
    }

    /// Returns the direct prerequisites of a chapter, sorted by title
    pub fn prerequisites(&self, chapter: &str) -> Vec<String> {
        self.neighbors(chapter, Direction::Incoming)
    }

    /// Returns every chapter with prerequisites first, ties broken by title
    pub fn reading_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let degree = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count();
                (idx, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<(&str, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse((self.graph[*idx].as_str(), *idx)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((title, idx))) = ready.pop() {
            order.push(title.to_string());

            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((self.graph[next].as_str(), next)));
                    }
                }
            }
        }

        order
    }

    fn index(&self, chapter: &str) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(chapter)
            .copied()
            .ok_or_else(|| GraphError::ChapterNotFound(chapter.to_string()))
    }

    fn neighbors(&self, chapter: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.node_map.get(chapter) else {
            return vec![];
        };

        let mut titles: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        titles.sort();
        titles
    }
}
