//! Whole-graph measurements: unique edges, adjacency matrix, summary counts.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::graph::{FriendGraph, UserId};

/// Count friendships, treating A->B and B->A as one edge.
///
/// A self-listing (A->A) counts as a single degenerate edge.
pub fn count_unique_edges(graph: &FriendGraph) -> usize {
    let mut edges: HashSet<(UserId, UserId)> = HashSet::new();

    for (user_id, friends) in graph.iter() {
        for &friend_id in friends {
            let edge = if user_id < friend_id {
                (user_id, friend_id)
            } else {
                (friend_id, user_id)
            };
            edges.insert(edge);
        }
    }

    edges.len()
}

/// Dense 0/1 projection of the graph over its keys.
///
/// Row and column `i` both refer to `ids()[i]`. Cells are directed: `(i, j)` is
/// 1 when user `i` lists user `j`. Memory is quadratic in the number of users,
/// so this is meant for graphs of a few thousand users at most.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacencyMatrix {
    ids: Vec<UserId>,
    cells: Vec<Vec<u8>>,
}

impl AdjacencyMatrix {
    /// Side length of the matrix.
    pub fn size(&self) -> usize {
        self.ids.len()
    }

    /// Vertex ordering for rows and columns.
    pub fn ids(&self) -> &[UserId] {
        &self.ids
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn index_of(&self, user_id: UserId) -> Option<usize> {
        // ids come from BTreeMap keys, so they are sorted
        self.ids.binary_search(&user_id).ok()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.cells
    }
}

/// Build the adjacency matrix of `graph`, ordered by ascending user id.
pub fn adjacency_matrix(graph: &FriendGraph) -> AdjacencyMatrix {
    let ids: Vec<UserId> = graph.user_ids().collect();
    let index: HashMap<UserId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut cells = vec![vec![0u8; ids.len()]; ids.len()];
    for (row, (_, friends)) in graph.iter().enumerate() {
        for friend_id in friends {
            // Friends that never became keys have no column
            if let Some(&col) = index.get(friend_id) {
                cells[row][col] = 1;
            }
        }
    }

    AdjacencyMatrix { ids, cells }
}

/// Headline numbers for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub users: usize,
    /// Users with a non-empty friend list
    pub expanded: usize,
    /// Users with an empty friend list
    pub placeholders: usize,
    pub directed_edges: usize,
    pub unique_edges: usize,
}

pub fn summarize(graph: &FriendGraph) -> GraphSummary {
    let placeholders = graph.placeholder_count();
    GraphSummary {
        users: graph.len(),
        expanded: graph.len() - placeholders,
        placeholders,
        directed_edges: graph.iter().map(|(_, f)| f.len()).sum(),
        unique_edges: count_unique_edges(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(entries: &[(UserId, &[UserId])]) -> FriendGraph {
        entries.iter().map(|(id, f)| (*id, f.to_vec())).collect()
    }

    #[test]
    fn test_mutual_pair_counts_once() {
        assert_eq!(count_unique_edges(&graph(&[(1, &[2]), (2, &[1])])), 1);
    }

    #[test]
    fn test_star_with_placeholders() {
        assert_eq!(count_unique_edges(&graph(&[(1, &[2, 3]), (2, &[]), (3, &[])])), 2);
    }

    #[test]
    fn test_self_loop_counts_as_one_edge() {
        assert_eq!(count_unique_edges(&graph(&[(1, &[1, 2]), (2, &[1])])), 2);
    }

    #[test]
    fn test_edges_to_unknown_users_still_count() {
        // 9 never became a key, but 1 lists it
        assert_eq!(count_unique_edges(&graph(&[(1, &[9])])), 1);
    }

    #[test]
    fn test_empty_graph() {
        let g = FriendGraph::new();
        assert_eq!(count_unique_edges(&g), 0);
        assert_eq!(adjacency_matrix(&g).size(), 0);
    }

    #[test]
    fn test_adjacency_matrix_directed() {
        let m = adjacency_matrix(&graph(&[(1, &[2]), (2, &[]), (3, &[1])]));
        assert_eq!(m.size(), 3);
        assert_eq!(m.ids(), &[1, 2, 3]);
        assert_eq!(m.rows()[0], vec![0, 1, 0]);
        assert_eq!(m.rows()[1], vec![0, 0, 0]);
        assert_eq!(m.rows()[2], vec![1, 0, 0]);
    }

    #[test]
    fn test_adjacency_matrix_index_mapping() {
        let m = adjacency_matrix(&graph(&[(40, &[10]), (10, &[]), (25, &[40, 77])]));
        let row = m.index_of(25).unwrap();
        let col = m.index_of(40).unwrap();
        assert_eq!(m.get(row, col), Some(1));
        assert_eq!(m.get(col, row), Some(0));
        assert_eq!(m.index_of(77), None);
        assert_eq!(m.get(3, 0), None);
        assert!(m.rows().iter().all(|r| r.len() == m.size()));
    }

    #[test]
    fn test_summary() {
        let s = summarize(&graph(&[(1, &[2, 3]), (2, &[1]), (3, &[])]));
        assert_eq!(
            s,
            GraphSummary {
                users: 3,
                expanded: 2,
                placeholders: 1,
                directed_edges: 3,
                unique_edges: 2,
            }
        );
    }
}
