//! Shortest friend chain between two users (BFS over stored friend lists).

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::error::{Endpoint, FriendGraphError, Result};
use crate::graph::{FriendGraph, UserId};

/// Path of user ids from a start user to an end user, both included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FriendChain(Vec<UserId>);

impl FriendChain {
    pub fn ids(&self) -> &[UserId] {
        &self.0
    }

    /// Number of edges walked.
    pub fn hops(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn start(&self) -> UserId {
        self.0[0]
    }

    pub fn end(&self) -> UserId {
        self.0[self.0.len() - 1]
    }

    pub fn into_vec(self) -> Vec<UserId> {
        self.0
    }
}

impl fmt::Display for FriendChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{}", parts.join(" -> "))
    }
}

/// Find a shortest chain from `start` to `end` following friend lists as stored.
///
/// Edges are directed: B appearing in A's list lets the search go A->B only.
/// Among equally short chains the one reached first in friend-list order wins.
pub fn find_friend_chain(graph: &FriendGraph, start: UserId, end: UserId) -> Result<FriendChain> {
    if !graph.contains(start) {
        return Err(FriendGraphError::NodeNotInGraph {
            role: Endpoint::Start,
            user_id: start,
        });
    }
    if !graph.contains(end) {
        return Err(FriendGraphError::NodeNotInGraph {
            role: Endpoint::End,
            user_id: end,
        });
    }
    if start == end {
        return Ok(FriendChain(vec![start]));
    }

    // parent[v] = user through which v was first reached; the start maps to itself
    let mut parent: HashMap<UserId, UserId> = HashMap::new();
    parent.insert(start, start);
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let friends = graph.friends(current).unwrap_or(&[]);
        for &friend_id in friends {
            if parent.contains_key(&friend_id) {
                continue;
            }
            parent.insert(friend_id, current);

            if friend_id == end {
                return Ok(FriendChain(rebuild_path(&parent, start, end)));
            }
            queue.push_back(friend_id);
        }
    }

    Err(FriendGraphError::PathNotFound { start, end })
}

fn rebuild_path(parent: &HashMap<UserId, UserId>, start: UserId, end: UserId) -> Vec<UserId> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        current = parent[&current];
        path.push(current);
    }
    path.reverse();
    path
}

/// Run several independent chain queries; one failing query does not affect the others.
pub fn find_friend_chains(
    graph: &FriendGraph,
    queries: &[(UserId, UserId)],
) -> Vec<Result<FriendChain>> {
    queries
        .iter()
        .map(|&(start, end)| {
            let result = find_friend_chain(graph, start, end);
            if let Err(e) = &result {
                log::debug!("Friend chain {} -> {}: {}", start, end, e);
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(entries: &[(UserId, &[UserId])]) -> FriendGraph {
        entries.iter().map(|(id, f)| (*id, f.to_vec())).collect()
    }

    fn is_valid_chain(g: &FriendGraph, chain: &FriendChain) -> bool {
        chain
            .ids()
            .windows(2)
            .all(|w| g.friends(w[0]).map_or(false, |f| f.contains(&w[1])))
    }

    #[test]
    fn test_shortest_of_two_equal_routes() {
        let g = graph(&[(1, &[2, 3]), (2, &[4]), (3, &[4]), (4, &[])]);
        let chain = find_friend_chain(&g, 1, 4).unwrap();
        assert_eq!(chain.ids().len(), 3);
        assert_eq!(chain.start(), 1);
        assert_eq!(chain.end(), 4);
        assert!(is_valid_chain(&g, &chain));
    }

    #[test]
    fn test_prefers_short_route_over_long_one() {
        // 1 -> 2 -> 3 -> 5 and 1 -> 4 -> 5
        let g = graph(&[(1, &[2, 4]), (2, &[3]), (3, &[5]), (4, &[5]), (5, &[])]);
        let chain = find_friend_chain(&g, 1, 5).unwrap();
        assert_eq!(chain.hops(), 2);
        assert_eq!(chain.ids(), &[1, 4, 5]);
    }

    #[test]
    fn test_start_equals_end() {
        let g = graph(&[(7, &[8]), (8, &[])]);
        let chain = find_friend_chain(&g, 7, 7).unwrap();
        assert_eq!(chain.ids(), &[7]);
        assert_eq!(chain.hops(), 0);
    }

    #[test]
    fn test_missing_start() {
        let g = graph(&[(1, &[2]), (2, &[])]);
        let err = find_friend_chain(&g, 99, 2).unwrap_err();
        assert!(matches!(
            err,
            FriendGraphError::NodeNotInGraph {
                role: Endpoint::Start,
                user_id: 99
            }
        ));
    }

    #[test]
    fn test_missing_end() {
        let g = graph(&[(1, &[2]), (2, &[])]);
        let err = find_friend_chain(&g, 1, 99).unwrap_err();
        assert!(matches!(
            err,
            FriendGraphError::NodeNotInGraph {
                role: Endpoint::End,
                user_id: 99
            }
        ));
    }

    #[test]
    fn test_direction_is_respected() {
        // 2 lists 1, but 1 does not list 2
        let g = graph(&[(1, &[]), (2, &[1])]);
        assert!(find_friend_chain(&g, 2, 1).is_ok());
        assert!(matches!(
            find_friend_chain(&g, 1, 2),
            Err(FriendGraphError::PathNotFound { start: 1, end: 2 })
        ));
    }

    #[test]
    fn test_unexpanded_friends_are_dead_ends() {
        // 3 is listed by 1 but never became a key
        let g = graph(&[(1, &[3, 2]), (2, &[4]), (4, &[])]);
        let chain = find_friend_chain(&g, 1, 4).unwrap();
        assert_eq!(chain.ids(), &[1, 2, 4]);
    }

    #[test]
    fn test_cycle_terminates() {
        let g = graph(&[(1, &[2]), (2, &[3]), (3, &[1]), (4, &[])]);
        assert!(matches!(
            find_friend_chain(&g, 1, 4),
            Err(FriendGraphError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_display_format() {
        let g = graph(&[(1, &[2]), (2, &[3]), (3, &[])]);
        let chain = find_friend_chain(&g, 1, 3).unwrap();
        assert_eq!(chain.to_string(), "1 -> 2 -> 3");
    }

    #[test]
    fn test_batch_queries_are_independent() {
        let g = graph(&[(1, &[2]), (2, &[])]);
        let results = find_friend_chains(&g, &[(1, 2), (5, 2), (2, 1), (1, 1)]);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().ids(), &[1, 2]);
        assert!(matches!(results[1], Err(FriendGraphError::NodeNotInGraph { .. })));
        assert!(matches!(results[2], Err(FriendGraphError::PathNotFound { .. })));
        assert_eq!(results[3].as_ref().unwrap().ids(), &[1]);
    }
}
