//! Friendship graph: the in-memory store shared by the crawler and the analyzers.
//!
//! Friend lists are kept exactly as the VK API reports them (directed, in API
//! order). Keys iterate in ascending id order, which is the vertex ordering used
//! by every analysis function.

mod analysis;
mod store;
mod traversal;

pub use analysis::{adjacency_matrix, count_unique_edges, summarize, AdjacencyMatrix, GraphSummary};
pub use store::{load_graph, save_graph};
pub use traversal::{find_friend_chain, find_friend_chains, FriendChain};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// VK user identifier.
pub type UserId = i64;

/// Mapping of user id to that user's friend ids.
///
/// A key with an empty list is either a user with no visible friends or a
/// placeholder: discovered through someone else's list but never fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FriendGraph {
    adjacency: BTreeMap<UserId, Vec<UserId>>,
}

impl FriendGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fetched friend list of `user_id`, replacing any earlier entry.
    pub fn insert_friends(&mut self, user_id: UserId, friends: Vec<UserId>) {
        self.adjacency.insert(user_id, friends);
    }

    /// Insert an empty entry for `user_id` unless it is already a key.
    ///
    /// Returns true if a placeholder was added.
    pub fn insert_placeholder(&mut self, user_id: UserId) -> bool {
        if self.adjacency.contains_key(&user_id) {
            return false;
        }
        self.adjacency.insert(user_id, Vec::new());
        true
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.adjacency.contains_key(&user_id)
    }

    pub fn friends(&self, user_id: UserId) -> Option<&[UserId]> {
        self.adjacency.get(&user_id).map(Vec::as_slice)
    }

    /// Number of users (keys), placeholders included.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// User ids in ascending order.
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, &[UserId])> + '_ {
        self.adjacency
            .iter()
            .map(|(&user_id, friends)| (user_id, friends.as_slice()))
    }

    /// Number of keys with an empty friend list.
    pub fn placeholder_count(&self) -> usize {
        self.adjacency.values().filter(|f| f.is_empty()).count()
    }
}

impl FromIterator<(UserId, Vec<UserId>)> for FriendGraph {
    fn from_iter<I: IntoIterator<Item = (UserId, Vec<UserId>)>>(iter: I) -> Self {
        Self {
            adjacency: iter.into_iter().collect(),
        }
    }
}
