//! VK API access: the friend-list source the crawler pulls from.

mod client;

pub use client::{parse_friends_body, VkClient};

use std::future::Future;

use crate::error::Result;
use crate::graph::UserId;

/// Anything that can list a user's friends.
///
/// One call is one remote request. Implementations do not retry; pacing and
/// retry policy belong to the crawler.
pub trait FriendSource {
    fn fetch_friends(&self, user_id: UserId) -> impl Future<Output = Result<Vec<UserId>>> + Send;
}
