pub mod config;
pub mod crawl;
pub mod error;
pub mod graph;
pub mod vk;

pub use config::Config;
pub use crawl::{CrawlReport, EgoCrawler};
pub use error::{FriendGraphError, Result};
pub use graph::{FriendChain, FriendGraph, UserId};
pub use vk::{FriendSource, VkClient};
