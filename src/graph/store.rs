//! JSON persistence for the friendship graph.

use std::fs;
use std::path::Path;

use crate::error::{FriendGraphError, Result};
use crate::graph::FriendGraph;

/// Write `graph` to `path` as indented JSON.
///
/// The file is first written next to the target and then renamed over it, so a
/// reader (or a crash mid-checkpoint) never sees a half-written graph.
pub fn save_graph(path: &Path, graph: &FriendGraph) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(graph)
        .map_err(|e| FriendGraphError::MalformedGraph(format!("serialize: {}", e)))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    fs::write(tmp_path, json)?;
    fs::rename(tmp_path, path)?;

    log::debug!("Saved graph with {} users to {}", graph.len(), path.display());
    Ok(())
}

/// Load a graph previously written by [`save_graph`].
///
/// Anything that is not an object of id strings to integer arrays, or that
/// contains a negative id, is rejected as a whole.
pub fn load_graph(path: &Path) -> Result<FriendGraph> {
    let json = fs::read_to_string(path)?;

    let graph: FriendGraph = serde_json::from_str(&json)
        .map_err(|e| FriendGraphError::MalformedGraph(format!("{}: {}", path.display(), e)))?;

    for (user_id, friends) in graph.iter() {
        if user_id < 0 {
            return Err(FriendGraphError::MalformedGraph(format!(
                "{}: negative user id {}",
                path.display(),
                user_id
            )));
        }
        if let Some(bad) = friends.iter().find(|&&f| f < 0) {
            return Err(FriendGraphError::MalformedGraph(format!(
                "{}: user {} lists negative friend id {}",
                path.display(),
                user_id,
                bad
            )));
        }
    }

    log::debug!("Loaded graph with {} users from {}", graph.len(), path.display());
    Ok(graph)
}
