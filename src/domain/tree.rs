//! Channel forest construction.

use std::collections::HashMap;

use tracing::debug;

use super::{Channel, Client};

/// Parent id of top-level channels.
pub const ROOT_PARENT_ID: &str = "0";

/// Entities left out of the forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Channels whose ancestry does not reach a root.
    pub dropped_channels: usize,
    /// Clients in an unknown or dropped channel.
    pub dropped_clients: usize,
}

/// Link channels into a forest and attach clients.
///
/// Roots and children keep fetch order. A client whose channel id is unknown
/// is dropped, as is every channel whose parent chain does not end at
/// [`ROOT_PARENT_ID`]. When ids repeat, the last channel with an id receives
/// its clients and children.
pub fn build_channel_tree(channels: Vec<Channel>, clients: Vec<Client>) -> (Vec<Channel>, TreeStats) {
    let index: HashMap<String, usize> = channels
        .iter()
        .enumerate()
        .map(|(i, channel)| (channel.id.clone(), i))
        .collect();

    let mut slots: Vec<Option<Channel>> = channels.into_iter().map(Some).collect();
    let mut stats = TreeStats::default();

    for client in clients {
        match index.get(&client.channel_id).and_then(|&i| slots[i].as_mut()) {
            Some(channel) => channel.clients.push(client),
            None => stats.dropped_clients += 1,
        }
    }

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    for (i, slot) in slots.iter().enumerate() {
        let Some(channel) = slot else { continue };
        if channel.parent_id == ROOT_PARENT_ID {
            roots.push(i);
        } else if let Some(&parent) = index.get(&channel.parent_id) {
            children[parent].push(i);
        }
    }

    let tree: Vec<Channel> = roots
        .into_iter()
        .filter_map(|i| assemble(i, &mut slots, &children))
        .collect();

    for orphan in slots.into_iter().flatten() {
        stats.dropped_channels += 1;
        stats.dropped_clients += orphan.clients.len();
    }

    if stats != TreeStats::default() {
        debug!(
            dropped_channels = stats.dropped_channels,
            dropped_clients = stats.dropped_clients,
            "dropped entities without a place in the channel tree"
        );
    }

    (tree, stats)
}

/// Move channel `i` and its reachable descendants out of `slots`.
fn assemble(i: usize, slots: &mut [Option<Channel>], children: &[Vec<usize>]) -> Option<Channel> {
    let mut channel = slots[i].take()?;
    channel.children = children[i]
        .iter()
        .filter_map(|&child| assemble(child, slots, children))
        .collect();
    Some(channel)
}
