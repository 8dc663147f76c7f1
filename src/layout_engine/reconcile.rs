//! Bringing an existing tree shape back in line with the live window list.

use tracing::debug;

use crate::common::collections::HashSet;
use crate::common::config::TilingConfig;
use crate::layout_engine::tree::{Leaf, LayoutTree, NodeKind, PendingLeaf};
use crate::model::stack::EntryId;
use crate::model::window::WindowId;

impl LayoutTree {
    /// Hands `windows` out to the existing leaves in order, one per leaf and
    /// one per stack entry. Windows left over are inserted by splitting the
    /// insertion leaf along its optimal orientation. Leaves beyond the end of the list keep what they held;
    /// see [`LayoutTree::prune_stale`].
    pub fn fill(&mut self, windows: &[WindowId], cfg: &TilingConfig) {
        let mut remaining = windows.iter().copied().peekable();
        let mut assigned = 0;
        for leaf in self.leaves() {
            if remaining.peek().is_none() {
                break;
            }
            match self.leaf(leaf) {
                Some(Leaf::Partitioned(_)) => {
                    if let Some(PendingLeaf::Stacked(count)) = self.pending.get(leaf).copied()
                        && let Some(container) = self.container(leaf)
                    {
                        let chunk: Vec<WindowId> = remaining.by_ref().take(count.max(1)).collect();
                        if let Some(stack) = self.stacks.create(&chunk, container) {
                            self.kind.insert(leaf, NodeKind::Leaf(Leaf::Stacked(stack)));
                            self.pending.remove(leaf);
                            assigned += chunk.len();
                        }
                    } else if let Some(window) = remaining.next() {
                        self.kind.insert(leaf, NodeKind::Leaf(Leaf::Partitioned(Some(window))));
                        self.pending.remove(leaf);
                        assigned += 1;
                    }
                }
                Some(Leaf::Stacked(stack)) => {
                    let entries: Vec<EntryId> = self.stacks.iter(stack).map(|(id, _)| id).collect();
                    for entry in entries {
                        let Some(window) = remaining.next() else { break };
                        self.stacks.set_window(entry, window);
                        assigned += 1;
                    }
                }
                None => {}
            }
        }
        let excess: Vec<WindowId> = remaining.collect();
        let cfg = cfg.optimal();
        for &window in &excess {
            self.split_insertion_leaf(window, &cfg);
        }
        debug!(assigned, inserted = excess.len(), "filled layout");
    }

    /// Removes every leaf and stack entry whose window is missing from `live`
    /// or repeats an earlier one. Returns how many were removed.
    pub fn prune_stale(&mut self, live: &[WindowId], cfg: &TilingConfig) -> usize {
        let live: HashSet<WindowId> = live.iter().copied().collect();
        let mut seen = HashSet::default();
        let mut stale_nodes = Vec::new();
        let mut stale_entries = Vec::new();
        for leaf in self.leaves() {
            match self.leaf(leaf) {
                Some(Leaf::Partitioned(Some(window))) => {
                    if !live.contains(&window) || !seen.insert(window) {
                        stale_nodes.push(leaf);
                    }
                }
                Some(Leaf::Stacked(stack)) => {
                    for (id, entry) in self.stacks.iter(stack) {
                        if !live.contains(&entry.window) || !seen.insert(entry.window) {
                            stale_entries.push(id);
                        }
                    }
                }
                _ => {}
            }
        }
        let removed = stale_nodes.len() + stale_entries.len();
        for entry in stale_entries {
            self.remove_stack_entry(entry);
        }
        for node in stale_nodes {
            self.remove_leaf(node, cfg);
        }
        if removed > 0 {
            debug!(removed, "pruned stale windows");
            self.clear_if_windowless();
        }
        removed
    }
}
