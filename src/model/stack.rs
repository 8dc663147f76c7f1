//! Doubly linked chains of windows that share one rectangle.
//!
//! A chain is owned front-to-back through its [`StackId`]; entries live in a
//! shared arena and link to their neighbours by [`EntryId`]. Every entry of a
//! chain carries an identical [`Container`], refreshed through
//! [`StackMap::set_container`] whenever the owning leaf moves.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::layout_engine::Container;
use crate::model::window::WindowId;

slotmap::new_key_type! {
    /// Identifies one chain.
    pub struct StackId;
    /// Identifies one entry of a chain.
    pub struct EntryId;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    pub window: WindowId,
    pub container: Container,
    stack: StackId,
    prev: Option<EntryId>,
    next: Option<EntryId>,
}

impl StackEntry {
    pub fn stack(&self) -> StackId { self.stack }

    pub fn prev(&self) -> Option<EntryId> { self.prev }

    pub fn next(&self) -> Option<EntryId> { self.next }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Chain {
    head: EntryId,
    tail: EntryId,
    len: usize,
}

#[derive(Default, Serialize, Deserialize)]
pub struct StackMap {
    chains: SlotMap<StackId, Chain>,
    entries: SlotMap<EntryId, StackEntry>,
}

impl StackMap {
    pub fn new() -> Self { Self::default() }

    /// Builds a chain holding `windows` in order. Returns None for an empty list.
    pub fn create(&mut self, windows: &[WindowId], container: Container) -> Option<StackId> {
        let (&first, rest) = windows.split_first()?;
        let stack = self.chains.insert_with_key(|_| Chain {
            head: EntryId::default(),
            tail: EntryId::default(),
            len: 0,
        });
        let head = self.entries.insert(StackEntry {
            window: first,
            container,
            stack,
            prev: None,
            next: None,
        });
        if let Some(chain) = self.chains.get_mut(stack) {
            *chain = Chain { head, tail: head, len: 1 };
        }
        for &window in rest {
            self.push_back(stack, window);
        }
        Some(stack)
    }

    pub fn contains(&self, stack: StackId) -> bool { self.chains.contains_key(stack) }

    pub fn push_back(&mut self, stack: StackId, window: WindowId) -> Option<EntryId> {
        let chain = *self.chains.get(stack)?;
        let container = self.entries.get(chain.tail)?.container;
        let entry = self.entries.insert(StackEntry {
            window,
            container,
            stack,
            prev: Some(chain.tail),
            next: None,
        });
        if let Some(tail) = self.entries.get_mut(chain.tail) {
            tail.next = Some(entry);
        }
        if let Some(chain) = self.chains.get_mut(stack) {
            chain.tail = entry;
            chain.len += 1;
        }
        Some(entry)
    }

    /// Unlinks and frees one entry, relinking its neighbours. Removing the last
    /// entry frees the chain too; the returned flag reports that case.
    pub fn remove_entry(&mut self, entry: EntryId) -> Option<(WindowId, bool)> {
        let removed = self.entries.remove(entry)?;
        if let Some(prev) = removed.prev.and_then(|p| self.entries.get_mut(p)) {
            prev.next = removed.next;
        }
        if let Some(next) = removed.next.and_then(|n| self.entries.get_mut(n)) {
            next.prev = removed.prev;
        }
        let mut emptied = false;
        if let Some(chain) = self.chains.get_mut(removed.stack) {
            chain.len -= 1;
            if chain.len == 0 {
                emptied = true;
            } else {
                if chain.head == entry {
                    chain.head = removed.next.unwrap_or(chain.head);
                }
                if chain.tail == entry {
                    chain.tail = removed.prev.unwrap_or(chain.tail);
                }
            }
        }
        if emptied {
            self.chains.remove(removed.stack);
        }
        Some((removed.window, emptied))
    }

    /// Frees a whole chain front to back and returns the windows it held.
    pub fn destroy(&mut self, stack: StackId) -> Vec<WindowId> {
        let mut windows = Vec::new();
        let Some(chain) = self.chains.remove(stack) else {
            return windows;
        };
        let mut cur = Some(chain.head);
        while let Some(id) = cur {
            match self.entries.remove(id) {
                Some(entry) => {
                    windows.push(entry.window);
                    cur = entry.next;
                }
                None => break,
            }
        }
        windows
    }

    pub fn head(&self, stack: StackId) -> Option<EntryId> { self.chains.get(stack).map(|c| c.head) }

    pub fn tail(&self, stack: StackId) -> Option<EntryId> { self.chains.get(stack).map(|c| c.tail) }

    pub fn len(&self, stack: StackId) -> usize { self.chains.get(stack).map_or(0, |c| c.len) }

    pub fn entry(&self, entry: EntryId) -> Option<&StackEntry> { self.entries.get(entry) }

    /// Entries of a chain, front to back.
    pub fn iter(&self, stack: StackId) -> impl Iterator<Item = (EntryId, &StackEntry)> + '_ {
        let mut cur = self.head(stack);
        std::iter::from_fn(move || {
            let id = cur?;
            let entry = self.entries.get(id)?;
            cur = entry.next;
            Some((id, entry))
        })
    }

    pub fn windows(&self, stack: StackId) -> Vec<WindowId> {
        self.iter(stack).map(|(_, e)| e.window).collect()
    }

    pub fn find(&self, stack: StackId, window: WindowId) -> Option<EntryId> {
        self.iter(stack).find(|(_, e)| e.window == window).map(|(id, _)| id)
    }

    /// Copies `container` onto every entry of the chain.
    pub fn set_container(&mut self, stack: StackId, container: Container) {
        let ids: Vec<_> = self.iter(stack).map(|(id, _)| id).collect();
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.container = container;
            }
        }
    }

    pub fn container(&self, stack: StackId) -> Option<Container> {
        self.head(stack).and_then(|h| self.entries.get(h)).map(|e| e.container)
    }

    /// Exchanges the windows of two entries. Containers stay where they are.
    pub fn swap_windows(&mut self, a: EntryId, b: EntryId) -> bool {
        if a == b {
            return false;
        }
        let (Some(wa), Some(wb)) = (
            self.entries.get(a).map(|e| e.window),
            self.entries.get(b).map(|e| e.window),
        ) else {
            return false;
        };
        if let Some(e) = self.entries.get_mut(a) {
            e.window = wb;
        }
        if let Some(e) = self.entries.get_mut(b) {
            e.window = wa;
        }
        true
    }

    pub fn set_window(&mut self, entry: EntryId, window: WindowId) -> bool {
        match self.entries.get_mut(entry) {
            Some(e) => {
                e.window = window;
                true
            }
            None => false,
        }
    }
}
