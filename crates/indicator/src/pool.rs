//! Object pool backing dynamically sized LIST regions of the menu.
//!
//! Native widget construction is the expensive operation being
//! amortized: freed nodes keep their widget and wait on the free list
//! for the next acquisition.

use std::collections::HashMap;
use std::sync::Arc;

use crate::menu::MenuNode;

/// Free/used bookkeeping for the LIST children of one ACTION node.
///
/// A node is in exactly one of {free list, used map} at any time.
#[derive(Default)]
pub struct NodePool {
    used: HashMap<String, Arc<MenuNode>>,
    free: Vec<Arc<MenuNode>>,
}

impl NodePool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently parked on the free list.
    pub fn tot_free(&self) -> usize {
        self.free.len()
    }

    /// Number of nodes currently in use, keyed by name.
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Pops a recyclable node off the free list.
    pub(crate) fn take_free(&mut self) -> Option<Arc<MenuNode>> {
        self.free.pop()
    }

    /// Registers a node as used under `name`.
    pub(crate) fn put_used(&mut self, name: String, node: Arc<MenuNode>) {
        if let Some(previous) = self.used.insert(name, node) {
            // Same name acquired twice: the displaced node goes back to
            // the free list so it is never in neither set.
            self.free.push(previous);
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<MenuNode>> {
        self.used.get(name).cloned()
    }

    /// Moves the named node from used to free, returning it so the
    /// caller can reset its display state.
    pub(crate) fn release(&mut self, name: &str) -> Option<Arc<MenuNode>> {
        let node = self.used.remove(name)?;
        self.free.push(Arc::clone(&node));
        Some(node)
    }

    /// Moves every used node to the free list in one pass.
    pub(crate) fn release_all(&mut self) -> Vec<Arc<MenuNode>> {
        let released: Vec<_> = self.used.drain().map(|(_, node)| node).collect();
        self.free.extend(released.iter().cloned());
        released
    }
}
