use std::collections::HashMap;

use crate::{Callback, Message};

/// Callbacks waiting for a reply, keyed by message id.
///
/// An entry is removed in the same step that hands it out, so a callback
/// can only ever run once and a replayed reply finds nothing.
pub(crate) struct PendingCallbacks {
    // ---
    callbacks: HashMap<String, Callback>,
}

impl PendingCallbacks {
    // ---

    /// Create an empty table
    pub fn new() -> Self {
        // ---
        Self {
            callbacks: HashMap::new(),
        }
    }

    /// Store the callback for `id`
    ///
    /// Ids come from a per-transport generator and never repeat, so an
    /// existing entry is only replaced if the caller reuses an id by hand.
    pub fn register(&mut self, id: String, callback: Callback) {
        // ---
        if self.callbacks.insert(id.clone(), callback).is_some() {
            crate::log_warn!("replaced pending callback for reused id {id}");
        }
    }

    /// Remove and return the callback for the reply's id, if any
    pub fn take_for(&mut self, reply: &Message) -> Option<Callback> {
        // ---
        let id = reply.id.as_deref()?;
        self.callbacks.remove(id)
    }

    /// Remove the callback for `id` without running it
    pub fn remove(&mut self, id: &str) -> bool {
        // ---
        self.callbacks.remove(id).is_some()
    }

    /// Drop every stored callback, returning how many there were
    pub fn clear(&mut self) -> usize {
        // ---
        let count = self.callbacks.len();
        self.callbacks.clear();
        count
    }

    /// Number of callbacks still waiting
    pub fn len(&self) -> usize {
        // ---
        self.callbacks.len()
    }
}
