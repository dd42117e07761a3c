use std::sync::atomic::{AtomicU64, Ordering};

/// Source of message correlation ids for a single transport instance.
///
/// Ids are opaque strings to everything outside this type. The sequence
/// starts at `"1"` and increments, so ids never repeat for the lifetime of
/// the generator. Two transports each have their own generator; ids are only
/// unique per transport, which is all reply matching needs.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a generator whose first id is `"1"`.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Produce the next id.
    pub fn generate(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
