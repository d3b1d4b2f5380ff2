//! Call-scoped memoisation for expensive layout work.
//!
//! One [`LayoutCache`] lives for exactly one generation call and is threaded
//! through every measure and draw step as an explicit parameter. It is
//! `!Sync` (interior `RefCell`s) and cannot be shared between concurrent calls.

use crate::LayoutError;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Domain bytes keep keys of different node kinds apart.
pub mod domain {
    pub const TABLE: u8 = 3;
    pub const TABLE_HEIGHTS: u8 = 4;
    pub const IMAGE: u8 = 5;
    pub const TEXT: u8 = 6;
    pub const SVG: u8 = 7;
}

/// Hashes `parts` under a domain byte.
pub fn cache_key<T: Hash + ?Sized>(domain: u8, parts: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    domain.hash(&mut hasher);
    parts.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

#[derive(Default)]
pub struct LayoutCache {
    // Generic scratch space for node-specific intermediates (table layouts, decoded images).
    entries: RefCell<HashMap<u64, Box<dyn Any>>>,
    // Every height list handed out per key, to catch non-deterministic layout.
    heights: RefCell<HashMap<u64, Vec<f64>>>,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, computing and storing it first on
    /// a miss. The borrow is released while `compute` runs, so computations may
    /// use the cache themselves.
    pub fn get_or_try_insert_with<T, E>(
        &self,
        key: u64,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<Rc<T>, E>
    where
        T: 'static,
    {
        if let Some(found) = self
            .entries
            .borrow()
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<Rc<T>>())
        {
            self.hits.set(self.hits.get() + 1);
            return Ok(Rc::clone(found));
        }

        self.misses.set(self.misses.get() + 1);
        let value = Rc::new(compute()?);
        self.entries
            .borrow_mut()
            .insert(key, Box::new(Rc::clone(&value)));
        Ok(value)
    }

    /// Records the heights produced for `key`. A later call for the same key
    /// with a different answer is a `CacheInconsistency`.
    pub fn record_heights(&self, key: u64, heights: &[f64]) -> Result<(), LayoutError> {
        let mut recorded = self.heights.borrow_mut();
        match recorded.get(&key) {
            Some(previous) if previous.as_slice() != heights => {
                Err(LayoutError::CacheInconsistency {
                    key,
                    previous: previous.clone(),
                    current: heights.to_vec(),
                })
            }
            Some(_) => Ok(()),
            None => {
                recorded.insert(key, heights.to_vec());
                Ok(())
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            entries: self.entries.borrow().len(),
        }
    }
}
