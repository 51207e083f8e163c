//! Ordered registries of shared sources.
//!
//! Sources are shared `Rc<RefCell<_>>` handles: the registry, the
//! synchronizer and the driving loop all hold the same cell. Registration
//! order is preserved so UIs and summaries list sources deterministically.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{SourceId, TimecodeSource, TimedDataSource};

/// An insertion-ordered registry of sources keyed by their id.
///
/// Ids come from the sources themselves at registration time (explicit
/// identity, no registry-assigned handles), so an entry survives lookup by
/// the same id across process restarts and config reloads.
pub struct SourceRegistry<T: ?Sized> {
    entries: Vec<(SourceId, Rc<RefCell<T>>)>,
}

pub type TimecodeSourceRegistry = SourceRegistry<dyn TimecodeSource>;
pub type TimedDataSourceRegistry = SourceRegistry<dyn TimedDataSource>;

impl<T: ?Sized> SourceRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a source under its id. Returns false (and leaves the
    /// registry unchanged) when the id is already taken.
    pub fn register(&mut self, id: SourceId, source: Rc<RefCell<T>>) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.entries.push((id, source));
        true
    }

    /// Remove the source with the given id. Returns false when absent.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| entry_id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(entry_id, _)| entry_id == id)
    }

    pub fn get(&self, id: &str) -> Option<Rc<RefCell<T>>> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, source)| Rc::clone(source))
    }

    /// Registered sources, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &Rc<RefCell<T>>> {
        self.entries.iter().map(|(_, source)| source)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SourceId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: ?Sized> Default for SourceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
