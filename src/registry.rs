//! Name-to-factory registries for pluggable components.
//!
//! Exporters and soft foreign-key detectors are registered explicitly when a
//! catalog is constructed; the CLI resolves user-supplied names against it.

use crate::error::UnknownEntry;
use std::collections::BTreeMap;

/// Constructor stored in a registry
pub type Factory<T> = fn() -> Box<T>;

/// Named factories, listed in name order
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: BTreeMap<&'static str, Factory<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Empty registry; `kind` names the component in error messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Register a factory, replacing any previous one of the same name
    pub fn register(&mut self, name: &'static str, factory: Factory<T>) -> &mut Self {
        self.entries.insert(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Instantiate the component registered under `name`
    pub fn create(&self, name: &str) -> Result<Box<T>, UnknownEntry> {
        match self.entries.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(UnknownEntry {
                kind: self.kind,
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            }),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Fresh instance of every registered component, in name order
    pub fn instances(&self) -> Vec<Box<T>> {
        self.entries.values().map(|factory| factory()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
