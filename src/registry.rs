//! Compiled Set Registry
//!
//! Owns the compiled entries of one schema set. Validators inside the set
//! never own the set: references hold a [`RegistryHandle`], a weak lookup
//! capability that is only usable once every entry exists.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Result, SchemaError};
use crate::validator::Validator;

/// The compiled form of one named element
#[derive(Debug, Clone)]
pub struct CompiledEntry {
    name: String,
    validator: Validator,
    description: String,
}

impl CompiledEntry {
    /// Wrap a validator, deriving its description
    pub fn new(name: impl Into<String>, validator: Validator) -> Self {
        let description = validator.to_string();
        Self { name: name.into(), validator, description }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

pub type Entries = BTreeMap<String, CompiledEntry>;

/// Read-only, non-owning access to a compiled set
#[derive(Clone)]
pub struct RegistryHandle {
    entries: Weak<Entries>,
}

impl RegistryHandle {
    /// A handle that never resolves; for validators built outside any set
    pub fn detached() -> Self {
        Self { entries: Weak::new() }
    }

    /// Resolve `reference` and hand the entry to `f`.
    ///
    /// Fails with `RegistryUnavailable` while the set is still being built or
    /// after it was dropped, and with `UnresolvedReference` when the name is
    /// not part of the set.
    pub fn with_entry<R>(
        &self,
        reference: &str,
        from: &str,
        f: impl FnOnce(&CompiledEntry) -> Result<R>,
    ) -> Result<R> {
        let entries = self.entries.upgrade().ok_or_else(|| SchemaError::RegistryUnavailable {
            reference: reference.to_string(),
        })?;
        let entry = entries.get(reference).ok_or_else(|| SchemaError::UnresolvedReference {
            reference: reference.to_string(),
            from: from.to_string(),
            known: entries.keys().cloned().collect(),
        })?;
        f(entry)
    }

    pub fn is_available(&self) -> bool {
        self.entries.strong_count() > 0
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("available", &self.is_available())
            .finish()
    }
}

/// Name → compiled entry, for one whole schema set
pub struct CompiledSet {
    entries: Arc<Entries>,
}

impl CompiledSet {
    /// Build a set whose entries may reference each other by name.
    ///
    /// `build` receives the handle that will resolve against the finished
    /// set. The handle cannot be upgraded until `build` has returned, so no
    /// reference is ever resolved against a partial set.
    pub fn build<F>(build: F) -> Self
    where
        F: FnOnce(&RegistryHandle) -> Entries,
    {
        let entries = Arc::new_cyclic(|weak| {
            let handle = RegistryHandle { entries: weak.clone() };
            build(&handle)
        });
        Self { entries }
    }

    /// A lookup capability for validators built against this set
    pub fn handle(&self) -> RegistryHandle {
        RegistryHandle { entries: Arc::downgrade(&self.entries) }
    }

    pub fn get(&self, name: &str) -> Option<&CompiledEntry> {
        self.entries.get(name)
    }

    /// Like [`get`](Self::get), but missing names are an error
    pub fn entry(&self, name: &str) -> Result<&CompiledEntry> {
        self.get(name).ok_or_else(|| SchemaError::UnknownEntry { name: name.to_string() })
    }

    pub fn validator(&self, name: &str) -> Result<&Validator> {
        Ok(self.entry(name)?.validator())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CompiledEntry)> {
        self.entries.iter()
    }
}

impl fmt::Debug for CompiledSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v.description())))
            .finish()
    }
}
