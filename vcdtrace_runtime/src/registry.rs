use std::{
    collections::HashMap,
    io::{self, Write},
};

use slotmap::SlotMap;
use vcdtrace_core::{Identifier, VarDescriptor};

use crate::{Detached, DumpStatus, Renderable};

slotmap::new_key_type! {
    /// Handle of one traced value inside a [`Registry`]. Keys order by registration.
    pub struct ValueKey;
}

#[derive(Debug)]
pub struct RegistryEntry {
    pub descriptor: VarDescriptor,
    renderer: Box<dyn Renderable>,
}

/// The renderers of all elaborated values, in registration order, with a reverse index from the
/// dotted registration path.
#[derive(Debug, Default)]
pub struct Registry {
    entries: SlotMap<ValueKey, RegistryEntry>,
    paths: HashMap<String, ValueKey>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer. The caller guarantees the descriptor's path is not yet registered.
    pub fn insert(&mut self, descriptor: VarDescriptor, renderer: Box<dyn Renderable>) -> ValueKey {
        let path = descriptor.path.clone();
        let key = self.entries.insert(RegistryEntry {
            descriptor,
            renderer,
        });
        self.paths.insert(path, key);
        key
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    pub fn find(&self, path: &str) -> Option<ValueKey> {
        self.paths.get(path).copied()
    }

    pub fn descriptor(&self, key: ValueKey) -> Option<&VarDescriptor> {
        self.entries.get(key).map(|entry| &entry.descriptor)
    }

    pub fn identifier(&self, key: ValueKey) -> Option<&Identifier> {
        self.descriptor(key).map(|descriptor| &descriptor.identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ValueKey> + '_ {
        self.entries.keys()
    }

    /// Render one value. Unknown keys render nothing.
    pub(crate) fn render(
        &mut self,
        key: ValueKey,
        out: &mut dyn Write,
        start: bool,
    ) -> io::Result<DumpStatus> {
        match self.entries.get_mut(key) {
            Some(RegistryEntry {
                descriptor,
                renderer,
            }) => renderer.render(out, &descriptor.identifier, start),
            None => Ok(DumpStatus::END),
        }
    }

    /// Replace the renderers of dropped values with [`Detached`]. Returns how many were replaced.
    pub(crate) fn detach_dropped(&mut self) -> usize {
        let mut detached = 0;
        for entry in self.entries.values_mut() {
            if entry.renderer.is_dropped() {
                tracing::debug!(path = %entry.descriptor.path, "Value dropped, detaching renderer.");
                entry.renderer = Box::new(Detached);
                detached += 1;
            }
        }
        detached
    }
}
