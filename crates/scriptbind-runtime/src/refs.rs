//! Persistent registry references.

use std::fmt;

use crate::Value;

/// Handle to a value pinned in the registry.
///
/// The generation detects use after release: a released slot is reused with
/// a bumped generation, so stale keys read as absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    index: u32,
    generation: u32,
}

impl RegistryKey {
    /// Slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Generational slot storage for pinned values.
#[derive(Default)]
pub struct RegistryRefs {
    slots: Vec<RefSlot>,
    free_list: Vec<u32>,
}

struct RefSlot {
    generation: u32,
    value: Option<Value>,
}

impl RegistryRefs {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a value and return its key.
    pub fn insert(&mut self, value: Value) -> RegistryKey {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            RegistryKey {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(RefSlot {
                generation: 0,
                value: Some(value),
            });
            RegistryKey {
                index,
                generation: 0,
            }
        }
    }

    /// Read a pinned value. `None` if the key is stale.
    pub fn get(&self, key: RegistryKey) -> Option<&Value> {
        let slot = self.slots.get(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Unpin a value. Returns the value if the key was live.
    pub fn remove(&mut self, key: RegistryKey) -> Option<Value> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(key.index);
        Some(value)
    }

    /// Number of live references.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Whether no references are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pinned value.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}

impl fmt::Debug for RegistryRefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryRefs")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .finish()
    }
}
