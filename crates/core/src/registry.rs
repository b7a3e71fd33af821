use std::sync::Arc;

use crate::operation::Operation;

/// Ordered, id-unique set of operations offered by a handler.
#[derive(Clone, Default)]
pub struct Operations {
    entries: Vec<Arc<dyn Operation>>,
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation. An existing operation with the same id is replaced in place.
    pub fn add(&mut self, operation: Arc<dyn Operation>) {
        match self.entries.iter().position(|op| op.id() == operation.id()) {
            Some(index) => self.entries[index] = operation,
            None => self.entries.push(operation),
        }
    }

    pub fn merge(&mut self, other: Operations) {
        for operation in other.entries {
            self.add(operation);
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Operation>> {
        self.entries.iter().find(|op| op.id() == id).cloned()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|op| op.id()).collect()
    }

    /// Only the operations a human caller may invoke directly.
    pub fn external(&self) -> Operations {
        Operations {
            entries: self
                .entries
                .iter()
                .filter(|op| op.usage().is_external())
                .cloned()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Operation>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Operations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

/// A provider of operations, registered with a host framework.
pub trait Handler: Send + Sync {
    fn id(&self) -> &str;

    fn operations(&self) -> Operations;
}
