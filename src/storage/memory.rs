/// In-memory implementation of the habit storage interface
///
/// Clones share the same backing collection, so a test can keep one handle
/// while the repository owns another and inspect what was saved.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::Habit;
use crate::storage::{HabitStorage, StorageError};

#[derive(Debug, Default)]
struct Inner {
    habits: Vec<Habit>,
    loads: usize,
    saves: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the last saved collection
    pub fn saved(&self) -> Vec<Habit> {
        self.lock().habits.clone()
    }

    pub fn load_count(&self) -> usize {
        self.lock().loads
    }

    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-save
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HabitStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<Habit>, StorageError> {
        let mut inner = self.lock();
        inner.loads += 1;
        Ok(inner.habits.clone())
    }

    fn save(&self, habits: &[Habit]) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.saves += 1;
        inner.habits = habits.to_vec();
        Ok(())
    }
}
