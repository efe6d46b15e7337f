use crate::error::MarkupError;
use crate::storage::{KeyValueStore, MemoryStore};

use super::{
    Document, Environment, MemoryDocument, Notifier, PageSpec, RecordingNotifier, Scheduler,
    VirtualScheduler,
};

/// Environment made entirely of in-memory parts.
///
/// Fields are public so a driver can inspect the document, the pending
/// tasks, the notices shown and the stored values.
#[derive(Debug)]
pub struct HeadlessEnv<S = MemoryStore> {
    pub document: MemoryDocument,
    pub scheduler: VirtualScheduler,
    pub notifier: RecordingNotifier,
    pub store: S,
}

impl HeadlessEnv<MemoryStore> {
    /// Blank page with a memory store.
    pub fn empty() -> Self {
        Self::new(MemoryDocument::default(), MemoryStore::default())
    }

    pub fn from_spec(spec: &PageSpec) -> Result<Self, MarkupError> {
        Ok(Self::new(MemoryDocument::from_spec(spec)?, MemoryStore::default()))
    }
}

impl<S: KeyValueStore> HeadlessEnv<S> {
    pub fn new(document: MemoryDocument, store: S) -> Self {
        Self {
            document,
            scheduler: VirtualScheduler::new(),
            notifier: RecordingNotifier::default(),
            store,
        }
    }
}

impl<S: KeyValueStore> Environment for HeadlessEnv<S> {
    fn document(&self) -> &dyn Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut dyn Document {
        &mut self.document
    }

    fn scheduler(&self) -> &dyn Scheduler {
        &self.scheduler
    }

    fn scheduler_mut(&mut self) -> &mut dyn Scheduler {
        &mut self.scheduler
    }

    fn notifier_mut(&mut self) -> &mut dyn Notifier {
        &mut self.notifier
    }

    fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        &mut self.store
    }
}
