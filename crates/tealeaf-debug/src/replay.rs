use crate::action::{DebugAction, DebugData};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

struct Inner<Model, Msg> {
    entries: Vec<DebugData<Model, Msg>>,
    observers: Vec<mpsc::UnboundedSender<DebugData<Model, Msg>>>,
}

/// Append-only history of `(action, model)` pairs.
///
/// The log always holds at least the `(Init, initial model)` entry.  New
/// observers first receive the latest entry and then every entry recorded
/// after they subscribed.
pub struct ReplayLog<Model, Msg> {
    inner: Arc<Mutex<Inner<Model, Msg>>>,
}

impl<Model, Msg> Clone for ReplayLog<Model, Msg> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Model: Clone, Msg: Clone> ReplayLog<Model, Msg> {
    pub fn new(init: Model) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: vec![(DebugAction::Init, init)],
                observers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<Model, Msg>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry and notify observers.
    pub fn record(&self, action: DebugAction<Msg>, model: Model) {
        let mut inner = self.lock();
        let entry = (action, model);
        inner.observers.retain(|tx| tx.send(entry.clone()).is_ok());
        inner.entries.push(entry);
    }

    /// Observe the log, starting with its latest entry.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DebugData<Model, Msg>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        let latest = inner.entries.last().cloned();
        if let Some(latest) = latest {
            if tx.send(latest).is_ok() {
                inner.observers.push(tx);
            }
        }
        rx
    }

    /// The most recent entry.
    pub fn latest(&self) -> DebugData<Model, Msg> {
        let inner = self.lock();
        // `new` seeds the log and entries are never removed.
        inner.entries[inner.entries.len() - 1].clone()
    }

    pub fn entries(&self) -> Vec<DebugData<Model, Msg>> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop every observer; their streams end.
    pub(crate) fn close_observers(&self) {
        self.lock().observers.clear();
    }
}
