use crate::command::Command;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Pure transition function: `(msg, model) -> (model, command)`.
pub type UpdateFn<Model, Msg> =
    std::sync::Arc<dyn Fn(Msg, &Model) -> (Model, Command<Msg>) + Send + Sync>;

/// Where a [`Program`](crate::Program) is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed but not run: no side effects have happened.
    Idle,
    /// The runtime is consuming the command and subscription streams.
    Running,
    /// The stop signal fired.  Terminal.
    Stopped,
}

struct Inner<Model, Msg> {
    model: Model,
    command: Command<Msg>,
    model_observers: Vec<mpsc::UnboundedSender<Model>>,
    command_observers: Vec<mpsc::UnboundedSender<Command<Msg>>>,
    lifecycle: Lifecycle,
}

/// The single `(Model, Command)` cell of a program.
///
/// All writes go through [`dispatch`](StateCell::dispatch), which holds the
/// lock for the whole `update` + replace + notify sequence, so updates are
/// serialized and observers see transitions in dispatch order.  Observers are
/// unbounded channels: notifying never blocks, which keeps dispatch
/// synchronous and makes re-entrant dispatch from command or subscription
/// tasks safe.
pub(crate) struct StateCell<Model, Msg> {
    inner: Mutex<Inner<Model, Msg>>,
    update: UpdateFn<Model, Msg>,
}

impl<Model, Msg> StateCell<Model, Msg>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
{
    pub(crate) fn new(init: (Model, Command<Msg>), update: UpdateFn<Model, Msg>) -> Self {
        let (model, command) = init;
        Self {
            inner: Mutex::new(Inner {
                model,
                command,
                model_observers: Vec::new(),
                command_observers: Vec::new(),
                lifecycle: Lifecycle::Idle,
            }),
            update,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<Model, Msg>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn dispatch(&self, msg: Msg) {
        let mut inner = self.lock();
        let (model, command) = (self.update)(msg, &inner.model);

        let model_changed = model != inner.model;
        let command_changed = command.id() != inner.command.id();
        inner.model = model;
        inner.command = command;

        if model_changed {
            let model = inner.model.clone();
            inner
                .model_observers
                .retain(|tx| tx.send(model.clone()).is_ok());
        }
        if command_changed {
            let command = inner.command.clone();
            inner
                .command_observers
                .retain(|tx| tx.send(command.clone()).is_ok());
        }
    }

    pub(crate) fn current_model(&self) -> Model {
        self.lock().model.clone()
    }

    /// Register a model observer, seeded with the current model.
    pub(crate) fn observe_models(&self) -> mpsc::UnboundedReceiver<Model> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if tx.send(inner.model.clone()).is_ok() {
            inner.model_observers.push(tx);
        }
        rx
    }

    /// Register a command observer, seeded with the resident command.
    ///
    /// The seed is what makes the initial command run exactly once when the
    /// runtime starts: the first value an observer sees is always "new" to it.
    pub(crate) fn observe_commands(&self) -> mpsc::UnboundedReceiver<Command<Msg>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if tx.send(inner.command.clone()).is_ok() {
            inner.command_observers.push(tx);
        }
        rx
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.lock().lifecycle
    }

    /// Move `Idle -> Running`.  Returns the state found if that is not possible.
    pub(crate) fn start(&self) -> Result<(), Lifecycle> {
        let mut inner = self.lock();
        match inner.lifecycle {
            Lifecycle::Idle => {
                inner.lifecycle = Lifecycle::Running;
                Ok(())
            }
            other => Err(other),
        }
    }

    pub(crate) fn mark_stopped(&self) {
        self.lock().lifecycle = Lifecycle::Stopped;
    }
}
