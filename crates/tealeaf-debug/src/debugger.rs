use crate::action::{DebugData, MsgWithDebug};
use crate::error::DebugError;
use crate::replay::ReplayLog;
use futures::stream::BoxStream;
use serde_json::Value;
use std::sync::Arc;
use tealeaf_core::Dispatch;

/// A sink for replay-log entries, optionally talking back to the program.
pub trait Debugger<Model, Msg>: Send {
    /// Report one replay-log entry.
    fn observe(&mut self, entry: &DebugData<Model, Msg>);

    /// Control messages sent back by the debugger.  Called once, before the
    /// first entry is observed.
    fn inbound(&mut self) -> Option<BoxStream<'static, Value>> {
        None
    }

    /// Handle one control message from [`inbound`](Debugger::inbound).
    fn handle(&mut self, msg: Value) -> Result<(), DebugError> {
        Err(DebugError::NotSupported(msg.to_string()))
    }

    /// Called once when the program stops.
    fn stop(&mut self) {}
}

/// What a debugger may read from and do to the program it watches.
pub struct DebuggerContext<Model, Msg> {
    /// The model the program started with.
    pub init: Model,
    pub log: ReplayLog<Model, Msg>,
    pub dispatch: Dispatch<MsgWithDebug<Model, Msg>>,
    /// Reads the live model.
    pub current: Arc<dyn Fn() -> Model + Send + Sync>,
}

impl<Model: Clone, Msg> Clone for DebuggerContext<Model, Msg> {
    fn clone(&self) -> Self {
        Self {
            init: self.init.clone(),
            log: self.log.clone(),
            dispatch: self.dispatch.clone(),
            current: Arc::clone(&self.current),
        }
    }
}
