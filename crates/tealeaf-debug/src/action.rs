use serde::{Deserialize, Serialize};

/// One kind of replay-log entry.
///
/// Serializes as `{ "type": "INIT" }` or `{ "type": "MESSAGE", "payload": msg }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "UPPERCASE")]
pub enum DebugAction<Msg> {
    /// The initial model.
    Init,
    /// An application message and, paired with it in [`DebugData`], the model
    /// it produced.
    Message(Msg),
}

/// A replay-log entry: an action and the model that followed it.
pub type DebugData<Model, Msg> = (DebugAction<Msg>, Model);

/// Control messages understood only by the debug wrapper around `update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DebugControl<Model, Msg> {
    /// Replace the model outright. `update` is not called, no command runs
    /// and nothing is recorded.
    #[serde(rename = "__DebugUpdateModel__")]
    UpdateModel(Model),
    /// Run `update` with the message but drop its command. Not recorded.
    #[serde(rename = "__DebugApplyMsg__")]
    ApplyMsg(Msg),
}

/// The message type of a program running under the debugger.
///
/// Application messages serialize as themselves; control messages as
/// `{ "type": "__DebugUpdateModel__", "payload": model }` and
/// `{ "type": "__DebugApplyMsg__", "payload": msg }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MsgWithDebug<Model, Msg> {
    Debug(DebugControl<Model, Msg>),
    Msg(Msg),
}

impl<Model, Msg> MsgWithDebug<Model, Msg> {
    pub fn update_model(model: Model) -> Self {
        MsgWithDebug::Debug(DebugControl::UpdateModel(model))
    }

    pub fn apply_msg(msg: Msg) -> Self {
        MsgWithDebug::Debug(DebugControl::ApplyMsg(msg))
    }
}
