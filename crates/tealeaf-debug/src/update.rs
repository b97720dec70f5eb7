use crate::action::{DebugAction, DebugControl, MsgWithDebug};
use crate::replay::ReplayLog;
use tealeaf_core::Command;

/// Wrap `update` so that every application transition is recorded in `log`.
///
/// | Message | Effect |
/// |---------|--------|
/// | `Msg(msg)` | `update` runs, its command is kept, `(Message(msg), model)` is recorded |
/// | `UpdateModel(model)` | the model is replaced, no command, nothing recorded |
/// | `ApplyMsg(msg)` | `update` runs, its command is dropped, nothing recorded |
pub fn update_with_debug<Model, Msg, U>(
    log: ReplayLog<Model, Msg>,
    update: U,
) -> impl Fn(MsgWithDebug<Model, Msg>, &Model) -> (Model, Command<MsgWithDebug<Model, Msg>>)
       + Send
       + Sync
       + 'static
where
    Model: Clone + Send + 'static,
    Msg: Clone + Send + 'static,
    U: Fn(Msg, &Model) -> (Model, Command<Msg>) + Send + Sync + 'static,
{
    move |msg: MsgWithDebug<Model, Msg>, model: &Model| match msg {
        MsgWithDebug::Debug(DebugControl::UpdateModel(next)) => (next, Command::none()),
        MsgWithDebug::Debug(DebugControl::ApplyMsg(msg)) => {
            let (next, _replayed) = update(msg, model);
            (next, Command::none())
        }
        MsgWithDebug::Msg(msg) => {
            let (next, cmd) = update(msg.clone(), model);
            log.record(DebugAction::Message(msg), next.clone());
            (next, cmd.map(MsgWithDebug::Msg))
        }
    }
}
