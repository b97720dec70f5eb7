//! Bridge to an external state inspector speaking the Redux DevTools
//! monitor protocol.
//!
//! The inspector itself lives outside this crate.  An integration implements
//! [`Extension`] (how to connect) and [`Connection`] (one live session), and
//! registers the extension with [`register_extension`].  The debug program
//! looks the registry up once when it starts.

use crate::action::{DebugAction, DebugData, MsgWithDebug};
use crate::debugger::{Debugger, DebuggerContext};
use crate::error::DebugError;
use crate::lifted::LiftedState;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// One live session with an inspector.
pub trait Connection: Send + Sync {
    /// Control messages coming from the inspector's monitor.
    fn subscribe(&self) -> BoxStream<'static, Value>;
    /// Report an action and the state it produced.  `action` is `null` when
    /// only the state is being mirrored.
    fn send(&self, action: Value, state: Value);
    /// Restart the inspector's history from `state`.
    fn init(&self, state: Value);
    /// End the session.
    fn unsubscribe(&self);
}

/// An installed inspector that can open sessions.
pub trait Extension: Send + Sync {
    fn connect(&self, options: &ExtensionOptions) -> Arc<dyn Connection>;
}

/// Options sent when connecting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionOptions {
    pub features: Features,
}

impl Default for ExtensionOptions {
    fn default() -> Self {
        Self {
            features: Features {
                dispatch: Some(true),
                ..Features::default()
            },
        }
    }
}

/// Monitor features to enable.  Unset features are left to the inspector.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Features {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jump: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder: Option<bool>,
    /// Dispatch custom actions from the monitor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<bool>,
}

type Registry = Mutex<Option<Arc<dyn Extension>>>;

fn registry() -> &'static Registry {
    static EXTENSION: OnceLock<Registry> = OnceLock::new();
    EXTENSION.get_or_init(|| Mutex::new(None))
}

/// Install the process-wide inspector extension, replacing any previous one.
pub fn register_extension(extension: Arc<dyn Extension>) {
    *registry().lock().unwrap_or_else(PoisonError::into_inner) = Some(extension);
}

/// Remove the process-wide inspector extension.
pub fn unregister_extension() {
    *registry().lock().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Connect to the registered extension, if there is one.
pub fn get_connection() -> Option<Arc<dyn Connection>> {
    let extension = registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()?;
    tracing::debug!("devtools extension found, connecting");
    Some(extension.connect(&ExtensionOptions::default()))
}

/// Mirrors the replay log into an inspector and applies its time-travel
/// commands to the program.
pub struct DevToolsDebugger<Model, Msg> {
    connection: Arc<dyn Connection>,
    ctx: DebuggerContext<Model, Msg>,
}

impl<Model, Msg> DevToolsDebugger<Model, Msg>
where
    Model: Clone + Serialize + DeserializeOwned + Send + 'static,
    Msg: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(connection: Arc<dyn Connection>, ctx: DebuggerContext<Model, Msg>) -> Self {
        Self { connection, ctx }
    }

    fn report(&self, (action, model): &DebugData<Model, Msg>) -> Result<(), DebugError> {
        match action {
            DebugAction::Init => self.init_inspector(model),
            DebugAction::Message(msg) => {
                self.connection
                    .send(serde_json::to_value(msg)?, serde_json::to_value(model)?);
                Ok(())
            }
        }
    }

    fn dispatch(&self, msg: MsgWithDebug<Model, Msg>) {
        self.ctx.dispatch.send(msg);
    }

    fn init_inspector(&self, model: &Model) -> Result<(), DebugError> {
        self.connection.init(serde_json::to_value(model)?);
        Ok(())
    }

    /// Handle one inbound monitor message.
    pub fn handle_message(&self, msg: &Value) -> Result<(), DebugError> {
        match msg.get("type").and_then(Value::as_str) {
            Some("START") => self.init_inspector(&self.ctx.init),
            Some("ACTION") => {
                let payload = msg.get("payload").ok_or(DebugError::MissingField("payload"))?;
                let parsed: Msg = match payload {
                    Value::String(raw) => serde_json::from_str(raw)?,
                    other => serde_json::from_value(other.clone())?,
                };
                self.dispatch(MsgWithDebug::Msg(parsed));
                Ok(())
            }
            Some("DISPATCH") => self.handle_dispatch(msg),
            _ => Err(DebugError::NotSupported(feature_label(msg))),
        }
    }

    fn handle_dispatch(&self, msg: &Value) -> Result<(), DebugError> {
        let payload = msg.get("payload");
        let kind = payload
            .and_then(|payload| payload.get("type"))
            .and_then(Value::as_str);

        match kind {
            Some("JUMP_TO_STATE") | Some("JUMP_TO_ACTION") => {
                let model = parse_state(msg)?;
                self.dispatch(MsgWithDebug::update_model(model));
                Ok(())
            }
            Some("RESET") => {
                self.dispatch(MsgWithDebug::update_model(self.ctx.init.clone()));
                self.init_inspector(&self.ctx.init)
            }
            Some("ROLLBACK") => {
                let model: Model = parse_state(msg)?;
                self.dispatch(MsgWithDebug::update_model(model.clone()));
                self.init_inspector(&model)
            }
            Some("COMMIT") => self.init_inspector(&(self.ctx.current)()),
            Some("IMPORT_STATE") => self.import_state(payload),
            Some("TOGGLE_ACTION") => self.toggle_action(msg, payload),
            _ => Err(DebugError::NotSupported(feature_label(msg))),
        }
    }

    fn import_state(&self, payload: Option<&Value>) -> Result<(), DebugError> {
        let bad = || DebugError::BadPayload("IMPORT_STATE");

        let raw = payload
            .and_then(|payload| payload.get("nextLiftedState"))
            .ok_or_else(bad)?;
        let lifted: LiftedState = match raw {
            Value::String(text) => serde_json::from_str(text),
            other => serde_json::from_value(other.clone()),
        }
        .map_err(|_| bad())?;
        let model: Model = lifted
            .last_computed_state()
            .and_then(|state| serde_json::from_value(state.clone()).ok())
            .ok_or_else(bad)?;

        self.dispatch(MsgWithDebug::update_model(model));
        self.connection
            .send(Value::Null, serde_json::to_value(&lifted)?);
        Ok(())
    }

    fn toggle_action(&self, msg: &Value, payload: Option<&Value>) -> Result<(), DebugError> {
        let bad = || DebugError::BadPayload("TOGGLE_ACTION");

        let id = payload
            .and_then(|payload| payload.get("id"))
            .and_then(Value::as_u64)
            .ok_or_else(bad)?;
        let lifted: LiftedState = msg
            .get("state")
            .and_then(Value::as_str)
            .and_then(|state| serde_json::from_str(state).ok())
            .ok_or_else(bad)?;

        let toggled = lifted.toggle_action(id);

        // Parse the whole replay before touching the program.
        if let Some(replay) = &toggled.replay {
            let from: Model = serde_json::from_value(replay.from.clone()).map_err(|_| bad())?;
            let actions = replay
                .actions
                .iter()
                .map(|action| serde_json::from_value::<Msg>(action.clone()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| bad())?;

            self.dispatch(MsgWithDebug::update_model(from));
            for action in actions {
                self.dispatch(MsgWithDebug::apply_msg(action));
            }
        }

        self.connection
            .send(Value::Null, serde_json::to_value(&toggled.state)?);
        Ok(())
    }
}

impl<Model, Msg> Debugger<Model, Msg> for DevToolsDebugger<Model, Msg>
where
    Model: Clone + Serialize + DeserializeOwned + Send + 'static,
    Msg: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    fn observe(&mut self, entry: &DebugData<Model, Msg>) {
        if let Err(e) = self.report(entry) {
            tracing::warn!(target: "tealeaf::devtools", "[REDUX DEV TOOL] {e}");
        }
    }

    fn inbound(&mut self) -> Option<BoxStream<'static, Value>> {
        Some(self.connection.subscribe())
    }

    fn handle(&mut self, msg: Value) -> Result<(), DebugError> {
        self.handle_message(&msg)
    }

    fn stop(&mut self) {
        self.connection.unsubscribe();
    }
}

fn parse_state<Model: DeserializeOwned>(msg: &Value) -> Result<Model, DebugError> {
    let state = msg
        .get("state")
        .and_then(Value::as_str)
        .ok_or(DebugError::MissingField("state"))?;
    Ok(serde_json::from_str(state)?)
}

/// `payload.type` when it is a string, otherwise the message's own `type`.
fn feature_label(msg: &Value) -> String {
    msg.get("payload")
        .and_then(|payload| payload.get("type"))
        .and_then(Value::as_str)
        .or_else(|| msg.get("type").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lifted::tests::lifted_state_json;
    use crate::replay::ReplayLog;
    use serde::Deserialize;
    use serde_json::json;
    use tealeaf_core::Dispatch;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub(crate) enum Msg {
        Inc,
        Dec,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Send(Value, Value),
        Init(Value),
        Unsubscribe,
    }

    /// Records outbound calls; inbound messages are fed through `inbound`.
    #[derive(Default)]
    pub(crate) struct FakeConnection {
        pub(crate) calls: Mutex<Vec<Call>>,
        pub(crate) inbound: Mutex<Option<tokio::sync::mpsc::UnboundedReceiver<Value>>>,
    }

    impl FakeConnection {
        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Connection for FakeConnection {
        fn subscribe(&self) -> BoxStream<'static, Value> {
            use futures::StreamExt;
            match self.inbound.lock().unwrap().take() {
                Some(rx) => tokio_stream::wrappers::UnboundedReceiverStream::new(rx).boxed(),
                None => futures::stream::pending().boxed(),
            }
        }
        fn send(&self, action: Value, state: Value) {
            self.calls.lock().unwrap().push(Call::Send(action, state));
        }
        fn init(&self, state: Value) {
            self.calls.lock().unwrap().push(Call::Init(state));
        }
        fn unsubscribe(&self) {
            self.calls.lock().unwrap().push(Call::Unsubscribe);
        }
    }

    type Dispatched = Arc<Mutex<Vec<MsgWithDebug<i32, Msg>>>>;

    struct Harness {
        connection: Arc<FakeConnection>,
        dispatched: Dispatched,
        log: ReplayLog<i32, Msg>,
        debugger: DevToolsDebugger<i32, Msg>,
    }

    impl Harness {
        fn new() -> Self {
            let connection = Arc::new(FakeConnection::default());
            let dispatched: Dispatched = Arc::default();
            let sink = dispatched.clone();
            let log = ReplayLog::new(0);
            let current = log.clone();
            let ctx = DebuggerContext {
                init: 0,
                log: log.clone(),
                dispatch: Dispatch::new(move |msg: MsgWithDebug<i32, Msg>| {
                    sink.lock().unwrap().push(msg)
                }),
                current: Arc::new(move || current.latest().1),
            };
            let debugger = DevToolsDebugger::new(connection.clone(), ctx);
            Self {
                connection,
                dispatched,
                log,
                debugger,
            }
        }

        fn emit(&mut self, msg: Value) -> Result<(), DebugError> {
            self.debugger.handle(msg)
        }

        fn dispatched(&self) -> Vec<MsgWithDebug<i32, Msg>> {
            self.dispatched.lock().unwrap().clone()
        }
    }

    fn toggle(id: Option<u64>, state: String) -> Value {
        let mut payload = json!({ "type": "TOGGLE_ACTION" });
        if let Some(id) = id {
            payload["id"] = json!(id);
        }
        json!({ "type": "DISPATCH", "payload": payload, "state": state })
    }

    fn lifted_with_skipped(skipped: &[u64]) -> Value {
        let mut state = lifted_state_json();
        state["skippedActionIds"] = json!(skipped);
        state
    }

    #[test]
    fn reports_application_transitions() {
        let mut h = Harness::new();
        h.debugger.observe(&(DebugAction::Init, 0));
        h.debugger.observe(&(DebugAction::Message(Msg::Inc), 1));
        assert_eq!(
            h.connection.calls(),
            vec![
                Call::Init(json!(0)),
                Call::Send(json!({ "type": "Inc" }), json!(1))
            ]
        );
    }

    #[test]
    fn start_reinitializes_inspector() {
        let mut h = Harness::new();
        h.emit(json!({ "type": "START" })).unwrap();
        assert_eq!(h.connection.calls(), vec![Call::Init(json!(0))]);
    }

    #[test]
    fn action_dispatches_parsed_message() {
        let mut h = Harness::new();
        h.emit(json!({ "type": "ACTION", "payload": r#"{"type":"Inc"}"# }))
            .unwrap();
        assert_eq!(h.dispatched(), vec![MsgWithDebug::Msg(Msg::Inc)]);

        let err = h
            .emit(json!({ "type": "ACTION", "payload": r#"type: "Inc""# }))
            .unwrap_err();
        assert!(matches!(err, DebugError::Json(_)));
        assert_eq!(h.dispatched().len(), 1);
    }

    #[test]
    fn jump_messages_replace_model() {
        let mut h = Harness::new();
        for kind in ["JUMP_TO_STATE", "JUMP_TO_ACTION"] {
            h.emit(json!({ "type": "DISPATCH", "payload": { "type": kind }, "state": "123" }))
                .unwrap();
        }
        assert_eq!(
            h.dispatched(),
            vec![MsgWithDebug::update_model(123), MsgWithDebug::update_model(123)]
        );

        let missing = h.emit(json!({ "type": "DISPATCH", "payload": { "type": "JUMP_TO_STATE" } }));
        assert!(matches!(missing, Err(DebugError::MissingField("state"))));
        let garbled = h.emit(
            json!({ "type": "DISPATCH", "payload": { "type": "JUMP_TO_ACTION" }, "state": "1,23" }),
        );
        assert!(matches!(garbled, Err(DebugError::Json(_))));
        assert_eq!(h.dispatched().len(), 2);
    }

    #[test]
    fn reset_restores_init() {
        let mut h = Harness::new();
        h.emit(json!({ "type": "DISPATCH", "payload": { "type": "RESET" } }))
            .unwrap();
        assert_eq!(h.dispatched(), vec![MsgWithDebug::update_model(0)]);
        assert_eq!(h.connection.calls(), vec![Call::Init(json!(0))]);
    }

    #[test]
    fn rollback_restores_and_reinitializes() {
        let mut h = Harness::new();
        h.emit(json!({ "type": "DISPATCH", "payload": { "type": "ROLLBACK" }, "state": "123" }))
            .unwrap();
        assert_eq!(h.dispatched(), vec![MsgWithDebug::update_model(123)]);
        assert_eq!(h.connection.calls(), vec![Call::Init(json!(123))]);

        let garbled =
            h.emit(json!({ "type": "DISPATCH", "payload": { "type": "ROLLBACK" }, "state": "1,23" }));
        assert!(garbled.is_err());
        assert_eq!(h.connection.calls().len(), 1);
    }

    #[test]
    fn commit_reinitializes_with_current_model() {
        let mut h = Harness::new();
        h.log.record(DebugAction::Message(Msg::Inc), 1);
        h.log.record(DebugAction::Message(Msg::Inc), 2);
        h.log.record(DebugAction::Message(Msg::Inc), 3);
        h.log.record(DebugAction::Message(Msg::Dec), 2);

        h.emit(json!({ "type": "DISPATCH", "payload": { "type": "COMMIT" } }))
            .unwrap();
        assert_eq!(h.connection.calls(), vec![Call::Init(json!(2))]);
    }

    #[test]
    fn import_state_applies_last_computed_state() {
        let mut h = Harness::new();
        h.emit(json!({
            "type": "DISPATCH",
            "payload": { "type": "IMPORT_STATE", "nextLiftedState": lifted_state_json() }
        }))
        .unwrap();
        assert_eq!(h.dispatched(), vec![MsgWithDebug::update_model(2)]);
        assert_eq!(
            h.connection.calls(),
            vec![Call::Send(Value::Null, lifted_state_json())]
        );

        let err = h
            .emit(json!({
                "type": "DISPATCH",
                "payload": { "type": "IMPORT_STATE", "foo": lifted_state_json() }
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "IMPORT_STATE message has some bad payload...");
    }

    #[test]
    fn toggle_action_replays_without_toggled_action() {
        let mut h = Harness::new();
        h.emit(toggle(Some(2), lifted_state_json().to_string()))
            .unwrap();
        assert_eq!(
            h.dispatched(),
            vec![
                MsgWithDebug::update_model(1),
                MsgWithDebug::apply_msg(Msg::Dec),
                MsgWithDebug::apply_msg(Msg::Inc),
            ]
        );
        assert_eq!(
            h.connection.calls(),
            vec![Call::Send(Value::Null, lifted_with_skipped(&[2]))]
        );
    }

    #[test]
    fn toggle_action_rejects_bad_payloads() {
        let mut h = Harness::new();
        let no_id = h.emit(toggle(None, lifted_state_json().to_string())).unwrap_err();
        assert_eq!(no_id.to_string(), "TOGGLE_ACTION message has some bad payload...");

        let bad_state = h.emit(toggle(Some(2), "actions: bad".into())).unwrap_err();
        assert_eq!(bad_state.to_string(), "TOGGLE_ACTION message has some bad payload...");

        assert!(h.dispatched().is_empty());
        assert!(h.connection.calls().is_empty());
    }

    #[test]
    fn toggle_action_not_staged_mirrors_unchanged_state() {
        let mut h = Harness::new();
        h.emit(toggle(Some(5), lifted_state_json().to_string()))
            .unwrap();
        assert!(h.dispatched().is_empty());
        assert_eq!(
            h.connection.calls(),
            vec![Call::Send(Value::Null, lifted_state_json())]
        );
    }

    #[test]
    fn toggle_action_already_skipped_is_restored() {
        let mut h = Harness::new();
        h.emit(toggle(Some(2), lifted_with_skipped(&[2]).to_string()))
            .unwrap();
        assert_eq!(
            h.dispatched(),
            vec![
                MsgWithDebug::update_model(1),
                MsgWithDebug::apply_msg(Msg::Inc),
                MsgWithDebug::apply_msg(Msg::Dec),
                MsgWithDebug::apply_msg(Msg::Inc),
            ]
        );
        assert_eq!(
            h.connection.calls(),
            vec![Call::Send(Value::Null, lifted_state_json())]
        );
    }

    #[test]
    fn toggle_action_keeps_other_skipped_actions() {
        let mut h = Harness::new();
        h.emit(toggle(Some(2), lifted_with_skipped(&[2, 4]).to_string()))
            .unwrap();
        assert_eq!(
            h.dispatched(),
            vec![
                MsgWithDebug::update_model(1),
                MsgWithDebug::apply_msg(Msg::Inc),
                MsgWithDebug::apply_msg(Msg::Dec),
            ]
        );
        assert_eq!(
            h.connection.calls(),
            vec![Call::Send(Value::Null, lifted_with_skipped(&[4]))]
        );
    }

    #[test]
    fn unknown_messages_are_not_supported() {
        let mut h = Harness::new();
        let err = h
            .emit(json!({ "type": "DISPATCH", "payload": { "type": "UNKNOWN_TYPE" } }))
            .unwrap_err();
        assert!(matches!(&err, DebugError::NotSupported(label) if label == "UNKNOWN_TYPE"));

        let err = h.emit(json!({ "type": "STOP" })).unwrap_err();
        assert!(matches!(&err, DebugError::NotSupported(label) if label == "STOP"));
    }

    #[test]
    fn stop_unsubscribes() {
        let mut h = Harness::new();
        Debugger::stop(&mut h.debugger);
        assert_eq!(h.connection.calls(), vec![Call::Unsubscribe]);
    }

    #[test]
    fn default_options_enable_dispatch() {
        assert_eq!(
            serde_json::to_value(ExtensionOptions::default()).unwrap(),
            json!({ "features": { "dispatch": true } })
        );
    }

    struct FakeExtension(Arc<FakeConnection>);

    impl Extension for FakeExtension {
        fn connect(&self, options: &ExtensionOptions) -> Arc<dyn Connection> {
            assert_eq!(options.features.dispatch, Some(true));
            self.0.clone()
        }
    }

    #[test]
    fn registry_provides_connection() {
        let connection = Arc::new(FakeConnection::default());
        register_extension(Arc::new(FakeExtension(connection.clone())));
        let found = get_connection();
        unregister_extension();

        let found = found.expect("registered extension");
        found.init(json!(7));
        assert_eq!(connection.calls(), vec![Call::Init(json!(7))]);
        assert!(get_connection().is_none());
    }
}
