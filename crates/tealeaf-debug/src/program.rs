use crate::action::{DebugAction, MsgWithDebug};
use crate::console::{Console, ConsoleDebugger, TracingConsole};
use crate::debugger::{Debugger, DebuggerContext};
use crate::devtools::{self, Connection, DevToolsDebugger};
use crate::replay::ReplayLog;
use crate::update::update_with_debug;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tealeaf_core::html::{self, Html, HtmlProgram, Renderer};
use tealeaf_core::{Command, Dispatch, Program, ProgramError, Subscription};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

/// Looks for an external inspector.
pub type DetectInspector = Arc<dyn Fn() -> Option<Arc<dyn Connection>> + Send + Sync>;

/// Builds the console used when no inspector is found.
pub type ConsoleFactory = Arc<dyn Fn() -> Box<dyn Console> + Send + Sync>;

/// Configuration for a [`DebugProgram`].
///
/// Use struct-update syntax to override individual fields:
///
/// ```rust,ignore
/// let options = DebugOptions {
///     detect_inspector: Arc::new(|| None::<Arc<dyn Connection>>),
///     ..DebugOptions::default()
/// };
/// ```
#[derive(Clone)]
pub struct DebugOptions {
    /// Called once per run.  Defaults to [`devtools::get_connection`].
    pub detect_inspector: DetectInspector,
    /// Console for the fallback debugger.  Defaults to [`TracingConsole`].
    pub console: ConsoleFactory,
    /// Heading of each console group.
    pub label: String,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            detect_inspector: Arc::new(devtools::get_connection),
            console: Arc::new(|| Box::new(TracingConsole::default()) as Box<dyn Console>),
            label: "TEALEAF".to_string(),
        }
    }
}

impl std::fmt::Debug for DebugOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugOptions")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A program whose every transition is recorded and reported to a debugger.
///
/// The wrapped program runs on [`MsgWithDebug`] messages so that a debugger
/// can force models and replay history; application code keeps dispatching
/// plain `Msg` values through [`dispatcher`](DebugProgram::dispatcher).
///
/// When started, the program looks for an inspector (see
/// [`DebugOptions::detect_inspector`]) and talks to it with a
/// [`DevToolsDebugger`]; without one it logs through a [`ConsoleDebugger`].
/// The debugger stops, and the inspector is unsubscribed, when the program's
/// stop signal fires.
pub struct DebugProgram<Model, Msg> {
    program: Program<Model, MsgWithDebug<Model, Msg>>,
    log: ReplayLog<Model, Msg>,
    init: Model,
    options: DebugOptions,
}

impl<Model, Msg> DebugProgram<Model, Msg>
where
    Model: Clone + PartialEq + Serialize + DeserializeOwned + Send + 'static,
    Msg: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(
        init: (Model, Command<Msg>),
        update: impl Fn(Msg, &Model) -> (Model, Command<Msg>) + Send + Sync + 'static,
    ) -> Self {
        let (model, cmd) = init;
        let log = ReplayLog::new(model.clone());
        let program = Program::new(
            (model.clone(), cmd.map(MsgWithDebug::Msg)),
            update_with_debug(log.clone(), update),
        );
        Self {
            program,
            log,
            init: model,
            options: DebugOptions::default(),
        }
    }

    pub fn with_subscriptions(
        mut self,
        subscriptions: impl Fn(&Model) -> Subscription<Msg> + Send + Sync + 'static,
    ) -> Self {
        self.program = self
            .program
            .with_subscriptions(move |model: &Model| subscriptions(model).map(MsgWithDebug::Msg));
        self
    }

    pub fn with_options(mut self, options: DebugOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop both the program and its debugger when `signal` is cancelled.
    pub fn with_stop(mut self, signal: CancellationToken) -> Self {
        self.program = self.program.with_stop(signal);
        self
    }

    /// Dispatch application messages.
    pub fn dispatcher(&self) -> Dispatch<Msg> {
        self.program.dispatcher().contramap(MsgWithDebug::Msg)
    }

    /// The wrapped program, including control messages.
    pub fn program(&self) -> &Program<Model, MsgWithDebug<Model, Msg>> {
        &self.program
    }

    pub fn replay_log(&self) -> ReplayLog<Model, Msg> {
        self.log.clone()
    }

    /// Start the program and its debugger.  Returns the model stream.
    pub fn run(&self) -> Result<BoxStream<'static, Model>, ProgramError> {
        let entries = self.log.subscribe();
        let models = tealeaf_core::run(&self.program)?;
        self.spawn_debugger(entries);
        Ok(models)
    }

    /// Start the program, its debugger and a render loop.
    pub fn run_with_view<Dom, R>(
        &self,
        view: impl Fn(&Model) -> Html<Dom, Msg> + Send + Sync + 'static,
        renderer: R,
    ) -> Result<JoinHandle<()>, ProgramError>
    where
        Dom: Send + 'static,
        R: Renderer<Dom> + Send + 'static,
    {
        let entries = self.log.subscribe();
        let app = HtmlProgram::from_program(self.program.clone(), move |model: &Model| {
            view(model).map(MsgWithDebug::Msg)
        });
        let handle = html::run(&app, renderer)?;
        self.spawn_debugger(entries);
        Ok(handle)
    }

    fn select_debugger(&self) -> Box<dyn Debugger<Model, Msg>> {
        match (self.options.detect_inspector)() {
            Some(connection) => {
                tracing::debug!("debugging through devtools inspector");
                let program = self.program.clone();
                let ctx = DebuggerContext {
                    init: self.init.clone(),
                    log: self.log.clone(),
                    dispatch: self.program.dispatcher(),
                    current: Arc::new(move || program.current_model()),
                };
                Box::new(DevToolsDebugger::new(connection, ctx))
            }
            None => {
                tracing::debug!("no inspector found, debugging to console");
                Box::new(ConsoleDebugger::new(
                    (self.options.console)(),
                    self.options.label.clone(),
                ))
            }
        }
    }

    fn spawn_debugger(
        &self,
        entries: tokio::sync::mpsc::UnboundedReceiver<(DebugAction<Msg>, Model)>,
    ) {
        let mut debugger = self.select_debugger();
        let mut inbound = debugger
            .inbound()
            .unwrap_or_else(|| futures::stream::empty().boxed());
        let mut inbound_open = true;
        let stop = self.program.stop_signal();
        let log = self.log.clone();

        tokio::spawn(async move {
            let mut entries = UnboundedReceiverStream::new(entries);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    entry = entries.next() => match entry {
                        Some(entry) => debugger.observe(&entry),
                        None => break,
                    },
                    msg = inbound.next(), if inbound_open => match msg {
                        Some(msg) => {
                            if let Err(e) = debugger.handle(msg) {
                                tracing::warn!(target: "tealeaf::devtools", "[REDUX DEV TOOL] {e}");
                            }
                        }
                        None => inbound_open = false,
                    },
                }
            }
            log.close_observers();
            debugger.stop();
            tracing::debug!("debugger stopped");
        });
    }
}
