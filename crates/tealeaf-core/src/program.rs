use crate::command::Command;
use crate::state::{Lifecycle, StateCell, UpdateFn};
use crate::subscription::{Subscription, SubscriptionSwitch, SubscriptionsFn};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

/// Injects a message into a running [`Program`].
///
/// `Dispatch` is cheap to clone and can be moved into views, tasks and other
/// threads.  Sending is synchronous: when `send` returns, `update` has run and
/// the new model has been published.
pub struct Dispatch<Msg> {
    send: Arc<dyn Fn(Msg) + Send + Sync>,
}

impl<Msg> Clone for Dispatch<Msg> {
    fn clone(&self) -> Self {
        Self {
            send: Arc::clone(&self.send),
        }
    }
}

impl<Msg> fmt::Debug for Dispatch<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").finish_non_exhaustive()
    }
}

impl<Msg: 'static> Dispatch<Msg> {
    /// Build a dispatch from any message sink.
    pub fn new(send: impl Fn(Msg) + Send + Sync + 'static) -> Self {
        Self {
            send: Arc::new(send),
        }
    }

    /// Send a message.
    pub fn send(&self, msg: Msg) {
        (self.send)(msg)
    }

    /// A dispatch for a child message type, wrapping each message with `f`.
    pub fn contramap<Child: 'static>(
        &self,
        f: impl Fn(Child) -> Msg + Send + Sync + 'static,
    ) -> Dispatch<Child> {
        let parent = self.clone();
        Dispatch::new(move |msg| parent.send(f(msg)))
    }
}

/// A live Elm Architecture program: a state cell plus its derived streams.
///
/// A `Program` is inert until [`run`](crate::run): constructing one, reading
/// its streams or dispatching into it performs no command or subscription
/// side effects on its own.
///
/// | Stream | Emits |
/// |--------|-------|
/// | [`model_stream`](Program::model_stream) | every distinct model, starting with the current one |
/// | [`command_stream`](Program::command_stream) | every distinct command, starting with the resident one |
/// | [`subscription_stream`](Program::subscription_stream) | messages from the subscriptions of the latest model |
///
/// # Example
///
/// ```rust,ignore
/// use tealeaf_core::{run, Command, Program};
///
/// let program = Program::new((0, Command::none()), |msg: Msg, n: &i64| match msg {
///     Msg::Inc => (n + 1, Command::none()),
///     Msg::Dec => (n - 1, Command::none()),
/// });
/// let mut models = run(&program)?;
/// program.dispatch(Msg::Inc);
/// ```
pub struct Program<Model, Msg> {
    state: Arc<StateCell<Model, Msg>>,
    subscriptions: SubscriptionsFn<Model, Msg>,
    stop: CancellationToken,
}

impl<Model, Msg> Clone for Program<Model, Msg> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscriptions: Arc::clone(&self.subscriptions),
            stop: self.stop.clone(),
        }
    }
}

impl<Model, Msg> Program<Model, Msg>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
{
    /// Create a program from its initial state and `update` function.
    ///
    /// The initial command is not run here; it runs exactly once when the
    /// program is started with [`run`](crate::run).
    pub fn new(
        init: (Model, Command<Msg>),
        update: impl Fn(Msg, &Model) -> (Model, Command<Msg>) + Send + Sync + 'static,
    ) -> Self {
        let update: UpdateFn<Model, Msg> = Arc::new(update);
        Self {
            state: Arc::new(StateCell::new(init, update)),
            subscriptions: Arc::new(|_: &Model| Subscription::none()),
            stop: CancellationToken::new(),
        }
    }

    /// Declare the subscriptions of each model (defaults to none).
    pub fn with_subscriptions(
        mut self,
        subscriptions: impl Fn(&Model) -> Subscription<Msg> + Send + Sync + 'static,
    ) -> Self {
        self.subscriptions = Arc::new(subscriptions);
        self
    }

    /// Stop the program when `signal` is cancelled.
    ///
    /// Every stream handed out afterwards ends when the signal fires.  Share
    /// the same token with anything that must not outlive the program.
    pub fn with_stop(mut self, signal: CancellationToken) -> Self {
        self.stop = signal;
        self
    }

    /// A handle that dispatches into this program.
    pub fn dispatcher(&self) -> Dispatch<Msg> {
        let state = Arc::clone(&self.state);
        Dispatch::new(move |msg| state.dispatch(msg))
    }

    /// Run `update` with `msg` and the current model, then publish the result.
    ///
    /// Dispatching after the program stopped still updates the state cell
    /// and any remaining observers; only the runtime's own command and
    /// subscription consumption has ceased.
    pub fn dispatch(&self, msg: Msg) {
        self.state.dispatch(msg)
    }

    /// A snapshot of the current model.
    pub fn current_model(&self) -> Model {
        self.state.current_model()
    }

    /// `model$`: every distinct model, starting with the current one.
    pub fn model_stream(&self) -> BoxStream<'static, Model> {
        let rx = self.state.observe_models();
        self.until_stopped(UnboundedReceiverStream::new(rx).boxed())
    }

    /// `cmd$`: every distinct command, starting with the resident one.
    pub fn command_stream(&self) -> BoxStream<'static, Command<Msg>> {
        let rx = self.state.observe_commands();
        self.until_stopped(UnboundedReceiverStream::new(rx).boxed())
    }

    /// `sub$`: messages of the subscriptions declared by the latest model.
    ///
    /// Each call builds an independent switch, so each consumer starts its
    /// own subscription streams.
    pub fn subscription_stream(&self) -> BoxStream<'static, Msg> {
        let models = UnboundedReceiverStream::new(self.state.observe_models()).boxed();
        let switch = SubscriptionSwitch::new(models, Arc::clone(&self.subscriptions));
        self.until_stopped(switch.boxed())
    }

    /// The stop signal shared by this program's streams.
    pub fn stop_signal(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Fire the stop signal.
    pub fn stop(&self) {
        self.stop.cancel();
        self.state.mark_stopped();
    }

    /// Where this program is in its lifecycle.
    pub fn status(&self) -> Lifecycle {
        if self.stop.is_cancelled() {
            self.state.mark_stopped();
        }
        self.state.lifecycle()
    }

    pub(crate) fn start(&self) -> Result<(), Lifecycle> {
        if self.stop.is_cancelled() {
            self.state.mark_stopped();
        }
        self.state.start()
    }

    pub(crate) fn mark_stopped(&self) {
        self.state.mark_stopped()
    }

    fn until_stopped<T: Send + 'static>(&self, stream: BoxStream<'static, T>) -> BoxStream<'static, T> {
        let stop = self.stop.clone();
        stream
            .take_until(async move { stop.cancelled().await })
            .boxed()
    }
}

/// Create a program from its initial state and `update` function.
pub fn program<Model, Msg>(
    init: (Model, Command<Msg>),
    update: impl Fn(Msg, &Model) -> (Model, Command<Msg>) + Send + Sync + 'static,
) -> Program<Model, Msg>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
{
    Program::new(init, update)
}

/// Same as [`program`], with flags fed to `init` when the program is created.
pub fn program_with_flags<Flags, Model, Msg, I, U>(
    init: I,
    update: U,
) -> impl Fn(Flags) -> Program<Model, Msg>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
    I: Fn(Flags) -> (Model, Command<Msg>),
    U: Fn(Msg, &Model) -> (Model, Command<Msg>) + Clone + Send + Sync + 'static,
{
    move |flags| Program::new(init(flags), update.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        Inc,
        Dec,
        Same,
    }

    fn counter(init: i64) -> Program<i64, Msg> {
        program((init, Command::none()), |msg: Msg, n: &i64| match msg {
            Msg::Inc => (n + 1, Command::none()),
            Msg::Dec => (n - 1, Command::none()),
            Msg::Same => (*n, Command::none()),
        })
    }

    fn ready<T>(stream: &mut BoxStream<'static, T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(Some(value)) = stream.next().now_or_never() {
            out.push(value);
        }
        out
    }

    #[test]
    fn model_stream_follows_dispatch_order() {
        let p = counter(0);
        let mut models = p.model_stream();
        p.dispatch(Msg::Inc);
        p.dispatch(Msg::Inc);
        p.dispatch(Msg::Dec);
        assert_eq!(ready(&mut models), vec![0, 1, 2, 1]);
    }

    #[test]
    fn model_stream_collapses_identical_models() {
        let p = counter(3);
        let mut models = p.model_stream();
        p.dispatch(Msg::Same);
        p.dispatch(Msg::Inc);
        p.dispatch(Msg::Same);
        assert_eq!(ready(&mut models), vec![3, 4]);
    }

    #[test]
    fn late_observer_starts_from_current_model() {
        let p = counter(0);
        p.dispatch(Msg::Inc);
        let mut models = p.model_stream();
        assert_eq!(ready(&mut models), vec![1]);
        assert_eq!(p.current_model(), 1);
    }

    #[test]
    fn dispatch_contramap_wraps_messages() {
        let p = counter(0);
        let dispatch: Dispatch<bool> = p
            .dispatcher()
            .contramap(|up| if up { Msg::Inc } else { Msg::Dec });
        dispatch.send(true);
        dispatch.send(true);
        dispatch.send(false);
        assert_eq!(p.current_model(), 1);
    }

    #[test]
    fn program_with_flags_uses_flags_for_init() {
        let make = program_with_flags(
            |start: i64| (start, Command::none()),
            |msg: Msg, n: &i64| match msg {
                Msg::Inc => (n + 1, Command::<Msg>::none()),
                _ => (*n, Command::none()),
            },
        );
        let p = make(41);
        p.dispatch(Msg::Inc);
        assert_eq!(p.current_model(), 42);
    }

    #[tokio::test]
    async fn streams_end_when_stopped() {
        let signal = CancellationToken::new();
        let p = counter(0).with_stop(signal.clone());
        let mut models = p.model_stream();
        assert_eq!(models.next().await, Some(0));

        signal.cancel();
        assert_eq!(models.next().await, None);
        assert_eq!(p.status(), Lifecycle::Stopped);

        // The state cell still accepts writes after the stop.
        p.dispatch(Msg::Inc);
        assert_eq!(p.current_model(), 1);
    }
}
