use crate::command::Command;
use crate::program::Program;
use crate::subscription::Subscription;

/// An application written as a type instead of loose functions.
///
/// The runtime drives the usual **init -> update -> view** cycle:
///
/// 1. [`init`](Application::init) creates the initial model and may return a
///    [`Command`] for early side effects (e.g. fetching data).
/// 2. Messages arrive from views, completed commands and
///    [`subscriptions`](Application::subscriptions).
/// 3. [`update`](Application::update) turns each message into the next model
///    and an optional command.
///
/// Unlike a mutable model, `update` takes `&self` and returns a new value:
/// the previous model is never touched, which is what lets the debugger keep
/// a replayable history of every state.
///
/// # Example
///
/// ```rust,ignore
/// use tealeaf_core::{Application, Command, Program};
///
/// #[derive(Clone, PartialEq)]
/// struct Counter {
///     count: i32,
/// }
///
/// enum Msg {
///     Increment,
///     Decrement,
/// }
///
/// impl Application for Counter {
///     type Message = Msg;
///     type Flags = i32;
///
///     fn init(start: i32) -> (Self, Command<Msg>) {
///         (Counter { count: start }, Command::none())
///     }
///
///     fn update(&self, msg: Msg) -> (Self, Command<Msg>) {
///         let count = match msg {
///             Msg::Increment => self.count + 1,
///             Msg::Decrement => self.count - 1,
///         };
///         (Counter { count }, Command::none())
///     }
/// }
///
/// let program = Program::<Counter, Msg>::from_application(0);
/// ```
pub trait Application: Clone + PartialEq + Sized + Send + 'static {
    /// Every event that can affect the model.
    type Message: Send + 'static;

    /// Startup data passed to [`init`](Application::init).  Use `()` when none
    /// is needed.
    type Flags;

    /// Create the initial model and an optional startup command.
    fn init(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Compute the next model for `msg`.
    fn update(&self, msg: Self::Message) -> (Self, Command<Self::Message>);

    /// Declare the subscriptions active for this model.  Defaults to none.
    fn subscriptions(&self) -> Subscription<Self::Message> {
        Subscription::none()
    }
}

impl<A: Application> Program<A, A::Message> {
    /// Build a program from an [`Application`] and its flags.
    pub fn from_application(flags: A::Flags) -> Self {
        Program::new(A::init(flags), |msg, model: &A| model.update(msg))
            .with_subscriptions(|model: &A| model.subscriptions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt};

    #[derive(Debug, Clone, PartialEq)]
    struct Clock {
        ticks: u32,
        running: bool,
    }

    #[derive(Debug, Clone)]
    enum Msg {
        Tick,
        Toggle,
    }

    impl Application for Clock {
        type Message = Msg;
        type Flags = bool;

        fn init(running: bool) -> (Self, Command<Msg>) {
            (Clock { ticks: 0, running }, Command::none())
        }

        fn update(&self, msg: Msg) -> (Self, Command<Msg>) {
            let next = match msg {
                Msg::Tick => Clock {
                    ticks: self.ticks + 1,
                    ..self.clone()
                },
                Msg::Toggle => Clock {
                    running: !self.running,
                    ..self.clone()
                },
            };
            (next, Command::none())
        }

        fn subscriptions(&self) -> Subscription<Msg> {
            if self.running {
                Subscription::from_stream(futures::stream::iter(vec![Msg::Tick, Msg::Tick]))
            } else {
                Subscription::none()
            }
        }
    }

    #[test]
    fn application_update_drives_program() {
        let program = Program::<Clock, Msg>::from_application(false);
        program.dispatch(Msg::Tick);
        program.dispatch(Msg::Toggle);
        assert_eq!(
            program.current_model(),
            Clock {
                ticks: 1,
                running: true
            }
        );
    }

    #[test]
    fn application_subscriptions_follow_model() {
        let program = Program::<Clock, Msg>::from_application(true);
        let mut messages = program.subscription_stream();
        let first = messages.next().now_or_never().flatten();
        assert!(matches!(first, Some(Msg::Tick)));

        program.dispatch(Msg::Toggle);
        assert!(messages.next().now_or_never().is_none());
    }
}
