use crate::command::Command;
use crate::program::Program;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};

/// A headless test harness that drives a [`Program`] without spawning.
///
/// `TestProgram` observes the program's model and command streams itself
/// instead of calling [`run`](crate::run): messages sent with
/// [`send`](TestProgram::send) update the model immediately, and commands
/// stay pending until [`settle`](TestProgram::settle) runs them inline and
/// dispatches their results.  Subscriptions are not started.
///
/// # Example
///
/// ```rust,ignore
/// use tealeaf_core::testing::TestProgram;
///
/// let mut prog = TestProgram::new(counter_program());
/// prog.send(Msg::Increment);
/// prog.send(Msg::Load);            // returns a Command
/// prog.settle().await;             // runs it and dispatches the result
/// assert_eq!(prog.models(), &[0, 1, 42]);
/// ```
pub struct TestProgram<Model, Msg> {
    program: Program<Model, Msg>,
    models: BoxStream<'static, Model>,
    commands: BoxStream<'static, Command<Msg>>,
    history: Vec<Model>,
}

impl<Model, Msg> TestProgram<Model, Msg>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
{
    /// Wrap a program that has not been run.
    ///
    /// The initial command is pending straight away, just as `run` would
    /// execute it first.
    pub fn new(program: Program<Model, Msg>) -> Self {
        let models = program.model_stream();
        let commands = program.command_stream();
        let mut harness = Self {
            program,
            models,
            commands,
            history: Vec::new(),
        };
        harness.record();
        harness
    }

    /// Dispatch a message, triggering a single update.
    pub fn send(&mut self, msg: Msg) {
        self.program.dispatch(msg);
        self.record();
    }

    /// Run pending commands, dispatching every message they yield, until no
    /// new command is produced.  Returns the number of messages dispatched.
    ///
    /// Tasks of one command are awaited together; a command whose update
    /// returns another command keeps the loop going.
    pub async fn settle(&mut self) -> usize {
        let mut dispatched = 0;
        loop {
            let pending = self.pending_commands();
            if pending.is_empty() {
                break;
            }
            for cmd in pending {
                let results =
                    futures::future::join_all(cmd.tasks().iter().map(|task| task.run())).await;
                for msg in results.into_iter().flatten() {
                    self.send(msg);
                    dispatched += 1;
                }
            }
        }
        dispatched
    }

    /// Every distinct model observed so far, starting with the initial one.
    pub fn models(&mut self) -> &[Model] {
        self.record();
        &self.history
    }

    /// The current model.
    pub fn model(&self) -> Model {
        self.program.current_model()
    }

    /// The wrapped program.
    pub fn program(&self) -> &Program<Model, Msg> {
        &self.program
    }

    /// Take the commands that became resident since the last call, skipping
    /// empty ones.
    pub fn pending_commands(&mut self) -> Vec<Command<Msg>> {
        let mut pending = Vec::new();
        while let Some(Some(cmd)) = self.commands.next().now_or_never() {
            if !cmd.is_none() {
                pending.push(cmd);
            }
        }
        pending
    }

    fn record(&mut self) {
        while let Some(Some(model)) = self.models.next().now_or_never() {
            self.history.push(model);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        Inc,
        Load,
        Loaded(i64),
        Chain(u8),
    }

    fn app(init: (i64, Command<Msg>)) -> TestProgram<i64, Msg> {
        TestProgram::new(Program::new(init, |msg: Msg, n: &i64| match msg {
            Msg::Inc => (n + 1, Command::none()),
            Msg::Load => (*n, Command::perform(Task::new(|| async { 42i64 }), Msg::Loaded)),
            Msg::Loaded(v) => (v, Command::none()),
            Msg::Chain(0) => (n + 1, Command::none()),
            Msg::Chain(k) => (n + 1, Command::message(Msg::Chain(k - 1))),
        }))
    }

    #[test]
    fn send_updates_model_without_runtime() {
        let mut prog = app((0, Command::none()));
        prog.send(Msg::Inc);
        prog.send(Msg::Inc);
        assert_eq!(prog.model(), 2);
        assert_eq!(prog.models(), &[0, 1, 2]);
    }

    #[tokio::test]
    async fn settle_runs_pending_commands() {
        let mut prog = app((0, Command::none()));
        prog.send(Msg::Inc);
        prog.send(Msg::Load);
        assert_eq!(prog.model(), 1);

        assert_eq!(prog.settle().await, 1);
        assert_eq!(prog.models(), &[0, 1, 42]);
        assert_eq!(prog.settle().await, 0);
    }

    #[tokio::test]
    async fn settle_runs_initial_command() {
        let init = Command::perform(Task::new(|| async { 7i64 }), Msg::Loaded);
        let mut prog = app((0, init));
        assert_eq!(prog.settle().await, 1);
        assert_eq!(prog.model(), 7);
    }

    #[tokio::test]
    async fn settle_follows_command_chains() {
        let mut prog = app((0, Command::none()));
        prog.send(Msg::Chain(3));
        assert_eq!(prog.settle().await, 3);
        assert_eq!(prog.models(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_commands_are_not_pending() {
        let mut prog = app((0, Command::none()));
        prog.send(Msg::Inc);
        assert!(prog.pending_commands().is_empty());
    }
}
