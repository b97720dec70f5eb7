use crate::task::Task;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Command`].
///
/// The runtime compares identities, not contents, when deciding whether the
/// command resident in the state cell is new: a command is executed once per
/// identity, no matter how many times the surrounding state is re-published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(u64);

impl CommandId {
    /// The identity shared by every empty command.
    pub const NONE: CommandId = CommandId(0);

    fn next() -> Self {
        CommandId(NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Pending asynchronous work returned from `update` (or `init`).
///
/// A command holds zero or more [`Task`]s, each resolving to an optional
/// message.  The runtime runs every task concurrently and dispatches each
/// `Some(msg)` it yields on its own; `None` results are dropped silently.
///
/// # Examples
///
/// ```rust,ignore
/// // Do nothing:
/// let cmd = Command::none();
///
/// // Run an async task and map the result to a message:
/// let cmd = Command::perform(Task::new(|| fetch_data()), Msg::DataLoaded);
///
/// // Run two commands side by side:
/// let cmd = Command::batch([load_user, load_settings]);
/// ```
pub struct Command<Msg> {
    id: CommandId,
    tasks: Vec<Task<Option<Msg>>>,
}

impl<Msg> Clone for Command<Msg> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tasks: self.tasks.clone(),
        }
    }
}

impl<Msg> fmt::Debug for Command<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl<Msg: Send + 'static> Command<Msg> {
    /// The empty command: contributes nothing and never emits.
    pub fn none() -> Self {
        Command {
            id: CommandId::NONE,
            tasks: Vec::new(),
        }
    }

    /// Wrap a raw task whose result is an optional message.
    pub fn task(task: Task<Option<Msg>>) -> Self {
        Command {
            id: CommandId::next(),
            tasks: vec![task],
        }
    }

    /// Run a task and map its result to a message.
    pub fn perform<T: Send + 'static>(
        task: Task<T>,
        map: impl Fn(T) -> Msg + Send + Sync + 'static,
    ) -> Self {
        Command::task(task.map(move |value| Some(map(value))))
    }

    /// Run a fallible task, encoding success and failure into one message.
    pub fn attempt<T, E>(
        task: Task<Result<T, E>>,
        map: impl Fn(Result<T, E>) -> Msg + Send + Sync + 'static,
    ) -> Self
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        Command::perform(task, map)
    }

    /// Deliver a message as soon as the command runs.
    pub fn message(msg: Msg) -> Self
    where
        Msg: Clone + Sync,
    {
        Command::task(Task::of(Some(msg)))
    }

    /// One-shot timer: fires once after `duration`, mapping the instant to a message.
    pub fn tick(duration: Duration, map: impl Fn(Instant) -> Msg + Send + Sync + 'static) -> Self {
        let map = Arc::new(map);
        Command::task(Task::new(move || {
            let map = Arc::clone(&map);
            async move {
                tokio::time::sleep(duration).await;
                Some(map(Instant::now()))
            }
        }))
    }

    /// Run multiple commands concurrently.
    ///
    /// Each constituent resolves and dispatches independently; the batch does
    /// not wait for its members.  Empty constituents are discarded, so a batch
    /// of nothing is [`Command::none`].
    pub fn batch(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let mut cmds: Vec<_> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        match cmds.len() {
            0 => Command::none(),
            1 => cmds.pop().unwrap_or_else(Command::none),
            _ => Command {
                id: CommandId::next(),
                tasks: cmds.into_iter().flat_map(|cmd| cmd.tasks).collect(),
            },
        }
    }

    /// Transform the message type (for component composition).
    ///
    /// The mapped command keeps the identity of the original: it describes
    /// the same pending work.
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Command<NewMsg> {
        let f = Arc::new(f);
        Command {
            id: self.id,
            tasks: self
                .tasks
                .into_iter()
                .map(|task| {
                    let f = Arc::clone(&f);
                    task.map(move |msg| msg.map(|msg| f(msg)))
                })
                .collect(),
        }
    }

    // --- Inspection methods (useful for testing) ---

    /// The identity of this command.
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Returns `true` if this is the empty command.
    pub fn is_none(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The tasks this command will run.
    pub fn tasks(&self) -> &[Task<Option<Msg>>] {
        &self.tasks
    }

    pub(crate) fn into_tasks(self) -> Vec<Task<Option<Msg>>> {
        self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn resolve<Msg: Send + 'static>(cmd: &Command<Msg>) -> Vec<Option<Msg>> {
        futures::future::join_all(cmd.tasks().iter().map(|task| task.run())).await
    }

    #[test]
    fn command_none_is_none() {
        let cmd: Command<()> = Command::none();
        assert!(cmd.is_none());
        assert_eq!(cmd.id(), CommandId::NONE);
    }

    #[test]
    fn command_none_shares_identity() {
        let a: Command<i32> = Command::none();
        let b: Command<i32> = Command::none();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn command_message_has_fresh_identity() {
        let a: Command<i32> = Command::message(1);
        let b: Command<i32> = Command::message(1);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[tokio::test]
    async fn command_message_resolves() {
        let cmd: Command<i32> = Command::message(42);
        assert_eq!(resolve(&cmd).await, vec![Some(42)]);
    }

    #[test]
    fn command_batch_empty_returns_none() {
        let cmd: Command<()> = Command::batch(vec![]);
        assert!(cmd.is_none());
    }

    #[test]
    fn command_batch_of_nones_returns_none() {
        let cmd: Command<i32> = Command::batch(vec![Command::none(), Command::none()]);
        assert_eq!(cmd.id(), CommandId::NONE);
    }

    #[test]
    fn command_batch_single_unwraps() {
        let inner: Command<i32> = Command::message(1);
        let id = inner.id();
        let cmd = Command::batch(vec![inner, Command::none()]);
        assert_eq!(cmd.id(), id);
    }

    #[tokio::test]
    async fn command_batch_multiple() {
        let cmd: Command<i32> = Command::batch(vec![Command::message(1), Command::message(2)]);
        assert_eq!(cmd.tasks().len(), 2);
        assert_eq!(resolve(&cmd).await, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn command_attempt_encodes_errors() {
        #[derive(Debug, PartialEq)]
        enum Msg {
            Loaded(Result<u32, String>),
        }

        let failing: Task<Result<u32, String>> = Task::new(|| async { Err("offline".to_string()) });
        let cmd = Command::attempt(failing, Msg::Loaded);
        assert_eq!(
            resolve(&cmd).await,
            vec![Some(Msg::Loaded(Err("offline".into())))]
        );
    }

    #[test]
    fn command_map_none() {
        let cmd: Command<i32> = Command::none();
        let mapped: Command<String> = cmd.map(|n| n.to_string());
        assert!(mapped.is_none());
    }

    #[tokio::test]
    async fn command_map_message_keeps_identity() {
        let cmd: Command<i32> = Command::message(42);
        let id = cmd.id();
        let mapped: Command<String> = cmd.map(|n| n.to_string());
        assert_eq!(mapped.id(), id);
        assert_eq!(resolve(&mapped).await, vec![Some("42".to_string())]);
    }

    #[tokio::test]
    async fn command_perform_is_lazy() {
        use std::sync::atomic::AtomicBool;

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let cmd: Command<bool> = Command::perform(
            Task::new(move || {
                flag.store(true, Ordering::SeqCst);
                async { true }
            }),
            |b| b,
        );

        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(resolve(&cmd).await, vec![Some(true)]);
        assert!(ran.load(Ordering::SeqCst));
    }
}
