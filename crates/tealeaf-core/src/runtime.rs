use crate::command::Command;
use crate::program::{Dispatch, Program};
use crate::state::Lifecycle;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Errors that can occur while starting a [`Program`] or its adapters.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// `run` was called outside of a tokio runtime.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    /// The program was already started.
    #[error("program is already running")]
    AlreadyRunning,
    /// The stop signal fired before the program was started.
    #[error("program has been stopped")]
    Stopped,
    /// A global log subscriber could not be installed.
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
    /// An I/O error from an adapter (log file, terminal setup or teardown).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start a program: execute its commands and feed its subscriptions back
/// into `dispatch`.
///
/// This is the only side-effecting step.  It spawns two tasks on the current
/// tokio runtime, one consuming the command stream and one consuming the
/// subscription stream, and returns the model stream for a renderer or any
/// other observer.  The initial command runs exactly once, here.
///
/// When the program's stop signal fires, both tasks end and the program
/// moves to [`Lifecycle::Stopped`] for good.  Commands already in flight may
/// still complete and dispatch.
pub fn run<Model, Msg>(program: &Program<Model, Msg>) -> Result<BoxStream<'static, Model>, ProgramError>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current()?;
    program.start().map_err(|state| match state {
        Lifecycle::Stopped => ProgramError::Stopped,
        _ => ProgramError::AlreadyRunning,
    })?;
    tracing::debug!("program started");

    let models = program.model_stream();
    let dispatch = program.dispatcher();

    let mut commands = program.command_stream();
    let cmd_dispatch = dispatch.clone();
    handle.spawn(async move {
        while let Some(cmd) = commands.next().await {
            execute_command(cmd, &cmd_dispatch);
        }
        tracing::trace!("command stream closed");
    });

    let mut messages = program.subscription_stream();
    let sub_dispatch = dispatch;
    handle.spawn(async move {
        while let Some(msg) = messages.next().await {
            sub_dispatch.send(msg);
        }
        tracing::trace!("subscription stream closed");
    });

    let stop = program.stop_signal();
    let watched = program.clone();
    handle.spawn(async move {
        stop.cancelled().await;
        watched.mark_stopped();
        tracing::debug!("program stopped");
    });

    Ok(models)
}

/// Spawn every task of `cmd`; each result re-enters `dispatch` on its own.
pub(crate) fn execute_command<Msg: Send + 'static>(cmd: Command<Msg>, dispatch: &Dispatch<Msg>) {
    if cmd.is_none() {
        return;
    }
    tracing::trace!(id = ?cmd.id(), tasks = cmd.tasks().len(), "executing command");
    for task in cmd.into_tasks() {
        let dispatch = dispatch.clone();
        tokio::spawn(async move {
            if let Some(msg) = task.run().await {
                dispatch.send(msg);
            }
        });
    }
}

/// Send `tracing` output to a file.
///
/// Interactive programs usually own the terminal, so log lines written to
/// stdout would corrupt the screen.  This installs a global subscriber that
/// appends to `path` instead.  The level filter is read from `RUST_LOG`,
/// defaulting to `info`.
///
/// # Example
///
/// ```no_run
/// tealeaf_core::runtime::log_to_file("debug.log").unwrap();
/// tracing::info!("logging to a file");
/// ```
pub fn log_to_file(path: impl AsRef<Path>) -> Result<(), ProgramError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .map_err(|e| ProgramError::Logging(e.to_string()))
}
