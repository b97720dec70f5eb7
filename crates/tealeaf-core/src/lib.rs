//! Reactive runtime for the **tealeaf** framework.
//!
//! `tealeaf-core` is an [Elm Architecture] state container: a pure `update`
//! turns a message and the current model into the next model plus a
//! [`Command`] describing pending asynchronous work, and a pure
//! `subscriptions` function declares which long-lived message streams the
//! current model wants.  The [`Program`] owns the single state cell and
//! exposes everything else as streams; [`run`] is the only place side effects
//! happen.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Task`] | Lazily started, re-runnable async work |
//! | [`Command`] | Pending tasks returned from `update`, each yielding at most one message |
//! | [`Subscription`] | Model-dependent set of message streams, switched on every model |
//! | [`Dispatch`] | Cloneable handle that feeds messages into a program |
//! | [`Program`] | The state cell plus `model$`, `cmd$` and `sub$` |
//! | [`Html`] / [`Renderer`] | View values and the sink that draws them |
//! | [`Application`] | Trait form of `init` / `update` / `subscriptions` |
//! | [`TestProgram`](testing::TestProgram) | Headless harness that settles commands inline |
//!
//! # Data flow
//!
//! 1. **dispatch** -- `Dispatch::send(msg)` runs `update(msg, model)` under the
//!    state lock and stores the new `(model, command)` pair.
//! 2. **model$** -- Observers receive the model if it differs from the last one.
//! 3. **cmd$** -- A command is executed once per identity; every message it
//!    yields re-enters dispatch.
//! 4. **sub$** -- `subscriptions(model)` is recomputed for every distinct model
//!    and its streams replace the previous model's streams.
//!
//! # Quick example
//!
//! ```ignore
//! use tealeaf_core::{run, Command, Program};
//!
//! #[derive(Clone)]
//! enum Msg { Increment, Decrement }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tealeaf_core::ProgramError> {
//!     let program = Program::new((0, Command::none()), |msg: Msg, n: &i32| match msg {
//!         Msg::Increment => (n + 1, Command::none()),
//!         Msg::Decrement => (n - 1, Command::none()),
//!     });
//!     let mut models = run(&program)?;
//!     program.dispatch(Msg::Increment);
//!     Ok(())
//! }
//! ```
//!
//! [Elm Architecture]: https://guide.elm-lang.org/architecture/

pub mod application;
pub mod command;
pub mod html;
pub mod program;
pub mod runtime;
mod state;
pub mod subscription;
pub mod task;
pub mod testing;
pub mod time;

pub use application::Application;
pub use command::{Command, CommandId};
pub use html::{Html, HtmlProgram, Renderer};
pub use program::{program, program_with_flags, Dispatch, Program};
pub use runtime::{log_to_file, run, ProgramError};
pub use state::{Lifecycle, UpdateFn};
pub use subscription::Subscription;
pub use task::Task;
pub use time::{every, now, Millis};
