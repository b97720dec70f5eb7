//! Time-travel debugging for tealeaf programs.
//!
//! A [`DebugProgram`] wraps an ordinary `init` / `update` pair.  Every
//! application message and the model it produced is appended to a
//! [`ReplayLog`], and a [`Debugger`] is fed from that log:
//!
//! - With an inspector registered through [`devtools::register_extension`],
//!   a [`DevToolsDebugger`] mirrors the history into it and applies the
//!   monitor's jump, reset, rollback, commit, import and toggle commands.
//! - Otherwise a [`ConsoleDebugger`] prints one group per entry through
//!   `tracing` (target `tealeaf::debug`).
//!
//! Debugger commands reach the program as [`MsgWithDebug`] control
//! messages, which change the model without being recorded in the log.
//!
//! ```ignore
//! use tealeaf_debug::DebugProgram;
//!
//! let program = DebugProgram::new((0, Command::none()), update);
//! let mut models = program.run()?;
//! program.dispatcher().send(Msg::Increment);
//! ```

pub mod action;
pub mod console;
pub mod debugger;
pub mod devtools;
pub mod error;
pub mod lifted;
pub mod program;
pub mod replay;
pub mod update;

pub use action::{DebugAction, DebugControl, DebugData, MsgWithDebug};
pub use console::{message_type, Console, ConsoleDebugger, TracingConsole};
pub use debugger::{Debugger, DebuggerContext};
pub use devtools::{Connection, DevToolsDebugger, Extension, ExtensionOptions};
pub use error::DebugError;
pub use lifted::LiftedState;
pub use program::{DebugOptions, DebugProgram};
pub use replay::ReplayLog;
pub use update::update_with_debug;
