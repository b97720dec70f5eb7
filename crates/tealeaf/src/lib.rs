//! **tealeaf** -- Elm Architecture programs for the terminal, with
//! time-travel debugging.
//!
//! This is the umbrella crate that re-exports everything needed to build a
//! tealeaf application from a single dependency:
//!
//! ```toml
//! [dependencies]
//! tealeaf = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`tealeaf_core`] are available at the crate root
//!   ([`Program`], [`Command`], [`Subscription`], [`Html`], [`run`], etc.).
//! * The [`debug`] module re-exports [`tealeaf_debug`] ([`debug::DebugProgram`],
//!   the replay log, the console and devtools debuggers).
//! * The terminal adapter: [`TerminalRenderer`] draws [`TerminalView`]s with
//!   ratatui, and [`terminal_events`] / [`key_presses`] turn crossterm input
//!   into messages.
//! * [`ratatui`], [`crossterm`], [`futures`], [`tokio`] and [`tokio_util`] are re-exported
//!   so downstream crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use tealeaf::ratatui::widgets::Paragraph;
//! use tealeaf::{html, Command, Html, HtmlProgram, TerminalOptions, TerminalRenderer, TerminalView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tealeaf::ProgramError> {
//!     let app = HtmlProgram::new(
//!         (0, Command::none()),
//!         |(): (), n: &i32| (*n, Command::none()),
//!         |n: &i32| Html::constant(TerminalView::widget(Paragraph::new(format!("{n}")))),
//!     );
//!     let renderer = TerminalRenderer::new(TerminalOptions::default())?;
//!     html::run(&app, renderer)?.await.ok();
//!     Ok(())
//! }
//! ```

pub mod event;
pub mod terminal;

pub use event::{key_presses, terminal_events};
pub use tealeaf_core::*;
pub use terminal::{OutputTarget, TerminalOptions, TerminalRenderer, TerminalView};

pub mod debug {
    pub use tealeaf_debug::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use futures;
pub use ratatui;
pub use tokio;
pub use tokio_util;
