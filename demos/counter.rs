//! # Counter Example
//!
//! A minimal counter demonstrating the tealeaf architecture:
//! - a pure `update` returning the next model and a `Command`
//! - a view producing a [`TerminalView`] per model
//! - terminal input mapped to messages through a subscription
//! - a clock subscription that is switched on and off by the model
//!
//! Run with: `cargo run --example counter`
//!
//! Pass `--debug` to run under the debugger; without a registered inspector
//! every transition is written to `tealeaf-debug.log`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tealeaf::crossterm::event::{KeyCode, KeyModifiers};
use tealeaf::debug::DebugProgram;
use tealeaf::futures::StreamExt;
use tealeaf::ratatui::layout::{Alignment, Constraint, Layout};
use tealeaf::ratatui::style::{Color, Modifier, Style};
use tealeaf::ratatui::text::{Line, Span};
use tealeaf::ratatui::widgets::{Block, Borders, Paragraph};
use tealeaf::tokio_util::sync::CancellationToken;
use tealeaf::{
    every, html, key_presses, log_to_file, Command, Dispatch, Html, HtmlProgram, Program,
    ProgramError, Subscription, TerminalOptions, TerminalRenderer, TerminalView,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Counter {
    count: i64,
    ticking: bool,
    quitting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Msg {
    Increment,
    Decrement,
    Reset,
    ToggleTicking,
    Tick,
    Quit,
}

fn init() -> (Counter, Command<Msg>) {
    (
        Counter {
            count: 0,
            ticking: false,
            quitting: false,
        },
        Command::none(),
    )
}

fn update(msg: Msg, model: &Counter) -> (Counter, Command<Msg>) {
    let mut next = model.clone();
    match msg {
        Msg::Increment | Msg::Tick => next.count += 1,
        Msg::Decrement => next.count -= 1,
        Msg::Reset => next.count = 0,
        Msg::ToggleTicking => next.ticking = !next.ticking,
        Msg::Quit => next.quitting = true,
    }
    (next, Command::none())
}

// The clock only runs while the model asks for it.
fn subscriptions(model: &Counter) -> Subscription<Msg> {
    let keys = key_presses(|key| match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Msg::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Msg::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(Msg::Increment),
        KeyCode::Down | KeyCode::Char('j') => Some(Msg::Decrement),
        KeyCode::Char('r') => Some(Msg::Reset),
        KeyCode::Char('t') => Some(Msg::ToggleTicking),
        _ => None,
    });

    if model.ticking {
        Subscription::batch([keys, every(Duration::from_secs(1), |_| Msg::Tick)])
    } else {
        keys
    }
}

fn view(model: &Counter) -> Html<TerminalView, Msg> {
    let model = model.clone();
    Html::new(move |_: &Dispatch<Msg>| {
        TerminalView::new(move |frame| {
            let [_, mid, _] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(5),
                Constraint::Fill(1),
            ])
            .areas(frame.area());

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(if model.ticking { " Counter (ticking) " } else { " Counter " });

            let count_style = match model.count {
                n if n > 0 => Style::default().fg(Color::Green),
                n if n < 0 => Style::default().fg(Color::Red),
                _ => Style::default().fg(Color::White),
            }
            .add_modifier(Modifier::BOLD);

            let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
            let text = vec![
                Line::from(Span::styled(format!("Count: {}", model.count), count_style)),
                Line::raw(""),
                Line::from(vec![
                    key("↑/k"),
                    Span::raw(" inc  "),
                    key("↓/j"),
                    Span::raw(" dec  "),
                    key("r"),
                    Span::raw(" reset  "),
                    key("t"),
                    Span::raw(" tick  "),
                    key("q"),
                    Span::raw(" quit"),
                ]),
            ];

            frame.render_widget(
                Paragraph::new(text).block(block).alignment(Alignment::Center),
                mid,
            );
        })
    })
}

#[tokio::main]
async fn main() -> Result<(), ProgramError> {
    let stop = CancellationToken::new();
    let renderer = TerminalRenderer::new(TerminalOptions {
        title: Some("tealeaf counter".into()),
        ..TerminalOptions::default()
    })?;

    let (mut models, render) = if std::env::args().any(|arg| arg == "--debug") {
        log_to_file("tealeaf-debug.log")?;
        let program = DebugProgram::new(init(), update)
            .with_subscriptions(subscriptions)
            .with_stop(stop.clone());
        let models = program.program().model_stream();
        (models, program.run_with_view(view, renderer)?)
    } else {
        let program = Program::new(init(), update)
            .with_subscriptions(subscriptions)
            .with_stop(stop.clone());
        let models = program.model_stream();
        let app = HtmlProgram::from_program(program, view);
        (models, html::run(&app, renderer)?)
    };

    while let Some(model) = models.next().await {
        if model.quitting {
            stop.cancel();
        }
    }

    // The renderer restores the terminal when the render loop drops it.
    render.await.ok();
    Ok(())
}
