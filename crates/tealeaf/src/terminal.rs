use crossterm::{
    cursor,
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture,
    },
    queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::widgets::Widget;
use ratatui::{Frame, Terminal};
use std::fmt;
use std::io::{self, Write};
use tealeaf_core::{ProgramError, Renderer};

/// Where the terminal UI is drawn.
///
/// When stdout is piped, draw to [`Stderr`](OutputTarget::Stderr) so the UI
/// still reaches the terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Stderr,
}

impl OutputTarget {
    fn writer(self) -> Box<dyn Write + Send> {
        match self {
            OutputTarget::Stdout => Box::new(io::stdout()),
            OutputTarget::Stderr => Box::new(io::stderr()),
        }
    }
}

/// How the terminal is set up for drawing.
///
/// ```rust,ignore
/// let options = TerminalOptions {
///     mouse_capture: true,
///     title: Some("Counter".into()),
///     ..TerminalOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TerminalOptions {
    /// Draw in the alternate screen (default: true).
    pub alt_screen: bool,
    /// Report pastes as a single event (default: true).
    pub bracketed_paste: bool,
    pub mouse_capture: bool,
    pub focus_reporting: bool,
    pub title: Option<String>,
    /// Restore the terminal before a panic message is printed (default: true).
    pub catch_panics: bool,
    pub output: OutputTarget,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            alt_screen: true,
            bracketed_paste: true,
            mouse_capture: false,
            focus_reporting: false,
            title: None,
            catch_panics: true,
            output: OutputTarget::default(),
        }
    }
}

/// One frame's worth of drawing, the `Dom` of terminal programs.
pub struct TerminalView(Box<dyn FnOnce(&mut Frame<'_>) + Send>);

impl TerminalView {
    pub fn new(draw: impl FnOnce(&mut Frame<'_>) + Send + 'static) -> Self {
        Self(Box::new(draw))
    }

    /// A view that fills the whole frame with `widget`.
    pub fn widget<W: Widget + Send + 'static>(widget: W) -> Self {
        Self::new(move |frame| {
            let area = frame.area();
            frame.render_widget(widget, area);
        })
    }

    pub fn draw(self, frame: &mut Frame<'_>) {
        (self.0)(frame)
    }
}

impl fmt::Debug for TerminalView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalView").finish_non_exhaustive()
    }
}

/// Draws each [`TerminalView`] to a ratatui terminal.
///
/// [`new`](TerminalRenderer::new) takes over the real terminal and gives it
/// back when the renderer is dropped, which happens when the render loop
/// ends with the program's stop signal.
pub struct TerminalRenderer<B: Backend = CrosstermBackend<Box<dyn Write + Send>>> {
    terminal: Terminal<B>,
    restore: Option<Modes>,
}

impl TerminalRenderer {
    /// Enter raw mode and set the terminal up according to `options`.
    pub fn new(options: TerminalOptions) -> Result<Self, ProgramError> {
        let modes = Modes::of(&options);
        if options.catch_panics {
            install_panic_hook(modes);
        }

        enable_raw_mode()?;
        let mut writer = options.output.writer();
        modes.queue_enter(&mut writer, options.title.as_deref())?;
        writer.flush()?;

        let terminal = Terminal::new(CrosstermBackend::new(writer))?;
        tracing::debug!(?modes, "terminal initialized");
        Ok(Self {
            terminal,
            restore: Some(modes),
        })
    }

    /// Give the terminal back now instead of on drop.
    pub fn restore(&mut self) -> Result<(), ProgramError> {
        match self.restore.take() {
            Some(modes) => Ok(modes.leave()?),
            None => Ok(()),
        }
    }
}

impl<B: Backend> TerminalRenderer<B> {
    /// Draw to an already configured terminal, which is left as is on drop.
    pub fn headless(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            restore: None,
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Renderer<TerminalView> for TerminalRenderer<B> {
    fn render(&mut self, view: TerminalView) {
        if let Err(e) = self.terminal.draw(|frame| view.draw(frame)) {
            tracing::error!("terminal draw failed: {e}");
        }
    }
}

impl<B: Backend> Drop for TerminalRenderer<B> {
    fn drop(&mut self) {
        if let Some(modes) = self.restore.take() {
            if let Err(e) = modes.leave() {
                tracing::error!("terminal restore failed: {e}");
            }
        }
    }
}

/// The terminal modes a renderer switched on, so that restoring undoes
/// exactly those and nothing else.
#[derive(Debug, Clone, Copy)]
struct Modes {
    alt_screen: bool,
    bracketed_paste: bool,
    mouse_capture: bool,
    focus_reporting: bool,
    output: OutputTarget,
}

impl Modes {
    fn of(options: &TerminalOptions) -> Self {
        Self {
            alt_screen: options.alt_screen,
            bracketed_paste: options.bracketed_paste,
            mouse_capture: options.mouse_capture,
            focus_reporting: options.focus_reporting,
            output: options.output,
        }
    }

    fn queue_enter(self, out: &mut impl Write, title: Option<&str>) -> io::Result<()> {
        if self.alt_screen {
            queue!(out, EnterAlternateScreen)?;
        }
        if self.bracketed_paste {
            queue!(out, EnableBracketedPaste)?;
        }
        if self.mouse_capture {
            queue!(out, EnableMouseCapture)?;
        }
        if self.focus_reporting {
            queue!(out, EnableFocusChange)?;
        }
        if let Some(title) = title {
            queue!(out, SetTitle(title))?;
        }
        queue!(out, cursor::Hide)
    }

    // Reverse order of `queue_enter`.  Every step is attempted; the first
    // failure is reported.
    fn queue_leave(self, out: &mut impl Write) -> io::Result<()> {
        let steps = [
            queue!(out, cursor::Show),
            if self.focus_reporting {
                queue!(out, DisableFocusChange)
            } else {
                Ok(())
            },
            if self.mouse_capture {
                queue!(out, DisableMouseCapture)
            } else {
                Ok(())
            },
            if self.bracketed_paste {
                queue!(out, DisableBracketedPaste)
            } else {
                Ok(())
            },
            if self.alt_screen {
                queue!(out, LeaveAlternateScreen)
            } else {
                Ok(())
            },
        ];
        steps.into_iter().collect()
    }

    fn leave(self) -> io::Result<()> {
        let mut out = self.output.writer();
        let written = self.queue_leave(&mut out).and(out.flush());
        disable_raw_mode().and(written)
    }
}

fn install_panic_hook(modes: Modes) {
    use std::sync::Once;
    static HOOK_INSTALLED: Once = Once::new();
    HOOK_INSTALLED.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = modes.leave();
            original_hook(info);
        }));
    });
}
