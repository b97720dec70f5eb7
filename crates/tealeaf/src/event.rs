use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::future::ready;
use futures::{Stream, StreamExt};
use tealeaf_core::Subscription;

/// Terminal events mapped to messages; `None` discards an event.
///
/// The crossterm reader is opened when a model declaring this subscription
/// is switched in and closed when the next model replaces it, so `map` may
/// capture values from the model.  Read errors are logged and skipped.
///
/// ```rust,ignore
/// fn subscriptions(_: &Model) -> Subscription<Msg> {
///     terminal_events(|event| match event {
///         Event::Key(key) => Some(Msg::Key(key)),
///         Event::Resize(w, h) => Some(Msg::Resize(w, h)),
///         _ => None,
///     })
/// }
/// ```
pub fn terminal_events<Msg: Send + 'static>(
    map: impl Fn(Event) -> Option<Msg> + Send + Sync + 'static,
) -> Subscription<Msg> {
    events_from(read_events, map)
}

/// Key presses mapped to messages.
///
/// Terminals with keyboard enhancement report releases as separate events;
/// those are dropped so one keystroke yields one message.  Repeats are kept.
pub fn key_presses<Msg: Send + 'static>(
    map: impl Fn(KeyEvent) -> Option<Msg> + Send + Sync + 'static,
) -> Subscription<Msg> {
    terminal_events(move |event| pressed(event).and_then(&map))
}

fn events_from<S, Msg>(
    source: impl FnOnce() -> S + Send + 'static,
    map: impl Fn(Event) -> Option<Msg> + Send + Sync + 'static,
) -> Subscription<Msg>
where
    S: Stream<Item = Event> + Send + 'static,
    Msg: Send + 'static,
{
    Subscription::new(move || source().filter_map(move |event| ready(map(event))))
}

fn read_events() -> impl Stream<Item = Event> + Send {
    EventStream::new().filter_map(|result| async move {
        match result {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("terminal event read failed: {e}");
                None
            }
        }
    })
}

fn pressed(event: Event) -> Option<KeyEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => Some(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};
    use tealeaf_core::{Command, Program};

    fn key(c: char, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn releases_are_not_presses() {
        assert!(pressed(key('q', KeyEventKind::Press)).is_some());
        assert!(pressed(key('q', KeyEventKind::Repeat)).is_some());
        assert!(pressed(key('q', KeyEventKind::Release)).is_none());
        assert!(pressed(Event::Resize(80, 24)).is_none());
    }

    #[test]
    fn reader_opens_only_when_switched_in() {
        let keys: Subscription<char> = key_presses(|_| Some('k'));
        let all: Subscription<char> = terminal_events(|_| None);
        assert_eq!(keys.len(), 1);
        assert_eq!(all.len(), 1);
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        Shout,
        Plain(char),
        Loud(char),
    }

    #[tokio::test]
    async fn mapping_follows_the_latest_model() {
        let program = Program::new((false, Command::none()), |msg: Msg, loud: &bool| match msg {
            Msg::Shout => (true, Command::none()),
            _ => (*loud, Command::none()),
        })
        .with_subscriptions(|loud: &bool| {
            let loud = *loud;
            events_from(
                || futures::stream::iter([key('a', KeyEventKind::Press)]).chain(futures::stream::pending()),
                move |event| {
                    let key = pressed(event)?;
                    match key.code {
                        KeyCode::Char(c) if loud => Some(Msg::Loud(c.to_ascii_uppercase())),
                        KeyCode::Char(c) => Some(Msg::Plain(c)),
                        _ => None,
                    }
                },
            )
        });

        let mut messages = program.subscription_stream();
        assert_eq!(messages.next().await, Some(Msg::Plain('a')));

        program.dispatch(Msg::Shout);
        assert_eq!(messages.next().await, Some(Msg::Loud('A')));
    }
}
