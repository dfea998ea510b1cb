use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::app::Action;

pub async fn run_event_loop(tx: mpsc::UnboundedSender<Action>) {
    let mut reader = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if tx.send(Action::Tick).is_err() {
                    break;
                }
            }
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if let Some(action) = key_to_action(key) {
                            if tx.send(action).is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => {
                        // Terminal will re-render on next frame
                        if tx.send(Action::Tick).is_err() {
                            break;
                        }
                    }
                    Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
}

pub fn key_to_action(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    // Ctrl+C always quits; other chords are form commands
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('s') => Some(Action::Key(KeyAction::Submit)),
            KeyCode::Char('t') => Some(Action::Key(KeyAction::Test)),
            KeyCode::Char('n') => Some(Action::Key(KeyAction::Switch)),
            _ => None,
        };
    }

    let key = match key.code {
        KeyCode::Up => KeyAction::Up,
        KeyCode::Down => KeyAction::Down,
        KeyCode::Left => KeyAction::Left,
        KeyCode::Right => KeyAction::Right,
        KeyCode::Home => KeyAction::Home,
        KeyCode::End => KeyAction::End,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        KeyCode::Enter => KeyAction::Enter,
        KeyCode::Esc => KeyAction::Escape,
        KeyCode::Tab => KeyAction::Tab,
        KeyCode::BackTab => KeyAction::BackTab,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Delete => KeyAction::Delete,
        KeyCode::Char(c) => KeyAction::Char(c),
        _ => return None,
    };
    Some(Action::Key(key))
}

/// Keys as screens see them. Letters arrive as `Char` so text inputs can
/// consume them; screens decide which letters are shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    /// Ctrl+S: submit the form.
    Submit,
    /// Ctrl+T: test a source connection.
    Test,
    /// Ctrl+N: switch between sign in and sign up.
    Switch,
    Char(char),
}
